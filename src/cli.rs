use clap::Parser;
use std::path::PathBuf;

// Build version with decoder info
const VERSION_INFO: &str = const_format::concatcp!(
    env!("CARGO_PKG_VERSION"), "\n",
    "Images: image 0.25 (jpeg, png)\n",
    "Target: ", std::env::consts::ARCH, "-", std::env::consts::OS
);

/// Default event list looked up in the current directory
pub const DEFAULT_EVENTS_FILE: &str = "events.json";

/// Frame-by-frame viewer for recorded camera events
#[derive(Parser, Debug)]
#[command(author, version = VERSION_INFO, about, long_about = None)]
pub struct Args {
    /// Event list JSON (root, timestamp, list of evtnum/lastframe/sigdigits)
    #[arg(value_name = "EVENTS_JSON")]
    pub events_file: Option<PathBuf>,

    /// Start playing the event at this index (0-based)
    #[arg(short = 'e', long = "event", value_name = "N")]
    pub event: Option<usize>,

    /// Playback rate in frames per second (overrides saved settings)
    #[arg(long = "fps", value_name = "F")]
    pub fps: Option<f32>,

    /// Enable debug logging to file (default: zmeview.log)
    #[arg(short = 'l', long = "log", value_name = "LOG_FILE")]
    pub log_file: Option<Option<PathBuf>>,

    /// Increase logging verbosity (default: warn, -v: info, -vv: debug, -vvv+: trace)
    #[arg(short = 'v', long = "verbose", action = clap::ArgAction::Count)]
    pub verbosity: u8,

    /// Custom configuration directory (overrides default platform paths)
    #[arg(short = 'c', long = "config-dir", value_name = "DIR")]
    pub config_dir: Option<PathBuf>,
}

impl Args {
    pub fn events_path(&self) -> PathBuf {
        self.events_file
            .clone()
            .unwrap_or_else(|| PathBuf::from(DEFAULT_EVENTS_FILE))
    }
}
