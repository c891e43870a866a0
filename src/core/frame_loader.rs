//! Asynchronous frame display backed by the worker pool.
//!
//! `set_source` queues a decode and returns at once. Results come back over a
//! channel tagged with the epoch they were requested under; `poll` hands the
//! UI only results for the source currently set.

use crossbeam_channel::{unbounded, Receiver, Sender};
use image::RgbaImage;
use log::{debug, trace};
use std::path::Path;

use super::display::FrameDisplay;
use super::workers::Workers;

#[derive(Debug)]
pub struct LoadedFrame {
    pub path: String,
    pub image: RgbaImage,
}

#[derive(Debug)]
pub enum LoadResult {
    Loaded(LoadedFrame),
    Failed { path: String, error: String },
}

impl LoadResult {
    pub fn path(&self) -> &str {
        match self {
            LoadResult::Loaded(frame) => &frame.path,
            LoadResult::Failed { path, .. } => path,
        }
    }
}

struct Tagged {
    epoch: u64,
    result: LoadResult,
}

pub struct FrameLoader {
    workers: Workers,
    tx: Sender<Tagged>,
    rx: Receiver<Tagged>,
    source: Option<String>,
}

impl FrameLoader {
    pub fn new(workers: Workers) -> Self {
        let (tx, rx) = unbounded();
        Self {
            workers,
            tx,
            rx,
            source: None,
        }
    }

    /// Latest finished result for the current source, if any. Stale results are discarded.
    pub fn poll(&self) -> Option<LoadResult> {
        let current = self.workers.current_epoch();
        let mut latest = None;
        for tagged in self.rx.try_iter() {
            if tagged.epoch == current {
                latest = Some(tagged.result);
            } else {
                trace!("Dropping stale result for {}", tagged.result.path());
            }
        }
        latest
    }
}

impl FrameDisplay for FrameLoader {
    fn set_source(&mut self, path: &str) {
        let epoch = self.workers.bump_epoch();
        let tx = self.tx.clone();
        let request = path.to_string();
        self.workers.execute_with_epoch(epoch, move || {
            let result = decode(request);
            let _ = tx.send(Tagged { epoch, result });
        });
        self.source = Some(path.to_string());
    }

    fn source(&self) -> Option<&str> {
        self.source.as_deref()
    }
}

/// Filesystem path for a frame source (`file://` URLs accepted)
pub fn local_path(source: &str) -> &Path {
    Path::new(source.strip_prefix("file://").unwrap_or(source))
}

fn decode(path: String) -> LoadResult {
    match image::open(local_path(&path)) {
        Ok(img) => {
            let image = img.to_rgba8();
            trace!("Decoded {} ({}x{})", path, image.width(), image.height());
            LoadResult::Loaded(LoadedFrame { path, image })
        }
        Err(e) => {
            debug!("Decode failed for {}: {}", path, e);
            LoadResult::Failed {
                path,
                error: e.to_string(),
            }
        }
    }
}
