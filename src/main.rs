use zmeview::cli::Args;
use zmeview::config::{self, ViewerSettings};
use zmeview::core::dvr::Control;
use zmeview::core::FrameDisplay;
use zmeview::core::event_bus::{BoxedEvent, EventBus};
use zmeview::core::frame_loader::{FrameLoader, LoadResult};
use zmeview::core::viewer::Viewer;
use zmeview::core::viewer_events::{ControlPressedEvent, TogglePauseEvent};
use zmeview::core::workers::Workers;
use zmeview::entities::EventList;
use zmeview::help;
use zmeview::main_events;
use zmeview::widgets::{controls_bar, event_links, ZoomState};

use anyhow::Context as _;
use clap::Parser;
use eframe::egui;
use log::{debug, error, info, trace};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::{Duration, Instant};

/// Poll interval while a decode is outstanding
const LOADER_POLL: Duration = Duration::from_millis(5);

const SHORTCUTS: [(egui::Key, Control); 6] = [
    (egui::Key::PageUp, Control::PrevEvent),
    (egui::Key::J, Control::FastReverse),
    (egui::Key::ArrowLeft, Control::StepReverse),
    (egui::Key::ArrowRight, Control::StepForward),
    (egui::Key::L, Control::FastForward),
    (egui::Key::PageDown, Control::NextEvent),
];

/// Main application state
struct ZmeviewApp {
    viewer: Option<Viewer<FrameLoader>>,
    event_bus: EventBus,
    settings: ViewerSettings,
    zoom: ZoomState,
    /// Set by the viewer's event-changed listener
    zoom_stale: Arc<AtomicBool>,
    texture: Option<egui::TextureHandle>,
    /// Source of the image currently uploaded (or last failed)
    shown_path: Option<String>,
    error_msg: Option<String>,
}

impl ZmeviewApp {
    fn new(args: &Args, settings: ViewerSettings) -> Self {
        let event_bus = EventBus::new();
        let zoom_stale = Arc::new(AtomicBool::new(false));
        let zoom = ZoomState::new(settings.zoom);

        let (viewer, error_msg) = match build_viewer(args, &settings, &event_bus) {
            Ok(viewer) => (Some(viewer), None),
            Err(e) => {
                error!("{:#}", e);
                (None, Some(format!("{:#}", e)))
            }
        };

        if let Some(viewer) = &viewer {
            let stale = Arc::clone(&zoom_stale);
            viewer.on_event_changed(move |_, _| stale.store(true, Ordering::Release));
        }

        let mut app = Self {
            viewer,
            event_bus,
            settings,
            zoom,
            zoom_stale,
            texture: None,
            shown_path: None,
            error_msg,
        };

        if let (Some(index), Some(viewer)) = (args.event, app.viewer.as_mut()) {
            info!("Starting with event index {}", index);
            let _ = viewer.play_event(index);
        }
        app
    }

    fn handle_keyboard(&mut self, ctx: &egui::Context) {
        if ctx.wants_keyboard_input() {
            return;
        }
        let (controls, toggle_pause, toggle_help) = ctx.input(|i| {
            let controls: Vec<Control> = SHORTCUTS
                .iter()
                .filter(|(key, _)| i.key_pressed(*key))
                .map(|(_, control)| *control)
                .collect();
            let toggle_pause = i.key_pressed(egui::Key::K) || i.key_pressed(egui::Key::Space);
            (controls, toggle_pause, i.key_pressed(egui::Key::F1))
        });

        for control in controls {
            self.event_bus.emit(ControlPressedEvent(control));
        }
        if toggle_pause {
            self.event_bus.emit(TogglePauseEvent);
        }
        if toggle_help {
            self.settings.show_help = !self.settings.show_help;
        }
    }

    fn handle_events(&mut self) {
        let Some(viewer) = self.viewer.as_mut() else {
            // nothing to drive; keep the queue from growing
            let _ = self.event_bus.poll();
            return;
        };
        for event in self.event_bus.poll() {
            if !main_events::handle_viewer_event(&event, viewer) {
                trace!("Unhandled event: {}", (*event).type_name());
            }
        }
    }

    /// Upload a finished decode, or report a failed one back to the viewer
    fn poll_loader(&mut self, ctx: &egui::Context) {
        let Some(viewer) = self.viewer.as_mut() else {
            return;
        };
        let Some(result) = viewer.display().poll() else {
            return;
        };
        match result {
            LoadResult::Loaded(frame) => {
                let size = [frame.image.width() as usize, frame.image.height() as usize];
                let image = egui::ColorImage::from_rgba_unmultiplied(size, frame.image.as_raw());
                match &mut self.texture {
                    Some(texture) => texture.set(image, egui::TextureOptions::LINEAR),
                    None => {
                        self.texture = Some(ctx.load_texture("zmframe", image, egui::TextureOptions::LINEAR))
                    }
                }
                self.zoom.observe(egui::vec2(size[0] as f32, size[1] as f32));
                self.shown_path = Some(frame.path);
            }
            LoadResult::Failed { path, error } => {
                debug!("{}: {}", path, error);
                self.shown_path = Some(path);
                let _ = viewer.handle_load_failure();
            }
        }
    }

    fn schedule_repaint(&self, ctx: &egui::Context) {
        let Some(viewer) = self.viewer.as_ref() else {
            return;
        };
        if viewer.display().source() != self.shown_path.as_deref() {
            ctx.request_repaint_after(LOADER_POLL);
        }
        if let Some(due) = viewer.next_due() {
            ctx.request_repaint_after(due.saturating_duration_since(Instant::now()));
        }
    }

    fn render(&mut self, ctx: &egui::Context) {
        let mut requests: Vec<BoxedEvent> = Vec::new();

        egui::SidePanel::left("event_links")
            .resizable(true)
            .default_width(220.0)
            .show(ctx, |ui| {
                let current = self.viewer.as_ref().and_then(|v| v.session()).map(|s| s.event_index);
                event_links::render(
                    ui,
                    self.viewer.as_ref().map(|v| v.events()),
                    current,
                    |evt| requests.push(evt),
                );
            });

        egui::TopBottomPanel::bottom("controls").show(ctx, |ui| {
            ui.horizontal(|ui| {
                if let Some(viewer) = self.viewer.as_ref() {
                    controls_bar::render(ui, viewer.controls(), |evt| requests.push(evt));
                }
                ui.separator();
                if self.zoom.render(ui) {
                    self.settings.zoom = self.zoom.zoom();
                    debug!("Zoom set to {}", self.zoom.zoom());
                }
            });
        });

        egui::CentralPanel::default().show(ctx, |ui| {
            if let Some(msg) = &self.error_msg {
                ui.colored_label(egui::Color32::from_rgb(255, 120, 120), msg);
                ui.separator();
            }
            egui::ScrollArea::both().show(ui, |ui| {
                if let (Some(texture), Some(size)) = (&self.texture, self.zoom.display_size()) {
                    ui.add(egui::Image::new(texture).fit_to_exact_size(size));
                }
            });
            if self.settings.show_help {
                egui::Area::new(egui::Id::new("help_overlay"))
                    .anchor(egui::Align2::RIGHT_TOP, [-8.0, 8.0])
                    .show(ctx, help::render_help_overlay);
            }
        });

        for evt in requests {
            self.event_bus.emit_boxed(evt);
        }
    }
}

impl eframe::App for ZmeviewApp {
    fn update(&mut self, ctx: &egui::Context, _frame: &mut eframe::Frame) {
        self.handle_keyboard(ctx);
        self.handle_events();
        if let Some(viewer) = self.viewer.as_mut() {
            viewer.update(Instant::now());
        }
        // before polling: the new event's first image must set the base size
        if self.zoom_stale.swap(false, Ordering::AcqRel) {
            self.zoom.reapply();
        }
        self.poll_loader(ctx);
        self.render(ctx);
        if self.event_bus.queue_len() > 0 {
            ctx.request_repaint();
        }
        self.schedule_repaint(ctx);
    }

    fn save(&mut self, storage: &mut dyn eframe::Storage) {
        if let Ok(json) = serde_json::to_string(&self.settings) {
            storage.set_string(eframe::APP_KEY, json);
            debug!(
                "Settings saved: fps={}, zoom={}, help={}",
                self.settings.fps, self.settings.zoom, self.settings.show_help
            );
        }
    }
}

fn build_viewer(args: &Args, settings: &ViewerSettings, bus: &EventBus) -> anyhow::Result<Viewer<FrameLoader>> {
    let path = args.events_path();
    let events = EventList::from_json(&path)?;
    info!("Loaded {} events from {}", events.len(), path.display());

    let workers = Workers::with_default_threads().context("Failed to start frame loader threads")?;
    let viewer = Viewer::new(events, FrameLoader::new(workers), settings, bus)?;
    Ok(viewer)
}

fn main() -> Result<(), Box<dyn std::error::Error>> {
    // Parse command-line arguments first (needed for log setup)
    let args = Args::parse();

    let path_config = config::PathConfig::from_env_and_cli(args.config_dir.clone());
    if let Err(e) = config::ensure_dirs(&path_config) {
        eprintln!("Warning: Failed to create application directories: {}", e);
    }

    // 0 (default) = warn, 1 (-v) = info, 2 (-vv) = debug, 3+ (-vvv) = trace
    let log_level = match args.verbosity {
        0 => log::LevelFilter::Warn,
        1 => log::LevelFilter::Info,
        2 => log::LevelFilter::Debug,
        _ => log::LevelFilter::Trace,
    };

    if let Some(log_path_opt) = &args.log_file {
        let log_path = log_path_opt
            .as_ref()
            .cloned()
            .unwrap_or_else(|| config::config_file("zmeview.log", &path_config));

        let file = std::fs::File::create(&log_path)
            .map_err(|e| format!("Failed to create log file {}: {}", log_path.display(), e))?;

        env_logger::Builder::new()
            .filter_level(log_level)
            .filter_module("egui", log::LevelFilter::Info) // Suppress egui DEBUG spam
            .filter_module("eframe", log::LevelFilter::Info)
            .format_timestamp_millis()
            .target(env_logger::Target::Pipe(Box::new(file)))
            .init();

        info!("Logging to file: {} (level: {:?})", log_path.display(), log_level);
    } else {
        // Console logging (respects RUST_LOG if set)
        let default_level = match args.verbosity {
            0 => "warn",
            1 => "info",
            2 => "debug",
            _ => "trace",
        };

        env_logger::Builder::from_env(env_logger::Env::default().default_filter_or(default_level))
            .filter_module("egui", log::LevelFilter::Info)
            .filter_module("eframe", log::LevelFilter::Info)
            .format_timestamp_millis()
            .init();
    }

    info!("zmeview {} starting", env!("CARGO_PKG_VERSION"));
    debug!("Command-line args: {:?}", args);
    info!(
        "Config path: {}",
        config::config_file("zmeview.json", &path_config).display()
    );

    let native_options = eframe::NativeOptions {
        viewport: egui::ViewportBuilder::default()
            .with_title(format!("zmeview v{} • F1 for help", env!("CARGO_PKG_VERSION")))
            .with_inner_size([1024.0, 720.0])
            .with_resizable(true),
        persist_window: true,
        persistence_path: Some(config::config_file("zmeview.json", &path_config)),
        ..Default::default()
    };

    eframe::run_native(
        "zmeview",
        native_options,
        Box::new(move |cc| {
            let mut settings = cc
                .storage
                .and_then(|storage| storage.get_string(eframe::APP_KEY))
                .and_then(|json| ViewerSettings::from_json(&json).ok())
                .unwrap_or_else(|| {
                    info!("No persisted settings found, using defaults");
                    ViewerSettings::default()
                });
            if let Some(fps) = args.fps {
                settings.fps = fps;
                settings = settings.sanitized();
            }
            Ok(Box::new(ZmeviewApp::new(&args, settings)))
        }),
    )?;

    Ok(())
}
