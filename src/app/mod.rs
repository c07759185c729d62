use std::cell::RefCell;
use std::path::PathBuf;
use std::rc::Rc;
use std::sync::Arc;
use std::time::Duration;

use crate::capture::{self, CaptureError, CaptureMode, CaptureTarget, PickerSource};
use crate::clipboard::WlCopyBackend;
use crate::config::Settings;
use crate::editor::SpawnEditorLauncher;
use crate::error::AppResult;
use crate::geometry::Rect;
use crate::notification::{DesktopNotifier, Notifier};
use crate::picker::{PickerOutcome, WindowPicker};
use crate::sequencer::{
    local_now, plan_for_mode, run_post_actions, CaptureDone, CaptureOptions, CaptureSequencer,
    ModePlan, PostActionServices, PostActionsDone, SequencerHost, NON_FULL_DISPLAY_SETTLE_DELAY,
    PICKER_LAUNCH_DELAY,
};
use crate::storage::StorageService;
use crate::ui::{StyleTokens, LAYOUT_TOKENS};
use gtk4::prelude::*;
use gtk4::{Application, EventControllerKey};

mod bootstrap;
mod hypr;
mod palette;
mod picker_overlay;
mod runtime_css;
mod worker;

use self::bootstrap::{bootstrap_app_runtime, AppBootstrap};
use self::palette::{build_palette_ui, PaletteUi};
use self::picker_overlay::open_picker_overlay;
use self::runtime_css::install_runtime_css;
use self::worker::spawn_worker_action;

const APPLICATION_ID: &str = "io.github.hyprsnipper";

/// Only argv[0] goes to GTK; the palette takes no command-line options.
fn gtk_launch_args() -> Vec<String> {
    std::env::args().take(1).collect()
}

struct GtkSequencerHost {
    palette: Rc<PaletteUi>,
    storage: StorageService,
    services: PostActionServices,
    notifier: Arc<dyn Notifier>,
}

impl SequencerHost for GtkSequencerHost {
    fn hide_ui(&self) {
        self.palette.hide();
    }

    fn show_ui(&self) {
        self.palette.show();
    }

    fn schedule(&self, delay: Duration, task: Box<dyn FnOnce()>) {
        gtk4::glib::timeout_add_local_once(delay, task);
    }

    fn notify(&self, message: &str) {
        self.notifier.notify(message);
    }

    fn run_capture(&self, target: CaptureTarget, done: CaptureDone) {
        let storage = self.storage.clone();
        spawn_worker_action(
            move || capture::capture(&storage, target),
            move |result| {
                done(result.unwrap_or_else(|err| {
                    tracing::error!(%err, ?target, "capture worker lost");
                    Err(CaptureError::WorkerLost)
                }))
            },
        );
    }

    fn run_post_actions(&self, path: PathBuf, options: CaptureOptions, done: PostActionsDone) {
        let services = self.services.clone();
        spawn_worker_action(
            move || run_post_actions(&services, &path, &options),
            move |report| match report {
                Ok(report) => done(report),
                Err(err) => {
                    tracing::error!(%err, "post-capture worker lost");
                    // Dropping `done` unwinds the sequencer to a restored palette.
                    drop(done);
                }
            },
        );
    }
}

/// Everything a mode button needs once the palette is on screen.
struct PaletteRuntime {
    app: Application,
    tokens: StyleTokens,
    palette: Rc<PaletteUi>,
    sequencer: CaptureSequencer<GtkSequencerHost>,
}

impl PaletteRuntime {
    fn fresh_options(&self, settings: &Settings) -> CaptureOptions {
        CaptureOptions::new(self.palette.toggles(), settings)
    }

    fn on_mode(self: &Rc<Self>, mode: CaptureMode) {
        let settings = Settings::load();
        tracing::info!(?mode, "capture mode requested");
        match plan_for_mode(mode, settings.window_animation_delay) {
            ModePlan::Capture { target, settle } => {
                let options = self.fresh_options(&settings);
                self.sequencer.request_capture(target, settle, options);
            }
            ModePlan::SelectRegion => self.select_region(),
            ModePlan::PickWindow => self.pick_window(),
        }
    }

    fn capture_selection(&self, rect: Rect) {
        let settings = Settings::load();
        let options = self.fresh_options(&settings);
        self.sequencer.request_capture(
            CaptureTarget::Region(rect),
            NON_FULL_DISPLAY_SETTLE_DELAY,
            options,
        );
    }

    fn select_region(self: &Rc<Self>) {
        if !self.sequencer.begin_picking() {
            return;
        }
        let runtime = self.clone();
        spawn_worker_action(capture::select_region, move |result| match result {
            Err(err) => {
                tracing::error!(%err, "region selection worker lost");
                runtime
                    .sequencer
                    .abort_picking(Some(&format!("Region selection failed: {err}")));
            }
            Ok(Ok(Some(rect))) => runtime.capture_selection(rect),
            Ok(Ok(None)) => {
                tracing::info!("region selection cancelled");
                runtime.sequencer.abort_picking(None);
            }
            Ok(Err(err)) => {
                tracing::warn!(?err, "region selection failed");
                runtime
                    .sequencer
                    .abort_picking(Some(&format!("Region selection failed: {err}")));
            }
        });
    }

    fn pick_window(self: &Rc<Self>) {
        if !self.sequencer.begin_picking() {
            return;
        }
        let runtime = self.clone();
        gtk4::glib::timeout_add_local_once(PICKER_LAUNCH_DELAY, move || {
            let runtime_for_result = runtime.clone();
            spawn_worker_action(capture::enumerate_windows, move |result| {
                runtime_for_result.open_picker(result.unwrap_or_else(|err| {
                    tracing::error!(%err, "window enumeration worker lost");
                    Err(CaptureError::WorkerLost)
                }));
            });
        });
    }

    fn open_picker(self: &Rc<Self>, result: Result<PickerSource, CaptureError>) {
        let source = match result {
            Ok(source) => source,
            Err(err) => {
                tracing::warn!(?err, "window enumeration failed");
                self.sequencer
                    .abort_picking(Some(&format!("Window selector failed: {err}")));
                return;
            }
        };
        let picker = match WindowPicker::with_preview_size(
            source.windows,
            source.monitor,
            self.tokens.picker_width,
            self.tokens.picker_height,
        ) {
            Ok(picker) => picker,
            Err(err) => {
                tracing::info!(?err, "window picker has nothing to show");
                self.sequencer
                    .abort_picking(Some("No windows found for selection."));
                return;
            }
        };

        let runtime = self.clone();
        open_picker_overlay(&self.app, self.tokens, picker, move |outcome| {
            tracing::info!(?outcome, "window picker finished");
            match outcome {
                PickerOutcome::Selected(rect) => runtime.capture_selection(rect),
                PickerOutcome::Cancelled => {
                    runtime.sequencer.abort_picking(None);
                }
            }
        });
    }
}

fn activate(app: &Application, bootstrap: AppBootstrap) {
    let tokens = LAYOUT_TOKENS;
    install_runtime_css(tokens, &bootstrap.palette);

    let palette = Rc::new(build_palette_ui(
        app,
        tokens,
        &bootstrap.settings,
        bootstrap.monitor,
    ));
    let services = PostActionServices {
        storage: Arc::new(bootstrap.storage.clone()),
        clipboard: Arc::new(WlCopyBackend::default()),
        editor: Arc::new(SpawnEditorLauncher),
        clock: local_now,
    };
    let host = GtkSequencerHost {
        palette: palette.clone(),
        storage: bootstrap.storage,
        services,
        notifier: Arc::new(DesktopNotifier),
    };
    let runtime = Rc::new(PaletteRuntime {
        app: app.clone(),
        tokens,
        palette: palette.clone(),
        sequencer: CaptureSequencer::new(host),
    });

    for (mode, button) in &palette.mode_buttons {
        let runtime = runtime.clone();
        let mode = *mode;
        button.connect_clicked(move |button| {
            if runtime.sequencer.is_busy() {
                tracing::info!(?mode, "ignoring mode click while a capture is in flight");
                button.set_active(false);
                return;
            }
            runtime.on_mode(mode);
        });
    }

    let keys = EventControllerKey::new();
    {
        let app = app.clone();
        keys.connect_key_pressed(move |_, key, _, _| {
            if key != gtk4::gdk::Key::Escape {
                return gtk4::glib::Propagation::Proceed;
            }
            tracing::info!("escape pressed; closing palette");
            app.quit();
            gtk4::glib::Propagation::Stop
        });
    }
    palette.window.add_controller(keys);
    {
        let app = app.clone();
        palette.window.connect_close_request(move |_| {
            app.quit();
            gtk4::glib::Propagation::Proceed
        });
    }

    tracing::info!("presenting capture palette");
    palette.show();
}

#[derive(Debug, Default)]
pub struct App;

impl App {
    pub fn new() -> Self {
        Self
    }

    pub fn start(&mut self) -> AppResult<()> {
        let bootstrap = Rc::new(RefCell::new(Some(bootstrap_app_runtime()?)));

        tracing::info!("starting gtk runtime");
        let application = Application::new(
            Some(APPLICATION_ID),
            gtk4::gio::ApplicationFlags::NON_UNIQUE,
        );
        application.connect_activate(move |app| {
            let Some(bootstrap) = bootstrap.borrow_mut().take() else {
                tracing::debug!("ignoring duplicate gtk activate signal");
                return;
            };
            activate(app, bootstrap);
        });

        let status = application.run_with_args(&gtk_launch_args());
        tracing::info!(?status, "gtk runtime exited");
        Ok(())
    }
}
