//! Drives one capture at a time: hide the palette, let the compositor settle,
//! capture, post-process, then bring the palette back.

use std::cell::RefCell;
use std::path::PathBuf;
use std::rc::Rc;
use std::time::Duration;

use crate::capture::{CaptureArtifact, CaptureError, CaptureMode, CaptureTarget};
use crate::state::{SessionEvent, SessionState, StateMachine};

mod post_actions;

pub use post_actions::{
    local_now, run_post_actions, CaptureOptions, CaptureToggles, PostActionOutcome,
    PostActionReport, PostActionServices,
};

pub const NON_FULL_DISPLAY_SETTLE_DELAY: Duration = Duration::from_millis(100);
pub const RESTORE_DELAY: Duration = Duration::from_millis(100);
/// Time between hiding the palette and enumerating windows for the picker.
pub const PICKER_LAUNCH_DELAY: Duration = Duration::from_millis(150);

/// Full-display captures wait out the window-close animation; the rest only
/// need a short settle.
pub fn settle_delay(target: CaptureTarget, window_animation_delay: Duration) -> Duration {
    match target {
        CaptureTarget::FocusedMonitor => window_animation_delay,
        CaptureTarget::Region(_) | CaptureTarget::AllDisplays => NON_FULL_DISPLAY_SETTLE_DELAY,
    }
}

/// What clicking a mode button starts.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ModePlan {
    SelectRegion,
    PickWindow,
    Capture { target: CaptureTarget, settle: Duration },
}

pub fn plan_for_mode(mode: CaptureMode, window_animation_delay: Duration) -> ModePlan {
    let capture = |target| ModePlan::Capture {
        target,
        settle: settle_delay(target, window_animation_delay),
    };
    match mode {
        CaptureMode::Region => ModePlan::SelectRegion,
        CaptureMode::Window => ModePlan::PickWindow,
        CaptureMode::FullDisplay => capture(CaptureTarget::FocusedMonitor),
        CaptureMode::AllDisplays => capture(CaptureTarget::AllDisplays),
    }
}

fn failure_prefix(target: CaptureTarget) -> &'static str {
    match target {
        CaptureTarget::FocusedMonitor => "Full display capture failed",
        CaptureTarget::Region(_) | CaptureTarget::AllDisplays => "Screenshot failed",
    }
}

pub type CaptureDone = Box<dyn FnOnce(Result<CaptureArtifact, CaptureError>)>;
pub type PostActionsDone = Box<dyn FnOnce(PostActionReport)>;

/// Runs `on_lost` when dropped unless disarmed first.
struct CompletionGuard<F: FnOnce()> {
    on_lost: Option<F>,
}

impl<F: FnOnce()> CompletionGuard<F> {
    fn new(on_lost: F) -> Self {
        Self {
            on_lost: Some(on_lost),
        }
    }

    fn disarm(mut self) {
        self.on_lost = None;
    }
}

impl<F: FnOnce()> Drop for CompletionGuard<F> {
    fn drop(&mut self) {
        if let Some(on_lost) = self.on_lost.take() {
            on_lost();
        }
    }
}

/// Side effects the sequencer needs from its surroundings. Blocking work
/// (`run_capture`, `run_post_actions`) is expected to happen off the UI
/// thread with `done` invoked back on it. A host that drops `done` without
/// calling it is treated as a failed step and the palette is restored.
pub trait SequencerHost {
    fn hide_ui(&self);
    fn show_ui(&self);
    fn schedule(&self, delay: Duration, task: Box<dyn FnOnce()>);
    fn notify(&self, message: &str);
    fn run_capture(&self, target: CaptureTarget, done: CaptureDone);
    fn run_post_actions(&self, path: PathBuf, options: CaptureOptions, done: PostActionsDone);
}

struct SequencerInner<H> {
    machine: RefCell<StateMachine>,
    host: H,
}

pub struct CaptureSequencer<H: SequencerHost + 'static> {
    inner: Rc<SequencerInner<H>>,
}

impl<H: SequencerHost + 'static> Clone for CaptureSequencer<H> {
    fn clone(&self) -> Self {
        Self {
            inner: self.inner.clone(),
        }
    }
}

impl<H: SequencerHost + 'static> CaptureSequencer<H> {
    pub fn new(host: H) -> Self {
        Self {
            inner: Rc::new(SequencerInner {
                machine: RefCell::new(StateMachine::new()),
                host,
            }),
        }
    }

    pub fn host(&self) -> &H {
        &self.inner.host
    }

    pub fn state(&self) -> SessionState {
        self.inner.machine.borrow().state()
    }

    pub fn is_busy(&self) -> bool {
        !self.state().is_idle()
    }

    /// Hides the palette ahead of an interactive selection (region or window).
    pub fn begin_picking(&self) -> bool {
        if !self.advance(SessionEvent::BeginPicking) {
            tracing::info!(state = ?self.state(), "selection rejected; capture in flight");
            return false;
        }
        self.inner.host.hide_ui();
        true
    }

    /// Ends a selection without capturing and restores the palette shortly
    /// after, optionally telling the user why.
    pub fn abort_picking(&self, message: Option<&str>) -> bool {
        if !self.advance(SessionEvent::SelectionAborted) {
            return false;
        }
        if let Some(message) = message {
            self.inner.host.notify(message);
        }
        self.schedule_restore();
        true
    }

    /// Starts a capture from idle or from a finished selection. Returns false
    /// when another capture is still running.
    pub fn request_capture(
        &self,
        target: CaptureTarget,
        settle: Duration,
        options: CaptureOptions,
    ) -> bool {
        if !self.advance(SessionEvent::BeginCapture) {
            tracing::info!(state = ?self.state(), ?target, "capture rejected; capture in flight");
            return false;
        }
        self.inner.host.hide_ui();
        self.advance(SessionEvent::UiHidden);

        let sequencer = self.clone();
        self.inner.host.schedule(
            settle,
            Box::new(move || sequencer.start_capture(target, options)),
        );
        true
    }

    fn start_capture(&self, target: CaptureTarget, options: CaptureOptions) {
        if !self.advance(SessionEvent::SettleElapsed) {
            return;
        }
        let guard = {
            let sequencer = self.clone();
            let options = options.clone();
            CompletionGuard::new(move || {
                tracing::error!(?target, "capture completion dropped");
                sequencer.finish_capture(target, Err(CaptureError::WorkerLost), options);
            })
        };
        let sequencer = self.clone();
        self.inner.host.run_capture(
            target,
            Box::new(move |result| {
                guard.disarm();
                sequencer.finish_capture(target, result, options);
            }),
        );
    }

    fn finish_capture(
        &self,
        target: CaptureTarget,
        result: Result<CaptureArtifact, CaptureError>,
        options: CaptureOptions,
    ) {
        match result {
            Ok(artifact) => {
                if !self.advance(SessionEvent::CaptureSucceeded) {
                    return;
                }
                tracing::info!(
                    capture_id = %artifact.capture_id,
                    width = artifact.width,
                    height = artifact.height,
                    region = ?artifact.region,
                    created_at = artifact.created_at,
                    "capture complete"
                );
                let guard = {
                    let sequencer = self.clone();
                    let temp_path = artifact.temp_path.clone();
                    CompletionGuard::new(move || sequencer.post_actions_lost(temp_path))
                };
                let sequencer = self.clone();
                self.inner.host.run_post_actions(
                    artifact.temp_path,
                    options,
                    Box::new(move |report| {
                        guard.disarm();
                        sequencer.finish_post_actions(report);
                    }),
                );
            }
            Err(err) => {
                tracing::warn!(?err, ?target, "capture failed");
                if !self.advance(SessionEvent::CaptureFailed) {
                    return;
                }
                self.inner
                    .host
                    .notify(&format!("{}: {err}", failure_prefix(target)));
                self.schedule_restore();
            }
        }
    }

    fn finish_post_actions(&self, report: PostActionReport) {
        for outcome in &report.outcomes {
            self.inner.host.notify(&outcome.message());
        }
        tracing::info!(
            final_path = %report.final_path.display(),
            temp_discarded = report.temp_discarded,
            failures = report.outcomes.iter().filter(|outcome| outcome.is_failure()).count(),
            "post-capture actions finished"
        );
        if self.advance(SessionEvent::PostActionsFinished) {
            self.schedule_restore();
        }
    }

    fn post_actions_lost(&self, temp_path: PathBuf) {
        tracing::error!(path = %temp_path.display(), "post-capture completion dropped");
        self.inner
            .host
            .notify("Screenshot post-processing failed: worker exited without a result");
        self.finish_post_actions(PostActionReport {
            outcomes: Vec::new(),
            final_path: temp_path,
            temp_discarded: false,
        });
    }

    fn schedule_restore(&self) {
        let sequencer = self.clone();
        self.inner.host.schedule(
            RESTORE_DELAY,
            Box::new(move || {
                sequencer.inner.host.show_ui();
                sequencer.advance(SessionEvent::UiRestored);
            }),
        );
    }

    fn advance(&self, event: SessionEvent) -> bool {
        match self.inner.machine.borrow_mut().transition(event) {
            Ok(applied) => {
                tracing::debug!(from = ?applied.from, event = ?applied.event, to = ?applied.to, "sequencer advanced");
                true
            }
            Err(err) => {
                tracing::debug!(?err, "sequencer transition refused");
                false
            }
        }
    }
}
