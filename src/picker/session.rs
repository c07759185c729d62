use std::cell::RefCell;
use std::rc::Rc;
use std::time::Duration;

use crate::geometry::Point;

use super::{
    PickerOutcome, WindowPicker, CLOSE_CONFIRM_DELAY, SELECTION_CONFIRM_DELAY,
};

/// Presentation side of a picker session. Implemented by the GTK overlay and
/// by test doubles.
pub trait PickerHost {
    fn redraw(&self);
    fn hide_overlay(&self);
    fn close_overlay(&self);
    fn schedule(&self, delay: Duration, task: Box<dyn FnOnce()>);
}

type OutcomeCallback = Box<dyn FnOnce(PickerOutcome)>;

struct SessionInner<H> {
    picker: RefCell<WindowPicker>,
    host: H,
    on_outcome: RefCell<Option<OutcomeCallback>>,
}

/// Drives a [`WindowPicker`] through its timed close sequence and reports
/// exactly one outcome.
pub struct PickerSession<H: PickerHost + 'static> {
    inner: Rc<SessionInner<H>>,
}

impl<H: PickerHost + 'static> Clone for PickerSession<H> {
    fn clone(&self) -> Self {
        Self {
            inner: Rc::clone(&self.inner),
        }
    }
}

impl<H: PickerHost + 'static> PickerSession<H> {
    pub fn start<F>(mut picker: WindowPicker, host: H, on_outcome: F) -> Self
    where
        F: FnOnce(PickerOutcome) + 'static,
    {
        picker.display();
        let session = Self {
            inner: Rc::new(SessionInner {
                picker: RefCell::new(picker),
                host,
                on_outcome: RefCell::new(Some(Box::new(on_outcome))),
            }),
        };
        session.inner.host.redraw();
        session
    }

    pub fn with_picker<R>(&self, read: impl FnOnce(&WindowPicker) -> R) -> R {
        read(&self.inner.picker.borrow())
    }

    pub fn host(&self) -> &H {
        &self.inner.host
    }

    pub fn press(&self, point: Point) -> bool {
        let pressed = self.inner.picker.borrow_mut().press(point);
        if pressed.is_none() {
            return false;
        }
        self.inner.host.redraw();

        let session = self.clone();
        self.inner.host.schedule(
            SELECTION_CONFIRM_DELAY,
            Box::new(move || session.hide_after_selection()),
        );
        true
    }

    pub fn cancel(&self) -> bool {
        let outcome = self.inner.picker.borrow_mut().cancel();
        let Some(outcome) = outcome else {
            return false;
        };
        tracing::debug!("window picker cancelled");
        self.inner.host.close_overlay();
        self.emit(outcome);
        true
    }

    fn hide_after_selection(&self) {
        if !self.inner.picker.borrow_mut().begin_close() {
            return;
        }
        self.inner.host.hide_overlay();

        let session = self.clone();
        self.inner.host.schedule(
            CLOSE_CONFIRM_DELAY,
            Box::new(move || session.finish_selection()),
        );
    }

    fn finish_selection(&self) {
        let outcome = self.inner.picker.borrow_mut().finish();
        let Some(outcome) = outcome else {
            return;
        };
        self.inner.host.close_overlay();
        self.emit(outcome);
    }

    fn emit(&self, outcome: PickerOutcome) {
        let callback = self.inner.on_outcome.borrow_mut().take();
        if let Some(callback) = callback {
            callback(outcome);
        }
    }
}
