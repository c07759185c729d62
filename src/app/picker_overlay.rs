use std::cell::RefCell;
use std::rc::Rc;
use std::time::Duration;

use gtk4::prelude::*;
use gtk4::{Application, ApplicationWindow, DrawingArea, EventControllerKey, GestureClick};

use crate::geometry::{Point, Rect, Rgba};
use crate::picker::{
    candidate_fill, PickerCandidate, PickerHost, PickerOutcome, PickerSession, WindowPicker,
    CANDIDATE_OUTLINE, PREVIEW_BACKGROUND,
};
use crate::ui::{centered_origin, StyleTokens};

use super::hypr::request_window_floating_with_geometry;
use super::runtime_css::PICKER_ROOT_CLASS;

pub(super) const PICKER_WINDOW_TITLE: &str = "HyprSnipper Window Picker";
const LABEL_FONT_SIZE: f64 = 11.0;
const LABEL_PADDING: f64 = 4.0;

type SessionSlot = Rc<RefCell<Option<PickerSession<GtkPickerHost>>>>;

pub(super) struct GtkPickerHost {
    window: ApplicationWindow,
    area: DrawingArea,
}

impl PickerHost for GtkPickerHost {
    fn redraw(&self) {
        self.area.queue_draw();
    }

    fn hide_overlay(&self) {
        self.window.set_visible(false);
    }

    fn close_overlay(&self) {
        self.window.destroy();
    }

    fn schedule(&self, delay: Duration, task: Box<dyn FnOnce()>) {
        gtk4::glib::timeout_add_local_once(delay, task);
    }
}

fn set_source(context: &gtk4::cairo::Context, color: Rgba) {
    let (red, green, blue, alpha) = color.unit();
    context.set_source_rgba(red, green, blue, alpha);
}

fn draw_candidate(context: &gtk4::cairo::Context, candidate: &PickerCandidate, outline_width: f64) {
    let Rect {
        x,
        y,
        width,
        height,
    } = candidate.preview;
    let (x, y, width, height) = (f64::from(x), f64::from(y), f64::from(width), f64::from(height));

    set_source(context, candidate_fill(candidate.floating, candidate.selected));
    context.rectangle(x, y, width, height);
    let _ = context.fill();

    set_source(context, CANDIDATE_OUTLINE);
    context.set_line_width(outline_width);
    context.rectangle(x, y, width, height);
    let _ = context.stroke();

    if candidate.label.is_empty() {
        return;
    }
    context.save().ok();
    context.rectangle(x, y, width, height);
    context.clip();
    context.select_font_face(
        "Sans",
        gtk4::cairo::FontSlant::Normal,
        gtk4::cairo::FontWeight::Normal,
    );
    context.set_font_size(LABEL_FONT_SIZE);
    context.move_to(x + LABEL_PADDING, y + LABEL_PADDING + LABEL_FONT_SIZE);
    let _ = context.show_text(&candidate.label);
    context.restore().ok();
}

fn draw_picker(context: &gtk4::cairo::Context, picker: &WindowPicker, outline_width: f64) {
    set_source(context, PREVIEW_BACKGROUND);
    let _ = context.paint();
    for candidate in picker.candidates() {
        draw_candidate(context, &candidate, outline_width);
    }
}

fn current_session(slot: &SessionSlot) -> Option<PickerSession<GtkPickerHost>> {
    slot.borrow().clone()
}

/// Opens the picker preview for `picker` and reports its outcome once.
pub(super) fn open_picker_overlay<F>(
    app: &Application,
    tokens: StyleTokens,
    picker: WindowPicker,
    on_outcome: F,
) where
    F: FnOnce(PickerOutcome) + 'static,
{
    let monitor = picker.monitor();
    let window = ApplicationWindow::new(app);
    window.set_title(Some(PICKER_WINDOW_TITLE));
    window.set_decorated(false);
    window.set_resizable(false);
    window.set_default_size(tokens.picker_width, tokens.picker_height);
    window.add_css_class(PICKER_ROOT_CLASS);

    let area = DrawingArea::new();
    area.set_content_width(tokens.picker_width);
    area.set_content_height(tokens.picker_height);
    window.set_child(Some(&area));

    let slot: SessionSlot = Rc::new(RefCell::new(None));
    let outline_width = f64::from(tokens.picker_outline_width);
    {
        let slot = slot.clone();
        area.set_draw_func(move |_, context, _, _| {
            if let Some(session) = current_session(&slot) {
                session.with_picker(|picker| draw_picker(context, picker, outline_width));
            }
        });
    }

    let click = GestureClick::new();
    click.set_button(gtk4::gdk::BUTTON_PRIMARY);
    {
        let slot = slot.clone();
        click.connect_pressed(move |_, _, x, y| {
            if let Some(session) = current_session(&slot) {
                let point = Point::new(x.floor() as i32, y.floor() as i32);
                if !session.press(point) {
                    tracing::debug!(?point, "picker press missed every candidate");
                }
            }
        });
    }
    area.add_controller(click);

    let keys = EventControllerKey::new();
    {
        let slot = slot.clone();
        keys.connect_key_pressed(move |_, key, _, _| {
            if key != gtk4::gdk::Key::Escape {
                return gtk4::glib::Propagation::Proceed;
            }
            if let Some(session) = current_session(&slot) {
                session.cancel();
            }
            gtk4::glib::Propagation::Stop
        });
    }
    window.add_controller(keys);

    {
        let slot = slot.clone();
        window.connect_close_request(move |_| {
            // Closing from the compositor counts as Escape.
            match current_session(&slot) {
                Some(session) if session.cancel() => gtk4::glib::Propagation::Stop,
                _ => gtk4::glib::Propagation::Proceed,
            }
        });
    }
    {
        let slot = slot.clone();
        window.connect_destroy(move |_| {
            slot.borrow_mut().take();
        });
    }

    let host = GtkPickerHost {
        window: window.clone(),
        area,
    };
    let session = PickerSession::start(picker, host, on_outcome);
    slot.borrow_mut().replace(session);

    let origin = centered_origin(monitor, tokens.picker_width, tokens.picker_height);
    window.present();
    request_window_floating_with_geometry(
        "picker",
        PICKER_WINDOW_TITLE,
        true,
        Some(Rect::new(
            origin.x,
            origin.y,
            tokens.picker_width,
            tokens.picker_height,
        )),
    );
}
