//! Interactive window picker: stacking order, preview projection and click
//! resolution for one selection session.

use std::time::Duration;

use thiserror::Error;

use crate::geometry::{monitor_or_bounding_box, Point, Projection, Rect, Rgba};

mod session;

pub use session::{PickerHost, PickerSession};

pub const PREVIEW_WIDTH: i32 = 600;
pub const PREVIEW_HEIGHT: i32 = 350;
pub const TITLE_LABEL_MAX_CHARS: usize = 32;

/// Delay between the highlight of a pressed candidate and hiding the overlay.
pub const SELECTION_CONFIRM_DELAY: Duration = Duration::from_millis(1);
/// Delay between hiding the overlay and emitting the selection.
pub const CLOSE_CONFIRM_DELAY: Duration = Duration::from_millis(320);

pub const PREVIEW_BACKGROUND: Rgba = Rgba::new(25, 25, 25, 220);
pub const TILED_FILL: Rgba = Rgba::new(50, 150, 230, 140);
pub const FLOATING_FILL: Rgba = Rgba::new(230, 150, 40, 180);
pub const CANDIDATE_OUTLINE: Rgba = Rgba::new(255, 255, 255, 255);

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct WindowDescriptor {
    pub x: i32,
    pub y: i32,
    pub width: i32,
    pub height: i32,
    pub floating: bool,
    pub creation_order: i64,
    pub title: String,
}

impl WindowDescriptor {
    pub fn rect(&self) -> Rect {
        Rect::new(self.x, self.y, self.width, self.height)
    }

    pub fn label(&self) -> String {
        self.title.chars().take(TITLE_LABEL_MAX_CHARS).collect()
    }
}

/// Indices of `windows` from bottom to top: tiled before floating, then by
/// ascending creation order. Equal keys keep enumeration order.
pub fn stacking_order(windows: &[WindowDescriptor]) -> Vec<usize> {
    let mut order: Vec<usize> = (0..windows.len()).collect();
    order.sort_by_key(|&index| {
        let window = &windows[index];
        (window.floating, window.creation_order)
    });
    order
}

pub fn candidate_fill(floating: bool, selected: bool) -> Rgba {
    let fill = if floating { FLOATING_FILL } else { TILED_FILL };
    if selected {
        fill.with_alpha(255)
    } else {
        fill
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PickerState {
    Idle,
    Displaying,
    Selecting,
    Closing,
    Selected,
    Cancelled,
}

impl PickerState {
    pub const fn is_terminal(self) -> bool {
        matches!(self, Self::Selected | Self::Cancelled)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PickerOutcome {
    Selected(Rect),
    Cancelled,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
pub enum PickerError {
    #[error("no windows available for selection")]
    NoCandidates,
}

/// A candidate as it appears on the preview canvas.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PickerCandidate {
    pub index: usize,
    pub preview: Rect,
    pub label: String,
    pub floating: bool,
    pub selected: bool,
}

#[derive(Debug, Clone)]
pub struct WindowPicker {
    windows: Vec<WindowDescriptor>,
    order: Vec<usize>,
    monitor: Rect,
    projection: Projection,
    state: PickerState,
    selected: Option<usize>,
}

impl WindowPicker {
    pub fn new(windows: Vec<WindowDescriptor>, monitor: Option<Rect>) -> Result<Self, PickerError> {
        Self::with_preview_size(windows, monitor, PREVIEW_WIDTH, PREVIEW_HEIGHT)
    }

    pub fn with_preview_size(
        windows: Vec<WindowDescriptor>,
        monitor: Option<Rect>,
        preview_width: i32,
        preview_height: i32,
    ) -> Result<Self, PickerError> {
        if windows.is_empty() {
            return Err(PickerError::NoCandidates);
        }
        let monitor = monitor_or_bounding_box(monitor, windows.iter().map(WindowDescriptor::rect));
        let projection = Projection::new(monitor, preview_width, preview_height);
        let order = stacking_order(&windows);
        tracing::debug!(
            candidates = windows.len(),
            monitor = ?monitor,
            scale_x = projection.scale_x(),
            scale_y = projection.scale_y(),
            "window picker prepared"
        );
        Ok(Self {
            windows,
            order,
            monitor,
            projection,
            state: PickerState::Idle,
            selected: None,
        })
    }

    pub fn state(&self) -> PickerState {
        self.state
    }

    pub fn monitor(&self) -> Rect {
        self.monitor
    }

    pub fn projection(&self) -> Projection {
        self.projection
    }

    pub fn windows(&self) -> &[WindowDescriptor] {
        &self.windows
    }

    pub fn selected(&self) -> Option<usize> {
        self.selected
    }

    pub fn display(&mut self) -> bool {
        if self.state != PickerState::Idle {
            return false;
        }
        self.state = PickerState::Displaying;
        true
    }

    /// Candidates in paint order, bottom first.
    pub fn candidates(&self) -> Vec<PickerCandidate> {
        self.order
            .iter()
            .map(|&index| {
                let window = &self.windows[index];
                PickerCandidate {
                    index,
                    preview: self.projection.project(window.rect()),
                    label: window.label(),
                    floating: window.floating,
                    selected: self.selected == Some(index),
                }
            })
            .collect()
    }

    /// Topmost candidate whose preview rectangle contains `point`.
    pub fn hit_test(&self, point: Point) -> Option<usize> {
        self.order.iter().rev().copied().find(|&index| {
            self.projection
                .project(self.windows[index].rect())
                .contains(point)
        })
    }

    pub fn press(&mut self, point: Point) -> Option<usize> {
        if self.state != PickerState::Displaying {
            return None;
        }
        let index = self.hit_test(point)?;
        self.selected = Some(index);
        self.state = PickerState::Selecting;
        tracing::debug!(index, title = %self.windows[index].title, "window candidate pressed");
        Some(index)
    }

    pub fn begin_close(&mut self) -> bool {
        if self.state != PickerState::Selecting {
            return false;
        }
        self.state = PickerState::Closing;
        true
    }

    pub fn finish(&mut self) -> Option<PickerOutcome> {
        if self.state != PickerState::Closing {
            return None;
        }
        let index = self.selected?;
        self.state = PickerState::Selected;
        Some(PickerOutcome::Selected(self.windows[index].rect().normalized()))
    }

    pub fn cancel(&mut self) -> Option<PickerOutcome> {
        if self.state != PickerState::Displaying {
            return None;
        }
        self.state = PickerState::Cancelled;
        Some(PickerOutcome::Cancelled)
    }
}
