use crate::geometry::{Point, Rect};

/// Compile-time layout tokens, not user-overridable.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct StyleTokens {
    pub spacing_2: i32,
    pub spacing_6: i32,
    pub spacing_8: i32,
    pub spacing_10: i32,
    pub spacing_12: i32,
    pub palette_width: i32,
    pub palette_height: i32,
    pub palette_top_offset: i32,
    pub picker_width: i32,
    pub picker_height: i32,
    pub window_radius: u16,
    pub control_radius: u16,
    pub border_width: u16,
    pub picker_outline_width: u16,
    pub checkbox_font_px: u16,
    pub checkbox_indicator_px: u16,
    pub tooltip_font_px: u16,
    pub mode_icon_min: i32,
    pub mode_icon_max: i32,
    pub mode_icon_divisor: i32,
}

pub const LAYOUT_TOKENS: StyleTokens = StyleTokens {
    spacing_2: 2,
    spacing_6: 6,
    spacing_8: 8,
    spacing_10: 10,
    spacing_12: 12,
    palette_width: 420,
    palette_height: 120,
    palette_top_offset: 24,
    picker_width: 600,
    picker_height: 350,
    window_radius: 12,
    control_radius: 6,
    border_width: 1,
    picker_outline_width: 2,
    checkbox_font_px: 14,
    checkbox_indicator_px: 16,
    tooltip_font_px: 13,
    mode_icon_min: 24,
    mode_icon_max: 64,
    mode_icon_divisor: 16,
};

/// Top-left corner for a window centered horizontally on `monitor`,
/// `top_offset` pixels below its top edge.
pub fn top_centered_origin(monitor: Rect, width: i32, top_offset: i32) -> Point {
    Point::new(
        monitor.x + (monitor.width - width) / 2,
        monitor.y + top_offset,
    )
}

pub fn centered_origin(monitor: Rect, width: i32, height: i32) -> Point {
    Point::new(
        monitor.x + (monitor.width - width) / 2,
        monitor.y + (monitor.height - height) / 2,
    )
}

pub fn palette_origin(tokens: StyleTokens, monitor: Rect) -> Point {
    top_centered_origin(monitor, tokens.palette_width, tokens.palette_top_offset)
}

/// Mode icons scale with the monitor's short edge.
pub fn mode_icon_size(tokens: StyleTokens, monitor: Option<Rect>) -> i32 {
    let Some(monitor) = monitor.filter(|rect| rect.has_area()) else {
        return tokens.mode_icon_min;
    };
    (monitor.width.min(monitor.height) / tokens.mode_icon_divisor)
        .clamp(tokens.mode_icon_min, tokens.mode_icon_max)
}
