pub mod style;
pub mod widgets;

pub use style::{
    centered_origin, mode_icon_size, palette_origin, top_centered_origin, StyleTokens,
    LAYOUT_TOKENS,
};
pub use widgets::{
    icon_dirs, mode_toggle_button, option_check_button, resolve_mode_icon, ModeIcon,
};
