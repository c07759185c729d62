use gtk4::prelude::*;
use gtk4::{Align, Application, ApplicationWindow, Box as GtkBox, CheckButton, Orientation, ToggleButton};

use crate::capture::CaptureMode;
use crate::config::Settings;
use crate::geometry::Rect;
use crate::sequencer::CaptureToggles;
use crate::ui::{
    icon_dirs, mode_icon_size, mode_toggle_button, option_check_button, palette_origin,
    resolve_mode_icon, StyleTokens,
};

use super::hypr::request_window_floating_with_geometry;
use super::runtime_css::PALETTE_ROOT_CLASS;

pub(super) const PALETTE_WINDOW_TITLE: &str = "HyprSnipper";

pub(super) struct PaletteUi {
    pub(super) window: ApplicationWindow,
    pub(super) mode_buttons: Vec<(CaptureMode, ToggleButton)>,
    save_check: CheckButton,
    copy_check: CheckButton,
    edit_check: CheckButton,
    geometry: Option<Rect>,
}

impl PaletteUi {
    pub(super) fn toggles(&self) -> CaptureToggles {
        CaptureToggles {
            save: self.save_check.is_active(),
            copy: self.copy_check.is_active(),
            edit: self.edit_check.is_active(),
        }
    }

    pub(super) fn clear_mode_selection(&self) {
        for (_, button) in &self.mode_buttons {
            button.set_active(false);
        }
    }

    pub(super) fn hide(&self) {
        self.window.set_visible(false);
    }

    /// Shows the palette and re-applies its floating placement, which
    /// Hyprland drops when the window is unmapped.
    pub(super) fn show(&self) {
        self.clear_mode_selection();
        self.window.present();
        request_window_floating_with_geometry(
            "palette",
            PALETTE_WINDOW_TITLE,
            true,
            self.geometry,
        );
    }
}

/// Geometry of the palette on `monitor`: top-centred, fixed size.
pub(super) fn palette_geometry(tokens: StyleTokens, monitor: Rect) -> Rect {
    let origin = palette_origin(tokens, monitor);
    Rect::new(origin.x, origin.y, tokens.palette_width, tokens.palette_height)
}

pub(super) fn build_palette_ui(
    app: &Application,
    tokens: StyleTokens,
    settings: &Settings,
    monitor: Option<Rect>,
) -> PaletteUi {
    let window = ApplicationWindow::new(app);
    window.set_title(Some(PALETTE_WINDOW_TITLE));
    window.set_decorated(false);
    window.set_resizable(false);
    window.set_default_size(tokens.palette_width, tokens.palette_height);
    window.add_css_class(PALETTE_ROOT_CLASS);

    let root = GtkBox::new(Orientation::Vertical, tokens.spacing_8);
    root.add_css_class("palette-surface");

    let icon_size = mode_icon_size(tokens, monitor);
    let (user_icons, packaged_icons) = icon_dirs();
    let mode_row = GtkBox::new(Orientation::Horizontal, 0);
    mode_row.set_halign(Align::Fill);
    mode_row.set_vexpand(true);
    let mode_buttons = CaptureMode::ALL
        .iter()
        .map(|&mode| {
            let icon = resolve_mode_icon(mode, user_icons.as_deref(), &packaged_icons);
            tracing::debug!(?mode, ?icon, "resolved mode icon");
            let button = mode_toggle_button(mode, &icon, icon_size);
            mode_row.append(&button);
            (mode, button)
        })
        .collect::<Vec<_>>();

    let save_check = option_check_button("Save", settings.save_enabled);
    let copy_check = option_check_button("Copy", settings.copy_enabled);
    let edit_check = option_check_button("Edit", settings.edit_enabled);
    let option_row = GtkBox::new(Orientation::Horizontal, tokens.spacing_6);
    option_row.set_halign(Align::Center);
    option_row.append(&save_check);
    option_row.append(&copy_check);
    option_row.append(&edit_check);

    root.append(&mode_row);
    root.append(&option_row);
    window.set_child(Some(&root));

    PaletteUi {
        window,
        mode_buttons,
        save_check,
        copy_check,
        edit_check,
        geometry: monitor.map(|monitor| palette_geometry(tokens, monitor)),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ui::LAYOUT_TOKENS;

    #[test]
    fn palette_geometry_is_fixed_size_and_top_centred() {
        assert_eq!(
            palette_geometry(LAYOUT_TOKENS, Rect::new(0, 0, 1920, 1080)),
            Rect::new(750, 24, 420, 120)
        );
        assert_eq!(
            palette_geometry(LAYOUT_TOKENS, Rect::new(1920, 0, 2560, 1440)),
            Rect::new(1920 + 1070, 24, 420, 120)
        );
    }
}
