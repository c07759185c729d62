use std::path::{Path, PathBuf};

use gtk4::prelude::*;
use gtk4::{CheckButton, Image, ToggleButton};

use crate::capture::CaptureMode;
use crate::config::{config_env_dirs, packaged_data_dir, user_config_dir};

const ICON_SUBDIR: &str = "icons";
const ICON_EXTENSIONS: [&str; 2] = ["svg", "png"];

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ModeIcon {
    File(PathBuf),
    Themed(&'static str),
}

/// First existing `<base>.svg` / `<base>.png`, user directory before packaged.
pub fn resolve_icon_path(base: &str, user_dir: Option<&Path>, packaged_dir: &Path) -> Option<PathBuf> {
    user_dir
        .into_iter()
        .chain(std::iter::once(packaged_dir))
        .flat_map(|dir| {
            ICON_EXTENSIONS
                .iter()
                .map(move |extension| dir.join(format!("{base}.{extension}")))
        })
        .find(|candidate| candidate.is_file())
}

pub fn resolve_mode_icon(mode: CaptureMode, user_dir: Option<&Path>, packaged_dir: &Path) -> ModeIcon {
    resolve_icon_path(mode.icon_base(), user_dir, packaged_dir)
        .map(ModeIcon::File)
        .unwrap_or(ModeIcon::Themed(mode.fallback_icon_name()))
}

/// Icon directories: `~/.config/hyprsnipper/icons` and the packaged one.
pub fn icon_dirs() -> (Option<PathBuf>, PathBuf) {
    let (xdg_config_home, home) = config_env_dirs();
    let user = user_config_dir(xdg_config_home.as_deref(), home.as_deref())
        .ok()
        .map(|dir| dir.join(ICON_SUBDIR));
    (user, packaged_data_dir().join(ICON_SUBDIR))
}

pub fn mode_toggle_button(mode: CaptureMode, icon: &ModeIcon, icon_size: i32) -> ToggleButton {
    let image = match icon {
        ModeIcon::File(path) => Image::from_file(path),
        ModeIcon::Themed(name) => Image::from_icon_name(name),
    };
    image.set_pixel_size(icon_size);

    let button = ToggleButton::new();
    button.set_child(Some(&image));
    button.set_focus_on_click(false);
    button.set_active(false);
    button.set_tooltip_text(Some(mode.tooltip()));
    button.add_css_class("mode-button");
    button.set_hexpand(true);
    button
}

pub fn option_check_button(label: &str, active: bool) -> CheckButton {
    let check = CheckButton::with_label(label);
    check.set_active(active);
    check.set_focus_on_click(false);
    check.add_css_class("option-check");
    check
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;

    fn temp_root(name: &str) -> PathBuf {
        let root = std::env::temp_dir().join(format!(
            "hyprsnipper-icons-{name}-{}",
            std::process::id()
        ));
        let _ = fs::remove_dir_all(&root);
        root
    }

    #[test]
    fn icon_resolution_prefers_user_svg_then_png_then_packaged() {
        let root = temp_root("order");
        let user = root.join("user");
        let packaged = root.join("share");
        fs::create_dir_all(&user).unwrap();
        fs::create_dir_all(&packaged).unwrap();

        assert_eq!(resolve_icon_path("region", Some(user.as_path()), &packaged), None);

        fs::write(packaged.join("region.png"), b"png").unwrap();
        assert_eq!(
            resolve_icon_path("region", Some(user.as_path()), &packaged),
            Some(packaged.join("region.png"))
        );
        fs::write(packaged.join("region.svg"), b"svg").unwrap();
        assert_eq!(
            resolve_icon_path("region", Some(user.as_path()), &packaged),
            Some(packaged.join("region.svg"))
        );
        fs::write(user.join("region.png"), b"png").unwrap();
        assert_eq!(
            resolve_icon_path("region", Some(user.as_path()), &packaged),
            Some(user.join("region.png"))
        );
        fs::write(user.join("region.svg"), b"svg").unwrap();
        assert_eq!(
            resolve_icon_path("region", Some(user.as_path()), &packaged),
            Some(user.join("region.svg"))
        );

        let _ = fs::remove_dir_all(root);
    }

    #[test]
    fn missing_icons_fall_back_to_themed_names() {
        let root = temp_root("fallback");
        assert_eq!(
            resolve_mode_icon(CaptureMode::AllDisplays, None, &root),
            ModeIcon::Themed(CaptureMode::AllDisplays.fallback_icon_name())
        );
    }
}
