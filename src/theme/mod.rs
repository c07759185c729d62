use std::collections::BTreeMap;
use std::fs;
use std::io;
use std::path::{Path, PathBuf};

use serde_json::Value;
use thiserror::Error;

use crate::config::{config_env_dirs, packaged_data_dir, user_config_dir, Settings};

const PALETTE_FILE: &str = "palette.json";
const PALETTE_SECTION: &str = "palette";
pub const MISSING_COLOR: &str = "#fff";

const DEFAULT_COLORS: [(&str, &str); 9] = [
    ("background", "#1e1e1e"),
    ("primary", "#2196f3"),
    ("button_bg", "#23272e"),
    ("button_checked", "#2196f3"),
    ("button_hover", "#333333"),
    ("checkbox_fg", "#eeeeee"),
    ("icon_color", "#eeeeee"),
    ("tooltip_bg", "#23272e"),
    ("tooltip_fg", "#eeeeee"),
];

pub type ThemeResult<T> = std::result::Result<T, ThemeError>;

#[derive(Debug, Error)]
pub enum ThemeError {
    #[error("failed to read palette file: {path}")]
    ReadPalette { path: PathBuf, source: io::Error },
    #[error("failed to parse palette file")]
    ParsePalette(#[from] serde_json::Error),
    #[error("palette file must contain a JSON object")]
    NotAnObject,
}

/// Named colors used to style the control palette.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Palette {
    colors: BTreeMap<String, String>,
}

impl Default for Palette {
    fn default() -> Self {
        Self {
            colors: DEFAULT_COLORS
                .iter()
                .map(|(key, value)| (key.to_string(), value.to_string()))
                .collect(),
        }
    }
}

impl Palette {
    /// Color for `key`, or `#fff` when the palette does not define it.
    pub fn get(&self, key: &str) -> &str {
        self.colors.get(key).map_or(MISSING_COLOR, String::as_str)
    }

    pub fn merge(&mut self, overrides: BTreeMap<String, String>) {
        self.colors.extend(overrides);
    }

    pub fn load(settings: &Settings) -> Self {
        let (xdg_config_home, home) = config_env_dirs();
        let user_dir = user_config_dir(xdg_config_home.as_deref(), home.as_deref()).ok();
        Self::load_with(
            settings.palette_file.as_deref(),
            user_dir.as_deref(),
            &packaged_data_dir(),
        )
    }

    pub fn load_with(
        palette_file: Option<&Path>,
        user_dir: Option<&Path>,
        packaged_dir: &Path,
    ) -> Self {
        let mut palette = Self::default();
        let path = resolve_palette_path(palette_file, user_dir, packaged_dir);
        if !path.exists() {
            tracing::debug!(path = %path.display(), "palette file not found; using built-in colors");
            return palette;
        }
        match load_palette_file(&path) {
            Ok(overrides) => {
                tracing::debug!(path = %path.display(), keys = overrides.len(), "palette loaded");
                palette.merge(overrides);
            }
            Err(err) => {
                tracing::warn!(?err, path = %path.display(), "failed to load palette; using built-in colors");
            }
        }
        palette
    }
}

/// Picks the palette file: an absolute `palette_file` as-is, a relative one
/// under the user dir when present there and otherwise under the packaged
/// dir. Without `palette_file` the user's `palette.json` wins over the
/// packaged one.
pub fn resolve_palette_path(
    palette_file: Option<&Path>,
    user_dir: Option<&Path>,
    packaged_dir: &Path,
) -> PathBuf {
    let relative = match palette_file {
        Some(path) if path.is_absolute() => return path.to_path_buf(),
        Some(path) => path,
        None => Path::new(PALETTE_FILE),
    };
    if let Some(candidate) = user_dir
        .map(|dir| dir.join(relative))
        .filter(|candidate| candidate.exists())
    {
        return candidate;
    }
    packaged_dir.join(relative)
}

/// Reads string colors from a flat JSON object or from its `palette` section.
pub fn load_palette_file(path: &Path) -> ThemeResult<BTreeMap<String, String>> {
    let serialized = fs::read_to_string(path).map_err(|source| ThemeError::ReadPalette {
        path: path.to_path_buf(),
        source,
    })?;
    parse_palette(&serialized)
}

fn parse_palette(serialized: &str) -> ThemeResult<BTreeMap<String, String>> {
    let raw: Value = serde_json::from_str(serialized)?;
    let object = match raw.get(PALETTE_SECTION) {
        Some(Value::Object(section)) => section,
        _ => raw.as_object().ok_or(ThemeError::NotAnObject)?,
    };
    Ok(object
        .iter()
        .filter_map(|(key, value)| {
            value
                .as_str()
                .map(|color| (key.to_string(), color.trim().to_string()))
        })
        .collect())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn fixture_root() -> PathBuf {
        let mut path = std::env::temp_dir();
        let nanos = std::time::SystemTime::now()
            .duration_since(std::time::SystemTime::UNIX_EPOCH)
            .map_or(0, |d| d.as_nanos());
        let pid = std::process::id();
        path.push(format!("hyprsnipper-theme-{pid}-{nanos}"));
        path
    }

    fn with_temp_root<F: FnOnce(&Path)>(f: F) {
        let root = fixture_root();
        fs::create_dir_all(&root).unwrap();
        f(&root);
        let _ = fs::remove_dir_all(&root);
    }

    #[test]
    fn default_palette_has_builtin_colors_and_white_fallback() {
        let palette = Palette::default();
        assert_eq!(palette.get("background"), "#1e1e1e");
        assert_eq!(palette.get("button_checked"), "#2196f3");
        assert_eq!(palette.get("tooltip_fg"), "#eeeeee");
        assert_eq!(palette.get("unknown"), MISSING_COLOR);
    }

    #[test]
    fn parse_palette_accepts_section_and_flat_objects() {
        let section = parse_palette(r##"{"palette":{"primary":"#ff0000","size":3}}"##).unwrap();
        assert_eq!(section.get("primary").map(String::as_str), Some("#ff0000"));
        assert!(!section.contains_key("size"));

        let flat = parse_palette(r##"{"background":" #000000 "}"##).unwrap();
        assert_eq!(flat.get("background").map(String::as_str), Some("#000000"));

        assert!(matches!(parse_palette("[1,2]"), Err(ThemeError::NotAnObject)));
        assert!(matches!(parse_palette("{"), Err(ThemeError::ParsePalette(_))));
    }

    #[test]
    fn resolve_palette_path_prefers_user_then_packaged() {
        with_temp_root(|root| {
            let user_dir = root.join("user");
            let packaged_dir = root.join("share");
            fs::create_dir_all(&user_dir).unwrap();

            assert_eq!(
                resolve_palette_path(None, Some(user_dir.as_path()), &packaged_dir),
                packaged_dir.join(PALETTE_FILE)
            );
            fs::write(user_dir.join(PALETTE_FILE), "{}").unwrap();
            assert_eq!(
                resolve_palette_path(None, Some(user_dir.as_path()), &packaged_dir),
                user_dir.join(PALETTE_FILE)
            );
            assert_eq!(
                resolve_palette_path(Some(Path::new("nord.json")), Some(user_dir.as_path()), &packaged_dir),
                packaged_dir.join("nord.json")
            );
            assert_eq!(
                resolve_palette_path(Some(Path::new("/etc/nord.json")), Some(user_dir.as_path()), &packaged_dir),
                PathBuf::from("/etc/nord.json")
            );
        });
    }

    #[test]
    fn load_with_merges_overrides_over_defaults() {
        with_temp_root(|root| {
            fs::write(
                root.join("dark.json"),
                r##"{"palette":{"primary":"#123456","accent":"#abcdef"}}"##,
            )
            .unwrap();

            let palette = Palette::load_with(Some(Path::new("dark.json")), Some(root), root);
            assert_eq!(palette.get("primary"), "#123456");
            assert_eq!(palette.get("accent"), "#abcdef");
            assert_eq!(palette.get("background"), "#1e1e1e");
        });
    }

    #[test]
    fn load_with_keeps_defaults_for_malformed_file() {
        with_temp_root(|root| {
            fs::write(root.join(PALETTE_FILE), "not json").unwrap();
            let palette = Palette::load_with(None, Some(root), &root.join("share"));
            assert_eq!(palette, Palette::default());
        });
    }
}
