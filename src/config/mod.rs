//! Layered settings lookup.
//!
//! Keys are resolved from the user's `settings.json`, then the packaged
//! default file, then `SNIP_*` environment variables, then the caller's
//! default. A value of the wrong JSON type is skipped as if it were absent.

use std::path::{Path, PathBuf};
use std::time::Duration;

use serde::de::DeserializeOwned;
use serde_json::{Map, Value};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum ConfigPathError {
    MissingHomeDirectory,
}

pub(crate) const APP_DIR: &str = "hyprsnipper";
const SETTINGS_FILE: &str = "settings.json";
const PACKAGED_DATA_DIR: &str = "/usr/share/hyprsnipper";
const DATA_DIR_ENV: &str = "HYPRSNIPPER_DATA_DIR";

pub const KEY_SAVE_DIR: &str = "SAVE_DIR";
pub const KEY_EDITOR: &str = "EDITOR";
pub const KEY_COPY_TO_CLIPBOARD: &str = "COPY_TO_CLIPBOARD";
pub const KEY_SAVE_ENABLED: &str = "SAVE_ENABLED";
pub const KEY_COPY_ENABLED: &str = "COPY_ENABLED";
pub const KEY_EDIT_ENABLED: &str = "EDIT_ENABLED";
pub const KEY_WINDOW_ANIMATION_DELAY: &str = "WINDOW_ANIMATION_DELAY";
pub const KEY_PALETTE_FILE: &str = "PALETTE_FILE";

const ENV_FALLBACKS: [(&str, &str); 2] = [(KEY_SAVE_DIR, "SNIP_SAVE_DIR"), (KEY_EDITOR, "SNIP_EDITOR")];

pub const DEFAULT_SAVE_DIR: &str = "~/Pictures/Screenshots";
pub const DEFAULT_EDITOR: &str = "swappy";
pub const DEFAULT_WINDOW_ANIMATION_DELAY_MS: u64 = 300;

#[derive(Debug, Clone, PartialEq)]
pub struct SettingsLayer {
    name: String,
    values: Map<String, Value>,
}

impl SettingsLayer {
    pub fn from_map(name: impl Into<String>, values: Map<String, Value>) -> Self {
        Self {
            name: name.into(),
            values,
        }
    }

    /// Reads a JSON object from `path`. Missing, unreadable or malformed
    /// files produce no layer.
    pub fn load(name: impl Into<String>, path: &Path) -> Option<Self> {
        let name = name.into();
        if !path.exists() {
            tracing::debug!(layer = %name, path = %path.display(), "settings file not present");
            return None;
        }
        let contents = match std::fs::read_to_string(path) {
            Ok(contents) => contents,
            Err(err) => {
                tracing::warn!(?err, path = %path.display(), "failed to read settings; skipping layer");
                return None;
            }
        };
        match serde_json::from_str::<Value>(&contents) {
            Ok(Value::Object(values)) => Some(Self::from_map(name, values)),
            Ok(_) => {
                tracing::warn!(path = %path.display(), "settings file is not a JSON object; skipping layer");
                None
            }
            Err(err) => {
                tracing::warn!(?err, path = %path.display(), "failed to parse settings; skipping layer");
                None
            }
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    fn value(&self, key: &str) -> Option<&Value> {
        self.values.get(key)
    }
}

#[derive(Debug, Clone, Default)]
pub struct SettingsResolver {
    layers: Vec<SettingsLayer>,
}

impl SettingsResolver {
    /// `layers` are ordered from highest to lowest precedence.
    pub fn new(layers: Vec<SettingsLayer>) -> Self {
        Self { layers }
    }

    pub fn load() -> Self {
        let (xdg_config_home, home) = config_env_dirs();
        Self::load_with(
            xdg_config_home.as_deref(),
            home.as_deref(),
            &packaged_data_dir(),
            |name| std::env::var(name).ok(),
        )
    }

    pub fn load_with<E>(
        xdg_config_home: Option<&Path>,
        home: Option<&Path>,
        packaged_dir: &Path,
        env: E,
    ) -> Self
    where
        E: Fn(&str) -> Option<String>,
    {
        let mut layers = Vec::new();
        match app_config_path(APP_DIR, SETTINGS_FILE, xdg_config_home, home) {
            Ok(path) => layers.extend(SettingsLayer::load("user", &path)),
            Err(err) => tracing::warn!(?err, "user settings path unavailable"),
        }
        layers.extend(SettingsLayer::load(
            "packaged",
            &packaged_dir.join(SETTINGS_FILE),
        ));

        let env_values: Map<String, Value> = ENV_FALLBACKS
            .iter()
            .filter_map(|(key, var)| env(var).map(|value| (key.to_string(), Value::String(value))))
            .collect();
        if !env_values.is_empty() {
            layers.push(SettingsLayer::from_map("environment", env_values));
        }

        Self::new(layers)
    }

    pub fn get<T: DeserializeOwned>(&self, key: &str, default: T) -> T {
        self.lookup(key).unwrap_or(default)
    }

    pub fn lookup<T: DeserializeOwned>(&self, key: &str) -> Option<T> {
        for layer in &self.layers {
            let Some(value) = layer.value(key) else {
                continue;
            };
            match serde_json::from_value::<T>(value.clone()) {
                Ok(resolved) => return Some(resolved),
                Err(err) => {
                    tracing::warn!(key, layer = layer.name(), %err, "setting has the wrong type; ignoring");
                }
            }
        }
        None
    }
}

/// Typed view of every setting, resolved fresh for each capture.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Settings {
    pub save_dir: PathBuf,
    pub editor: String,
    pub copy_to_clipboard: bool,
    pub save_enabled: bool,
    pub copy_enabled: bool,
    pub edit_enabled: bool,
    pub window_animation_delay: Duration,
    pub palette_file: Option<PathBuf>,
}

impl Settings {
    pub fn load() -> Self {
        let (_, home) = config_env_dirs();
        Self::resolve(&SettingsResolver::load(), home.as_deref())
    }

    pub fn resolve(resolver: &SettingsResolver, home: Option<&Path>) -> Self {
        let save_dir: String = resolver.get(KEY_SAVE_DIR, DEFAULT_SAVE_DIR.to_string());
        let palette_file = resolver
            .lookup::<String>(KEY_PALETTE_FILE)
            .filter(|value| !value.trim().is_empty())
            .map(|value| expand_home(value.trim(), home));

        Self {
            save_dir: expand_home(&save_dir, home),
            editor: resolver.get(KEY_EDITOR, DEFAULT_EDITOR.to_string()),
            copy_to_clipboard: resolver.get(KEY_COPY_TO_CLIPBOARD, true),
            save_enabled: resolver.get(KEY_SAVE_ENABLED, true),
            copy_enabled: resolver.get(KEY_COPY_ENABLED, true),
            edit_enabled: resolver.get(KEY_EDIT_ENABLED, false),
            window_animation_delay: Duration::from_millis(
                resolver.get(KEY_WINDOW_ANIMATION_DELAY, DEFAULT_WINDOW_ANIMATION_DELAY_MS),
            ),
            palette_file,
        }
    }
}

/// Expands a leading `~` against `home`. Other paths pass through unchanged.
pub fn expand_home(raw: &str, home: Option<&Path>) -> PathBuf {
    let Some(home) = home else {
        return PathBuf::from(raw);
    };
    if raw == "~" {
        return home.to_path_buf();
    }
    match raw.strip_prefix("~/") {
        Some(rest) => home.join(rest),
        None => PathBuf::from(raw),
    }
}

pub(crate) fn packaged_data_dir() -> PathBuf {
    std::env::var_os(DATA_DIR_ENV)
        .filter(|value| !value.is_empty())
        .map(PathBuf::from)
        .unwrap_or_else(|| PathBuf::from(PACKAGED_DATA_DIR))
}

pub(crate) fn user_config_dir(
    xdg_config_home: Option<&Path>,
    home: Option<&Path>,
) -> Result<PathBuf, ConfigPathError> {
    Ok(config_root(xdg_config_home, home)?.join(APP_DIR))
}

pub(crate) fn config_env_dirs() -> (Option<PathBuf>, Option<PathBuf>) {
    (
        std::env::var_os("XDG_CONFIG_HOME").map(PathBuf::from),
        std::env::var_os("HOME").map(PathBuf::from),
    )
}

pub(crate) fn app_config_path(
    app_dir: &str,
    file_name: &str,
    xdg_config_home: Option<&Path>,
    home: Option<&Path>,
) -> Result<PathBuf, ConfigPathError> {
    let mut path = config_root(xdg_config_home, home)?;
    path.push(app_dir);
    path.push(file_name);
    Ok(path)
}

fn config_root(
    xdg_config_home: Option<&Path>,
    home: Option<&Path>,
) -> Result<PathBuf, ConfigPathError> {
    if let Some(xdg) = xdg_config_home.filter(|path| !path.as_os_str().is_empty()) {
        return Ok(xdg.to_path_buf());
    }

    let home = home.ok_or(ConfigPathError::MissingHomeDirectory)?;
    Ok(home.join(".config"))
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn layer(name: &str, value: Value) -> SettingsLayer {
        match value {
            Value::Object(values) => SettingsLayer::from_map(name, values),
            other => panic!("layer must be an object, got {other}"),
        }
    }

    fn temp_root(name: &str) -> PathBuf {
        let root = std::env::temp_dir().join(format!(
            "hyprsnipper-config-{name}-{}",
            std::process::id()
        ));
        let _ = std::fs::remove_dir_all(&root);
        root
    }

    fn no_env(_: &str) -> Option<String> {
        None
    }

    #[test]
    fn app_config_path_prefers_xdg_config_home() {
        let path = app_config_path(
            APP_DIR,
            SETTINGS_FILE,
            Some(Path::new("/tmp/config-root")),
            Some(Path::new("/tmp/home")),
        )
        .expect("path should resolve");

        assert_eq!(
            path,
            PathBuf::from("/tmp/config-root/hyprsnipper/settings.json")
        );
    }

    #[test]
    fn app_config_path_falls_back_to_home_dot_config() {
        let path = app_config_path(APP_DIR, SETTINGS_FILE, None, Some(Path::new("/tmp/home")))
            .expect("path should resolve");

        assert_eq!(
            path,
            PathBuf::from("/tmp/home/.config/hyprsnipper/settings.json")
        );
    }

    #[test]
    fn app_config_path_errors_when_home_missing_and_xdg_unset() {
        let error = app_config_path(APP_DIR, SETTINGS_FILE, None, None).unwrap_err();
        assert_eq!(error, ConfigPathError::MissingHomeDirectory);
    }

    #[test]
    fn get_prefers_higher_layers() {
        let resolver = SettingsResolver::new(vec![
            layer("user", json!({"EDITOR": "gimp"})),
            layer("packaged", json!({"EDITOR": "swappy", "SAVE_ENABLED": false})),
        ]);

        assert_eq!(resolver.get(KEY_EDITOR, String::new()), "gimp");
        assert!(!resolver.get(KEY_SAVE_ENABLED, true));
        assert!(resolver.get(KEY_COPY_ENABLED, true));
    }

    #[test]
    fn wrong_type_falls_through_to_next_layer() {
        let resolver = SettingsResolver::new(vec![
            layer("user", json!({"WINDOW_ANIMATION_DELAY": "slow", "COPY_ENABLED": 1})),
            layer("packaged", json!({"WINDOW_ANIMATION_DELAY": 450})),
        ]);

        assert_eq!(resolver.get(KEY_WINDOW_ANIMATION_DELAY, 300_u64), 450);
        assert!(!resolver.get(KEY_COPY_ENABLED, false));
    }

    #[test]
    fn settings_resolve_uses_defaults_without_layers() {
        let settings = Settings::resolve(&SettingsResolver::default(), Some(Path::new("/home/u")));
        assert_eq!(
            settings,
            Settings {
                save_dir: PathBuf::from("/home/u/Pictures/Screenshots"),
                editor: "swappy".to_string(),
                copy_to_clipboard: true,
                save_enabled: true,
                copy_enabled: true,
                edit_enabled: false,
                window_animation_delay: Duration::from_millis(300),
                palette_file: None,
            }
        );
    }

    #[test]
    fn load_with_layers_user_packaged_and_environment() {
        let root = temp_root("layers");
        let user_dir = root.join("xdg").join(APP_DIR);
        let packaged_dir = root.join("share");
        std::fs::create_dir_all(&user_dir).unwrap();
        std::fs::create_dir_all(&packaged_dir).unwrap();
        std::fs::write(
            user_dir.join(SETTINGS_FILE),
            r#"{"EDIT_ENABLED": true, "PALETTE_FILE": "~/themes/dark.json"}"#,
        )
        .unwrap();
        std::fs::write(
            packaged_dir.join(SETTINGS_FILE),
            r#"{"EDIT_ENABLED": false, "WINDOW_ANIMATION_DELAY": 120, "EDITOR": "krita"}"#,
        )
        .unwrap();

        let resolver = SettingsResolver::load_with(
            Some(root.join("xdg").as_path()),
            None,
            &packaged_dir,
            |name| (name == "SNIP_SAVE_DIR").then(|| "/srv/shots".to_string()),
        );
        let settings = Settings::resolve(&resolver, Some(Path::new("/home/u")));

        assert!(settings.edit_enabled);
        assert_eq!(settings.editor, "krita");
        assert_eq!(settings.window_animation_delay, Duration::from_millis(120));
        assert_eq!(settings.save_dir, PathBuf::from("/srv/shots"));
        assert_eq!(
            settings.palette_file,
            Some(PathBuf::from("/home/u/themes/dark.json"))
        );

        let _ = std::fs::remove_dir_all(root);
    }

    #[test]
    fn malformed_layer_is_skipped() {
        let root = temp_root("malformed");
        let user_dir = root.join(APP_DIR);
        std::fs::create_dir_all(&user_dir).unwrap();
        std::fs::write(user_dir.join(SETTINGS_FILE), "{ not json").unwrap();

        let resolver = SettingsResolver::load_with(Some(root.as_path()), None, &root.join("missing"), no_env);
        assert_eq!(resolver.lookup::<String>(KEY_EDITOR), None);
        assert_eq!(resolver.get(KEY_EDITOR, DEFAULT_EDITOR.to_string()), "swappy");

        let _ = std::fs::remove_dir_all(root);
    }

    #[test]
    fn settings_file_values_beat_environment() {
        let resolver = SettingsResolver::new(vec![
            layer("user", json!({"SAVE_DIR": "/data/shots"})),
            layer("environment", json!({"SAVE_DIR": "/env/shots"})),
        ]);
        let settings = Settings::resolve(&resolver, None);
        assert_eq!(settings.save_dir, PathBuf::from("/data/shots"));
    }

    #[test]
    fn expand_home_handles_tilde_forms() {
        let home = Some(Path::new("/home/u"));
        assert_eq!(expand_home("~", home), PathBuf::from("/home/u"));
        assert_eq!(expand_home("~/Pictures", home), PathBuf::from("/home/u/Pictures"));
        assert_eq!(expand_home("/abs/path", home), PathBuf::from("/abs/path"));
        assert_eq!(expand_home("~other/x", home), PathBuf::from("~other/x"));
        assert_eq!(expand_home("~/Pictures", None), PathBuf::from("~/Pictures"));
    }
}
