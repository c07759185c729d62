use std::path::{Path, PathBuf};
use std::sync::Arc;

use chrono::NaiveDateTime;

use crate::clipboard::ClipboardBackend;
use crate::config::Settings;
use crate::editor::EditorLauncher;
use crate::storage::CaptureStorage;

/// Live state of the palette's Save / Copy / Edit toggles.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CaptureToggles {
    pub save: bool,
    pub copy: bool,
    pub edit: bool,
}

impl CaptureToggles {
    pub fn from_settings(settings: &Settings) -> Self {
        Self {
            save: settings.save_enabled,
            copy: settings.copy_enabled,
            edit: settings.edit_enabled,
        }
    }
}

/// Everything the post-processing step needs, fixed for one capture.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CaptureOptions {
    pub save: bool,
    pub copy: bool,
    pub edit: bool,
    pub save_dir: PathBuf,
    pub editor: String,
    pub copy_to_clipboard_default: bool,
}

impl CaptureOptions {
    pub fn new(toggles: CaptureToggles, settings: &Settings) -> Self {
        Self {
            save: toggles.save,
            copy: toggles.copy,
            edit: toggles.edit,
            save_dir: settings.save_dir.clone(),
            editor: settings.editor.clone(),
            copy_to_clipboard_default: settings.copy_to_clipboard,
        }
    }

    /// Copy when asked to, or when nothing else would happen to the capture.
    pub fn should_copy(&self) -> bool {
        self.copy || (self.copy_to_clipboard_default && !self.save && !self.edit)
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PostActionOutcome {
    Saved(PathBuf),
    SaveFailed(String),
    Copied,
    CopyFailed(String),
    Opened(String),
    EditFailed(String),
}

impl PostActionOutcome {
    pub fn message(&self) -> String {
        match self {
            Self::Saved(path) => format!("Saved: {}", path.display()),
            Self::SaveFailed(cause) => format!("Save failed: {cause}"),
            Self::Copied => "Copied to clipboard".to_string(),
            Self::CopyFailed(cause) => format!("Copy failed: {cause}"),
            Self::Opened(editor) => format!("Opened in {editor}"),
            Self::EditFailed(cause) => format!("Edit failed: {cause}"),
        }
    }

    pub const fn is_failure(&self) -> bool {
        matches!(
            self,
            Self::SaveFailed(_) | Self::CopyFailed(_) | Self::EditFailed(_)
        )
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PostActionReport {
    pub outcomes: Vec<PostActionOutcome>,
    /// Where the capture ended up: the saved file, or the temp file.
    pub final_path: PathBuf,
    pub temp_discarded: bool,
}

#[derive(Clone)]
pub struct PostActionServices {
    pub storage: Arc<dyn CaptureStorage + Send + Sync>,
    pub clipboard: Arc<dyn ClipboardBackend + Send + Sync>,
    pub editor: Arc<dyn EditorLauncher + Send + Sync>,
    pub clock: fn() -> NaiveDateTime,
}

pub fn local_now() -> NaiveDateTime {
    chrono::Local::now().naive_local()
}

/// Runs save, copy and edit in that order. A failed action does not stop the
/// ones after it, and each action sees the file at its current location.
pub fn run_post_actions(
    services: &PostActionServices,
    temp_path: &Path,
    options: &CaptureOptions,
) -> PostActionReport {
    let mut outcomes = Vec::new();
    let mut current = temp_path.to_path_buf();
    let mut moved = false;
    let mut handed_to_editor = false;

    if options.save {
        match services
            .storage
            .save_capture(&current, &options.save_dir, (services.clock)())
        {
            Ok(saved) => {
                current = saved.clone();
                moved = true;
                outcomes.push(PostActionOutcome::Saved(saved));
            }
            Err(err) => {
                tracing::warn!(?err, "saving capture failed");
                outcomes.push(PostActionOutcome::SaveFailed(err.to_string()));
            }
        }
    }

    if options.should_copy() {
        match services.clipboard.copy_png_file(&current) {
            Ok(()) => outcomes.push(PostActionOutcome::Copied),
            Err(err) => {
                tracing::warn!(?err, "copying capture failed");
                outcomes.push(PostActionOutcome::CopyFailed(err.to_string()));
            }
        }
    }

    if options.edit {
        match services.editor.launch(&options.editor, &current) {
            Ok(()) => {
                handed_to_editor = true;
                outcomes.push(PostActionOutcome::Opened(options.editor.trim().to_string()));
            }
            Err(err) => {
                tracing::warn!(?err, "launching editor failed");
                outcomes.push(PostActionOutcome::EditFailed(err.to_string()));
            }
        }
    }

    let mut temp_discarded = false;
    if !moved && !handed_to_editor {
        match services.storage.discard_temp_capture(temp_path) {
            Ok(()) => temp_discarded = true,
            Err(err) => {
                tracing::warn!(?err, path = %temp_path.display(), "failed to discard temp capture");
            }
        }
    }

    PostActionReport {
        outcomes,
        final_path: current,
        temp_discarded,
    }
}
