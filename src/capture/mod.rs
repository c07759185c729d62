use std::path::{Path, PathBuf};
use std::process::{Command, Stdio};
use std::time::{SystemTime, UNIX_EPOCH};

use self::hyprland::{parse_active_workspace, parse_monitor_layout, parse_workspace_windows};
use crate::geometry::Rect;
use crate::picker::WindowDescriptor;
use crate::storage::{StorageError, StorageService};
use image::GenericImageView;
use thiserror::Error;

mod hyprland;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CaptureArtifact {
    pub capture_id: String,
    pub temp_path: PathBuf,
    pub width: u32,
    pub height: u32,
    /// Captured area in layout coordinates; `None` for the whole desktop.
    pub region: Option<Rect>,
    pub created_at: u64,
}

#[derive(Debug, Error)]
pub enum CaptureError {
    #[error("command failed: {command}: {message}")]
    CommandFailed { command: String, message: String },
    #[error("command io error: {command}: {source}")]
    CommandIo {
        command: String,
        #[source]
        source: std::io::Error,
    },
    #[error("no focused monitor found")]
    NoFocusedMonitor,
    #[error("invalid monitor metadata: {message}")]
    InvalidMonitorMetadata { message: String },
    #[error("invalid workspace metadata: {message}")]
    InvalidWorkspaceMetadata { message: String },
    #[error("invalid window metadata: {message}")]
    InvalidWindowMetadata { message: String },
    #[error("invalid capture artifact: {message}")]
    InvalidCaptureArtifact { message: String },
    #[error("invalid capture selection: {message}")]
    InvalidSelection { message: String },
    #[error("failed to read captured image dimensions: {message}")]
    ImageReadFailed { message: String },
    #[error("capture cache directory unavailable: {0}")]
    CacheDirectory(#[source] StorageError),
    #[error("capture worker exited without a result")]
    WorkerLost,
}

/// What a capture covers.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CaptureTarget {
    Region(Rect),
    FocusedMonitor,
    AllDisplays,
}

/// Modes offered by the control palette, in button order.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CaptureMode {
    Region,
    Window,
    FullDisplay,
    AllDisplays,
}

impl CaptureMode {
    pub const ALL: [CaptureMode; 4] = [
        CaptureMode::Region,
        CaptureMode::Window,
        CaptureMode::FullDisplay,
        CaptureMode::AllDisplays,
    ];

    pub const fn tooltip(self) -> &'static str {
        match self {
            Self::Region => "Region",
            Self::Window => "Window",
            Self::FullDisplay => "Full Display",
            Self::AllDisplays => "All Displays",
        }
    }

    pub const fn icon_base(self) -> &'static str {
        match self {
            Self::Region => "region",
            Self::Window => "window",
            Self::FullDisplay => "full",
            Self::AllDisplays => "alldisplays",
        }
    }

    pub const fn fallback_icon_name(self) -> &'static str {
        match self {
            Self::Region => "edit-select-all-symbolic",
            Self::Window => "focus-windows-symbolic",
            Self::FullDisplay => "video-display-symbolic",
            Self::AllDisplays => "view-grid-symbolic",
        }
    }
}

pub trait CaptureBackend {
    fn active_workspace_json(&self) -> Result<String, CaptureError>;
    fn clients_json(&self) -> Result<String, CaptureError>;
    fn monitors_json(&self) -> Result<String, CaptureError>;
    fn run_region_selection(&self) -> Result<String, CaptureError>;
    fn run_screen_capture(&self, geometry: Option<&str>, output: &Path)
        -> Result<(), CaptureError>;
    fn image_dimensions(&self, output: &Path) -> Result<(u32, u32), CaptureError>;
}

#[derive(Default)]
pub struct SystemCaptureBackend;

impl CaptureBackend for SystemCaptureBackend {
    fn active_workspace_json(&self) -> Result<String, CaptureError> {
        run_command_output("hyprctl", &["activeworkspace", "-j"])
    }

    fn clients_json(&self) -> Result<String, CaptureError> {
        run_command_output("hyprctl", &["clients", "-j"])
    }

    fn monitors_json(&self) -> Result<String, CaptureError> {
        run_command_output("hyprctl", &["monitors", "-j"])
    }

    fn run_region_selection(&self) -> Result<String, CaptureError> {
        run_command_output("slurp", &[])
    }

    fn run_screen_capture(
        &self,
        geometry: Option<&str>,
        output: &Path,
    ) -> Result<(), CaptureError> {
        match geometry {
            Some(geometry) => run_command_status("grim", &["-g", geometry], output),
            None => run_command_status("grim", &[], output),
        }
    }

    fn image_dimensions(&self, output: &Path) -> Result<(u32, u32), CaptureError> {
        let image = image::open(output).map_err(|err| CaptureError::ImageReadFailed {
            message: err.to_string(),
        })?;
        Ok(image.dimensions())
    }
}

/// Windows offered to the picker plus the monitor they live on.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PickerSource {
    pub windows: Vec<WindowDescriptor>,
    pub monitor: Option<Rect>,
}

pub fn format_geometry(rect: Rect) -> String {
    let rect = rect.normalized();
    format!("{},{} {}x{}", rect.x, rect.y, rect.width, rect.height)
}

pub fn parse_geometry(geometry: &str) -> Result<Rect, CaptureError> {
    let invalid = |message: String| CaptureError::InvalidSelection { message };

    let mut parts = geometry.split_whitespace();
    let (Some(position), Some(size), None) = (parts.next(), parts.next(), parts.next()) else {
        return Err(invalid(format!("invalid region geometry: {geometry}")));
    };
    let Some((x, y)) = position.split_once(',') else {
        return Err(invalid(format!("invalid region position: {position}")));
    };
    let Some((width, height)) = size.split_once('x') else {
        return Err(invalid(format!("invalid region size: {size}")));
    };

    let x = x
        .parse::<i32>()
        .map_err(|err| invalid(format!("invalid x coordinate '{x}': {err}")))?;
    let y = y
        .parse::<i32>()
        .map_err(|err| invalid(format!("invalid y coordinate '{y}': {err}")))?;
    let width = width
        .parse::<i32>()
        .map_err(|err| invalid(format!("invalid width '{width}': {err}")))?;
    let height = height
        .parse::<i32>()
        .map_err(|err| invalid(format!("invalid height '{height}': {err}")))?;
    if width <= 0 || height <= 0 {
        return Err(invalid(format!(
            "selection must be positive, got {width}x{height}"
        )));
    }

    Ok(Rect::new(x, y, width, height))
}

pub fn select_region() -> Result<Option<Rect>, CaptureError> {
    select_region_with(&SystemCaptureBackend)
}

/// Runs the interactive region selector. A dismissed selector yields `None`.
pub fn select_region_with<B: CaptureBackend>(backend: &B) -> Result<Option<Rect>, CaptureError> {
    let raw_geometry = match backend.run_region_selection() {
        Ok(output) => output,
        Err(CaptureError::CommandFailed { command, message }) => {
            tracing::info!(command = %command, message = %message, "region selection dismissed");
            return Ok(None);
        }
        Err(err) => return Err(err),
    };
    let geometry = raw_geometry.trim();
    if geometry.is_empty() {
        tracing::info!("region selection returned no geometry");
        return Ok(None);
    }
    parse_geometry(geometry).map(Some)
}

pub fn enumerate_windows() -> Result<PickerSource, CaptureError> {
    enumerate_windows_with(&SystemCaptureBackend)
}

/// Selectable windows of the active workspace. Monitor lookup failures only
/// degrade the preview to the windows' bounding box.
pub fn enumerate_windows_with<B: CaptureBackend>(
    backend: &B,
) -> Result<PickerSource, CaptureError> {
    let workspace = parse_active_workspace(&backend.active_workspace_json()?)?;
    let windows = parse_workspace_windows(&backend.clients_json()?, workspace.id)?;

    let monitor = match backend
        .monitors_json()
        .and_then(|json| parse_monitor_layout(&json, workspace.monitor.as_deref()))
    {
        Ok(monitor) => Some(monitor),
        Err(err) => {
            tracing::warn!(?err, "monitor layout unavailable; using window bounds");
            None
        }
    };

    tracing::debug!(
        workspace = workspace.id,
        windows = windows.len(),
        ?monitor,
        "enumerated workspace windows"
    );
    Ok(PickerSource { windows, monitor })
}

pub fn focused_monitor() -> Result<Rect, CaptureError> {
    focused_monitor_with(&SystemCaptureBackend)
}

pub fn focused_monitor_with<B: CaptureBackend>(backend: &B) -> Result<Rect, CaptureError> {
    parse_monitor_layout(&backend.monitors_json()?, None)
}

pub fn capture(
    storage: &StorageService,
    target: CaptureTarget,
) -> Result<CaptureArtifact, CaptureError> {
    capture_with(&SystemCaptureBackend, storage, target)
}

pub fn resolve_capture_region<B: CaptureBackend>(
    backend: &B,
    target: CaptureTarget,
) -> Result<Option<Rect>, CaptureError> {
    match target {
        CaptureTarget::Region(rect) => {
            let rect = rect.normalized();
            if !rect.has_area() {
                return Err(CaptureError::InvalidSelection {
                    message: format!("selection must be positive, got {rect:?}"),
                });
            }
            Ok(Some(rect))
        }
        CaptureTarget::FocusedMonitor => focused_monitor_with(backend).map(Some),
        CaptureTarget::AllDisplays => Ok(None),
    }
}

pub fn capture_with<B: CaptureBackend>(
    backend: &B,
    storage: &StorageService,
    target: CaptureTarget,
) -> Result<CaptureArtifact, CaptureError> {
    let region = resolve_capture_region(backend, target)?;
    let now = SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map_err(|err| CaptureError::InvalidCaptureArtifact {
            message: format!("system time before unix epoch: {err}"),
        })?;

    let capture_id = format!("{}", now.as_nanos());
    storage
        .ensure_cache_dir()
        .map_err(CaptureError::CacheDirectory)?;
    let temp_path = storage
        .temp_path_for_capture(&capture_id)
        .map_err(CaptureError::CacheDirectory)?;
    let geometry = region.map(format_geometry);

    tracing::info!(?target, geometry = ?geometry, path = %temp_path.display(), "capturing screen");
    if let Err(err) = backend.run_screen_capture(geometry.as_deref(), &temp_path) {
        cleanup_temp_capture_file(&temp_path, "screen capture command failure");
        return Err(err);
    }

    let (width, height) = match backend.image_dimensions(&temp_path) {
        Ok(size) => size,
        Err(err) => {
            cleanup_temp_capture_file(&temp_path, "capture image dimension read failure");
            return Err(err);
        }
    };
    if width == 0 || height == 0 {
        cleanup_temp_capture_file(&temp_path, "empty capture image");
        return Err(CaptureError::InvalidCaptureArtifact {
            message: format!("captured image is empty ({width}x{height})"),
        });
    }

    Ok(CaptureArtifact {
        capture_id,
        temp_path,
        width,
        height,
        region,
        created_at: u64::try_from(now.as_millis()).unwrap_or(u64::MAX),
    })
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum TempCaptureCleanupOutcome {
    Removed,
    NotFound,
    Failed,
}

fn cleanup_temp_capture_file(temp_path: &Path, stage: &str) -> TempCaptureCleanupOutcome {
    cleanup_temp_capture_file_with(temp_path, stage, |path| std::fs::remove_file(path))
}

fn cleanup_temp_capture_file_with<F>(
    temp_path: &Path,
    stage: &str,
    remove_file: F,
) -> TempCaptureCleanupOutcome
where
    F: FnOnce(&Path) -> std::io::Result<()>,
{
    match remove_file(temp_path) {
        Ok(()) => TempCaptureCleanupOutcome::Removed,
        Err(err) if err.kind() == std::io::ErrorKind::NotFound => {
            tracing::debug!(
                stage = stage,
                path = %temp_path.display(),
                "temporary capture file was never written"
            );
            TempCaptureCleanupOutcome::NotFound
        }
        Err(err) => {
            tracing::warn!(
                stage = stage,
                path = %temp_path.display(),
                ?err,
                "failed to cleanup temporary capture file"
            );
            TempCaptureCleanupOutcome::Failed
        }
    }
}

fn run_command_output(command: &str, args: &[&str]) -> Result<String, CaptureError> {
    let output = Command::new(command)
        .args(args)
        .stdin(Stdio::null())
        .stdout(Stdio::piped())
        .stderr(Stdio::piped())
        .output()
        .map_err(|err| CaptureError::CommandIo {
            command: command.to_string(),
            source: err,
        })?;

    if !output.status.success() {
        let stderr = String::from_utf8_lossy(&output.stderr);
        return Err(CaptureError::CommandFailed {
            command: command.to_string(),
            message: format!("exit status: {}; stderr: {}", output.status, stderr.trim()),
        });
    }

    Ok(String::from_utf8_lossy(&output.stdout).into_owned())
}

fn run_command_status(command: &str, args: &[&str], output: &Path) -> Result<(), CaptureError> {
    let status = Command::new(command)
        .args(args)
        .arg(output)
        .status()
        .map_err(|err| CaptureError::CommandIo {
            command: command.to_string(),
            source: err,
        })?;

    if status.success() {
        Ok(())
    } else {
        Err(CaptureError::CommandFailed {
            command: command.to_string(),
            message: format!("command exited with status: {status}"),
        })
    }
}
