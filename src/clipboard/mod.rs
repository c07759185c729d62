use std::fs::File;
use std::io;
use std::path::{Path, PathBuf};
use std::process::{Command, Stdio};

use thiserror::Error;

const WL_COPY_COMMAND: &str = "wl-copy";

#[derive(Debug, Error)]
pub enum ClipboardError {
    #[error("failed to open file {path}: {source}")]
    OpenFile {
        path: PathBuf,
        #[source]
        source: io::Error,
    },
    #[error("failed to run clipboard command {command}: {source}")]
    CommandIo {
        command: String,
        #[source]
        source: io::Error,
    },
    #[error("{command} exited with non-zero status: {status}")]
    CommandFailed { command: String, status: String },
}

pub type ClipboardResult<T> = std::result::Result<T, ClipboardError>;

pub trait ClipboardBackend {
    fn copy_png_file(&self, path: &Path) -> ClipboardResult<()>;
}

/// Pipes the file's bytes into `wl-copy` on stdin.
#[derive(Debug, Clone)]
pub struct WlCopyBackend {
    command: String,
}

impl WlCopyBackend {
    pub fn with_command(command: impl Into<String>) -> Self {
        Self {
            command: command.into(),
        }
    }
}

impl Default for WlCopyBackend {
    fn default() -> Self {
        Self::with_command(WL_COPY_COMMAND)
    }
}

impl ClipboardBackend for WlCopyBackend {
    fn copy_png_file(&self, path: &Path) -> ClipboardResult<()> {
        let file = File::open(path).map_err(|err| ClipboardError::OpenFile {
            path: path.to_path_buf(),
            source: err,
        })?;

        let status = Command::new(&self.command)
            .stdin(Stdio::from(file))
            .status()
            .map_err(|err| ClipboardError::CommandIo {
                command: self.command.clone(),
                source: err,
            })?;

        if status.success() {
            tracing::debug!(path = %path.display(), "capture copied to clipboard");
            Ok(())
        } else {
            Err(ClipboardError::CommandFailed {
                command: self.command.clone(),
                status: status.to_string(),
            })
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::env;

    fn temp_png(name: &str) -> PathBuf {
        let path = env::temp_dir().join(format!("hyprsnipper-{name}-{}.png", std::process::id()));
        std::fs::write(&path, b"binary").unwrap();
        path
    }

    #[test]
    fn copy_png_file_succeeds_when_command_accepts_stdin() {
        let path = temp_png("copy-ok");
        let result = WlCopyBackend::with_command("true").copy_png_file(&path);
        assert!(result.is_ok());
        let _ = std::fs::remove_file(path);
    }

    #[test]
    fn copy_png_file_reports_non_zero_exit() {
        let path = temp_png("copy-fail");
        let err = WlCopyBackend::with_command("false")
            .copy_png_file(&path)
            .expect_err("false exits non-zero");
        assert!(matches!(err, ClipboardError::CommandFailed { .. }));
        let _ = std::fs::remove_file(path);
    }

    #[test]
    fn copy_png_file_reports_missing_file_before_spawning() {
        let err = WlCopyBackend::with_command("hyprsnipper-no-such-command")
            .copy_png_file(Path::new("/nonexistent/hyprsnipper/capture.png"))
            .expect_err("missing file must fail");
        assert!(matches!(err, ClipboardError::OpenFile { .. }));
    }

    #[test]
    fn copy_png_file_reports_missing_command() {
        let path = temp_png("copy-missing-command");
        let err = WlCopyBackend::with_command("hyprsnipper-no-such-command")
            .copy_png_file(&path)
            .expect_err("missing command must fail");
        assert!(matches!(err, ClipboardError::CommandIo { .. }));
        let _ = std::fs::remove_file(path);
    }

    #[test]
    fn command_error_contains_command_name() {
        let err = ClipboardError::CommandFailed {
            command: WL_COPY_COMMAND.to_string(),
            status: "exit status: 1".to_string(),
        };
        assert!(format!("{err}").contains("wl-copy"));
    }
}
