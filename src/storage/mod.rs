use std::fs;
use std::io;
use std::path::{Path, PathBuf};
use std::time::{Duration, SystemTime};

use chrono::{Datelike, NaiveDateTime, Timelike};
use thiserror::Error;

const DEFAULT_TEMP_PREFIX: &str = "capture_";
const CACHE_SUBDIR: &str = "hyprsnipper";
pub const STALE_TEMP_MAX_AGE_HOURS: u64 = 24;

#[derive(Debug, Error)]
pub enum StorageError {
    #[error("missing HOME environment variable")]
    MissingHomeDirectory,
    #[error("capture id is empty")]
    MissingCaptureId,
    #[error("io error: {0}")]
    Io(#[from] io::Error),
}

pub type StorageResult<T> = std::result::Result<T, StorageError>;

#[derive(Debug, Default, Clone)]
pub struct PruneReport {
    pub removed_files: usize,
}

/// File operations performed on a finished capture.
pub trait CaptureStorage {
    fn save_capture(
        &self,
        source: &Path,
        save_dir: &Path,
        timestamp: NaiveDateTime,
    ) -> StorageResult<PathBuf>;
    fn discard_temp_capture(&self, path: &Path) -> StorageResult<()>;
}

#[derive(Debug, Clone)]
pub struct StorageService {
    cache_dir: PathBuf,
}

impl StorageService {
    pub const fn with_cache_dir(cache_dir: PathBuf) -> Self {
        Self { cache_dir }
    }

    pub fn with_default_paths() -> StorageResult<Self> {
        Ok(Self::with_cache_dir(default_cache_dir()?))
    }

    pub fn cache_dir(&self) -> &Path {
        &self.cache_dir
    }

    pub fn ensure_cache_dir(&self) -> StorageResult<()> {
        fs::create_dir_all(&self.cache_dir)?;
        Ok(())
    }

    pub fn temp_path_for_capture(&self, capture_id: &str) -> StorageResult<PathBuf> {
        if capture_id.is_empty() {
            return Err(StorageError::MissingCaptureId);
        }
        Ok(self
            .cache_dir
            .join(format!("{DEFAULT_TEMP_PREFIX}{capture_id}.png")))
    }

    /// Moves `source` into `save_dir` under a timestamped name, creating the
    /// directory first. Returns the new location.
    pub fn save_capture(
        &self,
        source: &Path,
        save_dir: &Path,
        timestamp: NaiveDateTime,
    ) -> StorageResult<PathBuf> {
        fs::create_dir_all(save_dir)?;
        let target = save_dir.join(capture_file_name(&timestamp));
        move_file(source, &target)?;
        tracing::debug!(
            source = %source.display(),
            target = %target.display(),
            "capture moved into save directory"
        );
        Ok(target)
    }

    pub fn discard_temp_capture(&self, path: &Path) -> StorageResult<()> {
        match fs::remove_file(path) {
            Ok(()) => Ok(()),
            Err(err) if err.kind() == io::ErrorKind::NotFound => Ok(()),
            Err(err) => Err(StorageError::Io(err)),
        }
    }

    pub fn prune_stale_temp_files(&self, max_age_hours: u64) -> StorageResult<PruneReport> {
        let now = SystemTime::now();
        let mut report = PruneReport::default();
        let max_age = Duration::from_secs(max_age_hours.saturating_mul(60 * 60));

        if !self.cache_dir.exists() {
            return Ok(report);
        }

        for entry in fs::read_dir(&self.cache_dir)? {
            let entry = entry?;
            let path = entry.path();
            if !path.is_file() {
                continue;
            }

            if path
                .file_name()
                .and_then(|name| name.to_str())
                .is_none_or(|name| !name.starts_with(DEFAULT_TEMP_PREFIX))
            {
                continue;
            }

            let metadata = fs::metadata(&path)?;
            let modified = metadata.modified()?;
            let age = now.duration_since(modified).unwrap_or(Duration::ZERO);

            if age > max_age {
                match fs::remove_file(&path) {
                    Ok(()) => {
                        report.removed_files += 1;
                    }
                    Err(err) => {
                        tracing::warn!(
                            path = %path.display(),
                            ?err,
                            "failed to remove stale temp capture file"
                        );
                    }
                }
            }
        }

        Ok(report)
    }
}

impl CaptureStorage for StorageService {
    fn save_capture(
        &self,
        source: &Path,
        save_dir: &Path,
        timestamp: NaiveDateTime,
    ) -> StorageResult<PathBuf> {
        StorageService::save_capture(self, source, save_dir, timestamp)
    }

    fn discard_temp_capture(&self, path: &Path) -> StorageResult<()> {
        StorageService::discard_temp_capture(self, path)
    }
}

/// `hyprsnip_<M>.<D>.<YYYY>_<hh>.<mm>.<ss>.png` with month and day unpadded.
pub fn capture_file_name<T: Datelike + Timelike>(timestamp: &T) -> String {
    format!(
        "hyprsnip_{}.{}.{}_{:02}.{:02}.{:02}.png",
        timestamp.month(),
        timestamp.day(),
        timestamp.year(),
        timestamp.hour(),
        timestamp.minute(),
        timestamp.second()
    )
}

fn move_file(source: &Path, destination: &Path) -> io::Result<()> {
    match fs::rename(source, destination) {
        Ok(()) => Ok(()),
        Err(err) if err.kind() == io::ErrorKind::NotFound => Err(err),
        Err(err) => {
            tracing::debug!(?err, "rename failed; falling back to copy and remove");
            fs::copy(source, destination)?;
            fs::remove_file(source)
        }
    }
}

fn default_cache_dir() -> StorageResult<PathBuf> {
    if let Some(cache_home) = std::env::var_os("XDG_CACHE_HOME").filter(|value| !value.is_empty()) {
        return Ok(PathBuf::from(cache_home).join(CACHE_SUBDIR));
    }
    let home = std::env::var_os("HOME")
        .filter(|value| !value.is_empty())
        .ok_or(StorageError::MissingHomeDirectory)?;
    Ok(PathBuf::from(home).join(".cache").join(CACHE_SUBDIR))
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::NaiveDate;

    fn fresh_dir(name: &str) -> PathBuf {
        let dir = std::env::temp_dir().join(format!(
            "hyprsnipper-storage-{name}-{}",
            std::process::id()
        ));
        let _ = fs::remove_dir_all(&dir);
        dir
    }

    fn timestamp() -> NaiveDateTime {
        NaiveDate::from_ymd_opt(2024, 3, 7)
            .and_then(|date| date.and_hms_opt(9, 5, 2))
            .expect("valid timestamp")
    }

    #[test]
    fn capture_file_name_pads_time_but_not_date() {
        assert_eq!(capture_file_name(&timestamp()), "hyprsnip_3.7.2024_09.05.02.png");
    }

    #[test]
    fn temp_path_uses_capture_prefix_inside_cache_dir() {
        let service = StorageService::with_cache_dir(PathBuf::from("/home/test/.cache/hyprsnipper"));
        assert_eq!(
            service.temp_path_for_capture("123").unwrap(),
            PathBuf::from("/home/test/.cache/hyprsnipper/capture_123.png")
        );
        assert!(matches!(
            service.temp_path_for_capture(""),
            Err(StorageError::MissingCaptureId)
        ));
    }

    #[test]
    fn save_capture_moves_file_and_creates_directory() {
        let root = fresh_dir("save");
        let service = StorageService::with_cache_dir(root.join("cache"));
        service.ensure_cache_dir().unwrap();
        let source = service.temp_path_for_capture("artifact-1").unwrap();
        fs::write(&source, b"png").unwrap();

        let save_dir = root.join("Pictures").join("Screenshots");
        let saved = service.save_capture(&source, &save_dir, timestamp()).unwrap();

        assert_eq!(saved, save_dir.join("hyprsnip_3.7.2024_09.05.02.png"));
        assert_eq!(fs::read(&saved).unwrap(), b"png");
        assert!(!source.exists());

        let _ = fs::remove_dir_all(root);
    }

    #[test]
    fn save_capture_reports_missing_source() {
        let root = fresh_dir("missing");
        let service = StorageService::with_cache_dir(root.join("cache"));
        let err = service
            .save_capture(&root.join("nope.png"), &root.join("out"), timestamp())
            .expect_err("missing source must fail");
        assert!(matches!(err, StorageError::Io(_)));

        let _ = fs::remove_dir_all(root);
    }

    #[test]
    fn discard_temp_capture_ignores_missing_file() {
        let root = fresh_dir("discard");
        let service = StorageService::with_cache_dir(root.clone());
        service.ensure_cache_dir().unwrap();
        let path = service.temp_path_for_capture("gone").unwrap();
        fs::write(&path, b"png").unwrap();

        service.discard_temp_capture(&path).unwrap();
        assert!(!path.exists());
        service.discard_temp_capture(&path).unwrap();

        let _ = fs::remove_dir_all(root);
    }

    #[test]
    fn prune_keeps_recent_and_foreign_files() {
        let root = fresh_dir("prune");
        let service = StorageService::with_cache_dir(root.clone());
        service.ensure_cache_dir().unwrap();
        fs::write(root.join("capture_recent.png"), b"png").unwrap();
        fs::write(root.join("notes.txt"), b"keep").unwrap();

        let report = service
            .prune_stale_temp_files(STALE_TEMP_MAX_AGE_HOURS)
            .unwrap();
        assert_eq!(report.removed_files, 0);
        assert!(root.join("capture_recent.png").exists());
        assert!(root.join("notes.txt").exists());

        let _ = fs::remove_dir_all(root);
    }
}
