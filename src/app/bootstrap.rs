use crate::capture;
use crate::config::Settings;
use crate::error::AppResult;
use crate::geometry::Rect;
use crate::storage::{PruneReport, StorageResult, StorageService, STALE_TEMP_MAX_AGE_HOURS};
use crate::theme::Palette;

pub(super) struct AppBootstrap {
    pub(super) settings: Settings,
    pub(super) palette: Palette,
    pub(super) storage: StorageService,
    pub(super) monitor: Option<Rect>,
}

pub(super) fn bootstrap_app_runtime() -> AppResult<AppBootstrap> {
    let storage = StorageService::with_default_paths()?;
    log_prune_outcome(storage.prune_stale_temp_files(STALE_TEMP_MAX_AGE_HOURS));

    let settings = Settings::load();
    tracing::info!(
        save_dir = %settings.save_dir.display(),
        editor = %settings.editor,
        save = settings.save_enabled,
        copy = settings.copy_enabled,
        edit = settings.edit_enabled,
        "loaded settings"
    );
    let palette = Palette::load(&settings);

    let monitor = match capture::focused_monitor() {
        Ok(monitor) => Some(monitor),
        Err(err) => {
            tracing::warn!(?err, "focused monitor unavailable; palette placement left to compositor");
            None
        }
    };

    Ok(AppBootstrap {
        settings,
        palette,
        storage,
        monitor,
    })
}

fn log_prune_outcome(outcome: StorageResult<PruneReport>) {
    match outcome {
        Ok(report) if report.removed_files > 0 => {
            tracing::info!(
                removed_files = report.removed_files,
                "pruned stale capture temp files"
            );
        }
        Ok(_) => {}
        Err(err) => {
            tracing::warn!(
                max_age_hours = STALE_TEMP_MAX_AGE_HOURS,
                ?err,
                "failed to prune stale capture temp files"
            );
        }
    }
}
