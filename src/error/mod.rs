use crate::capture::CaptureError;
use crate::state::StateError;
use crate::storage::StorageError;
use thiserror::Error;

pub type AppResult<T> = std::result::Result<T, AppError>;

#[derive(Debug, Error)]
pub enum AppError {
    #[error(transparent)]
    State(#[from] StateError),
    #[error("capture storage unavailable: {0}")]
    Storage(#[from] StorageError),
    #[error(transparent)]
    Capture(#[from] CaptureError),
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn storage_errors_keep_their_cause_in_the_message() {
        let err = AppError::from(StorageError::MissingHomeDirectory);
        assert!(err.to_string().starts_with("capture storage unavailable: "));
    }
}
