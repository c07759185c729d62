pub mod app;
pub mod capture;
pub mod clipboard;
pub mod config;
pub mod editor;
pub mod error;
pub mod geometry;
pub mod logging;
pub mod notification;
pub mod picker;
pub mod sequencer;
pub mod state;
pub mod storage;
pub mod theme;
pub mod ui;
pub use error::{AppError, AppResult};

/// Entrypoint used by the `hyprsnipper` binary.
pub fn run() -> AppResult<()> {
    logging::init();
    tracing::info!(version = env!("CARGO_PKG_VERSION"), "starting HyprSnipper");

    let mut app = app::App::new();
    app.start()?;

    tracing::info!("palette closed");
    Ok(())
}
