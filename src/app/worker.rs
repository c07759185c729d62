use std::sync::mpsc;
use std::time::Duration;

use thiserror::Error;

pub(super) const ACTION_RESULT_POLL_INTERVAL: Duration = Duration::from_millis(24);
const WORKER_THREAD_NAME: &str = "hyprsnipper-worker";

#[derive(Debug, Error)]
pub(super) enum WorkerError {
    #[error("failed to spawn worker thread: {0}")]
    Spawn(#[source] std::io::Error),
    #[error("worker thread exited without a result")]
    Lost,
}

/// Runs `work` on a named worker thread and hands its result to `on_result`
/// on the GTK main loop. `on_result` runs exactly once, with an error when
/// the thread could not start or died before sending.
pub(super) fn spawn_worker_action<T, W, H>(work: W, on_result: H)
where
    T: Send + 'static,
    W: FnOnce() -> T + Send + 'static,
    H: FnOnce(Result<T, WorkerError>) + 'static,
{
    let (tx, rx) = mpsc::channel::<T>();
    let spawned = std::thread::Builder::new()
        .name(WORKER_THREAD_NAME.to_string())
        .spawn(move || {
            let result = work();
            let _ = tx.send(result);
        });
    if let Err(err) = spawned {
        tracing::error!(?err, "failed to spawn worker thread");
        on_result(Err(WorkerError::Spawn(err)));
        return;
    }

    let mut on_result = Some(on_result);
    gtk4::glib::timeout_add_local(ACTION_RESULT_POLL_INTERVAL, move || {
        let received = match rx.try_recv() {
            Ok(result) => Ok(result),
            Err(mpsc::TryRecvError::Empty) => return gtk4::glib::ControlFlow::Continue,
            Err(mpsc::TryRecvError::Disconnected) => {
                tracing::error!("worker thread exited without a result");
                Err(WorkerError::Lost)
            }
        };
        if let Some(on_result) = on_result.take() {
            on_result(received);
        }
        gtk4::glib::ControlFlow::Break
    });
}
