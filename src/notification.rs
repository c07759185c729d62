pub const APP_NAME: &str = "HyprSnipper";

/// User-visible feedback. Delivery is best-effort and never fails the caller.
pub trait Notifier: Send + Sync {
    fn notify(&self, body: &str);
}

#[derive(Debug, Default)]
pub struct DesktopNotifier;

impl Notifier for DesktopNotifier {
    fn notify(&self, body: &str) {
        tracing::info!(notification = body);
        send(body);
    }
}

fn send(body: impl Into<String>) {
    let body = body.into();
    std::thread::spawn(move || {
        if let Err(err) = notify_rust::Notification::new()
            .appname(APP_NAME)
            .summary(APP_NAME)
            .body(&body)
            .show()
        {
            tracing::warn!("system notification failed: {err}");
        }
    });
}
