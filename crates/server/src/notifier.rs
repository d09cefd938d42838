//! Notification host for a headless server: displays, closes and window opens are logged.

use swcache_core::Error;
use swcache_core::worker::{Notification, NotificationHost};

pub struct LogNotifier;

#[async_trait::async_trait]
impl NotificationHost for LogNotifier {
    async fn show_notification(&self, notification: &Notification) -> Result<(), Error> {
        tracing::info!(
            title = %notification.title,
            body = notification.body.as_deref().unwrap_or(""),
            actions = notification.actions.len(),
            "show notification"
        );
        Ok(())
    }

    async fn close_notification(&self) -> Result<(), Error> {
        tracing::info!("close notification");
        Ok(())
    }

    async fn open_window(&self, target: &str) -> Result<(), Error> {
        tracing::info!(target, "open window");
        Ok(())
    }
}
