//! Push, notification-click and background-sync passthrough.
//!
//! No policy lives here: payload fields are mapped onto the host's display
//! and window-open capabilities.

use serde::{Deserialize, Serialize};

use crate::Error;

/// Sync tag acknowledged by the worker.
pub const BACKGROUND_SYNC_TAG: &str = "background-sync";

/// Action that opens the application from a notification.
pub const EXPLORE_ACTION: &str = "explore";

/// Notification settings taken from the application config.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NotifyConfig {
    pub app_name: String,
    pub icon: String,
    pub open_target: String,
}

/// JSON body of a push message.
#[derive(Debug, Clone, Deserialize)]
pub struct PushPayload {
    pub title: String,
    #[serde(default)]
    pub body: Option<String>,
    #[serde(default, rename = "primaryKey")]
    pub primary_key: Option<serde_json::Value>,
}

#[derive(Debug, Clone, PartialEq, Serialize, schemars::JsonSchema)]
pub struct NotificationAction {
    pub action: String,
    pub title: String,
    pub icon: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, schemars::JsonSchema)]
pub struct NotificationData {
    /// Milliseconds since the Unix epoch.
    pub date_of_arrival: i64,
    pub primary_key: Option<serde_json::Value>,
}

/// Notification handed to the host display capability.
#[derive(Debug, Clone, PartialEq, Serialize, schemars::JsonSchema)]
pub struct Notification {
    pub title: String,
    pub body: Option<String>,
    pub icon: String,
    pub badge: String,
    pub vibrate: Vec<u32>,
    pub data: NotificationData,
    pub actions: Vec<NotificationAction>,
}

/// Host display and window capabilities.
#[async_trait::async_trait]
pub trait NotificationHost: Send + Sync {
    async fn show_notification(&self, notification: &Notification) -> Result<(), Error>;

    /// Dismiss the notification that was clicked.
    async fn close_notification(&self) -> Result<(), Error>;

    async fn open_window(&self, target: &str) -> Result<(), Error>;
}

pub fn build_notification(payload: PushPayload, config: &NotifyConfig) -> Notification {
    Notification {
        title: payload.title,
        body: payload.body,
        icon: config.icon.clone(),
        badge: config.icon.clone(),
        vibrate: vec![100, 50, 100],
        data: NotificationData {
            date_of_arrival: chrono::Utc::now().timestamp_millis(),
            primary_key: payload.primary_key,
        },
        actions: vec![
            NotificationAction {
                action: EXPLORE_ACTION.into(),
                title: format!("Open {}", config.app_name),
                icon: config.icon.clone(),
            },
            NotificationAction { action: "close".into(), title: "Close".into(), icon: config.icon.clone() },
        ],
    }
}

/// Show a notification for a push message. An absent or empty payload does nothing.
pub async fn handle_push(
    host: &dyn NotificationHost, data: Option<&[u8]>, config: &NotifyConfig,
) -> Result<Option<Notification>, Error> {
    let Some(data) = data.filter(|d| !d.is_empty()) else {
        return Ok(None);
    };

    let payload: PushPayload = serde_json::from_slice(data).map_err(|e| Error::InvalidPayload(e.to_string()))?;
    let notification = build_notification(payload, config);
    host.show_notification(&notification).await?;
    Ok(Some(notification))
}

/// Handle a click on a shown notification; returns whether a window was opened.
///
/// The notification is closed whichever action was chosen.
pub async fn handle_notification_click(
    host: &dyn NotificationHost, action: &str, config: &NotifyConfig,
) -> Result<bool, Error> {
    host.close_notification().await?;
    if action != EXPLORE_ACTION {
        return Ok(false);
    }
    host.open_window(&config.open_target).await?;
    Ok(true)
}

/// Acknowledge a background-sync tag. There is no queued data to replay.
pub fn handle_sync(tag: &str) -> bool {
    if tag == BACKGROUND_SYNC_TAG {
        tracing::info!(tag, "background sync triggered");
        true
    } else {
        false
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::worker::testing::RecordingNotifier;
    use std::sync::atomic::Ordering;

    fn config() -> NotifyConfig {
        NotifyConfig {
            app_name: "TimeCraft".into(),
            icon: "./icon-192.png".into(),
            open_target: "./metronome_prototype.html".into(),
        }
    }

    #[tokio::test]
    async fn test_push_shows_notification() {
        let host = RecordingNotifier::default();
        let data = br#"{"title":"Practice time","body":"120 BPM","primaryKey":7}"#;

        let shown = handle_push(&host, Some(data), &config()).await.unwrap().unwrap();

        assert_eq!(shown.title, "Practice time");
        assert_eq!(shown.body.as_deref(), Some("120 BPM"));
        assert_eq!(shown.vibrate, vec![100, 50, 100]);
        assert_eq!(shown.data.primary_key, Some(serde_json::json!(7)));
        assert_eq!(shown.actions[0].title, "Open TimeCraft");
        assert_eq!(host.shown.lock().unwrap().len(), 1);
    }

    #[tokio::test]
    async fn test_push_without_data_is_noop() {
        let host = RecordingNotifier::default();
        assert!(handle_push(&host, None, &config()).await.unwrap().is_none());
        assert!(handle_push(&host, Some(b""), &config()).await.unwrap().is_none());
        assert!(host.shown.lock().unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_push_invalid_payload() {
        let host = RecordingNotifier::default();
        let result = handle_push(&host, Some(b"not json"), &config()).await;
        assert!(matches!(result, Err(Error::InvalidPayload(_))));
    }

    #[tokio::test]
    async fn test_notification_click() {
        let host = RecordingNotifier::default();
        assert!(handle_notification_click(&host, "explore", &config()).await.unwrap());
        assert!(!handle_notification_click(&host, "close", &config()).await.unwrap());
        assert_eq!(*host.opened.lock().unwrap(), vec!["./metronome_prototype.html"]);
        assert_eq!(host.closed.load(Ordering::SeqCst), 2);
    }

    #[tokio::test]
    async fn test_unknown_action_still_closes() {
        let host = RecordingNotifier::default();
        assert!(!handle_notification_click(&host, "", &config()).await.unwrap());
        assert_eq!(host.closed.load(Ordering::SeqCst), 1);
        assert!(host.opened.lock().unwrap().is_empty());
    }

    #[test]
    fn test_sync_tags() {
        assert!(handle_sync("background-sync"));
        assert!(!handle_sync("other"));
    }
}
