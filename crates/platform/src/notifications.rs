//! Notification subsystem boundary.
//!
//! Posting with an id already in use replaces the previous notification;
//! distinct ids coexist. Channel creation is idempotent.

use std::collections::HashMap;
use std::sync::Mutex;

use tracing::info;

/// Delivery importance of a notification channel.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Importance {
    Low,
    Default,
    High,
}

/// A notification channel/category.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NotificationChannel {
    pub id: String,
    pub name: String,
    pub importance: Importance,
    pub vibration: bool,
}

/// A notification ready for display.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Notification {
    pub channel_id: String,
    pub title: String,
    pub body: String,
    pub auto_cancel: bool,
}

/// Notification subsystem the client core posts through.
#[async_trait::async_trait]
pub trait Notifier: Send + Sync {
    /// Creates the channel if it does not exist yet. Safe to call repeatedly.
    async fn ensure_channel(&self, channel: NotificationChannel);

    /// Posts a notification. Same id replaces, different ids coexist.
    async fn notify(&self, id: u32, notification: Notification);
}

/// Notifier that records everything it is asked to display.
///
/// Test double for the platform notification subsystem.
#[derive(Debug, Default)]
pub struct RecordingNotifier {
    channels: Mutex<Vec<NotificationChannel>>,
    posted: Mutex<Vec<(u32, Notification)>>,
}

impl RecordingNotifier {
    pub fn new() -> Self {
        Self::default()
    }

    /// Every notify call in order.
    pub fn posted(&self) -> Vec<(u32, Notification)> {
        self.posted.lock().expect("notifier lock").clone()
    }

    /// The currently visible notifications: latest per id.
    pub fn active(&self) -> HashMap<u32, Notification> {
        let posted = self.posted.lock().expect("notifier lock");
        let mut active = HashMap::new();
        for (id, notification) in posted.iter() {
            active.insert(*id, notification.clone());
        }
        active
    }

    /// Channels created so far (deduplicated by id).
    pub fn channels(&self) -> Vec<NotificationChannel> {
        self.channels.lock().expect("notifier lock").clone()
    }
}

#[async_trait::async_trait]
impl Notifier for RecordingNotifier {
    async fn ensure_channel(&self, channel: NotificationChannel) {
        let mut channels = self.channels.lock().expect("notifier lock");
        if !channels.iter().any(|c| c.id == channel.id) {
            channels.push(channel);
        }
    }

    async fn notify(&self, id: u32, notification: Notification) {
        self.posted
            .lock()
            .expect("notifier lock")
            .push((id, notification));
    }
}

/// Notifier that only logs. Used by the headless agent.
#[derive(Debug, Clone, Default)]
pub struct LogNotifier;

impl LogNotifier {
    pub fn new() -> Self {
        Self
    }
}

#[async_trait::async_trait]
impl Notifier for LogNotifier {
    async fn ensure_channel(&self, channel: NotificationChannel) {
        info!(channel_id = %channel.id, name = %channel.name, "Notification channel ready");
    }

    async fn notify(&self, id: u32, notification: Notification) {
        info!(
            notification_id = id,
            title = %notification.title,
            body = %notification.body,
            "Notification posted"
        );
    }
}
