use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use uuid::Uuid;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum NotificationChannel {
    Email,
    Push,
}

impl NotificationChannel {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Email => "email",
            Self::Push => "push",
        }
    }
}

impl fmt::Display for NotificationChannel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for NotificationChannel {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "email" => Ok(Self::Email),
            "push" => Ok(Self::Push),
            other => Err(format!("unknown notification channel: {}", other)),
        }
    }
}

/// One "please deliver this" record. Write-only from this system's
/// perspective: rows are inserted into the outbox and consumed (then
/// deleted) by the external delivery worker.
///
/// For email, `recipients` holds addresses and `body` is the HTML body.
/// For push, `recipients` holds device tokens, `subject` is the push title
/// and `body` the push body text.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct OutboundNotification {
    pub id: Uuid,
    pub channel: NotificationChannel,
    pub recipients: Vec<String>,
    pub from: Option<String>,
    pub subject: String,
    pub body: String,
    /// Push only: URL opened when the notification is clicked.
    pub click_target: Option<String>,
    /// Push only: notification icon path.
    pub icon: Option<String>,
    pub enqueued_at: DateTime<Utc>,
}
