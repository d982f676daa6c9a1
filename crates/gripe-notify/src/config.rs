use std::str::FromStr;

/// How notifications leave the system. The two modes are alternate designs,
/// not a combined feature set: a deployment runs one or the other.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Delivery {
    /// Outbox rows address email recipients; an email sender drains them.
    Email,
    /// Outbox rows address device tokens; a push sender drains them.
    Push,
}

impl FromStr for Delivery {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "email" => Ok(Self::Email),
            "push" => Ok(Self::Push),
            other => Err(format!("unknown delivery mode: {}", other)),
        }
    }
}

/// What counts as notifiable on a grievance update. Mutually exclusive
/// firing conditions — pick one per deployment.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum NotifyOn {
    /// Fire when the update sequence grew; the new last entry is notified.
    UpdateAppend,
    /// Fire when the status field changed.
    StatusChange,
}

impl FromStr for NotifyOn {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "update-append" => Ok(Self::UpdateAppend),
            "status-change" => Ok(Self::StatusChange),
            other => Err(format!("unknown notify condition: {}", other)),
        }
    }
}

/// Notification settings, read once at startup and passed to every handler.
#[derive(Debug, Clone)]
pub struct NotifyConfig {
    /// Admin mailbox for new-grievance notifications (email mode).
    pub admin_email: String,
    /// Admin uid whose registered tokens receive new-grievance pushes (push mode).
    pub admin_uid: String,
    /// The filing user's mailbox for update notifications (email mode).
    pub user_email: String,
    /// Optional From address stamped on outbound email.
    pub from_email: Option<String>,
    pub delivery: Delivery,
    pub notify_on: NotifyOn,
}

impl NotifyConfig {
    /// Push payload defaults.
    pub const CLICK_TARGET: &'static str = "/";
    pub const ICON: &'static str = "/icons/icon-192.png";
}
