use serde::{Deserialize, Serialize};

use crate::models::Grievance;

/// Change events emitted after every successful grievance write. Trigger
/// handlers and live queries both consume these; each carries the full
/// before/after state so consumers never have to re-read the store to diff.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "type", content = "data")]
pub enum ChangeEvent {
    GrievanceCreated {
        after: Grievance,
    },

    GrievanceUpdated {
        before: Grievance,
        after: Grievance,
    },

    GrievanceDeleted {
        before: Grievance,
    },
}

impl ChangeEvent {
    /// The owning user's id, regardless of event kind.
    pub fn owner_id(&self) -> &str {
        match self {
            Self::GrievanceCreated { after } => &after.owner_id,
            Self::GrievanceUpdated { after, .. } => &after.owner_id,
            Self::GrievanceDeleted { before } => &before.owner_id,
        }
    }
}

/// Commands sent FROM client TO server over the subscription WebSocket.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "type", content = "data")]
pub enum SubscribeCommand {
    /// Start a live query. `owner` scopes the result set to one user's
    /// grievances; `None` is the admin view (all grievances).
    Subscribe { owner: Option<String> },

    /// Tear down the live query. The server closes the socket after this.
    Unsubscribe,
}

/// Frames sent FROM server TO client over the subscription WebSocket.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "type", content = "data")]
pub enum SubscribeFrame {
    /// A full result-set snapshot, newest first. Sent once on subscribe and
    /// again after every change that could affect the result set.
    Snapshot { grievances: Vec<Grievance> },

    /// A query failure, visible only to this client.
    Error { message: String },
}
