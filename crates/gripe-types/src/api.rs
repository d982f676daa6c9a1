use serde::{Deserialize, Serialize};

use crate::models::{Severity, Status};

// -- Grievances --

#[derive(Debug, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct FileGrievanceRequest {
    pub title: String,
    #[serde(default)]
    pub details: Option<String>,
    pub category: String,
    pub severity: Severity,
    pub owner_id: String,
}

#[derive(Debug, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct SetStatusRequest {
    pub status: Status,
}

#[derive(Debug, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct AddUpdateRequest {
    pub text: String,
}

// -- Push tokens --

#[derive(Debug, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct RegisterTokenRequest {
    pub uid: String,
}

// -- Delivery reports --

/// Per-token outcome of a push send attempt, reported back by the external
/// delivery worker.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum SendOutcome {
    Delivered,
    /// The push service no longer knows this token; the token record
    /// should be deleted.
    Unregistered,
    Failed,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TokenSendResult {
    pub token: String,
    pub outcome: SendOutcome,
}

#[derive(Debug, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct DeliveryReportRequest {
    pub results: Vec<TokenSendResult>,
}

#[derive(Debug, Serialize)]
pub struct DeliveryReportResponse {
    pub tokens_removed: usize,
}
