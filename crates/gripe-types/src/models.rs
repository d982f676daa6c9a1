use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use uuid::Uuid;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Severity {
    Low,
    Medium,
    High,
}

impl Severity {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Low => "Low",
            Self::Medium => "Medium",
            Self::High => "High",
        }
    }
}

impl fmt::Display for Severity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Severity {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "Low" => Ok(Self::Low),
            "Medium" => Ok(Self::Medium),
            "High" => Ok(Self::High),
            other => Err(format!("unknown severity: {}", other)),
        }
    }
}

/// Grievance lifecycle status. Admin-settable in any direction — there is
/// no enforced forward-only transition.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Status {
    Filed,
    Working,
    Resolved,
}

impl Status {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Filed => "Filed",
            Self::Working => "Working",
            Self::Resolved => "Resolved",
        }
    }
}

impl fmt::Display for Status {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Status {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "Filed" => Ok(Self::Filed),
            "Working" => Ok(Self::Working),
            "Resolved" => Ok(Self::Resolved),
            other => Err(format!("unknown status: {}", other)),
        }
    }
}

/// One admin response appended to a grievance. The `updates` sequence is
/// append-only; its length never decreases.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GrievanceUpdate {
    pub text: String,
    pub at: DateTime<Utc>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Grievance {
    pub id: Uuid,
    pub title: String,
    pub details: Option<String>,
    pub category: String,
    pub severity: Severity,
    pub status: Status,
    /// Client-generated id of the user who filed this grievance.
    pub owner_id: String,
    pub created_at: DateTime<Utc>,
    pub updates: Vec<GrievanceUpdate>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn severity_roundtrip() {
        for s in [Severity::Low, Severity::Medium, Severity::High] {
            assert_eq!(s.as_str().parse::<Severity>().unwrap(), s);
        }
        assert!("Critical".parse::<Severity>().is_err());
    }

    #[test]
    fn status_roundtrip() {
        for s in [Status::Filed, Status::Working, Status::Resolved] {
            assert_eq!(s.as_str().parse::<Status>().unwrap(), s);
        }
        assert!("Closed".parse::<Status>().is_err());
    }
}
