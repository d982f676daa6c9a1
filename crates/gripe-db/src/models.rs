/// Database row types — these map directly to SQLite rows.
/// Distinct from the gripe-types domain models to keep the DB layer
/// independent; conversion lives in queries.rs.
pub struct GrievanceRow {
    pub id: String,
    pub title: String,
    pub details: Option<String>,
    pub category: String,
    pub severity: String,
    pub status: String,
    pub owner_id: String,
    pub created_at: String,
    pub updates: String,
}

pub struct NotificationRow {
    pub id: String,
    pub channel: String,
    pub recipients: String,
    pub sender: Option<String>,
    pub subject: String,
    pub body: String,
    pub click_target: Option<String>,
    pub icon: Option<String>,
    pub enqueued_at: String,
}
