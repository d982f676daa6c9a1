use crate::Database;
use crate::models::GrievanceRow;
use anyhow::{Result, anyhow};
use chrono::{DateTime, Utc};
use gripe_types::models::{Grievance, GrievanceUpdate, Status};
use gripe_types::notify::OutboundNotification;
use rusqlite::Connection;

impl Database {
    // -- Grievances --

    pub fn insert_grievance(&self, g: &Grievance) -> Result<()> {
        let updates = serde_json::to_string(&g.updates)?;
        self.with_conn_mut(|conn| {
            conn.execute(
                "INSERT INTO grievances (id, title, details, category, severity, status, owner_id, created_at, updates)
                 VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9)",
                rusqlite::params![
                    g.id.to_string(),
                    g.title,
                    g.details,
                    g.category,
                    g.severity.as_str(),
                    g.status.as_str(),
                    g.owner_id,
                    g.created_at.to_rfc3339(),
                    updates,
                ],
            )?;
            Ok(())
        })
    }

    pub fn get_grievance(&self, id: &str) -> Result<Option<Grievance>> {
        self.with_conn(|conn| {
            let row = query_grievance(conn, id)?;
            row.map(grievance_from_row).transpose()
        })
    }

    /// One user's grievances, newest first.
    pub fn list_by_owner(&self, owner_id: &str) -> Result<Vec<Grievance>> {
        self.with_conn(|conn| {
            let mut stmt = conn.prepare(
                "SELECT id, title, details, category, severity, status, owner_id, created_at, updates
                 FROM grievances
                 WHERE owner_id = ?1
                 ORDER BY created_at DESC",
            )?;
            let rows = stmt
                .query_map([owner_id], map_grievance_row)?
                .collect::<std::result::Result<Vec<_>, _>>()?;
            rows.into_iter().map(grievance_from_row).collect()
        })
    }

    /// Admin view: every grievance, newest first.
    pub fn list_all(&self) -> Result<Vec<Grievance>> {
        self.with_conn(|conn| {
            let mut stmt = conn.prepare(
                "SELECT id, title, details, category, severity, status, owner_id, created_at, updates
                 FROM grievances
                 ORDER BY created_at DESC",
            )?;
            let rows = stmt
                .query_map([], map_grievance_row)?
                .collect::<std::result::Result<Vec<_>, _>>()?;
            rows.into_iter().map(grievance_from_row).collect()
        })
    }

    /// Returns false if no such grievance exists.
    pub fn set_status(&self, id: &str, status: Status) -> Result<bool> {
        self.with_conn_mut(|conn| {
            let n = conn.execute(
                "UPDATE grievances SET status = ?2 WHERE id = ?1",
                rusqlite::params![id, status.as_str()],
            )?;
            Ok(n > 0)
        })
    }

    /// Append an entry to the grievance's update sequence. The read and
    /// write happen under one connection lock, so the sequence length only
    /// ever grows. Returns false if no such grievance exists.
    pub fn append_update(&self, id: &str, update: &GrievanceUpdate) -> Result<bool> {
        self.with_conn_mut(|conn| {
            let row = query_grievance(conn, id)?;
            let Some(row) = row else {
                return Ok(false);
            };

            let mut updates: Vec<GrievanceUpdate> = serde_json::from_str(&row.updates)?;
            updates.push(update.clone());
            let updates = serde_json::to_string(&updates)?;

            conn.execute(
                "UPDATE grievances SET updates = ?2 WHERE id = ?1",
                rusqlite::params![id, updates],
            )?;
            Ok(true)
        })
    }

    pub fn delete_grievance(&self, id: &str) -> Result<bool> {
        self.with_conn_mut(|conn| {
            let n = conn.execute("DELETE FROM grievances WHERE id = ?1", [id])?;
            Ok(n > 0)
        })
    }

    // -- Push tokens --

    /// Register or refresh a device token. Re-registering an existing token
    /// for a different uid transfers ownership.
    pub fn upsert_token(&self, token: &str, uid: &str) -> Result<()> {
        self.with_conn_mut(|conn| {
            conn.execute(
                "INSERT INTO push_tokens (token, uid, created_at) VALUES (?1, ?2, datetime('now'))
                 ON CONFLICT(token) DO UPDATE SET uid = excluded.uid",
                rusqlite::params![token, uid],
            )?;
            Ok(())
        })
    }

    pub fn tokens_for_uid(&self, uid: &str) -> Result<Vec<String>> {
        self.with_conn(|conn| {
            let mut stmt = conn.prepare("SELECT token FROM push_tokens WHERE uid = ?1")?;
            let tokens = stmt
                .query_map([uid], |row| row.get::<_, String>(0))?
                .collect::<std::result::Result<Vec<_>, _>>()?;
            Ok(tokens)
        })
    }

    pub fn delete_token(&self, token: &str) -> Result<bool> {
        self.with_conn_mut(|conn| {
            let n = conn.execute("DELETE FROM push_tokens WHERE token = ?1", [token])?;
            Ok(n > 0)
        })
    }

    // -- Notification outbox --

    pub fn enqueue_notification(&self, n: &OutboundNotification) -> Result<()> {
        let recipients = serde_json::to_string(&n.recipients)?;
        self.with_conn_mut(|conn| {
            conn.execute(
                "INSERT INTO notifications (id, channel, recipients, sender, subject, body, click_target, icon, enqueued_at)
                 VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9)",
                rusqlite::params![
                    n.id.to_string(),
                    n.channel.as_str(),
                    recipients,
                    n.from,
                    n.subject,
                    n.body,
                    n.click_target,
                    n.icon,
                    n.enqueued_at.to_rfc3339(),
                ],
            )?;
            Ok(())
        })
    }

    /// Pending outbox rows, oldest first. The delivery worker reads these
    /// and deletes what it has consumed.
    pub fn list_notifications(&self) -> Result<Vec<OutboundNotification>> {
        self.with_conn(|conn| {
            let mut stmt = conn.prepare(
                "SELECT id, channel, recipients, sender, subject, body, click_target, icon, enqueued_at
                 FROM notifications
                 ORDER BY enqueued_at ASC",
            )?;
            let rows = stmt
                .query_map([], |row| {
                    Ok(crate::models::NotificationRow {
                        id: row.get(0)?,
                        channel: row.get(1)?,
                        recipients: row.get(2)?,
                        sender: row.get(3)?,
                        subject: row.get(4)?,
                        body: row.get(5)?,
                        click_target: row.get(6)?,
                        icon: row.get(7)?,
                        enqueued_at: row.get(8)?,
                    })
                })?
                .collect::<std::result::Result<Vec<_>, _>>()?;

            rows.into_iter()
                .map(|row| {
                    Ok(OutboundNotification {
                        id: row.id.parse()?,
                        channel: row
                            .channel
                            .parse()
                            .map_err(|e| anyhow!("corrupt notification channel: {}", e))?,
                        recipients: serde_json::from_str(&row.recipients)?,
                        from: row.sender,
                        subject: row.subject,
                        body: row.body,
                        click_target: row.click_target,
                        icon: row.icon,
                        enqueued_at: parse_timestamp(&row.enqueued_at)?,
                    })
                })
                .collect()
        })
    }

    pub fn delete_notification(&self, id: &str) -> Result<bool> {
        self.with_conn_mut(|conn| {
            let n = conn.execute("DELETE FROM notifications WHERE id = ?1", [id])?;
            Ok(n > 0)
        })
    }
}

fn query_grievance(conn: &Connection, id: &str) -> Result<Option<GrievanceRow>> {
    let mut stmt = conn.prepare(
        "SELECT id, title, details, category, severity, status, owner_id, created_at, updates
         FROM grievances WHERE id = ?1",
    )?;

    let row = stmt.query_row([id], map_grievance_row).optional()?;
    Ok(row)
}

fn map_grievance_row(row: &rusqlite::Row<'_>) -> rusqlite::Result<GrievanceRow> {
    Ok(GrievanceRow {
        id: row.get(0)?,
        title: row.get(1)?,
        details: row.get(2)?,
        category: row.get(3)?,
        severity: row.get(4)?,
        status: row.get(5)?,
        owner_id: row.get(6)?,
        created_at: row.get(7)?,
        updates: row.get(8)?,
    })
}

fn grievance_from_row(row: GrievanceRow) -> Result<Grievance> {
    Ok(Grievance {
        id: row.id.parse()?,
        title: row.title,
        details: row.details,
        category: row.category,
        severity: row
            .severity
            .parse()
            .map_err(|e| anyhow!("corrupt severity on grievance: {}", e))?,
        status: row
            .status
            .parse()
            .map_err(|e| anyhow!("corrupt status on grievance: {}", e))?,
        owner_id: row.owner_id,
        created_at: parse_timestamp(&row.created_at)?,
        updates: serde_json::from_str(&row.updates)?,
    })
}

fn parse_timestamp(s: &str) -> Result<DateTime<Utc>> {
    let dt = DateTime::parse_from_rfc3339(s)
        .map_err(|e| anyhow!("corrupt timestamp '{}': {}", s, e))?;
    Ok(dt.with_timezone(&Utc))
}

/// Extension trait for optional query results
trait OptionalExt<T> {
    fn optional(self) -> Result<Option<T>>;
}

impl<T> OptionalExt<T> for std::result::Result<T, rusqlite::Error> {
    fn optional(self) -> Result<Option<T>> {
        match self {
            Ok(val) => Ok(Some(val)),
            Err(rusqlite::Error::QueryReturnedNoRows) => Ok(None),
            Err(e) => Err(e.into()),
        }
    }
}
