use anyhow::Result;
use rusqlite::Connection;
use tracing::info;

pub fn run(conn: &Connection) -> Result<()> {
    conn.execute_batch(
        "
        CREATE TABLE IF NOT EXISTS grievances (
            id          TEXT PRIMARY KEY,
            title       TEXT NOT NULL,
            details     TEXT,
            category    TEXT NOT NULL,
            severity    TEXT NOT NULL,
            status      TEXT NOT NULL DEFAULT 'Filed',
            owner_id    TEXT NOT NULL,
            created_at  TEXT NOT NULL,
            updates     TEXT NOT NULL DEFAULT '[]'
        );

        CREATE INDEX IF NOT EXISTS idx_grievances_owner
            ON grievances(owner_id, created_at);

        CREATE TABLE IF NOT EXISTS push_tokens (
            token       TEXT PRIMARY KEY,
            uid         TEXT NOT NULL,
            created_at  TEXT NOT NULL DEFAULT (datetime('now'))
        );

        CREATE INDEX IF NOT EXISTS idx_push_tokens_uid
            ON push_tokens(uid);

        -- Outbox drained by the external delivery worker.
        CREATE TABLE IF NOT EXISTS notifications (
            id            TEXT PRIMARY KEY,
            channel       TEXT NOT NULL,
            recipients    TEXT NOT NULL,
            sender        TEXT,
            subject       TEXT NOT NULL,
            body          TEXT NOT NULL,
            click_target  TEXT,
            icon          TEXT,
            enqueued_at   TEXT NOT NULL
        );
        ",
    )?;

    info!("Database migrations complete");
    Ok(())
}
