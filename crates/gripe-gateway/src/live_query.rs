use std::sync::Arc;

use anyhow::Result;
use tokio::sync::broadcast;
use tracing::warn;

use gripe_db::Database;
use gripe_types::events::ChangeEvent;
use gripe_types::models::Grievance;

use crate::dispatcher::Dispatcher;

/// Scope of a live query. `owner: None` is the admin view.
#[derive(Debug, Clone)]
pub struct GrievanceFilter {
    pub owner: Option<String>,
}

impl GrievanceFilter {
    pub fn all() -> Self {
        Self { owner: None }
    }

    pub fn owned_by(owner: impl Into<String>) -> Self {
        Self {
            owner: Some(owner.into()),
        }
    }

    /// Could this event change the filtered result set?
    fn matches(&self, event: &ChangeEvent) -> bool {
        match &self.owner {
            None => true,
            Some(owner) => event.owner_id() == owner,
        }
    }
}

/// A cancellable subscription yielding list snapshots: the current result
/// set once on demand, then a fresh one after every relevant change event.
/// Dropping the value (or calling [`unsubscribe`](Self::unsubscribe))
/// detaches it from the dispatcher.
pub struct LiveQuery {
    db: Arc<Database>,
    filter: GrievanceFilter,
    rx: broadcast::Receiver<ChangeEvent>,
}

impl LiveQuery {
    pub fn new(db: Arc<Database>, dispatcher: &Dispatcher, filter: GrievanceFilter) -> Self {
        Self {
            db,
            filter,
            rx: dispatcher.subscribe(),
        }
    }

    /// Run the query now.
    pub fn snapshot(&self) -> Result<Vec<Grievance>> {
        match &self.filter.owner {
            Some(owner) => self.db.list_by_owner(owner),
            None => self.db.list_all(),
        }
    }

    /// Wait for the next relevant change and return a fresh snapshot.
    /// Returns `None` once the dispatcher is gone. A query failure is
    /// returned to this subscriber only.
    pub async fn changed(&mut self) -> Option<Result<Vec<Grievance>>> {
        loop {
            match self.rx.recv().await {
                Ok(event) if self.filter.matches(&event) => return Some(self.snapshot()),
                Ok(_) => continue,
                Err(broadcast::error::RecvError::Lagged(n)) => {
                    // Missed events collapse into one re-query.
                    warn!("Live query lagged, {} change events skipped", n);
                    return Some(self.snapshot());
                }
                Err(broadcast::error::RecvError::Closed) => return None,
            }
        }
    }

    /// Explicit teardown. Equivalent to dropping, but makes the intent
    /// visible at call sites.
    pub fn unsubscribe(self) {}
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Utc;
    use gripe_types::models::{Severity, Status};
    use uuid::Uuid;

    fn grievance(title: &str, owner: &str) -> Grievance {
        Grievance {
            id: Uuid::new_v4(),
            title: title.to_string(),
            details: None,
            category: "Attention".to_string(),
            severity: Severity::Low,
            status: Status::Filed,
            owner_id: owner.to_string(),
            created_at: Utc::now(),
            updates: vec![],
        }
    }

    #[tokio::test]
    async fn snapshot_refreshes_on_relevant_change() {
        let db = Arc::new(Database::open_in_memory().unwrap());
        let dispatcher = Dispatcher::new();
        let mut query = LiveQuery::new(db.clone(), &dispatcher, GrievanceFilter::owned_by("u1"));

        assert!(query.snapshot().unwrap().is_empty());

        let g = grievance("Dishes", "u1");
        db.insert_grievance(&g).unwrap();
        dispatcher.broadcast(ChangeEvent::GrievanceCreated { after: g });

        let snap = query.changed().await.unwrap().unwrap();
        assert_eq!(snap.len(), 1);
        assert_eq!(snap[0].title, "Dishes");
    }

    #[tokio::test]
    async fn other_owners_changes_are_skipped() {
        let db = Arc::new(Database::open_in_memory().unwrap());
        let dispatcher = Dispatcher::new();
        let mut query = LiveQuery::new(db.clone(), &dispatcher, GrievanceFilter::owned_by("u1"));

        let other = grievance("Not mine", "u2");
        db.insert_grievance(&other).unwrap();
        dispatcher.broadcast(ChangeEvent::GrievanceCreated { after: other });

        let mine = grievance("Mine", "u1");
        db.insert_grievance(&mine).unwrap();
        dispatcher.broadcast(ChangeEvent::GrievanceCreated { after: mine });

        // the u2 event is skipped; the first yielded snapshot is for u1's write
        let snap = query.changed().await.unwrap().unwrap();
        assert_eq!(snap.len(), 1);
        assert_eq!(snap[0].title, "Mine");
    }

    #[tokio::test]
    async fn deletion_leaves_both_views_without_reload() {
        let db = Arc::new(Database::open_in_memory().unwrap());
        let dispatcher = Dispatcher::new();

        let g = grievance("Gone soon", "u1");
        db.insert_grievance(&g).unwrap();

        let mut owner_query =
            LiveQuery::new(db.clone(), &dispatcher, GrievanceFilter::owned_by("u1"));
        let mut admin_query = LiveQuery::new(db.clone(), &dispatcher, GrievanceFilter::all());
        assert_eq!(owner_query.snapshot().unwrap().len(), 1);
        assert_eq!(admin_query.snapshot().unwrap().len(), 1);

        db.delete_grievance(&g.id.to_string()).unwrap();
        dispatcher.broadcast(ChangeEvent::GrievanceDeleted { before: g });

        assert!(owner_query.changed().await.unwrap().unwrap().is_empty());
        assert!(admin_query.changed().await.unwrap().unwrap().is_empty());
    }

    #[tokio::test]
    async fn closes_when_dispatcher_is_dropped() {
        let db = Arc::new(Database::open_in_memory().unwrap());
        let dispatcher = Dispatcher::new();
        let mut query = LiveQuery::new(db, &dispatcher, GrievanceFilter::all());

        drop(dispatcher);
        assert!(query.changed().await.is_none());
    }
}
