use chrono::Utc;
use gripe_db::Database;
use gripe_types::events::ChangeEvent;
use gripe_types::models::Grievance;
use gripe_types::notify::{NotificationChannel, OutboundNotification};
use tracing::{debug, error, info, warn};
use uuid::Uuid;

use crate::NotifyError;
use crate::config::{Delivery, NotifyConfig, NotifyOn};

/// Trigger entry point, invoked once per store write event. Runs as an
/// independent stateless task; every failure path is log-and-stop, nothing
/// is surfaced to any user and nothing is retried.
pub fn handle_change(db: &Database, cfg: &NotifyConfig, event: &ChangeEvent) {
    let result = match event {
        ChangeEvent::GrievanceCreated { after } => on_created(db, cfg, after),
        ChangeEvent::GrievanceUpdated { before, after } => on_updated(db, cfg, before, after),
        ChangeEvent::GrievanceDeleted { before } => {
            debug!("Grievance '{}' deleted; deletions are not notifiable", before.title);
            Ok(())
        }
    };

    match result {
        Ok(()) => {}
        Err(NotifyError::MissingRecipient(why)) => {
            warn!("No notification sent: {}", why);
        }
        Err(NotifyError::Enqueue(e)) => {
            // Known gap: the write is lost with only this line as evidence.
            error!("Failed to enqueue notification: {:#}", e);
        }
    }
}

/// New grievance: tell the admin.
fn on_created(db: &Database, cfg: &NotifyConfig, after: &Grievance) -> Result<(), NotifyError> {
    let recipients = admin_recipients(db, cfg)?;
    let subject = format!("New Grievance Filed: {}", after.title);

    let body = match cfg.delivery {
        Delivery::Email => {
            let details = after
                .details
                .as_deref()
                .map(|d| format!("<li><strong>Details:</strong> {}</li>", d))
                .unwrap_or_default();
            format!(
                "<h1>New Grievance Submitted</h1>\
                 <p>A new grievance has been filed.</p>\
                 <ul>\
                 <li><strong>Title:</strong> {}</li>\
                 <li><strong>Severity:</strong> {}</li>\
                 <li><strong>Category:</strong> {}</li>\
                 {}\
                 </ul>\
                 <p>You can view and manage this grievance in the admin view.</p>",
                after.title, after.severity, after.category, details
            )
        }
        Delivery::Push => format!("{} severity, {}", after.severity, after.category),
    };

    enqueue(db, cfg, recipients, subject, body)?;
    info!("Admin notified of new grievance '{}'", after.title);
    Ok(())
}

/// Existing grievance changed: tell the owner, if the change is notifiable
/// under the configured firing condition.
fn on_updated(
    db: &Database,
    cfg: &NotifyConfig,
    before: &Grievance,
    after: &Grievance,
) -> Result<(), NotifyError> {
    let (subject, body) = match cfg.notify_on {
        NotifyOn::UpdateAppend => {
            if after.updates.len() <= before.updates.len() {
                debug!("No new update entry on '{}'; nothing to send", after.title);
                return Ok(());
            }
            // Several entries appended between observed states collapse to
            // the last one.
            let Some(latest) = after.updates.last() else {
                return Ok(());
            };

            let subject = format!("Update on your Grievance: {}", after.title);
            let body = match cfg.delivery {
                Delivery::Email => format!(
                    "<h1>Grievance Update</h1>\
                     <p>Your grievance \"<strong>{}</strong>\" has a new response:</p>\
                     <p>{}</p>",
                    after.title, latest.text
                ),
                Delivery::Push => latest.text.clone(),
            };
            (subject, body)
        }
        NotifyOn::StatusChange => {
            if after.status == before.status {
                debug!("No status change on '{}'; nothing to send", after.title);
                return Ok(());
            }

            let subject = format!("Status Update for your Grievance: {}", after.title);
            let body = match cfg.delivery {
                Delivery::Email => format!(
                    "<h1>Grievance Status Updated</h1>\
                     <p>The status of your grievance \"<strong>{}</strong>\" has been updated.</p>\
                     <p>The new status is: <strong>{}</strong></p>",
                    after.title, after.status
                ),
                Delivery::Push => format!("New status: {}", after.status),
            };
            (subject, body)
        }
    };

    let recipients = owner_recipients(db, cfg, &after.owner_id)?;
    enqueue(db, cfg, recipients, subject, body)?;
    info!("Owner '{}' notified about '{}'", after.owner_id, after.title);
    Ok(())
}

fn admin_recipients(db: &Database, cfg: &NotifyConfig) -> Result<Vec<String>, NotifyError> {
    match cfg.delivery {
        Delivery::Email => {
            if cfg.admin_email.trim().is_empty() {
                return Err(NotifyError::MissingRecipient(
                    "admin email is not configured".into(),
                ));
            }
            Ok(vec![cfg.admin_email.clone()])
        }
        Delivery::Push => {
            let tokens = db
                .tokens_for_uid(&cfg.admin_uid)
                .map_err(NotifyError::Enqueue)?;
            if tokens.is_empty() {
                return Err(NotifyError::MissingRecipient(format!(
                    "no push tokens registered for admin uid '{}'",
                    cfg.admin_uid
                )));
            }
            Ok(tokens)
        }
    }
}

fn owner_recipients(
    db: &Database,
    cfg: &NotifyConfig,
    owner_id: &str,
) -> Result<Vec<String>, NotifyError> {
    if owner_id.trim().is_empty() {
        return Err(NotifyError::MissingRecipient(
            "grievance has no owner id".into(),
        ));
    }

    match cfg.delivery {
        Delivery::Email => {
            if cfg.user_email.trim().is_empty() {
                return Err(NotifyError::MissingRecipient(
                    "user email is not configured".into(),
                ));
            }
            Ok(vec![cfg.user_email.clone()])
        }
        Delivery::Push => {
            let tokens = db.tokens_for_uid(owner_id).map_err(NotifyError::Enqueue)?;
            if tokens.is_empty() {
                return Err(NotifyError::MissingRecipient(format!(
                    "no push tokens registered for uid '{}'",
                    owner_id
                )));
            }
            Ok(tokens)
        }
    }
}

fn enqueue(
    db: &Database,
    cfg: &NotifyConfig,
    recipients: Vec<String>,
    subject: String,
    body: String,
) -> Result<(), NotifyError> {
    let (channel, from, click_target, icon) = match cfg.delivery {
        Delivery::Email => (NotificationChannel::Email, cfg.from_email.clone(), None, None),
        Delivery::Push => (
            NotificationChannel::Push,
            None,
            Some(NotifyConfig::CLICK_TARGET.to_string()),
            Some(NotifyConfig::ICON.to_string()),
        ),
    };

    let notification = OutboundNotification {
        id: Uuid::new_v4(),
        channel,
        recipients,
        from,
        subject,
        body,
        click_target,
        icon,
        enqueued_at: Utc::now(),
    };

    db.enqueue_notification(&notification)
        .map_err(NotifyError::Enqueue)
}

#[cfg(test)]
mod tests {
    use super::*;
    use gripe_types::models::{GrievanceUpdate, Severity, Status};

    fn config(delivery: Delivery, notify_on: NotifyOn) -> NotifyConfig {
        NotifyConfig {
            admin_email: "admin@example.com".to_string(),
            admin_uid: "admin".to_string(),
            user_email: "user@example.com".to_string(),
            from_email: Some("noreply@example.com".to_string()),
            delivery,
            notify_on,
        }
    }

    fn grievance(title: &str, owner: &str) -> Grievance {
        Grievance {
            id: Uuid::new_v4(),
            title: title.to_string(),
            details: None,
            category: "Attention".to_string(),
            severity: Severity::Medium,
            status: Status::Filed,
            owner_id: owner.to_string(),
            created_at: Utc::now(),
            updates: vec![],
        }
    }

    fn with_update(mut g: Grievance, text: &str) -> Grievance {
        g.updates.push(GrievanceUpdate {
            text: text.to_string(),
            at: Utc::now(),
        });
        g
    }

    #[test]
    fn creation_notifies_admin_by_email() {
        let db = Database::open_in_memory().unwrap();
        let cfg = config(Delivery::Email, NotifyOn::UpdateAppend);

        let g = Grievance {
            severity: Severity::High,
            category: "Forgetfulness".to_string(),
            ..grievance("Forgot anniversary", "u1")
        };
        handle_change(&db, &cfg, &ChangeEvent::GrievanceCreated { after: g });

        let outbox = db.list_notifications().unwrap();
        assert_eq!(outbox.len(), 1);
        let n = &outbox[0];
        assert_eq!(n.channel, NotificationChannel::Email);
        assert_eq!(n.recipients, vec!["admin@example.com".to_string()]);
        assert_eq!(n.from.as_deref(), Some("noreply@example.com"));
        assert!(n.subject.contains("Forgot anniversary"));
        assert!(n.body.contains("High"));
        assert!(n.body.contains("Forgetfulness"));
    }

    #[test]
    fn creation_notifies_all_admin_tokens() {
        let db = Database::open_in_memory().unwrap();
        let cfg = config(Delivery::Push, NotifyOn::UpdateAppend);
        db.upsert_token("tok-phone", "admin").unwrap();
        db.upsert_token("tok-laptop", "admin").unwrap();

        handle_change(
            &db,
            &cfg,
            &ChangeEvent::GrievanceCreated { after: grievance("Dishes", "u1") },
        );

        let outbox = db.list_notifications().unwrap();
        assert_eq!(outbox.len(), 1);
        let n = &outbox[0];
        assert_eq!(n.channel, NotificationChannel::Push);
        assert_eq!(n.recipients.len(), 2);
        assert!(n.recipients.contains(&"tok-phone".to_string()));
        assert_eq!(n.click_target.as_deref(), Some(NotifyConfig::CLICK_TARGET));
        assert_eq!(n.icon.as_deref(), Some(NotifyConfig::ICON));
    }

    #[test]
    fn appended_update_notifies_owner_with_last_entry() {
        let db = Database::open_in_memory().unwrap();
        let cfg = config(Delivery::Push, NotifyOn::UpdateAppend);
        db.upsert_token("tok-u1", "u1").unwrap();

        let before = grievance("Dishes", "u1");
        // two entries appended between observed states collapse to the last
        let after = with_update(with_update(before.clone(), "Looking into it"), "Fixed it");
        handle_change(&db, &cfg, &ChangeEvent::GrievanceUpdated { before, after });

        let outbox = db.list_notifications().unwrap();
        assert_eq!(outbox.len(), 1);
        let n = &outbox[0];
        assert_eq!(n.recipients, vec!["tok-u1".to_string()]);
        assert!(n.subject.contains("Dishes"));
        assert_eq!(n.body, "Fixed it");
    }

    #[test]
    fn unchanged_write_sends_nothing() {
        let db = Database::open_in_memory().unwrap();
        let cfg = config(Delivery::Push, NotifyOn::UpdateAppend);
        db.upsert_token("tok-u1", "u1").unwrap();

        let before = with_update(grievance("Dishes", "u1"), "Looking into it");
        let after = before.clone();
        handle_change(&db, &cfg, &ChangeEvent::GrievanceUpdated { before, after });

        assert!(db.list_notifications().unwrap().is_empty());
    }

    #[test]
    fn status_change_is_ignored_in_update_append_mode() {
        let db = Database::open_in_memory().unwrap();
        let cfg = config(Delivery::Push, NotifyOn::UpdateAppend);
        db.upsert_token("tok-u1", "u1").unwrap();

        let before = grievance("Dishes", "u1");
        let after = Grievance {
            status: Status::Working,
            ..before.clone()
        };
        handle_change(&db, &cfg, &ChangeEvent::GrievanceUpdated { before, after });

        assert!(db.list_notifications().unwrap().is_empty());
    }

    #[test]
    fn status_change_variant_notifies_new_status() {
        let db = Database::open_in_memory().unwrap();
        let cfg = config(Delivery::Email, NotifyOn::StatusChange);

        let before = grievance("Dishes", "u1");
        let after = Grievance {
            status: Status::Working,
            ..before.clone()
        };
        handle_change(&db, &cfg, &ChangeEvent::GrievanceUpdated { before, after });

        let outbox = db.list_notifications().unwrap();
        assert_eq!(outbox.len(), 1);
        let n = &outbox[0];
        assert_eq!(n.recipients, vec!["user@example.com".to_string()]);
        assert!(n.subject.contains("Dishes"));
        assert!(n.body.contains("Working"));
    }

    #[test]
    fn status_change_variant_ignores_appended_update() {
        let db = Database::open_in_memory().unwrap();
        let cfg = config(Delivery::Email, NotifyOn::StatusChange);

        let before = grievance("Dishes", "u1");
        let after = with_update(before.clone(), "Fixed it");
        handle_change(&db, &cfg, &ChangeEvent::GrievanceUpdated { before, after });

        assert!(db.list_notifications().unwrap().is_empty());
    }

    #[test]
    fn missing_owner_tokens_sends_nothing() {
        let db = Database::open_in_memory().unwrap();
        let cfg = config(Delivery::Push, NotifyOn::UpdateAppend);
        // no tokens registered for u1

        let before = grievance("Dishes", "u1");
        let after = with_update(before.clone(), "Fixed it");
        handle_change(&db, &cfg, &ChangeEvent::GrievanceUpdated { before, after });

        assert!(db.list_notifications().unwrap().is_empty());
    }

    #[test]
    fn blank_admin_email_sends_nothing() {
        let db = Database::open_in_memory().unwrap();
        let cfg = NotifyConfig {
            admin_email: "".to_string(),
            ..config(Delivery::Email, NotifyOn::UpdateAppend)
        };

        handle_change(
            &db,
            &cfg,
            &ChangeEvent::GrievanceCreated { after: grievance("Dishes", "u1") },
        );

        assert!(db.list_notifications().unwrap().is_empty());
    }

    #[test]
    fn deletion_sends_nothing() {
        let db = Database::open_in_memory().unwrap();
        let cfg = config(Delivery::Email, NotifyOn::UpdateAppend);

        handle_change(
            &db,
            &cfg,
            &ChangeEvent::GrievanceDeleted { before: grievance("Dishes", "u1") },
        );

        assert!(db.list_notifications().unwrap().is_empty());
    }
}
