use anyhow::Result;
use gripe_db::Database;
use gripe_types::api::{SendOutcome, TokenSendResult};
use tracing::info;

/// Prune token records the push service reported as unregistered.
///
/// Reactive only: runs when the external delivery worker posts its per-token
/// send results. Delivered and transient failures are left alone — nothing
/// is retried. Returns how many token rows were removed.
pub fn apply_delivery_report(db: &Database, results: &[TokenSendResult]) -> Result<usize> {
    let mut removed = 0;

    for result in results {
        if result.outcome != SendOutcome::Unregistered {
            continue;
        }
        if db.delete_token(&result.token)? {
            info!("Pruned unregistered push token");
            removed += 1;
        }
    }

    Ok(removed)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn result(token: &str, outcome: SendOutcome) -> TokenSendResult {
        TokenSendResult {
            token: token.to_string(),
            outcome,
        }
    }

    #[test]
    fn removes_only_unregistered_tokens() {
        let db = Database::open_in_memory().unwrap();
        db.upsert_token("tok-a", "u1").unwrap();
        db.upsert_token("tok-b", "u1").unwrap();
        db.upsert_token("tok-c", "u1").unwrap();

        let removed = apply_delivery_report(
            &db,
            &[
                result("tok-a", SendOutcome::Delivered),
                result("tok-b", SendOutcome::Unregistered),
                result("tok-c", SendOutcome::Failed),
            ],
        )
        .unwrap();

        assert_eq!(removed, 1);
        let remaining = db.tokens_for_uid("u1").unwrap();
        assert_eq!(remaining.len(), 2);
        assert!(!remaining.contains(&"tok-b".to_string()));
    }

    #[test]
    fn unknown_token_is_a_no_op() {
        let db = Database::open_in_memory().unwrap();

        let removed =
            apply_delivery_report(&db, &[result("tok-gone", SendOutcome::Unregistered)]).unwrap();

        assert_eq!(removed, 0);
    }
}
