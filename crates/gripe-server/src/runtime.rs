use std::sync::Arc;

use tokio::sync::broadcast::error::RecvError;
use tracing::warn;

use gripe_db::Database;
use gripe_gateway::dispatcher::Dispatcher;
use gripe_notify::config::NotifyConfig;
use gripe_notify::triggers;

/// Spawn the trigger runtime: a task that watches the change stream and
/// runs the notification handlers once per write event.
///
/// Each event gets its own independent blocking task; handlers hold no
/// shared state and do not coordinate. A lagging runtime drops events —
/// best-effort delivery is all the notification path promises.
pub fn spawn(
    db: Arc<Database>,
    dispatcher: &Dispatcher,
    config: NotifyConfig,
) -> tokio::task::JoinHandle<()> {
    let mut rx = dispatcher.subscribe();

    tokio::spawn(async move {
        loop {
            match rx.recv().await {
                Ok(event) => {
                    let db = db.clone();
                    let config = config.clone();
                    tokio::task::spawn_blocking(move || {
                        triggers::handle_change(&db, &config, &event)
                    });
                }
                Err(RecvError::Lagged(n)) => {
                    warn!("Trigger runtime lagged, {} change events dropped", n);
                }
                Err(RecvError::Closed) => break,
            }
        }
    })
}
