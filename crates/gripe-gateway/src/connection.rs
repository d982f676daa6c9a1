use std::sync::Arc;

use axum::extract::ws::{Message, WebSocket};
use futures_util::{SinkExt, StreamExt};
use futures_util::stream::{SplitSink, SplitStream};
use tracing::{error, info, warn};

use gripe_db::Database;
use gripe_types::events::{SubscribeCommand, SubscribeFrame};

use crate::dispatcher::Dispatcher;
use crate::live_query::{GrievanceFilter, LiveQuery};

/// Handle a single live-query WebSocket connection.
///
/// The client opens with a Subscribe command; the server answers with an
/// initial snapshot and then a fresh snapshot after every relevant change,
/// until the client unsubscribes or the socket closes.
pub async fn handle_connection(socket: WebSocket, db: Arc<Database>, dispatcher: Dispatcher) {
    let (mut sender, mut receiver) = socket.split();

    // Step 1: wait for the Subscribe command
    let filter = match wait_for_subscribe(&mut receiver).await {
        Some(filter) => filter,
        None => {
            warn!("WebSocket client closed before subscribing");
            return;
        }
    };

    match &filter.owner {
        Some(owner) => info!("Live query opened for owner '{}'", owner),
        None => info!("Live query opened for admin view"),
    }

    let mut query = LiveQuery::new(db, &dispatcher, filter);

    // Step 2: initial snapshot
    if send_result(&mut sender, query.snapshot()).await.is_err() {
        return;
    }

    // Step 3: push a fresh snapshot per relevant change, until teardown
    loop {
        tokio::select! {
            change = query.changed() => {
                match change {
                    Some(result) => {
                        if send_result(&mut sender, result).await.is_err() {
                            break;
                        }
                    }
                    None => break,
                }
            }
            msg = receiver.next() => {
                match msg {
                    Some(Ok(Message::Text(text))) => {
                        if matches!(
                            serde_json::from_str::<SubscribeCommand>(text.as_str()),
                            Ok(SubscribeCommand::Unsubscribe)
                        ) {
                            info!("Live query unsubscribed");
                            break;
                        }
                    }
                    Some(Ok(Message::Close(_))) | None => break,
                    Some(Ok(_)) => {}
                    Some(Err(e)) => {
                        warn!("WebSocket receive error: {}", e);
                        break;
                    }
                }
            }
        }
    }

    query.unsubscribe();
}

async fn wait_for_subscribe(receiver: &mut SplitStream<WebSocket>) -> Option<GrievanceFilter> {
    while let Some(Ok(msg)) = receiver.next().await {
        if let Message::Text(text) = msg {
            match serde_json::from_str::<SubscribeCommand>(text.as_str()) {
                Ok(SubscribeCommand::Subscribe { owner }) => {
                    return Some(GrievanceFilter { owner });
                }
                Ok(SubscribeCommand::Unsubscribe) => return None,
                Err(e) => {
                    warn!("Ignoring malformed subscribe command: {}", e);
                }
            }
        }
    }
    None
}

/// Turn a query result into a frame for this client. A failed query becomes
/// an inline Error frame, visible to this subscriber only.
async fn send_result(
    sender: &mut SplitSink<WebSocket, Message>,
    result: anyhow::Result<Vec<gripe_types::models::Grievance>>,
) -> Result<(), axum::Error> {
    let frame = match result {
        Ok(grievances) => SubscribeFrame::Snapshot { grievances },
        Err(e) => {
            error!("Live query failed: {:#}", e);
            SubscribeFrame::Error {
                message: "Could not load grievances".to_string(),
            }
        }
    };

    sender
        .send(Message::Text(serde_json::to_string(&frame).unwrap().into()))
        .await
}
