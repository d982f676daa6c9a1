mod runtime;

use std::net::SocketAddr;
use std::path::PathBuf;
use std::sync::Arc;

use axum::{
    Router,
    extract::{State, WebSocketUpgrade},
    response::IntoResponse,
    routing::{delete, get, patch, post, put},
};
use tower_http::cors::CorsLayer;
use tower_http::trace::TraceLayer;
use tracing::info;

use gripe_api::{AppState, AppStateInner, grievances, tokens};
use gripe_gateway::{connection, dispatcher::Dispatcher};
use gripe_notify::config::NotifyConfig;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Load .env if present
    let _ = dotenvy::dotenv();

    // Init logging
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "gripe=debug,tower_http=debug".into()),
        )
        .init();

    // Config
    let host = std::env::var("GRIPE_HOST").unwrap_or_else(|_| "0.0.0.0".into());
    let port: u16 = std::env::var("GRIPE_PORT")
        .unwrap_or_else(|_| "3000".into())
        .parse()?;
    let db_path = std::env::var("GRIPE_DB_PATH").unwrap_or_else(|_| "gripe.db".into());
    let notify_config = notify_config_from_env()?;

    // Init database
    let db = Arc::new(gripe_db::Database::open(&PathBuf::from(&db_path))?);

    // Shared state
    let dispatcher = Dispatcher::new();
    let app_state: AppState = Arc::new(AppStateInner {
        db: db.clone(),
        dispatcher: dispatcher.clone(),
    });

    // Trigger runtime: reacts to every store write
    runtime::spawn(db, &dispatcher, notify_config);

    // Routes
    let app = Router::new()
        .route(
            "/grievances",
            post(grievances::file_grievance).get(grievances::list_grievances),
        )
        .route("/grievances/{id}", delete(grievances::delete_grievance))
        .route("/grievances/{id}/status", patch(grievances::set_status))
        .route("/grievances/{id}/updates", post(grievances::add_update))
        .route("/tokens/{token}", put(tokens::register_token))
        .route("/delivery/report", post(tokens::delivery_report))
        .route("/subscribe", get(ws_upgrade))
        .with_state(app_state)
        .layer(CorsLayer::permissive())
        .layer(TraceLayer::new_for_http());

    let addr: SocketAddr = format!("{}:{}", host, port).parse()?;
    info!("Gripe server listening on {}", addr);

    let listener = tokio::net::TcpListener::bind(addr).await?;
    axum::serve(listener, app).await?;

    Ok(())
}

async fn ws_upgrade(State(state): State<AppState>, ws: WebSocketUpgrade) -> impl IntoResponse {
    let db = state.db.clone();
    let dispatcher = state.dispatcher.clone();
    ws.on_upgrade(move |socket| connection::handle_connection(socket, db, dispatcher))
}

fn notify_config_from_env() -> anyhow::Result<NotifyConfig> {
    let delivery = std::env::var("GRIPE_DELIVERY")
        .unwrap_or_else(|_| "email".into())
        .parse()
        .map_err(|e| anyhow::anyhow!("GRIPE_DELIVERY: {}", e))?;
    let notify_on = std::env::var("GRIPE_NOTIFY_ON")
        .unwrap_or_else(|_| "update-append".into())
        .parse()
        .map_err(|e| anyhow::anyhow!("GRIPE_NOTIFY_ON: {}", e))?;

    Ok(NotifyConfig {
        admin_email: std::env::var("GRIPE_ADMIN_EMAIL").unwrap_or_default(),
        admin_uid: std::env::var("GRIPE_ADMIN_UID").unwrap_or_else(|_| "admin".into()),
        user_email: std::env::var("GRIPE_USER_EMAIL").unwrap_or_default(),
        from_email: std::env::var("GRIPE_FROM_EMAIL").ok(),
        delivery,
        notify_on,
    })
}
