use axum::{
    Json,
    extract::{Path, State},
    http::StatusCode,
    response::IntoResponse,
};
use tracing::error;

use gripe_notify::cleanup;
use gripe_types::api::{DeliveryReportRequest, DeliveryReportResponse, RegisterTokenRequest};

use crate::AppState;

/// Register or refresh a device push token, keyed by the token itself.
pub async fn register_token(
    State(state): State<AppState>,
    Path(token): Path<String>,
    Json(req): Json<RegisterTokenRequest>,
) -> Result<impl IntoResponse, StatusCode> {
    if token.trim().is_empty() || req.uid.trim().is_empty() {
        return Err(StatusCode::BAD_REQUEST);
    }

    let db = state.clone();
    tokio::task::spawn_blocking(move || db.db.upsert_token(&token, &req.uid))
        .await
        .map_err(|e| {
            error!("spawn_blocking join error: {}", e);
            StatusCode::INTERNAL_SERVER_ERROR
        })?
        .map_err(|e| {
            error!("Failed to register push token: {:#}", e);
            StatusCode::INTERNAL_SERVER_ERROR
        })?;

    Ok(StatusCode::NO_CONTENT)
}

/// The external delivery worker posts its per-token send results here;
/// unregistered tokens are pruned.
pub async fn delivery_report(
    State(state): State<AppState>,
    Json(req): Json<DeliveryReportRequest>,
) -> Result<impl IntoResponse, StatusCode> {
    let db = state.clone();
    let tokens_removed =
        tokio::task::spawn_blocking(move || cleanup::apply_delivery_report(&db.db, &req.results))
            .await
            .map_err(|e| {
                error!("spawn_blocking join error: {}", e);
                StatusCode::INTERNAL_SERVER_ERROR
            })?
            .map_err(|e| {
                error!("Failed to apply delivery report: {:#}", e);
                StatusCode::INTERNAL_SERVER_ERROR
            })?;

    Ok(Json(DeliveryReportResponse { tokens_removed }))
}
