use axum::{
    Json,
    extract::{Path, Query, State},
    http::StatusCode,
    response::IntoResponse,
};
use chrono::Utc;
use serde::Deserialize;
use tracing::error;
use uuid::Uuid;

use gripe_types::api::{AddUpdateRequest, FileGrievanceRequest, SetStatusRequest};
use gripe_types::events::ChangeEvent;
use gripe_types::models::{Grievance, GrievanceUpdate, Status};

use crate::AppState;

#[derive(Debug, Deserialize)]
pub struct ListQuery {
    /// Scope the list to one user's grievances; absent = admin view.
    pub owner: Option<String>,
}

pub async fn file_grievance(
    State(state): State<AppState>,
    Json(req): Json<FileGrievanceRequest>,
) -> Result<impl IntoResponse, StatusCode> {
    if req.title.trim().is_empty() {
        return Err(StatusCode::BAD_REQUEST);
    }

    let grievance = Grievance {
        id: Uuid::new_v4(),
        title: req.title.trim().to_string(),
        details: req
            .details
            .map(|d| d.trim().to_string())
            .filter(|d| !d.is_empty()),
        category: req.category,
        severity: req.severity,
        status: Status::Filed,
        owner_id: req.owner_id,
        created_at: Utc::now(),
        updates: vec![],
    };

    // Run blocking DB insert off the async runtime
    let db = state.clone();
    let g = grievance.clone();
    tokio::task::spawn_blocking(move || db.db.insert_grievance(&g))
        .await
        .map_err(|e| {
            error!("spawn_blocking join error: {}", e);
            StatusCode::INTERNAL_SERVER_ERROR
        })?
        .map_err(|e| {
            error!("Failed to insert grievance: {:#}", e);
            StatusCode::INTERNAL_SERVER_ERROR
        })?;

    state.dispatcher.broadcast(ChangeEvent::GrievanceCreated {
        after: grievance.clone(),
    });

    Ok((StatusCode::CREATED, Json(grievance)))
}

pub async fn list_grievances(
    State(state): State<AppState>,
    Query(query): Query<ListQuery>,
) -> Result<impl IntoResponse, StatusCode> {
    let db = state.clone();
    let grievances = tokio::task::spawn_blocking(move || match &query.owner {
        Some(owner) => db.db.list_by_owner(owner),
        None => db.db.list_all(),
    })
    .await
    .map_err(|e| {
        error!("spawn_blocking join error: {}", e);
        StatusCode::INTERNAL_SERVER_ERROR
    })?
    .map_err(|e| {
        error!("Failed to list grievances: {:#}", e);
        StatusCode::INTERNAL_SERVER_ERROR
    })?;

    Ok(Json(grievances))
}

pub async fn set_status(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
    Json(req): Json<SetStatusRequest>,
) -> Result<impl IntoResponse, StatusCode> {
    let db = state.clone();
    let gid = id.to_string();
    let before = tokio::task::spawn_blocking(move || {
        let before = db
            .db
            .get_grievance(&gid)
            .map_err(|e| {
                error!("Failed to load grievance: {:#}", e);
                StatusCode::INTERNAL_SERVER_ERROR
            })?
            .ok_or(StatusCode::NOT_FOUND)?;

        db.db.set_status(&gid, req.status).map_err(|e| {
            error!("Failed to set status: {:#}", e);
            StatusCode::INTERNAL_SERVER_ERROR
        })?;

        Ok::<_, StatusCode>(before)
    })
    .await
    .map_err(|e| {
        error!("spawn_blocking join error: {}", e);
        StatusCode::INTERNAL_SERVER_ERROR
    })??;

    let after = Grievance {
        status: req.status,
        ..before.clone()
    };

    state.dispatcher.broadcast(ChangeEvent::GrievanceUpdated {
        before,
        after: after.clone(),
    });

    Ok(Json(after))
}

pub async fn add_update(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
    Json(req): Json<AddUpdateRequest>,
) -> Result<impl IntoResponse, StatusCode> {
    if req.text.trim().is_empty() {
        return Err(StatusCode::BAD_REQUEST);
    }

    let update = GrievanceUpdate {
        text: req.text.trim().to_string(),
        at: Utc::now(),
    };

    let db = state.clone();
    let gid = id.to_string();
    let entry = update.clone();
    let before = tokio::task::spawn_blocking(move || {
        let before = db
            .db
            .get_grievance(&gid)
            .map_err(|e| {
                error!("Failed to load grievance: {:#}", e);
                StatusCode::INTERNAL_SERVER_ERROR
            })?
            .ok_or(StatusCode::NOT_FOUND)?;

        db.db.append_update(&gid, &entry).map_err(|e| {
            error!("Failed to append update: {:#}", e);
            StatusCode::INTERNAL_SERVER_ERROR
        })?;

        Ok::<_, StatusCode>(before)
    })
    .await
    .map_err(|e| {
        error!("spawn_blocking join error: {}", e);
        StatusCode::INTERNAL_SERVER_ERROR
    })??;

    let mut after = before.clone();
    after.updates.push(update);

    state.dispatcher.broadcast(ChangeEvent::GrievanceUpdated {
        before,
        after: after.clone(),
    });

    Ok((StatusCode::CREATED, Json(after)))
}

pub async fn delete_grievance(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
) -> Result<impl IntoResponse, StatusCode> {
    let db = state.clone();
    let gid = id.to_string();
    let before = tokio::task::spawn_blocking(move || {
        let before = db
            .db
            .get_grievance(&gid)
            .map_err(|e| {
                error!("Failed to load grievance: {:#}", e);
                StatusCode::INTERNAL_SERVER_ERROR
            })?
            .ok_or(StatusCode::NOT_FOUND)?;

        db.db.delete_grievance(&gid).map_err(|e| {
            error!("Failed to delete grievance: {:#}", e);
            StatusCode::INTERNAL_SERVER_ERROR
        })?;

        Ok::<_, StatusCode>(before)
    })
    .await
    .map_err(|e| {
        error!("spawn_blocking join error: {}", e);
        StatusCode::INTERNAL_SERVER_ERROR
    })??;

    state
        .dispatcher
        .broadcast(ChangeEvent::GrievanceDeleted { before });

    Ok(StatusCode::NO_CONTENT)
}
