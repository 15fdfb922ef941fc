use std::sync::Arc;

use axum::extract::rejection::JsonRejection;
use axum::extract::{Path, State};
use axum::http::StatusCode;
use axum::routing::{delete, get};
use axum::{Json, Router};
use chrono::{DateTime, Utc};
use puppy_core::db::{EventRepository, EventStore};
use puppy_core::{ConnectionState, EventId, EventKind, EventRecord};
use serde::{Deserialize, Serialize};
use tower_http::cors::{Any, CorsLayer};
use tower_http::trace::TraceLayer;

use crate::error::AppError;

#[derive(Clone)]
pub struct AppState {
    store: Arc<EventStore>,
}

impl AppState {
    pub const fn new(store: Arc<EventStore>) -> Self {
        Self { store }
    }
}

pub fn app_router(state: AppState) -> Router {
    Router::new()
        .route("/healthz", get(healthz))
        .route("/api/events", get(list_events).post(create_event))
        .route("/api/events/{id}", delete(delete_event))
        .layer(TraceLayer::new_for_http())
        .layer(
            CorsLayer::new()
                .allow_origin(Any)
                .allow_headers(Any)
                .allow_methods(Any),
        )
        .with_state(state)
}

#[derive(Debug, Serialize)]
struct HealthResponse {
    status: &'static str,
    database: ConnectionState,
    timestamp: i64,
}

async fn healthz(State(state): State<AppState>) -> Json<HealthResponse> {
    Json(HealthResponse {
        status: "ok",
        database: state.store.manager().state(),
        timestamp: Utc::now().timestamp(),
    })
}

async fn list_events(State(state): State<AppState>) -> Result<Json<Vec<EventRecord>>, AppError> {
    tracing::debug!("Querying events");
    let events = state
        .store
        .list_all()
        .await
        .map_err(|error| AppError::store("Error fetching events", error))?;
    tracing::info!(count = events.len(), "Found events");
    Ok(Json(events))
}

/// Body of `POST /api/events`. `timestamp` defaults to now.
#[derive(Debug, Deserialize)]
struct CreateEventRequest {
    #[serde(rename = "type")]
    kind: EventKind,
    #[serde(default)]
    timestamp: Option<DateTime<Utc>>,
    id: EventId,
}

async fn create_event(
    State(state): State<AppState>,
    payload: Result<Json<CreateEventRequest>, JsonRejection>,
) -> Result<(StatusCode, Json<EventRecord>), AppError> {
    // Checked before parsing so an outage reads as 503 regardless of the body.
    if !state.store.manager().is_available() {
        return Err(AppError::Unavailable);
    }

    let Json(request) =
        payload.map_err(|rejection| AppError::bad_request("Error creating event", rejection.body_text()))?;
    let record = EventRecord::new(
        request.id,
        request.kind,
        request.timestamp.unwrap_or_else(Utc::now),
    );

    let created = state.store.create(&record).await.map_err(|error| {
        tracing::warn!(%error, id = %record.id, "Error creating event");
        AppError::store("Error creating event", error)
    })?;
    tracing::info!(id = %created.id, kind = %created.kind, "Created event");
    Ok((StatusCode::CREATED, Json(created)))
}

async fn delete_event(
    State(state): State<AppState>,
    Path(raw_id): Path<String>,
) -> Result<Json<EventRecord>, AppError> {
    if !state.store.manager().is_available() {
        return Err(AppError::Unavailable);
    }

    let Ok(id) = raw_id.parse::<EventId>() else {
        return Err(AppError::NotFound);
    };

    let deleted = state
        .store
        .delete_by_id(id)
        .await
        .map_err(|error| AppError::store("Error deleting event", error))?;
    tracing::info!(id = %deleted.id, kind = %deleted.kind, "Deleted event");
    Ok(Json(deleted))
}
