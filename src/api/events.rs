/// Annual events endpoints
use crate::{
    api::extract::ApiJson,
    auth::AdminAuth,
    content::{AnnualEvent, EventFilter, EventUpdate, NewEvent},
    context::AppContext,
    error::{CmsError, CmsResult},
};
use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    routing::{get, put},
    Json, Router,
};
use serde::Serialize;

/// Build event routes
pub fn routes() -> Router<AppContext> {
    Router::new()
        .route("/api/events", get(list_events))
        .route("/api/events/:id", get(get_event))
        .route("/api/admin/events", get(list_all_events).post(create_event))
        .route(
            "/api/admin/events/:id",
            put(update_event).delete(delete_event),
        )
}

#[derive(Debug, Serialize)]
struct EventListResponse {
    events: Vec<AnnualEvent>,
}

#[derive(Debug, Serialize)]
struct DeleteEventResponse {
    id: String,
    deleted: bool,
}

/// Active events in calendar order
async fn list_events(
    State(ctx): State<AppContext>,
    Query(filter): Query<EventFilter>,
) -> CmsResult<Json<EventListResponse>> {
    let events = ctx.event_manager.list_active(&filter).await?;
    Ok(Json(EventListResponse { events }))
}

async fn get_event(
    State(ctx): State<AppContext>,
    Path(id): Path<String>,
) -> CmsResult<Json<AnnualEvent>> {
    ctx.event_manager
        .get(&id)
        .await?
        .filter(|event| event.is_active)
        .map(Json)
        .ok_or_else(|| CmsError::NotFound(format!("Event {} not found", id)))
}

async fn list_all_events(
    State(ctx): State<AppContext>,
    _auth: AdminAuth,
) -> CmsResult<Json<EventListResponse>> {
    let events = ctx.event_manager.list_all().await?;
    Ok(Json(EventListResponse { events }))
}

async fn create_event(
    State(ctx): State<AppContext>,
    _auth: AdminAuth,
    ApiJson(req): ApiJson<NewEvent>,
) -> CmsResult<(StatusCode, Json<AnnualEvent>)> {
    let event = ctx.event_manager.create(req).await?;
    Ok((StatusCode::CREATED, Json(event)))
}

async fn update_event(
    State(ctx): State<AppContext>,
    _auth: AdminAuth,
    Path(id): Path<String>,
    ApiJson(req): ApiJson<EventUpdate>,
) -> CmsResult<Json<AnnualEvent>> {
    let event = ctx.event_manager.update(&id, req).await?;
    Ok(Json(event))
}

async fn delete_event(
    State(ctx): State<AppContext>,
    _auth: AdminAuth,
    Path(id): Path<String>,
) -> CmsResult<Json<DeleteEventResponse>> {
    ctx.event_manager.delete(&id).await?;
    Ok(Json(DeleteEventResponse { id, deleted: true }))
}
