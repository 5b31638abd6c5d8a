/// Content block and curriculum endpoints
use crate::{
    api::extract::ApiJson,
    auth::AdminAuth,
    content::{ContentBlock, ContentBlockInput, CurriculumLevel, CurriculumLevelInput},
    context::AppContext,
    error::{CmsError, CmsResult},
};
use axum::{
    extract::{Path, State},
    routing::{get, put},
    Json, Router,
};
use serde::Serialize;

/// Build content routes
pub fn routes() -> Router<AppContext> {
    Router::new()
        // Content blocks
        .route("/api/content", get(list_blocks))
        .route("/api/content/:key", get(get_block))
        .route("/api/admin/content", get(list_all_blocks))
        .route(
            "/api/admin/content/:key",
            put(upsert_block).delete(delete_block),
        )
        // Curriculum
        .route("/api/curriculum", get(list_levels))
        .route("/api/curriculum/:level", get(get_level))
        .route("/api/admin/curriculum", get(list_all_levels))
        .route(
            "/api/admin/curriculum/:level",
            put(upsert_level).delete(delete_level),
        )
}

#[derive(Debug, Serialize)]
struct ContentListResponse {
    blocks: Vec<ContentBlock>,
}

#[derive(Debug, Serialize)]
struct CurriculumListResponse {
    levels: Vec<CurriculumLevel>,
}

#[derive(Debug, Serialize)]
struct DeleteKeyResponse {
    key: String,
    deleted: bool,
}

async fn list_blocks(State(ctx): State<AppContext>) -> CmsResult<Json<ContentListResponse>> {
    let blocks = ctx.content_manager.list_active().await?;
    Ok(Json(ContentListResponse { blocks }))
}

async fn get_block(
    State(ctx): State<AppContext>,
    Path(key): Path<String>,
) -> CmsResult<Json<ContentBlock>> {
    ctx.content_manager
        .get_active(&key)
        .await?
        .map(Json)
        .ok_or_else(|| CmsError::NotFound(format!("Content block {} not found", key)))
}

async fn list_all_blocks(
    State(ctx): State<AppContext>,
    _auth: AdminAuth,
) -> CmsResult<Json<ContentListResponse>> {
    let blocks = ctx.content_manager.list_all().await?;
    Ok(Json(ContentListResponse { blocks }))
}

/// Create or replace a block
async fn upsert_block(
    State(ctx): State<AppContext>,
    auth: AdminAuth,
    Path(key): Path<String>,
    ApiJson(req): ApiJson<ContentBlockInput>,
) -> CmsResult<Json<ContentBlock>> {
    let block = ctx.content_manager.upsert(&key, req).await?;
    tracing::debug!("Content block {} saved by {}", block.key, auth.username);
    Ok(Json(block))
}

async fn delete_block(
    State(ctx): State<AppContext>,
    _auth: AdminAuth,
    Path(key): Path<String>,
) -> CmsResult<Json<DeleteKeyResponse>> {
    ctx.content_manager.delete(&key).await?;
    Ok(Json(DeleteKeyResponse { key, deleted: true }))
}

async fn list_levels(State(ctx): State<AppContext>) -> CmsResult<Json<CurriculumListResponse>> {
    let levels = ctx.curriculum_manager.list_active().await?;
    Ok(Json(CurriculumListResponse { levels }))
}

async fn get_level(
    State(ctx): State<AppContext>,
    Path(level): Path<String>,
) -> CmsResult<Json<CurriculumLevel>> {
    ctx.curriculum_manager
        .get_active(&level)
        .await?
        .map(Json)
        .ok_or_else(|| CmsError::NotFound(format!("Curriculum level {} not found", level)))
}

async fn list_all_levels(
    State(ctx): State<AppContext>,
    _auth: AdminAuth,
) -> CmsResult<Json<CurriculumListResponse>> {
    let levels = ctx.curriculum_manager.list_all().await?;
    Ok(Json(CurriculumListResponse { levels }))
}

async fn upsert_level(
    State(ctx): State<AppContext>,
    auth: AdminAuth,
    Path(level): Path<String>,
    ApiJson(req): ApiJson<CurriculumLevelInput>,
) -> CmsResult<Json<CurriculumLevel>> {
    let saved = ctx.curriculum_manager.upsert(&level, req).await?;
    tracing::debug!("Curriculum level {} saved by {}", saved.level, auth.username);
    Ok(Json(saved))
}

async fn delete_level(
    State(ctx): State<AppContext>,
    _auth: AdminAuth,
    Path(level): Path<String>,
) -> CmsResult<Json<DeleteKeyResponse>> {
    ctx.curriculum_manager.delete(&level).await?;
    Ok(Json(DeleteKeyResponse {
        key: level,
        deleted: true,
    }))
}
