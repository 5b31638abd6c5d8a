/// Admin session and dashboard endpoints
use crate::{
    api::extract::ApiJson,
    assets::AssetKind,
    auth::{check_admin_credentials, issue_admin_token, AdminAuth},
    context::AppContext,
    error::{CmsError, CmsResult},
};
use axum::{
    extract::State,
    routing::{get, post},
    Json, Router,
};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Build admin routes
pub fn routes() -> Router<AppContext> {
    Router::new()
        .route("/api/admin/login", post(login))
        .route("/api/admin/verify", get(verify))
        .route("/api/admin/stats", get(stats))
}

#[derive(Debug, Default, Deserialize)]
#[serde(default)]
struct LoginRequest {
    username: String,
    password: String,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct LoginResponse {
    token: String,
    expires_at: DateTime<Utc>,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct VerifyResponse {
    valid: bool,
    username: String,
    expires_at: DateTime<Utc>,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct StatsResponse {
    images: i64,
    videos: i64,
    gallery: i64,
    video_gallery: i64,
    content_blocks: i64,
    curriculum_levels: i64,
    events: i64,
    feedback: i64,
    unread_feedback: i64,
}

/// Exchange the admin credentials for a bearer token
async fn login(
    State(ctx): State<AppContext>,
    ApiJson(req): ApiJson<LoginRequest>,
) -> CmsResult<Json<LoginResponse>> {
    let auth_config = &ctx.config.authentication;

    if !check_admin_credentials(auth_config, &req.username, &req.password) {
        tracing::warn!("Failed admin login for {:?}", req.username);
        return Err(CmsError::Authentication("Invalid credentials".to_string()));
    }

    let (token, expires_at) = issue_admin_token(auth_config, &req.username, Utc::now())?;
    tracing::info!("Admin {} logged in", req.username);

    Ok(Json(LoginResponse { token, expires_at }))
}

async fn verify(auth: AdminAuth) -> Json<VerifyResponse> {
    Json(VerifyResponse {
        valid: true,
        username: auth.username,
        expires_at: auth.expires_at,
    })
}

/// Record counts for the dashboard
async fn stats(State(ctx): State<AppContext>, _auth: AdminAuth) -> CmsResult<Json<StatsResponse>> {
    let assets = &ctx.asset_manager;

    Ok(Json(StatsResponse {
        images: assets.count(AssetKind::Image).await?,
        videos: assets.count(AssetKind::Video).await?,
        gallery: assets.count(AssetKind::Gallery).await?,
        video_gallery: assets.count(AssetKind::VideoGallery).await?,
        content_blocks: ctx.content_manager.count().await?,
        curriculum_levels: ctx.curriculum_manager.count().await?,
        events: ctx.event_manager.count().await?,
        feedback: ctx.feedback_manager.count().await?,
        unread_feedback: ctx.feedback_manager.count_unread().await?,
    }))
}
