/// Image, video, gallery and video-gallery endpoints
///
/// The four collections share one set of handlers, instantiated per
/// collection through [`AssetCollection`].
use crate::{
    api::extract::ApiJson,
    assets::{
        Asset, AssetFilter, AssetKind, AssetUpdate, BatchReport, NewAssetReference,
        UploadAssetRequest,
    },
    auth::AdminAuth,
    context::AppContext,
    error::{CmsError, CmsResult},
};
use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    routing::{get, post, put},
    Json, Router,
};
use serde::{Deserialize, Serialize};

/// Binds a URL path segment to an asset kind
pub trait AssetCollection: Send + Sync + 'static {
    const KIND: AssetKind;
    /// Path segment under `/api` and `/api/admin`
    const PATH: &'static str;
}

pub struct Images;
pub struct Videos;
pub struct Gallery;
pub struct VideoGallery;

impl AssetCollection for Images {
    const KIND: AssetKind = AssetKind::Image;
    const PATH: &'static str = "images";
}

impl AssetCollection for Videos {
    const KIND: AssetKind = AssetKind::Video;
    const PATH: &'static str = "videos";
}

impl AssetCollection for Gallery {
    const KIND: AssetKind = AssetKind::Gallery;
    const PATH: &'static str = "gallery";
}

impl AssetCollection for VideoGallery {
    const KIND: AssetKind = AssetKind::VideoGallery;
    const PATH: &'static str = "video-gallery";
}

/// Build asset routes for every collection
pub fn routes() -> Router<AppContext> {
    Router::new()
        .merge(collection_routes::<Images>())
        .merge(collection_routes::<Videos>())
        .merge(collection_routes::<Gallery>())
        .merge(collection_routes::<VideoGallery>())
}

fn collection_routes<C: AssetCollection>() -> Router<AppContext> {
    let public = format!("/api/{}", C::PATH);
    let admin = format!("/api/admin/{}", C::PATH);

    Router::new()
        // Public
        .route(&public, get(list_active::<C>))
        .route(&format!("{}/:id", public), get(get_active::<C>))
        // Admin
        .route(&admin, get(list_all::<C>).post(create_reference::<C>))
        .route(&format!("{}/upload", admin), post(upload::<C>))
        .route(&format!("{}/batch", admin), post(batch_upload::<C>))
        .route(
            &format!("{}/:id", admin),
            put(update::<C>).delete(delete::<C>),
        )
}

#[derive(Debug, Serialize)]
pub struct AssetListResponse {
    pub items: Vec<Asset>,
    pub count: usize,
}

impl From<Vec<Asset>> for AssetListResponse {
    fn from(items: Vec<Asset>) -> Self {
        Self {
            count: items.len(),
            items,
        }
    }
}

#[derive(Debug, Deserialize)]
pub struct BatchUploadRequest {
    #[serde(default)]
    pub items: Vec<serde_json::Value>,
}

#[derive(Debug, Serialize)]
pub struct DeleteResponse {
    pub id: String,
    pub deleted: bool,
}

/// List active assets
async fn list_active<C: AssetCollection>(
    State(ctx): State<AppContext>,
    Query(filter): Query<AssetFilter>,
) -> CmsResult<Json<AssetListResponse>> {
    let items = ctx.asset_manager.list_active(C::KIND, &filter).await?;
    Ok(Json(items.into()))
}

/// Get one active asset
async fn get_active<C: AssetCollection>(
    State(ctx): State<AppContext>,
    Path(id): Path<String>,
) -> CmsResult<Json<Asset>> {
    ctx.asset_manager
        .get(C::KIND, &id)
        .await?
        .filter(|asset| asset.is_active)
        .map(Json)
        .ok_or_else(|| CmsError::NotFound(format!("{} {} not found", C::KIND.label(), id)))
}

/// List every asset, including inactive ones
async fn list_all<C: AssetCollection>(
    State(ctx): State<AppContext>,
    _auth: AdminAuth,
) -> CmsResult<Json<AssetListResponse>> {
    let items = ctx.asset_manager.list_all(C::KIND).await?;
    Ok(Json(items.into()))
}

/// Create an asset pointing at an existing URL
async fn create_reference<C: AssetCollection>(
    State(ctx): State<AppContext>,
    _auth: AdminAuth,
    ApiJson(req): ApiJson<NewAssetReference>,
) -> CmsResult<(StatusCode, Json<Asset>)> {
    let asset = ctx.asset_manager.create_from_reference(C::KIND, req).await?;
    Ok((StatusCode::CREATED, Json(asset)))
}

/// Upload a single `data:` URI
async fn upload<C: AssetCollection>(
    State(ctx): State<AppContext>,
    _auth: AdminAuth,
    ApiJson(req): ApiJson<UploadAssetRequest>,
) -> CmsResult<(StatusCode, Json<Asset>)> {
    let asset = ctx.asset_manager.create_from_upload(C::KIND, req).await?;
    Ok((StatusCode::CREATED, Json(asset)))
}

/// Upload several items; per-item failures are reported, not raised
async fn batch_upload<C: AssetCollection>(
    State(ctx): State<AppContext>,
    _auth: AdminAuth,
    ApiJson(req): ApiJson<BatchUploadRequest>,
) -> CmsResult<(StatusCode, Json<BatchReport>)> {
    let report = ctx
        .asset_manager
        .batch_create_from_upload(C::KIND, req.items)
        .await?;
    Ok((StatusCode::CREATED, Json(report)))
}

async fn update<C: AssetCollection>(
    State(ctx): State<AppContext>,
    _auth: AdminAuth,
    Path(id): Path<String>,
    ApiJson(req): ApiJson<AssetUpdate>,
) -> CmsResult<Json<Asset>> {
    let asset = ctx.asset_manager.update(C::KIND, &id, req).await?;
    Ok(Json(asset))
}

async fn delete<C: AssetCollection>(
    State(ctx): State<AppContext>,
    _auth: AdminAuth,
    Path(id): Path<String>,
) -> CmsResult<Json<DeleteResponse>> {
    let asset = ctx.asset_manager.delete(C::KIND, &id).await?;
    Ok(Json(DeleteResponse {
        id: asset.id,
        deleted: true,
    }))
}
