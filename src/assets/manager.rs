/// Asset persistence and media lifecycle
use crate::{
    assets::{
        Asset, AssetFilter, AssetKind, AssetMetadata, AssetUpdate, BatchFailure, BatchReport,
        NewAssetReference, UploadAssetRequest,
    },
    db::{decode_timestamp, encode_timestamp},
    error::{CmsError, CmsResult},
    media::{MediaLocation, MediaStore, SizeVariants},
};
use chrono::Utc;
use sqlx::{sqlite::SqliteRow, Row, SqlitePool};
use std::sync::Arc;
use tracing::{info, warn};
use uuid::Uuid;

const COLUMNS: &str = "id, title, description, alt_text, category, year, url, thumbnail_url, \
                       storage_kind, storage_ref, variants, mime_type, order_index, is_active, \
                       created_at, updated_at";

/// Asset manager
#[derive(Clone)]
pub struct AssetManager {
    db: SqlitePool,
    media: Arc<MediaStore>,
}

impl AssetManager {
    pub fn new(db: SqlitePool, media: Arc<MediaStore>) -> Self {
        Self { db, media }
    }

    /// Active assets, optionally filtered by category and year
    pub async fn list_active(&self, kind: AssetKind, filter: &AssetFilter) -> CmsResult<Vec<Asset>> {
        let sql = format!(
            r#"
            SELECT {COLUMNS}
            FROM {table}
            WHERE is_active = 1
              AND (?1 IS NULL OR category = ?1)
              AND (?2 IS NULL OR year = ?2)
            ORDER BY order_index ASC, created_at DESC
            "#,
            table = kind.table()
        );

        let rows = sqlx::query(&sql)
            .bind(filter.category.as_deref())
            .bind(filter.year)
            .fetch_all(&self.db)
            .await?;

        rows.into_iter().map(|row| parse_asset(kind, row)).collect()
    }

    /// Every asset of a kind, active or not
    pub async fn list_all(&self, kind: AssetKind) -> CmsResult<Vec<Asset>> {
        let sql = format!(
            "SELECT {COLUMNS} FROM {table} ORDER BY order_index ASC, created_at DESC",
            table = kind.table()
        );

        let rows = sqlx::query(&sql).fetch_all(&self.db).await?;

        rows.into_iter().map(|row| parse_asset(kind, row)).collect()
    }

    /// Get asset by ID
    pub async fn get(&self, kind: AssetKind, id: &str) -> CmsResult<Option<Asset>> {
        let sql = format!("SELECT {COLUMNS} FROM {table} WHERE id = ?", table = kind.table());

        let row = sqlx::query(&sql).bind(id).fetch_optional(&self.db).await?;

        row.map(|row| parse_asset(kind, row)).transpose()
    }

    /// Create from a caller-supplied URL.
    ///
    /// The URL is trusted as-is. CDN URLs are recognised and get their size
    /// variants backfilled from the public id.
    pub async fn create_from_reference(
        &self,
        kind: AssetKind,
        request: NewAssetReference,
    ) -> CmsResult<Asset> {
        let url = required(request.url, "url")?;
        validate_url(&url)?;

        let (location, variants) = self.media.locate(&url, kind.family());

        let asset = self
            .insert(kind, request.metadata, url, location, variants, None)
            .await?;

        info!("Created {} {} from reference", kind.table(), asset.id);
        Ok(asset)
    }

    /// Create from an inline upload
    pub async fn create_from_upload(
        &self,
        kind: AssetKind,
        request: UploadAssetRequest,
    ) -> CmsResult<Asset> {
        let data = required(request.data, "data")?;

        let stored = self
            .media
            .upload_data_uri(kind.family(), kind.folder(), &data)
            .await?;

        let location = stored.location.clone();
        match self
            .insert(
                kind,
                request.metadata,
                stored.url,
                stored.location,
                stored.variants,
                stored.mime_type,
            )
            .await
        {
            Ok(asset) => {
                info!("Uploaded {} {}", kind.table(), asset.id);
                Ok(asset)
            }
            Err(e) => {
                // The row never existed, so nothing else owns the stored bytes
                if let Err(cleanup) = self.media.delete(&location, kind.family()).await {
                    warn!("Failed to remove media for unsaved {}: {}", kind.table(), cleanup);
                }
                Err(e)
            }
        }
    }

    /// Upload several items one after another.
    ///
    /// A failing item is recorded in the report and does not stop the rest.
    pub async fn batch_create_from_upload(
        &self,
        kind: AssetKind,
        items: Vec<serde_json::Value>,
    ) -> CmsResult<BatchReport> {
        if items.is_empty() {
            return Err(CmsError::Validation("No items to upload".to_string()));
        }
        if items.len() > kind.batch_limit() {
            return Err(CmsError::Validation(format!(
                "At most {} items can be uploaded at once, got {}",
                kind.batch_limit(),
                items.len()
            )));
        }

        let total = items.len();
        let mut uploaded = Vec::new();
        let mut failed = Vec::new();

        for (index, item) in items.into_iter().enumerate() {
            let result = match serde_json::from_value::<UploadAssetRequest>(item) {
                Ok(request) => self.create_from_upload(kind, request).await,
                Err(e) => Err(CmsError::Validation(format!("Malformed item: {}", e))),
            };

            match result {
                Ok(asset) => uploaded.push(asset),
                Err(e) => {
                    warn!("Batch {} upload item {} failed: {}", kind.table(), index, e);
                    failed.push(BatchFailure {
                        index,
                        message: e.to_string(),
                    });
                }
            }
        }

        info!(
            "Batch {} upload: {} succeeded, {} failed",
            kind.table(),
            uploaded.len(),
            failed.len()
        );

        Ok(BatchReport {
            total,
            uploaded,
            failed,
        })
    }

    /// Merge the supplied fields into an asset.
    ///
    /// A new URL is re-classified like a fresh reference. Once the row no
    /// longer points at media we own, that media is deleted; a failure there is
    /// logged and the update stands.
    pub async fn update(&self, kind: AssetKind, id: &str, update: AssetUpdate) -> CmsResult<Asset> {
        let mut asset = self
            .get(kind, id)
            .await?
            .ok_or_else(|| not_found(kind, id))?;
        let previous_storage = asset.storage.clone();

        if let Some(url) = update.url {
            validate_url(&url)?;
            if url != asset.url {
                let (location, variants) = self.media.locate(&url, kind.family());
                asset.url = url;
                asset.storage = location;
                asset.variants = variants;
                asset.mime_type = None;
            }
        }
        if let Some(title) = update.title {
            asset.title = title;
        }
        if let Some(description) = update.description {
            asset.description = Some(description);
        }
        if let Some(alt_text) = update.alt_text {
            asset.alt_text = Some(alt_text);
        }
        if let Some(category) = update.category {
            asset.category = Some(category);
        }
        if let Some(year) = update.year {
            asset.year = Some(year);
        }
        if let Some(thumbnail_url) = update.thumbnail_url {
            asset.thumbnail_url = Some(thumbnail_url);
        }
        if let Some(order) = update.order {
            asset.order = order;
        }
        if let Some(is_active) = update.is_active {
            asset.is_active = is_active;
        }
        asset.updated_at = Utc::now();

        let sql = format!(
            r#"
            UPDATE {table}
            SET title = ?, description = ?, alt_text = ?, category = ?, year = ?,
                url = ?, thumbnail_url = ?, storage_kind = ?, storage_ref = ?,
                variants = ?, mime_type = ?, order_index = ?, is_active = ?, updated_at = ?
            WHERE id = ?
            "#,
            table = kind.table()
        );

        let result = sqlx::query(&sql)
            .bind(&asset.title)
            .bind(&asset.description)
            .bind(&asset.alt_text)
            .bind(&asset.category)
            .bind(asset.year)
            .bind(&asset.url)
            .bind(&asset.thumbnail_url)
            .bind(asset.storage.storage_kind())
            .bind(asset.storage.storage_ref())
            .bind(encode_variants(&asset.variants)?)
            .bind(&asset.mime_type)
            .bind(asset.order)
            .bind(asset.is_active)
            .bind(encode_timestamp(asset.updated_at))
            .bind(id)
            .execute(&self.db)
            .await?;

        if result.rows_affected() == 0 {
            return Err(not_found(kind, id));
        }

        if previous_storage != asset.storage && previous_storage != MediaLocation::External {
            if let Err(e) = self.media.delete(&previous_storage, kind.family()).await {
                warn!(
                    "Failed to delete replaced media for {} {} ({:?}): {}",
                    kind.table(),
                    id,
                    previous_storage,
                    e
                );
            }
        }

        Ok(asset)
    }

    /// Delete an asset and the media it owns.
    ///
    /// The backend delete is attempted once, before the row goes away; its
    /// failure is logged and the row is deleted anyway.
    pub async fn delete(&self, kind: AssetKind, id: &str) -> CmsResult<Asset> {
        let asset = self
            .get(kind, id)
            .await?
            .ok_or_else(|| not_found(kind, id))?;

        if asset.storage != MediaLocation::External {
            if let Err(e) = self.media.delete(&asset.storage, kind.family()).await {
                warn!(
                    "Failed to delete media for {} {} ({:?}): {}",
                    kind.table(),
                    id,
                    asset.storage,
                    e
                );
            }
        }

        let sql = format!("DELETE FROM {table} WHERE id = ?", table = kind.table());
        let result = sqlx::query(&sql).bind(id).execute(&self.db).await?;

        if result.rows_affected() == 0 {
            return Err(not_found(kind, id));
        }

        info!("Deleted {} {}", kind.table(), id);
        Ok(asset)
    }

    /// Number of assets of a kind
    pub async fn count(&self, kind: AssetKind) -> CmsResult<i64> {
        let sql = format!("SELECT COUNT(*) FROM {table}", table = kind.table());
        let count: i64 = sqlx::query_scalar(&sql).fetch_one(&self.db).await?;

        Ok(count)
    }

    async fn insert(
        &self,
        kind: AssetKind,
        metadata: AssetMetadata,
        url: String,
        storage: MediaLocation,
        variants: Option<SizeVariants>,
        mime_type: Option<String>,
    ) -> CmsResult<Asset> {
        let now = Utc::now();
        let asset = Asset {
            id: Uuid::new_v4().to_string(),
            kind,
            title: metadata.title.unwrap_or_default(),
            description: metadata.description,
            alt_text: metadata.alt_text,
            category: metadata.category,
            year: metadata.year,
            url,
            thumbnail_url: metadata.thumbnail_url,
            storage,
            variants,
            mime_type,
            order: metadata.order.unwrap_or(0),
            is_active: metadata.is_active.unwrap_or(true),
            created_at: now,
            updated_at: now,
        };

        let sql = format!(
            r#"
            INSERT INTO {table} ({COLUMNS})
            VALUES (?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?)
            "#,
            table = kind.table()
        );

        sqlx::query(&sql)
            .bind(&asset.id)
            .bind(&asset.title)
            .bind(&asset.description)
            .bind(&asset.alt_text)
            .bind(&asset.category)
            .bind(asset.year)
            .bind(&asset.url)
            .bind(&asset.thumbnail_url)
            .bind(asset.storage.storage_kind())
            .bind(asset.storage.storage_ref())
            .bind(encode_variants(&asset.variants)?)
            .bind(&asset.mime_type)
            .bind(asset.order)
            .bind(asset.is_active)
            .bind(encode_timestamp(asset.created_at))
            .bind(encode_timestamp(asset.updated_at))
            .execute(&self.db)
            .await?;

        Ok(asset)
    }
}

fn not_found(kind: AssetKind, id: &str) -> CmsError {
    CmsError::NotFound(format!("{} {} not found", kind.label(), id))
}

fn required(value: Option<String>, field: &str) -> CmsResult<String> {
    match value {
        Some(v) if !v.trim().is_empty() => Ok(v),
        _ => Err(CmsError::Validation(format!("{} is required", field))),
    }
}

fn validate_url(url: &str) -> CmsResult<()> {
    let url = url.trim();
    if url.starts_with("https://") || url.starts_with("http://") || url.starts_with('/') {
        Ok(())
    } else {
        Err(CmsError::Validation(format!("Unsupported URL: {}", url)))
    }
}

fn encode_variants(variants: &Option<SizeVariants>) -> CmsResult<Option<String>> {
    variants
        .as_ref()
        .map(serde_json::to_string)
        .transpose()
        .map_err(CmsError::from)
}

fn parse_asset(kind: AssetKind, row: SqliteRow) -> CmsResult<Asset> {
    let storage_kind: String = row.try_get("storage_kind")?;
    let storage_ref: Option<String> = row.try_get("storage_ref")?;
    let variants: Option<String> = row.try_get("variants")?;
    let created_at: String = row.try_get("created_at")?;
    let updated_at: String = row.try_get("updated_at")?;

    Ok(Asset {
        id: row.try_get("id")?,
        kind,
        title: row.try_get("title")?,
        description: row.try_get("description")?,
        alt_text: row.try_get("alt_text")?,
        category: row.try_get("category")?,
        year: row.try_get("year")?,
        url: row.try_get("url")?,
        thumbnail_url: row.try_get("thumbnail_url")?,
        storage: MediaLocation::from_columns(&storage_kind, storage_ref)?,
        variants: variants.as_deref().map(serde_json::from_str).transpose()?,
        mime_type: row.try_get("mime_type")?,
        order: row.try_get("order_index")?,
        is_active: row.try_get("is_active")?,
        created_at: decode_timestamp(&created_at)?,
        updated_at: decode_timestamp(&updated_at)?,
    })
}
