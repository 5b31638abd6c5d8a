/// Keyed text blocks shown across the site (about, mission, contact, ...)
use crate::{
    content::{normalize_key, required_text},
    db::{decode_timestamp, encode_timestamp},
    error::{CmsError, CmsResult},
};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::{sqlite::SqliteRow, Row, SqlitePool};
use tracing::info;
use uuid::Uuid;

/// Content block record
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ContentBlock {
    pub id: String,
    pub key: String,
    pub title: String,
    pub body: String,
    pub items: Vec<String>,
    pub order: i64,
    pub is_active: bool,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// Full replacement body for an upsert
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct ContentBlockInput {
    pub title: Option<String>,
    pub body: Option<String>,
    pub items: Option<Vec<String>>,
    pub order: Option<i64>,
    pub is_active: Option<bool>,
}

/// Content block manager
#[derive(Clone)]
pub struct ContentManager {
    db: SqlitePool,
}

impl ContentManager {
    pub fn new(db: SqlitePool) -> Self {
        Self { db }
    }

    pub async fn list_active(&self) -> CmsResult<Vec<ContentBlock>> {
        let rows = sqlx::query(
            r#"
            SELECT id, key, title, body, items, order_index, is_active, created_at, updated_at
            FROM content_block
            WHERE is_active = 1
            ORDER BY order_index ASC, key ASC
            "#,
        )
        .fetch_all(&self.db)
        .await?;

        rows.into_iter().map(parse_block).collect()
    }

    pub async fn list_all(&self) -> CmsResult<Vec<ContentBlock>> {
        let rows = sqlx::query(
            r#"
            SELECT id, key, title, body, items, order_index, is_active, created_at, updated_at
            FROM content_block
            ORDER BY order_index ASC, key ASC
            "#,
        )
        .fetch_all(&self.db)
        .await?;

        rows.into_iter().map(parse_block).collect()
    }

    /// Get an active block by key
    pub async fn get_active(&self, key: &str) -> CmsResult<Option<ContentBlock>> {
        let row = sqlx::query(
            r#"
            SELECT id, key, title, body, items, order_index, is_active, created_at, updated_at
            FROM content_block
            WHERE key = ? AND is_active = 1
            "#,
        )
        .bind(key)
        .fetch_optional(&self.db)
        .await?;

        row.map(parse_block).transpose()
    }

    async fn get(&self, key: &str) -> CmsResult<Option<ContentBlock>> {
        let row = sqlx::query(
            r#"
            SELECT id, key, title, body, items, order_index, is_active, created_at, updated_at
            FROM content_block
            WHERE key = ?
            "#,
        )
        .bind(key)
        .fetch_optional(&self.db)
        .await?;

        row.map(parse_block).transpose()
    }

    /// Create the block for `key`, or replace its fields if it exists.
    ///
    /// The id and creation time of an existing block are kept.
    pub async fn upsert(&self, key: &str, input: ContentBlockInput) -> CmsResult<ContentBlock> {
        let key = normalize_key(key, "key")?;
        let title = required_text(input.title, "title")?;
        let items = serde_json::to_string(&input.items.unwrap_or_default())?;
        let now = encode_timestamp(Utc::now());

        sqlx::query(
            r#"
            INSERT INTO content_block (id, key, title, body, items, order_index, is_active, created_at, updated_at)
            VALUES (?, ?, ?, ?, ?, ?, ?, ?, ?)
            ON CONFLICT(key) DO UPDATE SET
                title = excluded.title,
                body = excluded.body,
                items = excluded.items,
                order_index = excluded.order_index,
                is_active = excluded.is_active,
                updated_at = excluded.updated_at
            "#,
        )
        .bind(Uuid::new_v4().to_string())
        .bind(&key)
        .bind(&title)
        .bind(input.body.unwrap_or_default())
        .bind(&items)
        .bind(input.order.unwrap_or(0))
        .bind(input.is_active.unwrap_or(true))
        .bind(&now)
        .bind(&now)
        .execute(&self.db)
        .await?;

        info!("Upserted content block {}", key);

        self.get(&key)
            .await?
            .ok_or_else(|| CmsError::Internal(format!("Content block {} vanished", key)))
    }

    /// Delete a block by key
    pub async fn delete(&self, key: &str) -> CmsResult<()> {
        let result = sqlx::query("DELETE FROM content_block WHERE key = ?")
            .bind(key)
            .execute(&self.db)
            .await?;

        if result.rows_affected() == 0 {
            return Err(CmsError::NotFound(format!("Content block {} not found", key)));
        }

        info!("Deleted content block {}", key);
        Ok(())
    }

    pub async fn count(&self) -> CmsResult<i64> {
        let count: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM content_block")
            .fetch_one(&self.db)
            .await?;

        Ok(count)
    }
}

fn parse_block(row: SqliteRow) -> CmsResult<ContentBlock> {
    let items: String = row.try_get("items")?;
    let created_at: String = row.try_get("created_at")?;
    let updated_at: String = row.try_get("updated_at")?;

    Ok(ContentBlock {
        id: row.try_get("id")?,
        key: row.try_get("key")?,
        title: row.try_get("title")?,
        body: row.try_get("body")?,
        items: serde_json::from_str(&items)?,
        order: row.try_get("order_index")?,
        is_active: row.try_get("is_active")?,
        created_at: decode_timestamp(&created_at)?,
        updated_at: decode_timestamp(&updated_at)?,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::db::test_pool;

    fn input(title: &str) -> ContentBlockInput {
        ContentBlockInput {
            title: Some(title.to_string()),
            body: Some("Body".to_string()),
            items: Some(vec!["one".to_string(), "two".to_string()]),
            ..Default::default()
        }
    }

    #[tokio::test]
    async fn test_upsert_creates_then_replaces() {
        let manager = ContentManager::new(test_pool().await);

        let created = manager.upsert("about", input("About us")).await.unwrap();
        assert_eq!(created.items, vec!["one", "two"]);

        let replaced = manager
            .upsert(
                "about",
                ContentBlockInput {
                    title: Some("About the school".to_string()),
                    ..Default::default()
                },
            )
            .await
            .unwrap();

        assert_eq!(replaced.id, created.id);
        assert_eq!(replaced.created_at, created.created_at);
        assert_eq!(replaced.title, "About the school");
        assert!(replaced.items.is_empty());
        assert_eq!(manager.count().await.unwrap(), 1);
    }

    #[tokio::test]
    async fn test_upsert_requires_title() {
        let manager = ContentManager::new(test_pool().await);
        let result = manager.upsert("about", ContentBlockInput::default()).await;
        assert!(matches!(result, Err(CmsError::Validation(_))));
    }

    #[tokio::test]
    async fn test_inactive_blocks_hidden_from_public() {
        let manager = ContentManager::new(test_pool().await);

        manager.upsert("mission", input("Mission")).await.unwrap();
        let mut hidden = input("Draft");
        hidden.is_active = Some(false);
        manager.upsert("draft", hidden).await.unwrap();

        assert_eq!(manager.list_active().await.unwrap().len(), 1);
        assert_eq!(manager.list_all().await.unwrap().len(), 2);
        assert!(manager.get_active("draft").await.unwrap().is_none());
        assert!(manager.get_active("mission").await.unwrap().is_some());
    }

    #[tokio::test]
    async fn test_delete_by_key() {
        let manager = ContentManager::new(test_pool().await);
        manager.upsert("about", input("About")).await.unwrap();

        manager.delete("about").await.unwrap();
        assert!(matches!(
            manager.delete("about").await,
            Err(CmsError::NotFound(_))
        ));
    }
}
