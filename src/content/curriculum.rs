/// Curriculum pages, one per school level
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

const COLUMNS: &str =
    "id, level, title, description, subjects, streams, order_index, is_active, created_at, updated_at";

/// Subject stream offered at a level (e.g. science, commerce)
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Stream {
    pub name: String,
    #[serde(default)]
    pub subjects: Vec<String>,
}

/// Curriculum level record
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CurriculumLevel {
    pub id: String,
    pub level: String,
    pub title: String,
    pub description: Option<String>,
    pub subjects: Vec<String>,
    pub streams: Vec<Stream>,
    pub order: i64,
    pub is_active: bool,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct CurriculumLevelInput {
    pub title: Option<String>,
    pub description: Option<String>,
    pub subjects: Option<Vec<String>>,
    pub streams: Option<Vec<Stream>>,
    pub order: Option<i64>,
    pub is_active: Option<bool>,
}

/// Curriculum manager
#[derive(Clone)]
pub struct CurriculumManager {
    db: SqlitePool,
}

impl CurriculumManager {
    pub fn new(db: SqlitePool) -> Self {
        Self { db }
    }

    pub async fn list_active(&self) -> CmsResult<Vec<CurriculumLevel>> {
        let sql = format!(
            "SELECT {COLUMNS} FROM curriculum_level WHERE is_active = 1 ORDER BY order_index ASC, level ASC"
        );
        let rows = sqlx::query(&sql).fetch_all(&self.db).await?;

        rows.into_iter().map(parse_level).collect()
    }

    pub async fn list_all(&self) -> CmsResult<Vec<CurriculumLevel>> {
        let sql = format!("SELECT {COLUMNS} FROM curriculum_level ORDER BY order_index ASC, level ASC");
        let rows = sqlx::query(&sql).fetch_all(&self.db).await?;

        rows.into_iter().map(parse_level).collect()
    }

    pub async fn get_active(&self, level: &str) -> CmsResult<Option<CurriculumLevel>> {
        let sql = format!("SELECT {COLUMNS} FROM curriculum_level WHERE level = ? AND is_active = 1");
        let row = sqlx::query(&sql).bind(level).fetch_optional(&self.db).await?;

        row.map(parse_level).transpose()
    }

    /// Create or replace the page for a level
    pub async fn upsert(
        &self,
        level: &str,
        input: CurriculumLevelInput,
    ) -> CmsResult<CurriculumLevel> {
        let level = normalize_key(level, "level")?;
        let title = required_text(input.title, "title")?;

        let streams = input.streams.unwrap_or_default();
        if streams.iter().any(|s| s.name.trim().is_empty()) {
            return Err(CmsError::Validation("Stream name is required".to_string()));
        }

        let subjects = serde_json::to_string(&input.subjects.unwrap_or_default())?;
        let streams = serde_json::to_string(&streams)?;
        let now = encode_timestamp(Utc::now());

        sqlx::query(
            r#"
            INSERT INTO curriculum_level (id, level, title, description, subjects, streams, order_index, is_active, created_at, updated_at)
            VALUES (?, ?, ?, ?, ?, ?, ?, ?, ?, ?)
            ON CONFLICT(level) DO UPDATE SET
                title = excluded.title,
                description = excluded.description,
                subjects = excluded.subjects,
                streams = excluded.streams,
                order_index = excluded.order_index,
                is_active = excluded.is_active,
                updated_at = excluded.updated_at
            "#,
        )
        .bind(Uuid::new_v4().to_string())
        .bind(&level)
        .bind(&title)
        .bind(&input.description)
        .bind(&subjects)
        .bind(&streams)
        .bind(input.order.unwrap_or(0))
        .bind(input.is_active.unwrap_or(true))
        .bind(&now)
        .bind(&now)
        .execute(&self.db)
        .await?;

        info!("Upserted curriculum level {}", level);

        let sql = format!("SELECT {COLUMNS} FROM curriculum_level WHERE level = ?");
        let row = sqlx::query(&sql).bind(&level).fetch_one(&self.db).await?;
        parse_level(row)
    }

    pub async fn delete(&self, level: &str) -> CmsResult<()> {
        let result = sqlx::query("DELETE FROM curriculum_level WHERE level = ?")
            .bind(level)
            .execute(&self.db)
            .await?;

        if result.rows_affected() == 0 {
            return Err(CmsError::NotFound(format!(
                "Curriculum level {} not found",
                level
            )));
        }

        info!("Deleted curriculum level {}", level);
        Ok(())
    }

    pub async fn count(&self) -> CmsResult<i64> {
        let count: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM curriculum_level")
            .fetch_one(&self.db)
            .await?;

        Ok(count)
    }
}

fn parse_level(row: SqliteRow) -> CmsResult<CurriculumLevel> {
    let subjects: String = row.try_get("subjects")?;
    let streams: String = row.try_get("streams")?;
    let created_at: String = row.try_get("created_at")?;
    let updated_at: String = row.try_get("updated_at")?;

    Ok(CurriculumLevel {
        id: row.try_get("id")?,
        level: row.try_get("level")?,
        title: row.try_get("title")?,
        description: row.try_get("description")?,
        subjects: serde_json::from_str(&subjects)?,
        streams: serde_json::from_str(&streams)?,
        order: row.try_get("order_index")?,
        is_active: row.try_get("is_active")?,
        created_at: decode_timestamp(&created_at)?,
        updated_at: decode_timestamp(&updated_at)?,
    })
}
