/// Annual events calendar
use crate::{
    content::required_text,
    db::{decode_timestamp, encode_timestamp},
    error::{CmsError, CmsResult},
};
use chrono::{DateTime, Month, Utc};
use serde::{Deserialize, Serialize};
use sqlx::{sqlite::SqliteRow, Row, SqlitePool};
use std::fmt;
use std::str::FromStr;
use tracing::info;
use uuid::Uuid;

const COLUMNS: &str = "id, month, month_index, date, title, description, category, order_index, \
                       is_active, created_at, updated_at";

/// Event category
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum EventCategory {
    Academic,
    Cultural,
    Sports,
    Holiday,
    Examination,
    Celebration,
    #[default]
    Other,
}

impl EventCategory {
    pub fn as_str(&self) -> &'static str {
        match self {
            EventCategory::Academic => "academic",
            EventCategory::Cultural => "cultural",
            EventCategory::Sports => "sports",
            EventCategory::Holiday => "holiday",
            EventCategory::Examination => "examination",
            EventCategory::Celebration => "celebration",
            EventCategory::Other => "other",
        }
    }
}

impl fmt::Display for EventCategory {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for EventCategory {
    type Err = CmsError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "academic" => Ok(EventCategory::Academic),
            "cultural" => Ok(EventCategory::Cultural),
            "sports" => Ok(EventCategory::Sports),
            "holiday" => Ok(EventCategory::Holiday),
            "examination" => Ok(EventCategory::Examination),
            "celebration" => Ok(EventCategory::Celebration),
            "other" => Ok(EventCategory::Other),
            other => Err(CmsError::Validation(format!("Unknown event category: {}", other))),
        }
    }
}

/// Annual event record
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AnnualEvent {
    pub id: String,
    /// Canonical English month name, e.g. `March`
    pub month: String,
    /// Free-text date label, e.g. `2nd week` or `15-17`
    pub date: String,
    pub title: String,
    pub description: Option<String>,
    pub category: EventCategory,
    pub order: i64,
    pub is_active: bool,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct NewEvent {
    pub month: Option<String>,
    pub date: Option<String>,
    pub title: Option<String>,
    pub description: Option<String>,
    pub category: Option<String>,
    pub order: Option<i64>,
    pub is_active: Option<bool>,
}

/// Partial event update
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct EventUpdate {
    pub month: Option<String>,
    pub date: Option<String>,
    pub title: Option<String>,
    pub description: Option<String>,
    pub category: Option<String>,
    pub order: Option<i64>,
    pub is_active: Option<bool>,
}

/// Public listing filter
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct EventFilter {
    pub month: Option<String>,
    pub category: Option<String>,
}

/// Parse a month name or abbreviation in any case
fn parse_month(value: &str) -> CmsResult<Month> {
    Month::from_str(value.trim())
        .map_err(|_| CmsError::Validation(format!("Invalid month: {}", value)))
}

/// Event manager
#[derive(Clone)]
pub struct EventManager {
    db: SqlitePool,
}

impl EventManager {
    pub fn new(db: SqlitePool) -> Self {
        Self { db }
    }

    /// Active events in calendar order
    pub async fn list_active(&self, filter: &EventFilter) -> CmsResult<Vec<AnnualEvent>> {
        let month_index = filter
            .month
            .as_deref()
            .map(parse_month)
            .transpose()?
            .map(|m| m.number_from_month());
        let category = filter
            .category
            .as_deref()
            .map(EventCategory::from_str)
            .transpose()?;

        let sql = format!(
            r#"
            SELECT {COLUMNS}
            FROM annual_event
            WHERE is_active = 1
              AND (?1 IS NULL OR month_index = ?1)
              AND (?2 IS NULL OR category = ?2)
            ORDER BY month_index ASC, order_index ASC, created_at DESC
            "#
        );

        let rows = sqlx::query(&sql)
            .bind(month_index)
            .bind(category.map(|c| c.as_str()))
            .fetch_all(&self.db)
            .await?;

        rows.into_iter().map(parse_event).collect()
    }

    pub async fn list_all(&self) -> CmsResult<Vec<AnnualEvent>> {
        let sql = format!(
            "SELECT {COLUMNS} FROM annual_event ORDER BY month_index ASC, order_index ASC, created_at DESC"
        );
        let rows = sqlx::query(&sql).fetch_all(&self.db).await?;

        rows.into_iter().map(parse_event).collect()
    }

    pub async fn get(&self, id: &str) -> CmsResult<Option<AnnualEvent>> {
        let sql = format!("SELECT {COLUMNS} FROM annual_event WHERE id = ?");
        let row = sqlx::query(&sql).bind(id).fetch_optional(&self.db).await?;

        row.map(parse_event).transpose()
    }

    pub async fn create(&self, input: NewEvent) -> CmsResult<AnnualEvent> {
        let month = parse_month(&required_text(input.month, "month")?)?;
        let category = match input.category {
            Some(c) => c.parse()?,
            None => EventCategory::default(),
        };
        let now = Utc::now();

        let event = AnnualEvent {
            id: Uuid::new_v4().to_string(),
            month: month.name().to_string(),
            date: required_text(input.date, "date")?,
            title: required_text(input.title, "title")?,
            description: input.description,
            category,
            order: input.order.unwrap_or(0),
            is_active: input.is_active.unwrap_or(true),
            created_at: now,
            updated_at: now,
        };

        sqlx::query(
            r#"
            INSERT INTO annual_event (id, month, month_index, date, title, description, category, order_index, is_active, created_at, updated_at)
            VALUES (?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?)
            "#,
        )
        .bind(&event.id)
        .bind(&event.month)
        .bind(month.number_from_month())
        .bind(&event.date)
        .bind(&event.title)
        .bind(&event.description)
        .bind(event.category.as_str())
        .bind(event.order)
        .bind(event.is_active)
        .bind(encode_timestamp(event.created_at))
        .bind(encode_timestamp(event.updated_at))
        .execute(&self.db)
        .await?;

        info!("Created event {} ({})", event.id, event.month);
        Ok(event)
    }

    pub async fn update(&self, id: &str, update: EventUpdate) -> CmsResult<AnnualEvent> {
        let mut event = self
            .get(id)
            .await?
            .ok_or_else(|| CmsError::NotFound(format!("Event {} not found", id)))?;

        if let Some(month) = update.month {
            event.month = parse_month(&month)?.name().to_string();
        }
        if let Some(date) = update.date {
            event.date = required_text(Some(date), "date")?;
        }
        if let Some(title) = update.title {
            event.title = required_text(Some(title), "title")?;
        }
        if let Some(description) = update.description {
            event.description = Some(description);
        }
        if let Some(category) = update.category {
            event.category = category.parse()?;
        }
        if let Some(order) = update.order {
            event.order = order;
        }
        if let Some(is_active) = update.is_active {
            event.is_active = is_active;
        }
        event.updated_at = Utc::now();

        self.write(&event).await?;
        Ok(event)
    }

    /// Persist every mutable column of an existing event
    async fn write(&self, event: &AnnualEvent) -> CmsResult<()> {
        let month_index = parse_month(&event.month)?.number_from_month();

        let result = sqlx::query(
            r#"
            UPDATE annual_event
            SET month = ?, month_index = ?, date = ?, title = ?, description = ?,
                category = ?, order_index = ?, is_active = ?, updated_at = ?
            WHERE id = ?
            "#,
        )
        .bind(&event.month)
        .bind(month_index)
        .bind(&event.date)
        .bind(&event.title)
        .bind(&event.description)
        .bind(event.category.as_str())
        .bind(event.order)
        .bind(event.is_active)
        .bind(encode_timestamp(event.updated_at))
        .bind(&event.id)
        .execute(&self.db)
        .await?;

        if result.rows_affected() == 0 {
            return Err(CmsError::NotFound(format!("Event {} not found", event.id)));
        }

        Ok(())
    }

    pub async fn delete(&self, id: &str) -> CmsResult<()> {
        let result = sqlx::query("DELETE FROM annual_event WHERE id = ?")
            .bind(id)
            .execute(&self.db)
            .await?;

        if result.rows_affected() == 0 {
            return Err(CmsError::NotFound(format!("Event {} not found", id)));
        }

        info!("Deleted event {}", id);
        Ok(())
    }

    pub async fn count(&self) -> CmsResult<i64> {
        let count: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM annual_event")
            .fetch_one(&self.db)
            .await?;

        Ok(count)
    }
}

fn parse_event(row: SqliteRow) -> CmsResult<AnnualEvent> {
    let category: String = row.try_get("category")?;
    let created_at: String = row.try_get("created_at")?;
    let updated_at: String = row.try_get("updated_at")?;

    Ok(AnnualEvent {
        id: row.try_get("id")?,
        month: row.try_get("month")?,
        date: row.try_get("date")?,
        title: row.try_get("title")?,
        description: row.try_get("description")?,
        category: category.parse()?,
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

    fn event(month: &str, title: &str, order: i64) -> NewEvent {
        NewEvent {
            month: Some(month.to_string()),
            date: Some("1st week".to_string()),
            title: Some(title.to_string()),
            order: Some(order),
            ..Default::default()
        }
    }

    #[test]
    fn test_parse_month_variants() {
        assert_eq!(parse_month("march").unwrap(), Month::March);
        assert_eq!(parse_month("Sep").unwrap(), Month::September);
        assert!(parse_month("Smarch").is_err());
    }

    #[tokio::test]
    async fn test_events_sorted_by_calendar_month() {
        let manager = EventManager::new(test_pool().await);

        manager.create(event("december", "Winter Fair", 0)).await.unwrap();
        manager.create(event("April", "Sports Day", 1)).await.unwrap();
        manager.create(event("apr", "New Session", 0)).await.unwrap();
        manager.create(event("February", "Science Expo", 0)).await.unwrap();

        let titles: Vec<String> = manager
            .list_active(&EventFilter::default())
            .await
            .unwrap()
            .into_iter()
            .map(|e| e.title)
            .collect();
        assert_eq!(
            titles,
            vec!["Science Expo", "New Session", "Sports Day", "Winter Fair"]
        );
    }

    #[tokio::test]
    async fn test_month_stored_canonically() {
        let manager = EventManager::new(test_pool().await);
        let created = manager.create(event("aug", "Independence Day", 0)).await.unwrap();
        assert_eq!(created.month, "August");
        assert_eq!(created.category, EventCategory::Other);
    }

    #[tokio::test]
    async fn test_filters() {
        let manager = EventManager::new(test_pool().await);

        let mut exam = event("March", "Finals", 0);
        exam.category = Some("examination".to_string());
        manager.create(exam).await.unwrap();
        manager.create(event("March", "Holi", 0)).await.unwrap();
        manager.create(event("May", "Summer Break", 0)).await.unwrap();

        let march = manager
            .list_active(&EventFilter {
                month: Some("mar".to_string()),
                category: None,
            })
            .await
            .unwrap();
        assert_eq!(march.len(), 2);

        let exams = manager
            .list_active(&EventFilter {
                month: Some("March".to_string()),
                category: Some("examination".to_string()),
            })
            .await
            .unwrap();
        assert_eq!(exams.len(), 1);
        assert_eq!(exams[0].title, "Finals");

        let invalid = manager
            .list_active(&EventFilter {
                month: None,
                category: Some("parade".to_string()),
            })
            .await;
        assert!(matches!(invalid, Err(CmsError::Validation(_))));
    }

    #[tokio::test]
    async fn test_create_rejects_bad_input() {
        let manager = EventManager::new(test_pool().await);

        assert!(manager.create(event("Thermidor", "X", 0)).await.is_err());

        let mut bad_category = event("June", "X", 0);
        bad_category.category = Some("parade".to_string());
        assert!(matches!(
            manager.create(bad_category).await,
            Err(CmsError::Validation(_))
        ));

        let mut no_title = event("June", "X", 0);
        no_title.title = None;
        assert!(manager.create(no_title).await.is_err());
    }

    #[tokio::test]
    async fn test_partial_update() {
        let manager = EventManager::new(test_pool().await);
        let created = manager.create(event("January", "Orientation", 0)).await.unwrap();

        let updated = manager
            .update(
                &created.id,
                EventUpdate {
                    month: Some("feb".to_string()),
                    category: Some("academic".to_string()),
                    ..Default::default()
                },
            )
            .await
            .unwrap();

        assert_eq!(updated.month, "February");
        assert_eq!(updated.title, "Orientation");
        assert_eq!(updated.category, EventCategory::Academic);

        let stored = manager.get(&created.id).await.unwrap().unwrap();
        assert_eq!(stored.month, "February");
    }

    #[tokio::test]
    async fn test_write_after_concurrent_delete_is_not_found() {
        let manager = EventManager::new(test_pool().await);
        let created = manager.create(event("October", "Diwali Mela", 0)).await.unwrap();

        let stale = manager.get(&created.id).await.unwrap().unwrap();
        manager.delete(&created.id).await.unwrap();

        assert!(matches!(
            manager.write(&stale).await,
            Err(CmsError::NotFound(_))
        ));
        assert!(manager.get(&created.id).await.unwrap().is_none());
    }

    #[tokio::test]
    async fn test_delete() {
        let manager = EventManager::new(test_pool().await);
        let created = manager.create(event("July", "Picnic", 0)).await.unwrap();

        manager.delete(&created.id).await.unwrap();
        assert!(manager.get(&created.id).await.unwrap().is_none());
        assert!(matches!(
            manager.delete(&created.id).await,
            Err(CmsError::NotFound(_))
        ));
    }
}
