/// Visitor feedback workflow
///
/// Feedback is submitted by the public, announced to the school inbox by
/// email, and moves from unread to read exactly once, either through the
/// admin API or through the single-purpose link embedded in that email.
/// Read feedback is purged once it is older than three months.
use crate::{
    db::{decode_timestamp, encode_timestamp},
    error::{CmsError, CmsResult},
    mailer::Mailer,
};
use chrono::{DateTime, Months, Utc};
use rand::RngCore;
use serde::{Deserialize, Serialize};
use sqlx::{sqlite::SqliteRow, Row, SqlitePool};
use std::sync::Arc;
use tracing::{info, warn};
use uuid::Uuid;
use validator::Validate;

/// How long read feedback is retained
pub const READ_RETENTION_MONTHS: u32 = 3;

/// Feedback record
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Feedback {
    pub id: String,
    pub name: String,
    pub email: String,
    pub phone: Option<String>,
    pub subject: String,
    pub message: String,
    pub is_read: bool,
    pub read_at: Option<DateTime<Utc>>,
    #[serde(skip_serializing, default)]
    pub read_token: Option<String>,
    pub created_at: DateTime<Utc>,
}

/// Public submission body
#[derive(Debug, Clone, Default, Deserialize, Validate)]
#[serde(default)]
pub struct SubmitFeedback {
    #[validate(length(min = 1, max = 100))]
    pub name: String,
    #[validate(email, length(max = 254))]
    pub email: String,
    #[validate(length(max = 30))]
    pub phone: Option<String>,
    #[validate(length(min = 1, max = 200))]
    pub subject: String,
    #[validate(length(min = 1, max = 5000))]
    pub message: String,
}

impl SubmitFeedback {
    fn trimmed(self) -> Self {
        Self {
            name: self.name.trim().to_string(),
            email: self.email.trim().to_string(),
            phone: self
                .phone
                .map(|p| p.trim().to_string())
                .filter(|p| !p.is_empty()),
            subject: self.subject.trim().to_string(),
            message: self.message.trim().to_string(),
        }
    }
}

/// Result of a read transition
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub enum MarkReadOutcome {
    /// This call moved the feedback to read
    Marked,
    /// The feedback was already read; nothing changed
    AlreadyRead,
}

/// Feedback manager
#[derive(Clone)]
pub struct FeedbackManager {
    db: SqlitePool,
    mailer: Arc<Mailer>,
    public_url: String,
}

impl FeedbackManager {
    pub fn new(db: SqlitePool, mailer: Arc<Mailer>, public_url: String) -> Self {
        Self {
            db,
            mailer,
            public_url: public_url.trim_end_matches('/').to_string(),
        }
    }

    /// Store a submission and announce it by email.
    ///
    /// The notification is sent in the background; its outcome never
    /// affects the submission.
    pub async fn submit(&self, request: SubmitFeedback) -> CmsResult<Feedback> {
        let request = request.trimmed();
        request.validate()?;

        let feedback = Feedback {
            id: Uuid::new_v4().to_string(),
            name: request.name,
            email: request.email,
            phone: request.phone,
            subject: request.subject,
            message: request.message,
            is_read: false,
            read_at: None,
            read_token: Some(generate_read_token()),
            created_at: Utc::now(),
        };

        sqlx::query(
            r#"
            INSERT INTO feedback (id, name, email, phone, subject, message, is_read, read_at, read_token, created_at)
            VALUES (?, ?, ?, ?, ?, ?, 0, NULL, ?, ?)
            "#,
        )
        .bind(&feedback.id)
        .bind(&feedback.name)
        .bind(&feedback.email)
        .bind(&feedback.phone)
        .bind(&feedback.subject)
        .bind(&feedback.message)
        .bind(&feedback.read_token)
        .bind(encode_timestamp(feedback.created_at))
        .execute(&self.db)
        .await?;

        info!("Received feedback {} from {}", feedback.id, feedback.email);

        if let Some(token) = &feedback.read_token {
            let link = self.mark_read_link(&feedback.id, token);
            let mailer = self.mailer.clone();
            let notice = feedback.clone();
            tokio::spawn(async move {
                if let Err(e) = mailer.send_feedback_notification(&notice, &link).await {
                    warn!("Failed to send notification for feedback {}: {}", notice.id, e);
                }
            });
        }

        Ok(feedback)
    }

    /// Link that marks a feedback item as read
    pub fn mark_read_link(&self, id: &str, token: &str) -> String {
        format!("{}/api/feedback/{}/mark-read/{}", self.public_url, id, token)
    }

    /// Admin read transition
    pub async fn mark_read(&self, id: &str) -> CmsResult<MarkReadOutcome> {
        let result = sqlx::query(
            "UPDATE feedback SET is_read = 1, read_at = ? WHERE id = ? AND is_read = 0",
        )
        .bind(encode_timestamp(Utc::now()))
        .bind(id)
        .execute(&self.db)
        .await?;

        if result.rows_affected() == 1 {
            info!("Feedback {} marked as read", id);
            return Ok(MarkReadOutcome::Marked);
        }

        let exists: Option<i64> = sqlx::query_scalar("SELECT 1 FROM feedback WHERE id = ?")
            .bind(id)
            .fetch_optional(&self.db)
            .await?;

        match exists {
            Some(_) => Ok(MarkReadOutcome::AlreadyRead),
            None => Err(not_found(id)),
        }
    }

    /// Read transition through an emailed link.
    ///
    /// An `{id, token}` pair that does not match a stored feedback item is
    /// reported as not found and changes nothing.
    pub async fn mark_read_with_token(&self, id: &str, token: &str) -> CmsResult<MarkReadOutcome> {
        if token.is_empty() {
            return Err(not_found(id));
        }

        let result = sqlx::query(
            r#"
            UPDATE feedback SET is_read = 1, read_at = ?
            WHERE id = ? AND read_token = ? AND is_read = 0
            "#,
        )
        .bind(encode_timestamp(Utc::now()))
        .bind(id)
        .bind(token)
        .execute(&self.db)
        .await?;

        if result.rows_affected() == 1 {
            info!("Feedback {} marked as read via link", id);
            return Ok(MarkReadOutcome::Marked);
        }

        let exists: Option<i64> =
            sqlx::query_scalar("SELECT 1 FROM feedback WHERE id = ? AND read_token = ?")
                .bind(id)
                .bind(token)
                .fetch_optional(&self.db)
                .await?;

        match exists {
            Some(_) => Ok(MarkReadOutcome::AlreadyRead),
            None => {
                warn!("Rejected mark-read link for feedback {}", id);
                Err(not_found(id))
            }
        }
    }

    /// Newest first, optionally unread only
    pub async fn list(&self, unread_only: bool) -> CmsResult<Vec<Feedback>> {
        let rows = sqlx::query(
            r#"
            SELECT id, name, email, phone, subject, message, is_read, read_at, read_token, created_at
            FROM feedback
            WHERE (?1 = 0 OR is_read = 0)
            ORDER BY created_at DESC
            "#,
        )
        .bind(unread_only)
        .fetch_all(&self.db)
        .await?;

        rows.into_iter().map(parse_feedback).collect()
    }

    pub async fn get(&self, id: &str) -> CmsResult<Option<Feedback>> {
        let row = sqlx::query(
            r#"
            SELECT id, name, email, phone, subject, message, is_read, read_at, read_token, created_at
            FROM feedback
            WHERE id = ?
            "#,
        )
        .bind(id)
        .fetch_optional(&self.db)
        .await?;

        row.map(parse_feedback).transpose()
    }

    pub async fn delete(&self, id: &str) -> CmsResult<()> {
        let result = sqlx::query("DELETE FROM feedback WHERE id = ?")
            .bind(id)
            .execute(&self.db)
            .await?;

        if result.rows_affected() == 0 {
            return Err(not_found(id));
        }

        info!("Deleted feedback {}", id);
        Ok(())
    }

    /// Delete read feedback whose read time is older than the retention window
    pub async fn purge_stale_read(&self, now: DateTime<Utc>) -> CmsResult<u64> {
        let cutoff = now
            .checked_sub_months(Months::new(READ_RETENTION_MONTHS))
            .ok_or_else(|| CmsError::Internal("Feedback retention cutoff out of range".to_string()))?;

        let result = sqlx::query("DELETE FROM feedback WHERE is_read = 1 AND read_at < ?")
            .bind(encode_timestamp(cutoff))
            .execute(&self.db)
            .await?;

        Ok(result.rows_affected())
    }

    pub async fn count(&self) -> CmsResult<i64> {
        let count: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM feedback")
            .fetch_one(&self.db)
            .await?;

        Ok(count)
    }

    pub async fn count_unread(&self) -> CmsResult<i64> {
        let count: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM feedback WHERE is_read = 0")
            .fetch_one(&self.db)
            .await?;

        Ok(count)
    }
}

/// 32 random bytes, hex encoded
fn generate_read_token() -> String {
    let mut bytes = [0u8; 32];
    rand::thread_rng().fill_bytes(&mut bytes);
    hex::encode(bytes)
}

fn not_found(id: &str) -> CmsError {
    CmsError::NotFound(format!("Feedback {} not found", id))
}

fn parse_feedback(row: SqliteRow) -> CmsResult<Feedback> {
    let read_at: Option<String> = row.try_get("read_at")?;
    let created_at: String = row.try_get("created_at")?;

    Ok(Feedback {
        id: row.try_get("id")?,
        name: row.try_get("name")?,
        email: row.try_get("email")?,
        phone: row.try_get("phone")?,
        subject: row.try_get("subject")?,
        message: row.try_get("message")?,
        is_read: row.try_get("is_read")?,
        read_at: read_at.as_deref().map(decode_timestamp).transpose()?,
        read_token: row.try_get("read_token")?,
        created_at: decode_timestamp(&created_at)?,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::db::test_pool;
    use chrono::Duration;

    async fn manager() -> FeedbackManager {
        let mailer = Arc::new(Mailer::new(None).unwrap());
        FeedbackManager::new(test_pool().await, mailer, "https://school.example/".to_string())
    }

    fn submission() -> SubmitFeedback {
        SubmitFeedback {
            name: "Asha".to_string(),
            email: "asha@example.com".to_string(),
            phone: None,
            subject: "Admissions".to_string(),
            message: "When do admissions open?".to_string(),
        }
    }

    async fn set_read_at(manager: &FeedbackManager, id: &str, at: DateTime<Utc>) {
        sqlx::query("UPDATE feedback SET is_read = 1, read_at = ? WHERE id = ?")
            .bind(encode_timestamp(at))
            .bind(id)
            .execute(&manager.db)
            .await
            .unwrap();
    }

    #[tokio::test]
    async fn test_submit_generates_token_and_link() {
        let manager = manager().await;
        let feedback = manager.submit(submission()).await.unwrap();

        let token = feedback.read_token.clone().unwrap();
        assert_eq!(token.len(), 64);
        assert!(token.chars().all(|c| c.is_ascii_hexdigit()));
        assert!(!feedback.is_read);

        let link = manager.mark_read_link(&feedback.id, &token);
        assert_eq!(
            link,
            format!(
                "https://school.example/api/feedback/{}/mark-read/{}",
                feedback.id, token
            )
        );
    }

    #[tokio::test]
    async fn test_token_never_serialized() {
        let manager = manager().await;
        let feedback = manager.submit(submission()).await.unwrap();

        let json = serde_json::to_value(&feedback).unwrap();
        assert!(json.get("readToken").is_none());
        assert_eq!(json["isRead"], false);
    }

    #[tokio::test]
    async fn test_submit_validation() {
        let manager = manager().await;

        let mut bad_email = submission();
        bad_email.email = "not-an-email".to_string();
        let err = manager.submit(bad_email).await.unwrap_err();
        assert!(matches!(err, CmsError::Validation(ref m) if m.contains("email")));

        let mut blank_name = submission();
        blank_name.name = "   ".to_string();
        assert!(matches!(
            manager.submit(blank_name).await,
            Err(CmsError::Validation(_))
        ));

        assert_eq!(manager.count().await.unwrap(), 0);
    }

    #[tokio::test]
    async fn test_mark_read_link_is_idempotent() {
        let manager = manager().await;
        let feedback = manager.submit(submission()).await.unwrap();
        let token = feedback.read_token.unwrap();

        let first = manager.mark_read_with_token(&feedback.id, &token).await.unwrap();
        assert_eq!(first, MarkReadOutcome::Marked);
        let read_at = manager.get(&feedback.id).await.unwrap().unwrap().read_at;
        assert!(read_at.is_some());

        let second = manager.mark_read_with_token(&feedback.id, &token).await.unwrap();
        assert_eq!(second, MarkReadOutcome::AlreadyRead);

        // readAt is written once
        let stored = manager.get(&feedback.id).await.unwrap().unwrap();
        assert_eq!(stored.read_at, read_at);
    }

    #[tokio::test]
    async fn test_unknown_pair_changes_nothing() {
        let manager = manager().await;
        let feedback = manager.submit(submission()).await.unwrap();

        let wrong_token = manager
            .mark_read_with_token(&feedback.id, &"0".repeat(64))
            .await;
        assert!(matches!(wrong_token, Err(CmsError::NotFound(_))));

        let token = feedback.read_token.clone().unwrap();
        let wrong_id = manager.mark_read_with_token("missing", &token).await;
        assert!(matches!(wrong_id, Err(CmsError::NotFound(_))));

        let stored = manager.get(&feedback.id).await.unwrap().unwrap();
        assert!(!stored.is_read);
        assert!(stored.read_at.is_none());
    }

    #[tokio::test]
    async fn test_admin_mark_read() {
        let manager = manager().await;
        let feedback = manager.submit(submission()).await.unwrap();

        assert_eq!(
            manager.mark_read(&feedback.id).await.unwrap(),
            MarkReadOutcome::Marked
        );
        assert_eq!(
            manager.mark_read(&feedback.id).await.unwrap(),
            MarkReadOutcome::AlreadyRead
        );
        assert!(matches!(
            manager.mark_read("missing").await,
            Err(CmsError::NotFound(_))
        ));
    }

    #[tokio::test]
    async fn test_list_unread_filter() {
        let manager = manager().await;
        let first = manager.submit(submission()).await.unwrap();
        manager.submit(submission()).await.unwrap();
        manager.mark_read(&first.id).await.unwrap();

        assert_eq!(manager.list(false).await.unwrap().len(), 2);
        let unread = manager.list(true).await.unwrap();
        assert_eq!(unread.len(), 1);
        assert_ne!(unread[0].id, first.id);
        assert_eq!(manager.count_unread().await.unwrap(), 1);
    }

    #[tokio::test]
    async fn test_purge_removes_only_stale_read_feedback() {
        let manager = manager().await;
        let now = Utc::now();

        let old = manager.submit(submission()).await.unwrap();
        let recent = manager.submit(submission()).await.unwrap();
        let unread = manager.submit(submission()).await.unwrap();

        set_read_at(&manager, &old.id, now - Duration::days(120)).await;
        set_read_at(&manager, &recent.id, now - Duration::days(60)).await;

        let purged = manager.purge_stale_read(now).await.unwrap();
        assert_eq!(purged, 1);

        assert!(manager.get(&old.id).await.unwrap().is_none());
        assert!(manager.get(&recent.id).await.unwrap().is_some());
        assert!(manager.get(&unread.id).await.unwrap().is_some());
    }

    #[tokio::test]
    async fn test_delete() {
        let manager = manager().await;
        let feedback = manager.submit(submission()).await.unwrap();

        manager.delete(&feedback.id).await.unwrap();
        assert!(matches!(
            manager.delete(&feedback.id).await,
            Err(CmsError::NotFound(_))
        ));
    }
}
