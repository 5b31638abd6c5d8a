/// Background task implementations
use crate::{context::AppContext, error::CmsResult};
use chrono::Utc;

/// Delete read feedback older than the retention window
pub async fn purge_read_feedback(ctx: &AppContext) -> CmsResult<u64> {
    ctx.feedback_manager.purge_stale_read(Utc::now()).await
}

/// Health check - verify the database is reachable
pub async fn health_check(ctx: &AppContext) -> CmsResult<()> {
    crate::db::test_connection(&ctx.db).await
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{
        config::test_config,
        db::{encode_timestamp, test_pool},
        feedback::SubmitFeedback,
        media::{disk::LocalDiskBackend, MediaStore, UploadLimits},
    };
    use chrono::Duration;
    use std::sync::Arc;

    async fn context() -> AppContext {
        let media = MediaStore::with_backends(
            Arc::new(LocalDiskBackend::new(std::env::temp_dir())),
            None,
            UploadLimits::default(),
        );
        AppContext::with_parts(test_config(), test_pool().await, Arc::new(media)).unwrap()
    }

    #[tokio::test]
    async fn test_purge_read_feedback() {
        let ctx = context().await;

        let feedback = ctx
            .feedback_manager
            .submit(SubmitFeedback {
                name: "Ravi".to_string(),
                email: "ravi@example.com".to_string(),
                phone: Some("555-0100".to_string()),
                subject: "Transport".to_string(),
                message: "Is there a bus on the east route?".to_string(),
            })
            .await
            .unwrap();

        assert_eq!(purge_read_feedback(&ctx).await.unwrap(), 0);

        sqlx::query("UPDATE feedback SET is_read = 1, read_at = ? WHERE id = ?")
            .bind(encode_timestamp(Utc::now() - Duration::days(100)))
            .bind(&feedback.id)
            .execute(&ctx.db)
            .await
            .unwrap();

        assert_eq!(purge_read_feedback(&ctx).await.unwrap(), 1);
    }

    #[tokio::test]
    async fn test_health_check() {
        let ctx = context().await;
        assert!(health_check(&ctx).await.is_ok());
    }
}
