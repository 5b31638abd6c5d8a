use std::sync::Arc;
use tokio::time::{interval, Duration};
use tracing::{error, info};

pub mod tasks;

/// Job scheduler for background tasks
pub struct JobScheduler {
    context: Arc<crate::context::AppContext>,
}

impl JobScheduler {
    pub fn new(context: Arc<crate::context::AppContext>) -> Self {
        Self { context }
    }

    /// Start all background jobs
    pub fn start(self: Arc<Self>) {
        info!("Starting background job scheduler");

        tokio::spawn(Self::feedback_cleanup_job(Arc::clone(&self)));
        tokio::spawn(Self::health_check_job(Arc::clone(&self)));

        info!("Background jobs started");
    }

    /// Purge read feedback past retention (daily by default)
    async fn feedback_cleanup_job(scheduler: Arc<Self>) {
        let secs = scheduler.context.config.jobs.feedback_cleanup_interval_secs;
        let mut interval = interval(Duration::from_secs(secs));

        loop {
            interval.tick().await;
            info!("Running read feedback cleanup");

            match tasks::purge_read_feedback(&scheduler.context).await {
                Ok(count) => {
                    if count > 0 {
                        info!("Purged {} read feedback entries", count);
                    } else {
                        info!("Feedback cleanup: nothing to purge");
                    }
                }
                Err(e) => error!("Failed to purge read feedback: {}", e),
            }
        }
    }

    /// Health check job (every 5 minutes by default)
    async fn health_check_job(scheduler: Arc<Self>) {
        let secs = scheduler.context.config.jobs.health_check_interval_secs.max(1);
        let mut interval = interval(Duration::from_secs(secs));

        loop {
            interval.tick().await;

            if let Err(e) = tasks::health_check(&scheduler.context).await {
                error!("Health check failed: {}", e);
            }
        }
    }
}
