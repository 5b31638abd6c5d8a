/// Application context and dependency injection
use crate::{
    assets::AssetManager,
    config::ServerConfig,
    content::{ContentManager, CurriculumManager, EventManager},
    db,
    error::CmsResult,
    feedback::FeedbackManager,
    mailer::Mailer,
    media::MediaStore,
};
use sqlx::SqlitePool;
use std::sync::Arc;

/// Application context holding all shared services
#[derive(Clone)]
pub struct AppContext {
    pub config: Arc<ServerConfig>,
    pub db: SqlitePool,
    pub media: Arc<MediaStore>,
    pub asset_manager: Arc<AssetManager>,
    pub content_manager: Arc<ContentManager>,
    pub curriculum_manager: Arc<CurriculumManager>,
    pub event_manager: Arc<EventManager>,
    pub feedback_manager: Arc<FeedbackManager>,
    pub mailer: Arc<Mailer>,
}

impl AppContext {
    /// Create a new application context from configuration
    pub async fn new(config: ServerConfig) -> CmsResult<Self> {
        config.validate()?;

        // Local-disk media root must exist before ServeDir and uploads use it
        tokio::fs::create_dir_all(&config.storage.upload_directory).await?;

        let db = db::create_pool(
            &config.storage.database_url,
            db::DatabaseOptions {
                max_connections: config.storage.max_connections,
                ..Default::default()
            },
        )
        .await?;

        db::run_migrations(&db).await?;
        db::test_connection(&db).await?;

        let media = Arc::new(MediaStore::new(&config)?);

        Self::with_parts(config, db, media)
    }

    /// Assemble a context from an existing pool and media store
    pub fn with_parts(
        config: ServerConfig,
        db: SqlitePool,
        media: Arc<MediaStore>,
    ) -> CmsResult<Self> {
        let mailer = Arc::new(Mailer::new(config.email.clone())?);

        let asset_manager = Arc::new(AssetManager::new(db.clone(), media.clone()));
        let content_manager = Arc::new(ContentManager::new(db.clone()));
        let curriculum_manager = Arc::new(CurriculumManager::new(db.clone()));
        let event_manager = Arc::new(EventManager::new(db.clone()));
        let feedback_manager = Arc::new(FeedbackManager::new(
            db.clone(),
            mailer.clone(),
            config.service.public_url.clone(),
        ));

        Ok(Self {
            config: Arc::new(config),
            db,
            media,
            asset_manager,
            content_manager,
            curriculum_manager,
            event_manager,
            feedback_manager,
            mailer,
        })
    }
}
