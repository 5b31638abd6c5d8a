/// Configuration management for the school CMS
use crate::error::{CmsError, CmsResult};
use serde::{Deserialize, Serialize};
use std::env;
use std::path::PathBuf;

/// Main server configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ServerConfig {
    pub service: ServiceConfig,
    pub storage: StorageConfig,
    pub authentication: AuthConfig,
    pub media: MediaConfig,
    pub email: Option<EmailConfig>,
    pub jobs: JobsConfig,
    pub logging: LoggingConfig,
}

/// Service-level configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ServiceConfig {
    pub hostname: String,
    pub port: u16,
    /// Externally reachable base URL, used for links in outgoing email
    pub public_url: String,
    pub body_limit: usize,
}

/// Storage configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StorageConfig {
    pub database_url: String,
    pub max_connections: u32,
    /// Root directory for media kept on local disk
    pub upload_directory: PathBuf,
}

/// Admin authentication configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AuthConfig {
    /// Shared secret used to sign and verify admin bearer tokens
    pub jwt_secret: String,
    pub admin_username: String,
    pub admin_password: String,
    pub token_ttl_hours: i64,
}

/// Media configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MediaConfig {
    /// Hosted CDN credentials; local disk storage is used when absent
    pub cdn: Option<CdnConfig>,
    pub image_upload_limit: usize,
    pub video_upload_limit: usize,
}

/// Hosted media CDN credentials
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CdnConfig {
    pub cloud_name: String,
    pub api_key: String,
    pub api_secret: String,
    /// Folder prefix for every uploaded object
    pub folder: String,
}

/// Email configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EmailConfig {
    pub smtp_url: String,
    pub from_address: String,
    /// Inbox that receives feedback notifications
    pub notify_address: String,
}

/// Background job configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct JobsConfig {
    pub feedback_cleanup_interval_secs: u64,
    pub health_check_interval_secs: u64,
}

/// Logging configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LoggingConfig {
    pub level: String,
    pub json: bool,
}

impl ServerConfig {
    /// Load configuration from environment variables
    pub fn from_env() -> CmsResult<Self> {
        dotenv::dotenv().ok();

        let hostname = env::var("CMS_HOSTNAME").unwrap_or_else(|_| "0.0.0.0".to_string());
        let port: u16 = env::var("CMS_PORT")
            .unwrap_or_else(|_| "5000".to_string())
            .parse()
            .map_err(|_| CmsError::Validation("Invalid port number".to_string()))?;
        let public_url = env::var("CMS_PUBLIC_URL")
            .unwrap_or_else(|_| format!("http://localhost:{}", port))
            .trim_end_matches('/')
            .to_string();
        let body_limit = env::var("CMS_BODY_LIMIT")
            .unwrap_or_else(|_| "157286400".to_string())
            .parse()
            .unwrap_or(157_286_400);

        let database_url = env::var("CMS_DATABASE_URL")
            .or_else(|_| env::var("DATABASE_URL"))
            .unwrap_or_else(|_| "sqlite://./data/school_cms.sqlite".to_string());
        let max_connections = env::var("CMS_DATABASE_MAX_CONNECTIONS")
            .unwrap_or_else(|_| "10".to_string())
            .parse()
            .unwrap_or(10);
        let upload_directory: PathBuf = env::var("CMS_UPLOAD_DIRECTORY")
            .unwrap_or_else(|_| "./uploads".to_string())
            .into();

        let jwt_secret = env::var("CMS_JWT_SECRET")
            .map_err(|_| CmsError::Validation("JWT secret required".to_string()))?;
        let admin_username =
            env::var("CMS_ADMIN_USERNAME").unwrap_or_else(|_| "admin".to_string());
        let admin_password = env::var("CMS_ADMIN_PASSWORD")
            .map_err(|_| CmsError::Validation("Admin password required".to_string()))?;
        let token_ttl_hours = env::var("CMS_ADMIN_TOKEN_TTL_HOURS")
            .unwrap_or_else(|_| "12".to_string())
            .parse()
            .unwrap_or(12);

        let cdn = if let Ok(cloud_name) = env::var("CMS_CDN_CLOUD_NAME") {
            Some(CdnConfig {
                cloud_name,
                api_key: env::var("CMS_CDN_API_KEY")
                    .map_err(|_| CmsError::Validation("CDN API key required".to_string()))?,
                api_secret: env::var("CMS_CDN_API_SECRET")
                    .map_err(|_| CmsError::Validation("CDN API secret required".to_string()))?,
                folder: env::var("CMS_CDN_FOLDER").unwrap_or_else(|_| "school".to_string()),
            })
        } else {
            None
        };
        let image_upload_limit = env::var("CMS_IMAGE_UPLOAD_LIMIT")
            .unwrap_or_else(|_| "10485760".to_string())
            .parse()
            .unwrap_or(10_485_760);
        let video_upload_limit = env::var("CMS_VIDEO_UPLOAD_LIMIT")
            .unwrap_or_else(|_| "104857600".to_string())
            .parse()
            .unwrap_or(104_857_600);

        let email = if let Ok(smtp_url) = env::var("CMS_EMAIL_SMTP_URL") {
            let from_address = env::var("CMS_EMAIL_FROM_ADDRESS")
                .unwrap_or_else(|_| format!("noreply@{}", hostname));
            Some(EmailConfig {
                smtp_url,
                notify_address: env::var("CMS_EMAIL_NOTIFY_ADDRESS")
                    .unwrap_or_else(|_| from_address.clone()),
                from_address,
            })
        } else {
            None
        };

        let feedback_cleanup_interval_secs = env::var("CMS_FEEDBACK_CLEANUP_INTERVAL_SECS")
            .unwrap_or_else(|_| "86400".to_string())
            .parse()
            .unwrap_or(86400);
        let health_check_interval_secs = env::var("CMS_HEALTH_CHECK_INTERVAL_SECS")
            .unwrap_or_else(|_| "300".to_string())
            .parse()
            .unwrap_or(300);

        let log_level = env::var("RUST_LOG")
            .unwrap_or_else(|_| "school_cms=debug,tower_http=debug".to_string());
        let log_json = env::var("CMS_LOG_FORMAT")
            .map(|f| f.eq_ignore_ascii_case("json"))
            .unwrap_or(false);

        Ok(ServerConfig {
            service: ServiceConfig {
                hostname,
                port,
                public_url,
                body_limit,
            },
            storage: StorageConfig {
                database_url,
                max_connections,
                upload_directory,
            },
            authentication: AuthConfig {
                jwt_secret,
                admin_username,
                admin_password,
                token_ttl_hours,
            },
            media: MediaConfig {
                cdn,
                image_upload_limit,
                video_upload_limit,
            },
            email,
            jobs: JobsConfig {
                feedback_cleanup_interval_secs,
                health_check_interval_secs,
            },
            logging: LoggingConfig {
                level: log_level,
                json: log_json,
            },
        })
    }

    /// Validate configuration
    pub fn validate(&self) -> CmsResult<()> {
        if self.service.hostname.is_empty() {
            return Err(CmsError::Validation("Hostname cannot be empty".to_string()));
        }

        if self.authentication.jwt_secret.len() < 32 {
            return Err(CmsError::Validation(
                "JWT secret must be at least 32 characters".to_string(),
            ));
        }

        if self.authentication.admin_password.is_empty() {
            return Err(CmsError::Validation(
                "Admin password cannot be empty".to_string(),
            ));
        }

        if self.jobs.feedback_cleanup_interval_secs == 0 {
            return Err(CmsError::Validation(
                "Feedback cleanup interval must be positive".to_string(),
            ));
        }

        Ok(())
    }
}

/// Configuration for unit tests: in-memory database, no CDN, no email
#[cfg(test)]
pub(crate) fn test_config() -> ServerConfig {
    ServerConfig {
        service: ServiceConfig {
            hostname: "localhost".to_string(),
            port: 5000,
            public_url: "http://localhost:5000".to_string(),
            body_limit: 1024,
        },
        storage: StorageConfig {
            database_url: "sqlite::memory:".to_string(),
            max_connections: 1,
            upload_directory: PathBuf::from("./uploads"),
        },
        authentication: AuthConfig {
            jwt_secret: "0123456789abcdef0123456789abcdef".to_string(),
            admin_username: "admin".to_string(),
            admin_password: "secret".to_string(),
            token_ttl_hours: 12,
        },
        media: MediaConfig {
            cdn: None,
            image_upload_limit: 1024,
            video_upload_limit: 2048,
        },
        email: None,
        jobs: JobsConfig {
            feedback_cleanup_interval_secs: 86400,
            health_check_interval_secs: 300,
        },
        logging: LoggingConfig {
            level: "info".to_string(),
            json: false,
        },
    }
}
