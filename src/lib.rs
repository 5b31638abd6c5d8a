/// School CMS
///
/// Content management backend for a school website: media assets, site
/// text, curriculum, an annual events calendar and visitor feedback.
pub mod api;
pub mod assets;
pub mod auth;
pub mod config;
pub mod content;
pub mod context;
pub mod db;
pub mod error;
pub mod feedback;
pub mod jobs;
pub mod mailer;
pub mod media;
pub mod server;

pub use context::AppContext;
pub use error::{CmsError, CmsResult};
