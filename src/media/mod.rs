/// Media Storage Adapter
///
/// Stores the bytes behind image and video assets. Two backends sit behind
/// one trait: local disk and a hosted transformation CDN. Records persist a
/// [`MediaLocation`] telling which backend owns the bytes.

pub mod cdn;
pub mod cdn_url;
pub mod data_uri;
pub mod disk;
pub mod models;
pub mod store;

pub use data_uri::DataUri;
pub use models::*;
pub use store::{MediaStore, UploadLimits};

use crate::error::CmsResult;
use async_trait::async_trait;

/// Media storage backend trait
///
/// Implementations handle the actual storage and removal of media bytes.
#[async_trait]
pub trait MediaBackend: Send + Sync {
    /// Store the payload and return where it ended up
    async fn upload(&self, upload: MediaUpload) -> CmsResult<StoredMedia>;

    /// Remove the bytes behind a location owned by this backend
    async fn delete(&self, location: &MediaLocation, family: MediaFamily) -> CmsResult<()>;
}
