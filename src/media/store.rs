/// Media Store
///
/// Routes uploads to the configured backend and deletes to whichever
/// backend owns a stored location.
use crate::{
    config::ServerConfig,
    error::{CmsError, CmsResult},
    media::{
        cdn::HostedCdnBackend, cdn_url, disk::LocalDiskBackend, DataUri, MediaBackend,
        MediaFamily, MediaLocation, MediaUpload, SizeVariants, StoredMedia,
    },
};
use std::sync::Arc;

/// Maximum decoded payload sizes per media family
#[derive(Debug, Clone, Copy)]
pub struct UploadLimits {
    pub image: usize,
    pub video: usize,
}

impl UploadLimits {
    fn for_family(&self, family: MediaFamily) -> usize {
        match family {
            MediaFamily::Image => self.image,
            MediaFamily::Video => self.video,
        }
    }
}

impl Default for UploadLimits {
    fn default() -> Self {
        Self {
            image: 10 * 1024 * 1024,  // 10MB
            video: 100 * 1024 * 1024, // 100MB
        }
    }
}

/// Main media store
#[derive(Clone)]
pub struct MediaStore {
    disk: Arc<dyn MediaBackend>,
    cdn: Option<Arc<dyn MediaBackend>>,
    cdn_cloud: Option<String>,
    limits: UploadLimits,
}

impl MediaStore {
    /// Create a media store from configuration
    pub fn new(config: &ServerConfig) -> CmsResult<Self> {
        let disk: Arc<dyn MediaBackend> =
            Arc::new(LocalDiskBackend::new(config.storage.upload_directory.clone()));

        let cdn: Option<Arc<dyn MediaBackend>> = match &config.media.cdn {
            Some(cdn_config) => Some(Arc::new(HostedCdnBackend::new(cdn_config.clone())?)),
            None => {
                tracing::info!(
                    "No CDN configured, storing media under {}",
                    config.storage.upload_directory.display()
                );
                None
            }
        };

        let limits = UploadLimits {
            image: config.media.image_upload_limit,
            video: config.media.video_upload_limit,
        };

        let store = Self::with_backends(disk, cdn, limits);
        Ok(match &config.media.cdn {
            Some(cdn_config) => store.with_cdn_cloud(cdn_config.cloud_name.clone()),
            None => store,
        })
    }

    /// Create a media store from explicit backends
    pub fn with_backends(
        disk: Arc<dyn MediaBackend>,
        cdn: Option<Arc<dyn MediaBackend>>,
        limits: UploadLimits,
    ) -> Self {
        Self {
            disk,
            cdn,
            cdn_cloud: None,
            limits,
        }
    }

    /// Treat CDN URLs on this cloud as owned by the store
    pub fn with_cdn_cloud(mut self, cloud_name: impl Into<String>) -> Self {
        self.cdn_cloud = Some(cloud_name.into());
        self
    }

    /// Whether new uploads go to the CDN
    pub fn uses_cdn(&self) -> bool {
        self.cdn.is_some()
    }

    /// Decode a data URI and store it
    pub async fn upload_data_uri(
        &self,
        family: MediaFamily,
        folder: &str,
        data_uri: &str,
    ) -> CmsResult<StoredMedia> {
        let decoded = DataUri::parse(data_uri)?;

        if !family.accepts(&decoded.mime_type) {
            return Err(CmsError::Media(format!(
                "Expected {} content, got {}",
                family.resource_type(),
                decoded.mime_type
            )));
        }

        let limit = self.limits.for_family(family);
        if decoded.data.len() > limit {
            return Err(CmsError::Media(format!(
                "Payload of {} bytes exceeds the {} byte limit",
                decoded.data.len(),
                limit
            )));
        }

        let upload = MediaUpload {
            family,
            folder: folder.to_string(),
            mime_type: decoded.mime_type,
            data: decoded.data,
        };

        match &self.cdn {
            Some(cdn) => cdn.upload(upload).await,
            None => self.disk.upload(upload).await,
        }
    }

    /// Delete the bytes behind a location; external URLs are left alone
    pub async fn delete(&self, location: &MediaLocation, family: MediaFamily) -> CmsResult<()> {
        match location {
            MediaLocation::External => Ok(()),
            MediaLocation::LocalDisk { .. } => self.disk.delete(location, family).await,
            MediaLocation::HostedCdn { public_id } => match &self.cdn {
                Some(cdn) => cdn.delete(location, family).await,
                None => Err(CmsError::Media(format!(
                    "CDN not configured, cannot delete {}",
                    public_id
                ))),
            },
        }
    }

    /// Classify a caller-supplied URL.
    ///
    /// Recognised CDN URLs get variants backfilled from the extracted public
    /// id. Only URLs on our own cloud become `HostedCdn`; URLs on another
    /// cloud and anything else are `External`.
    pub fn locate(&self, url: &str, family: MediaFamily) -> (MediaLocation, Option<SizeVariants>) {
        let Some(asset) = cdn_url::parse(url) else {
            return (MediaLocation::External, None);
        };

        let variants = cdn_url::variants_for(family, &asset.cloud_name, &asset.public_id);
        if self.cdn_cloud.as_deref() == Some(asset.cloud_name.as_str()) {
            (
                MediaLocation::HostedCdn {
                    public_id: asset.public_id,
                },
                Some(variants),
            )
        } else {
            (MediaLocation::External, Some(variants))
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::tempdir;

    fn disk_store(dir: &std::path::Path, limits: UploadLimits) -> MediaStore {
        MediaStore::with_backends(
            Arc::new(LocalDiskBackend::new(dir.to_path_buf())),
            None,
            limits,
        )
    }

    #[tokio::test]
    async fn test_upload_goes_to_disk_without_cdn() {
        let dir = tempdir().unwrap();
        let store = disk_store(dir.path(), UploadLimits::default());

        let stored = store
            .upload_data_uri(MediaFamily::Image, "images", "data:image/png;base64,aGVsbG8=")
            .await
            .unwrap();

        assert!(matches!(stored.location, MediaLocation::LocalDisk { .. }));
        assert_eq!(stored.mime_type.as_deref(), Some("image/png"));
        assert!(!store.uses_cdn());
    }

    #[tokio::test]
    async fn test_upload_rejects_wrong_family() {
        let dir = tempdir().unwrap();
        let store = disk_store(dir.path(), UploadLimits::default());

        let result = store
            .upload_data_uri(MediaFamily::Video, "videos", "data:image/png;base64,aGVsbG8=")
            .await;
        assert!(matches!(result, Err(CmsError::Media(_))));
    }

    #[tokio::test]
    async fn test_upload_enforces_limit() {
        let dir = tempdir().unwrap();
        let store = disk_store(dir.path(), UploadLimits { image: 4, video: 4 });

        // "hello" decodes to 5 bytes
        let result = store
            .upload_data_uri(MediaFamily::Image, "images", "data:image/png;base64,aGVsbG8=")
            .await;
        assert!(matches!(result, Err(CmsError::Media(_))));
    }

    #[tokio::test]
    async fn test_delete_external_is_noop() {
        let dir = tempdir().unwrap();
        let store = disk_store(dir.path(), UploadLimits::default());
        store
            .delete(&MediaLocation::External, MediaFamily::Image)
            .await
            .unwrap();
    }

    #[tokio::test]
    async fn test_delete_cdn_without_cdn_fails() {
        let dir = tempdir().unwrap();
        let store = disk_store(dir.path(), UploadLimits::default());
        let location = MediaLocation::HostedCdn {
            public_id: "school/images/a".to_string(),
        };
        assert!(store.delete(&location, MediaFamily::Image).await.is_err());
    }

    #[test]
    fn test_locate_cdn_url() {
        let dir = tempdir().unwrap();
        let store = disk_store(dir.path(), UploadLimits::default()).with_cdn_cloud("demo");

        let (location, variants) = store.locate(
            "https://res.cloudinary.com/demo/image/upload/v3/school/gallery/a.jpg",
            MediaFamily::Image,
        );
        assert_eq!(
            location,
            MediaLocation::HostedCdn {
                public_id: "school/gallery/a".to_string()
            }
        );
        assert!(matches!(variants, Some(SizeVariants::Image(_))));

        let (location, variants) = store.locate("https://youtube.com/watch?v=x", MediaFamily::Video);
        assert_eq!(location, MediaLocation::External);
        assert!(variants.is_none());
    }

    #[test]
    fn test_locate_other_cloud_is_external() {
        let dir = tempdir().unwrap();
        let store = disk_store(dir.path(), UploadLimits::default()).with_cdn_cloud("ourschool");

        let (location, variants) = store.locate(
            "https://res.cloudinary.com/otherschool/image/upload/v3/school/gallery/a.jpg",
            MediaFamily::Image,
        );
        assert_eq!(location, MediaLocation::External);
        let Some(SizeVariants::Image(variants)) = variants else {
            panic!("expected image variants");
        };
        assert!(variants.medium.contains("/otherschool/"));
    }

    #[test]
    fn test_locate_without_cdn_is_external() {
        let dir = tempdir().unwrap();
        let store = disk_store(dir.path(), UploadLimits::default());

        let (location, variants) = store.locate(
            "https://res.cloudinary.com/demo/video/upload/v3/school/videos/a.mp4",
            MediaFamily::Video,
        );
        assert_eq!(location, MediaLocation::External);
        assert!(matches!(variants, Some(SizeVariants::Video(_))));
    }
}
