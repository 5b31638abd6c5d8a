/// Local disk media backend
use crate::{
    error::{CmsError, CmsResult},
    media::{MediaBackend, MediaFamily, MediaLocation, MediaUpload, StoredMedia},
};
use async_trait::async_trait;
use std::path::{Component, Path, PathBuf};
use tokio::fs;
use uuid::Uuid;

/// Public URL prefix under which the upload directory is served
pub const UPLOADS_URL_PREFIX: &str = "/uploads";

/// Disk storage backend
///
/// Stores media as `{base}/{folder}/{uuid}.{ext}` and hands out
/// `/uploads/{folder}/{uuid}.{ext}` URLs served by the HTTP layer.
#[derive(Clone)]
pub struct LocalDiskBackend {
    base_path: PathBuf,
}

impl LocalDiskBackend {
    /// Create a new disk storage backend
    pub fn new(base_path: PathBuf) -> Self {
        Self { base_path }
    }

    /// Resolve a stored filename, refusing anything that escapes the base
    fn resolve(&self, filename: &str) -> CmsResult<PathBuf> {
        let relative = Path::new(filename);
        let safe = relative
            .components()
            .all(|c| matches!(c, Component::Normal(_)));
        if !safe || filename.is_empty() {
            return Err(CmsError::Media(format!("Refusing unsafe media path {:?}", filename)));
        }
        Ok(self.base_path.join(relative))
    }

    /// File extension for a MIME type
    fn extension_for(mime_type: &str) -> &'static str {
        match mime_guess::get_mime_extensions_str(mime_type) {
            Some(exts) if exts.contains(&"jpg") => "jpg",
            Some(exts) if exts.contains(&"mp4") => "mp4",
            Some(exts) => exts.first().copied().unwrap_or("bin"),
            None => "bin",
        }
    }
}

#[async_trait]
impl MediaBackend for LocalDiskBackend {
    async fn upload(&self, upload: MediaUpload) -> CmsResult<StoredMedia> {
        let filename = format!(
            "{}/{}.{}",
            upload.folder.trim_matches('/'),
            Uuid::new_v4(),
            Self::extension_for(&upload.mime_type)
        );
        let path = self.resolve(&filename)?;

        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent).await.map_err(|e| {
                CmsError::Media(format!("Failed to create media directory: {}", e))
            })?;
        }

        fs::write(&path, &upload.data).await.map_err(|e| {
            CmsError::Media(format!("Failed to write media file {}: {}", filename, e))
        })?;

        tracing::debug!("Stored {} bytes at {}", upload.data.len(), path.display());

        Ok(StoredMedia {
            url: format!("{}/{}", UPLOADS_URL_PREFIX, filename),
            location: MediaLocation::LocalDisk { filename },
            variants: None,
            mime_type: Some(upload.mime_type),
        })
    }

    async fn delete(&self, location: &MediaLocation, _family: MediaFamily) -> CmsResult<()> {
        let MediaLocation::LocalDisk { filename } = location else {
            return Err(CmsError::Internal(format!(
                "Disk backend cannot delete {} media",
                location.storage_kind()
            )));
        };

        let path = self.resolve(filename)?;
        match fs::remove_file(&path).await {
            Ok(()) => Ok(()),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                tracing::debug!("Media file already gone: {}", path.display());
                Ok(())
            }
            Err(e) => Err(CmsError::Media(format!(
                "Failed to delete media file {}: {}",
                filename, e
            ))),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::tempdir;

    fn png_upload() -> MediaUpload {
        MediaUpload {
            family: MediaFamily::Image,
            folder: "images".to_string(),
            mime_type: "image/png".to_string(),
            data: b"not really a png".to_vec(),
        }
    }

    #[tokio::test]
    async fn test_upload_writes_file() {
        let dir = tempdir().unwrap();
        let backend = LocalDiskBackend::new(dir.path().to_path_buf());

        let stored = backend.upload(png_upload()).await.unwrap();

        let MediaLocation::LocalDisk { filename } = &stored.location else {
            panic!("expected local disk location");
        };
        assert!(filename.starts_with("images/"));
        assert!(filename.ends_with(".png"));
        assert_eq!(stored.url, format!("/uploads/{}", filename));
        assert!(stored.variants.is_none());

        let written = tokio::fs::read(dir.path().join(filename)).await.unwrap();
        assert_eq!(written, b"not really a png");
    }

    #[tokio::test]
    async fn test_delete_unlinks_file() {
        let dir = tempdir().unwrap();
        let backend = LocalDiskBackend::new(dir.path().to_path_buf());

        let stored = backend.upload(png_upload()).await.unwrap();
        let MediaLocation::LocalDisk { filename } = &stored.location else {
            panic!("expected local disk location");
        };
        let path = dir.path().join(filename);
        assert!(path.exists());

        backend
            .delete(&stored.location, MediaFamily::Image)
            .await
            .unwrap();
        assert!(!path.exists());

        // Second delete of a missing file is fine
        backend
            .delete(&stored.location, MediaFamily::Image)
            .await
            .unwrap();
    }

    #[tokio::test]
    async fn test_delete_rejects_path_traversal() {
        let dir = tempdir().unwrap();
        let backend = LocalDiskBackend::new(dir.path().to_path_buf());

        let location = MediaLocation::LocalDisk {
            filename: "../outside.png".to_string(),
        };
        assert!(backend.delete(&location, MediaFamily::Image).await.is_err());
    }

    #[tokio::test]
    async fn test_delete_rejects_foreign_location() {
        let dir = tempdir().unwrap();
        let backend = LocalDiskBackend::new(dir.path().to_path_buf());

        let location = MediaLocation::HostedCdn {
            public_id: "school/x".to_string(),
        };
        assert!(backend.delete(&location, MediaFamily::Image).await.is_err());
    }

    #[test]
    fn test_extension_for() {
        assert_eq!(LocalDiskBackend::extension_for("image/jpeg"), "jpg");
        assert_eq!(LocalDiskBackend::extension_for("video/mp4"), "mp4");
        assert_eq!(LocalDiskBackend::extension_for("application/x-unknown-thing"), "bin");
    }
}
