/// Media data models
use crate::error::{CmsError, CmsResult};
use serde::{Deserialize, Serialize};

/// Kind of media an asset holds
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum MediaFamily {
    Image,
    Video,
}

impl MediaFamily {
    /// CDN resource type path segment
    pub fn resource_type(&self) -> &'static str {
        match self {
            MediaFamily::Image => "image",
            MediaFamily::Video => "video",
        }
    }

    /// Whether a MIME type belongs to this family
    pub fn accepts(&self, mime_type: &str) -> bool {
        mime_type.starts_with(match self {
            MediaFamily::Image => "image/",
            MediaFamily::Video => "video/",
        })
    }
}

/// Where the bytes of an asset live
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "camelCase")]
pub enum MediaLocation {
    /// File under the upload directory, path relative to it
    LocalDisk { filename: String },

    /// Object in the hosted CDN
    HostedCdn {
        #[serde(rename = "publicId")]
        public_id: String,
    },

    /// Remote URL we do not own
    External,
}

impl MediaLocation {
    /// Value of the `storage_kind` column
    pub fn storage_kind(&self) -> &'static str {
        match self {
            MediaLocation::LocalDisk { .. } => "local_disk",
            MediaLocation::HostedCdn { .. } => "hosted_cdn",
            MediaLocation::External => "external",
        }
    }

    /// Value of the `storage_ref` column
    pub fn storage_ref(&self) -> Option<&str> {
        match self {
            MediaLocation::LocalDisk { filename } => Some(filename),
            MediaLocation::HostedCdn { public_id } => Some(public_id),
            MediaLocation::External => None,
        }
    }

    /// Rebuild from the `storage_kind` / `storage_ref` columns
    pub fn from_columns(kind: &str, reference: Option<String>) -> CmsResult<Self> {
        match (kind, reference) {
            ("local_disk", Some(filename)) => Ok(MediaLocation::LocalDisk { filename }),
            ("hosted_cdn", Some(public_id)) => Ok(MediaLocation::HostedCdn { public_id }),
            ("external", None) => Ok(MediaLocation::External),
            (kind, reference) => Err(CmsError::Internal(format!(
                "Inconsistent storage columns: kind={} ref={:?}",
                kind, reference
            ))),
        }
    }
}

/// Responsive renditions of an image
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ImageVariants {
    pub thumbnail: String,
    pub medium: String,
    pub large: String,
    pub blur: String,
    pub original: String,
}

/// Renditions of a video
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct VideoVariants {
    pub thumbnail: String,
    pub sd: String,
    pub hd: String,
    pub original: String,
}

/// Size-variant URL set, shape fixed by media family
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum SizeVariants {
    Image(ImageVariants),
    Video(VideoVariants),
}

/// Decoded payload handed to a backend
#[derive(Debug, Clone)]
pub struct MediaUpload {
    pub family: MediaFamily,
    /// Folder inside the backend, e.g. `images`
    pub folder: String,
    pub mime_type: String,
    pub data: Vec<u8>,
}

/// Result of a successful upload
#[derive(Debug, Clone)]
pub struct StoredMedia {
    pub url: String,
    pub location: MediaLocation,
    pub variants: Option<SizeVariants>,
    pub mime_type: Option<String>,
}
