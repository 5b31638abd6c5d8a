/// Asset Record Store
///
/// Image, gallery, video and video-gallery records. Each kind has its own
/// table with the same shape; the kind decides the media family, the
/// storage folder and the batch upload cap.

pub mod manager;

pub use manager::AssetManager;

use crate::media::{MediaFamily, MediaLocation, SizeVariants};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Asset collections
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum AssetKind {
    Image,
    Gallery,
    Video,
    VideoGallery,
}

impl AssetKind {
    pub const ALL: [AssetKind; 4] = [
        AssetKind::Image,
        AssetKind::Gallery,
        AssetKind::Video,
        AssetKind::VideoGallery,
    ];

    /// Backing table
    pub fn table(&self) -> &'static str {
        match self {
            AssetKind::Image => "image",
            AssetKind::Gallery => "gallery",
            AssetKind::Video => "video",
            AssetKind::VideoGallery => "video_gallery",
        }
    }

    pub fn family(&self) -> MediaFamily {
        match self {
            AssetKind::Image | AssetKind::Gallery => MediaFamily::Image,
            AssetKind::Video | AssetKind::VideoGallery => MediaFamily::Video,
        }
    }

    /// Storage folder for uploads of this kind
    pub fn folder(&self) -> &'static str {
        match self {
            AssetKind::Image => "images",
            AssetKind::Gallery => "gallery",
            AssetKind::Video => "videos",
            AssetKind::VideoGallery => "video-gallery",
        }
    }

    /// Most items accepted by one batch upload
    pub fn batch_limit(&self) -> usize {
        match self.family() {
            MediaFamily::Image => 20,
            MediaFamily::Video => 10,
        }
    }

    /// Human readable name for messages
    pub fn label(&self) -> &'static str {
        match self {
            AssetKind::Image => "Image",
            AssetKind::Gallery => "Gallery item",
            AssetKind::Video => "Video",
            AssetKind::VideoGallery => "Video gallery item",
        }
    }
}

/// Asset record
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Asset {
    pub id: String,
    pub kind: AssetKind,
    pub title: String,
    pub description: Option<String>,
    pub alt_text: Option<String>,
    pub category: Option<String>,
    pub year: Option<i32>,
    pub url: String,
    pub thumbnail_url: Option<String>,
    pub storage: MediaLocation,
    pub variants: Option<SizeVariants>,
    pub mime_type: Option<String>,
    pub order: i64,
    pub is_active: bool,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// Display metadata accepted on create
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct AssetMetadata {
    pub title: Option<String>,
    pub description: Option<String>,
    pub alt_text: Option<String>,
    pub category: Option<String>,
    pub year: Option<i32>,
    pub thumbnail_url: Option<String>,
    pub order: Option<i64>,
    pub is_active: Option<bool>,
}

/// Create an asset from a caller-supplied URL
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NewAssetReference {
    #[serde(default)]
    pub url: Option<String>,
    #[serde(flatten)]
    pub metadata: AssetMetadata,
}

/// Create an asset from an inline `data:` URI
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UploadAssetRequest {
    #[serde(default)]
    pub data: Option<String>,
    #[serde(flatten)]
    pub metadata: AssetMetadata,
}

/// Partial update; absent fields are left unchanged
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct AssetUpdate {
    pub title: Option<String>,
    pub description: Option<String>,
    pub alt_text: Option<String>,
    pub category: Option<String>,
    pub year: Option<i32>,
    pub url: Option<String>,
    pub thumbnail_url: Option<String>,
    pub order: Option<i64>,
    pub is_active: Option<bool>,
}

/// Public listing filter
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct AssetFilter {
    pub category: Option<String>,
    pub year: Option<i32>,
}

/// Per-item failure in a batch upload
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BatchFailure {
    pub index: usize,
    pub message: String,
}

/// Outcome of a batch upload
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct BatchReport {
    pub total: usize,
    pub uploaded: Vec<Asset>,
    pub failed: Vec<BatchFailure>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_kind_properties() {
        assert_eq!(AssetKind::Image.batch_limit(), 20);
        assert_eq!(AssetKind::Gallery.batch_limit(), 20);
        assert_eq!(AssetKind::Video.batch_limit(), 10);
        assert_eq!(AssetKind::VideoGallery.batch_limit(), 10);
        assert_eq!(AssetKind::VideoGallery.table(), "video_gallery");
        assert_eq!(AssetKind::Gallery.family(), MediaFamily::Image);
    }

    #[test]
    fn test_upload_request_flattens_metadata() {
        let request: UploadAssetRequest = serde_json::from_str(
            r#"{"data":"data:image/png;base64,aGVsbG8=","title":"Sports day","altText":"Relay race","order":3}"#,
        )
        .unwrap();
        assert!(request.data.is_some());
        assert_eq!(request.metadata.title.as_deref(), Some("Sports day"));
        assert_eq!(request.metadata.alt_text.as_deref(), Some("Relay race"));
        assert_eq!(request.metadata.order, Some(3));
        assert_eq!(request.metadata.is_active, None);
    }
}
