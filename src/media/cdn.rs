/// Hosted CDN media backend
///
/// Talks to the CDN upload API with signed requests. There is no retry and
/// no caching: a failed call fails the request that made it.
use crate::{
    config::CdnConfig,
    error::{CmsError, CmsResult},
    media::{cdn_url, DataUri, MediaBackend, MediaFamily, MediaLocation, MediaUpload, StoredMedia},
};
use async_trait::async_trait;
use chrono::Utc;
use serde::Deserialize;
use sha2::{Digest, Sha256};
use std::time::Duration;
use tracing::{debug, error, info};

/// Default upload API base
pub const DEFAULT_API_BASE: &str = "https://api.cloudinary.com/v1_1";

/// CDN storage backend
#[derive(Clone)]
pub struct HostedCdnBackend {
    client: reqwest::Client,
    config: CdnConfig,
    api_base: String,
}

#[derive(Debug, Deserialize)]
struct UploadResponse {
    public_id: String,
    secure_url: String,
    #[serde(default)]
    bytes: Option<u64>,
}

#[derive(Debug, Deserialize)]
struct DestroyResponse {
    result: String,
}

impl HostedCdnBackend {
    /// Create a new CDN backend
    pub fn new(config: CdnConfig) -> CmsResult<Self> {
        let client = reqwest::Client::builder()
            .timeout(Duration::from_secs(300))
            .build()
            .map_err(|e| CmsError::Internal(format!("Failed to build HTTP client: {}", e)))?;

        info!("Using hosted CDN media storage (cloud: {})", config.cloud_name);

        Ok(Self {
            client,
            config,
            api_base: DEFAULT_API_BASE.to_string(),
        })
    }

    /// Cloud name used for delivery URLs
    pub fn cloud_name(&self) -> &str {
        &self.config.cloud_name
    }

    fn endpoint(&self, family: MediaFamily, action: &str) -> String {
        format!(
            "{}/{}/{}/{}",
            self.api_base,
            self.config.cloud_name,
            family.resource_type(),
            action
        )
    }

    /// Sign request parameters: sorted `k=v` pairs joined by `&`, secret appended
    fn sign(&self, params: &[(&str, &str)]) -> String {
        let payload = string_to_sign(params);
        let mut hasher = Sha256::new();
        hasher.update(payload.as_bytes());
        hasher.update(self.config.api_secret.as_bytes());
        hex::encode(hasher.finalize())
    }

    async fn post_form<T: for<'de> Deserialize<'de>>(
        &self,
        url: &str,
        form: &[(&str, &str)],
    ) -> CmsResult<T> {
        let response = self
            .client
            .post(url)
            .form(form)
            .send()
            .await
            .map_err(|e| {
                error!("CDN request to {} failed: {}", url, e);
                CmsError::Media(format!("CDN request failed: {}", e))
            })?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            error!("CDN rejected request to {} ({}): {}", url, status, body);
            return Err(CmsError::Media(format!("CDN rejected request ({})", status)));
        }

        response
            .json::<T>()
            .await
            .map_err(|e| CmsError::Media(format!("Unexpected CDN response: {}", e)))
    }
}

/// Canonical parameter string for request signatures
pub fn string_to_sign(params: &[(&str, &str)]) -> String {
    let mut sorted: Vec<&(&str, &str)> = params.iter().collect();
    sorted.sort_by(|a, b| a.0.cmp(b.0));
    sorted
        .iter()
        .map(|(k, v)| format!("{}={}", k, v))
        .collect::<Vec<_>>()
        .join("&")
}

#[async_trait]
impl MediaBackend for HostedCdnBackend {
    async fn upload(&self, upload: MediaUpload) -> CmsResult<StoredMedia> {
        let folder = format!(
            "{}/{}",
            self.config.folder.trim_matches('/'),
            upload.folder.trim_matches('/')
        );
        let timestamp = Utc::now().timestamp().to_string();
        let signature = self.sign(&[("folder", folder.as_str()), ("timestamp", timestamp.as_str())]);

        let size = upload.data.len();
        let mime_type = upload.mime_type.clone();
        let file = DataUri {
            mime_type: upload.mime_type,
            data: upload.data,
        }
        .to_uri();

        debug!("Uploading {} bytes to CDN folder {}", size, folder);

        let url = self.endpoint(upload.family, "upload");
        let response: UploadResponse = self
            .post_form(
                &url,
                &[
                    ("file", file.as_str()),
                    ("folder", folder.as_str()),
                    ("timestamp", timestamp.as_str()),
                    ("api_key", self.config.api_key.as_str()),
                    ("signature", signature.as_str()),
                    ("signature_algorithm", "sha256"),
                ],
            )
            .await?;

        info!(
            "Uploaded media to CDN: {} ({} bytes)",
            response.public_id,
            response.bytes.unwrap_or(size as u64)
        );

        let variants = cdn_url::variants_for(upload.family, &self.config.cloud_name, &response.public_id);

        Ok(StoredMedia {
            url: response.secure_url,
            location: MediaLocation::HostedCdn {
                public_id: response.public_id,
            },
            variants: Some(variants),
            mime_type: Some(mime_type),
        })
    }

    async fn delete(&self, location: &MediaLocation, family: MediaFamily) -> CmsResult<()> {
        let MediaLocation::HostedCdn { public_id } = location else {
            return Err(CmsError::Internal(format!(
                "CDN backend cannot delete {} media",
                location.storage_kind()
            )));
        };

        let timestamp = Utc::now().timestamp().to_string();
        let signature = self.sign(&[("public_id", public_id.as_str()), ("timestamp", timestamp.as_str())]);

        let url = self.endpoint(family, "destroy");
        let response: DestroyResponse = self
            .post_form(
                &url,
                &[
                    ("public_id", public_id.as_str()),
                    ("timestamp", timestamp.as_str()),
                    ("api_key", self.config.api_key.as_str()),
                    ("signature", signature.as_str()),
                    ("signature_algorithm", "sha256"),
                ],
            )
            .await?;

        match response.result.as_str() {
            "ok" => {
                debug!("Deleted CDN object {}", public_id);
                Ok(())
            }
            "not found" => {
                debug!("CDN object already gone: {}", public_id);
                Ok(())
            }
            other => Err(CmsError::Media(format!(
                "CDN refused to delete {}: {}",
                public_id, other
            ))),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn backend() -> HostedCdnBackend {
        HostedCdnBackend::new(CdnConfig {
            cloud_name: "demo".to_string(),
            api_key: "key".to_string(),
            api_secret: "secret".to_string(),
            folder: "school".to_string(),
        })
        .unwrap()
    }

    #[test]
    fn test_string_to_sign_sorts_params() {
        assert_eq!(
            string_to_sign(&[("timestamp", "1700000000"), ("folder", "school/images")]),
            "folder=school/images&timestamp=1700000000"
        );
    }

    #[test]
    fn test_signature_is_hex_sha256_and_secret_dependent() {
        let cdn = backend();
        let params = [("public_id", "school/images/a"), ("timestamp", "1")];
        let signature = cdn.sign(&params);
        assert_eq!(signature.len(), 64);
        assert!(signature.chars().all(|c| c.is_ascii_hexdigit()));

        let mut other = backend();
        other.config.api_secret = "different".to_string();
        assert_ne!(signature, other.sign(&params));
    }

    #[test]
    fn test_endpoints() {
        let cdn = backend();
        assert_eq!(
            cdn.endpoint(MediaFamily::Video, "destroy"),
            "https://api.cloudinary.com/v1_1/demo/video/destroy"
        );
        assert_eq!(cdn.cloud_name(), "demo");
    }
}
