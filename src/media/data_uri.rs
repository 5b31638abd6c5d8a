/// `data:` URI decoding for inline uploads
use crate::error::{CmsError, CmsResult};
use base64::{engine::general_purpose::STANDARD, Engine};

/// Decoded `data:<mime>;base64,<payload>` URI
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DataUri {
    pub mime_type: String,
    pub data: Vec<u8>,
}

impl DataUri {
    /// Parse and decode a base64 data URI
    pub fn parse(input: &str) -> CmsResult<Self> {
        let rest = input
            .trim()
            .strip_prefix("data:")
            .ok_or_else(|| CmsError::Media("Payload is not a data URI".to_string()))?;

        let (header, payload) = rest
            .split_once(',')
            .ok_or_else(|| CmsError::Media("Data URI has no payload".to_string()))?;

        let mut params = header.split(';');
        let mime_type = params.next().unwrap_or_default().trim().to_ascii_lowercase();
        if mime_type.is_empty() || !mime_type.contains('/') {
            return Err(CmsError::Media("Data URI has no MIME type".to_string()));
        }
        if !params.any(|p| p.trim().eq_ignore_ascii_case("base64")) {
            return Err(CmsError::Media("Data URI must be base64 encoded".to_string()));
        }

        // Clients sometimes wrap long payloads
        let compact: String = payload.chars().filter(|c| !c.is_whitespace()).collect();
        let data = STANDARD
            .decode(compact.as_bytes())
            .map_err(|e| CmsError::Media(format!("Invalid base64 payload: {}", e)))?;

        if data.is_empty() {
            return Err(CmsError::Media("Data URI payload is empty".to_string()));
        }

        Ok(Self { mime_type, data })
    }

    /// Re-encode as a data URI
    pub fn to_uri(&self) -> String {
        format!("data:{};base64,{}", self.mime_type, STANDARD.encode(&self.data))
    }
}
