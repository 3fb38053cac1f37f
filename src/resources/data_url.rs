//! `data:` URLs for textures that have to travel as plain strings.
//!
//! Uploaded images are embedded as `data:<mime>;base64,<payload>` so the
//! design configuration never references a file that might disappear.

use base64::{Engine, engine::general_purpose::STANDARD};

use crate::error::DataUrlError;

/// Decoded payload of a data URL.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DataUrl {
    pub mime_type: String,
    pub bytes: Vec<u8>,
}

pub fn encode(mime_type: &str, bytes: &[u8]) -> String {
    format!("data:{};base64,{}", mime_type, STANDARD.encode(bytes))
}

pub fn decode(url: &str) -> Result<DataUrl, DataUrlError> {
    let rest = url
        .strip_prefix("data:")
        .ok_or(DataUrlError::MissingScheme)?;
    let (header, payload) = rest.split_once(',').ok_or(DataUrlError::MissingPayload)?;
    let mime_type = header
        .strip_suffix(";base64")
        .ok_or(DataUrlError::NotBase64)?;
    let bytes = STANDARD
        .decode(payload.trim())
        .map_err(|e| DataUrlError::Base64(e.to_string()))?;
    Ok(DataUrl {
        mime_type: mime_type.to_string(),
        bytes,
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn decodes_what_it_encodes() {
        let url = encode("image/png", &[0x89, b'P', b'N', b'G']);
        assert!(url.starts_with("data:image/png;base64,"));
        let decoded = decode(&url).unwrap();
        assert_eq!(decoded.mime_type, "image/png");
        assert_eq!(decoded.bytes, vec![0x89, b'P', b'N', b'G']);
    }

    #[test]
    fn rejects_urls_without_base64_marker() {
        assert_eq!(
            decode("data:text/plain,hello"),
            Err(DataUrlError::NotBase64)
        );
        assert_eq!(decode("blob:abc"), Err(DataUrlError::MissingScheme));
        assert_eq!(
            decode("data:image/png;base64"),
            Err(DataUrlError::MissingPayload)
        );
    }
}
