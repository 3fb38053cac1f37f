//! Error types for user-facing input.
//!
//! Engine and resource code returns `anyhow::Result` like the rest of the
//! flow engine. The enums below cover everything a user can type, drop or
//! upload, so callers can match on them and show a message instead of
//! failing a whole frame.

use thiserror::Error;

/// Invalid values for a design configuration.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum DesignError {
    #[error("unknown material preset `{0}`")]
    UnknownMaterial(String),

    #[error("`{0}` is not a hex colour (expected #RGB or #RRGGBB)")]
    InvalidColor(String),

    #[error("unknown view `{0}`")]
    UnknownView(String),
}

/// Rejected uploads from the customization panel.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum UploadError {
    #[error("`{file_name}` is not a supported 3D model (expected .glb or .gltf)")]
    UnsupportedModel { file_name: String },

    #[error("`{file_name}` is not an image")]
    UnsupportedImage { file_name: String },

    #[error("`{file_name}` is {size} bytes, the limit is {limit} bytes")]
    TooLarge {
        file_name: String,
        size: u64,
        limit: u64,
    },
}

/// Malformed `data:` URLs.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum DataUrlError {
    #[error("missing `data:` scheme")]
    MissingScheme,

    #[error("missing `,` between header and payload")]
    MissingPayload,

    #[error("only base64 payloads are supported")]
    NotBase64,

    #[error("invalid base64 payload: {0}")]
    Base64(String),
}

/// Failures reading an embed configuration back from a query string.
#[derive(Error, Debug)]
pub enum EmbedError {
    #[error("query has no `config` parameter")]
    MissingConfig,

    #[error("config is not valid UTF-8 after percent-decoding")]
    Encoding(#[from] std::str::Utf8Error),

    #[error("config is not valid JSON: {0}")]
    Json(#[from] serde_json::Error),
}

/// Export requests that cannot be served.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ExportError {
    #[error("unknown export resolution `{0}` (expected standard, hd or 4k)")]
    UnknownResolution(String),

    #[error("{width}x{height} exceeds the largest texture the GPU supports ({limit}px)")]
    TooLarge { width: u32, height: u32, limit: u32 },
}
