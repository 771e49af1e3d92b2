//! Error types for media_storage

use crate::asset::AssetType;
use thiserror::Error;

/// Failure to obtain any response from a fetcher
#[derive(Error, Debug)]
pub enum TransportError {
    #[error("HTTP transport error: {0}")]
    Http(String),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Invalid URL: {0}")]
    InvalidUrl(String),
}

/// Main error type for media_storage
#[derive(Error, Debug)]
pub enum StorageError {
    #[error("Load failed with status {status}: {url}")]
    LoadFailed { status: u16, url: String },

    #[error("Transport error fetching {url}: {cause}")]
    Transport {
        url: String,
        #[source]
        cause: TransportError,
    },

    #[error("Store failed with status {status}: {url}")]
    StoreFailed { status: u16, url: String },

    #[error("Store response from {url} carried no asset id")]
    MissingId { url: String },

    #[error("{asset_type} assets need an id before they can be stored")]
    UnidentifiedAsset { asset_type: AssetType },

    #[error("No store configured to save {asset_type} assets")]
    NoStore { asset_type: AssetType },

    #[error("Unknown asset type: {0}")]
    UnknownAssetType(String),

    #[error("Unknown data format: {0}")]
    UnknownDataFormat(String),

    #[error("Configuration error: {0}")]
    Config(String),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Serialization error: {0}")]
    Serde(#[from] serde_json::Error),
}

impl StorageError {
    /// Status code carried by a failed request, if any
    pub fn status(&self) -> Option<u16> {
        match self {
            Self::LoadFailed { status, .. } | Self::StoreFailed { status, .. } => Some(*status),
            _ => None,
        }
    }
}

/// Result type alias for media_storage operations
pub type Result<T> = std::result::Result<T, StorageError>;
