//! Asset representations
//!
//! An [`Asset`] is the record handed back by every helper: a typed, formatted
//! byte payload plus text and data-URI conversions.

use crate::error::StorageError;
use base64::engine::general_purpose::STANDARD;
use base64::Engine as _;
use once_cell::sync::OnceCell;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// Category of asset
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum AssetType {
    /// Vector costume or backdrop
    ImageVector,
    /// Bitmap costume or backdrop
    ImageBitmap,
    /// Sound clip
    Sound,
    /// Project document
    Project,
    /// Exported sprite
    Sprite,
}

impl AssetType {
    pub const ALL: [AssetType; 5] = [
        AssetType::ImageVector,
        AssetType::ImageBitmap,
        AssetType::Sound,
        AssetType::Project,
        AssetType::Sprite,
    ];

    /// Name used in configuration and bundle manifests
    pub fn name(&self) -> &'static str {
        match self {
            AssetType::ImageVector => "ImageVector",
            AssetType::ImageBitmap => "ImageBitmap",
            AssetType::Sound => "Sound",
            AssetType::Project => "Project",
            AssetType::Sprite => "Sprite",
        }
    }

    /// MIME type used when no explicit content type is supplied
    pub fn content_type(&self) -> &'static str {
        match self {
            AssetType::ImageVector => "image/svg+xml",
            AssetType::ImageBitmap => "image/png",
            AssetType::Sound => "audio/x-wav",
            AssetType::Project | AssetType::Sprite => "application/json",
        }
    }

    pub fn default_format(&self) -> DataFormat {
        match self {
            AssetType::ImageVector => DataFormat::Svg,
            AssetType::ImageBitmap => DataFormat::Png,
            AssetType::Sound => DataFormat::Wav,
            AssetType::Project | AssetType::Sprite => DataFormat::Json,
        }
    }

    /// Immutable assets are addressed by content and never updated in place
    pub fn is_immutable(&self) -> bool {
        !matches!(self, AssetType::Project)
    }
}

impl fmt::Display for AssetType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

impl FromStr for AssetType {
    type Err = StorageError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        AssetType::ALL
            .iter()
            .copied()
            .find(|t| t.name().eq_ignore_ascii_case(s))
            .ok_or_else(|| StorageError::UnknownAssetType(s.to_string()))
    }
}

/// Encoding or container of an asset payload
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum DataFormat {
    Svg,
    Png,
    Jpg,
    Wav,
    Mp3,
    Json,
    Sb3,
    Sprite3,
}

impl DataFormat {
    /// Lowercase file extension
    pub fn extension(&self) -> &'static str {
        match self {
            DataFormat::Svg => "svg",
            DataFormat::Png => "png",
            DataFormat::Jpg => "jpg",
            DataFormat::Wav => "wav",
            DataFormat::Mp3 => "mp3",
            DataFormat::Json => "json",
            DataFormat::Sb3 => "sb3",
            DataFormat::Sprite3 => "sprite3",
        }
    }
}

impl fmt::Display for DataFormat {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.extension())
    }
}

impl FromStr for DataFormat {
    type Err = StorageError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let format = match s.to_ascii_lowercase().as_str() {
            "svg" => DataFormat::Svg,
            "png" => DataFormat::Png,
            "jpg" | "jpeg" => DataFormat::Jpg,
            "wav" => DataFormat::Wav,
            "mp3" => DataFormat::Mp3,
            "json" => DataFormat::Json,
            "sb3" => DataFormat::Sb3,
            "sprite3" => DataFormat::Sprite3,
            _ => return Err(StorageError::UnknownDataFormat(s.to_string())),
        };
        Ok(format)
    }
}

/// Loaded asset record
#[derive(Debug, Clone)]
pub struct Asset {
    /// Category of the asset
    pub asset_type: AssetType,
    /// Encoding of `data`
    pub data_format: DataFormat,
    /// Identifier, absent for assets not yet stored
    pub asset_id: Option<String>,
    data: Vec<u8>,
    data_uri: OnceCell<String>,
}

impl Asset {
    /// Create a new asset record
    pub fn new(
        asset_type: AssetType,
        asset_id: Option<String>,
        data_format: DataFormat,
        data: Vec<u8>,
    ) -> Self {
        Self {
            asset_type,
            data_format,
            asset_id,
            data,
            data_uri: OnceCell::new(),
        }
    }

    /// Raw payload
    pub fn data(&self) -> &[u8] {
        &self.data
    }

    /// Interpret the payload as UTF-8 text
    pub fn decode_text(&self) -> String {
        String::from_utf8_lossy(&self.data).into_owned()
    }

    /// Replace the payload with the UTF-8 bytes of `text`
    ///
    /// The memoized data URI is dropped along with the old bytes.
    pub fn encode_text_data(&mut self, text: &str) {
        self.data = text.as_bytes().to_vec();
        self.data_uri = OnceCell::new();
    }

    /// `data:` URI for the payload, computed on first call and reused after.
    ///
    /// `content_type` falls back to the asset type's MIME type. Only the first
    /// call's content type is honored.
    pub fn encode_data_uri(&self, content_type: Option<&str>) -> &str {
        self.data_uri.get_or_init(|| {
            let content_type = content_type.unwrap_or_else(|| self.asset_type.content_type());
            format!("data:{};base64,{}", content_type, STANDARD.encode(&self.data))
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_asset_type_parsing() {
        assert_eq!("Sound".parse::<AssetType>().unwrap(), AssetType::Sound);
        assert_eq!("imagevector".parse::<AssetType>().unwrap(), AssetType::ImageVector);
        assert!("Font".parse::<AssetType>().is_err());
    }

    #[test]
    fn test_data_format_extension() {
        assert_eq!("WAV".parse::<DataFormat>().unwrap().extension(), "wav");
        assert_eq!("jpeg".parse::<DataFormat>().unwrap(), DataFormat::Jpg);
        assert!(matches!(
            "flac".parse::<DataFormat>(),
            Err(StorageError::UnknownDataFormat(_))
        ));
    }

    #[test]
    fn test_data_uri_defaults_to_type_content_type() {
        let asset = Asset::new(AssetType::Sound, None, DataFormat::Wav, vec![1, 2, 3]);
        assert_eq!(asset.encode_data_uri(None), "data:audio/x-wav;base64,AQID");
    }

    #[test]
    fn test_data_uri_memoized() {
        let asset = Asset::new(AssetType::ImageBitmap, None, DataFormat::Png, b"png".to_vec());
        let first = asset.encode_data_uri(Some("image/png")).to_string();
        let second = asset.encode_data_uri(Some("image/jpeg"));
        assert_eq!(first, second);
        assert!(std::ptr::eq(asset.encode_data_uri(None), asset.encode_data_uri(None)));
        assert_eq!(asset.data(), b"png");
    }

    #[test]
    fn test_encode_text_resets_data_uri() {
        let mut asset = Asset::new(AssetType::Project, None, DataFormat::Json, b"{}".to_vec());
        let before = asset.encode_data_uri(None).to_string();

        asset.encode_text_data("{\"targets\":[]}");

        assert_ne!(asset.encode_data_uri(None), before);
        assert_eq!(asset.decode_text(), "{\"targets\":[]}");
    }

    #[test]
    fn test_immutability_flag() {
        assert!(AssetType::Sound.is_immutable());
        assert!(!AssetType::Project.is_immutable());
    }
}
