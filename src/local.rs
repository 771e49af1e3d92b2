//! Local asset loader for bundled media
//!
//! Serves a fixed set of asset types from `<base_dir>/<asset_id>.<format>`.
//! Types outside the set resolve to `None` without touching the fetcher, so the
//! loader can sit in a helper chain next to other strategies.

use crate::asset::{Asset, AssetType, DataFormat};
use crate::engine::Helper;
use crate::error::{Result, StorageError};
use crate::fetch::{Fetcher, Request};
use futures::future::BoxFuture;
use futures::FutureExt;
use hashbrown::HashSet;
use std::sync::Arc;

/// Default directory holding bundled media
pub const DEFAULT_MEDIA_DIR: &str = "medialibraries";

/// Loads bundled media through a single fetch per asset
pub struct LocalHelper {
    types: HashSet<AssetType>,
    base_dir: String,
    fetcher: Arc<dyn Fetcher>,
}

impl LocalHelper {
    /// Create a loader serving `types` from `base_dir`
    pub fn new(
        types: impl IntoIterator<Item = AssetType>,
        base_dir: impl Into<String>,
        fetcher: Arc<dyn Fetcher>,
    ) -> Self {
        let base_dir = base_dir.into().trim_end_matches('/').to_string();
        Self {
            types: types.into_iter().collect(),
            base_dir,
            fetcher,
        }
    }

    /// Whether `asset_type` is served by this loader
    pub fn serves(&self, asset_type: AssetType) -> bool {
        self.types.contains(&asset_type)
    }

    pub fn base_dir(&self) -> &str {
        &self.base_dir
    }

    /// Path requested for an asset
    pub fn asset_path(&self, asset_id: &str, data_format: DataFormat) -> String {
        format!("{}/{}.{}", self.base_dir, asset_id, data_format.extension())
    }

    /// Fetch an asset if its type is served
    pub async fn load_asset(
        &self,
        asset_type: AssetType,
        asset_id: &str,
        data_format: DataFormat,
    ) -> Result<Option<Asset>> {
        if !self.serves(asset_type) {
            return Ok(None);
        }

        let url = self.asset_path(asset_id, data_format);
        log::trace!("Loading {} from {}", asset_type, url);

        let response = match self.fetcher.fetch(Request::get(url.clone())).await {
            Ok(response) => response,
            Err(cause) => return Err(StorageError::Transport { url, cause }),
        };

        if !response.is_success() {
            return Err(StorageError::LoadFailed {
                status: response.status,
                url,
            });
        }

        Ok(Some(Asset::new(
            asset_type,
            Some(asset_id.to_string()),
            data_format,
            response.body,
        )))
    }
}

impl Helper for LocalHelper {
    fn load<'a>(
        &'a self,
        asset_type: AssetType,
        asset_id: &'a str,
        data_format: DataFormat,
    ) -> BoxFuture<'a, Result<Option<Asset>>> {
        self.load_asset(asset_type, asset_id, data_format).boxed()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::fetch::MemoryFetcher;

    fn sound_loader(fetcher: Arc<MemoryFetcher>) -> LocalHelper {
        LocalHelper::new([AssetType::Sound], DEFAULT_MEDIA_DIR, fetcher)
    }

    #[tokio::test]
    async fn test_unserved_type_resolves_none_without_fetch() {
        let fetcher = Arc::new(MemoryFetcher::new());
        let loader = sound_loader(fetcher.clone());

        for format in [DataFormat::Svg, DataFormat::Png, DataFormat::Wav] {
            let asset = loader.load_asset(AssetType::ImageVector, "abc123", format).await.unwrap();
            assert!(asset.is_none());
        }
        assert_eq!(fetcher.request_count(), 0);
    }

    #[tokio::test]
    async fn test_served_type_fetches_path() {
        let fetcher = Arc::new(
            MemoryFetcher::new().with_response("medialibraries/abc123.wav", 200, vec![1, 2, 3]),
        );
        let loader = sound_loader(fetcher.clone());

        let asset = loader
            .load_asset(AssetType::Sound, "abc123", DataFormat::Wav)
            .await
            .unwrap()
            .unwrap();

        assert_eq!(asset.data(), &[1, 2, 3]);
        assert_eq!(asset.asset_type, AssetType::Sound);
        assert_eq!(asset.data_format, DataFormat::Wav);
        assert_eq!(fetcher.requests()[0].url, "medialibraries/abc123.wav");
    }

    #[tokio::test]
    async fn test_status_zero_is_success() {
        let fetcher = Arc::new(
            MemoryFetcher::new().with_response("medialibraries/a.wav", 0, vec![9; 16]),
        );
        let loader = sound_loader(fetcher);

        let asset = loader.load_asset(AssetType::Sound, "a", DataFormat::Wav).await.unwrap();
        assert_eq!(asset.unwrap().data().len(), 16);
    }

    #[tokio::test]
    async fn test_failing_status_is_error() {
        for status in [199u16, 300, 404, 500] {
            let fetcher = Arc::new(
                MemoryFetcher::new().with_response("medialibraries/a.wav", status, Vec::new()),
            );
            let loader = sound_loader(fetcher.clone());

            let err = loader.load_asset(AssetType::Sound, "a", DataFormat::Wav).await.unwrap_err();
            assert_eq!(err.status(), Some(status));
            assert_eq!(fetcher.request_count(), 1);
        }
    }

    #[tokio::test]
    async fn test_transport_error() {
        let loader = sound_loader(Arc::new(MemoryFetcher::new()));
        let err = loader.load_asset(AssetType::Sound, "gone", DataFormat::Wav).await.unwrap_err();

        match err {
            StorageError::Transport { url, .. } => assert_eq!(url, "medialibraries/gone.wav"),
            other => panic!("unexpected error: {}", other),
        }
    }

    #[test]
    fn test_base_dir_trailing_slash() {
        let loader = LocalHelper::new([AssetType::Sound], "media/", Arc::new(MemoryFetcher::new()));
        assert_eq!(loader.asset_path("x", DataFormat::Mp3), "media/x.mp3");
    }
}
