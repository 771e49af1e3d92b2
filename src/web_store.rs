//! Web stores: per-type endpoints for getting, creating and updating assets

use crate::asset::{Asset, AssetType, DataFormat};
use crate::engine::Helper;
use crate::error::{Result, StorageError};
use crate::fetch::{Fetcher, Method, Request};
use futures::future::BoxFuture;
use futures::FutureExt;
use parking_lot::RwLock;
use serde::{Deserialize, Serialize};
use std::sync::Arc;

/// Identifies the asset a store URL is built for
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AssetLocator {
    pub asset_type: AssetType,
    pub asset_id: Option<String>,
    pub data_format: DataFormat,
}

impl AssetLocator {
    pub fn new(asset_type: AssetType, asset_id: Option<&str>, data_format: DataFormat) -> Self {
        Self {
            asset_type,
            asset_id: asset_id.map(str::to_string),
            data_format,
        }
    }

    /// Id, or an empty string for assets not yet stored
    pub fn id(&self) -> &str {
        self.asset_id.as_deref().unwrap_or("")
    }
}

impl From<&Asset> for AssetLocator {
    fn from(asset: &Asset) -> Self {
        Self {
            asset_type: asset.asset_type,
            asset_id: asset.asset_id.clone(),
            data_format: asset.data_format,
        }
    }
}

/// Method, URL and credential mode of a store request
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RequestConfig {
    pub method: Method,
    pub url: String,
    #[serde(default)]
    pub with_credentials: bool,
}

impl RequestConfig {
    pub fn new(method: Method, url: impl Into<String>) -> Self {
        Self {
            method,
            url: url.into(),
            with_credentials: false,
        }
    }

    pub fn with_credentials(mut self) -> Self {
        self.with_credentials = true;
        self
    }
}

pub type GetUrlFn = Arc<dyn Fn(&AssetLocator) -> String + Send + Sync>;
pub type RequestConfigFn = Arc<dyn Fn(&AssetLocator) -> RequestConfig + Send + Sync>;

/// Endpoint configuration for a set of asset types
#[derive(Clone)]
pub struct WebStore {
    types: Vec<AssetType>,
    get: GetUrlFn,
    create: Option<RequestConfigFn>,
    update: Option<RequestConfigFn>,
}

impl WebStore {
    /// Read-only store
    pub fn new<F>(types: impl IntoIterator<Item = AssetType>, get: F) -> Self
    where
        F: Fn(&AssetLocator) -> String + Send + Sync + 'static,
    {
        Self {
            types: types.into_iter().collect(),
            get: Arc::new(get),
            create: None,
            update: None,
        }
    }

    pub fn with_create<F>(mut self, create: F) -> Self
    where
        F: Fn(&AssetLocator) -> RequestConfig + Send + Sync + 'static,
    {
        self.create = Some(Arc::new(create));
        self
    }

    pub fn with_update<F>(mut self, update: F) -> Self
    where
        F: Fn(&AssetLocator) -> RequestConfig + Send + Sync + 'static,
    {
        self.update = Some(Arc::new(update));
        self
    }

    pub fn handles(&self, asset_type: AssetType) -> bool {
        self.types.contains(&asset_type)
    }

    pub fn types(&self) -> &[AssetType] {
        &self.types
    }

    /// URL used to get an asset
    pub fn get_url(&self, locator: &AssetLocator) -> String {
        (self.get)(locator)
    }

    /// Create config for assets without an id, update config otherwise
    pub fn save_config(&self, locator: &AssetLocator) -> Option<RequestConfig> {
        let builder = if locator.asset_id.is_none() {
            self.create.as_ref()
        } else {
            self.update.as_ref()
        }?;
        Some(builder(locator))
    }
}

#[derive(Debug, Default, Deserialize)]
struct StoreReply {
    id: Option<String>,
    #[serde(rename = "content-name")]
    content_name: Option<String>,
}

/// Helper that gets assets from web stores
pub struct WebHelper {
    fetcher: Arc<dyn Fetcher>,
    stores: RwLock<Vec<Arc<WebStore>>>,
}

impl WebHelper {
    pub fn new(fetcher: Arc<dyn Fetcher>) -> Self {
        Self {
            fetcher,
            stores: RwLock::new(Vec::new()),
        }
    }

    /// Register a store; earlier stores are tried first
    pub fn add_store(&self, store: WebStore) {
        self.stores.write().push(Arc::new(store));
    }

    pub fn store_count(&self) -> usize {
        self.stores.read().len()
    }

    fn stores_for(&self, asset_type: AssetType) -> Vec<Arc<WebStore>> {
        self.stores
            .read()
            .iter()
            .filter(|store| store.handles(asset_type))
            .cloned()
            .collect()
    }

    /// URLs that would be tried, in order, to get an asset
    pub fn get_urls(&self, locator: &AssetLocator) -> Vec<String> {
        self.stores_for(locator.asset_type)
            .iter()
            .map(|store| store.get_url(locator))
            .collect()
    }

    /// Get an asset from the first store that answers successfully
    pub async fn load_asset(
        &self,
        asset_type: AssetType,
        asset_id: &str,
        data_format: DataFormat,
    ) -> Result<Option<Asset>> {
        let locator = AssetLocator::new(asset_type, Some(asset_id), data_format);
        let mut last_error = None;

        for store in self.stores_for(asset_type) {
            let url = store.get_url(&locator);
            match self.fetcher.fetch(Request::get(url.clone())).await {
                Ok(response) if response.is_success() => {
                    return Ok(Some(Asset::new(
                        asset_type,
                        Some(asset_id.to_string()),
                        data_format,
                        response.body,
                    )));
                }
                Ok(response) => {
                    log::debug!("Store {} answered {}", url, response.status);
                    last_error = Some(StorageError::LoadFailed {
                        status: response.status,
                        url,
                    });
                }
                Err(cause) => {
                    log::debug!("Store {} unreachable: {}", url, cause);
                    last_error = Some(StorageError::Transport { url, cause });
                }
            }
        }

        match last_error {
            Some(e) => Err(e),
            None => Ok(None),
        }
    }

    /// Create or update an asset, returning its id.
    /// Immutable assets are addressed by id, so they must carry one.
    pub async fn store(&self, asset: &Asset) -> Result<String> {
        if asset.asset_type.is_immutable() && asset.asset_id.is_none() {
            return Err(StorageError::UnidentifiedAsset {
                asset_type: asset.asset_type,
            });
        }

        let locator = AssetLocator::from(asset);
        let config = self
            .stores_for(asset.asset_type)
            .iter()
            .find_map(|store| store.save_config(&locator))
            .ok_or(StorageError::NoStore {
                asset_type: asset.asset_type,
            })?;

        let request = Request {
            method: config.method,
            url: config.url.clone(),
            body: None,
            with_credentials: config.with_credentials,
        }
        .with_body(asset.data().to_vec());
        let url = config.url;

        let response = self
            .fetcher
            .fetch(request)
            .await
            .map_err(|cause| StorageError::Transport {
                url: url.clone(),
                cause,
            })?;

        if !response.is_success() {
            return Err(StorageError::StoreFailed {
                status: response.status,
                url,
            });
        }

        let reply: StoreReply = if response.body.is_empty() {
            StoreReply::default()
        } else {
            serde_json::from_slice(&response.body)?
        };

        reply
            .id
            .or(reply.content_name)
            .or_else(|| asset.asset_id.clone())
            .ok_or(StorageError::MissingId { url })
    }
}

impl Helper for WebHelper {
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

    fn sound_store(prefix: &'static str) -> WebStore {
        WebStore::new([AssetType::Sound], move |loc: &AssetLocator| {
            format!("{}/{}.{}", prefix, loc.id(), loc.data_format)
        })
    }

    #[tokio::test]
    async fn test_no_store_for_type() {
        let fetcher = Arc::new(MemoryFetcher::new());
        let helper = WebHelper::new(fetcher.clone());
        helper.add_store(sound_store("a"));

        let asset = helper.load_asset(AssetType::Project, "1", DataFormat::Json).await.unwrap();
        assert!(asset.is_none());
        assert_eq!(fetcher.request_count(), 0);
    }

    #[tokio::test]
    async fn test_falls_through_failed_store() {
        let fetcher = Arc::new(
            MemoryFetcher::new()
                .with_response("a/x.wav", 404, Vec::new())
                .with_response("b/x.wav", 200, b"riff".to_vec()),
        );
        let helper = WebHelper::new(fetcher.clone());
        helper.add_store(sound_store("a"));
        helper.add_store(sound_store("b"));

        let asset = helper.load_asset(AssetType::Sound, "x", DataFormat::Wav).await.unwrap();
        assert_eq!(asset.unwrap().data(), b"riff");
        assert_eq!(fetcher.request_count(), 2);
    }

    #[tokio::test]
    async fn test_all_stores_fail() {
        let fetcher = Arc::new(MemoryFetcher::new().with_response("a/x.wav", 503, Vec::new()));
        let helper = WebHelper::new(fetcher);
        helper.add_store(sound_store("b"));
        helper.add_store(sound_store("a"));

        let err = helper.load_asset(AssetType::Sound, "x", DataFormat::Wav).await.unwrap_err();
        assert_eq!(err.status(), Some(503));
    }

    #[tokio::test]
    async fn test_store_uses_create_then_update() {
        let fetcher = Arc::new(
            MemoryFetcher::new()
                .with_response("p/", 200, br#"{"content-name":"42"}"#.to_vec())
                .with_response("p/42", 200, Vec::new()),
        );
        let helper = WebHelper::new(fetcher.clone());
        helper.add_store(
            WebStore::new([AssetType::Project], |loc: &AssetLocator| format!("p/{}", loc.id()))
                .with_create(|_: &AssetLocator| RequestConfig::new(Method::Post, "p/"))
                .with_update(|loc: &AssetLocator| {
                    RequestConfig::new(Method::Put, format!("p/{}", loc.id())).with_credentials()
                }),
        );

        let mut project = Asset::new(AssetType::Project, None, DataFormat::Json, b"{}".to_vec());
        let id = helper.store(&project).await.unwrap();
        assert_eq!(id, "42");

        project.asset_id = Some(id);
        assert_eq!(helper.store(&project).await.unwrap(), "42");

        let requests = fetcher.requests();
        assert_eq!(requests[0].method, Method::Post);
        assert_eq!(requests[1].method, Method::Put);
        assert!(requests[1].with_credentials);
        assert_eq!(requests[1].body.as_deref(), Some(&b"{}"[..]));
    }

    #[tokio::test]
    async fn test_store_without_config() {
        let helper = WebHelper::new(Arc::new(MemoryFetcher::new()));
        helper.add_store(sound_store("a"));

        let sound = Asset::new(AssetType::Sound, Some("s".to_string()), DataFormat::Wav, vec![0]);
        let err = helper.store(&sound).await.unwrap_err();
        assert!(matches!(err, StorageError::NoStore { asset_type: AssetType::Sound }));
    }

    #[tokio::test]
    async fn test_immutable_asset_without_id_rejected() {
        let fetcher = Arc::new(MemoryFetcher::new());
        let helper = WebHelper::new(fetcher.clone());
        helper.add_store(
            sound_store("a").with_create(|loc: &AssetLocator| {
                RequestConfig::new(Method::Post, format!("a/{}.{}", loc.id(), loc.data_format))
            }),
        );

        let sound = Asset::new(AssetType::Sound, None, DataFormat::Wav, vec![1, 2, 3]);
        let err = helper.store(&sound).await.unwrap_err();

        assert!(matches!(err, StorageError::UnidentifiedAsset { asset_type: AssetType::Sound }));
        assert_eq!(fetcher.request_count(), 0);
    }
}
