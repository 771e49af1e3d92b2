//! Storage facade
//!
//! Composes the asset engine with the stores this application uses: the
//! official project and asset hosts, bundled music extension sounds, the local
//! media directory and a built-in copy of the default project.

use crate::asset::{Asset, AssetType, DataFormat};
use crate::config::StorageConfig;
use crate::engine::{
    AssetEngine, BuiltinHelper, BundledAsset, BUILTIN_PRIORITY, DEFAULT_PRIORITY, WEB_PRIORITY,
};
use crate::error::Result;
use crate::fetch::{Fetcher, Method};
use crate::local::LocalHelper;
use crate::web_store::{AssetLocator, RequestConfig, WebHelper, WebStore};
use std::sync::Arc;

/// Path prefix of sounds bundled with the music extension
pub const MUSIC_EXTENSION_DIR: &str = "static/extension-assets/scratch3_music";

/// Translates a message id, falling back to the given default text
pub type Translator = Arc<dyn Fn(&str, &str) -> String + Send + Sync>;

/// Produces the assets of the default project
pub type DefaultProjectFn = Arc<dyn Fn(Option<&Translator>) -> Vec<BundledAsset> + Send + Sync>;

fn project_get_url(host: &str, asset_id: &str) -> String {
    format!("{}/{}", host, asset_id)
}

fn project_create_request(host: &str) -> RequestConfig {
    RequestConfig::new(Method::Post, format!("{}/", host)).with_credentials()
}

fn project_update_request(host: &str, asset_id: &str) -> RequestConfig {
    RequestConfig::new(Method::Put, format!("{}/{}", host, asset_id)).with_credentials()
}

fn asset_get_url(host: &str, asset_id: &str, data_format: DataFormat) -> String {
    format!(
        "{}/internalapi/asset/{}.{}/get/",
        host,
        asset_id,
        data_format.extension()
    )
}

// The asset host takes the id as part of the create URI and has no update,
// so saves always POST, even for assets that already carry an id.
fn asset_create_request(host: &str, asset_id: &str, data_format: DataFormat) -> RequestConfig {
    RequestConfig::new(
        Method::Post,
        format!("{}/{}.{}", host, asset_id, data_format.extension()),
    )
    .with_credentials()
}

/// Asset storage for the editor
pub struct Storage {
    config: StorageConfig,
    engine: AssetEngine,
    builtin: Arc<BuiltinHelper>,
    web: Arc<WebHelper>,
    local: Arc<LocalHelper>,
    official_stores_added: bool,
    local_stores_added: bool,
    translator: Option<Translator>,
    default_project: Option<DefaultProjectFn>,
}

impl Storage {
    /// Create storage with the built-in and web helpers registered.
    /// Stores are added separately with [`Storage::add_official_web_stores`]
    /// and [`Storage::add_local_web_stores`].
    pub fn new(config: StorageConfig, fetcher: Arc<dyn Fetcher>) -> Self {
        let builtin = Arc::new(BuiltinHelper::new());
        let web = Arc::new(WebHelper::new(fetcher.clone()));
        let local = Arc::new(LocalHelper::new(
            config.local_types.iter().copied(),
            config.media_dir.clone(),
            fetcher,
        ));

        let mut engine = AssetEngine::new();
        engine.add_helper(builtin.clone(), BUILTIN_PRIORITY);
        engine.add_helper(web.clone(), WEB_PRIORITY);

        let storage = Self {
            config,
            engine,
            builtin,
            web,
            local,
            official_stores_added: false,
            local_stores_added: false,
            translator: None,
            default_project: None,
        };
        storage.cache_default_project();
        storage
    }

    pub fn config(&self) -> &StorageConfig {
        &self.config
    }

    pub fn builtin(&self) -> &BuiltinHelper {
        &self.builtin
    }

    pub fn local(&self) -> &LocalHelper {
        &self.local
    }

    pub fn web(&self) -> &WebHelper {
        &self.web
    }

    /// Register the project host, the asset host and the music extension sounds
    pub fn add_official_web_stores(&mut self) {
        if self.official_stores_added {
            log::debug!("Official web stores already registered");
            return;
        }

        let project_host = self.config.project_host.clone();
        let (get_host, create_host, update_host) =
            (project_host.clone(), project_host.clone(), project_host);
        self.web.add_store(
            WebStore::new([AssetType::Project], move |loc: &AssetLocator| {
                project_get_url(&get_host, loc.id())
            })
            .with_create(move |_: &AssetLocator| project_create_request(&create_host))
            .with_update(move |loc: &AssetLocator| project_update_request(&update_host, loc.id())),
        );

        let asset_host = self.config.asset_host.clone();
        let (get_host, create_host, update_host) =
            (asset_host.clone(), asset_host.clone(), asset_host);
        self.web.add_store(
            WebStore::new(
                [AssetType::ImageVector, AssetType::ImageBitmap, AssetType::Sound],
                move |loc: &AssetLocator| asset_get_url(&get_host, loc.id(), loc.data_format),
            )
            .with_create(move |loc: &AssetLocator| {
                asset_create_request(&create_host, loc.id(), loc.data_format)
            })
            .with_update(move |loc: &AssetLocator| {
                asset_create_request(&update_host, loc.id(), loc.data_format)
            }),
        );

        self.web.add_store(WebStore::new([AssetType::Sound], |loc: &AssetLocator| {
            format!("{}/{}.{}", MUSIC_EXTENSION_DIR, loc.id(), loc.data_format.extension())
        }));

        self.official_stores_added = true;
        log::info!(
            "Registered web stores for {} and {}",
            self.config.project_host,
            self.config.asset_host
        );
    }

    /// Register the local media loader
    pub fn add_local_web_stores(&mut self) {
        if self.local_stores_added {
            log::debug!("Local media loader already registered");
            return;
        }
        self.engine.add_helper(self.local.clone(), DEFAULT_PRIORITY);
        self.local_stores_added = true;
        log::info!("Registered local media loader for {}", self.local.base_dir());
    }

    pub fn project_get_config(&self, asset_id: &str) -> String {
        project_get_url(&self.config.project_host, asset_id)
    }

    pub fn project_create_config(&self) -> RequestConfig {
        project_create_request(&self.config.project_host)
    }

    pub fn project_update_config(&self, asset_id: &str) -> RequestConfig {
        project_update_request(&self.config.project_host, asset_id)
    }

    pub fn asset_get_config(&self, asset_id: &str, data_format: DataFormat) -> String {
        asset_get_url(&self.config.asset_host, asset_id, data_format)
    }

    pub fn asset_create_config(&self, asset_id: &str, data_format: DataFormat) -> RequestConfig {
        asset_create_request(&self.config.asset_host, asset_id, data_format)
    }

    /// Install a translator and rebuild the cached default project with it
    pub fn set_translator(&mut self, translator: Translator) {
        self.translator = Some(translator);
        self.cache_default_project();
    }

    /// Install the default project provider and cache its assets
    pub fn set_default_project(&mut self, provider: DefaultProjectFn) {
        self.default_project = Some(provider);
        self.cache_default_project();
    }

    /// Place every default project asset in the built-in store.
    /// Returns the number of assets stored.
    pub fn cache_default_project(&self) -> usize {
        let Some(provider) = &self.default_project else {
            return 0;
        };

        let assets = provider(self.translator.as_ref());
        let count = assets.len();
        for asset in assets {
            self.builtin
                .store(asset.asset_type, asset.data_format, asset.data, asset.id);
        }
        log::debug!("Cached {} default project assets", count);
        count
    }

    /// Load an asset from the first helper that has it
    pub async fn load(
        &self,
        asset_type: AssetType,
        asset_id: &str,
        data_format: DataFormat,
    ) -> Result<Option<Asset>> {
        self.engine.load(asset_type, asset_id, data_format).await
    }

    /// Save an asset to its web store, returning the stored id
    pub async fn store(&self, asset: &Asset) -> Result<String> {
        self.web.store(asset).await
    }

    /// URLs the web stores would try for an asset
    pub fn web_urls(&self, asset_type: AssetType, asset_id: &str, data_format: DataFormat) -> Vec<String> {
        self.web
            .get_urls(&AssetLocator::new(asset_type, Some(asset_id), data_format))
    }
}
