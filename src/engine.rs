//! Asset engine: an ordered chain of load helpers
//!
//! Helpers are consulted in priority order. A helper that does not know an
//! asset answers `Ok(None)` and the next one is tried.

use crate::asset::{Asset, AssetType, DataFormat};
use crate::error::Result;
use futures::future::BoxFuture;
use futures::FutureExt;
use hashbrown::HashMap;
use parking_lot::RwLock;
use std::sync::Arc;

/// Priority of the built-in store
pub const BUILTIN_PRIORITY: i32 = 100;
/// Priority of the web-store helper
pub const WEB_PRIORITY: i32 = -100;
/// Priority used by [`AssetEngine::add_helper`] callers with no preference
pub const DEFAULT_PRIORITY: i32 = 0;

/// A load strategy consulted by the engine
pub trait Helper: Send + Sync {
    /// Load an asset.
    /// Returns `Ok(None)` if this helper does not provide it, allowing checking other helpers.
    fn load<'a>(
        &'a self,
        asset_type: AssetType,
        asset_id: &'a str,
        data_format: DataFormat,
    ) -> BoxFuture<'a, Result<Option<Asset>>>;
}

struct HelperEntry {
    helper: Arc<dyn Helper>,
    priority: i32,
}

/// Ordered helper chain
#[derive(Default)]
pub struct AssetEngine {
    helpers: Vec<HelperEntry>,
}

impl AssetEngine {
    /// Create an engine with no helpers
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a helper. Higher priorities are consulted first; equal
    /// priorities keep registration order.
    pub fn add_helper(&mut self, helper: Arc<dyn Helper>, priority: i32) {
        let index = self
            .helpers
            .iter()
            .position(|entry| entry.priority < priority)
            .unwrap_or(self.helpers.len());
        self.helpers.insert(index, HelperEntry { helper, priority });
    }

    pub fn helper_count(&self) -> usize {
        self.helpers.len()
    }

    /// Load an asset from the first helper that has it
    pub async fn load(
        &self,
        asset_type: AssetType,
        asset_id: &str,
        data_format: DataFormat,
    ) -> Result<Option<Asset>> {
        let mut last_error = None;

        for (index, entry) in self.helpers.iter().enumerate() {
            match entry.helper.load(asset_type, asset_id, data_format).await {
                Ok(Some(asset)) => return Ok(Some(asset)),
                Ok(None) => {
                    log::debug!("Helper {} has no {} {}, trying next", index, asset_type, asset_id);
                }
                Err(e) => {
                    log::warn!("Helper {} failed to load {} {}: {}", index, asset_type, asset_id, e);
                    last_error = Some(e);
                }
            }
        }

        match last_error {
            Some(e) => Err(e),
            None => Ok(None),
        }
    }
}

/// Id derived from the payload: equal bytes always map to the same id
pub fn content_id(data: &[u8]) -> String {
    uuid::Uuid::new_v5(&uuid::Uuid::NAMESPACE_OID, data)
        .simple()
        .to_string()
}

/// A bundled asset to be placed in the built-in store
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BundledAsset {
    pub asset_type: AssetType,
    pub data_format: DataFormat,
    pub id: Option<String>,
    pub data: Vec<u8>,
}

#[derive(Clone)]
struct BuiltinEntry {
    data_format: DataFormat,
    data: Arc<[u8]>,
}

/// In-memory store for assets shipped with the application
#[derive(Default)]
pub struct BuiltinHelper {
    assets: RwLock<HashMap<(AssetType, String), BuiltinEntry>>,
}

impl BuiltinHelper {
    pub fn new() -> Self {
        Self::default()
    }

    /// Store an asset, replacing any previous entry with the same type and id.
    /// Returns the id; assets without one are keyed by [`content_id`].
    pub fn store(
        &self,
        asset_type: AssetType,
        data_format: DataFormat,
        data: Vec<u8>,
        id: Option<String>,
    ) -> String {
        let id = id.unwrap_or_else(|| content_id(&data));
        let entry = BuiltinEntry {
            data_format,
            data: data.into(),
        };
        self.assets.write().insert((asset_type, id.clone()), entry);
        id
    }

    /// Copy of a stored asset
    pub fn get(&self, asset_type: AssetType, id: &str) -> Option<Asset> {
        let assets = self.assets.read();
        let entry = assets.get(&(asset_type, id.to_string()))?;
        Some(Asset::new(
            asset_type,
            Some(id.to_string()),
            entry.data_format,
            entry.data.to_vec(),
        ))
    }

    pub fn contains(&self, asset_type: AssetType, id: &str) -> bool {
        self.assets.read().contains_key(&(asset_type, id.to_string()))
    }

    pub fn len(&self) -> usize {
        self.assets.read().len()
    }

    pub fn is_empty(&self) -> bool {
        self.assets.read().is_empty()
    }
}

impl Helper for BuiltinHelper {
    fn load<'a>(
        &'a self,
        asset_type: AssetType,
        asset_id: &'a str,
        _data_format: DataFormat,
    ) -> BoxFuture<'a, Result<Option<Asset>>> {
        futures::future::ready(Ok(self.get(asset_type, asset_id))).boxed()
    }
}

/// Helper that always fails; handy when exercising fallthrough
#[cfg(test)]
pub(crate) struct FailingHelper(pub u16);

#[cfg(test)]
impl Helper for FailingHelper {
    fn load<'a>(
        &'a self,
        _asset_type: AssetType,
        asset_id: &'a str,
        _data_format: DataFormat,
    ) -> BoxFuture<'a, Result<Option<Asset>>> {
        futures::future::ready(Err(crate::error::StorageError::LoadFailed {
            status: self.0,
            url: asset_id.to_string(),
        }))
        .boxed()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn builtin_with(id: &str, data: &[u8]) -> Arc<BuiltinHelper> {
        let helper = Arc::new(BuiltinHelper::new());
        helper.store(AssetType::Sound, DataFormat::Wav, data.to_vec(), Some(id.to_string()));
        helper
    }

    #[tokio::test]
    async fn test_empty_engine_resolves_none() {
        let engine = AssetEngine::new();
        let asset = engine.load(AssetType::Sound, "x", DataFormat::Wav).await.unwrap();
        assert!(asset.is_none());
    }

    #[tokio::test]
    async fn test_priority_order() {
        let mut engine = AssetEngine::new();
        engine.add_helper(builtin_with("a", b"low"), DEFAULT_PRIORITY);
        engine.add_helper(builtin_with("a", b"high"), BUILTIN_PRIORITY);

        let asset = engine.load(AssetType::Sound, "a", DataFormat::Wav).await.unwrap().unwrap();
        assert_eq!(asset.data(), b"high");
    }

    #[tokio::test]
    async fn test_error_then_success() {
        let mut engine = AssetEngine::new();
        engine.add_helper(Arc::new(FailingHelper(500)), BUILTIN_PRIORITY);
        engine.add_helper(builtin_with("a", b"ok"), DEFAULT_PRIORITY);

        let asset = engine.load(AssetType::Sound, "a", DataFormat::Wav).await.unwrap();
        assert_eq!(asset.unwrap().data(), b"ok");
    }

    #[tokio::test]
    async fn test_last_error_returned_when_nothing_found() {
        let mut engine = AssetEngine::new();
        engine.add_helper(Arc::new(FailingHelper(500)), BUILTIN_PRIORITY);
        engine.add_helper(Arc::new(BuiltinHelper::new()), DEFAULT_PRIORITY);
        engine.add_helper(Arc::new(FailingHelper(404)), WEB_PRIORITY);

        let err = engine.load(AssetType::Sound, "a", DataFormat::Wav).await.unwrap_err();
        assert_eq!(err.status(), Some(404));
    }

    #[test]
    fn test_builtin_generates_ids() {
        let builtin = BuiltinHelper::new();
        let id = builtin.store(AssetType::Project, DataFormat::Json, b"{}".to_vec(), None);

        assert_eq!(id.len(), 32);
        assert_eq!(id, content_id(b"{}"));
        assert!(builtin.contains(AssetType::Project, &id));
        assert!(!builtin.contains(AssetType::Sprite, &id));
        assert_eq!(builtin.len(), 1);
    }

    #[test]
    fn test_builtin_same_bytes_replace_entry() {
        let builtin = BuiltinHelper::new();
        let first = builtin.store(AssetType::ImageVector, DataFormat::Svg, b"<svg/>".to_vec(), None);
        let second = builtin.store(AssetType::ImageVector, DataFormat::Svg, b"<svg/>".to_vec(), None);
        let other = builtin.store(AssetType::ImageVector, DataFormat::Svg, b"<svg></svg>".to_vec(), None);

        assert_eq!(first, second);
        assert_ne!(first, other);
        assert_eq!(builtin.len(), 2);
    }

    #[test]
    fn test_helper_count() {
        let mut engine = AssetEngine::new();
        assert_eq!(engine.helper_count(), 0);
        engine.add_helper(Arc::new(BuiltinHelper::new()), BUILTIN_PRIORITY);
        engine.add_helper(Arc::new(FailingHelper(500)), DEFAULT_PRIORITY);
        assert_eq!(engine.helper_count(), 2);
    }
}
