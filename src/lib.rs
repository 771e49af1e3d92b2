//! # media_storage
//!
//! Asset storage for a block-based editor front end.
//!
//! Assets are loaded through an ordered chain of helpers: a built-in store
//! holding the default project, a local loader for bundled media and the
//! official web stores. A small query parser turns the `tutorial` URL
//! parameter into dispatch calls.
//!
//! ## Example
//!
//! ```rust,no_run
//! use media_storage::prelude::*;
//! use std::sync::Arc;
//!
//! # async fn run() -> Result<()> {
//! let fetcher = Arc::new(FileFetcher::new("./public"));
//! let mut storage = Storage::new(StorageConfig::default(), fetcher);
//! storage.add_local_web_stores();
//!
//! if let Some(sound) = storage.load(AssetType::Sound, "83a9787d4cb6f3b7632b4ddfebf74367", DataFormat::Wav).await? {
//!     println!("{}", sound.encode_data_uri(None).len());
//! }
//! # Ok(())
//! # }
//! ```

pub mod asset;
pub mod config;
pub mod engine;
pub mod error;
pub mod fetch;
pub mod local;
pub mod query;
pub mod storage;
pub mod web_store;

pub mod prelude {
    //! Commonly used types and traits
    pub use crate::asset::{Asset, AssetType, DataFormat};
    pub use crate::config::StorageConfig;
    pub use crate::engine::{AssetEngine, BundledAsset, Helper};
    pub use crate::error::{Result, StorageError};
    pub use crate::fetch::{FileFetcher, Fetcher, MemoryFetcher};
    #[cfg(feature = "http")]
    pub use crate::fetch::HttpFetcher;
    pub use crate::local::LocalHelper;
    pub use crate::query::{QueryParser, TutorialDispatch, TutorialRequest};
    pub use crate::storage::{Storage, Translator};
}
