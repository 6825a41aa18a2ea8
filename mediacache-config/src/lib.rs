//! Configuration for the media cache.
//!
//! Settings are composed from built-in defaults, an optional TOML or JSON
//! file, and `MEDIA_CACHE_*` environment variables (a `.env` file counts as
//! environment), in increasing order of precedence. The result converts into
//! [`mediacache_core::CacheSettings`].

pub mod constants;
pub mod loader;
pub mod logging;
pub mod models;
pub mod util;
pub mod validation;

pub use loader::{
    ConfigLoad, ConfigLoader, error::ConfigLoadError, load_settings,
};
pub use logging::init_tracing;
pub use models::{
    ConfigMetadata, MediaCacheConfig,
    sources::{EnvConfig, FileCacheConfig, FileConfig, FileHttpConfig},
};
pub use validation::{ConfigWarning, ConfigWarnings};
