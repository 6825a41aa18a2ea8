//! Effective configuration and its raw sources.

pub mod sources;

use std::{
    path::{Path, PathBuf},
    time::Duration,
};

use mediacache_core::CacheSettings;

/// Effective configuration after defaults, file, and environment are merged.
#[derive(Debug, Clone)]
pub struct MediaCacheConfig {
    /// Private persistent storage root; the cache directory lives under it.
    pub storage_root: PathBuf,
    /// Single path segment naming the cache directory.
    pub directory_name: String,
    /// JPEG quality for stored files, 1..=100.
    pub jpeg_quality: u8,
    /// Timeout for each network transfer.
    pub request_timeout: Duration,
    /// `User-Agent` header value.
    pub user_agent: String,
    /// Share one transfer between concurrent misses for a key.
    pub coalesce_in_flight: bool,
    /// Sources the values came from.
    pub metadata: ConfigMetadata,
}

impl MediaCacheConfig {
    /// `storage_root/directory_name`.
    pub fn cache_dir(&self) -> PathBuf {
        self.storage_root.join(&self.directory_name)
    }

    /// Storage root the cache directory lives under.
    pub fn storage_root(&self) -> &Path {
        &self.storage_root
    }

    /// Settings for
    /// [`ImageFetcher::open`](mediacache_core::ImageFetcher::open).
    pub fn cache_settings(&self) -> CacheSettings {
        CacheSettings {
            cache_dir: self.cache_dir(),
            jpeg_quality: self.jpeg_quality,
            request_timeout: self.request_timeout,
            user_agent: self.user_agent.clone(),
            coalesce_in_flight: self.coalesce_in_flight,
        }
    }
}

/// Where the effective values came from.
#[derive(Debug, Clone, Default)]
pub struct ConfigMetadata {
    /// Config file that was read, if any.
    pub config_path: Option<PathBuf>,
    /// `.env` file that was read, if any.
    pub env_file: Option<PathBuf>,
}
