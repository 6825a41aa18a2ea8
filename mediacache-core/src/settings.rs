//! Settings an [`ImageFetcher`](crate::ImageFetcher) is opened with.

use std::{path::PathBuf, time::Duration};

use crate::infra::cache::MAX_JPEG_QUALITY;

/// Name of the cache directory under the storage root.
pub const DEFAULT_DIRECTORY_NAME: &str = "media";

/// Per-transfer timeout.
pub const DEFAULT_REQUEST_TIMEOUT: Duration = Duration::from_secs(30);

/// `User-Agent` sent with every transfer.
pub const DEFAULT_USER_AGENT: &str =
    concat!("mediacache/", env!("CARGO_PKG_VERSION"));

/// Everything an [`ImageFetcher`](crate::ImageFetcher) needs to be opened.
#[derive(Debug, Clone)]
pub struct CacheSettings {
    /// Directory holding the cached files. Created when the fetcher opens.
    pub cache_dir: PathBuf,
    /// JPEG quality used for stored files (1..=100).
    pub jpeg_quality: u8,
    /// Timeout for each network transfer.
    pub request_timeout: Duration,
    /// `User-Agent` header value.
    pub user_agent: String,
    /// Let concurrent misses for one key share a single transfer.
    pub coalesce_in_flight: bool,
}

impl CacheSettings {
    /// Defaults for everything but the directory.
    pub fn new(cache_dir: PathBuf) -> Self {
        Self {
            cache_dir,
            jpeg_quality: MAX_JPEG_QUALITY,
            request_timeout: DEFAULT_REQUEST_TIMEOUT,
            user_agent: DEFAULT_USER_AGENT.to_string(),
            coalesce_in_flight: false,
        }
    }

    /// Platform data directory, e.g. `~/.local/share/mediacache` on Linux.
    pub fn default_storage_root() -> Option<PathBuf> {
        dirs::data_dir().map(|dir| dir.join("mediacache"))
    }
}

impl Default for CacheSettings {
    fn default() -> Self {
        let root = Self::default_storage_root()
            .unwrap_or_else(|| std::env::temp_dir().join("mediacache"));
        Self::new(root.join(DEFAULT_DIRECTORY_NAME))
    }
}
