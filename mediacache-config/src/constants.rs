//! Environment variable names.

/// Config file path.
pub const ENV_CONFIG_PATH: &str = "MEDIA_CACHE_CONFIG_PATH";
/// Storage root the cache directory is created under.
pub const ENV_ROOT: &str = "MEDIA_CACHE_ROOT";
/// Cache directory name.
pub const ENV_DIR_NAME: &str = "MEDIA_CACHE_DIR_NAME";
/// JPEG quality, 1..=100.
pub const ENV_JPEG_QUALITY: &str = "MEDIA_CACHE_JPEG_QUALITY";
/// Transfer timeout, e.g. `15s`.
pub const ENV_REQUEST_TIMEOUT: &str = "MEDIA_CACHE_REQUEST_TIMEOUT";
/// `User-Agent` header value.
pub const ENV_USER_AGENT: &str = "MEDIA_CACHE_USER_AGENT";
/// Coalesce concurrent misses (1/0, true/false, yes/no, on/off).
pub const ENV_COALESCE: &str = "MEDIA_CACHE_COALESCE";

/// Config files picked up from the working directory when no path is given.
pub const DEFAULT_CONFIG_FILES: &[&str] = &[
    "mediacache.toml",
    "mediacache.json",
    "config/mediacache.toml",
    "config/mediacache.json",
];
