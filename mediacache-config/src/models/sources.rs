//! Raw file and environment inputs.

use std::{
    collections::HashMap,
    path::{Path, PathBuf},
};

use serde::{Deserialize, Serialize};

use crate::{constants::*, loader::error::ConfigLoadError, util::non_blank};

/// Raw configuration as defined in a TOML or JSON file.
#[derive(Debug, Default, Clone, Deserialize, Serialize)]
#[serde(rename_all = "snake_case")]
pub struct FileConfig {
    /// `[cache]` table.
    #[serde(default)]
    pub cache: FileCacheConfig,
    /// `[http]` table.
    #[serde(default)]
    pub http: FileHttpConfig,
}

/// `[cache]` table of a config file.
#[derive(Debug, Default, Clone, Deserialize, Serialize)]
pub struct FileCacheConfig {
    /// Storage root.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub root: Option<PathBuf>,
    /// Cache directory name under the root.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub directory_name: Option<String>,
    /// JPEG quality; clamped to 1..=100.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub jpeg_quality: Option<u32>,
    /// Coalesce concurrent misses.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub coalesce_in_flight: Option<bool>,
}

/// `[http]` table of a config file.
#[derive(Debug, Default, Clone, Deserialize, Serialize)]
pub struct FileHttpConfig {
    /// Human-readable duration such as `"30s"` or `"1m 30s"`.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub request_timeout: Option<String>,
    /// `User-Agent` header value.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub user_agent: Option<String>,
}

impl FileConfig {
    /// Read `path` as TOML or JSON, chosen by extension.
    pub fn load(path: &Path) -> Result<Self, ConfigLoadError> {
        let contents = std::fs::read_to_string(path).map_err(|source| {
            ConfigLoadError::ReadFile {
                path: path.to_path_buf(),
                source,
            }
        })?;

        let parsed = match path.extension().and_then(|ext| ext.to_str()) {
            Some("json") => {
                serde_json::from_str(&contents).map_err(|e| e.to_string())
            }
            Some("toml") => {
                toml::from_str(&contents).map_err(|e| e.to_string())
            }
            _ => Self::parse_from_str(&contents),
        };

        parsed.map_err(|message| ConfigLoadError::ParseFile {
            path: path.to_path_buf(),
            message,
        })
    }

    /// Try TOML first, then JSON.
    pub fn parse_from_str(contents: &str) -> Result<Self, String> {
        toml::from_str(contents).or_else(|toml_err| {
            serde_json::from_str(contents).map_err(|json_err| {
                format!("toml error: {toml_err}; json error: {json_err}")
            })
        })
    }
}

/// Raw `MEDIA_CACHE_*` values. Blank values count as unset.
///
/// Values stay unparsed so the loader can report bad ones as warnings.
#[derive(Debug, Default, Clone)]
pub struct EnvConfig {
    /// `MEDIA_CACHE_CONFIG_PATH`
    pub config_path: Option<PathBuf>,
    /// `MEDIA_CACHE_ROOT`
    pub root: Option<PathBuf>,
    /// `MEDIA_CACHE_DIR_NAME`
    pub directory_name: Option<String>,
    /// `MEDIA_CACHE_JPEG_QUALITY`
    pub jpeg_quality: Option<String>,
    /// `MEDIA_CACHE_REQUEST_TIMEOUT`
    pub request_timeout: Option<String>,
    /// `MEDIA_CACHE_USER_AGENT`
    pub user_agent: Option<String>,
    /// `MEDIA_CACHE_COALESCE`
    pub coalesce: Option<String>,
}

impl EnvConfig {
    /// Read the process environment.
    pub fn from_env() -> Self {
        Self::from_lookup(|name| std::env::var(name).ok())
    }

    /// Read from explicit name/value pairs.
    pub fn from_pairs<I, K, V>(pairs: I) -> Self
    where
        I: IntoIterator<Item = (K, V)>,
        K: Into<String>,
        V: Into<String>,
    {
        let vars: HashMap<String, String> = pairs
            .into_iter()
            .map(|(k, v)| (k.into(), v.into()))
            .collect();
        Self::from_lookup(|name| vars.get(name).cloned())
    }

    fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Self {
        let var = |name: &str| lookup(name).as_deref().and_then(non_blank);
        Self {
            config_path: var(ENV_CONFIG_PATH).map(PathBuf::from),
            root: var(ENV_ROOT).map(PathBuf::from),
            directory_name: var(ENV_DIR_NAME),
            jpeg_quality: var(ENV_JPEG_QUALITY),
            request_timeout: var(ENV_REQUEST_TIMEOUT),
            user_agent: var(ENV_USER_AGENT),
            coalesce: var(ENV_COALESCE),
        }
    }

    /// Fill unset values from `fallback`.
    pub fn or(self, fallback: EnvConfig) -> Self {
        Self {
            config_path: self.config_path.or(fallback.config_path),
            root: self.root.or(fallback.root),
            directory_name: self.directory_name.or(fallback.directory_name),
            jpeg_quality: self.jpeg_quality.or(fallback.jpeg_quality),
            request_timeout: self.request_timeout.or(fallback.request_timeout),
            user_agent: self.user_agent.or(fallback.user_agent),
            coalesce: self.coalesce.or(fallback.coalesce),
        }
    }
}
