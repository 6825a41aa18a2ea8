//! Composition of defaults, config file, and environment.

pub mod error;

use std::{
    collections::HashMap,
    path::{Path, PathBuf},
    time::Duration,
};

use anyhow::Context;
use mediacache_core::{
    CacheSettings,
    settings::{
        DEFAULT_DIRECTORY_NAME, DEFAULT_REQUEST_TIMEOUT, DEFAULT_USER_AGENT,
    },
};
use tracing::{info, warn};

use crate::{
    constants::DEFAULT_CONFIG_FILES,
    models::{
        ConfigMetadata, MediaCacheConfig,
        sources::{EnvConfig, FileConfig},
    },
    util::parse_bool,
    validation::ConfigWarnings,
};

use self::error::ConfigLoadError;

const MIN_QUALITY: u8 = 1;
const MAX_QUALITY: u8 = 100;

/// A composed config plus everything that was adjusted on the way.
#[derive(Debug, Clone)]
pub struct ConfigLoad {
    /// The effective configuration.
    pub config: MediaCacheConfig,
    /// Values that were ignored or adjusted.
    pub warnings: ConfigWarnings,
}

/// Builder composing defaults, an optional config file, and the environment.
///
/// Without [`with_env`](Self::with_env) the process environment is read, and
/// a `.env` file in the working directory is used as a fallback for unset
/// variables. The process environment itself is never modified.
#[derive(Debug, Default, Clone)]
pub struct ConfigLoader {
    config_path: Option<PathBuf>,
    env_file: Option<PathBuf>,
    env: Option<EnvConfig>,
}

impl ConfigLoader {
    /// Loader reading the process environment.
    pub fn new() -> Self {
        Self::default()
    }

    /// Read this config file instead of searching the default locations.
    pub fn with_config_path(mut self, path: impl Into<PathBuf>) -> Self {
        self.config_path = Some(path.into());
        self
    }

    /// Use this `.env` file for unset variables.
    pub fn with_env_file(mut self, path: impl Into<PathBuf>) -> Self {
        self.env_file = Some(path.into());
        self
    }

    /// Use `env` instead of the process environment.
    pub fn with_env(mut self, env: EnvConfig) -> Self {
        self.env = Some(env);
        self
    }

    /// Compose the configuration.
    pub fn load(self) -> Result<ConfigLoad, ConfigLoadError> {
        let (env, env_file) = self.resolve_env()?;

        let config_path = self
            .config_path
            .clone()
            .or_else(|| env.config_path.clone())
            .or_else(find_default_file);
        let file = match &config_path {
            Some(path) => FileConfig::load(path)?,
            None => FileConfig::default(),
        };

        let metadata = ConfigMetadata {
            config_path,
            env_file,
        };
        compose(file, env, metadata)
    }

    fn resolve_env(
        &self,
    ) -> Result<(EnvConfig, Option<PathBuf>), ConfigLoadError> {
        let primary = match &self.env {
            Some(env) => env.clone(),
            None => EnvConfig::from_env(),
        };

        let env_file = match &self.env_file {
            Some(path) => Some(path.clone()),
            None if self.env.is_none() => {
                Some(PathBuf::from(".env")).filter(|p| p.is_file())
            }
            None => None,
        };

        match env_file {
            Some(path) => {
                let pairs = read_env_file(&path)?;
                Ok((primary.or(EnvConfig::from_pairs(pairs)), Some(path)))
            }
            None => Ok((primary, None)),
        }
    }
}

fn find_default_file() -> Option<PathBuf> {
    DEFAULT_CONFIG_FILES
        .iter()
        .map(PathBuf::from)
        .find(|path| path.is_file())
}

fn read_env_file(
    path: &Path,
) -> Result<HashMap<String, String>, ConfigLoadError> {
    let to_error = |source| ConfigLoadError::EnvFile {
        path: path.to_path_buf(),
        source,
    };

    let mut map = HashMap::new();
    for entry in dotenvy::from_path_iter(path).map_err(to_error)? {
        let (key, value) = entry.map_err(to_error)?;
        map.insert(key, value);
    }
    Ok(map)
}

fn compose(
    file: FileConfig,
    env: EnvConfig,
    metadata: ConfigMetadata,
) -> Result<ConfigLoad, ConfigLoadError> {
    let mut warnings = ConfigWarnings::default();

    let storage_root = env
        .root
        .or(file.cache.root)
        .or_else(CacheSettings::default_storage_root)
        .ok_or(ConfigLoadError::NoStorageRoot)?;

    let directory_name = env
        .directory_name
        .or(file.cache.directory_name)
        .unwrap_or_else(|| DEFAULT_DIRECTORY_NAME.to_string());
    if !is_plain_directory_name(&directory_name) {
        return Err(ConfigLoadError::InvalidDirectoryName {
            name: directory_name,
        });
    }

    let quality = match env.jpeg_quality {
        Some(raw) => match raw.parse::<i64>() {
            Ok(value) => Some(value),
            Err(_) => {
                warnings.push(
                    format!("ignoring non-numeric JPEG quality {raw:?}"),
                    Some("use a whole number between 1 and 100"),
                );
                None
            }
        },
        None => None,
    }
    .or(file.cache.jpeg_quality.map(i64::from));
    let jpeg_quality = match quality {
        Some(value) => clamp_quality(value, &mut warnings),
        None => MAX_QUALITY,
    };

    let timeout = env.request_timeout.or(file.http.request_timeout);
    let request_timeout = match timeout {
        Some(raw) => parse_timeout(&raw, &mut warnings),
        None => DEFAULT_REQUEST_TIMEOUT,
    };

    let user_agent = env
        .user_agent
        .or(file.http.user_agent)
        .filter(|ua| !ua.trim().is_empty())
        .unwrap_or_else(|| DEFAULT_USER_AGENT.to_string());

    let env_coalesce = env.coalesce.and_then(|raw| {
        let parsed = parse_bool(&raw);
        if parsed.is_none() {
            warnings.push(
                format!("ignoring unrecognised coalesce flag {raw:?}"),
                Some("use one of 1/0, true/false, yes/no, on/off"),
            );
        }
        parsed
    });
    let coalesce_in_flight = env_coalesce
        .or(file.cache.coalesce_in_flight)
        .unwrap_or(false);

    Ok(ConfigLoad {
        config: MediaCacheConfig {
            storage_root,
            directory_name,
            jpeg_quality,
            request_timeout,
            user_agent,
            coalesce_in_flight,
            metadata,
        },
        warnings,
    })
}

fn is_plain_directory_name(name: &str) -> bool {
    !name.is_empty()
        && name != "."
        && name != ".."
        && !name.contains(['/', '\\', '\0'])
}

fn clamp_quality(value: i64, warnings: &mut ConfigWarnings) -> u8 {
    let clamped = value.clamp(i64::from(MIN_QUALITY), i64::from(MAX_QUALITY));
    if clamped != value {
        warnings.push(
            format!("JPEG quality {value} clamped to {clamped}"),
            Some("quality must be between 1 and 100"),
        );
    }
    u8::try_from(clamped).unwrap_or(MAX_QUALITY)
}

fn parse_timeout(raw: &str, warnings: &mut ConfigWarnings) -> Duration {
    match humantime::parse_duration(raw.trim()) {
        Ok(timeout) if !timeout.is_zero() => timeout,
        Ok(_) => {
            warnings.push(
                "ignoring zero request timeout",
                Some("use a positive duration such as \"30s\""),
            );
            DEFAULT_REQUEST_TIMEOUT
        }
        Err(err) => {
            warnings.push(
                format!("ignoring invalid request timeout {raw:?}: {err}"),
                Some("use a duration such as \"30s\" or \"1m 30s\""),
            );
            DEFAULT_REQUEST_TIMEOUT
        }
    }
}

/// Load from the process environment and default file locations, log any
/// warnings, and return settings ready for
/// [`ImageFetcher::open`](mediacache_core::ImageFetcher::open).
pub fn load_settings() -> anyhow::Result<CacheSettings> {
    let ConfigLoad { config, warnings } = ConfigLoader::new()
        .load()
        .context("failed to load configuration")?;

    for warning in &warnings.items {
        match &warning.hint {
            Some(hint) => warn!(hint = %hint, "{}", warning.message),
            None => warn!("{}", warning.message),
        }
    }
    info!(
        cache_dir = %config.cache_dir().display(),
        config_path = ?config.metadata.config_path,
        "media cache configuration loaded"
    );

    Ok(config.cache_settings())
}
