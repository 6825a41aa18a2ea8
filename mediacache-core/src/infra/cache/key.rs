//! Cache keys and the directory they resolve under.

use std::{
    fmt,
    path::{Path, PathBuf},
};

use url::Url;

use crate::error::{FetchError, Result};

/// Directory holding every cached image.
#[derive(Clone, PartialEq, Eq, Hash)]
pub struct CacheRoot(PathBuf);

impl CacheRoot {
    /// Wrap a directory path.
    pub fn new(path: PathBuf) -> Self {
        Self(path)
    }

    /// Directory path.
    pub fn as_path(&self) -> &Path {
        &self.0
    }
}

impl fmt::Debug for CacheRoot {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_tuple("CacheRoot").field(&self.0).finish()
    }
}

/// File name under which an image is stored.
///
/// Derived from the final path segment of the source URL only, so
/// `https://a/x/photo.jpg` and `https://b/y/photo.jpg` share one entry.
#[derive(Clone, PartialEq, Eq, Hash)]
pub struct CacheKey(String);

impl CacheKey {
    /// Derive the key for `url`.
    ///
    /// The last path segment is percent-decoded. Query and fragment do not
    /// take part. Segments that would not name a plain file inside the cache
    /// directory (empty, `.`, `..`, or containing a separator) are rejected.
    pub fn from_url(url: &Url) -> Result<Self> {
        let segment = url
            .path_segments()
            .and_then(|mut segments| segments.rfind(|s| !s.is_empty()))
            .unwrap_or_default();

        let decoded = urlencoding::decode(segment)
            .map_err(|_| FetchError::InvalidKey(url.to_string()))?;

        if !Self::is_plain_file_name(&decoded) {
            return Err(FetchError::InvalidKey(url.to_string()));
        }
        Ok(Self(decoded.into_owned()))
    }

    fn is_plain_file_name(name: &str) -> bool {
        !name.is_empty()
            && name != "."
            && name != ".."
            && !name.contains(['/', '\\', '\0'])
    }

    /// The file name.
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Debug for CacheKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_tuple("CacheKey").field(&self.0).finish()
    }
}

impl fmt::Display for CacheKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}
