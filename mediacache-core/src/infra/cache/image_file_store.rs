//! JPEG files in a flat cache directory.

use std::{io::Cursor, path::PathBuf};

use image::{ColorType, DynamicImage, codecs::jpeg::JpegEncoder};
use tokio::io::AsyncWriteExt;
use tracing::{debug, warn};
use uuid::Uuid;

use super::key::{CacheKey, CacheRoot};
use crate::error::{FetchError, Result};

/// Highest JPEG quality setting; the default for stored assets.
pub const MAX_JPEG_QUALITY: u8 = 100;

/// File-backed image store keyed by [`CacheKey`].
///
/// Every entry is a JPEG file named after its key. Nothing else is stored
/// alongside it, so a directory listing is the whole inventory.
#[derive(Clone, Debug)]
pub struct CacheStore {
    root: CacheRoot,
    jpeg_quality: u8,
}

impl CacheStore {
    /// Store under `root` writing at maximum quality.
    pub fn new(root: CacheRoot) -> Self {
        Self::with_quality(root, MAX_JPEG_QUALITY)
    }

    /// Store under `root`; `jpeg_quality` is clamped to 1..=100.
    pub fn with_quality(root: CacheRoot, jpeg_quality: u8) -> Self {
        Self {
            root,
            jpeg_quality: jpeg_quality.clamp(1, MAX_JPEG_QUALITY),
        }
    }

    /// Cache directory.
    pub fn root(&self) -> &CacheRoot {
        &self.root
    }

    /// File path for `key`.
    pub fn path_for(&self, key: &CacheKey) -> PathBuf {
        self.root.as_path().join(key.as_str())
    }

    /// Create the cache directory and any missing parents.
    pub async fn ensure_root(&self) -> std::io::Result<()> {
        tokio::fs::create_dir_all(self.root.as_path()).await
    }

    /// Whether a file is stored under `key`. Always hits the filesystem.
    pub async fn exists(&self, key: &CacheKey) -> bool {
        tokio::fs::try_exists(self.path_for(key))
            .await
            .unwrap_or(false)
    }

    /// Load and decode the file stored under `key`.
    ///
    /// Returns `None` when the file is missing or does not decode.
    pub async fn read(&self, key: &CacheKey) -> Option<DynamicImage> {
        let path = self.path_for(key);
        let bytes = match tokio::fs::read(&path).await {
            Ok(bytes) => bytes,
            Err(err) => {
                if err.kind() != std::io::ErrorKind::NotFound {
                    warn!("Failed to read cached image {:?}: {}", path, err);
                }
                return None;
            }
        };

        match image::load_from_memory(&bytes) {
            Ok(image) => Some(image),
            Err(err) => {
                warn!(key = %key, error = %err, "cached image failed to decode");
                None
            }
        }
    }

    /// Encode `image` as JPEG and store it under `key`, replacing any
    /// previous entry.
    ///
    /// The bytes land in a hidden temp file first and are renamed into place,
    /// so a failed write never leaves a partial file under `key`. The temp
    /// name does not embed the key, so any key that fits as a file name can
    /// be written.
    pub async fn write(&self, image: &DynamicImage, key: &CacheKey) -> Result<()> {
        let encoded = encode_jpeg(image, self.jpeg_quality).map_err(|err| {
            FetchError::Persist {
                key: key.to_string(),
                message: format!("failed to encode JPEG: {err}"),
            }
        })?;

        let path = self.path_for(key);
        let tmp = self
            .root
            .as_path()
            .join(format!(".tmp-{}", Uuid::new_v4().simple()));

        if let Err(err) = write_file(&tmp, &encoded).await {
            let _ = tokio::fs::remove_file(&tmp).await;
            return Err(FetchError::Persist {
                key: key.to_string(),
                message: err.to_string(),
            });
        }

        if let Err(err) = tokio::fs::rename(&tmp, &path).await {
            let _ = tokio::fs::remove_file(&tmp).await;
            return Err(FetchError::Persist {
                key: key.to_string(),
                message: err.to_string(),
            });
        }

        debug!(
            key = %key,
            bytes = encoded.len(),
            "stored image in cache"
        );
        Ok(())
    }
}

async fn write_file(path: &std::path::Path, bytes: &[u8]) -> std::io::Result<()> {
    let mut file = tokio::fs::File::create(path).await?;
    file.write_all(bytes).await?;
    file.flush().await?;
    Ok(())
}

/// Flatten to RGB and encode; JPEG has no alpha channel.
fn encode_jpeg(
    image: &DynamicImage,
    quality: u8,
) -> std::result::Result<Vec<u8>, image::ImageError> {
    let rgb = image.to_rgb8();
    let mut out = Cursor::new(Vec::new());
    {
        let mut encoder = JpegEncoder::new_with_quality(&mut out, quality);
        encoder.encode(
            rgb.as_raw(),
            rgb.width(),
            rgb.height(),
            ColorType::Rgb8.into(),
        )?;
    }
    Ok(out.into_inner())
}

#[cfg(test)]
mod tests {
    use super::*;
    use image::{Rgb, RgbImage, Rgba, RgbaImage};
    use tempfile::TempDir;

    fn store_in(dir: &TempDir) -> CacheStore {
        CacheStore::new(CacheRoot::new(dir.path().join("media")))
    }

    fn key(name: &str) -> CacheKey {
        let url = url::Url::parse(&format!("https://host/{name}")).unwrap();
        CacheKey::from_url(&url).unwrap()
    }

    fn solid(width: u32, height: u32, color: [u8; 3]) -> DynamicImage {
        DynamicImage::ImageRgb8(RgbImage::from_pixel(width, height, Rgb(color)))
    }

    fn entries(dir: &std::path::Path) -> Vec<String> {
        let mut names: Vec<String> = std::fs::read_dir(dir)
            .map(|rd| {
                rd.filter_map(|e| e.ok())
                    .map(|e| e.file_name().to_string_lossy().into_owned())
                    .collect()
            })
            .unwrap_or_default();
        names.sort();
        names
    }

    #[tokio::test]
    async fn ensure_root_is_idempotent() {
        let dir = TempDir::new().unwrap();
        let store = store_in(&dir);

        store.ensure_root().await.unwrap();
        store.ensure_root().await.unwrap();

        assert!(store.root().as_path().is_dir());
    }

    #[tokio::test]
    async fn exists_tracks_the_filesystem() {
        let dir = TempDir::new().unwrap();
        let store = store_in(&dir);
        store.ensure_root().await.unwrap();
        let key = key("a.jpg");

        assert!(!store.exists(&key).await);
        store.write(&solid(4, 4, [10, 20, 30]), &key).await.unwrap();
        assert!(store.exists(&key).await);

        std::fs::remove_file(store.path_for(&key)).unwrap();
        assert!(!store.exists(&key).await);
    }

    #[tokio::test]
    async fn written_image_reads_back_equivalent() {
        let dir = TempDir::new().unwrap();
        let store = store_in(&dir);
        store.ensure_root().await.unwrap();
        let key = key("photo.jpg");

        store
            .write(&solid(32, 16, [200, 100, 50]), &key)
            .await
            .unwrap();

        let read = store.read(&key).await.expect("decodable entry");
        assert_eq!((read.width(), read.height()), (32, 16));
        let pixel = read.to_rgb8().get_pixel(8, 8).0;
        for (got, want) in pixel.iter().zip([200u8, 100, 50]) {
            assert!(got.abs_diff(want) <= 4, "{pixel:?} too far from source");
        }

        let on_disk = std::fs::read(store.path_for(&key)).unwrap();
        assert!(on_disk.starts_with(&[0xFF, 0xD8, 0xFF]), "stored as JPEG");
        assert_eq!(entries(store.root().as_path()), vec!["photo.jpg"]);
    }

    #[tokio::test]
    async fn alpha_images_are_flattened_before_encoding() {
        let dir = TempDir::new().unwrap();
        let store = store_in(&dir);
        store.ensure_root().await.unwrap();
        let key = key("icon.png");

        let rgba = RgbaImage::from_pixel(8, 8, Rgba([0, 0, 255, 128]));
        store
            .write(&DynamicImage::ImageRgba8(rgba), &key)
            .await
            .unwrap();

        let read = store.read(&key).await.expect("decodable entry");
        assert_eq!((read.width(), read.height()), (8, 8));
    }

    #[tokio::test]
    async fn write_overwrites_existing_entry() {
        let dir = TempDir::new().unwrap();
        let store = store_in(&dir);
        store.ensure_root().await.unwrap();
        let key = key("a.jpg");

        store.write(&solid(4, 4, [0, 0, 0]), &key).await.unwrap();
        store.write(&solid(10, 6, [255, 255, 255]), &key).await.unwrap();

        let read = store.read(&key).await.unwrap();
        assert_eq!((read.width(), read.height()), (10, 6));
        assert_eq!(entries(store.root().as_path()), vec!["a.jpg"]);
    }

    #[tokio::test]
    async fn keys_near_the_file_name_limit_are_stored() {
        let dir = TempDir::new().unwrap();
        let store = store_in(&dir);
        store.ensure_root().await.unwrap();
        let name = format!("{}.jpg", "a".repeat(240));
        let key = key(&name);
        assert_eq!(key.as_str().len(), 244);

        store.write(&solid(4, 4, [9, 9, 9]), &key).await.unwrap();

        assert!(store.read(&key).await.is_some());
        assert_eq!(entries(store.root().as_path()), vec![name]);
    }

    #[tokio::test]
    async fn undecodable_or_missing_entries_read_as_none() {
        let dir = TempDir::new().unwrap();
        let store = store_in(&dir);
        store.ensure_root().await.unwrap();

        assert!(store.read(&key("missing.jpg")).await.is_none());

        let corrupt = key("corrupt.jpg");
        std::fs::write(store.path_for(&corrupt), b"not an image").unwrap();
        assert!(store.exists(&corrupt).await);
        assert!(store.read(&corrupt).await.is_none());
    }

    #[tokio::test]
    async fn failed_write_reports_persist_error_and_leaves_nothing() {
        let dir = TempDir::new().unwrap();
        // Occupy the cache dir path with a regular file.
        let blocker = dir.path().join("media");
        std::fs::write(&blocker, b"").unwrap();
        let store = store_in(&dir);
        let key = key("a.jpg");

        assert!(store.ensure_root().await.is_err());

        let err = store
            .write(&solid(4, 4, [1, 2, 3]), &key)
            .await
            .expect_err("write into a non-directory must fail");
        match err {
            FetchError::Persist { key, message } => {
                assert_eq!(key, "a.jpg");
                assert!(!message.is_empty());
            }
            other => panic!("unexpected error: {other:?}"),
        }

        assert!(!store.exists(&key).await);
        assert!(store.read(&key).await.is_none());
        assert_eq!(entries(dir.path()), vec!["media"]);
    }

    #[test]
    fn quality_is_clamped_to_jpeg_range() {
        let root = CacheRoot::new(PathBuf::from("/tmp/unused"));
        assert_eq!(CacheStore::with_quality(root.clone(), 0).jpeg_quality, 1);
        assert_eq!(CacheStore::with_quality(root, 250).jpeg_quality, 100);
    }
}
