//! # Media Cache Core
//!
//! On-demand retrieval of remote image assets with transparent disk
//! persistence. A caller asks for an image by URL; the fetcher serves the
//! previously downloaded copy when one exists on disk, otherwise it performs a
//! single network transfer, persists the decoded image, and returns it.
//!
//! ## Architecture
//!
//! - [`infra::cache`]: cache keys and the flat on-disk [`CacheStore`]
//! - [`infra::transport`]: the network seam ([`ImageTransport`]) and its
//!   `reqwest` implementation
//! - [`fetcher`]: the hit/miss orchestration ([`ImageFetcher`])
//! - [`binding`]: fire-and-forget loading into a display target
//!
//! ## Examples
//!
//! ```no_run
//! use mediacache_core::{CacheSettings, ImageFetcher};
//! use url::Url;
//!
//! async fn load() -> Result<(), Box<dyn std::error::Error>> {
//!     let fetcher = ImageFetcher::open(&CacheSettings::default()).await?;
//!     let url = Url::parse("https://example.com/images/photo.jpg")?;
//!
//!     match fetcher.resolve(&url).await {
//!         Ok(Some(image)) => println!("{}x{}", image.width(), image.height()),
//!         Ok(None) => println!("cached file could not be decoded"),
//!         Err(err) => println!("failed: {err}"),
//!     }
//!     Ok(())
//! }
//! ```

pub mod binding;
pub mod error;
pub mod fetcher;
pub mod infra;
pub mod settings;

pub use binding::{ImageView, load_into};
pub use error::{FetchError, Result};
pub use fetcher::{CoalesceStats, ImageFetcher};
pub use infra::cache::{CacheKey, CacheRoot, CacheStore};
pub use infra::transport::{HttpImageTransport, ImageTransport};
pub use settings::CacheSettings;

/// Decoded image value handed back to callers.
pub use image::DynamicImage;
