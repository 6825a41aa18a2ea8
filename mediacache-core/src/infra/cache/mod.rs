//! On-disk cache infra.
//!
//! One flat directory, one file per cache key. The file name is the key and
//! the content is a JPEG-encoded image; there is no index or manifest.

pub mod image_file_store;
pub mod key;

pub use image_file_store::*;
pub use key::*;
