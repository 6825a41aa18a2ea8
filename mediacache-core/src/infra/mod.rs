//! Storage and network adapters behind the fetcher.

pub mod cache;
pub mod transport;

pub use cache::*;
pub use transport::*;
