//! Fire-and-forget loading into a display target.

use std::sync::Arc;

use image::DynamicImage;
use tokio::task::JoinHandle;
use tracing::{debug, warn};
use url::Url;

use crate::fetcher::ImageFetcher;

/// Something that can show a fetched image.
///
/// `show` runs on a runtime worker. Implementations backed by a UI toolkit
/// must hop to their display thread before touching widget state.
pub trait ImageView: Send + Sync + 'static {
    fn show(&self, image: Option<DynamicImage>);
}

/// Resolve `url` in the background and hand the result to `view`.
///
/// An unparsable `url` is ignored and `None` is returned. Failures are only
/// logged; the view is left untouched when the request fails.
///
/// Must be called from within a Tokio runtime.
pub fn load_into<V: ImageView>(
    fetcher: &ImageFetcher,
    url: &str,
    view: Arc<V>,
) -> Option<JoinHandle<()>> {
    let url = match Url::parse(url) {
        Ok(url) => url,
        Err(err) => {
            debug!(url, error = %err, "ignoring unparsable image url");
            return None;
        }
    };

    let fetcher = fetcher.clone();
    Some(tokio::spawn(async move {
        fetcher
            .resolve_with(
                &url,
                |image| view.show(image),
                |message| {
                    if let Some(message) = message {
                        warn!(url = %url, "{message}");
                    }
                },
            )
            .await;
    }))
}
