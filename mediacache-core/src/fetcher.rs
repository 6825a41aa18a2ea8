//! Hit/miss orchestration.
//!
//! A request derives its cache key, serves the stored file when one exists,
//! and otherwise performs one transfer, decodes it, persists it, and reads it
//! back through the store. Hits and misses therefore hand out values produced
//! by the same read path.

use std::{
    any::type_name_of_val,
    collections::HashMap,
    fmt,
    path::PathBuf,
    sync::{
        Arc, Mutex, MutexGuard, PoisonError,
        atomic::{AtomicU64, Ordering},
    },
};

use image::DynamicImage;
use tokio::sync::watch;
use tracing::{debug, info, warn};
use url::Url;

use crate::{
    error::{FetchError, Result},
    infra::{
        cache::{CacheKey, CacheRoot, CacheStore},
        transport::{HttpImageTransport, ImageTransport},
    },
    settings::CacheSettings,
};

/// Cache service: one store plus the transport used on misses.
///
/// Cheap to clone; clones share the store directory, the transport, and the
/// in-flight table.
#[derive(Clone)]
pub struct ImageFetcher {
    store: CacheStore,
    transport: Arc<dyn ImageTransport>,
    in_flight: Option<Arc<InFlightTransfers>>,
}

impl fmt::Debug for ImageFetcher {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ImageFetcher")
            .field("store", &self.store)
            .field("transport", &type_name_of_val(self.transport.as_ref()))
            .field("coalescing", &self.in_flight.is_some())
            .field("coalesce_stats", &self.coalesce_stats())
            .finish()
    }
}

/// Singleflight diagnostics.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct CoalesceStats {
    /// Requests that performed the transfer for their key.
    pub leaders: u64,
    /// Requests that waited on another request's transfer.
    pub waiters: u64,
}

impl ImageFetcher {
    /// Fetcher over `store`, without coalescing.
    pub fn new(store: CacheStore, transport: Arc<dyn ImageTransport>) -> Self {
        Self {
            store,
            transport,
            in_flight: None,
        }
    }

    /// Build the store and HTTP transport described by `settings` and create
    /// the cache directory.
    ///
    /// A directory that cannot be created is logged and otherwise ignored;
    /// later writes then fail one by one.
    pub async fn open(settings: &CacheSettings) -> Result<Self> {
        // Keep the cache root stable even if the working directory changes.
        let cache_dir = if settings.cache_dir.is_absolute() {
            settings.cache_dir.clone()
        } else {
            std::env::current_dir()
                .unwrap_or_else(|_| PathBuf::from("."))
                .join(&settings.cache_dir)
        };

        let store = CacheStore::with_quality(
            CacheRoot::new(cache_dir),
            settings.jpeg_quality,
        );
        if let Err(err) = store.ensure_root().await {
            warn!(
                "Unable to create cache directory {:?}: {}",
                store.root().as_path(),
                err
            );
        }

        let transport = HttpImageTransport::new(
            settings.request_timeout,
            &settings.user_agent,
        )?;

        info!(
            cache_dir = %store.root().as_path().display(),
            coalesce = settings.coalesce_in_flight,
            "image cache ready"
        );

        Ok(Self::new(store, Arc::new(transport))
            .with_coalescing(settings.coalesce_in_flight))
    }

    /// Toggle per-key coalescing of concurrent misses.
    ///
    /// Off by default: concurrent misses for one key each transfer and each
    /// write, the last write winning.
    pub fn with_coalescing(mut self, enabled: bool) -> Self {
        self.in_flight =
            enabled.then(|| Arc::new(InFlightTransfers::default()));
        self
    }

    /// The backing store.
    pub fn store(&self) -> &CacheStore {
        &self.store
    }

    /// Leader and waiter counts; zero when coalescing is off.
    pub fn coalesce_stats(&self) -> CoalesceStats {
        self.in_flight
            .as_ref()
            .map(|t| CoalesceStats {
                leaders: t.leaders.load(Ordering::Relaxed),
                waiters: t.waiters.load(Ordering::Relaxed),
            })
            .unwrap_or_default()
    }

    /// Return the image for `url`, downloading and persisting it on a miss.
    ///
    /// `Ok(None)` means a file exists for the key but does not decode. That
    /// case is not treated as a failure and no transfer is attempted.
    pub async fn resolve(&self, url: &Url) -> Result<Option<DynamicImage>> {
        let key = CacheKey::from_url(url)?;

        if self.store.exists(&key).await {
            debug!(key = %key, "cache hit");
            return Ok(self.store.read(&key).await);
        }

        let Some(in_flight) = self.in_flight.as_deref() else {
            return self.download(url, &key).await;
        };

        loop {
            match in_flight.join(&key) {
                Role::Leader(_guard) => return self.download(url, &key).await,
                Role::Follower(mut done) => {
                    // Resolves once the leader's guard drops the sender.
                    let _ = done.changed().await;
                    if self.store.exists(&key).await {
                        return Ok(self.store.read(&key).await);
                    }
                    // Leader failed; rejoin so one request retries the key.
                }
            }
        }
    }

    /// Callback form of [`resolve`](Self::resolve).
    ///
    /// Exactly one of the two callbacks runs, on whatever task awaits this
    /// future. Callers that touch display state must marshal it themselves.
    pub async fn resolve_with<C, F>(&self, url: &Url, on_complete: C, on_failure: F)
    where
        C: FnOnce(Option<DynamicImage>),
        F: FnOnce(Option<String>),
    {
        match self.resolve(url).await {
            Ok(image) => on_complete(image),
            Err(err) => on_failure(err.failure_message()),
        }
    }

    async fn download(
        &self,
        url: &Url,
        key: &CacheKey,
    ) -> Result<Option<DynamicImage>> {
        info!(url = %url, key = %key, "cache miss, fetching");

        let payload = self.transport.fetch(url).await.inspect_err(|err| {
            warn!(url = %url, error = %err, "transfer failed");
        })?;

        if payload.is_empty() {
            warn!(url = %url, "transfer returned an empty payload");
            return Err(FetchError::EmptyPayload(url.to_string()));
        }

        let image = image::load_from_memory(&payload).map_err(|e| {
            warn!(url = %url, error = %e, "payload is not an image");
            FetchError::Decode {
                url: url.to_string(),
                reason: e.to_string(),
            }
        })?;

        self.store.write(&image, key).await.inspect_err(|err| {
            warn!(key = %key, error = %err, "failed to persist image");
        })?;

        Ok(self.store.read(key).await)
    }
}

#[derive(Default)]
struct InFlightTransfers {
    pending: Mutex<HashMap<CacheKey, watch::Sender<()>>>,
    leaders: AtomicU64,
    waiters: AtomicU64,
}

enum Role<'a> {
    Leader(LeaderGuard<'a>),
    Follower(watch::Receiver<()>),
}

/// Removes the key on drop, closing the channel every follower waits on.
struct LeaderGuard<'a> {
    transfers: &'a InFlightTransfers,
    key: CacheKey,
}

impl Drop for LeaderGuard<'_> {
    fn drop(&mut self) {
        let sender = self.transfers.lock().remove(&self.key);
        drop(sender);
        debug!("singleflight complete: key={}", self.key);
    }
}

impl InFlightTransfers {
    fn lock(&self) -> MutexGuard<'_, HashMap<CacheKey, watch::Sender<()>>> {
        self.pending.lock().unwrap_or_else(PoisonError::into_inner)
    }

    fn join(&self, key: &CacheKey) -> Role<'_> {
        let mut pending = self.lock();

        if let Some(sender) = pending.get(key) {
            let waiters = self.waiters.fetch_add(1, Ordering::Relaxed) + 1;
            debug!("singleflight wait: key={}, waiters={}", key, waiters);
            return Role::Follower(sender.subscribe());
        }

        let (sender, _) = watch::channel(());
        pending.insert(key.clone(), sender);
        let leaders = self.leaders.fetch_add(1, Ordering::Relaxed) + 1;
        debug!("singleflight lead: key={}, leaders={}", key, leaders);

        Role::Leader(LeaderGuard {
            transfers: self,
            key: key.clone(),
        })
    }
}
