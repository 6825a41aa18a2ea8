#![allow(dead_code)]

use std::{
    collections::VecDeque,
    io::Cursor,
    path::Path,
    sync::{
        Arc, Mutex,
        atomic::{AtomicUsize, Ordering},
    },
};

use async_trait::async_trait;
use image::{DynamicImage, ImageFormat, Rgb, RgbImage};
use mediacache_core::{
    CacheRoot, CacheStore, FetchError, ImageFetcher, ImageTransport,
};
use tokio::sync::{Barrier, Semaphore};
use url::Url;

/// What a scripted transfer returns.
#[derive(Clone, Debug)]
pub enum Reply {
    Bytes(Vec<u8>),
    Fail(String),
}

/// In-process transport replaying a fixed sequence of replies.
///
/// The last reply repeats once the queue is down to one entry.
pub struct ScriptedTransport {
    replies: Mutex<VecDeque<Reply>>,
    calls: AtomicUsize,
    barrier: Option<Barrier>,
    gate: Option<Arc<Semaphore>>,
}

impl ScriptedTransport {
    pub fn new(replies: impl IntoIterator<Item = Reply>) -> Self {
        let replies: VecDeque<Reply> = replies.into_iter().collect();
        assert!(!replies.is_empty(), "script needs at least one reply");
        Self {
            replies: Mutex::new(replies),
            calls: AtomicUsize::new(0),
            barrier: None,
            gate: None,
        }
    }

    pub fn replying(reply: Reply) -> Self {
        Self::new([reply])
    }

    /// Hold every transfer until `parties` transfers are in progress.
    pub fn with_barrier(mut self, parties: usize) -> Self {
        self.barrier = Some(Barrier::new(parties));
        self
    }

    /// Hold every transfer until the returned semaphore gets a permit.
    pub fn gated(mut self) -> (Self, Arc<Semaphore>) {
        let gate = Arc::new(Semaphore::new(0));
        self.gate = Some(Arc::clone(&gate));
        (self, gate)
    }

    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }

    fn next_reply(&self) -> Reply {
        let mut replies = self.replies.lock().unwrap();
        if replies.len() > 1 {
            replies.pop_front().unwrap()
        } else {
            replies.front().cloned().unwrap()
        }
    }
}

#[async_trait]
impl ImageTransport for ScriptedTransport {
    async fn fetch(&self, url: &Url) -> mediacache_core::Result<Vec<u8>> {
        self.calls.fetch_add(1, Ordering::SeqCst);

        if let Some(barrier) = &self.barrier {
            barrier.wait().await;
        }
        if let Some(gate) = &self.gate {
            gate.acquire().await.expect("gate closed").forget();
        }

        match self.next_reply() {
            Reply::Bytes(bytes) => Ok(bytes),
            Reply::Fail(message) => Err(FetchError::Transfer {
                url: url.to_string(),
                message,
            }),
        }
    }
}

pub fn png_bytes(width: u32, height: u32, color: [u8; 3]) -> Vec<u8> {
    let image =
        DynamicImage::ImageRgb8(RgbImage::from_pixel(width, height, Rgb(color)));
    let mut out = Cursor::new(Vec::new());
    image.write_to(&mut out, ImageFormat::Png).expect("encode png");
    out.into_inner()
}

pub fn url(raw: &str) -> Url {
    Url::parse(raw).expect("valid test url")
}

/// Fetcher over `cache_dir` with its directory already created.
pub async fn fetcher_in(
    cache_dir: &Path,
    transport: Arc<ScriptedTransport>,
) -> ImageFetcher {
    let store = CacheStore::new(CacheRoot::new(cache_dir.to_path_buf()));
    store.ensure_root().await.expect("create cache dir");
    ImageFetcher::new(store, transport)
}

/// Sorted file names directly under `dir`; empty if `dir` is unreadable.
pub fn entries(dir: &Path) -> Vec<String> {
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
