//! Network transfer seam.

use std::time::Duration;

use async_trait::async_trait;
use reqwest::Client;
use tracing::debug;
use url::Url;

use crate::error::{FetchError, Result};

/// Performs the single network transfer made on a cache miss.
///
/// Implementations make exactly one attempt and never retry.
#[async_trait]
pub trait ImageTransport: Send + Sync {
    /// Fetch the raw payload behind `url`.
    async fn fetch(&self, url: &Url) -> Result<Vec<u8>>;
}

/// `reqwest`-backed transport issuing a plain HTTP(S) GET.
#[derive(Clone, Debug)]
pub struct HttpImageTransport {
    client: Client,
}

impl HttpImageTransport {
    /// Build a client with the given timeout and `User-Agent`.
    pub fn new(timeout: Duration, user_agent: &str) -> Result<Self> {
        let client = Client::builder()
            .timeout(timeout)
            .user_agent(user_agent)
            .build()
            .map_err(|e| FetchError::HttpClient(e.to_string()))?;

        Ok(Self { client })
    }

    /// Reuse an existing client.
    pub fn with_client(client: Client) -> Self {
        Self { client }
    }
}

#[async_trait]
impl ImageTransport for HttpImageTransport {
    async fn fetch(&self, url: &Url) -> Result<Vec<u8>> {
        let transfer_error = |e: reqwest::Error| FetchError::Transfer {
            url: url.to_string(),
            message: e.to_string(),
        };

        let response = self
            .client
            .get(url.clone())
            .send()
            .await
            .map_err(transfer_error)?;

        if !response.status().is_success() {
            return Err(FetchError::HttpStatus {
                status: response.status(),
                url: url.to_string(),
            });
        }

        let expected_len = response.content_length();
        let bytes = response.bytes().await.map_err(transfer_error)?;

        if let Some(content_len) = expected_len
            && bytes.len() as u64 != content_len
        {
            return Err(FetchError::Transfer {
                url: url.to_string(),
                message: format!(
                    "size mismatch: got {} bytes, expected {}",
                    bytes.len(),
                    content_len
                ),
            });
        }

        debug!(url = %url, bytes = bytes.len(), "transfer complete");
        Ok(bytes.to_vec())
    }
}
