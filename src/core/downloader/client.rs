use async_trait::async_trait;
use futures_util::StreamExt;
use reqwest::Client;
use tracing::debug;

use crate::core::error::{LauncherError, LauncherResult};
use crate::core::http::build_http_client;

/// Progress of a single in-flight download.
#[derive(Debug, Clone, serde::Serialize)]
pub struct DownloadProgress {
    pub url: String,
    pub bytes_downloaded: u64,
    pub total_bytes: Option<u64>,
}

impl DownloadProgress {
    /// Whole-number percentage, when the server announced a length.
    pub fn percent(&self) -> Option<u8> {
        match self.total_bytes {
            Some(total) if total > 0 => {
                Some(((self.bytes_downloaded.min(total) * 100) / total) as u8)
            }
            _ => None,
        }
    }
}

/// A fully buffered HTTP response.
#[derive(Debug, Clone)]
pub struct HttpPayload {
    pub status: u16,
    pub body: Vec<u8>,
}

impl HttpPayload {
    pub fn is_success(&self) -> bool {
        (200..300).contains(&self.status)
    }
}

/// Network seam of the pipeline.
///
/// Transport failures surface as `LauncherError::Network`; a response with
/// any status is returned as-is so each caller decides what a non-success
/// status means for it.
#[async_trait]
pub trait Fetcher: Send + Sync {
    async fn get(&self, url: &str) -> LauncherResult<HttpPayload>;

    async fn get_with_progress(
        &self,
        url: &str,
        on_progress: &(dyn Fn(DownloadProgress) + Send + Sync),
    ) -> LauncherResult<HttpPayload> {
        let payload = self.get(url).await?;
        on_progress(DownloadProgress {
            url: url.to_string(),
            bytes_downloaded: payload.body.len() as u64,
            total_bytes: Some(payload.body.len() as u64),
        });
        Ok(payload)
    }
}

/// `Fetcher` backed by a shared reqwest client.
pub struct Downloader {
    client: Client,
}

impl Downloader {
    pub fn new() -> LauncherResult<Self> {
        Ok(Self {
            client: build_http_client()?,
        })
    }
}

fn transport_error(url: &str, err: reqwest::Error) -> LauncherError {
    LauncherError::Network {
        url: url.to_string(),
        reason: err.to_string(),
    }
}

#[async_trait]
impl Fetcher for Downloader {
    async fn get(&self, url: &str) -> LauncherResult<HttpPayload> {
        self.get_with_progress(url, &|_: DownloadProgress| {}).await
    }

    /// Streams the body so progress can be reported chunk by chunk.
    async fn get_with_progress(
        &self,
        url: &str,
        on_progress: &(dyn Fn(DownloadProgress) + Send + Sync),
    ) -> LauncherResult<HttpPayload> {
        let response = self
            .client
            .get(url)
            .send()
            .await
            .map_err(|e| transport_error(url, e))?;

        let status = response.status().as_u16();
        let total_bytes = response.content_length();
        let mut body = Vec::new();
        let mut stream = response.bytes_stream();

        while let Some(chunk) = stream.next().await {
            let chunk = chunk.map_err(|e| transport_error(url, e))?;
            body.extend_from_slice(&chunk);
            on_progress(DownloadProgress {
                url: url.to_string(),
                bytes_downloaded: body.len() as u64,
                total_bytes,
            });
        }

        debug!("GET {} -> {} ({} bytes)", url, status, body.len());
        Ok(HttpPayload { status, body })
    }
}
