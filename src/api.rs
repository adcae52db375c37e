//! The HTTP seam: every request the engine makes goes through [`RemoteStore`].

use std::time::Duration;

use async_trait::async_trait;
use futures::{stream, TryStreamExt};
use reqwest::{multipart, Body, Url};
use serde::de::DeserializeOwned;
use thiserror::Error;
use tokio::sync::watch;
use tokio_util::io::ReaderStream;

use crate::config::ServerSettings;
use crate::types::{RemoteConfig, RemoteFileRecord};
use crate::validation::{BatchEntry, FileSource};

/// Multipart field the server reads uploads from.
pub const UPLOAD_FIELD: &str = "uploadfile";

// In-memory sources are fed to the body in slices of this size so that
// progress is reported the same way as for files read from disk.
const MEMORY_CHUNK: usize = 64 * 1024;

#[derive(Debug, Error)]
pub enum ApiError {
    #[error("invalid URL: {0}")]
    InvalidUrl(String),
    #[error("network error: {0}")]
    Transport(String),
    #[error("HTTP {0}")]
    Status(u16),
    #[error("unexpected response body: {0}")]
    Decode(String),
    #[error("cannot read upload source: {0}")]
    Io(#[from] std::io::Error),
}

/// Receives the cumulative number of body bytes sent for the current file.
pub type ProgressSender = watch::Sender<u64>;

#[async_trait]
pub trait RemoteStore: Send + Sync {
    /// `GET /config/`.
    async fn fetch_config(&self) -> Result<RemoteConfig, ApiError>;

    /// `GET` on the resolved list endpoint.
    async fn list_files(&self, path: &str) -> Result<Vec<RemoteFileRecord>, ApiError>;

    /// `GET` on the resolved delete endpoint. Any non-success status is an error.
    async fn delete_file(&self, path: &str) -> Result<(), ApiError>;

    /// `POST` one file as multipart to the upload endpoint.
    ///
    /// Returns the response status whatever it is; `Err` means no response
    /// arrived (or the source could not be read).
    async fn upload_file(
        &self,
        path: &str,
        entry: &BatchEntry,
        progress: ProgressSender,
    ) -> Result<u16, ApiError>;
}

/// [`RemoteStore`] backed by `reqwest`.
#[derive(Clone)]
pub struct HttpRemote {
    http: reqwest::Client,
    base_url: Url,
    config_path: String,
    timeout: Duration,
}

impl HttpRemote {
    pub fn new(settings: &ServerSettings) -> Result<Self, ApiError> {
        let mut base = settings.base_url.clone();
        if !base.ends_with('/') {
            base.push('/');
        }
        let base_url = Url::parse(&base).map_err(|e| ApiError::InvalidUrl(format!("{}: {}", base, e)))?;
        let timeout = Duration::from_secs(settings.request_timeout_secs);

        // No global timeout: it would also cap long uploads.
        let http = reqwest::Client::builder()
            .connect_timeout(timeout)
            .danger_accept_invalid_certs(settings.accept_invalid_certs)
            .build()
            .map_err(map_net)?;

        Ok(Self { http, base_url, config_path: settings.config_path.clone(), timeout })
    }

    pub fn base_url(&self) -> &Url {
        &self.base_url
    }

    /// Joins an endpoint path below the base URL, so a base with a path
    /// prefix (reverse proxy) keeps it.
    pub fn url(&self, path: &str) -> Result<Url, ApiError> {
        self.base_url
            .join(path.trim_start_matches('/'))
            .map_err(|e| ApiError::InvalidUrl(format!("{}: {}", path, e)))
    }

    async fn get_json<T: DeserializeOwned>(&self, path: &str) -> Result<T, ApiError> {
        let url = self.url(path)?;
        let resp = self.http.get(url).timeout(self.timeout).send().await.map_err(map_net)?;
        let status = resp.status();
        if !status.is_success() {
            return Err(ApiError::Status(status.as_u16()));
        }
        let text = resp.text().await.map_err(map_net)?;
        serde_json::from_str(&text).map_err(|e| ApiError::Decode(e.to_string()))
    }
}

fn map_net(e: reqwest::Error) -> ApiError {
    ApiError::Transport(e.to_string())
}

#[async_trait]
impl RemoteStore for HttpRemote {
    async fn fetch_config(&self) -> Result<RemoteConfig, ApiError> {
        self.get_json(&self.config_path).await
    }

    async fn list_files(&self, path: &str) -> Result<Vec<RemoteFileRecord>, ApiError> {
        self.get_json(path).await
    }

    async fn delete_file(&self, path: &str) -> Result<(), ApiError> {
        let url = self.url(path)?;
        let resp = self.http.get(url).timeout(self.timeout).send().await.map_err(map_net)?;
        if !resp.status().is_success() {
            return Err(ApiError::Status(resp.status().as_u16()));
        }
        Ok(())
    }

    async fn upload_file(
        &self,
        path: &str,
        entry: &BatchEntry,
        progress: ProgressSender,
    ) -> Result<u16, ApiError> {
        let url = self.url(path)?;

        let mut sent = 0u64;
        let body = match &entry.file.source {
            FileSource::Path(local) => {
                let file = tokio::fs::File::open(local).await?;
                Body::wrap_stream(ReaderStream::new(file).inspect_ok(move |chunk| {
                    sent += chunk.len() as u64;
                    progress.send_replace(sent);
                }))
            }
            FileSource::Memory(bytes) => {
                let chunks: Vec<std::io::Result<Vec<u8>>> =
                    bytes.chunks(MEMORY_CHUNK).map(|c| Ok(c.to_vec())).collect();
                Body::wrap_stream(stream::iter(chunks).inspect_ok(move |chunk| {
                    sent += chunk.len() as u64;
                    progress.send_replace(sent);
                }))
            }
        };

        let part = multipart::Part::stream_with_length(body, entry.file.size)
            .file_name(entry.file.name.clone());
        // Raw UTF-8 filename like a browser sends it; the server sanitizes it.
        let form = multipart::Form::new().percent_encode_noop().part(UPLOAD_FIELD, part);

        let resp = self.http.post(url).multipart(form).send().await.map_err(map_net)?;
        Ok(resp.status().as_u16())
    }
}
