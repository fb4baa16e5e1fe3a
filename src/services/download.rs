// src/services/download.rs

//! Resource downloads.
//!
//! A download resolves the stored path to a URL, bumps the resource's
//! counter (best-effort), then hands the URL to a `DownloadSink`. A failed
//! counter update never blocks or fails the download itself.

use std::path::{Path, PathBuf};
use std::pin::pin;
use std::sync::Arc;

use async_trait::async_trait;
use futures::{Stream, StreamExt};
use reqwest::Client;
use tokio::io::AsyncWriteExt;

use crate::error::{AppError, Result};
use crate::models::Resource;
use crate::services::CatalogClient;
use crate::utils::url::file_name_for;

/// Where a resolved download ends up.
#[async_trait]
pub trait DownloadSink: Send + Sync {
    /// Save the file at `url` under `file_name`, returning where it went.
    async fn save(&self, url: &str, file_name: &str) -> Result<PathBuf>;
}

/// Result of a completed download.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DownloadOutcome {
    pub url: String,
    pub saved_to: PathBuf,
    /// Whether the download counter was incremented
    pub counted: bool,
}

/// Coordinates URL resolution, the counter, and the sink.
#[derive(Clone)]
pub struct Downloader {
    catalog: CatalogClient,
    sink: Arc<dyn DownloadSink>,
}

impl Downloader {
    pub fn new(catalog: CatalogClient, sink: Arc<dyn DownloadSink>) -> Self {
        Self { catalog, sink }
    }

    /// Download a listed resource.
    pub async fn download_resource(&self, resource: &Resource) -> Result<DownloadOutcome> {
        let path = resource
            .file_path
            .as_deref()
            .filter(|p| !p.trim().is_empty())
            .ok_or_else(|| AppError::download(resource.display_title(), "resource has no file"))?;
        self.download(resource.id, path, resource.display_title()).await
    }

    /// Download by id, stored path (or absolute URL) and display title.
    pub async fn download(&self, resource_id: i64, file_path: &str, title: &str) -> Result<DownloadOutcome> {
        let url = self.catalog.resolve_download_url(file_path)?;

        let counted = match self.catalog.increment_download_count(resource_id).await {
            Ok(()) => true,
            Err(e) => {
                log::warn!("Could not increment download count for resource {resource_id}: {e}");
                false
            }
        };

        let file_name = file_name_for(title, file_path);
        let saved_to = self.sink.save(&url, &file_name).await?;
        log::info!("Downloaded '{}' to {}", title, saved_to.display());

        Ok(DownloadOutcome {
            url,
            saved_to,
            counted,
        })
    }
}

/// Saves downloads into a local directory.
#[derive(Clone)]
pub struct LocalDownloads {
    client: Client,
    output_dir: PathBuf,
}

impl LocalDownloads {
    pub fn new(client: Client, output_dir: impl Into<PathBuf>) -> Self {
        Self {
            client,
            output_dir: output_dir.into(),
        }
    }

    /// Write body chunks to a temp file, then rename into place.
    async fn write_chunks<S, B, E>(&self, chunks: S, path: &Path) -> Result<()>
    where
        S: Stream<Item = std::result::Result<B, E>>,
        B: AsRef<[u8]>,
        AppError: From<E>,
    {
        tokio::fs::create_dir_all(&self.output_dir).await?;

        let tmp = path.with_extension("part");
        let mut file = tokio::fs::File::create(&tmp).await?;
        let mut chunks = pin!(chunks);
        while let Some(chunk) = chunks.next().await {
            file.write_all(chunk?.as_ref()).await?;
        }
        file.flush().await?;
        drop(file);

        tokio::fs::rename(&tmp, path).await?;
        Ok(())
    }
}

#[async_trait]
impl DownloadSink for LocalDownloads {
    async fn save(&self, url: &str, file_name: &str) -> Result<PathBuf> {
        let response = self.client.get(url).send().await?;
        let status = response.status();
        if !status.is_success() {
            return Err(AppError::download(url, format!("server answered {status}")));
        }

        let path = self.output_dir.join(file_name);
        self.write_chunks(response.bytes_stream(), &path).await?;
        Ok(path)
    }
}
