//! Dataset archive download

use crate::error::{AsnError, Result};
use async_trait::async_trait;
use indicatif::{ProgressBar, ProgressStyle};
use log::{debug, warn};
use std::path::Path;
use std::time::Duration;
use tokio::io::AsyncWriteExt;

/// Source of the compressed dataset archive
///
/// [`crate::dataset::DatasetStore`] only needs "put the archive at this
/// path"; the HTTP implementation is [`HttpArchiveFetcher`].
#[async_trait]
pub trait ArchiveFetcher: Send + Sync {
    /// Fetch the archive at `url` and write it to `dest`
    ///
    /// Returns the number of bytes written.
    async fn fetch(&self, url: &str, dest: &Path) -> Result<u64>;
}

/// Streams the archive over HTTPS with a progress bar
#[derive(Debug, Clone)]
pub struct HttpArchiveFetcher {
    client: reqwest::Client,
    show_progress: bool,
}

impl HttpArchiveFetcher {
    /// Create a fetcher that draws progress on stderr
    pub fn new() -> Self {
        Self::with_progress(true)
    }

    /// Create a fetcher, optionally without progress output
    pub fn with_progress(show_progress: bool) -> Self {
        let client = reqwest::Client::builder()
            .connect_timeout(Duration::from_secs(30))
            .user_agent(concat!("asn-scanner/", env!("CARGO_PKG_VERSION")))
            .build()
            .unwrap_or_default();
        Self {
            client,
            show_progress,
        }
    }
}

impl Default for HttpArchiveFetcher {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl ArchiveFetcher for HttpArchiveFetcher {
    async fn fetch(&self, url: &str, dest: &Path) -> Result<u64> {
        debug!("downloading dataset archive from {url}");

        let mut response = self
            .client
            .get(url)
            .send()
            .await
            .and_then(reqwest::Response::error_for_status)
            .map_err(|e| AsnError::Network(e.to_string()))?;

        // A zero Content-Length is treated the same as a missing one
        let total = response.content_length().filter(|&n| n > 0);
        if total.is_none() {
            warn!("Content-Length unknown, progress will show bytes instead of percent");
        }
        let bar = download_bar(total, self.show_progress);

        let mut out = tokio::fs::File::create(dest)
            .await
            .map_err(|e| AsnError::fs(dest, e))?;

        let mut downloaded: u64 = 0;
        while let Some(chunk) = response
            .chunk()
            .await
            .map_err(|e| AsnError::Network(e.to_string()))?
        {
            out.write_all(&chunk)
                .await
                .map_err(|e| AsnError::fs(dest, e))?;
            downloaded += chunk.len() as u64;
            bar.set_position(downloaded);
        }
        out.flush().await.map_err(|e| AsnError::fs(dest, e))?;

        bar.finish_with_message("Download completed!");
        debug!("downloaded {downloaded} bytes to {}", dest.display());
        Ok(downloaded)
    }
}

/// Progress bar for a download of optionally known size
///
/// Without a known size a spinner with a raw byte counter is shown, so no
/// percentage is ever computed against an unknown total.
pub(crate) fn download_bar(total: Option<u64>, visible: bool) -> ProgressBar {
    if !visible {
        return ProgressBar::hidden();
    }

    match total {
        Some(len) => {
            let bar = ProgressBar::new(len);
            bar.set_style(
                ProgressStyle::with_template(
                    "[+] Downloading [{bar:50.green}] {percent:>3}% {bytes}/{total_bytes} {msg}",
                )
                .unwrap_or_else(|_| ProgressStyle::default_bar())
                .progress_chars("## "),
            );
            bar
        }
        None => {
            let bar = ProgressBar::new_spinner();
            bar.set_style(
                ProgressStyle::with_template("[+] Downloading {spinner} {bytes} {msg}")
                    .unwrap_or_else(|_| ProgressStyle::default_spinner()),
            );
            bar.enable_steady_tick(Duration::from_millis(120));
            bar
        }
    }
}
