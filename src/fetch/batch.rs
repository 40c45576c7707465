// src/fetch/batch.rs
use anyhow::{bail, Context, Result};
use reqwest::Client;
use std::{path::PathBuf, time::Duration};
use tokio::{fs, time::sleep};
use tracing::{info, instrument, warn};
use url::Url;

use super::{ftp, http, urls::dest_file_name};
use crate::config::FetchConfig;

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FetchStatus {
    Downloaded { path: PathBuf, bytes: u64 },
    Skipped(PathBuf),
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FailedFetch {
    pub url: String,
    pub reason: String,
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct FetchReport {
    pub downloaded: Vec<PathBuf>,
    pub skipped: Vec<PathBuf>,
    pub failed: Vec<FailedFetch>,
}

/// Downloads archives one after another, pausing between them.
pub struct BatchFetcher {
    client: Client,
    dest_dir: PathBuf,
    delay: Duration,
    timeout: Duration,
    skip_existing: bool,
}

impl BatchFetcher {
    pub fn new(dest_dir: impl Into<PathBuf>, cfg: &FetchConfig) -> Result<Self> {
        let timeout = Duration::from_secs(cfg.timeout_secs);
        let client = Client::builder()
            .timeout(timeout)
            .build()
            .context("building HTTP client")?;
        Ok(Self {
            client,
            dest_dir: dest_dir.into(),
            delay: Duration::from_secs(cfg.delay_secs),
            timeout,
            skip_existing: cfg.skip_existing,
        })
    }

    /// Fetch one URL into the destination directory.
    ///
    /// Data lands in `<name>.part` first and is renamed once complete, so an
    /// interrupted transfer never looks like a finished archive.
    pub async fn fetch_one(&self, url_str: &str) -> Result<FetchStatus> {
        let url = Url::parse(url_str).with_context(|| format!("parsing {url_str}"))?;
        let name = dest_file_name(&url);
        let dest = self.dest_dir.join(&name);

        if self.skip_existing {
            if let Ok(meta) = fs::metadata(&dest).await {
                if meta.len() > 0 {
                    return Ok(FetchStatus::Skipped(dest));
                }
            }
        }

        fs::create_dir_all(&self.dest_dir)
            .await
            .with_context(|| format!("creating {}", self.dest_dir.display()))?;
        let part = self.dest_dir.join(format!("{name}.part"));

        let result = match url.scheme().to_ascii_lowercase().as_str() {
            "http" | "https" => http::download(&self.client, &url, &part).await,
            "ftp" => ftp::download(&url, &part, self.timeout).await,
            other => bail!("unsupported scheme {other:?} in {url}"),
        };

        match result {
            Ok(bytes) => {
                fs::rename(&part, &dest)
                    .await
                    .with_context(|| format!("renaming {} into place", part.display()))?;
                Ok(FetchStatus::Downloaded { path: dest, bytes })
            }
            Err(e) => {
                let _ = fs::remove_file(&part).await;
                Err(e)
            }
        }
    }

    /// Fetch every URL in order. Failures are recorded and never stop the batch.
    #[instrument(level = "info", skip(self, urls), fields(total = urls.len()))]
    pub async fn fetch_all(&self, urls: &[String]) -> FetchReport {
        let mut report = FetchReport::default();
        for (i, url) in urls.iter().enumerate() {
            if i > 0 && !self.delay.is_zero() {
                sleep(self.delay).await;
            }
            match self.fetch_one(url).await {
                Ok(FetchStatus::Downloaded { path, bytes }) => {
                    info!(n = i + 1, url = %url, bytes, "downloaded");
                    report.downloaded.push(path);
                }
                Ok(FetchStatus::Skipped(path)) => {
                    info!(n = i + 1, url = %url, "already present, skipped");
                    report.skipped.push(path);
                }
                Err(e) => {
                    warn!(n = i + 1, url = %url, error = %e, "fetch failed");
                    report.failed.push(FailedFetch {
                        url: url.clone(),
                        reason: format!("{e:#}"),
                    });
                }
            }
        }
        info!(
            downloaded = report.downloaded.len(),
            skipped = report.skipped.len(),
            failed = report.failed.len(),
            "fetch finished"
        );
        report
    }
}
