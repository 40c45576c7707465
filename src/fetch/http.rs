// src/fetch/http.rs
use anyhow::{Context, Result};
use reqwest::Client;
use std::{path::Path, time::Duration};
use tokio::{fs::File, io::AsyncWriteExt, time::sleep};
use tracing::{error, warn};
use url::Url;

pub const MAX_RETRIES: u32 = 3;
const INITIAL_BACKOFF_MS: u64 = 500;

/// Stream `url` into `dest`, retrying with exponential backoff.
///
/// 4xx responses are not retried: the archive simply does not exist.
pub async fn download(client: &Client, url: &Url, dest: &Path) -> Result<u64> {
    let mut attempts = 0;
    loop {
        match download_once(client, url, dest).await {
            Ok(n) => return Ok(n),
            Err(e) if attempts + 1 < MAX_RETRIES && !is_client_error(&e) => {
                attempts += 1;
                let backoff = INITIAL_BACKOFF_MS * 2u64.pow(attempts - 1);
                warn!(%url, attempt = attempts, delay_ms = backoff, error = %e, "Retrying");
                sleep(Duration::from_millis(backoff)).await;
            }
            Err(e) => {
                error!(%url, error = %e, "download failed");
                return Err(e);
            }
        }
    }
}

async fn download_once(client: &Client, url: &Url, dest: &Path) -> Result<u64> {
    let mut resp = client
        .get(url.clone())
        .send()
        .await
        .with_context(|| format!("GET {url}"))?
        .error_for_status()?;

    let mut file = File::create(dest)
        .await
        .with_context(|| format!("creating {}", dest.display()))?;
    let mut written = 0u64;
    while let Some(chunk) = resp.chunk().await? {
        file.write_all(&chunk).await?;
        written += chunk.len() as u64;
    }
    file.flush().await?;
    Ok(written)
}

fn is_client_error(e: &anyhow::Error) -> bool {
    e.downcast_ref::<reqwest::Error>()
        .and_then(reqwest::Error::status)
        .is_some_and(|s| s.is_client_error())
}
