use std::path::Path;

use anyhow::{Context, Result};
use reqwest::Client;
use tokio::fs;
use tracing::info;

/// Download one dataset file and save it to `dest`.
pub async fn download_dataset(client: &Client, url: &str, dest: impl AsRef<Path>) -> Result<()> {
    let dest = dest.as_ref();
    if let Some(parent) = dest.parent() {
        fs::create_dir_all(parent).await?;
    }

    let resp = client
        .get(url)
        .send()
        .await
        .with_context(|| format!("requesting {}", url))?
        .error_for_status()
        .with_context(|| format!("{} returned an error status", url))?;
    let bytes = resp.bytes().await?;
    fs::write(dest, &bytes)
        .await
        .with_context(|| format!("writing {}", dest.display()))?;

    info!(bytes = bytes.len(), dest = %dest.display(), "downloaded dataset");
    Ok(())
}
