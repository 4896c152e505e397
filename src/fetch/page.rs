use std::path::Path;

use anyhow::{Context, Result};
use reqwest::Client;
use tokio::fs;
use tracing::info;

/// The state page carrying the "Public Use Datasets" section.
pub const DATA_PAGE_URL: &str =
    "https://www.michigan.gov/coronavirus/0,9753,7-406-98163_98173---,00.html";

/// Where the fetched page is cached; link extraction parses this file.
pub const PAGE_CACHE: &str = "data/page.html";

/// Fetch the source data page and save its HTML body to `dest`.
pub async fn fetch_main_page(client: &Client, dest: impl AsRef<Path>) -> Result<()> {
    let dest = dest.as_ref();
    if let Some(parent) = dest.parent() {
        fs::create_dir_all(parent).await?;
    }

    let resp = client
        .get(DATA_PAGE_URL)
        .send()
        .await
        .context("requesting the source data page")?
        .error_for_status()
        .context("source data page returned an error status")?;
    let body = resp.bytes().await?;
    fs::write(dest, &body)
        .await
        .with_context(|| format!("writing {}", dest.display()))?;

    info!(bytes = body.len(), dest = %dest.display(), "cached source page");
    Ok(())
}
