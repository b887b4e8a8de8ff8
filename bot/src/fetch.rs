use anyhow::{Context, Result};
use tracing::debug;

/// Fetch a remote resource (icon or banner image) by URL.
///
/// Returns Ok(None) on any non-200 status: a missing resource just means the
/// corresponding field is skipped during reconciliation. The client lives
/// only for this one fetch.
pub async fn fetch_resource(url: &str) -> Result<Option<Vec<u8>>> {
    let client = reqwest::Client::new();
    let resp = client
        .get(url)
        .send()
        .await
        .with_context(|| format!("failed to fetch resource {url}"))?;

    if resp.status() != reqwest::StatusCode::OK {
        debug!(url, status = %resp.status(), "resource unavailable, skipping");
        return Ok(None);
    }

    let bytes = resp
        .bytes()
        .await
        .with_context(|| format!("failed to read resource body {url}"))?;
    Ok(Some(bytes.to_vec()))
}
