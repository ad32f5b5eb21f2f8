//! File output for crawl results.
//!
//! The catalog is written as pretty-printed JSON. Warnings are not part of
//! the catalog; they are logged and summarized on stdout by the caller.

use dbcrawler_core::error::DbCrawlerError;
use dbcrawler_core::{Catalog, Result};
use std::path::Path;

/// Serializes `catalog` as pretty JSON.
pub fn render_catalog(catalog: &Catalog) -> Result<String> {
    serde_json::to_string_pretty(catalog).map_err(|e| DbCrawlerError::Serialization {
        context: "Failed to serialize catalog".to_string(),
        source: e,
    })
}

/// Writes `catalog` to `output_path`, replacing any existing file.
pub async fn save_catalog(catalog: &Catalog, output_path: &Path) -> Result<()> {
    let json = render_catalog(catalog)?;
    tokio::fs::write(output_path, json)
        .await
        .map_err(|e| DbCrawlerError::Io {
            context: format!("Failed to write to {}", output_path.display()),
            source: e,
        })?;
    tracing::debug!("Wrote catalog to {}", output_path.display());
    Ok(())
}
