// src/store/mod.rs
//! The persisted news store: a JSON array of [`NewsItem`], read once and written once per run.

pub mod merge;
pub mod sweep;

use crate::ingest::types::NewsItem;
use crate::media::assets::publish_permissions;
use anyhow::{Context, Result};
use std::fs;
use std::io::{ErrorKind, Write};
use std::path::Path;
use tempfile::NamedTempFile;
use tracing::{info, warn};

pub use merge::{merge, sort_by_date_desc};
pub use sweep::{safety_sweep, SweepReport};

/// Read the store. Missing or corrupt file → empty store; records without a string
/// `id`, `text` or `date` are dropped, everything else is kept as loaded.
pub fn load_store(path: &Path) -> Vec<NewsItem> {
    let raw = match fs::read_to_string(path) {
        Ok(s) => s,
        Err(e) if e.kind() == ErrorKind::NotFound => {
            info!(path = %path.display(), "no existing store, starting empty");
            return Vec::new();
        }
        Err(e) => {
            warn!(error = ?e, path = %path.display(), "store unreadable, starting empty");
            return Vec::new();
        }
    };

    let values: Vec<serde_json::Value> = match serde_json::from_str(&raw) {
        Ok(v) => v,
        Err(e) => {
            warn!(error = %e, path = %path.display(), "store is not a JSON array, starting empty");
            return Vec::new();
        }
    };

    let total = values.len();
    let items: Vec<NewsItem> = values
        .into_iter()
        .filter_map(|v| serde_json::from_value(v).ok())
        .collect();
    if items.len() < total {
        warn!(dropped = total - items.len(), "skipped malformed store records");
    }
    items
}

/// Overwrite the store through a temp file in the same directory + rename.
pub fn write_store(path: &Path, items: &[NewsItem]) -> Result<()> {
    let dir = path
        .parent()
        .filter(|p| !p.as_os_str().is_empty())
        .unwrap_or_else(|| Path::new("."));
    fs::create_dir_all(dir).with_context(|| format!("creating {}", dir.display()))?;

    let json = serde_json::to_vec_pretty(items).context("serializing store")?;
    let mut tmp = NamedTempFile::new_in(dir).context("creating temp store file")?;
    tmp.write_all(&json)?;
    tmp.as_file().sync_all()?;
    tmp.persist(path)
        .map_err(|e| e.error)
        .with_context(|| format!("replacing {}", path.display()))?;
    publish_permissions(path)?;
    info!(path = %path.display(), items = items.len(), "store written");
    Ok(())
}
