//! Where produced assets live.
//!
//! Idempotency is part of this contract: the pipeline asks [`AssetStore::contains`]
//! before producing anything, stages output in [`AssetStore::scratch`] files and only
//! makes it visible through [`AssetStore::commit`]. A half-written asset is therefore
//! never mistaken for a finished one on the next run.

use anyhow::{Context, Result};
use std::fs;
use std::path::{Path, PathBuf};
use tempfile::NamedTempFile;

/// Prefix of every scratch file; such files are transient and removed on drop.
pub const SCRATCH_PREFIX: &str = "temp_";

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AssetEntry {
    pub name: String,
    pub size: u64,
}

pub trait AssetStore: Send + Sync {
    fn contains(&self, name: &str) -> bool;

    /// Public URL under which `name` is served.
    fn url_for(&self, name: &str) -> String;

    /// Local copy of an existing asset, for tools that need a file path.
    fn local_path(&self, name: &str) -> Option<PathBuf>;

    /// Fresh transient file, deleted when dropped unless committed.
    fn scratch(&self, tag: &str, suffix: &str) -> Result<NamedTempFile>;

    /// Publish a staged file as `name`; returns its URL.
    fn commit(&self, staged: NamedTempFile, name: &str) -> Result<String>;

    fn size_of(&self, name: &str) -> Option<u64>;

    fn remove(&self, name: &str) -> Result<()>;

    fn list(&self) -> Result<Vec<AssetEntry>>;
}

/// Flat media directory served as `<url_prefix>/<name>`.
#[derive(Debug, Clone)]
pub struct LocalAssetStore {
    dir: PathBuf,
    url_prefix: String,
}

impl LocalAssetStore {
    pub fn open(dir: impl Into<PathBuf>, url_prefix: &str) -> Result<Self> {
        let dir = dir.into();
        fs::create_dir_all(&dir)
            .with_context(|| format!("creating media dir {}", dir.display()))?;
        Ok(Self {
            dir,
            url_prefix: url_prefix.trim_end_matches('/').to_string(),
        })
    }

    pub fn dir(&self) -> &Path {
        &self.dir
    }
}

impl AssetStore for LocalAssetStore {
    fn contains(&self, name: &str) -> bool {
        self.dir.join(name).is_file()
    }

    fn url_for(&self, name: &str) -> String {
        format!("{}/{}", self.url_prefix, name)
    }

    fn local_path(&self, name: &str) -> Option<PathBuf> {
        let p = self.dir.join(name);
        p.is_file().then_some(p)
    }

    fn scratch(&self, tag: &str, suffix: &str) -> Result<NamedTempFile> {
        tempfile::Builder::new()
            .prefix(&format!("{SCRATCH_PREFIX}{tag}_"))
            .suffix(suffix)
            .tempfile_in(&self.dir)
            .context("creating scratch file")
    }

    fn commit(&self, staged: NamedTempFile, name: &str) -> Result<String> {
        let dest = self.dir.join(name);
        staged
            .persist(&dest)
            .map_err(|e| e.error)
            .with_context(|| format!("publishing {}", dest.display()))?;
        publish_permissions(&dest)?;
        Ok(self.url_for(name))
    }

    fn size_of(&self, name: &str) -> Option<u64> {
        fs::metadata(self.dir.join(name)).ok().map(|m| m.len())
    }

    fn remove(&self, name: &str) -> Result<()> {
        let p = self.dir.join(name);
        fs::remove_file(&p).with_context(|| format!("removing {}", p.display()))
    }

    fn list(&self) -> Result<Vec<AssetEntry>> {
        let mut out = Vec::new();
        let entries = fs::read_dir(&self.dir)
            .with_context(|| format!("listing {}", self.dir.display()))?;
        for entry in entries.flatten() {
            let Ok(meta) = entry.metadata() else { continue };
            if !meta.is_file() {
                continue;
            }
            out.push(AssetEntry {
                name: entry.file_name().to_string_lossy().into_owned(),
                size: meta.len(),
            });
        }
        out.sort_by(|a, b| a.name.cmp(&b.name));
        Ok(out)
    }
}

/// Scratch files are created 0600; published files must be readable by the web server.
pub(crate) fn publish_permissions(path: &Path) -> Result<()> {
    #[cfg(unix)]
    {
        use std::os::unix::fs::PermissionsExt;
        fs::set_permissions(path, fs::Permissions::from_mode(0o644))
            .with_context(|| format!("chmod {}", path.display()))?;
    }
    #[cfg(not(unix))]
    let _ = path;
    Ok(())
}
