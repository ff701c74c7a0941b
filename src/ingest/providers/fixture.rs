// src/ingest/providers/fixture.rs
//! Offline source backed by a directory of message dumps.
//!
//! Layout: `<root>/<peer>.json` holds a JSON array of [`SourceMessage`]; a handle
//! resolves to its own name as peer, an identity to its numeric id. Attachment
//! `file_ref` / `thumb_ref` values are paths relative to `<root>`.

use anyhow::{anyhow, Context, Result};
use async_trait::async_trait;
use std::path::{Path, PathBuf};

use crate::ingest::types::{
    ChannelTarget, MediaAttachment, ResolvedChannel, SourceClient, SourceMessage,
};

pub struct FixtureClient {
    root: PathBuf,
}

impl FixtureClient {
    pub fn open(root: impl Into<PathBuf>) -> Result<Self> {
        let root = root.into();
        if !root.is_dir() {
            return Err(anyhow!("fixture dir {} does not exist", root.display()));
        }
        Ok(Self { root })
    }

    fn dump_path(&self, peer: &str) -> PathBuf {
        self.root.join(format!("{peer}.json"))
    }

    async fn copy_ref(&self, file_ref: Option<&str>, dest: &Path) -> Result<bool> {
        let Some(file_ref) = file_ref else {
            return Ok(false);
        };
        let src = self.root.join(file_ref);
        if !src.is_file() {
            return Ok(false);
        }
        tokio::fs::copy(&src, dest)
            .await
            .with_context(|| format!("copying {}", src.display()))?;
        Ok(true)
    }
}

#[async_trait]
impl SourceClient for FixtureClient {
    async fn resolve(&self, target: &ChannelTarget) -> Result<ResolvedChannel> {
        let peer = match target {
            ChannelTarget::ByHandle(name) => name.clone(),
            ChannelTarget::ByIdentity { id, .. } => id.to_string(),
        };
        if !self.dump_path(&peer).is_file() {
            return Err(anyhow!("unknown channel {peer}"));
        }
        Ok(ResolvedChannel { peer })
    }

    async fn list_messages(
        &self,
        channel: &ResolvedChannel,
        limit: usize,
        min_id: i64,
    ) -> Result<Vec<SourceMessage>> {
        let path = self.dump_path(&channel.peer);
        let raw = tokio::fs::read_to_string(&path)
            .await
            .with_context(|| format!("reading {}", path.display()))?;
        let mut messages: Vec<SourceMessage> =
            serde_json::from_str(&raw).context("parsing fixture messages")?;

        messages.retain(|m| m.id > min_id);
        messages.sort_by(|a, b| b.id.cmp(&a.id));
        messages.truncate(limit);
        Ok(messages)
    }

    async fn download_media(&self, media: &MediaAttachment, dest: &Path) -> Result<bool> {
        self.copy_ref(Some(&media.file_ref), dest).await
    }

    async fn download_thumbnail(&self, media: &MediaAttachment, dest: &Path) -> Result<bool> {
        self.copy_ref(media.thumb_ref.as_deref(), dest).await
    }

    fn name(&self) -> &'static str {
        "fixture"
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;

    #[tokio::test]
    async fn lists_newest_first_above_min_id() {
        let dir = tempfile::tempdir().unwrap();
        fs::write(
            dir.path().join("chan.json"),
            r#"[
              {"id": 1, "date": "2024-01-01T00:00:00Z", "text": "a"},
              {"id": 3, "date": "2024-01-03T00:00:00Z", "text": "c"},
              {"id": 2, "date": "2024-01-02T00:00:00Z", "text": "b"}
            ]"#,
        )
        .unwrap();
        let client = FixtureClient::open(dir.path()).unwrap();

        let peer = client
            .resolve(&ChannelTarget::ByHandle("chan".into()))
            .await
            .unwrap();
        let msgs = client.list_messages(&peer, 5, 1).await.unwrap();
        let ids: Vec<i64> = msgs.iter().map(|m| m.id).collect();
        assert_eq!(ids, vec![3, 2]);

        let one = client.list_messages(&peer, 1, 0).await.unwrap();
        assert_eq!(one[0].id, 3);

        assert!(client
            .resolve(&ChannelTarget::ByHandle("missing".into()))
            .await
            .is_err());
    }
}
