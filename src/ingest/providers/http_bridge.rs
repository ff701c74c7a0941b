// src/ingest/providers/http_bridge.rs
//! Client for an HTTP gateway in front of the messaging platform.
//!
//! The gateway owns the platform session; this side only speaks JSON over HTTPS
//! with a bearer token.

use anyhow::{Context, Result};
use async_trait::async_trait;
use reqwest::{Client, StatusCode};
use serde::Deserialize;
use std::path::Path;
use std::time::Duration;
use tokio::io::AsyncWriteExt;

use crate::ingest::types::{
    ChannelTarget, MediaAttachment, ResolvedChannel, SourceClient, SourceMessage,
};

#[derive(Debug, Deserialize)]
struct ResolveResponse {
    peer: String,
}

#[derive(Clone)]
pub struct HttpBridgeClient {
    base: String,
    token: String,
    client: Client,
}

impl HttpBridgeClient {
    pub fn new(base: &str, token: &str) -> Result<Self> {
        let client = Client::builder()
            .connect_timeout(Duration::from_secs(15))
            .timeout(Duration::from_secs(300))
            .build()
            .context("building http client")?;
        Ok(Self {
            base: base.trim_end_matches('/').to_string(),
            token: token.to_string(),
            client,
        })
    }

    /// Build the client and verify the gateway session is usable.
    pub async fn connect(base: &str, token: &str) -> Result<Self> {
        let c = Self::new(base, token)?;
        c.client
            .get(c.url("/v1/session"))
            .bearer_auth(&c.token)
            .send()
            .await
            .context("bridge session check")?
            .error_for_status()
            .context("bridge rejected session")?;
        Ok(c)
    }

    fn url(&self, path: &str) -> String {
        format!("{}{}", self.base, path)
    }

    async fn download_to(&self, file_ref: &str, dest: &Path) -> Result<bool> {
        let resp = self
            .client
            .get(self.url(&format!("/v1/files/{}", file_ref.trim_start_matches('/'))))
            .bearer_auth(&self.token)
            .send()
            .await
            .context("bridge file get()")?;
        if resp.status() == StatusCode::NOT_FOUND {
            return Ok(false);
        }
        let mut resp = resp.error_for_status().context("bridge file status")?;

        let mut file = tokio::fs::File::create(dest)
            .await
            .with_context(|| format!("creating {}", dest.display()))?;
        while let Some(chunk) = resp.chunk().await.context("bridge file body")? {
            file.write_all(&chunk).await?;
        }
        file.flush().await?;
        Ok(true)
    }
}

#[async_trait]
impl SourceClient for HttpBridgeClient {
    async fn resolve(&self, target: &ChannelTarget) -> Result<ResolvedChannel> {
        let query: Vec<(&str, String)> = match target {
            ChannelTarget::ByHandle(name) => vec![("handle", name.clone())],
            ChannelTarget::ByIdentity { id, access_hash } => vec![
                ("id", id.to_string()),
                ("access_hash", access_hash.to_string()),
            ],
        };
        let body: ResolveResponse = self
            .client
            .get(self.url("/v1/resolve"))
            .bearer_auth(&self.token)
            .query(&query)
            .send()
            .await
            .context("bridge resolve get()")?
            .error_for_status()?
            .json()
            .await
            .context("bridge resolve body")?;
        Ok(ResolvedChannel { peer: body.peer })
    }

    async fn list_messages(
        &self,
        channel: &ResolvedChannel,
        limit: usize,
        min_id: i64,
    ) -> Result<Vec<SourceMessage>> {
        let messages = self
            .client
            .get(self.url(&format!("/v1/peers/{}/messages", channel.peer)))
            .bearer_auth(&self.token)
            .query(&[("limit", limit.to_string()), ("min_id", min_id.to_string())])
            .send()
            .await
            .context("bridge messages get()")?
            .error_for_status()?
            .json()
            .await
            .context("bridge messages body")?;
        Ok(messages)
    }

    async fn download_media(&self, media: &MediaAttachment, dest: &Path) -> Result<bool> {
        self.download_to(&media.file_ref, dest).await
    }

    async fn download_thumbnail(&self, media: &MediaAttachment, dest: &Path) -> Result<bool> {
        match media.thumb_ref.as_deref() {
            Some(r) => self.download_to(r, dest).await,
            None => Ok(false),
        }
    }

    fn name(&self) -> &'static str {
        "http-bridge"
    }
}
