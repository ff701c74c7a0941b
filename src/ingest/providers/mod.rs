// src/ingest/providers/mod.rs
pub mod fixture;
pub mod http_bridge;

use crate::ingest::types::SourceClient;
use anyhow::{bail, Result};

pub const ENV_FIXTURE_DIR: &str = "SOURCE_FIXTURE_DIR";
pub const ENV_API_BASE: &str = "SOURCE_API_BASE";
pub const ENV_API_TOKEN: &str = "SOURCE_API_TOKEN";

/// Pick the source client from the environment:
/// 1) $SOURCE_FIXTURE_DIR → offline fixture client
/// 2) $SOURCE_API_BASE + $SOURCE_API_TOKEN → gateway client (session checked)
///
/// Missing credentials or a failed session check are fatal for the run.
pub async fn client_from_env() -> Result<Box<dyn SourceClient>> {
    if let Ok(dir) = std::env::var(ENV_FIXTURE_DIR) {
        return Ok(Box::new(fixture::FixtureClient::open(dir)?));
    }

    let base = std::env::var(ENV_API_BASE).unwrap_or_default();
    let token = std::env::var(ENV_API_TOKEN).unwrap_or_default();
    if base.trim().is_empty() || token.trim().is_empty() {
        bail!("{ENV_API_BASE} and {ENV_API_TOKEN} must be set (or {ENV_FIXTURE_DIR})");
    }
    let client = http_bridge::HttpBridgeClient::connect(&base, &token).await?;
    Ok(Box::new(client))
}
