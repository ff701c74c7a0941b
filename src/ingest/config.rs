// src/ingest/config.rs
use crate::ingest::types::{ChannelDescriptor, ChannelTarget};
use anyhow::{Context, Result};
use std::fs;
use std::path::Path;

/// Load the ordered channel list. Missing or unreadable file is an error.
///
/// One channel per line: `Name`, `Name|Id` or `Name|Id|AccessHash`.
pub fn load_channels_from(path: &Path) -> Result<Vec<ChannelDescriptor>> {
    let content = fs::read_to_string(path)
        .with_context(|| format!("reading channel list from {}", path.display()))?;
    Ok(parse_channels(&content))
}

pub fn parse_channels(s: &str) -> Vec<ChannelDescriptor> {
    s.lines().filter_map(parse_channel_line).collect()
}

/// Malformed id/hash parts degrade to a name-only descriptor.
pub fn parse_channel_line(line: &str) -> Option<ChannelDescriptor> {
    let line = line.trim();
    if line.is_empty() {
        return None;
    }

    let parts: Vec<&str> = line.split('|').map(str::trim).collect();
    let (name, id, hash) = match parts.as_slice() {
        [name, id, hash] => (*name, id.parse().ok(), hash.parse().ok()),
        [name, id] => (*name, id.parse().ok(), None),
        _ => (line, None, None),
    };
    if name.is_empty() {
        tracing::warn!(line, "channel line without a name, skipping");
        return None;
    }

    Some(ChannelDescriptor {
        name: name.to_string(),
        target: ChannelTarget::select(name, id, hash),
    })
}
