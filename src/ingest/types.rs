// src/ingest/types.rs
use anyhow::Result;
use chrono::{DateTime, NaiveDateTime, Utc};
use serde::{Deserialize, Deserializer, Serialize};
use serde_json::{Map, Value};
use std::path::Path;

/// Kind of the primary asset attached to a persisted item.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum MediaType {
    Image,
    Video,
}

/// One persisted record of the news store.
///
/// Only `id`, `text` and `date` are required. The other fields tolerate nulls and
/// unexpected values from older writers, and unknown fields are carried through
/// `extra` so a rewrite never loses them.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct NewsItem {
    pub id: String, // "<source>_<messageNumber>"
    #[serde(default, deserialize_with = "lenient_string")]
    pub source: String,
    pub text: String,
    pub date: String, // ISO-8601
    #[serde(default, deserialize_with = "lenient_string")]
    pub link: String,
    #[serde(default, deserialize_with = "lenient_opt_string")]
    pub media: Option<String>,
    #[serde(default, deserialize_with = "lenient_media_type")]
    pub media_type: Option<MediaType>,
    #[serde(default, deserialize_with = "lenient_opt_string")]
    pub poster: Option<String>,
    #[serde(default, deserialize_with = "lenient_bool")]
    pub sensitive: bool,
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

fn lenient_string<'de, D: Deserializer<'de>>(d: D) -> std::result::Result<String, D::Error> {
    Ok(lenient_opt_string(d)?.unwrap_or_default())
}

fn lenient_opt_string<'de, D: Deserializer<'de>>(
    d: D,
) -> std::result::Result<Option<String>, D::Error> {
    Ok(match Value::deserialize(d)? {
        Value::String(s) => Some(s),
        _ => None,
    })
}

fn lenient_media_type<'de, D: Deserializer<'de>>(
    d: D,
) -> std::result::Result<Option<MediaType>, D::Error> {
    Ok(serde_json::from_value(Value::deserialize(d)?).unwrap_or(None))
}

fn lenient_bool<'de, D: Deserializer<'de>>(d: D) -> std::result::Result<bool, D::Error> {
    Ok(matches!(Value::deserialize(d)?, Value::Bool(true)))
}

impl NewsItem {
    /// Numeric message suffix of the id, if the id is well formed.
    pub fn message_number(&self) -> Option<i64> {
        let (_, suffix) = self.id.rsplit_once('_')?;
        suffix.parse().ok()
    }

    /// Parsed `date`; accepts RFC 3339 and offset-less ISO timestamps (read as UTC).
    pub fn sort_key(&self) -> Option<DateTime<Utc>> {
        if let Ok(dt) = DateTime::parse_from_rfc3339(&self.date) {
            return Some(dt.with_timezone(&Utc));
        }
        NaiveDateTime::parse_from_str(&self.date, "%Y-%m-%dT%H:%M:%S%.f")
            .ok()
            .map(|dt| dt.and_utc())
    }
}

/// Store identity of a message: channel name + source message number.
pub fn item_id(source: &str, number: i64) -> String {
    format!("{source}_{number}")
}

/// Fallback canonical link when the message carries no embedded one.
pub fn permalink(source: &str, number: i64) -> String {
    format!("https://t.me/{source}/{number}")
}

/// How a channel is addressed on the source platform.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum ChannelTarget {
    ByHandle(String),
    ByIdentity { id: i64, access_hash: i64 },
}

impl ChannelTarget {
    /// Prefer the numeric identity when both id and hash are known, else the handle.
    pub fn select(name: &str, id: Option<i64>, access_hash: Option<i64>) -> Self {
        match (id, access_hash) {
            (Some(id), Some(access_hash)) => ChannelTarget::ByIdentity { id, access_hash },
            _ => ChannelTarget::ByHandle(name.to_string()),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ChannelDescriptor {
    pub name: String, // display + dedup namespace
    pub target: ChannelTarget,
}

impl ChannelDescriptor {
    pub fn by_handle(name: impl Into<String>) -> Self {
        let name = name.into();
        Self {
            target: ChannelTarget::ByHandle(name.clone()),
            name,
        }
    }

    pub fn by_identity(name: impl Into<String>, id: i64, access_hash: i64) -> Self {
        Self {
            name: name.into(),
            target: ChannelTarget::ByIdentity { id, access_hash },
        }
    }
}

/// Opaque peer reference handed back by [`SourceClient::resolve`].
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ResolvedChannel {
    pub peer: String,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum MessageEntity {
    TextUrl {
        url: String,
    },
    #[serde(other)]
    Other,
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum MediaKind {
    Photo,
    Video,
    Document,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct MediaAttachment {
    pub kind: MediaKind,
    #[serde(default)]
    pub mime_type: Option<String>,
    /// Size declared by the platform, before any download.
    #[serde(default)]
    pub size: Option<u64>,
    #[serde(default)]
    pub spoiler: bool,
    pub file_ref: String,
    #[serde(default)]
    pub thumb_ref: Option<String>,
}

impl MediaAttachment {
    pub fn is_video(&self) -> bool {
        self.kind == MediaKind::Video
            || self
                .mime_type
                .as_deref()
                .is_some_and(|m| m.starts_with("video/"))
    }

    pub fn declared_size(&self) -> u64 {
        self.size.unwrap_or(0)
    }
}

/// A message as listed by the source platform.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct SourceMessage {
    pub id: i64,
    pub date: DateTime<Utc>,
    #[serde(default)]
    pub text: Option<String>,
    #[serde(default)]
    pub entities: Vec<MessageEntity>,
    #[serde(default)]
    pub media: Option<MediaAttachment>,
}

impl SourceMessage {
    pub fn has_content(&self) -> bool {
        self.text.as_deref().is_some_and(|t| !t.is_empty()) || self.media.is_some()
    }

    /// First text-URL entity of the message.
    pub fn embedded_link(&self) -> Option<&str> {
        self.entities.iter().find_map(|e| match e {
            MessageEntity::TextUrl { url } => Some(url.as_str()),
            MessageEntity::Other => None,
        })
    }

    pub fn is_sensitive(&self) -> bool {
        self.media.as_ref().is_some_and(|m| m.spoiler)
    }
}

/// Connection to the message-source platform.
///
/// Errors are treated as network faults and are caught per channel by the caller.
#[async_trait::async_trait]
pub trait SourceClient: Send + Sync {
    async fn resolve(&self, target: &ChannelTarget) -> Result<ResolvedChannel>;

    /// Up to `limit` most recent messages with `id > min_id`, newest first.
    async fn list_messages(
        &self,
        channel: &ResolvedChannel,
        limit: usize,
        min_id: i64,
    ) -> Result<Vec<SourceMessage>>;

    /// Write the full attachment to `dest`. `Ok(false)` means the platform had no file.
    async fn download_media(&self, media: &MediaAttachment, dest: &Path) -> Result<bool>;

    /// Write the platform thumbnail to `dest`. `Ok(false)` means there is none.
    async fn download_thumbnail(&self, media: &MediaAttachment, dest: &Path) -> Result<bool>;

    fn name(&self) -> &'static str;
}
