// src/media/mod.rs
pub mod assets;
pub mod image_codec;
pub mod pipeline;
pub mod tier;
pub mod transcoder;

use crate::ingest::types::MediaType;

pub const MIB: u64 = 1024 * 1024;

/// Hard size limits applied by the pipeline and the safety sweep.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct MediaLimits {
    /// Declared video size above which only a poster is produced.
    pub video_source_ceiling: u64,
    /// No persisted asset may be larger than this.
    pub asset_ceiling: u64,
}

impl Default for MediaLimits {
    fn default() -> Self {
        Self {
            video_source_ceiling: 50 * MIB,
            asset_ceiling: 22 * MIB,
        }
    }
}

/// Media fields of one item, as produced by [`pipeline::MediaPipeline::process`].
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct MediaOutcome {
    pub media: Option<String>,
    pub media_type: Option<MediaType>,
    pub poster: Option<String>,
    /// Set when processing degraded; the item is still stored.
    pub failure: Option<String>,
}

impl MediaOutcome {
    fn set(&mut self, url: String, kind: MediaType) {
        self.media = Some(url);
        self.media_type = Some(kind);
    }

    /// Poster stands in as the primary image.
    fn fall_back_to_poster(&mut self) {
        self.media = self.poster.clone();
        self.media_type = self.media.as_ref().map(|_| MediaType::Image);
    }

    fn note_failure(&mut self, msg: String) {
        match &mut self.failure {
            Some(existing) => {
                existing.push_str("; ");
                existing.push_str(&msg);
            }
            None => self.failure = Some(msg),
        }
    }
}

/// Asset names derived from an item id.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AssetNames {
    pub poster: String,
    pub video: String,
    pub image: String,
}

impl AssetNames {
    pub fn for_item(item_id: &str) -> Self {
        Self {
            poster: format!("{item_id}_poster.jpg"),
            video: format!("{item_id}.mp4"),
            image: format!("{item_id}.jpg"),
        }
    }
}

pub use pipeline::MediaPipeline;
