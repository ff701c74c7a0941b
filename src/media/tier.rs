// src/media/tier.rs
use super::MIB;

/// Raw sizes at or above this go to the `strong` tier.
pub const STRONG_FROM: u64 = 15 * MIB;
/// Raw sizes at or above this go to the `nuclear` tier.
pub const NUCLEAR_FROM: u64 = 50 * MIB;

/// Compression preset chosen from the raw video size.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CompressionTier {
    Standard,
    Strong,
    Nuclear,
}

/// Encoder settings for one tier. Output is always H.264 + mono AAC, fast-start.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TierParams {
    pub preset: &'static str,
    pub crf: u8,
    pub max_width: u32,
    pub fps: u32,
    pub audio_kbps: u32,
}

impl TierParams {
    /// Width capped at `max_width`, height follows the aspect ratio (kept even).
    pub fn scale_filter(&self) -> String {
        format!("scale='min({},iw)':-2", self.max_width)
    }
}

impl CompressionTier {
    pub fn for_size(raw_bytes: u64) -> Self {
        if raw_bytes < STRONG_FROM {
            CompressionTier::Standard
        } else if raw_bytes < NUCLEAR_FROM {
            CompressionTier::Strong
        } else {
            CompressionTier::Nuclear
        }
    }

    pub fn params(self) -> TierParams {
        match self {
            CompressionTier::Standard => TierParams {
                preset: "faster",
                crf: 28,
                max_width: 480,
                fps: 24,
                audio_kbps: 64,
            },
            CompressionTier::Strong => TierParams {
                preset: "veryfast",
                crf: 34,
                max_width: 360,
                fps: 20,
                audio_kbps: 48,
            },
            CompressionTier::Nuclear => TierParams {
                preset: "ultrafast",
                crf: 40,
                max_width: 360,
                fps: 15,
                audio_kbps: 32,
            },
        }
    }

    pub fn as_str(self) -> &'static str {
        match self {
            CompressionTier::Standard => "standard",
            CompressionTier::Strong => "strong",
            CompressionTier::Nuclear => "nuclear",
        }
    }
}
