// src/config/sync.rs
use crate::media::{MediaLimits, MIB};
use anyhow::{anyhow, Context, Result};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use std::time::Duration;
use std::{env, fs};
use tracing::warn;

pub const ENV_CONFIG_PATH: &str = "NEWS_SYNC_CONFIG";
pub const DEFAULT_CONFIG_PATH: &str = "config/sync.toml";

pub const ENV_CHANNELS: &str = "NEWS_SYNC_CHANNELS";
pub const ENV_OUTPUT: &str = "NEWS_SYNC_OUTPUT";
pub const ENV_MEDIA_DIR: &str = "NEWS_SYNC_MEDIA_DIR";
pub const ENV_LIMIT: &str = "NEWS_SYNC_LIMIT";
pub const ENV_MAX_DURATION: &str = "NEWS_SYNC_MAX_DURATION_SECS";

fn default_limit() -> usize {
    50
}
fn default_max_duration_secs() -> u64 {
    900
}
fn default_video_source_ceiling_mb() -> u64 {
    50
}
fn default_asset_ceiling_mb() -> u64 {
    22
}

/// Upper bound for `max_duration_secs`; larger values are clamped to it.
pub const MAX_DURATION_CAP_SECS: u64 = 7 * 24 * 60 * 60;
/// Upper bound for both size ceilings, in MiB.
pub const CEILING_CAP_MB: u64 = 4096;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SyncConfig {
    pub channels_path: PathBuf,
    /// The JSON store; the diagnostics log is written next to it.
    pub output_path: PathBuf,
    /// Defaults to `<output dir>/media`.
    pub media_dir: Option<PathBuf>,
    pub media_url_prefix: String,
    /// Max messages checked per channel.
    pub limit: usize,
    /// Wall-clock budget before the run stops starting new channels.
    pub max_duration_secs: u64,
    pub video_source_ceiling_mb: u64,
    pub asset_ceiling_mb: u64,
    pub ffmpeg_path: String,
}

impl Default for SyncConfig {
    fn default() -> Self {
        Self {
            channels_path: PathBuf::from("channels.txt"),
            output_path: PathBuf::from("news.json"),
            media_dir: None,
            media_url_prefix: "/media".to_string(),
            limit: default_limit(),
            max_duration_secs: default_max_duration_secs(),
            video_source_ceiling_mb: default_video_source_ceiling_mb(),
            asset_ceiling_mb: default_asset_ceiling_mb(),
            ffmpeg_path: "ffmpeg".to_string(),
        }
    }
}

impl SyncConfig {
    pub fn load_from_file<P: AsRef<Path>>(path: P) -> Result<Self> {
        let path = path.as_ref();
        let data = fs::read_to_string(path)
            .with_context(|| format!("reading sync config {}", path.display()))?;
        let mut cfg: SyncConfig = toml::from_str(&data).context("parsing sync config")?;
        cfg.sanitize();
        Ok(cfg)
    }

    /// Config file lookup + env overrides:
    /// 1) $NEWS_SYNC_CONFIG (must exist when set)
    /// 2) config/sync.toml
    /// 3) built-in defaults
    ///
    /// then `NEWS_SYNC_*` variables override single fields.
    pub fn load_default() -> Result<Self> {
        let mut cfg = if let Ok(p) = env::var(ENV_CONFIG_PATH) {
            let pb = PathBuf::from(p);
            if !pb.exists() {
                return Err(anyhow!("{ENV_CONFIG_PATH} points to non-existent path"));
            }
            Self::load_from_file(&pb)?
        } else if Path::new(DEFAULT_CONFIG_PATH).exists() {
            Self::load_from_file(DEFAULT_CONFIG_PATH)?
        } else {
            Self::default()
        };
        cfg.apply_env_overrides();
        cfg.sanitize();
        Ok(cfg)
    }

    fn apply_env_overrides(&mut self) {
        if let Ok(v) = env::var(ENV_CHANNELS) {
            self.channels_path = PathBuf::from(v);
        }
        if let Ok(v) = env::var(ENV_OUTPUT) {
            self.output_path = PathBuf::from(v);
        }
        if let Ok(v) = env::var(ENV_MEDIA_DIR) {
            self.media_dir = Some(PathBuf::from(v));
        }
        if let Some(v) = parse_env_num(ENV_LIMIT) {
            self.limit = v as usize;
        }
        if let Some(v) = parse_env_num(ENV_MAX_DURATION) {
            self.max_duration_secs = v;
        }
    }

    fn sanitize(&mut self) {
        if self.limit == 0 {
            self.limit = default_limit();
        }
        if self.max_duration_secs == 0 {
            self.max_duration_secs = default_max_duration_secs();
        }
        if self.max_duration_secs > MAX_DURATION_CAP_SECS {
            warn!(
                value = self.max_duration_secs,
                cap = MAX_DURATION_CAP_SECS,
                "max_duration_secs clamped"
            );
            self.max_duration_secs = MAX_DURATION_CAP_SECS;
        }
        if self.video_source_ceiling_mb == 0 {
            self.video_source_ceiling_mb = default_video_source_ceiling_mb();
        }
        if self.asset_ceiling_mb == 0 {
            self.asset_ceiling_mb = default_asset_ceiling_mb();
        }
        self.video_source_ceiling_mb = self.video_source_ceiling_mb.min(CEILING_CAP_MB);
        self.asset_ceiling_mb = self.asset_ceiling_mb.min(CEILING_CAP_MB);
        if self.ffmpeg_path.trim().is_empty() {
            self.ffmpeg_path = "ffmpeg".to_string();
        }
    }

    fn output_dir(&self) -> PathBuf {
        self.output_path
            .parent()
            .map(Path::to_path_buf)
            .unwrap_or_default()
    }

    pub fn media_dir(&self) -> PathBuf {
        self.media_dir
            .clone()
            .unwrap_or_else(|| self.output_dir().join("media"))
    }

    pub fn diagnostics_path(&self) -> PathBuf {
        self.output_dir().join("debug_errors.txt")
    }

    pub fn max_duration(&self) -> Duration {
        Duration::from_secs(self.max_duration_secs)
    }

    pub fn media_limits(&self) -> MediaLimits {
        MediaLimits {
            video_source_ceiling: self.video_source_ceiling_mb.saturating_mul(MIB),
            asset_ceiling: self.asset_ceiling_mb.saturating_mul(MIB),
        }
    }
}

// Invalid numbers are ignored with a warning; the file/default value stays.
fn parse_env_num(key: &str) -> Option<u64> {
    let raw = env::var(key).ok()?;
    match raw.trim().parse::<u64>() {
        Ok(v) => Some(v),
        Err(_) => {
            warn!(key, value = %raw, "ignoring non-numeric override");
            None
        }
    }
}
