// tests/common/mod.rs
// Shared mocks: an in-memory source platform and a fake transcoder with call counters.
#![allow(dead_code)]

use anyhow::{anyhow, Result};
use async_trait::async_trait;
use channel_news_sync::ingest::types::{
    ChannelTarget, MediaAttachment, MediaKind, NewsItem, ResolvedChannel, SourceClient,
    SourceMessage,
};
use channel_news_sync::media::tier::TierParams;
use channel_news_sync::media::transcoder::{TranscodeError, VideoTranscoder};
use chrono::{TimeZone, Utc};
use std::collections::{HashMap, HashSet};
use std::io::Cursor;
use std::path::Path;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Mutex;
use std::time::Duration;
use tokio_util::sync::CancellationToken;

pub const MIB: u64 = 1024 * 1024;

#[derive(Debug, Clone)]
pub enum MockFile {
    Bytes(Vec<u8>),
    /// Zero-filled file of the given length, written sparse.
    Sized(u64),
}

#[derive(Default)]
pub struct MockClient {
    pub channels: HashMap<String, Vec<SourceMessage>>,
    pub failing: HashSet<String>,
    pub files: HashMap<String, MockFile>,
    /// Cancel the token as soon as this peer is resolved.
    pub cancel_on: Option<(String, CancellationToken)>,
    /// Move the paused clock forward while this peer is resolved.
    pub advance_on: Option<(String, Duration)>,
    pub resolves: AtomicUsize,
    pub media_downloads: AtomicUsize,
    pub thumb_downloads: AtomicUsize,
}

impl MockClient {
    pub fn with_channel(mut self, peer: &str, messages: Vec<SourceMessage>) -> Self {
        self.channels.insert(peer.to_string(), messages);
        self
    }

    pub fn with_failing(mut self, peer: &str) -> Self {
        self.failing.insert(peer.to_string());
        self
    }

    pub fn with_file(mut self, file_ref: &str, file: MockFile) -> Self {
        self.files.insert(file_ref.to_string(), file);
        self
    }

    pub fn downloads(&self) -> (usize, usize) {
        (
            self.media_downloads.load(Ordering::SeqCst),
            self.thumb_downloads.load(Ordering::SeqCst),
        )
    }

    fn write(&self, file_ref: Option<&str>, dest: &Path) -> Result<bool> {
        let Some(file) = file_ref.and_then(|r| self.files.get(r)) else {
            return Ok(false);
        };
        match file {
            MockFile::Bytes(b) => std::fs::write(dest, b)?,
            MockFile::Sized(len) => std::fs::File::create(dest)?.set_len(*len)?,
        }
        Ok(true)
    }
}

#[async_trait]
impl SourceClient for MockClient {
    async fn resolve(&self, target: &ChannelTarget) -> Result<ResolvedChannel> {
        self.resolves.fetch_add(1, Ordering::SeqCst);
        let peer = match target {
            ChannelTarget::ByHandle(h) => h.clone(),
            ChannelTarget::ByIdentity { id, .. } => id.to_string(),
        };
        if let Some((on, token)) = &self.cancel_on {
            if *on == peer {
                token.cancel();
            }
        }
        if let Some((on, by)) = &self.advance_on {
            if *on == peer {
                tokio::time::advance(*by).await;
            }
        }
        if self.failing.contains(&peer) {
            return Err(anyhow!("connection reset while resolving {peer}"));
        }
        if !self.channels.contains_key(&peer) {
            return Err(anyhow!("no such channel {peer}"));
        }
        Ok(ResolvedChannel { peer })
    }

    async fn list_messages(
        &self,
        channel: &ResolvedChannel,
        limit: usize,
        min_id: i64,
    ) -> Result<Vec<SourceMessage>> {
        let mut v: Vec<SourceMessage> = self
            .channels
            .get(&channel.peer)
            .cloned()
            .unwrap_or_default()
            .into_iter()
            .filter(|m| m.id > min_id)
            .collect();
        v.sort_by(|a, b| b.id.cmp(&a.id));
        v.truncate(limit);
        Ok(v)
    }

    async fn download_media(&self, media: &MediaAttachment, dest: &Path) -> Result<bool> {
        self.media_downloads.fetch_add(1, Ordering::SeqCst);
        self.write(Some(&media.file_ref), dest)
    }

    async fn download_thumbnail(&self, media: &MediaAttachment, dest: &Path) -> Result<bool> {
        self.thumb_downloads.fetch_add(1, Ordering::SeqCst);
        self.write(media.thumb_ref.as_deref(), dest)
    }

    fn name(&self) -> &'static str {
        "mock"
    }
}

/// Fake ffmpeg: writes an output of `output_len` bytes, or fails on request.
pub struct MockTranscoder {
    pub output_len: u64,
    pub fail_transcode: bool,
    /// Frame extraction fails for seeks at or above this offset.
    pub frames_fail_from: Option<f64>,
    pub transcodes: AtomicUsize,
    pub frames: AtomicUsize,
    pub params: Mutex<Vec<TierParams>>,
}

impl Default for MockTranscoder {
    fn default() -> Self {
        Self {
            output_len: 2 * MIB,
            fail_transcode: false,
            frames_fail_from: None,
            transcodes: AtomicUsize::new(0),
            frames: AtomicUsize::new(0),
            params: Mutex::new(Vec::new()),
        }
    }
}

impl MockTranscoder {
    pub fn transcode_calls(&self) -> usize {
        self.transcodes.load(Ordering::SeqCst)
    }

    pub fn frame_calls(&self) -> usize {
        self.frames.load(Ordering::SeqCst)
    }

    pub fn last_params(&self) -> Option<TierParams> {
        self.params.lock().unwrap().last().copied()
    }
}

#[async_trait]
impl VideoTranscoder for MockTranscoder {
    async fn transcode(
        &self,
        _input: &Path,
        output: &Path,
        params: &TierParams,
    ) -> Result<(), TranscodeError> {
        self.transcodes.fetch_add(1, Ordering::SeqCst);
        self.params.lock().unwrap().push(*params);
        if self.fail_transcode {
            return Err(TranscodeError::MissingOutput(output.to_path_buf()));
        }
        let f = std::fs::File::create(output).map_err(|source| TranscodeError::Spawn {
            program: "mock".into(),
            source,
        })?;
        f.set_len(self.output_len)
            .map_err(|source| TranscodeError::Spawn {
                program: "mock".into(),
                source,
            })?;
        Ok(())
    }

    async fn extract_frame(
        &self,
        _input: &Path,
        output: &Path,
        at_secs: f64,
    ) -> Result<(), TranscodeError> {
        self.frames.fetch_add(1, Ordering::SeqCst);
        if self.frames_fail_from.is_some_and(|from| at_secs >= from) {
            return Err(TranscodeError::MissingOutput(output.to_path_buf()));
        }
        std::fs::write(output, png_bytes(32, 18)).map_err(|source| TranscodeError::Spawn {
            program: "mock".into(),
            source,
        })?;
        Ok(())
    }
}

pub fn png_bytes(w: u32, h: u32) -> Vec<u8> {
    let img = image::RgbaImage::from_pixel(w, h, image::Rgba([200, 40, 40, 255]));
    let mut buf = Vec::new();
    image::DynamicImage::ImageRgba8(img)
        .write_to(&mut Cursor::new(&mut buf), image::ImageFormat::Png)
        .unwrap();
    buf
}

pub fn text_message(id: i64, text: &str) -> SourceMessage {
    SourceMessage {
        id,
        date: Utc.with_ymd_and_hms(2024, 6, 1, 0, 0, 0).unwrap() + chrono::Duration::minutes(id),
        text: Some(text.to_string()),
        entities: vec![],
        media: None,
    }
}

pub fn photo(file_ref: &str) -> MediaAttachment {
    MediaAttachment {
        kind: MediaKind::Photo,
        mime_type: None,
        size: None,
        spoiler: false,
        file_ref: file_ref.to_string(),
        thumb_ref: None,
    }
}

pub fn video(file_ref: &str, declared: u64, thumb_ref: Option<&str>) -> MediaAttachment {
    MediaAttachment {
        kind: MediaKind::Document,
        mime_type: Some("video/mp4".into()),
        size: Some(declared),
        spoiler: false,
        file_ref: file_ref.to_string(),
        thumb_ref: thumb_ref.map(str::to_string),
    }
}

pub fn media_message(id: i64, media: MediaAttachment) -> SourceMessage {
    SourceMessage {
        text: None,
        media: Some(media),
        ..text_message(id, "")
    }
}

pub fn stored(id: &str, source: &str, date: &str) -> NewsItem {
    NewsItem {
        id: id.into(),
        source: source.into(),
        text: format!("text of {id}"),
        date: date.into(),
        link: String::new(),
        media: None,
        media_type: None,
        poster: None,
        sensitive: false,
        extra: Default::default(),
    }
}

/// Names of leftover scratch files in a media dir.
pub fn scratch_leftovers(dir: &Path) -> Vec<String> {
    std::fs::read_dir(dir)
        .unwrap()
        .flatten()
        .map(|e| e.file_name().to_string_lossy().into_owned())
        .filter(|n| n.starts_with(channel_news_sync::media::assets::SCRATCH_PREFIX))
        .collect()
}
