// src/media/pipeline.rs
//! Per-item media state machine: classify, size gate, poster, video transcode,
//! poster-from-video fallback, image path.

use super::assets::AssetStore;
use super::image_codec::ImageCodec;
use super::tier::CompressionTier;
use super::transcoder::VideoTranscoder;
use super::{AssetNames, MediaLimits, MediaOutcome, MIB};
use crate::ingest::types::{MediaAttachment, MediaType, SourceClient, SourceMessage};
use anyhow::{Context, Result};
use metrics::counter;
use std::path::Path;
use tracing::{debug, info, warn};

/// Seek offsets tried for the fallback poster; the second covers clips shorter than 1s.
const POSTER_SEEKS: [f64; 2] = [1.0, 0.0];

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Plan {
    Image,
    Video,
    PosterOnly,
}

pub struct MediaPipeline<'a> {
    client: &'a dyn SourceClient,
    transcoder: &'a dyn VideoTranscoder,
    codec: &'a dyn ImageCodec,
    assets: &'a dyn AssetStore,
    limits: MediaLimits,
}

impl<'a> MediaPipeline<'a> {
    pub fn new(
        client: &'a dyn SourceClient,
        transcoder: &'a dyn VideoTranscoder,
        codec: &'a dyn ImageCodec,
        assets: &'a dyn AssetStore,
        limits: MediaLimits,
    ) -> Self {
        Self {
            client,
            transcoder,
            codec,
            assets,
            limits,
        }
    }

    /// Never fails: errors are logged and reported through [`MediaOutcome::failure`].
    /// Assets already held by the store are reused without any fetch or transcode.
    pub async fn process(&self, message: &SourceMessage, item_id: &str) -> MediaOutcome {
        let mut out = MediaOutcome::default();
        let Some(media) = message.media.as_ref() else {
            return out;
        };

        if let Err(e) = self.run(media, item_id, &mut out).await {
            warn!(item = item_id, error = ?e, "media processing failed");
            out.note_failure(format!("{e:#}"));
        }
        if out.failure.is_some() {
            counter!("sync_media_failures_total").increment(1);
        }
        if out.media.is_none() {
            out.media_type = None;
        }
        out
    }

    async fn run(&self, media: &MediaAttachment, item_id: &str, out: &mut MediaOutcome) -> Result<()> {
        let names = AssetNames::for_item(item_id);
        let plan = self.classify(media, item_id);

        // a stored image never needs its thumbnail again
        let fetch_thumb = !(plan == Plan::Image && self.assets.contains(&names.image));
        out.poster = match self.ensure_poster(media, item_id, &names, fetch_thumb).await {
            Ok(p) => p,
            Err(e) => {
                warn!(item = item_id, error = ?e, "poster acquisition failed");
                out.note_failure(format!("poster: {e:#}"));
                None
            }
        };

        match plan {
            Plan::Video => self.video(media, item_id, &names, out).await,
            Plan::PosterOnly => {
                out.fall_back_to_poster();
                Ok(())
            }
            Plan::Image => self.image(media, item_id, &names, out).await,
        }
    }

    fn classify(&self, media: &MediaAttachment, item_id: &str) -> Plan {
        if !media.is_video() {
            return Plan::Image;
        }
        let declared = media.declared_size();
        if declared > self.limits.video_source_ceiling {
            info!(
                item = item_id,
                mib = declared / MIB,
                "video above source ceiling, keeping poster only"
            );
            return Plan::PosterOnly;
        }
        Plan::Video
    }

    async fn ensure_poster(
        &self,
        media: &MediaAttachment,
        item_id: &str,
        names: &AssetNames,
        fetch_thumb: bool,
    ) -> Result<Option<String>> {
        if self.assets.contains(&names.poster) {
            return Ok(Some(self.assets.url_for(&names.poster)));
        }
        if !fetch_thumb {
            return Ok(None);
        }

        let thumb = self.assets.scratch(item_id, "_thumb")?;
        let found = self
            .client
            .download_thumbnail(media, thumb.path())
            .await
            .context("downloading thumbnail")?;
        if !found {
            return Ok(None);
        }

        let staged = self.assets.scratch(item_id, ".jpg")?;
        self.codec
            .reencode_jpeg(thumb.path(), staged.path())
            .await
            .context("re-encoding thumbnail")?;
        Ok(Some(self.assets.commit(staged, &names.poster)?))
    }

    async fn video(
        &self,
        media: &MediaAttachment,
        item_id: &str,
        names: &AssetNames,
        out: &mut MediaOutcome,
    ) -> Result<()> {
        if self.assets.contains(&names.video) {
            out.set(self.assets.url_for(&names.video), MediaType::Video);
        } else {
            let raw = self.assets.scratch(item_id, "_raw")?;
            let found = self
                .client
                .download_media(media, raw.path())
                .await
                .context("downloading video")?;
            if found {
                let raw_size = tokio::fs::metadata(raw.path()).await?.len();
                let tier = CompressionTier::for_size(raw_size);
                info!(
                    item = item_id,
                    tier = tier.as_str(),
                    bytes = raw_size,
                    "transcoding video"
                );

                let staged = self.assets.scratch(item_id, ".mp4")?;
                match self
                    .transcoder
                    .transcode(raw.path(), staged.path(), &tier.params())
                    .await
                {
                    Err(e) => {
                        warn!(item = item_id, error = %e, "transcode failed, falling back to poster");
                        out.note_failure(format!("transcode: {e}"));
                        out.fall_back_to_poster();
                    }
                    Ok(()) => {
                        let size = tokio::fs::metadata(staged.path()).await?.len();
                        if size > self.limits.asset_ceiling {
                            warn!(
                                item = item_id,
                                bytes = size,
                                "transcoded video above asset ceiling, dropping media"
                            );
                            *out = MediaOutcome::default();
                            return Ok(());
                        }
                        counter!("sync_videos_transcoded_total", "tier" => tier.as_str())
                            .increment(1);
                        let url = self.assets.commit(staged, &names.video)?;
                        out.set(url, MediaType::Video);
                    }
                }
            }
        }

        if !self.assets.contains(&names.poster) {
            if let Some(video_path) = self.assets.local_path(&names.video) {
                out.poster = self.poster_from_video(&video_path, item_id, names).await;
            }
        }
        Ok(())
    }

    /// Non-fatal: any failure leaves the poster empty.
    async fn poster_from_video(
        &self,
        video: &Path,
        item_id: &str,
        names: &AssetNames,
    ) -> Option<String> {
        for at in POSTER_SEEKS {
            let staged = match self.assets.scratch(item_id, ".jpg") {
                Ok(f) => f,
                Err(e) => {
                    warn!(item = item_id, error = ?e, "no scratch space for poster");
                    return None;
                }
            };
            match self.transcoder.extract_frame(video, staged.path(), at).await {
                Ok(()) => {
                    return match self.assets.commit(staged, &names.poster) {
                        Ok(url) => Some(url),
                        Err(e) => {
                            warn!(item = item_id, error = ?e, "could not store fallback poster");
                            None
                        }
                    };
                }
                Err(e) => debug!(item = item_id, at, error = %e, "frame extraction failed"),
            }
        }
        warn!(item = item_id, "could not generate fallback poster");
        None
    }

    async fn image(
        &self,
        media: &MediaAttachment,
        item_id: &str,
        names: &AssetNames,
        out: &mut MediaOutcome,
    ) -> Result<()> {
        if self.assets.contains(&names.image) {
            out.set(self.assets.url_for(&names.image), MediaType::Image);
            return Ok(());
        }

        let raw = self.assets.scratch(item_id, "")?;
        let found = self
            .client
            .download_media(media, raw.path())
            .await
            .context("downloading image")?;
        if !found {
            return Ok(());
        }

        let staged = self.assets.scratch(item_id, ".jpg")?;
        self.codec
            .reencode_jpeg(raw.path(), staged.path())
            .await
            .context("re-encoding image")?;
        let url = self.assets.commit(staged, &names.image)?;
        out.set(url, MediaType::Image);
        Ok(())
    }
}
