// src/ingest/mod.rs
pub mod config;
pub mod normalize;
pub mod providers;
pub mod types;
pub mod watermark;

use crate::diagnostics::SoftErrors;
use crate::ingest::types::{
    item_id, permalink, ChannelDescriptor, NewsItem, SourceClient, SourceMessage,
};
use crate::ingest::watermark::{watermark_for, Watermarks};
use crate::media::{MediaOutcome, MediaPipeline};
use crate::telemetry::ensure_metrics_described;
use anyhow::{Context, Result};
use metrics::counter;
use std::fmt;
use tokio::time::Instant;
use tokio_util::sync::CancellationToken;
use tracing::{info, warn};

pub use normalize::normalize_text;

/// Why the channel loop ended before the last channel.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StopReason {
    Cancelled,
    DeadlineReached,
}

impl fmt::Display for StopReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            StopReason::Cancelled => f.write_str("cancellation requested"),
            StopReason::DeadlineReached => f.write_str("time budget reached"),
        }
    }
}

pub struct IngestContext<'a> {
    pub client: &'a dyn SourceClient,
    pub pipeline: &'a MediaPipeline<'a>,
    /// Max messages listed per channel.
    pub limit: usize,
}

#[derive(Debug, Default)]
pub struct IngestReport {
    /// Channel order, then source order (newest first) within a channel.
    pub items: Vec<NewsItem>,
    pub channels_processed: usize,
    pub stopped: Option<StopReason>,
}

/// Walk the channels in order until done, cancelled or out of time.
///
/// Cancellation and the deadline are only looked at before a channel starts;
/// a channel that has begun always runs to completion. Channel failures are
/// pushed to `errors` and the loop moves on.
pub async fn run_channels(
    ctx: &IngestContext<'_>,
    channels: &[ChannelDescriptor],
    watermarks: &Watermarks,
    deadline: Instant,
    cancel: &CancellationToken,
    errors: &mut SoftErrors,
) -> IngestReport {
    ensure_metrics_described();
    let mut report = IngestReport::default();

    for channel in channels {
        if cancel.is_cancelled() {
            report.stopped = Some(StopReason::Cancelled);
        } else if Instant::now() >= deadline {
            report.stopped = Some(StopReason::DeadlineReached);
        }
        if let Some(reason) = report.stopped {
            info!(%reason, next = %channel.name, "stopping early, saving partial progress");
            break;
        }

        let min_id = watermark_for(watermarks, &channel.name);
        if min_id > 0 {
            info!(channel = %channel.name, min_id, "incremental fetch");
        }
        counter!("sync_channels_total").increment(1);

        match fetch_channel(ctx, channel, min_id, errors).await {
            Ok(mut items) => {
                info!(channel = %channel.name, items = items.len(), "channel done");
                counter!("sync_items_total").increment(items.len() as u64);
                report.items.append(&mut items);
            }
            Err(e) => {
                warn!(channel = %channel.name, error = ?e, "channel skipped");
                counter!("sync_channel_errors_total").increment(1);
                errors.push(format!("Error fetching from {}: {e:#}", channel.name));
            }
        }
        report.channels_processed += 1;
    }

    report
}

/// Fetch one channel's new messages and turn them into items.
pub async fn fetch_channel(
    ctx: &IngestContext<'_>,
    channel: &ChannelDescriptor,
    min_id: i64,
    errors: &mut SoftErrors,
) -> Result<Vec<NewsItem>> {
    let resolved = ctx
        .client
        .resolve(&channel.target)
        .await
        .with_context(|| format!("resolving {:?}", channel.target))?;
    let messages = ctx
        .client
        .list_messages(&resolved, ctx.limit, min_id)
        .await
        .context("listing messages")?;

    let mut items = Vec::with_capacity(messages.len());
    for message in messages.iter().filter(|m| m.id > min_id) {
        if !message.has_content() {
            continue;
        }
        let id = item_id(&channel.name, message.id);
        let media = ctx.pipeline.process(message, &id).await;
        if let Some(reason) = &media.failure {
            errors.push(format!("Error processing media for {id}: {reason}"));
        }
        items.push(build_item(&channel.name, message, id, media));
    }
    Ok(items)
}

pub fn build_item(source: &str, message: &SourceMessage, id: String, media: MediaOutcome) -> NewsItem {
    NewsItem {
        id,
        source: source.to_string(),
        text: normalize_text(message.text.as_deref().unwrap_or_default()),
        date: message.date.to_rfc3339(),
        link: message
            .embedded_link()
            .map(str::to_string)
            .unwrap_or_else(|| permalink(source, message.id)),
        media: media.media,
        media_type: media.media_type,
        poster: media.poster,
        sensitive: message.is_sensitive(),
        extra: Default::default(),
    }
}
