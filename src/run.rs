//! One sync run: watermarks → channel loop → merge → sweep → diagnostics → store.

use crate::config::sync::MAX_DURATION_CAP_SECS;
use crate::config::SyncConfig;
use crate::diagnostics::{write_diagnostics, RunStats, SoftErrors};
use crate::ingest::types::{ChannelDescriptor, SourceClient};
use crate::ingest::watermark::compute_watermarks;
use crate::ingest::{run_channels, IngestContext};
use crate::media::assets::LocalAssetStore;
use crate::media::image_codec::JpegCodec;
use crate::media::transcoder::VideoTranscoder;
use crate::media::MediaPipeline;
use crate::store::{load_store, merge, safety_sweep, write_store};
use crate::telemetry::ensure_metrics_described;
use anyhow::Result;
use metrics::{gauge, histogram};
use std::time::Duration;
use tokio::time::Instant;
use tokio_util::sync::CancellationToken;
use tracing::info;

#[derive(Debug, Clone)]
pub struct RunSummary {
    pub stats: RunStats,
    pub errors: SoftErrors,
}

/// Run the whole sync against `client`.
///
/// Channel and item failures end up in [`RunSummary::errors`]; an `Err` means the
/// run itself failed (media dir unusable, store not writable) and the caller should
/// record it as critical.
pub async fn run_sync(
    cfg: &SyncConfig,
    channels: &[ChannelDescriptor],
    client: &dyn SourceClient,
    transcoder: &dyn VideoTranscoder,
    cancel: &CancellationToken,
) -> Result<RunSummary> {
    ensure_metrics_described();
    let started = Instant::now();
    let deadline = started
        .checked_add(cfg.max_duration())
        .unwrap_or_else(|| started + Duration::from_secs(MAX_DURATION_CAP_SECS));

    let existing = load_store(&cfg.output_path);
    let watermarks = compute_watermarks(&existing);
    info!(
        existing = existing.len(),
        channels = channels.len(),
        source = client.name(),
        "starting sync"
    );

    let assets = LocalAssetStore::open(cfg.media_dir(), &cfg.media_url_prefix)?;
    let codec = JpegCodec;
    let pipeline = MediaPipeline::new(client, transcoder, &codec, &assets, cfg.media_limits());
    let ctx = IngestContext {
        client,
        pipeline: &pipeline,
        limit: cfg.limit,
    };

    let mut errors = SoftErrors::default();
    let report = run_channels(&ctx, channels, &watermarks, deadline, cancel, &mut errors).await;
    let fetched = report.items.len();
    info!(fetched, "fetch finished");

    let mut merged = merge(report.items, existing);
    let sweep = safety_sweep(&mut merged, &assets, cfg.media_limits().asset_ceiling);
    for failure in &sweep.failures {
        errors.push(failure.clone());
    }

    let stats = RunStats {
        fetched,
        channels_processed: report.channels_processed,
        channels_total: channels.len(),
        stopped: report.stopped,
        swept: sweep.removed.len(),
        ..RunStats::collect(&merged)
    };
    write_diagnostics(&cfg.diagnostics_path(), &stats, &errors);
    write_store(&cfg.output_path, &merged)?;

    gauge!("sync_store_items").set(merged.len() as f64);
    histogram!("sync_run_duration_ms").record(started.elapsed().as_secs_f64() * 1_000.0);
    info!(
        total = stats.total,
        fetched,
        soft_errors = errors.len(),
        "sync finished"
    );

    Ok(RunSummary { stats, errors })
}
