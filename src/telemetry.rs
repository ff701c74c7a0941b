// src/telemetry.rs
use metrics::{describe_counter, describe_gauge, describe_histogram};
use once_cell::sync::OnceCell;

/// One-time metrics registration so every series is described before first use.
pub fn ensure_metrics_described() {
    static ONCE: OnceCell<()> = OnceCell::new();
    ONCE.get_or_init(|| {
        describe_counter!("sync_channels_total", "Channels whose fetch was attempted.");
        describe_counter!(
            "sync_channel_errors_total",
            "Channels skipped because resolve/list failed."
        );
        describe_counter!("sync_items_total", "Items produced from fetched messages.");
        describe_counter!(
            "sync_media_failures_total",
            "Items whose media processing degraded."
        );
        describe_counter!(
            "sync_videos_transcoded_total",
            "Videos transcoded, labelled by compression tier."
        );
        describe_counter!(
            "sync_assets_swept_total",
            "Oversized assets deleted by the safety sweep."
        );
        describe_gauge!("sync_store_items", "Records in the store after the last run.");
        describe_histogram!("sync_run_duration_ms", "Whole run duration in milliseconds.");
    });
}
