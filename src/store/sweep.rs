// src/store/sweep.rs
use crate::ingest::types::NewsItem;
use crate::media::assets::AssetStore;
use crate::media::MIB;
use metrics::counter;
use tracing::warn;

#[derive(Debug, Default, Clone, PartialEq, Eq)]
pub struct SweepReport {
    /// Names of deleted assets.
    pub removed: Vec<String>,
    pub failures: Vec<String>,
}

/// Delete every asset above `ceiling` and scrub records pointing at it.
///
/// Only oversized files are touched. Unreferenced assets are left alone: other
/// stores may share the same media directory.
pub fn safety_sweep(items: &mut [NewsItem], assets: &dyn AssetStore, ceiling: u64) -> SweepReport {
    let mut report = SweepReport::default();

    let entries = match assets.list() {
        Ok(v) => v,
        Err(e) => {
            warn!(error = ?e, "safety sweep could not list assets");
            report.failures.push(format!("Safety sweep: {e:#}"));
            return report;
        }
    };

    for entry in entries.into_iter().filter(|e| e.size > ceiling) {
        warn!(
            asset = %entry.name,
            mib = entry.size / MIB,
            "safety sweep: deleting oversized asset"
        );
        if let Err(e) = assets.remove(&entry.name) {
            report
                .failures
                .push(format!("Safety sweep could not delete {}: {e:#}", entry.name));
            continue;
        }

        let url = assets.url_for(&entry.name);
        for item in items.iter_mut() {
            if item.media.as_deref() == Some(url.as_str()) {
                item.media = None;
                item.media_type = None;
            }
            if item.poster.as_deref() == Some(url.as_str()) {
                item.poster = None;
            }
        }
        counter!("sync_assets_swept_total").increment(1);
        report.removed.push(entry.name);
    }

    report
}
