//! Run diagnostics: the per-run soft-error accumulator, run statistics and the
//! plain-text `debug_errors.txt` written next to the store.

use crate::ingest::types::NewsItem;
use crate::ingest::StopReason;
use std::collections::BTreeMap;
use std::fmt::Write as _;
use std::fs::{self, OpenOptions};
use std::io::Write;
use std::path::Path;
use tracing::warn;

/// Non-fatal failures collected during one run.
#[derive(Debug, Default, Clone, PartialEq, Eq)]
pub struct SoftErrors {
    entries: Vec<String>,
}

impl SoftErrors {
    pub fn push(&mut self, msg: impl Into<String>) {
        self.entries.push(msg.into());
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = &str> {
        self.entries.iter().map(String::as_str)
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RunStats {
    pub total: usize,
    pub fetched: usize,
    pub channels_processed: usize,
    pub channels_total: usize,
    pub stopped: Option<StopReason>,
    pub swept: usize,
    pub per_source: BTreeMap<String, usize>,
}

impl RunStats {
    pub fn collect(store: &[NewsItem]) -> Self {
        let mut per_source = BTreeMap::new();
        for item in store {
            *per_source.entry(item.source.clone()).or_insert(0) += 1;
        }
        Self {
            total: store.len(),
            per_source,
            ..Self::default()
        }
    }

    pub fn render(&self, errors: &SoftErrors) -> String {
        let mut out = String::new();
        let _ = writeln!(
            out,
            "Stats: Total={}, Fetched={}, Channels={}/{}, Swept={}",
            self.total, self.fetched, self.channels_processed, self.channels_total, self.swept
        );
        if let Some(reason) = self.stopped {
            let _ = writeln!(out, "Stopped early: {reason}");
        }
        if !self.per_source.is_empty() {
            let sources: Vec<String> = self
                .per_source
                .iter()
                .map(|(s, n)| format!("{s}={n}"))
                .collect();
            let _ = writeln!(out, "Sources: {}", sources.join(", "));
        }
        out.push_str("--- Errors ---\n");
        for e in errors.iter() {
            out.push_str(e);
            out.push('\n');
        }
        out
    }
}

/// Best effort: a failed write is logged and swallowed.
pub fn write_diagnostics(path: &Path, stats: &RunStats, errors: &SoftErrors) {
    if let Some(dir) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
        let _ = fs::create_dir_all(dir);
    }
    if let Err(e) = fs::write(path, stats.render(errors)) {
        warn!(error = ?e, path = %path.display(), "could not write diagnostics log");
    }
}

/// Append a critical failure to the diagnostics log, keeping whatever is already there.
pub fn append_emergency(path: &Path, err: &anyhow::Error) {
    let res = OpenOptions::new()
        .create(true)
        .append(true)
        .open(path)
        .and_then(|mut f| write!(f, "\nCRITICAL FAILURE: {err:#}\n{err:?}\n"));
    if let Err(e) = res {
        warn!(error = ?e, path = %path.display(), "could not append emergency diagnostics");
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn render_lists_errors_after_stats() {
        let mut errors = SoftErrors::default();
        errors.push("Error fetching from b: timeout");
        let mut stats = RunStats {
            total: 3,
            fetched: 1,
            channels_processed: 2,
            channels_total: 2,
            ..RunStats::default()
        };
        stats.per_source.insert("a".into(), 2);
        stats.per_source.insert("b".into(), 1);

        let text = stats.render(&errors);
        let lines: Vec<&str> = text.lines().collect();
        assert_eq!(lines[0], "Stats: Total=3, Fetched=1, Channels=2/2, Swept=0");
        assert_eq!(lines[1], "Sources: a=2, b=1");
        assert_eq!(lines[2], "--- Errors ---");
        assert_eq!(lines[3], "Error fetching from b: timeout");
    }

    #[test]
    fn unwritable_log_is_swallowed() {
        let dir = tempfile::tempdir().unwrap();
        // parent is a regular file, so neither mkdir nor write can succeed
        let blocker = dir.path().join("not_a_dir");
        fs::write(&blocker, "x").unwrap();
        let p = blocker.join("debug_errors.txt");

        write_diagnostics(&p, &RunStats::default(), &SoftErrors::default());
        append_emergency(&p, &anyhow::anyhow!("store not writable"));
        assert!(!p.exists());
        assert_eq!(fs::read_to_string(&blocker).unwrap(), "x");
    }

    #[test]
    fn emergency_appends() {
        let dir = tempfile::tempdir().unwrap();
        let p = dir.path().join("debug_errors.txt");
        fs::write(&p, "Stats: Total=0\n").unwrap();
        append_emergency(&p, &anyhow::anyhow!("disk full"));
        let s = fs::read_to_string(&p).unwrap();
        assert!(s.starts_with("Stats: Total=0\n"));
        assert!(s.contains("CRITICAL FAILURE: disk full"));
    }
}
