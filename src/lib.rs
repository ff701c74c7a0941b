// src/lib.rs
// Public library surface for the sync binary and integration tests.

pub mod config;
pub mod diagnostics;
pub mod ingest;
pub mod media;
pub mod run;
pub mod store;
pub mod telemetry;

// ---- Re-exports for stable public API ----
pub use crate::config::SyncConfig;
pub use crate::diagnostics::{RunStats, SoftErrors};
pub use crate::ingest::types::{ChannelDescriptor, ChannelTarget, MediaType, NewsItem};
pub use crate::run::{run_sync, RunSummary};
