// src/ingest/watermark.rs
//! Per-channel high-water marks derived from the persisted store.

use crate::ingest::types::NewsItem;
use std::collections::HashMap;

/// channel name -> highest message number already stored.
pub type Watermarks = HashMap<String, i64>;

pub fn compute_watermarks(items: &[NewsItem]) -> Watermarks {
    let mut marks = Watermarks::new();
    for item in items {
        if item.source.is_empty() {
            continue;
        }
        let Some(number) = item.message_number() else {
            continue;
        };
        let current = marks.get(&item.source).copied().unwrap_or(0);
        if number > current {
            marks.insert(item.source.clone(), number);
        }
    }
    marks
}

/// Lower bound for the next fetch of `channel` (0 if never seen).
pub fn watermark_for(marks: &Watermarks, channel: &str) -> i64 {
    marks.get(channel).copied().unwrap_or(0)
}
