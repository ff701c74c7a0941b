// src/store/merge.rs
use crate::ingest::types::NewsItem;
use std::cmp::Reverse;
use std::collections::HashSet;

/// Dedup-union of this run's items and the stored ones.
///
/// New items come first so they win any id collision; within each side the first
/// occurrence wins. The result is sorted by date, newest first.
pub fn merge(new_items: Vec<NewsItem>, existing: Vec<NewsItem>) -> Vec<NewsItem> {
    let mut seen: HashSet<String> = HashSet::with_capacity(new_items.len() + existing.len());
    let mut merged = Vec::with_capacity(new_items.len() + existing.len());

    for item in new_items.into_iter().chain(existing) {
        if seen.insert(item.id.clone()) {
            merged.push(item);
        }
    }

    sort_by_date_desc(&mut merged);
    merged
}

/// Stable: equal dates keep their relative order. Unparseable dates sink to the end.
pub fn sort_by_date_desc(items: &mut [NewsItem]) {
    items.sort_by_cached_key(|it| Reverse((it.sort_key(), it.date.clone())));
}
