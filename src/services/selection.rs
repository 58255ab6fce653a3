use std::collections::HashSet;

use chrono::{DateTime, Utc};
use tracing::debug;

use crate::domain::Entry;

/// Identities of every entry emitted so far in unique mode.
pub type SeenSet = HashSet<String>;

/// Knobs of [`select`] that stay fixed for the whole run.
#[derive(Debug, Clone, Copy, Default)]
pub struct SelectOptions {
    pub initial: Option<usize>,
    pub newer: Option<DateTime<Utc>>,
    pub reverse: bool,
}

/// The later of the URL's watermark and the global floor.
pub fn threshold(
    watermark: Option<DateTime<Utc>>,
    newer: Option<DateTime<Utc>>,
) -> Option<DateTime<Utc>> {
    match (watermark, newer) {
        (Some(w), Some(n)) => Some(w.max(n)),
        (w, n) => w.or(n),
    }
}

/// Pick the entries of one fetch that have not been shown yet.
///
/// Steps, in order: the `initial` cap on iteration 0, the published-time
/// threshold (entries without a published date always pass), the seen-set
/// check, and finally reversal.
pub fn select(
    entries: Vec<Entry>,
    iteration: u32,
    watermark: Option<DateTime<Utc>>,
    options: &SelectOptions,
    seen: Option<&mut SeenSet>,
) -> Vec<Entry> {
    let fresh = fresh_entries(entries, iteration, watermark, options);
    unseen_in_order(&fresh, options, seen)
}

/// The time-based half of [`select`]: the `initial` cap and the threshold.
/// The next watermark is computed from this batch, before the seen set
/// removes anything.
pub fn fresh_entries(
    entries: Vec<Entry>,
    iteration: u32,
    watermark: Option<DateTime<Utc>>,
    options: &SelectOptions,
) -> Vec<Entry> {
    let mut entries = entries;

    if iteration == 0 {
        if let Some(cap) = options.initial {
            entries.truncate(cap);
        }
    }

    if let Some(newer_than) = threshold(watermark, options.newer) {
        debug!(
            "selecting entries newer than {}",
            newer_than.format("%Y/%m/%d %H:%M:%S")
        );
        entries.retain(|entry| entry.published.map_or(true, |p| p > newer_than));
    }

    entries
}

/// The remaining half of [`select`]: drop entries already in `seen`,
/// recording the rest, then apply `reverse`.
pub fn unseen_in_order(
    fresh: &[Entry],
    options: &SelectOptions,
    seen: Option<&mut SeenSet>,
) -> Vec<Entry> {
    let mut entries: Vec<Entry> = match seen {
        Some(seen) => fresh
            .iter()
            .filter(|entry| seen.insert(entry.identity()))
            .cloned()
            .collect(),
        None => fresh.to_vec(),
    };

    if options.reverse {
        entries.reverse();
    }

    entries
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    fn at(hour: u32) -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2012, 1, 4, hour, 0, 0).unwrap()
    }

    fn feed() -> Vec<Entry> {
        (1..=5)
            .map(|i| {
                Entry::new(format!("Entry {}", i))
                    .with_id(Some(format!("id-{}", i)))
                    .with_published(Some(at(10 - i)))
            })
            .collect()
    }

    fn titles(entries: &[Entry]) -> Vec<String> {
        entries.iter().map(|e| e.title.clone().unwrap_or_default()).collect()
    }

    #[test]
    fn test_no_filters_keeps_native_order() {
        let selected = select(feed(), 0, None, &SelectOptions::default(), None);
        assert_eq!(
            titles(&selected),
            vec!["Entry 1", "Entry 2", "Entry 3", "Entry 4", "Entry 5"]
        );
    }

    #[test]
    fn test_reverse_is_exact_reversal_of_filtered_subset() {
        let options = SelectOptions {
            newer: Some(at(6)),
            ..Default::default()
        };
        let forward = select(feed(), 1, None, &options, None);
        let backward = select(feed(), 1, None, &SelectOptions { reverse: true, ..options }, None);

        let mut expected = titles(&forward);
        expected.reverse();
        assert_eq!(titles(&backward), expected);
        assert_eq!(titles(&forward), vec!["Entry 1", "Entry 2", "Entry 3"]);
    }

    #[test]
    fn test_initial_cap_only_on_first_iteration() {
        let options = SelectOptions {
            initial: Some(2),
            ..Default::default()
        };

        assert_eq!(select(feed(), 0, None, &options, None).len(), 2);
        assert_eq!(select(feed(), 1, None, &options, None).len(), 5);
    }

    #[test]
    fn test_initial_cap_applies_before_time_filter() {
        let options = SelectOptions {
            initial: Some(2),
            newer: Some(at(8)),
            ..Default::default()
        };

        // the first two are at 09:00 and 08:00; only 09:00 is strictly newer
        let selected = select(feed(), 0, None, &options, None);
        assert_eq!(titles(&selected), vec!["Entry 1"]);
    }

    #[test]
    fn test_newer_than_is_strict() {
        let entries = vec![
            Entry::new("T1").with_published(Some(at(1))),
            Entry::new("T2").with_published(Some(at(2))),
            Entry::new("T3").with_published(Some(at(3))),
        ];
        let options = SelectOptions {
            newer: Some(at(2)),
            ..Default::default()
        };

        let selected = select(entries, 0, None, &options, None);
        assert_eq!(titles(&selected), vec!["T3"]);
    }

    #[test]
    fn test_threshold_takes_later_of_watermark_and_floor() {
        assert_eq!(threshold(Some(at(3)), Some(at(5))), Some(at(5)));
        assert_eq!(threshold(Some(at(6)), Some(at(5))), Some(at(6)));
        assert_eq!(threshold(None, Some(at(5))), Some(at(5)));
        assert_eq!(threshold(Some(at(3)), None), Some(at(3)));
        assert_eq!(threshold(None, None), None);

        let selected = select(feed(), 1, Some(at(7)), &SelectOptions { newer: Some(at(5)), ..Default::default() }, None);
        assert_eq!(titles(&selected), vec!["Entry 1", "Entry 2"]);
    }

    #[test]
    fn test_entries_without_published_pass_time_filter() {
        let entries = vec![Entry::new("undated"), Entry::new("old").with_published(Some(at(1)))];
        let selected = select(entries, 1, Some(at(5)), &SelectOptions::default(), None);
        assert_eq!(titles(&selected), vec!["undated"]);
    }

    #[test]
    fn test_seen_set_suppresses_repeats_and_duplicates() {
        let mut seen = SeenSet::new();
        let mut entries = feed();
        entries.push(entries[0].clone());

        let first = select(entries, 0, None, &SelectOptions::default(), Some(&mut seen));
        assert_eq!(first.len(), 5);
        assert_eq!(seen.len(), 5);

        let second = select(feed(), 1, None, &SelectOptions::default(), Some(&mut seen));
        assert!(second.is_empty());
    }

    #[test]
    fn test_seen_set_only_records_entries_that_pass() {
        let mut seen = SeenSet::new();
        let options = SelectOptions {
            newer: Some(at(7)),
            ..Default::default()
        };

        select(feed(), 0, None, &options, Some(&mut seen));
        assert!(seen.contains("id-1"));
        assert!(!seen.contains("id-5"));
    }

    #[test]
    fn test_fresh_entries_ignore_seen_set() {
        let mut seen: SeenSet = feed().iter().map(Entry::identity).collect();
        let options = SelectOptions {
            newer: Some(at(7)),
            ..Default::default()
        };

        let fresh = fresh_entries(feed(), 1, None, &options);
        assert_eq!(titles(&fresh), vec!["Entry 1", "Entry 2"]);
        assert!(unseen_in_order(&fresh, &options, Some(&mut seen)).is_empty());
    }
}
