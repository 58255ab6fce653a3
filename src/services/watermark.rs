use chrono::{DateTime, TimeZone, Utc};

use crate::domain::{Entry, FeedState, FetchedFeed};

/// Stand-in watermark when entries arrive without any "updated" date.
pub fn epoch_sentinel() -> DateTime<Utc> {
    Utc.with_ymd_and_hms(1900, 1, 1, 0, 0, 0)
        .single()
        .unwrap_or(DateTime::<Utc>::MIN_UTC)
}

/// Compute a URL's next watermark.
///
/// A feed-level date wins; otherwise the newest entry-level "updated" date
/// among `entries`, or the 1900 sentinel when entries exist but none is
/// dated. With nothing to go on the prior watermark is kept. The result
/// never falls below `prior`.
pub fn compute_watermark(
    feed_updated: Option<DateTime<Utc>>,
    entries: &[Entry],
    prior: Option<DateTime<Utc>>,
) -> Option<DateTime<Utc>> {
    let candidate = feed_updated.or_else(|| {
        if entries.is_empty() {
            None
        } else {
            Some(
                entries
                    .iter()
                    .filter_map(|e| e.updated)
                    .max()
                    .unwrap_or_else(epoch_sentinel),
            )
        }
    });

    match (candidate, prior) {
        (Some(c), Some(p)) => Some(c.max(p)),
        (c, p) => c.or(p),
    }
}

/// State to remember after a successful poll. Validators the fetch did not
/// supply are carried over from `prior`.
pub fn next_state(prior: &FeedState, feed: &FetchedFeed, selected: &[Entry]) -> FeedState {
    FeedState {
        etag: feed.etag.clone().or_else(|| prior.etag.clone()),
        last_modified: feed
            .last_modified
            .clone()
            .or_else(|| prior.last_modified.clone()),
        updated: compute_watermark(feed.updated, selected, prior.updated),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn at(day: u32) -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2024, 1, day, 0, 0, 0).unwrap()
    }

    #[test]
    fn test_feed_level_date_is_authoritative() {
        let entries = vec![Entry::new("a").with_updated(Some(at(9)))];
        assert_eq!(compute_watermark(Some(at(5)), &entries, None), Some(at(5)));
    }

    #[test]
    fn test_falls_back_to_newest_entry_update() {
        let entries = vec![
            Entry::new("a").with_updated(Some(at(3))),
            Entry::new("b").with_updated(Some(at(7))),
            Entry::new("c"),
        ];
        assert_eq!(compute_watermark(None, &entries, None), Some(at(7)));
    }

    #[test]
    fn test_undated_entries_give_sentinel() {
        let entries = vec![Entry::new("a")];
        assert_eq!(compute_watermark(None, &entries, None), Some(epoch_sentinel()));
        assert_eq!(epoch_sentinel().format("%Y").to_string(), "1900");
    }

    #[test]
    fn test_nothing_derivable_keeps_prior() {
        assert_eq!(compute_watermark(None, &[], Some(at(4))), Some(at(4)));
        assert_eq!(compute_watermark(None, &[], None), None);
    }

    #[test]
    fn test_never_regresses() {
        let undated = vec![Entry::new("a")];
        assert_eq!(compute_watermark(None, &undated, Some(at(4))), Some(at(4)));
        assert_eq!(compute_watermark(Some(at(2)), &[], Some(at(4))), Some(at(4)));

        let mut watermark = None;
        for day in [3, 1, 5, 2, 8] {
            let entries = vec![Entry::new("x").with_updated(Some(at(day)))];
            let next = compute_watermark(None, &entries, watermark);
            assert!(next >= watermark);
            watermark = next;
        }
        assert_eq!(watermark, Some(at(8)));
    }

    #[test]
    fn test_validators_carried_forward() {
        let prior = FeedState {
            etag: Some("\"abc\"".to_string()),
            last_modified: Some("Mon, 01 Jan 2024 00:00:00 GMT".to_string()),
            updated: Some(at(1)),
        };

        let unchanged = next_state(&prior, &FetchedFeed::not_modified(), &[]);
        assert_eq!(unchanged, prior);

        let fresh = FetchedFeed::new(Vec::new()).with_validators(Some("\"def\"".to_string()), None);
        let next = next_state(&prior, &fresh, &[]);
        assert_eq!(next.etag.as_deref(), Some("\"def\""));
        assert_eq!(next.last_modified, prior.last_modified);
    }
}
