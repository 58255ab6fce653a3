use chrono::{DateTime, Utc};

use super::Entry;

/// How cleanly a feed document parsed.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FeedHealth {
    Clean,
    /// The declared character encoding was wrong or overridden; entries
    /// were still recovered.
    EncodingOverride(String),
    /// The document could not be understood as a feed.
    Malformed(String),
}

impl FeedHealth {
    pub fn is_fatal(&self) -> bool {
        matches!(self, FeedHealth::Malformed(_))
    }
}

/// Result of one fetch of one URL.
#[derive(Debug, Clone)]
pub struct FetchedFeed {
    pub entries: Vec<Entry>,
    /// Feed-level "updated" timestamp, when the document carries one.
    pub updated: Option<DateTime<Utc>>,
    pub etag: Option<String>,
    pub last_modified: Option<String>,
    pub health: FeedHealth,
}

impl FetchedFeed {
    pub fn new(entries: Vec<Entry>) -> Self {
        Self {
            entries,
            updated: None,
            etag: None,
            last_modified: None,
            health: FeedHealth::Clean,
        }
    }

    /// A `304 Not Modified` answer: nothing new, validators unchanged.
    pub fn not_modified() -> Self {
        Self::new(Vec::new())
    }

    pub fn with_updated(mut self, updated: Option<DateTime<Utc>>) -> Self {
        self.updated = updated;
        self
    }

    pub fn with_validators(mut self, etag: Option<String>, last_modified: Option<String>) -> Self {
        self.etag = etag;
        self.last_modified = last_modified;
        self
    }

    pub fn with_health(mut self, health: FeedHealth) -> Self {
        self.health = health;
        self
    }
}
