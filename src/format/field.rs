use std::fmt::Write as _;

use chrono::format::{Item, StrftimeItems};
use chrono::{DateTime, Utc};

use crate::domain::Entry;
use crate::errors::{TailError, TailResult};

pub const DEFAULT_TIME_FORMAT: &str = "%Y/%m/%d %H:%M:%S";

/// Every name accepted in a template or by `--show`, sorted.
pub const FIELD_NAMES: &[&str] = &[
    "author",
    "comments",
    "created",
    "desc",
    "description",
    "expired",
    "id",
    "link",
    "pubdate",
    "timestamp",
    "title",
    "updated",
    "url",
];

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Field {
    Author,
    Id,
    Title,
    Link,
    Description,
    Published,
    Updated,
    Created,
    /// Wall-clock time at format time, not an entry attribute.
    Timestamp,
    Expired,
    Comments,
}

impl Field {
    /// Render this field of `entry`. Missing attributes render empty.
    pub fn value(&self, entry: &Entry, time_format: &str, now: DateTime<Utc>) -> String {
        let text = |v: &Option<String>| v.clone().unwrap_or_default();
        let date = |v: &Option<DateTime<Utc>>| {
            v.map(|dt| format_time(&dt, time_format)).unwrap_or_default()
        };

        match self {
            Field::Author => text(&entry.author),
            Field::Id => text(&entry.id),
            Field::Title => text(&entry.title),
            Field::Link => text(&entry.link),
            Field::Description => text(&entry.description),
            Field::Published => date(&entry.published),
            Field::Updated => date(&entry.updated),
            Field::Created => date(&entry.created),
            Field::Timestamp => format_time(&now, time_format),
            Field::Expired | Field::Comments => String::new(),
        }
    }
}

impl std::str::FromStr for Field {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "author" => Ok(Field::Author),
            "id" => Ok(Field::Id),
            "title" => Ok(Field::Title),
            "link" | "url" => Ok(Field::Link),
            "description" | "desc" => Ok(Field::Description),
            "pubdate" => Ok(Field::Published),
            "updated" => Ok(Field::Updated),
            "created" => Ok(Field::Created),
            "timestamp" => Ok(Field::Timestamp),
            "expired" => Ok(Field::Expired),
            "comments" => Ok(Field::Comments),
            _ => Err(format!("Unknown field: {}", s)),
        }
    }
}

/// Resolve a placeholder name to its rendered value; unknown names are empty.
pub fn resolve(name: &str, entry: &Entry, time_format: &str, now: DateTime<Utc>) -> String {
    name.parse::<Field>()
        .map(|field| field.value(entry, time_format, now))
        .unwrap_or_default()
}

/// strftime-style rendering that never panics on a bad directive.
pub fn format_time(dt: &DateTime<Utc>, time_format: &str) -> String {
    let mut out = String::new();
    if write!(out, "{}", dt.format(time_format)).is_err() {
        out.clear();
    }
    out
}

pub fn validate_time_format(time_format: &str) -> TailResult<()> {
    if StrftimeItems::new(time_format).any(|item| matches!(item, Item::Error)) {
        return Err(TailError::Config(format!(
            "invalid time format: {:?}",
            time_format
        )));
    }
    Ok(())
}
