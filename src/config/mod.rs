use std::time::Duration;

use chrono::{DateTime, NaiveDate, NaiveDateTime, Utc};

use crate::errors::{TailError, TailResult};
use crate::format::{field, Formatter, DEFAULT_TIME_FORMAT};

pub const DEFAULT_INTERVAL: &str = "300s";
pub const DEFAULT_TIMEOUT_SECS: u64 = 30;

/// How entries are rendered.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum OutputStyle {
    /// Selected field names joined into a generated template.
    Fields { fields: Vec<String>, heading: bool },
    /// A user template in either placeholder grammar.
    Template(String),
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct OutputConfig {
    pub style: OutputStyle,
    pub time_format: String,
}

impl OutputConfig {
    pub fn formatter(&self) -> Formatter {
        match &self.style {
            OutputStyle::Fields { fields, heading } => {
                Formatter::from_fields(fields.as_slice(), self.time_format.clone(), *heading)
            }
            OutputStyle::Template(template) => Formatter::new(template.clone(), self.time_format.clone()),
        }
    }
}

impl Default for OutputConfig {
    fn default() -> Self {
        Self {
            style: OutputStyle::Fields {
                fields: vec!["title".to_string()],
                heading: false,
            },
            time_format: DEFAULT_TIME_FORMAT.to_string(),
        }
    }
}

/// Everything the poll loop needs, fixed before the first poll.
#[derive(Debug, Clone)]
pub struct PollConfig {
    /// Polling order.
    pub urls: Vec<String>,
    pub interval: Duration,
    /// `None` polls until interrupted.
    pub iterations: Option<u32>,
    /// Cap on entries shown by the first poll of each URL.
    pub initial: Option<usize>,
    pub newer: Option<DateTime<Utc>>,
    pub reverse: bool,
    pub unique: bool,
    pub fail_fast: bool,
    pub output: OutputConfig,
}

impl PollConfig {
    pub fn new(urls: Vec<String>) -> Self {
        Self {
            urls,
            interval: Duration::from_secs(300),
            iterations: None,
            initial: None,
            newer: None,
            reverse: false,
            unique: false,
            fail_fast: false,
            output: OutputConfig::default(),
        }
    }

    pub fn validate(&self) -> TailResult<()> {
        if self.urls.is_empty() {
            return Err(TailError::Config("no feed URLs given".to_string()));
        }
        field::validate_time_format(&self.output.time_format)
    }
}

/// Parse an interval such as `60`, `60s`, `5m` or `1h`.
pub fn parse_interval(value: &str) -> TailResult<Duration> {
    let value = value.trim();
    if let Ok(secs) = value.parse::<u64>() {
        return Ok(Duration::from_secs(secs));
    }

    let invalid = || TailError::InvalidInterval(value.to_string());
    let (number, multiplier) = match value.char_indices().last() {
        Some((idx, 's')) => (&value[..idx], 1),
        Some((idx, 'm')) => (&value[..idx], 60),
        Some((idx, 'h')) => (&value[..idx], 3600),
        _ => return Err(invalid()),
    };

    let number: u64 = number.parse().map_err(|_| invalid())?;
    let secs = number.checked_mul(multiplier).ok_or_else(invalid)?;
    Ok(Duration::from_secs(secs))
}

/// Express `secs` in the largest unit it reaches, rounded to two places:
/// `(5.0, "minutes")` for 300.
pub fn describe_interval(secs: u64) -> (f64, &'static str) {
    const GRADES: &[(&str, u64)] = &[("days", 86400), ("hours", 3600), ("minutes", 60)];

    let (unit, divisor) = GRADES
        .iter()
        .copied()
        .find(|(_, divisor)| secs >= *divisor)
        .unwrap_or(("secs", 1));

    let value = (secs as f64 / divisor as f64 * 100.0).round() / 100.0;
    (value, unit)
}

/// Parse a `--newer` date. Values without an offset are taken as UTC.
pub fn parse_newer(value: &str) -> TailResult<DateTime<Utc>> {
    const DATETIME_FORMATS: &[&str] = &[
        "%Y/%m/%d %H:%M:%S",
        "%Y/%m/%d %H:%M",
        "%Y-%m-%d %H:%M:%S",
        "%Y-%m-%dT%H:%M:%S",
        "%Y-%m-%d %H:%M",
    ];
    const DATE_FORMATS: &[&str] = &["%Y/%m/%d", "%Y-%m-%d"];

    let value = value.trim();

    if let Ok(dt) = DateTime::parse_from_rfc3339(value) {
        return Ok(dt.with_timezone(&Utc));
    }
    if let Ok(dt) = DateTime::parse_from_rfc2822(value) {
        return Ok(dt.with_timezone(&Utc));
    }

    for fmt in DATETIME_FORMATS {
        if let Ok(naive) = NaiveDateTime::parse_from_str(value, fmt) {
            return Ok(naive.and_utc());
        }
    }

    for fmt in DATE_FORMATS {
        if let Ok(date) = NaiveDate::parse_from_str(value, fmt) {
            if let Some(naive) = date.and_hms_opt(0, 0, 0) {
                return Ok(naive.and_utc());
            }
        }
    }

    Err(TailError::InvalidDate(value.to_string()))
}
