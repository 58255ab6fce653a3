use std::path::PathBuf;
use std::sync::LazyLock;
use std::time::Duration;

use feed_rs::parser;
use regex::Regex;
use reqwest::blocking::{Client, Response};
use reqwest::header::{HeaderName, CONTENT_TYPE, ETAG, IF_MODIFIED_SINCE, IF_NONE_MATCH, LAST_MODIFIED};
use reqwest::StatusCode;
use tracing::debug;
use url::Url;

use crate::config::DEFAULT_TIMEOUT_SECS;
use crate::domain::{Entry, FeedHealth, FetchedFeed, Validators};
use crate::errors::{TailError, TailResult};
use crate::sources::traits::FeedFetcher;

const USER_AGENT: &str = concat!(env!("CARGO_PKG_NAME"), "/", env!("CARGO_PKG_VERSION"));

static XML_ENCODING: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r#"^\s*<\?xml[^>]*?encoding\s*=\s*["']([A-Za-z0-9._:-]+)["']"#).unwrap()
});

/// Where a configured feed lives.
#[derive(Debug, Clone, PartialEq, Eq)]
enum Location {
    Http(Url),
    File(PathBuf),
}

impl Location {
    fn parse(url: &str) -> TailResult<Self> {
        match Url::parse(url) {
            Ok(parsed) => match parsed.scheme() {
                "http" | "https" => Ok(Location::Http(parsed)),
                "file" => parsed
                    .to_file_path()
                    .map(Location::File)
                    .map_err(|_| TailError::InvalidUrl(url.to_string())),
                // `C:\feeds\a.xml` parses with a one-letter scheme
                scheme if scheme.len() == 1 => Ok(Location::File(PathBuf::from(url))),
                _ => Err(TailError::InvalidUrl(url.to_string())),
            },
            Err(url::ParseError::RelativeUrlWithoutBase) => Ok(Location::File(PathBuf::from(url))),
            Err(e) => Err(TailError::InvalidUrl(format!("{}: {}", url, e))),
        }
    }
}

/// Fetches RSS, Atom and JSON feeds over HTTP(S) or from local files.
pub struct RssAtomFetcher {
    client: Client,
}

impl RssAtomFetcher {
    pub fn new() -> Self {
        Self::with_timeout(Duration::from_secs(DEFAULT_TIMEOUT_SECS))
    }

    pub fn with_timeout(timeout: Duration) -> Self {
        Self {
            client: Client::builder()
                .timeout(timeout)
                .user_agent(USER_AGENT)
                .build()
                .unwrap_or_else(|_| Client::new()),
        }
    }

    fn fetch_http(&self, url: &Url, validators: &Validators) -> TailResult<FetchedFeed> {
        let mut request = self.client.get(url.as_str());

        if let Some(etag) = &validators.etag {
            request = request.header(IF_NONE_MATCH, etag);
        }
        if let Some(last_modified) = &validators.last_modified {
            request = request.header(IF_MODIFIED_SINCE, last_modified);
        }

        let response = request.send()?;
        let status = response.status();

        let etag = header_value(&response, ETAG);
        let last_modified = header_value(&response, LAST_MODIFIED);

        if status == StatusCode::NOT_MODIFIED {
            debug!("feed not modified: {}", url);
            return Ok(FetchedFeed::not_modified().with_validators(etag, last_modified));
        }

        if !status.is_success() {
            return Err(TailError::HttpStatus {
                url: url.to_string(),
                status: status.as_u16(),
            });
        }

        let charset = header_value(&response, CONTENT_TYPE).and_then(|ct| charset_of(&ct));
        let bytes = response.bytes()?;

        Ok(Self::parse_bytes(&bytes, charset.as_deref()).with_validators(etag, last_modified))
    }

    /// Parse a feed document. `declared_charset` is the charset the transport
    /// announced, if any.
    pub fn parse_bytes(bytes: &[u8], declared_charset: Option<&str>) -> FetchedFeed {
        match parser::parse(bytes) {
            Ok(feed) => {
                let health = match encoding_conflict(bytes, declared_charset) {
                    Some(reason) => FeedHealth::EncodingOverride(reason),
                    None => FeedHealth::Clean,
                };
                Self::from_model(feed).with_health(health)
            }
            Err(err) => {
                if std::str::from_utf8(bytes).is_err() {
                    let lossy = String::from_utf8_lossy(bytes);
                    if let Ok(feed) = parser::parse(lossy.as_bytes()) {
                        return Self::from_model(feed).with_health(FeedHealth::EncodingOverride(
                            format!("document is not valid UTF-8 ({})", err),
                        ));
                    }
                }
                FetchedFeed::new(Vec::new()).with_health(FeedHealth::Malformed(err.to_string()))
            }
        }
    }

    fn from_model(feed: feed_rs::model::Feed) -> FetchedFeed {
        let updated = feed.updated;
        let entries = feed.entries.into_iter().map(Self::map_entry).collect();
        FetchedFeed::new(entries).with_updated(updated)
    }

    fn map_entry(entry: feed_rs::model::Entry) -> Entry {
        // RSS items only carry <pubDate>, Atom entries often only <updated>
        let published = entry.published.or(entry.updated);
        let updated = entry.updated.or(entry.published);

        Entry {
            id: Some(entry.id).filter(|id| !id.is_empty()),
            title: entry.title.map(|t| t.content),
            link: entry.links.into_iter().next().map(|l| l.href),
            author: entry.authors.into_iter().next().map(|p| p.name),
            description: entry
                .summary
                .map(|s| s.content)
                .or_else(|| entry.content.and_then(|c| c.body)),
            published,
            updated,
            // feed-rs has no creation date, so `created` renders empty
            created: None,
        }
    }
}

impl Default for RssAtomFetcher {
    fn default() -> Self {
        Self::new()
    }
}

impl FeedFetcher for RssAtomFetcher {
    fn fetch(&self, url: &str, validators: &Validators) -> TailResult<FetchedFeed> {
        match Location::parse(url)? {
            Location::Http(parsed) => self.fetch_http(&parsed, validators),
            Location::File(path) => {
                let bytes = std::fs::read(&path)?;
                Ok(Self::parse_bytes(&bytes, None))
            }
        }
    }
}

fn header_value(response: &Response, name: HeaderName) -> Option<String> {
    response
        .headers()
        .get(name)
        .and_then(|v| v.to_str().ok())
        .map(|s| s.to_string())
}

fn charset_of(content_type: &str) -> Option<String> {
    content_type.split(';').skip(1).find_map(|param| {
        let (key, value) = param.split_once('=')?;
        key.trim()
            .eq_ignore_ascii_case("charset")
            .then(|| value.trim().trim_matches('"').to_string())
    })
}

fn normalize_charset(charset: &str) -> String {
    charset.to_ascii_lowercase().replace(['-', '_'], "")
}

/// Describe a mismatch between the transport charset and the XML declaration.
fn encoding_conflict(bytes: &[u8], declared_charset: Option<&str>) -> Option<String> {
    let declared = declared_charset?;
    let head = String::from_utf8_lossy(&bytes[..bytes.len().min(256)]);
    let document = XML_ENCODING.captures(&head)?.get(1)?.as_str().to_string();

    (normalize_charset(declared) != normalize_charset(&document)).then(|| {
        format!(
            "document declared as {} but parsed as {}",
            document, declared
        )
    })
}
