use thiserror::Error;

#[derive(Error, Debug)]
pub enum TailError {
    // Configuration errors
    #[error("Configuration error: {0}")]
    Config(String),

    #[error("Invalid date: {0}")]
    InvalidDate(String),

    #[error("Invalid interval: {0} (hint: 60, 60s, 1m, 1h)")]
    InvalidInterval(String),

    // Feed errors
    #[error("Invalid feed URL: {0}")]
    InvalidUrl(String),

    #[error("Feed error {url}: {reason}")]
    MalformedFeed { url: String, reason: String },

    // Network errors
    #[error("HTTP request failed: {0}")]
    Http(#[from] reqwest::Error),

    #[error("HTTP {status} from {url}")]
    HttpStatus { url: String, status: u16 },

    // Parsing errors
    #[error("OPML parsing failed: {0}")]
    OpmlParse(String),

    // Storage errors
    #[error("Database error: {0}")]
    Database(#[from] rusqlite::Error),

    #[error("State file error: {0}")]
    Serialization(#[from] serde_json::Error),

    // IO errors
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Output error: {0}")]
    Output(std::io::Error),
}

pub type TailResult<T> = Result<T, TailError>;
