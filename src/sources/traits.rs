use crate::domain::{FetchedFeed, Validators};
use crate::errors::TailResult;

#[cfg_attr(test, mockall::automock)]
pub trait FeedFetcher: Send + Sync {
    /// Fetch and parse `url`, sending `validators` for a conditional request
    /// when the transport supports one.
    ///
    /// Parse problems are reported through [`FetchedFeed::health`]; only
    /// transport failures are errors.
    fn fetch(&self, url: &str, validators: &Validators) -> TailResult<FetchedFeed>;
}
