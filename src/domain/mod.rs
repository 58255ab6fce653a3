pub mod entry;
pub mod feed_state;
pub mod fetched;

pub use entry::Entry;
pub use feed_state::{FeedState, StateMap, Validators};
pub use fetched::{FeedHealth, FetchedFeed};
