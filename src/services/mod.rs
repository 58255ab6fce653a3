pub mod import_service;
pub mod poll_service;
pub mod selection;
pub mod watermark;

pub use import_service::read_opml_urls;
pub use poll_service::PollService;
pub use selection::{fresh_entries, select, unseen_in_order, SeenSet, SelectOptions};
pub use watermark::{compute_watermark, next_state};
