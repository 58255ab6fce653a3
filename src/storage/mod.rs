pub mod traits;
pub mod sqlite;
pub mod json;

use std::path::Path;

use crate::errors::TailResult;

pub use traits::StateStore;
pub use sqlite::{SqliteStateStore, SqliteStorage};
pub use json::JsonStateStore;

/// Open the state store at `path`: JSON for `*.json`, SQLite otherwise.
pub fn open_store(path: &Path) -> TailResult<Box<dyn StateStore>> {
    let is_json = path
        .extension()
        .is_some_and(|ext| ext.eq_ignore_ascii_case("json"));

    if is_json {
        Ok(Box::new(JsonStateStore::new(path)))
    } else {
        Ok(Box::new(SqliteStateStore::new(SqliteStorage::new(path)?)))
    }
}
