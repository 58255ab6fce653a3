mod connection;
mod state_repository;

pub use connection::SqliteStorage;
pub use state_repository::SqliteStateStore;
