pub mod cli;
pub mod config;
pub mod domain;
pub mod errors;
pub mod format;
pub mod services;
pub mod shutdown;
pub mod sources;
pub mod storage;
