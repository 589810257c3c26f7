// Library for the binary, demos and tests

pub mod aggregator;
pub mod config;
pub mod error;
pub mod format;
pub mod history_store;
pub mod models;
pub mod query_view;
pub mod scheduler;
pub mod sources;
pub mod system_info;
