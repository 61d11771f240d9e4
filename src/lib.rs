pub mod analyzer;
pub mod block;
pub mod coin;
pub mod config;
pub mod fetcher;
pub mod shutdown;
pub mod tasks;
pub mod types;
