pub mod runner;
pub mod fetcher;
pub mod bitcoin_fetcher;
pub mod range;

pub use bitcoin_fetcher::{BitcoinFetcher, BulkPolicy, FetcherOptions, OutputMatch};
pub use range::{BlockStream, HeightRange};
