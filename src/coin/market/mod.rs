pub mod client;
pub mod model;

pub use client::{MarketPriceClient, NoPriceSource};
pub use model::Price;
