pub mod mempool;
pub mod stats;

pub use mempool::{sample_fee_rates, MempoolFeeStats, MempoolSizeStats};
