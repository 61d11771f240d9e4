pub mod block;
pub mod script;
pub mod transaction;
pub mod units;

pub use block::Block;
pub use script::Script;
pub use transaction::{Input, Output, Transaction, COINBASE_PREV_TXID, COINBASE_PREV_VOUT};
