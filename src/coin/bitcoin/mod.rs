pub mod client;
pub mod model;
pub mod rpc;

pub use client::BitcoinClient;
pub use rpc::{Endpoint, HttpTransport, RpcMethod};
