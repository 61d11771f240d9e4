/**
* filename : types
* author : HAMA
* date: 2025. 4. 6.
* description: Shared channel aliases and error types
**/

use crate::block::Block;
use serde_json::Value;
use tokio::sync::mpsc::{Receiver, Sender};

// ====== Channel aliases ======
pub type BlockSender = Sender<Block>;
pub type BlockReceiver = Receiver<Block>;

// ====== Transport errors ======
#[derive(Debug, thiserror::Error)]
pub enum RpcError {
  #[error("'{0}' is a reserved name and cannot be used as an RPC method")]
  ReservedMethod(String),

  #[error("HTTP error: {0}")]
  Http(#[from] reqwest::Error),

  #[error("RPC error {code}: {message}")]
  Remote { code: i64, message: String },

  #[error("Failed to decode RPC response: {0}")]
  Decode(String),

  #[error("Connection pool is closed")]
  PoolClosed,

  #[error("RPC call '{method}' with params {params} failed after {attempts} attempts: {last}")]
  Exhausted {
    method: String,
    params: Value,
    attempts: u32,
    last: Box<RpcError>,
  },
}

// ====== Price collaborator errors ======
#[derive(Debug, thiserror::Error)]
pub enum PriceError {
  #[error("No price data for the requested window")]
  NoData,

  #[error("Price API error: {0}")]
  Http(#[from] reqwest::Error),

  #[error("Price API returned an unexpected payload: {0}")]
  Decode(String),

  #[error("Price lookup gave no answer within {0:?}")]
  Timeout(std::time::Duration),
}

// ====== Unified Error Type ======
#[derive(Debug, thiserror::Error)]
pub enum AppError {
  #[error("Block hash lookup for height {height} failed: {source}")]
  HashLookup { height: u64, source: RpcError },

  #[error("Block hash not found for height {0}")]
  BlockHashNotFound(u64),

  #[error("Block lookup for hash {hash} failed: {source}")]
  BlockLookup { hash: String, source: RpcError },

  #[error("Block data not found for hash {0}")]
  BlockNotFound(String),

  #[error("Failed to resolve value of input {txid}:{vout}: {reason}")]
  InputResolution { txid: String, vout: u32, reason: String },

  #[error("Transaction {txid} has a negative fee of {fee} sat; input values are wrong")]
  NegativeFee { txid: String, fee: i64 },

  #[error("Block error: {0}")]
  Block(String),

  #[error("Invalid height range: {0}")]
  InvalidRange(String),

  #[error("RPC error: {0}")]
  Rpc(#[from] RpcError),

  #[error("Price error: {0}")]
  Price(#[from] PriceError),

  #[error("Task join error: {0}")]
  JoinError(#[from] tokio::task::JoinError),

  #[error("Configuration error: {0}")]
  Config(String),

  #[error("Initialization error: {0}")]
  Initialization(String),
}

// ====== Error Conversions (From impls) ======

impl From<config::ConfigError> for AppError {
  fn from(err: config::ConfigError) -> Self {
    AppError::Config(err.to_string())
  }
}

impl From<std::io::Error> for AppError {
  fn from(err: std::io::Error) -> Self {
    AppError::Initialization(format!("IO error: {}", err))
  }
}

impl From<hex::FromHexError> for AppError {
  fn from(err: hex::FromHexError) -> Self {
    AppError::Block(format!("Invalid hex: {}", err))
  }
}
