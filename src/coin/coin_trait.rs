/**
* filename : coin_trait
* author : HAMA
* date: 2025. 4. 7.
* description: Seams between the scanner and the outside world (node RPC, market price)
**/

use async_trait::async_trait;
use serde::de::DeserializeOwned;
use serde_json::Value;

use crate::coin::market::model::Price;
use crate::types::{PriceError, RpcError};

/// Invokes a named remote procedure on a single node.
///
/// Implementations hide transient failures; an `Err` means the call is
/// definitively lost for this invocation.
#[async_trait]
pub trait RpcTransport: Send + Sync {
  async fn call(&self, method: &str, params: Vec<Value>) -> Result<Value, RpcError>;

  async fn call_as<T>(&self, method: &str, params: Vec<Value>) -> Result<T, RpcError>
  where
    T: DeserializeOwned + Send,
  {
    let value = self.call(method, params).await?;
    serde_json::from_value(value)
      .map_err(|e| RpcError::Decode(format!("{} result: {}", method, e)))
  }
}

/// Market price lookups used to enrich blocks.
#[async_trait]
pub trait PriceSource: Send + Sync {
  /// Most recent USD price.
  async fn spot_price(&self) -> Result<Price, PriceError>;

  /// Close price around `unix_time` (seconds). `PriceError::NoData` when the
  /// provider has nothing for that window.
  async fn price_at(&self, unix_time: u64) -> Result<Price, PriceError>;
}
