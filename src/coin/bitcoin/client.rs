/**
* author : HAMA
* date: 2025. 4. 5.
* description: Typed Bitcoin Core calls on top of a generic RPC transport
**/

use std::sync::Arc;

use serde_json::{json, Value};

use crate::coin::bitcoin::model::{
  BlockchainInfo, MempoolEntry, RawBlock, RawTransaction, UtxoSetInfo, VerboseMempool,
};
use crate::coin::bitcoin::rpc::{Endpoint, HttpTransport, RpcMethod};
use crate::coin::coin_trait::RpcTransport;
use crate::types::RpcError;

pub struct BitcoinClient<T: RpcTransport = HttpTransport> {
  transport: Arc<T>,
}

impl<T: RpcTransport> Clone for BitcoinClient<T> {
  fn clone(&self) -> Self {
    Self { transport: Arc::clone(&self.transport) }
  }
}

impl BitcoinClient<HttpTransport> {
  pub fn new(endpoint: Endpoint) -> Self {
    Self::with_transport(Arc::new(HttpTransport::new(endpoint)))
  }
}

impl<T: RpcTransport> BitcoinClient<T> {
  pub fn with_transport(transport: Arc<T>) -> Self {
    Self { transport }
  }

  pub fn transport(&self) -> &Arc<T> {
    &self.transport
  }

  /// Escape hatch for any method without a typed wrapper.
  pub async fn call(&self, method: &str, params: Vec<Value>) -> Result<Value, RpcError> {
    self.transport.call(method, params).await
  }

  pub async fn get_block_count(&self) -> Result<u64, RpcError> {
    self.transport.call_as(RpcMethod::GetBlockCount.as_str(), vec![]).await
  }

  /// `None` when the node answers with an empty hash.
  pub async fn get_block_hash(&self, height: u64) -> Result<Option<String>, RpcError> {
    let hash: Option<String> = self
      .transport
      .call_as(RpcMethod::GetBlockHash.as_str(), vec![json!(height)])
      .await?;
    Ok(hash.filter(|h| !h.is_empty()))
  }

  /// Verbosity 2: every transaction with full vin/vout detail.
  pub async fn get_block(&self, hash: &str) -> Result<Option<RawBlock>, RpcError> {
    let value = self
      .transport
      .call(RpcMethod::GetBlock.as_str(), vec![json!(hash), json!(2)])
      .await?;
    if value.is_null() {
      return Ok(None);
    }
    serde_json::from_value(value)
      .map(Some)
      .map_err(|e| RpcError::Decode(format!("getblock result: {}", e)))
  }

  pub async fn get_raw_transaction(&self, txid: &str) -> Result<RawTransaction, RpcError> {
    self
      .transport
      .call_as(RpcMethod::GetRawTransaction.as_str(), vec![json!(txid), json!(true)])
      .await
  }

  pub async fn get_utxo_set_info(&self) -> Result<UtxoSetInfo, RpcError> {
    self
      .transport
      .call_as(RpcMethod::GetTxOutSetInfo.as_str(), vec![json!("none")])
      .await
  }

  pub async fn get_mempool_txids(&self) -> Result<Vec<String>, RpcError> {
    self.transport.call_as(RpcMethod::GetRawMempool.as_str(), vec![]).await
  }

  pub async fn get_mempool(&self) -> Result<VerboseMempool, RpcError> {
    self
      .transport
      .call_as(RpcMethod::GetRawMempool.as_str(), vec![json!(true)])
      .await
  }

  pub async fn get_mempool_entry(&self, txid: &str) -> Result<MempoolEntry, RpcError> {
    self
      .transport
      .call_as(RpcMethod::GetMempoolEntry.as_str(), vec![json!(txid)])
      .await
  }

  pub async fn get_blockchain_info(&self) -> Result<BlockchainInfo, RpcError> {
    self.transport.call_as(RpcMethod::GetBlockchainInfo.as_str(), vec![]).await
  }

  /// Wallet RPC; the node must have a wallet loaded.
  pub async fn get_transaction(&self, txid: &str) -> Result<Value, RpcError> {
    self
      .transport
      .call(RpcMethod::GetTransaction.as_str(), vec![json!(txid)])
      .await
  }
}
