/**
* filename : bitcoin
* author : HAMA
* date: 2025. 4. 6.
* description: Builds priced, fee-annotated blocks from Bitcoin Core
**/

use crate::analyzer::mempool::sample_fee_rates;
use crate::block::units::btc_to_sats;
use crate::block::{Block, Output, Transaction};
use crate::coin::bitcoin::client::BitcoinClient;
use crate::coin::bitcoin::model::{
  BlockchainInfo, RawBlock, RawTransaction, UtxoSetInfo, VerboseMempool,
};
use crate::coin::coin_trait::{PriceSource, RpcTransport};
use crate::coin::market::client::DEFAULT_PRICE_TIMEOUT;
use crate::coin::market::model::Price;
use crate::fetcher::fetcher::BlockFetcher;
use crate::fetcher::range::{BlockStream, HeightRange};
use crate::types::{AppError, PriceError};

use async_trait::async_trait;
use futures::stream::{self, StreamExt, TryStreamExt};
use log::{debug, info, warn};
use serde_json::Value;
use std::sync::Arc;
use std::time::Duration;

pub const DEFAULT_INPUT_WORKERS: usize = 3;
pub const DEFAULT_BULK_WORKERS: usize = 4;
pub const DEFAULT_MEMPOOL_WORKERS: usize = 3;

#[derive(Debug, Clone, Copy)]
pub struct FetcherOptions {
  /// Concurrent previous-transaction lookups while assembling one block.
  pub input_workers: usize,
  /// Concurrent block assemblies in [`BitcoinFetcher::fetch_blocks`].
  pub bulk_workers: usize,
  /// Concurrent `getmempoolentry` calls while sampling fees.
  pub mempool_workers: usize,
  /// Upper bound on the block-time price lookup; past it the block is priced (0, 0).
  pub price_timeout: Duration,
}

impl Default for FetcherOptions {
  fn default() -> Self {
    Self {
      input_workers: DEFAULT_INPUT_WORKERS,
      bulk_workers: DEFAULT_BULK_WORKERS,
      mempool_workers: DEFAULT_MEMPOOL_WORKERS,
      price_timeout: DEFAULT_PRICE_TIMEOUT,
    }
  }
}

/// What a bulk fetch does with a height that failed to assemble.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum BulkPolicy {
  /// Return the first error, no blocks.
  #[default]
  FailFast,
  /// Log the failure and leave the height out.
  BestEffort,
}

/// An output found by [`BitcoinFetcher::find_output_by_value`].
#[derive(Debug, Clone, PartialEq)]
pub struct OutputMatch {
  pub block_height: u64,
  pub txid: String,
  pub output: Output,
}

/// A non-coinbase input whose spent value has to be looked up.
struct InputRef {
  tx_index: usize,
  vin_index: usize,
  txid: String,
  vout: u32,
}

pub struct BitcoinFetcher<T: RpcTransport, P: PriceSource + ?Sized> {
  pub client: BitcoinClient<T>,
  pub prices: Arc<P>,
  pub options: FetcherOptions,
}

impl<T: RpcTransport, P: PriceSource + ?Sized> BitcoinFetcher<T, P> {
  pub fn new(client: BitcoinClient<T>, prices: Arc<P>, options: FetcherOptions) -> Self {
    Self { client, prices, options }
  }

  pub async fn get_block_count(&self) -> Result<u64, AppError> {
    Ok(self.client.get_block_count().await?)
  }

  /// Full block at `height`: header, price at block time, and every
  /// transaction with its input values resolved.
  ///
  /// Fails as a whole; a block is never returned with unresolved inputs.
  pub async fn get_block_from_height(&self, height: u64) -> Result<Block, AppError> {
    let hash = match self.client.get_block_hash(height).await {
      Ok(Some(hash)) => hash,
      Ok(None) => return Err(AppError::BlockHashNotFound(height)),
      Err(source) => return Err(AppError::HashLookup { height, source }),
    };

    let mut raw = match self.client.get_block(&hash).await {
      Ok(Some(raw)) => raw,
      Ok(None) => return Err(AppError::BlockNotFound(hash)),
      Err(source) => return Err(AppError::BlockLookup { hash, source }),
    };

    let raw_txs = std::mem::take(&mut raw.tx);
    let (price, transactions) = tokio::join!(
      self.price_at_block_time(&raw),
      self.build_transactions(&raw_txs)
    );
    let transactions = transactions?;

    if let Some(tx) = transactions.iter().find(|tx| tx.fee() < 0) {
      return Err(AppError::NegativeFee { txid: tx.txid.clone(), fee: tx.fee() });
    }

    let block = Block::new(&raw, price, transactions)?;
    info!("[BTC Fetcher] retrieved block {} ({} txs)", height, block.tx_count());
    Ok(block)
  }

  pub async fn get_latest_block(&self) -> Result<Block, AppError> {
    let height = self.get_block_count().await?;
    self.get_block_from_height(height).await
  }

  /// Lazily assembles `[start, stop)` by `step`. `stop = None` means the
  /// current block count (the tip itself is then excluded).
  pub async fn iterate_blocks(
    &self,
    start: u64,
    stop: Option<u64>,
    step: i64,
  ) -> Result<BlockStream<'_>, AppError> {
    let stop = match stop {
      Some(stop) => stop,
      None => self.get_block_count().await?,
    };
    let range = HeightRange::new(start, stop, step)?;

    let blocks = stream::unfold((range.heights(), false), move |(mut heights, failed)| async move {
      if failed {
        return None;
      }
      let height = heights.next()?;
      let block = self.get_block_from_height(height).await;
      let failed = block.is_err();
      Some((block, (heights, failed)))
    });

    Ok(BlockStream::new(blocks.boxed(), range.len()))
  }

  /// Assembles every height of `range` on `bulk_workers` concurrent tasks and
  /// returns the blocks in the range's own order.
  pub async fn fetch_blocks(&self, range: HeightRange, policy: BulkPolicy) -> Result<Vec<Block>, AppError> {
    let workers = self.options.bulk_workers.max(1);
    let assemblies = stream::iter(range.heights())
      .map(move |height| async move { (height, self.get_block_from_height(height).await) })
      .buffer_unordered(workers);

    let mut blocks: Vec<Block> = match policy {
      BulkPolicy::FailFast => {
        assemblies
          .map(|(_, block)| block)
          .try_collect()
          .await?
      }
      BulkPolicy::BestEffort => {
        assemblies
          .filter_map(|(height, block)| async move {
            match block {
              Ok(block) => Some(block),
              Err(e) => {
                warn!("[BTC Fetcher] dropping block {} from bulk fetch: {}", height, e);
                None
              }
            }
          })
          .collect()
          .await
      }
    };

    // completion order is arbitrary
    if range.is_ascending() {
      blocks.sort_by_key(|block| block.height);
    } else {
      blocks.sort_by(|a, b| b.height.cmp(&a.height));
    }
    Ok(blocks)
  }

  /// First output within `epsilon` satoshis of `value`, searching the newest
  /// `depth` blocks from the tip downwards.
  pub async fn find_output_by_value(
    &self,
    value: u64,
    epsilon: u64,
    depth: u64,
  ) -> Result<Option<OutputMatch>, AppError> {
    let tip = self.get_block_count().await?;
    let floor = tip.saturating_sub(depth);
    let mut blocks = self.iterate_blocks(tip, Some(floor), -1).await?;

    while let Some(block) = blocks.next().await {
      let block = block?;
      for tx in &block.transactions {
        if let Some(output) = tx.outputs.iter().find(|o| o.value.abs_diff(value) <= epsilon) {
          return Ok(Some(OutputMatch {
            block_height: block.height,
            txid: tx.txid.clone(),
            output: output.clone(),
          }));
        }
      }
    }
    Ok(None)
  }

  pub async fn get_utxo_set_info(&self) -> Result<UtxoSetInfo, AppError> {
    Ok(self.client.get_utxo_set_info().await?)
  }

  /// Fee rates (sat/vB) of the current mempool, best effort.
  pub async fn get_mempool_fees(&self) -> Result<Vec<f64>, AppError> {
    Ok(sample_fee_rates(&self.client, self.options.mempool_workers).await?)
  }

  pub async fn get_mempool(&self) -> Result<VerboseMempool, AppError> {
    Ok(self.client.get_mempool().await?)
  }

  pub async fn get_mempool_txids(&self) -> Result<Vec<String>, AppError> {
    Ok(self.client.get_mempool_txids().await?)
  }

  pub async fn get_blockchain_info(&self) -> Result<BlockchainInfo, AppError> {
    Ok(self.client.get_blockchain_info().await?)
  }

  pub async fn get_transaction(&self, txid: &str) -> Result<Value, AppError> {
    Ok(self.client.get_transaction(txid).await?)
  }

  pub async fn get_price(&self) -> Result<Price, AppError> {
    Ok(self.prices.spot_price().await?)
  }

  /// Price is enrichment only: any failure degrades to `Price::UNAVAILABLE`.
  async fn price_at_block_time(&self, raw: &RawBlock) -> Price {
    let timeout = self.options.price_timeout;
    let lookup = tokio::time::timeout(timeout, self.prices.price_at(raw.time))
      .await
      .unwrap_or(Err(PriceError::Timeout(timeout)));
    match lookup {
      Ok(price) => price,
      Err(PriceError::NoData) => {
        debug!("[BTC Fetcher] no price data around block {} (time {})", raw.height, raw.time);
        Price::UNAVAILABLE
      }
      Err(e) => {
        warn!("[BTC Fetcher] price lookup for block {} failed: {}", raw.height, e);
        Price::UNAVAILABLE
      }
    }
  }

  /// Resolves every non-coinbase input of the block (one `getrawtransaction`
  /// per input, no deduplication) and builds the transactions in block order.
  pub async fn build_transactions(&self, raw_txs: &[RawTransaction]) -> Result<Vec<Transaction>, AppError> {
    let mut lookups = Vec::new();
    for (tx_index, tx) in raw_txs.iter().enumerate() {
      for (vin_index, vin) in tx.vin.iter().enumerate() {
        if vin.is_coinbase() {
          continue;
        }
        match (&vin.txid, vin.vout) {
          (Some(txid), Some(vout)) => lookups.push(InputRef {
            tx_index,
            vin_index,
            txid: txid.clone(),
            vout,
          }),
          _ => {
            return Err(AppError::Block(format!(
              "input {} of {} has no previous output reference",
              vin_index, tx.txid
            )))
          }
        }
      }
    }

    let mut input_values: Vec<Vec<u64>> = raw_txs.iter().map(|tx| vec![0; tx.vin.len()]).collect();

    // buffered keeps request order, so values line up with `lookups`
    let positions: Vec<(usize, usize)> = lookups.iter().map(|l| (l.tx_index, l.vin_index)).collect();
    let values: Vec<u64> = stream::iter(lookups)
      .map(move |input| self.resolve_input_value(input.txid, input.vout))
      .buffered(self.options.input_workers.max(1))
      .try_collect()
      .await?;

    for ((tx_index, vin_index), value) in positions.into_iter().zip(values) {
      input_values[tx_index][vin_index] = value;
    }

    raw_txs
      .iter()
      .zip(input_values.iter())
      .map(|(raw, values)| Transaction::from_rpc(raw, values))
      .collect()
  }

  async fn resolve_input_value(&self, txid: String, vout: u32) -> Result<u64, AppError> {
    let prev_tx = self
      .client
      .get_raw_transaction(&txid)
      .await
      .map_err(|e| AppError::InputResolution {
        txid: txid.clone(),
        vout,
        reason: e.to_string(),
      })?;

    let prev_output = prev_tx.vout.get(vout as usize).ok_or_else(|| AppError::InputResolution {
      txid: txid.clone(),
      vout,
      reason: format!("previous transaction has only {} outputs", prev_tx.vout.len()),
    })?;
    Ok(btc_to_sats(prev_output.value))
  }
}

#[async_trait]
impl<T: RpcTransport + 'static, P: PriceSource + ?Sized + 'static> BlockFetcher for BitcoinFetcher<T, P> {
  async fn fetch_block(&self, block_number: u64) -> Result<Block, AppError> {
    self.get_block_from_height(block_number).await
  }

  async fn latest_block_number(&self) -> Result<u64, AppError> {
    self.get_block_count().await
  }

  fn chain_name(&self) -> &'static str {
    "BTC"
  }
}
