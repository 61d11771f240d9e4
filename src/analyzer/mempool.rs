/**
* filename : mempool
* author : HAMA
* date: 2025. 4. 11.
* description: Best-effort fee-rate sampling over the node mempool
**/

use futures::stream::{self, StreamExt};
use log::{debug, info};

use crate::analyzer::stats;
use crate::coin::bitcoin::client::BitcoinClient;
use crate::coin::bitcoin::model::{MempoolEntry, VerboseMempool};
use crate::coin::coin_trait::RpcTransport;
use crate::types::RpcError;

/// Mempool fees are reported in BTC; scale them to satoshis.
pub const FEE_SCALE: f64 = 1e8;

/// sat/vB of one entry, `None` for a zero vsize.
pub fn entry_fee_rate(entry: &MempoolEntry) -> Option<f64> {
  if entry.vsize == 0 {
    return None;
  }
  Some(entry.fees.base / entry.vsize as f64 * FEE_SCALE)
}

/// One fee-rate sample per mempool transaction whose entry could be fetched.
///
/// Only the txid listing can fail the call. Entries that fail (typically
/// because the transaction left the mempool in the meantime) are skipped, so
/// the sample count may be below the mempool size.
pub async fn sample_fee_rates<T: RpcTransport>(
  client: &BitcoinClient<T>,
  workers: usize,
) -> Result<Vec<f64>, RpcError> {
  let txids = client.get_mempool_txids().await?;
  let listed = txids.len();

  let samples: Vec<f64> = stream::iter(txids)
    .map(|txid| async move {
      let entry = client.get_mempool_entry(&txid).await;
      (txid, entry)
    })
    .buffered(workers.max(1))
    .filter_map(|(txid, entry)| async move {
      match entry {
        Ok(entry) => entry_fee_rate(&entry),
        Err(e) => {
          debug!("[Mempool] skipping entry {}: {}", txid, e);
          None
        }
      }
    })
    .collect()
    .await;

  info!("[Mempool] sampled {} of {} transactions", samples.len(), listed);
  Ok(samples)
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct MempoolFeeStats {
  pub count: usize,
  pub min: f64,
  pub max: f64,
  pub mean: f64,
  pub median: f64,
}

impl MempoolFeeStats {
  pub fn from_samples(samples: &[f64]) -> Option<Self> {
    Some(Self {
      count: samples.len(),
      min: stats::min(samples)?,
      max: stats::max(samples)?,
      mean: stats::mean(samples)?,
      median: stats::median(samples)?,
    })
  }
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct MempoolSizeStats {
  pub count: usize,
  pub total_vsize: u64,
  pub mean_vsize: f64,
  pub min_vsize: u64,
  pub max_vsize: u64,
}

impl MempoolSizeStats {
  pub fn from_mempool(mempool: &VerboseMempool) -> Option<Self> {
    let sizes: Vec<u64> = mempool.values().map(|entry| entry.vsize).collect();
    let total_vsize: u64 = sizes.iter().sum();
    Some(Self {
      count: sizes.len(),
      total_vsize,
      mean_vsize: total_vsize as f64 / sizes.len().max(1) as f64,
      min_vsize: *sizes.iter().min()?,
      max_vsize: *sizes.iter().max()?,
    })
  }
}
