/**
* filename : block
* author : HAMA
* date: 2025. 4. 8.
* description: Priced block with fee metrics
**/

use std::fmt;

use crate::analyzer::stats;
use crate::block::transaction::Transaction;
use crate::coin::bitcoin::model::RawBlock;
use crate::coin::market::model::Price;
use crate::types::AppError;

#[derive(Debug, Clone, PartialEq)]
pub struct Block {
  pub height: u64,
  pub version: i32,
  pub merkle_root: String,
  pub time: u64,
  pub median_time: u64,
  pub nonce: u64,
  pub bits: String,
  /// bytes
  pub size: u64,
  pub weight: u64,
  pub difficulty: f64,
  pub hash: String,
  pub chainwork: String,
  pub transactions: Vec<Transaction>,
  pub price: Price,
}

impl Block {
  /// Header fields come from `header`; its `tx` list is ignored in favour of
  /// `transactions`, which must hold exactly `nTx` entries.
  pub fn new(header: &RawBlock, price: Price, transactions: Vec<Transaction>) -> Result<Self, AppError> {
    if header.n_tx != transactions.len() as u64 {
      return Err(AppError::Block(format!(
        "block {} announces {} transactions but {} were assembled",
        header.height,
        header.n_tx,
        transactions.len()
      )));
    }

    Ok(Self {
      height: header.height,
      version: header.version,
      merkle_root: header.merkleroot.clone(),
      time: header.time,
      median_time: header.mediantime,
      nonce: header.nonce,
      bits: header.bits.clone(),
      size: header.size,
      weight: header.weight,
      difficulty: header.difficulty,
      hash: header.hash.clone(),
      chainwork: header.chainwork.clone(),
      transactions,
      price,
    })
  }

  pub fn tx_count(&self) -> usize {
    self.transactions.len()
  }

  pub fn coinbase(&self) -> Option<&Transaction> {
    self.transactions.first().filter(|tx| tx.is_coinbase)
  }

  pub fn total_fees(&self) -> i64 {
    self.transactions.iter().map(Transaction::fee).sum()
  }

  /// Every output value in the block, coinbase included.
  pub fn utxo_values(&self) -> Vec<u64> {
    self
      .transactions
      .iter()
      .flat_map(|tx| tx.outputs.iter().map(|output| output.value))
      .collect()
  }

  pub fn total_value(&self) -> u64 {
    self.utxo_values().iter().sum()
  }

  /// Fee rates of the non-coinbase transactions.
  pub fn fee_rates(&self) -> Vec<f64> {
    self.transactions.iter().filter_map(Transaction::fee_rate).collect()
  }

  pub fn mean_fee_rate(&self) -> Option<f64> {
    stats::mean(&self.fee_rates())
  }

  pub fn median_fee_rate(&self) -> Option<f64> {
    stats::median(&self.fee_rates())
  }
}

impl fmt::Display for Block {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    writeln!(f, "block: {}", self.height)?;
    writeln!(f, "price: ({}, {})", self.price.usd, self.price.sats_per_usd)?;
    writeln!(f, "fees: {}", self.total_fees())?;
    writeln!(f, "meanFeeRate: {:.2}", self.mean_fee_rate().unwrap_or(0.0))?;
    writeln!(f, "medianFeeRate: {:.2}", self.median_fee_rate().unwrap_or(0.0))?;
    writeln!(f, "totalValue: {}", self.total_value())?;
    writeln!(f, "size: {}", self.size)?;
    write!(f, "weight: {}", self.weight)
  }
}
