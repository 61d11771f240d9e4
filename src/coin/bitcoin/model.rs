/**
* filename : model
* author : HAMA
* date: 2025. 4. 7.
* description: Bitcoin Core RPC response shapes
**/

use serde::Deserialize;
use std::collections::HashMap;

/// `getblock <hash> 2`
#[derive(Debug, Clone, Deserialize)]
pub struct RawBlock {
  pub hash: String,
  pub height: u64,
  pub version: i32,
  pub merkleroot: String,
  pub time: u64,
  pub mediantime: u64,
  pub nonce: u64,
  pub bits: String,
  pub size: u64,
  pub weight: u64,
  #[serde(rename = "nTx")]
  pub n_tx: u64,
  pub difficulty: f64,
  pub chainwork: String,
  #[serde(default)]
  pub previousblockhash: Option<String>,
  #[serde(default)]
  pub tx: Vec<RawTransaction>,
}

/// Transaction as embedded in verbose blocks and returned by `getrawtransaction <txid> true`.
#[derive(Debug, Clone, Deserialize)]
pub struct RawTransaction {
  pub txid: String,
  #[serde(default)]
  pub hash: Option<String>,
  pub version: i32,
  #[serde(default)]
  pub locktime: u32,
  pub size: u64,
  pub weight: u64,
  pub vin: Vec<RawInput>,
  pub vout: Vec<RawOutput>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct RawInput {
  #[serde(default)]
  pub coinbase: Option<String>,
  #[serde(default)]
  pub txid: Option<String>,
  #[serde(default)]
  pub vout: Option<u32>,
  #[serde(default, rename = "scriptSig")]
  pub script_sig: Option<ScriptHex>,
  #[serde(default, alias = "witness")]
  pub txinwitness: Vec<String>,
  #[serde(default)]
  pub sequence: u32,
}

impl RawInput {
  pub fn is_coinbase(&self) -> bool {
    self.coinbase.is_some()
  }
}

#[derive(Debug, Clone, Deserialize)]
pub struct RawOutput {
  /// BTC, as a JSON float
  pub value: f64,
  #[serde(default)]
  pub n: u32,
  #[serde(rename = "scriptPubKey")]
  pub script_pub_key: ScriptHex,
}

#[derive(Debug, Clone, Deserialize)]
pub struct ScriptHex {
  #[serde(default)]
  pub hex: String,
}

/// `gettxoutsetinfo none`
#[derive(Debug, Clone, Deserialize)]
pub struct UtxoSetInfo {
  pub height: u64,
  pub bestblock: String,
  pub txouts: u64,
  #[serde(default)]
  pub bogosize: u64,
  #[serde(default)]
  pub disk_size: Option<u64>,
  pub total_amount: f64,
  #[serde(default)]
  pub transactions: Option<u64>,
}

/// `getmempoolentry <txid>` and the values of `getrawmempool true`
#[derive(Debug, Clone, Deserialize)]
pub struct MempoolEntry {
  pub vsize: u64,
  #[serde(default)]
  pub weight: Option<u64>,
  #[serde(default)]
  pub time: u64,
  #[serde(default)]
  pub height: u64,
  pub fees: MempoolFees,
  #[serde(default)]
  pub depends: Vec<String>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct MempoolFees {
  pub base: f64,
  #[serde(default)]
  pub modified: f64,
  #[serde(default)]
  pub ancestor: f64,
  #[serde(default)]
  pub descendant: f64,
}

pub type VerboseMempool = HashMap<String, MempoolEntry>;

/// `getblockchaininfo`
#[derive(Debug, Clone, Deserialize)]
pub struct BlockchainInfo {
  pub chain: String,
  pub blocks: u64,
  pub headers: u64,
  pub bestblockhash: String,
  #[serde(default)]
  pub difficulty: f64,
  pub chainwork: String,
  #[serde(default)]
  pub pruned: bool,
  #[serde(default)]
  pub size_on_disk: u64,
  #[serde(default)]
  pub verificationprogress: f64,
}

impl BlockchainInfo {
  /// Blocks validated over headers known, 0 when no headers are known yet.
  pub fn download_progress(&self) -> f64 {
    if self.headers == 0 {
      return 0.0;
    }
    self.blocks as f64 / self.headers as f64
  }

  pub fn size_on_disk_gb(&self) -> f64 {
    self.size_on_disk as f64 / 1024f64.powi(3)
  }
}
