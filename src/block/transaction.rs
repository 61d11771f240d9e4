/**
* filename : transaction
* author : HAMA
* date: 2025. 4. 8.
* description: Transaction with resolved input values and its fee metrics
**/

use std::fmt;

use crate::block::script::Script;
use crate::block::units::btc_to_sats;
use crate::coin::bitcoin::model::{RawInput, RawTransaction};
use crate::types::AppError;

/// Previous txid carried by the synthetic coinbase input.
pub const COINBASE_PREV_TXID: &str = "0000000000000000000000000000000000000000000000000000000000000000";
/// Previous output index carried by the synthetic coinbase input.
pub const COINBASE_PREV_VOUT: i64 = -1;

#[derive(Debug, Clone, PartialEq)]
pub struct Input {
  pub prev_txid: String,
  /// -1 for coinbase
  pub prev_vout_index: i64,
  pub script_sig: Script,
  pub sequence: u32,
  pub witness: Vec<Vec<u8>>,
  /// Value of the spent output in satoshis. 0 for coinbase.
  pub value: u64,
}

impl Input {
  fn coinbase(raw: &RawInput, coinbase_hex: &str) -> Result<Self, AppError> {
    Ok(Self {
      prev_txid: COINBASE_PREV_TXID.to_string(),
      prev_vout_index: COINBASE_PREV_VOUT,
      script_sig: Script::from_hex(coinbase_hex)?,
      sequence: raw.sequence,
      witness: Vec::new(),
      value: 0,
    })
  }

  fn spending(raw: &RawInput, value: u64) -> Result<Self, AppError> {
    let prev_txid = raw
      .txid
      .clone()
      .ok_or_else(|| AppError::Block("input without txid".to_string()))?;
    let prev_vout = raw
      .vout
      .ok_or_else(|| AppError::Block(format!("input spending {} without vout", prev_txid)))?;
    let script_sig = match &raw.script_sig {
      Some(script) => Script::from_hex(&script.hex)?,
      None => Script::default(),
    };
    let witness = raw
      .txinwitness
      .iter()
      .map(hex::decode)
      .collect::<Result<Vec<_>, _>>()?;

    Ok(Self {
      prev_txid,
      prev_vout_index: i64::from(prev_vout),
      script_sig,
      sequence: raw.sequence,
      witness,
      value,
    })
  }

  pub fn is_coinbase(&self) -> bool {
    self.prev_vout_index == COINBASE_PREV_VOUT && self.prev_txid == COINBASE_PREV_TXID
  }
}

#[derive(Debug, Clone, PartialEq)]
pub struct Output {
  /// satoshis
  pub value: u64,
  pub script_pubkey: Script,
  pub n: u32,
}

#[derive(Debug, Clone, PartialEq)]
pub struct Transaction {
  pub txid: String,
  pub version: i32,
  pub locktime: u32,
  pub inputs: Vec<Input>,
  pub outputs: Vec<Output>,
  /// bytes
  pub size: u64,
  /// weight units
  pub weight: u64,
  pub is_coinbase: bool,
}

impl Transaction {
  /// Builds a transaction from its RPC form.
  ///
  /// `input_values[i]` is the value in satoshis of the output spent by
  /// `raw.vin[i]`; the RPC form does not carry it, so the caller has to look
  /// it up first. Missing entries count as 0, which will show up as a wrong
  /// (possibly negative) fee. Coinbase inputs ignore their entry.
  pub fn from_rpc(raw: &RawTransaction, input_values: &[u64]) -> Result<Self, AppError> {
    let is_coinbase = raw.vin.first().map_or(false, RawInput::is_coinbase);

    let inputs = raw
      .vin
      .iter()
      .enumerate()
      .map(|(i, vin)| match &vin.coinbase {
        Some(coinbase_hex) => Input::coinbase(vin, coinbase_hex),
        None => Input::spending(vin, input_values.get(i).copied().unwrap_or(0)),
      })
      .collect::<Result<Vec<_>, _>>()?;

    let outputs = raw
      .vout
      .iter()
      .enumerate()
      .map(|(n, vout)| {
        Ok(Output {
          value: btc_to_sats(vout.value),
          script_pubkey: Script::from_hex(&vout.script_pub_key.hex)?,
          n: n as u32,
        })
      })
      .collect::<Result<Vec<_>, AppError>>()?;

    Ok(Self {
      txid: raw.txid.clone(),
      version: raw.version,
      locktime: raw.locktime,
      inputs,
      outputs,
      size: raw.size,
      weight: raw.weight,
      is_coinbase,
    })
  }

  pub fn input_value(&self) -> u64 {
    self.inputs.iter().map(|input| input.value).sum()
  }

  pub fn output_value(&self) -> u64 {
    self.outputs.iter().map(|output| output.value).sum()
  }

  /// Satoshis paid to the miner. Zero for coinbase. Never clamped: a negative
  /// value means the input values were not resolved correctly.
  pub fn fee(&self) -> i64 {
    if self.is_coinbase {
      return 0;
    }
    self.input_value() as i64 - self.output_value() as i64
  }

  pub fn vbytes(&self) -> f64 {
    self.weight as f64 / 4.0
  }

  /// sat/vB; `None` for coinbase and for zero-weight transactions.
  pub fn fee_rate(&self) -> Option<f64> {
    let vbytes = self.vbytes();
    if self.is_coinbase || vbytes == 0.0 {
      return None;
    }
    Some(self.fee() as f64 / vbytes)
  }
}

impl fmt::Display for Transaction {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    match self.fee_rate() {
      Some(rate) => write!(f, "tx: {}, fee: {}, feeRate: {:.2}", self.txid, self.fee(), rate),
      None => write!(f, "tx: {}, fee: {}, coinbase", self.txid, self.fee()),
    }
  }
}
