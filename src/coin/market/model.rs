/**
* filename : model
* author : HAMA
* date: 2025. 4. 10.
* description: Market price shapes
**/

use serde::Deserialize;
use serde_json::Value;
use std::collections::HashMap;

use crate::types::PriceError;

/// BTC price sampled at some moment: whole dollars per BTC and satoshis per dollar.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct Price {
  pub usd: u64,
  pub sats_per_usd: u64,
}

impl Price {
  /// Stands in for a price the provider could not supply.
  pub const UNAVAILABLE: Price = Price { usd: 0, sats_per_usd: 0 };

  /// Both parts are truncated, not rounded.
  pub fn from_usd(usd: f64) -> Self {
    if !usd.is_finite() || usd <= 0.0 {
      return Self::UNAVAILABLE;
    }
    Self {
      usd: usd as u64,
      sats_per_usd: (1.0 / usd * 1e8) as u64,
    }
  }

  pub fn is_available(&self) -> bool {
    *self != Self::UNAVAILABLE
  }
}

/// One kline row: `[open_time, open, high, low, close, volume, close_time, ...]`
#[derive(Debug, Clone, Deserialize)]
pub struct Kline(pub Vec<Value>);

impl Kline {
  pub fn close(&self) -> Result<f64, PriceError> {
    let close = self
      .0
      .get(4)
      .ok_or_else(|| PriceError::Decode("kline row has no close price".to_string()))?;
    match close {
      Value::String(s) => s
        .parse::<f64>()
        .map_err(|e| PriceError::Decode(format!("kline close '{}': {}", s, e))),
      Value::Number(n) => n
        .as_f64()
        .ok_or_else(|| PriceError::Decode(format!("kline close {}", n))),
      other => Err(PriceError::Decode(format!("kline close {}", other))),
    }
  }
}

/// `simple/price?ids=bitcoin&vs_currencies=usd` → `{"bitcoin": {"usd": 64000.1}}`
pub type SimplePriceResponse = HashMap<String, HashMap<String, f64>>;
