/**
* filename : units
* author : HAMA
* date: 2025. 4. 8.
* description: BTC / satoshi conversions
**/

use rust_decimal::Decimal;

pub const SATS_PER_BTC: u64 = 100_000_000;

/// RPC amounts arrive as BTC floats; round to the nearest satoshi.
/// Negative or non-finite input yields 0.
pub fn btc_to_sats(btc: f64) -> u64 {
  if !btc.is_finite() || btc <= 0.0 {
    return 0;
  }
  (btc * SATS_PER_BTC as f64).round() as u64
}

/// Satoshi를 BTC로 변환
pub fn satoshi_to_btc(satoshi: u64) -> Decimal {
  Decimal::from(satoshi) / Decimal::from(SATS_PER_BTC)
}

pub fn signed_satoshi_to_btc(satoshi: i64) -> Decimal {
  Decimal::from(satoshi) / Decimal::from(SATS_PER_BTC)
}
