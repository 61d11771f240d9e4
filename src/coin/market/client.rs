/**
* filename : client
* author : HAMA
* date: 2025. 4. 10.
* description: Spot price (CoinGecko) and block-time price (Binance klines)
**/

use async_trait::async_trait;
use reqwest::Client;
use std::time::Duration;

use crate::coin::coin_trait::PriceSource;
use crate::coin::market::model::{Kline, Price, SimplePriceResponse};
use crate::types::PriceError;

pub const DEFAULT_SPOT_URL: &str = "https://api.coingecko.com/api/v3/simple/price";
pub const DEFAULT_KLINES_URL: &str = "https://api.binance.com/api/v3/klines";
pub const DEFAULT_SYMBOL: &str = "BTCUSDT";
pub const DEFAULT_PRICE_TIMEOUT: Duration = Duration::from_secs(10);

/// Half-width of the kline window around a block time.
const WINDOW_MS: u64 = 60_000;

#[derive(Clone)]
pub struct MarketPriceClient {
  client: Client,
  spot_url: String,
  klines_url: String,
  symbol: String,
}

impl MarketPriceClient {
  /// `timeout` bounds each request, connect included. A provider that never
  /// answers then fails the lookup instead of holding up block assembly.
  pub fn new(
    spot_url: String,
    klines_url: String,
    symbol: String,
    timeout: Duration,
  ) -> Result<Self, PriceError> {
    let client = Client::builder().timeout(timeout).build()?;
    Ok(Self {
      client,
      spot_url,
      klines_url,
      symbol,
    })
  }
}

#[async_trait]
impl PriceSource for MarketPriceClient {
  async fn spot_price(&self) -> Result<Price, PriceError> {
    let response = self
      .client
      .get(&self.spot_url)
      .query(&[("ids", "bitcoin"), ("vs_currencies", "usd")])
      .send()
      .await?
      .json::<SimplePriceResponse>()
      .await?;

    let usd = response
      .get("bitcoin")
      .and_then(|prices| prices.get("usd"))
      .copied()
      .ok_or(PriceError::NoData)?;
    Ok(Price::from_usd(usd))
  }

  async fn price_at(&self, unix_time: u64) -> Result<Price, PriceError> {
    let timestamp_ms = unix_time * 1000;
    let start = timestamp_ms.saturating_sub(WINDOW_MS).to_string();
    let end = (timestamp_ms + WINDOW_MS).to_string();

    let klines = self
      .client
      .get(&self.klines_url)
      .query(&[
        ("symbol", self.symbol.as_str()),
        ("interval", "1m"),
        ("startTime", start.as_str()),
        ("endTime", end.as_str()),
        ("limit", "2"),
      ])
      .send()
      .await?
      .json::<Vec<Kline>>()
      .await?;

    let first = klines.first().ok_or(PriceError::NoData)?;
    Ok(Price::from_usd(first.close()?))
  }
}

/// Price source for runs without market data; every lookup reports no data.
#[derive(Debug, Clone, Copy, Default)]
pub struct NoPriceSource;

#[async_trait]
impl PriceSource for NoPriceSource {
  async fn spot_price(&self) -> Result<Price, PriceError> {
    Err(PriceError::NoData)
  }

  async fn price_at(&self, _unix_time: u64) -> Result<Price, PriceError> {
    Err(PriceError::NoData)
  }
}
