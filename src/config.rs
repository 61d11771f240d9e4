use serde::Deserialize;
use std::time::Duration;

use crate::coin::bitcoin::rpc::{
  Endpoint, DEFAULT_MAX_RETRIES, DEFAULT_POOL_SIZE,
};
use crate::coin::market::client::{
  DEFAULT_KLINES_URL, DEFAULT_PRICE_TIMEOUT, DEFAULT_SPOT_URL, DEFAULT_SYMBOL,
};
use crate::fetcher::bitcoin_fetcher::{
  FetcherOptions, DEFAULT_BULK_WORKERS, DEFAULT_INPUT_WORKERS, DEFAULT_MEMPOOL_WORKERS,
};
use crate::tasks::MempoolMonitorConfig;

#[derive(Debug, Deserialize, Clone)]
pub struct Settings {
  pub node: NodeSettings,
  #[serde(default)]
  pub market: MarketSettings,
  #[serde(default)]
  pub fetcher: FetcherSettings,
  #[serde(default)]
  pub mempool: MempoolSettings,
}

#[derive(Deserialize, Clone)]
pub struct NodeSettings {
  #[serde(default = "default_scheme")]
  pub scheme: String,
  #[serde(default = "default_host")]
  pub host: String,
  #[serde(default = "default_port")]
  pub port: u16,
  #[serde(default = "default_path")]
  pub path: String,
  pub user: String,
  pub password: String,
  #[serde(default = "default_timeout_secs")]
  pub timeout_secs: u64,
  #[serde(default = "default_max_retries")]
  pub max_retries: u32,
  #[serde(default = "default_retry_base_delay_ms")]
  pub retry_base_delay_ms: u64,
  #[serde(default = "default_pool_size")]
  pub pool_size: usize,
}

// 비밀번호는 로그에 남기지 않음
impl std::fmt::Debug for NodeSettings {
  fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
    f.debug_struct("NodeSettings")
      .field("scheme", &self.scheme)
      .field("host", &self.host)
      .field("port", &self.port)
      .field("path", &self.path)
      .field("user", &self.user)
      .field("timeout_secs", &self.timeout_secs)
      .field("max_retries", &self.max_retries)
      .field("retry_base_delay_ms", &self.retry_base_delay_ms)
      .field("pool_size", &self.pool_size)
      .finish()
  }
}

#[derive(Debug, Deserialize, Clone)]
pub struct MarketSettings {
  #[serde(default = "default_true")]
  pub enabled: bool,
  #[serde(default = "default_spot_url")]
  pub spot_url: String,
  #[serde(default = "default_klines_url")]
  pub klines_url: String,
  #[serde(default = "default_symbol")]
  pub symbol: String,
  /// Per-request bound for the price provider.
  #[serde(default = "default_market_timeout_secs")]
  pub timeout_secs: u64,
}

#[derive(Debug, Deserialize, Clone)]
pub struct FetcherSettings {
  #[serde(default = "default_true")]
  pub enabled: bool,
  /// Height to start following from; the current tip when unset.
  #[serde(default)]
  pub start_block: Option<u64>,
  #[serde(default = "default_interval_secs")]
  pub interval_secs: u64,
  #[serde(default = "default_input_workers")]
  pub input_workers: usize,
  #[serde(default = "default_bulk_workers")]
  pub bulk_workers: usize,
}

#[derive(Debug, Deserialize, Clone)]
pub struct MempoolSettings {
  #[serde(default = "default_true")]
  pub enabled: bool,
  #[serde(default = "default_mempool_interval_secs")]
  pub interval_secs: u64,
  #[serde(default = "default_mempool_workers")]
  pub entry_workers: usize,
}

fn default_scheme() -> String {
  "http".to_string()
}

fn default_host() -> String {
  "localhost".to_string()
}

fn default_port() -> u16 {
  8332
}

fn default_path() -> String {
  "/".to_string()
}

fn default_timeout_secs() -> u64 {
  120
}

fn default_max_retries() -> u32 {
  DEFAULT_MAX_RETRIES
}

fn default_retry_base_delay_ms() -> u64 {
  1000
}

fn default_pool_size() -> usize {
  DEFAULT_POOL_SIZE
}

fn default_true() -> bool {
  true
}

fn default_spot_url() -> String {
  DEFAULT_SPOT_URL.to_string()
}

fn default_klines_url() -> String {
  DEFAULT_KLINES_URL.to_string()
}

fn default_symbol() -> String {
  DEFAULT_SYMBOL.to_string()
}

fn default_market_timeout_secs() -> u64 {
  DEFAULT_PRICE_TIMEOUT.as_secs()
}

fn default_interval_secs() -> u64 {
  30
}

fn default_input_workers() -> usize {
  DEFAULT_INPUT_WORKERS
}

fn default_bulk_workers() -> usize {
  DEFAULT_BULK_WORKERS
}

fn default_mempool_interval_secs() -> u64 {
  60
}

fn default_mempool_workers() -> usize {
  DEFAULT_MEMPOOL_WORKERS
}

impl Default for MarketSettings {
  fn default() -> Self {
    Self {
      enabled: true,
      spot_url: default_spot_url(),
      klines_url: default_klines_url(),
      symbol: default_symbol(),
      timeout_secs: default_market_timeout_secs(),
    }
  }
}

impl Default for FetcherSettings {
  fn default() -> Self {
    Self {
      enabled: true,
      start_block: None,
      interval_secs: default_interval_secs(),
      input_workers: default_input_workers(),
      bulk_workers: default_bulk_workers(),
    }
  }
}

impl Default for MempoolSettings {
  fn default() -> Self {
    Self {
      enabled: true,
      interval_secs: default_mempool_interval_secs(),
      entry_workers: default_mempool_workers(),
    }
  }
}

impl Settings {
  pub fn new() -> Result<Self, config::ConfigError> {
    let default_config_path = "./config.toml";
    let env_prefix = "APP"; // Environment variable prefix (e.g., APP_NODE__PASSWORD=...)

    let builder = config::Config::builder()
      .add_source(config::File::with_name(default_config_path).required(true))
      // E.g., `APP_NODE__HOST=10.0.0.5` would override config file value
      .add_source(config::Environment::with_prefix(env_prefix).separator("__").try_parsing(true));

    let settings: Settings = builder.build()?.try_deserialize()?;
    settings.validate()?;
    Ok(settings)
  }

  pub fn from_toml_str(toml: &str) -> Result<Self, config::ConfigError> {
    let settings: Settings = config::Config::builder()
      .add_source(config::File::from_str(toml, config::FileFormat::Toml))
      .build()?
      .try_deserialize()?;
    settings.validate()?;
    Ok(settings)
  }

  // tokio의 interval은 0초 주기를 허용하지 않음
  fn validate(&self) -> Result<(), config::ConfigError> {
    let zero_keys = [
      ("fetcher.interval_secs", self.fetcher.interval_secs),
      ("mempool.interval_secs", self.mempool.interval_secs),
      ("market.timeout_secs", self.market.timeout_secs),
      ("node.timeout_secs", self.node.timeout_secs),
    ];
    match zero_keys.iter().find(|(_, value)| *value == 0) {
      Some((key, _)) => Err(config::ConfigError::Message(format!("{} must be at least 1", key))),
      None => Ok(()),
    }
  }

  pub fn price_timeout(&self) -> Duration {
    Duration::from_secs(self.market.timeout_secs)
  }

  pub fn endpoint(&self) -> Endpoint {
    let node = &self.node;
    Endpoint::new(node.host.clone(), node.port, node.user.clone(), node.password.clone())
      .with_scheme(node.scheme.clone())
      .with_path(node.path.clone())
      .with_timeout(Duration::from_secs(node.timeout_secs))
      .with_max_retries(node.max_retries)
      .with_retry_base_delay(Duration::from_millis(node.retry_base_delay_ms))
      .with_pool_size(node.pool_size)
  }

  pub fn fetcher_options(&self) -> FetcherOptions {
    FetcherOptions {
      input_workers: self.fetcher.input_workers,
      bulk_workers: self.fetcher.bulk_workers,
      mempool_workers: self.mempool.entry_workers,
      price_timeout: self.price_timeout(),
    }
  }

  pub fn mempool_monitor_config(&self) -> MempoolMonitorConfig {
    MempoolMonitorConfig {
      enabled: self.mempool.enabled,
      check_interval_secs: self.mempool.interval_secs,
      entry_workers: self.mempool.entry_workers,
    }
  }
}
