/**
* filename : rpc
* author : HAMA
* date: 2025. 4. 9.
* description: JSON-RPC 1.1 transport for Bitcoin Core with retry and reconnection
**/

use std::fmt;
use std::str::FromStr;
use std::sync::atomic::{AtomicU64, AtomicUsize, Ordering};
use std::sync::Mutex;
use std::time::Duration;

use async_trait::async_trait;
use log::{debug, warn};
use reqwest::Client;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use tokio::sync::{Semaphore, SemaphorePermit};

use crate::coin::coin_trait::RpcTransport;
use crate::types::RpcError;

pub const DEFAULT_MAX_RETRIES: u32 = 10;
pub const DEFAULT_TIMEOUT: Duration = Duration::from_secs(120);
pub const DEFAULT_RETRY_BASE_DELAY: Duration = Duration::from_secs(1);
pub const DEFAULT_POOL_SIZE: usize = 4;

/// Connection descriptor for one node. Never changes once the transport owns it.
#[derive(Clone)]
pub struct Endpoint {
  scheme: String,
  host: String,
  port: u16,
  path: String,
  user: String,
  password: String,
  timeout: Duration,
  max_retries: u32,
  retry_base_delay: Duration,
  pool_size: usize,
}

impl Endpoint {
  pub fn new(host: impl Into<String>, port: u16, user: impl Into<String>, password: impl Into<String>) -> Self {
    Self {
      scheme: "http".to_string(),
      host: host.into(),
      port,
      path: "/".to_string(),
      user: user.into(),
      password: password.into(),
      timeout: DEFAULT_TIMEOUT,
      max_retries: DEFAULT_MAX_RETRIES,
      retry_base_delay: DEFAULT_RETRY_BASE_DELAY,
      pool_size: DEFAULT_POOL_SIZE,
    }
  }

  pub fn with_scheme(mut self, scheme: impl Into<String>) -> Self {
    self.scheme = scheme.into();
    self
  }

  pub fn with_path(mut self, path: impl Into<String>) -> Self {
    let path = path.into();
    self.path = if path.starts_with('/') { path } else { format!("/{}", path) };
    self
  }

  pub fn with_timeout(mut self, timeout: Duration) -> Self {
    self.timeout = timeout;
    self
  }

  /// Attempts per call, including the first one. Clamped to at least 1.
  pub fn with_max_retries(mut self, max_retries: u32) -> Self {
    self.max_retries = max_retries.max(1);
    self
  }

  pub fn with_retry_base_delay(mut self, delay: Duration) -> Self {
    self.retry_base_delay = delay;
    self
  }

  pub fn with_pool_size(mut self, pool_size: usize) -> Self {
    self.pool_size = pool_size.max(1);
    self
  }

  pub fn url(&self) -> String {
    format!("{}://{}:{}{}", self.scheme, self.host, self.port, self.path)
  }

  pub fn host(&self) -> &str {
    &self.host
  }

  pub fn port(&self) -> u16 {
    self.port
  }

  pub fn max_retries(&self) -> u32 {
    self.max_retries
  }

  pub fn retry_base_delay(&self) -> Duration {
    self.retry_base_delay
  }

  pub fn timeout(&self) -> Duration {
    self.timeout
  }
}

// password stays out of logs
impl fmt::Debug for Endpoint {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    f.debug_struct("Endpoint")
      .field("url", &self.url())
      .field("user", &self.user)
      .field("timeout", &self.timeout)
      .field("max_retries", &self.max_retries)
      .field("retry_base_delay", &self.retry_base_delay)
      .field("pool_size", &self.pool_size)
      .finish()
  }
}

/// Remote methods the scanner knows about. Anything else goes through `Other`.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum RpcMethod {
  GetBlockCount,
  GetBlockHash,
  GetBlock,
  GetRawTransaction,
  GetTxOutSetInfo,
  GetRawMempool,
  GetMempoolEntry,
  GetBlockchainInfo,
  GetTransaction,
  Other(String),
}

impl RpcMethod {
  pub fn as_str(&self) -> &str {
    match self {
      RpcMethod::GetBlockCount => "getblockcount",
      RpcMethod::GetBlockHash => "getblockhash",
      RpcMethod::GetBlock => "getblock",
      RpcMethod::GetRawTransaction => "getrawtransaction",
      RpcMethod::GetTxOutSetInfo => "gettxoutsetinfo",
      RpcMethod::GetRawMempool => "getrawmempool",
      RpcMethod::GetMempoolEntry => "getmempoolentry",
      RpcMethod::GetBlockchainInfo => "getblockchaininfo",
      RpcMethod::GetTransaction => "gettransaction",
      RpcMethod::Other(name) => name,
    }
  }
}

impl FromStr for RpcMethod {
  type Err = RpcError;

  /// Lowercases the name and refuses dunder-style names (`__call__`) and blanks.
  fn from_str(name: &str) -> Result<Self, Self::Err> {
    let trimmed = name.trim();
    if trimmed.is_empty() || (trimmed.starts_with("__") && trimmed.ends_with("__")) {
      return Err(RpcError::ReservedMethod(name.to_string()));
    }

    let method = match trimmed.to_lowercase().as_str() {
      "getblockcount" => RpcMethod::GetBlockCount,
      "getblockhash" => RpcMethod::GetBlockHash,
      "getblock" => RpcMethod::GetBlock,
      "getrawtransaction" => RpcMethod::GetRawTransaction,
      "gettxoutsetinfo" => RpcMethod::GetTxOutSetInfo,
      "getrawmempool" => RpcMethod::GetRawMempool,
      "getmempoolentry" => RpcMethod::GetMempoolEntry,
      "getblockchaininfo" => RpcMethod::GetBlockchainInfo,
      "gettransaction" => RpcMethod::GetTransaction,
      other => RpcMethod::Other(other.to_string()),
    };
    Ok(method)
  }
}

impl fmt::Display for RpcMethod {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    f.write_str(self.as_str())
  }
}

#[derive(Debug, Serialize)]
pub struct RpcRequest<'a> {
  pub version: &'static str,
  pub method: &'a str,
  pub params: &'a [Value],
  pub id: u64,
}

#[derive(Debug, Deserialize)]
pub struct RpcResponse {
  #[serde(default)]
  pub result: Option<Value>,
  #[serde(default)]
  pub error: Option<RpcErrorObject>,
  #[serde(default)]
  pub id: Option<Value>,
}

#[derive(Debug, Deserialize)]
pub struct RpcErrorObject {
  #[serde(default)]
  pub code: i64,
  #[serde(default)]
  pub message: Option<String>,
}

impl RpcResponse {
  pub fn into_result(self) -> Result<Value, RpcError> {
    match self.error {
      Some(err) => Err(RpcError::Remote {
        code: err.code,
        message: err.message.unwrap_or_else(|| "Unknown RPC error".to_string()),
      }),
      None => Ok(self.result.unwrap_or(Value::Null)),
    }
  }
}

enum ConnectionState {
  Connected(Client),
  Reconnecting,
}

/// One HTTP connection to the node. Only the caller that checked it out
/// touches it, so the state machine needs no locking of its own.
struct Connection {
  id: usize,
  state: ConnectionState,
}

impl Connection {
  fn open(id: usize, endpoint: &Endpoint) -> Self {
    let state = match build_client(endpoint) {
      Ok(client) => ConnectionState::Connected(client),
      Err(e) => {
        debug!("[BTC RPC] connection #{} could not be set up yet: {}", id, e);
        ConnectionState::Reconnecting
      }
    };
    Self { id, state }
  }

  fn client(&mut self, endpoint: &Endpoint) -> Result<Client, RpcError> {
    match &self.state {
      ConnectionState::Connected(client) => Ok(client.clone()),
      ConnectionState::Reconnecting => {
        let client = build_client(endpoint)?;
        self.state = ConnectionState::Connected(client.clone());
        Ok(client)
      }
    }
  }

  /// Drops the current client and builds a fresh one. A failed setup is
  /// swallowed here; the next attempt retries it through `client`.
  fn reconnect(&mut self, endpoint: &Endpoint) {
    self.state = ConnectionState::Reconnecting;
    match build_client(endpoint) {
      Ok(client) => {
        debug!("[BTC RPC] connection #{} re-established", self.id);
        self.state = ConnectionState::Connected(client);
      }
      Err(e) => debug!("[BTC RPC] connection #{} reconnect failed: {}", self.id, e),
    }
  }
}

fn build_client(endpoint: &Endpoint) -> Result<Client, RpcError> {
  // one idle socket per client so a fresh client really means a fresh connection
  let client = Client::builder()
    .timeout(endpoint.timeout)
    .pool_max_idle_per_host(1)
    .build()?;
  Ok(client)
}

/// Checkout pool: at most `pool_size` connections are in use at once and each
/// is owned by exactly one call while checked out.
struct ConnectionPool {
  idle: Mutex<Vec<Connection>>,
  permits: Semaphore,
  next_id: AtomicUsize,
}

struct PooledConnection<'a> {
  conn: Connection,
  pool: &'a ConnectionPool,
  _permit: SemaphorePermit<'a>,
}

impl ConnectionPool {
  fn new(size: usize) -> Self {
    Self {
      idle: Mutex::new(Vec::with_capacity(size)),
      permits: Semaphore::new(size),
      next_id: AtomicUsize::new(0),
    }
  }

  async fn checkout(&self, endpoint: &Endpoint) -> Result<PooledConnection<'_>, RpcError> {
    let permit = self.permits.acquire().await.map_err(|_| RpcError::PoolClosed)?;
    let reused = match self.idle.lock() {
      Ok(mut idle) => idle.pop(),
      Err(poisoned) => poisoned.into_inner().pop(),
    };
    let conn = match reused {
      Some(conn) => conn,
      None => Connection::open(self.next_id.fetch_add(1, Ordering::Relaxed), endpoint),
    };
    Ok(PooledConnection { conn, pool: self, _permit: permit })
  }
}

impl Drop for PooledConnection<'_> {
  fn drop(&mut self) {
    let placeholder = Connection { id: self.conn.id, state: ConnectionState::Reconnecting };
    let conn = std::mem::replace(&mut self.conn, placeholder);
    match self.pool.idle.lock() {
      Ok(mut idle) => idle.push(conn),
      Err(poisoned) => poisoned.into_inner().push(conn),
    }
  }
}

/// Bitcoin Core JSON-RPC over HTTP with Basic auth.
///
/// Every call runs a bounded retry loop: a failed attempt (transport error,
/// timeout, undecodable body or an `error` payload) sleeps `attempt * base_delay`,
/// reconnects and tries again. Only exhaustion reaches the caller.
pub struct HttpTransport {
  endpoint: Endpoint,
  pool: ConnectionPool,
  next_request_id: AtomicU64,
}

impl HttpTransport {
  pub fn new(endpoint: Endpoint) -> Self {
    let pool = ConnectionPool::new(endpoint.pool_size);
    Self {
      endpoint,
      pool,
      next_request_id: AtomicU64::new(1),
    }
  }

  pub fn endpoint(&self) -> &Endpoint {
    &self.endpoint
  }

  async fn attempt(&self, client: &Client, method: &str, params: &[Value]) -> Result<Value, RpcError> {
    let request = RpcRequest {
      version: "1.1",
      method,
      params,
      id: self.next_request_id.fetch_add(1, Ordering::Relaxed),
    };

    let response = client
      .post(self.endpoint.url())
      .basic_auth(&self.endpoint.user, Some(&self.endpoint.password))
      .header("Content-Type", "application/json")
      .json(&request)
      .send()
      .await?;

    // bitcoind answers RPC errors with HTTP 500 and a JSON body, so the status
    // alone says nothing
    let status = response.status();
    let body = response.bytes().await?;
    let parsed: RpcResponse = serde_json::from_slice(&body)
      .map_err(|e| RpcError::Decode(format!("HTTP {}: {}", status, e)))?;
    parsed.into_result()
  }
}

#[async_trait]
impl RpcTransport for HttpTransport {
  async fn call(&self, method: &str, params: Vec<Value>) -> Result<Value, RpcError> {
    let method: RpcMethod = method.parse()?;
    let max_retries = self.endpoint.max_retries;
    let mut conn = self.pool.checkout(&self.endpoint).await?;
    let mut last_error = None;

    for attempt in 1..=max_retries {
      let outcome = match conn.conn.client(&self.endpoint) {
        Ok(client) => self.attempt(&client, method.as_str(), &params).await,
        Err(e) => Err(e),
      };

      match outcome {
        Ok(result) => return Ok(result),
        Err(e) => {
          warn!(
            "[BTC RPC] '{}' attempt {}/{} failed: {}",
            method, attempt, max_retries, e
          );
          last_error = Some(e);
        }
      }

      if attempt < max_retries {
        tokio::time::sleep(self.endpoint.retry_base_delay * attempt).await;
        conn.conn.reconnect(&self.endpoint);
      }
    }

    Err(RpcError::Exhausted {
      method: method.as_str().to_string(),
      params: Value::Array(params),
      attempts: max_retries,
      last: Box::new(last_error.unwrap_or_else(|| RpcError::Decode("no attempt was made".to_string()))),
    })
  }
}
