#![allow(dead_code)]

use std::collections::HashMap;
use std::net::SocketAddr;
use std::sync::{Arc, Mutex};
use std::time::Duration;

use async_trait::async_trait;
use serde_json::{json, Value};
use tokio::io::{AsyncBufReadExt, AsyncReadExt, AsyncWriteExt, BufReader};
use tokio::net::{TcpListener, TcpStream};
use tokio::task::JoinHandle;

use xscanner_btc::coin::coin_trait::{PriceSource, RpcTransport};
use xscanner_btc::coin::market::Price;
use xscanner_btc::types::{PriceError, RpcError};

// ====== Chain fixtures (Bitcoin Core verbose JSON shapes) ======

pub fn coinbase_tx(txid: &str, value_btc: f64) -> Value {
  json!({
    "txid": txid,
    "hash": txid,
    "version": 2,
    "locktime": 0,
    "size": 120,
    "weight": 480,
    "vin": [{ "coinbase": "03a0bb0d0400000000", "sequence": 4294967295u32 }],
    "vout": [{ "value": value_btc, "n": 0, "scriptPubKey": { "hex": "0014f1d2" } }]
  })
}

/// `inputs` are `(previous txid, previous vout)`.
pub fn spend_tx(txid: &str, inputs: &[(&str, u32)], outputs_btc: &[f64], weight: u64) -> Value {
  let vin: Vec<Value> = inputs
    .iter()
    .map(|(prev, vout)| {
      json!({
        "txid": prev,
        "vout": vout,
        "scriptSig": { "asm": "", "hex": "" },
        "txinwitness": ["3044022001", "02ab"],
        "sequence": 4294967293u32
      })
    })
    .collect();
  let vout: Vec<Value> = outputs_btc
    .iter()
    .enumerate()
    .map(|(n, value)| json!({ "value": value, "n": n, "scriptPubKey": { "hex": "76a914bb88ac" } }))
    .collect();
  json!({
    "txid": txid,
    "hash": txid,
    "version": 2,
    "locktime": 0,
    "size": weight / 4,
    "weight": weight,
    "vin": vin,
    "vout": vout
  })
}

pub fn block_json(height: u64, time: u64, txs: Vec<Value>) -> Value {
  json!({
    "hash": block_hash(height),
    "height": height,
    "version": 536870912,
    "merkleroot": format!("{:064x}", height + 1),
    "time": time,
    "mediantime": time - 600,
    "nonce": 2083236893u64,
    "bits": "17034219",
    "size": 1500,
    "weight": 6000,
    "nTx": txs.len(),
    "difficulty": 86388558925171.02,
    "chainwork": "00000000000000000000000000000000000000007ab8c5d5a8a8f1b2c3d4e5f6",
    "tx": txs
  })
}

pub fn block_hash(height: u64) -> String {
  format!("{:064x}", 0xb10c_0000u64 + height)
}

pub fn not_found(method: &str, params: &[Value]) -> RpcError {
  RpcError::Exhausted {
    method: method.to_string(),
    params: Value::Array(params.to_vec()),
    attempts: 1,
    last: Box::new(RpcError::Remote {
      code: -5,
      message: "No such mempool or blockchain transaction".to_string(),
    }),
  }
}

// ====== In-memory node ======

#[derive(Default)]
pub struct FakeChain {
  pub tip: u64,
  blocks: HashMap<u64, Value>,
  txs: HashMap<String, Value>,
  delays: HashMap<u64, Duration>,
  mempool: Vec<String>,
  mempool_entries: HashMap<String, Value>,
  wallet: HashMap<String, Value>,
  calls: Mutex<Vec<(String, Vec<Value>)>>,
}

impl FakeChain {
  pub fn new() -> Self {
    Self::default()
  }

  pub fn with_block(mut self, block: Value) -> Self {
    let height = block["height"].as_u64().unwrap();
    self.tip = self.tip.max(height);
    self.blocks.insert(height, block);
    self
  }

  /// A transaction that `getrawtransaction` can find (previous outputs).
  pub fn with_tx(mut self, tx: Value) -> Self {
    let txid = tx["txid"].as_str().unwrap().to_string();
    self.txs.insert(txid, tx);
    self
  }

  /// Slows down `getblockhash` for one height.
  pub fn with_delay(mut self, height: u64, delay: Duration) -> Self {
    self.delays.insert(height, delay);
    self
  }

  /// `entry = None` lists the txid but makes `getmempoolentry` fail for it.
  pub fn with_mempool_tx(mut self, txid: &str, entry: Option<Value>) -> Self {
    self.mempool.push(txid.to_string());
    if let Some(entry) = entry {
      self.mempool_entries.insert(txid.to_string(), entry);
    }
    self
  }

  /// A transaction that the wallet RPC `gettransaction` knows about.
  pub fn with_wallet_tx(mut self, txid: &str, details: Value) -> Self {
    self.wallet.insert(txid.to_string(), details);
    self
  }

  pub fn calls(&self) -> Vec<(String, Vec<Value>)> {
    self.calls.lock().unwrap().clone()
  }

  pub fn call_count(&self, method: &str) -> usize {
    self.calls.lock().unwrap().iter().filter(|(m, _)| m == method).count()
  }
}

#[async_trait]
impl RpcTransport for FakeChain {
  async fn call(&self, method: &str, params: Vec<Value>) -> Result<Value, RpcError> {
    self.calls.lock().unwrap().push((method.to_string(), params.clone()));

    match method {
      "getblockcount" => Ok(json!(self.tip)),
      "getblockhash" => {
        let height = params[0].as_u64().unwrap();
        if let Some(delay) = self.delays.get(&height) {
          tokio::time::sleep(*delay).await;
        }
        self
          .blocks
          .get(&height)
          .map(|block| block["hash"].clone())
          .ok_or_else(|| not_found(method, &params))
      }
      "getblock" => {
        let hash = params[0].as_str().unwrap();
        Ok(
          self
            .blocks
            .values()
            .find(|block| block["hash"] == hash)
            .cloned()
            .unwrap_or(Value::Null),
        )
      }
      "getrawtransaction" => {
        let txid = params[0].as_str().unwrap();
        self.txs.get(txid).cloned().ok_or_else(|| not_found(method, &params))
      }
      "getrawmempool" => {
        if params.first() == Some(&json!(true)) {
          let verbose: serde_json::Map<String, Value> = self
            .mempool_entries
            .iter()
            .map(|(txid, entry)| (txid.clone(), entry.clone()))
            .collect();
          Ok(Value::Object(verbose))
        } else {
          Ok(json!(self.mempool))
        }
      }
      "getmempoolentry" => {
        let txid = params[0].as_str().unwrap();
        self
          .mempool_entries
          .get(txid)
          .cloned()
          .ok_or_else(|| not_found(method, &params))
      }
      "gettxoutsetinfo" => Ok(json!({
        "height": self.tip,
        "bestblock": block_hash(self.tip),
        "txouts": 177_114_223u64,
        "bogosize": 13_361_329_542u64,
        "total_amount": 19_687_500.0,
        "transactions": 112_345_678u64
      })),
      "getblockchaininfo" => Ok(json!({
        "chain": "regtest",
        "blocks": self.tip,
        "headers": self.tip + 4,
        "bestblockhash": block_hash(self.tip),
        "difficulty": 4.656542373906925e-10,
        "chainwork": format!("{:064x}", (self.tip + 1) * 2),
        "pruned": false,
        "size_on_disk": 3u64 * 1024 * 1024 * 1024,
        "verificationprogress": 1.0
      })),
      "gettransaction" => {
        let txid = params[0].as_str().unwrap();
        self.wallet.get(txid).cloned().ok_or_else(|| RpcError::Remote {
          code: -5,
          message: "Invalid or non-wallet transaction id".to_string(),
        })
      }
      _ => Err(RpcError::Remote { code: -32601, message: "Method not found".to_string() }),
    }
  }
}

pub fn mempool_entry(vsize: u64, base_fee_btc: f64) -> Value {
  json!({
    "vsize": vsize,
    "weight": vsize * 4,
    "time": 1700000000,
    "height": 820000,
    "fees": { "base": base_fee_btc, "modified": base_fee_btc, "ancestor": base_fee_btc, "descendant": base_fee_btc },
    "depends": []
  })
}

// ====== Price stubs ======

pub struct FixedPrice {
  pub price: Price,
  pub requested: Mutex<Vec<u64>>,
}

impl FixedPrice {
  pub fn new(price: Price) -> Self {
    Self { price, requested: Mutex::new(Vec::new()) }
  }
}

#[async_trait]
impl PriceSource for FixedPrice {
  async fn spot_price(&self) -> Result<Price, PriceError> {
    Ok(self.price)
  }

  async fn price_at(&self, unix_time: u64) -> Result<Price, PriceError> {
    self.requested.lock().unwrap().push(unix_time);
    Ok(self.price)
  }
}

pub struct BrokenPrice;

#[async_trait]
impl PriceSource for BrokenPrice {
  async fn spot_price(&self) -> Result<Price, PriceError> {
    Err(PriceError::Decode("unexpected payload".to_string()))
  }

  async fn price_at(&self, _unix_time: u64) -> Result<Price, PriceError> {
    Err(PriceError::Decode("unexpected payload".to_string()))
  }
}

/// Never resolves, like a price provider that stopped responding.
pub struct HangingPrice;

#[async_trait]
impl PriceSource for HangingPrice {
  async fn spot_price(&self) -> Result<Price, PriceError> {
    std::future::pending().await
  }

  async fn price_at(&self, _unix_time: u64) -> Result<Price, PriceError> {
    std::future::pending().await
  }
}

// ====== HTTP mock node ======

pub enum Reply {
  Json(u16, String),
  /// Close the socket without answering.
  Hangup,
}

#[derive(Debug, Clone)]
pub struct RecordedRequest {
  pub method: String,
  pub path: String,
  pub headers: HashMap<String, String>,
  pub body: Value,
}

type Responder = Arc<dyn Fn(usize, &Value) -> Reply + Send + Sync>;

pub struct MockNode {
  pub addr: SocketAddr,
  requests: Arc<Mutex<Vec<RecordedRequest>>>,
  task: JoinHandle<()>,
}

impl MockNode {
  /// `responder` gets the 0-based index of the request and its JSON body.
  pub async fn start<F>(responder: F) -> Self
  where
    F: Fn(usize, &Value) -> Reply + Send + Sync + 'static,
  {
    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    let requests = Arc::new(Mutex::new(Vec::new()));
    let responder: Responder = Arc::new(responder);

    let recorded = requests.clone();
    let task = tokio::spawn(async move {
      while let Ok((socket, _)) = listener.accept().await {
        let recorded = recorded.clone();
        let responder = responder.clone();
        tokio::spawn(async move {
          let _ = serve_one(socket, recorded, responder).await;
        });
      }
    });

    Self { addr, requests, task }
  }

  pub fn requests(&self) -> Vec<RecordedRequest> {
    self.requests.lock().unwrap().clone()
  }

  pub fn request_count(&self) -> usize {
    self.requests.lock().unwrap().len()
  }
}

impl Drop for MockNode {
  fn drop(&mut self) {
    self.task.abort();
  }
}

/// Accepts connections, keeps them open and never writes a byte back.
pub struct SilentNode {
  pub addr: SocketAddr,
  task: JoinHandle<()>,
}

impl SilentNode {
  pub async fn start() -> Self {
    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    let task = tokio::spawn(async move {
      let mut open = Vec::new();
      while let Ok((socket, _)) = listener.accept().await {
        open.push(socket);
      }
    });
    Self { addr, task }
  }
}

impl Drop for SilentNode {
  fn drop(&mut self) {
    self.task.abort();
  }
}

async fn serve_one(
  mut socket: TcpStream,
  recorded: Arc<Mutex<Vec<RecordedRequest>>>,
  responder: Responder,
) -> std::io::Result<()> {
  let (reader, mut writer) = socket.split();
  let mut reader = BufReader::new(reader);

  let mut request_line = String::new();
  reader.read_line(&mut request_line).await?;
  let mut parts = request_line.split_whitespace();
  let method = parts.next().unwrap_or_default().to_string();
  let path = parts.next().unwrap_or_default().to_string();

  let mut headers = HashMap::new();
  loop {
    let mut line = String::new();
    if reader.read_line(&mut line).await? == 0 {
      break;
    }
    let line = line.trim_end();
    if line.is_empty() {
      break;
    }
    if let Some((name, value)) = line.split_once(':') {
      headers.insert(name.trim().to_lowercase(), value.trim().to_string());
    }
  }

  let length: usize = headers
    .get("content-length")
    .and_then(|v| v.parse().ok())
    .unwrap_or(0);
  let mut body = vec![0u8; length];
  reader.read_exact(&mut body).await?;
  let body: Value = serde_json::from_slice(&body).unwrap_or(Value::Null);

  let index = {
    let mut recorded = recorded.lock().unwrap();
    recorded.push(RecordedRequest { method, path, headers, body: body.clone() });
    recorded.len() - 1
  };

  match responder(index, &body) {
    Reply::Json(status, payload) => {
      let response = format!(
        "HTTP/1.1 {} MOCK\r\nContent-Type: application/json\r\nContent-Length: {}\r\nConnection: close\r\n\r\n{}",
        status,
        payload.len(),
        payload
      );
      writer.write_all(response.as_bytes()).await?;
      writer.shutdown().await?;
    }
    Reply::Hangup => {}
  }
  Ok(())
}

pub fn ok_result(result: Value) -> Reply {
  Reply::Json(200, json!({ "result": result, "error": null, "id": 1 }).to_string())
}

pub fn rpc_error(code: i64, message: &str) -> Reply {
  Reply::Json(500, json!({ "result": null, "error": { "code": code, "message": message }, "id": 1 }).to_string())
}
