/**
* filename : runner
* author : HAMA
* date: 2025. 4. 6.
* description: Follows the chain tip and forwards each new block
**/

use crate::fetcher::fetcher::BlockFetcher;
use crate::types::BlockSender;

use log::{info, warn, error};
use std::sync::Arc;
use tokio::sync::watch;
use tokio::time::{interval, Duration};

const MIN_INTERVAL: Duration = Duration::from_millis(1);

pub async fn run_fetcher<F: BlockFetcher + 'static>(
  fetcher: Arc<F>,
  sender: BlockSender,
  mut current_block_number: u64,
  interval_duration: Duration,
  mut shutdown: watch::Receiver<bool>,
) {
  let interval_duration = interval_duration.max(MIN_INTERVAL);
  let mut tick = interval(interval_duration);
  info!(
        "[{} Fetcher] Starting from block {} with interval {:?}",
        fetcher.chain_name(),
        current_block_number,
        interval_duration
    );

  loop {
    tokio::select! {
      _ = tick.tick() => {}
      _ = shutdown.changed() => break,
    }
    if *shutdown.borrow() {
      break;
    }

    // 노드가 아직 해당 높이를 모르면 다음 tick까지 대기
    let tip = tokio::select! {
      tip = fetcher.latest_block_number() => tip,
      _ = shutdown.changed() => break,
    };
    match tip {
      Ok(tip) if tip < current_block_number => continue,
      Ok(_) => {}
      Err(e) => {
        warn!("[{} Fetcher] Failed to read chain tip: {}", fetcher.chain_name(), e);
        continue;
      }
    }

    let block_to_fetch = current_block_number;
    info!("[{} Fetcher] Fetching block #{}...", fetcher.chain_name(), block_to_fetch);

    // 재시도 backoff가 길어도 종료 신호는 바로 반영
    let fetched = tokio::select! {
      fetched = fetcher.fetch_block(block_to_fetch) => fetched,
      _ = shutdown.changed() => break,
    };

    match fetched {
      Ok(block) => {
        if let Err(e) = sender.send(block).await {
          error!(
                  "[{} Fetcher] Failed to send block {}: {}",
                  fetcher.chain_name(),
                  block_to_fetch,
                  e
              );
          break;
        }
        current_block_number += 1;
      }
      Err(e) => {
        let retry_delay = interval_duration / 2;
        warn!(
          "[{} Fetcher] Failed to fetch block #{}: {} | retrying in {:?}",
          fetcher.chain_name(),
          block_to_fetch,
          e,
          retry_delay
        );
        // 블록 번호를 증가시키지 않고 interval의 절반 시간 후 재시도
        tokio::select! {
          _ = tokio::time::sleep(retry_delay) => {}
          _ = shutdown.changed() => break,
        }
      }
    }
  }

  warn!("[{} Fetcher] Loop exited.", fetcher.chain_name());
}
