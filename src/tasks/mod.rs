/**
* filename : tasks
* author : HAMA
* date: 2025. 4. 6.
* description: Background services and their spawn helpers
**/

pub mod block_reporter;
pub mod mempool_monitor;

pub use block_reporter::run_block_reporter;
pub use mempool_monitor::{MempoolMonitorConfig, run_mempool_monitor};

use std::{sync::Arc, time::Duration};
use tokio::{sync::watch, task::JoinHandle};

use crate::fetcher::fetcher::BlockFetcher;
use crate::fetcher::runner::run_fetcher;
use crate::types::BlockSender;

pub fn spawn_fetcher<F: BlockFetcher + Send + Sync + 'static>(
  fetcher: Arc<F>,
  sender: BlockSender,
  start_block: u64,
  interval_secs: u64,
  shutdown: watch::Receiver<bool>,
) -> JoinHandle<()> {
  tokio::spawn(run_fetcher(
    fetcher,
    sender,
    start_block,
    Duration::from_secs(interval_secs),
    shutdown,
  ))
}
