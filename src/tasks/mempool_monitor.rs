use crate::analyzer::mempool::{sample_fee_rates, MempoolFeeStats, MempoolSizeStats};
use crate::coin::bitcoin::client::BitcoinClient;
use crate::coin::coin_trait::RpcTransport;
use log::{info, warn};
use tokio::sync::watch;
use tokio::time::{interval, Duration};

/// Configuration for the mempool monitor
#[derive(Debug, Clone)]
pub struct MempoolMonitorConfig {
    pub enabled: bool,
    pub check_interval_secs: u64,
    pub entry_workers: usize,
}

impl Default for MempoolMonitorConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            check_interval_secs: 60,
            entry_workers: 3,
        }
    }
}

/// Run mempool monitor - periodically samples mempool fee rates and logs
/// their distribution until shutdown is signalled.
pub async fn run_mempool_monitor<T: RpcTransport + 'static>(
    client: BitcoinClient<T>,
    config: MempoolMonitorConfig,
    mut shutdown: watch::Receiver<bool>,
) {
    if !config.enabled {
        info!("[MempoolMonitor] Disabled by configuration, skipping...");
        return;
    }

    info!("[MempoolMonitor] Starting with check_interval: {}s", config.check_interval_secs);

    let mut check_interval = interval(Duration::from_secs(config.check_interval_secs.max(1)));

    loop {
        tokio::select! {
            _ = check_interval.tick() => {}
            _ = shutdown.changed() => break,
        }
        if *shutdown.borrow() {
            break;
        }

        report_mempool(&client, config.entry_workers).await;
    }

    info!("[MempoolMonitor] Stopped");
}

async fn report_mempool<T: RpcTransport>(client: &BitcoinClient<T>, entry_workers: usize) {
    match sample_fee_rates(client, entry_workers).await {
        Ok(samples) => match MempoolFeeStats::from_samples(&samples) {
            Some(stats) => info!(
                "[MempoolMonitor] fee rates (sat/vB) over {} txs - min: {:.2}, max: {:.2}, median: {:.2}, mean: {:.2}",
                stats.count, stats.min, stats.max, stats.median, stats.mean
            ),
            None => info!("[MempoolMonitor] Mempool is empty"),
        },
        Err(e) => {
            warn!("[MempoolMonitor] Failed to sample mempool fees: {}", e);
            return;
        }
    }

    match client.get_mempool().await {
        Ok(mempool) => {
            if let Some(sizes) = MempoolSizeStats::from_mempool(&mempool) {
                info!(
                    "[MempoolMonitor] {} txs, {} vB total - vsize avg: {:.2}, largest: {}, smallest: {}",
                    sizes.count, sizes.total_vsize, sizes.mean_vsize, sizes.max_vsize, sizes.min_vsize
                );
            }
        }
        Err(e) => warn!("[MempoolMonitor] Failed to read verbose mempool: {}", e),
    }
}
