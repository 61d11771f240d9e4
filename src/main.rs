// src/main.rs
/**
* author : HAMA
* date: 2025. 4. 6.
* description: Entry point for the Bitcoin block scanner.
**/

use xscanner_btc::coin::bitcoin::client::BitcoinClient;
use xscanner_btc::coin::coin_trait::PriceSource;
use xscanner_btc::coin::market::{MarketPriceClient, NoPriceSource};
use xscanner_btc::config::Settings;
use xscanner_btc::fetcher::BitcoinFetcher;
use xscanner_btc::shutdown::wait_for_shutdown;
use xscanner_btc::tasks::{run_block_reporter, run_mempool_monitor, spawn_fetcher};
use xscanner_btc::types::AppError;

use log::{info, warn};
use std::sync::Arc;
use tokio::sync::{mpsc, watch};

#[tokio::main]
async fn main() -> Result<(), AppError> {
    // 1. Initialize logging
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();
    info!("Application starting...");

    // 2. Load configuration
    let settings = Settings::new()?;
    info!("Configuration loaded: {:?}", settings.node);

    // 3. Create node and price clients
    let bitcoin_client = BitcoinClient::new(settings.endpoint());
    let prices: Arc<dyn PriceSource> = if settings.market.enabled {
        Arc::new(MarketPriceClient::new(
            settings.market.spot_url.clone(),
            settings.market.klines_url.clone(),
            settings.market.symbol.clone(),
            settings.price_timeout(),
        )?)
    } else {
        Arc::new(NoPriceSource)
    };
    let fetcher = Arc::new(BitcoinFetcher::new(
        bitcoin_client.clone(),
        prices,
        settings.fetcher_options(),
    ));

    // 4. Connection banner
    let info = fetcher.get_blockchain_info().await?;
    info!(
        "Connected to Bitcoin Core | chain: {} | height: {} | chainwork: {} | pruned: {} | size on disk: {:.2} GB | download progress: {:.4}",
        info.chain,
        info.blocks,
        info.chainwork,
        info.pruned,
        info.size_on_disk_gb(),
        info.download_progress()
    );
    match fetcher.get_price().await {
        Ok(price) => info!("BTC price: ${} ({} sats/$)", price.usd, price.sats_per_usd),
        Err(e) => warn!("BTC price unavailable: {}", e),
    }

    // 5. Spawn background services
    let (shutdown_tx, shutdown_rx) = watch::channel(false);
    let mut handles = Vec::new();

    if settings.fetcher.enabled {
        let start_block = settings.fetcher.start_block.unwrap_or(info.blocks);
        let (sender, receiver) = mpsc::channel(128);
        handles.push(spawn_fetcher(
            fetcher.clone(),
            sender,
            start_block,
            settings.fetcher.interval_secs,
            shutdown_rx.clone(),
        ));
        handles.push(tokio::spawn(run_block_reporter(receiver)));
    }

    handles.push(tokio::spawn(run_mempool_monitor(
        bitcoin_client,
        settings.mempool_monitor_config(),
        shutdown_rx,
    )));

    // 6. Wait for shutdown signal
    wait_for_shutdown(&shutdown_tx).await?;
    info!("Waiting for tasks to finish...");

    // 7. Gracefully wait
    for handle in handles {
        handle.await?;
    }

    info!("Application exited cleanly.");
    Ok(())
}
