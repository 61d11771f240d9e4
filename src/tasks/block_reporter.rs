use crate::block::units::{satoshi_to_btc, signed_satoshi_to_btc};
use crate::types::BlockReceiver;
use log::info;

/// Logs the metrics of every block the fetcher forwards. Returns once all
/// senders are gone.
pub async fn run_block_reporter(mut receiver: BlockReceiver) {
    info!("[BlockReporter] Waiting for blocks...");

    while let Some(block) = receiver.recv().await {
        info!(
            "[BlockReporter] Block #{} | txs: {} | total value: {} BTC | fees: {} BTC | fee rate mean: {:.2} / median: {:.2} sat/vB | price: ${} ({} sats/$) | size: {} B | weight: {}",
            block.height,
            block.tx_count(),
            satoshi_to_btc(block.total_value()),
            signed_satoshi_to_btc(block.total_fees()),
            block.mean_fee_rate().unwrap_or(0.0),
            block.median_fee_rate().unwrap_or(0.0),
            block.price.usd,
            block.price.sats_per_usd,
            block.size,
            block.weight,
        );
    }

    info!("[BlockReporter] Channel closed, exiting");
}
