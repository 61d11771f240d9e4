/**
* filename : interface
* author : HAMA
* date: 2025. 4. 6.
* description:
**/

use async_trait::async_trait;
use crate::block::Block;
use crate::types::AppError;

#[async_trait]
pub trait BlockFetcher: Send + Sync {
  async fn fetch_block(&self, block_number: u64) -> Result<Block, AppError>;
  /// Height of the current chain tip.
  async fn latest_block_number(&self) -> Result<u64, AppError>;
  fn chain_name(&self) -> &'static str;
}
