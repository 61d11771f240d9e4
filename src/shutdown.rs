/**
* filename : shutdown
* author : HAMA
* date: 2025. 4. 6.
* description: Ctrl+C / SIGTERM handling for the service loops
**/

use log::info;
use tokio::sync::watch;

use crate::types::AppError;

/// Waits for Ctrl+C or SIGTERM, then flips `shutdown` so every loop
/// watching it stops at its next tick.
pub async fn wait_for_shutdown(shutdown: &watch::Sender<bool>) -> Result<(), AppError> {
  let signal_name = signal_received().await?;
  info!("[Shutdown] {} received, stopping services", signal_name);
  // 이미 모든 receiver가 종료됐을 수 있음
  let _ = shutdown.send(true);
  Ok(())
}

#[cfg(unix)]
async fn signal_received() -> std::io::Result<&'static str> {
  use tokio::signal::unix::{signal, SignalKind};

  let mut terminate = signal(SignalKind::terminate())?;
  tokio::select! {
    result = tokio::signal::ctrl_c() => result.map(|_| "Ctrl+C"),
    _ = terminate.recv() => Ok("SIGTERM"),
  }
}

#[cfg(not(unix))]
async fn signal_received() -> std::io::Result<&'static str> {
  tokio::signal::ctrl_c().await.map(|_| "Ctrl+C")
}
