use std::time::Duration;
use tokio::signal;
use tokio::time::timeout;
use tracing::{error, info, warn};

use crate::node::Node;

/// 关闭超时时间（秒）
const SHUTDOWN_TIMEOUT_SECS: u64 = 10;

/// 等待 Ctrl+C，然后停止节点（广播 BYE 并等待后台任务结束）
pub async fn listen_for_shutdown(node: &mut Node) {
    match signal::ctrl_c().await {
        Ok(()) => {
            info!("Shutdown signal received, stopping node...");
        }
        Err(e) => {
            warn!(
                "Failed to listen for Ctrl+C: {}. Proceeding with shutdown anyway.",
                e
            );
        }
    }

    match timeout(Duration::from_secs(SHUTDOWN_TIMEOUT_SECS), node.stop()).await {
        Ok(()) => info!("Shutdown completed"),
        Err(_) => error!(
            "Shutdown timed out after {} seconds, exiting anyway",
            SHUTDOWN_TIMEOUT_SECS
        ),
    }
}
