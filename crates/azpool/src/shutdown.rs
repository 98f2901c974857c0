//! シグナル監視
//!
//! プロセスシグナルに反応する唯一の場所。シグナルで共有トークンをキャンセルし、
//! 猶予期間内にパイプラインが終わらなければステータス2で終了する。

use std::time::Duration;
use tokio::task::JoinHandle;
use tokio_util::sync::CancellationToken;

pub const GRACE_PERIOD: Duration = Duration::from_secs(1);
pub const SIGNAL_EXIT_CODE: i32 = 2;

pub fn spawn_supervisor(cancel: CancellationToken) -> JoinHandle<()> {
    tokio::spawn(async move {
        let signal = wait_for_signal().await;
        tracing::info!(signal, "Signal received, shutting down");
        cancel.cancel();
        tokio::time::sleep(GRACE_PERIOD).await;
        std::process::exit(SIGNAL_EXIT_CODE);
    })
}

#[cfg(unix)]
async fn wait_for_signal() -> &'static str {
    use tokio::signal::unix::{SignalKind, signal};

    let mut terminate = match signal(SignalKind::terminate()) {
        Ok(stream) => stream,
        Err(e) => {
            tracing::warn!("Unable to listen for SIGTERM: {}", e);
            return wait_for_interrupt().await;
        }
    };

    tokio::select! {
        name = wait_for_interrupt() => name,
        _ = terminate.recv() => "terminate",
    }
}

#[cfg(not(unix))]
async fn wait_for_signal() -> &'static str {
    wait_for_interrupt().await
}

async fn wait_for_interrupt() -> &'static str {
    if let Err(e) = tokio::signal::ctrl_c().await {
        tracing::warn!("Unable to listen for Ctrl+C: {}", e);
        std::future::pending::<()>().await;
    }
    "interrupt"
}
