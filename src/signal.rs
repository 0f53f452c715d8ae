use log::warn;
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};

/// 安裝 Ctrl-C 處理器，收到信號後取樣會在目前批次結束時停止
#[must_use]
pub fn setup_shutdown_signal() -> Arc<AtomicBool> {
    let shutdown_signal = Arc::new(AtomicBool::new(false));
    let signal_clone = Arc::clone(&shutdown_signal);

    if let Err(e) = ctrlc::set_handler(move || {
        signal_clone.store(true, Ordering::SeqCst);
        eprintln!("\n收到中斷信號，目前批次完成後停止...");
    }) {
        warn!("無法設定 Ctrl-C 處理器: {e}");
    }

    shutdown_signal
}
