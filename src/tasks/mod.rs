//! Background scheduled tasks for the application.
//!
//! This module centralizes all recurring background jobs (auto-search loop
//! recovery after a restart and the expired gift-offer sweep).
//! Call `spawn_all` once during startup to launch them.

use crate::services::{AutoSearchService, GiftService};

/// 过期赠礼要约的清扫间隔
const GIFT_PURGE_INTERVAL_SECS: u64 = 600;

/// Spawn all background tasks.
///
/// Notes
/// - The auto-search recovery pass runs once, then each per-user loop
///   reschedules itself.
/// - This function detaches tasks via `tokio::spawn`; it does not block.
pub fn spawn_all(autosearch_service: AutoSearchService, gift_service: GiftService) {
    // 重启恢复: 给所有开着自动搜索的玩家重新拉起循环
    {
        let svc = autosearch_service.clone();
        tokio::spawn(async move {
            match svc.recover_on_startup().await {
                Ok(n) if n > 0 => log::info!("Auto-search loops re-armed after restart: {n}"),
                Ok(_) => {}
                Err(e) => log::error!("Failed to recover auto-search loops: {e:?}"),
            }
        });
    }

    // 过期要约清扫 (每 10 分钟)
    {
        let svc = gift_service.clone();
        tokio::spawn(async move {
            loop {
                let purged = svc.purge_expired().await;
                if purged > 0 {
                    log::info!("Expired gift offers purged: {purged}");
                }
                tokio::time::sleep(std::time::Duration::from_secs(GIFT_PURGE_INTERVAL_SECS)).await;
            }
        });
    }
}
