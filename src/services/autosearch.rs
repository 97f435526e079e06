use crate::config::GameConfig;
use crate::entities::player_entity as players;
use crate::error::{AppError, AppResult};
use crate::models::AutoSearchStatusResponse;
use crate::services::{PlayerService, RewardService};
use crate::utils::check_cooldown;
use chrono::{DateTime, Utc};
use std::collections::HashSet;
use std::sync::{Arc, Mutex};
use std::time::Duration;

/// 撞上手动搜索锁时的退避
const LOCK_BACKOFF_SECS: i64 = 5;
/// 掉落池为空时的长退避
const EMPTY_CATALOG_BACKOFF_SECS: i64 = 600;
/// 内部错误后的恢复退避; 循环绝不允许无声死亡
const ERROR_BACKOFF_SECS: i64 = 60;

/// 终止原因; Disabled 是用户主动的, 其余两种由循环落盘关掉开关
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StopReason {
    Disabled,
    EntitlementLapsed,
    QuotaExhausted,
}

impl StopReason {
    /// 是否需要把 auto_search_enabled 写回 false
    pub fn force_disable(&self) -> bool {
        !matches!(self, StopReason::Disabled)
    }
}

/// 空掉落池告警去重: 每段空池时期只告警一次, 成功 tick 后解除
#[derive(Default)]
struct EmptyCatalogNotice {
    notified: bool,
}

impl EmptyCatalogNotice {
    /// 首次返回 true, 之后一直 false, 直到 clear
    fn should_notify(&mut self) -> bool {
        !std::mem::replace(&mut self.notified, true)
    }

    fn clear(&mut self) {
        self.notified = false;
    }
}

/// 单次 tick 的决策, 由纯函数产出, 效果由 runner 执行
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TickPlan {
    Stop(StopReason),
    /// reset_window: 本 tick 观察到 24h 窗口已过, 落盘前先清零计数
    Wait { seconds: i64, reset_window: bool },
    Run { reset_window: bool },
}

/// 当前窗口的次数上限: 基础 + 档位加成 + 未过期的临时加成
pub fn daily_limit(player: &players::Model, now: DateTime<Utc>, cfg: &GameConfig) -> i64 {
    cfg.autosearch_base_limit + player.vip_tier(now).autosearch_bonus() + player.active_quota_boost(now)
}

/// tick 决策纯函数
///
/// 判定顺序固定: 开关 -> 特权 -> 窗口滚动 -> 配额 -> 冷却。
/// 窗口已过时配额按清零后的 0 计, 因此窗口滚动永远不会和
/// QuotaExhausted 同时成立。
pub fn plan_tick(player: &players::Model, now: DateTime<Utc>, cfg: &GameConfig) -> TickPlan {
    if !player.auto_search_enabled {
        return TickPlan::Stop(StopReason::Disabled);
    }

    let tier = player.vip_tier(now);
    if !tier.allows_autosearch() {
        return TickPlan::Stop(StopReason::EntitlementLapsed);
    }

    let reset_window = match player.auto_search_reset_at {
        None => true,
        Some(reset_at) => now >= reset_at,
    };
    let used = if reset_window { 0 } else { player.auto_search_used };

    if used >= daily_limit(player, now, cfg) {
        return TickPlan::Stop(StopReason::QuotaExhausted);
    }

    let gate = check_cooldown(
        player.last_search_at,
        cfg.search_cooldown_secs,
        tier.cooldown_multiplier(),
        now,
    );
    match gate.seconds_remaining() {
        0 => TickPlan::Run { reset_window },
        remaining => TickPlan::Wait {
            seconds: remaining.max(1),
            reset_window,
        },
    }
}

/// 自动搜索调度器
///
/// 每个开启的玩家一个 tokio 任务循环; armed 注册表记录哪些循环
/// 在本进程内存活, 循环退出时自行摘除。关闭是协作式的: disable
/// 只落盘开关, 下一个 tick 观察到后自行终止。
#[derive(Clone)]
pub struct AutoSearchService {
    player_service: PlayerService,
    reward_service: RewardService,
    game: GameConfig,
    armed: Arc<Mutex<HashSet<i64>>>,
}

impl AutoSearchService {
    pub fn new(
        player_service: PlayerService,
        reward_service: RewardService,
        game: GameConfig,
    ) -> Self {
        Self {
            player_service,
            reward_service,
            game,
            armed: Arc::new(Mutex::new(HashSet::new())),
        }
    }

    /// 开启自动搜索; 需要 VIP 及以上档位
    pub async fn enable(&self, user_id: i64) -> AppResult<AutoSearchStatusResponse> {
        let now = Utc::now();
        let player = self.player_service.get_or_create(user_id, None).await?;
        if !player.vip_tier(now).allows_autosearch() {
            return Err(AppError::PermissionDenied(
                "Auto-search requires an active VIP entitlement".to_string(),
            ));
        }

        self.player_service.set_auto_search_enabled(user_id, true).await?;
        if player.auto_search_reset_at.is_none() {
            self.player_service.reset_auto_search_window(user_id, now).await?;
        }

        let remaining = check_cooldown(
            player.last_search_at,
            self.game.search_cooldown_secs,
            player.vip_tier(now).cooldown_multiplier(),
            now,
        )
        .seconds_remaining();
        self.arm(user_id, remaining.max(1));

        self.status(user_id).await
    }

    /// 关闭开关; 正在跑的循环在下一个 tick 自行退出
    pub async fn disable(&self, user_id: i64) -> AppResult<AutoSearchStatusResponse> {
        self.player_service.get(user_id).await?;
        self.player_service.set_auto_search_enabled(user_id, false).await?;
        self.status(user_id).await
    }

    pub async fn status(&self, user_id: i64) -> AppResult<AutoSearchStatusResponse> {
        let now = Utc::now();
        let player = self.player_service.get(user_id).await?;
        let window_elapsed = match player.auto_search_reset_at {
            None => true,
            Some(t) => now >= t,
        };
        Ok(AutoSearchStatusResponse {
            enabled: player.auto_search_enabled,
            used_today: if window_elapsed { 0 } else { player.auto_search_used },
            daily_limit: daily_limit(&player, now, &self.game),
            reset_at: player.auto_search_reset_at,
            armed: self.is_armed(user_id),
        })
    }

    pub fn is_armed(&self, user_id: i64) -> bool {
        self.armed.lock().unwrap().contains(&user_id)
    }

    /// 启动 (或重启后恢复) 一个玩家的循环; 已在跑则忽略
    pub fn arm(&self, user_id: i64, initial_delay_secs: i64) {
        {
            let mut armed = self.armed.lock().unwrap();
            if !armed.insert(user_id) {
                return;
            }
        }
        let service = self.clone();
        tokio::spawn(async move {
            service.run_loop(user_id, initial_delay_secs).await;
        });
    }

    /// 进程重启恢复: 给所有开着开关的玩家重新拉起循环。
    /// 特权已过期的直接关掉开关而不是拉起; 首个 tick 带阶梯延迟,
    /// 避免大量玩家同时恢复造成的惊群。
    pub async fn recover_on_startup(&self) -> AppResult<usize> {
        let now = Utc::now();
        let enabled = self.player_service.list_auto_search_enabled().await?;
        let mut armed_count = 0;

        for (index, player) in enabled.iter().enumerate() {
            if !player.vip_tier(now).allows_autosearch() {
                self.player_service
                    .set_auto_search_enabled(player.id, false)
                    .await?;
                log::info!(
                    "Auto-search force-disabled for player {}: entitlement lapsed while offline",
                    player.id
                );
                continue;
            }

            let stagger = (index % 30) as i64;
            let remaining = check_cooldown(
                player.last_search_at,
                self.game.search_cooldown_secs,
                player.vip_tier(now).cooldown_multiplier(),
                now,
            )
            .seconds_remaining();
            self.arm(player.id, stagger.max(remaining).max(1));
            armed_count += 1;
        }

        Ok(armed_count)
    }

    async fn run_loop(self, user_id: i64, initial_delay_secs: i64) {
        log::info!("Auto-search loop armed for player {user_id}, first tick in {initial_delay_secs}s");
        sleep_secs(initial_delay_secs).await;

        let mut catalog_notice = EmptyCatalogNotice::default();
        loop {
            let player = match self.player_service.get(user_id).await {
                Ok(p) => p,
                Err(AppError::NotFound(_)) => break,
                Err(e) => {
                    log::error!("Auto-search tick for player {user_id} failed to load player: {e}");
                    sleep_secs(ERROR_BACKOFF_SECS).await;
                    continue;
                }
            };

            let now = Utc::now();
            match plan_tick(&player, now, &self.game) {
                TickPlan::Stop(reason) => {
                    if reason.force_disable() {
                        if let Err(e) = self
                            .player_service
                            .set_auto_search_enabled(user_id, false)
                            .await
                        {
                            log::error!("Failed to persist auto-search disable for {user_id}: {e}");
                        }
                    }
                    log::info!("Auto-search loop for player {user_id} stopped: {reason:?}");
                    break;
                }
                TickPlan::Wait { seconds, reset_window } => {
                    if reset_window {
                        if let Err(e) = self.player_service.reset_auto_search_window(user_id, now).await
                        {
                            log::error!("Failed to roll quota window for {user_id}: {e}");
                        }
                    }
                    sleep_secs(seconds).await;
                }
                TickPlan::Run { reset_window } => {
                    if reset_window {
                        if let Err(e) = self.player_service.reset_auto_search_window(user_id, now).await
                        {
                            log::error!("Failed to roll quota window for {user_id}: {e}");
                            sleep_secs(ERROR_BACKOFF_SECS).await;
                            continue;
                        }
                    }
                    let delay = self
                        .execute_tick(user_id, &player, now, &mut catalog_notice)
                        .await;
                    match delay {
                        Some(seconds) => sleep_secs(seconds).await,
                        None => break,
                    }
                }
            }
        }

        self.armed.lock().unwrap().remove(&user_id);
    }

    /// 执行一次搜索; 返回下个 tick 的延迟, None 表示终止
    async fn execute_tick(
        &self,
        user_id: i64,
        player: &players::Model,
        now: DateTime<Utc>,
        catalog_notice: &mut EmptyCatalogNotice,
    ) -> Option<i64> {
        match self.reward_service.search(user_id, None).await {
            Ok(result) => {
                catalog_notice.clear();
                let used = match self.player_service.increment_auto_search_used(user_id).await {
                    Ok(u) => u,
                    Err(e) => {
                        log::error!("Failed to count auto-search tick for {user_id}: {e}");
                        return Some(ERROR_BACKOFF_SECS);
                    }
                };
                if used >= daily_limit(player, now, &self.game) {
                    if let Err(e) = self
                        .player_service
                        .set_auto_search_enabled(user_id, false)
                        .await
                    {
                        log::error!("Failed to persist quota disable for {user_id}: {e}");
                    }
                    log::info!("Auto-search loop for player {user_id} stopped: quota reached ({used})");
                    return None;
                }
                Some(result.next_search_in_secs.max(1))
            }
            // 与手动搜索撞锁: 短退避后重试
            Err(AppError::DuplicateRequest) => Some(LOCK_BACKOFF_SECS),
            // plan 与执行之间的竞态 (手动搜索抢先落地)
            Err(AppError::CooldownActive { seconds_remaining }) => Some(seconds_remaining.max(1)),
            // 空池期间每个退避周期都会再进来, 只在第一次告警
            Err(AppError::EmptyCatalog) => {
                if catalog_notice.should_notify() {
                    log::warn!(
                        "Auto-search for player {user_id} found an empty catalog, backing off"
                    );
                }
                Some(EMPTY_CATALOG_BACKOFF_SECS)
            }
            Err(e) => {
                log::error!("Auto-search tick for player {user_id} failed: {e}");
                Some(ERROR_BACKOFF_SECS)
            }
        }
    }
}

async fn sleep_secs(seconds: i64) {
    tokio::time::sleep(Duration::from_secs(seconds.max(0) as u64)).await;
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Duration as ChronoDuration;

    fn player(now: DateTime<Utc>) -> players::Model {
        players::Model {
            id: 1,
            username: "tester".to_string(),
            balance: 0,
            last_search_at: None,
            last_bonus_at: None,
            last_submission_at: None,
            vip_until: Some(now + ChronoDuration::days(7)),
            vip_plus_until: None,
            premium_until: None,
            auto_search_enabled: true,
            auto_search_used: 0,
            auto_search_reset_at: Some(now + ChronoDuration::hours(12)),
            quota_boost: 0,
            quota_boost_until: None,
            locale: "en".to_string(),
            reminders_enabled: true,
            created_at: None,
            updated_at: None,
        }
    }

    fn cfg() -> GameConfig {
        GameConfig::default()
    }

    #[test]
    fn test_disabled_player_stops_without_persisting() {
        let now = Utc::now();
        let mut p = player(now);
        p.auto_search_enabled = false;
        let plan = plan_tick(&p, now, &cfg());
        assert_eq!(plan, TickPlan::Stop(StopReason::Disabled));
        assert!(!StopReason::Disabled.force_disable());
    }

    #[test]
    fn test_lapsed_entitlement_forces_disable() {
        let now = Utc::now();
        let mut p = player(now);
        p.vip_until = Some(now - ChronoDuration::days(1));
        let plan = plan_tick(&p, now, &cfg());
        assert_eq!(plan, TickPlan::Stop(StopReason::EntitlementLapsed));
        assert!(StopReason::EntitlementLapsed.force_disable());
    }

    #[test]
    fn test_exhausted_quota_stops() {
        let now = Utc::now();
        let mut p = player(now);
        p.auto_search_used = cfg().autosearch_base_limit;
        let plan = plan_tick(&p, now, &cfg());
        assert_eq!(plan, TickPlan::Stop(StopReason::QuotaExhausted));
    }

    #[test]
    fn test_elapsed_window_resets_usage_before_quota_check() {
        let now = Utc::now();
        let mut p = player(now);
        // 计数已满但窗口已过: 必须滚动窗口而不是停掉
        p.auto_search_used = cfg().autosearch_base_limit;
        p.auto_search_reset_at = Some(now - ChronoDuration::minutes(5));
        let plan = plan_tick(&p, now, &cfg());
        assert_eq!(plan, TickPlan::Run { reset_window: true });
    }

    #[test]
    fn test_unset_window_counts_as_elapsed() {
        let now = Utc::now();
        let mut p = player(now);
        p.auto_search_reset_at = None;
        let plan = plan_tick(&p, now, &cfg());
        assert_eq!(plan, TickPlan::Run { reset_window: true });
    }

    #[test]
    fn test_cooldown_wait_has_one_second_floor() {
        let now = Utc::now();
        let mut p = player(now);
        // VIP 0.5x: 300s 基础 -> 150s 生效, 已过 149.6s
        p.last_search_at = Some(now - ChronoDuration::milliseconds(149_600));
        let plan = plan_tick(&p, now, &cfg());
        match plan {
            TickPlan::Wait { seconds, reset_window } => {
                assert!(seconds >= 1);
                assert!(!reset_window);
            }
            other => panic!("expected wait, got {other:?}"),
        }
    }

    #[test]
    fn test_cooldown_wait_matches_remaining_time() {
        let now = Utc::now();
        let mut p = player(now);
        // VIP 0.5x: 生效冷却 150s, 已过 50s -> 还差 100s
        p.last_search_at = Some(now - ChronoDuration::seconds(50));
        let plan = plan_tick(&p, now, &cfg());
        assert_eq!(
            plan,
            TickPlan::Wait {
                seconds: 100,
                reset_window: false
            }
        );
    }

    #[test]
    fn test_limit_includes_tier_bonus_and_boost() {
        let now = Utc::now();
        let mut p = player(now);
        p.vip_plus_until = Some(now + ChronoDuration::days(1));
        p.quota_boost = 10;
        p.quota_boost_until = Some(now + ChronoDuration::hours(1));
        assert_eq!(daily_limit(&p, now, &cfg()), cfg().autosearch_base_limit + 20 + 10);

        // 加成过期后不再计入
        p.quota_boost_until = Some(now - ChronoDuration::hours(1));
        assert_eq!(daily_limit(&p, now, &cfg()), cfg().autosearch_base_limit + 20);
    }

    #[test]
    fn test_ready_player_runs() {
        let now = Utc::now();
        let mut p = player(now);
        p.last_search_at = Some(now - ChronoDuration::hours(1));
        assert_eq!(plan_tick(&p, now, &cfg()), TickPlan::Run { reset_window: false });
    }

    #[test]
    fn test_empty_catalog_notice_fires_once_per_episode() {
        let mut notice = EmptyCatalogNotice::default();
        assert!(notice.should_notify());
        assert!(!notice.should_notify());
        assert!(!notice.should_notify());
        // 成功 tick 后解除, 下一段空池重新告警
        notice.clear();
        assert!(notice.should_notify());
    }

    mod ticks {
        use super::*;
        use crate::entities::drink_item_entity as items;
        use crate::services::{InventoryService, LockRegistry};
        use migration::{Migrator, MigratorTrait};
        use sea_orm::{
            ActiveModelTrait, ConnectOptions, Database, DatabaseConnection, IntoActiveModel, Set,
        };

        async fn setup() -> (DatabaseConnection, PlayerService, AutoSearchService) {
            let mut options = ConnectOptions::new("sqlite::memory:".to_string());
            options.max_connections(1).min_connections(1);
            let pool = Database::connect(options).await.unwrap();
            Migrator::up(&pool, None).await.unwrap();

            let players = PlayerService::new(pool.clone());
            let inventory = InventoryService::new(pool.clone(), players.clone());
            let rewards = RewardService::new(
                pool.clone(),
                LockRegistry::new(),
                players.clone(),
                inventory,
                GameConfig::default(),
            );
            let service = AutoSearchService::new(players.clone(), rewards, GameConfig::default());
            (pool, players, service)
        }

        async fn seed_item(pool: &DatabaseConnection, name: &str) {
            items::ActiveModel {
                name: Set(name.to_string()),
                description: Set(String::new()),
                image_ref: Set(None),
                is_special: Set(false),
                is_drawable: Set(true),
                created_at: Set(Some(Utc::now())),
                ..Default::default()
            }
            .insert(pool)
            .await
            .unwrap();
        }

        #[tokio::test]
        async fn test_tick_that_reaches_the_limit_self_disables() {
            let (pool, players, service) = setup().await;
            seed_item(&pool, "Static Cola").await;

            // VIP 玩家, 窗口有效, 还差一次就到上限
            let now = Utc::now();
            let limit = GameConfig::default().autosearch_base_limit;
            players.get_or_create(1, Some("tester")).await.unwrap();
            let mut am = players.get(1).await.unwrap().into_active_model();
            am.vip_until = Set(Some(now + ChronoDuration::days(7)));
            am.auto_search_enabled = Set(true);
            am.auto_search_used = Set(limit - 1);
            am.auto_search_reset_at = Set(Some(now + ChronoDuration::hours(12)));
            am.update(&pool).await.unwrap();

            let snapshot = players.get(1).await.unwrap();
            let mut notice = EmptyCatalogNotice::default();
            let delay = service.execute_tick(1, &snapshot, now, &mut notice).await;
            assert_eq!(delay, None, "the tick at the limit must end the loop");

            // 开关已落盘关闭, 计数打满
            let after = players.get(1).await.unwrap();
            assert!(!after.auto_search_enabled);
            assert_eq!(after.auto_search_used, limit);
        }

        #[tokio::test]
        async fn test_tick_below_the_limit_keeps_running() {
            let (pool, players, service) = setup().await;
            seed_item(&pool, "Static Cola").await;

            let now = Utc::now();
            players.get_or_create(1, Some("tester")).await.unwrap();
            let mut am = players.get(1).await.unwrap().into_active_model();
            am.vip_until = Set(Some(now + ChronoDuration::days(7)));
            am.auto_search_enabled = Set(true);
            am.auto_search_used = Set(0);
            am.auto_search_reset_at = Set(Some(now + ChronoDuration::hours(12)));
            am.update(&pool).await.unwrap();

            let snapshot = players.get(1).await.unwrap();
            let mut notice = EmptyCatalogNotice::default();
            let delay = service.execute_tick(1, &snapshot, now, &mut notice).await;
            assert!(delay.is_some_and(|d| d >= 1));

            let after = players.get(1).await.unwrap();
            assert!(after.auto_search_enabled);
            assert_eq!(after.auto_search_used, 1);
        }
    }
}
