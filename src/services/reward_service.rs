use crate::config::GameConfig;
use crate::entities::drink_item_entity as items;
use crate::error::{AppError, AppResult};
use crate::models::{BonusResponse, RarityTier, SearchResponse};
use crate::services::{InventoryService, LockRegistry, PlayerService};
use crate::utils::{check_cooldown, effective_cooldown_secs, CooldownCheck};
use chrono::Utc;
use rand::Rng;
use sea_orm::{ColumnTrait, DatabaseConnection, EntityTrait, QueryFilter, TransactionTrait};

/// 加权抽取稀有度档位 (权重相对值, 概率 = weight / total)
pub fn roll_rarity<R: Rng>(rng: &mut R) -> AppResult<RarityTier> {
    let tiers = RarityTier::drawable();
    let total: u32 = tiers.iter().map(|t| t.weight()).sum();
    if total == 0 {
        // 权重表配置错误属于编程错误, 不应到达用户
        return Err(AppError::InternalError(
            "Rarity weight table sums to zero".to_string(),
        ));
    }

    let pick = rng.gen_range(0..total);
    let mut acc = 0u32;
    for tier in tiers {
        acc += tier.weight();
        if pick < acc {
            return Ok(tier);
        }
    }
    // pick < total 恒成立, 不可达
    Err(AppError::InternalError(
        "Weighted rarity roll fell through".to_string(),
    ))
}

/// 掉落抽取: 物品均匀随机, 稀有度加权随机, 两次抽取相互独立。
/// 特殊物品绕过权重表, 稀有度恒为 Special。
/// 纯函数, 不产生副作用; 背包落账由调用方负责
pub fn draw_reward<R: Rng>(
    catalog: &[items::Model],
    rng: &mut R,
) -> AppResult<(items::Model, RarityTier)> {
    if catalog.is_empty() {
        return Err(AppError::EmptyCatalog);
    }

    let item = catalog[rng.gen_range(0..catalog.len())].clone();
    let rarity = if item.is_special {
        RarityTier::Special
    } else {
        roll_rarity(rng)?
    };
    Ok((item, rarity))
}

/// 搜索/每日奖励服务: 冷却门 + 掉落 + 账本落地
#[derive(Clone)]
pub struct RewardService {
    pool: DatabaseConnection,
    locks: LockRegistry,
    player_service: PlayerService,
    inventory_service: InventoryService,
    game: GameConfig,
}

impl RewardService {
    pub fn new(
        pool: DatabaseConnection,
        locks: LockRegistry,
        player_service: PlayerService,
        inventory_service: InventoryService,
        game: GameConfig,
    ) -> Self {
        Self {
            pool,
            locks,
            player_service,
            inventory_service,
            game,
        }
    }

    /// 手动搜索 (自动搜索 tick 走完全相同的路径)
    ///
    /// 流程:
    /// 1. 动作锁: 同一用户并发重复提交直接拒绝
    /// 2. 持锁后重新做冷却检查 (避免 TOCTOU)
    /// 3. 抽取物品 + 稀有度 + 金币 (含特权倍率)
    /// 4. 单事务内落地: 背包 +1, 余额 +coins, last_search_at = now
    pub async fn search(&self, user_id: i64, username: Option<&str>) -> AppResult<SearchResponse> {
        let key = LockRegistry::search_key(user_id);
        let _guard = self.locks.try_acquire(&key).ok_or(AppError::DuplicateRequest)?;

        let now = Utc::now();
        let player = self.player_service.get_or_create(user_id, username).await?;
        let tier = player.vip_tier(now);
        let multiplier = tier.cooldown_multiplier();

        if let CooldownCheck::Denied { seconds_remaining } = check_cooldown(
            player.last_search_at,
            self.game.search_cooldown_secs,
            multiplier,
            now,
        ) {
            return Err(AppError::CooldownActive { seconds_remaining });
        }

        let catalog = items::Entity::find()
            .filter(items::Column::IsDrawable.eq(true))
            .all(&self.pool)
            .await?;

        // rng 不跨 await 持有
        let (item, rarity, coins_gained) = {
            let mut rng = rand::thread_rng();
            let (item, rarity) = draw_reward(&catalog, &mut rng)?;
            let base_coins =
                rng.gen_range(self.game.search_reward_min..=self.game.search_reward_max);
            (item, rarity, base_coins * tier.coin_multiplier())
        };

        let txn = self.pool.begin().await?;
        self.inventory_service
            .grant_tx(&txn, user_id, item.id, rarity)
            .await?;
        self.player_service
            .credit_coins_tx(&txn, user_id, coins_gained)
            .await?;
        self.player_service
            .set_last_search_at_tx(&txn, user_id, now)
            .await?;
        let balance = self.player_service.get_tx(&txn, user_id).await?.balance;
        txn.commit().await?;

        log::info!(
            "Player {user_id} found '{}' ({rarity}), +{coins_gained} septims",
            item.name
        );

        Ok(SearchResponse {
            item: item.into(),
            rarity,
            coins_gained,
            balance,
            next_search_in_secs: effective_cooldown_secs(self.game.search_cooldown_secs, multiplier),
        })
    }

    /// 每日奖励: 同样的冷却门形状, 单独的锁 key 与时间戳
    pub async fn claim_bonus(&self, user_id: i64, username: Option<&str>) -> AppResult<BonusResponse> {
        let key = LockRegistry::bonus_key(user_id);
        let _guard = self.locks.try_acquire(&key).ok_or(AppError::DuplicateRequest)?;

        let now = Utc::now();
        let player = self.player_service.get_or_create(user_id, username).await?;
        let tier = player.vip_tier(now);
        let multiplier = tier.cooldown_multiplier();

        if let CooldownCheck::Denied { seconds_remaining } = check_cooldown(
            player.last_bonus_at,
            self.game.bonus_cooldown_secs,
            multiplier,
            now,
        ) {
            return Err(AppError::CooldownActive { seconds_remaining });
        }

        let coins_gained = self.game.bonus_amount * tier.coin_multiplier();

        let txn = self.pool.begin().await?;
        self.player_service
            .credit_coins_tx(&txn, user_id, coins_gained)
            .await?;
        self.player_service
            .set_last_bonus_at_tx(&txn, user_id, now)
            .await?;
        let balance = self.player_service.get_tx(&txn, user_id).await?.balance;
        txn.commit().await?;

        Ok(BonusResponse {
            coins_gained,
            balance,
            next_bonus_in_secs: effective_cooldown_secs(self.game.bonus_cooldown_secs, multiplier),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn item(id: i64, name: &str, special: bool) -> items::Model {
        items::Model {
            id,
            name: name.to_string(),
            description: String::new(),
            image_ref: None,
            is_special: special,
            is_drawable: true,
            created_at: None,
        }
    }

    #[test]
    fn test_empty_catalog_is_distinct_error() {
        let mut rng = rand::thread_rng();
        let result = draw_reward(&[], &mut rng);
        assert!(matches!(result, Err(AppError::EmptyCatalog)));
    }

    #[test]
    fn test_special_item_always_special_rarity() {
        // 特殊物品 100% 命中 Special, 与权重表无关
        let catalog = vec![item(1, "Golden Bull", true)];
        let mut rng = rand::thread_rng();
        for _ in 0..1000 {
            let (_, rarity) = draw_reward(&catalog, &mut rng).unwrap();
            assert_eq!(rarity, RarityTier::Special);
        }
    }

    #[test]
    fn test_normal_item_never_special() {
        let catalog = vec![item(1, "Static Cola", false)];
        let mut rng = rand::thread_rng();
        for _ in 0..1000 {
            let (_, rarity) = draw_reward(&catalog, &mut rng).unwrap();
            assert_ne!(rarity, RarityTier::Special);
        }
    }

    #[test]
    fn test_weighted_distribution_within_tolerance() {
        // 10 万次抽取, 每档经验频率与 weight/total 偏差 <= 2 个百分点
        const N: usize = 100_000;
        let mut rng = rand::thread_rng();
        let mut counts = std::collections::HashMap::new();
        for _ in 0..N {
            *counts.entry(roll_rarity(&mut rng).unwrap()).or_insert(0usize) += 1;
        }

        let total: u32 = RarityTier::drawable().iter().map(|t| t.weight()).sum();
        for tier in RarityTier::drawable() {
            let expected = tier.weight() as f64 / total as f64;
            let observed = *counts.get(&tier).unwrap_or(&0) as f64 / N as f64;
            assert!(
                (observed - expected).abs() <= 0.02,
                "{tier}: observed {observed:.4}, expected {expected:.4}"
            );
        }
    }

    #[test]
    fn test_item_pick_uniform_and_independent() {
        // 物品选择与稀有度无关: 两个普通物品各占约一半
        let catalog = vec![item(1, "A", false), item(2, "B", false)];
        let mut rng = rand::thread_rng();
        let mut first = 0usize;
        const N: usize = 20_000;
        for _ in 0..N {
            let (picked, _) = draw_reward(&catalog, &mut rng).unwrap();
            if picked.id == 1 {
                first += 1;
            }
        }
        let ratio = first as f64 / N as f64;
        assert!((ratio - 0.5).abs() < 0.03, "ratio {ratio:.4}");
    }
}
