use crate::entities::{
    receipt_entity as receipts, stock_entity as stock, PerkKind, ReceiptStatus,
};
use crate::error::{AppError, AppResult};
use crate::models::{PaginatedResponse, PaginationParams, PurchaseResponse, ReceiptResponse, ShopPlan};
use crate::services::{LockRegistry, PlayerService};
use chrono::{Duration, Utc};
use sea_orm::sea_query::Expr;
use sea_orm::{
    ActiveModelTrait, ColumnTrait, Condition, DatabaseConnection, DatabaseTransaction, EntityTrait,
    IntoActiveModel, Order, PaginatorTrait, QueryFilter, QueryOrder, QuerySelect, Set,
    TransactionTrait, UpdateResult,
};

/// 限量购买引擎
///
/// 单事务内完成: 库存原子扣减 -> 余额条件扣款 -> 特权续期 -> 凭证追加。
/// 两个失败路径 (缺货 / 余额不足) 都整体回滚, 不存在部分变更。
/// 检查顺序固定: 先库存后余额。
/// 同一用户的并发重复购买被动作锁拦截, 只有一次落库。
#[derive(Clone)]
pub struct PurchaseService {
    pool: DatabaseConnection,
    locks: LockRegistry,
    player_service: PlayerService,
}

impl PurchaseService {
    pub fn new(pool: DatabaseConnection, locks: LockRegistry, player_service: PlayerService) -> Self {
        Self {
            pool,
            locks,
            player_service,
        }
    }

    /// 价目表: (kind, days) -> 价格
    /// premium 为限量代充, 其余不受库存约束
    pub fn plan_catalog() -> Vec<ShopPlan> {
        vec![
            ShopPlan {
                kind: PerkKind::Vip,
                days: 7,
                cost: 50_000,
                stocked: false,
            },
            ShopPlan {
                kind: PerkKind::Vip,
                days: 30,
                cost: 150_000,
                stocked: false,
            },
            ShopPlan {
                kind: PerkKind::VipPlus,
                days: 7,
                cost: 120_000,
                stocked: false,
            },
            ShopPlan {
                kind: PerkKind::VipPlus,
                days: 30,
                cost: 350_000,
                stocked: false,
            },
            ShopPlan {
                kind: PerkKind::Premium,
                days: 90,
                cost: 600_000,
                stocked: true,
            },
        ]
    }

    fn find_plan(kind: PerkKind, days: i64) -> Option<ShopPlan> {
        Self::plan_catalog()
            .into_iter()
            .find(|p| p.kind == kind && p.days == days)
    }

    /// 购买入口: 按价目表路由到限量/非限量路径
    pub async fn purchase(&self, user_id: i64, kind: PerkKind, days: i64) -> AppResult<PurchaseResponse> {
        let plan = Self::find_plan(kind, days)
            .ok_or_else(|| AppError::ValidationError(format!("No {kind} plan for {days} days")))?;

        // 同一用户在途购买未完成前, 再次点击直接拒绝
        let key = LockRegistry::purchase_key(user_id);
        let _guard = self
            .locks
            .try_acquire(&key)
            .ok_or(AppError::DuplicateRequest)?;

        if plan.stocked {
            self.execute(user_id, &plan, true).await
        } else {
            self.purchase_unlimited(user_id, &plan).await
        }
    }

    /// 非限量变体: 跳过库存检查, 其余行为完全一致; 调用方已持有动作锁
    async fn purchase_unlimited(
        &self,
        user_id: i64,
        plan: &ShopPlan,
    ) -> AppResult<PurchaseResponse> {
        self.execute(user_id, plan, false).await
    }

    async fn execute(
        &self,
        user_id: i64,
        plan: &ShopPlan,
        enforce_stock: bool,
    ) -> AppResult<PurchaseResponse> {
        let now = Utc::now();
        let txn = self.pool.begin().await?;

        let player = self.player_service.get_tx(&txn, user_id).await?;

        // 先库存后余额, 顺序固定
        if enforce_stock && !self.try_take_stock_tx(&txn, &plan.kind.to_string()).await? {
            return Err(AppError::OutOfStock {
                kind: plan.kind.to_string(),
            });
        }

        if !self
            .player_service
            .try_debit_coins_tx(&txn, user_id, plan.cost)
            .await?
        {
            // txn 随错误返回丢弃回滚, 库存扣减一并撤销
            return Err(AppError::InsufficientFunds {
                required: plan.cost,
                available: player.balance,
            });
        }

        let valid_until = self
            .player_service
            .extend_entitlement_tx(
                &txn,
                user_id,
                plan.kind,
                Duration::seconds(plan.days * 86_400),
                now,
            )
            .await?;

        let receipt = receipts::ActiveModel {
            player_id: Set(user_id),
            kind: Set(plan.kind),
            coins_spent: Set(plan.cost),
            duration_secs: Set(plan.days * 86_400),
            purchased_at: Set(now),
            valid_until: Set(valid_until),
            status: Set(ReceiptStatus::Completed),
            ..Default::default()
        }
        .insert(&txn)
        .await?;

        let coins_left = self.player_service.get_tx(&txn, user_id).await?.balance;
        txn.commit().await?;

        log::info!(
            "Player {user_id} bought {} for {} septims, valid until {valid_until}",
            plan.kind,
            plan.cost
        );

        Ok(PurchaseResponse {
            receipt_id: receipt.id,
            coins_left,
            valid_until,
        })
    }

    /// 原子扣库存: update ... where kind = ? and stock > 0
    /// 行不存在或已为 0 都视为缺货
    async fn try_take_stock_tx(&self, txn: &DatabaseTransaction, kind: &str) -> AppResult<bool> {
        let result: UpdateResult = stock::Entity::update_many()
            .col_expr(
                stock::Column::Stock,
                Expr::col(stock::Column::Stock).sub(1),
            )
            .filter(
                Condition::all()
                    .add(stock::Column::Kind.eq(kind))
                    .add(stock::Column::Stock.gt(0)),
            )
            .exec(txn)
            .await?;
        Ok(result.rows_affected == 1)
    }

    pub async fn get_stock(&self, kind: &str) -> AppResult<i64> {
        Ok(stock::Entity::find_by_id(kind)
            .one(&self.pool)
            .await?
            .map(|row| row.stock)
            .unwrap_or(0))
    }

    /// 管理员补货 / 置量 (绝对值)
    pub async fn admin_set_stock(&self, kind: &str, amount: i64) -> AppResult<i64> {
        if amount < 0 {
            return Err(AppError::ValidationError(
                "Stock cannot be negative".to_string(),
            ));
        }
        match stock::Entity::find_by_id(kind).one(&self.pool).await? {
            Some(row) => {
                let mut am = row.into_active_model();
                am.stock = Set(amount);
                am.update(&self.pool).await?;
            }
            None => {
                stock::ActiveModel {
                    kind: Set(kind.to_string()),
                    stock: Set(amount),
                }
                .insert(&self.pool)
                .await?;
            }
        }
        Ok(amount)
    }

    /// 凭证核销: completed -> verified, 仅状态流转, 内容不可变
    pub async fn verify_receipt(&self, receipt_id: i64, admin_id: i64) -> AppResult<ReceiptResponse> {
        let receipt = receipts::Entity::find_by_id(receipt_id)
            .one(&self.pool)
            .await?
            .ok_or_else(|| AppError::NotFound("Receipt not found".to_string()))?;

        if receipt.status != ReceiptStatus::Completed {
            return Err(AppError::ValidationError(format!(
                "Receipt is {} and cannot be verified",
                receipt.status
            )));
        }

        let mut am = receipt.into_active_model();
        am.status = Set(ReceiptStatus::Verified);
        am.verified_by = Set(Some(admin_id));
        am.verified_at = Set(Some(Utc::now()));
        Ok(am.update(&self.pool).await?.into())
    }

    pub async fn list_receipts(&self, user_id: i64) -> AppResult<Vec<ReceiptResponse>> {
        let list = receipts::Entity::find()
            .filter(receipts::Column::PlayerId.eq(user_id))
            .order_by(receipts::Column::PurchasedAt, Order::Desc)
            .all(&self.pool)
            .await?;
        Ok(list.into_iter().map(Into::into).collect())
    }

    pub async fn list_all_receipts(
        &self,
        params: &PaginationParams,
    ) -> AppResult<PaginatedResponse<ReceiptResponse>> {
        let base_query = receipts::Entity::find();
        let total = base_query.clone().count(&self.pool).await? as i64;
        let items = base_query
            .order_by(receipts::Column::PurchasedAt, Order::Desc)
            .limit(params.get_limit())
            .offset(params.get_offset())
            .all(&self.pool)
            .await?;
        Ok(PaginatedResponse::new(
            items.into_iter().map(Into::into).collect(),
            params,
            total,
        ))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use migration::{Migrator, MigratorTrait};
    use sea_orm::{ConnectOptions, Database};

    async fn setup() -> (DatabaseConnection, PlayerService, PurchaseService) {
        // 内存库 + 单连接, 保证所有操作落在同一个 sqlite 实例上
        let mut options = ConnectOptions::new("sqlite::memory:".to_string());
        options.max_connections(1).min_connections(1);
        let pool = Database::connect(options).await.unwrap();
        Migrator::up(&pool, None).await.unwrap();

        let players = PlayerService::new(pool.clone());
        let purchases = PurchaseService::new(pool.clone(), LockRegistry::new(), players.clone());
        (pool, players, purchases)
    }

    async fn seed_player(players: &PlayerService, id: i64, balance: i64) {
        players.get_or_create(id, Some("tester")).await.unwrap();
        if balance > 0 {
            players.admin_adjust_coins(id, balance).await.unwrap();
        }
    }

    #[tokio::test]
    async fn test_purchase_debits_stock_and_balance() {
        let (_pool, players, purchases) = setup().await;
        seed_player(&players, 1, 1_000_000).await;

        // 初始迁移给 premium 种了 5 份库存
        assert_eq!(purchases.get_stock("premium").await.unwrap(), 5);

        let result = purchases.purchase(1, PerkKind::Premium, 90).await.unwrap();
        assert_eq!(result.coins_left, 400_000);
        assert_eq!(purchases.get_stock("premium").await.unwrap(), 4);

        let receipts = purchases.list_receipts(1).await.unwrap();
        assert_eq!(receipts.len(), 1);
        assert_eq!(receipts[0].coins_spent, 600_000);
        assert_eq!(receipts[0].status, ReceiptStatus::Completed);
    }

    #[tokio::test]
    async fn test_out_of_stock_checked_before_funds() {
        let (_pool, players, purchases) = setup().await;
        // 余额为 0 且库存为 0: 必须报缺货而不是余额不足
        seed_player(&players, 1, 0).await;
        purchases.admin_set_stock("premium", 0).await.unwrap();

        let result = purchases.purchase(1, PerkKind::Premium, 90).await;
        assert!(matches!(result, Err(AppError::OutOfStock { .. })));
    }

    #[tokio::test]
    async fn test_insufficient_funds_leaves_no_partial_state() {
        let (_pool, players, purchases) = setup().await;
        seed_player(&players, 1, 100).await;
        purchases.admin_set_stock("premium", 1).await.unwrap();

        let result = purchases.purchase(1, PerkKind::Premium, 90).await;
        match result {
            Err(AppError::InsufficientFunds {
                required,
                available,
            }) => {
                assert_eq!(required, 600_000);
                assert_eq!(available, 100);
            }
            other => panic!("unexpected result: {other:?}"),
        }
        // 回滚: 库存未扣, 余额未动
        assert_eq!(purchases.get_stock("premium").await.unwrap(), 1);
        assert_eq!(players.get(1).await.unwrap().balance, 100);
    }

    #[tokio::test]
    async fn test_last_unit_goes_to_exactly_one_buyer() {
        let (_pool, players, purchases) = setup().await;
        seed_player(&players, 1, 1_000_000).await;
        seed_player(&players, 2, 1_000_000).await;
        purchases.admin_set_stock("premium", 1).await.unwrap();

        let (a, b) = tokio::join!(
            purchases.purchase(1, PerkKind::Premium, 90),
            purchases.purchase(2, PerkKind::Premium, 90),
        );

        let oks = [a.is_ok(), b.is_ok()].iter().filter(|x| **x).count();
        assert_eq!(oks, 1, "exactly one purchase may win the last unit");
        assert_eq!(purchases.get_stock("premium").await.unwrap(), 0);

        // 赢家扣款, 输家分文未动
        let winner = if a.is_ok() { 1 } else { 2 };
        let loser = 3 - winner;
        assert_eq!(players.get(winner).await.unwrap().balance, 400_000);
        assert_eq!(players.get(loser).await.unwrap().balance, 1_000_000);
    }

    #[tokio::test]
    async fn test_concurrent_identical_purchases_charge_once() {
        let (_pool, players, purchases) = setup().await;
        seed_player(&players, 1, 1_000_000).await;

        // 同一用户连点两次: 一次成交, 一次被动作锁拒绝
        let (a, b) = tokio::join!(
            purchases.purchase(1, PerkKind::Premium, 90),
            purchases.purchase(1, PerkKind::Premium, 90),
        );

        let oks = [a.is_ok(), b.is_ok()].iter().filter(|x| **x).count();
        assert_eq!(oks, 1, "a double tap must settle exactly once");
        let loser = if a.is_ok() { b } else { a };
        assert!(matches!(loser, Err(AppError::DuplicateRequest)));

        // 只扣一次款, 只出一张凭证, 库存只减一
        assert_eq!(players.get(1).await.unwrap().balance, 400_000);
        assert_eq!(purchases.list_receipts(1).await.unwrap().len(), 1);
        assert_eq!(purchases.get_stock("premium").await.unwrap(), 4);
    }

    #[tokio::test]
    async fn test_balance_never_negative_over_sequence() {
        let (_pool, players, purchases) = setup().await;
        // 120_000: 够买两次 7 天 VIP, 第三次必须失败
        seed_player(&players, 1, 120_000).await;

        let mut successes = 0;
        for _ in 0..5 {
            match purchases.purchase(1, PerkKind::Vip, 7).await {
                Ok(r) => {
                    successes += 1;
                    assert!(r.coins_left >= 0);
                }
                Err(AppError::InsufficientFunds { .. }) => {}
                Err(e) => panic!("unexpected error: {e:?}"),
            }
            assert!(players.get(1).await.unwrap().balance >= 0);
        }
        assert_eq!(successes, 2);
        assert_eq!(players.get(1).await.unwrap().balance, 20_000);
    }

    #[tokio::test]
    async fn test_entitlement_extension_is_additive_while_active() {
        let (_pool, players, purchases) = setup().await;
        seed_player(&players, 1, 1_000_000).await;

        let first = purchases.purchase(1, PerkKind::Vip, 7).await.unwrap();
        let second = purchases.purchase(1, PerkKind::Vip, 7).await.unwrap();

        // 未过期时续购是追加: 第二次到期 = 第一次到期 + 7 天
        let diff = (second.valid_until - first.valid_until).num_seconds();
        assert_eq!(diff, 7 * 86_400);
    }

    #[tokio::test]
    async fn test_entitlement_restarts_after_expiry() {
        let (_pool, players, purchases) = setup().await;
        seed_player(&players, 1, 1_000_000).await;

        // 人为把 VIP 到期时间拨到过去
        let past = Utc::now() - Duration::days(30);
        let mut am = players.get(1).await.unwrap().into_active_model();
        am.vip_until = Set(Some(past));
        am.update(players.pool()).await.unwrap();

        let result = purchases.purchase(1, PerkKind::Vip, 7).await.unwrap();
        let expected = Utc::now() + Duration::days(7);
        let drift = (result.valid_until - expected).num_seconds().abs();
        assert!(drift <= 5, "fresh purchase starts from now, drift {drift}s");
    }

    #[tokio::test]
    async fn test_verify_receipt_is_one_way() {
        let (_pool, players, purchases) = setup().await;
        seed_player(&players, 1, 1_000_000).await;

        let bought = purchases.purchase(1, PerkKind::Vip, 7).await.unwrap();
        let verified = purchases.verify_receipt(bought.receipt_id, 999).await.unwrap();
        assert_eq!(verified.status, ReceiptStatus::Verified);
        assert_eq!(verified.verified_by, Some(999));

        // 二次核销被拒绝
        let again = purchases.verify_receipt(bought.receipt_id, 999).await;
        assert!(matches!(again, Err(AppError::ValidationError(_))));
    }

    #[test]
    fn test_plan_catalog_has_premium_stocked() {
        let plans = PurchaseService::plan_catalog();
        assert!(plans.iter().any(|p| p.kind == PerkKind::Premium && p.stocked));
        assert!(plans
            .iter()
            .filter(|p| p.kind != PerkKind::Premium)
            .all(|p| !p.stocked));
    }
}
