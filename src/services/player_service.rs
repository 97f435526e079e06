use crate::entities::{inventory_entity as inventory, player_entity as players, receipt_entity as receipts, PerkKind};
use crate::error::{AppError, AppResult};
use crate::models::UpdatePlayerRequest;
use chrono::{DateTime, Duration, Utc};
use sea_orm::sea_query::Expr;
use sea_orm::{
    ActiveModelTrait, ColumnTrait, DatabaseConnection, DatabaseTransaction, DbErr, EntityTrait,
    IntoActiveModel, QueryFilter, Set, TransactionTrait,
};

/// 玩家账本服务: 懒创建 + 余额/时间戳/特权的原子更新。
/// 余额与库存是唯一真正共享的可变状态, 所有写路径都必须是
/// 单行原子 read-check-write (update ... where 条件), 避免丢失更新。
#[derive(Clone)]
pub struct PlayerService {
    pool: DatabaseConnection,
}

impl PlayerService {
    pub fn new(pool: DatabaseConnection) -> Self {
        Self { pool }
    }

    /// 首次交互懒创建 (upsert-by-id); 顺带同步展示名
    pub async fn get_or_create(
        &self,
        user_id: i64,
        username: Option<&str>,
    ) -> AppResult<players::Model> {
        if let Some(existing) = players::Entity::find_by_id(user_id).one(&self.pool).await? {
            // 平台侧改名后尽力同步, 失败不影响主流程
            if let Some(name) = username {
                if !name.is_empty() && name != existing.username {
                    let mut am = existing.clone().into_active_model();
                    am.username = Set(name.to_string());
                    am.updated_at = Set(Some(Utc::now()));
                    return Ok(am.update(&self.pool).await?);
                }
            }
            return Ok(existing);
        }

        let model = players::ActiveModel {
            id: Set(user_id),
            username: Set(username.unwrap_or_default().to_string()),
            balance: Set(0),
            auto_search_enabled: Set(false),
            auto_search_used: Set(0),
            quota_boost: Set(0),
            locale: Set("en".to_string()),
            reminders_enabled: Set(false),
            created_at: Set(Some(Utc::now())),
            updated_at: Set(Some(Utc::now())),
            ..Default::default()
        };
        Ok(model.insert(&self.pool).await?)
    }

    pub async fn get(&self, user_id: i64) -> AppResult<players::Model> {
        players::Entity::find_by_id(user_id)
            .one(&self.pool)
            .await?
            .ok_or_else(|| AppError::NotFound("Player not found".to_string()))
    }

    pub async fn update_profile(
        &self,
        user_id: i64,
        request: UpdatePlayerRequest,
    ) -> AppResult<players::Model> {
        if let Some(username) = &request.username {
            if username.len() < 2 || username.len() > 32 {
                return Err(AppError::ValidationError(
                    "Username length must be between 2 and 32 characters".to_string(),
                ));
            }
        }

        let mut model = self.get(user_id).await?.into_active_model();
        if let Some(username) = request.username {
            model.username = Set(username);
        }
        if let Some(locale) = request.locale {
            model.locale = Set(locale);
        }
        if let Some(reminders) = request.reminders_enabled {
            model.reminders_enabled = Set(reminders);
        }
        model.updated_at = Set(Some(Utc::now()));
        Ok(model.update(&self.pool).await?)
    }

    /// 用户主动数据清除: 背包、凭证、玩家行一并删除
    pub async fn wipe(&self, user_id: i64) -> AppResult<()> {
        let txn = self.pool.begin().await?;
        inventory::Entity::delete_many()
            .filter(inventory::Column::PlayerId.eq(user_id))
            .exec(&txn)
            .await?;
        receipts::Entity::delete_many()
            .filter(receipts::Column::PlayerId.eq(user_id))
            .exec(&txn)
            .await?;
        players::Entity::delete_by_id(user_id).exec(&txn).await?;
        txn.commit().await?;
        log::info!("Player {user_id} wiped own data");
        Ok(())
    }

    /// 原子加币 (amount > 0); 掉落与出售共用
    pub async fn credit_coins_tx(
        &self,
        txn: &DatabaseTransaction,
        user_id: i64,
        amount: i64,
    ) -> AppResult<()> {
        if amount < 0 {
            return Err(AppError::InternalError(
                "credit_coins_tx called with negative amount".to_string(),
            ));
        }
        players::Entity::update_many()
            .col_expr(
                players::Column::Balance,
                Expr::col(players::Column::Balance).add(amount),
            )
            .filter(players::Column::Id.eq(user_id))
            .exec(txn)
            .await?;
        Ok(())
    }

    /// 原子条件扣款: update ... where balance >= amount。
    /// 返回 false 表示余额不足 (未发生任何变更)
    pub async fn try_debit_coins_tx(
        &self,
        txn: &DatabaseTransaction,
        user_id: i64,
        amount: i64,
    ) -> AppResult<bool> {
        let result = players::Entity::update_many()
            .col_expr(
                players::Column::Balance,
                Expr::col(players::Column::Balance).sub(amount),
            )
            .filter(players::Column::Id.eq(user_id))
            .filter(players::Column::Balance.gte(amount))
            .exec(txn)
            .await?;
        Ok(result.rows_affected == 1)
    }

    /// 管理员发放 (可为负; 负值同样不会把余额扣成负数)
    pub async fn admin_adjust_coins(&self, user_id: i64, amount: i64) -> AppResult<i64> {
        let txn = self.pool.begin().await?;
        self.get_tx(&txn, user_id).await?;
        if amount >= 0 {
            self.credit_coins_tx(&txn, user_id, amount).await?;
        } else if !self.try_debit_coins_tx(&txn, user_id, -amount).await? {
            return Err(AppError::ValidationError(
                "Deduction exceeds player balance".to_string(),
            ));
        }
        let balance = self.get_tx(&txn, user_id).await?.balance;
        txn.commit().await?;
        Ok(balance)
    }

    /// 购买续期语义: 未过期则追加 (old_expiry + duration),
    /// 已过期则从现在重新起算 (now + duration)
    pub async fn extend_entitlement_tx(
        &self,
        txn: &DatabaseTransaction,
        user_id: i64,
        kind: PerkKind,
        duration: Duration,
        now: DateTime<Utc>,
    ) -> AppResult<DateTime<Utc>> {
        let player = self.get_tx(txn, user_id).await?;
        let current = match kind {
            PerkKind::Vip => player.vip_until,
            PerkKind::VipPlus => player.vip_plus_until,
            PerkKind::Premium => player.premium_until,
        };
        let base = match current {
            Some(t) if t > now => t,
            _ => now,
        };
        let new_until = base + duration;

        let mut am = player.into_active_model();
        match kind {
            PerkKind::Vip => am.vip_until = Set(Some(new_until)),
            PerkKind::VipPlus => am.vip_plus_until = Set(Some(new_until)),
            PerkKind::Premium => am.premium_until = Set(Some(new_until)),
        }
        am.updated_at = Set(Some(now));
        am.update(txn).await?;
        Ok(new_until)
    }

    pub async fn get_tx(
        &self,
        txn: &DatabaseTransaction,
        user_id: i64,
    ) -> Result<players::Model, AppError> {
        players::Entity::find_by_id(user_id)
            .one(txn)
            .await?
            .ok_or_else(|| AppError::NotFound("Player not found".to_string()))
    }

    pub async fn find_by_username(&self, username: &str) -> AppResult<Option<players::Model>> {
        Ok(players::Entity::find()
            .filter(players::Column::Username.eq(username))
            .one(&self.pool)
            .await?)
    }

    pub async fn set_auto_search_enabled(&self, user_id: i64, enabled: bool) -> AppResult<()> {
        let mut am = self.get(user_id).await?.into_active_model();
        am.auto_search_enabled = Set(enabled);
        am.updated_at = Set(Some(Utc::now()));
        am.update(&self.pool).await?;
        Ok(())
    }

    /// 滚动 24h 窗口到期后清零计数
    pub async fn reset_auto_search_window(&self, user_id: i64, now: DateTime<Utc>) -> AppResult<()> {
        let mut am = self.get(user_id).await?.into_active_model();
        am.auto_search_used = Set(0);
        am.auto_search_reset_at = Set(Some(now + Duration::seconds(86_400)));
        am.updated_at = Set(Some(now));
        am.update(&self.pool).await?;
        Ok(())
    }

    /// 自动搜索成功一次后计数 +1, 返回新计数
    pub async fn increment_auto_search_used(&self, user_id: i64) -> AppResult<i64> {
        players::Entity::update_many()
            .col_expr(
                players::Column::AutoSearchUsed,
                Expr::col(players::Column::AutoSearchUsed).add(1),
            )
            .filter(players::Column::Id.eq(user_id))
            .exec(&self.pool)
            .await?;
        Ok(self.get(user_id).await?.auto_search_used)
    }

    /// 管理员授予临时配额加成
    pub async fn grant_quota_boost(
        &self,
        user_id: i64,
        amount: i64,
        until: DateTime<Utc>,
    ) -> AppResult<()> {
        if amount <= 0 {
            return Err(AppError::ValidationError(
                "Boost amount must be positive".to_string(),
            ));
        }
        let mut am = self.get(user_id).await?.into_active_model();
        am.quota_boost = Set(amount);
        am.quota_boost_until = Set(Some(until));
        am.updated_at = Set(Some(Utc::now()));
        am.update(&self.pool).await?;
        Ok(())
    }

    /// 进程重启恢复: 所有开着自动搜索的玩家
    pub async fn list_auto_search_enabled(&self) -> Result<Vec<players::Model>, DbErr> {
        players::Entity::find()
            .filter(players::Column::AutoSearchEnabled.eq(true))
            .all(&self.pool)
            .await
    }

    /// 冷却门提交前的"新鲜读" + 时间戳落库共用
    pub async fn set_last_search_at_tx(
        &self,
        txn: &DatabaseTransaction,
        user_id: i64,
        at: DateTime<Utc>,
    ) -> AppResult<()> {
        players::Entity::update_many()
            .col_expr(players::Column::LastSearchAt, Expr::value(at))
            .filter(players::Column::Id.eq(user_id))
            .exec(txn)
            .await?;
        Ok(())
    }

    pub async fn set_last_bonus_at_tx(
        &self,
        txn: &DatabaseTransaction,
        user_id: i64,
        at: DateTime<Utc>,
    ) -> AppResult<()> {
        players::Entity::update_many()
            .col_expr(players::Column::LastBonusAt, Expr::value(at))
            .filter(players::Column::Id.eq(user_id))
            .exec(txn)
            .await?;
        Ok(())
    }

    pub async fn set_last_submission_at(&self, user_id: i64, at: DateTime<Utc>) -> AppResult<()> {
        players::Entity::update_many()
            .col_expr(players::Column::LastSubmissionAt, Expr::value(at))
            .filter(players::Column::Id.eq(user_id))
            .exec(&self.pool)
            .await?;
        Ok(())
    }

    pub fn pool(&self) -> &DatabaseConnection {
        &self.pool
    }
}
