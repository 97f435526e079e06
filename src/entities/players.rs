use crate::models::VipTier;
use chrono::{DateTime, Utc};
use sea_orm::entity::prelude::*;

/// 玩家账本: 一行一个用户
/// - id 即 Telegram user id (不自增, 首次交互时懒创建)
/// - balance 为 septim 余额, 扣款路径保证永不为负
/// - 各时间戳 None 表示"从未发生" / "特权未激活"
#[derive(Clone, Debug, PartialEq, DeriveEntityModel, Eq)]
#[sea_orm(table_name = "players")]
pub struct Model {
    #[sea_orm(primary_key, auto_increment = false)]
    pub id: i64,
    pub username: String,
    pub balance: i64,
    pub last_search_at: Option<DateTime<Utc>>,
    pub last_bonus_at: Option<DateTime<Utc>>,
    pub last_submission_at: Option<DateTime<Utc>>,
    pub vip_until: Option<DateTime<Utc>>,
    pub vip_plus_until: Option<DateTime<Utc>>,
    pub premium_until: Option<DateTime<Utc>>,
    pub auto_search_enabled: bool,
    pub auto_search_used: i64,
    pub auto_search_reset_at: Option<DateTime<Utc>>,
    pub quota_boost: i64,
    pub quota_boost_until: Option<DateTime<Utc>>,
    pub locale: String,
    pub reminders_enabled: bool,
    pub created_at: Option<DateTime<Utc>>,
    pub updated_at: Option<DateTime<Utc>>,
}

impl Model {
    /// 当前生效的最高特权档位 (同时激活时取高档)
    pub fn vip_tier(&self, now: DateTime<Utc>) -> VipTier {
        fn active(until: Option<DateTime<Utc>>, now: DateTime<Utc>) -> bool {
            matches!(until, Some(t) if now < t)
        }
        if active(self.vip_plus_until, now) {
            VipTier::VipPlus
        } else if active(self.vip_until, now) {
            VipTier::Vip
        } else {
            VipTier::None
        }
    }

    pub fn premium_active(&self, now: DateTime<Utc>) -> bool {
        matches!(self.premium_until, Some(t) if now < t)
    }

    /// 临时配额加成 (未过期才计入)
    pub fn active_quota_boost(&self, now: DateTime<Utc>) -> i64 {
        match self.quota_boost_until {
            Some(t) if now < t => self.quota_boost,
            _ => 0,
        }
    }
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {}

impl ActiveModelBehavior for ActiveModel {}
