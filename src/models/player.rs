use crate::entities::player_entity as players;
use crate::models::VipTier;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct PlayerResponse {
    pub id: i64,
    pub username: String,
    /// septim 余额
    pub balance: i64,
    pub vip_tier: VipTier,
    pub vip_until: Option<DateTime<Utc>>,
    pub vip_plus_until: Option<DateTime<Utc>>,
    pub premium_until: Option<DateTime<Utc>>,
    pub auto_search_enabled: bool,
    pub locale: String,
    pub reminders_enabled: bool,
    /// 手动搜索冷却剩余秒数, 0 = 可立即搜索
    pub search_cooldown_remaining: i64,
    /// 每日奖励冷却剩余秒数
    pub bonus_cooldown_remaining: i64,
}

impl From<players::Model> for PlayerResponse {
    fn from(m: players::Model) -> Self {
        let now = Utc::now();
        Self {
            vip_tier: m.vip_tier(now),
            id: m.id,
            username: m.username,
            balance: m.balance,
            vip_until: m.vip_until,
            vip_plus_until: m.vip_plus_until,
            premium_until: m.premium_until,
            auto_search_enabled: m.auto_search_enabled,
            locale: m.locale,
            reminders_enabled: m.reminders_enabled,
            // 冷却剩余由 handler 按配置回填
            search_cooldown_remaining: 0,
            bonus_cooldown_remaining: 0,
        }
    }
}

#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub struct UpdatePlayerRequest {
    #[schema(example = "dragonborn")]
    pub username: Option<String>,
    #[schema(example = "en")]
    pub locale: Option<String>,
    pub reminders_enabled: Option<bool>,
}
