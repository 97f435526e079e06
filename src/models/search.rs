use crate::models::{ItemResponse, RarityTier};
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

/// 一次搜索的结果载荷: 物品 + 稀有度 + 金币, 展示层直接渲染
#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub struct SearchResponse {
    pub item: ItemResponse,
    pub rarity: RarityTier,
    /// 本次掉落金币 (已含特权倍率)
    pub coins_gained: i64,
    pub balance: i64,
    /// 下次可搜索的冷却秒数
    pub next_search_in_secs: i64,
}

#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub struct BonusResponse {
    pub coins_gained: i64,
    pub balance: i64,
    pub next_bonus_in_secs: i64,
}
