use crate::models::{ItemResponse, RarityTier};
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub struct InventoryLineResponse {
    pub item: ItemResponse,
    pub rarity: RarityTier,
    pub quantity: i64,
}

#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub struct SellRequest {
    pub item_id: i64,
    pub rarity: RarityTier,
    /// 出售数量, 默认 1
    pub quantity: Option<i64>,
}

#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub struct SellResponse {
    pub coins_gained: i64,
    pub balance: i64,
}
