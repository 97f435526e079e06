use crate::models::RarityTier;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;
use uuid::Uuid;

#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub struct CreateGiftRequest {
    /// 受赠人 id 与用户名二选一
    pub recipient_id: Option<i64>,
    pub recipient_username: Option<String>,
    pub item_id: i64,
    pub rarity: RarityTier,
}

#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct GiftOfferResponse {
    pub token: Uuid,
    pub giver_id: i64,
    pub giver_username: String,
    pub item_id: i64,
    pub item_name: String,
    pub rarity: RarityTier,
    pub expires_at: DateTime<Utc>,
}
