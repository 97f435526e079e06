use crate::entities::{receipt_entity as receipts, PerkKind, ReceiptStatus};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

/// 商店价目表条目
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct ShopPlan {
    pub kind: PerkKind,
    /// 时长 (天)
    pub days: i64,
    /// 价格 (septims)
    pub cost: i64,
    /// 是否受库存约束
    pub stocked: bool,
}

#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub struct PurchaseRequest {
    pub kind: PerkKind,
    #[schema(example = 7)]
    pub days: i64,
}

#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub struct PurchaseResponse {
    pub receipt_id: i64,
    pub coins_left: i64,
    pub valid_until: DateTime<Utc>,
}

#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub struct ReceiptResponse {
    pub id: i64,
    pub player_id: i64,
    pub kind: PerkKind,
    pub coins_spent: i64,
    pub duration_secs: i64,
    pub purchased_at: DateTime<Utc>,
    pub valid_until: DateTime<Utc>,
    pub status: ReceiptStatus,
    pub verified_by: Option<i64>,
    pub verified_at: Option<DateTime<Utc>>,
}

impl From<receipts::Model> for ReceiptResponse {
    fn from(m: receipts::Model) -> Self {
        Self {
            id: m.id,
            player_id: m.player_id,
            kind: m.kind,
            coins_spent: m.coins_spent,
            duration_secs: m.duration_secs,
            purchased_at: m.purchased_at,
            valid_until: m.valid_until,
            status: m.status,
            verified_by: m.verified_by,
            verified_at: m.verified_at,
        }
    }
}
