use chrono::{DateTime, Utc};
use sea_orm::entity::prelude::*;
use sea_orm::{DeriveActiveEnum, EnumIter};
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

/// 可购买的特权类别
#[derive(
    Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, ToSchema, DeriveActiveEnum, EnumIter,
)]
#[sea_orm(rs_type = "String", db_type = "String(None)")]
#[serde(rename_all = "snake_case")]
pub enum PerkKind {
    /// VIP: 冷却 0.5x, 金币 2x
    #[sea_orm(string_value = "vip")]
    Vip,
    /// VIP+: 冷却 0.25x, 金币 4x
    #[sea_orm(string_value = "vip_plus")]
    VipPlus,
    /// TG Premium 代充 (限量)
    #[sea_orm(string_value = "premium")]
    Premium,
}

impl std::fmt::Display for PerkKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            PerkKind::Vip => write!(f, "vip"),
            PerkKind::VipPlus => write!(f, "vip_plus"),
            PerkKind::Premium => write!(f, "premium"),
        }
    }
}

#[derive(
    Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, ToSchema, DeriveActiveEnum, EnumIter,
)]
#[sea_orm(rs_type = "String", db_type = "String(None)")]
#[serde(rename_all = "snake_case")]
pub enum ReceiptStatus {
    #[sea_orm(string_value = "completed")]
    Completed,
    #[sea_orm(string_value = "verified")]
    Verified,
    #[sea_orm(string_value = "canceled")]
    Canceled,
}

impl std::fmt::Display for ReceiptStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ReceiptStatus::Completed => write!(f, "completed"),
            ReceiptStatus::Verified => write!(f, "verified"),
            ReceiptStatus::Canceled => write!(f, "canceled"),
        }
    }
}

/// 购买凭证 (不可变审计记录)
/// 创建后内容永不修改, 仅允许 status: completed -> verified 的流转
#[derive(Clone, Debug, PartialEq, DeriveEntityModel, Eq)]
#[sea_orm(table_name = "purchase_receipts")]
pub struct Model {
    #[sea_orm(primary_key)]
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

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {}

impl ActiveModelBehavior for ActiveModel {}
