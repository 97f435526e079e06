use crate::models::RarityTier;
use sea_orm::entity::prelude::*;

/// 背包行: (player, item, rarity) 复合唯一 -> quantity
/// quantity 恒 >= 1; 减到 0 时整行删除而不是保留零值行
#[derive(Clone, Debug, PartialEq, DeriveEntityModel, Eq)]
#[sea_orm(table_name = "inventory_entries")]
pub struct Model {
    #[sea_orm(primary_key)]
    pub id: i64,
    pub player_id: i64,
    pub item_id: i64,
    pub rarity: RarityTier,
    pub quantity: i64,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {}

impl ActiveModelBehavior for ActiveModel {}
