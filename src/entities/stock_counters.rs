use sea_orm::entity::prelude::*;

/// 限量商品库存: kind -> 剩余数量 (恒 >= 0)
/// 扣减必须走原子条件更新 (stock > 0), 不允许读-改-写拆开
#[derive(Clone, Debug, PartialEq, DeriveEntityModel, Eq)]
#[sea_orm(table_name = "stock_counters")]
pub struct Model {
    #[sea_orm(primary_key, auto_increment = false)]
    pub kind: String,
    pub stock: i64,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {}

impl ActiveModelBehavior for ActiveModel {}
