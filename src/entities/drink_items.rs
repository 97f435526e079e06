use chrono::{DateTime, Utc};
use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};

/// 能量饮料图鉴条目
/// 概念说明:
/// - is_special: 特殊物品, 抽中时稀有度恒为 special (绕过权重表)
/// - is_drawable: 是否参与随机掉落; 社区投稿审核通过前为 false
/// - image_ref: 图片引用 (file id / URL), 由展示层解析
#[derive(Clone, Debug, PartialEq, DeriveEntityModel, Eq, Serialize, Deserialize)]
#[sea_orm(table_name = "drink_items")]
pub struct Model {
    #[sea_orm(primary_key)]
    pub id: i64,
    /// 饮料名称 (唯一)
    pub name: String,
    pub description: String,
    pub image_ref: Option<String>,
    pub is_special: bool,
    pub is_drawable: bool,
    pub created_at: Option<DateTime<Utc>>,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {}

impl ActiveModelBehavior for ActiveModel {}
