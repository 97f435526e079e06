use sea_orm::{DeriveActiveEnum, EnumIter};
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

/// 稀有度档位, 固定枚举
/// - 普通物品按 weight() 做加权随机 (权重是相对值, 不要求加和为 100)
/// - 特殊物品绕过权重表, 恒为 Special
/// - rank() 给出严格全序, 数值越大越稀有, 排序展示时高档在前
#[derive(
    Debug,
    Clone,
    Copy,
    Serialize,
    Deserialize,
    PartialEq,
    Eq,
    Hash,
    ToSchema,
    DeriveActiveEnum,
    EnumIter,
)]
#[sea_orm(rs_type = "String", db_type = "String(None)")]
#[serde(rename_all = "snake_case")]
pub enum RarityTier {
    #[sea_orm(string_value = "common")]
    Common,
    #[sea_orm(string_value = "uncommon")]
    Uncommon,
    #[sea_orm(string_value = "rare")]
    Rare,
    #[sea_orm(string_value = "epic")]
    Epic,
    #[sea_orm(string_value = "legendary")]
    Legendary,
    #[sea_orm(string_value = "special")]
    Special,
}

impl RarityTier {
    /// 加权随机抽取时的相对权重; Special 不参与抽取
    pub fn weight(&self) -> u32 {
        match self {
            RarityTier::Common => 50,
            RarityTier::Uncommon => 30,
            RarityTier::Rare => 15,
            RarityTier::Epic => 4,
            RarityTier::Legendary => 1,
            RarityTier::Special => 0,
        }
    }

    /// 参与加权抽取的档位 (按权重表顺序)
    pub fn drawable() -> [RarityTier; 5] {
        [
            RarityTier::Common,
            RarityTier::Uncommon,
            RarityTier::Rare,
            RarityTier::Epic,
            RarityTier::Legendary,
        ]
    }

    pub fn rank(&self) -> u8 {
        match self {
            RarityTier::Common => 0,
            RarityTier::Uncommon => 1,
            RarityTier::Rare => 2,
            RarityTier::Epic => 3,
            RarityTier::Legendary => 4,
            RarityTier::Special => 5,
        }
    }

    /// 出售一件该稀有度物品可得的 septim
    pub fn sell_value(&self) -> i64 {
        match self {
            RarityTier::Common => 10,
            RarityTier::Uncommon => 25,
            RarityTier::Rare => 60,
            RarityTier::Epic => 150,
            RarityTier::Legendary => 400,
            RarityTier::Special => 1000,
        }
    }
}

impl std::fmt::Display for RarityTier {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            RarityTier::Common => write!(f, "common"),
            RarityTier::Uncommon => write!(f, "uncommon"),
            RarityTier::Rare => write!(f, "rare"),
            RarityTier::Epic => write!(f, "epic"),
            RarityTier::Legendary => write!(f, "legendary"),
            RarityTier::Special => write!(f, "special"),
        }
    }
}

/// 特权档位, 由玩家的到期时间戳推导 (多档同时激活取最高档)
/// 倍率互不叠加: 高档直接覆盖低档
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, ToSchema)]
#[serde(rename_all = "snake_case")]
pub enum VipTier {
    None,
    Vip,
    VipPlus,
}

impl VipTier {
    /// 冷却倍率: 生效冷却 = 基础冷却 * 倍率
    pub fn cooldown_multiplier(&self) -> f64 {
        match self {
            VipTier::None => 1.0,
            VipTier::Vip => 0.5,
            VipTier::VipPlus => 0.25,
        }
    }

    /// 金币奖励倍率
    pub fn coin_multiplier(&self) -> i64 {
        match self {
            VipTier::None => 1,
            VipTier::Vip => 2,
            VipTier::VipPlus => 4,
        }
    }

    /// 自动搜索每日次数加成
    pub fn autosearch_bonus(&self) -> i64 {
        match self {
            VipTier::None => 0,
            VipTier::Vip => 0,
            VipTier::VipPlus => 20,
        }
    }

    /// 自动搜索要求 VIP 及以上
    pub fn allows_autosearch(&self) -> bool {
        !matches!(self, VipTier::None)
    }
}

impl std::fmt::Display for VipTier {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            VipTier::None => write!(f, "none"),
            VipTier::Vip => write!(f, "vip"),
            VipTier::VipPlus => write!(f, "vip_plus"),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_rarity_order_is_strict() {
        let tiers = [
            RarityTier::Common,
            RarityTier::Uncommon,
            RarityTier::Rare,
            RarityTier::Epic,
            RarityTier::Legendary,
            RarityTier::Special,
        ];
        for w in tiers.windows(2) {
            assert!(w[0].rank() < w[1].rank());
        }
    }

    #[test]
    fn test_drawable_weights_positive() {
        // 权重表配置错误属于编程错误, 在这里兜底
        let total: u32 = RarityTier::drawable().iter().map(|t| t.weight()).sum();
        assert!(total > 0);
        assert_eq!(RarityTier::Special.weight(), 0);
    }

    #[test]
    fn test_higher_tier_wins() {
        assert!(VipTier::VipPlus.cooldown_multiplier() < VipTier::Vip.cooldown_multiplier());
        assert!(VipTier::VipPlus.coin_multiplier() > VipTier::Vip.coin_multiplier());
    }
}
