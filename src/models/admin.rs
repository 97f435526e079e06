use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub struct SetStockRequest {
    #[schema(example = "premium")]
    pub kind: String,
    /// 设置后的绝对库存量 (>= 0)
    pub stock: i64,
}

#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub struct GrantCoinsRequest {
    pub user_id: i64,
    /// 发放金额, 允许为负 (扣罚), 但不会把余额扣成负数
    pub amount: i64,
}

#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub struct GrantBoostRequest {
    pub user_id: i64,
    /// 临时追加的自动搜索次数
    pub amount: i64,
    /// 加成持续时间 (秒)
    pub duration_secs: i64,
}
