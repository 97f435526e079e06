use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub struct AutoSearchStatusResponse {
    pub enabled: bool,
    /// 当前滚动 24h 窗口内已用次数
    pub used_today: i64,
    /// 基础上限 + 档位加成 + 未过期的临时加成
    pub daily_limit: i64,
    pub reset_at: Option<DateTime<Utc>>,
    /// 循环任务是否在运行中 (进程内状态)
    pub armed: bool,
}
