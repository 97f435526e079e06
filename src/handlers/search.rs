use crate::handlers::{get_user_id_from_request, get_username_from_request};
use crate::services::RewardService;
use actix_web::{HttpRequest, HttpResponse, ResponseError, Result, web};
use serde_json::json;

#[utoipa::path(
    post,
    path = "/api/v1/search",
    tag = "search",
    security(
        ("telegram_id" = [])
    ),
    responses(
        (status = 200, description = "搜索成功", body = crate::models::SearchResponse),
        (status = 404, description = "掉落池为空"),
        (status = 409, description = "上一次搜索仍在处理中"),
        (status = 429, description = "冷却未结束, details 携带剩余秒数")
    )
)]
/// 手动搜索一次:
/// 1. 动作锁拒绝并发重复提交
/// 2. 冷却门 (基础冷却 × 特权倍率)
/// 3. 按稀有度权重抽取物品, 特殊物品强制 special
/// 4. 单事务落地背包 / 余额 / 时间戳
pub async fn search(service: web::Data<RewardService>, req: HttpRequest) -> Result<HttpResponse> {
    let user_id = get_user_id_from_request(&req).unwrap_or(0);
    let username = get_username_from_request(&req);
    match service.search(user_id, username.as_deref()).await {
        Ok(result) => Ok(HttpResponse::Ok().json(json!({ "success": true, "data": result }))),
        Err(e) => Ok(e.error_response()),
    }
}

#[utoipa::path(
    post,
    path = "/api/v1/bonus/claim",
    tag = "search",
    security(
        ("telegram_id" = [])
    ),
    responses(
        (status = 200, description = "每日奖励领取成功", body = crate::models::BonusResponse),
        (status = 429, description = "冷却未结束")
    )
)]
/// 领取每日奖励 (固定金额 × 特权倍率, 24h 冷却)
pub async fn claim_bonus(
    service: web::Data<RewardService>,
    req: HttpRequest,
) -> Result<HttpResponse> {
    let user_id = get_user_id_from_request(&req).unwrap_or(0);
    let username = get_username_from_request(&req);
    match service.claim_bonus(user_id, username.as_deref()).await {
        Ok(result) => Ok(HttpResponse::Ok().json(json!({ "success": true, "data": result }))),
        Err(e) => Ok(e.error_response()),
    }
}

/// 路由配置
pub fn search_config(cfg: &mut web::ServiceConfig) {
    cfg.route("/search", web::post().to(search))
        .service(web::scope("/bonus").route("/claim", web::post().to(claim_bonus)));
}
