use crate::handlers::get_user_id_from_request;
use crate::services::AutoSearchService;
use actix_web::{HttpRequest, HttpResponse, ResponseError, Result, web};
use serde_json::json;

#[utoipa::path(
    post,
    path = "/api/v1/autosearch/enable",
    tag = "autosearch",
    security(
        ("telegram_id" = [])
    ),
    responses(
        (status = 200, description = "自动搜索已开启", body = crate::models::AutoSearchStatusResponse),
        (status = 403, description = "需要有效的 VIP 特权")
    )
)]
/// 开启自动搜索循环 (需要 VIP 及以上)
pub async fn enable(service: web::Data<AutoSearchService>, req: HttpRequest) -> Result<HttpResponse> {
    let user_id = get_user_id_from_request(&req).unwrap_or(0);
    match service.enable(user_id).await {
        Ok(status) => Ok(HttpResponse::Ok().json(json!({ "success": true, "data": status }))),
        Err(e) => Ok(e.error_response()),
    }
}

#[utoipa::path(
    post,
    path = "/api/v1/autosearch/disable",
    tag = "autosearch",
    security(
        ("telegram_id" = [])
    ),
    responses(
        (status = 200, description = "自动搜索已关闭", body = crate::models::AutoSearchStatusResponse)
    )
)]
/// 关闭自动搜索; 正在跑的循环在下一个 tick 协作式退出
pub async fn disable(
    service: web::Data<AutoSearchService>,
    req: HttpRequest,
) -> Result<HttpResponse> {
    let user_id = get_user_id_from_request(&req).unwrap_or(0);
    match service.disable(user_id).await {
        Ok(status) => Ok(HttpResponse::Ok().json(json!({ "success": true, "data": status }))),
        Err(e) => Ok(e.error_response()),
    }
}

#[utoipa::path(
    get,
    path = "/api/v1/autosearch/status",
    tag = "autosearch",
    security(
        ("telegram_id" = [])
    ),
    responses(
        (status = 200, description = "当前自动搜索状态", body = crate::models::AutoSearchStatusResponse)
    )
)]
/// 查询自动搜索状态 (配额 / 窗口 / 循环是否存活)
pub async fn status(service: web::Data<AutoSearchService>, req: HttpRequest) -> Result<HttpResponse> {
    let user_id = get_user_id_from_request(&req).unwrap_or(0);
    match service.status(user_id).await {
        Ok(status) => Ok(HttpResponse::Ok().json(json!({ "success": true, "data": status }))),
        Err(e) => Ok(e.error_response()),
    }
}

/// 路由配置
pub fn autosearch_config(cfg: &mut web::ServiceConfig) {
    cfg.service(
        web::scope("/autosearch")
            .route("/enable", web::post().to(enable))
            .route("/disable", web::post().to(disable))
            .route("/status", web::get().to(status)),
    );
}
