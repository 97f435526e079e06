use crate::handlers::get_user_id_from_request;
use crate::models::*;
use crate::services::PurchaseService;
use actix_web::{HttpRequest, HttpResponse, ResponseError, Result, web};
use serde_json::json;

#[utoipa::path(
    get,
    path = "/api/v1/shop/plans",
    tag = "shop",
    security(
        ("telegram_id" = [])
    ),
    responses(
        (status = 200, description = "获取价目表成功", body = [ShopPlan])
    )
)]
/// 商店价目表 (VIP / VIP+ / premium)
pub async fn get_plans() -> Result<HttpResponse> {
    let plans = PurchaseService::plan_catalog();
    Ok(HttpResponse::Ok().json(json!({ "success": true, "data": plans })))
}

#[utoipa::path(
    post,
    path = "/api/v1/shop/purchase",
    tag = "shop",
    security(
        ("telegram_id" = [])
    ),
    request_body = PurchaseRequest,
    responses(
        (status = 200, description = "购买成功", body = PurchaseResponse),
        (status = 402, description = "余额不足, details 携带所需/现有金额"),
        (status = 409, description = "限量档位已售罄")
    )
)]
/// 购买特权:
/// 限量档位先原子扣库存再扣款, 售罄与余额不足都整体回滚
pub async fn purchase(
    service: web::Data<PurchaseService>,
    req: HttpRequest,
    body: web::Json<PurchaseRequest>,
) -> Result<HttpResponse> {
    let user_id = get_user_id_from_request(&req).unwrap_or(0);
    let request = body.into_inner();
    match service.purchase(user_id, request.kind, request.days).await {
        Ok(result) => Ok(HttpResponse::Ok().json(json!({ "success": true, "data": result }))),
        Err(e) => Ok(e.error_response()),
    }
}

#[utoipa::path(
    get,
    path = "/api/v1/receipts",
    tag = "shop",
    security(
        ("telegram_id" = [])
    ),
    responses(
        (status = 200, description = "获取购买凭证成功", body = [ReceiptResponse])
    )
)]
/// 自己的购买凭证, 新的在前
pub async fn get_receipts(
    service: web::Data<PurchaseService>,
    req: HttpRequest,
) -> Result<HttpResponse> {
    let user_id = get_user_id_from_request(&req).unwrap_or(0);
    match service.list_receipts(user_id).await {
        Ok(list) => Ok(HttpResponse::Ok().json(json!({ "success": true, "data": list }))),
        Err(e) => Ok(e.error_response()),
    }
}

/// 路由配置
pub fn shop_config(cfg: &mut web::ServiceConfig) {
    cfg.service(
        web::scope("/shop")
            .route("/plans", web::get().to(get_plans))
            .route("/purchase", web::post().to(purchase)),
    )
    .route("/receipts", web::get().to(get_receipts));
}
