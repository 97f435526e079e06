use crate::handlers::get_user_id_from_request;
use crate::models::*;
use crate::services::InventoryService;
use actix_web::{HttpRequest, HttpResponse, ResponseError, Result, web};
use serde_json::json;

#[utoipa::path(
    get,
    path = "/api/v1/inventory",
    tag = "inventory",
    security(
        ("telegram_id" = [])
    ),
    responses(
        (status = 200, description = "获取背包成功", body = [InventoryLineResponse])
    )
)]
/// 背包列表, 高稀有度在前
pub async fn get_inventory(
    service: web::Data<InventoryService>,
    req: HttpRequest,
) -> Result<HttpResponse> {
    let user_id = get_user_id_from_request(&req).unwrap_or(0);
    match service.list(user_id).await {
        Ok(list) => Ok(HttpResponse::Ok().json(json!({ "success": true, "data": list }))),
        Err(e) => Ok(e.error_response()),
    }
}

#[utoipa::path(
    post,
    path = "/api/v1/inventory/sell",
    tag = "inventory",
    security(
        ("telegram_id" = [])
    ),
    request_body = SellRequest,
    responses(
        (status = 200, description = "出售成功", body = SellResponse),
        (status = 400, description = "数量不足或参数非法"),
        (status = 404, description = "未持有该物品")
    )
)]
/// 出售背包物品, 按稀有度定价入账
pub async fn sell(
    service: web::Data<InventoryService>,
    req: HttpRequest,
    body: web::Json<SellRequest>,
) -> Result<HttpResponse> {
    let user_id = get_user_id_from_request(&req).unwrap_or(0);
    let request = body.into_inner();
    let quantity = request.quantity.unwrap_or(1);
    match service
        .sell(user_id, request.item_id, request.rarity, quantity)
        .await
    {
        Ok(result) => Ok(HttpResponse::Ok().json(json!({ "success": true, "data": result }))),
        Err(e) => Ok(e.error_response()),
    }
}

/// 路由配置
pub fn inventory_config(cfg: &mut web::ServiceConfig) {
    cfg.service(
        web::scope("/inventory")
            .route("", web::get().to(get_inventory))
            .route("/sell", web::post().to(sell)),
    );
}
