use crate::handlers::get_user_id_from_request;
use crate::models::*;
use crate::services::ItemService;
use actix_web::{HttpRequest, HttpResponse, ResponseError, Result, web};
use serde_json::json;

#[utoipa::path(
    get,
    path = "/api/v1/items",
    tag = "items",
    security(
        ("telegram_id" = [])
    ),
    responses(
        (status = 200, description = "图鉴列表", body = [ItemResponse])
    )
)]
/// 完整图鉴 (含未过审的投稿)
pub async fn get_items(service: web::Data<ItemService>) -> Result<HttpResponse> {
    match service.list().await {
        Ok(list) => Ok(HttpResponse::Ok().json(json!({ "success": true, "data": list }))),
        Err(e) => Ok(e.error_response()),
    }
}

#[utoipa::path(
    post,
    path = "/api/v1/items/submit",
    tag = "items",
    security(
        ("telegram_id" = [])
    ),
    request_body = SubmitItemRequest,
    responses(
        (status = 200, description = "投稿成功, 待审核", body = ItemResponse),
        (status = 400, description = "名称重复或参数非法"),
        (status = 429, description = "投稿冷却未结束")
    )
)]
/// 社区投稿新饮料; 过审前不参与掉落
pub async fn submit_item(
    service: web::Data<ItemService>,
    req: HttpRequest,
    body: web::Json<SubmitItemRequest>,
) -> Result<HttpResponse> {
    let user_id = get_user_id_from_request(&req).unwrap_or(0);
    match service.submit(user_id, &body.into_inner()).await {
        Ok(item) => Ok(HttpResponse::Ok().json(json!({ "success": true, "data": item }))),
        Err(e) => Ok(e.error_response()),
    }
}

/// 路由配置
pub fn items_config(cfg: &mut web::ServiceConfig) {
    cfg.service(
        web::scope("/items")
            .route("", web::get().to(get_items))
            .route("/submit", web::post().to(submit_item)),
    );
}
