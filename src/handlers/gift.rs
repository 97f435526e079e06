use crate::handlers::get_user_id_from_request;
use crate::models::*;
use crate::services::GiftService;
use actix_web::{HttpRequest, HttpResponse, ResponseError, Result, web};
use serde_json::json;
use uuid::Uuid;

#[utoipa::path(
    post,
    path = "/api/v1/gifts",
    tag = "gift",
    security(
        ("telegram_id" = [])
    ),
    request_body = CreateGiftRequest,
    responses(
        (status = 200, description = "要约已创建", body = GiftOfferResponse),
        (status = 400, description = "受赠人参数缺失或赠给自己"),
        (status = 404, description = "受赠人或物品不存在")
    )
)]
/// 创建赠礼要约, 1 小时内有效; 物品在对方接受时才转移
pub async fn create_gift(
    service: web::Data<GiftService>,
    req: HttpRequest,
    body: web::Json<CreateGiftRequest>,
) -> Result<HttpResponse> {
    let user_id = get_user_id_from_request(&req).unwrap_or(0);
    match service.create_offer(user_id, &body.into_inner()).await {
        Ok(offer) => Ok(HttpResponse::Ok().json(json!({ "success": true, "data": offer }))),
        Err(e) => Ok(e.error_response()),
    }
}

#[utoipa::path(
    post,
    path = "/api/v1/gifts/{token}/accept",
    tag = "gift",
    params(
        ("token" = Uuid, Path, description = "要约 token")
    ),
    security(
        ("telegram_id" = [])
    ),
    responses(
        (status = 200, description = "接受成功, 物品已入包", body = GiftOfferResponse),
        (status = 403, description = "不是你的要约"),
        (status = 404, description = "要约已过期或赠送方已无此物品")
    )
)]
/// 接受赠礼
pub async fn accept_gift(
    service: web::Data<GiftService>,
    req: HttpRequest,
    path: web::Path<Uuid>,
) -> Result<HttpResponse> {
    let user_id = get_user_id_from_request(&req).unwrap_or(0);
    match service.accept(path.into_inner(), user_id).await {
        Ok(offer) => Ok(HttpResponse::Ok().json(json!({ "success": true, "data": offer }))),
        Err(e) => Ok(e.error_response()),
    }
}

#[utoipa::path(
    post,
    path = "/api/v1/gifts/{token}/decline",
    tag = "gift",
    params(
        ("token" = Uuid, Path, description = "要约 token")
    ),
    security(
        ("telegram_id" = [])
    ),
    responses(
        (status = 200, description = "已拒绝"),
        (status = 403, description = "不是你的要约")
    )
)]
/// 拒绝赠礼, 物品留在赠送方
pub async fn decline_gift(
    service: web::Data<GiftService>,
    req: HttpRequest,
    path: web::Path<Uuid>,
) -> Result<HttpResponse> {
    let user_id = get_user_id_from_request(&req).unwrap_or(0);
    match service.decline(path.into_inner(), user_id).await {
        Ok(()) => Ok(HttpResponse::Ok().json(json!({ "success": true, "data": null }))),
        Err(e) => Ok(e.error_response()),
    }
}

#[utoipa::path(
    get,
    path = "/api/v1/gifts/incoming",
    tag = "gift",
    security(
        ("telegram_id" = [])
    ),
    responses(
        (status = 200, description = "待处理的要约列表", body = [GiftOfferResponse])
    )
)]
/// 我收到的待处理要约
pub async fn incoming_gifts(
    service: web::Data<GiftService>,
    req: HttpRequest,
) -> Result<HttpResponse> {
    let user_id = get_user_id_from_request(&req).unwrap_or(0);
    match service.incoming(user_id).await {
        Ok(list) => Ok(HttpResponse::Ok().json(json!({ "success": true, "data": list }))),
        Err(e) => Ok(e.error_response()),
    }
}

/// 路由配置
pub fn gift_config(cfg: &mut web::ServiceConfig) {
    cfg.service(
        web::scope("/gifts")
            .route("", web::post().to(create_gift))
            .route("/incoming", web::get().to(incoming_gifts))
            .route("/{token}/accept", web::post().to(accept_gift))
            .route("/{token}/decline", web::post().to(decline_gift)),
    );
}
