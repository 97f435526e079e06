use crate::handlers::get_user_id_from_request;
use crate::models::*;
use crate::services::{ItemService, PlayerService, PurchaseService};
use actix_web::{HttpRequest, HttpResponse, ResponseError, Result, web};
use chrono::{Duration, Utc};
use serde_json::json;

#[utoipa::path(
    post,
    path = "/api/v1/admin/items/{id}/approve",
    tag = "admin",
    params(
        ("id" = i64, Path, description = "物品 id")
    ),
    security(
        ("telegram_id" = [])
    ),
    responses(
        (status = 200, description = "审核通过, 进入掉落池", body = ItemResponse),
        (status = 404, description = "物品不存在")
    )
)]
/// 审核通过社区投稿
pub async fn approve_item(
    service: web::Data<ItemService>,
    path: web::Path<i64>,
) -> Result<HttpResponse> {
    match service.admin_approve(path.into_inner()).await {
        Ok(item) => Ok(HttpResponse::Ok().json(json!({ "success": true, "data": item }))),
        Err(e) => Ok(e.error_response()),
    }
}

#[utoipa::path(
    delete,
    path = "/api/v1/admin/items/{id}",
    tag = "admin",
    params(
        ("id" = i64, Path, description = "物品 id")
    ),
    security(
        ("telegram_id" = [])
    ),
    responses(
        (status = 200, description = "物品已删除"),
        (status = 404, description = "物品不存在")
    )
)]
/// 删除图鉴条目 (背包行级联清理)
pub async fn delete_item(
    service: web::Data<ItemService>,
    path: web::Path<i64>,
) -> Result<HttpResponse> {
    match service.admin_delete(path.into_inner()).await {
        Ok(()) => Ok(HttpResponse::Ok().json(json!({ "success": true, "data": null }))),
        Err(e) => Ok(e.error_response()),
    }
}

#[utoipa::path(
    post,
    path = "/api/v1/admin/stock",
    tag = "admin",
    security(
        ("telegram_id" = [])
    ),
    request_body = SetStockRequest,
    responses(
        (status = 200, description = "库存已更新"),
        (status = 400, description = "库存不能为负")
    )
)]
/// 补货 / 置量
pub async fn set_stock(
    service: web::Data<PurchaseService>,
    body: web::Json<SetStockRequest>,
) -> Result<HttpResponse> {
    let request = body.into_inner();
    match service.admin_set_stock(&request.kind, request.stock).await {
        Ok(stock) => Ok(HttpResponse::Ok()
            .json(json!({ "success": true, "data": { "kind": request.kind, "stock": stock } }))),
        Err(e) => Ok(e.error_response()),
    }
}

#[utoipa::path(
    post,
    path = "/api/v1/admin/grant-coins",
    tag = "admin",
    security(
        ("telegram_id" = [])
    ),
    request_body = GrantCoinsRequest,
    responses(
        (status = 200, description = "发放成功"),
        (status = 400, description = "扣罚超过现有余额"),
        (status = 404, description = "玩家不存在")
    )
)]
/// 发放 / 扣罚金币 (余额不会被扣成负数)
pub async fn grant_coins(
    service: web::Data<PlayerService>,
    body: web::Json<GrantCoinsRequest>,
) -> Result<HttpResponse> {
    let request = body.into_inner();
    match service
        .admin_adjust_coins(request.user_id, request.amount)
        .await
    {
        Ok(balance) => {
            Ok(HttpResponse::Ok().json(json!({ "success": true, "data": { "balance": balance } })))
        }
        Err(e) => Ok(e.error_response()),
    }
}

#[utoipa::path(
    post,
    path = "/api/v1/admin/grant-boost",
    tag = "admin",
    security(
        ("telegram_id" = [])
    ),
    request_body = GrantBoostRequest,
    responses(
        (status = 200, description = "临时配额加成已发放"),
        (status = 404, description = "玩家不存在")
    )
)]
/// 发放临时自动搜索配额加成
pub async fn grant_boost(
    service: web::Data<PlayerService>,
    body: web::Json<GrantBoostRequest>,
) -> Result<HttpResponse> {
    let request = body.into_inner();
    let until = Utc::now() + Duration::seconds(request.duration_secs);
    match service
        .grant_quota_boost(request.user_id, request.amount, until)
        .await
    {
        Ok(()) => Ok(HttpResponse::Ok().json(json!({ "success": true, "data": { "until": until } }))),
        Err(e) => Ok(e.error_response()),
    }
}

#[utoipa::path(
    post,
    path = "/api/v1/admin/receipts/{id}/verify",
    tag = "admin",
    params(
        ("id" = i64, Path, description = "凭证 id")
    ),
    security(
        ("telegram_id" = [])
    ),
    responses(
        (status = 200, description = "凭证已核销", body = ReceiptResponse),
        (status = 400, description = "凭证状态不允许核销"),
        (status = 404, description = "凭证不存在")
    )
)]
/// 核销购买凭证 (completed -> verified)
pub async fn verify_receipt(
    service: web::Data<PurchaseService>,
    req: HttpRequest,
    path: web::Path<i64>,
) -> Result<HttpResponse> {
    let admin_id = get_user_id_from_request(&req).unwrap_or(0);
    match service.verify_receipt(path.into_inner(), admin_id).await {
        Ok(receipt) => Ok(HttpResponse::Ok().json(json!({ "success": true, "data": receipt }))),
        Err(e) => Ok(e.error_response()),
    }
}

#[utoipa::path(
    get,
    path = "/api/v1/admin/receipts",
    tag = "admin",
    params(
        ("page" = Option<u32>, Query, description = "页码 (默认1)"),
        ("per_page" = Option<u32>, Query, description = "每页数量 (默认20)")
    ),
    security(
        ("telegram_id" = [])
    ),
    responses(
        (status = 200, description = "全量凭证分页", body = PaginatedReceipts)
    )
)]
/// 分页查看所有玩家的购买凭证 (倒序)
pub async fn list_receipts(
    service: web::Data<PurchaseService>,
    query: web::Query<PaginationParams>,
) -> Result<HttpResponse> {
    match service.list_all_receipts(&query.into_inner()).await {
        Ok(page) => Ok(HttpResponse::Ok().json(json!({ "success": true, "data": page }))),
        Err(e) => Ok(e.error_response()),
    }
}

/// 路由配置
pub fn admin_config(cfg: &mut web::ServiceConfig) {
    cfg.service(
        web::scope("/admin")
            .route("/items/{id}/approve", web::post().to(approve_item))
            .route("/items/{id}", web::delete().to(delete_item))
            .route("/stock", web::post().to(set_stock))
            .route("/grant-coins", web::post().to(grant_coins))
            .route("/grant-boost", web::post().to(grant_boost))
            .route("/receipts/{id}/verify", web::post().to(verify_receipt))
            .route("/receipts", web::get().to(list_receipts)),
    );
}
