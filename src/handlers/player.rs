use crate::config::Config;
use crate::handlers::{get_user_id_from_request, get_username_from_request};
use crate::models::*;
use crate::services::PlayerService;
use crate::utils::check_cooldown;
use actix_web::{HttpRequest, HttpResponse, ResponseError, Result, web};
use chrono::Utc;
use serde_json::json;

/// 把冷却剩余秒数回填进玩家档案响应
fn with_cooldowns(
    player: crate::entities::player_entity::Model,
    config: &Config,
) -> PlayerResponse {
    let now = Utc::now();
    let multiplier = player.vip_tier(now).cooldown_multiplier();
    let search_remaining = check_cooldown(
        player.last_search_at,
        config.game.search_cooldown_secs,
        multiplier,
        now,
    )
    .seconds_remaining();
    let bonus_remaining = check_cooldown(
        player.last_bonus_at,
        config.game.bonus_cooldown_secs,
        multiplier,
        now,
    )
    .seconds_remaining();

    let mut response = PlayerResponse::from(player);
    response.search_cooldown_remaining = search_remaining;
    response.bonus_cooldown_remaining = bonus_remaining;
    response
}

#[utoipa::path(
    get,
    path = "/api/v1/players/me",
    tag = "player",
    security(
        ("telegram_id" = [])
    ),
    responses(
        (status = 200, description = "获取玩家档案成功", body = PlayerResponse)
    )
)]
/// 获取自己的档案 (首次调用时懒创建)
pub async fn get_profile(
    service: web::Data<PlayerService>,
    config: web::Data<Config>,
    req: HttpRequest,
) -> Result<HttpResponse> {
    let user_id = get_user_id_from_request(&req).unwrap_or(0);
    let username = get_username_from_request(&req);
    match service.get_or_create(user_id, username.as_deref()).await {
        Ok(player) => {
            let data = with_cooldowns(player, &config);
            Ok(HttpResponse::Ok().json(json!({ "success": true, "data": data })))
        }
        Err(e) => Ok(e.error_response()),
    }
}

#[utoipa::path(
    put,
    path = "/api/v1/players/me",
    tag = "player",
    security(
        ("telegram_id" = [])
    ),
    request_body = UpdatePlayerRequest,
    responses(
        (status = 200, description = "更新档案成功", body = PlayerResponse),
        (status = 400, description = "参数校验失败")
    )
)]
/// 更新用户名 / 语言 / 提醒开关
pub async fn update_profile(
    service: web::Data<PlayerService>,
    config: web::Data<Config>,
    req: HttpRequest,
    body: web::Json<UpdatePlayerRequest>,
) -> Result<HttpResponse> {
    let user_id = get_user_id_from_request(&req).unwrap_or(0);
    match service.update_profile(user_id, body.into_inner()).await {
        Ok(player) => {
            let data = with_cooldowns(player, &config);
            Ok(HttpResponse::Ok().json(json!({ "success": true, "data": data })))
        }
        Err(e) => Ok(e.error_response()),
    }
}

#[utoipa::path(
    delete,
    path = "/api/v1/players/me",
    tag = "player",
    security(
        ("telegram_id" = [])
    ),
    responses(
        (status = 200, description = "账号数据已抹除"),
        (status = 404, description = "玩家不存在")
    )
)]
/// 数据抹除: 背包 + 凭证 + 玩家行一并删除
pub async fn wipe_account(
    service: web::Data<PlayerService>,
    req: HttpRequest,
) -> Result<HttpResponse> {
    let user_id = get_user_id_from_request(&req).unwrap_or(0);
    match service.wipe(user_id).await {
        Ok(()) => Ok(HttpResponse::Ok().json(json!({ "success": true, "data": null }))),
        Err(e) => Ok(e.error_response()),
    }
}

/// 路由配置
pub fn player_config(cfg: &mut web::ServiceConfig) {
    cfg.service(
        web::scope("/players")
            .route("/me", web::get().to(get_profile))
            .route("/me", web::put().to(update_profile))
            .route("/me", web::delete().to(wipe_account)),
    );
}
