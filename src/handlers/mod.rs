pub mod admin;
pub mod autosearch;
pub mod gift;
pub mod inventory;
pub mod items;
pub mod player;
pub mod search;
pub mod shop;

pub use admin::admin_config;
pub use autosearch::autosearch_config;
pub use gift::gift_config;
pub use inventory::inventory_config;
pub use items::items_config;
pub use player::player_config;
pub use search::search_config;
pub use shop::shop_config;

use actix_web::{HttpMessage, HttpRequest};

/// 从请求扩展中获取用户ID (中间件校验头部后注入)
pub fn get_user_id_from_request(req: &HttpRequest) -> Option<i64> {
    req.extensions().get::<i64>().copied()
}

/// 可选的用户名头部, 适配层在平台侧拿得到用户名时附带, 用于懒同步
pub fn get_username_from_request(req: &HttpRequest) -> Option<String> {
    req.headers()
        .get("X-Telegram-Username")
        .and_then(|value| value.to_str().ok())
        .map(|value| value.trim().to_string())
        .filter(|value| !value.is_empty())
}

#[cfg(test)]
mod tests {
    use super::*;
    use actix_web::test::TestRequest;

    #[test]
    fn test_username_header_is_optional_and_trimmed() {
        let req = TestRequest::default()
            .insert_header(("X-Telegram-Username", "  dovahkiin  "))
            .to_http_request();
        assert_eq!(get_username_from_request(&req).as_deref(), Some("dovahkiin"));

        let req = TestRequest::default().to_http_request();
        assert_eq!(get_username_from_request(&req), None);

        let req = TestRequest::default()
            .insert_header(("X-Telegram-Username", "   "))
            .to_http_request();
        assert_eq!(get_username_from_request(&req), None);
    }
}
