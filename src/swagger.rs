use actix_web::web;
use utoipa::OpenApi;
use utoipa::{
    Modify,
    openapi::security::{ApiKey, ApiKeyValue, SecurityScheme},
};
use utoipa_swagger_ui::SwaggerUi;

use crate::handlers;
use crate::models::*;

struct SecurityAddon;

impl Modify for SecurityAddon {
    fn modify(&self, openapi: &mut utoipa::openapi::OpenApi) {
        let components = openapi.components.as_mut().unwrap();
        components.add_security_scheme(
            "telegram_id",
            SecurityScheme::ApiKey(ApiKey::Header(ApiKeyValue::new("X-Telegram-User-Id"))),
        )
    }
}

#[derive(OpenApi)]
#[openapi(
    paths(
        handlers::search::search,
        handlers::search::claim_bonus,
        handlers::player::get_profile,
        handlers::player::update_profile,
        handlers::player::wipe_account,
        handlers::inventory::get_inventory,
        handlers::inventory::sell,
        handlers::shop::get_plans,
        handlers::shop::purchase,
        handlers::shop::get_receipts,
        handlers::autosearch::enable,
        handlers::autosearch::disable,
        handlers::autosearch::status,
        handlers::gift::create_gift,
        handlers::gift::accept_gift,
        handlers::gift::decline_gift,
        handlers::gift::incoming_gifts,
        handlers::items::get_items,
        handlers::items::submit_item,
        handlers::admin::approve_item,
        handlers::admin::delete_item,
        handlers::admin::set_stock,
        handlers::admin::grant_coins,
        handlers::admin::grant_boost,
        handlers::admin::verify_receipt,
        handlers::admin::list_receipts,
    ),
    components(
        schemas(
            RarityTier,
            VipTier,
            PlayerResponse,
            UpdatePlayerRequest,
            ItemResponse,
            SubmitItemRequest,
            SearchResponse,
            BonusResponse,
            InventoryLineResponse,
            SellRequest,
            SellResponse,
            ShopPlan,
            PurchaseRequest,
            PurchaseResponse,
            ReceiptResponse,
            AutoSearchStatusResponse,
            CreateGiftRequest,
            GiftOfferResponse,
            SetStockRequest,
            GrantCoinsRequest,
            GrantBoostRequest,
            PaginationParams,
            PaginationInfo,
            PaginatedReceipts,
            ApiError,
        )
    ),
    modifiers(&SecurityAddon),
    tags(
        (name = "search", description = "Search and daily bonus API"),
        (name = "player", description = "Player profile API"),
        (name = "inventory", description = "Inventory API"),
        (name = "shop", description = "Shop and receipts API"),
        (name = "autosearch", description = "Auto-search scheduler API"),
        (name = "gift", description = "Gift offer API"),
        (name = "items", description = "Drink catalog API"),
        (name = "admin", description = "Admin API"),
    ),
    info(
        title = "eDrink Backend API",
        version = "1.0.0",
        description = "Energy drink collection game REST API documentation"
    ),
    servers(
        (url = "/", description = "Local server")
    )
)]
pub struct ApiDoc;

pub fn swagger_config(cfg: &mut web::ServiceConfig) {
    cfg.service(
        SwaggerUi::new("/swagger-ui/{_:.*}").url("/api-docs/openapi.json", ApiDoc::openapi()),
    )
    .route(
        "/swagger-ui",
        web::get().to(|| async {
            actix_web::HttpResponse::Found()
                .append_header(("Location", "/swagger-ui/"))
                .finish()
        }),
    );
}
