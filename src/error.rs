use actix_web::{HttpResponse, ResponseError};
use serde_json::json;
use thiserror::Error;

pub type AppResult<T> = Result<T, AppError>;

#[derive(Error, Debug)]
pub enum AppError {
    #[error("Database error: {0}")]
    DatabaseError(#[from] sea_orm::DbErr),

    #[error("Validation error: {0}")]
    ValidationError(String),

    #[error("Auth error: {0}")]
    AuthError(String),

    #[error("Not found: {0}")]
    NotFound(String),

    #[error("Permission denied: {0}")]
    PermissionDenied(String),

    #[error("Config error: {0}")]
    ConfigError(String),

    #[error("Internal server error: {0}")]
    InternalError(String),

    #[error("Cooldown active: {seconds_remaining}s remaining")]
    CooldownActive { seconds_remaining: i64 },

    #[error("Insufficient funds: required {required}, available {available}")]
    InsufficientFunds { required: i64, available: i64 },

    #[error("Out of stock: {kind}")]
    OutOfStock { kind: String },

    #[error("No items available to find")]
    EmptyCatalog,

    #[error("A request for this action is already in flight")]
    DuplicateRequest,

    #[error("This offer is not addressed to you")]
    OfferMismatch,

    #[error("JSON serialization/deserialization error: {0}")]
    SerdeJsonError(#[from] serde_json::Error),
}

impl ResponseError for AppError {
    /// 业务拒绝 (冷却/余额不足/缺货等) 必须携带结构化 details,
    /// 前端据此渲染精确提示, 不允许裸 "failed"
    fn error_response(&self) -> HttpResponse {
        let (status_code, error_code, message, details) = match self {
            AppError::ValidationError(msg) => {
                log::warn!("Validation error: {msg}");
                (
                    actix_web::http::StatusCode::BAD_REQUEST,
                    "VALIDATION_ERROR",
                    msg.clone(),
                    None,
                )
            }
            AppError::AuthError(msg) => {
                log::warn!("Authentication error: {msg}");
                (
                    actix_web::http::StatusCode::UNAUTHORIZED,
                    "AUTH_ERROR",
                    msg.clone(),
                    None,
                )
            }
            AppError::NotFound(msg) => (
                actix_web::http::StatusCode::NOT_FOUND,
                "NOT_FOUND",
                msg.clone(),
                None,
            ),
            AppError::PermissionDenied(msg) => {
                log::warn!("Permission denied: {msg}");
                (
                    actix_web::http::StatusCode::FORBIDDEN,
                    "FORBIDDEN",
                    msg.clone(),
                    None,
                )
            }
            AppError::CooldownActive { seconds_remaining } => (
                actix_web::http::StatusCode::TOO_MANY_REQUESTS,
                "COOLDOWN_ACTIVE",
                self.to_string(),
                Some(json!({ "seconds_remaining": seconds_remaining })),
            ),
            AppError::InsufficientFunds {
                required,
                available,
            } => (
                actix_web::http::StatusCode::PAYMENT_REQUIRED,
                "INSUFFICIENT_FUNDS",
                self.to_string(),
                Some(json!({ "required": required, "available": available })),
            ),
            AppError::OutOfStock { kind } => (
                actix_web::http::StatusCode::CONFLICT,
                "OUT_OF_STOCK",
                self.to_string(),
                Some(json!({ "kind": kind })),
            ),
            AppError::EmptyCatalog => (
                actix_web::http::StatusCode::NOT_FOUND,
                "EMPTY_CATALOG",
                self.to_string(),
                None,
            ),
            AppError::DuplicateRequest => (
                actix_web::http::StatusCode::CONFLICT,
                "DUPLICATE_REQUEST",
                self.to_string(),
                None,
            ),
            AppError::OfferMismatch => (
                actix_web::http::StatusCode::FORBIDDEN,
                "OFFER_MISMATCH",
                self.to_string(),
                None,
            ),
            AppError::DatabaseError(err) => {
                log::error!("Database error: {err}");
                (
                    actix_web::http::StatusCode::INTERNAL_SERVER_ERROR,
                    "DATABASE_ERROR",
                    "Database error".to_string(),
                    None,
                )
            }
            _ => {
                log::error!("Internal error: {self}");
                (
                    actix_web::http::StatusCode::INTERNAL_SERVER_ERROR,
                    "INTERNAL_ERROR",
                    "Internal server error".to_string(),
                    None,
                )
            }
        };

        let mut error_body = json!({
            "code": error_code,
            "message": message
        });
        if let Some(details) = details {
            error_body["details"] = details;
        }

        HttpResponse::build(status_code).json(json!({
            "success": false,
            "error": error_body
        }))
    }
}
