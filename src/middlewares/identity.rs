use crate::error::AppError;
use actix_web::http::Method;
use actix_web::{
    Error, HttpMessage,
    dev::{Service, ServiceRequest, ServiceResponse, Transform, forward_ready},
};
use futures_util::future::LocalBoxFuture;
use std::future::{Ready, ready};

// 公开路径配置
struct PublicPaths {
    exact_paths: Vec<&'static str>,
    prefix_paths: Vec<&'static str>,
}

impl PublicPaths {
    fn new() -> Self {
        Self {
            // 完全匹配的公开路径
            exact_paths: vec!["/swagger-ui", "/swagger-ui/", "/api-docs/openapi.json"],
            // 前缀匹配的公开路径
            prefix_paths: vec!["/swagger-ui/", "/api-docs/"],
        }
    }

    fn is_public_path(&self, path: &str) -> bool {
        if self.exact_paths.contains(&path) {
            return true;
        }
        self.prefix_paths
            .iter()
            .any(|&prefix| path.starts_with(prefix))
    }
}

/// 身份中间件
///
/// Telegram 适配层是唯一的上游调用方, 负责把真实 user id 放进
/// `X-Telegram-User-Id` 头; 这里校验数字格式后注入请求扩展。
/// `/api/v1/admin` 前缀额外要求该 id 在配置的管理员白名单里。
pub struct IdentityMiddleware {
    admin_ids: Vec<i64>,
}

impl IdentityMiddleware {
    pub fn new(admin_ids: Vec<i64>) -> Self {
        Self { admin_ids }
    }
}

impl<S, B> Transform<S, ServiceRequest> for IdentityMiddleware
where
    S: Service<ServiceRequest, Response = ServiceResponse<B>, Error = Error>,
    S::Future: 'static,
    B: 'static,
{
    type Response = ServiceResponse<B>;
    type Error = Error;
    type InitError = ();
    type Transform = IdentityMiddlewareService<S>;
    type Future = Ready<Result<Self::Transform, Self::InitError>>;

    fn new_transform(&self, service: S) -> Self::Future {
        ready(Ok(IdentityMiddlewareService {
            service,
            admin_ids: self.admin_ids.clone(),
            public_paths: PublicPaths::new(),
        }))
    }
}

pub struct IdentityMiddlewareService<S> {
    service: S,
    admin_ids: Vec<i64>,
    public_paths: PublicPaths,
}

impl<S, B> Service<ServiceRequest> for IdentityMiddlewareService<S>
where
    S: Service<ServiceRequest, Response = ServiceResponse<B>, Error = Error>,
    S::Future: 'static,
    B: 'static,
{
    type Response = ServiceResponse<B>;
    type Error = Error;
    type Future = LocalBoxFuture<'static, Result<Self::Response, Self::Error>>;

    forward_ready!(service);

    fn call(&self, req: ServiceRequest) -> Self::Future {
        // 放行所有 CORS 预检请求
        if req.method() == Method::OPTIONS {
            let fut = self.service.call(req);
            return Box::pin(fut);
        }

        let path = req.path();
        if self.public_paths.is_public_path(path) {
            let fut = self.service.call(req);
            return Box::pin(fut);
        }

        let user_id = req
            .headers()
            .get("X-Telegram-User-Id")
            .and_then(|value| value.to_str().ok())
            .and_then(|value| value.parse::<i64>().ok())
            .filter(|id| *id > 0);

        let user_id = match user_id {
            Some(id) => id,
            None => {
                let error =
                    AppError::AuthError("Missing or invalid X-Telegram-User-Id header".to_string());
                return Box::pin(async move { Err(error.into()) });
            }
        };

        if path.starts_with("/api/v1/admin") && !self.admin_ids.contains(&user_id) {
            let error = AppError::PermissionDenied("Admin access required".to_string());
            return Box::pin(async move { Err(error.into()) });
        }

        // 将用户ID添加到请求扩展中
        req.extensions_mut().insert(user_id);
        let fut = self.service.call(req);
        Box::pin(fut)
    }
}
