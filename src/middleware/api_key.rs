//! API Key 认证中间件
//!
//! 通过 Header 中的 Authorization: Bearer <token> 进行认证，
//! 未配置 API Key 时全部放行，健康检查始终放行

use actix_web::{
    body::EitherBody,
    dev::{forward_ready, Service, ServiceRequest, ServiceResponse, Transform},
    Error, HttpResponse,
};
use futures::future::{ok, LocalBoxFuture, Ready};
use std::rc::Rc;

use crate::models::ApiResponse;

/// API Key 中间件
pub struct ApiKeyMiddleware {
    api_key: Rc<String>,
}

impl ApiKeyMiddleware {
    pub fn new(api_key: String) -> Self {
        Self {
            api_key: Rc::new(api_key),
        }
    }
}

/// 请求是否可以放行
fn is_authorized(api_key: &str, path: &str, authorization: Option<&str>) -> bool {
    if api_key.is_empty() || path.ends_with("/health") {
        return true;
    }
    authorization
        .and_then(|v| v.strip_prefix("Bearer "))
        .map(|token| token == api_key)
        .unwrap_or(false)
}

impl<S, B> Transform<S, ServiceRequest> for ApiKeyMiddleware
where
    S: Service<ServiceRequest, Response = ServiceResponse<B>, Error = Error> + 'static,
    B: 'static,
{
    type Response = ServiceResponse<EitherBody<B>>;
    type Error = Error;
    type Transform = ApiKeyMiddlewareService<S>;
    type InitError = ();
    type Future = Ready<Result<Self::Transform, Self::InitError>>;

    fn new_transform(&self, service: S) -> Self::Future {
        ok(ApiKeyMiddlewareService {
            service: Rc::new(service),
            api_key: self.api_key.clone(),
        })
    }
}

pub struct ApiKeyMiddlewareService<S> {
    service: Rc<S>,
    api_key: Rc<String>,
}

impl<S, B> Service<ServiceRequest> for ApiKeyMiddlewareService<S>
where
    S: Service<ServiceRequest, Response = ServiceResponse<B>, Error = Error> + 'static,
    B: 'static,
{
    type Response = ServiceResponse<EitherBody<B>>;
    type Error = Error;
    type Future = LocalBoxFuture<'static, Result<Self::Response, Self::Error>>;

    forward_ready!(service);

    fn call(&self, req: ServiceRequest) -> Self::Future {
        let service = self.service.clone();
        let authorized = is_authorized(
            &self.api_key,
            req.path(),
            req.headers().get("Authorization").and_then(|v| v.to_str().ok()),
        );

        Box::pin(async move {
            if authorized {
                let res = service.call(req).await?;
                return Ok(res.map_into_left_body());
            }

            log::warn!("拒绝未认证请求: {}", req.path());
            let response = HttpResponse::Unauthorized().json(ApiResponse::<()>::error("无效的 Bearer Token"));
            Ok(req.into_response(response).map_into_right_body())
        })
    }
}
