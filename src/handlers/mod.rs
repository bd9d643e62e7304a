pub mod health;
pub mod index;
pub mod quotes;

use actix_web::{web, HttpResponse};

use crate::models::ApiResponse;
use crate::services::error::FetchError;

pub fn config(cfg: &mut web::ServiceConfig) {
    cfg.service(
        web::scope("/api/v1")
            .configure(health::config)
            .configure(quotes::config)
            .configure(index::config),
    );
}

/// 抓取错误转 HTTP 响应：上游问题返回 502，服务关闭中返回 503
pub(crate) fn fetch_error_response<T: serde::Serialize>(e: &FetchError) -> HttpResponse {
    let body = ApiResponse::<T>::error(e.to_string());
    match e {
        FetchError::Exhausted { .. } | FetchError::Network(_) | FetchError::Status(_) | FetchError::EmptyStream => {
            HttpResponse::BadGateway().json(body)
        }
        FetchError::Cancelled => HttpResponse::ServiceUnavailable().json(body),
        FetchError::Malformed(_) | FetchError::InvalidUrl(_) => HttpResponse::InternalServerError().json(body),
    }
}
