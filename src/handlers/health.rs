use actix_web::{web, HttpResponse, Result};

use crate::models::ApiResponse;
use crate::state::AppState;

pub async fn health_check(state: web::Data<AppState>) -> Result<HttpResponse> {
    if state.shutdown.is_cancelled() {
        return Ok(HttpResponse::ServiceUnavailable().json(ApiResponse::<&str>::error("Service is shutting down")));
    }
    Ok(HttpResponse::Ok().json(ApiResponse::success("Service is healthy")))
}

pub fn config(cfg: &mut web::ServiceConfig) {
    cfg.route("/health", web::get().to(health_check));
}
