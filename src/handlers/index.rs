//! 指数历史接口处理器
//!
//! - GET /index/{code}/history?start=20250901&end=20250920 - 指数日线
//! - POST /index/ingest - 指数日线入库

use actix_web::{web, HttpResponse, Result};
use chrono::NaiveDate;

use crate::handlers::fetch_error_response;
use crate::models::{ApiResponse, DailyBar, HistoryQuery, IngestRequest, IngestSummary};
use crate::services::common::parse_compact_date;
use crate::services::error::FetchError;
use crate::services::history::HistorySource;
use crate::state::AppState;

/// 校验日期区间
fn date_range(start: &str, end: &str) -> anyhow::Result<(NaiveDate, NaiveDate)> {
    let start = parse_compact_date(start)?;
    let end = parse_compact_date(end)?;
    if start > end {
        anyhow::bail!("开始日期 {} 晚于结束日期 {}", start, end);
    }
    Ok((start, end))
}

/// 获取指数日线
///
/// GET /api/v1/index/{code}/history?start=20250901&end=20250920
///
/// 格式错误的交易日被跳过，数量写在 message 中
pub async fn get_index_history(
    state: web::Data<AppState>,
    path: web::Path<String>,
    query: web::Query<HistoryQuery>,
) -> Result<HttpResponse> {
    let code = path.into_inner();
    let (start, end) = match date_range(&query.start, &query.end) {
        Ok(range) => range,
        Err(e) => return Ok(HttpResponse::BadRequest().json(ApiResponse::<Vec<DailyBar>>::error(e.to_string()))),
    };

    let raw = match state.ingestor.history().fetch(&code, start, end).await {
        Ok(raw) => raw,
        Err(e) => return Ok(fetch_error_response::<Vec<DailyBar>>(&e)),
    };

    let mut bars = Vec::new();
    let mut skipped = 0;
    for day in state.ingestor.codec().parse(&raw) {
        match day {
            Ok(bar) => bars.push(bar),
            Err(e) => {
                log::warn!("⚠️ 指数 {} 跳过: {}", code, e);
                skipped += 1;
            }
        }
    }

    let response = if skipped > 0 {
        ApiResponse::success_with(bars, format!("跳过 {} 条格式错误数据", skipped))
    } else {
        ApiResponse::success(bars)
    };
    Ok(HttpResponse::Ok().json(response))
}

/// 指数日线入库
///
/// POST /api/v1/index/ingest
/// `{"codes": ["000001", "399006"], "start": "20250901", "end": "20250920"}`
pub async fn ingest_index(state: web::Data<AppState>, body: web::Json<IngestRequest>) -> Result<HttpResponse> {
    let (start, end) = match date_range(&body.start, &body.end) {
        Ok(range) => range,
        Err(e) => return Ok(HttpResponse::BadRequest().json(ApiResponse::<Vec<IngestSummary>>::error(e.to_string()))),
    };
    if body.codes.is_empty() {
        return Ok(HttpResponse::BadRequest().json(ApiResponse::<Vec<IngestSummary>>::error("codes 不能为空")));
    }

    let results = state
        .ingestor
        .ingest_many(&body.codes, start, end, &state.shutdown)
        .await;

    let summaries: Vec<IngestSummary> = results
        .into_iter()
        .map(|(code, result)| match result {
            Ok(report) => report.summary(),
            Err(e) => IngestSummary {
                code,
                written: 0,
                skipped: 0,
                failed: 0,
                cancelled: matches!(e, FetchError::Cancelled),
                error: Some(e.to_string()),
            },
        })
        .collect();

    Ok(HttpResponse::Ok().json(ApiResponse::success(summaries)))
}

pub fn config(cfg: &mut web::ServiceConfig) {
    cfg.service(
        web::scope("/index")
            .route("/ingest", web::post().to(ingest_index))
            .route("/{code}/history", web::get().to(get_index_history)),
    );
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_date_range() {
        let (start, end) = date_range("20250901", "20250920").unwrap();
        assert!(start < end);
        assert!(date_range("20250920", "20250901").is_err());
        assert!(date_range("2025-09-01", "20250920").is_err());
    }
}
