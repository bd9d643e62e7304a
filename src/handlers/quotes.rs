//! 实时行情接口处理器
//!
//! - GET /quotes?symbols=600519,000858 - 个股实时行情
//! - GET /quotes/raw?symbols=600519 - 原始字段
//! - GET /market/stats - A股全市场涨跌统计

use actix_web::{web, HttpResponse, Result};

use crate::handlers::fetch_error_response;
use crate::models::{ApiResponse, IndexSnapshot, MarketStats, QuoteQuery, RawQuoteLine, StockQuote};
use crate::services::common::{all_a_share_codes, format_code, SH_INDEX_SYMBOL};
use crate::state::AppState;

fn formatted_symbols(query: &QuoteQuery) -> Vec<String> {
    query.symbol_list().iter().map(|s| format_code(s)).collect()
}

/// 获取个股实时行情
///
/// GET /api/v1/quotes?symbols=600519,000858
pub async fn get_quotes(state: web::Data<AppState>, query: web::Query<QuoteQuery>) -> Result<HttpResponse> {
    let symbols = formatted_symbols(&query);
    if symbols.is_empty() {
        return Ok(HttpResponse::BadRequest().json(ApiResponse::<Vec<StockQuote>>::error("symbols 不能为空")));
    }

    match state.quotes.fetch_all(&symbols, &state.shutdown).await {
        Ok(lines) => {
            let quotes: Vec<StockQuote> = lines.iter().filter_map(StockQuote::from_line).collect();
            Ok(HttpResponse::Ok().json(ApiResponse::success(quotes)))
        }
        Err(e) => Ok(fetch_error_response::<Vec<StockQuote>>(&e)),
    }
}

/// 获取原始行情字段
///
/// GET /api/v1/quotes/raw?symbols=sh600519
pub async fn get_raw_quotes(state: web::Data<AppState>, query: web::Query<QuoteQuery>) -> Result<HttpResponse> {
    let symbols = formatted_symbols(&query);
    if symbols.is_empty() {
        return Ok(HttpResponse::BadRequest().json(ApiResponse::<Vec<RawQuoteLine>>::error("symbols 不能为空")));
    }

    match state.quotes.fetch_all(&symbols, &state.shutdown).await {
        Ok(lines) => Ok(HttpResponse::Ok().json(ApiResponse::success(lines))),
        Err(e) => Ok(fetch_error_response::<Vec<RawQuoteLine>>(&e)),
    }
}

/// 全市场涨跌统计 + 上证指数
///
/// GET /api/v1/market/stats
pub async fn get_market_stats(state: web::Data<AppState>) -> Result<HttpResponse> {
    let universe = all_a_share_codes();
    let index_symbols = vec![SH_INDEX_SYMBOL.to_string()];

    // 全市场统计容忍单批失败，失败批次数写入结果
    let (market, index) = tokio::join!(
        state.quotes.fetch_available(&universe, &state.shutdown),
        state.quotes.fetch_all(&index_symbols, &state.shutdown),
    );

    let fetched = match market {
        Ok(fetched) => fetched,
        Err(e) => return Ok(fetch_error_response::<MarketStats>(&e)),
    };

    let mut stats = MarketStats::from_partial(&fetched);
    match index {
        Ok(index_lines) => stats.sh_index = index_lines.first().and_then(IndexSnapshot::from_line),
        Err(e) => log::warn!("获取上证指数失败: {}", e),
    }

    log::info!(
        "A股统计: 总数 {} 上涨 {} 下跌 {} 平盘 {}，失败批次 {}",
        stats.total,
        stats.up_count,
        stats.down_count,
        stats.flat_count,
        stats.failed_batches
    );
    Ok(HttpResponse::Ok().json(ApiResponse::success(stats)))
}

pub fn config(cfg: &mut web::ServiceConfig) {
    cfg.service(
        web::scope("/quotes")
            .route("", web::get().to(get_quotes))
            .route("/raw", web::get().to(get_raw_quotes)),
    )
    .route("/market/stats", web::get().to(get_market_stats));
}
