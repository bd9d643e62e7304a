//! 实时行情数据模型
//!
//! 定义腾讯行情接口相关的数据结构

use serde::{Deserialize, Serialize};

/// 单只证券的原始行情行
///
/// 对应响应中的一条 `v_<code>="f0~f1~...";` 语句，字段含义由上游决定
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RawQuoteLine {
    /// 带交易所前缀的代码（如 sh600519）
    pub code: String,
    /// 按分隔符拆分后的原始字段
    pub fields: Vec<String>,
}

impl RawQuoteLine {
    pub fn new(code: impl Into<String>, fields: Vec<String>) -> Self {
        Self {
            code: code.into(),
            fields,
        }
    }

    /// 按位置取字段
    pub fn field(&self, index: usize) -> Option<&str> {
        self.fields.get(index).map(String::as_str)
    }

    /// 上游对无效代码返回空数据或 `pv_none_match`
    pub fn is_empty_payload(&self) -> bool {
        self.fields.is_empty()
            || (self.fields.len() == 1 && (self.fields[0].is_empty() || self.fields[0] == "1"))
            || self.code.contains("pv_none_match")
    }
}

/// 盘口一档
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct OrderLevel {
    pub price: f64,
    /// 委托量（手）
    pub volume: u64,
}

/// 个股实时行情
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StockQuote {
    /// 带前缀的代码
    pub symbol: String,
    /// 证券代码
    pub code: String,
    /// 证券名称
    pub name: String,
    /// 当前价格
    pub current_price: f64,
    /// 昨收价
    pub prev_close: f64,
    /// 今开价
    pub open: f64,
    /// 成交量（手）
    pub volume: u64,
    /// 外盘（手）
    pub outer_volume: u64,
    /// 内盘（手）
    pub inner_volume: u64,
    /// 买一至买四
    pub bids: Vec<OrderLevel>,
    /// 卖一至卖四
    pub asks: Vec<OrderLevel>,
    /// 涨跌额
    pub change: f64,
    /// 涨跌幅（百分比）
    pub change_percent: f64,
    /// 最高价
    pub high: f64,
    /// 最低价
    pub low: f64,
    /// 成交额（万元）
    pub amount: f64,
    /// 换手率（%）
    pub turnover_rate: Option<f64>,
    /// 市盈率
    pub pe_ratio: Option<f64>,
    /// 振幅（%）
    pub amplitude: Option<f64>,
    /// 流通市值（亿元）
    pub float_market_cap: Option<f64>,
    /// 总市值（亿元）
    pub total_market_cap: Option<f64>,
    /// 市净率
    pub pb_ratio: Option<f64>,
    /// 上游时间戳（yyyyMMddHHmmss）
    pub updated_at: String,
}

/// 上证指数快照
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct IndexSnapshot {
    pub price: f64,
    pub prev_close: f64,
    pub change: f64,
    pub change_percent: f64,
    /// 成交额（万元）
    pub amount: f64,
}

/// A股全市场涨跌统计
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct MarketStats {
    /// 有效股票数
    pub total: u32,
    /// 上涨数
    pub up_count: u32,
    /// 下跌数
    pub down_count: u32,
    /// 平盘数
    pub flat_count: u32,
    /// 涨幅 >= 3%
    pub up_3pct: u32,
    /// 跌幅 >= 3%
    pub down_3pct: u32,
    /// 涨幅 >= 5%
    pub up_5pct: u32,
    /// 跌幅 >= 5%
    pub down_5pct: u32,
    /// 涨停
    pub limit_up: u32,
    /// 跌停
    pub limit_down: u32,
    /// 上证指数
    pub sh_index: Option<IndexSnapshot>,
    /// 抓取失败而未计入统计的批次数
    pub failed_batches: u32,
    /// 失败批次中的代码数
    pub missing_symbols: usize,
    /// 采集时间（北京时间）
    pub collected_at: String,
}

/// 行情查询参数
#[derive(Debug, Deserialize)]
pub struct QuoteQuery {
    /// 逗号分隔的代码列表，可不带交易所前缀
    pub symbols: String,
}

impl QuoteQuery {
    pub fn symbol_list(&self) -> Vec<String> {
        self.symbols
            .split(',')
            .map(str::trim)
            .filter(|s| !s.is_empty())
            .map(str::to_string)
            .collect()
    }
}
