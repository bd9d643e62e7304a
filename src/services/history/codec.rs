//! 搜狐历史行情响应解析
//!
//! 响应中每个不含嵌套的 `[...]` 为一个交易日，组内按位置取带引号的字段：
//! `["2025-09-20","3000.12","3010.55","10.43","0.34%","2995.00","3015.00","123450000","987654321","0.85%"]`

use chrono::NaiveDate;
use regex::Regex;
use std::sync::LazyLock;
use thiserror::Error;

use crate::models::DailyBar;

static GROUP_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"\[[^\[\]]*\]").expect("分组正则"));
static TOKEN_RE: LazyLock<Regex> = LazyLock::new(|| Regex::new(r#""([^"]*)""#).expect("字段正则"));

// 组内字段位置，3 为涨跌额，不使用
const DATE: usize = 0;
const OPEN: usize = 1;
const CLOSE: usize = 2;
const CHANGE_PERCENT: usize = 4;
const LOW: usize = 5;
const HIGH: usize = 6;
const VOLUME: usize = 7;
const AMOUNT: usize = 8;

/// 必需字段数
pub const DAY_FIELDS: usize = AMOUNT + 1;
/// 上游附带换手率时的字段数
pub const DAY_FIELDS_WITH_TURNOVER: usize = DAY_FIELDS + 1;

/// 万
const TEN_THOUSAND: f64 = 10_000.0;

/// 单个交易日分组格式错误
#[derive(Debug, Clone, PartialEq, Error)]
#[error("交易日数据格式错误（{reason}）: {raw}")]
pub struct MalformedRecordError {
    /// 分组原文
    pub raw: String,
    pub reason: String,
}

impl MalformedRecordError {
    fn new(raw: &str, reason: impl Into<String>) -> Self {
        Self {
            raw: raw.to_string(),
            reason: reason.into(),
        }
    }
}

/// 历史指数解码器
#[derive(Debug, Clone, Copy, Default)]
pub struct IndexHistoryCodec;

impl IndexHistoryCodec {
    pub fn new() -> Self {
        Self
    }

    /// 按出现顺序解析所有交易日分组，每组独立成功或失败
    pub fn parse(&self, raw: &str) -> Vec<Result<DailyBar, MalformedRecordError>> {
        GROUP_RE
            .find_iter(raw)
            .map(|group| self.parse_group(group.as_str()))
            .collect()
    }

    /// 解析单个分组
    pub fn parse_group(&self, group: &str) -> Result<DailyBar, MalformedRecordError> {
        let tokens: Vec<&str> = TOKEN_RE
            .captures_iter(group)
            .filter_map(|c| c.get(1).map(|m| m.as_str()))
            .collect();

        if tokens.len() != DAY_FIELDS && tokens.len() != DAY_FIELDS_WITH_TURNOVER {
            return Err(MalformedRecordError::new(
                group,
                format!("字段数 {}，应为 {} 或 {}", tokens.len(), DAY_FIELDS, DAY_FIELDS_WITH_TURNOVER),
            ));
        }

        let date = NaiveDate::parse_from_str(tokens[DATE].trim(), "%Y-%m-%d")
            .map_err(|e| MalformedRecordError::new(group, format!("日期 {}: {}", tokens[DATE], e)))?;

        let decimal = |index: usize, name: &str| -> Result<f64, MalformedRecordError> {
            let text = tokens[index].trim().trim_end_matches('%');
            text.parse::<f64>()
                .ok()
                .filter(|v| v.is_finite())
                .ok_or_else(|| MalformedRecordError::new(group, format!("{} 不是数字: {}", name, tokens[index])))
        };

        let volume = tokens[VOLUME]
            .trim()
            .parse::<u64>()
            .map_err(|_| MalformedRecordError::new(group, format!("成交量不是整数: {}", tokens[VOLUME])))?;

        Ok(DailyBar {
            date,
            open_point: decimal(OPEN, "开盘")?,
            close_point: decimal(CLOSE, "收盘")?,
            high_point: decimal(HIGH, "最高")?,
            low_point: decimal(LOW, "最低")?,
            change_percent: decimal(CHANGE_PERCENT, "涨跌幅")?,
            volume: volume / 10_000,
            amount: round2(decimal(AMOUNT, "成交额")? / TEN_THOUSAND),
        })
    }
}

/// 保留两位小数，0.5 远离零进位
fn round2(value: f64) -> f64 {
    (value * 100.0).round() / 100.0
}
