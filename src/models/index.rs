//! 指数历史数据模型
//!
//! 包括日线、落库记录以及指数分类表

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// 指数单日K线
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DailyBar {
    /// 交易日
    pub date: NaiveDate,
    /// 开盘点位
    pub open_point: f64,
    /// 收盘点位
    pub close_point: f64,
    /// 最高点位
    pub high_point: f64,
    /// 最低点位
    pub low_point: f64,
    /// 涨跌幅（百分比，已去掉 %）
    pub change_percent: f64,
    /// 成交量（万手，取整）
    pub volume: u64,
    /// 成交额（万元，保留两位小数）
    pub amount: f64,
}

/// marketindex 表的一行
///
/// 指数没有成分股涨跌家数，五个家数字段以及开收盘百分比固定为 0
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MarketIndexRecord {
    /// 指数分类标签
    pub sc_type: String,
    /// 交易日
    pub now_time: NaiveDate,
    pub red_open_num: i32,
    pub red_close_num: i32,
    pub up_num: i32,
    pub zero_num: i32,
    pub fall_num: i32,
    /// 成交量（万手）
    pub turnover: u64,
    /// 成交额（万元）
    pub buy_money: f64,
    pub open_percent: f64,
    pub close_percent: f64,
    pub open_point: f64,
    pub close_point: f64,
    pub high_point: f64,
    pub low_point: f64,
    /// 涨跌幅
    pub rise_percent: f64,
}

impl MarketIndexRecord {
    /// 由日线和分类标签构造
    pub fn from_bar(sc_type: impl Into<String>, bar: &DailyBar) -> Self {
        Self {
            sc_type: sc_type.into(),
            now_time: bar.date,
            red_open_num: 0,
            red_close_num: 0,
            up_num: 0,
            zero_num: 0,
            fall_num: 0,
            turnover: bar.volume,
            buy_money: bar.amount,
            open_percent: 0.0,
            close_percent: 0.0,
            open_point: bar.open_point,
            close_point: bar.close_point,
            high_point: bar.high_point,
            low_point: bar.low_point,
            rise_percent: bar.change_percent,
        }
    }
}

/// 指数代码到分类标签的只读映射
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct SymbolClassTable {
    classes: BTreeMap<String, String>,
}

impl SymbolClassTable {
    pub fn new(classes: BTreeMap<String, String>) -> Self {
        Self { classes }
    }

    /// 查询分类标签，未知代码返回空字符串
    pub fn label(&self, code: &str) -> &str {
        self.classes.get(code).map(String::as_str).unwrap_or("")
    }

    pub fn len(&self) -> usize {
        self.classes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.classes.is_empty()
    }
}

/// 历史数据查询参数
#[derive(Debug, Deserialize)]
pub struct HistoryQuery {
    /// 开始日期（YYYYMMDD）
    pub start: String,
    /// 结束日期（YYYYMMDD）
    pub end: String,
}

/// 指数入库请求
#[derive(Debug, Deserialize)]
pub struct IngestRequest {
    /// 指数代码列表
    pub codes: Vec<String>,
    /// 开始日期（YYYYMMDD）
    pub start: String,
    /// 结束日期（YYYYMMDD）
    pub end: String,
}

/// 单个指数的入库结果摘要
#[derive(Debug, Serialize, Deserialize)]
pub struct IngestSummary {
    pub code: String,
    /// 写入成功条数
    pub written: usize,
    /// 跳过的格式错误条数
    pub skipped: usize,
    /// 写入失败条数
    pub failed: usize,
    /// 中途被取消，计数只覆盖取消前处理的记录
    pub cancelled: bool,
    /// 整体失败时的错误信息
    pub error: Option<String>,
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample_bar() -> DailyBar {
        DailyBar {
            date: NaiveDate::from_ymd_opt(2025, 9, 20).unwrap(),
            open_point: 3000.12,
            close_point: 3010.55,
            high_point: 3015.0,
            low_point: 2995.0,
            change_percent: 0.34,
            volume: 12345,
            amount: 98765.43,
        }
    }

    #[test]
    fn test_record_from_bar() {
        let record = MarketIndexRecord::from_bar("上证", &sample_bar());

        assert_eq!(record.sc_type, "上证");
        assert_eq!(record.turnover, 12345);
        assert_eq!(record.buy_money, 98765.43);
        assert_eq!(record.rise_percent, 0.34);
        assert_eq!(
            (record.red_open_num, record.red_close_num, record.up_num, record.zero_num, record.fall_num),
            (0, 0, 0, 0, 0)
        );
        assert_eq!(record.open_percent, 0.0);
        assert_eq!(record.close_percent, 0.0);
    }

    #[test]
    fn test_symbol_class_lookup() {
        let mut classes = BTreeMap::new();
        classes.insert("899050".to_string(), "北交所".to_string());
        let table = SymbolClassTable::new(classes);

        assert_eq!(table.label("899050"), "北交所");
        assert_eq!(table.label("123456"), "");
        assert_eq!(table.len(), 1);
        assert!(!table.is_empty());
        assert!(SymbolClassTable::default().is_empty());
    }
}
