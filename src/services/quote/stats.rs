//! 行情字段映射与全市场涨跌统计

use crate::models::{IndexSnapshot, MarketStats, OrderLevel, RawQuoteLine, StockQuote};
use crate::services::common::get_beijing_time;

use super::batch::PartialLines;

// 腾讯行情字段位置
const NAME: usize = 1;
const CODE: usize = 2;
const PRICE: usize = 3;
const PREV_CLOSE: usize = 4;
const OPEN: usize = 5;
const VOLUME: usize = 6;
const OUTER_VOLUME: usize = 7;
const INNER_VOLUME: usize = 8;
/// 买一价位置，买一至买四按 (价, 量) 依次排列
const BID_START: usize = 9;
/// 卖一价位置
const ASK_START: usize = 17;
/// 盘口档数
const BOOK_DEPTH: usize = 4;
const DATETIME: usize = 30;
const CHANGE: usize = 31;
const CHANGE_PERCENT: usize = 32;
const HIGH: usize = 33;
const LOW: usize = 34;
const AMOUNT: usize = 37;
const TURNOVER_RATE: usize = 38;
const PE_RATIO: usize = 43;
const AMPLITUDE: usize = 44;
const FLOAT_MARKET_CAP: usize = 45;
const TOTAL_MARKET_CAP: usize = 46;
const PB_RATIO: usize = 47;

/// 有效个股行情至少要包含涨跌幅字段
const MIN_FIELDS: usize = CHANGE_PERCENT + 1;
/// 涨跌停阈值
const LIMIT_PERCENT: f64 = 9.9;

fn number(line: &RawQuoteLine, index: usize) -> f64 {
    line.field(index)
        .and_then(|s| s.trim().parse().ok())
        .unwrap_or(0.0)
}

fn integer(line: &RawQuoteLine, index: usize) -> u64 {
    line.field(index)
        .and_then(|s| s.trim().parse().ok())
        .unwrap_or(0)
}

/// 较短的行情行可能不含估值字段
fn optional(line: &RawQuoteLine, index: usize) -> Option<f64> {
    line.field(index)
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .and_then(|s| s.parse().ok())
}

fn book(line: &RawQuoteLine, start: usize) -> Vec<OrderLevel> {
    (0..BOOK_DEPTH)
        .map(|level| OrderLevel {
            price: number(line, start + level * 2),
            volume: integer(line, start + level * 2 + 1),
        })
        .collect()
}

impl StockQuote {
    /// 从原始行情行构造，空数据或字段不足时返回 `None`
    pub fn from_line(line: &RawQuoteLine) -> Option<Self> {
        if line.is_empty_payload() || line.fields.len() < MIN_FIELDS {
            return None;
        }

        Some(Self {
            symbol: line.code.clone(),
            code: line.field(CODE).unwrap_or_default().to_string(),
            name: line.field(NAME).unwrap_or_default().to_string(),
            current_price: number(line, PRICE),
            prev_close: number(line, PREV_CLOSE),
            open: number(line, OPEN),
            volume: integer(line, VOLUME),
            outer_volume: integer(line, OUTER_VOLUME),
            inner_volume: integer(line, INNER_VOLUME),
            bids: book(line, BID_START),
            asks: book(line, ASK_START),
            change: number(line, CHANGE),
            change_percent: number(line, CHANGE_PERCENT),
            high: number(line, HIGH),
            low: number(line, LOW),
            amount: number(line, AMOUNT),
            turnover_rate: optional(line, TURNOVER_RATE),
            pe_ratio: optional(line, PE_RATIO),
            amplitude: optional(line, AMPLITUDE),
            float_market_cap: optional(line, FLOAT_MARKET_CAP),
            total_market_cap: optional(line, TOTAL_MARKET_CAP),
            pb_ratio: optional(line, PB_RATIO),
            updated_at: line.field(DATETIME).unwrap_or_default().to_string(),
        })
    }
}

impl IndexSnapshot {
    /// 指数行字段数需超过 37
    pub fn from_line(line: &RawQuoteLine) -> Option<Self> {
        if line.fields.len() <= AMOUNT {
            return None;
        }

        Some(Self {
            price: number(line, PRICE),
            prev_close: number(line, PREV_CLOSE),
            change: number(line, CHANGE),
            change_percent: number(line, CHANGE_PERCENT),
            amount: number(line, AMOUNT),
        })
    }
}

impl MarketStats {
    /// 统计一组行情的涨跌分布
    pub fn from_lines(lines: &[RawQuoteLine]) -> Self {
        let mut stats = MarketStats {
            collected_at: get_beijing_time(),
            ..Default::default()
        };

        for line in lines {
            if line.is_empty_payload() || line.fields.len() < MIN_FIELDS {
                continue;
            }
            let pct = match line.field(CHANGE_PERCENT).map(str::trim) {
                Some(s) if !s.is_empty() => match s.parse::<f64>() {
                    Ok(v) => v,
                    Err(_) => continue,
                },
                _ => continue,
            };
            stats.count(pct);
        }

        stats
    }

    /// 统计部分批次失败时的抓取结果，并记录缺失情况
    pub fn from_partial(fetched: &PartialLines) -> Self {
        Self {
            failed_batches: fetched.failed_batches,
            missing_symbols: fetched.missing_symbols,
            ..Self::from_lines(&fetched.lines)
        }
    }

    fn count(&mut self, pct: f64) {
        self.total += 1;

        if pct > 0.0 {
            self.up_count += 1;
        } else if pct < 0.0 {
            self.down_count += 1;
        } else {
            self.flat_count += 1;
        }

        if pct >= 3.0 {
            self.up_3pct += 1;
        } else if pct <= -3.0 {
            self.down_3pct += 1;
        }

        if pct >= 5.0 {
            self.up_5pct += 1;
        } else if pct <= -5.0 {
            self.down_5pct += 1;
        }

        if pct >= LIMIT_PERCENT {
            self.limit_up += 1;
        } else if pct <= -LIMIT_PERCENT {
            self.limit_down += 1;
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    /// 构造 48 个字段的行情行
    fn line(code: &str, pct: &str) -> RawQuoteLine {
        let mut fields: Vec<String> = (0..48).map(|i| format!("{}", i)).collect();
        fields[NAME] = "测试".to_string();
        fields[CODE] = code[2..].to_string();
        fields[PRICE] = "10.50".to_string();
        fields[VOLUME] = "12345".to_string();
        fields[DATETIME] = "20250920150000".to_string();
        fields[CHANGE_PERCENT] = pct.to_string();
        RawQuoteLine::new(code, fields)
    }

    #[test]
    fn test_stock_quote_from_line() {
        let quote = StockQuote::from_line(&line("sh600519", "1.25")).unwrap();

        assert_eq!(quote.symbol, "sh600519");
        assert_eq!(quote.code, "600519");
        assert_eq!(quote.name, "测试");
        assert_eq!(quote.current_price, 10.5);
        assert_eq!(quote.volume, 12345);
        assert_eq!(quote.change_percent, 1.25);
        assert_eq!(quote.updated_at, "20250920150000");
        assert_eq!((quote.outer_volume, quote.inner_volume), (7, 8));
        assert_eq!(quote.bids.len(), 4);
        assert_eq!(quote.bids[0], OrderLevel { price: 9.0, volume: 10 });
        assert_eq!(quote.bids[3], OrderLevel { price: 15.0, volume: 16 });
        assert_eq!(quote.asks[0], OrderLevel { price: 17.0, volume: 18 });
        assert_eq!(quote.asks[3], OrderLevel { price: 23.0, volume: 24 });
        assert_eq!(quote.amount, 37.0);
        assert_eq!(quote.turnover_rate, Some(38.0));
        assert_eq!(quote.pe_ratio, Some(43.0));
        assert_eq!(quote.amplitude, Some(44.0));
        assert_eq!(quote.float_market_cap, Some(45.0));
        assert_eq!(quote.total_market_cap, Some(46.0));
        assert_eq!(quote.pb_ratio, Some(47.0));
    }

    #[test]
    fn test_stock_quote_short_line_has_no_valuation() {
        let mut short = line("sz000858", "-0.5");
        short.fields.truncate(40);
        short.fields[OUTER_VOLUME] = String::new();

        let quote = StockQuote::from_line(&short).unwrap();

        assert_eq!(quote.outer_volume, 0);
        assert_eq!(quote.amount, 37.0);
        assert_eq!(quote.turnover_rate, Some(38.0));
        assert!(quote.pe_ratio.is_none());
        assert!(quote.pb_ratio.is_none());
    }

    #[test]
    fn test_stock_quote_rejects_short_line() {
        let short = RawQuoteLine::new("sh600519", vec!["1".into(), "名称".into()]);
        assert!(StockQuote::from_line(&short).is_none());
        assert!(StockQuote::from_line(&RawQuoteLine::new("sh600001", Vec::new())).is_none());
    }

    #[test]
    fn test_market_stats_counts() {
        let lines = vec![
            line("sh600000", "10.01"),
            line("sh600001", "5.2"),
            line("sh600002", "3.0"),
            line("sz000001", "0.00"),
            line("sz000002", "-4.1"),
            line("sz000003", "-9.95"),
            line("sz000004", ""),
            line("sz000005", "abc"),
            RawQuoteLine::new("pv_none_match", vec!["1".into()]),
            RawQuoteLine::new("bj830799", Vec::new()),
        ];

        let stats = MarketStats::from_lines(&lines);

        assert_eq!(stats.total, 6);
        assert_eq!(stats.up_count, 3);
        assert_eq!(stats.down_count, 2);
        assert_eq!(stats.flat_count, 1);
        assert_eq!(stats.up_3pct, 3);
        assert_eq!(stats.down_3pct, 2);
        assert_eq!(stats.up_5pct, 2);
        assert_eq!(stats.down_5pct, 1);
        assert_eq!(stats.limit_up, 1);
        assert_eq!(stats.limit_down, 1);
        assert!(stats.sh_index.is_none());
    }

    #[test]
    fn test_market_stats_from_partial() {
        let fetched = PartialLines {
            lines: vec![line("sh600000", "2.5"), line("sh600001", "-1.0")],
            failed_batches: 1,
            missing_symbols: 300,
        };

        let stats = MarketStats::from_partial(&fetched);

        assert_eq!(stats.total, 2);
        assert_eq!((stats.up_count, stats.down_count), (1, 1));
        assert_eq!(stats.failed_batches, 1);
        assert_eq!(stats.missing_symbols, 300);
        assert!(!stats.collected_at.is_empty());
    }

    #[test]
    fn test_index_snapshot() {
        let mut index_line = line("sh000001", "0.52");
        index_line.fields[PREV_CLOSE] = "3000.00".to_string();
        index_line.fields[AMOUNT] = "45678901".to_string();

        let snapshot = IndexSnapshot::from_line(&index_line).unwrap();
        assert_eq!(snapshot.prev_close, 3000.0);
        assert_eq!(snapshot.change_percent, 0.52);
        assert_eq!(snapshot.amount, 45678901.0);

        let short = RawQuoteLine::new("sh000001", vec!["1".to_string(); 37]);
        assert!(IndexSnapshot::from_line(&short).is_none());
    }
}
