//! 公共常量和辅助函数

use anyhow::{anyhow, Result};
use chrono::{NaiveDate, Utc};
use chrono_tz::Asia::Shanghai;

// ==================== 上游接口常量 ====================

/// 腾讯实时行情接口
pub const TX_QUOTE_BASE_URL: &str = "https://qt.gtimg.cn";
/// 搜狐历史行情接口
pub const SOHU_HISTORY_BASE_URL: &str = "https://q.stock.sohu.com";
/// 上证指数行情代码
pub const SH_INDEX_SYMBOL: &str = "sh000001";

pub const USER_AGENT: &str = "Mozilla/5.0 (Windows NT 10.0; Win64; x64) AppleWebKit/537.36";

/// 获取北京时间字符串（ISO 8601 格式，带+08:00时区）
pub fn get_beijing_time() -> String {
    Utc::now().with_timezone(&Shanghai).to_rfc3339()
}

/// 给股票代码加交易所前缀
///
/// 6 开头 -> sh，0/3 开头 -> sz，4/8 开头 -> bj，已带前缀的原样返回
pub fn format_code(code: &str) -> String {
    let code = code.trim();
    if code.starts_with("sh") || code.starts_with("sz") || code.starts_with("bj") {
        return code.to_string();
    }
    match code.chars().next() {
        Some('6') => format!("sh{}", code),
        Some('0') | Some('3') => format!("sz{}", code),
        Some('4') | Some('8') => format!("bj{}", code),
        _ => code.to_string(),
    }
}

/// 生成A股全部候选代码
///
/// 沪市主板、科创板，深市主板、创业板，北交所
pub fn all_a_share_codes() -> Vec<String> {
    let ranges: [(&str, u32, u32); 7] = [
        ("sh", 600000, 610000),
        ("sh", 688000, 690000),
        ("sz", 1, 4000),
        ("sz", 300000, 310000),
        ("bj", 430000, 440000),
        ("bj", 830000, 840000),
        ("bj", 870000, 880000),
    ];

    ranges
        .iter()
        .flat_map(|&(prefix, start, end)| (start..end).map(move |i| format!("{}{:06}", prefix, i)))
        .collect()
}

/// 解析 YYYYMMDD 日期
pub fn parse_compact_date(s: &str) -> Result<NaiveDate> {
    NaiveDate::parse_from_str(s.trim(), "%Y%m%d").map_err(|e| anyhow!("日期格式错误 {}: {}", s, e))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_format_code() {
        let cases = vec![
            ("600519", "sh600519"),
            ("000858", "sz000858"),
            ("300750", "sz300750"),
            ("830799", "bj830799"),
            ("430047", "bj430047"),
            (" sh000001 ", "sh000001"),
            ("sz399006", "sz399006"),
            ("hkHSI", "hkHSI"),
        ];
        for (input, expected) in cases {
            assert_eq!(format_code(input), expected, "输入 {}", input);
        }
    }

    #[test]
    fn test_all_a_share_codes() {
        let codes = all_a_share_codes();
        assert_eq!(codes.len(), 10000 + 2000 + 3999 + 10000 + 30000);
        assert_eq!(codes[0], "sh600000");
        assert_eq!(codes[12000], "sz000001");
        assert_eq!(codes.last().map(String::as_str), Some("bj879999"));
    }

    #[test]
    fn test_parse_compact_date() {
        let date = parse_compact_date("20250920").unwrap();
        assert_eq!(date, NaiveDate::from_ymd_opt(2025, 9, 20).unwrap());
        assert!(parse_compact_date("2025-09-20").is_err());
    }

    #[test]
    fn test_get_beijing_time() {
        assert!(get_beijing_time().contains("+08:00"));
    }
}
