//! 落库
//!
//! 流水线只依赖 [`Sink`]：传入结构化记录，返回影响行数。
//! 落到关系库时使用 [`MarketIndexRecord::insert_statement`] 生成的参数化语句

use async_trait::async_trait;
use serde::Serialize;
use std::path::PathBuf;
use thiserror::Error;
use tokio::fs::{self, File, OpenOptions};
use tokio::io::AsyncWriteExt;

use crate::models::MarketIndexRecord;

/// 落库错误
#[derive(Debug, Error)]
pub enum SinkError {
    #[error("写入文件失败: {0}")]
    Io(#[from] std::io::Error),

    #[error("序列化失败: {0}")]
    Serialize(#[from] serde_json::Error),

    #[error("写入被拒绝: {0}")]
    Rejected(String),
}

/// 记录接收方
#[async_trait]
pub trait Sink: Send + Sync {
    /// 写入一条记录，返回影响行数
    async fn write(&self, record: &MarketIndexRecord) -> Result<u64, SinkError>;
}

// ==================== 参数化语句 ====================

/// marketindex 表列顺序
pub const MARKET_INDEX_COLUMNS: [&str; 16] = [
    "sctype",
    "nowtime",
    "redopennum",
    "redclosenum",
    "upnum",
    "zeronum",
    "fallnum",
    "turnover",
    "buymoney",
    "openpercent",
    "closepercent",
    "openpoint",
    "closepoint",
    "highpoint",
    "lowpoint",
    "risepercent",
];

/// 绑定参数
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(untagged)]
pub enum SqlValue {
    Text(String),
    Int(i64),
    Float(f64),
}

/// 参数化插入语句
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct InsertStatement {
    pub sql: String,
    pub params: Vec<SqlValue>,
}

impl MarketIndexRecord {
    /// 生成 `INSERT INTO marketindex (...) VALUES ($1, ..., $16)`，所有值都作为参数绑定
    pub fn insert_statement(&self) -> InsertStatement {
        let placeholders: Vec<String> = (1..=MARKET_INDEX_COLUMNS.len())
            .map(|i| format!("${}", i))
            .collect();
        let sql = format!(
            "INSERT INTO marketindex ({}) VALUES ({})",
            MARKET_INDEX_COLUMNS.join(", "),
            placeholders.join(", ")
        );

        let params = vec![
            SqlValue::Text(self.sc_type.clone()),
            SqlValue::Text(self.now_time.format("%Y-%m-%d").to_string()),
            SqlValue::Int(self.red_open_num.into()),
            SqlValue::Int(self.red_close_num.into()),
            SqlValue::Int(self.up_num.into()),
            SqlValue::Int(self.zero_num.into()),
            SqlValue::Int(self.fall_num.into()),
            SqlValue::Int(i64::try_from(self.turnover).unwrap_or(i64::MAX)),
            SqlValue::Float(self.buy_money),
            SqlValue::Float(self.open_percent),
            SqlValue::Float(self.close_percent),
            SqlValue::Float(self.open_point),
            SqlValue::Float(self.close_point),
            SqlValue::Float(self.high_point),
            SqlValue::Float(self.low_point),
            SqlValue::Float(self.rise_percent),
        ];

        InsertStatement { sql, params }
    }
}

// ==================== 实现 ====================

/// 内存接收方
#[cfg(test)]
#[derive(Debug, Default)]
pub struct MemorySink {
    records: std::sync::Mutex<Vec<MarketIndexRecord>>,
}

#[cfg(test)]
impl MemorySink {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn records(&self) -> Vec<MarketIndexRecord> {
        self.records
            .lock()
            .map(|records| records.clone())
            .unwrap_or_default()
    }
}

#[cfg(test)]
#[async_trait]
impl Sink for MemorySink {
    async fn write(&self, record: &MarketIndexRecord) -> Result<u64, SinkError> {
        let mut records = self
            .records
            .lock()
            .map_err(|_| SinkError::Rejected("内存存储已损坏".to_string()))?;
        records.push(record.clone());
        Ok(1)
    }
}

/// JSONL 中的一行：原始记录及其参数化插入语句，可直接回放到数据库
#[derive(Serialize)]
struct JournalEntry<'a> {
    record: &'a MarketIndexRecord,
    statement: InsertStatement,
}

/// JSON Lines 文件接收方，每条记录一行
pub struct JsonlSink {
    path: PathBuf,
    file: tokio::sync::Mutex<Option<File>>,
}

impl JsonlSink {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self {
            path: path.into(),
            file: tokio::sync::Mutex::new(None),
        }
    }

    async fn open(&self) -> Result<File, SinkError> {
        if let Some(parent) = self.path.parent().filter(|p| !p.as_os_str().is_empty()) {
            fs::create_dir_all(parent).await?;
        }
        let file = OpenOptions::new()
            .create(true)
            .append(true)
            .open(&self.path)
            .await?;
        log::info!("打开落库文件 {}", self.path.display());
        Ok(file)
    }
}

#[async_trait]
impl Sink for JsonlSink {
    async fn write(&self, record: &MarketIndexRecord) -> Result<u64, SinkError> {
        let entry = JournalEntry {
            record,
            statement: record.insert_statement(),
        };
        let mut line = serde_json::to_string(&entry)?;
        line.push('\n');

        let mut guard = self.file.lock().await;
        if guard.is_none() {
            *guard = Some(self.open().await?);
        }
        if let Some(file) = guard.as_mut() {
            file.write_all(line.as_bytes()).await?;
            file.flush().await?;
        }
        Ok(1)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::DailyBar;
    use chrono::NaiveDate;

    fn record(label: &str, day: u32) -> MarketIndexRecord {
        let bar = DailyBar {
            date: NaiveDate::from_ymd_opt(2025, 9, day).unwrap(),
            open_point: 3000.12,
            close_point: 3010.55,
            high_point: 3015.0,
            low_point: 2995.0,
            change_percent: 0.34,
            volume: 12345,
            amount: 98765.43,
        };
        MarketIndexRecord::from_bar(label, &bar)
    }

    #[test]
    fn test_insert_statement_binds_all_values() {
        let stmt = record("北交所'; DROP TABLE marketindex; --", 20).insert_statement();

        assert!(stmt.sql.starts_with("INSERT INTO marketindex (sctype, nowtime, redopennum"));
        assert!(stmt.sql.ends_with("$15, $16)"));
        assert!(!stmt.sql.contains("DROP"));
        assert_eq!(stmt.params.len(), MARKET_INDEX_COLUMNS.len());
        assert_eq!(stmt.params[0], SqlValue::Text("北交所'; DROP TABLE marketindex; --".to_string()));
        assert_eq!(stmt.params[1], SqlValue::Text("2025-09-20".to_string()));
        assert_eq!(stmt.params[7], SqlValue::Int(12345));
        assert_eq!(stmt.params[8], SqlValue::Float(98765.43));
        assert_eq!(stmt.params[15], SqlValue::Float(0.34));
    }

    #[tokio::test]
    async fn test_memory_sink() {
        let sink = MemorySink::new();
        assert_eq!(sink.write(&record("上证", 19)).await.unwrap(), 1);
        assert_eq!(sink.write(&record("上证", 20)).await.unwrap(), 1);

        let records = sink.records();
        assert_eq!(records.len(), 2);
        assert_eq!(records[1].now_time, NaiveDate::from_ymd_opt(2025, 9, 20).unwrap());
    }

    #[tokio::test]
    async fn test_jsonl_sink_appends() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("nested").join("marketindex.jsonl");
        let sink = JsonlSink::new(&path);

        sink.write(&record("深证", 18)).await.unwrap();
        sink.write(&record("深证", 19)).await.unwrap();

        let content = std::fs::read_to_string(&path).unwrap();
        let lines: Vec<&str> = content.lines().collect();
        assert_eq!(lines.len(), 2);

        let entry: serde_json::Value = serde_json::from_str(lines[1]).unwrap();
        let parsed: MarketIndexRecord = serde_json::from_value(entry["record"].clone()).unwrap();
        assert_eq!(parsed.sc_type, "深证");
        assert_eq!(parsed.now_time, NaiveDate::from_ymd_opt(2025, 9, 19).unwrap());

        let statement = &entry["statement"];
        assert!(statement["sql"].as_str().unwrap().starts_with("INSERT INTO marketindex"));
        assert_eq!(statement["params"][0], "深证");
        assert_eq!(statement["params"][1], "2025-09-19");
        assert_eq!(statement["params"][7], 12345);
    }
}
