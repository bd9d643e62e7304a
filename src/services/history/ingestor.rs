//! 指数历史入库
//!
//! 抓取 -> 解析 -> 构造 marketindex 记录 -> 逐条写入。
//! 每条记录独立写入，没有跨记录的事务；格式错误的交易日跳过并记录

use chrono::NaiveDate;
use futures::stream::{self, StreamExt};
use serde::Serialize;
use std::sync::Arc;
use tokio_util::sync::CancellationToken;

use crate::models::{IngestSummary, MarketIndexRecord, SymbolClassTable};
use crate::services::error::FetchError;
use crate::services::sink::Sink;

use super::codec::IndexHistoryCodec;
use super::fetcher::HistorySource;

/// 单条记录的处理结果
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "status", rename_all = "snake_case")]
pub enum RecordOutcome {
    Written { date: NaiveDate, rows: u64 },
    Skipped { raw: String, reason: String },
    SinkFailed { date: NaiveDate, error: String },
}

/// 单个指数的入库报告
#[derive(Debug, Clone, Serialize)]
pub struct IngestReport {
    pub code: String,
    pub written: usize,
    pub skipped: usize,
    pub failed: usize,
    /// 处理中途被取消，`outcomes` 只包含取消前的记录
    pub cancelled: bool,
    pub outcomes: Vec<RecordOutcome>,
}

impl IngestReport {
    fn new(code: &str) -> Self {
        Self {
            code: code.to_string(),
            written: 0,
            skipped: 0,
            failed: 0,
            cancelled: false,
            outcomes: Vec::new(),
        }
    }

    fn push(&mut self, outcome: RecordOutcome) {
        match outcome {
            RecordOutcome::Written { .. } => self.written += 1,
            RecordOutcome::Skipped { .. } => self.skipped += 1,
            RecordOutcome::SinkFailed { .. } => self.failed += 1,
        }
        self.outcomes.push(outcome);
    }

    pub fn summary(&self) -> IngestSummary {
        IngestSummary {
            code: self.code.clone(),
            written: self.written,
            skipped: self.skipped,
            failed: self.failed,
            cancelled: self.cancelled,
            error: None,
        }
    }
}

/// 指数历史入库器
pub struct IndexIngestor<H> {
    history: H,
    codec: IndexHistoryCodec,
    classes: Arc<SymbolClassTable>,
    sink: Arc<dyn Sink>,
    workers: usize,
}

impl<H: HistorySource> IndexIngestor<H> {
    pub fn new(history: H, classes: Arc<SymbolClassTable>, sink: Arc<dyn Sink>, workers: usize) -> Self {
        Self {
            history,
            codec: IndexHistoryCodec::new(),
            classes,
            sink,
            workers: workers.max(1),
        }
    }

    pub fn history(&self) -> &H {
        &self.history
    }

    pub fn codec(&self) -> &IndexHistoryCodec {
        &self.codec
    }

    /// 入库单个指数
    ///
    /// 抓取失败直接返回错误；单条记录的解析或写入失败只记入报告。
    /// 抓取前被取消返回 `Cancelled`，写入过程中被取消则停止并返回已处理部分的报告
    pub async fn ingest(
        &self,
        code: &str,
        start: NaiveDate,
        end: NaiveDate,
        cancel: &CancellationToken,
    ) -> Result<IngestReport, FetchError> {
        // 抓取与分类查询使用同一个规范化代码
        let code = code.trim().to_lowercase();
        let code = code.as_str();

        let raw = tokio::select! {
            _ = cancel.cancelled() => return Err(FetchError::Cancelled),
            raw = self.history.fetch(code, start, end) => raw?,
        };

        let label = self.classes.label(code);
        if label.is_empty() {
            log::debug!("指数 {} 没有配置分类标签", code);
        }

        let mut report = IngestReport::new(code);

        for day in self.codec.parse(&raw) {
            if cancel.is_cancelled() {
                log::warn!("指数 {} 入库被取消，已写入 {} 条", code, report.written);
                report.cancelled = true;
                break;
            }

            let bar = match day {
                Ok(bar) => bar,
                Err(e) => {
                    log::warn!("⚠️ 指数 {} 跳过: {}", code, e);
                    report.push(RecordOutcome::Skipped {
                        raw: e.raw,
                        reason: e.reason,
                    });
                    continue;
                }
            };

            let record = MarketIndexRecord::from_bar(label, &bar);
            match self.sink.write(&record).await {
                Ok(rows) => {
                    log::info!("指数 {} {} 写入成功，影响 {} 行", code, bar.date, rows);
                    report.push(RecordOutcome::Written { date: bar.date, rows });
                }
                Err(e) => {
                    log::error!("指数 {} {} 写入失败: {}", code, bar.date, e);
                    report.push(RecordOutcome::SinkFailed {
                        date: bar.date,
                        error: e.to_string(),
                    });
                }
            }
        }

        log::info!(
            "📊 指数 {} 入库完成: 写入 {} 条，跳过 {} 条，失败 {} 条",
            code,
            report.written,
            report.skipped,
            report.failed
        );
        Ok(report)
    }

    /// 并发入库多个指数，结果按输入顺序返回，单个指数失败不影响其他指数
    pub async fn ingest_many(
        &self,
        codes: &[String],
        start: NaiveDate,
        end: NaiveDate,
        cancel: &CancellationToken,
    ) -> Vec<(String, Result<IngestReport, FetchError>)> {
        stream::iter(codes)
            .map(|code| async move {
                let result = self.ingest(code, start, end, cancel).await;
                if let Err(e) = &result {
                    log::error!("指数 {} 入库失败: {}", code, e);
                }
                (code.clone(), result)
            })
            .buffered(self.workers)
            .collect()
            .await
    }
}
