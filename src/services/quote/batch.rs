//! 分批抓取
//!
//! 把任意长度的代码列表切成不超过上限的批次，逐批请求并按原顺序拼接

use tokio_util::sync::CancellationToken;

use crate::models::RawQuoteLine;
use crate::services::error::FetchError;

use super::fetcher::QuoteBatchSource;

/// 单次请求的默认代码上限
pub const DEFAULT_BATCH_SIZE: usize = 300;

/// 容忍单批失败的抓取结果
#[derive(Debug, Default)]
pub struct PartialLines {
    /// 成功批次的行情，按批次顺序拼接
    pub lines: Vec<RawQuoteLine>,
    /// 失败的批次数
    pub failed_batches: u32,
    /// 失败批次包含的代码数
    pub missing_symbols: usize,
}

/// 分批协调器
pub struct BatchCoordinator<S> {
    source: S,
    batch_size: usize,
}

impl<S: QuoteBatchSource> BatchCoordinator<S> {
    /// 批大小为 0 时按 1 处理
    pub fn new(source: S, batch_size: usize) -> Self {
        Self {
            source,
            batch_size: batch_size.max(1),
        }
    }

    pub fn batch_size(&self) -> usize {
        self.batch_size
    }

    /// 需要的请求次数
    pub fn batch_count(&self, symbol_count: usize) -> usize {
        symbol_count.div_ceil(self.batch_size)
    }

    /// 抓取全部代码
    ///
    /// 循环次数只由 `symbols` 决定；任一批次失败（重试耗尽或被取消）即整体失败
    pub async fn fetch_all(
        &self,
        symbols: &[String],
        cancel: &CancellationToken,
    ) -> Result<Vec<RawQuoteLine>, FetchError> {
        let total = self.batch_count(symbols.len());
        let mut lines = Vec::with_capacity(symbols.len());

        for (index, batch) in symbols.chunks(self.batch_size).enumerate() {
            let mut batch_lines = self
                .source
                .fetch_batch(batch, cancel)
                .await
                .map_err(|e| {
                    log::error!("第 {}/{} 批行情抓取失败: {}", index + 1, total, e);
                    e
                })?;

            if batch_lines.len() != batch.len() {
                log::warn!(
                    "第 {}/{} 批请求 {} 只，返回 {} 条",
                    index + 1,
                    total,
                    batch.len(),
                    batch_lines.len()
                );
            }
            lines.append(&mut batch_lines);
        }

        log::info!("📈 共 {} 批，获取 {} 条行情", total, lines.len());
        Ok(lines)
    }

    /// 抓取全部代码，跳过失败的批次
    ///
    /// 取消仍然立即返回 `Cancelled`；所有批次都失败时返回最后一个错误
    pub async fn fetch_available(
        &self,
        symbols: &[String],
        cancel: &CancellationToken,
    ) -> Result<PartialLines, FetchError> {
        let total = self.batch_count(symbols.len());
        let mut fetched = PartialLines {
            lines: Vec::with_capacity(symbols.len()),
            ..Default::default()
        };
        let mut last_error = None;

        for (index, batch) in symbols.chunks(self.batch_size).enumerate() {
            match self.source.fetch_batch(batch, cancel).await {
                Ok(mut batch_lines) => fetched.lines.append(&mut batch_lines),
                Err(FetchError::Cancelled) => return Err(FetchError::Cancelled),
                Err(e) => {
                    log::warn!("第 {}/{} 批行情抓取失败，跳过 {} 只: {}", index + 1, total, batch.len(), e);
                    fetched.failed_batches += 1;
                    fetched.missing_symbols += batch.len();
                    last_error = Some(e);
                }
            }
        }

        if let Some(e) = last_error {
            if fetched.failed_batches as usize == total {
                return Err(e);
            }
        }

        log::info!(
            "📈 共 {} 批，失败 {} 批，获取 {} 条行情",
            total,
            fetched.failed_batches,
            fetched.lines.len()
        );
        Ok(fetched)
    }
}
