//! 应用共享状态

use std::sync::Arc;
use tokio_util::sync::CancellationToken;

use crate::config::AppConfig;
use crate::services::history::{HistoryFetcher, IndexIngestor};
use crate::services::quote::{BatchCoordinator, HttpQuoteTransport, QuoteCodec, QuoteFetcher};
use crate::services::sink::{JsonlSink, Sink};

pub type LiveQuotes = BatchCoordinator<QuoteFetcher<HttpQuoteTransport>>;

/// 各处理器共享的流水线
pub struct AppState {
    pub quotes: LiveQuotes,
    pub ingestor: IndexIngestor<HistoryFetcher>,
    /// 进程退出时取消所有进行中的重试
    pub shutdown: CancellationToken,
}

impl AppState {
    pub fn from_config(config: &AppConfig, shutdown: CancellationToken) -> anyhow::Result<Self> {
        let encoding = config.quote.encoding();
        let transport = HttpQuoteTransport::new(
            config.request_timeout(),
            config.connect_timeout(),
            encoding.name(),
        )?;
        let fetcher = QuoteFetcher::new(
            transport,
            config.quote.base_url.clone(),
            QuoteCodec::new(encoding),
            config.quote.retry.to_retry_config(),
        );
        let quotes = BatchCoordinator::new(fetcher, config.quote.batch_size());

        let history = HistoryFetcher::new(
            config.history.base_url.clone(),
            config.request_timeout(),
            config.connect_timeout(),
        )?;
        let classes = Arc::new(config.index.class_table());
        if classes.is_empty() {
            log::warn!("未配置指数分类标签，入库记录的 sctype 将为空");
        }
        let class_count = classes.len();
        let sink: Arc<dyn Sink> = Arc::new(JsonlSink::new(config.sink.path.clone()));
        let ingestor = IndexIngestor::new(history, classes, sink, config.history.workers);

        log::info!(
            "行情批大小 {}，最大尝试 {} 次，指数分类 {} 个，落库文件 {}",
            quotes.batch_size(),
            config.quote.retry.max_attempts,
            class_count,
            config.sink.path.display()
        );

        Ok(Self {
            quotes,
            ingestor,
            shutdown,
        })
    }
}
