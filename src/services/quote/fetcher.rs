//! 实时行情抓取
//!
//! 单批代码一次 GET，空响应流和网络错误按退避策略重试，格式错误直接上抛

use async_trait::async_trait;
use reqwest::Client;
use std::time::Duration;
use tokio_util::sync::CancellationToken;

use crate::models::RawQuoteLine;
use crate::services::common::{get_beijing_time, USER_AGENT};
use crate::services::error::FetchError;
use crate::services::retry::{RetryConfig, RetryPolicy};

use super::codec::QuoteCodec;

/// 行情传输层
#[async_trait]
pub trait QuoteTransport: Send + Sync {
    /// 打开响应流，上游没有返回内容时为 `Ok(None)`
    async fn open(&self, url: &str) -> Result<Option<Vec<u8>>, FetchError>;
}

/// 基于 reqwest 的传输层
pub struct HttpQuoteTransport {
    client: Client,
    charset: String,
}

impl HttpQuoteTransport {
    pub fn new(
        timeout: Duration,
        connect_timeout: Duration,
        charset: impl Into<String>,
    ) -> Result<Self, FetchError> {
        let client = Client::builder()
            .timeout(timeout)
            .connect_timeout(connect_timeout)
            .build()?;

        Ok(Self {
            client,
            charset: charset.into(),
        })
    }
}

#[async_trait]
impl QuoteTransport for HttpQuoteTransport {
    async fn open(&self, url: &str) -> Result<Option<Vec<u8>>, FetchError> {
        let response = self
            .client
            .get(url)
            .header("Accept-Charset", self.charset.as_str())
            .header("Referer", "https://gu.qq.com/")
            .header("User-Agent", USER_AGENT)
            .send()
            .await?;

        if !response.status().is_success() {
            return Err(FetchError::Status(response.status().as_u16()));
        }

        let bytes = response.bytes().await?;
        if bytes.is_empty() {
            return Ok(None);
        }
        Ok(Some(bytes.to_vec()))
    }
}

/// 按批抓取行情的数据源
#[async_trait]
pub trait QuoteBatchSource: Send + Sync {
    async fn fetch_batch(
        &self,
        symbols: &[String],
        cancel: &CancellationToken,
    ) -> Result<Vec<RawQuoteLine>, FetchError>;
}

/// 实时行情抓取器
pub struct QuoteFetcher<T> {
    transport: T,
    base_url: String,
    codec: QuoteCodec,
    retry: RetryConfig,
}

impl<T: QuoteTransport> QuoteFetcher<T> {
    pub fn new(transport: T, base_url: impl Into<String>, codec: QuoteCodec, retry: RetryConfig) -> Self {
        Self {
            transport,
            base_url: base_url.into(),
            codec,
            retry,
        }
    }

    /// 拼接请求地址: `{base}/q=sh600519,sz000858`
    pub fn url_for(&self, symbol_csv: &str) -> String {
        format!("{}/q={}", self.base_url.trim_end_matches('/'), symbol_csv)
    }

    /// 抓取一批逗号分隔的代码
    pub async fn fetch(
        &self,
        symbol_csv: &str,
        cancel: &CancellationToken,
    ) -> Result<Vec<RawQuoteLine>, FetchError> {
        let url = self.url_for(symbol_csv);
        let mut policy = RetryPolicy::new(self.retry.clone());

        loop {
            log::info!("📡 请求实时行情 URL: {}", url);

            let opened = tokio::select! {
                _ = cancel.cancelled() => return Err(FetchError::Cancelled),
                opened = self.transport.open(&url) => opened,
            };

            let error = match opened {
                Ok(Some(body)) => return Ok(self.codec.parse(&body)),
                Ok(None) => FetchError::EmptyStream,
                Err(e) if e.is_transient() => e,
                Err(e) => {
                    log::error!("行情请求失败且不可重试: {}", e);
                    return Err(e);
                }
            };

            match policy.next_delay() {
                Some(delay) => {
                    log::warn!(
                        "[{}] 行情请求第 {} 次失败: {}，{}ms 后重试",
                        get_beijing_time(),
                        policy.attempt_count(),
                        error,
                        delay.as_millis()
                    );
                    tokio::select! {
                        _ = cancel.cancelled() => return Err(FetchError::Cancelled),
                        _ = tokio::time::sleep(delay) => {}
                    }
                }
                None => {
                    log::error!("行情请求重试 {} 次后放弃: {}", policy.attempt_count(), error);
                    return Err(FetchError::Exhausted {
                        attempts: policy.attempt_count(),
                        last: Box::new(error),
                    });
                }
            }
        }
    }
}

#[async_trait]
impl<T: QuoteTransport> QuoteBatchSource for QuoteFetcher<T> {
    async fn fetch_batch(
        &self,
        symbols: &[String],
        cancel: &CancellationToken,
    ) -> Result<Vec<RawQuoteLine>, FetchError> {
        self.fetch(&symbols.join(","), cancel).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::VecDeque;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::sync::Mutex;

    /// 按顺序回放预设响应，回放完后一直返回空流
    struct ScriptedTransport {
        responses: Mutex<VecDeque<Result<Option<Vec<u8>>, FetchError>>>,
        calls: AtomicUsize,
        urls: Mutex<Vec<String>>,
    }

    impl ScriptedTransport {
        fn new(responses: Vec<Result<Option<Vec<u8>>, FetchError>>) -> Self {
            Self {
                responses: Mutex::new(responses.into()),
                calls: AtomicUsize::new(0),
                urls: Mutex::new(Vec::new()),
            }
        }

        fn calls(&self) -> usize {
            self.calls.load(Ordering::SeqCst)
        }
    }

    #[async_trait]
    impl QuoteTransport for ScriptedTransport {
        async fn open(&self, url: &str) -> Result<Option<Vec<u8>>, FetchError> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            self.urls.lock().unwrap().push(url.to_string());
            self.responses.lock().unwrap().pop_front().unwrap_or(Ok(None))
        }
    }

    fn body(text: &str) -> Vec<u8> {
        encoding_rs::GBK.encode(text).0.into_owned()
    }

    fn fetcher(transport: ScriptedTransport, attempts: u32) -> QuoteFetcher<ScriptedTransport> {
        QuoteFetcher::new(
            transport,
            "https://qt.gtimg.cn/",
            QuoteCodec::default(),
            RetryConfig::immediate(attempts),
        )
    }

    #[tokio::test]
    async fn test_fetch_success_first_try() {
        let transport = ScriptedTransport::new(vec![Ok(Some(body(
            "v_sh600519=\"1~贵州茅台~600519\";v_sz000858=\"51~五粮液~000858\";",
        )))]);
        let fetcher = fetcher(transport, 3);

        let lines = fetcher
            .fetch("sh600519,sz000858", &CancellationToken::new())
            .await
            .unwrap();

        assert_eq!(lines.len(), 2);
        assert_eq!(lines[1].field(1), Some("五粮液"));
        assert_eq!(fetcher.transport.calls(), 1);
        assert_eq!(
            fetcher.transport.urls.lock().unwrap()[0],
            "https://qt.gtimg.cn/q=sh600519,sz000858"
        );
    }

    #[tokio::test]
    async fn test_null_stream_then_success() {
        let transport = ScriptedTransport::new(vec![
            Ok(None),
            Err(FetchError::Status(502)),
            Ok(Some(body("v_sh600519=\"1~贵州茅台~600519\";"))),
        ]);
        let fetcher = fetcher(transport, 5);

        let lines = fetcher.fetch("sh600519", &CancellationToken::new()).await.unwrap();

        assert_eq!(lines.len(), 1);
        assert_eq!(fetcher.transport.calls(), 3);
    }

    #[tokio::test]
    async fn test_always_null_stream_is_bounded() {
        let fetcher = fetcher(ScriptedTransport::new(Vec::new()), 4);

        let err = fetcher.fetch("sh600519", &CancellationToken::new()).await.unwrap_err();

        match err {
            FetchError::Exhausted { attempts, last } => {
                assert_eq!(attempts, 4);
                assert!(matches!(*last, FetchError::EmptyStream));
            }
            other => panic!("期望 Exhausted，实际 {:?}", other),
        }
        assert_eq!(fetcher.transport.calls(), 4);
    }

    #[tokio::test]
    async fn test_malformed_not_retried() {
        let transport = ScriptedTransport::new(vec![Err(FetchError::Malformed("bad".into()))]);
        let fetcher = fetcher(transport, 5);

        let err = fetcher.fetch("sh600519", &CancellationToken::new()).await.unwrap_err();

        assert!(matches!(err, FetchError::Malformed(_)));
        assert_eq!(fetcher.transport.calls(), 1);
    }

    #[tokio::test]
    async fn test_cancel_stops_retry_wait() {
        let fetcher = QuoteFetcher::new(
            ScriptedTransport::new(Vec::new()),
            "https://qt.gtimg.cn",
            QuoteCodec::default(),
            RetryConfig::new(10, Duration::from_secs(3600), Duration::from_secs(3600), 1.0),
        );
        let cancel = CancellationToken::new();
        let trigger = cancel.clone();
        tokio::spawn(async move {
            tokio::time::sleep(Duration::from_millis(20)).await;
            trigger.cancel();
        });

        let err = fetcher.fetch("sh600519", &cancel).await.unwrap_err();

        assert!(matches!(err, FetchError::Cancelled));
        assert_eq!(fetcher.transport.calls(), 1);
    }

    #[tokio::test]
    async fn test_fetch_batch_joins_symbols() {
        let fetcher = fetcher(ScriptedTransport::new(vec![Ok(Some(body("")))]), 1);
        let symbols = vec!["sh600519".to_string(), "sz000858".to_string()];

        let lines = fetcher.fetch_batch(&symbols, &CancellationToken::new()).await.unwrap();

        assert!(lines.is_empty());
        assert!(fetcher.transport.urls.lock().unwrap()[0].ends_with("/q=sh600519,sz000858"));
    }
}
