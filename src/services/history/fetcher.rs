//! 搜狐历史行情抓取
//!
//! 单次 GET，不重试，失败直接返回给调用方

use async_trait::async_trait;
use chrono::NaiveDate;
use reqwest::Client;
use std::time::Duration;
use url::Url;

use crate::services::common::USER_AGENT;
use crate::services::error::FetchError;

/// 历史行情数据源
#[async_trait]
pub trait HistorySource: Send + Sync {
    /// 返回指定指数在日期区间内的原始响应
    async fn fetch(&self, index_code: &str, start: NaiveDate, end: NaiveDate) -> Result<String, FetchError>;
}

/// 历史指数抓取器
pub struct HistoryFetcher {
    client: Client,
    base_url: String,
}

impl HistoryFetcher {
    pub fn new(
        base_url: impl Into<String>,
        timeout: Duration,
        connect_timeout: Duration,
    ) -> Result<Self, FetchError> {
        let client = Client::builder()
            .timeout(timeout)
            .connect_timeout(connect_timeout)
            .build()?;

        Ok(Self {
            client,
            base_url: base_url.into(),
        })
    }

    /// `{base}/hisHq?code=zs_000001&start=20250901&end=20250920`
    pub fn url_for(&self, index_code: &str, start: NaiveDate, end: NaiveDate) -> Result<Url, FetchError> {
        let mut url = Url::parse(&format!("{}/hisHq", self.base_url.trim_end_matches('/')))?;
        url.query_pairs_mut()
            .append_pair("code", &format!("zs_{}", index_code.trim().to_lowercase()))
            .append_pair("start", &start.format("%Y%m%d").to_string())
            .append_pair("end", &end.format("%Y%m%d").to_string());
        Ok(url)
    }
}

#[async_trait]
impl HistorySource for HistoryFetcher {
    async fn fetch(&self, index_code: &str, start: NaiveDate, end: NaiveDate) -> Result<String, FetchError> {
        let url = self.url_for(index_code, start, end)?;
        log::info!("📡 请求指数历史数据 URL: {}", url);

        let response = self
            .client
            .get(url)
            .header("Referer", "https://q.stock.sohu.com/")
            .header("User-Agent", USER_AGENT)
            .send()
            .await?;

        if !response.status().is_success() {
            return Err(FetchError::Status(response.status().as_u16()));
        }

        let text = response.text_with_charset("gbk").await?;
        let preview: String = text.chars().take(200).collect();
        log::debug!("📥 原始响应数据: {}", preview);
        Ok(text)
    }
}
