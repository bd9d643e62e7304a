//! 配置模块
//!
//! 支持从 JSON 文件加载系统配置

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fs;
use std::path::{Path, PathBuf};
use std::time::Duration;

use crate::models::SymbolClassTable;
use crate::services::common::{SOHU_HISTORY_BASE_URL, TX_QUOTE_BASE_URL};
use crate::services::quote::DEFAULT_BATCH_SIZE;
use crate::services::retry::RetryConfig;

/// 服务器配置
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ServerConfig {
    /// 监听地址
    #[serde(default = "default_host")]
    pub host: String,
    /// 监听端口
    #[serde(default = "default_port")]
    pub port: u16,
    /// 工作线程数（0 表示使用 CPU 核心数）
    #[serde(default)]
    pub workers: usize,
}

/// API 配置
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ApiConfig {
    /// API Key（为空则不启用认证）
    #[serde(default)]
    pub api_key: String,
    /// 请求超时时间（秒）
    #[serde(default = "default_timeout")]
    pub timeout_secs: u64,
    /// 连接超时时间（秒）
    #[serde(default = "default_connect_timeout")]
    pub connect_timeout_secs: u64,
}

/// 日志配置
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LogConfig {
    /// 日志级别: trace, debug, info, warn, error
    #[serde(default = "default_log_level")]
    pub level: String,
}

/// 重试配置（毫秒）
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RetrySettings {
    /// 最大尝试次数（含首次请求）
    #[serde(default = "default_max_attempts")]
    pub max_attempts: u32,
    /// 首次重试等待
    #[serde(default = "default_initial_delay_ms")]
    pub initial_delay_ms: u64,
    /// 等待上限
    #[serde(default = "default_max_delay_ms")]
    pub max_delay_ms: u64,
    /// 指数退避倍数
    #[serde(default = "default_multiplier")]
    pub multiplier: f64,
}

/// 实时行情配置
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct QuoteConfig {
    /// 行情接口地址
    #[serde(default = "default_quote_base_url")]
    pub base_url: String,
    /// 单次请求的最大代码数
    #[serde(default = "default_batch_size")]
    pub batch_size: usize,
    /// 上游声明的编码
    #[serde(default = "default_encoding")]
    pub encoding: String,
    #[serde(default)]
    pub retry: RetrySettings,
}

/// 历史指数配置
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct HistoryConfig {
    /// 历史行情接口地址
    #[serde(default = "default_history_base_url")]
    pub base_url: String,
    /// 多指数回补时的并发数
    #[serde(default = "default_history_workers")]
    pub workers: usize,
}

/// 指数分类配置
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct IndexConfig {
    /// 指数代码 -> 分类标签
    #[serde(default = "default_index_classes")]
    pub classes: BTreeMap<String, String>,
}

/// 落库配置
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SinkConfig {
    /// JSONL 输出文件
    #[serde(default = "default_sink_path")]
    pub path: PathBuf,
}

/// 应用配置
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct AppConfig {
    /// 服务器配置
    #[serde(default)]
    pub server: ServerConfig,
    /// API 配置
    #[serde(default)]
    pub api: ApiConfig,
    /// 日志配置
    #[serde(default)]
    pub log: LogConfig,
    #[serde(default)]
    pub quote: QuoteConfig,
    #[serde(default)]
    pub history: HistoryConfig,
    #[serde(default)]
    pub index: IndexConfig,
    #[serde(default)]
    pub sink: SinkConfig,
}

// 默认值函数
fn default_host() -> String { "0.0.0.0".to_string() }
fn default_port() -> u16 { 8080 }
fn default_timeout() -> u64 { 30 }
fn default_connect_timeout() -> u64 { 10 }
fn default_log_level() -> String { "info".to_string() }
fn default_max_attempts() -> u32 { 5 }
fn default_initial_delay_ms() -> u64 { 5_000 }
fn default_max_delay_ms() -> u64 { 60_000 }
fn default_multiplier() -> f64 { 2.0 }
fn default_quote_base_url() -> String { TX_QUOTE_BASE_URL.to_string() }
fn default_batch_size() -> usize { DEFAULT_BATCH_SIZE }
fn default_encoding() -> String { "gb2312".to_string() }
fn default_history_base_url() -> String { SOHU_HISTORY_BASE_URL.to_string() }
fn default_history_workers() -> usize { 4 }
fn default_sink_path() -> PathBuf { PathBuf::from("data/marketindex.jsonl") }

fn default_index_classes() -> BTreeMap<String, String> {
    [
        ("000001", "上证"),
        ("399001", "深证"),
        ("399006", "创业板"),
        ("899050", "北交所"),
    ]
    .into_iter()
    .map(|(code, label)| (code.to_string(), label.to_string()))
    .collect()
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            host: default_host(),
            port: default_port(),
            workers: 0,
        }
    }
}

impl Default for ApiConfig {
    fn default() -> Self {
        Self {
            api_key: String::new(),
            timeout_secs: default_timeout(),
            connect_timeout_secs: default_connect_timeout(),
        }
    }
}

impl Default for LogConfig {
    fn default() -> Self {
        Self {
            level: default_log_level(),
        }
    }
}

impl Default for RetrySettings {
    fn default() -> Self {
        Self {
            max_attempts: default_max_attempts(),
            initial_delay_ms: default_initial_delay_ms(),
            max_delay_ms: default_max_delay_ms(),
            multiplier: default_multiplier(),
        }
    }
}

impl Default for QuoteConfig {
    fn default() -> Self {
        Self {
            base_url: default_quote_base_url(),
            batch_size: default_batch_size(),
            encoding: default_encoding(),
            retry: RetrySettings::default(),
        }
    }
}

impl Default for HistoryConfig {
    fn default() -> Self {
        Self {
            base_url: default_history_base_url(),
            workers: default_history_workers(),
        }
    }
}

impl Default for IndexConfig {
    fn default() -> Self {
        Self {
            classes: default_index_classes(),
        }
    }
}

impl Default for SinkConfig {
    fn default() -> Self {
        Self {
            path: default_sink_path(),
        }
    }
}

impl RetrySettings {
    /// 转换为重试策略参数
    pub fn to_retry_config(&self) -> RetryConfig {
        RetryConfig::new(
            self.max_attempts,
            Duration::from_millis(self.initial_delay_ms),
            Duration::from_millis(self.max_delay_ms),
            self.multiplier,
        )
    }
}

impl QuoteConfig {
    /// 解析上游编码，未知标签回退到 GBK
    pub fn encoding(&self) -> &'static encoding_rs::Encoding {
        encoding_rs::Encoding::for_label(self.encoding.as_bytes()).unwrap_or_else(|| {
            log::warn!("未知编码 {}，回退到 GBK", self.encoding);
            encoding_rs::GBK
        })
    }

    /// 批大小至少为 1
    pub fn batch_size(&self) -> usize {
        self.batch_size.max(1)
    }
}

impl IndexConfig {
    pub fn class_table(&self) -> SymbolClassTable {
        SymbolClassTable::new(self.classes.clone())
    }
}

/// 配置来源
#[derive(Debug, Default)]
pub struct ConfigSource {
    /// 成功加载的文件，`None` 表示使用默认配置
    pub path: Option<String>,
    /// 加载失败的文件及原因
    pub failures: Vec<(String, String)>,
}

impl ConfigSource {
    /// 输出加载过程
    pub fn log(&self) {
        for (path, reason) in &self.failures {
            log::warn!("加载配置文件 {} 失败: {}", path, reason);
        }
        match &self.path {
            Some(path) => log::info!("从 {} 加载配置成功", path),
            None => log::info!("使用默认配置"),
        }
    }
}

impl AppConfig {
    /// 从 JSON 文件加载配置
    pub fn from_file<P: AsRef<Path>>(path: P) -> anyhow::Result<Self> {
        let content = fs::read_to_string(path)?;
        let config: AppConfig = serde_json::from_str(&content)?;
        Ok(config)
    }

    /// 加载配置，优先从文件，失败则使用默认值
    ///
    /// 日志系统依赖配置中的级别，加载过程先记入 [`ConfigSource`]，初始化日志后再输出
    pub fn load() -> (Self, ConfigSource) {
        let config_paths = ["config.json", "config/config.json"];
        let mut failures = Vec::new();

        for path in config_paths {
            if Path::new(path).exists() {
                match Self::from_file(path) {
                    Ok(config) => {
                        return (
                            config,
                            ConfigSource {
                                path: Some(path.to_string()),
                                failures,
                            },
                        );
                    }
                    Err(e) => failures.push((path.to_string(), e.to_string())),
                }
            }
        }

        (Self::default(), ConfigSource { path: None, failures })
    }

    /// 获取服务器绑定地址
    pub fn bind_addr(&self) -> String {
        format!("{}:{}", self.server.host, self.server.port)
    }

    /// 上游请求超时
    pub fn request_timeout(&self) -> Duration {
        Duration::from_secs(self.api.timeout_secs)
    }

    pub fn connect_timeout(&self) -> Duration {
        Duration::from_secs(self.api.connect_timeout_secs)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config() {
        let config = AppConfig::default();
        assert_eq!(config.bind_addr(), "0.0.0.0:8080");
        assert_eq!(config.quote.batch_size(), 300);
        assert_eq!(config.quote.retry.max_attempts, 5);
        assert_eq!(config.index.classes.get("899050").map(String::as_str), Some("北交所"));
    }

    #[test]
    fn test_partial_json_uses_defaults() {
        let json = r#"{
            "quote": { "batch_size": 0, "retry": { "max_attempts": 2 } },
            "index": { "classes": { "000300": "沪深300" } }
        }"#;
        let config: AppConfig = serde_json::from_str(json).unwrap();

        assert_eq!(config.quote.batch_size(), 1);
        assert_eq!(config.quote.base_url, "https://qt.gtimg.cn");
        assert_eq!(config.quote.retry.max_attempts, 2);
        assert_eq!(config.quote.retry.initial_delay_ms, 5_000);
        assert_eq!(config.index.class_table().label("000300"), "沪深300");
        assert_eq!(config.index.class_table().label("000001"), "");
        assert_eq!(config.history.workers, 4);
    }

    #[test]
    fn test_encoding_label() {
        let mut config = QuoteConfig::default();
        assert_eq!(config.encoding(), encoding_rs::GBK);

        config.encoding = "no-such-charset".to_string();
        assert_eq!(config.encoding(), encoding_rs::GBK);
    }

    #[test]
    fn test_from_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("config.json");
        fs::write(&path, r#"{ "server": { "port": 9090 }, "api": { "api_key": "k" } }"#).unwrap();

        let config = AppConfig::from_file(&path).unwrap();
        assert_eq!(config.server.port, 9090);
        assert_eq!(config.api.api_key, "k");
        assert_eq!(config.api.timeout_secs, 30);
    }
}
