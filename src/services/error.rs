//! 抓取流水线错误类型

use thiserror::Error;

/// 行情抓取错误
///
/// `Network` / `EmptyStream` / `Status` 为瞬时错误，可以重试；
/// `Malformed` 重试也无法恢复，直接上抛
#[derive(Debug, Error)]
pub enum FetchError {
    #[error("网络请求失败: {0}")]
    Network(#[from] reqwest::Error),

    #[error("上游返回空响应流")]
    EmptyStream,

    #[error("上游状态码异常: {0}")]
    Status(u16),

    #[error("响应格式错误: {0}")]
    Malformed(String),

    #[error("请求地址无效: {0}")]
    InvalidUrl(#[from] url::ParseError),

    /// 重试次数用尽
    #[error("重试 {attempts} 次后仍失败: {last}")]
    Exhausted {
        attempts: u32,
        #[source]
        last: Box<FetchError>,
    },

    #[error("请求已取消")]
    Cancelled,
}

impl FetchError {
    /// 是否为可重试的瞬时错误
    pub fn is_transient(&self) -> bool {
        matches!(
            self,
            FetchError::Network(_) | FetchError::EmptyStream | FetchError::Status(_)
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_transient_classification() {
        assert!(FetchError::EmptyStream.is_transient());
        assert!(FetchError::Status(503).is_transient());
        assert!(!FetchError::Malformed("x".into()).is_transient());
        assert!(!FetchError::Cancelled.is_transient());

        let exhausted = FetchError::Exhausted {
            attempts: 3,
            last: Box::new(FetchError::EmptyStream),
        };
        assert!(!exhausted.is_transient());
        assert_eq!(exhausted.to_string(), "重试 3 次后仍失败: 上游返回空响应流");
    }
}
