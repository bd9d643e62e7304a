//! 通用 API 响应模型

use serde::{Deserialize, Serialize};

use crate::services::common::get_beijing_time;

/// 统一 API 响应结构
///
/// 所有接口返回统一格式：
/// - success: 请求是否成功
/// - data: 响应数据（成功时有值）
/// - message: 响应消息
/// - timestamp: 响应时间戳（北京时间，RFC3339）
#[derive(Debug, Serialize, Deserialize)]
pub struct ApiResponse<T> {
    pub success: bool,
    pub data: Option<T>,
    pub message: String,
    pub timestamp: String,
}

impl<T> ApiResponse<T> {
    /// 创建成功响应
    pub fn success(data: T) -> Self {
        Self {
            success: true,
            data: Some(data),
            message: "Success".to_string(),
            timestamp: get_beijing_time(),
        }
    }

    /// 创建带说明的成功响应（如部分记录被跳过）
    pub fn success_with(data: T, message: impl Into<String>) -> Self {
        Self {
            message: message.into(),
            ..Self::success(data)
        }
    }

    /// 创建错误响应
    pub fn error(message: impl Into<String>) -> Self {
        Self {
            success: false,
            data: None,
            message: message.into(),
            timestamp: get_beijing_time(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_response_shape() {
        let ok = ApiResponse::success_with(3, "跳过 1 条");
        assert!(ok.success);
        assert_eq!(ok.data, Some(3));
        assert_eq!(ok.message, "跳过 1 条");
        assert!(ok.timestamp.ends_with("+08:00"));

        let err = ApiResponse::<u32>::error("上游不可用");
        assert!(!err.success);
        assert!(err.data.is_none());
    }
}
