//! 业务逻辑服务模块
//!
//! 行情抓取、解析、重试与落库流水线

pub mod common;  // 接口常量与辅助函数
pub mod error;   // 抓取错误分类
pub mod history; // 指数历史行情
pub mod quote;   // 实时行情
pub mod retry;   // 重试策略
pub mod sink;    // 落库
