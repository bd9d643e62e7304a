//! 重试策略
//!
//! 固定上限的指数退避，不加随机抖动，便于测试

use std::time::Duration;

/// 重试参数
#[derive(Debug, Clone)]
pub struct RetryConfig {
    /// 最大尝试次数（含首次请求），至少为 1
    pub max_attempts: u32,
    /// 首次重试前的等待
    pub initial_delay: Duration,
    /// 单次等待上限
    pub max_delay: Duration,
    /// 退避倍数
    pub multiplier: f64,
}

impl Default for RetryConfig {
    fn default() -> Self {
        Self {
            max_attempts: 5,
            initial_delay: Duration::from_secs(5),
            max_delay: Duration::from_secs(60),
            multiplier: 2.0,
        }
    }
}

impl RetryConfig {
    pub fn new(max_attempts: u32, initial_delay: Duration, max_delay: Duration, multiplier: f64) -> Self {
        Self {
            max_attempts: max_attempts.max(1),
            initial_delay,
            max_delay,
            multiplier,
        }
    }

    /// 不等待的重试
    #[cfg(test)]
    pub fn immediate(max_attempts: u32) -> Self {
        Self::new(max_attempts, Duration::ZERO, Duration::ZERO, 1.0)
    }
}

/// 单次抓取的重试状态
#[derive(Debug)]
pub struct RetryPolicy {
    config: RetryConfig,
    current_delay: Duration,
    attempt_count: u32,
}

impl RetryPolicy {
    pub fn new(config: RetryConfig) -> Self {
        let current_delay = config.initial_delay;
        Self {
            config,
            current_delay,
            attempt_count: 0,
        }
    }

    /// 记录一次失败并返回下次重试前的等待时间
    ///
    /// 尝试次数达到上限时返回 `None`
    pub fn next_delay(&mut self) -> Option<Duration> {
        self.attempt_count += 1;
        if self.attempt_count >= self.config.max_attempts.max(1) {
            return None;
        }

        let delay = self.current_delay;
        let scaled = (self.current_delay.as_millis() as f64 * self.config.multiplier).round();
        let next_millis = if scaled.is_finite() && scaled > 0.0 {
            scaled as u64
        } else {
            0
        };
        self.current_delay = Duration::from_millis(next_millis).min(self.config.max_delay);

        Some(delay.min(self.config.max_delay))
    }

    /// 已失败的尝试次数
    pub fn attempt_count(&self) -> u32 {
        self.attempt_count
    }
}
