//! 行情采集后端服务
//!
//! 分批抓取A股实时行情、统计全市场涨跌，抓取指数历史日线并落库
//! 数据来源：腾讯行情、搜狐历史行情

mod config;     // 配置
mod handlers;   // HTTP 请求处理器
mod middleware; // 中间件
mod models;     // 数据模型定义
mod services;   // 抓取、解析与落库流水线
mod state;      // 共享状态

use actix_web::{middleware::Logger, web, App, HttpServer};
use env_logger::Env;
use std::env;
use tokio_util::sync::CancellationToken;

use crate::config::AppConfig;
use crate::middleware::ApiKeyMiddleware;
use crate::state::AppState;

/// 应用程序入口
#[actix_web::main]
async fn main() -> anyhow::Result<()> {
    let (mut config, source) = AppConfig::load();

    // 初始化日志系统，RUST_LOG 优先于配置文件
    env_logger::init_from_env(Env::default().default_filter_or(config.log.level.as_str()));
    source.log();

    // 环境变量中的 API Key 覆盖配置文件
    if let Ok(api_key) = env::var("API_KEY") {
        config.api.api_key = api_key;
    }
    if config.api.api_key.is_empty() {
        log::warn!("未设置 API_KEY，接口不启用认证");
    }

    let shutdown = CancellationToken::new();
    let state = web::Data::new(AppState::from_config(&config, shutdown.clone())?);

    // Ctrl-C 时中断进行中的重试等待
    let signal_token = shutdown.clone();
    actix_web::rt::spawn(async move {
        if tokio::signal::ctrl_c().await.is_ok() {
            log::info!("收到退出信号，取消进行中的抓取");
            signal_token.cancel();
        }
    });

    log::info!("启动行情采集服务，监听 {}", config.bind_addr());

    let api_key = config.api.api_key.clone();
    let mut server = HttpServer::new(move || {
        App::new()
            .app_data(state.clone())
            .wrap(ApiKeyMiddleware::new(api_key.clone())) // API Key 认证
            .wrap(Logger::default()) // 请求日志
            .configure(handlers::config)
    });
    if config.server.workers > 0 {
        server = server.workers(config.server.workers);
    }

    server.bind(config.bind_addr())?.run().await?;
    Ok(())
}
