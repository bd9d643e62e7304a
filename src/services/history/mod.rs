//! 指数历史行情服务
//!
//! 数据来源：搜狐历史行情 https://q.stock.sohu.com/hisHq

mod codec;
mod fetcher;
mod ingestor;

pub use fetcher::{HistoryFetcher, HistorySource};
pub use ingestor::IndexIngestor;
