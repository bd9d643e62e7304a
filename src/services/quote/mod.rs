//! 实时行情服务
//!
//! 数据来源：腾讯行情 https://qt.gtimg.cn/q=
//!
//! 代码列表 -> 分批 -> 单批抓取（带重试）-> 解码 -> 原始行情行

mod batch;
mod codec;
mod fetcher;
mod stats;

pub use batch::{BatchCoordinator, DEFAULT_BATCH_SIZE};
pub use codec::QuoteCodec;
pub use fetcher::{HttpQuoteTransport, QuoteFetcher};
