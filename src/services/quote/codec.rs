//! 腾讯实时行情响应解析
//!
//! 响应格式: `v_sh600519="1~贵州茅台~600519~1500.00~...";` 每只证券一条语句

use encoding_rs::Encoding;

use crate::models::RawQuoteLine;

/// 语句分隔符
pub const STATEMENT_DELIMITER: char = ';';
/// 字段分隔符
pub const FIELD_SEPARATOR: char = '~';

/// 实时行情解码器
#[derive(Debug, Clone, Copy)]
pub struct QuoteCodec {
    encoding: &'static Encoding,
    statement_delimiter: char,
    field_separator: char,
}

impl Default for QuoteCodec {
    fn default() -> Self {
        Self::new(encoding_rs::GBK)
    }
}

impl QuoteCodec {
    pub fn new(encoding: &'static Encoding) -> Self {
        Self {
            encoding,
            statement_delimiter: STATEMENT_DELIMITER,
            field_separator: FIELD_SEPARATOR,
        }
    }

    /// 解码响应体并按语句拆分
    ///
    /// 不校验字段个数；没有引号内容的语句被忽略，空内容保留为空字段列表
    pub fn parse(&self, body: &[u8]) -> Vec<RawQuoteLine> {
        let (text, _, had_errors) = self.encoding.decode(body);
        if had_errors {
            log::warn!("行情响应中存在无法按 {} 解码的字节", self.encoding.name());
        }

        text.split(self.statement_delimiter)
            .filter_map(|statement| self.parse_statement(statement))
            .collect()
    }

    fn parse_statement(&self, statement: &str) -> Option<RawQuoteLine> {
        let statement = statement.trim();
        if statement.is_empty() {
            return None;
        }

        let start = statement.find('"')?;
        let end = statement.rfind('"')?;
        if end <= start {
            return None;
        }

        let code = statement[..start]
            .trim_end_matches('=')
            .trim()
            .trim_start_matches("v_")
            .to_string();
        let payload = &statement[start + 1..end];

        let fields = if payload.is_empty() {
            Vec::new()
        } else {
            payload.split(self.field_separator).map(str::to_string).collect()
        };

        Some(RawQuoteLine::new(code, fields))
    }
}
