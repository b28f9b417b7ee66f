//! 规则引擎错误类型
//!
//! 引擎运行本身不会失败，这里的错误只来自外围协作方：定价配置转换、输入读取和结果序列化。

use thiserror::Error;

#[derive(Debug, Error)]
pub enum RuleError {
    #[error("定价配置无效: {0}")]
    InvalidPricing(String),

    #[error("输入解析失败: {0}")]
    ParseError(String),

    #[error("读取输入失败: {0}")]
    Io(#[from] std::io::Error),

    #[error("JSON 序列化错误: {0}")]
    JsonError(#[from] serde_json::Error),
}

pub type Result<T> = std::result::Result<T, RuleError>;
