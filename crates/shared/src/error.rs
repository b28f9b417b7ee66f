//! 统一错误处理模块
//!
//! 定义配置和外围协作方共享的错误类型，使用 thiserror 提供良好的错误信息。
//! 规则引擎核心本身没有错误路径，这里的错误只来自配置加载与校验。

use thiserror::Error;

/// 系统错误类型
#[derive(Debug, Error)]
pub enum ShipmentError {
    // ==================== 配置错误 ====================
    #[error("配置加载失败: {0}")]
    Config(#[from] config::ConfigError),

    // ==================== 验证错误 ====================
    #[error("参数验证失败: {0}")]
    Validation(String),

    #[error("无效的参数: {field} - {message}")]
    InvalidArgument { field: String, message: String },

    // ==================== 通用错误 ====================
    #[error("内部错误: {0}")]
    Internal(String),
}

/// 错误结果类型别名
pub type Result<T> = std::result::Result<T, ShipmentError>;

impl ShipmentError {
    /// 获取错误码
    pub fn code(&self) -> &'static str {
        match self {
            Self::Config(_) => "CONFIG_ERROR",
            Self::Validation(_) => "VALIDATION_ERROR",
            Self::InvalidArgument { .. } => "INVALID_ARGUMENT",
            Self::Internal(_) => "INTERNAL_ERROR",
        }
    }

    /// 构造字段级参数错误
    pub fn invalid_argument(field: impl Into<String>, message: impl Into<String>) -> Self {
        Self::InvalidArgument {
            field: field.into(),
            message: message.into(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_code() {
        let err = ShipmentError::invalid_argument("pricing.max_monthly_discount", "必须为正数");
        assert_eq!(err.code(), "INVALID_ARGUMENT");
        assert_eq!(
            err.to_string(),
            "无效的参数: pricing.max_monthly_discount - 必须为正数"
        );
    }

    #[test]
    fn test_config_error_conversion() {
        let err: ShipmentError = config::ConfigError::Message("boom".to_string()).into();
        assert_eq!(err.code(), "CONFIG_ERROR");
    }
}
