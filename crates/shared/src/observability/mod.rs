//! 统一可观测性模块
//!
//! 提供日志的统一初始化。所有入口通过单一入口点配置，保证日志字段和格式一致。
//! 日志固定输出到 stderr，stdout 留给计算结果。

pub mod tracing;

use ::tracing::debug;
use anyhow::Result;

use crate::config::ObservabilityConfig;

/// 统一初始化可观测性
///
/// # Example
///
/// ```ignore
/// use shipment_shared::config::AppConfig;
/// use shipment_shared::observability;
///
/// fn main() -> anyhow::Result<()> {
///     let config = AppConfig::load("shipment-discounts")?;
///     observability::init(&config.observability)?;
///
///     // 应用逻辑...
///
///     Ok(())
/// }
/// ```
pub fn init(config: &ObservabilityConfig) -> Result<()> {
    tracing::init(config)?;

    debug!(
        log_level = %config.log_level,
        log_format = %config.log_format,
        "Observability initialized"
    );

    Ok(())
}
