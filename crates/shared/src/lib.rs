//! 共享库
//!
//! 包含运费折扣计算工具共用的配置加载、错误处理和日志初始化代码。

pub mod config;
pub mod error;
pub mod observability;
