//! 运费折扣规则引擎
//!
//! 按顺序将一组规则应用到每条发货记录上，支持：
//! - 参数化条件与规则组合
//! - 纯函数式的记录变换流水线
//! - 跨记录共享的月度聚合状态（大件计数、累计折扣上限）
//! - 输入解析与结果渲染

pub mod conditions;
pub mod dependencies;
pub mod engine;
pub mod error;
pub mod models;
pub mod parser;
pub mod report;
pub mod rule;
pub mod rules;
pub mod store;

pub use conditions::Condition;
pub use dependencies::{Dependencies, PricingTable};
pub use engine::RuleEngine;
pub use error::{Result, RuleError};
pub use models::{Fact, MonthPeriod, PackageSize, ShipmentDate, ShippingProvider};
pub use rule::Rule;
pub use store::{AggregateField, MonthAggregate, MonthAggregateStore};
