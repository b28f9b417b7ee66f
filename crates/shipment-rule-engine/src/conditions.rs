//! 条件定义与评估
//!
//! 条件是带参数的纯谓词 `(fact, dependencies) -> bool`。内置条件用标签枚举表示，
//! 由 [`Condition::evaluate`] 统一解释；临时条件通过 [`custom`] 包装闭包。
//! 所有条件只读，不修改聚合存储。

use crate::dependencies::Dependencies;
use crate::models::{Fact, PackageSize, ShippingProvider};
use std::fmt;
use std::sync::Arc;

/// 自定义谓词
pub type Predicate = dyn Fn(&Fact, &Dependencies) -> bool + Send + Sync;

/// 条件
#[derive(Clone)]
pub enum Condition {
    /// 恒为真
    Always,
    /// 包裹尺寸等于给定值
    PackageSize(PackageSize),
    /// 承运商等于给定值
    Provider(ShippingProvider),
    /// 当月大件计数恰好等于给定值
    MonthlyShipmentNumber(u32),
    /// 当月累计折扣严格小于给定上限
    AllowedToGiveDiscount(f64),
    /// 承运商在已知集合中
    OnlyKnownShippingProvider,
    /// 自定义闭包
    Custom {
        name: String,
        predicate: Arc<Predicate>,
    },
}

impl Condition {
    /// 评估条件
    pub fn evaluate(&self, fact: &Fact, dependencies: &Dependencies) -> bool {
        match self {
            Self::Always => true,
            Self::PackageSize(size) => fact.package_size == *size,
            Self::Provider(provider) => fact.shipping_provider == *provider,
            Self::MonthlyShipmentNumber(count) => {
                dependencies.store().get(&fact.period()).large_shipment_count == *count
            }
            Self::AllowedToGiveDiscount(limit) => {
                dependencies.store().get(&fact.period()).accumulated_discount < *limit
            }
            Self::OnlyKnownShippingProvider => {
                dependencies.is_known_provider(&fact.shipping_provider)
            }
            Self::Custom { predicate, .. } => predicate(fact, dependencies),
        }
    }
}

impl fmt::Display for Condition {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Always => write!(f, "always"),
            Self::PackageSize(size) => write!(f, "package_size == {}", size),
            Self::Provider(provider) => write!(f, "provider == {}", provider),
            Self::MonthlyShipmentNumber(count) => write!(f, "monthly_shipment_number == {}", count),
            Self::AllowedToGiveDiscount(limit) => write!(f, "accumulated_discount < {}", limit),
            Self::OnlyKnownShippingProvider => write!(f, "provider in known_providers"),
            Self::Custom { name, .. } => write!(f, "custom({})", name),
        }
    }
}

impl fmt::Debug for Condition {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Condition({})", self)
    }
}

pub fn always() -> Condition {
    Condition::Always
}

pub fn is_package_size(size: PackageSize) -> Condition {
    Condition::PackageSize(size)
}

pub fn is_provider(provider: impl Into<ShippingProvider>) -> Condition {
    Condition::Provider(provider.into())
}

pub fn is_monthly_shipment_number(count: u32) -> Condition {
    Condition::MonthlyShipmentNumber(count)
}

pub fn is_allowed_to_give_discount(limit: f64) -> Condition {
    Condition::AllowedToGiveDiscount(limit)
}

pub fn only_known_shipping_provider() -> Condition {
    Condition::OnlyKnownShippingProvider
}

/// 用闭包构造临时条件
pub fn custom<F>(name: impl Into<String>, predicate: F) -> Condition
where
    F: Fn(&Fact, &Dependencies) -> bool + Send + Sync + 'static,
{
    Condition::Custom {
        name: name.into(),
        predicate: Arc::new(predicate),
    }
}
