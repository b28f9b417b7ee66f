//! 规则依赖
//!
//! 每个条件和效果都会拿到同一个依赖包：价格表、月度折扣上限、已知承运商与尺寸，
//! 以及唯一可变的月度聚合存储。除存储外的字段在运行期间只读。

use crate::error::{Result, RuleError};
use crate::models::{PackageSize, ShippingProvider};
use crate::store::MonthAggregateStore;
use shipment_shared::config::PricingConfig;
use std::collections::{BTreeMap, BTreeSet};
use tracing::debug;

/// 价格表（承运商 × 尺寸 → 价格）
#[derive(Debug, Clone, Default, PartialEq)]
pub struct PricingTable {
    prices: BTreeMap<ShippingProvider, BTreeMap<PackageSize, f64>>,
}

impl PricingTable {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_price(
        mut self,
        provider: impl Into<ShippingProvider>,
        size: PackageSize,
        price: f64,
    ) -> Self {
        self.insert(provider, size, price);
        self
    }

    pub fn insert(&mut self, provider: impl Into<ShippingProvider>, size: PackageSize, price: f64) {
        self.prices
            .entry(provider.into())
            .or_default()
            .insert(size, price);
    }

    pub fn price(&self, provider: &ShippingProvider, size: &PackageSize) -> Option<f64> {
        self.prices.get(provider)?.get(size).copied()
    }

    /// 所有承运商中某尺寸的最低价
    pub fn min_price(&self, size: &PackageSize) -> Option<f64> {
        self.prices
            .values()
            .filter_map(|sizes| sizes.get(size).copied())
            .reduce(f64::min)
    }

    pub fn providers(&self) -> impl Iterator<Item = &ShippingProvider> {
        self.prices.keys()
    }
}

/// 依赖包
#[derive(Debug, Clone)]
pub struct Dependencies {
    pricing: PricingTable,
    max_monthly_discount: f64,
    known_providers: BTreeSet<ShippingProvider>,
    known_sizes: BTreeSet<PackageSize>,
    store: MonthAggregateStore,
}

impl Dependencies {
    /// 创建依赖包，使用全新的聚合存储
    pub fn new(
        pricing: PricingTable,
        max_monthly_discount: f64,
        known_providers: impl IntoIterator<Item = ShippingProvider>,
        known_sizes: impl IntoIterator<Item = PackageSize>,
    ) -> Self {
        Self {
            pricing,
            max_monthly_discount,
            known_providers: known_providers.into_iter().collect(),
            known_sizes: known_sizes.into_iter().collect(),
            store: MonthAggregateStore::new(),
        }
    }

    /// 替换聚合存储
    pub fn with_store(mut self, store: MonthAggregateStore) -> Self {
        self.store = store;
        self
    }

    /// 从定价配置构建
    pub fn from_config(config: &PricingConfig) -> Result<Self> {
        config
            .validate()
            .map_err(|e| RuleError::InvalidPricing(e.to_string()))?;

        let pricing = config
            .prices
            .iter()
            .fold(PricingTable::new(), |table, entry| {
                table.with_price(
                    entry.provider.as_str(),
                    PackageSize::parse(&entry.package_size),
                    entry.price,
                )
            });

        let dependencies = Self::new(
            pricing,
            config.max_monthly_discount,
            config
                .known_providers
                .iter()
                .map(|code| ShippingProvider::new(code.as_str())),
            config
                .known_package_sizes
                .iter()
                .map(|code| PackageSize::parse(code)),
        );

        debug!(
            providers = dependencies.known_providers.len(),
            sizes = dependencies.known_sizes.len(),
            max_monthly_discount = dependencies.max_monthly_discount,
            "依赖包已从配置构建"
        );

        Ok(dependencies)
    }

    pub fn pricing(&self) -> &PricingTable {
        &self.pricing
    }

    pub fn max_monthly_discount(&self) -> f64 {
        self.max_monthly_discount
    }

    pub fn known_providers(&self) -> &BTreeSet<ShippingProvider> {
        &self.known_providers
    }

    pub fn known_sizes(&self) -> &BTreeSet<PackageSize> {
        &self.known_sizes
    }

    pub fn is_known_provider(&self, provider: &ShippingProvider) -> bool {
        self.known_providers.contains(provider)
    }

    pub fn is_known_size(&self, size: &PackageSize) -> bool {
        self.known_sizes.contains(size)
    }

    pub fn store(&self) -> &MonthAggregateStore {
        &self.store
    }

    /// 唯一的可变访问入口
    pub fn store_mut(&mut self) -> &mut MonthAggregateStore {
        &mut self.store
    }
}

impl Default for Dependencies {
    /// 默认价格表：LP（S 1.5 / M 4.9 / L 6.9），MR（S 2 / M 3 / L 4），上限 10
    fn default() -> Self {
        let pricing = PricingTable::new()
            .with_price(ShippingProvider::la_poste(), PackageSize::Small, 1.5)
            .with_price(ShippingProvider::la_poste(), PackageSize::Medium, 4.9)
            .with_price(ShippingProvider::la_poste(), PackageSize::Large, 6.9)
            .with_price(ShippingProvider::mondial_relay(), PackageSize::Small, 2.0)
            .with_price(ShippingProvider::mondial_relay(), PackageSize::Medium, 3.0)
            .with_price(ShippingProvider::mondial_relay(), PackageSize::Large, 4.0);

        Self::new(
            pricing,
            10.0,
            [ShippingProvider::la_poste(), ShippingProvider::mondial_relay()],
            [PackageSize::Small, PackageSize::Medium, PackageSize::Large],
        )
    }
}
