//! 配置管理模块
//!
//! 支持多格式配置文件加载，环境变量覆盖，以及类型安全的配置访问。
//! 价格表、月度折扣上限、已知承运商和包裹尺寸都来自这里，规则引擎只消费结果。

use config::{Config, ConfigError, Environment, File};
use serde::Deserialize;
use std::collections::HashSet;
use std::path::Path;

use crate::error::{Result, ShipmentError};

/// 单条价格配置：某承运商某尺寸的运费
#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct PriceEntry {
    pub provider: String,
    pub package_size: String,
    pub price: f64,
}

impl PriceEntry {
    pub fn new(provider: impl Into<String>, package_size: impl Into<String>, price: f64) -> Self {
        Self {
            provider: provider.into(),
            package_size: package_size.into(),
            price,
        }
    }
}

/// 定价配置
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct PricingConfig {
    /// 每月累计折扣上限
    pub max_monthly_discount: f64,
    pub known_providers: Vec<String>,
    pub known_package_sizes: Vec<String>,
    pub prices: Vec<PriceEntry>,
}

impl Default for PricingConfig {
    fn default() -> Self {
        Self {
            max_monthly_discount: 10.0,
            known_providers: vec!["LP".to_string(), "MR".to_string()],
            known_package_sizes: vec!["S".to_string(), "M".to_string(), "L".to_string()],
            prices: vec![
                PriceEntry::new("LP", "S", 1.5),
                PriceEntry::new("LP", "M", 4.9),
                PriceEntry::new("LP", "L", 6.9),
                PriceEntry::new("MR", "S", 2.0),
                PriceEntry::new("MR", "M", 3.0),
                PriceEntry::new("MR", "L", 4.0),
            ],
        }
    }
}

impl PricingConfig {
    /// 查找某承运商某尺寸的价格
    pub fn price_of(&self, provider: &str, package_size: &str) -> Option<f64> {
        self.prices
            .iter()
            .find(|entry| entry.provider == provider && entry.package_size == package_size)
            .map(|entry| entry.price)
    }

    /// 校验定价配置
    ///
    /// 每个已知承运商与已知尺寸的组合都必须有价格，否则计价规则会静默跳过该组合。
    pub fn validate(&self) -> Result<()> {
        if !(self.max_monthly_discount > 0.0) {
            return Err(ShipmentError::invalid_argument(
                "pricing.max_monthly_discount",
                format!("必须为正数, 实际 {}", self.max_monthly_discount),
            ));
        }
        if self.known_providers.is_empty() {
            return Err(ShipmentError::invalid_argument(
                "pricing.known_providers",
                "至少需要一个承运商",
            ));
        }
        if self.known_package_sizes.is_empty() {
            return Err(ShipmentError::invalid_argument(
                "pricing.known_package_sizes",
                "至少需要一个包裹尺寸",
            ));
        }

        let mut seen = HashSet::new();
        for entry in &self.prices {
            if !(entry.price >= 0.0) {
                return Err(ShipmentError::invalid_argument(
                    "pricing.prices",
                    format!(
                        "{} {} 的价格不能为负数: {}",
                        entry.provider, entry.package_size, entry.price
                    ),
                ));
            }
            if !seen.insert((entry.provider.as_str(), entry.package_size.as_str())) {
                return Err(ShipmentError::Validation(format!(
                    "重复的价格配置: {} {}",
                    entry.provider, entry.package_size
                )));
            }
        }

        for provider in &self.known_providers {
            for size in &self.known_package_sizes {
                if self.price_of(provider, size).is_none() {
                    return Err(ShipmentError::Validation(format!(
                        "缺少价格配置: {} {}",
                        provider, size
                    )));
                }
            }
        }

        Ok(())
    }
}

/// 可观测性配置
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct ObservabilityConfig {
    pub log_level: String,
    /// 日志输出格式：json（结构化）或 pretty（人类可读）
    pub log_format: String,
}

impl Default for ObservabilityConfig {
    fn default() -> Self {
        Self {
            log_level: "warn".to_string(),
            log_format: "pretty".to_string(),
        }
    }
}

impl ObservabilityConfig {
    /// 是否输出 JSON 格式日志
    pub fn json_logs(&self) -> bool {
        self.log_format.eq_ignore_ascii_case("json")
    }
}

/// 应用配置
#[derive(Debug, Clone, Deserialize, Default)]
#[serde(default)]
pub struct AppConfig {
    pub service_name: String,
    pub environment: String,
    pub pricing: PricingConfig,
    pub observability: ObservabilityConfig,
}

impl AppConfig {
    /// 从配置文件和环境变量加载配置
    ///
    /// 配置目录由 `CONFIG_DIR` 指定（默认 `config`），环境由 `SHIPMENT_ENV` 指定
    /// （默认 `development`）。
    pub fn load(service_name: &str) -> std::result::Result<Self, ConfigError> {
        let config_dir = std::env::var("CONFIG_DIR").unwrap_or_else(|_| "config".to_string());
        Self::load_from(Path::new(&config_dir), service_name)
    }

    /// 从指定目录加载配置
    ///
    /// 加载顺序（后加载的会覆盖先加载的同名配置项）：
    /// 1. 内置默认值
    /// 2. {config_dir}/default.toml
    /// 3. {config_dir}/{environment}.toml
    /// 4. {config_dir}/{service_name}.toml
    /// 5. 环境变量（SHIPMENT_ 前缀，`__` 分隔层级，如
    ///    SHIPMENT_PRICING__MAX_MONTHLY_DISCOUNT -> pricing.max_monthly_discount）
    pub fn load_from(config_dir: &Path, service_name: &str) -> std::result::Result<Self, ConfigError> {
        let env = std::env::var("SHIPMENT_ENV").unwrap_or_else(|_| "development".to_string());

        let builder = Config::builder()
            .set_default("service_name", service_name)?
            .set_default("environment", env.clone())?
            .add_source(File::from(config_dir.join("default.toml")).required(false))
            .add_source(File::from(config_dir.join(format!("{}.toml", env))).required(false))
            .add_source(
                File::from(config_dir.join(format!("{}.toml", service_name))).required(false),
            )
            .add_source(
                Environment::with_prefix("SHIPMENT")
                    .prefix_separator("_")
                    .separator("__")
                    .try_parsing(true),
            );

        builder.build()?.try_deserialize()
    }
}
