//! 规则引擎领域模型
//!
//! 发货记录（Fact）及其字段类型。无法识别的输入值作为数据保留，而不是解析错误。

use chrono::{DateTime, Datelike, NaiveDate, Utc};
use serde::{Serialize, Serializer};
use std::fmt;

/// 包裹尺寸
///
/// 已知尺寸为 S / M / L，其余输入保留原文，由规则负责拒绝。
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum PackageSize {
    Small,
    Medium,
    Large,
    Unknown(String),
}

impl PackageSize {
    pub fn parse(raw: &str) -> Self {
        match raw {
            "S" => Self::Small,
            "M" => Self::Medium,
            "L" => Self::Large,
            other => Self::Unknown(other.to_string()),
        }
    }

    pub fn code(&self) -> &str {
        match self {
            Self::Small => "S",
            Self::Medium => "M",
            Self::Large => "L",
            Self::Unknown(raw) => raw,
        }
    }
}

impl fmt::Display for PackageSize {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.code())
    }
}

impl Serialize for PackageSize {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(self.code())
    }
}

/// 承运商代码
///
/// 承运商集合由配置决定，因此这里不做枚举，只保存代码。
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize)]
#[serde(transparent)]
pub struct ShippingProvider(String);

impl ShippingProvider {
    pub const LA_POSTE: &'static str = "LP";
    pub const MONDIAL_RELAY: &'static str = "MR";

    pub fn new(code: impl Into<String>) -> Self {
        Self(code.into())
    }

    pub fn la_poste() -> Self {
        Self::new(Self::LA_POSTE)
    }

    pub fn mondial_relay() -> Self {
        Self::new(Self::MONDIAL_RELAY)
    }

    pub fn code(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for ShippingProvider {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&str> for ShippingProvider {
    fn from(code: &str) -> Self {
        Self::new(code)
    }
}

/// 发货日期
///
/// 解析失败时保留原文，作为可检测的无效值继续流经引擎。
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ShipmentDate {
    Valid(NaiveDate),
    Invalid(String),
}

impl ShipmentDate {
    /// 解析日期
    ///
    /// 支持 `YYYY-MM-DD` 和 RFC 3339（按 UTC 取日期部分）。
    pub fn parse(raw: &str) -> Self {
        if let Ok(date) = NaiveDate::parse_from_str(raw, "%Y-%m-%d") {
            return Self::Valid(date);
        }

        if let Ok(dt) = DateTime::parse_from_rfc3339(raw) {
            return Self::Valid(dt.with_timezone(&Utc).date_naive());
        }

        Self::Invalid(raw.to_string())
    }

    pub fn is_valid(&self) -> bool {
        matches!(self, Self::Valid(_))
    }

    pub fn as_date(&self) -> Option<NaiveDate> {
        match self {
            Self::Valid(date) => Some(*date),
            Self::Invalid(_) => None,
        }
    }

    /// 所属月份
    pub fn period(&self) -> MonthPeriod {
        match self {
            Self::Valid(date) => MonthPeriod::Month {
                year: date.year(),
                month: date.month(),
            },
            Self::Invalid(_) => MonthPeriod::Invalid,
        }
    }
}

impl From<NaiveDate> for ShipmentDate {
    fn from(date: NaiveDate) -> Self {
        Self::Valid(date)
    }
}

impl fmt::Display for ShipmentDate {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Valid(date) => write!(f, "{}", date.format("%Y-%m-%d")),
            Self::Invalid(raw) => f.write_str(raw),
        }
    }
}

impl Serialize for ShipmentDate {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.collect_str(self)
    }
}

/// 月度聚合的键
///
/// 同一自然月内的所有日期映射到同一个键；无效日期统一归入 `Invalid`。
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum MonthPeriod {
    Month { year: i32, month: u32 },
    Invalid,
}

impl MonthPeriod {
    pub fn new(year: i32, month: u32) -> Self {
        Self::Month { year, month }
    }
}

impl fmt::Display for MonthPeriod {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Month { year, month } => write!(f, "{:04}-{:02}", year, month),
            Self::Invalid => f.write_str("invalid"),
        }
    }
}

impl Serialize for MonthPeriod {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.collect_str(self)
    }
}

/// 发货记录
///
/// 规则效果总是返回新的记录（结构更新语法），不原地修改。
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Fact {
    pub date: ShipmentDate,
    pub package_size: PackageSize,
    pub shipping_provider: ShippingProvider,
    /// 上游规则提出的折扣，由计价规则消费
    #[serde(skip_serializing_if = "Option::is_none")]
    pub proposed_discount: Option<f64>,
    pub price: Option<f64>,
    pub discount: Option<f64>,
    #[serde(skip_serializing_if = "std::ops::Not::not")]
    pub ignore: bool,
}

impl Fact {
    pub fn new(
        date: impl Into<ShipmentDate>,
        package_size: PackageSize,
        shipping_provider: impl Into<ShippingProvider>,
    ) -> Self {
        Self {
            date: date.into(),
            package_size,
            shipping_provider: shipping_provider.into(),
            proposed_discount: None,
            price: None,
            discount: None,
            ignore: false,
        }
    }

    pub fn with_proposed_discount(self, proposed_discount: Option<f64>) -> Self {
        Self {
            proposed_discount,
            ..self
        }
    }

    pub fn period(&self) -> MonthPeriod {
        self.date.period()
    }
}
