//! 月度聚合存储
//!
//! 按月份保存大件计数和累计折扣，供规则跨记录累积。
//! 存储不做任何加锁，由持有它的 `Dependencies` 独占；引擎以 `&mut self` 运行，
//! 同一存储上的并发运行在编译期即被拒绝。

use crate::models::MonthPeriod;
use serde::Serialize;
use std::collections::BTreeMap;

/// 某个月份的聚合计数
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize)]
pub struct MonthAggregate {
    pub large_shipment_count: u32,
    pub accumulated_discount: f64,
}

/// 可覆写的聚合字段
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum AggregateField {
    LargeShipmentCount(u32),
    AccumulatedDiscount(f64),
}

/// 月度聚合存储
#[derive(Debug, Clone, Default)]
pub struct MonthAggregateStore {
    periods: BTreeMap<MonthPeriod, MonthAggregate>,
}

impl MonthAggregateStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// 获取某月聚合
    ///
    /// 从未出现过的月份返回全零值，不会失败。
    pub fn get(&self, period: &MonthPeriod) -> MonthAggregate {
        self.periods.get(period).copied().unwrap_or_default()
    }

    /// 覆写某月的一个字段（不是累加）
    ///
    /// 月份不存在时先以零值创建。
    pub fn set(&mut self, period: &MonthPeriod, field: AggregateField) {
        let aggregate = self.periods.entry(*period).or_default();
        match field {
            AggregateField::LargeShipmentCount(count) => aggregate.large_shipment_count = count,
            AggregateField::AccumulatedDiscount(amount) => {
                aggregate.accumulated_discount = amount
            }
        }
    }

    /// 获取当前存储的月份数量
    pub fn len(&self) -> usize {
        self.periods.len()
    }

    /// 检查存储是否为空
    pub fn is_empty(&self) -> bool {
        self.periods.is_empty()
    }

    /// 按月份顺序遍历已写入的聚合
    pub fn iter(&self) -> impl Iterator<Item = (&MonthPeriod, &MonthAggregate)> {
        self.periods.iter()
    }

    /// 清空所有聚合
    pub fn clear(&mut self) {
        self.periods.clear();
    }
}
