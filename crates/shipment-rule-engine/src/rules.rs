//! 运费折扣规则
//!
//! 具体的定价策略。推荐的执行顺序见 [`default_rules`]：
//! 先标记无效记录，再提出折扣，最后统一按月度上限计价。

use crate::conditions::{
    Condition, always, is_monthly_shipment_number, is_package_size, is_provider,
    only_known_shipping_provider,
};
use crate::dependencies::Dependencies;
use crate::models::{Fact, PackageSize, ShippingProvider};
use crate::rule::Rule;
use crate::store::AggregateField;
use tracing::{debug, warn};

/// 每月第几个 LP 大件免费
pub const FREE_LARGE_LA_POSTE_SHIPMENT: u32 = 3;

/// 判断舍入后的剩余额度是否越过上限时允许的浮点误差
const CEILING_TOLERANCE: f64 = 1e-9;

/// 默认规则链
pub fn default_rules() -> Vec<Rule> {
    vec![
        ignore_incorrectly_parsed_facts_rule(),
        small_shipment_lowest_price_rule(),
        large_la_poste_shipment_rule(),
        third_shipment_free_rule(),
        apply_price_rule(),
    ]
}

/// 标记无法正确解析的记录
///
/// 日期无效、承运商未知或尺寸未知时设置 `ignore`。后续规则不检查该标记。
pub fn ignore_incorrectly_parsed_facts_rule() -> Rule {
    Rule::new(
        "ignore_incorrectly_parsed_facts",
        vec![always()],
        |fact: Fact, deps: &mut Dependencies| {
            let ignore = !fact.date.is_valid()
                || !deps.is_known_provider(&fact.shipping_provider)
                || !deps.is_known_size(&fact.package_size);

            if ignore {
                warn!(
                    date = %fact.date,
                    package_size = %fact.package_size,
                    provider = %fact.shipping_provider,
                    "记录无法识别，已标记为忽略"
                );
                Fact {
                    ignore: true,
                    ..fact
                }
            } else {
                fact
            }
        },
    )
}

/// 小件始终按所有承运商中的最低价计费
///
/// 提出的折扣为本承运商价格与最低价之差；差值为零时清空提议。
pub fn small_shipment_lowest_price_rule() -> Rule {
    Rule::new(
        "small_shipment_lowest_price",
        vec![is_package_size(PackageSize::Small)],
        |fact: Fact, deps: &mut Dependencies| {
            let pricing = deps.pricing();
            let (Some(actual), Some(lowest)) = (
                pricing.price(&fact.shipping_provider, &fact.package_size),
                pricing.min_price(&fact.package_size),
            ) else {
                return fact;
            };

            let difference = actual - lowest;
            let proposed = (difference.abs() > f64::EPSILON).then_some(difference);
            fact.with_proposed_discount(proposed)
        },
    )
}

fn large_la_poste_conditions() -> Vec<Condition> {
    vec![
        is_provider(ShippingProvider::la_poste()),
        is_package_size(PackageSize::Large),
    ]
}

/// 统计每月 LP 大件数量
pub fn large_la_poste_shipment_rule() -> Rule {
    Rule::new(
        "large_la_poste_shipment",
        large_la_poste_conditions(),
        |fact: Fact, deps: &mut Dependencies| {
            let period = fact.period();
            let count = deps.store().get(&period).large_shipment_count + 1;
            deps.store_mut()
                .set(&period, AggregateField::LargeShipmentCount(count));
            debug!(period = %period, count, "LP 大件计数");
            fact
        },
    )
}

/// 每月第三个 LP 大件免费
///
/// 依赖计数规则先执行：计数已包含当前记录。
pub fn third_shipment_free_rule() -> Rule {
    let mut conditions = large_la_poste_conditions();
    conditions.push(is_monthly_shipment_number(FREE_LARGE_LA_POSTE_SHIPMENT));

    Rule::new(
        "third_shipment_free",
        conditions,
        |fact: Fact, deps: &mut Dependencies| {
            let full_price = deps
                .pricing()
                .price(&fact.shipping_provider, &fact.package_size);
            debug!(date = %fact.date, ?full_price, "第三个 LP 大件免费");
            fact.with_proposed_discount(full_price)
        },
    )
}

/// 计价并执行月度折扣上限
///
/// 累计折扣加上提议折扣仍低于上限时全额发放；否则只发放剩余额度。
/// 剩余额度保留一位有效数字，但舍入结果高于剩余额度时改发剩余额度本身：
/// 剩余 6.5 发放 6.5 而不是 7，浮点残差 0.09999999999999964 仍发放 0.1。
pub fn apply_price_rule() -> Rule {
    Rule::new(
        "apply_price",
        vec![only_known_shipping_provider()],
        |fact: Fact, deps: &mut Dependencies| {
            let Some(base_price) = deps
                .pricing()
                .price(&fact.shipping_provider, &fact.package_size)
            else {
                warn!(
                    provider = %fact.shipping_provider,
                    package_size = %fact.package_size,
                    "缺少价格，跳过计价"
                );
                return fact;
            };

            let period = fact.period();
            let ceiling = deps.max_monthly_discount();
            let already = deps.store().get(&period).accumulated_discount;
            let proposed = fact.proposed_discount.unwrap_or(0.0);

            if proposed + already < ceiling {
                deps.store_mut().set(
                    &period,
                    AggregateField::AccumulatedDiscount(already + proposed),
                );
                let discount = fact.proposed_discount;
                return Fact {
                    price: Some(base_price - proposed),
                    discount,
                    ..fact
                };
            }

            let granted = remaining_discount(ceiling, already);
            deps.store_mut().set(
                &period,
                AggregateField::AccumulatedDiscount(already + granted),
            );
            debug!(period = %period, proposed, granted, "折扣达到月度上限");

            Fact {
                price: Some(base_price - granted),
                discount: Some(granted),
                ..fact
            }
        },
    )
}

/// 月度剩余折扣额度
fn remaining_discount(ceiling: f64, already: f64) -> f64 {
    let headroom = ceiling - already;
    let rounded = round_to_significant_digit(headroom);
    let granted = if rounded > headroom + CEILING_TOLERANCE {
        headroom
    } else {
        rounded
    };
    granted.max(0.0)
}

/// 保留一位有效数字（四舍五入，远离零）
pub fn round_to_significant_digit(value: f64) -> f64 {
    if value == 0.0 || !value.is_finite() {
        return value;
    }

    let magnitude = value.abs();
    let mut exponent = magnitude.log10().floor() as i32;
    if magnitude >= 10f64.powi(exponent + 1) {
        exponent += 1;
    } else if magnitude < 10f64.powi(exponent) {
        exponent -= 1;
    }

    if exponent < 0 {
        let scale = 10f64.powi(-exponent);
        (value * scale).round() / scale
    } else {
        let scale = 10f64.powi(exponent);
        (value / scale).round() * scale
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::MonthPeriod;
    use chrono::NaiveDate;

    const EPS: f64 = 1e-9;

    fn date(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).unwrap()
    }

    fn fact(size: PackageSize, provider: &str) -> Fact {
        Fact::new(date(2022, 1, 1), size, provider)
    }

    fn assert_close(actual: Option<f64>, expected: f64) {
        let actual = actual.expect("金额应已设置");
        assert!(
            (actual - expected).abs() < EPS,
            "expected {}, got {}",
            expected,
            actual
        );
    }

    // ==================== ignore_incorrectly_parsed_facts ====================

    #[test]
    fn test_ignore_invalid_date() {
        let mut deps = Dependencies::default();
        let input = Fact::new(
            crate::models::ShipmentDate::parse("invalid date"),
            PackageSize::Medium,
            "LP",
        );

        let updated = ignore_incorrectly_parsed_facts_rule().apply(input, &mut deps);
        assert!(updated.ignore);
    }

    #[test]
    fn test_ignore_unknown_provider() {
        let mut deps = Dependencies::default();
        let updated = ignore_incorrectly_parsed_facts_rule()
            .apply(fact(PackageSize::Medium, "Unknown"), &mut deps);
        assert!(updated.ignore);
    }

    #[test]
    fn test_ignore_unknown_size() {
        let mut deps = Dependencies::default();
        let updated = ignore_incorrectly_parsed_facts_rule()
            .apply(fact(PackageSize::parse("Unknown"), "LP"), &mut deps);
        assert!(updated.ignore);
    }

    #[test]
    fn test_keep_valid_fact() {
        let mut deps = Dependencies::default();
        let input = fact(PackageSize::Medium, "LP");
        let updated = ignore_incorrectly_parsed_facts_rule().apply(input.clone(), &mut deps);
        assert_eq!(updated, input);
    }

    // ==================== small_shipment_lowest_price ====================

    #[test]
    fn test_small_discount_for_costlier_provider() {
        let mut deps = Dependencies::default();
        let updated =
            small_shipment_lowest_price_rule().apply(fact(PackageSize::Small, "MR"), &mut deps);
        assert_close(updated.proposed_discount, 0.5);
    }

    #[test]
    fn test_no_small_discount_for_cheapest_provider() {
        let mut deps = Dependencies::default();
        let updated =
            small_shipment_lowest_price_rule().apply(fact(PackageSize::Small, "LP"), &mut deps);
        assert_eq!(updated.proposed_discount, None);
    }

    #[test]
    fn test_no_small_discount_for_other_sizes() {
        let mut deps = Dependencies::default();
        let updated =
            small_shipment_lowest_price_rule().apply(fact(PackageSize::Medium, "MR"), &mut deps);
        assert_eq!(updated.proposed_discount, None);
    }

    #[test]
    fn test_small_rule_skips_unpriced_provider() {
        let mut deps = Dependencies::default();
        let input = fact(PackageSize::Small, "CUSPS");
        let updated = small_shipment_lowest_price_rule().apply(input.clone(), &mut deps);
        assert_eq!(updated, input);
    }

    // ==================== large_la_poste_shipment ====================

    #[test]
    fn test_count_large_la_poste() {
        let mut deps = Dependencies::default();
        let rule = large_la_poste_shipment_rule();
        for expected in 1..=4 {
            rule.apply(fact(PackageSize::Large, "LP"), &mut deps);
            assert_eq!(
                deps.store().get(&MonthPeriod::new(2022, 1)).large_shipment_count,
                expected
            );
        }
    }

    #[test]
    fn test_do_not_count_other_provider_or_size() {
        let mut deps = Dependencies::default();
        let rule = large_la_poste_shipment_rule();
        rule.apply(fact(PackageSize::Large, "MR"), &mut deps);
        rule.apply(fact(PackageSize::Medium, "LP"), &mut deps);

        assert_eq!(
            deps.store().get(&MonthPeriod::new(2022, 1)).large_shipment_count,
            0
        );
    }

    // ==================== third_shipment_free ====================

    fn deps_with_count(count: u32) -> Dependencies {
        let mut deps = Dependencies::default();
        deps.store_mut().set(
            &MonthPeriod::new(2022, 1),
            AggregateField::LargeShipmentCount(count),
        );
        deps
    }

    #[test]
    fn test_third_shipment_is_free() {
        let mut deps = deps_with_count(3);
        let updated = third_shipment_free_rule().apply(fact(PackageSize::Large, "LP"), &mut deps);
        assert_close(updated.proposed_discount, 6.9);
    }

    #[test]
    fn test_not_third_shipment() {
        for count in [0, 2, 4] {
            let mut deps = deps_with_count(count);
            let updated =
                third_shipment_free_rule().apply(fact(PackageSize::Large, "LP"), &mut deps);
            assert_eq!(updated.proposed_discount, None);
        }
    }

    #[test]
    fn test_third_shipment_requires_large_la_poste() {
        let mut deps = deps_with_count(3);
        let rule = third_shipment_free_rule();

        let medium = rule.apply(fact(PackageSize::Medium, "LP"), &mut deps);
        let relay = rule.apply(fact(PackageSize::Large, "MR"), &mut deps);

        assert_eq!(medium.proposed_discount, None);
        assert_eq!(relay.proposed_discount, None);
    }

    // ==================== apply_price ====================

    #[test]
    fn test_apply_discount_and_accumulate() {
        let mut deps = Dependencies::default();
        let input = fact(PackageSize::Medium, "MR").with_proposed_discount(Some(1.0));

        let updated = apply_price_rule().apply(input.clone(), &mut deps);

        assert_eq!(
            updated,
            Fact {
                price: Some(2.0),
                discount: Some(1.0),
                ..input
            }
        );
        assert_eq!(
            deps.store().get(&MonthPeriod::new(2022, 1)).accumulated_discount,
            1.0
        );
    }

    #[test]
    fn test_full_price_without_proposal() {
        let mut deps = Dependencies::default();
        let updated = apply_price_rule().apply(fact(PackageSize::Large, "LP"), &mut deps);

        assert_close(updated.price, 6.9);
        assert_eq!(updated.discount, None);
    }

    #[test]
    fn test_discount_clipped_to_ceiling() {
        let mut deps = Dependencies::default();
        let period = MonthPeriod::new(2022, 1);
        deps.store_mut()
            .set(&period, AggregateField::AccumulatedDiscount(9.5));
        let input = fact(PackageSize::Large, "MR").with_proposed_discount(Some(2.0));

        let updated = apply_price_rule().apply(input, &mut deps);

        assert_close(updated.price, 3.5);
        assert_close(updated.discount, 0.5);
        assert_eq!(deps.store().get(&period).accumulated_discount, 10.0);
    }

    #[test]
    fn test_no_discount_past_ceiling() {
        let mut deps = Dependencies::default();
        let period = MonthPeriod::new(2022, 1);
        deps.store_mut()
            .set(&period, AggregateField::AccumulatedDiscount(11.0));
        let input = fact(PackageSize::Large, "MR").with_proposed_discount(Some(2.0));

        let updated = apply_price_rule().apply(input, &mut deps);

        assert_eq!(updated.price, Some(4.0));
        assert_eq!(updated.discount, Some(0.0));
        assert_eq!(deps.store().get(&period).accumulated_discount, 11.0);
    }

    #[test]
    fn test_unknown_provider_not_priced() {
        let mut deps = Dependencies::default();
        let input = fact(PackageSize::Large, "CUSPS").with_proposed_discount(Some(2.0));

        let updated = apply_price_rule().apply(input.clone(), &mut deps);

        assert_eq!(updated, input);
        assert!(deps.store().is_empty());
    }

    #[test]
    fn test_ceiling_never_exceeded() {
        let mut deps = Dependencies::default();
        let rule = apply_price_rule();
        let period = MonthPeriod::new(2022, 1);

        for proposed in [3.5, 6.9, 0.5, 6.9, 100.0, 0.3] {
            let input = fact(PackageSize::Large, "LP").with_proposed_discount(Some(proposed));
            let updated = rule.apply(input, &mut deps);

            let granted = updated.discount.unwrap_or(0.0);
            assert!(granted >= 0.0 && granted <= proposed + EPS);
            assert_close(updated.price, 6.9 - granted);
            assert!(deps.store().get(&period).accumulated_discount <= 10.0 + EPS);
        }
        assert_close(Some(deps.store().get(&period).accumulated_discount), 10.0);
    }

    #[test]
    fn test_round_to_significant_digit() {
        assert_eq!(round_to_significant_digit(0.5), 0.5);
        assert_eq!(round_to_significant_digit(0.5999999999999996), 0.6);
        assert_eq!(round_to_significant_digit(6.5), 7.0);
        assert_eq!(round_to_significant_digit(0.04), 0.04);
        assert_eq!(round_to_significant_digit(12.0), 10.0);
        assert_eq!(round_to_significant_digit(-1.0), -1.0);
        assert_eq!(round_to_significant_digit(0.0), 0.0);
    }

    #[test]
    fn test_remaining_discount_stays_under_ceiling() {
        assert_close(Some(remaining_discount(10.0, 9.4)), 0.6);
        assert_close(Some(remaining_discount(10.0, 3.5)), 6.5);
        assert_eq!(remaining_discount(10.0, 11.0), 0.0);
    }

    #[test]
    fn test_remaining_discount_never_rounds_above_headroom() {
        // 一位有效数字会把 6.5 进位到 7、3.6 进位到 4，超过剩余额度
        assert_eq!(round_to_significant_digit(6.5), 7.0);
        assert_close(Some(remaining_discount(10.0, 3.5)), 6.5);
        assert_close(Some(remaining_discount(10.0, 3.4)), 6.6);
        assert_close(Some(remaining_discount(10.0, 6.4)), 3.6);
        // 向下舍入和浮点残差照常按一位有效数字处理
        assert_close(Some(remaining_discount(10.0, 7.6)), 2.0);
        assert_close(Some(remaining_discount(10.0, 9.9)), 0.1);
    }

    #[test]
    fn test_default_rule_order() {
        let names: Vec<String> = default_rules()
            .iter()
            .map(|rule| rule.name().to_string())
            .collect();
        assert_eq!(
            names,
            vec![
                "ignore_incorrectly_parsed_facts",
                "small_shipment_lowest_price",
                "large_la_poste_shipment",
                "third_shipment_free",
                "apply_price",
            ]
        );
    }
}
