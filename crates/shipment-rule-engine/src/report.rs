//! 结果渲染
//!
//! 把引擎输出的记录渲染为文本行或 JSON，并汇总月度聚合。

use crate::error::{Result, RuleError};
use crate::models::Fact;
use crate::store::MonthAggregateStore;
use serde::Serialize;
use std::fmt::Write as _;
use std::str::FromStr;

/// 输出格式
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum OutputFormat {
    #[default]
    Text,
    Json,
}

impl FromStr for OutputFormat {
    type Err = RuleError;

    fn from_str(s: &str) -> Result<Self> {
        match s.to_ascii_lowercase().as_str() {
            "text" => Ok(Self::Text),
            "json" => Ok(Self::Json),
            other => Err(RuleError::ParseError(format!(
                "未知的输出格式 '{}'，可选 text / json",
                other
            ))),
        }
    }
}

/// 金额格式化：保留两位小数以消除浮点误差，去掉多余的零
pub fn format_amount(amount: f64) -> String {
    let rounded = (amount * 100.0).round() / 100.0;
    // -0.0 与 0.0 显示一致
    format!("{}", rounded + 0.0)
}

fn format_optional(amount: Option<f64>) -> String {
    amount.map(format_amount).unwrap_or_else(|| "-".to_string())
}

/// 渲染单条记录
///
/// 被忽略的记录输出原始字段加 `Ignored`，否则输出价格和折扣（缺失为 `-`）。
pub fn render_line(fact: &Fact) -> String {
    if fact.ignore {
        let tokens = [
            fact.date.to_string(),
            fact.package_size.to_string(),
            fact.shipping_provider.to_string(),
        ];
        let mut line = tokens
            .iter()
            .filter(|token| !token.is_empty())
            .cloned()
            .collect::<Vec<_>>()
            .join(" ");
        if !line.is_empty() {
            line.push(' ');
        }
        line.push_str("Ignored");
        return line;
    }

    format!(
        "{} {} {} {} {}",
        fact.date,
        fact.package_size,
        fact.shipping_provider,
        format_optional(fact.price),
        format_optional(fact.discount)
    )
}

/// 渲染所有记录
pub fn render(facts: &[Fact], format: OutputFormat) -> Result<String> {
    match format {
        OutputFormat::Text => {
            let mut output = String::new();
            for fact in facts {
                // 写入 String 不会失败
                let _ = writeln!(output, "{}", render_line(fact));
            }
            Ok(output)
        }
        OutputFormat::Json => Ok(serde_json::to_string_pretty(facts)? + "\n"),
    }
}

#[derive(Serialize)]
struct MonthSummary {
    period: String,
    large_shipment_count: u32,
    accumulated_discount: f64,
}

fn summary_rows(store: &MonthAggregateStore) -> Vec<MonthSummary> {
    store
        .iter()
        .map(|(period, aggregate)| MonthSummary {
            period: period.to_string(),
            large_shipment_count: aggregate.large_shipment_count,
            accumulated_discount: aggregate.accumulated_discount,
        })
        .collect()
}

/// 汇总月度聚合
pub fn render_summary(store: &MonthAggregateStore, format: OutputFormat) -> Result<String> {
    let rows = summary_rows(store);

    match format {
        OutputFormat::Text => {
            let mut output = String::new();
            for row in &rows {
                let _ = writeln!(
                    output,
                    "{} large_la_poste={} discount={}",
                    row.period,
                    row.large_shipment_count,
                    format_amount(row.accumulated_discount)
                );
            }
            Ok(output)
        }
        OutputFormat::Json => Ok(serde_json::to_string_pretty(&rows)? + "\n"),
    }
}

#[derive(Serialize)]
struct JsonReport<'a> {
    facts: &'a [Fact],
    summary: Vec<MonthSummary>,
}

/// 渲染完整输出
///
/// 不带汇总时等同于 [`render`]。带汇总时文本格式依次输出两段，
/// JSON 格式合并为一个 `{"facts": [...], "summary": [...]}` 文档。
pub fn render_report(
    facts: &[Fact],
    summary: Option<&MonthAggregateStore>,
    format: OutputFormat,
) -> Result<String> {
    let Some(store) = summary else {
        return render(facts, format);
    };

    match format {
        OutputFormat::Text => Ok(render(facts, format)? + &render_summary(store, format)?),
        OutputFormat::Json => {
            let report = JsonReport {
                facts,
                summary: summary_rows(store),
            };
            Ok(serde_json::to_string_pretty(&report)? + "\n")
        }
    }
}
