//! 输入解析
//!
//! 每行一条记录：`DATE SIZE PROVIDER`，以空白分隔。解析永远不会失败：
//! 缺失或无法识别的字段原样保留在记录里，交给规则判断是否忽略。

use crate::error::Result;
use crate::models::{Fact, PackageSize, ShipmentDate, ShippingProvider};
use std::path::Path;
use tracing::{debug, instrument};

/// 解析单行
pub fn parse_line(line: &str) -> Fact {
    let mut tokens = line.split_whitespace();
    let date = tokens.next().unwrap_or_default();
    let size = tokens.next().unwrap_or_default();
    let provider = tokens.next().unwrap_or_default();

    Fact::new(
        ShipmentDate::parse(date),
        PackageSize::parse(size),
        ShippingProvider::new(provider),
    )
}

/// 解析整段输入，跳过空行
pub fn parse_records(input: &str) -> Vec<Fact> {
    input
        .lines()
        .filter(|line| !line.trim().is_empty())
        .map(parse_line)
        .collect()
}

/// 读取并解析输入文件
#[instrument]
pub fn read_facts(path: &Path) -> Result<Vec<Fact>> {
    let input = std::fs::read_to_string(path)?;
    let facts = parse_records(&input);
    debug!(count = facts.len(), "输入已解析");
    Ok(facts)
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::NaiveDate;

    #[test]
    fn test_parse_valid_line() {
        let fact = parse_line("2015-02-01 S MR");

        assert_eq!(fact.date.as_date(), NaiveDate::from_ymd_opt(2015, 2, 1));
        assert_eq!(fact.package_size, PackageSize::Small);
        assert_eq!(fact.shipping_provider, ShippingProvider::mondial_relay());
        assert!(!fact.ignore);
        assert_eq!(fact.price, None);
    }

    #[test]
    fn test_parse_short_line() {
        let fact = parse_line("2015-02-29 CUSPS");

        assert!(!fact.date.is_valid());
        assert_eq!(fact.package_size, PackageSize::Unknown("CUSPS".to_string()));
        assert_eq!(fact.shipping_provider.code(), "");
    }

    #[test]
    fn test_parse_tolerates_extra_whitespace() {
        let fact = parse_line("  2015-02-03\tL   LP  ");

        assert!(fact.date.is_valid());
        assert_eq!(fact.package_size, PackageSize::Large);
        assert_eq!(fact.shipping_provider, ShippingProvider::la_poste());
    }

    #[test]
    fn test_parse_records_skips_blank_lines() {
        let facts = parse_records("2015-02-01 S MR\n\n2015-02-02 S MR\n   \n");
        assert_eq!(facts.len(), 2);
    }

    #[test]
    fn test_read_missing_file() {
        let result = read_facts(Path::new("/definitely/not/here/input.txt"));
        assert!(matches!(result, Err(crate::error::RuleError::Io(_))));
    }
}
