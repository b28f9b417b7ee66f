//! 规则引擎
//!
//! 持有有序的规则列表和依赖包，把每条记录依次折叠通过所有规则。
//! 记录之间通过聚合存储共享状态，因此输入顺序会影响结果。

use crate::dependencies::Dependencies;
use crate::models::Fact;
use crate::rule::Rule;
use crate::store::MonthAggregateStore;
use tracing::{debug, info, instrument, trace};

/// 规则引擎
#[derive(Debug, Clone)]
pub struct RuleEngine {
    rules: Vec<Rule>,
    dependencies: Dependencies,
}

impl RuleEngine {
    pub fn new(rules: Vec<Rule>, dependencies: Dependencies) -> Self {
        Self {
            rules,
            dependencies,
        }
    }

    /// 在末尾追加规则，只影响之后的运行
    pub fn add_rule(&mut self, rule: Rule) {
        debug!(rule_id = %rule.id(), rule_name = %rule.name(), "规则已添加");
        self.rules.push(rule);
    }

    /// 按同一性移除第一条匹配的规则
    ///
    /// 规则不存在时什么也不做，返回 `false`。
    pub fn remove_rule(&mut self, rule: &Rule) -> bool {
        match self.rules.iter().position(|existing| existing == rule) {
            Some(index) => {
                self.rules.remove(index);
                debug!(rule_id = %rule.id(), rule_name = %rule.name(), "规则已移除");
                true
            }
            None => {
                debug!(rule_id = %rule.id(), "移除不存在的规则，忽略");
                false
            }
        }
    }

    /// 依次处理所有记录，输出顺序与输入一致
    #[instrument(skip_all, fields(rules = self.rules.len()))]
    pub fn run(&mut self, facts: impl IntoIterator<Item = Fact>) -> Vec<Fact> {
        let results: Vec<Fact> = facts.into_iter().map(|fact| self.evaluate(fact)).collect();

        info!(
            facts = results.len(),
            ignored = results.iter().filter(|fact| fact.ignore).count(),
            "规则运行完成"
        );

        results
    }

    /// 将单条记录折叠通过当前规则列表
    pub fn evaluate(&mut self, fact: Fact) -> Fact {
        let Self {
            rules,
            dependencies,
        } = self;

        rules.iter().fold(fact, |fact, rule| {
            trace!(rule_name = %rule.name(), date = %fact.date, "评估规则");
            rule.apply(fact, dependencies)
        })
    }

    pub fn rules(&self) -> &[Rule] {
        &self.rules
    }

    /// 获取当前规则数量
    pub fn len(&self) -> usize {
        self.rules.len()
    }

    /// 检查规则列表是否为空
    pub fn is_empty(&self) -> bool {
        self.rules.is_empty()
    }

    pub fn dependencies(&self) -> &Dependencies {
        &self.dependencies
    }

    pub fn store(&self) -> &MonthAggregateStore {
        self.dependencies.store()
    }

    pub fn into_dependencies(self) -> Dependencies {
        self.dependencies
    }
}
