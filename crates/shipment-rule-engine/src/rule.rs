//! 规则定义
//!
//! 规则 = 有序条件列表 + 一个效果。所有条件满足时才执行效果。
//! 每条规则构造时生成唯一 ID，克隆共享同一 ID，引擎按 ID 判断同一性。

use crate::conditions::Condition;
use crate::dependencies::Dependencies;
use crate::models::Fact;
use std::fmt;
use std::sync::Arc;
use uuid::Uuid;

/// 规则效果：返回新的记录，可能同时写入聚合存储
pub type Effect = dyn Fn(Fact, &mut Dependencies) -> Fact + Send + Sync;

/// 规则
#[derive(Clone)]
pub struct Rule {
    id: String,
    name: String,
    conditions: Vec<Condition>,
    effect: Arc<Effect>,
}

impl Rule {
    pub fn new<F>(name: impl Into<String>, conditions: Vec<Condition>, effect: F) -> Self
    where
        F: Fn(Fact, &mut Dependencies) -> Fact + Send + Sync + 'static,
    {
        Self {
            id: Uuid::new_v4().to_string(),
            name: name.into(),
            conditions,
            effect: Arc::new(effect),
        }
    }

    pub fn id(&self) -> &str {
        &self.id
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn conditions(&self) -> &[Condition] {
        &self.conditions
    }

    /// 所有条件是否满足（短路求值，条件均为纯读取）
    pub fn matches(&self, fact: &Fact, dependencies: &Dependencies) -> bool {
        self.conditions
            .iter()
            .all(|condition| condition.evaluate(fact, dependencies))
    }

    /// 应用规则
    ///
    /// 任一条件不满足时原样返回记录，不产生任何副作用。
    pub fn apply(&self, fact: Fact, dependencies: &mut Dependencies) -> Fact {
        if self.matches(&fact, dependencies) {
            (self.effect)(fact, dependencies)
        } else {
            fact
        }
    }
}

impl PartialEq for Rule {
    fn eq(&self, other: &Self) -> bool {
        self.id == other.id
    }
}

impl Eq for Rule {}

impl fmt::Debug for Rule {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Rule")
            .field("id", &self.id)
            .field("name", &self.name)
            .field("conditions", &self.conditions)
            .finish_non_exhaustive()
    }
}
