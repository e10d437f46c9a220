//! The rule persistence seam.

use std::collections::BTreeMap;

use parking_lot::RwLock;
use shiftwise_core::{Result, RuleDefinition};

/// Source of raw rule definitions, keyed by rule id.
///
/// Implementations return the latest stored version of each rule; the loader
/// keeps older versions it has admitted.
pub trait RuleStore: Send + Sync {
    /// Returns the rule, or `None` if the store has no rule with this id.
    fn fetch(&self, id: &str) -> Result<Option<RuleDefinition>>;

    /// Returns every stored rule, enabled or not.
    fn fetch_all(&self) -> Result<Vec<RuleDefinition>>;
}

/// Thread-safe in-memory store.
#[derive(Debug, Default)]
pub struct InMemoryRuleStore {
    rules: RwLock<BTreeMap<String, RuleDefinition>>,
}

impl InMemoryRuleStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_rules(rules: impl IntoIterator<Item = RuleDefinition>) -> Self {
        let store = Self::new();
        for rule in rules {
            store.put(rule);
        }
        store
    }

    /// Inserts or replaces a rule.
    pub fn put(&self, rule: RuleDefinition) {
        self.rules.write().insert(rule.id.clone(), rule);
    }

    pub fn remove(&self, id: &str) -> Option<RuleDefinition> {
        self.rules.write().remove(id)
    }

    pub fn len(&self) -> usize {
        self.rules.read().len()
    }

    pub fn is_empty(&self) -> bool {
        self.rules.read().is_empty()
    }
}

impl RuleStore for InMemoryRuleStore {
    fn fetch(&self, id: &str) -> Result<Option<RuleDefinition>> {
        Ok(self.rules.read().get(id).cloned())
    }

    fn fetch_all(&self) -> Result<Vec<RuleDefinition>> {
        Ok(self.rules.read().values().cloned().collect())
    }
}
