//! Admission checks a rule must pass before it enters the active cache.

use std::collections::{BTreeMap, BTreeSet};
use std::sync::Arc;

use shiftwise_config::RulesConfig;
use shiftwise_core::{ActionConfig, Result, RuleDefinition, RuleId, ScheduleError};

use crate::condition::{parse, Expr};
use crate::registry::ActionRegistry;
use crate::store::RuleStore;

/// Rule-to-rule `requires` edges.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct DependencyGraph {
    edges: BTreeMap<RuleId, Vec<RuleId>>,
}

impl DependencyGraph {
    pub fn from_rules<'a>(rules: impl IntoIterator<Item = &'a RuleDefinition>) -> Self {
        let mut graph = Self::default();
        for rule in rules {
            graph.insert(rule);
        }
        graph
    }

    /// Adds a rule's edges, replacing any edges it already had.
    pub fn insert(&mut self, rule: &RuleDefinition) {
        self.edges.insert(rule.id.clone(), rule.requires.clone());
    }

    pub fn contains(&self, id: &str) -> bool {
        self.edges.contains_key(id)
    }

    pub fn edges_of(&self, id: &str) -> Option<&[RuleId]> {
        self.edges.get(id).map(Vec::as_slice)
    }

    /// Fails on a missing dependency or on a cycle reachable from `start`.
    ///
    /// A reported cycle starts and ends with the same rule id.
    pub fn check_from(&self, start: &str) -> Result<()> {
        let mut done = BTreeSet::new();
        let mut path = Vec::new();
        self.visit(start, &mut path, &mut done)
    }

    fn visit<'a>(
        &'a self,
        id: &'a str,
        path: &mut Vec<&'a str>,
        done: &mut BTreeSet<&'a str>,
    ) -> Result<()> {
        if let Some(idx) = path.iter().position(|p| *p == id) {
            let mut cycle: Vec<String> = path[idx..].iter().map(|s| s.to_string()).collect();
            cycle.push(id.to_string());
            return Err(ScheduleError::CyclicDependency { cycle });
        }
        if done.contains(id) {
            return Ok(());
        }
        let deps = self
            .edges
            .get(id)
            .ok_or_else(|| ScheduleError::RuleNotFound(id.to_string()))?;
        path.push(id);
        for dep in deps {
            self.visit(dep, path, done)?;
        }
        path.pop();
        done.insert(id);
        Ok(())
    }
}

/// Runs syntax, action, parameter, permission, time-range and dependency
/// checks in that order, stopping at the first failure.
pub struct RuleValidator {
    store: Arc<dyn RuleStore>,
    registry: Arc<ActionRegistry>,
    config: RulesConfig,
}

impl RuleValidator {
    pub fn new(store: Arc<dyn RuleStore>, registry: Arc<ActionRegistry>, config: RulesConfig) -> Self {
        Self {
            store,
            registry,
            config,
        }
    }

    pub fn registry(&self) -> &ActionRegistry {
        &self.registry
    }

    /// Validates the stored rule `id`.
    ///
    /// Returns the compiled condition on success.
    pub fn validate_rule(&self, id: &str) -> Result<Expr> {
        let rule = self
            .store
            .fetch(id)?
            .ok_or_else(|| ScheduleError::RuleNotFound(id.to_string()))?;
        self.validate_against_store(&rule)
    }

    /// Validates `rule` with dependencies resolved against the store, `rule`
    /// replacing its stored version.
    pub fn validate_against_store(&self, rule: &RuleDefinition) -> Result<Expr> {
        let graph = self.store_graph(Some(rule))?;
        self.validate_definition(rule, &graph)
    }

    /// Validates a definition against a dependency graph that includes it.
    pub fn validate_definition(&self, rule: &RuleDefinition, graph: &DependencyGraph) -> Result<Expr> {
        let condition = self.validate_rule_condition(&rule.condition)?;

        let key = self.config.required_action_key.as_str();
        let action_type = match rule.action.get(key) {
            Some(value) => value.as_str().ok_or_else(|| ScheduleError::InvalidAction {
                rule_id: rule.id.clone(),
                message: format!("'{}' must be a string, got {}", key, value.type_name()),
            })?,
            None => {
                return Err(ScheduleError::InvalidAction {
                    rule_id: rule.id.clone(),
                    message: format!("missing '{}' key", key),
                })
            }
        };
        if !self.registry.contains(action_type) {
            return Err(ScheduleError::InvalidAction {
                rule_id: rule.id.clone(),
                message: format!("unregistered action type '{}'", action_type),
            });
        }

        self.registry
            .validate_parameters_except(action_type, &rule.action, key)?;

        if !self.config.permits(&rule.author, rule.category) {
            return Err(ScheduleError::PermissionDenied {
                author: rule.author.clone(),
                category: rule.category.to_string(),
            });
        }

        if matches!(rule.effective_to, Some(to) if to <= rule.effective_from) {
            return Err(ScheduleError::InvalidTimeRange(rule.id.clone()));
        }

        if graph.edges_of(&rule.id) == Some(rule.requires.as_slice()) {
            graph.check_from(&rule.id)?;
        } else {
            let mut graph = graph.clone();
            graph.insert(rule);
            graph.check_from(&rule.id)?;
        }

        Ok(condition)
    }

    /// Parses a condition expression.
    pub fn validate_rule_condition(&self, expr: &str) -> Result<Expr> {
        parse(expr)
    }

    /// Checks declared parameters of `rule_type` against its registered schema.
    pub fn validate_rule_parameters(&self, rule_type: &str, params: &ActionConfig) -> Result<()> {
        self.registry.validate_parameters(rule_type, params)
    }

    /// Checks the `requires` graph reachable from the stored rule `id`.
    pub fn validate_rule_dependencies(&self, id: &str) -> Result<()> {
        let graph = self.store_graph(None)?;
        if !graph.contains(id) {
            return Err(ScheduleError::RuleNotFound(id.to_string()));
        }
        graph.check_from(id)
    }

    fn store_graph(&self, overriding: Option<&RuleDefinition>) -> Result<DependencyGraph> {
        let rules = self.store.fetch_all()?;
        let mut graph = DependencyGraph::from_rules(&rules);
        if let Some(rule) = overriding {
            graph.insert(rule);
        }
        Ok(graph)
    }
}
