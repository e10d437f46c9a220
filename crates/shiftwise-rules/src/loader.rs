//! Copy-on-write rule cache.
//!
//! Readers take an `Arc` of the current [`RuleSnapshot`] and never block on
//! a reload; writers build a fresh snapshot off-lock and swap the reference.

use std::collections::BTreeMap;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;

use chrono::{DateTime, Utc};
use parking_lot::{Mutex, RwLock};
use serde::Serialize;
use shiftwise_config::RulesConfig;
use shiftwise_core::{
    ActionConfig, FactValue, Result, RuleCategory, RuleDefinition, RuleId, ScheduleError,
};
use tracing::{info, warn};

use crate::condition::{evaluate, Evaluation, Expr};
use crate::facts::FactContext;
use crate::registry::ActionRegistry;
use crate::store::RuleStore;
use crate::validator::{DependencyGraph, RuleValidator};

/// An admitted rule with its condition compiled once at load.
#[derive(Debug, Clone, PartialEq)]
pub struct CompiledRule {
    pub definition: RuleDefinition,
    pub condition: Expr,
}

impl CompiledRule {
    pub fn id(&self) -> &str {
        &self.definition.id
    }

    pub fn category(&self) -> RuleCategory {
        self.definition.category
    }

    pub fn evaluate(&self, ctx: &FactContext) -> Result<Evaluation> {
        evaluate(&self.condition, ctx)
    }

    /// An action parameter, if set.
    pub fn param(&self, name: &str) -> Option<&FactValue> {
        self.definition.action.get(name)
    }

    fn ordering_key(&self) -> (RuleCategory, std::cmp::Reverse<i32>, &str) {
        (
            self.definition.category,
            std::cmp::Reverse(self.definition.priority),
            &self.definition.id,
        )
    }
}

/// An internally consistent view of every admitted rule.
#[derive(Debug, Clone, Default)]
pub struct RuleSnapshot {
    generation: u64,
    rules: BTreeMap<RuleId, Arc<CompiledRule>>,
    /// Per category, ordered by priority descending then id.
    by_category: BTreeMap<RuleCategory, Vec<Arc<CompiledRule>>>,
    history: BTreeMap<(RuleId, u32), Arc<RuleDefinition>>,
}

impl RuleSnapshot {
    fn rebuild_index(&mut self) {
        self.by_category.clear();
        for rule in self.rules.values() {
            self.by_category
                .entry(rule.category())
                .or_default()
                .push(Arc::clone(rule));
        }
        for rules in self.by_category.values_mut() {
            rules.sort_by(|a, b| a.ordering_key().cmp(&b.ordering_key()));
        }
    }

    fn admit(&mut self, rule: CompiledRule) {
        let key = (rule.definition.id.clone(), rule.definition.version);
        self.history
            .insert(key, Arc::new(rule.definition.clone()));
        self.rules.insert(rule.definition.id.clone(), Arc::new(rule));
    }

    pub fn generation(&self) -> u64 {
        self.generation
    }

    pub fn get(&self, id: &str) -> Option<&Arc<CompiledRule>> {
        self.rules.get(id)
    }

    pub fn len(&self) -> usize {
        self.rules.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rules.is_empty()
    }

    /// Rules of `category` effective at `at`, by priority descending then id.
    pub fn active(&self, category: RuleCategory, at: DateTime<Utc>) -> Vec<Arc<CompiledRule>> {
        self.by_category
            .get(&category)
            .map(|rules| {
                rules
                    .iter()
                    .filter(|r| r.definition.is_effective_at(at))
                    .cloned()
                    .collect()
            })
            .unwrap_or_default()
    }

    /// Every rule effective at `at`, by category, priority descending, id.
    pub fn all_active(&self, at: DateTime<Utc>) -> Vec<Arc<CompiledRule>> {
        RuleCategory::ALL
            .into_iter()
            .flat_map(|category| self.active(category, at))
            .collect()
    }
}

/// Cache counters for monitoring.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct RuleStatistics {
    pub total_rules: usize,
    pub active_rules: usize,
    /// Active rules per category.
    pub per_category: BTreeMap<RuleCategory, usize>,
    pub cache_hits: u64,
    pub cache_misses: u64,
    /// Hits over lookups; 0.0 before the first lookup.
    pub hit_ratio: f64,
    pub generation: u64,
    pub history_versions: usize,
}

/// Outcome of a full reload.
#[derive(Debug, Clone, PartialEq)]
pub struct ReloadReport {
    pub loaded: usize,
    /// Rules that failed validation, with the reason.
    pub rejected: Vec<(RuleId, String)>,
    pub generation: u64,
}

/// Loads rules from a [`RuleStore`], validates them and serves the active set.
pub struct RuleLoader {
    store: Arc<dyn RuleStore>,
    validator: RuleValidator,
    snapshot: RwLock<Arc<RuleSnapshot>>,
    /// Serializes writers so concurrent reloads never lose an update.
    writer: Mutex<()>,
    hits: AtomicU64,
    misses: AtomicU64,
}

impl RuleLoader {
    pub fn new(store: Arc<dyn RuleStore>, registry: Arc<ActionRegistry>, config: RulesConfig) -> Self {
        let validator = RuleValidator::new(Arc::clone(&store), registry, config);
        Self {
            store,
            validator,
            snapshot: RwLock::new(Arc::new(RuleSnapshot::default())),
            writer: Mutex::new(()),
            hits: AtomicU64::new(0),
            misses: AtomicU64::new(0),
        }
    }

    pub fn validator(&self) -> &RuleValidator {
        &self.validator
    }

    /// The current snapshot. Holding it pins a consistent rule set.
    pub fn snapshot(&self) -> Arc<RuleSnapshot> {
        Arc::clone(&self.snapshot.read())
    }

    fn swap(&self, next: RuleSnapshot) {
        *self.snapshot.write() = Arc::new(next);
    }

    /// Full reload, then the ids of every rule effective now.
    pub fn load_all_active_rules(&self) -> Result<Vec<RuleId>> {
        self.reload_all_rules()?;
        Ok(self.active_rule_ids(Utc::now()))
    }

    /// Ids of cached rules effective at `at`, by category, priority descending, id.
    pub fn active_rule_ids(&self, at: DateTime<Utc>) -> Vec<RuleId> {
        self.snapshot()
            .all_active(at)
            .iter()
            .map(|r| r.definition.id.clone())
            .collect()
    }

    /// Ids of cached rules of `category` effective now.
    pub fn get_rules_by_category(&self, category: RuleCategory) -> Vec<RuleId> {
        self.snapshot()
            .active(category, Utc::now())
            .iter()
            .map(|r| r.definition.id.clone())
            .collect()
    }

    /// Compiled rules of `category` effective at `at`.
    pub fn active_rules(&self, category: RuleCategory, at: DateTime<Utc>) -> Vec<Arc<CompiledRule>> {
        self.snapshot().active(category, at)
    }

    /// Looks a rule up in the cache, reading through to the store on a miss.
    pub fn rule(&self, id: &str) -> Result<Arc<CompiledRule>> {
        if let Some(rule) = self.snapshot().get(id) {
            self.hits.fetch_add(1, Ordering::Relaxed);
            return Ok(Arc::clone(rule));
        }
        self.misses.fetch_add(1, Ordering::Relaxed);
        self.reload_rule(id)?;
        self.snapshot()
            .get(id)
            .cloned()
            .ok_or_else(|| ScheduleError::RuleNotFound(id.to_string()))
    }

    /// The action configuration of rule `id`.
    pub fn load_rule_config(&self, id: &str) -> Result<ActionConfig> {
        Ok(self.rule(id)?.definition.action.clone())
    }

    /// Re-reads one rule and swaps it into the cache.
    ///
    /// A rule that fails validation is not admitted and the previously cached
    /// version, if any, stays active. A rule gone from the store is dropped
    /// from the active set but kept in the version history.
    pub fn reload_rule(&self, id: &str) -> Result<()> {
        let _writer = self.writer.lock();
        let current = self.snapshot();

        let Some(definition) = self.store.fetch(id)? else {
            if current.get(id).is_some() {
                let mut next = (*current).clone();
                next.rules.remove(id);
                next.generation += 1;
                next.rebuild_index();
                self.swap(next);
            }
            return Err(ScheduleError::RuleNotFound(id.to_string()));
        };

        let condition = match self.validator.validate_against_store(&definition) {
            Ok(condition) => condition,
            Err(err) => {
                warn!(event = "rule_rejected", rule_id = id, error = %err);
                return Err(err);
            }
        };

        let version = definition.version;
        let mut next = (*current).clone();
        next.admit(CompiledRule {
            definition,
            condition,
        });
        next.generation += 1;
        next.rebuild_index();
        let generation = next.generation;
        self.swap(next);

        info!(
            event = "rule_reloaded",
            rule_id = id,
            version = version,
            generation = generation,
        );
        Ok(())
    }

    /// Rebuilds the whole cache from the store as one atomic swap.
    ///
    /// Invalid rules are skipped and reported; valid ones are admitted.
    pub fn reload_all_rules(&self) -> Result<ReloadReport> {
        let _writer = self.writer.lock();
        let current = self.snapshot();
        let definitions = self.store.fetch_all()?;
        let graph = DependencyGraph::from_rules(&definitions);

        let mut next = RuleSnapshot {
            generation: current.generation + 1,
            history: current.history.clone(),
            ..RuleSnapshot::default()
        };
        let mut rejected = Vec::new();
        for definition in definitions {
            match self.validator.validate_definition(&definition, &graph) {
                Ok(condition) => next.admit(CompiledRule {
                    definition,
                    condition,
                }),
                Err(err) => {
                    warn!(event = "rule_rejected", rule_id = %definition.id, error = %err);
                    rejected.push((definition.id, err.to_string()));
                }
            }
        }
        next.rebuild_index();

        let report = ReloadReport {
            loaded: next.rules.len(),
            rejected,
            generation: next.generation,
        };
        self.swap(next);

        info!(
            event = "rules_loaded",
            loaded = report.loaded,
            rejected = report.rejected.len(),
            generation = report.generation,
        );
        Ok(report)
    }

    /// Whether cached rule `id` is enabled and effective at `at`.
    pub fn is_rule_effective(&self, id: &str, at: DateTime<Utc>) -> Result<bool> {
        self.snapshot()
            .get(id)
            .map(|r| r.definition.is_effective_at(at))
            .ok_or_else(|| ScheduleError::RuleNotFound(id.to_string()))
    }

    /// A specific admitted version of a rule, including retired ones.
    pub fn rule_version(&self, id: &str, version: u32) -> Result<Arc<RuleDefinition>> {
        self.snapshot()
            .history
            .get(&(id.to_string(), version))
            .cloned()
            .ok_or_else(|| ScheduleError::RuleNotFound(format!("{} v{}", id, version)))
    }

    pub fn rule_statistics(&self) -> RuleStatistics {
        let snapshot = self.snapshot();
        let now = Utc::now();
        let mut per_category = BTreeMap::new();
        let mut active_rules = 0;
        for category in RuleCategory::ALL {
            let count = snapshot.active(category, now).len();
            active_rules += count;
            per_category.insert(category, count);
        }
        let hits = self.hits.load(Ordering::Relaxed);
        let misses = self.misses.load(Ordering::Relaxed);
        let lookups = hits + misses;
        RuleStatistics {
            total_rules: snapshot.len(),
            active_rules,
            per_category,
            cache_hits: hits,
            cache_misses: misses,
            hit_ratio: if lookups == 0 {
                0.0
            } else {
                hits as f64 / lookups as f64
            },
            generation: snapshot.generation,
            history_versions: snapshot.history.len(),
        }
    }

    /// Drops every cached rule and the version history.
    pub fn clear(&self) {
        let _writer = self.writer.lock();
        let generation = self.snapshot().generation + 1;
        self.swap(RuleSnapshot {
            generation,
            ..RuleSnapshot::default()
        });
    }
}
