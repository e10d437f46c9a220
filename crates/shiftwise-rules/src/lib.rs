//! Shiftwise Rules - business rule lifecycle for the scheduling engine
//!
//! Rules flow through load → validate → cache → evaluate → hot-reload:
//! - [`store::RuleStore`]: where raw definitions come from
//! - [`validator::RuleValidator`]: fail-fast admission checks
//! - [`loader::RuleLoader`]: copy-on-write cache of compiled rules
//! - [`condition`]: the boolean condition language and its evaluator
//! - [`registry::ActionRegistry`]: action types and parameter schemas
//!
//! # Example
//!
//! ```
//! use std::sync::Arc;
//! use shiftwise_config::RulesConfig;
//! use shiftwise_core::{RuleCategory, RuleDefinition};
//! use shiftwise_rules::{ActionRegistry, FactContext, InMemoryRuleStore, RuleLoader};
//!
//! let store = Arc::new(InMemoryRuleStore::with_rules([RuleDefinition::new(
//!     "R-OT",
//!     RuleCategory::ScheduleConstraint,
//!     "employee.weeklyHours > 48",
//! )
//! .with_action("FLAG_OVERTIME")]));
//!
//! let loader = RuleLoader::new(store, Arc::new(ActionRegistry::with_builtins()), RulesConfig::default());
//! assert_eq!(loader.load_all_active_rules().unwrap(), vec!["R-OT".to_string()]);
//!
//! let rule = loader.rule("R-OT").unwrap();
//! let facts = FactContext::new().with("employee.weeklyHours", 50);
//! assert!(rule.evaluate(&facts).unwrap().value);
//! ```

pub mod condition;
pub mod facts;
pub mod loader;
pub mod registry;
pub mod store;
pub mod validator;

pub use condition::{Evaluation, Expr};
pub use facts::FactContext;
pub use loader::{CompiledRule, ReloadReport, RuleLoader, RuleSnapshot, RuleStatistics};
pub use registry::{ActionRegistry, ActionSchema, ParamType};
pub use store::{InMemoryRuleStore, RuleStore};
pub use validator::{DependencyGraph, RuleValidator};
