//! Business rule definitions as stored by the rule persistence collaborator.

use std::collections::BTreeMap;
use std::fmt;
use std::str::FromStr;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::error::ScheduleError;
use crate::value::FactValue;

pub type RuleId = String;

/// Structured key/value action configuration of a rule.
pub type ActionConfig = BTreeMap<String, FactValue>;

/// Key of the action configuration entry naming the action type.
pub const ACTION_KEY: &str = "action";

/// Which part of the engine consults a rule.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum RuleCategory {
    /// Evaluated by the conflict detector; a true condition is a violation.
    ScheduleConstraint,
    /// A true condition permits splitting the assignment.
    SplitPolicy,
    /// A true condition costs soft score during optimization.
    SoftPreference,
    /// A true condition excludes the employee as a replacement candidate.
    Eligibility,
}

impl RuleCategory {
    pub const ALL: [RuleCategory; 4] = [
        RuleCategory::ScheduleConstraint,
        RuleCategory::SplitPolicy,
        RuleCategory::SoftPreference,
        RuleCategory::Eligibility,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            RuleCategory::ScheduleConstraint => "SCHEDULE_CONSTRAINT",
            RuleCategory::SplitPolicy => "SPLIT_POLICY",
            RuleCategory::SoftPreference => "SOFT_PREFERENCE",
            RuleCategory::Eligibility => "ELIGIBILITY",
        }
    }
}

impl fmt::Display for RuleCategory {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for RuleCategory {
    type Err = ScheduleError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        RuleCategory::ALL
            .into_iter()
            .find(|c| c.as_str().eq_ignore_ascii_case(s.trim()))
            .ok_or_else(|| ScheduleError::Store(format!("unknown rule category '{}'", s)))
    }
}

/// A raw rule as persisted: condition, action and lifecycle metadata.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RuleDefinition {
    pub id: RuleId,
    #[serde(default)]
    pub name: String,
    pub category: RuleCategory,
    pub condition: String,
    #[serde(default)]
    pub action: ActionConfig,
    #[serde(default)]
    pub priority: i32,
    #[serde(default = "default_version")]
    pub version: u32,
    pub effective_from: DateTime<Utc>,
    #[serde(default)]
    pub effective_to: Option<DateTime<Utc>>,
    #[serde(default = "default_enabled")]
    pub enabled: bool,
    #[serde(default)]
    pub author: String,
    #[serde(default)]
    pub requires: Vec<RuleId>,
    #[serde(default)]
    pub description: String,
}

fn default_version() -> u32 {
    1
}

fn default_enabled() -> bool {
    true
}

impl RuleDefinition {
    /// Creates an enabled, open-ended rule effective since the Unix epoch.
    pub fn new(id: impl Into<RuleId>, category: RuleCategory, condition: impl Into<String>) -> Self {
        let id = id.into();
        Self {
            name: id.clone(),
            id,
            category,
            condition: condition.into(),
            action: ActionConfig::new(),
            priority: 0,
            version: 1,
            effective_from: DateTime::<Utc>::UNIX_EPOCH,
            effective_to: None,
            enabled: true,
            author: String::new(),
            requires: Vec::new(),
            description: String::new(),
        }
    }

    pub fn with_action(mut self, action_type: &str) -> Self {
        self.action
            .insert(ACTION_KEY.to_string(), FactValue::Str(action_type.to_string()));
        self
    }

    pub fn with_param(mut self, key: &str, value: impl Into<FactValue>) -> Self {
        self.action.insert(key.to_string(), value.into());
        self
    }

    pub fn with_priority(mut self, priority: i32) -> Self {
        self.priority = priority;
        self
    }

    pub fn with_version(mut self, version: u32) -> Self {
        self.version = version;
        self
    }

    pub fn with_window(mut self, from: DateTime<Utc>, to: Option<DateTime<Utc>>) -> Self {
        self.effective_from = from;
        self.effective_to = to;
        self
    }

    pub fn with_author(mut self, author: &str) -> Self {
        self.author = author.to_string();
        self
    }

    pub fn requiring(mut self, dependency: &str) -> Self {
        self.requires.push(dependency.to_string());
        self
    }

    pub fn disabled(mut self) -> Self {
        self.enabled = false;
        self
    }

    /// Name of the configured action type, if any.
    pub fn action_type(&self) -> Option<&str> {
        self.action.get(ACTION_KEY).and_then(FactValue::as_str)
    }

    /// Parameters of the action, without the action-type key.
    pub fn action_params(&self) -> impl Iterator<Item = (&String, &FactValue)> {
        self.action.iter().filter(|(k, _)| k.as_str() != ACTION_KEY)
    }

    /// A rule is usable only when enabled and `at` lies in `[effective_from, effective_to)`.
    pub fn is_effective_at(&self, at: DateTime<Utc>) -> bool {
        self.enabled
            && self.effective_from <= at
            && self.effective_to.map_or(true, |to| at < to)
    }
}
