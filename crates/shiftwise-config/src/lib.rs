//! Configuration system for Shiftwise.
//!
//! Load engine configuration from TOML or YAML to tune conflict detection,
//! resolution, optimization and prediction without code changes.
//!
//! # Examples
//!
//! Load configuration from a TOML string:
//!
//! ```
//! use shiftwise_config::EngineConfig;
//!
//! let config = EngineConfig::from_toml_str(r#"
//!     [detection]
//!     min_rest_minutes = 600
//!     holidays = ["2025-12-25"]
//!
//!     [optimizer]
//!     iteration_limit = 500
//!     random_seed = 7
//! "#).unwrap();
//!
//! assert_eq!(config.detection.min_rest_minutes, 600);
//! assert_eq!(config.optimizer.seed(), 7);
//! // Untouched sections keep their defaults
//! assert_eq!(config.resolution.retry_budget, 3);
//! ```
//!
//! Use default config when file is missing:
//!
//! ```
//! use shiftwise_config::EngineConfig;
//!
//! let config = EngineConfig::load("shiftwise.toml").unwrap_or_default();
//! ```

use std::collections::BTreeMap;
use std::path::Path;

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use shiftwise_core::RuleCategory;
use thiserror::Error;

/// Configuration error
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("TOML parse error: {0}")]
    Toml(#[from] toml::de::Error),

    #[error("YAML parse error: {0}")]
    Yaml(#[from] serde_yaml::Error),

    #[error("Invalid configuration: {0}")]
    Invalid(String),
}

/// Main engine configuration.
#[derive(Debug, Clone, Default, PartialEq, Deserialize, Serialize)]
#[serde(rename_all = "snake_case")]
pub struct EngineConfig {
    #[serde(default)]
    pub detection: DetectionConfig,

    #[serde(default)]
    pub resolution: ResolutionConfig,

    #[serde(default)]
    pub optimizer: OptimizerConfig,

    #[serde(default)]
    pub prediction: PredictionConfig,

    #[serde(default)]
    pub generation: GenerationConfig,

    #[serde(default)]
    pub rules: RulesConfig,
}

impl EngineConfig {
    /// Creates a new default configuration.
    pub fn new() -> Self {
        Self::default()
    }

    /// Loads and validates configuration from a TOML file.
    ///
    /// # Errors
    ///
    /// Returns error if the file doesn't exist, contains invalid TOML, or
    /// fails [`validate`](Self::validate).
    pub fn load(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let config = Self::from_toml_file(path)?;
        config.validate()?;
        Ok(config)
    }

    /// Loads configuration from a TOML file.
    pub fn from_toml_file(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let contents = std::fs::read_to_string(path)?;
        Self::from_toml_str(&contents)
    }

    /// Parses configuration from a TOML string.
    pub fn from_toml_str(s: &str) -> Result<Self, ConfigError> {
        Ok(toml::from_str(s)?)
    }

    /// Loads configuration from a YAML file.
    pub fn from_yaml_file(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let contents = std::fs::read_to_string(path)?;
        Self::from_yaml_str(&contents)
    }

    /// Parses configuration from a YAML string.
    pub fn from_yaml_str(s: &str) -> Result<Self, ConfigError> {
        Ok(serde_yaml::from_str(s)?)
    }

    /// Sets the optimizer seed.
    pub fn with_random_seed(mut self, seed: u64) -> Self {
        self.optimizer.random_seed = Some(seed);
        self
    }

    /// Sets the optimizer iteration budget.
    pub fn with_iteration_limit(mut self, limit: u64) -> Self {
        self.optimizer.iteration_limit = limit;
        self
    }

    /// Sets how many resolve/validate rounds a resolve call may run.
    pub fn with_retry_budget(mut self, budget: u32) -> Self {
        self.resolution.retry_budget = budget;
        self
    }

    /// Sets the minimum rest between two shifts of one employee.
    pub fn with_min_rest_minutes(mut self, minutes: i64) -> Self {
        self.detection.min_rest_minutes = minutes;
        self
    }

    /// Sets the rolling max-hours window.
    pub fn with_max_hours(mut self, window_days: i64, max_hours: i64) -> Self {
        self.detection.max_hours_window_days = window_days;
        self.detection.max_hours_in_window = max_hours;
        self
    }

    /// Adds a public holiday.
    pub fn with_holiday(mut self, date: NaiveDate) -> Self {
        self.detection.holidays.push(date);
        self
    }

    /// Restricts `author` to the given rule categories.
    pub fn with_permission(mut self, author: &str, categories: &[RuleCategory]) -> Self {
        self.rules
            .permissions
            .insert(author.to_string(), categories.to_vec());
        self
    }

    /// Checks value ranges that serde cannot express.
    pub fn validate(&self) -> Result<(), ConfigError> {
        let d = &self.detection;
        if d.min_rest_minutes < 0 {
            return Err(ConfigError::Invalid(
                "detection.min_rest_minutes must not be negative".into(),
            ));
        }
        if d.max_hours_window_days <= 0 || d.max_hours_in_window <= 0 {
            return Err(ConfigError::Invalid(
                "detection max-hours window and limit must be positive".into(),
            ));
        }
        if self.resolution.retry_budget == 0 {
            return Err(ConfigError::Invalid(
                "resolution.retry_budget must be at least 1".into(),
            ));
        }
        let o = &self.optimizer;
        if !(o.tolerance_decay > 0.0 && o.tolerance_decay <= 1.0) {
            return Err(ConfigError::Invalid(format!(
                "optimizer.tolerance_decay must be in (0, 1], got {}",
                o.tolerance_decay
            )));
        }
        if o.starting_tolerance < 0.0 || o.starting_temperature <= 0.0 {
            return Err(ConfigError::Invalid(
                "optimizer tolerance must be >= 0 and temperature > 0".into(),
            ));
        }
        if o.overtime_multiplier < 1.0 {
            return Err(ConfigError::Invalid(
                "optimizer.overtime_multiplier must be at least 1.0".into(),
            ));
        }
        if self.prediction.slot_minutes <= 0 || 1440 % self.prediction.slot_minutes != 0 {
            return Err(ConfigError::Invalid(
                "prediction.slot_minutes must be positive and divide a day".into(),
            ));
        }
        Ok(())
    }
}

/// Built-in conflict detection checks.
#[derive(Debug, Clone, PartialEq, Deserialize, Serialize)]
#[serde(default, rename_all = "snake_case")]
pub struct DetectionConfig {
    /// Minimum gap between the end of one shift and the start of the next.
    pub min_rest_minutes: i64,

    /// Length of the rolling max-hours window.
    pub max_hours_window_days: i64,

    /// Hours allowed inside one rolling window.
    pub max_hours_in_window: i64,

    /// Dates reported as `date.isHoliday`.
    pub holidays: Vec<NaiveDate>,

    /// Weekly hours above which labor cost uses the overtime multiplier.
    pub weekly_hours_threshold: i64,
}

impl Default for DetectionConfig {
    fn default() -> Self {
        Self {
            min_rest_minutes: 660,
            max_hours_window_days: 7,
            max_hours_in_window: 48,
            holidays: Vec::new(),
            weekly_hours_threshold: 40,
        }
    }
}

impl DetectionConfig {
    pub fn is_holiday(&self, date: NaiveDate) -> bool {
        self.holidays.contains(&date)
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Deserialize, Serialize)]
#[serde(default, rename_all = "snake_case")]
pub struct ResolutionConfig {
    /// Maximum resolve/validate rounds per resolve call.
    pub retry_budget: u32,

    /// Strategy used by `refine_plan` when none is given.
    pub default_strategy: String,
}

impl Default for ResolutionConfig {
    fn default() -> Self {
        Self {
            retry_budget: 3,
            default_strategy: "REASSIGN".to_string(),
        }
    }
}

/// Local search settings.
#[derive(Debug, Clone, PartialEq, Deserialize, Serialize)]
#[serde(default, rename_all = "snake_case")]
pub struct OptimizerConfig {
    pub iteration_limit: u64,

    /// Stop after this many iterations without a new best score.
    pub unimproved_iteration_limit: u64,

    /// Largest soft-score loss accepted in the first iteration.
    pub starting_tolerance: f64,

    /// Per-iteration factor applied to tolerance and temperature.
    pub tolerance_decay: f64,

    pub starting_temperature: f64,

    /// Step of the shift-time nudge move.
    pub nudge_minutes: i64,

    /// Random seed; runs with the same seed and input are identical.
    pub random_seed: Option<u64>,

    pub default_hourly_rate_cents: i64,

    pub overtime_multiplier: f64,
}

impl Default for OptimizerConfig {
    fn default() -> Self {
        Self {
            iteration_limit: 2000,
            unimproved_iteration_limit: 300,
            starting_tolerance: 50.0,
            tolerance_decay: 0.995,
            starting_temperature: 10.0,
            nudge_minutes: 30,
            random_seed: None,
            default_hourly_rate_cents: 2500,
            overtime_multiplier: 1.5,
        }
    }
}

impl OptimizerConfig {
    pub const DEFAULT_SEED: u64 = 42;

    /// Effective seed: the configured one or [`Self::DEFAULT_SEED`].
    pub fn seed(&self) -> u64 {
        self.random_seed.unwrap_or(Self::DEFAULT_SEED)
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Deserialize, Serialize)]
#[serde(default, rename_all = "snake_case")]
pub struct PredictionConfig {
    /// Width of the coverage model's time slots.
    pub slot_minutes: i64,
}

impl Default for PredictionConfig {
    fn default() -> Self {
        Self { slot_minutes: 60 }
    }
}

/// Assignment heuristic used to build an initial draft.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Deserialize, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum GenerationHeuristic {
    /// Pick the eligible employee with the fewest assigned minutes.
    #[default]
    LeastLoaded,

    /// Cycle through the roster in id order.
    RoundRobin,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize, Serialize)]
#[serde(default, rename_all = "snake_case")]
pub struct GenerationConfig {
    pub heuristic: GenerationHeuristic,
}

/// Rule admission settings.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize, Serialize)]
#[serde(default, rename_all = "snake_case")]
pub struct RulesConfig {
    /// Categories each author may manage. Authors not listed may manage any
    /// category; an empty map disables permission checks.
    pub permissions: BTreeMap<String, Vec<RuleCategory>>,

    /// Action configuration key naming the action type.
    pub required_action_key: String,
}

impl Default for RulesConfig {
    fn default() -> Self {
        Self {
            permissions: BTreeMap::new(),
            required_action_key: shiftwise_core::domain::ACTION_KEY.to_string(),
        }
    }
}

impl RulesConfig {
    pub fn permits(&self, author: &str, category: RuleCategory) -> bool {
        match self.permissions.get(author) {
            Some(allowed) => allowed.contains(&category),
            None => true,
        }
    }
}

#[cfg(test)]
mod tests;
