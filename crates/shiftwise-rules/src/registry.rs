//! Statically registered action types and their parameter schemas.

use std::collections::BTreeMap;

use shiftwise_core::{ActionConfig, FactValue, Result, ScheduleError, Severity};

/// Type of a declared action parameter.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ParamType {
    Int,
    /// Integer that must be zero or positive.
    NonNegativeInt,
    /// Integer or decimal.
    Number,
    Str,
    Bool,
    /// One of `LOW`, `MEDIUM`, `HIGH`, `CRITICAL`.
    Severity,
}

impl ParamType {
    fn check(&self, value: &FactValue) -> std::result::Result<(), String> {
        let ok = match self {
            ParamType::Int => value.as_i64().is_some(),
            ParamType::NonNegativeInt => match value.as_i64() {
                Some(v) if v >= 0 => true,
                Some(v) => return Err(format!("must not be negative, got {}", v)),
                None => false,
            },
            ParamType::Number => value.is_numeric(),
            ParamType::Str => value.as_str().is_some(),
            ParamType::Bool => value.as_bool().is_some(),
            ParamType::Severity => match value.as_str() {
                Some(s) => return s.parse::<Severity>().map(|_| ()),
                None => false,
            },
        };
        if ok {
            Ok(())
        } else {
            Err(format!("expected {:?}, got {}", self, value.type_name()))
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ParamSpec {
    pub name: String,
    pub param_type: ParamType,
    pub required: bool,
}

/// Parameters an action type accepts.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ActionSchema {
    pub action_type: String,
    pub params: Vec<ParamSpec>,
}

impl ActionSchema {
    pub fn new(action_type: &str) -> Self {
        Self {
            action_type: action_type.to_string(),
            params: Vec::new(),
        }
    }

    pub fn required(mut self, name: &str, param_type: ParamType) -> Self {
        self.params.push(ParamSpec {
            name: name.to_string(),
            param_type,
            required: true,
        });
        self
    }

    pub fn optional(mut self, name: &str, param_type: ParamType) -> Self {
        self.params.push(ParamSpec {
            name: name.to_string(),
            param_type,
            required: false,
        });
        self
    }

    fn spec(&self, name: &str) -> Option<&ParamSpec> {
        self.params.iter().find(|p| p.name == name)
    }
}

/// Registry of action schemas keyed by action type name.
///
/// # Example
///
/// ```
/// use shiftwise_core::ActionConfig;
/// use shiftwise_rules::registry::{ActionRegistry, ActionSchema, ParamType};
///
/// let mut registry = ActionRegistry::with_builtins();
/// registry.register(ActionSchema::new("NOTIFY").required("channel", ParamType::Str));
///
/// let mut params = ActionConfig::new();
/// params.insert("channel".into(), "ops".into());
/// assert!(registry.validate_parameters("NOTIFY", &params).is_ok());
/// assert!(registry.validate_parameters("NOTIFY", &ActionConfig::new()).is_err());
/// ```
#[derive(Debug, Clone, Default)]
pub struct ActionRegistry {
    schemas: BTreeMap<String, ActionSchema>,
}

impl ActionRegistry {
    /// An empty registry.
    pub fn new() -> Self {
        Self::default()
    }

    /// A registry with the built-in action types.
    pub fn with_builtins() -> Self {
        let mut registry = Self::new();
        for action in ["FLAG_OVERTIME", "BLOCK_ASSIGNMENT", "WARN"] {
            registry.register(
                ActionSchema::new(action)
                    .optional("severity", ParamType::Severity)
                    .optional("message", ParamType::Str),
            );
        }
        registry.register(
            ActionSchema::new("ALLOW_SPLIT").optional("min_part_minutes", ParamType::NonNegativeInt),
        );
        registry.register(ActionSchema::new("PENALIZE").required("weight", ParamType::NonNegativeInt));
        registry.register(ActionSchema::new("EXCLUDE_CANDIDATE").optional("reason", ParamType::Str));
        registry
    }

    /// Registers or replaces a schema.
    pub fn register(&mut self, schema: ActionSchema) {
        self.schemas.insert(schema.action_type.clone(), schema);
    }

    pub fn get(&self, action_type: &str) -> Option<&ActionSchema> {
        self.schemas.get(action_type)
    }

    pub fn contains(&self, action_type: &str) -> bool {
        self.schemas.contains_key(action_type)
    }

    pub fn action_types(&self) -> impl Iterator<Item = &str> {
        self.schemas.keys().map(String::as_str)
    }

    /// Checks `params` against the schema of `action_type`.
    ///
    /// Keys named `skip` are ignored, so a full action configuration can be
    /// passed with its action-type key.
    pub fn validate_parameters_except(
        &self,
        action_type: &str,
        params: &ActionConfig,
        skip: &str,
    ) -> Result<()> {
        let schema = self.get(action_type).ok_or_else(|| ScheduleError::InvalidParameter {
            rule_type: action_type.to_string(),
            parameter: String::new(),
            message: "no schema registered for this action type".to_string(),
        })?;
        let invalid = |parameter: &str, message: String| ScheduleError::InvalidParameter {
            rule_type: action_type.to_string(),
            parameter: parameter.to_string(),
            message,
        };

        for spec in schema.params.iter().filter(|p| p.required) {
            if !params.contains_key(&spec.name) {
                return Err(invalid(&spec.name, "required parameter is missing".to_string()));
            }
        }
        for (name, value) in params.iter().filter(|(k, _)| k.as_str() != skip) {
            let spec = schema
                .spec(name)
                .ok_or_else(|| invalid(name, "unknown parameter".to_string()))?;
            spec.param_type
                .check(value)
                .map_err(|message| invalid(name, message))?;
        }
        Ok(())
    }

    /// Checks required and typed parameters for `action_type`.
    pub fn validate_parameters(&self, action_type: &str, params: &ActionConfig) -> Result<()> {
        self.validate_parameters_except(action_type, params, "")
    }
}
