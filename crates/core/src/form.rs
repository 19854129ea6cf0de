//! Structured input forms attached to tasks.
//!
//! A task may declare a form the learner fills in before the task can be
//! acted on (for example an IP address for a DNS record). Input types are
//! registered in an explicit [`InputTypes`] table together with their
//! validators; there is no global registry.

use std::collections::HashMap;

use regex::Regex;
use serde::{Deserialize, Serialize};

/// Error raised when a form declaration or a submitted value is rejected.
#[derive(Debug, thiserror::Error)]
pub enum FormError {
    /// The declared input type is not registered
    #[error("unknown input type: {0}")]
    UnknownInputType(String),

    /// No value was submitted for a declared input
    #[error("missing value for input `{0}`")]
    MissingValue(String),

    /// A submitted value failed a type validator
    #[error("invalid value for input `{input}`: {reason}")]
    InvalidValue {
        /// Name of the offending input
        input: String,
        /// Why the value was rejected
        reason: String,
    },
}

impl FormError {
    fn invalid(input: &InputSpec, reason: impl Into<String>) -> Self {
        Self::InvalidValue {
            input: input.name.clone(),
            reason: reason.into(),
        }
    }
}

/// A single form input declaration.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct InputSpec {
    /// Field name submitted with the form
    pub name: String,

    /// Input type; must be registered in [`InputTypes`]
    #[serde(rename = "type")]
    pub input_type: String,

    /// Display label
    #[serde(default)]
    pub label: String,

    /// Type-specific options (`regex`, `min_value`, `max_value`, ...)
    #[serde(flatten)]
    pub options: HashMap<String, serde_json::Value>,
}

impl InputSpec {
    fn str_option(&self, key: &str) -> Option<&str> {
        self.options.get(key).and_then(|v| v.as_str())
    }

    fn int_option(&self, key: &str) -> Option<i64> {
        self.options.get(key).and_then(|v| v.as_i64())
    }
}

/// A structured input form declared by a task.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Form {
    /// Prompt shown above the inputs
    #[serde(default)]
    pub description: String,

    /// Ordered input declarations
    pub inputs: Vec<InputSpec>,
}

impl Form {
    /// Validate submitted values against every input's type validators.
    ///
    /// Values are keyed by input name. The first violation is returned.
    pub fn validate(
        &self,
        values: &HashMap<String, String>,
        types: &InputTypes,
    ) -> Result<(), FormError> {
        for input in &self.inputs {
            let validators = types.validators(&input.input_type)?;
            let value = values
                .get(&input.name)
                .ok_or_else(|| FormError::MissingValue(input.name.clone()))?;
            for validator in validators {
                validator(input, value)?;
            }
        }
        Ok(())
    }
}

/// A validator for one input type.
pub type InputValidator = fn(&InputSpec, &str) -> Result<(), FormError>;

/// Table of registered input types and their validators.
pub struct InputTypes {
    types: HashMap<String, Vec<InputValidator>>,
}

impl InputTypes {
    /// Empty table.
    pub fn new() -> Self {
        Self {
            types: HashMap::new(),
        }
    }

    /// Table pre-populated with the built-in types: `string` (optional
    /// `regex` option), `integer` (optional `min_value`/`max_value`), and
    /// `ipaddr`.
    pub fn with_builtins() -> Self {
        let mut types = Self::new();
        types.register("string");
        types.add_validator("string", validate_regex);
        types.register("integer");
        types.add_validator("integer", validate_integer);
        types.add_validator("integer", validate_min_value);
        types.add_validator("integer", validate_max_value);
        types.register("ipaddr");
        types.add_validator("ipaddr", validate_ipv4);
        types
    }

    /// Register an input type with no validators.
    pub fn register(&mut self, name: &str) {
        self.types.entry(name.to_string()).or_default();
    }

    /// Attach a validator to a registered type.
    pub fn register_validator(
        &mut self,
        name: &str,
        validator: InputValidator,
    ) -> Result<(), FormError> {
        match self.types.get_mut(name) {
            Some(validators) => {
                validators.push(validator);
                Ok(())
            }
            None => Err(FormError::UnknownInputType(name.to_string())),
        }
    }

    /// Whether a type is registered.
    pub fn contains(&self, name: &str) -> bool {
        self.types.contains_key(name)
    }

    /// Validators for a type.
    pub fn validators(&self, name: &str) -> Result<&[InputValidator], FormError> {
        self.types
            .get(name)
            .map(Vec::as_slice)
            .ok_or_else(|| FormError::UnknownInputType(name.to_string()))
    }

    // Builtin wiring; types are registered just above, so this cannot miss.
    fn add_validator(&mut self, name: &str, validator: InputValidator) {
        if let Some(validators) = self.types.get_mut(name) {
            validators.push(validator);
        }
    }
}

impl Default for InputTypes {
    fn default() -> Self {
        Self::with_builtins()
    }
}

fn validate_regex(input: &InputSpec, value: &str) -> Result<(), FormError> {
    let Some(pattern) = input.str_option("regex") else {
        return Ok(());
    };
    match Regex::new(pattern) {
        Ok(re) if re.is_match(value) => Ok(()),
        Ok(_) => Err(FormError::invalid(
            input,
            format!("value does not match regex: {}", pattern),
        )),
        Err(e) => Err(FormError::invalid(input, format!("invalid regex: {}", e))),
    }
}

fn validate_integer(input: &InputSpec, value: &str) -> Result<(), FormError> {
    value
        .parse::<i64>()
        .map(|_| ())
        .map_err(|_| FormError::invalid(input, "value is not an integer"))
}

fn validate_min_value(input: &InputSpec, value: &str) -> Result<(), FormError> {
    let (Some(min), Ok(value)) = (input.int_option("min_value"), value.parse::<i64>()) else {
        return Ok(());
    };
    if value < min {
        return Err(FormError::invalid(
            input,
            format!("value must be at least {}", min),
        ));
    }
    Ok(())
}

fn validate_max_value(input: &InputSpec, value: &str) -> Result<(), FormError> {
    let (Some(max), Ok(value)) = (input.int_option("max_value"), value.parse::<i64>()) else {
        return Ok(());
    };
    if value > max {
        return Err(FormError::invalid(
            input,
            format!("value must be at most {}", max),
        ));
    }
    Ok(())
}

fn validate_ipv4(input: &InputSpec, value: &str) -> Result<(), FormError> {
    let ok = Regex::new(r"^((25[0-5]|(2[0-4]|1\d|[1-9]|)\d)\.?\b){4}$")
        .map(|re| re.is_match(value))
        .unwrap_or(false);
    if ok {
        Ok(())
    } else {
        Err(FormError::invalid(input, "value is not a valid IPv4 address"))
    }
}
