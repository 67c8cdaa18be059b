//! Typed, constrained value slots owned by entries
//!
//! A `Parameter` carries a current value, the initial value captured at
//! construction, and the constraint set consulted on every write. Values are
//! carried as `serde_json::Value` — the same currency the script-executor
//! protocol speaks — so dates travel as RFC 3339 or `YYYY-MM-DD` strings.

use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::constraints::ParameterConstraints;
use crate::definition::ParameterDefinition;

/// Semantic type of a parameter value
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ParameterType {
    /// Whole number
    Integer,
    /// Floating-point number
    #[serde(alias = "double")]
    Float,
    /// Text
    String,
    /// True/false
    Boolean,
    /// Calendar date or date-time, carried as a string
    Date,
    /// Path to a file, carried as a string
    File,
}

/// Suggested input control for the presentation layer
///
/// Purely a UI affordance; the engine never branches on it.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum InputControl {
    Text,
    Combo,
    IntegerSpinner,
    FloatSpinner,
    Checkbox,
    Date,
    File,
}

impl InputControl {
    /// Default control for a parameter type
    ///
    /// A string parameter with a configured choice set gets a combo box,
    /// otherwise the control follows the type.
    pub fn default_for(param_type: ParameterType, constraints: &ParameterConstraints) -> Self {
        match param_type {
            ParameterType::String if !constraints.choices.is_empty() => Self::Combo,
            ParameterType::String => Self::Text,
            ParameterType::Integer => Self::IntegerSpinner,
            ParameterType::Float => Self::FloatSpinner,
            ParameterType::Boolean => Self::Checkbox,
            ParameterType::Date => Self::Date,
            ParameterType::File => Self::File,
        }
    }
}

/// A typed input or output value slot
///
/// Invariant: `value` is either null or a value that passed
/// `validate_value` for the declared type at the time it was set.
#[derive(Debug, Clone)]
pub struct Parameter {
    /// Parameter identifier, unique within its entry and direction
    name: String,
    /// Declared semantic type
    param_type: ParameterType,
    /// Whether a null value fails validation
    required: bool,
    /// Human-readable description
    description: String,
    /// Current value (`Value::Null` when unset)
    value: Value,
    /// Value captured at construction; `reset` restores it
    initial_value: Value,
    /// Suggested input control for the presentation layer
    input_control: InputControl,
    /// Constraint set consulted by `validate_value`
    constraints: ParameterConstraints,
}

/// Read-only projection of a parameter for the presentation layer
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ParameterInfo {
    pub name: String,
    #[serde(rename = "type")]
    pub param_type: ParameterType,
    pub value: Value,
    pub description: String,
    pub required: bool,
    pub input_control: InputControl,
    pub constraints: ParameterConstraints,
}

impl Parameter {
    /// Create a required parameter with no value
    pub fn required(name: impl Into<String>, param_type: ParameterType) -> Self {
        Self::new(name, param_type, true)
    }

    /// Create an optional parameter with no value
    pub fn optional(name: impl Into<String>, param_type: ParameterType) -> Self {
        Self::new(name, param_type, false)
    }

    fn new(name: impl Into<String>, param_type: ParameterType, required: bool) -> Self {
        let constraints = ParameterConstraints::default();
        Self {
            name: name.into(),
            param_type,
            required,
            description: String::new(),
            value: Value::Null,
            initial_value: Value::Null,
            input_control: InputControl::default_for(param_type, &constraints),
            constraints,
        }
    }

    /// Set the initial (and current) value
    ///
    /// The value is captured verbatim as the reset target; it is assumed to
    /// satisfy the declared type the way loader-supplied defaults do.
    pub fn with_value(mut self, value: Value) -> Self {
        self.value = value.clone();
        self.initial_value = value;
        self
    }

    /// Set the description
    pub fn with_description(mut self, description: impl Into<String>) -> Self {
        self.description = description.into();
        self
    }

    /// Set the constraint set, re-deriving the default input control
    pub fn with_constraints(mut self, constraints: ParameterConstraints) -> Self {
        self.input_control = InputControl::default_for(self.param_type, &constraints);
        self.constraints = constraints;
        self
    }

    /// Build a parameter from an already-structured loader definition
    ///
    /// Definition values arrive as loose text (`"42"`, `"true"`); they are
    /// coerced to the declared type here, before the initial value is
    /// captured. Unparsable values become null.
    pub fn from_definition(def: &ParameterDefinition) -> Self {
        let value = coerce_value(&def.value, def.param_type);
        let input_control = def
            .input_control
            .unwrap_or_else(|| InputControl::default_for(def.param_type, &def.constraints));
        Self {
            name: def.name.clone(),
            param_type: def.param_type,
            required: def.required,
            description: def.description.clone(),
            value: value.clone(),
            initial_value: value,
            input_control,
            constraints: def.constraints.clone(),
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn param_type(&self) -> ParameterType {
        self.param_type
    }

    pub fn is_required(&self) -> bool {
        self.required
    }

    pub fn description(&self) -> &str {
        &self.description
    }

    /// Current value; `Value::Null` when unset
    pub fn value(&self) -> &Value {
        &self.value
    }

    /// Value captured at construction
    pub fn initial_value(&self) -> &Value {
        &self.initial_value
    }

    pub fn input_control(&self) -> InputControl {
        self.input_control
    }

    pub fn constraints(&self) -> &ParameterConstraints {
        &self.constraints
    }

    /// Set the current value, returning whether the write was accepted
    ///
    /// A value that fails `validate_value` leaves the current value
    /// untouched and returns false.
    pub fn set_value(&mut self, new_value: Value) -> bool {
        if self.validate_value(&new_value) {
            self.value = new_value;
            true
        } else {
            false
        }
    }

    /// Restore the value captured at construction
    pub fn reset(&mut self) {
        self.value = self.initial_value.clone();
    }

    /// Check a candidate value against the declared type and constraints
    ///
    /// Null is valid only for optional parameters. Everything else
    /// dispatches on the declared type.
    pub fn validate_value(&self, value: &Value) -> bool {
        if value.is_null() {
            return !self.required;
        }

        match self.param_type {
            ParameterType::Integer => match integral_value(value) {
                Some(n) => self.constraints.is_in_range(n as f64),
                None => false,
            },
            ParameterType::Float => match value.as_f64() {
                Some(n) => self.constraints.is_in_range(n),
                None => false,
            },
            ParameterType::String => match value.as_str() {
                Some(s) => {
                    self.constraints.is_valid_length(s)
                        && self.constraints.matches_pattern(s)
                        && self.constraints.is_valid_choice(s)
                }
                None => false,
            },
            ParameterType::Boolean => value.is_boolean(),
            ParameterType::Date => value.as_str().is_some_and(is_valid_date),
            ParameterType::File => value
                .as_str()
                .is_some_and(|s| self.constraints.is_valid_file_type(s)),
        }
    }

    /// Read-only projection for the presentation layer
    pub fn display_info(&self) -> ParameterInfo {
        ParameterInfo {
            name: self.name.clone(),
            param_type: self.param_type,
            value: self.value.clone(),
            description: self.description.clone(),
            required: self.required,
            input_control: self.input_control,
            constraints: self.constraints.clone(),
        }
    }
}

/// Extract an integral number from a JSON value
///
/// Accepts native integers and floats with a zero fractional part.
fn integral_value(value: &Value) -> Option<i64> {
    if let Some(n) = value.as_i64() {
        return Some(n);
    }
    match value.as_f64() {
        Some(f) if f.fract() == 0.0 && f >= i64::MIN as f64 && f <= i64::MAX as f64 => {
            Some(f as i64)
        }
        _ => None,
    }
}

/// Whether a string is an acceptable date value
///
/// RFC 3339 date-times and plain `YYYY-MM-DD` dates are accepted.
fn is_valid_date(s: &str) -> bool {
    chrono::DateTime::parse_from_rfc3339(s).is_ok()
        || chrono::NaiveDate::parse_from_str(s, "%Y-%m-%d").is_ok()
}

/// Coerce a loosely-typed definition value to the declared parameter type
///
/// Loader definitions carry values as text; `"42"` for an integer parameter
/// becomes the number 42. Unparsable values become null so the parameter
/// starts unset instead of invalid.
pub(crate) fn coerce_value(value: &Value, param_type: ParameterType) -> Value {
    if value.is_null() {
        return Value::Null;
    }

    match param_type {
        ParameterType::Integer => match value {
            Value::Number(_) => integral_value(value).map(Value::from).unwrap_or(Value::Null),
            Value::String(s) => s.trim().parse::<i64>().map(Value::from).unwrap_or(Value::Null),
            _ => Value::Null,
        },
        ParameterType::Float => match value {
            Value::Number(n) => n.as_f64().map(Value::from).unwrap_or(Value::Null),
            Value::String(s) => s.trim().parse::<f64>().map(Value::from).unwrap_or(Value::Null),
            _ => Value::Null,
        },
        ParameterType::Boolean => match value {
            Value::Bool(_) => value.clone(),
            Value::String(s) => Value::Bool(s == "true"),
            _ => Value::Null,
        },
        // Strings, dates, and file paths pass through untouched
        _ => value.clone(),
    }
}
