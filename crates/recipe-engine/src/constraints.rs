//! Per-parameter value constraints
//!
//! Each constraint axis is optional; an absent bound means the axis is
//! unconstrained. The predicates here are the single source of truth for
//! "is this value acceptable" — `Parameter::validate_value` dispatches to
//! them by declared type.

use serde::{Deserialize, Serialize};

/// Constraint set consulted during parameter validation
///
/// Numeric range applies to integer and float parameters, choices/length/
/// pattern to strings, and `file_types` to file parameters.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct ParameterConstraints {
    /// Minimum numeric value (inclusive)
    pub min_value: Option<f64>,
    /// Maximum numeric value (inclusive)
    pub max_value: Option<f64>,
    /// Suggested increment for spinner controls (not validated against)
    pub step: Option<f64>,
    /// Allowed string values; empty means any value is accepted
    pub choices: Vec<String>,
    /// Maximum string length in characters
    pub max_length: Option<usize>,
    /// Regular expression the whole string must match somewhere
    pub pattern: Option<String>,
    /// Allowed file extensions (without the dot); empty means any extension
    pub file_types: Vec<String>,
}

impl ParameterConstraints {
    /// Numeric range check against `min_value`/`max_value`
    pub fn is_in_range(&self, value: f64) -> bool {
        if let Some(min) = self.min_value {
            if value < min {
                return false;
            }
        }
        if let Some(max) = self.max_value {
            if value > max {
                return false;
            }
        }
        true
    }

    /// Choice check; an empty choice set accepts everything
    pub fn is_valid_choice(&self, value: &str) -> bool {
        self.choices.is_empty() || self.choices.iter().any(|c| c == value)
    }

    /// Length check against `max_length`
    pub fn is_valid_length(&self, value: &str) -> bool {
        match self.max_length {
            Some(max) => value.chars().count() <= max,
            None => true,
        }
    }

    /// Pattern check; no pattern accepts everything
    ///
    /// A pattern that fails to compile rejects every value rather than
    /// silently accepting it, and is reported once per check via the log.
    pub fn matches_pattern(&self, value: &str) -> bool {
        let Some(pattern) = &self.pattern else {
            return true;
        };
        match regex::Regex::new(pattern) {
            Ok(re) => re.is_match(value),
            Err(e) => {
                log::warn!("Invalid constraint pattern '{}': {}", pattern, e);
                false
            }
        }
    }

    /// File extension check; an empty set accepts any extension
    pub fn is_valid_file_type(&self, file_path: &str) -> bool {
        if self.file_types.is_empty() {
            return true;
        }
        let Some(extension) = file_path.rsplit('.').next().filter(|e| *e != file_path) else {
            return false;
        };
        self.file_types
            .iter()
            .any(|t| t.eq_ignore_ascii_case(extension))
    }
}
