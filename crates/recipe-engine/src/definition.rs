//! Already-structured definitions consumed from the external loader
//!
//! The engine never parses the loader's source format (XML catalogs, JSON
//! files, whatever the host uses); it only consumes these structured forms.
//! A definition carries everything needed to construct a `Parameter`,
//! including the input/output classification.

use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::constraints::ParameterConstraints;
use crate::parameter::{InputControl, ParameterType};

/// Whether a parameter is an input or an output slot
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ParameterDirection {
    Input,
    Output,
}

/// One parameter definition as supplied by the loader
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ParameterDefinition {
    /// Parameter identifier
    pub name: String,
    /// Declared semantic type
    #[serde(rename = "type")]
    pub param_type: ParameterType,
    /// Input/output classification
    pub direction: ParameterDirection,
    /// Whether a null value fails validation
    #[serde(default)]
    pub required: bool,
    /// Human-readable description
    #[serde(default)]
    pub description: String,
    /// Initial value, possibly as loose text to be coerced
    #[serde(default)]
    pub value: Value,
    /// Explicit input-control hint; derived from the type when absent
    #[serde(default)]
    pub input_control: Option<InputControl>,
    /// Constraint set
    #[serde(default)]
    pub constraints: ParameterConstraints,
}

impl ParameterDefinition {
    /// Minimal definition with defaults everywhere else
    pub fn new(
        name: impl Into<String>,
        param_type: ParameterType,
        direction: ParameterDirection,
    ) -> Self {
        Self {
            name: name.into(),
            param_type,
            direction,
            required: false,
            description: String::new(),
            value: Value::Null,
            input_control: None,
            constraints: ParameterConstraints::default(),
        }
    }
}

/// A block definition as supplied by the loader: the script to run plus its
/// parameter slots
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct BlockDefinition {
    /// Display name of the block
    pub name: String,
    /// Script identifier the block hands to the executor
    pub script: String,
    /// Human-readable description
    #[serde(default)]
    pub description: String,
    /// Parameter slots, both directions mixed
    #[serde(default)]
    pub parameters: Vec<ParameterDefinition>,
}
