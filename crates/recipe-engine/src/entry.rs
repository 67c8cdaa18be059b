//! The unit of execution
//!
//! `EntryBase` carries what every entry has: identity, display names, the
//! input/output parameter lists, the execution status, and a connection
//! manager scoped to the entry's local wiring. The closed `Entry` enum adds
//! the two concrete kinds — leaf `Block` and composite `Container` — and
//! implements the shared execute state machine over them.

use std::collections::HashMap;

use futures_util::future::BoxFuture;
use serde_json::Value;

use crate::block::Block;
use crate::connection::{Connection, ConnectionManager};
use crate::container::Container;
use crate::definition::{ParameterDefinition, ParameterDirection};
use crate::error::{EngineError, Result};
use crate::parameter::{Parameter, ParameterInfo};
use crate::status::ExecutionStatus;

/// Identity, parameters, status, and wiring shared by every entry kind
#[derive(Debug)]
pub struct EntryBase {
    id: String,
    original_name: String,
    custom_name: Option<String>,
    description: String,
    inputs: Vec<Parameter>,
    outputs: Vec<Parameter>,
    status: ExecutionStatus,
    connections: ConnectionManager,
}

impl EntryBase {
    /// Create an entry core with no parameters
    pub fn new(
        id: impl Into<String>,
        original_name: impl Into<String>,
        description: impl Into<String>,
    ) -> Self {
        Self {
            id: id.into(),
            original_name: original_name.into(),
            custom_name: None,
            description: description.into(),
            inputs: Vec::new(),
            outputs: Vec::new(),
            status: ExecutionStatus::Ready,
            connections: ConnectionManager::new(),
        }
    }

    /// Load loader-supplied definitions, splitting them by direction
    ///
    /// A definition with the same name and direction as an existing
    /// parameter replaces it.
    pub fn load_definitions(&mut self, definitions: &[ParameterDefinition]) {
        for def in definitions {
            let param = Parameter::from_definition(def);
            match def.direction {
                ParameterDirection::Input => Self::insert(&mut self.inputs, param),
                ParameterDirection::Output => Self::insert(&mut self.outputs, param),
            }
        }
    }

    /// Add or replace an input parameter
    pub fn add_input(&mut self, parameter: Parameter) {
        Self::insert(&mut self.inputs, parameter);
    }

    /// Add or replace an output parameter
    pub fn add_output(&mut self, parameter: Parameter) {
        Self::insert(&mut self.outputs, parameter);
    }

    fn insert(list: &mut Vec<Parameter>, parameter: Parameter) {
        match list.iter().position(|p| p.name() == parameter.name()) {
            Some(index) => list[index] = parameter,
            None => list.push(parameter),
        }
    }

    pub fn id(&self) -> &str {
        &self.id
    }

    pub fn original_name(&self) -> &str {
        &self.original_name
    }

    /// Custom display name if one is set
    pub fn custom_name(&self) -> Option<&str> {
        self.custom_name.as_deref()
    }

    /// Override the display name; `None` restores the original name
    pub fn set_custom_name(&mut self, name: Option<String>) {
        self.custom_name = name;
    }

    /// Display name: the custom override, or the immutable original name
    pub fn display_name(&self) -> &str {
        self.custom_name.as_deref().unwrap_or(&self.original_name)
    }

    pub fn description(&self) -> &str {
        &self.description
    }

    pub fn status(&self) -> ExecutionStatus {
        self.status
    }

    pub(crate) fn set_status(&mut self, status: ExecutionStatus) {
        self.status = status;
    }

    /// Input parameters in declaration order
    pub fn inputs(&self) -> &[Parameter] {
        &self.inputs
    }

    /// Output parameters in declaration order
    pub fn outputs(&self) -> &[Parameter] {
        &self.outputs
    }

    /// Look up an input parameter by name
    pub fn input(&self, name: &str) -> Option<&Parameter> {
        self.inputs.iter().find(|p| p.name() == name)
    }

    /// Look up an output parameter by name
    pub fn output(&self, name: &str) -> Option<&Parameter> {
        self.outputs.iter().find(|p| p.name() == name)
    }

    pub fn input_mut(&mut self, name: &str) -> Option<&mut Parameter> {
        self.inputs.iter_mut().find(|p| p.name() == name)
    }

    pub fn output_mut(&mut self, name: &str) -> Option<&mut Parameter> {
        self.outputs.iter_mut().find(|p| p.name() == name)
    }

    /// Current value of a named input, if the parameter exists
    pub fn input_value(&self, name: &str) -> Option<&Value> {
        self.input(name).map(|p| p.value())
    }

    /// Current value of a named output, if the parameter exists
    pub fn output_value(&self, name: &str) -> Option<&Value> {
        self.output(name).map(|p| p.value())
    }

    /// Set a named input value; false when the parameter is missing or the
    /// value fails validation
    pub fn set_input_value(&mut self, name: &str, value: Value) -> bool {
        match self.input_mut(name) {
            Some(param) => param.set_value(value),
            None => false,
        }
    }

    /// Set a named output value; false when the parameter is missing or the
    /// value fails validation
    pub fn set_output_value(&mut self, name: &str, value: Value) -> bool {
        match self.output_mut(name) {
            Some(param) => param.set_value(value),
            None => false,
        }
    }

    /// Display projections of all input parameters
    pub fn all_input_info(&self) -> Vec<ParameterInfo> {
        self.inputs.iter().map(|p| p.display_info()).collect()
    }

    /// Display projections of all output parameters
    pub fn all_output_info(&self) -> Vec<ParameterInfo> {
        self.outputs.iter().map(|p| p.display_info()).collect()
    }

    /// Reset every parameter, both directions, to its initial value
    pub fn reset_all_parameters(&mut self) {
        for param in &mut self.inputs {
            param.reset();
        }
        for param in &mut self.outputs {
            param.reset();
        }
    }

    /// The connection manager scoped to this entry's wiring
    pub fn connections(&self) -> &ConnectionManager {
        &self.connections
    }

    pub fn connections_mut(&mut self) -> &mut ConnectionManager {
        &mut self.connections
    }

    /// Register a connection in this entry's manager
    pub fn connect_parameter(&mut self, connection: Connection) -> Result<()> {
        self.connections.connect(connection)
    }

    /// Remove a connection from this entry's manager
    pub fn disconnect_parameter(&mut self, connection: &Connection) {
        self.connections.disconnect(connection);
    }

    /// Connections targeting this entry's inputs
    pub fn connected_inputs(&self) -> Vec<&Connection> {
        self.connections.input_connections(&self.id)
    }

    /// Connections sourced from this entry's outputs
    pub fn connected_outputs(&self) -> Vec<&Connection> {
        self.connections.output_connections(&self.id)
    }

    /// Validate every parameter's current value, inputs before outputs
    ///
    /// Fails fast on the first violation found.
    pub fn validate_parameters(&self) -> Result<()> {
        for param in &self.inputs {
            if param.is_required() && param.value().is_null() {
                return Err(EngineError::Validation(format!(
                    "Required parameter '{}' is not set",
                    param.name()
                )));
            }
            if !param.validate_value(param.value()) {
                return Err(EngineError::Validation(format!(
                    "Parameter '{}' has an invalid value",
                    param.name()
                )));
            }
        }
        for param in &self.outputs {
            if !param.validate_value(param.value()) {
                return Err(EngineError::Validation(format!(
                    "Output parameter '{}' has an invalid value",
                    param.name()
                )));
            }
        }
        Ok(())
    }

    /// Validate this entry's participation in the connection graph
    ///
    /// Every declared connection must be type-compatible, and every
    /// required input must either carry a value or be fed by an incoming
    /// connection.
    pub fn validate_connections(&self) -> Result<()> {
        for connection in self.connections.all() {
            if !self.connections.validate_connection_types(connection) {
                return Err(EngineError::Validation(format!(
                    "Incompatible parameter types on connection {}",
                    connection
                )));
            }
        }

        for param in &self.inputs {
            if !param.is_required() || !param.value().is_null() {
                continue;
            }
            let connected = self.connections.all().iter().any(|c| {
                c.target_entry_id == self.id && c.target_parameter_id == param.name()
            });
            if !connected {
                return Err(EngineError::Validation(format!(
                    "Required parameter '{}' is neither set nor connected",
                    param.name()
                )));
            }
        }
        Ok(())
    }

    /// Snapshot current input values as a parameter-id to value mapping
    pub(crate) fn collect_input_values(&self) -> HashMap<String, Value> {
        self.inputs
            .iter()
            .map(|p| (p.name().to_string(), p.value().clone()))
            .collect()
    }

    /// Apply an executor-returned output mapping to the output parameters
    ///
    /// A boolean `result: false` entry marks the whole execution as failed
    /// using the accompanying message. Individual values that fail
    /// per-parameter validation are dropped (and logged) rather than
    /// aborting the run; executor output is trusted less than user input.
    pub(crate) fn apply_output_values(&mut self, outputs: HashMap<String, Value>) -> Result<()> {
        if let Some(Value::Bool(false)) = outputs.get("result") {
            let message = outputs
                .get("error")
                .or_else(|| outputs.get("message"))
                .and_then(|v| v.as_str())
                .unwrap_or("Unknown execution failure");
            return Err(EngineError::Execution(message.to_string()));
        }

        let entry_id = self.id.clone();
        for (name, value) in outputs {
            if let Some(param) = self.output_mut(&name) {
                if !param.set_value(value) {
                    log::warn!(
                        "Dropping invalid output value for '{}:{}'",
                        entry_id,
                        name
                    );
                }
            }
        }
        Ok(())
    }
}

/// An executable entry: leaf block or composite container
///
/// The enum is the closed set of entry kinds; `execute` implements the
/// shared state machine (`ready -> running -> completed | error`) and
/// dispatches the kind-specific work to the variant.
#[derive(Debug)]
pub enum Entry {
    /// Leaf entry delegating computation to the script executor
    Block(Block),
    /// Composite entry running children in dependency order
    Container(Container),
}

impl Entry {
    /// Shared entry core
    pub fn base(&self) -> &EntryBase {
        match self {
            Entry::Block(block) => block.base(),
            Entry::Container(container) => container.base(),
        }
    }

    /// Shared entry core, mutable
    pub fn base_mut(&mut self) -> &mut EntryBase {
        match self {
            Entry::Block(block) => block.base_mut(),
            Entry::Container(container) => container.base_mut(),
        }
    }

    pub fn id(&self) -> &str {
        self.base().id()
    }

    pub fn display_name(&self) -> &str {
        self.base().display_name()
    }

    pub fn status(&self) -> ExecutionStatus {
        self.base().status()
    }

    /// Display projections of all input parameters
    pub fn all_input_info(&self) -> Vec<ParameterInfo> {
        self.base().all_input_info()
    }

    /// Display projections of all output parameters
    pub fn all_output_info(&self) -> Vec<ParameterInfo> {
        self.base().all_output_info()
    }

    /// Connections targeting this entry's inputs
    pub fn connected_inputs(&self) -> Vec<&Connection> {
        self.base().connected_inputs()
    }

    /// Connections sourced from this entry's outputs
    pub fn connected_outputs(&self) -> Vec<&Connection> {
        self.base().connected_outputs()
    }

    /// Validate that this entry can execute right now
    ///
    /// Parameters first, then connections; containers additionally check
    /// their execution order and recurse into children.
    pub fn validate_executability(&self) -> Result<()> {
        match self {
            Entry::Block(block) => block.validate_executability(),
            Entry::Container(container) => container.validate_executability(),
        }
    }

    /// Run this entry
    ///
    /// Transitions to `Running`, validates, collects inputs, invokes the
    /// kind-specific work, applies returned outputs, and finishes in
    /// `Completed` — or `Error`, re-raising the failure to the caller.
    /// Taking `&mut self` makes a second in-flight call on the same entry
    /// impossible, which is the single-caller precondition the state
    /// machine relies on.
    pub fn execute(&mut self) -> BoxFuture<'_, Result<()>> {
        Box::pin(async move {
            self.base_mut().set_status(ExecutionStatus::Running);

            match self.run().await {
                Ok(()) => {
                    self.base_mut().set_status(ExecutionStatus::Completed);
                    Ok(())
                }
                Err(error) => {
                    self.base_mut().set_status(ExecutionStatus::Error);
                    log::error!("Execution failed for entry '{}': {}", self.id(), error);
                    Err(error)
                }
            }
        })
    }

    async fn run(&mut self) -> Result<()> {
        let execution_id = uuid::Uuid::new_v4();
        log::debug!("Executing entry '{}' ({})", self.id(), execution_id);

        self.validate_executability()?;

        let inputs = self.base().collect_input_values();
        let outputs = match self {
            Entry::Block(block) => block.execute_internal(inputs).await?,
            Entry::Container(container) => container.execute_internal(inputs).await?,
        };
        self.base_mut().apply_output_values(outputs)?;

        log::debug!("Entry '{}' completed ({})", self.id(), execution_id);
        Ok(())
    }
}
