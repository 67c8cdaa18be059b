//! Leaf entry delegating computation to the script executor

use std::collections::HashMap;
use std::fmt;
use std::sync::Arc;

use serde_json::Value;

use crate::definition::{BlockDefinition, ParameterDefinition};
use crate::entry::EntryBase;
use crate::error::{EngineError, Result};
use crate::executor::ScriptExecutor;

/// A leaf entry whose work is performed by an external script
///
/// The block itself only resolves inputs, hands them to the executor
/// capability under its stored script identifier, and maps the returned
/// values onto its output parameters (the mapping is done by the shared
/// entry state machine).
pub struct Block {
    base: EntryBase,
    script: String,
    executor: Arc<dyn ScriptExecutor>,
}

impl Block {
    /// Create a block bound to a script and an executor
    pub fn new(
        id: impl Into<String>,
        original_name: impl Into<String>,
        description: impl Into<String>,
        script: impl Into<String>,
        executor: Arc<dyn ScriptExecutor>,
    ) -> Self {
        Self {
            base: EntryBase::new(id, original_name, description),
            script: script.into(),
            executor,
        }
    }

    /// Create a block from a loader-supplied definition
    pub fn from_definition(
        id: impl Into<String>,
        definition: &BlockDefinition,
        executor: Arc<dyn ScriptExecutor>,
    ) -> Self {
        let mut block = Self::new(
            id,
            &definition.name,
            &definition.description,
            &definition.script,
            executor,
        );
        block.base.load_definitions(&definition.parameters);
        block
    }

    /// Load parameter definitions onto this block
    pub fn with_parameters(mut self, definitions: &[ParameterDefinition]) -> Self {
        self.base.load_definitions(definitions);
        self
    }

    /// The script identifier handed to the executor
    pub fn script(&self) -> &str {
        &self.script
    }

    pub fn base(&self) -> &EntryBase {
        &self.base
    }

    pub fn base_mut(&mut self) -> &mut EntryBase {
        &mut self.base
    }

    /// Base validation plus the block-specific script check
    pub(crate) fn validate_executability(&self) -> Result<()> {
        self.base.validate_parameters()?;
        self.base.validate_connections()?;

        if self.script.is_empty() {
            return Err(EngineError::Validation(format!(
                "No script configured for block '{}'",
                self.base.id()
            )));
        }
        Ok(())
    }

    /// Forward resolved inputs to the executor and return its outputs
    ///
    /// Any failure the executor reports — script-level or transport-level —
    /// is wrapped into an execution error. No retry happens here; that is
    /// the caller's policy decision.
    pub(crate) async fn execute_internal(
        &mut self,
        inputs: HashMap<String, Value>,
    ) -> Result<HashMap<String, Value>> {
        log::debug!(
            "Block '{}': running script '{}' with {} input(s)",
            self.base.id(),
            self.script,
            inputs.len()
        );

        self.executor
            .execute(&self.script, inputs)
            .await
            .map_err(|e| EngineError::Execution(e.to_string()))
    }
}

impl fmt::Debug for Block {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Block")
            .field("base", &self.base)
            .field("script", &self.script)
            .finish_non_exhaustive()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::entry::Entry;
    use crate::executor::{CallbackExecutor, ScriptError, SyncCallbackExecutor};
    use crate::parameter::{Parameter, ParameterType};
    use crate::status::ExecutionStatus;
    use serde_json::json;

    fn doubling_executor() -> Arc<dyn ScriptExecutor> {
        Arc::new(CallbackExecutor::new(|_script, inputs| async move {
            let x = inputs.get("x").and_then(|v| v.as_i64()).unwrap_or(0);
            let mut outputs = HashMap::new();
            outputs.insert("y".to_string(), json!(x * 2));
            Ok(outputs)
        }))
    }

    fn failing_executor(message: &str) -> Arc<dyn ScriptExecutor> {
        let message = message.to_string();
        Arc::new(SyncCallbackExecutor::new(move |script, _inputs| {
            Err(ScriptError::script(script, message.clone()))
        }))
    }

    #[tokio::test]
    async fn test_block_executes_script_and_applies_outputs() {
        let mut block = Block::new("b1", "Doubler", "", "double.py", doubling_executor());
        block
            .base_mut()
            .add_input(Parameter::required("x", ParameterType::Integer));
        block
            .base_mut()
            .add_output(Parameter::optional("y", ParameterType::Integer));
        assert!(block.base_mut().set_input_value("x", json!(21)));

        let mut entry = Entry::Block(block);
        entry.execute().await.unwrap();

        assert_eq!(entry.status(), ExecutionStatus::Completed);
        assert_eq!(entry.base().output_value("y"), Some(&json!(42)));
    }

    #[tokio::test]
    async fn test_block_executor_failure_becomes_error_state() {
        let mut block = Block::new("b1", "Broken", "", "broken.py", failing_executor("boom"));
        block
            .base_mut()
            .add_input(Parameter::optional("x", ParameterType::Integer));

        let mut entry = Entry::Block(block);
        let err = entry.execute().await.unwrap_err();

        assert_eq!(entry.status(), ExecutionStatus::Error);
        assert!(err.to_string().contains("boom"));
        assert!(err.to_string().contains("broken.py"));
    }

    #[tokio::test]
    async fn test_block_without_script_fails_validation() {
        let block = Block::new("b1", "Empty", "", "", doubling_executor());
        let mut entry = Entry::Block(block);

        let err = entry.execute().await.unwrap_err();
        assert_eq!(entry.status(), ExecutionStatus::Error);
        assert!(matches!(err, EngineError::Validation(_)));
    }

    #[tokio::test]
    async fn test_block_missing_required_input_fails_before_executor_runs() {
        let ran = Arc::new(std::sync::atomic::AtomicBool::new(false));
        let ran_flag = ran.clone();
        let executor = Arc::new(SyncCallbackExecutor::new(move |_script, _inputs| {
            ran_flag.store(true, std::sync::atomic::Ordering::SeqCst);
            Ok(HashMap::new())
        }));

        let mut block = Block::new("b1", "Strict", "", "strict.py", executor);
        block
            .base_mut()
            .add_input(Parameter::required("x", ParameterType::Integer));

        let mut entry = Entry::Block(block);
        let err = entry.execute().await.unwrap_err();

        assert!(matches!(err, EngineError::Validation(_)));
        assert!(!ran.load(std::sync::atomic::Ordering::SeqCst));
    }

    #[tokio::test]
    async fn test_block_result_false_output_fails_with_message() {
        let executor = Arc::new(SyncCallbackExecutor::new(|_script, _inputs| {
            let mut outputs = HashMap::new();
            outputs.insert("result".to_string(), json!(false));
            outputs.insert("error".to_string(), json!("division by zero"));
            Ok(outputs)
        }));

        let block = Block::new("b1", "Calc", "", "calc.py", executor);
        let mut entry = Entry::Block(block);

        let err = entry.execute().await.unwrap_err();
        assert_eq!(entry.status(), ExecutionStatus::Error);
        assert!(err.to_string().contains("division by zero"));
    }

    #[test]
    fn test_block_from_definition() {
        let definition: BlockDefinition = serde_json::from_str(
            r#"{
                "name": "Basic Calc",
                "script": "basic_calc",
                "parameters": [
                    {"name": "a", "type": "integer", "direction": "input", "required": true},
                    {"name": "sum", "type": "integer", "direction": "output"}
                ]
            }"#,
        )
        .unwrap();

        let block = Block::from_definition("calc-1", &definition, doubling_executor());
        assert_eq!(block.script(), "basic_calc");
        assert_eq!(block.base().display_name(), "Basic Calc");
        assert!(block.base().input("a").is_some());
        assert!(block.base().output("sum").is_some());
    }
}
