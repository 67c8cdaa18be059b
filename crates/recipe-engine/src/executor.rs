//! Script-executor capability consumed by blocks
//!
//! The engine coordinates execution; it does not compute. A block hands its
//! resolved inputs to whatever implements `ScriptExecutor` — in production
//! the out-of-process worker in the `script-host` crate, in tests or
//! embedded hosts a callback adapter from this module.

use std::collections::HashMap;
use std::pin::Pin;

use async_trait::async_trait;
use serde_json::Value;
use thiserror::Error;

/// Failure reported by a script executor
///
/// Both kinds carry a human-readable message; a block surfaces it
/// unchanged inside its execution error. The engine never retries —
/// retries, if desired, belong to whoever wraps the executor.
#[derive(Debug, Error)]
pub enum ScriptError {
    /// The script ran and reported failure
    #[error("Script '{script}' failed: {message}")]
    Script { script: String, message: String },

    /// The executor itself could not be reached or answered garbage
    #[error("Executor transport error: {0}")]
    Transport(String),
}

impl ScriptError {
    /// Failure reported by the script itself
    pub fn script(script: impl Into<String>, message: impl Into<String>) -> Self {
        Self::Script {
            script: script.into(),
            message: message.into(),
        }
    }

    /// Transport-level failure
    pub fn transport(message: impl Into<String>) -> Self {
        Self::Transport(message.into())
    }
}

/// The external computation capability a block delegates to
///
/// `script` identifies what to run; `inputs` maps parameter ids to their
/// resolved values. The returned mapping is applied to the block's output
/// parameters by the caller.
#[async_trait]
pub trait ScriptExecutor: Send + Sync {
    /// Run a script with the given inputs and return its output mapping
    async fn execute(
        &self,
        script: &str,
        inputs: HashMap<String, Value>,
    ) -> Result<HashMap<String, Value>, ScriptError>;
}

type CallbackFuture =
    Pin<Box<dyn std::future::Future<Output = Result<HashMap<String, Value>, ScriptError>> + Send>>;

/// Executor backed by an async closure
///
/// Useful in tests and for embedders that run scripts in-process.
pub struct CallbackExecutor {
    callback: Box<dyn Fn(String, HashMap<String, Value>) -> CallbackFuture + Send + Sync>,
}

impl CallbackExecutor {
    /// Wrap an async closure as an executor
    pub fn new<F, Fut>(callback: F) -> Self
    where
        F: Fn(String, HashMap<String, Value>) -> Fut + Send + Sync + 'static,
        Fut: std::future::Future<Output = Result<HashMap<String, Value>, ScriptError>>
            + Send
            + 'static,
    {
        Self {
            callback: Box::new(move |script, inputs| Box::pin(callback(script, inputs))),
        }
    }
}

#[async_trait]
impl ScriptExecutor for CallbackExecutor {
    async fn execute(
        &self,
        script: &str,
        inputs: HashMap<String, Value>,
    ) -> Result<HashMap<String, Value>, ScriptError> {
        (self.callback)(script.to_string(), inputs).await
    }
}

/// Executor backed by a synchronous closure
pub struct SyncCallbackExecutor {
    callback: Box<
        dyn Fn(&str, HashMap<String, Value>) -> Result<HashMap<String, Value>, ScriptError>
            + Send
            + Sync,
    >,
}

impl SyncCallbackExecutor {
    /// Wrap a synchronous closure as an executor
    pub fn new(
        callback: impl Fn(&str, HashMap<String, Value>) -> Result<HashMap<String, Value>, ScriptError>
            + Send
            + Sync
            + 'static,
    ) -> Self {
        Self {
            callback: Box::new(callback),
        }
    }
}

#[async_trait]
impl ScriptExecutor for SyncCallbackExecutor {
    async fn execute(
        &self,
        script: &str,
        inputs: HashMap<String, Value>,
    ) -> Result<HashMap<String, Value>, ScriptError> {
        (self.callback)(script, inputs)
    }
}
