//! Error types for the recipe engine

use thiserror::Error;

/// Result type alias using EngineError
pub type Result<T> = std::result::Result<T, EngineError>;

/// Errors that can occur in the recipe engine
///
/// The variants follow the points where an error can enter the system:
/// assembly (`Definition`), the pre-execution gate (`Validation`), wiring
/// (`Connection`), and the execution phase itself (`Execution`). A container
/// never re-raises a child's error bare; it wraps it in `Child` so the
/// failing entry's identity travels with the original cause.
#[derive(Debug, Error)]
pub enum EngineError {
    /// Malformed definition or duplicate identifier at assembly time
    #[error("Definition error: {0}")]
    Definition(String),

    /// Pre-execution validation failed (missing value, bad constraint,
    /// incomplete execution order, unresolved required connection)
    #[error("Validation error: {0}")]
    Validation(String),

    /// Rejected wiring: incompatible endpoint types or a direct cycle
    #[error("Connection error: {0}")]
    Connection(String),

    /// Failure surfaced while an entry was executing
    #[error("Execution error: {0}")]
    Execution(String),

    /// A child entry failed inside a container
    #[error("Child entry '{child_id}' failed: {source}")]
    Child {
        child_id: String,
        #[source]
        source: Box<EngineError>,
    },
}

impl EngineError {
    /// Wrap an error with the identity of the child entry it came from
    pub fn child(child_id: impl Into<String>, source: EngineError) -> Self {
        Self::Child {
            child_id: child_id.into(),
            source: Box::new(source),
        }
    }
}
