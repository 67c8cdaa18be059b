//! Recipe Engine - task-graph execution runtime for Conveyor
//!
//! Executable units ("entries") are assembled into trees, their typed
//! parameters wired together, and run with dependency-aware ordering,
//! validation, and status tracking:
//!
//! - `Parameter`: a typed, constrained value slot, validated on every write
//! - `ConnectionManager`: the directed wiring graph between sibling entries
//! - `Entry`: the unit of execution with its `ready -> running ->
//!   completed | error` state machine
//! - `Block`: a leaf entry delegating computation to an external script
//!   executor (see the `script-host` crate for the production implementation)
//! - `Container`: a composite entry running children sequentially in an
//!   explicit or auto-derived dependency order, moving parameter values
//!   along connections between steps
//!
//! The engine coordinates execution; it never computes. Execution is
//! single-threaded and cooperative: an `execute` call suspends only while
//! awaiting a child entry or the script executor, and entries are driven by
//! at most one caller at a time (`execute` takes `&mut self`).
//!
//! # Example
//!
//! ```ignore
//! use recipe_engine::{Block, Connection, Container, Entry};
//!
//! let mut recipe = Container::new("recipe-1", "My Recipe", "");
//! recipe.add_child(Entry::Block(source))?;
//! recipe.add_child(Entry::Block(sink))?;
//! recipe.base_mut().connect_parameter(Connection::new("source", "y", "sink", "y"))?;
//! recipe.auto_set_execution_order();
//!
//! let mut entry = Entry::Container(recipe);
//! entry.execute().await?;
//! ```

pub mod block;
pub mod connection;
pub mod constraints;
pub mod container;
pub mod definition;
pub mod entry;
pub mod error;
pub mod executor;
pub mod parameter;
pub mod status;

// Re-export key types
pub use block::Block;
pub use connection::{Connection, ConnectionManager, ConnectionTypePolicy, PermissiveTypePolicy};
pub use constraints::ParameterConstraints;
pub use container::Container;
pub use definition::{BlockDefinition, ParameterDefinition, ParameterDirection};
pub use entry::{Entry, EntryBase};
pub use error::{EngineError, Result};
pub use executor::{CallbackExecutor, ScriptError, ScriptExecutor, SyncCallbackExecutor};
pub use parameter::{InputControl, Parameter, ParameterInfo, ParameterType};
pub use status::ExecutionStatus;
