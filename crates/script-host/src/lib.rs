//! Script Host - out-of-process script execution for Conveyor
//!
//! Blocks in the recipe engine delegate computation to a script executor;
//! this crate provides the production implementation: a long-lived Python
//! worker process reached over a persistent WebSocket.
//!
//! The worker receives one JSON frame per execution
//! (`{"script_path": ..., "params": {...}}`) and answers with
//! `{"status": "success", "result": {...}}` or
//! `{"status": "error", "message": ...}`. The host spawns the worker,
//! retries the initial connection while the worker binds its socket,
//! normalizes script names against the configured script directory, and
//! bounds every request with a timeout.
//!
//! # Example
//!
//! ```ignore
//! use std::sync::Arc;
//! use script_host::{HostConfig, ScriptHost};
//!
//! let host = Arc::new(ScriptHost::new(HostConfig::default()));
//! host.start().await?;
//!
//! // Hand the host to blocks as their executor
//! let block = recipe_engine::Block::new("b1", "Calc", "", "basic_calc", host.clone());
//! ```

pub mod client;
pub mod config;
pub mod error;
pub mod host;
pub mod process;

// Re-export key types
pub use client::SocketClient;
pub use config::HostConfig;
pub use error::{HostError, Result};
pub use host::ScriptHost;
pub use process::WorkerProcess;
