//! Configuration for the worker process and its socket

use std::path::PathBuf;
use std::time::Duration;

use serde::{Deserialize, Serialize};

use crate::error::{HostError, Result};

/// Configuration for a `ScriptHost`
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct HostConfig {
    /// Explicit Python interpreter; discovered on PATH when absent
    pub python_bin: Option<PathBuf>,
    /// Entry point of the worker server handed to the interpreter
    pub server_script: PathBuf,
    /// Directory the worker is allowed to load scripts from
    pub script_dir: PathBuf,
    /// Host the worker binds its socket to
    pub host: String,
    /// Port the worker binds its socket to
    pub port: u16,
    /// How long to keep retrying the initial socket connection
    pub connect_timeout: Duration,
    /// Upper bound on a single script execution
    pub request_timeout: Duration,
}

impl Default for HostConfig {
    fn default() -> Self {
        Self {
            python_bin: None,
            server_script: PathBuf::from("python_server.py"),
            script_dir: PathBuf::from("scripts"),
            host: "localhost".to_string(),
            port: 8765,
            connect_timeout: Duration::from_secs(10),
            request_timeout: Duration::from_secs(60),
        }
    }
}

impl HostConfig {
    /// Socket URL of the worker
    pub fn ws_url(&self) -> String {
        format!("ws://{}:{}", self.host, self.port)
    }

    /// The interpreter to run the worker with
    ///
    /// An explicitly configured path wins; otherwise `python3` then
    /// `python` are looked up on PATH.
    pub fn resolve_interpreter(&self) -> Result<PathBuf> {
        if let Some(bin) = &self.python_bin {
            return Ok(bin.clone());
        }
        which::which("python3")
            .or_else(|_| which::which("python"))
            .map_err(|e| HostError::NoInterpreter(e.to_string()))
    }
}
