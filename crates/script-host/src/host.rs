//! Lifecycle façade over the worker process and its socket
//!
//! `ScriptHost` is what the engine sees: it implements
//! `recipe_engine::ScriptExecutor` and hides the process spawn, the
//! connect/retry dance, script-name normalization, and the per-request
//! timeout.

use std::collections::HashMap;
use std::path::PathBuf;
use std::sync::Arc;

use async_trait::async_trait;
use serde_json::Value;
use tokio::sync::RwLock;

use recipe_engine::{ScriptError, ScriptExecutor};

use crate::client::SocketClient;
use crate::config::HostConfig;
use crate::error::{HostError, Result};
use crate::process::WorkerProcess;

/// Managed worker process plus socket, exposed as a script executor
pub struct ScriptHost {
    config: HostConfig,
    worker: RwLock<Option<WorkerProcess>>,
    client: RwLock<Option<Arc<SocketClient>>>,
}

impl ScriptHost {
    /// Create a host; nothing runs until `start` is called
    pub fn new(config: HostConfig) -> Self {
        Self {
            config,
            worker: RwLock::new(None),
            client: RwLock::new(None),
        }
    }

    /// The active configuration
    pub fn config(&self) -> &HostConfig {
        &self.config
    }

    /// Spawn the worker and connect to it
    ///
    /// Idempotent: a host that is already connected returns immediately.
    /// The script directory is created if it does not exist yet.
    pub async fn start(&self) -> Result<()> {
        if self.is_ready().await {
            return Ok(());
        }

        tokio::fs::create_dir_all(&self.config.script_dir).await?;

        let worker = WorkerProcess::spawn(&self.config)?;
        {
            let mut guard = self.worker.write().await;
            *guard = Some(worker);
        }

        let client =
            SocketClient::connect(&self.config.ws_url(), self.config.connect_timeout).await;
        match client {
            Ok(client) => {
                let mut guard = self.client.write().await;
                *guard = Some(Arc::new(client));
                log::info!(
                    "Script host ready (script dir: {})",
                    self.config.script_dir.display()
                );
                Ok(())
            }
            Err(e) => {
                // The worker never became reachable; don't leave it running
                self.shutdown().await;
                Err(e)
            }
        }
    }

    /// Whether the host is connected to a worker
    pub async fn is_ready(&self) -> bool {
        self.client.read().await.is_some()
    }

    /// Close the socket and kill the worker
    pub async fn shutdown(&self) {
        if let Some(client) = self.client.write().await.take() {
            client.close().await;
        }
        if let Some(mut worker) = self.worker.write().await.take() {
            worker.stop().await;
        }
        log::info!("Script host shut down");
    }

    /// Resolve a script name against the script directory
    ///
    /// A missing `.py` suffix is appended; absolute paths and
    /// subdirectories pass through the join untouched.
    fn resolve_script(&self, script: &str) -> PathBuf {
        let name = if script.ends_with(".py") {
            script.to_string()
        } else {
            format!("{}.py", script)
        };
        self.config.script_dir.join(name)
    }

    /// Run one script on the worker, bounded by the request timeout
    pub async fn execute_script(&self, script: &str, params: &Value) -> Result<Value> {
        let client = {
            let guard = self.client.read().await;
            guard.clone().ok_or(HostError::NotConnected)?
        };

        let script_path = self.resolve_script(script);
        let script_path = script_path.to_string_lossy();

        log::debug!("Executing script '{}'", script_path);

        match tokio::time::timeout(
            self.config.request_timeout,
            client.request(&script_path, params),
        )
        .await
        {
            Ok(result) => result,
            Err(_) => Err(HostError::Timeout(self.config.request_timeout)),
        }
    }
}

#[async_trait]
impl ScriptExecutor for ScriptHost {
    async fn execute(
        &self,
        script: &str,
        inputs: HashMap<String, Value>,
    ) -> std::result::Result<HashMap<String, Value>, ScriptError> {
        let params = serde_json::to_value(&inputs)
            .map_err(|e| ScriptError::transport(e.to_string()))?;

        let result = self.execute_script(script, &params).await.map_err(|e| match e {
            HostError::Script { message } => ScriptError::script(script, message),
            other => ScriptError::transport(other.to_string()),
        })?;

        match result {
            Value::Object(map) => Ok(map.into_iter().collect()),
            Value::Null => Ok(HashMap::new()),
            other => Err(ScriptError::transport(format!(
                "worker returned a non-object result: {}",
                other
            ))),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn host_with_dir(dir: &std::path::Path) -> ScriptHost {
        ScriptHost::new(HostConfig {
            script_dir: dir.to_path_buf(),
            ..Default::default()
        })
    }

    #[test]
    fn test_resolve_script_appends_py_once() {
        let host = host_with_dir(std::path::Path::new("/scripts"));
        assert_eq!(
            host.resolve_script("calc"),
            PathBuf::from("/scripts/calc.py")
        );
        assert_eq!(
            host.resolve_script("calc.py"),
            PathBuf::from("/scripts/calc.py")
        );
    }

    #[tokio::test]
    async fn test_execute_before_start_is_not_connected() {
        let host = host_with_dir(std::path::Path::new("/scripts"));
        let err = host
            .execute_script("calc", &serde_json::json!({}))
            .await
            .unwrap_err();
        assert!(matches!(err, HostError::NotConnected));
    }

    #[tokio::test]
    async fn test_executor_impl_wraps_transport_errors() {
        let host = host_with_dir(std::path::Path::new("/scripts"));
        let err = ScriptExecutor::execute(&host, "calc", HashMap::new())
            .await
            .unwrap_err();
        assert!(matches!(err, ScriptError::Transport(_)));
    }

    #[tokio::test]
    async fn test_start_creates_script_directory() {
        let tmp = tempfile::tempdir().unwrap();
        let dir = tmp.path().join("scripts");
        let host = ScriptHost::new(HostConfig {
            script_dir: dir.clone(),
            python_bin: Some(PathBuf::from("/nonexistent/python-binary")),
            ..Default::default()
        });

        // The spawn fails (bogus interpreter) but the directory is ensured
        // first.
        assert!(host.start().await.is_err());
        assert!(dir.is_dir());
    }
}
