//! Worker process lifecycle
//!
//! The worker is a long-lived Python server process; it is spawned once,
//! its stdio is forwarded to the log, and it is killed on shutdown or when
//! the handle is dropped.

use std::process::Stdio;

use tokio::io::{AsyncBufReadExt, AsyncRead, BufReader};
use tokio::process::{Child, Command};

use crate::config::HostConfig;
use crate::error::{HostError, Result};

/// A spawned worker process
#[derive(Debug)]
pub struct WorkerProcess {
    child: Child,
}

impl WorkerProcess {
    /// Spawn the worker server for the given configuration
    ///
    /// The worker receives the script directory as its single argument and
    /// is expected to bind its socket before the connect timeout elapses.
    pub fn spawn(config: &HostConfig) -> Result<Self> {
        let interpreter = config.resolve_interpreter()?;

        log::info!(
            "Spawning worker: {} {} {}",
            interpreter.display(),
            config.server_script.display(),
            config.script_dir.display()
        );

        let mut child = Command::new(&interpreter)
            .arg(&config.server_script)
            .arg(&config.script_dir)
            .stdout(Stdio::piped())
            .stderr(Stdio::piped())
            .kill_on_drop(true)
            .spawn()
            .map_err(HostError::Spawn)?;

        if let Some(stdout) = child.stdout.take() {
            forward_lines(stdout, |line| log::debug!("worker stdout: {}", line));
        }
        if let Some(stderr) = child.stderr.take() {
            forward_lines(stderr, |line| log::warn!("worker stderr: {}", line));
        }

        Ok(Self { child })
    }

    /// Process id of the worker, if it is still running
    pub fn pid(&self) -> Option<u32> {
        self.child.id()
    }

    /// Kill the worker
    pub async fn stop(&mut self) {
        if let Err(e) = self.child.kill().await {
            log::warn!("Failed to kill worker process: {}", e);
        }
    }
}

/// Forward each line of a worker stream to the given sink
fn forward_lines<R>(stream: R, sink: impl Fn(&str) + Send + 'static)
where
    R: AsyncRead + Unpin + Send + 'static,
{
    tokio::spawn(async move {
        let mut lines = BufReader::new(stream).lines();
        while let Ok(Some(line)) = lines.next_line().await {
            sink(&line);
        }
    });
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::path::PathBuf;

    #[tokio::test]
    async fn test_spawn_fails_for_missing_interpreter() {
        let config = HostConfig {
            python_bin: Some(PathBuf::from("/nonexistent/python-binary")),
            ..Default::default()
        };

        let err = WorkerProcess::spawn(&config).unwrap_err();
        assert!(matches!(err, HostError::Spawn(_)));
    }
}
