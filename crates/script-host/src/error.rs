//! Error types for the script host

use thiserror::Error;

/// Result type alias using HostError
pub type Result<T> = std::result::Result<T, HostError>;

/// Errors that can occur while managing the worker or talking to it
#[derive(Debug, Error)]
pub enum HostError {
    /// The Python interpreter could not be located
    #[error("No Python interpreter found: {0}")]
    NoInterpreter(String),

    /// The worker process failed to spawn
    #[error("Failed to spawn worker process: {0}")]
    Spawn(#[source] std::io::Error),

    /// The worker socket could not be reached in time
    #[error("Could not connect to worker at {url}: {message}")]
    Connect { url: String, message: String },

    /// The host has not been started (or was shut down)
    #[error("Script host is not connected")]
    NotConnected,

    /// The socket transport failed mid-request
    #[error("Worker transport error: {0}")]
    Transport(#[from] tokio_tungstenite::tungstenite::Error),

    /// The worker closed the connection before answering
    #[error("Worker closed the connection")]
    ConnectionClosed,

    /// The worker answered something that is not the expected protocol
    #[error("Invalid worker response: {0}")]
    Protocol(String),

    /// The script itself reported failure
    #[error("{message}")]
    Script { message: String },

    /// The request exceeded the configured timeout
    #[error("Script execution timed out after {0:?}")]
    Timeout(std::time::Duration),

    /// Filesystem error around the script directory
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}
