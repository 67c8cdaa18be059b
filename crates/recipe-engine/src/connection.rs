//! Directed parameter wiring between entries
//!
//! A `ConnectionManager` owns the edges between parameters of sibling
//! entries: a container owns the wiring between its direct children, and
//! every entry owns a manager describing its own declared linkage.

use std::fmt;
use std::sync::Arc;

use serde::{Deserialize, Serialize};

use crate::error::{EngineError, Result};

/// A directed edge from one entry's output parameter to another entry's
/// input parameter
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Connection {
    /// Entry providing the value
    pub source_entry_id: String,
    /// Output parameter on the source entry
    pub source_parameter_id: String,
    /// Entry receiving the value
    pub target_entry_id: String,
    /// Input parameter on the target entry
    pub target_parameter_id: String,
}

impl Connection {
    /// Create a connection between two parameter endpoints
    pub fn new(
        source_entry_id: impl Into<String>,
        source_parameter_id: impl Into<String>,
        target_entry_id: impl Into<String>,
        target_parameter_id: impl Into<String>,
    ) -> Self {
        Self {
            source_entry_id: source_entry_id.into(),
            source_parameter_id: source_parameter_id.into(),
            target_entry_id: target_entry_id.into(),
            target_parameter_id: target_parameter_id.into(),
        }
    }

    /// Whether another connection has the same four endpoints
    fn same_endpoints(&self, other: &Connection) -> bool {
        self == other
    }
}

impl fmt::Display for Connection {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{}:{} -> {}:{}",
            self.source_entry_id,
            self.source_parameter_id,
            self.target_entry_id,
            self.target_parameter_id
        )
    }
}

/// Pluggable compatibility check for connection endpoint types
///
/// The contract is "declared types of the source output and target input
/// must be compatible". Hosts that track parameter types can substitute a
/// strict policy; the default accepts every pairing.
pub trait ConnectionTypePolicy: Send + Sync {
    /// Whether the endpoint types of this connection are compatible
    fn compatible(&self, connection: &Connection) -> bool;
}

/// Default policy that treats every pairing as compatible
#[derive(Debug, Clone, Copy, Default)]
pub struct PermissiveTypePolicy;

impl ConnectionTypePolicy for PermissiveTypePolicy {
    fn compatible(&self, _connection: &Connection) -> bool {
        true
    }
}

/// Owner of the directed wiring graph between parameters
///
/// Connections are keyed by their four endpoints: connecting the same
/// endpoints twice overwrites rather than accumulates. Iteration order is
/// insertion order, which makes downstream propagation and dependency
/// derivation deterministic.
pub struct ConnectionManager {
    connections: Vec<Connection>,
    policy: Arc<dyn ConnectionTypePolicy>,
}

impl ConnectionManager {
    /// Create a manager with the permissive type policy
    pub fn new() -> Self {
        Self::with_policy(Arc::new(PermissiveTypePolicy))
    }

    /// Create a manager with a custom type-compatibility policy
    pub fn with_policy(policy: Arc<dyn ConnectionTypePolicy>) -> Self {
        Self {
            connections: Vec::new(),
            policy,
        }
    }

    /// Add a connection
    ///
    /// Fails when the endpoint types are incompatible under the configured
    /// policy, or when the exact reverse edge between the same pair of
    /// entries already exists (the direct two-entry cycle). Longer cycles
    /// are not detected here; they surface when a container derives its
    /// execution order.
    pub fn connect(&mut self, connection: Connection) -> Result<()> {
        if !self.policy.compatible(&connection) {
            return Err(EngineError::Connection(format!(
                "Incompatible parameter types: {}",
                connection
            )));
        }

        if self.has_reverse(&connection) {
            return Err(EngineError::Connection(format!(
                "Direct cycle between '{}' and '{}'",
                connection.source_entry_id, connection.target_entry_id
            )));
        }

        match self
            .connections
            .iter()
            .position(|c| c.same_endpoints(&connection))
        {
            Some(index) => self.connections[index] = connection,
            None => self.connections.push(connection),
        }
        Ok(())
    }

    /// Remove the connection with the same four endpoints; absent is a no-op
    pub fn disconnect(&mut self, connection: &Connection) {
        self.connections.retain(|c| !c.same_endpoints(connection));
    }

    /// Connections whose target is the given entry
    pub fn input_connections(&self, entry_id: &str) -> Vec<&Connection> {
        self.connections
            .iter()
            .filter(|c| c.target_entry_id == entry_id)
            .collect()
    }

    /// Connections whose source is the given entry
    pub fn output_connections(&self, entry_id: &str) -> Vec<&Connection> {
        self.connections
            .iter()
            .filter(|c| c.source_entry_id == entry_id)
            .collect()
    }

    /// All connections in insertion order
    pub fn all(&self) -> &[Connection] {
        &self.connections
    }

    /// Remove every connection
    pub fn clear(&mut self) {
        self.connections.clear();
    }

    /// Whether the endpoint types of a connection are compatible under the
    /// configured policy
    pub fn validate_connection_types(&self, connection: &Connection) -> bool {
        self.policy.compatible(connection)
    }

    /// Whether the exact reverse edge between the same entry pair exists
    fn has_reverse(&self, connection: &Connection) -> bool {
        self.connections.iter().any(|c| {
            c.source_entry_id == connection.target_entry_id
                && c.target_entry_id == connection.source_entry_id
        })
    }
}

impl Default for ConnectionManager {
    fn default() -> Self {
        Self::new()
    }
}

// The policy object carries no Debug bound, so the manager formats by hand.
impl fmt::Debug for ConnectionManager {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ConnectionManager")
            .field("connections", &self.connections)
            .finish_non_exhaustive()
    }
}
