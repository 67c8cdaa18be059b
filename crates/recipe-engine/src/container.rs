//! Composite entry running children in dependency order
//!
//! A container owns its children, the wiring between them, and the order in
//! which they run. Execution is strictly sequential: each child's outputs
//! are committed before the next child's inputs are resolved, which is what
//! makes value propagation along connections sound.

use std::collections::{HashMap, HashSet};
use std::fmt;

use serde_json::Value;

use crate::definition::ParameterDefinition;
use crate::entry::{Entry, EntryBase};
use crate::error::{EngineError, Result};
use crate::status::ExecutionStatus;

/// Composite entry holding child entries and an execution order
#[derive(Debug)]
pub struct Container {
    base: EntryBase,
    children: Vec<Entry>,
    execution_order: Vec<String>,
}

impl Container {
    /// Create an empty container
    pub fn new(
        id: impl Into<String>,
        original_name: impl Into<String>,
        description: impl Into<String>,
    ) -> Self {
        Self {
            base: EntryBase::new(id, original_name, description),
            children: Vec::new(),
            execution_order: Vec::new(),
        }
    }

    /// Load parameter definitions onto this container
    pub fn with_parameters(mut self, definitions: &[ParameterDefinition]) -> Self {
        self.base.load_definitions(definitions);
        self
    }

    pub fn base(&self) -> &EntryBase {
        &self.base
    }

    pub fn base_mut(&mut self) -> &mut EntryBase {
        &mut self.base
    }

    /// Add a child entry; fails if a child with the same id already exists
    pub fn add_child(&mut self, child: Entry) -> Result<()> {
        if self.children.iter().any(|c| c.id() == child.id()) {
            return Err(EngineError::Definition(format!(
                "Child '{}' already exists in container '{}'",
                child.id(),
                self.base.id()
            )));
        }
        self.children.push(child);
        Ok(())
    }

    /// Remove and return a child by id
    pub fn remove_child(&mut self, id: &str) -> Option<Entry> {
        let index = self.children.iter().position(|c| c.id() == id)?;
        Some(self.children.remove(index))
    }

    /// Look up a child by id
    pub fn child(&self, id: &str) -> Option<&Entry> {
        self.children.iter().find(|c| c.id() == id)
    }

    /// Look up a child by id, mutable
    pub fn child_mut(&mut self, id: &str) -> Option<&mut Entry> {
        self.children.iter_mut().find(|c| c.id() == id)
    }

    /// All children in insertion order
    pub fn children(&self) -> &[Entry] {
        &self.children
    }

    /// Replace the execution order
    ///
    /// Every id must name an existing child. Completeness (every child
    /// present exactly once) is not required here; it is checked lazily at
    /// validation time.
    pub fn set_execution_order(&mut self, order: Vec<String>) -> Result<()> {
        for id in &order {
            if !self.children.iter().any(|c| c.id() == *id) {
                return Err(EngineError::Validation(format!(
                    "Execution order references unknown child '{}'",
                    id
                )));
            }
        }
        self.execution_order = order;
        Ok(())
    }

    /// The current execution order
    pub fn execution_order(&self) -> &[String] {
        &self.execution_order
    }

    /// Check that the execution order is exactly the set of child ids
    ///
    /// A container without children passes vacuously. Otherwise every child
    /// must appear, no foreign id may appear, and no id may repeat.
    pub fn validate_execution_order(&self) -> Result<()> {
        if self.children.is_empty() {
            return Ok(());
        }

        for child in &self.children {
            if !self.execution_order.iter().any(|id| id == child.id()) {
                return Err(EngineError::Validation(format!(
                    "Child '{}' is missing from the execution order",
                    child.id()
                )));
            }
        }
        for id in &self.execution_order {
            if !self.children.iter().any(|c| c.id() == *id) {
                return Err(EngineError::Validation(format!(
                    "Execution order references unknown child '{}'",
                    id
                )));
            }
        }
        if self.execution_order.len() != self.children.len() {
            return Err(EngineError::Validation(format!(
                "Execution order of container '{}' contains duplicate child ids",
                self.base.id()
            )));
        }
        Ok(())
    }

    /// Base validation plus the container-specific checks
    ///
    /// Requires at least one child, a non-empty execution order, and every
    /// child to be executable in turn; a child failure is wrapped with the
    /// child's id for traceability.
    pub(crate) fn validate_executability(&self) -> Result<()> {
        self.base.validate_parameters()?;
        self.base.validate_connections()?;
        self.validate_execution_order()?;

        if self.children.is_empty() {
            return Err(EngineError::Validation(format!(
                "Container '{}' has no children",
                self.base.id()
            )));
        }
        if self.execution_order.is_empty() {
            return Err(EngineError::Validation(format!(
                "Container '{}' has no execution order",
                self.base.id()
            )));
        }

        for child in &self.children {
            child
                .validate_executability()
                .map_err(|e| EngineError::child(child.id(), e))?;
        }
        Ok(())
    }

    /// Run children in execution order, moving values as they become ready
    ///
    /// Before each child runs, the container pushes its own input values
    /// onto same-named child inputs and propagates values along all
    /// registered child-to-child connections. After each child completes,
    /// its outputs are copied onto same-named container outputs. A child
    /// failure aborts the remaining children; container outputs already
    /// applied are not rolled back.
    pub(crate) async fn execute_internal(
        &mut self,
        inputs: HashMap<String, Value>,
    ) -> Result<HashMap<String, Value>> {
        let order = self.execution_order.clone();

        for child_id in order {
            self.push_container_inputs(&child_id, &inputs)?;
            self.propagate_values();

            let status = {
                let child = self
                    .children
                    .iter_mut()
                    .find(|c| c.id() == child_id)
                    .ok_or_else(|| {
                        EngineError::Validation(format!(
                            "Execution order references unknown child '{}'",
                            child_id
                        ))
                    })?;
                child
                    .execute()
                    .await
                    .map_err(|e| EngineError::child(&child_id, e))?;
                child.status()
            };

            if status == ExecutionStatus::Error {
                return Err(EngineError::child(
                    &child_id,
                    EngineError::Execution("entry finished in error state".to_string()),
                ));
            }

            self.collect_child_outputs(&child_id);
        }

        // Outputs were written directly; nothing for the caller to apply.
        Ok(HashMap::new())
    }

    /// Push the container's input values onto same-named child inputs
    fn push_container_inputs(
        &mut self,
        child_id: &str,
        inputs: &HashMap<String, Value>,
    ) -> Result<()> {
        let child = self
            .children
            .iter_mut()
            .find(|c| c.id() == child_id)
            .ok_or_else(|| {
                EngineError::Validation(format!(
                    "Execution order references unknown child '{}'",
                    child_id
                ))
            })?;

        for (name, value) in inputs {
            if value.is_null() {
                continue;
            }
            child.base_mut().set_input_value(name, value.clone());
        }
        Ok(())
    }

    /// Move values along every registered child-to-child connection
    ///
    /// Null source values are not propagated; the target keeps whatever
    /// value it already has.
    fn propagate_values(&mut self) {
        let connections = self.base.connections().all().to_vec();

        for connection in connections {
            let value = self
                .children
                .iter()
                .find(|c| c.id() == connection.source_entry_id)
                .and_then(|c| c.base().output_value(&connection.source_parameter_id))
                .cloned();

            let Some(value) = value else { continue };
            if value.is_null() {
                continue;
            }

            if let Some(target) = self
                .children
                .iter_mut()
                .find(|c| c.id() == connection.target_entry_id)
            {
                log::debug!("Propagating value along {}", connection);
                target
                    .base_mut()
                    .set_input_value(&connection.target_parameter_id, value);
            }
        }
    }

    /// Copy a child's non-null outputs onto same-named container outputs
    fn collect_child_outputs(&mut self, child_id: &str) {
        let child_outputs: Vec<(String, Value)> = match self.child(child_id) {
            Some(child) => child
                .base()
                .outputs()
                .iter()
                .filter(|p| !p.value().is_null())
                .map(|p| (p.name().to_string(), p.value().clone()))
                .collect(),
            None => return,
        };

        for (name, value) in child_outputs {
            if self.base.output(&name).is_some() && !self.base.set_output_value(&name, value) {
                log::warn!(
                    "Dropping invalid output value for '{}:{}'",
                    self.base.id(),
                    name
                );
            }
        }
    }

    /// Derive the execution order from the registered connections
    ///
    /// Builds a dependency graph over child ids (an edge for every
    /// connection whose endpoints are both children, target depending on
    /// source) and walks it depth-first; the execution order is the reverse
    /// of the walk's post-order, which puts dependencies before dependents.
    /// Ties among independent children follow child insertion order, so the
    /// result is deterministic for a fixed insertion sequence — a graph
    /// with no edges yields the reverse of insertion order.
    ///
    /// Returns false — leaving the current order untouched — when there are
    /// no children or the graph contains a cycle.
    pub fn auto_set_execution_order(&mut self) -> bool {
        if self.children.is_empty() {
            return false;
        }

        let child_ids: Vec<String> = self.children.iter().map(|c| c.id().to_string()).collect();
        let id_set: HashSet<&str> = child_ids.iter().map(|s| s.as_str()).collect();

        // source -> targets, restricted to edges between direct children
        let mut downstream: HashMap<&str, Vec<&str>> = HashMap::new();
        for connection in self.base.connections().all() {
            let source = connection.source_entry_id.as_str();
            let target = connection.target_entry_id.as_str();
            if id_set.contains(source) && id_set.contains(target) {
                downstream.entry(source).or_default().push(target);
            }
        }

        fn visit<'a>(
            id: &'a str,
            downstream: &HashMap<&'a str, Vec<&'a str>>,
            visiting: &mut HashSet<&'a str>,
            visited: &mut HashSet<&'a str>,
            post_order: &mut Vec<&'a str>,
        ) -> bool {
            // An id seen again while still in the current walk is a cycle
            if visiting.contains(id) {
                return false;
            }
            if visited.contains(id) {
                return true;
            }

            visiting.insert(id);
            if let Some(targets) = downstream.get(id) {
                for target in targets {
                    if !visit(target, downstream, visiting, visited, post_order) {
                        return false;
                    }
                }
            }
            visiting.remove(id);
            visited.insert(id);
            post_order.push(id);
            true
        }

        let mut visiting = HashSet::new();
        let mut visited = HashSet::new();
        let mut post_order = Vec::new();

        for id in &child_ids {
            if !visited.contains(id.as_str())
                && !visit(id, &downstream, &mut visiting, &mut visited, &mut post_order)
            {
                log::warn!(
                    "Cycle detected while ordering children of container '{}'",
                    self.base.id()
                );
                return false;
            }
        }

        let order: Vec<String> = post_order.iter().rev().map(|id| id.to_string()).collect();
        self.execution_order = order;
        true
    }
}

impl fmt::Display for Container {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "Container '{}' ({} children)",
            self.base.id(),
            self.children.len()
        )
    }
}
