// crates/warden-core/src/runtime/registry.rs
// ============================================================================
// Module: Warden Tool Registry
// Description: Name-to-tool lookup shared by all concurrently executing runs.
// Purpose: Enforce unique registration and provide synchronized access.
// Dependencies: crate::core, crate::interfaces, thiserror
// ============================================================================

//! ## Overview
//! The registry is one of the shared components many runs consult at once, so
//! access is internally synchronized. Registration of a duplicate name fails;
//! lookups of unregistered names fail. Tools are handed out as shared
//! references, never removed out from under an in-flight invocation.

// ============================================================================
// SECTION: Imports
// ============================================================================

use std::collections::BTreeMap;
use std::sync::Arc;
use std::sync::RwLock;

use thiserror::Error;

use crate::core::identifiers::ToolName;
use crate::interfaces::Tool;

// ============================================================================
// SECTION: Registry Errors
// ============================================================================

/// Errors returned by the tool registry.
///
/// # Invariants
/// - Variants are stable for programmatic handling.
#[derive(Debug, Error)]
pub enum RegistryError {
    /// Tool name is already registered.
    #[error("tool already registered: {0}")]
    ToolExists(ToolName),
    /// Tool name is not registered.
    #[error("tool not found: {0}")]
    ToolNotFound(ToolName),
}

// ============================================================================
// SECTION: Tool Registry
// ============================================================================

/// Synchronized name-to-tool lookup.
///
/// # Invariants
/// - Each name maps to exactly one tool for the registry's lifetime unless
///   explicitly deregistered.
#[derive(Default)]
pub struct ToolRegistry {
    /// Registered tools keyed by name.
    tools: RwLock<BTreeMap<ToolName, Arc<dyn Tool>>>,
}

impl ToolRegistry {
    /// Creates an empty registry.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Registers a tool under its declared name.
    ///
    /// # Errors
    ///
    /// Returns [`RegistryError::ToolExists`] when the name is already taken.
    pub fn register(&self, tool: Arc<dyn Tool>) -> Result<(), RegistryError> {
        let name = tool.name();
        let mut tools = self.tools.write().unwrap_or_else(std::sync::PoisonError::into_inner);
        if tools.contains_key(&name) {
            return Err(RegistryError::ToolExists(name));
        }
        tools.insert(name, tool);
        Ok(())
    }

    /// Removes a tool by name and returns it.
    ///
    /// # Errors
    ///
    /// Returns [`RegistryError::ToolNotFound`] when the name is not registered.
    pub fn deregister(&self, name: &ToolName) -> Result<Arc<dyn Tool>, RegistryError> {
        let mut tools = self.tools.write().unwrap_or_else(std::sync::PoisonError::into_inner);
        tools.remove(name).ok_or_else(|| RegistryError::ToolNotFound(name.clone()))
    }

    /// Returns the tool registered under a name.
    ///
    /// # Errors
    ///
    /// Returns [`RegistryError::ToolNotFound`] when the name is not registered.
    pub fn get(&self, name: &ToolName) -> Result<Arc<dyn Tool>, RegistryError> {
        let tools = self.tools.read().unwrap_or_else(std::sync::PoisonError::into_inner);
        tools.get(name).cloned().ok_or_else(|| RegistryError::ToolNotFound(name.clone()))
    }

    /// Returns true when a tool is registered under the name.
    #[must_use]
    pub fn contains(&self, name: &ToolName) -> bool {
        let tools = self.tools.read().unwrap_or_else(std::sync::PoisonError::into_inner);
        tools.contains_key(name)
    }

    /// Returns the registered tool names in sorted order.
    #[must_use]
    pub fn names(&self) -> Vec<ToolName> {
        let tools = self.tools.read().unwrap_or_else(std::sync::PoisonError::into_inner);
        tools.keys().cloned().collect()
    }

    /// Returns the number of registered tools.
    #[must_use]
    pub fn len(&self) -> usize {
        let tools = self.tools.read().unwrap_or_else(std::sync::PoisonError::into_inner);
        tools.len()
    }

    /// Returns true when no tools are registered.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}
