// SPDX-License-Identifier: MIT OR Apache-2.0
//! Execution context handed to action executors.

use indexmap::IndexMap;
use std::any::Any;
use std::fmt;
use std::sync::Arc;

/// Shared host handle stored in the context
pub type ContextValue = Arc<dyn Any + Send + Sync>;

/// Named references to host-side effect handles (canvas API, audio bus, ...).
///
/// The engine only reads the context during dispatch. Hosts update it with
/// [`ExecutionContext::merge`], which replaces entries key by key.
#[derive(Clone, Default)]
pub struct ExecutionContext {
    entries: IndexMap<String, ContextValue>,
}

impl ExecutionContext {
    /// Create an empty context
    pub fn new() -> Self {
        Self::default()
    }

    /// Add an entry (builder style)
    pub fn with<T: Any + Send + Sync>(mut self, key: impl Into<String>, value: T) -> Self {
        self.insert(key, value);
        self
    }

    /// Insert or replace an entry
    pub fn insert<T: Any + Send + Sync>(&mut self, key: impl Into<String>, value: T) {
        self.entries.insert(key.into(), Arc::new(value));
    }

    /// Insert or replace an already shared entry
    pub fn insert_shared(&mut self, key: impl Into<String>, value: ContextValue) {
        self.entries.insert(key.into(), value);
    }

    /// Get a typed entry. Returns `None` if missing or of another type.
    pub fn get<T: Any + Send + Sync>(&self, key: &str) -> Option<&T> {
        self.entries.get(key).and_then(|value| value.downcast_ref::<T>())
    }

    /// Whether an entry exists
    pub fn contains(&self, key: &str) -> bool {
        self.entries.contains_key(key)
    }

    /// Remove an entry
    pub fn remove(&mut self, key: &str) -> Option<ContextValue> {
        self.entries.shift_remove(key)
    }

    /// Shallow merge: every entry of `partial` replaces the same key here
    pub fn merge(&mut self, partial: ExecutionContext) {
        self.entries.extend(partial.entries);
    }

    /// Entry keys in insertion order
    pub fn keys(&self) -> impl Iterator<Item = &str> {
        self.entries.keys().map(String::as_str)
    }

    /// Number of entries
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// Whether the context is empty
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

impl fmt::Debug for ExecutionContext {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ExecutionContext")
            .field("keys", &self.entries.keys().collect::<Vec<_>>())
            .finish()
    }
}
