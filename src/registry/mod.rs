//! Startup-populated function registry.
//!
//! Routes reference middlewares and loaders by string key; the registry maps
//! those keys to already-loaded function values. Registration happens during
//! application construction and the map is frozen afterwards, so request-time
//! lookup is a plain read — no dynamic code loading, no synchronization.

use std::collections::HashMap;
use std::sync::Arc;

use serde_json::Value;

use crate::context::RequestContext;
use crate::error::PageError;

/// A type-erased, reference-counted data-producing function.
///
/// Middlewares, loaders, and `resolve`-able helpers all share this shape:
/// they receive the request context (with the accumulator merged so far) and
/// return a partial data object to merge in.
pub type DataFn =
    Arc<dyn Fn(&RequestContext<'_>) -> Result<Value, PageError> + Send + Sync + 'static>;

/// Key → function table for everything routes reference by name.
#[derive(Default)]
pub struct Registry {
    functions: HashMap<String, DataFn>,
}

impl Registry {
    /// Creates an empty registry.
    pub fn new() -> Self {
        Self::default()
    }

    /// Registers a function under a stable key, replacing any previous entry.
    pub fn register<F>(&mut self, key: impl Into<String>, function: F)
    where
        F: Fn(&RequestContext<'_>) -> Result<Value, PageError> + Send + Sync + 'static,
    {
        self.functions.insert(key.into(), Arc::new(function));
    }

    /// Looks up a function by key.
    pub fn get(&self, key: &str) -> Option<&DataFn> {
        self.functions.get(key)
    }

    /// Looks up a function by key, failing with [`PageError::UnknownSymbol`]
    /// when no registration exists.
    pub fn require(&self, key: &str) -> Result<&DataFn, PageError> {
        self.functions
            .get(key)
            .ok_or_else(|| PageError::UnknownSymbol(key.to_owned()))
    }

    /// Returns the number of registered functions.
    pub fn len(&self) -> usize {
        self.functions.len()
    }

    /// Returns `true` if nothing is registered.
    pub fn is_empty(&self) -> bool {
        self.functions.is_empty()
    }
}
