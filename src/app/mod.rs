//! Application state: built once at startup, frozen, then shared.
//!
//! [`App`] carries everything the engine reads at request time — the route
//! table, the function registry, the plugin sequence, the process-wide
//! capability set, and configuration. Construction goes through
//! [`AppBuilder`]; after [`AppBuilder::build`] the state is immutable, so
//! concurrent request handling reads it without synchronization. Nothing in
//! the crate reaches for ambient global state.

use std::collections::HashMap;
use std::path::PathBuf;

use serde_json::Value;

use crate::context::RequestContext;
use crate::error::PageError;
use crate::plugin::Plugin;
use crate::registry::Registry;
use crate::router::{Route, RouteTable};

/// Process configuration the engine consults at request time.
#[derive(Debug, Clone)]
pub struct Config {
    /// Installation root of the page sources; redacted from diagnostics.
    pub pages_root: PathBuf,
    /// Optional path marker stripped entirely from diagnostics.
    pub hooks_marker: Option<String>,
    /// Development mode: unfingerprinted assets get cache-busting suffixes.
    pub dev: bool,
}

/// The process-wide read-only capability set merged into every context:
/// named utility values plus environment variables captured at startup.
#[derive(Debug, Clone, Default)]
pub struct Globals {
    values: HashMap<String, Value>,
    env: HashMap<String, String>,
}

impl Globals {
    /// Returns the capability value registered under `key`.
    pub fn value(&self, key: &str) -> Option<&Value> {
        self.values.get(key)
    }

    /// Returns a captured environment variable.
    pub fn env(&self, name: &str) -> Option<&str> {
        self.env.get(name).map(String::as_str)
    }
}

/// Frozen application state shared across all requests.
pub struct App {
    routes: RouteTable,
    registry: Registry,
    plugins: Vec<Plugin>,
    globals: Globals,
    config: Config,
}

impl App {
    /// Returns the route table.
    pub fn routes(&self) -> &RouteTable {
        &self.routes
    }

    /// Returns the function registry.
    pub fn registry(&self) -> &Registry {
        &self.registry
    }

    /// Returns the plugin sequence in registration order.
    pub fn plugins(&self) -> &[Plugin] {
        &self.plugins
    }

    /// Returns the capability set.
    pub fn globals(&self) -> &Globals {
        &self.globals
    }

    /// Returns the process configuration.
    pub fn config(&self) -> &Config {
        &self.config
    }
}

/// Builder for [`App`]; everything is registered here, once, before any
/// request is handled.
pub struct AppBuilder {
    routes: Vec<Route>,
    registry: Registry,
    plugins: Vec<Plugin>,
    globals: Globals,
    config: Config,
}

impl AppBuilder {
    /// Starts a builder rooted at the given pages directory.
    pub fn new(pages_root: impl Into<PathBuf>) -> Self {
        Self {
            routes: Vec::new(),
            registry: Registry::new(),
            plugins: Vec::new(),
            globals: Globals::default(),
            config: Config {
                pages_root: pages_root.into(),
                hooks_marker: None,
                dev: false,
            },
        }
    }

    /// Appends a route; table order is registration order.
    #[must_use]
    pub fn route(mut self, route: Route) -> Self {
        self.routes.push(route);
        self
    }

    /// Registers a loader/middleware function under a stable key.
    #[must_use]
    pub fn function<F>(mut self, key: impl Into<String>, function: F) -> Self
    where
        F: Fn(&RequestContext<'_>) -> Result<Value, PageError> + Send + Sync + 'static,
    {
        self.registry.register(key, function);
        self
    }

    /// Appends a plugin; hook order is registration order.
    #[must_use]
    pub fn plugin(mut self, plugin: Plugin) -> Self {
        self.plugins.push(plugin);
        self
    }

    /// Registers a process-wide capability value.
    #[must_use]
    pub fn global(mut self, key: impl Into<String>, value: Value) -> Self {
        self.globals.values.insert(key.into(), value);
        self
    }

    /// Captures an environment variable into the capability set.
    #[must_use]
    pub fn env(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
        self.globals.env.insert(name.into(), value.into());
        self
    }

    /// Sets the hooks-directory marker stripped from diagnostics.
    #[must_use]
    pub fn hooks_marker(mut self, marker: impl Into<String>) -> Self {
        self.config.hooks_marker = Some(marker.into());
        self
    }

    /// Toggles development mode.
    #[must_use]
    pub fn dev(mut self, dev: bool) -> Self {
        self.config.dev = dev;
        self
    }

    /// Freezes the state. The returned [`App`] never mutates at request time.
    pub fn build(self) -> App {
        App {
            routes: RouteTable::new(self.routes),
            registry: self.registry,
            plugins: self.plugins,
            globals: self.globals,
            config: self.config,
        }
    }
}
