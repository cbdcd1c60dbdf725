//! Route storage and dispatch.
//!
//! # Responsibilities
//! - Store path → handler associations
//! - Invoke the handler registered for a path
//! - Return an explicit not-found sentinel for unknown paths
//!
//! # Design Decisions
//! - Exact string match only; any string is a valid path
//! - Last registration for a path wins
//! - Dispatch takes `&self` and never mutates the registry
//! - Handlers are shared (`Arc`) so one handler can back many routes

use std::collections::HashMap;
use std::fmt;
use std::sync::Arc;

use crate::config::RouteConfig;
use crate::observability::metrics;

/// Body returned by [`RouteRegistry::dispatch`] when no route matches.
pub const NOT_FOUND: &str = "404 - Not Found";

/// A zero-argument function producing a response body.
pub trait Handler: Send + Sync {
    /// Invoke the handler.
    fn call(&self) -> String;

    /// Display name used in logs.
    fn name(&self) -> &str;
}

impl<F> Handler for F
where
    F: Fn() -> String + Send + Sync,
{
    fn call(&self) -> String {
        self()
    }

    fn name(&self) -> &str {
        std::any::type_name::<F>()
    }
}

/// A closure paired with a readable name.
pub struct NamedHandler<F> {
    name: String,
    f: F,
}

impl<F> NamedHandler<F>
where
    F: Fn() -> String + Send + Sync,
{
    pub fn new(name: impl Into<String>, f: F) -> Self {
        Self {
            name: name.into(),
            f,
        }
    }
}

impl<F> Handler for NamedHandler<F>
where
    F: Fn() -> String + Send + Sync,
{
    fn call(&self) -> String {
        (self.f)()
    }

    fn name(&self) -> &str {
        &self.name
    }
}

/// Handler that always returns the same body. Routes declared in
/// configuration files are backed by this.
#[derive(Debug, Clone)]
pub struct StaticText {
    body: String,
}

impl StaticText {
    pub fn new(body: impl Into<String>) -> Self {
        Self { body: body.into() }
    }
}

impl Handler for StaticText {
    fn call(&self) -> String {
        self.body.clone()
    }

    fn name(&self) -> &str {
        "static_text"
    }
}

/// A (path, handler) association.
#[derive(Clone)]
pub struct Route {
    pub path: String,
    pub handler: Arc<dyn Handler>,
}

impl fmt::Debug for Route {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Route")
            .field("path", &self.path)
            .field("handler", &self.handler.name())
            .finish()
    }
}

/// Owner of all routes for one logical router instance.
///
/// Registries are plain values: two registries never share routes.
#[derive(Clone, Default)]
pub struct RouteRegistry {
    routes: HashMap<String, Arc<dyn Handler>>,
}

impl RouteRegistry {
    /// Create an empty registry.
    pub fn new() -> Self {
        Self::default()
    }

    /// Build a registry from configured static-text routes.
    ///
    /// Routes are registered in declaration order, so a later entry for
    /// the same path replaces an earlier one.
    pub fn from_config(routes: &[RouteConfig]) -> Self {
        let mut registry = Self::new();
        registry.register_config(routes);
        registry
    }

    /// Register configured static-text routes over the existing ones.
    pub fn register_config(&mut self, routes: &[RouteConfig]) {
        for route in routes {
            self.register(route.path.clone(), StaticText::new(route.body.clone()));
        }
    }

    /// Store `handler` under `path`, replacing any previous handler.
    pub fn register<H>(&mut self, path: impl Into<String>, handler: H)
    where
        H: Handler + 'static,
    {
        self.register_shared(path, Arc::new(handler));
    }

    /// Store an already shared handler under `path`.
    pub fn register_shared(&mut self, path: impl Into<String>, handler: Arc<dyn Handler>) {
        let path = path.into();
        tracing::info!(path = %path, handler = handler.name(), "Route registered");
        metrics::record_route_registered();

        if let Some(previous) = self.routes.insert(path.clone(), handler) {
            tracing::debug!(
                path = %path,
                previous = previous.name(),
                "Replaced existing handler"
            );
        }
    }

    /// Invoke the handler for `path`, or return [`NOT_FOUND`].
    pub fn dispatch(&self, path: &str) -> String {
        match self.routes.get(path) {
            Some(handler) => {
                metrics::record_dispatch(true);
                handler.call()
            }
            None => {
                tracing::debug!(path = %path, "No route matched");
                metrics::record_dispatch(false);
                NOT_FOUND.to_string()
            }
        }
    }

    /// Look up the handler for `path` without invoking it.
    pub fn lookup(&self, path: &str) -> Option<Arc<dyn Handler>> {
        self.routes.get(path).cloned()
    }

    pub fn contains(&self, path: &str) -> bool {
        self.routes.contains_key(path)
    }

    pub fn len(&self) -> usize {
        self.routes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.routes.is_empty()
    }

    /// Registered paths, sorted.
    pub fn paths(&self) -> Vec<&str> {
        let mut paths: Vec<&str> = self.routes.keys().map(String::as_str).collect();
        paths.sort_unstable();
        paths
    }

    /// All routes, sorted by path.
    pub fn routes(&self) -> Vec<Route> {
        let mut routes: Vec<Route> = self
            .routes
            .iter()
            .map(|(path, handler)| Route {
                path: path.clone(),
                handler: Arc::clone(handler),
            })
            .collect();
        routes.sort_by(|a, b| a.path.cmp(&b.path));
        routes
    }
}

impl fmt::Debug for RouteRegistry {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("RouteRegistry")
            .field("paths", &self.paths())
            .finish()
    }
}

impl Extend<Route> for RouteRegistry {
    fn extend<I: IntoIterator<Item = Route>>(&mut self, iter: I) {
        for route in iter {
            self.register_shared(route.path, route.handler);
        }
    }
}
