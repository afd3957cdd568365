//! Plugin capability contract.
//!
//! A [`Plugin`] is a named bundle of up to four optional hooks, each with its
//! own composition rule in the pipeline:
//!
//! - `on_request` — side-effecting; every plugin runs, in order.
//! - `on_extend_context` — additive; every plugin runs, in order, and later
//!   plugins see earlier additions.
//! - `on_render` — a left fold over the running content; returning `None`
//!   means "no change".
//! - `on_response` — a short-circuiting chain; the first plugin returning
//!   `true` has claimed the response.
//!
//! Plugins are registered at startup and held in a stable order; each hook is
//! an optional boxed callable queried with a presence check.

use std::path::Path;

use tracing::debug;

use crate::context::RequestContext;
use crate::error::PageError;
use crate::http::StatusCode;
use crate::router::Route;

/// Side-effecting request hook; return value is ignored by design.
pub type RequestHook =
    Box<dyn Fn(&mut RequestContext<'_>) -> Result<(), PageError> + Send + Sync + 'static>;

/// Context-extension hook; attaches fields before the context is used.
pub type ExtendContextHook =
    Box<dyn Fn(&mut RequestContext<'_>, &Route) -> Result<(), PageError> + Send + Sync + 'static>;

/// Content fold hook; `Ok(None)` leaves the running content unchanged.
/// The full plugin list is passed so renderers can delegate (the original
/// contract's `pluginList` argument).
pub type RenderHook = Box<
    dyn Fn(
            &str,
            &mut RequestContext<'_>,
            &Route,
            &Path,
            &[Plugin],
        ) -> Result<Option<String>, PageError>
        + Send
        + Sync
        + 'static,
>;

/// Response strategy hook; `Ok(true)` claims the response and ends the phase.
pub type ResponseHook = Box<
    dyn Fn(&str, &mut RequestContext<'_>, &Route) -> Result<bool, PageError>
        + Send
        + Sync
        + 'static,
>;

/// A capability bundle exposing zero or more pipeline hooks.
///
/// # Examples
///
/// ```
/// use pageflow::plugin::Plugin;
///
/// let plugin = Plugin::new("security-headers").on_request(|ctx| {
///     ctx.response().set_header("X-Frame-Options", "DENY");
///     Ok(())
/// });
/// assert_eq!(plugin.name(), "security-headers");
/// ```
pub struct Plugin {
    name: String,
    pub(crate) on_request: Option<RequestHook>,
    pub(crate) on_extend_context: Option<ExtendContextHook>,
    pub(crate) on_render: Option<RenderHook>,
    pub(crate) on_response: Option<ResponseHook>,
}

impl Plugin {
    /// Creates a plugin with no hooks.
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            on_request: None,
            on_extend_context: None,
            on_render: None,
            on_response: None,
        }
    }

    /// Returns the plugin's registration name.
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Installs the `on_request` hook.
    #[must_use]
    pub fn on_request<F>(mut self, hook: F) -> Self
    where
        F: Fn(&mut RequestContext<'_>) -> Result<(), PageError> + Send + Sync + 'static,
    {
        self.on_request = Some(Box::new(hook));
        self
    }

    /// Installs the `on_extend_context` hook.
    #[must_use]
    pub fn on_extend_context<F>(mut self, hook: F) -> Self
    where
        F: Fn(&mut RequestContext<'_>, &Route) -> Result<(), PageError> + Send + Sync + 'static,
    {
        self.on_extend_context = Some(Box::new(hook));
        self
    }

    /// Installs the `on_render` hook.
    #[must_use]
    pub fn on_render<F>(mut self, hook: F) -> Self
    where
        F: Fn(
                &str,
                &mut RequestContext<'_>,
                &Route,
                &Path,
                &[Plugin],
            ) -> Result<Option<String>, PageError>
            + Send
            + Sync
            + 'static,
    {
        self.on_render = Some(Box::new(hook));
        self
    }

    /// Installs the `on_response` hook.
    #[must_use]
    pub fn on_response<F>(mut self, hook: F) -> Self
    where
        F: Fn(&str, &mut RequestContext<'_>, &Route) -> Result<bool, PageError>
            + Send
            + Sync
            + 'static,
    {
        self.on_response = Some(Box::new(hook));
        self
    }
}

/// Built-in responder: emits the final content as structured data when it
/// parses as a JSON document, otherwise declines.
pub fn json_responder() -> Plugin {
    Plugin::new("builtin-json").on_response(|content, ctx, _route| {
        match serde_json::from_str(content) {
            Ok(parsed) => {
                ctx.response().json(StatusCode::Ok, parsed);
                Ok(true)
            }
            Err(_) => {
                debug!("final content is not structured data");
                Ok(false)
            }
        }
    })
}

/// Built-in responder of last resort: emits the final content as HTML.
pub fn html_responder() -> Plugin {
    Plugin::new("builtin-html").on_response(|content, ctx, _route| {
        ctx.response().html(StatusCode::Ok, content);
        Ok(true)
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn new_plugin_has_no_hooks() {
        let plugin = Plugin::new("empty");
        assert!(plugin.on_request.is_none());
        assert!(plugin.on_extend_context.is_none());
        assert!(plugin.on_render.is_none());
        assert!(plugin.on_response.is_none());
    }

    #[test]
    fn builder_installs_hooks() {
        let plugin = Plugin::new("full")
            .on_request(|_ctx| Ok(()))
            .on_extend_context(|_ctx, _route| Ok(()))
            .on_render(|_content, _ctx, _route, _source, _plugins| Ok(None))
            .on_response(|_content, _ctx, _route| Ok(false));
        assert!(plugin.on_request.is_some());
        assert!(plugin.on_extend_context.is_some());
        assert!(plugin.on_render.is_some());
        assert!(plugin.on_response.is_some());
    }

    #[test]
    fn builtin_responders_exist() {
        assert!(json_responder().on_response.is_some());
        assert!(html_responder().on_response.is_some());
    }
}
