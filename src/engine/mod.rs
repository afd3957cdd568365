//! The request lifecycle engine.
//!
//! [`handle`] drives one request through the full pipeline:
//!
//! 1. Resolve the path against the route table; no match is a
//!    [`Outcome::Passthrough`] signal, not an error.
//! 2. Static routes short-circuit to a file transfer.
//! 3. Build the per-request context.
//! 4. Run the four hook phases: `on_request` (all, in order),
//!    `on_extend_context` (all, in order), the accumulator
//!    (middlewares then loaders, deep-merged), then the `on_render` fold —
//!    once over the main source, then once per layout with slot extraction
//!    between passes.
//! 5. Negotiate the response: user plugins first, then the structured-data
//!    built-in, then the HTML built-in; first claim wins.
//!
//! Any failure in steps 3–5 is caught here, classified, and rendered as a
//! complete error document. The engine emits exactly one response per
//! handled request.

use std::path::Path;

use tracing::debug;

use crate::app::App;
use crate::context::RequestContext;
use crate::data;
use crate::error::{PageError, classify};
use crate::http::{PageRequest, PageResponse};
use crate::plugin::{html_responder, json_responder};
use crate::router::{Route, RouteMatch};
use crate::slots::parse_slots;

/// The result of handling one request.
#[derive(Debug)]
pub enum Outcome {
    /// The engine produced a response.
    Response(PageResponse),
    /// No route matched; the request is handed back for the host's fallback
    /// handler.
    Passthrough(PageRequest),
}

/// Handles one request against frozen application state.
pub fn handle(app: &App, request: PageRequest) -> Outcome {
    debug!(method = %request.method(), path = %request.path(), "handling request");

    let Some(RouteMatch { route, params }) = app.routes().resolve(request.path()) else {
        debug!(path = %request.path(), "no route matched, passing through");
        return Outcome::Passthrough(request);
    };

    if route.is_static {
        debug!(path = %route.absolute_path.display(), "serving static file");
        let mut response = PageResponse::new();
        response.file(&route.absolute_path);
        return Outcome::Response(response);
    }

    let mut ctx = RequestContext::new(app, route, params, request);
    if let Err(err) = run_pipeline(app, route, &mut ctx) {
        classify(&err, app.config(), &mut ctx.response());
    }
    Outcome::Response(ctx.into_response())
}

fn run_pipeline(app: &App, route: &Route, ctx: &mut RequestContext<'_>) -> Result<(), PageError> {
    for plugin in app.plugins() {
        if let Some(hook) = &plugin.on_request {
            hook(ctx)?;
        }
    }

    for plugin in app.plugins() {
        if let Some(hook) = &plugin.on_extend_context {
            hook(ctx, route)?;
        }
    }

    data::run_accumulator(ctx)?;

    // Content fold: main source first, seeded empty.
    let mut content = render_fold(app, ctx, route, &route.absolute_path, String::new())?;

    // Each layout sees the previous stage's output re-injected as slots.
    for layout in &route.layouts {
        let parsed = parse_slots(&content);
        ctx.slot = parsed
            .slots
            .get("default")
            .cloned()
            .unwrap_or_else(|| parsed.content.clone());
        ctx.slots = parsed.slots;
        debug!(layout = %layout.display(), "applying layout");
        content = render_fold(app, ctx, route, layout, content)?;
    }

    negotiate_response(app, ctx, route, &content)
}

// Left fold of `on_render` hooks over the running content; a hook returning
// `None` leaves the content unchanged.
fn render_fold(
    app: &App,
    ctx: &mut RequestContext<'_>,
    route: &Route,
    source: &Path,
    seed: String,
) -> Result<String, PageError> {
    let plugins = app.plugins();
    let mut content = seed;
    for plugin in plugins {
        if let Some(hook) = &plugin.on_render {
            if let Some(replacement) = hook(&content, ctx, route, source, plugins)? {
                content = replacement;
            }
        }
    }
    Ok(content)
}

// Short-circuiting chain: user plugins, then the two built-ins. A request
// reaching past both built-ins is a fatal internal error.
fn negotiate_response(
    app: &App,
    ctx: &mut RequestContext<'_>,
    route: &Route,
    content: &str,
) -> Result<(), PageError> {
    let builtins = [json_responder(), html_responder()];
    for plugin in app.plugins().iter().chain(builtins.iter()) {
        if let Some(hook) = &plugin.on_response {
            if hook(content, ctx, route)? {
                debug!(plugin = %plugin.name(), "response claimed");
                return Ok(());
            }
        }
    }
    Err(PageError::UnhandledResponse)
}
