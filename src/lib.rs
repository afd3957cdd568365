//! # pageflow
//!
//! A file-route-driven page request lifecycle engine.
//!
//! Given an incoming request, pageflow resolves the best route from a frozen
//! route table, builds a per-request context, runs a four-phase plugin
//! pipeline (request hooks, context extension, a deep-merging data
//! accumulator, and a content fold with slot/layout composition), and emits
//! exactly one response. No route matching the path is a pass-through
//! signal, so the host can fall back to its own handling.
//!
//! pageflow is not an HTTP server: the host parses the wire, constructs the
//! [`http::PageRequest`] facade, calls [`handle`], and serializes the
//! resulting [`http::PageResponse`]. Each request is one synchronous
//! execution; the frozen [`App`] is safe for unsynchronized concurrent
//! reads, so hosts may dispatch requests onto any execution units they like.
//!
//! ## Quick Start
//!
//! ```rust
//! use pageflow::{AppBuilder, Outcome, Route, handle};
//! use pageflow::http::{Method, PageRequest};
//! use serde_json::json;
//!
//! let app = AppBuilder::new("/site/pages")
//!     .route(Route::new("/blog/:slug", "/site/pages/blog/[slug].ejs").loader("load", "post"))
//!     .function("post", |ctx| {
//!         Ok(json!({ "slug": ctx.params.get_str("slug") }))
//!     })
//!     .build();
//!
//! match handle(&app, PageRequest::new(Method::Get, "/blog/hello")) {
//!     Outcome::Response(response) => assert!(response.is_emitted()),
//!     Outcome::Passthrough(_) => unreachable!("the route matches"),
//! }
//! ```

pub mod app;
pub mod context;
pub mod data;
pub mod engine;
pub mod error;
pub mod http;
pub mod plugin;
pub mod registry;
pub mod render;
pub mod router;
pub mod slots;

// ── Convenience re-exports ────────────────────────────────────────────────────
pub use app::{App, AppBuilder, Config, Globals};
pub use context::{Extensions, ParamValue, Params, RedirectOptions, RequestContext};
pub use engine::{Outcome, handle};
pub use error::PageError;
pub use http::{Headers, Method, PageRequest, PageResponse, StatusCode};
pub use plugin::Plugin;
pub use render::{TemplateRenderer, renderer_plugin};
pub use router::{Route, RouteMatch, RouteTable, Segment};
pub use slots::parse_slots;
