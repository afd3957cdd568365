//! Per-request execution context.
//!
//! A [`RequestContext`] is created fresh for every handled request and
//! discarded at response emission; it is never shared between requests. It
//! layers the process-wide read-only capability set ([`crate::app::Globals`]),
//! the request/response facade, the route's extracted [`Params`], the mutable
//! data accumulator, the slot state threaded through layout passes, and the
//! derived helpers (`asset`, `meta`, `resolve`, `redirect`, `echo`).

use std::any::{Any, TypeId};
use std::cell::{RefCell, RefMut};
use std::collections::HashMap;
use std::time::{SystemTime, UNIX_EPOCH};

use percent_encoding::{AsciiSet, CONTROLS, utf8_percent_encode};
use serde_json::Value;

use crate::app::App;
use crate::error::PageError;
use crate::http::{PageRequest, PageResponse, StatusCode};
use crate::router::{Route, Segment, apply_fingerprint};

// Characters escaped in a query-string value (the flash message).
const QUERY_VALUE: &AsciiSet = &CONTROLS
    .add(b' ')
    .add(b'"')
    .add(b'#')
    .add(b'%')
    .add(b'&')
    .add(b'+')
    .add(b'=')
    .add(b'?');

/// Reserved query key carrying a redirect flash message.
pub const FLASH_QUERY_KEY: &str = "__flash";

/// A path parameter value: one segment, or the array a catch-all bound.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ParamValue {
    Single(String),
    Many(Vec<String>),
}

impl ParamValue {
    /// Returns the single captured segment, or `None` for a catch-all value.
    pub fn as_str(&self) -> Option<&str> {
        match self {
            Self::Single(s) => Some(s),
            Self::Many(_) => None,
        }
    }
}

/// Parameters extracted from the matched route; names are unique per route.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Params {
    map: HashMap<String, ParamValue>,
}

impl Params {
    /// Creates an empty parameter map.
    pub fn new() -> Self {
        Self::default()
    }

    /// Binds a parameter value under a name.
    pub fn insert(&mut self, name: String, value: ParamValue) {
        self.map.insert(name, value);
    }

    /// Returns the value bound under `name`.
    pub fn get(&self, name: &str) -> Option<&ParamValue> {
        self.map.get(name)
    }

    /// Returns the single-segment value bound under `name`, if it is one.
    pub fn get_str(&self, name: &str) -> Option<&str> {
        self.map.get(name).and_then(ParamValue::as_str)
    }

    /// Returns the number of bound parameters.
    pub fn len(&self) -> usize {
        self.map.len()
    }

    /// Returns `true` if no parameters are bound.
    pub fn is_empty(&self) -> bool {
        self.map.is_empty()
    }
}

/// Type-erased extension map for fields plugins attach during the
/// `on_extend_context` phase.
///
/// Additions are keyed by type, so plugins stay decoupled: a later plugin can
/// read an earlier plugin's addition by naming its type.
#[derive(Default)]
pub struct Extensions {
    map: HashMap<TypeId, Box<dyn Any>>,
}

impl Extensions {
    /// Creates an empty extensions map.
    pub fn new() -> Self {
        Self::default()
    }

    /// Inserts a value, replacing any existing value of the same type.
    pub fn insert<T: 'static>(&mut self, value: T) {
        self.map.insert(TypeId::of::<T>(), Box::new(value));
    }

    /// Returns a reference to the value of type `T`, if present.
    pub fn get<T: 'static>(&self) -> Option<&T> {
        self.map
            .get(&TypeId::of::<T>())
            .and_then(|value| value.downcast_ref::<T>())
    }

    /// Returns a mutable reference to the value of type `T`, if present.
    pub fn get_mut<T: 'static>(&mut self) -> Option<&mut T> {
        self.map
            .get_mut(&TypeId::of::<T>())
            .and_then(|value| value.downcast_mut::<T>())
    }

    /// Removes and returns the value of type `T`, if present.
    pub fn remove<T: 'static>(&mut self) -> Option<T> {
        self.map
            .remove(&TypeId::of::<T>())
            .and_then(|value| value.downcast::<T>().ok())
            .map(|value| *value)
    }
}

/// Options for the context's `redirect` helper.
#[derive(Debug, Clone)]
pub struct RedirectOptions {
    pub status: StatusCode,
    /// Appended percent-encoded under [`FLASH_QUERY_KEY`] when non-empty.
    pub message: String,
}

impl Default for RedirectOptions {
    fn default() -> Self {
        Self {
            status: StatusCode::Found,
            message: String::new(),
        }
    }
}

/// The per-request execution context handed to plugins, middlewares, loaders,
/// and the template renderer.
pub struct RequestContext<'a> {
    app: &'a App,
    route: &'a Route,
    /// Parameters extracted by route resolution.
    pub params: Params,
    /// The data accumulator; loaders and middlewares deep-merge into it.
    pub data: Value,
    /// The current default slot body, updated between layout passes.
    pub slot: String,
    /// The full slot map from the most recent `parse_slots` pass.
    pub slots: HashMap<String, String>,
    /// Fields attached by `on_extend_context` plugins.
    pub extensions: Extensions,
    request: PageRequest,
    response: RefCell<PageResponse>,
    meta: RefCell<HashMap<String, String>>,
}

impl<'a> RequestContext<'a> {
    /// Assembles a fresh context for one request.
    pub fn new(app: &'a App, route: &'a Route, params: Params, request: PageRequest) -> Self {
        Self {
            app,
            route,
            params,
            data: Value::Object(serde_json::Map::new()),
            slot: String::new(),
            slots: HashMap::new(),
            extensions: Extensions::new(),
            request,
            response: RefCell::new(PageResponse::new()),
            meta: RefCell::new(HashMap::new()),
        }
    }

    /// Returns the application state this request runs against.
    pub fn app(&self) -> &'a App {
        self.app
    }

    /// Returns the matched route.
    pub fn route(&self) -> &'a Route {
        self.route
    }

    /// Returns the request facade.
    pub fn request(&self) -> &PageRequest {
        &self.request
    }

    /// Borrows the response facade mutably.
    ///
    /// The borrow is a `RefCell` guard; hold it only for the duration of one
    /// facade call.
    pub fn response(&self) -> RefMut<'_, PageResponse> {
        self.response.borrow_mut()
    }

    /// Consumes the context and yields the response facade.
    pub fn into_response(self) -> PageResponse {
        self.response.into_inner()
    }

    /// Writes `text` through the facade's raw channel and returns it.
    pub fn echo(&self, text: &str) -> String {
        self.response.borrow_mut().write(text);
        text.to_owned()
    }

    /// Reads a page metadata entry.
    pub fn meta(&self, key: &str) -> Option<String> {
        self.meta.borrow().get(key).cloned()
    }

    /// Writes a page metadata entry.
    pub fn set_meta(&self, key: impl Into<String>, value: impl Into<String>) {
        self.meta.borrow_mut().insert(key.into(), value.into());
    }

    /// Reads a process-wide capability value by key.
    pub fn global(&self, key: &str) -> Option<&Value> {
        self.app.globals().value(key)
    }

    /// Reads a captured environment variable.
    pub fn env(&self, name: &str) -> Option<&str> {
        self.app.globals().env(name)
    }

    /// Emits a redirect to `path`, appending a flash message when one is set.
    ///
    /// The message travels percent-encoded under the reserved `__flash`
    /// query key of the target URL.
    pub fn redirect(&self, path: &str, options: RedirectOptions) {
        let target = if options.message.is_empty() {
            path.to_owned()
        } else {
            let sep = if path.contains('?') { '&' } else { '?' };
            format!(
                "{path}{sep}{FLASH_QUERY_KEY}={}",
                utf8_percent_encode(&options.message, QUERY_VALUE)
            )
        };
        self.response.borrow_mut().redirect(target, options.status);
    }

    /// Resolves a relative asset reference to a URL.
    ///
    /// Absolute references pass through untouched apart from fingerprinting.
    /// Relative references are joined with the route's `asset_prefix`; when
    /// the expanded URL resolves to a fingerprinted route, the token is
    /// injected into the file name. In dev mode, unresolved assets get a
    /// cache-busting `?_r=<millis>` suffix.
    pub fn asset(&self, path: &str) -> String {
        let short = if path.starts_with('/') {
            path.to_owned()
        } else {
            join_url(&self.route.asset_prefix, path)
        };
        let full = if path.starts_with('/') {
            path.to_owned()
        } else {
            let mut parts: Vec<&str> = self
                .route
                .segments
                .iter()
                .take(self.route.segments.len().saturating_sub(1))
                .filter_map(|segment| match segment {
                    Segment::Static(name) => Some(name.as_str()),
                    _ => None,
                })
                .collect();
            if !self.route.asset_prefix.is_empty() {
                parts.push(&self.route.asset_prefix);
            }
            parts.push(path);
            format!("/{}", parts.join("/"))
        };

        match self.app.routes().resolve(&full) {
            Some(found) => apply_fingerprint(&short, found.route.fingerprint.as_deref()),
            None if self.app.config().dev => format!("{short}?_r={}", unix_millis()),
            None => short,
        }
    }

    /// Resolves a function reference against the registry and invokes it.
    ///
    /// References starting with `./` or `../` are normalized against the
    /// route source's directory; anything else is looked up verbatim.
    pub fn resolve(&self, reference: &str) -> Result<Value, PageError> {
        let key = self.resolve_key(reference);
        let function = self.app.registry().require(&key)?;
        function(self)
    }

    // Lexically normalize `./`/`../` references against the source directory.
    fn resolve_key(&self, reference: &str) -> String {
        if !reference.starts_with("./") && !reference.starts_with("../") {
            return reference.to_owned();
        }
        let base = self
            .route
            .absolute_path
            .parent()
            .unwrap_or_else(|| std::path::Path::new(""));
        let mut parts: Vec<&str> = base
            .to_str()
            .unwrap_or_default()
            .split('/')
            .filter(|s| !s.is_empty() && *s != ".")
            .collect();
        for piece in reference.split('/') {
            match piece {
                "" | "." => {}
                ".." => {
                    parts.pop();
                }
                other => parts.push(other),
            }
        }
        format!("/{}", parts.join("/"))
    }
}

fn join_url(prefix: &str, path: &str) -> String {
    let prefix = prefix.trim_end_matches('/');
    if prefix.is_empty() {
        path.to_owned()
    } else {
        format!("{prefix}/{path}")
    }
}

fn unix_millis() -> u128 {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map(|d| d.as_millis())
        .unwrap_or_default()
}
