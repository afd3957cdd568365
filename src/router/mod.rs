//! Route table and path resolution.
//!
//! A [`Route`] describes one file-backed endpoint as an ordered sequence of
//! [`Segment`]s. Three segment kinds exist:
//!
//! | Pattern segment | Example match        | Captured params            |
//! |-----------------|----------------------|----------------------------|
//! | `blog`          | `/blog`              | *(none)*                   |
//! | `:slug`         | `/blog/hello`        | `slug → "hello"`           |
//! | `*rest`         | `/docs/a/b`          | `rest → ["a", "b"]`        |
//!
//! [`RouteTable::resolve`] tests every route and picks the most specific
//! match: static segments outrank dynamic segments, which outrank catch-all
//! segments, compared left to right. Ties resolve to table order. Trailing
//! slashes are normalized, so `/blog/` and `/blog` are equivalent.
//!
//! The table is built once at startup and is read-only afterwards; resolution
//! takes `&self` and is safe for unsynchronized concurrent reads.

use std::collections::HashMap;
use std::path::{Path, PathBuf};

use crate::context::{ParamValue, Params};

/// One path component of a route pattern.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Segment {
    /// Matches one path segment exactly (case-sensitive).
    Static(String),
    /// Matches any single non-empty path segment, bound under the given name.
    Dynamic(String),
    /// Matches the remainder of the path (zero or more segments), bound as an
    /// array under the given name. Always the last segment of a pattern.
    CatchAll(String),
}

impl Segment {
    // Specificity rank: lower is more specific.
    fn rank(&self) -> u8 {
        match self {
            Self::Static(_) => 0,
            Self::Dynamic(_) => 1,
            Self::CatchAll(_) => 2,
        }
    }
}

/// A file-backed endpoint definition.
///
/// Middleware and loader entries are registry keys resolved at request time
/// against the application's function registry; layouts are template source
/// paths ordered innermost first.
#[derive(Debug, Clone)]
pub struct Route {
    pub segments: Vec<Segment>,
    /// Absolute source location of the backing file.
    pub absolute_path: PathBuf,
    /// Source location relative to the pages root.
    pub relative_path: PathBuf,
    /// Serve the backing file as-is, bypassing the pipeline.
    pub is_static: bool,
    /// Prefix for resolving relative asset references from this route.
    pub asset_prefix: String,
    /// Content-addressed token for cache-busting asset URLs.
    pub fingerprint: Option<String>,
    /// Registry keys of middlewares to run, in order, before loaders.
    pub middlewares: Vec<String>,
    /// Loader registry keys by method name, plus the generic key `load`.
    pub loaders: HashMap<String, String>,
    /// Layout template sources, innermost first.
    pub layouts: Vec<PathBuf>,
}

impl Route {
    /// Creates a pipeline route from a pattern string and its backing source.
    ///
    /// Pattern segments starting with `:` are dynamic captures; segments
    /// starting with `*` are catch-all captures.
    pub fn new(pattern: &str, absolute_path: impl Into<PathBuf>) -> Self {
        Self {
            segments: parse_pattern(pattern),
            absolute_path: absolute_path.into(),
            relative_path: PathBuf::new(),
            is_static: false,
            asset_prefix: String::new(),
            fingerprint: None,
            middlewares: Vec::new(),
            loaders: HashMap::new(),
            layouts: Vec::new(),
        }
    }

    /// Sets the source path relative to the pages root.
    #[must_use]
    pub fn relative_path(mut self, path: impl Into<PathBuf>) -> Self {
        self.relative_path = path.into();
        self
    }

    /// Marks the route as a static file, served without running the pipeline.
    #[must_use]
    pub fn static_file(mut self) -> Self {
        self.is_static = true;
        self
    }

    /// Sets the asset prefix used by the context's `asset` helper.
    #[must_use]
    pub fn asset_prefix(mut self, prefix: impl Into<String>) -> Self {
        self.asset_prefix = prefix.into();
        self
    }

    /// Sets the content fingerprint token.
    #[must_use]
    pub fn fingerprint(mut self, token: impl Into<String>) -> Self {
        self.fingerprint = Some(token.into());
        self
    }

    /// Appends a middleware registry key.
    #[must_use]
    pub fn middleware(mut self, key: impl Into<String>) -> Self {
        self.middlewares.push(key.into());
        self
    }

    /// Registers a loader registry key under a method name (or `load`).
    #[must_use]
    pub fn loader(mut self, method: impl Into<String>, key: impl Into<String>) -> Self {
        self.loaders.insert(method.into(), key.into());
        self
    }

    /// Appends a layout template source (innermost first).
    #[must_use]
    pub fn layout(mut self, path: impl Into<PathBuf>) -> Self {
        self.layouts.push(path.into());
        self
    }

    // Try to match `segments` of a request path, returning captures on success.
    fn matches(&self, path_segments: &[&str]) -> Option<Params> {
        let mut params = Params::new();

        for (i, segment) in self.segments.iter().enumerate() {
            match segment {
                Segment::Static(expected) => {
                    if path_segments.get(i).copied() != Some(expected.as_str()) {
                        return None;
                    }
                }
                Segment::Dynamic(name) => {
                    let value = path_segments.get(i)?;
                    params.insert(name.clone(), ParamValue::Single((*value).to_owned()));
                }
                Segment::CatchAll(name) => {
                    let rest = path_segments[i..]
                        .iter()
                        .map(|s| (*s).to_owned())
                        .collect();
                    params.insert(name.clone(), ParamValue::Many(rest));
                    return Some(params);
                }
            }
        }

        // No catch-all: segment counts must agree exactly.
        if path_segments.len() != self.segments.len() {
            return None;
        }
        Some(params)
    }

    // Left-to-right specificity key; compared lexicographically, lower wins.
    fn specificity(&self) -> Vec<u8> {
        self.segments.iter().map(Segment::rank).collect()
    }
}

/// A successful resolution: the winning route and its extracted parameters.
#[derive(Debug)]
pub struct RouteMatch<'a> {
    pub route: &'a Route,
    pub params: Params,
}

/// An ordered, read-only collection of routes.
#[derive(Debug, Default)]
pub struct RouteTable {
    routes: Vec<Route>,
}

impl RouteTable {
    /// Creates a table from routes in registration order.
    pub fn new(routes: Vec<Route>) -> Self {
        Self { routes }
    }

    /// Returns the number of routes in the table.
    pub fn len(&self) -> usize {
        self.routes.len()
    }

    /// Returns `true` if the table holds no routes.
    pub fn is_empty(&self) -> bool {
        self.routes.is_empty()
    }

    /// Resolves a request path to the most specific matching route.
    ///
    /// Every route is tested; among matches, the specificity ordering
    /// (static > dynamic > catch-all at the first differing position) picks
    /// the winner, and ties fall back to table order. `None` means no route
    /// matched — a pass-through signal for the caller's fallback handler,
    /// not an error.
    pub fn resolve(&self, path: &str) -> Option<RouteMatch<'_>> {
        let path = path.strip_suffix('/').filter(|p| !p.is_empty()).unwrap_or(path);
        let path_segments: Vec<&str> = path.split('/').filter(|s| !s.is_empty()).collect();

        let mut best: Option<(Vec<u8>, RouteMatch<'_>)> = None;
        for route in &self.routes {
            let Some(params) = route.matches(&path_segments) else {
                continue;
            };
            let specificity = route.specificity();
            // Strict comparison keeps the earliest route on ties.
            let better = match &best {
                Some((winner, _)) => specificity < *winner,
                None => true,
            };
            if better {
                best = Some((specificity, RouteMatch { route, params }));
            }
        }
        best.map(|(_, matched)| matched)
    }
}

// `:name` is a dynamic capture, `*name` a catch-all, anything else static.
fn parse_pattern(pattern: &str) -> Vec<Segment> {
    pattern
        .split('/')
        .filter(|s| !s.is_empty())
        .map(|s| {
            if let Some(name) = s.strip_prefix(':') {
                Segment::Dynamic(name.to_owned())
            } else if let Some(name) = s.strip_prefix('*') {
                Segment::CatchAll(name.to_owned())
            } else {
                Segment::Static(s.to_owned())
            }
        })
        .collect()
}

/// Rewrites an asset path's file name to carry a fingerprint token.
///
/// `css/site.css` with token `abc123` becomes `css/site.abc123.css`; a path
/// without an extension gets the token appended after a dot.
pub fn apply_fingerprint(path: &str, fingerprint: Option<&str>) -> String {
    let Some(token) = fingerprint else {
        return path.to_owned();
    };
    let p = Path::new(path);
    match (p.file_stem(), p.extension()) {
        (Some(stem), Some(ext)) => {
            let name = format!(
                "{}.{token}.{}",
                stem.to_string_lossy(),
                ext.to_string_lossy()
            );
            p.with_file_name(name).to_string_lossy().into_owned()
        }
        _ => format!("{path}.{token}"),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn table(patterns: &[&str]) -> RouteTable {
        RouteTable::new(
            patterns
                .iter()
                .map(|p| Route::new(p, format!("/site/pages{p}.ejs")))
                .collect(),
        )
    }

    // ── pattern parsing ───────────────────────────────────────────────────────

    #[test]
    fn pattern_static() {
        let route = Route::new("/blog/archive", "/x");
        assert_eq!(
            route.segments,
            vec![
                Segment::Static("blog".into()),
                Segment::Static("archive".into())
            ]
        );
    }

    #[test]
    fn pattern_dynamic_and_catch_all() {
        let route = Route::new("/docs/:section/*rest", "/x");
        assert_eq!(
            route.segments,
            vec![
                Segment::Static("docs".into()),
                Segment::Dynamic("section".into()),
                Segment::CatchAll("rest".into())
            ]
        );
    }

    // ── matching ──────────────────────────────────────────────────────────────

    #[test]
    fn static_exact_match() {
        let t = table(&["/blog"]);
        assert!(t.resolve("/blog").is_some());
        assert!(t.resolve("/blog/extra").is_none());
        assert!(t.resolve("/other").is_none());
    }

    #[test]
    fn static_match_is_case_sensitive() {
        let t = table(&["/Blog"]);
        assert!(t.resolve("/Blog").is_some());
        assert!(t.resolve("/blog").is_none());
    }

    #[test]
    fn trailing_slash_normalized() {
        let t = table(&["/blog"]);
        assert!(t.resolve("/blog/").is_some());
    }

    #[test]
    fn dynamic_binds_value() {
        let t = table(&["/blog/:slug"]);
        let m = t.resolve("/blog/hello").unwrap();
        assert_eq!(m.params.get("slug"), Some(&ParamValue::Single("hello".into())));
    }

    #[test]
    fn dynamic_requires_segment() {
        let t = table(&["/blog/:slug"]);
        assert!(t.resolve("/blog").is_none());
        assert!(t.resolve("/blog/a/b").is_none());
    }

    #[test]
    fn catch_all_binds_remainder_as_array() {
        let t = table(&["/docs/*rest"]);
        let m = t.resolve("/docs/guide/intro").unwrap();
        assert_eq!(
            m.params.get("rest"),
            Some(&ParamValue::Many(vec!["guide".into(), "intro".into()]))
        );
    }

    #[test]
    fn catch_all_matches_zero_segments() {
        let t = table(&["/docs/*rest"]);
        let m = t.resolve("/docs").unwrap();
        assert_eq!(m.params.get("rest"), Some(&ParamValue::Many(vec![])));
    }

    #[test]
    fn root_path_resolves() {
        let t = table(&["/"]);
        assert!(t.resolve("/").is_some());
    }

    // ── specificity ───────────────────────────────────────────────────────────

    #[test]
    fn static_beats_dynamic() {
        let t = table(&["/blog/:slug", "/blog/archive"]);
        let m = t.resolve("/blog/archive").unwrap();
        assert_eq!(m.route.segments[1], Segment::Static("archive".into()));
    }

    #[test]
    fn dynamic_beats_catch_all() {
        let t = table(&["/docs/*rest", "/docs/:page"]);
        let m = t.resolve("/docs/intro").unwrap();
        assert_eq!(m.route.segments[1], Segment::Dynamic("page".into()));
    }

    #[test]
    fn first_differing_position_decides() {
        // [static, dynamic] vs [dynamic, static]: position 0 decides.
        let t = table(&["/:kind/posts", "/blog/:slug"]);
        let m = t.resolve("/blog/posts").unwrap();
        assert_eq!(m.route.segments[0], Segment::Static("blog".into()));
    }

    #[test]
    fn tie_resolves_to_table_order() {
        let mut first = Route::new("/blog/:slug", "/first");
        first.relative_path = "first".into();
        let second = Route::new("/blog/:name", "/second");
        let t = RouteTable::new(vec![first, second]);
        let m = t.resolve("/blog/hi").unwrap();
        assert_eq!(m.route.absolute_path, PathBuf::from("/first"));
    }

    #[test]
    fn no_match_is_none() {
        let t = table(&["/blog/:slug"]);
        assert!(t.resolve("/shop/cart").is_none());
    }

    // ── fingerprinting ────────────────────────────────────────────────────────

    #[test]
    fn fingerprint_injected_before_extension() {
        assert_eq!(
            apply_fingerprint("css/site.css", Some("abc123")),
            "css/site.abc123.css"
        );
    }

    #[test]
    fn fingerprint_without_extension_appends() {
        assert_eq!(apply_fingerprint("LICENSE", Some("abc")), "LICENSE.abc");
    }

    #[test]
    fn fingerprint_absent_is_identity() {
        assert_eq!(apply_fingerprint("css/site.css", None), "css/site.css");
    }
}
