//! Response side of the facade.
//!
//! A [`PageResponse`] accumulates headers, cookies, and raw writes during the
//! pipeline, and records the single response emission (HTML, JSON, redirect,
//! or file transfer) for the host to serialize onto its transport.

use std::fmt;
use std::path::PathBuf;

use bytes::BytesMut;
use percent_encoding::{AsciiSet, CONTROLS, utf8_percent_encode};
use serde_json::Value;

use super::{Headers, StatusCode};

// Characters that must be escaped inside a cookie value octet.
const COOKIE_VALUE: &AsciiSet = &CONTROLS
    .add(b' ')
    .add(b'"')
    .add(b',')
    .add(b';')
    .add(b'\\')
    .add(b'%');

/// Attributes for a `Set-Cookie` header.
///
/// `path` defaults to `/`; everything else is off unless set.
#[derive(Debug, Clone)]
pub struct CookieOptions {
    pub path: String,
    pub domain: Option<String>,
    pub max_age: Option<i64>,
    pub secure: bool,
    pub http_only: bool,
    pub same_site: Option<SameSite>,
}

impl Default for CookieOptions {
    fn default() -> Self {
        Self {
            path: "/".to_owned(),
            domain: None,
            max_age: None,
            secure: false,
            http_only: false,
            same_site: None,
        }
    }
}

/// The `SameSite` cookie attribute.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SameSite {
    Strict,
    Lax,
    None,
}

impl fmt::Display for SameSite {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Self::Strict => "Strict",
            Self::Lax => "Lax",
            Self::None => "None",
        })
    }
}

/// The payload of an emitted response.
#[derive(Debug, Clone, PartialEq)]
pub enum Body {
    /// An HTML document.
    Html(String),
    /// A structured-data document.
    Json(Value),
    /// Redirect to the given location (`Location` header value).
    Redirect(String),
    /// Transfer the file at the given path; the host performs the I/O.
    File(PathBuf),
}

/// An outgoing response under construction.
///
/// Headers, cookies, and raw writes may accumulate at any point in the
/// pipeline; [`html`](Self::html), [`json`](Self::json),
/// [`redirect`](Self::redirect), and [`file`](Self::file) record the
/// emission. The engine guarantees exactly one emission per handled request;
/// the error classifier may replace a pending emission with a diagnostic one.
///
/// # Examples
///
/// ```
/// use pageflow::http::{Body, PageResponse, StatusCode};
///
/// let mut response = PageResponse::new();
/// response.set_header("X-Engine", "pageflow");
/// response.html(StatusCode::Ok, "<h1>hi</h1>");
///
/// assert_eq!(response.status(), Some(StatusCode::Ok));
/// assert_eq!(response.body(), Some(&Body::Html("<h1>hi</h1>".into())));
/// ```
#[derive(Debug, Default)]
pub struct PageResponse {
    headers: Headers,
    raw: BytesMut,
    emitted: Option<(StatusCode, Body)>,
}

impl PageResponse {
    /// Creates an empty response with no headers and no emission.
    pub fn new() -> Self {
        Self::default()
    }

    /// Returns the first value of a response header, if set.
    pub fn header(&self, name: &str) -> Option<&str> {
        self.headers.get(name)
    }

    /// Sets a response header, replacing any existing values for the name.
    pub fn set_header(&mut self, name: impl Into<String>, value: impl Into<String>) {
        self.headers.set(name, value);
    }

    /// Appends a response header, keeping existing values for the name.
    pub fn append_header(&mut self, name: impl Into<String>, value: impl Into<String>) {
        self.headers.append(name, value);
    }

    /// Returns all response headers.
    pub fn headers(&self) -> &Headers {
        &self.headers
    }

    /// Serializes a cookie and appends it as a `Set-Cookie` header.
    ///
    /// String values are written verbatim (percent-escaped where required);
    /// any other JSON value is stringified first, so structured cookies
    /// round-trip through the request facade's JSON decoding.
    ///
    /// Returns the serialized header value.
    pub fn cookie(&mut self, name: &str, value: &Value, options: &CookieOptions) -> String {
        let raw = match value {
            Value::String(s) => s.clone(),
            other => other.to_string(),
        };
        let mut serialized = format!("{name}={}", utf8_percent_encode(&raw, COOKIE_VALUE));
        serialized.push_str(&format!("; Path={}", options.path));
        if let Some(domain) = &options.domain {
            serialized.push_str(&format!("; Domain={domain}"));
        }
        if let Some(max_age) = options.max_age {
            serialized.push_str(&format!("; Max-Age={max_age}"));
        }
        if options.secure {
            serialized.push_str("; Secure");
        }
        if options.http_only {
            serialized.push_str("; HttpOnly");
        }
        if let Some(same_site) = options.same_site {
            serialized.push_str(&format!("; SameSite={same_site}"));
        }
        self.headers.append("Set-Cookie", serialized.clone());
        serialized
    }

    /// Appends text to the raw write channel.
    ///
    /// Raw writes bypass the emission machinery; the host flushes them ahead
    /// of the emitted body.
    pub fn write(&mut self, s: &str) {
        self.raw.extend_from_slice(s.as_bytes());
    }

    /// Returns everything written through [`write`](Self::write) so far.
    pub fn raw_written(&self) -> &[u8] {
        &self.raw
    }

    /// Emits an HTML response.
    pub fn html(&mut self, status: StatusCode, body: impl Into<String>) {
        self.emitted = Some((status, Body::Html(body.into())));
    }

    /// Emits a structured-data response.
    pub fn json(&mut self, status: StatusCode, value: Value) {
        self.emitted = Some((status, Body::Json(value)));
    }

    /// Emits a redirect to `location`.
    pub fn redirect(&mut self, location: impl Into<String>, status: StatusCode) {
        let location = location.into();
        self.headers.set("Location", location.clone());
        self.emitted = Some((status, Body::Redirect(location)));
    }

    /// Emits a static file transfer; the host performs the actual I/O.
    pub fn file(&mut self, path: impl Into<PathBuf>) {
        self.emitted = Some((StatusCode::Ok, Body::File(path.into())));
    }

    /// Returns `true` once a response has been emitted.
    pub fn is_emitted(&self) -> bool {
        self.emitted.is_some()
    }

    /// Returns the emitted status, if any.
    pub fn status(&self) -> Option<StatusCode> {
        self.emitted.as_ref().map(|(status, _)| *status)
    }

    /// Returns the emitted body, if any.
    pub fn body(&self) -> Option<&Body> {
        self.emitted.as_ref().map(|(_, body)| body)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn starts_unemitted() {
        let response = PageResponse::new();
        assert!(!response.is_emitted());
        assert_eq!(response.status(), None);
        assert_eq!(response.body(), None);
    }

    #[test]
    fn html_emission() {
        let mut response = PageResponse::new();
        response.html(StatusCode::Ok, "<p>ok</p>");
        assert_eq!(response.status(), Some(StatusCode::Ok));
        assert_eq!(response.body(), Some(&Body::Html("<p>ok</p>".into())));
    }

    #[test]
    fn json_emission() {
        let mut response = PageResponse::new();
        response.json(StatusCode::Ok, json!({"a": 1}));
        assert_eq!(response.body(), Some(&Body::Json(json!({"a": 1}))));
    }

    #[test]
    fn redirect_sets_location_header() {
        let mut response = PageResponse::new();
        response.redirect("/login", StatusCode::Found);
        assert_eq!(response.status(), Some(StatusCode::Found));
        assert_eq!(response.header("location"), Some("/login"));
    }

    #[test]
    fn cookie_defaults_to_root_path() {
        let mut response = PageResponse::new();
        let serialized = response.cookie("session", &json!("abc123"), &CookieOptions::default());
        assert_eq!(serialized, "session=abc123; Path=/");
        assert_eq!(response.header("set-cookie"), Some("session=abc123; Path=/"));
    }

    #[test]
    fn cookie_structured_value_stringified() {
        let mut response = PageResponse::new();
        let serialized = response.cookie(
            "prefs",
            &json!({"wide": true}),
            &CookieOptions::default(),
        );
        // `{`/`}` pass through; `"` and `,` are escaped.
        assert!(serialized.starts_with("prefs={%22wide%22:true}"));
    }

    #[test]
    fn cookie_full_attributes() {
        let mut response = PageResponse::new();
        let options = CookieOptions {
            path: "/app".into(),
            domain: Some("example.com".into()),
            max_age: Some(3600),
            secure: true,
            http_only: true,
            same_site: Some(SameSite::Lax),
        };
        let serialized = response.cookie("id", &json!("x"), &options);
        assert_eq!(
            serialized,
            "id=x; Path=/app; Domain=example.com; Max-Age=3600; Secure; HttpOnly; SameSite=Lax"
        );
    }

    #[test]
    fn raw_writes_accumulate() {
        let mut response = PageResponse::new();
        response.write("one");
        response.write(" two");
        assert_eq!(response.raw_written(), b"one two");
    }

    #[test]
    fn classifier_may_replace_emission() {
        let mut response = PageResponse::new();
        response.html(StatusCode::Ok, "partial");
        response.html(StatusCode::InternalServerError, "diagnostic");
        assert_eq!(response.status(), Some(StatusCode::InternalServerError));
    }
}
