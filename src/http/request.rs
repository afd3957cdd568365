//! Request side of the facade.
//!
//! A [`PageRequest`] is constructed by the host from whatever transport it
//! runs on and handed to the engine; the engine never parses wire bytes.
//! Cookie access is lazy: the `Cookie` header is parsed at most once per
//! request, and each value is best-effort decoded as JSON, falling back to
//! the raw string.

use std::cell::OnceCell;
use std::collections::HashMap;

use bytes::Bytes;
use percent_encoding::percent_decode_str;
use serde_json::Value;

use super::{Headers, Method};

/// An incoming request as seen by the engine.
///
/// # Examples
///
/// ```
/// use pageflow::http::{Method, PageRequest};
///
/// let request = PageRequest::new(Method::Get, "/blog/hello?draft=1")
///     .header("Cookie", "theme=dark; prefs={\"wide\":true}");
///
/// assert_eq!(request.path(), "/blog/hello");
/// assert_eq!(request.query_param("draft"), Some("1"));
/// assert_eq!(request.cookie("theme"), Some(&"dark".into()));
/// assert_eq!(request.cookie("prefs").unwrap()["wide"], true);
/// ```
#[derive(Debug)]
pub struct PageRequest {
    method: Method,
    path: String,
    query: Option<String>,
    query_params: HashMap<String, String>,
    headers: Headers,
    body: Bytes,
    // Parsed on first access, never re-parsed.
    cookies: OnceCell<HashMap<String, Value>>,
}

impl PageRequest {
    /// Creates a request from a method and a URL path, splitting off any
    /// query string after the first `?`.
    pub fn new(method: Method, url: &str) -> Self {
        let (path, query) = match url.find('?') {
            Some(pos) => (url[..pos].to_owned(), Some(url[pos + 1..].to_owned())),
            None => (url.to_owned(), None),
        };
        let query_params = query.as_deref().map(parse_query_string).unwrap_or_default();

        Self {
            method,
            path,
            query,
            query_params,
            headers: Headers::new(),
            body: Bytes::new(),
            cookies: OnceCell::new(),
        }
    }

    /// Appends a request header.
    #[must_use]
    pub fn header(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
        self.headers.append(name, value);
        self
    }

    /// Sets the request body.
    #[must_use]
    pub fn body_bytes(mut self, body: impl Into<Bytes>) -> Self {
        self.body = body.into();
        self
    }

    /// Returns the request method.
    pub fn method(&self) -> &Method {
        &self.method
    }

    /// Returns the request path (without the query string).
    pub fn path(&self) -> &str {
        &self.path
    }

    /// Returns the raw query string (without the leading `?`), if any.
    pub fn query_string(&self) -> Option<&str> {
        self.query.as_deref()
    }

    /// Returns a parsed query parameter value by key.
    pub fn query_param(&self, key: &str) -> Option<&str> {
        self.query_params.get(key).map(String::as_str)
    }

    /// Returns the request headers.
    pub fn headers(&self) -> &Headers {
        &self.headers
    }

    /// Returns the raw body bytes.
    pub fn body(&self) -> &Bytes {
        &self.body
    }

    /// Deserializes the body as JSON.
    pub fn json<T>(&self) -> Result<T, serde_json::Error>
    where
        T: serde::de::DeserializeOwned,
    {
        serde_json::from_slice(&self.body)
    }

    /// Parses the body as `application/x-www-form-urlencoded` form data.
    pub fn form(&self) -> HashMap<String, String> {
        std::str::from_utf8(&self.body)
            .map(parse_query_string)
            .unwrap_or_default()
    }

    /// Returns a cookie value by name.
    ///
    /// The `Cookie` header is parsed once, on first access. Values that parse
    /// as JSON are decoded; anything else is kept as a string `Value`.
    pub fn cookie(&self, name: &str) -> Option<&Value> {
        self.parsed_cookies().get(name)
    }

    /// Returns the full cookie map, parsing the `Cookie` header if needed.
    pub fn cookies(&self) -> &HashMap<String, Value> {
        self.parsed_cookies()
    }

    fn parsed_cookies(&self) -> &HashMap<String, Value> {
        self.cookies.get_or_init(|| {
            let header = self.headers.get("cookie").unwrap_or("");
            parse_cookie_header(header)
        })
    }
}

/// Parses a URL query string (`key=value&key2=value2`) into a map.
///
/// Keys and values are urlencoded-decoded: `+` is a space and `%XX` escapes
/// are resolved, so `%2B` still yields a literal `+`.
fn parse_query_string(query: &str) -> HashMap<String, String> {
    query
        .split('&')
        .filter(|pair| !pair.is_empty())
        .filter_map(|pair| {
            let mut parts = pair.splitn(2, '=');
            let key = decode_component(parts.next()?);
            let value = decode_component(parts.next().unwrap_or(""));
            Some((key, value))
        })
        .collect()
}

// Invalid escapes and non-UTF-8 decodes are kept as-is rather than rejected.
fn decode_component(raw: &str) -> String {
    let plus_decoded = raw.replace('+', " ");
    match percent_decode_str(&plus_decoded).decode_utf8() {
        Ok(decoded) => decoded.into_owned(),
        Err(_) => plus_decoded,
    }
}

// Cookie pairs are `name=value` separated by `;`. The value is
// percent-decoded (the response side escapes on write), then a value that
// parses as a JSON document is decoded; everything else stays a string.
fn parse_cookie_header(header: &str) -> HashMap<String, Value> {
    header
        .split(';')
        .filter_map(|pair| {
            let mut parts = pair.splitn(2, '=');
            let name = parts.next()?.trim();
            if name.is_empty() {
                return None;
            }
            let raw = parts.next()?.trim();
            let decoded = match percent_decode_str(raw).decode_utf8() {
                Ok(decoded) => decoded.into_owned(),
                Err(_) => raw.to_owned(),
            };
            let value = match serde_json::from_str::<Value>(&decoded) {
                Ok(value) => value,
                Err(_) => Value::String(decoded),
            };
            Some((name.to_owned(), value))
        })
        .collect()
}
