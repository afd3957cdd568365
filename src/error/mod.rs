//! Error taxonomy and the top-level classifier.
//!
//! Three outcomes exist (no-route-match is not an error; it is the engine's
//! pass-through signal): a [`PageError::BadRequest`] is client-attributable
//! and surfaces as a 400 with the raw message; every other failure is
//! server-attributable and surfaces as a 500 carrying a diagnostic HTML
//! document. No stage recovers from a lower stage's failure — the engine's
//! catch point is the only place [`classify`] runs.

use std::error::Error as _;
use std::fmt::Write as _;
use std::path::PathBuf;

use thiserror::Error;
use tracing::error;

use crate::app::Config;
use crate::http::{PageResponse, StatusCode};

/// A failure raised anywhere in context building, accumulation, rendering,
/// composition, or response negotiation.
#[derive(Debug, Error)]
pub enum PageError {
    /// Client-attributable failure; surfaces as a 400 with the raw message.
    #[error("{0}")]
    BadRequest(String),

    /// A registry lookup found no function under the given key.
    #[error("no function registered under `{0}`")]
    UnknownSymbol(String),

    /// A middleware or loader failed; aborts the whole request.
    #[error("loader `{key}` failed: {source}")]
    Loader {
        key: String,
        #[source]
        source: Box<PageError>,
    },

    /// A render pass over the given source failed.
    #[error("render of `{path}` failed: {source}")]
    Render {
        path: PathBuf,
        #[source]
        source: Box<PageError>,
    },

    /// The response phase ran out of strategies, built-ins included.
    #[error("no plugin handled the response")]
    UnhandledResponse,

    /// A failure with no more specific classification.
    #[error("{0}")]
    Message(String),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

impl PageError {
    /// Creates an unclassified pipeline failure from a message.
    pub fn msg(message: impl Into<String>) -> Self {
        Self::Message(message.into())
    }

    /// Creates a client-attributable failure from a message.
    pub fn bad_request(message: impl Into<String>) -> Self {
        Self::BadRequest(message.into())
    }
}

/// Classifies a pipeline failure and emits the matching error response.
///
/// `BadRequest` becomes a 400 carrying the raw message; everything else
/// becomes a 500 carrying a diagnostic HTML document built by
/// [`diagnostic_page`]. Any pending emission on the facade is replaced.
pub fn classify(err: &PageError, config: &Config, response: &mut PageResponse) {
    error!(error = %err, "request pipeline failed");
    match err {
        PageError::BadRequest(message) => {
            response.html(StatusCode::BadRequest, message.clone());
        }
        other => {
            response.html(StatusCode::InternalServerError, diagnostic_page(other, config));
        }
    }
}

/// Renders the 500 diagnostic document: the failure message (with a registry
/// hint when it points at a missing symbol) plus the redacted source chain.
pub fn diagnostic_page(err: &PageError, config: &Config) -> String {
    let message = hint(&redact(&err.to_string(), config));
    let mut trace = String::new();
    let mut source = err.source();
    while let Some(frame) = source {
        let _ = writeln!(trace, "caused by: {}", redact(&frame.to_string(), config));
        source = frame.source();
    }
    format!(
        "<html><body><h1>pageflow error</h1><pre><code>{message}\n{trace}</code></pre></body></html>"
    )
}

// A missing registry symbol usually means a forgotten registration; say so.
fn hint(message: &str) -> String {
    if message.contains("no function registered") {
        format!("{message} - are you referencing a symbol missing from the function registry?")
    } else {
        message.to_owned()
    }
}

// Rewrite the installation root to a relative placeholder and strip the
// hooks-directory marker so diagnostics never leak absolute filesystem layout.
fn redact(text: &str, config: &Config) -> String {
    let mut out = text.to_owned();
    if let Some(root) = config.pages_root.to_str() {
        if !root.is_empty() {
            let base = config
                .pages_root
                .file_name()
                .map(|name| format!("/{}", name.to_string_lossy()))
                .unwrap_or_else(|| "/".to_owned());
            out = out.replace(root, &base);
        }
    }
    if let Some(marker) = &config.hooks_marker {
        out = out.replace(marker.as_str(), "");
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;

    fn config() -> Config {
        Config {
            pages_root: "/srv/app/pb_hooks/pages".into(),
            hooks_marker: Some("/srv/app/pb_hooks".into()),
            dev: false,
        }
    }

    #[test]
    fn bad_request_maps_to_400_with_raw_message() {
        let mut response = PageResponse::new();
        classify(
            &PageError::bad_request("missing form field `email`"),
            &config(),
            &mut response,
        );
        assert_eq!(response.status(), Some(StatusCode::BadRequest));
        assert_eq!(
            response.body(),
            Some(&crate::http::Body::Html("missing form field `email`".into()))
        );
    }

    #[test]
    fn other_failures_map_to_500_diagnostic() {
        let mut response = PageResponse::new();
        classify(&PageError::msg("boom"), &config(), &mut response);
        assert_eq!(response.status(), Some(StatusCode::InternalServerError));
        let Some(crate::http::Body::Html(body)) = response.body() else {
            panic!("expected HTML diagnostic");
        };
        assert!(body.contains("boom"));
        assert!(body.contains("<h1>pageflow error</h1>"));
    }

    #[test]
    fn diagnostic_includes_source_chain() {
        let err = PageError::Loader {
            key: "load-posts".into(),
            source: Box::new(PageError::msg("boom")),
        };
        let page = diagnostic_page(&err, &config());
        assert!(page.contains("loader `load-posts` failed: boom"));
        assert!(page.contains("caused by: boom"));
    }

    #[test]
    fn pages_root_rewritten_to_basename() {
        let err = PageError::msg("render of `/srv/app/pb_hooks/pages/blog/post.ejs` failed");
        let page = diagnostic_page(&err, &config());
        assert!(page.contains("/pages/blog/post.ejs"));
        assert!(!page.contains("/srv/app"));
    }

    #[test]
    fn hooks_marker_stripped() {
        let err = PageError::msg("bad import at /srv/app/pb_hooks/util.js");
        let page = diagnostic_page(&err, &config());
        assert!(page.contains("at /util.js"));
        assert!(!page.contains("pb_hooks"));
    }

    #[test]
    fn missing_symbol_gets_hint() {
        let page = diagnostic_page(&PageError::UnknownSymbol("site-nav".into()), &config());
        assert!(page.contains("no function registered under `site-nav`"));
        assert!(page.contains("missing from the function registry"));
    }

    #[test]
    fn unrelated_message_gets_no_hint() {
        let page = diagnostic_page(&PageError::msg("boom"), &config());
        assert!(!page.contains("function registry?"));
    }
}
