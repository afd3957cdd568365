//! Template renderer boundary.
//!
//! The engine never renders templates itself; a [`TemplateRenderer`] is the
//! external collaborator that turns a source file plus the request context
//! into text. [`renderer_plugin`] adapts a renderer into an `on_render`
//! plugin so rendering participates in the content fold like any other
//! content producer.

use std::path::Path;
use std::sync::Arc;

use crate::context::RequestContext;
use crate::error::PageError;
use crate::plugin::Plugin;

/// Turns a template source plus a request context into text.
///
/// Implementations are treated as pure: same source and context, same
/// output. The context exposes the accumulator (`ctx.data`), the slot state,
/// and the derived helpers for templates to call.
pub trait TemplateRenderer: Send + Sync {
    fn render(&self, source: &Path, ctx: &RequestContext<'_>) -> Result<String, PageError>;
}

impl<F> TemplateRenderer for F
where
    F: Fn(&Path, &RequestContext<'_>) -> Result<String, PageError> + Send + Sync,
{
    fn render(&self, source: &Path, ctx: &RequestContext<'_>) -> Result<String, PageError> {
        self(source, ctx)
    }
}

/// Wraps a renderer as an `on_render` plugin.
///
/// The hook renders the pass's source file and returns its output as the new
/// running content; failures are wrapped with the source path (client faults
/// pass through unwrapped).
pub fn renderer_plugin(name: impl Into<String>, renderer: impl TemplateRenderer + 'static) -> Plugin {
    let renderer = Arc::new(renderer);
    Plugin::new(name).on_render(move |_content, ctx, _route, source, _plugins| {
        let rendered = renderer.render(source, ctx).map_err(|err| match err {
            bad @ PageError::BadRequest(_) => bad,
            other => PageError::Render {
                path: source.to_path_buf(),
                source: Box::new(other),
            },
        })?;
        Ok(Some(rendered))
    })
}
