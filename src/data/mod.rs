//! The data accumulator.
//!
//! Middlewares and loaders each return a partial data object; the accumulator
//! deep-merges them, in order, into the context's `data` field. Nested
//! objects merge recursively; on a scalar or array conflict the later writer
//! wins. Any failure aborts the whole request — there is no partial-success
//! mode.

use serde_json::Value;
use tracing::debug;

use crate::context::RequestContext;
use crate::error::PageError;

/// Deep-merges `incoming` into `target`.
///
/// Two objects merge key-by-key, recursively. Any other pairing replaces
/// `target` with `incoming`. Merging is associative in application order for
/// non-conflicting keys, so folding loader outputs one at a time matches
/// merging them in one combined pass.
pub fn deep_merge(target: &mut Value, incoming: Value) {
    match (target, incoming) {
        (Value::Object(target_map), Value::Object(incoming_map)) => {
            for (key, value) in incoming_map {
                match target_map.get_mut(&key) {
                    Some(existing) => deep_merge(existing, value),
                    None => {
                        target_map.insert(key, value);
                    }
                }
            }
        }
        (target, incoming) => *target = incoming,
    }
}

/// Runs the route's middlewares, then its loaders, merging every partial
/// result into the context's accumulator.
///
/// Loader lookup order is the generic key `load`, the lowercase method name,
/// then the verbatim method name when it differs from the lowercase form.
/// The first failing function aborts the run; a `BadRequest` failure is
/// passed through unwrapped so it keeps its client-fault classification.
pub fn run_accumulator(ctx: &mut RequestContext<'_>) -> Result<(), PageError> {
    let app = ctx.app();
    let route = ctx.route();

    for key in &route.middlewares {
        debug!(middleware = %key, "executing middleware");
        let function = app.registry().require(key).map_err(|e| wrap(key, e))?;
        let partial = function(ctx).map_err(|e| wrap(key, e))?;
        deep_merge(&mut ctx.data, partial);
    }

    let lower = ctx.request().method().loader_key();
    let verbatim = ctx.request().method().as_str().to_owned();
    let mut method_keys = vec!["load".to_owned(), lower.clone()];
    if verbatim != lower {
        method_keys.push(verbatim);
    }

    for method_key in &method_keys {
        let Some(key) = route.loaders.get(method_key) else {
            continue;
        };
        debug!(loader = %key, method = %method_key, "executing loader");
        let function = app.registry().require(key).map_err(|e| wrap(key, e))?;
        let partial = function(ctx).map_err(|e| wrap(key, e))?;
        deep_merge(&mut ctx.data, partial);
    }

    debug!(data = %ctx.data, "accumulator complete");
    Ok(())
}

// Wrap pipeline failures with the failing key; client faults pass through.
fn wrap(key: &str, err: PageError) -> PageError {
    match err {
        bad @ PageError::BadRequest(_) => bad,
        other => PageError::Loader {
            key: key.to_owned(),
            source: Box::new(other),
        },
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn merge_disjoint_objects() {
        let mut target = json!({"a": 1});
        deep_merge(&mut target, json!({"b": 2}));
        assert_eq!(target, json!({"a": 1, "b": 2}));
    }

    #[test]
    fn merge_nested_objects_recursively() {
        let mut target = json!({"site": {"title": "Home", "nav": ["a"]}});
        deep_merge(&mut target, json!({"site": {"lang": "en"}}));
        assert_eq!(
            target,
            json!({"site": {"title": "Home", "nav": ["a"], "lang": "en"}})
        );
    }

    #[test]
    fn later_writer_wins_on_scalar_conflict() {
        let mut target = json!({"count": 1});
        deep_merge(&mut target, json!({"count": 2}));
        assert_eq!(target, json!({"count": 2}));
    }

    #[test]
    fn later_writer_wins_on_array_conflict() {
        let mut target = json!({"tags": ["a", "b"]});
        deep_merge(&mut target, json!({"tags": ["c"]}));
        assert_eq!(target, json!({"tags": ["c"]}));
    }

    #[test]
    fn object_replaces_scalar() {
        let mut target = json!({"user": "anonymous"});
        deep_merge(&mut target, json!({"user": {"id": 7}}));
        assert_eq!(target, json!({"user": {"id": 7}}));
    }

    #[test]
    fn sequential_merge_matches_combined_pass() {
        let parts = [json!({"a": 1}), json!({"b": {"c": 2}}), json!({"b": {"d": 3}})];

        let mut sequential = json!({});
        for part in &parts {
            deep_merge(&mut sequential, part.clone());
        }

        let mut combined = json!({});
        let mut pass = json!({});
        for part in &parts {
            deep_merge(&mut pass, part.clone());
        }
        deep_merge(&mut combined, pass);

        assert_eq!(sequential, combined);
        assert_eq!(sequential, json!({"a": 1, "b": {"c": 2, "d": 3}}));
    }
}
