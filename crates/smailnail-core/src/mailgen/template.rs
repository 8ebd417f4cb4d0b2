//! A small `{{ ... }}` template language.
//!
//! Supported actions:
//! - `{{ .path.to.value }}` inserts a string from the context,
//! - `{{ pickRandom .path.to.list }}` inserts a random list element.
//!
//! Pipelines, arguments and any other function are rejected.

use std::collections::BTreeMap;

use rand::{Rng, RngCore};
use rand::seq::SliceRandom;

use crate::error::{Error, Result};

/// A context value.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Value {
    /// A string.
    Text(String),
    /// A list of strings.
    List(Vec<String>),
    /// Nested values.
    Map(BTreeMap<String, Value>),
}

impl From<&str> for Value {
    fn from(s: &str) -> Self {
        Self::Text(s.to_string())
    }
}

impl From<String> for Value {
    fn from(s: String) -> Self {
        Self::Text(s)
    }
}

/// Values visible to a template, addressed by dotted paths.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Context {
    root: BTreeMap<String, Value>,
}

impl Context {
    /// An empty context.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Sets a top-level key, replacing any previous value.
    pub fn insert(&mut self, key: impl Into<String>, value: impl Into<Value>) {
        self.root.insert(key.into(), value.into());
    }

    fn lookup(&self, path: &str) -> Result<&Value> {
        let Some(rest) = path.strip_prefix('.').filter(|r| !r.is_empty()) else {
            return Err(Error::Template(format!("invalid path {path:?}")));
        };
        let mut keys = rest.split('.');
        let first = keys.next().unwrap_or_default();
        let mut current = self
            .root
            .get(first)
            .ok_or_else(|| Error::Template(format!("no value for {path}")))?;
        for key in keys {
            current = match current {
                Value::Map(map) => map.get(key),
                _ => None,
            }
            .ok_or_else(|| Error::Template(format!("no value for {path}")))?;
        }
        Ok(current)
    }
}

/// Renders `template` against `context`, drawing randomness from `rng`.
///
/// # Errors
///
/// Returns [`Error::Template`] for unclosed actions, unknown functions,
/// missing keys, and paths that do not name a string.
pub fn render<R: Rng + ?Sized>(template: &str, context: &Context, rng: &mut R) -> Result<String> {
    let mut rng = rng;
    let rng: &mut dyn RngCore = &mut rng;
    expand(template, context, Some(rng))
}

/// Renders a template that may only substitute paths.
///
/// # Errors
///
/// As [`render`]; `pickRandom` is also rejected.
pub fn render_plain(template: &str, context: &Context) -> Result<String> {
    expand(template, context, None)
}

fn expand(
    template: &str,
    context: &Context,
    mut rng: Option<&mut (dyn RngCore + '_)>,
) -> Result<String> {
    let mut out = String::with_capacity(template.len());
    let mut rest = template;
    while let Some(start) = rest.find("{{") {
        out.push_str(&rest[..start]);
        let after = &rest[start + 2..];
        let end = after
            .find("}}")
            .ok_or_else(|| Error::Template("unclosed action".to_string()))?;
        out.push_str(&evaluate(after[..end].trim(), context, rng.as_deref_mut())?);
        rest = &after[end + 2..];
    }
    out.push_str(rest);
    Ok(out)
}

fn evaluate(
    action: &str,
    context: &Context,
    rng: Option<&mut (dyn RngCore + '_)>,
) -> Result<String> {
    let words: Vec<&str> = action.split_whitespace().collect();
    match words.as_slice() {
        [path] if path.starts_with('.') => match context.lookup(path)? {
            Value::Text(s) => Ok(s.clone()),
            Value::List(_) => Err(Error::Template(format!(
                "{path} is a list; use pickRandom {path}"
            ))),
            Value::Map(_) => Err(Error::Template(format!("{path} is a map"))),
        },
        ["pickRandom", path] => {
            let rng = rng.ok_or_else(|| {
                Error::Template("pickRandom is not available in this template".to_string())
            })?;
            match context.lookup(path)? {
                Value::List(items) => items.choose(rng).cloned().ok_or_else(|| {
                    Error::Template(format!("cannot pick from empty list {path}"))
                }),
                Value::Text(s) => Ok(s.clone()),
                Value::Map(_) => Err(Error::Template(format!("cannot pick from map {path}"))),
            }
        }
        [] => Err(Error::Template("empty action".to_string())),
        [function, ..] => Err(Error::Template(format!(
            "unknown function or malformed action {function:?}"
        ))),
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use rand::SeedableRng;
    use rand::rngs::StdRng;

    fn context() -> Context {
        let mut vars = BTreeMap::new();
        vars.insert("company".to_string(), Value::from("Acme"));
        vars.insert(
            "names".to_string(),
            Value::List(vec!["Ann".into(), "Bo".into(), "Cy".into()]),
        );
        let mut nested = BTreeMap::new();
        nested.insert("domain".to_string(), Value::from("acme.test"));
        vars.insert("mail".to_string(), Value::Map(nested));

        let mut ctx = Context::new();
        ctx.insert("variables", Value::Map(vars));
        ctx.insert("index", "4");
        ctx
    }

    fn rng() -> StdRng {
        StdRng::seed_from_u64(7)
    }

    #[test]
    fn substitutes_paths() {
        let out = render(
            "Hi from {{ .variables.company }} (#{{.index}}) @{{ .variables.mail.domain }}",
            &context(),
            &mut rng(),
        )
        .unwrap();
        assert_eq!(out, "Hi from Acme (#4) @acme.test");
    }

    #[test]
    fn pick_random_is_seeded() {
        let ctx = context();
        let a = render("{{ pickRandom .variables.names }}", &ctx, &mut rng()).unwrap();
        let b = render("{{ pickRandom .variables.names }}", &ctx, &mut rng()).unwrap();
        assert_eq!(a, b);
        assert!(["Ann", "Bo", "Cy"].contains(&a.as_str()));
    }

    #[test]
    fn errors() {
        let ctx = context();
        for bad in [
            "{{ .variables.missing }}",
            "{{ .variables.names }}",
            "{{ .variables.mail }}",
            "{{ upper .index }}",
            "{{ .index | upper }}",
            "{{ printf \"%s\" .index }}",
            "{{ }}",
            "{{ .index",
            "{{ . }}",
        ] {
            assert!(
                matches!(render(bad, &ctx, &mut rng()), Err(Error::Template(_))),
                "{bad}"
            );
        }
    }

    #[test]
    fn plain_text_passes_through() {
        assert_eq!(
            render("no actions } here {", &Context::new(), &mut rng()).unwrap(),
            "no actions } here {"
        );
    }

    #[test]
    fn plain_rendering_refuses_randomness() {
        let ctx = context();
        assert_eq!(
            render_plain("{{ .variables.company }}-{{ .index }}", &ctx).unwrap(),
            "Acme-4"
        );
        let err = render_plain("{{ pickRandom .variables.names }}", &ctx).unwrap_err();
        assert!(err.to_string().contains("pickRandom is not available"));
    }
}
