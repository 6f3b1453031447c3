//! Variable resolution.
//!
//! Replaces every [`AttributeValue::Reference`] with the scalar bound to the
//! referenced variable, and every [`AttributeValue::Template`] (e.g.
//! `"terragoat-aks-${var.environment}"`) with the substituted string.
//! String scalars pass through untouched, `${...}` included.
//!
//! Resolution is a single pass: a variable bound to another variable is
//! rejected rather than followed.

use crate::error::{ResolveError, ResolveResult};
use crate::tree::AttributeTree;
use crate::value::{AttributeValue, Scalar};
use crate::variable::{VariableValue, Variables};
use regex::Regex;
use serde::Serialize;
use std::sync::LazyLock;
use tracing::trace;

// Regex for matching ${...} placeholders, names may be dotted
static VAR_REGEX: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"\$\{([a-zA-Z_][a-zA-Z0-9_-]*(?:\.[a-zA-Z_][a-zA-Z0-9_-]*)*)\}").unwrap()
});

/// An attribute tree that contains no references.
#[derive(Debug, Clone, PartialEq, Default, Serialize)]
#[serde(transparent)]
pub struct ResolvedTree(AttributeTree);

impl ResolvedTree {
    pub fn into_inner(self) -> AttributeTree {
        self.0
    }

    pub(crate) fn new_unchecked(tree: AttributeTree) -> Self {
        Self(tree)
    }

    pub(crate) fn tree_mut(&mut self) -> &mut AttributeTree {
        &mut self.0
    }
}

impl std::ops::Deref for ResolvedTree {
    type Target = AttributeTree;

    fn deref(&self) -> &AttributeTree {
        &self.0
    }
}

impl AsRef<AttributeTree> for ResolvedTree {
    fn as_ref(&self) -> &AttributeTree {
        &self.0
    }
}

/// If `text` is exactly one placeholder (`"${var.environment}"`), return the name.
pub fn whole_reference(text: &str) -> Option<&str> {
    let caps = VAR_REGEX.captures(text)?;
    let whole = caps.get(0)?;
    if whole.start() == 0 && whole.end() == text.len() {
        caps.get(1).map(|m| m.as_str())
    } else {
        None
    }
}

/// True if `text` contains at least one `${name}` placeholder.
pub fn has_placeholder(text: &str) -> bool {
    VAR_REGEX.is_match(text)
}

/// Produce a reference-free copy of `tree`. The input is left untouched.
pub fn resolve(tree: &AttributeTree, variables: &Variables) -> ResolveResult<ResolvedTree> {
    let resolved = resolve_tree(tree, variables)?;
    Ok(ResolvedTree(resolved))
}

fn resolve_tree(tree: &AttributeTree, variables: &Variables) -> ResolveResult<AttributeTree> {
    let mut out = AttributeTree::new();
    for (key, value) in tree.iter() {
        out.insert(key, resolve_value(value, variables)?);
    }
    Ok(out)
}

fn resolve_value(value: &AttributeValue, variables: &Variables) -> ResolveResult<AttributeValue> {
    Ok(match value {
        AttributeValue::Reference(name) => AttributeValue::Scalar(lookup(name, variables)?.clone()),
        AttributeValue::Template(text) => AttributeValue::string(interpolate(text, variables)?),
        AttributeValue::Scalar(s) => AttributeValue::Scalar(s.clone()),
        AttributeValue::Block(tree) => AttributeValue::Block(resolve_tree(tree, variables)?),
        AttributeValue::List(items) => AttributeValue::List(
            items
                .iter()
                .map(|item| resolve_value(item, variables))
                .collect::<ResolveResult<Vec<_>>>()?,
        ),
    })
}

/// Substitute every `${name}` in `text`. Unknown names are an error.
fn interpolate(text: &str, variables: &Variables) -> ResolveResult<String> {
    let mut out = String::with_capacity(text.len());
    let mut last = 0;
    for caps in VAR_REGEX.captures_iter(text) {
        let (Some(whole), Some(name)) = (caps.get(0), caps.get(1)) else {
            continue;
        };
        out.push_str(&text[last..whole.start()]);
        out.push_str(&lookup(name.as_str(), variables)?.to_string());
        last = whole.end();
    }
    out.push_str(&text[last..]);
    Ok(out)
}

fn lookup<'a>(name: &str, variables: &'a Variables) -> ResolveResult<&'a Scalar> {
    match variables.get(name) {
        Some(VariableValue::Scalar(value)) => {
            trace!(variable = %name, "resolved reference");
            Ok(value)
        }
        Some(VariableValue::Reference(_)) => Err(ResolveError::CyclicReference {
            variable: name.to_string(),
            chain: reference_chain(name, variables),
        }),
        None => Err(ResolveError::UnresolvedReference {
            variable: name.to_string(),
        }),
    }
}

/// Describe where a variable-to-variable binding leads, for diagnostics.
fn reference_chain(start: &str, variables: &Variables) -> String {
    let mut chain = vec![start];
    let mut current = start;
    while let Some(VariableValue::Reference(next)) = variables.get(current) {
        let seen = chain.contains(&next.as_str());
        chain.push(next.as_str());
        if seen {
            break;
        }
        current = next.as_str();
    }
    chain.join(" -> ")
}
