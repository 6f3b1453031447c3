//! Attribute trees: ordered, nested configuration blocks.

use crate::error::{TreeError, TreeResult};
use crate::path::{AttributePath, PathSegment};
use crate::value::AttributeValue;
use serde::ser::SerializeMap;
use serde::{Serialize, Serializer};

/// A block of named attributes, kept in declaration order.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct AttributeTree {
    entries: Vec<(String, AttributeValue)>,
}

impl AttributeTree {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn contains_key(&self, key: &str) -> bool {
        self.position(key).is_some()
    }

    pub fn keys(&self) -> impl Iterator<Item = &str> {
        self.entries.iter().map(|(k, _)| k.as_str())
    }

    /// Iterate direct children in declaration order.
    pub fn iter(&self) -> impl Iterator<Item = (&str, &AttributeValue)> {
        self.entries.iter().map(|(k, v)| (k.as_str(), v))
    }

    pub fn iter_mut(&mut self) -> impl Iterator<Item = (&str, &mut AttributeValue)> {
        self.entries.iter_mut().map(|(k, v)| (k.as_str(), v))
    }

    /// Look up a direct child.
    pub fn get_key(&self, key: &str) -> Option<&AttributeValue> {
        self.position(key).map(|i| &self.entries[i].1)
    }

    /// Insert or overwrite a direct child. An overwritten entry keeps its position.
    pub fn insert(&mut self, key: impl Into<String>, value: AttributeValue) -> Option<AttributeValue> {
        let key = key.into();
        match self.position(&key) {
            Some(i) => Some(std::mem::replace(&mut self.entries[i].1, value)),
            None => {
                self.entries.push((key, value));
                None
            }
        }
    }

    pub fn remove(&mut self, key: &str) -> Option<AttributeValue> {
        self.position(key).map(|i| self.entries.remove(i).1)
    }

    /// Look up a node by path.
    pub fn get(&self, path: &AttributePath) -> TreeResult<&AttributeValue> {
        let not_found = || TreeError::NotFound(path.clone());

        let (first, rest) = path.segments().split_first().ok_or_else(not_found)?;
        let PathSegment::Key(key) = first else {
            return Err(not_found());
        };

        let mut current = self.get_key(key).ok_or_else(not_found)?;
        for segment in rest {
            current = match (current, segment) {
                (AttributeValue::Block(tree), PathSegment::Key(key)) => tree.get_key(key),
                (AttributeValue::List(items), PathSegment::Index(i)) => items.get(*i),
                _ => None,
            }
            .ok_or_else(not_found)?;
        }
        Ok(current)
    }

    /// Insert or overwrite the node at `path`.
    ///
    /// Missing intermediate keys are created as empty blocks, and an index
    /// equal to a list's length appends. Descending into a leaf fails with
    /// [`TreeError::InvalidPath`] and leaves the tree unchanged.
    pub fn set(&mut self, path: &AttributePath, value: AttributeValue) -> TreeResult<()> {
        check_tree(self, path, path.segments())?;
        set_in_tree(self, path, path.segments(), value)
    }

    /// Depth-first, pre-order traversal of every node in declaration order.
    ///
    /// Each call starts a fresh traversal.
    pub fn walk(&self) -> Walk<'_> {
        let root = AttributePath::root();
        Walk {
            stack: self
                .entries
                .iter()
                .rev()
                .map(|(k, v)| (root.child(k.as_str()), v))
                .collect(),
        }
    }

    fn position(&self, key: &str) -> Option<usize> {
        self.entries.iter().position(|(k, _)| k == key)
    }
}

fn invalid_path(path: &AttributePath, reason: impl Into<String>) -> TreeError {
    TreeError::InvalidPath {
        path: path.clone(),
        reason: reason.into(),
    }
}

// Checks a `set` path without touching the tree.
fn check_tree(
    tree: &AttributeTree,
    full: &AttributePath,
    segments: &[PathSegment],
) -> TreeResult<()> {
    let (first, rest) = segments
        .split_first()
        .ok_or_else(|| invalid_path(full, "path is empty"))?;
    let PathSegment::Key(key) = first else {
        return Err(invalid_path(full, "cannot index into a block"));
    };
    if rest.is_empty() {
        return Ok(());
    }
    match tree.get_key(key) {
        Some(child) => check_value(child, full, rest),
        None => check_new_blocks(full, rest),
    }
}

fn check_value(
    slot: &AttributeValue,
    full: &AttributePath,
    segments: &[PathSegment],
) -> TreeResult<()> {
    match (slot, &segments[0]) {
        (AttributeValue::Block(tree), PathSegment::Key(_)) => check_tree(tree, full, segments),
        (AttributeValue::List(items), PathSegment::Index(i)) => {
            let rest = &segments[1..];
            match items.get(*i) {
                Some(item) if !rest.is_empty() => check_value(item, full, rest),
                Some(_) => Ok(()),
                None if *i == items.len() => check_new_blocks(full, rest),
                None => Err(invalid_path(
                    full,
                    format!("index {} out of bounds (len {})", i, items.len()),
                )),
            }
        }
        (leaf, _) if leaf.is_leaf() => Err(invalid_path(full, "cannot descend into a leaf value")),
        (AttributeValue::List(_), PathSegment::Key(_)) => {
            Err(invalid_path(full, "list elements are addressed by index"))
        }
        _ => Err(invalid_path(full, "cannot index into a block")),
    }
}

// Segments below a node `set` would create; created nodes are empty blocks.
fn check_new_blocks(full: &AttributePath, segments: &[PathSegment]) -> TreeResult<()> {
    if segments.iter().all(|s| matches!(s, PathSegment::Key(_))) {
        Ok(())
    } else {
        Err(invalid_path(full, "cannot index into a block"))
    }
}

fn set_in_tree(
    tree: &mut AttributeTree,
    full: &AttributePath,
    segments: &[PathSegment],
    value: AttributeValue,
) -> TreeResult<()> {
    let (first, rest) = segments
        .split_first()
        .ok_or_else(|| invalid_path(full, "path is empty"))?;
    let PathSegment::Key(key) = first else {
        return Err(invalid_path(full, "cannot index into a block"));
    };

    if rest.is_empty() {
        tree.insert(key.as_str(), value);
        return Ok(());
    }

    let idx = match tree.position(key) {
        Some(i) => i,
        None => {
            tree.entries
                .push((key.clone(), AttributeValue::Block(AttributeTree::new())));
            tree.entries.len() - 1
        }
    };
    set_in_value(&mut tree.entries[idx].1, full, rest, value)
}

fn set_in_value(
    slot: &mut AttributeValue,
    full: &AttributePath,
    segments: &[PathSegment],
    value: AttributeValue,
) -> TreeResult<()> {
    match (slot, &segments[0]) {
        (AttributeValue::Block(tree), PathSegment::Key(_)) => {
            set_in_tree(tree, full, segments, value)
        }
        (AttributeValue::List(items), PathSegment::Index(i)) => {
            let rest = &segments[1..];
            if *i == items.len() {
                if rest.is_empty() {
                    items.push(value);
                    return Ok(());
                }
                items.push(AttributeValue::Block(AttributeTree::new()));
            }
            let len = items.len();
            let item = items
                .get_mut(*i)
                .ok_or_else(|| invalid_path(full, format!("index {} out of bounds (len {})", i, len)))?;
            if rest.is_empty() {
                *item = value;
                Ok(())
            } else {
                set_in_value(item, full, rest, value)
            }
        }
        (
            AttributeValue::Scalar(_) | AttributeValue::Reference(_) | AttributeValue::Template(_),
            _,
        ) => Err(invalid_path(full, "cannot descend into a leaf value")),
        (AttributeValue::Block(_), PathSegment::Index(_)) => {
            Err(invalid_path(full, "cannot index into a block"))
        }
        (AttributeValue::List(_), PathSegment::Key(_)) => {
            Err(invalid_path(full, "list elements are addressed by index"))
        }
    }
}

/// Iterator returned by [`AttributeTree::walk`].
pub struct Walk<'a> {
    stack: Vec<(AttributePath, &'a AttributeValue)>,
}

impl<'a> Iterator for Walk<'a> {
    type Item = (AttributePath, &'a AttributeValue);

    fn next(&mut self) -> Option<Self::Item> {
        let (path, value) = self.stack.pop()?;
        match value {
            AttributeValue::Block(tree) => {
                for (k, v) in tree.entries.iter().rev() {
                    self.stack.push((path.child(k.as_str()), v));
                }
            }
            AttributeValue::List(items) => {
                for (i, v) in items.iter().enumerate().rev() {
                    self.stack.push((path.index(i), v));
                }
            }
            _ => {}
        }
        Some((path, value))
    }
}

impl<K: Into<String>> FromIterator<(K, AttributeValue)> for AttributeTree {
    fn from_iter<I: IntoIterator<Item = (K, AttributeValue)>>(iter: I) -> Self {
        let mut tree = AttributeTree::new();
        for (k, v) in iter {
            tree.insert(k, v);
        }
        tree
    }
}

impl Serialize for AttributeTree {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        let mut map = serializer.serialize_map(Some(self.entries.len()))?;
        for (k, v) in &self.entries {
            map.serialize_entry(k, v)?;
        }
        map.end()
    }
}
