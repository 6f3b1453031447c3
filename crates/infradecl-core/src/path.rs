//! Attribute paths.

use crate::error::TreeError;
use serde::{Serialize, Serializer};

/// One step into an attribute tree.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum PathSegment {
    /// A named attribute within a block.
    Key(String),
    /// An element of a list.
    Index(usize),
}

/// An ordered sequence of segments addressing a node in a tree.
///
/// Displays as `default_node_pool.node_count` or `agent_pool[1].name`.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Default)]
pub struct AttributePath(Vec<PathSegment>);

impl AttributePath {
    /// The empty path, addressing the tree itself.
    pub fn root() -> Self {
        Self::default()
    }

    pub fn segments(&self) -> &[PathSegment] {
        &self.0
    }

    pub fn is_root(&self) -> bool {
        self.0.is_empty()
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    /// Extend this path with an attribute name.
    pub fn child(&self, key: impl Into<String>) -> Self {
        let mut segments = self.0.clone();
        segments.push(PathSegment::Key(key.into()));
        Self(segments)
    }

    /// Extend this path with a list index.
    pub fn index(&self, index: usize) -> Self {
        let mut segments = self.0.clone();
        segments.push(PathSegment::Index(index));
        Self(segments)
    }
}

impl std::fmt::Display for AttributePath {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        if self.0.is_empty() {
            return write!(f, "<root>");
        }
        for (i, segment) in self.0.iter().enumerate() {
            match segment {
                PathSegment::Key(key) if i == 0 => write!(f, "{}", key)?,
                PathSegment::Key(key) => write!(f, ".{}", key)?,
                PathSegment::Index(index) => write!(f, "[{}]", index)?,
            }
        }
        Ok(())
    }
}

impl FromIterator<PathSegment> for AttributePath {
    fn from_iter<I: IntoIterator<Item = PathSegment>>(iter: I) -> Self {
        Self(iter.into_iter().collect())
    }
}

impl<const N: usize> From<[&str; N]> for AttributePath {
    fn from(keys: [&str; N]) -> Self {
        keys.into_iter()
            .map(|k| PathSegment::Key(k.to_string()))
            .collect()
    }
}

impl From<&[&str]> for AttributePath {
    fn from(keys: &[&str]) -> Self {
        keys.iter()
            .map(|k| PathSegment::Key(k.to_string()))
            .collect()
    }
}

impl std::str::FromStr for AttributePath {
    type Err = TreeError;

    /// Parse the display form back into a path, e.g. `pools[0].name`.
    fn from_str(input: &str) -> Result<Self, Self::Err> {
        let fail = |reason: &str| TreeError::ParsePath {
            input: input.to_string(),
            reason: reason.to_string(),
        };

        let mut segments = Vec::new();
        for part in input.split('.') {
            let (key, mut rest) = match part.find('[') {
                Some(pos) => part.split_at(pos),
                None => (part, ""),
            };
            if key.is_empty() {
                return Err(fail("empty attribute name"));
            }
            segments.push(PathSegment::Key(key.to_string()));

            while !rest.is_empty() {
                let close = rest.find(']').ok_or_else(|| fail("unclosed '['"))?;
                let index = rest[1..close]
                    .parse::<usize>()
                    .map_err(|_| fail("list index must be a non-negative integer"))?;
                segments.push(PathSegment::Index(index));
                rest = &rest[close + 1..];
                if !rest.is_empty() && !rest.starts_with('[') {
                    return Err(fail("unexpected text after ']'"));
                }
            }
        }
        Ok(Self(segments))
    }
}

impl Serialize for AttributePath {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.collect_str(self)
    }
}
