//! Attribute values: scalars, references, nested blocks and lists.

use crate::tree::AttributeTree;
use derive_more::Display;
use serde::ser::SerializeSeq;
use serde::{Serialize, Serializer};
use serde_json::Number;

/// The variant tag of an [`AttributeValue`], used by schemas.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Display, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum ValueKind {
    #[display("string")]
    String,
    #[display("number")]
    Number,
    #[display("bool")]
    Bool,
    #[display("reference")]
    Reference,
    #[display("template")]
    Template,
    #[display("block")]
    Block,
    #[display("list")]
    List,
}

/// A leaf value.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(untagged)]
pub enum Scalar {
    String(String),
    Number(Number),
    Bool(bool),
}

impl Scalar {
    pub fn kind(&self) -> ValueKind {
        match self {
            Scalar::String(_) => ValueKind::String,
            Scalar::Number(_) => ValueKind::Number,
            Scalar::Bool(_) => ValueKind::Bool,
        }
    }

    pub fn as_str(&self) -> Option<&str> {
        match self {
            Scalar::String(s) => Some(s),
            _ => None,
        }
    }

    pub fn as_bool(&self) -> Option<bool> {
        match self {
            Scalar::Bool(b) => Some(*b),
            _ => None,
        }
    }

    /// Build a float scalar. Returns `None` for NaN and infinities.
    pub fn float(value: f64) -> Option<Self> {
        Number::from_f64(value).map(Scalar::Number)
    }

    /// Interpret untyped text (CLI flags, environment variables).
    ///
    /// `true`/`false` become booleans, anything that parses as a number
    /// becomes a number, everything else stays a string.
    pub fn infer(text: &str) -> Self {
        match text {
            "true" => return Scalar::Bool(true),
            "false" => return Scalar::Bool(false),
            _ => {}
        }
        if let Ok(n) = text.parse::<i64>() {
            return Scalar::Number(n.into());
        }
        if let Some(scalar) = text.parse::<f64>().ok().and_then(Scalar::float) {
            return scalar;
        }
        Scalar::String(text.to_string())
    }
}

impl std::fmt::Display for Scalar {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Scalar::String(s) => write!(f, "{}", s),
            Scalar::Number(n) => write!(f, "{}", n),
            Scalar::Bool(b) => write!(f, "{}", b),
        }
    }
}

impl From<&str> for Scalar {
    fn from(s: &str) -> Self {
        Scalar::String(s.to_string())
    }
}

impl From<String> for Scalar {
    fn from(s: String) -> Self {
        Scalar::String(s)
    }
}

impl From<bool> for Scalar {
    fn from(b: bool) -> Self {
        Scalar::Bool(b)
    }
}

impl From<i64> for Scalar {
    fn from(n: i64) -> Self {
        Scalar::Number(n.into())
    }
}

/// A node in an attribute tree.
#[derive(Debug, Clone, PartialEq)]
pub enum AttributeValue {
    Scalar(Scalar),
    /// Placeholder for a named variable, replaced during resolution.
    Reference(String),
    /// String with embedded `${name}` placeholders, substituted during
    /// resolution. Plain string scalars are never rewritten.
    Template(String),
    Block(AttributeTree),
    List(Vec<AttributeValue>),
}

impl AttributeValue {
    pub fn string(value: impl Into<String>) -> Self {
        AttributeValue::Scalar(Scalar::String(value.into()))
    }

    pub fn number(value: i64) -> Self {
        AttributeValue::Scalar(Scalar::from(value))
    }

    pub fn bool(value: bool) -> Self {
        AttributeValue::Scalar(Scalar::Bool(value))
    }

    pub fn reference(name: impl Into<String>) -> Self {
        AttributeValue::Reference(name.into())
    }

    pub fn template(text: impl Into<String>) -> Self {
        AttributeValue::Template(text.into())
    }

    pub fn block(tree: AttributeTree) -> Self {
        AttributeValue::Block(tree)
    }

    pub fn list(items: impl IntoIterator<Item = AttributeValue>) -> Self {
        AttributeValue::List(items.into_iter().collect())
    }

    pub fn kind(&self) -> ValueKind {
        match self {
            AttributeValue::Scalar(s) => s.kind(),
            AttributeValue::Reference(_) => ValueKind::Reference,
            AttributeValue::Template(_) => ValueKind::Template,
            AttributeValue::Block(_) => ValueKind::Block,
            AttributeValue::List(_) => ValueKind::List,
        }
    }

    pub fn as_scalar(&self) -> Option<&Scalar> {
        match self {
            AttributeValue::Scalar(s) => Some(s),
            _ => None,
        }
    }

    pub fn as_block(&self) -> Option<&AttributeTree> {
        match self {
            AttributeValue::Block(tree) => Some(tree),
            _ => None,
        }
    }

    pub fn as_list(&self) -> Option<&[AttributeValue]> {
        match self {
            AttributeValue::List(items) => Some(items),
            _ => None,
        }
    }

    /// True for scalars, references and templates, which cannot be descended into.
    pub fn is_leaf(&self) -> bool {
        matches!(
            self,
            AttributeValue::Scalar(_) | AttributeValue::Reference(_) | AttributeValue::Template(_)
        )
    }

    /// True when no reference appears anywhere below this node.
    pub fn is_reference_free(&self) -> bool {
        match self {
            AttributeValue::Scalar(_) => true,
            AttributeValue::Reference(_) | AttributeValue::Template(_) => false,
            AttributeValue::Block(tree) => tree.iter().all(|(_, v)| v.is_reference_free()),
            AttributeValue::List(items) => items.iter().all(AttributeValue::is_reference_free),
        }
    }
}

impl From<Scalar> for AttributeValue {
    fn from(scalar: Scalar) -> Self {
        AttributeValue::Scalar(scalar)
    }
}

impl From<AttributeTree> for AttributeValue {
    fn from(tree: AttributeTree) -> Self {
        AttributeValue::Block(tree)
    }
}

// References and templates serialize in their source form.
impl Serialize for AttributeValue {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        match self {
            AttributeValue::Scalar(s) => s.serialize(serializer),
            AttributeValue::Reference(name) => serializer.serialize_str(&format!("${{{}}}", name)),
            AttributeValue::Template(text) => serializer.serialize_str(text),
            AttributeValue::Block(tree) => tree.serialize(serializer),
            AttributeValue::List(items) => {
                let mut seq = serializer.serialize_seq(Some(items.len()))?;
                for item in items {
                    seq.serialize_element(item)?;
                }
                seq.end()
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_infer_scalar() {
        assert_eq!(Scalar::infer("true"), Scalar::Bool(true));
        assert_eq!(Scalar::infer("3"), Scalar::from(3i64));
        assert_eq!(Scalar::infer("1.5").kind(), ValueKind::Number);
        assert_eq!(Scalar::infer("dev"), Scalar::from("dev"));
        assert_eq!(Scalar::infer("NaN").kind(), ValueKind::String);
    }

    #[test]
    fn test_kind_display() {
        assert_eq!(ValueKind::Bool.to_string(), "bool");
        assert_eq!(AttributeValue::string("x").kind().to_string(), "string");
        assert_eq!(AttributeValue::list([]).kind(), ValueKind::List);
    }

    #[test]
    fn test_reference_free() {
        let nested = AttributeValue::list([
            AttributeValue::number(1),
            AttributeValue::reference("var.environment"),
        ]);
        assert!(!nested.is_reference_free());
        assert!(!AttributeValue::template("aks-${var.environment}").is_reference_free());
        assert!(AttributeValue::bool(false).is_reference_free());
        assert!(AttributeValue::string("echo ${HOME}").is_reference_free());
    }

    #[test]
    fn test_serialize_reference_as_template() {
        let value = AttributeValue::reference("var.environment");
        assert_eq!(
            serde_json::to_string(&value).unwrap(),
            r#""${var.environment}""#
        );
    }
}
