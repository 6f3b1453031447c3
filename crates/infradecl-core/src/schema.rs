//! Resource schemas.
//!
//! A [`Schema`] describes the attributes of one block: which are required,
//! what type each must have, defaults to inject when absent, and the schema
//! of nested blocks. Schemas are immutable once registered and are shared
//! read-only through a [`SchemaRegistry`].

use crate::value::{AttributeValue, ValueKind};
use serde::ser::SerializeMap;
use serde::{Serialize, Serializer};
use std::collections::BTreeMap;
use std::sync::Arc;

/// Constraints on a single attribute.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct AttributeSchema {
    #[serde(rename = "type")]
    pub kind: ValueKind,
    pub required: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub default: Option<AttributeValue>,
    /// Schema for a block, or for every element of a list of blocks.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub nested: Option<Schema>,
    /// Type of every value in a free-form block or every element of a list.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub element: Option<ValueKind>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
}

impl AttributeSchema {
    fn of(kind: ValueKind) -> Self {
        Self {
            kind,
            required: false,
            default: None,
            nested: None,
            element: None,
            description: None,
        }
    }

    pub fn string() -> Self {
        Self::of(ValueKind::String)
    }

    pub fn number() -> Self {
        Self::of(ValueKind::Number)
    }

    pub fn bool() -> Self {
        Self::of(ValueKind::Bool)
    }

    /// A nested block checked against `schema`.
    pub fn block(schema: Schema) -> Self {
        Self {
            nested: Some(schema),
            ..Self::of(ValueKind::Block)
        }
    }

    /// A repeated block; each element is checked against `schema`.
    pub fn blocks(schema: Schema) -> Self {
        Self {
            nested: Some(schema),
            ..Self::of(ValueKind::List)
        }
    }

    /// A list whose elements all have type `element`.
    pub fn list(element: ValueKind) -> Self {
        Self {
            element: Some(element),
            ..Self::of(ValueKind::List)
        }
    }

    /// A free-form block whose values all have type `element`, such as `tags`.
    pub fn map(element: ValueKind) -> Self {
        Self {
            element: Some(element),
            ..Self::of(ValueKind::Block)
        }
    }

    pub fn required(mut self) -> Self {
        self.required = true;
        self
    }

    pub fn with_default(mut self, value: AttributeValue) -> Self {
        self.default = Some(value);
        self
    }

    pub fn with_description(mut self, desc: &str) -> Self {
        self.description = Some(desc.to_string());
        self
    }
}

/// The attributes allowed in one block, in declaration order.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct Schema {
    attributes: Vec<(String, AttributeSchema)>,
}

impl Schema {
    pub fn new() -> Self {
        Self::default()
    }

    /// Add (or replace) an attribute constraint.
    pub fn attribute(mut self, name: &str, attribute: AttributeSchema) -> Self {
        match self.attributes.iter_mut().find(|(n, _)| n == name) {
            Some((_, existing)) => *existing = attribute,
            None => self.attributes.push((name.to_string(), attribute)),
        }
        self
    }

    pub fn get(&self, name: &str) -> Option<&AttributeSchema> {
        self.attributes
            .iter()
            .find(|(n, _)| n == name)
            .map(|(_, a)| a)
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &AttributeSchema)> {
        self.attributes.iter().map(|(n, a)| (n.as_str(), a))
    }

    pub fn len(&self) -> usize {
        self.attributes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.attributes.is_empty()
    }
}

impl Serialize for Schema {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        let mut map = serializer.serialize_map(Some(self.attributes.len()))?;
        for (name, attribute) in &self.attributes {
            map.serialize_entry(name, attribute)?;
        }
        map.end()
    }
}

/// Schemas keyed by resource type.
#[derive(Debug, Clone, Default)]
pub struct SchemaRegistry {
    schemas: BTreeMap<String, Arc<Schema>>,
}

impl SchemaRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn register(&mut self, resource_type: &str, schema: Schema) {
        self.schemas
            .insert(resource_type.to_string(), Arc::new(schema));
    }

    pub fn get(&self, resource_type: &str) -> Option<Arc<Schema>> {
        self.schemas.get(resource_type).cloned()
    }

    pub fn resource_types(&self) -> impl Iterator<Item = &str> {
        self.schemas.keys().map(|k| k.as_str())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_builder() {
        let schema = Schema::new()
            .attribute("name", AttributeSchema::string().required())
            .attribute(
                "tags",
                AttributeSchema::map(ValueKind::String).with_description("Resource tags"),
            );

        assert_eq!(schema.len(), 2);
        let name = schema.get("name").unwrap();
        assert!(name.required);
        assert_eq!(name.kind, ValueKind::String);
        let tags = schema.get("tags").unwrap();
        assert_eq!(tags.kind, ValueKind::Block);
        assert_eq!(tags.element, Some(ValueKind::String));
        assert!(schema.get("location").is_none());
    }

    #[test]
    fn test_attribute_replaces_existing() {
        let schema = Schema::new()
            .attribute("enabled", AttributeSchema::bool())
            .attribute(
                "enabled",
                AttributeSchema::bool().with_default(AttributeValue::bool(true)),
            );
        assert_eq!(schema.len(), 1);
        assert!(schema.get("enabled").unwrap().default.is_some());
    }

    #[test]
    fn test_serialize() {
        let schema = Schema::new().attribute(
            "enabled",
            AttributeSchema::bool().with_default(AttributeValue::bool(false)),
        );
        let json = serde_json::to_value(&schema).unwrap();
        assert_eq!(json["enabled"]["type"], "bool");
        assert_eq!(json["enabled"]["default"], false);
        assert_eq!(json["enabled"]["required"], false);
    }

    #[test]
    fn test_registry_shares_schemas() {
        let mut registry = SchemaRegistry::new();
        registry.register("azurerm_resource_group", Schema::new());
        let a = registry.get("azurerm_resource_group").unwrap();
        let b = registry.get("azurerm_resource_group").unwrap();
        assert!(Arc::ptr_eq(&a, &b));
        assert!(registry.get("azurerm_kubernetes_cluster").is_none());
    }
}
