//! Variables available to a single resolution pass.

use crate::path::PathSegment;
use crate::tree::AttributeTree;
use crate::value::{AttributeValue, Scalar};
use serde::Serialize;
use std::collections::HashMap;

/// The value bound to a variable name.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(untagged)]
pub enum VariableValue {
    Scalar(Scalar),
    /// Points at another variable. Never followed during resolution.
    Reference(String),
}

impl From<Scalar> for VariableValue {
    fn from(scalar: Scalar) -> Self {
        VariableValue::Scalar(scalar)
    }
}

/// Named variables keyed by their full reference name (e.g. `var.environment`).
#[derive(Debug, Clone, Default)]
pub struct Variables {
    values: HashMap<String, VariableValue>,
}

impl Variables {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn len(&self) -> usize {
        self.values.len()
    }

    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }

    /// Bind a concrete value.
    pub fn set(&mut self, name: impl Into<String>, value: impl Into<Scalar>) {
        self.values
            .insert(name.into(), VariableValue::Scalar(value.into()));
    }

    /// Bind a variable to another variable's name.
    pub fn set_reference(&mut self, name: impl Into<String>, target: impl Into<String>) {
        self.values
            .insert(name.into(), VariableValue::Reference(target.into()));
    }

    pub fn insert(&mut self, name: impl Into<String>, value: VariableValue) {
        self.values.insert(name.into(), value);
    }

    pub fn get(&self, name: &str) -> Option<&VariableValue> {
        self.values.get(name)
    }

    /// Copy every binding from `other`, overwriting on collision.
    pub fn extend(&mut self, other: Variables) {
        self.values.extend(other.values);
    }

    /// Expose the leaf attributes of a shared entity under its address.
    ///
    /// A resource group declared at `azurerm_resource_group.example` with a
    /// `location` attribute becomes `azurerm_resource_group.example.location`.
    /// Only keyed scalars and references are exported; list elements and
    /// templates are skipped.
    pub fn insert_entity(&mut self, address: &str, attributes: &AttributeTree) {
        for (path, value) in attributes.walk() {
            if path.segments().iter().any(|s| matches!(s, PathSegment::Index(_))) {
                continue;
            }
            let name = format!("{}.{}", address, path);
            match value {
                AttributeValue::Scalar(s) => self.insert(name, VariableValue::Scalar(s.clone())),
                AttributeValue::Reference(target) => {
                    self.insert(name, VariableValue::Reference(target.clone()))
                }
                AttributeValue::Template(_)
                | AttributeValue::Block(_)
                | AttributeValue::List(_) => {}
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_set_and_get() {
        let mut vars = Variables::new();
        vars.set("var.environment", "dev");
        vars.set_reference("var.alias", "var.environment");

        assert_eq!(
            vars.get("var.environment"),
            Some(&VariableValue::Scalar(Scalar::from("dev")))
        );
        assert_eq!(
            vars.get("var.alias"),
            Some(&VariableValue::Reference("var.environment".to_string()))
        );
        assert_eq!(vars.len(), 2);
    }

    #[test]
    fn test_insert_entity_exports_leaves() {
        let group = AttributeTree::from_iter([
            ("name", AttributeValue::string("terragoat-dev")),
            ("location", AttributeValue::string("West US")),
            (
                "labels",
                AttributeValue::block(AttributeTree::from_iter([(
                    "team",
                    AttributeValue::string("platform"),
                )])),
            ),
            ("zones", AttributeValue::list([AttributeValue::string("1")])),
        ]);

        let mut vars = Variables::new();
        vars.insert_entity("azurerm_resource_group.example", &group);

        assert_eq!(
            vars.get("azurerm_resource_group.example.location"),
            Some(&VariableValue::Scalar(Scalar::from("West US")))
        );
        assert!(vars.get("azurerm_resource_group.example.labels.team").is_some());
        assert!(vars.get("azurerm_resource_group.example.zones").is_none());
        assert_eq!(vars.len(), 3);
    }

    #[test]
    fn test_extend_overwrites() {
        let mut base = Variables::new();
        base.set("var.environment", "dev");
        let mut overrides = Variables::new();
        overrides.set("var.environment", "prod");
        base.extend(overrides);
        assert_eq!(
            base.get("var.environment"),
            Some(&VariableValue::Scalar(Scalar::from("prod")))
        );
    }
}
