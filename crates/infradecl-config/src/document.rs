//! Resource document parsing.
//!
//! A document is KDL with three kinds of top-level node:
//!
//! ```kdl
//! variable "environment" default="dev"
//!
//! shared "azurerm_resource_group.example" {
//!     name "terragoat-dev"
//!     location "West US"
//! }
//!
//! resource "azurerm_kubernetes_cluster" "k8s_cluster" {
//!     name "terragoat-aks-${var.environment}"
//!     location (ref)"azurerm_resource_group.example.location"
//!     default_node_pool {
//!         name "default"
//!         node_count 2
//!     }
//! }
//! ```
//!
//! Inside a resource, a node with children or properties is a block, a node
//! with one argument is a scalar and a node with several arguments is a list.
//! Repeating a node name (or annotating it `(list)`) makes a list of blocks.
//! A string that is exactly `"${name}"` is a reference, and one with
//! embedded placeholders is a template.

use crate::{ConfigError, ConfigResult};
use infradecl_core::resolve::{has_placeholder, whole_reference};
use infradecl_core::{AttributeTree, AttributeValue, RawResource, Scalar};
use kdl::{KdlDocument, KdlEntry, KdlNode, KdlValue};
use std::collections::HashSet;
use tracing::debug;

/// A `variable` declaration.
#[derive(Debug, Clone, PartialEq)]
pub struct VariableDecl {
    pub name: String,
    pub default: Option<Scalar>,
    pub description: Option<String>,
}

/// A `shared` entity whose attributes resources may reference.
#[derive(Debug, Clone, PartialEq)]
pub struct SharedEntity {
    pub address: String,
    pub attributes: AttributeTree,
}

/// Everything declared in one document.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Document {
    pub variables: Vec<VariableDecl>,
    pub shared: Vec<SharedEntity>,
    pub resources: Vec<RawResource>,
}

/// Parse a document from KDL text.
pub fn parse_document(kdl: &str) -> ConfigResult<Document> {
    let doc: KdlDocument = kdl.parse()?;

    let mut document = Document::default();
    let mut variable_names = HashSet::new();
    let mut addresses = HashSet::new();

    for node in doc.nodes() {
        match node.name().value() {
            "variable" => {
                let decl = parse_variable(node)?;
                if !variable_names.insert(decl.name.clone()) {
                    return Err(ConfigError::Duplicate(format!("variable '{}'", decl.name)));
                }
                document.variables.push(decl);
            }
            "shared" => {
                let address = get_first_string_arg(node)
                    .ok_or_else(|| ConfigError::MissingField("shared entity address".to_string()))?;
                if !addresses.insert(address.clone()) {
                    return Err(ConfigError::Duplicate(address));
                }
                let attributes = parse_block(node, &address)?;
                document.shared.push(SharedEntity {
                    address,
                    attributes,
                });
            }
            "resource" => {
                let resource = parse_resource(node)?;
                if !addresses.insert(resource.address()) {
                    return Err(ConfigError::Duplicate(resource.address()));
                }
                document.resources.push(resource);
            }
            other => debug!(node = %other, "ignoring unknown top-level node"),
        }
    }

    debug!(
        resources = document.resources.len(),
        variables = document.variables.len(),
        shared = document.shared.len(),
        "parsed document"
    );
    Ok(document)
}

fn parse_variable(node: &KdlNode) -> ConfigResult<VariableDecl> {
    let name = get_first_string_arg(node)
        .ok_or_else(|| ConfigError::MissingField("variable name".to_string()))?;

    let default = match node.get("default") {
        Some(value) => Some(to_scalar(value, &format!("variable '{}' default", name))?),
        None => None,
    };
    let description = node
        .get("description")
        .and_then(|v| v.as_string())
        .map(|s| s.to_string());

    Ok(VariableDecl {
        name,
        default,
        description,
    })
}

fn parse_resource(node: &KdlNode) -> ConfigResult<RawResource> {
    let args = get_all_string_args(node);
    let [resource_type, name] = args.as_slice() else {
        return Err(ConfigError::MissingField(
            "resource type and name (resource \"<type>\" \"<name>\")".to_string(),
        ));
    };
    let address = format!("{}.{}", resource_type, name);
    let attributes = parse_block(node, &address)?;
    Ok(RawResource::new(resource_type, name, attributes))
}

/// Turn a node's properties and children into a block.
fn parse_block(node: &KdlNode, field: &str) -> ConfigResult<AttributeTree> {
    let mut tree = AttributeTree::new();

    for entry in node.entries() {
        if let Some(key) = entry.name() {
            let key = key.value();
            let path = format!("{}.{}", field, key);
            if tree.contains_key(key) {
                return Err(ConfigError::Duplicate(path));
            }
            tree.insert(key, entry_value(entry, &path)?);
        }
    }

    let Some(children) = node.children() else {
        return Ok(tree);
    };

    // group children by name, keeping first-appearance order
    let mut groups: Vec<(&str, Vec<&KdlNode>)> = Vec::new();
    for child in children.nodes() {
        let key = child.name().value();
        match groups.iter_mut().find(|(name, _)| *name == key) {
            Some((_, nodes)) => nodes.push(child),
            None => groups.push((key, vec![child])),
        }
    }

    for (key, nodes) in groups {
        let path = format!("{}.{}", field, key);
        if tree.contains_key(key) {
            return Err(ConfigError::Duplicate(path));
        }
        let as_list = nodes.len() > 1 || nodes.iter().any(|n| is_list_annotated(n));
        let value = if as_list {
            let mut items = Vec::with_capacity(nodes.len());
            for (i, n) in nodes.iter().enumerate() {
                items.push(node_value(n, &format!("{}[{}]", path, i))?);
            }
            AttributeValue::List(items)
        } else {
            node_value(nodes[0], &path)?
        };
        tree.insert(key, value);
    }

    Ok(tree)
}

fn node_value(node: &KdlNode, field: &str) -> ConfigResult<AttributeValue> {
    let args: Vec<&KdlEntry> = node.entries().iter().filter(|e| e.name().is_none()).collect();
    let has_props = node.entries().iter().any(|e| e.name().is_some());

    if node.children().is_some() || has_props {
        if !args.is_empty() {
            return Err(ConfigError::InvalidValue {
                field: field.to_string(),
                message: "a block cannot also take arguments".to_string(),
            });
        }
        return Ok(AttributeValue::Block(parse_block(node, field)?));
    }

    match args.as_slice() {
        [] => Err(ConfigError::MissingField(format!("value for {}", field))),
        [single] => entry_value(single, field),
        many => many
            .iter()
            .enumerate()
            .map(|(i, e)| entry_value(e, &format!("{}[{}]", field, i)))
            .collect::<ConfigResult<Vec<_>>>()
            .map(AttributeValue::List),
    }
}

fn is_list_annotated(node: &KdlNode) -> bool {
    node.ty().is_some_and(|ty| ty.value() == "list")
}

fn entry_value(entry: &KdlEntry, field: &str) -> ConfigResult<AttributeValue> {
    if entry.ty().is_some_and(|ty| ty.value() == "ref") {
        let name = entry.value().as_string().ok_or_else(|| ConfigError::InvalidValue {
            field: field.to_string(),
            message: "(ref) must annotate a string naming a variable".to_string(),
        })?;
        return Ok(AttributeValue::reference(name));
    }

    if let Some(text) = entry.value().as_string() {
        if let Some(name) = whole_reference(text) {
            return Ok(AttributeValue::reference(name));
        }
        if has_placeholder(text) {
            return Ok(AttributeValue::template(text));
        }
    }

    Ok(AttributeValue::Scalar(to_scalar(entry.value(), field)?))
}

fn to_scalar(value: &KdlValue, field: &str) -> ConfigResult<Scalar> {
    let invalid = |message: &str| ConfigError::InvalidValue {
        field: field.to_string(),
        message: message.to_string(),
    };

    if let Some(s) = value.as_string() {
        return Ok(Scalar::from(s));
    }
    if let Some(b) = value.as_bool() {
        return Ok(Scalar::Bool(b));
    }
    if let Some(i) = value.as_integer() {
        let n = i64::try_from(i).map_err(|_| invalid("integer out of range"))?;
        return Ok(Scalar::from(n));
    }
    if let Some(f) = value.as_float() {
        return Scalar::float(f).ok_or_else(|| invalid("number must be finite"));
    }
    Err(invalid("null is not a valid attribute value"))
}

// Helper functions for extracting values from KDL nodes

fn get_first_string_arg(node: &KdlNode) -> Option<String> {
    node.entries()
        .iter()
        .find(|e| e.name().is_none())
        .and_then(|e| e.value().as_string())
        .map(|s| s.to_string())
}

fn get_all_string_args(node: &KdlNode) -> Vec<String> {
    node.entries()
        .iter()
        .filter(|e| e.name().is_none())
        .filter_map(|e| e.value().as_string())
        .map(|s| s.to_string())
        .collect()
}
