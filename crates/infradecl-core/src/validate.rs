//! Schema validation of resolved attribute trees.

use crate::error::{ValidationError, ValidationResult};
use crate::path::AttributePath;
use crate::resolve::ResolvedTree;
use crate::schema::{AttributeSchema, Schema};
use crate::tree::AttributeTree;
use crate::value::{AttributeValue, ValueKind};
use serde::Serialize;
use tracing::{debug, warn};

/// Non-fatal findings surfaced alongside a successful validation.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum ValidationWarning {
    UnknownAttribute { path: AttributePath },
}

impl std::fmt::Display for ValidationWarning {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ValidationWarning::UnknownAttribute { path } => {
                write!(f, "unknown attribute: {}", path)
            }
        }
    }
}

/// A tree that satisfies its schema, with defaults applied.
#[derive(Debug, Clone, PartialEq)]
pub struct Validated {
    pub tree: ResolvedTree,
    pub warnings: Vec<ValidationWarning>,
}

/// Check `tree` against `schema`, stopping at the first fatal error.
///
/// Works on a private copy: absent attributes with a default get the
/// default injected before their block is checked, so validating the
/// returned tree again yields the same tree.
pub fn validate(schema: &Schema, tree: &ResolvedTree) -> ValidationResult<Validated> {
    let mut working = tree.clone();
    let mut warnings = Vec::new();

    validate_block(schema, working.tree_mut(), &AttributePath::root(), &mut warnings)?;

    for warning in &warnings {
        let ValidationWarning::UnknownAttribute { path } = warning;
        warn!(path = %path, "unknown attribute");
    }
    debug!(warnings = warnings.len(), "validated attribute tree");

    Ok(Validated {
        tree: working,
        warnings,
    })
}

fn validate_block(
    schema: &Schema,
    tree: &mut AttributeTree,
    path: &AttributePath,
    warnings: &mut Vec<ValidationWarning>,
) -> ValidationResult<()> {
    for (name, attribute) in schema.iter() {
        if tree.contains_key(name) {
            continue;
        }
        if attribute.required {
            return Err(ValidationError::MissingRequiredAttribute {
                path: path.child(name),
            });
        }
        if let Some(default) = &attribute.default {
            tree.insert(name, default.clone());
        }
    }

    for (name, value) in tree.iter_mut() {
        let child = path.child(name);
        match schema.get(name) {
            Some(attribute) => validate_value(attribute, value, &child, warnings)?,
            None => warnings.push(ValidationWarning::UnknownAttribute { path: child }),
        }
    }
    Ok(())
}

fn validate_value(
    attribute: &AttributeSchema,
    value: &mut AttributeValue,
    path: &AttributePath,
    warnings: &mut Vec<ValidationWarning>,
) -> ValidationResult<()> {
    expect_kind(attribute.kind, value, path)?;

    match value {
        AttributeValue::Block(tree) => {
            if let Some(nested) = &attribute.nested {
                validate_block(nested, tree, path, warnings)?;
            } else if let Some(element) = attribute.element {
                for (key, item) in tree.iter() {
                    expect_kind(element, item, &path.child(key))?;
                }
            }
        }
        AttributeValue::List(items) => {
            for (i, item) in items.iter_mut().enumerate() {
                let item_path = path.index(i);
                if let Some(nested) = &attribute.nested {
                    expect_kind(ValueKind::Block, item, &item_path)?;
                    if let AttributeValue::Block(tree) = item {
                        validate_block(nested, tree, &item_path, warnings)?;
                    }
                } else if let Some(element) = attribute.element {
                    expect_kind(element, item, &item_path)?;
                }
            }
        }
        AttributeValue::Scalar(_) | AttributeValue::Reference(_) | AttributeValue::Template(_) => {}
    }
    Ok(())
}

fn expect_kind(
    expected: ValueKind,
    value: &AttributeValue,
    path: &AttributePath,
) -> ValidationResult<()> {
    let actual = value.kind();
    if actual == expected {
        Ok(())
    } else {
        Err(ValidationError::TypeMismatch {
            path: path.clone(),
            expected,
            actual,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::resolve::resolve;
    use crate::variable::Variables;

    fn schema() -> Schema {
        Schema::new()
            .attribute("name", AttributeSchema::string().required())
            .attribute(
                "default_node_pool",
                AttributeSchema::block(
                    Schema::new()
                        .attribute("name", AttributeSchema::string().required())
                        .attribute("node_count", AttributeSchema::number().required())
                        .attribute(
                            "enable_auto_scaling",
                            AttributeSchema::bool().with_default(AttributeValue::bool(false)),
                        ),
                )
                .required(),
            )
            .attribute(
                "role_based_access_control",
                AttributeSchema::block(
                    Schema::new().attribute("enabled", AttributeSchema::bool().required()),
                ),
            )
            .attribute(
                "addon_profile",
                AttributeSchema::block(Schema::new().attribute(
                    "kube_dashboard",
                    AttributeSchema::block(Schema::new().attribute(
                        "enabled",
                        AttributeSchema::bool().with_default(AttributeValue::bool(true)),
                    )),
                ))
                .with_default(AttributeValue::block(AttributeTree::from_iter([(
                    "kube_dashboard",
                    AttributeValue::block(AttributeTree::new()),
                )]))),
            )
            .attribute(
                "agent_pool",
                AttributeSchema::blocks(
                    Schema::new().attribute("name", AttributeSchema::string().required()),
                ),
            )
            .attribute("zones", AttributeSchema::list(ValueKind::String))
            .attribute("tags", AttributeSchema::map(ValueKind::String))
    }

    fn node_pool(count: Option<i64>) -> AttributeValue {
        let mut pool = AttributeTree::from_iter([("name", AttributeValue::string("default"))]);
        if let Some(count) = count {
            pool.insert("node_count", AttributeValue::number(count));
        }
        AttributeValue::block(pool)
    }

    fn resolved(tree: AttributeTree) -> ResolvedTree {
        resolve(&tree, &Variables::new()).unwrap()
    }

    fn minimal() -> AttributeTree {
        AttributeTree::from_iter([
            ("name", AttributeValue::string("terragoat-aks")),
            ("default_node_pool", node_pool(Some(2))),
        ])
    }

    #[test]
    fn test_valid_tree_has_no_warnings() {
        let validated = validate(&schema(), &resolved(minimal())).unwrap();
        assert!(validated.warnings.is_empty());
    }

    #[test]
    fn test_missing_required_nested_attribute() {
        let tree = AttributeTree::from_iter([
            ("name", AttributeValue::string("terragoat-aks")),
            ("default_node_pool", node_pool(None)),
        ]);
        let err = validate(&schema(), &resolved(tree)).unwrap_err();
        assert_eq!(
            err,
            ValidationError::MissingRequiredAttribute {
                path: AttributePath::from(["default_node_pool", "node_count"]),
            }
        );
    }

    #[test]
    fn test_type_mismatch_on_bool() {
        let mut tree = minimal();
        tree.insert(
            "role_based_access_control",
            AttributeValue::block(AttributeTree::from_iter([(
                "enabled",
                AttributeValue::string("false"),
            )])),
        );
        let err = validate(&schema(), &resolved(tree)).unwrap_err();
        assert_eq!(
            err,
            ValidationError::TypeMismatch {
                path: AttributePath::from(["role_based_access_control", "enabled"]),
                expected: ValueKind::Bool,
                actual: ValueKind::String,
            }
        );
    }

    #[test]
    fn test_defaults_are_injected() {
        let input = resolved(minimal());
        let validated = validate(&schema(), &input).unwrap();

        assert_eq!(
            validated
                .tree
                .get(&AttributePath::from(["default_node_pool", "enable_auto_scaling"]))
                .unwrap(),
            &AttributeValue::bool(false)
        );
        assert_eq!(
            validated
                .tree
                .get(&AttributePath::from(["addon_profile", "kube_dashboard", "enabled"]))
                .unwrap(),
            &AttributeValue::bool(true)
        );
        // caller's tree is not touched
        assert!(!input.contains_key("addon_profile"));
    }

    #[test]
    fn test_revalidation_is_idempotent() {
        let first = validate(&schema(), &resolved(minimal())).unwrap();
        let second = validate(&schema(), &first.tree).unwrap();
        assert_eq!(first.tree, second.tree);
    }

    #[test]
    fn test_unknown_attributes_warn() {
        let mut tree = minimal();
        tree.insert("kubernetes_version", AttributeValue::string("1.29"));
        tree.set(
            &AttributePath::from(["default_node_pool", "max_pods"]),
            AttributeValue::number(30),
        )
        .unwrap();

        let validated = validate(&schema(), &resolved(tree)).unwrap();
        assert_eq!(
            validated.warnings,
            vec![
                ValidationWarning::UnknownAttribute {
                    path: AttributePath::from(["default_node_pool", "max_pods"]),
                },
                ValidationWarning::UnknownAttribute {
                    path: AttributePath::from(["kubernetes_version"]),
                },
            ]
        );
    }

    #[test]
    fn test_list_elements_carry_index_in_path() {
        let mut tree = minimal();
        tree.insert(
            "agent_pool",
            AttributeValue::list([
                AttributeValue::block(AttributeTree::from_iter([(
                    "name",
                    AttributeValue::string("system"),
                )])),
                AttributeValue::block(AttributeTree::new()),
            ]),
        );
        let err = validate(&schema(), &resolved(tree)).unwrap_err();
        assert_eq!(
            err,
            ValidationError::MissingRequiredAttribute {
                path: AttributePath::from(["agent_pool"]).index(1).child("name"),
            }
        );
    }

    #[test]
    fn test_element_kinds() {
        let mut tree = minimal();
        tree.insert(
            "zones",
            AttributeValue::list([AttributeValue::string("1"), AttributeValue::number(2)]),
        );
        let err = validate(&schema(), &resolved(tree)).unwrap_err();
        assert!(matches!(
            err,
            ValidationError::TypeMismatch { ref path, .. } if path.to_string() == "zones[1]"
        ));

        let mut tree = minimal();
        tree.insert(
            "tags",
            AttributeValue::block(AttributeTree::from_iter([(
                "git_repo",
                AttributeValue::bool(true),
            )])),
        );
        let err = validate(&schema(), &resolved(tree)).unwrap_err();
        assert!(matches!(
            err,
            ValidationError::TypeMismatch { ref path, expected: ValueKind::String, .. }
                if path.to_string() == "tags.git_repo"
        ));
    }
}
