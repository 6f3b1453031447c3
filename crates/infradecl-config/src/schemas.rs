//! Built-in resource schemas.

use infradecl_core::{AttributeSchema, AttributeValue, Schema, SchemaRegistry, ValueKind};

pub const KUBERNETES_CLUSTER: &str = "azurerm_kubernetes_cluster";
pub const RESOURCE_GROUP: &str = "azurerm_resource_group";

/// Registry holding every built-in schema.
pub fn builtin_registry() -> SchemaRegistry {
    let mut registry = SchemaRegistry::new();
    registry.register(KUBERNETES_CLUSTER, kubernetes_cluster());
    registry.register(RESOURCE_GROUP, resource_group());
    registry
}

pub fn resource_group() -> Schema {
    Schema::new()
        .attribute("name", AttributeSchema::string().required())
        .attribute("location", AttributeSchema::string().required())
        .attribute("tags", AttributeSchema::map(ValueKind::String))
}

/// Managed Kubernetes cluster.
///
/// Add-on and access-control flags carry no default: the source decides.
pub fn kubernetes_cluster() -> Schema {
    Schema::new()
        .attribute("name", AttributeSchema::string().required())
        .attribute("location", AttributeSchema::string().required())
        .attribute("resource_group_name", AttributeSchema::string().required())
        .attribute("dns_prefix", AttributeSchema::string())
        .attribute("kubernetes_version", AttributeSchema::string())
        .attribute("node_resource_group", AttributeSchema::string())
        .attribute(
            "private_cluster_enabled",
            AttributeSchema::bool().with_default(AttributeValue::bool(false)),
        )
        .attribute(
            "sku_tier",
            AttributeSchema::string().with_default(AttributeValue::string("Free")),
        )
        .attribute(
            "api_server_authorized_ip_ranges",
            AttributeSchema::list(ValueKind::String),
        )
        .attribute("default_node_pool", AttributeSchema::block(node_pool()).required())
        .attribute(
            "identity",
            AttributeSchema::block(
                Schema::new().attribute("type", AttributeSchema::string().required()),
            ),
        )
        .attribute(
            "service_principal",
            AttributeSchema::block(
                Schema::new()
                    .attribute("client_id", AttributeSchema::string().required())
                    .attribute("client_secret", AttributeSchema::string().required()),
            ),
        )
        .attribute("addon_profile", AttributeSchema::block(addon_profile()))
        .attribute(
            "role_based_access_control",
            AttributeSchema::block(
                Schema::new().attribute("enabled", AttributeSchema::bool().required()),
            ),
        )
        .attribute("network_profile", AttributeSchema::block(network_profile()))
        .attribute("linux_profile", AttributeSchema::block(linux_profile()))
        .attribute("tags", AttributeSchema::map(ValueKind::String))
}

fn node_pool() -> Schema {
    Schema::new()
        .attribute("name", AttributeSchema::string().required())
        .attribute("vm_size", AttributeSchema::string().required())
        .attribute(
            "node_count",
            AttributeSchema::number()
                .required()
                .with_description("Initial number of nodes in the pool"),
        )
        .attribute(
            "type",
            AttributeSchema::string().with_default(AttributeValue::string("VirtualMachineScaleSets")),
        )
        .attribute(
            "enable_auto_scaling",
            AttributeSchema::bool().with_default(AttributeValue::bool(false)),
        )
        .attribute("min_count", AttributeSchema::number())
        .attribute("max_count", AttributeSchema::number())
        .attribute("max_pods", AttributeSchema::number())
        .attribute("os_disk_size_gb", AttributeSchema::number())
        .attribute("vnet_subnet_id", AttributeSchema::string())
        .attribute("availability_zones", AttributeSchema::list(ValueKind::String))
        .attribute("node_labels", AttributeSchema::map(ValueKind::String))
}

fn toggle() -> Schema {
    Schema::new().attribute("enabled", AttributeSchema::bool().required())
}

fn addon_profile() -> Schema {
    Schema::new()
        .attribute(
            "oms_agent",
            AttributeSchema::block(toggle().attribute(
                "log_analytics_workspace_id",
                AttributeSchema::string(),
            )),
        )
        .attribute("kube_dashboard", AttributeSchema::block(toggle()))
        .attribute("azure_policy", AttributeSchema::block(toggle()))
        .attribute("http_application_routing", AttributeSchema::block(toggle()))
}

fn network_profile() -> Schema {
    Schema::new()
        .attribute("network_plugin", AttributeSchema::string().required())
        .attribute("network_policy", AttributeSchema::string())
        .attribute("service_cidr", AttributeSchema::string())
        .attribute("dns_service_ip", AttributeSchema::string())
        .attribute(
            "load_balancer_sku",
            AttributeSchema::string().with_default(AttributeValue::string("Standard")),
        )
}

fn linux_profile() -> Schema {
    Schema::new()
        .attribute("admin_username", AttributeSchema::string().required())
        .attribute(
            "ssh_key",
            AttributeSchema::blocks(
                Schema::new().attribute("key_data", AttributeSchema::string().required()),
            )
            .required(),
        )
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::document::parse_document;
    use crate::variables::VariablesBuilder;
    use infradecl_core::{
        AttributePath, BuildError, EngineContext, ValidationError, build, build_all,
    };

    const AKS: &str = r#"
        variable "environment" default="dev"

        shared "azurerm_resource_group.example" {
            name "terragoat-dev"
            location "West US"
        }

        resource "azurerm_kubernetes_cluster" "k8s_cluster" {
            dns_prefix "terragoat-${var.environment}"
            location (ref)"azurerm_resource_group.example.location"
            name "terragoat-aks-${var.environment}"
            resource_group_name (ref)"azurerm_resource_group.example.name"
            identity type="SystemAssigned"
            default_node_pool {
                name "default"
                vm_size "Standard_D2_v2"
                node_count 2
            }
            addon_profile {
                oms_agent {
                    enabled #false
                }
                kube_dashboard {
                    enabled #true
                }
            }
            role_based_access_control {
                enabled #false
            }
            tags {
                git_commit "898d5beaec7ffdef6df0d7abecff407362e2a74e"
                git_repo "terragoat"
            }
        }
    "#;

    #[test]
    fn test_terragoat_cluster_builds() {
        let doc = parse_document(AKS).unwrap();
        let vars = VariablesBuilder::new().with_document(&doc).build();
        let built = build(&doc.resources[0], &kubernetes_cluster(), &vars).unwrap();
        let descriptor = built.descriptor;

        assert!(built.warnings.is_empty());
        assert_eq!(
            descriptor.attributes().get_key("name"),
            Some(&AttributeValue::string("terragoat-aks-dev"))
        );
        assert_eq!(
            descriptor.attributes().get_key("resource_group_name"),
            Some(&AttributeValue::string("terragoat-dev"))
        );
        assert_eq!(
            descriptor
                .attributes()
                .get(&AttributePath::from(["role_based_access_control", "enabled"]))
                .unwrap(),
            &AttributeValue::bool(false)
        );
        assert_eq!(
            descriptor
                .attributes()
                .get(&AttributePath::from(["default_node_pool", "type"]))
                .unwrap(),
            &AttributeValue::string("VirtualMachineScaleSets")
        );
        assert_eq!(
            descriptor.tags().get("git_repo").map(String::as_str),
            Some("terragoat")
        );
    }

    #[test]
    fn test_missing_node_count() {
        let doc = parse_document(&AKS.replace("node_count 2", "")).unwrap();
        let vars = VariablesBuilder::new().with_document(&doc).build();
        let err = build(&doc.resources[0], &kubernetes_cluster(), &vars).unwrap_err();
        assert_eq!(
            err,
            BuildError::Validate(ValidationError::MissingRequiredAttribute {
                path: AttributePath::from(["default_node_pool", "node_count"]),
            })
        );
    }

    #[test]
    fn test_rbac_flag_must_be_bool() {
        let mut doc = parse_document(AKS).unwrap();
        doc.resources[0]
            .attributes
            .set(
                &AttributePath::from(["role_based_access_control", "enabled"]),
                AttributeValue::string("false"),
            )
            .unwrap();
        let vars = VariablesBuilder::new().with_document(&doc).build();
        let err = build(&doc.resources[0], &kubernetes_cluster(), &vars).unwrap_err();
        assert!(matches!(
            err,
            BuildError::Validate(ValidationError::TypeMismatch { ref path, .. })
                if path.to_string() == "role_based_access_control.enabled"
        ));
    }

    #[test]
    fn test_engine_tag_does_not_override_declared() {
        let doc = parse_document(AKS).unwrap();
        let vars = VariablesBuilder::new().with_document(&doc).build();
        let engine = EngineContext::new().with_tag("git_repo", "other");
        let results = build_all(&doc.resources, &builtin_registry(), &vars, &engine);
        let built = results.into_iter().next().unwrap().unwrap();
        assert_eq!(
            built.descriptor.tags().get("git_repo").map(String::as_str),
            Some("terragoat")
        );
    }

    #[test]
    fn test_registry_contents() {
        let registry = builtin_registry();
        let types: Vec<&str> = registry.resource_types().collect();
        assert_eq!(types, vec![KUBERNETES_CLUSTER, RESOURCE_GROUP]);
    }
}
