//! CLI command implementations.

pub mod inspect;
pub mod schema;
pub mod validate;

use crate::BuildArgs;
use anyhow::{Context, Result, anyhow, bail};
use futures::future::join_all;
use infradecl_config::{Document, VariablesBuilder, builtin_registry, parse_document};
use infradecl_core::error::BuildResult;
use infradecl_core::{Built, EngineContext, RawResource, TraceId, Variables, build_all};
use std::sync::Arc;
use tracing::info;

/// A loaded document with everything needed to build its resources.
pub struct Workspace {
    pub document: Document,
    pub variables: Variables,
    pub engine: EngineContext,
}

impl Workspace {
    pub async fn load(args: &BuildArgs) -> Result<Self> {
        let content = tokio::fs::read_to_string(&args.path)
            .await
            .with_context(|| format!("Failed to read document: {}", args.path.display()))?;
        let document = parse_document(&content)
            .with_context(|| format!("Failed to parse document: {}", args.path.display()))?;

        let variables = VariablesBuilder::new()
            .with_document(&document)
            .with_process_env()
            .with_assignments(&args.vars)?
            .build();

        let mut engine = EngineContext::new();
        if !args.no_trace {
            let trace_id = TraceId::new();
            info!(%trace_id, "starting build");
            engine = engine.with_trace(trace_id);
        }
        for tag in &args.tags {
            let (key, value) = parse_tag(tag)?;
            engine = engine.with_tag(key, value);
        }

        Ok(Self {
            document,
            variables,
            engine,
        })
    }

    pub fn resource(&self, address: &str) -> Result<&RawResource> {
        self.document
            .resources
            .iter()
            .find(|r| r.address() == address)
            .ok_or_else(|| anyhow!("No resource named '{}' in document", address))
    }

    /// Build one resource.
    pub fn build_one(&self, address: &str) -> Result<Built> {
        let raw = self.resource(address)?;
        let mut results = build_all(
            std::slice::from_ref(raw),
            &builtin_registry(),
            &self.variables,
            &self.engine,
        );
        let result = results
            .pop()
            .ok_or_else(|| anyhow!("No result for '{}'", address))?;
        Ok(result?)
    }

    /// Build every resource on the blocking pool, `jobs` workers at a time.
    /// Results come back in document order.
    pub async fn build_parallel(self, jobs: usize) -> Result<Vec<(String, BuildResult<Built>)>> {
        let resources = self.document.resources;
        if resources.is_empty() {
            return Ok(Vec::new());
        }

        let registry = Arc::new(builtin_registry());
        let variables = Arc::new(self.variables);
        let engine = Arc::new(self.engine);
        let chunk_size = resources.len().div_ceil(jobs.max(1));

        let handles = resources.chunks(chunk_size).map(|chunk| {
            let chunk = chunk.to_vec();
            let registry = Arc::clone(&registry);
            let variables = Arc::clone(&variables);
            let engine = Arc::clone(&engine);
            tokio::task::spawn_blocking(move || {
                let results = build_all(&chunk, &registry, &variables, &engine);
                chunk
                    .iter()
                    .map(RawResource::address)
                    .zip(results)
                    .collect::<Vec<_>>()
            })
        });

        let mut out = Vec::new();
        for handle in join_all(handles).await {
            out.extend(handle.context("Build worker panicked")?);
        }
        Ok(out)
    }
}

/// Split a `KEY=VALUE` tag. The value is kept verbatim.
fn parse_tag(tag: &str) -> Result<(&str, &str)> {
    match tag.split_once('=') {
        Some((key, value)) if !key.trim().is_empty() => Ok((key.trim(), value)),
        _ => bail!("Invalid --tag '{}': expected KEY=VALUE", tag),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use infradecl_core::BuildError;

    fn workspace() -> Workspace {
        let document = parse_document(
            r#"
            variable "environment" default="dev"

            resource "azurerm_resource_group" "first" {
                name "rg-${var.environment}"
                location "West US"
            }
            resource "azurerm_resource_group" "second" {
                location "West US"
            }
            resource "azurerm_storage_account" "logs" {
                name "logs"
            }
            resource "azurerm_resource_group" "third" {
                name "rg-3"
                location "East US"
                tags {
                    team "platform"
                }
            }
            "#,
        )
        .unwrap();
        let variables = VariablesBuilder::new().with_document(&document).build();
        Workspace {
            document,
            variables,
            engine: EngineContext::new().with_tag("team", "engine"),
        }
    }

    #[tokio::test]
    async fn test_build_parallel_keeps_order_and_isolates_failures() {
        let results = workspace().build_parallel(3).await.unwrap();
        let addresses: Vec<&str> = results.iter().map(|(a, _)| a.as_str()).collect();
        assert_eq!(
            addresses,
            vec![
                "azurerm_resource_group.first",
                "azurerm_resource_group.second",
                "azurerm_storage_account.logs",
                "azurerm_resource_group.third",
            ]
        );
        assert!(results[0].1.is_ok());
        assert!(matches!(results[1].1, Err(BuildError::Validate(_))));
        assert!(matches!(
            results[2].1,
            Err(BuildError::UnknownResourceType(_))
        ));
        let third = results[3].1.as_ref().unwrap();
        assert_eq!(
            third.descriptor.tags().get("team").map(String::as_str),
            Some("platform")
        );
    }

    #[test]
    fn test_parse_tag_keeps_value_text() {
        assert_eq!(parse_tag("build=007").unwrap(), ("build", "007"));
        assert_eq!(parse_tag("ratio=1e3").unwrap(), ("ratio", "1e3"));
        assert_eq!(parse_tag("enabled=true").unwrap(), ("enabled", "true"));
        assert_eq!(parse_tag("expr=a=b").unwrap(), ("expr", "a=b"));
        assert!(parse_tag("no-separator").is_err());
        assert!(parse_tag("=value").is_err());
    }

    #[test]
    fn test_tag_value_reaches_descriptor_verbatim() {
        let mut workspace = workspace();
        let (key, value) = parse_tag("build=007").unwrap();
        workspace.engine = workspace.engine.with_tag(key, value);
        let built = workspace.build_one("azurerm_resource_group.first").unwrap();
        assert_eq!(
            built.descriptor.tags().get("build").map(String::as_str),
            Some("007")
        );
    }

    #[test]
    fn test_build_one() {
        let built = workspace().build_one("azurerm_resource_group.first").unwrap();
        assert_eq!(
            built.descriptor.tags().get("team").map(String::as_str),
            Some("engine")
        );
        assert!(workspace().build_one("azurerm_resource_group.missing").is_err());
    }
}
