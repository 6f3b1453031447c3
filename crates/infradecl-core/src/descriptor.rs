//! Resource descriptors: validated attribute trees bound to an identity.
//!
//! [`build`] composes [`resolve`] and [`validate`] and lifts the `tags`
//! attribute into a separate tag map. Descriptors are immutable; any change
//! means building again from the raw resource.

use crate::error::{BuildError, BuildResult, ValidationError};
use crate::id::TraceId;
use crate::path::AttributePath;
use crate::resolve::{ResolvedTree, resolve};
use crate::schema::{Schema, SchemaRegistry};
use crate::tree::AttributeTree;
use crate::validate::{Validated, ValidationWarning, validate};
use crate::value::{AttributeValue, ValueKind};
use crate::variable::Variables;
use serde::Serialize;
use std::collections::BTreeMap;
use tracing::{debug, debug_span};

/// Attribute lifted out of the tree into the descriptor's tag map.
pub const TAGS_ATTRIBUTE: &str = "tags";

/// Tag key used for the engine's trace id.
pub const TRACE_TAG: &str = "trace_id";

/// A resource as declared in source, before resolution and validation.
#[derive(Debug, Clone, PartialEq)]
pub struct RawResource {
    pub resource_type: String,
    pub name: String,
    pub attributes: AttributeTree,
}

impl RawResource {
    pub fn new(resource_type: &str, name: &str, attributes: AttributeTree) -> Self {
        Self {
            resource_type: resource_type.to_string(),
            name: name.to_string(),
            attributes,
        }
    }

    /// `type.name`, the way the resource is referred to elsewhere.
    pub fn address(&self) -> String {
        format!("{}.{}", self.resource_type, self.name)
    }
}

/// Tags a provisioning engine stamps onto every descriptor it builds.
#[derive(Debug, Clone, Default)]
pub struct EngineContext {
    tags: BTreeMap<String, String>,
}

impl EngineContext {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_tag(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.tags.insert(key.into(), value.into());
        self
    }

    /// Inject `trace_id` into every descriptor.
    pub fn with_trace(self, trace_id: TraceId) -> Self {
        self.with_tag(TRACE_TAG, trace_id.to_string())
    }

    pub fn tags(&self) -> &BTreeMap<String, String> {
        &self.tags
    }
}

/// A resolved, validated resource ready for a provisioning engine.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ResourceDescriptor {
    resource_type: String,
    name: String,
    attributes: ResolvedTree,
    tags: BTreeMap<String, String>,
}

impl ResourceDescriptor {
    pub fn resource_type(&self) -> &str {
        &self.resource_type
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn address(&self) -> String {
        format!("{}.{}", self.resource_type, self.name)
    }

    /// Attributes with defaults applied, excluding `tags`.
    pub fn attributes(&self) -> &ResolvedTree {
        &self.attributes
    }

    /// Declared tags merged over engine-injected tags.
    pub fn tags(&self) -> &BTreeMap<String, String> {
        &self.tags
    }
}

/// A descriptor plus the warnings raised while validating it.
#[derive(Debug, Clone, PartialEq)]
pub struct Built {
    pub descriptor: ResourceDescriptor,
    pub warnings: Vec<ValidationWarning>,
}

/// Resolve and validate `raw` against `schema`.
pub fn build(raw: &RawResource, schema: &Schema, variables: &Variables) -> BuildResult<Built> {
    build_with(raw, schema, variables, &EngineContext::default())
}

/// Like [`build`], merging in tags injected by the engine. Declared tags win.
pub fn build_with(
    raw: &RawResource,
    schema: &Schema,
    variables: &Variables,
    engine: &EngineContext,
) -> BuildResult<Built> {
    let span = debug_span!("build", address = %raw.address());
    let _guard = span.enter();

    let resolved = resolve(&raw.attributes, variables)?;
    let Validated { tree, warnings } = validate(schema, &resolved)?;

    let mut attributes = tree.into_inner();
    let declared = match attributes.remove(TAGS_ATTRIBUTE) {
        Some(AttributeValue::Block(tags)) => tag_map(&tags)?,
        Some(other) => {
            return Err(BuildError::from(ValidationError::TypeMismatch {
                path: AttributePath::from([TAGS_ATTRIBUTE]),
                expected: ValueKind::Block,
                actual: other.kind(),
            }));
        }
        None => BTreeMap::new(),
    };

    let mut tags = engine.tags().clone();
    tags.extend(declared);

    debug!(tags = tags.len(), warnings = warnings.len(), "built descriptor");

    Ok(Built {
        descriptor: ResourceDescriptor {
            resource_type: raw.resource_type.clone(),
            name: raw.name.clone(),
            attributes: ResolvedTree::new_unchecked(attributes),
            tags,
        },
        warnings,
    })
}

/// Build every resource independently. A failure in one never affects the others.
pub fn build_all(
    raws: &[RawResource],
    registry: &SchemaRegistry,
    variables: &Variables,
    engine: &EngineContext,
) -> Vec<BuildResult<Built>> {
    raws.iter()
        .map(|raw| {
            let schema = registry
                .get(&raw.resource_type)
                .ok_or_else(|| BuildError::UnknownResourceType(raw.resource_type.clone()))?;
            build_with(raw, &schema, variables, engine)
        })
        .collect()
}

fn tag_map(tags: &AttributeTree) -> BuildResult<BTreeMap<String, String>> {
    tags.iter()
        .map(|(key, value)| match value {
            AttributeValue::Scalar(s) => Ok((key.to_string(), s.to_string())),
            other => Err(BuildError::from(ValidationError::TypeMismatch {
                path: AttributePath::from([TAGS_ATTRIBUTE, key]),
                expected: ValueKind::String,
                actual: other.kind(),
            })),
        })
        .collect()
}
