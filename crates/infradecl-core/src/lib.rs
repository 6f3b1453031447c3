//! Declarative resource-configuration model for infradecl.
//!
//! This crate contains:
//! - Attribute values, paths and trees
//! - Variables and the resolver that substitutes them
//! - Schemas and the validator
//! - Resource descriptors handed to a provisioning engine
//!
//! Everything here is a pure computation over in-memory trees. Descriptors
//! share no state, so callers may build them in parallel.

pub mod descriptor;
pub mod error;
pub mod id;
pub mod path;
pub mod resolve;
pub mod schema;
pub mod tree;
pub mod validate;
pub mod value;
pub mod variable;

pub use descriptor::{
    Built, EngineContext, RawResource, ResourceDescriptor, build, build_all, build_with,
};
pub use error::{BuildError, ResolveError, TreeError, ValidationError};
pub use id::TraceId;
pub use path::{AttributePath, PathSegment};
pub use resolve::{ResolvedTree, resolve};
pub use schema::{AttributeSchema, Schema, SchemaRegistry};
pub use tree::AttributeTree;
pub use validate::{Validated, ValidationWarning, validate};
pub use value::{AttributeValue, Scalar, ValueKind};
pub use variable::{VariableValue, Variables};
