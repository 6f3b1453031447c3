//! Error types for infradecl.
//!
//! Each stage of descriptor construction has its own error enum so callers
//! can tell where a failure came from. [`BuildError`] wraps them with the
//! stage name prefixed.

use crate::path::AttributePath;
use crate::value::ValueKind;
use thiserror::Error;

/// Errors raised while reading or editing an attribute tree.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum TreeError {
    #[error("attribute not found: {0}")]
    NotFound(AttributePath),

    #[error("invalid path {path}: {reason}")]
    InvalidPath { path: AttributePath, reason: String },

    #[error("cannot parse path '{input}': {reason}")]
    ParsePath { input: String, reason: String },
}

/// Errors raised while substituting variables into a tree.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ResolveError {
    #[error("unresolved reference: variable '{variable}' is not defined")]
    UnresolvedReference { variable: String },

    #[error("cyclic reference: variable '{variable}' refers to another variable ({chain})")]
    CyclicReference { variable: String, chain: String },
}

/// Fatal schema violations. Validation stops at the first one.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ValidationError {
    #[error("missing required attribute: {path}")]
    MissingRequiredAttribute { path: AttributePath },

    #[error("type mismatch at {path}: expected {expected}, found {actual}")]
    TypeMismatch {
        path: AttributePath,
        expected: ValueKind,
        actual: ValueKind,
    },
}

/// Errors raised while building a descriptor, prefixed with the failing stage.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum BuildError {
    #[error("resolve: {0}")]
    Resolve(#[from] ResolveError),

    #[error("validate: {0}")]
    Validate(#[from] ValidationError),

    #[error("schema: no schema registered for resource type '{0}'")]
    UnknownResourceType(String),
}

pub type TreeResult<T> = std::result::Result<T, TreeError>;
pub type ResolveResult<T> = std::result::Result<T, ResolveError>;
pub type ValidationResult<T> = std::result::Result<T, ValidationError>;
pub type BuildResult<T> = std::result::Result<T, BuildError>;
