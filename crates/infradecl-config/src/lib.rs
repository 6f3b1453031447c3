//! KDL configuration loading for infradecl.
//!
//! This crate handles:
//! - Resource documents (`variable`, `shared` and `resource` nodes)
//! - Variable sources and their precedence
//! - Built-in resource schemas

pub mod document;
pub mod error;
pub mod schemas;
pub mod variables;

pub use document::{Document, SharedEntity, VariableDecl, parse_document};
pub use error::{ConfigError, ConfigResult};
pub use schemas::builtin_registry;
pub use variables::VariablesBuilder;
