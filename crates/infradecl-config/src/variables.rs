//! Variable sources for resolution.
//!
//! Sources, lowest precedence first:
//! - `variable` declarations with a `default` (exposed as `var.<name>`)
//! - `shared` entities (exposed as `<address>.<attribute>`)
//! - `INFRADECL_VAR_<name>` process environment variables
//! - explicit overrides, e.g. `--var environment=prod`

use crate::document::Document;
use crate::{ConfigError, ConfigResult};
use infradecl_core::{Scalar, Variables};
use tracing::debug;

/// Namespace for declared variables, as in `var.environment`.
pub const VAR_NAMESPACE: &str = "var";

/// Prefix of environment variables that set declared variables.
pub const ENV_PREFIX: &str = "INFRADECL_VAR_";

/// Full reference name for a declared variable.
pub fn var_name(name: &str) -> String {
    format!("{}.{}", VAR_NAMESPACE, name)
}

/// Split a `NAME=VALUE` assignment, inferring the value's type.
pub fn parse_assignment(assignment: &str) -> ConfigResult<(String, Scalar)> {
    match assignment.split_once('=') {
        Some((name, value)) if !name.trim().is_empty() => {
            Ok((name.trim().to_string(), Scalar::infer(value)))
        }
        _ => Err(ConfigError::InvalidAssignment(assignment.to_string())),
    }
}

/// Builder that layers variable sources by precedence.
#[derive(Debug, Clone, Default)]
pub struct VariablesBuilder {
    declared: Variables,
    shared: Variables,
    env: Variables,
    overrides: Variables,
}

impl VariablesBuilder {
    pub fn new() -> Self {
        Self::default()
    }

    /// Take declared defaults and shared entities from a document.
    pub fn with_document(mut self, document: &Document) -> Self {
        for decl in &document.variables {
            if let Some(default) = &decl.default {
                self.declared.set(var_name(&decl.name), default.clone());
            }
        }
        for entity in &document.shared {
            self.shared.insert_entity(&entity.address, &entity.attributes);
        }
        self
    }

    /// Read `INFRADECL_VAR_*` from the current process environment.
    pub fn with_process_env(self) -> Self {
        self.with_env_vars(std::env::vars())
    }

    /// Read `INFRADECL_VAR_*` entries from the given pairs.
    pub fn with_env_vars(mut self, vars: impl IntoIterator<Item = (String, String)>) -> Self {
        for (key, value) in vars {
            if let Some(name) = key.strip_prefix(ENV_PREFIX) {
                if !name.is_empty() {
                    debug!(variable = %name, "variable set from environment");
                    self.env.set(var_name(name), Scalar::infer(&value));
                }
            }
        }
        self
    }

    /// Override a declared variable.
    pub fn with_var(mut self, name: &str, value: impl Into<Scalar>) -> Self {
        self.overrides.set(var_name(name), value);
        self
    }

    /// Apply `NAME=VALUE` overrides, as given on the command line.
    pub fn with_assignments<S: AsRef<str>>(
        mut self,
        assignments: impl IntoIterator<Item = S>,
    ) -> ConfigResult<Self> {
        for assignment in assignments {
            let (name, value) = parse_assignment(assignment.as_ref())?;
            self.overrides.set(var_name(&name), value);
        }
        Ok(self)
    }

    pub fn build(self) -> Variables {
        let mut vars = self.declared;
        vars.extend(self.shared);
        vars.extend(self.env);
        vars.extend(self.overrides);
        vars
    }
}
