//! Show built-in schemas.

use anyhow::{Result, anyhow};
use infradecl_config::builtin_registry;

pub fn show(resource_type: Option<&str>) -> Result<()> {
    let registry = builtin_registry();

    let Some(resource_type) = resource_type else {
        for name in registry.resource_types() {
            println!("{}", name);
        }
        return Ok(());
    };

    let schema = registry
        .get(resource_type)
        .ok_or_else(|| anyhow!("No built-in schema for '{}'", resource_type))?;
    println!("{}", serde_json::to_string_pretty(schema.as_ref())?);
    Ok(())
}
