//! Inspect a single built descriptor.

use super::Workspace;
use crate::BuildArgs;
use anyhow::{Context, Result};
use infradecl_core::{AttributePath, AttributeValue};

pub async fn get(args: &BuildArgs, address: &str, attribute: &str) -> Result<()> {
    let workspace = Workspace::load(args).await?;
    let built = workspace.build_one(address)?;
    let descriptor = &built.descriptor;

    let value = if attribute == "tags" {
        serde_json::to_value(descriptor.tags())?
    } else {
        let path: AttributePath = attribute.parse()?;
        let value = descriptor
            .attributes()
            .get(&path)
            .with_context(|| format!("{} has no attribute {}", address, path))?;
        serde_json::to_value(value)?
    };

    println!("{}", serde_json::to_string_pretty(&value)?);
    Ok(())
}

pub async fn walk(args: &BuildArgs, address: &str) -> Result<()> {
    let workspace = Workspace::load(args).await?;
    let built = workspace.build_one(address)?;

    for (path, value) in built.descriptor.attributes().walk() {
        match value {
            AttributeValue::Scalar(s) => println!("{} = {}", path, s),
            AttributeValue::Block(tree) => println!("{} {{{} attribute(s)}}", path, tree.len()),
            AttributeValue::List(items) => println!("{} [{} item(s)]", path, items.len()),
            AttributeValue::Reference(name) => println!("{} = ${{{}}}", path, name),
            AttributeValue::Template(text) => println!("{} = {}", path, text),
        }
    }
    for (key, value) in built.descriptor.tags() {
        println!("tags.{} = {}", key, value);
    }
    Ok(())
}
