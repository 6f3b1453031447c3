//! Validate every resource in a document.

use super::Workspace;
use crate::{BuildArgs, OutputFormat};
use anyhow::Result;
use infradecl_core::{ResourceDescriptor, ValidationWarning};
use serde::Serialize;
use tracing::{error, info};

#[derive(Serialize)]
struct Report {
    address: String,
    valid: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    descriptor: Option<ResourceDescriptor>,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    warnings: Vec<ValidationWarning>,
    #[serde(skip_serializing_if = "Option::is_none")]
    error: Option<String>,
}

pub async fn run(args: &BuildArgs, format: OutputFormat, jobs: Option<usize>) -> Result<()> {
    let workspace = Workspace::load(args).await?;
    let jobs = jobs.unwrap_or_else(|| {
        std::thread::available_parallelism()
            .map(|n| n.get())
            .unwrap_or(1)
    });

    let results = workspace.build_parallel(jobs).await?;

    let reports: Vec<Report> = results
        .into_iter()
        .map(|(address, result)| match result {
            Ok(built) => Report {
                address,
                valid: true,
                descriptor: Some(built.descriptor),
                warnings: built.warnings,
                error: None,
            },
            Err(e) => {
                error!(address = %address, error = %e, "descriptor failed");
                Report {
                    address,
                    valid: false,
                    descriptor: None,
                    warnings: Vec::new(),
                    error: Some(e.to_string()),
                }
            }
        })
        .collect();

    let failed = reports.iter().filter(|r| !r.valid).count();
    info!(total = reports.len(), failed, "validation finished");

    match format {
        OutputFormat::Json => {
            println!("{}", serde_json::to_string_pretty(&reports)?);
        }
        OutputFormat::Text => {
            for report in &reports {
                match &report.error {
                    None => println!("✓ {}", report.address),
                    Some(e) => println!("✗ {}: {}", report.address, e),
                }
                for warning in &report.warnings {
                    println!("  ! {}", warning);
                }
            }
            println!("\n{} resource(s), {} invalid", reports.len(), failed);
        }
    }

    if failed > 0 {
        anyhow::bail!("{} resource(s) failed validation", failed);
    }
    Ok(())
}
