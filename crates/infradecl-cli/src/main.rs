//! infradecl CLI tool.

use clap::{Parser, Subcommand, ValueEnum};
use std::path::PathBuf;
use tracing_subscriber::EnvFilter;

mod commands;

#[derive(Parser)]
#[command(name = "infradecl")]
#[command(about = "Validate declarative resource descriptors", long_about = None)]
struct Cli {
    /// Log output format
    #[arg(long, env = "INFRADECL_LOG_FORMAT", value_enum, default_value_t = LogFormat::Text)]
    log_format: LogFormat,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Clone, Copy, ValueEnum)]
enum LogFormat {
    Text,
    Json,
}

#[derive(Clone, Copy, ValueEnum)]
pub enum OutputFormat {
    Text,
    Json,
}

/// Options shared by commands that build descriptors.
#[derive(clap::Args)]
pub struct BuildArgs {
    /// Path to the resource document
    #[arg(default_value = "main.kdl")]
    path: PathBuf,

    /// Set a variable (NAME=VALUE); overrides defaults and INFRADECL_VAR_*
    #[arg(long = "var", value_name = "NAME=VALUE")]
    vars: Vec<String>,

    /// Tag injected into every descriptor (KEY=VALUE); declared tags win
    #[arg(long = "tag", value_name = "KEY=VALUE")]
    tags: Vec<String>,

    /// Do not inject a trace_id tag
    #[arg(long)]
    no_trace: bool,
}

#[derive(Subcommand)]
enum Commands {
    /// Resolve and validate every resource in a document
    Validate {
        #[command(flatten)]
        build: BuildArgs,

        /// Output format
        #[arg(long, value_enum, default_value_t = OutputFormat::Text)]
        format: OutputFormat,

        /// Number of parallel build workers
        #[arg(long, short)]
        jobs: Option<usize>,
    },
    /// Print one attribute of a built descriptor as JSON
    Get {
        #[command(flatten)]
        build: BuildArgs,

        /// Resource address, e.g. azurerm_kubernetes_cluster.k8s_cluster
        address: String,

        /// Attribute path, e.g. default_node_pool.node_count
        attribute: String,
    },
    /// List every attribute path of a built descriptor
    Walk {
        #[command(flatten)]
        build: BuildArgs,

        /// Resource address
        address: String,
    },
    /// Show built-in schemas
    Schema {
        /// Resource type; lists known types when omitted
        resource_type: Option<String>,
    },
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    match cli.log_format {
        LogFormat::Text => tracing_subscriber::fmt()
            .with_env_filter(filter)
            .with_writer(std::io::stderr)
            .init(),
        LogFormat::Json => tracing_subscriber::fmt()
            .json()
            .with_env_filter(filter)
            .with_writer(std::io::stderr)
            .init(),
    }

    match cli.command {
        Commands::Validate {
            build,
            format,
            jobs,
        } => {
            commands::validate::run(&build, format, jobs).await?;
        }
        Commands::Get {
            build,
            address,
            attribute,
        } => {
            commands::inspect::get(&build, &address, &attribute).await?;
        }
        Commands::Walk { build, address } => {
            commands::inspect::walk(&build, &address).await?;
        }
        Commands::Schema { resource_type } => {
            commands::schema::show(resource_type.as_deref())?;
        }
    }

    Ok(())
}
