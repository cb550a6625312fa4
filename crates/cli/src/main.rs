//! CLI for the boxgate metadata guard.
//!
//! Every command loads a layout config and a world snapshot, then runs one
//! request: config -> registry -> snapshot -> gatekeeper -> output.

use boxgate_core::{Actor, Metadata, MutationRequest, PatchOperation};
use boxgate_engine::Gatekeeper;
use boxgate_provider::{BoxRegistry, LayoutConfig, Snapshot};
use clap::{Args, Parser, Subcommand};
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::Instant;

#[derive(Parser, Debug)]
#[command(name = "boxgate", version, about = "Field-level metadata visibility and mutation guard")]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Args, Debug)]
struct Target {
    /// Layout configuration (JSON).
    #[arg(short, long, env = "BOXGATE_CONFIG")]
    config: PathBuf,

    /// Snapshot of persons, groups, grants and items (JSON).
    #[arg(short, long, env = "BOXGATE_SNAPSHOT")]
    snapshot: PathBuf,

    /// Acting person id; anonymous when omitted.
    #[arg(short, long)]
    actor: Option<String>,

    #[arg(short, long)]
    item: String,

    #[arg(long, default_value_t = false)]
    json: bool,
}

#[derive(Subcommand, Debug)]
enum Commands {
    /// Print the item's metadata as the actor may see it.
    View {
        #[command(flatten)]
        target: Target,
    },

    /// Apply a list of patch operations (JSON array).
    Patch {
        #[command(flatten)]
        target: Target,

        #[arg(long)]
        ops: PathBuf,
    },

    /// Replace the item's metadata with a full representation (JSON object).
    Replace {
        #[command(flatten)]
        target: Target,

        #[arg(long)]
        metadata: PathBuf,
    },

    /// Show per-box read/write grants for the actor on the item.
    Explain {
        #[command(flatten)]
        target: Target,
    },

    /// Validate a layout configuration and print its boxes.
    CheckConfig {
        #[arg(short, long, env = "BOXGATE_CONFIG")]
        config: PathBuf,
    },
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info")),
        )
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();

    match cli.command {
        Commands::View { target } => {
            let (gatekeeper, actor) = open(&target)?;
            let item = gatekeeper.read(&actor, &target.item).await?;
            if target.json {
                println!("{}", serde_json::to_string_pretty(&item)?);
            } else {
                print_metadata(&item.metadata);
            }
        }

        Commands::Patch { target, ops } => {
            let raw = read(&ops)?;
            let ops: Vec<PatchOperation> = serde_json::from_str(&raw)?;
            mutate(&target, MutationRequest::Patch(ops)).await?;
        }

        Commands::Replace { target, metadata } => {
            let raw = read(&metadata)?;
            let metadata: Metadata = serde_json::from_str(&raw)?;
            mutate(&target, MutationRequest::Replace(metadata)).await?;
        }

        Commands::Explain { target } => {
            let (gatekeeper, actor) = open(&target)?;
            let report = gatekeeper.explain(&actor, &target.item).await?;
            if target.json {
                println!("{}", serde_json::to_string_pretty(&report)?);
            } else {
                print!("{}", report.render());
            }
        }

        Commands::CheckConfig { config } => {
            let registry = load_registry(&config)?;
            let mut entity_types: Vec<&str> = registry.entity_types().collect();
            entity_types.sort_unstable();
            for entity_type in entity_types {
                println!("{entity_type}");
                for layout_box in registry.boxes_of(entity_type) {
                    println!(
                        "  {} [{}] {} field(s)",
                        layout_box.shortname,
                        layout_box.security,
                        layout_box.fields.len()
                    );
                }
            }
            println!("ok");
        }
    }

    Ok(())
}

type MemoryGatekeeper = Gatekeeper<
    boxgate_provider::MemoryStore,
    Arc<boxgate_provider::StaticDirectory>,
    boxgate_provider::PolicyTable,
>;

fn open(target: &Target) -> Result<(MemoryGatekeeper, Actor), Box<dyn std::error::Error>> {
    let registry = load_registry(&target.config)?;
    let backend = Snapshot::from_path(&target.snapshot)?.into_backend();
    let actor = target
        .actor
        .as_deref()
        .map_or(Actor::Anonymous, Actor::person);

    tracing::info!(%actor, item = %target.item, "opened snapshot");

    let gatekeeper = Gatekeeper::new(
        Arc::new(registry),
        backend.store,
        backend.directory,
        backend.policy,
    );
    Ok((gatekeeper, actor))
}

async fn mutate(target: &Target, request: MutationRequest) -> Result<(), Box<dyn std::error::Error>> {
    let t0 = Instant::now();
    let (gatekeeper, actor) = open(target)?;

    let outcome = match gatekeeper.mutate(&actor, &target.item, &request).await {
        Ok(outcome) => outcome,
        Err(e) => {
            tracing::error!(status = e.status_code(), error = %e, "mutation failed");
            return Err(e.into());
        }
    };

    tracing::info!(
        version = outcome.version,
        touched = outcome.touched.len(),
        elapsed_ms = t0.elapsed().as_millis(),
        "mutation accepted"
    );

    if target.json {
        println!("{}", serde_json::to_string_pretty(&outcome.visible)?);
    } else {
        println!("version {}", outcome.version);
        println!("touched: {}", outcome.touched.join(", "));
        print_metadata(&outcome.visible);
    }
    Ok(())
}

fn load_registry(path: &Path) -> Result<BoxRegistry, Box<dyn std::error::Error>> {
    let config = LayoutConfig::from_path(path)?;
    Ok(BoxRegistry::from_config(config)?)
}

fn read(path: &Path) -> Result<String, Box<dyn std::error::Error>> {
    Ok(std::fs::read_to_string(path)
        .map_err(|e| format!("cannot read {}: {e}", path.display()))?)
}

fn print_metadata(metadata: &Metadata) {
    for (field, values) in metadata.iter() {
        for (i, value) in values.iter().enumerate() {
            match &value.authority {
                Some(authority) => println!("{field}[{i}] = {} ({authority})", value.value),
                None => println!("{field}[{i}] = {}", value.value),
            }
        }
    }
}
