use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use serde::Serialize;
use serde_json::Value;
use tracing::info;
use tracing_subscriber::EnvFilter;
use uuid::Uuid;

use tierstore::config::Config;
use tierstore::events::{EventSink, StorageEvent};
use tierstore::models::ListQuery;
use tierstore::AppContext;

#[derive(Parser)]
#[command(name = "tierstore", version, about = "Size-routed record storage")]
struct Cli {
    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Store a new record; PAYLOAD is inline JSON or @path/to/file.json
    Save {
        #[arg(long)]
        owner: String,
        #[arg(long)]
        collection: String,
        payload: String,
    },
    /// Print a record and its payload
    Get {
        #[arg(long)]
        owner: String,
        id: Uuid,
    },
    /// Replace a record's payload
    Update {
        #[arg(long)]
        owner: String,
        id: Uuid,
        payload: String,
    },
    /// Delete a record and its blob
    Delete {
        #[arg(long)]
        owner: String,
        id: Uuid,
    },
    /// List record metadata, newest first
    List {
        #[arg(long)]
        owner: String,
        #[arg(long)]
        collection: Option<String>,
        #[arg(long)]
        limit: Option<i64>,
        #[arg(long)]
        skip: Option<i64>,
    },
    /// Per-collection counts and sizes
    Collections {
        #[arg(long)]
        owner: String,
    },
}

async fn read_payload(arg: &str) -> Result<Value> {
    let text = match arg.strip_prefix('@') {
        Some(path) => tokio::fs::read_to_string(path)
            .await
            .with_context(|| format!("Failed to read payload file {}", path))?,
        None => arg.to_string(),
    };
    serde_json::from_str(&text).context("Payload is not valid JSON")
}

fn print_json<T: Serialize>(value: &T) -> Result<()> {
    println!("{}", serde_json::to_string_pretty(value)?);
    Ok(())
}

#[tokio::main]
async fn main() -> Result<()> {
    dotenvy::dotenv().ok();

    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();
    let config = Config::from_env()?;
    info!("Using {} blob backend", config.blob_backend);

    let ctx = AppContext::from_config(config).await?;
    let router = ctx.router();

    match cli.command {
        Command::Save { owner, collection, payload } => {
            let payload = read_payload(&payload).await?;
            let record = router.save(&owner, &collection, payload).await?;
            ctx.events.emit(&StorageEvent::Created {
                owner_id: owner,
                id: record.id,
                collection: record.collection.clone(),
                tier: record.tier(),
                size_bytes: record.size_bytes,
            });
            print_json(&record)?;
        }
        Command::Get { owner, id } => match router.retrieve(&owner, id).await? {
            Some(record) => print_json(&record)?,
            None => anyhow::bail!("Record {} not found", id),
        },
        Command::Update { owner, id, payload } => {
            let payload = read_payload(&payload).await?;
            match router.update_with_user(&owner, id, payload).await? {
                Some(outcome) => {
                    ctx.events.emit(&StorageEvent::Updated {
                        owner_id: owner,
                        id,
                        tier: outcome.tier,
                        size_bytes: outcome.size_bytes,
                    });
                    print_json(&outcome)?;
                }
                None => anyhow::bail!("Record {} not found", id),
            }
        }
        Command::Delete { owner, id } => {
            let outcome = router.delete_with_user(&owner, id).await?;
            if outcome.success {
                ctx.events.emit(&StorageEvent::Deleted {
                    owner_id: owner,
                    id,
                    freed_bytes: outcome.freed_bytes,
                });
            }
            print_json(&outcome)?;
        }
        Command::List { owner, collection, limit, skip } => {
            let page = router.list(&owner, &ListQuery { collection, limit, skip }).await?;
            print_json(&page)?;
        }
        Command::Collections { owner } => {
            print_json(&router.collections(&owner).await?)?;
        }
    }

    Ok(())
}
