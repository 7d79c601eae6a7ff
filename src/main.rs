use anyhow::{Context, Result};
use clap::Parser;
use std::path::PathBuf;

use newswire::config::Config;
use newswire::ingest::NewsService;
use newswire::storage::Database;

/// Thin front over the ingestion library: resolve a source, call
/// `get_items`, print the JSON envelope. All logic lives in the library.
#[derive(Parser, Debug)]
#[command(name = "newswire", about = "News feed ingestion with a deduplicating cache")]
struct Args {
    /// Path to the TOML config file (default: ~/.config/newswire/config.toml)
    #[arg(long, value_name = "FILE")]
    config: Option<PathBuf>,

    /// Override the database path from the config
    #[arg(long, value_name = "FILE")]
    db: Option<String>,

    /// Source identifier to fetch (or serve from cache)
    #[arg(long, value_name = "ID")]
    source: Option<String>,

    /// List configured source identifiers and exit
    #[arg(long)]
    list_sources: bool,

    /// Pretty-print the JSON output
    #[arg(long)]
    pretty: bool,
}

fn default_config_path() -> PathBuf {
    match std::env::var("HOME") {
        Ok(home) => PathBuf::from(home)
            .join(".config")
            .join("newswire")
            .join("config.toml"),
        Err(_) => PathBuf::from("newswire.toml"),
    }
}

fn print_json(value: &serde_json::Value, pretty: bool) -> Result<()> {
    let encoded = if pretty {
        serde_json::to_string_pretty(value)
    } else {
        serde_json::to_string(value)
    }
    .context("Failed to encode JSON output")?;
    println!("{encoded}");
    Ok(())
}

#[tokio::main]
async fn main() -> Result<()> {
    // Initialize tracing for debug logging
    tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
        .init();

    let args = Args::parse();

    let config_path = args.config.clone().unwrap_or_else(default_config_path);
    let mut config = Config::load(&config_path).context("Failed to load configuration")?;
    if let Some(db_path) = args.db {
        config.database_path = db_path;
    }

    if args.list_sources {
        let mut names: Vec<&String> = config.sources.keys().collect();
        names.sort_unstable();
        for name in names {
            println!("{name}");
        }
        return Ok(());
    }

    let Some(source) = args.source else {
        anyhow::bail!("Nothing to do: pass --source <ID> or --list-sources");
    };

    let db = Database::open(&config.database_path)
        .await
        .context("Failed to open database")?;
    let service = NewsService::new(db, &config);

    match service.get_items(&source).await {
        Ok(response) => {
            tracing::info!(
                source = %source,
                cached = response.cached,
                count = response.items.len(),
                "Request served"
            );
            let mut envelope =
                serde_json::to_value(&response).context("Failed to encode response")?;
            if let Some(object) = envelope.as_object_mut() {
                object.insert("success".to_string(), serde_json::Value::Bool(true));
            }
            print_json(&envelope, args.pretty)?;
        }
        Err(e) => {
            tracing::error!(source = %source, error = %e, "Request failed");
            let envelope = serde_json::json!({
                "success": false,
                "source": source,
                "error": e.to_string(),
            });
            print_json(&envelope, args.pretty)?;
            std::process::exit(1);
        }
    }

    Ok(())
}
