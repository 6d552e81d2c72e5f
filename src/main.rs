//! db-router command line.
//!
//! ```text
//! db-router --config router.toml check
//! db-router --config router.toml route 17 --table user_order --split-table
//! db-router --config router.toml watch
//! ```

use std::error::Error;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use clap::{Parser, Subcommand};
use serde::Serialize;

use db_router::config::{load_config, watcher::ConfigWatcher, RouterFileConfig, StrategyKind};
use db_router::observability::logging::init_logging;
use db_router::routing::{RouteArgs, RouteInterceptor, RoutingContext, SharedInterceptor};
use db_router::target::{physical_table, DataSourceRegistry};
use db_router::RouteError;

#[derive(Parser)]
#[command(name = "db-router")]
#[command(about = "Inspect and exercise shard/table routing", long_about = None)]
struct Cli {
    /// Path to the TOML configuration file
    #[arg(short, long, default_value = "db-router.toml")]
    config: PathBuf,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Validate the configuration file
    Check,
    /// Show where a routing key lands
    Route {
        /// Routing key value
        key: String,
        /// Override the configured strategy (mod, hash)
        #[arg(short, long)]
        strategy: Option<StrategyKind>,
        /// Logical table name to resolve to its physical name
        #[arg(short, long)]
        table: Option<String>,
        /// Rewrite the table name with the routed table index
        #[arg(long)]
        split_table: bool,
    },
    /// Watch the configuration file and reload on change
    Watch,
}

#[derive(Debug, Serialize)]
struct RouteReport {
    key: String,
    strategy: &'static str,
    shard_index: Option<String>,
    table_index: Option<String>,
    datasource: String,
    datasource_url: Option<String>,
    table: Option<String>,
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn Error>> {
    let cli = Cli::parse();

    let config = match load_config(&cli.config) {
        Ok(config) => config,
        Err(e) => {
            eprintln!("Invalid configuration {}: {}", cli.config.display(), e);
            return Err(e.into());
        }
    };
    init_logging(&config.observability.log_level);

    match cli.command {
        Commands::Check => {
            println!(
                "{} ok: {} shard(s), {} table(s), strategy {}",
                cli.config.display(),
                config.router.shard_count,
                config.router.table_count,
                config.router.strategy
            );
        }
        Commands::Route {
            key,
            strategy,
            table,
            split_table,
        } => {
            let report = route(&config, &key, strategy, table.as_deref(), split_table)?;
            println!("{}", serde_json::to_string_pretty(&report)?);
        }
        Commands::Watch => watch(&cli.config, &config).await?,
    }

    Ok(())
}

fn route(
    config: &RouterFileConfig,
    key: &str,
    strategy: Option<StrategyKind>,
    table: Option<&str>,
    split_table: bool,
) -> Result<RouteReport, RouteError> {
    let mut routing = config.router.clone();
    if let Some(kind) = strategy {
        routing.strategy = kind;
    }
    let interceptor = RouteInterceptor::from_config(routing)?;
    let registry = DataSourceRegistry::from_config(&config.datasources);

    // a lone string argument is the key, so the attribute name is irrelevant
    interceptor.wrap(Some("key"), &RouteArgs::from(key), || {
        let decision = RoutingContext::get();
        Ok(RouteReport {
            key: key.to_string(),
            strategy: interceptor.strategy().name(),
            shard_index: decision.as_ref().map(|d| d.shard_index.clone()),
            table_index: decision.and_then(|d| d.table_index),
            datasource: registry.lookup_key(),
            datasource_url: registry.current().map(|(_, source)| source.url.clone()),
            table: table.map(|logical| physical_table(logical, split_table)),
        })
    })
}

async fn watch(path: &Path, config: &RouterFileConfig) -> Result<(), Box<dyn Error>> {
    let shared = Arc::new(SharedInterceptor::from_config(config, None)?);

    let (watcher, updates) = ConfigWatcher::new(path);
    let _handle = watcher.run()?;
    tokio::spawn(shared.clone().follow(updates));

    tracing::info!(path = %path.display(), "Watching configuration, press Ctrl+C to stop");
    tokio::signal::ctrl_c().await?;
    tracing::info!("Shutdown signal received");
    Ok(())
}
