use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use database::{MetaInfo, PgPlugin, SqlArg};
use tracing_subscriber::{EnvFilter, fmt};

/// The main entry point for the pgmeta host application.
#[tokio::main]
async fn main() -> Result<()> {
    // Load PGMETA_* overrides from a .env file when one is present.
    dotenvy::dotenv().ok();

    // Logs go to stderr through a background writer; keep the guard alive
    // so buffered lines are flushed on exit.
    let (writer, _guard) = tracing_appender::non_blocking(std::io::stderr());
    fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .with_writer(writer)
        .init();

    // Parse command-line arguments
    let cli = Cli::parse();

    let config = configuration::load_config(&cli.config)
        .with_context(|| format!("failed to load configuration from '{}'", cli.config))?;

    // Lifecycle: the connect hook runs once at startup, everything else after it.
    let plugin = PgPlugin::new(config.pg);
    plugin.connect_hook();

    match cli.command {
        Commands::Get => handle_get(&plugin).await,
        Commands::Set { value } => handle_set(&plugin, &value).await,
        Commands::Query { sql, args } => handle_query(&plugin, &sql, args).await,
    }
}

// ==============================================================================
// CLI Structure
// ==============================================================================

/// Inspect and update the metainfo record of a PostgreSQL database.
#[derive(Parser)]
#[command(author, version, about, long_about = None)]
struct Cli {
    /// Configuration file, with or without the `.toml` extension.
    #[arg(long, short, default_value = "config")]
    config: String,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Print the stored metainfo value as JSON.
    Get,
    /// Store a JSON document as the metainfo value.
    Set {
        /// The JSON document, e.g. '{"schemaVersion": 3}'.
        value: String,
    },
    /// Run a single statement; arguments are bound as text to $1, $2, ...
    Query {
        sql: String,
        args: Vec<String>,
    },
}

// ==============================================================================
// Command Logic
// ==============================================================================

fn metainfo(plugin: &PgPlugin) -> Result<Box<dyn MetaInfo>> {
    match plugin.metainfo() {
        Some(store) => Ok(Box::new(store)),
        None => {
            let pg = plugin.config();
            anyhow::bail!(
                "metainfo is not available: not connected to pg://{}:{}/{}",
                pg.host,
                pg.port,
                pg.database
            )
        }
    }
}

async fn handle_get(plugin: &PgPlugin) -> Result<()> {
    let store = metainfo(plugin)?;
    match store.get().await? {
        Some(value) => println!("{}", serde_json::to_string_pretty(&value)?),
        None => tracing::info!("No metainfo value has been stored yet."),
    }
    Ok(())
}

async fn handle_set(plugin: &PgPlugin, raw: &str) -> Result<()> {
    let value: serde_json::Value =
        serde_json::from_str(raw).context("the value must be a JSON document")?;

    let store = metainfo(plugin)?;
    store.set(&value).await?;
    tracing::info!("Metainfo value stored.");
    Ok(())
}

async fn handle_query(plugin: &PgPlugin, sql: &str, args: Vec<String>) -> Result<()> {
    let args = args.into_iter().map(SqlArg::from).collect();
    let result = plugin.query(sql, args).await?;

    for row in result.to_json() {
        println!("{row}");
    }
    println!("({} rows)", result.row_count);
    Ok(())
}
