//! tsundoku - comics and novels catalog server.

mod config;

use std::path::{Path, PathBuf};
use std::sync::Arc;

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use tsundoku_api::{ApiState, AuthGateway};
use tsundoku_core::Database;

use crate::config::{load_config, Config};

/// Comics and novels catalog with ranked favorites.
#[derive(Parser)]
#[command(name = "tsundoku", version, about = "Comics and novels catalog server")]
struct Cli {
    /// Path to the TOML config file; created with defaults if missing.
    #[arg(long, global = true, env = "TSUNDOKU_CONFIG", default_value = "tsundoku.toml")]
    config: PathBuf,

    /// Database file, overriding the config.
    #[arg(long, global = true, env = "TSUNDOKU_DATABASE")]
    database: Option<PathBuf>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Start the REST API server.
    Serve {
        /// Address to bind the API server, overriding the config.
        #[arg(long, env = "TSUNDOKU_BIND")]
        bind: Option<String>,

        /// HS256 secret used to verify access tokens, overriding the config.
        #[arg(long, env = "TSUNDOKU_JWT_SECRET", hide_env_values = true)]
        jwt_secret: Option<String>,
    },

    /// Create the database and apply the schema.
    InitDb,

    /// Copy the database into a new file.
    Backup {
        /// Destination file; must not exist yet.
        path: PathBuf,
    },
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();
    let mut config = load_config(&cli.config)?;
    if let Some(database) = cli.database {
        config.database_path = database;
    }

    let filter = match &config.log_filter {
        Some(filter) => tracing_subscriber::EnvFilter::try_new(filter)
            .with_context(|| format!("Invalid log filter {:?}", filter))?,
        None => tracing_subscriber::EnvFilter::try_from_default_env()
            .unwrap_or_else(|_| "tsundoku=info,tsundoku_api=info,tsundoku_core=info,tower_http=info".into()),
    };
    tracing_subscriber::registry()
        .with(filter)
        .with(tracing_subscriber::fmt::layer())
        .init();

    match cli.command {
        Commands::Serve { bind, jwt_secret } => {
            if let Some(bind) = bind {
                config.bind = bind;
            }
            if let Some(secret) = jwt_secret {
                config.jwt_secret = secret;
            }
            run_server(&config).await?;
        }

        Commands::InitDb => {
            let db = open_database(&config);
            init_database(&db)?;
        }

        Commands::Backup { path } => {
            let db = open_database(&config);
            backup_database(&db, &path)?;
        }
    }

    Ok(())
}

fn open_database(config: &Config) -> Database {
    Database::new(&config.database_path).with_busy_timeout(config.busy_timeout())
}

fn init_database(db: &Database) -> Result<()> {
    let conn = db
        .get_or_create()
        .with_context(|| format!("Failed to open database {}", db.path().display()))?;
    let version = db.get_schema_version(&conn)?;
    tracing::info!(path = %db.path().display(), schema_version = version, "Database ready");
    Ok(())
}

fn backup_database(db: &Database, path: &Path) -> Result<()> {
    if !db.exists() {
        anyhow::bail!("Database {} does not exist", db.path().display());
    }
    db.backup(path)
        .with_context(|| format!("Failed to back up into {}", path.display()))?;
    tracing::info!(from = %db.path().display(), to = %path.display(), "Backup written");
    Ok(())
}

/// Run the API server until ctrl-c.
async fn run_server(config: &Config) -> Result<()> {
    tracing::info!("Starting tsundoku server...");

    if config.uses_placeholder_secret() {
        tracing::warn!("jwt_secret is still the placeholder value; set TSUNDOKU_JWT_SECRET");
    }

    let db = open_database(config);
    init_database(&db)?;

    let state = Arc::new(ApiState::new(
        db,
        AuthGateway::new(&config.jwt_secret, config.auth_cookie.clone()),
        config.lock_timeout(),
    ));

    tsundoku_api::serve(state, &config.bind, async {
        if let Err(e) = tokio::signal::ctrl_c().await {
            tracing::error!(error = %e, "Failed to listen for shutdown signal");
            std::future::pending::<()>().await;
        }
        tracing::info!("Shutdown signal received");
    })
    .await?;

    tracing::info!("Server stopped");
    Ok(())
}
