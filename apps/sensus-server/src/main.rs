use anyhow::{anyhow, Context, Result};
use clap::{Parser, Subcommand};
use mimalloc::MiMalloc;
use runtime::{default_logging_config, AppConfig, CliOverrides, DatabaseConfig};
use sea_orm::{ConnectOptions, Database, DatabaseConnection};
use std::net::SocketAddr;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::Duration;
use tokio_util::sync::CancellationToken;

use api_ingress::{ApiIngress, ApiIngressConfig};
use user_records::config::UserRecordsConfig;
use user_records::UserRecords;

#[global_allocator]
static GLOBAL: MiMalloc = MiMalloc;

const MEMORY_DSN: &str = "sqlite::memory:";
const DEFAULT_DSN: &str = "sqlite://database/sensus.db";

/// Expand a sqlite DSN into an absolute-path DSN using a base directory.
/// - Keeps "sqlite::memory:" as-is.
/// - Normalizes backslashes into forward slashes (important on Windows).
/// - Adds `mode=rwc` so the file is created on first start.
fn absolutize_sqlite_dsn(dsn: &str, base_dir: &Path, create_dirs: bool) -> Result<String> {
    if dsn.eq_ignore_ascii_case(MEMORY_DSN) || dsn.eq_ignore_ascii_case("sqlite://:memory:") {
        return Ok(MEMORY_DSN.to_string());
    }
    let db_path = dsn
        .strip_prefix("sqlite://")
        .ok_or_else(|| anyhow!("DSN must start with sqlite:// (got: {})", dsn))?;

    let (path_str, query) = match db_path.split_once('?') {
        Some((p, q)) => (p, Some(q)),
        None => (db_path, None),
    };

    let mut p = PathBuf::from(path_str);
    if p.as_os_str().is_empty() {
        return Err(anyhow!("Empty SQLite path in DSN"));
    }
    if p.is_relative() {
        p = base_dir.join(p);
    }

    if let Some(dir) = p.parent() {
        if create_dirs {
            std::fs::create_dir_all(dir)
                .with_context(|| format!("failed to create {}", dir.display()))?;
        }
    }

    let mut out = String::from("sqlite://");
    out.push_str(&p.to_string_lossy().replace('\\', "/"));
    match query {
        Some(q) if q.contains("mode=") => {
            out.push('?');
            out.push_str(q);
        }
        Some(q) => {
            out.push('?');
            out.push_str(q);
            out.push_str("&mode=rwc");
        }
        None => out.push_str("?mode=rwc"),
    }
    Ok(out)
}

/// Sensus Server - per-user records with screenshots and Web Push
#[derive(Parser)]
#[command(name = "sensus-server")]
#[command(about = "Sensus Server - per-user records with screenshots and Web Push")]
#[command(version = "0.1.0")]
struct Cli {
    /// Path to configuration file
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// Port for HTTP server (overrides config)
    #[arg(short, long)]
    port: Option<u16>,

    /// Print current configuration and exit
    #[arg(long)]
    print_config: bool,

    /// Log verbosity level (-v debug, -vv trace)
    #[arg(short, long, action = clap::ArgAction::Count)]
    verbose: u8,

    /// Use an in-memory database
    #[arg(long)]
    mock: bool,

    #[command(subcommand)]
    command: Option<Commands>,
}

#[derive(Subcommand)]
enum Commands {
    /// Start the server
    Run,
    /// Check configuration
    Check,
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    let args = CliOverrides {
        port: cli.port,
        verbose: cli.verbose,
        mock: cli.mock,
    };

    let mut config = AppConfig::load(cli.config.as_deref())?;
    config.apply_cli_overrides(&args);

    let logging_config = config
        .logging
        .clone()
        .unwrap_or_else(default_logging_config);
    runtime::logging::init_logging_from_config(&logging_config, Path::new(&config.server.home_dir));
    tracing::info!("Sensus Server starting");

    if cli.print_config {
        println!("{}", config.to_yaml()?);
        return Ok(());
    }

    match cli.command.unwrap_or(Commands::Run) {
        Commands::Run => run_server(config, args).await,
        Commands::Check => check_config(config, args),
    }
}

/// Module configs plus the listen address; shared by `run` and `check`.
struct Prepared {
    ingress: ApiIngressConfig,
    user_records: UserRecordsConfig,
    addr: SocketAddr,
    dsn: String,
}

fn prepare(config: &AppConfig, args: &CliOverrides, create_dirs: bool) -> Result<Prepared> {
    let ingress: ApiIngressConfig = config.module_config("api_ingress")?;
    let user_records: UserRecordsConfig = config.module_config("user_records")?;

    let mut addr =
        api_ingress::resolve_bind_addr(&ingress, &config.server.host, config.server.port)?;
    if let Some(port) = args.port {
        addr.set_port(port);
    }

    let raw = config
        .database
        .as_ref()
        .map(|db| db.url.trim())
        .filter(|url| !url.is_empty())
        .unwrap_or(DEFAULT_DSN);
    let dsn = absolutize_sqlite_dsn(raw, Path::new(&config.server.home_dir), create_dirs)?;

    Ok(Prepared {
        ingress,
        user_records,
        addr,
        dsn,
    })
}

async fn connect_database(
    dsn: &str,
    db_config: Option<&DatabaseConfig>,
) -> Result<DatabaseConnection> {
    let mut opts = ConnectOptions::new(dsn.to_owned());
    opts.sqlx_logging(false)
        .acquire_timeout(Duration::from_secs(5));

    if dsn == MEMORY_DSN {
        // every pooled connection would otherwise see its own empty database
        let forever = Duration::from_secs(60 * 60 * 24 * 365);
        opts.max_connections(1)
            .min_connections(1)
            .idle_timeout(forever)
            .max_lifetime(forever);
    } else if let Some(max) = db_config.and_then(|c| c.max_conns) {
        opts.max_connections(max);
    }

    if let Some(ms) = db_config.and_then(|c| c.busy_timeout_ms) {
        let busy = Duration::from_millis(ms as u64);
        opts.map_sqlx_sqlite_opts(move |o| o.busy_timeout(busy));
    }

    tracing::info!(dsn, "connecting to database");
    Database::connect(opts)
        .await
        .with_context(|| format!("failed to connect to {dsn}"))
}

async fn run_server(config: AppConfig, args: CliOverrides) -> Result<()> {
    let prepared = prepare(&config, &args, true)?;
    let db = connect_database(&prepared.dsn, config.database.as_ref()).await?;

    tracing::info!("Initializing modules...");
    let records = UserRecords::init(
        prepared.user_records,
        db,
        Path::new(&config.server.home_dir),
    )
    .await?;

    let ingress = ApiIngress::new(prepared.ingress).with_module(Arc::new(records));

    let cancel = CancellationToken::new();
    modkit::runtime::cancel_on_shutdown(cancel.clone());
    ingress.serve(prepared.addr, cancel).await?;

    tracing::info!("Sensus Server stopped");
    Ok(())
}

fn check_config(config: AppConfig, args: CliOverrides) -> Result<()> {
    tracing::info!("Checking configuration...");

    let prepared = prepare(&config, &args, false)?;
    if let Some(url) = &prepared.user_records.push.gateway_url {
        url::Url::parse(url)
            .map_err(|e| anyhow!("invalid push.gateway_url {url:?}: {e}"))?;
    }

    tracing::info!(addr = %prepared.addr, dsn = %prepared.dsn, "Configuration is valid");
    println!("Configuration check passed");
    println!("Listen address: {}", prepared.addr);
    println!("Database: {}", prepared.dsn);
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn relative_sqlite_path_is_anchored_at_home() {
        let dsn =
            absolutize_sqlite_dsn("sqlite://database/sensus.db", Path::new("/srv/sensus"), false)
                .unwrap();
        assert_eq!(dsn, "sqlite:///srv/sensus/database/sensus.db?mode=rwc");
    }

    #[test]
    fn explicit_mode_is_kept() {
        let dsn = absolutize_sqlite_dsn(
            "sqlite:///tmp/x.db?cache=shared&mode=ro",
            Path::new("/ignored"),
            false,
        )
        .unwrap();
        assert_eq!(dsn, "sqlite:///tmp/x.db?cache=shared&mode=ro");
    }

    #[test]
    fn memory_and_foreign_dsns() {
        assert_eq!(
            absolutize_sqlite_dsn("sqlite://:memory:", Path::new("/x"), false).unwrap(),
            MEMORY_DSN
        );
        assert!(absolutize_sqlite_dsn("postgres://localhost/db", Path::new("/x"), false).is_err());
        assert!(absolutize_sqlite_dsn("sqlite://", Path::new("/x"), false).is_err());
    }

    #[test]
    fn cli_port_wins_over_bind_addr() {
        let mut config = AppConfig::default();
        config.modules.insert(
            "api_ingress".into(),
            serde_json::json!({ "bind_addr": "0.0.0.0:9000" }),
        );
        let args = CliOverrides {
            port: Some(0),
            ..Default::default()
        };
        let prepared = prepare(&config, &args, false).unwrap();
        assert_eq!(prepared.addr, "0.0.0.0:0".parse().unwrap());
    }
}
