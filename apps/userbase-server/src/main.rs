use anyhow::{anyhow, Context, Result};
use clap::{Parser, Subcommand};
use mimalloc::MiMalloc;
use runtime::{default_logging_config, AppConfig, CliArgs, DatabaseConfig};
use std::path::{Path, PathBuf};
use std::time::Duration;
use tokio_util::sync::CancellationToken;
use userbase_db::{ConnectOpts, DbHandle};

use api_ingress::{ApiIngress, ApiIngressConfig};
use users::config::UsersConfig;
use users::UsersModule;

#[global_allocator]
static GLOBAL: MiMalloc = MiMalloc;

const MEMORY_DSN: &str = "sqlite::memory:";

/// Expand a sqlite DSN into an absolute-path DSN using a base directory.
/// - Keeps in-memory DSNs as "sqlite::memory:".
/// - Normalizes backslashes into forward slashes (important on Windows).
fn absolutize_sqlite_dsn(dsn: &str, base_dir: &Path) -> Result<String> {
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

    let mut out = String::from("sqlite://");
    out.push_str(&p.to_string_lossy().replace('\\', "/"));
    if let Some(q) = query {
        out.push('?');
        out.push_str(q);
    }
    Ok(out)
}

/// Userbase Server - REST user resource over SQLite
#[derive(Parser)]
#[command(name = "userbase-server")]
#[command(about = "Userbase Server - REST user resource over SQLite")]
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

    /// Use an in-memory database instead of the configured one
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

    let args = CliArgs {
        config: cli.config.as_ref().map(|p| p.to_string_lossy().to_string()),
        port: cli.port,
        print_config: cli.print_config,
        verbose: cli.verbose,
        mock: cli.mock,
    };

    // Load configuration (normalized home_dir is applied inside)
    let mut config = AppConfig::load_or_default(cli.config.as_deref())?;
    config.apply_cli_overrides(&args);

    if args.print_config {
        println!("{}", config.to_yaml()?);
        return Ok(());
    }

    let logging_config = config
        .logging
        .clone()
        .unwrap_or_else(default_logging_config);
    runtime::logging::init_logging_from_config(&logging_config, Path::new(&config.server.home_dir));
    tracing::info!("Userbase Server starting");

    match cli.command.unwrap_or(Commands::Run) {
        Commands::Run => run_server(config, args).await,
        Commands::Check => check_config(config, args),
    }
}

fn database_config(config: &AppConfig) -> DatabaseConfig {
    config
        .database
        .clone()
        .or_else(|| AppConfig::default().database)
        .unwrap_or(DatabaseConfig {
            url: MEMORY_DSN.to_string(),
            max_conns: None,
            busy_timeout_ms: None,
        })
}

/// Final DSN: `--mock` forces in-memory; relative SQLite paths resolve under `home_dir`.
fn resolve_dsn(db_config: &DatabaseConfig, args: &CliArgs, base_dir: &Path) -> Result<String> {
    let config_dsn = db_config.url.trim();
    if config_dsn.is_empty() && !args.mock {
        return Err(anyhow!("Database URL not configured"));
    }

    let dsn = if args.mock { MEMORY_DSN } else { config_dsn };
    DbHandle::detect(dsn).with_context(|| format!("Unsupported database DSN '{dsn}'"))?;

    if dsn.starts_with("sqlite://") {
        absolutize_sqlite_dsn(dsn, base_dir)
    } else {
        Ok(dsn.to_string())
    }
}

async fn run_server(config: AppConfig, args: CliArgs) -> Result<()> {
    let base_dir = PathBuf::from(&config.server.home_dir);

    let db_config = database_config(&config);
    let dsn = resolve_dsn(&db_config, &args, &base_dir)?;
    let connect_opts = ConnectOpts {
        max_conns: db_config.max_conns,
        acquire_timeout: Some(Duration::from_secs(5)),
        sqlite_busy_timeout: db_config
            .busy_timeout_ms
            .map(|ms| Duration::from_millis(ms as u64)),
        create_sqlite_dirs: true,
        ..Default::default()
    };

    tracing::info!("Connecting to database: {}", dsn);
    let db = DbHandle::connect(&dsn, connect_opts)
        .await
        .with_context(|| format!("Failed to connect to database '{dsn}'"))?;
    tracing::info!("Connected DB backend: {:?}", db.engine());

    tracing::info!("Initializing modules...");
    let users_cfg: UsersConfig = config.module_config(UsersModule::NAME)?;
    let users = UsersModule::init(db.clone(), &users_cfg).await?;

    let ingress = ApiIngress::new(ApiIngressConfig::from_server(&config.server, &base_dir));
    let router = ingress.finalize(users.register_rest(ingress.base_router()));

    let cancel = CancellationToken::new();
    let signals = {
        let cancel = cancel.clone();
        tokio::spawn(async move {
            if let Err(e) = runtime::shutdown::wait_for_shutdown().await {
                tracing::error!("Shutdown signal listener failed: {e:#}");
            }
            cancel.cancel();
        })
    };

    let served = ingress.serve(router, cancel.clone()).await;
    signals.abort();
    db.close().await;
    tracing::info!("Userbase Server stopped");
    served
}

fn check_config(config: AppConfig, args: CliArgs) -> Result<()> {
    tracing::info!("Checking configuration...");

    let base_dir = PathBuf::from(&config.server.home_dir);
    let dsn = resolve_dsn(&database_config(&config), &args, &base_dir)?;
    let _: UsersConfig = config.module_config(UsersModule::NAME)?;
    let ingress = ApiIngressConfig::from_server(&config.server, &base_dir);
    ingress
        .bind_addr
        .parse::<std::net::SocketAddr>()
        .with_context(|| format!("Invalid bind address '{}'", ingress.bind_addr))?;

    tracing::info!("Configuration is valid");
    println!("Configuration check passed");
    println!("Database: {dsn}");
    println!("{}", config.to_yaml()?);
    Ok(())
}
