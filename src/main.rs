use clap::Parser;
use std::net::SocketAddr;
use std::sync::Arc;
use tokio::net::TcpListener;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

use wallet_ledger::adapters::{InMemoryLedgerStore, PostgresLedgerStore};
use wallet_ledger::cli::{self, Cli, Commands, DbCommands, WalletCommands};
use wallet_ledger::config::{Config, LogFormat};
use wallet_ledger::middleware::RequestLogConfig;
use wallet_ledger::ports::LedgerStore;
use wallet_ledger::{create_app, db, AppState};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let config = Config::from_env()?;
    init_tracing(config.log_format);

    let cli = Cli::parse();
    match cli.command.unwrap_or(Commands::Serve { in_memory: false }) {
        Commands::Serve { in_memory } => serve(&config, in_memory).await,
        Commands::Db(DbCommands::Migrate) => cli::handle_db_migrate(&config).await,
        Commands::Config => cli::handle_config_validate(&config),
        Commands::Wallet(command) => {
            let store = postgres_store(&config).await?;
            match command {
                WalletCommands::Balance { wallet_id } => {
                    cli::handle_wallet_balance(store, wallet_id).await
                }
                WalletCommands::History { wallet_id, limit } => {
                    cli::handle_wallet_history(store, wallet_id, limit).await
                }
            }
        }
    }
}

fn init_tracing(format: LogFormat) {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| "info".into());
    let registry = tracing_subscriber::registry().with(filter);

    match format {
        LogFormat::Json => registry.with(tracing_subscriber::fmt::layer().json()).init(),
        LogFormat::Pretty => registry.with(tracing_subscriber::fmt::layer()).init(),
    }
}

async fn postgres_store(config: &Config) -> anyhow::Result<Arc<dyn LedgerStore>> {
    let pool = db::create_pool(config).await?;
    Ok(Arc::new(PostgresLedgerStore::new(pool, config.lock_timeout)))
}

async fn serve(config: &Config, in_memory: bool) -> anyhow::Result<()> {
    let store: Arc<dyn LedgerStore> = if in_memory {
        tracing::warn!("Using in-memory ledger store; balances are lost on shutdown");
        Arc::new(InMemoryLedgerStore::new(config.lock_timeout))
    } else {
        let pool = db::create_pool(config).await?;
        db::run_migrations(&pool).await?;
        Arc::new(PostgresLedgerStore::new(pool, config.lock_timeout))
    };

    let mut state = AppState::new(store);
    state.request_log = RequestLogConfig {
        log_body: config.log_request_body,
    };
    let app = create_app(state);

    let addr = SocketAddr::from(([0, 0, 0, 0], config.server_port));
    tracing::info!("listening on {}", addr);

    let listener = TcpListener::bind(addr).await?;
    axum::serve(listener, app).await?;

    Ok(())
}
