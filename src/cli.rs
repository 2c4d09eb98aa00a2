use clap::{Parser, Subcommand};
use std::sync::Arc;
use uuid::Uuid;

use crate::config::Config;
use crate::ports::LedgerStore;
use crate::use_cases::{GetBalance, ListWalletTransactions};

#[derive(Parser)]
#[command(name = "wallet-ledger")]
#[command(about = "Wallet Ledger - balances and auditable wallet operations", long_about = None)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Option<Commands>,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Start the HTTP server (default)
    Serve {
        /// Keep the ledger in process memory instead of Postgres
        #[arg(long)]
        in_memory: bool,
    },

    /// Database management commands
    #[command(subcommand)]
    Db(DbCommands),

    /// Wallet inspection commands
    #[command(subcommand)]
    Wallet(WalletCommands),

    /// Configuration validation
    Config,
}

#[derive(Subcommand)]
pub enum DbCommands {
    /// Run database migrations
    Migrate,
}

#[derive(Subcommand)]
pub enum WalletCommands {
    /// Print the current balance of a wallet
    Balance {
        #[arg(value_name = "WALLET_ID")]
        wallet_id: Uuid,
    },

    /// Print the most recent transactions of a wallet
    History {
        #[arg(value_name = "WALLET_ID")]
        wallet_id: Uuid,

        #[arg(short, long, default_value_t = 20)]
        limit: i64,
    },
}

pub async fn handle_db_migrate(config: &Config) -> anyhow::Result<()> {
    let pool = crate::db::create_pool(config).await?;

    tracing::info!("Running database migrations...");
    crate::db::run_migrations(&pool).await?;

    println!("✓ Database migrations completed");
    Ok(())
}

pub fn handle_config_validate(config: &Config) -> anyhow::Result<()> {
    tracing::info!("Validating configuration...");

    println!("Configuration:");
    println!("  Server Port: {}", config.server_port);
    println!(
        "  Database URL: {}",
        config
            .database_url
            .as_deref()
            .map(mask_password)
            .unwrap_or_else(|| "<unset>".to_string())
    );
    println!("  Max Connections: {}", config.database_max_connections);
    println!("  Lock Timeout: {:?}", config.lock_timeout);
    println!("  Log Format: {:?}", config.log_format);

    config.require_database_url()?;

    tracing::info!("Configuration is valid");
    println!("✓ Configuration is valid");

    Ok(())
}

pub async fn handle_wallet_balance(store: Arc<dyn LedgerStore>, wallet_id: Uuid) -> anyhow::Result<()> {
    let balance = GetBalance::new(store).execute(wallet_id).await?;
    println!("{} {}", wallet_id, balance);
    Ok(())
}

pub async fn handle_wallet_history(
    store: Arc<dyn LedgerStore>,
    wallet_id: Uuid,
    limit: i64,
) -> anyhow::Result<()> {
    let transactions = ListWalletTransactions::new(store)
        .execute(wallet_id, Some(limit), None)
        .await?;

    if transactions.is_empty() {
        println!("No transactions found for wallet {}", wallet_id);
        return Ok(());
    }

    println!(
        "{:<38} {:<10} {:>16} {:<10} {:<20}",
        "Transaction", "Type", "Amount", "Status", "Created"
    );
    println!("{}", "-".repeat(98));

    for tx in transactions {
        println!(
            "{:<38} {:<10} {:>16} {:<10} {:<20}",
            tx.id,
            tx.operation_type,
            tx.amount.to_string(),
            tx.status,
            tx.created_at.format("%Y-%m-%d %H:%M:%S")
        );
    }

    Ok(())
}

fn mask_password(url: &str) -> String {
    if let Some(at_pos) = url.rfind('@') {
        if let Some(colon_pos) = url[..at_pos].rfind(':') {
            if let Some(slash_pos) = url[..colon_pos].rfind("//") {
                let prefix = &url[..slash_pos + 2];
                let user = &url[slash_pos + 2..colon_pos];
                let suffix = &url[at_pos..];
                return format!("{}{}:****{}", prefix, user, suffix);
            }
        }
    }
    url.to_string()
}
