use std::path::PathBuf;
use std::sync::Arc;

use anyhow::Result;
use clap::{Parser, Subcommand};
use serde::Serialize;
use tracing_subscriber::{fmt, prelude::*, EnvFilter};

use chainbook::app;
use chainbook::config::{default_config_path, ResolvedConfig};
use chainbook::portfolio::ChainFilter;
use chainbook::storage::{JsonFileStorage, Storage};

#[derive(Parser)]
#[command(name = "chainbook")]
#[command(about = "Multi-chain wallet portfolio valuation")]
struct Cli {
    /// Path to config file (default: ./chainbook.toml, then the user data directory)
    #[arg(short, long)]
    config: Option<PathBuf>,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Show current configuration
    Config,

    /// Manage linked wallets
    Wallet {
        #[command(subcommand)]
        command: WalletCommand,
    },

    /// Value all linked wallets in USD
    Portfolio {
        /// Restrict to one chain: all, ethereum or solana
        #[arg(long, default_value = "all")]
        chain: ChainFilter,
    },

    /// List recorded balances for a wallet
    Balances {
        /// Wallet id
        wallet_id: String,
    },
}

#[derive(Subcommand)]
enum WalletCommand {
    /// Link a wallet address
    Add {
        /// Chain: ethereum (eth) or solana (sol)
        chain: String,
        address: String,
        #[arg(long)]
        label: Option<String>,
    },
    /// List linked wallets
    List,
    /// Unlink a wallet by id
    Remove { id: String },
}

fn init_tracing() {
    tracing_subscriber::registry()
        .with(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .with(
            fmt::layer()
                .with_writer(std::io::stderr)
                .with_target(true)
                .with_level(true)
                .json(),
        )
        .init();
}

fn print_json<T: Serialize>(value: &T) -> Result<()> {
    println!("{}", serde_json::to_string_pretty(value)?);
    Ok(())
}

#[tokio::main]
async fn main() -> Result<()> {
    init_tracing();
    let cli = Cli::parse();

    let config_path = cli.config.unwrap_or_else(default_config_path);
    let config = ResolvedConfig::load_or_default(&config_path)?;
    let storage: Arc<dyn Storage> = Arc::new(JsonFileStorage::new(&config.data_dir));

    match cli.command {
        Command::Config => print_json(&app::config_output(&config_path, &config)),
        Command::Wallet { command } => match command {
            WalletCommand::Add {
                chain,
                address,
                label,
            } => print_json(&app::add_wallet(storage.as_ref(), &config, &chain, &address, label).await?),
            WalletCommand::List => print_json(&app::list_wallets(storage.as_ref()).await?),
            WalletCommand::Remove { id } => {
                print_json(&app::remove_wallet(storage.as_ref(), &id).await?)
            }
        },
        Command::Portfolio { chain } => {
            print_json(&app::portfolio_snapshot(storage, &config, chain).await?)
        }
        Command::Balances { wallet_id } => {
            print_json(&app::list_balances(storage.as_ref(), &wallet_id).await?)
        }
    }
}
