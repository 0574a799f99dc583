//! Command implementations behind the CLI. Each returns serializable output.

mod config;
mod list;
mod mutations;
mod portfolio;
mod types;

pub use config::config_output;
pub use list::{list_balances, list_wallets};
pub use mutations::{add_wallet, remove_wallet};
pub use portfolio::{portfolio_output, portfolio_snapshot};
pub use types::{BalanceOutput, PortfolioOutput, WalletOutput};
