mod aggregator;
mod models;
pub mod normalize;
mod wallets;

pub use aggregator::{merge, PortfolioAggregator, PortfolioError};
pub use models::*;
pub use normalize::normalize;
pub use wallets::{link_wallet, unlink_wallet};
