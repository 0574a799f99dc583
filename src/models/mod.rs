mod balance;
mod chain;
mod id;
mod wallet;

pub use balance::{BalanceRecord, NormalizedAsset, PricedAsset, RawBalance};
pub use chain::{ChainId, UnsupportedChainError};
pub use id::{Id, IdError};
pub use wallet::{Wallet, WalletRef};
