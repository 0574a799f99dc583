//! USD price lookups for native assets.

mod builder;
pub mod providers;
mod sources;

pub use builder::build_price_oracle;
pub use providers::CoinGeckoPriceOracle;
pub use sources::{PriceError, PriceOracle, PriceOracleRouter, StaticPriceOracle};
