pub mod coingecko;

pub use coingecko::CoinGeckoPriceOracle;
