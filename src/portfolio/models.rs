use std::fmt;
use std::str::FromStr;

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use crate::chains::FetchErrorKind;
use crate::models::{ChainId, PricedAsset, UnsupportedChainError, WalletRef};

/// Tokens below this USD value are left out of allocation breakdowns.
const DUST_THRESHOLD_USD: Decimal = Decimal::ONE;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct Totals {
    pub usd: Decimal,
}

impl Totals {
    /// Sums resolved USD values. Unpriced assets contribute nothing.
    pub fn from_assets<'a>(assets: impl IntoIterator<Item = &'a PricedAsset>) -> Self {
        let usd = assets
            .into_iter()
            .filter_map(|asset| asset.usd_value)
            .fold(Decimal::ZERO, Decimal::saturating_add);
        Self { usd }
    }
}

/// Valuation of one wallet at one moment.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PortfolioSnapshot {
    pub wallet: WalletRef,
    pub native: PricedAsset,
    /// Always empty: token discovery is not performed.
    pub tokens: Vec<PricedAsset>,
    pub totals: Totals,
}

impl PortfolioSnapshot {
    pub fn new(wallet: WalletRef, native: PricedAsset) -> Self {
        let tokens = Vec::new();
        let totals = Totals::from_assets(std::iter::once(&native).chain(&tokens));
        Self {
            wallet,
            native,
            tokens,
            totals,
        }
    }

    pub fn assets(&self) -> impl Iterator<Item = &PricedAsset> {
        std::iter::once(&self.native).chain(self.tokens.iter())
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ValuationStatus {
    Valued(PortfolioSnapshot),
    Failed { kind: FetchErrorKind, message: String },
}

/// One slot per requested wallet, in request order.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct WalletValuation {
    pub wallet: WalletRef,
    pub status: ValuationStatus,
}

impl WalletValuation {
    pub fn snapshot(&self) -> Option<&PortfolioSnapshot> {
        match &self.status {
            ValuationStatus::Valued(snapshot) => Some(snapshot),
            ValuationStatus::Failed { .. } => None,
        }
    }

    pub fn is_failed(&self) -> bool {
        matches!(self.status, ValuationStatus::Failed { .. })
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ChainTotal {
    pub chain: ChainId,
    /// Wallets on this chain that were valued successfully, in input order.
    pub snapshots: Vec<PortfolioSnapshot>,
    pub totals: Totals,
}

impl ChainTotal {
    pub fn new(chain: ChainId) -> Self {
        Self {
            chain,
            snapshots: Vec::new(),
            totals: Totals::default(),
        }
    }

    pub fn snapshot_count(&self) -> usize {
        self.snapshots.len()
    }
}

/// Cross-chain result of one portfolio build.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AggregatedPortfolio {
    pub as_of: DateTime<Utc>,
    pub wallets: Vec<WalletValuation>,
    /// Ordered by the first appearance of each chain in `wallets`.
    pub chains: Vec<ChainTotal>,
    pub grand_total_usd: Decimal,
}

impl AggregatedPortfolio {
    pub fn snapshots(&self) -> impl Iterator<Item = &PortfolioSnapshot> {
        self.wallets.iter().filter_map(WalletValuation::snapshot)
    }

    pub fn snapshots_for(&self, chain: ChainId) -> Vec<&PortfolioSnapshot> {
        self.snapshots()
            .filter(|snapshot| snapshot.wallet.chain == chain)
            .collect()
    }

    pub fn failures(&self) -> impl Iterator<Item = &WalletValuation> {
        self.wallets.iter().filter(|w| w.is_failed())
    }

    pub fn chain_total(&self, chain: ChainId) -> Option<&ChainTotal> {
        self.chains.iter().find(|total| total.chain == chain)
    }

    pub fn total_for(&self, filter: ChainFilter) -> Decimal {
        self.chains
            .iter()
            .filter(|total| filter.matches(total.chain))
            .map(|total| total.totals.usd)
            .fold(Decimal::ZERO, Decimal::saturating_add)
    }

    /// Per-asset breakdown: every native asset, plus tokens worth more than
    /// one dollar, largest first. Unpriced lines sort last.
    pub fn allocation(&self, filter: ChainFilter) -> Vec<AllocationLine> {
        let mut lines: Vec<AllocationLine> = self
            .snapshots()
            .filter(|snapshot| filter.matches(snapshot.wallet.chain))
            .flat_map(|snapshot| {
                let native = std::iter::once(&snapshot.native);
                let tokens = snapshot
                    .tokens
                    .iter()
                    .filter(|token| token.usd_value.is_some_and(|usd| usd > DUST_THRESHOLD_USD));
                native.chain(tokens).map(move |asset| AllocationLine {
                    chain: snapshot.wallet.chain,
                    address: snapshot.wallet.address.clone(),
                    symbol: asset.symbol.clone(),
                    decimal_amount: asset.decimal_amount,
                    usd_value: asset.usd_value,
                })
            })
            .collect();

        lines.sort_by(|a, b| b.usd_value.cmp(&a.usd_value));
        lines
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AllocationLine {
    pub chain: ChainId,
    pub address: String,
    pub symbol: String,
    pub decimal_amount: Decimal,
    pub usd_value: Option<Decimal>,
}

/// Restricts portfolio views to one chain or none.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ChainFilter {
    #[default]
    All,
    Chain(ChainId),
}

impl ChainFilter {
    pub fn matches(self, chain: ChainId) -> bool {
        match self {
            ChainFilter::All => true,
            ChainFilter::Chain(only) => only == chain,
        }
    }
}

impl fmt::Display for ChainFilter {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ChainFilter::All => f.write_str("all"),
            ChainFilter::Chain(chain) => write!(f, "{chain}"),
        }
    }
}

impl FromStr for ChainFilter {
    type Err = UnsupportedChainError;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        if value.trim().eq_ignore_ascii_case("all") {
            return Ok(ChainFilter::All);
        }
        value.parse().map(ChainFilter::Chain)
    }
}
