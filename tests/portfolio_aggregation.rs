mod support;

use std::str::FromStr;
use std::sync::Arc;
use std::time::Duration;

use anyhow::Result;
use rust_decimal::Decimal;

use chainbook::chains::{AdapterRegistry, FetchError, FetchErrorKind};
use chainbook::models::{ChainId, Id, Wallet, WalletRef};
use chainbook::portfolio::{
    ChainFilter, PortfolioAggregator, PortfolioError, PortfolioSnapshot, ValuationStatus,
};
use chainbook::storage::{JsonFileStorage, MemoryStorage, Storage};
use tempfile::TempDir;

use support::*;

fn dec(s: &str) -> Decimal {
    Decimal::from_str(s).unwrap()
}

fn snapshot(status: &ValuationStatus) -> &PortfolioSnapshot {
    match status {
        ValuationStatus::Valued(snapshot) => snapshot,
        ValuationStatus::Failed { kind, message } => {
            panic!("expected valued wallet, got {kind}: {message}")
        }
    }
}

fn registry(eth: Arc<FakeAdapter>, sol: Arc<FakeAdapter>) -> AdapterRegistry {
    AdapterRegistry::new().with_adapter(eth).with_adapter(sol)
}

#[tokio::test]
async fn values_eth_and_sol_wallets() -> Result<()> {
    let eth = Arc::new(FakeAdapter::new(ChainId::Ethereum).with_balance(ETH_ADDRESS, TWO_AND_A_HALF_ETH));
    let sol = Arc::new(FakeAdapter::new(ChainId::Solana).with_balance(SOL_ADDRESS, ONE_AND_A_HALF_SOL));
    let oracle = Arc::new(FakeOracle::new().with_price("ETH", 3000).with_price("SOL", 100));

    let aggregator = PortfolioAggregator::new(registry(eth, sol), oracle);
    let portfolio = aggregator
        .build_portfolio(&[WalletRef::ethereum(ETH_ADDRESS), WalletRef::solana(SOL_ADDRESS)])
        .await?;

    let eth_snapshot = snapshot(&portfolio.wallets[0].status);
    assert_eq!(eth_snapshot.native.symbol, "ETH");
    assert_eq!(eth_snapshot.native.decimal_amount, dec("2.5"));
    assert_eq!(eth_snapshot.native.usd_value, Some(dec("7500")));
    assert!(eth_snapshot.tokens.is_empty());
    assert_eq!(eth_snapshot.totals.usd, dec("7500"));

    let sol_snapshot = snapshot(&portfolio.wallets[1].status);
    assert_eq!(sol_snapshot.native.decimal_amount, dec("1.5"));
    assert_eq!(sol_snapshot.native.usd_value, Some(dec("150")));

    assert_eq!(portfolio.grand_total_usd, dec("7650"));
    assert_eq!(portfolio.total_for(ChainFilter::Chain(ChainId::Solana)), dec("150"));

    Ok(())
}

#[tokio::test]
async fn amounts_are_stable_while_price_moves() -> Result<()> {
    let eth = Arc::new(FakeAdapter::new(ChainId::Ethereum).with_balance(ETH_ADDRESS, TWO_AND_A_HALF_ETH));
    let sol = Arc::new(FakeAdapter::new(ChainId::Solana));
    let oracle = Arc::new(FakeOracle::new().with_price("ETH", 3000));

    let aggregator = PortfolioAggregator::new(registry(eth, sol), oracle.clone());
    let wallets = [WalletRef::ethereum(ETH_ADDRESS)];

    let first = aggregator.build_portfolio(&wallets).await?;
    oracle.set_price("ETH", Decimal::from(3200));
    let second = aggregator.build_portfolio(&wallets).await?;

    let first = snapshot(&first.wallets[0].status);
    let second = snapshot(&second.wallets[0].status);
    assert_eq!(first.native.decimal_amount, second.native.decimal_amount);
    assert_eq!(first.native.usd_value, Some(dec("7500")));
    assert_eq!(second.native.usd_value, Some(dec("8000")));

    Ok(())
}

#[tokio::test]
async fn one_failing_wallet_does_not_spoil_the_others() -> Result<()> {
    let eth = Arc::new(
        FakeAdapter::new(ChainId::Ethereum)
            .with_balance(ETH_ADDRESS, TWO_AND_A_HALF_ETH)
            .with_error(
                ETH_ADDRESS_2,
                FetchError::unavailable(ChainId::Ethereum, "connection reset"),
            ),
    );
    let sol = Arc::new(FakeAdapter::new(ChainId::Solana).with_balance(SOL_ADDRESS, ONE_AND_A_HALF_SOL));
    let oracle = Arc::new(FakeOracle::new().with_price("ETH", 3000).with_price("SOL", 100));

    let aggregator = PortfolioAggregator::new(registry(eth, sol), oracle);
    let portfolio = aggregator
        .build_portfolio(&[
            WalletRef::ethereum(ETH_ADDRESS),
            WalletRef::ethereum(ETH_ADDRESS_2),
            WalletRef::solana(SOL_ADDRESS),
        ])
        .await?;

    assert_eq!(portfolio.wallets.len(), 3);
    assert_eq!(portfolio.snapshots().count(), 2);
    match &portfolio.wallets[1].status {
        ValuationStatus::Failed { kind, message } => {
            assert_eq!(*kind, FetchErrorKind::UpstreamUnavailable);
            assert!(message.contains("connection reset"), "{message}");
        }
        other => panic!("expected failure, got {other:?}"),
    }

    assert_eq!(portfolio.grand_total_usd, dec("7650"));
    let eth_total = portfolio.chain_total(ChainId::Ethereum).unwrap();
    assert_eq!(eth_total.snapshot_count(), 1);
    assert_eq!(eth_total.snapshots[0].native.decimal_amount, dec("2.5"));
    assert_eq!(eth_total.totals.usd, dec("7500"));

    Ok(())
}

#[tokio::test]
async fn invalid_address_makes_no_upstream_call() -> Result<()> {
    let eth = Arc::new(FakeAdapter::new(ChainId::Ethereum));
    let sol = Arc::new(FakeAdapter::new(ChainId::Solana));
    let oracle = Arc::new(FakeOracle::new().with_price("ETH", 3000));

    let aggregator = PortfolioAggregator::new(registry(eth.clone(), sol.clone()), oracle.clone());
    let portfolio = aggregator
        .build_portfolio(&[
            WalletRef::ethereum("0x5AAeb6053F3E94C9b9A09f33669435E7Ef1BeAed"),
            WalletRef::solana("not-base58-0OIl"),
        ])
        .await?;

    for slot in &portfolio.wallets {
        match &slot.status {
            ValuationStatus::Failed { kind, .. } => assert_eq!(*kind, FetchErrorKind::InvalidAddress),
            other => panic!("expected InvalidAddress, got {other:?}"),
        }
    }
    assert_eq!(eth.calls(), 0);
    assert_eq!(sol.calls(), 0);
    assert_eq!(oracle.calls(), 0);
    assert_eq!(portfolio.grand_total_usd, Decimal::ZERO);

    Ok(())
}

#[tokio::test]
async fn missing_price_is_flagged_and_excluded_from_totals() -> Result<()> {
    let eth = Arc::new(FakeAdapter::new(ChainId::Ethereum).with_balance(ETH_ADDRESS, TWO_AND_A_HALF_ETH));
    let sol = Arc::new(FakeAdapter::new(ChainId::Solana).with_balance(SOL_ADDRESS, ONE_AND_A_HALF_SOL));
    let oracle = Arc::new(FakeOracle::new().with_price("SOL", 100));

    let aggregator = PortfolioAggregator::new(registry(eth, sol), oracle);
    let portfolio = aggregator
        .build_portfolio(&[WalletRef::ethereum(ETH_ADDRESS), WalletRef::solana(SOL_ADDRESS)])
        .await?;

    let eth_snapshot = snapshot(&portfolio.wallets[0].status);
    assert!(eth_snapshot.native.price_unavailable);
    assert_eq!(eth_snapshot.native.usd_value, None);
    assert_eq!(eth_snapshot.native.decimal_amount, dec("2.5"));
    assert_eq!(eth_snapshot.totals.usd, Decimal::ZERO);

    assert_eq!(portfolio.grand_total_usd, dec("150"));

    let json = serde_json::to_value(eth_snapshot)?;
    assert_eq!(json["native"]["price_unavailable"], true);
    assert_eq!(json["native"]["decimal_amount"], "2.5");

    Ok(())
}

#[tokio::test]
async fn empty_and_unsupported_inputs_fail_the_call() {
    let eth = Arc::new(FakeAdapter::new(ChainId::Ethereum));
    let oracle = Arc::new(FakeOracle::new());
    let aggregator = PortfolioAggregator::new(AdapterRegistry::new().with_adapter(eth.clone()), oracle);

    assert_eq!(
        aggregator.build_portfolio(&[]).await.unwrap_err(),
        PortfolioError::EmptyWalletList
    );

    let err = aggregator
        .build_portfolio(&[WalletRef::ethereum(ETH_ADDRESS), WalletRef::solana(SOL_ADDRESS)])
        .await
        .unwrap_err();
    assert!(matches!(err, PortfolioError::UnsupportedChain { chain: ChainId::Solana, .. }));
    assert_eq!(eth.calls(), 0, "structural errors are detected before any fetch");
}

#[tokio::test]
async fn slow_adapter_times_out_as_unavailable() -> Result<()> {
    let eth = Arc::new(
        FakeAdapter::new(ChainId::Ethereum)
            .with_balance(ETH_ADDRESS, TWO_AND_A_HALF_ETH)
            .with_delay(Duration::from_secs(5)),
    );
    let sol = Arc::new(FakeAdapter::new(ChainId::Solana).with_balance(SOL_ADDRESS, ONE_AND_A_HALF_SOL));
    let oracle = Arc::new(FakeOracle::new().with_price("ETH", 3000).with_price("SOL", 100));

    let aggregator = PortfolioAggregator::new(registry(eth, sol), oracle)
        .with_timeout(Duration::from_millis(100));
    let portfolio = aggregator
        .build_portfolio(&[WalletRef::ethereum(ETH_ADDRESS), WalletRef::solana(SOL_ADDRESS)])
        .await?;

    match &portfolio.wallets[0].status {
        ValuationStatus::Failed { kind, message } => {
            assert_eq!(*kind, FetchErrorKind::UpstreamUnavailable);
            assert!(message.contains("timed out"), "{message}");
        }
        other => panic!("expected timeout, got {other:?}"),
    }
    assert_eq!(portfolio.grand_total_usd, dec("150"));

    Ok(())
}

#[tokio::test]
async fn slow_oracle_degrades_to_unpriced() -> Result<()> {
    let eth = Arc::new(FakeAdapter::new(ChainId::Ethereum).with_balance(ETH_ADDRESS, TWO_AND_A_HALF_ETH));
    let sol = Arc::new(FakeAdapter::new(ChainId::Solana));
    let oracle = Arc::new(
        FakeOracle::new()
            .with_price("ETH", 3000)
            .with_delay(Duration::from_secs(5)),
    );

    let aggregator = PortfolioAggregator::new(registry(eth, sol), oracle)
        .with_timeout(Duration::from_millis(100));
    let portfolio = aggregator
        .build_portfolio(&[WalletRef::ethereum(ETH_ADDRESS)])
        .await?;

    let eth_snapshot = snapshot(&portfolio.wallets[0].status);
    assert!(eth_snapshot.native.price_unavailable);
    assert_eq!(eth_snapshot.native.decimal_amount, dec("2.5"));

    Ok(())
}

#[tokio::test]
async fn results_keep_input_order_despite_completion_order() -> Result<()> {
    // The first wallet answers last.
    let eth = Arc::new(
        FakeAdapter::new(ChainId::Ethereum)
            .with_balance(ETH_ADDRESS, TWO_AND_A_HALF_ETH)
            .with_delay(Duration::from_millis(150)),
    );
    let sol = Arc::new(
        FakeAdapter::new(ChainId::Solana)
            .with_balance(SOL_ADDRESS, ONE_AND_A_HALF_SOL)
            .with_balance(SOL_ADDRESS_2, 1),
    );
    let oracle = Arc::new(FakeOracle::new().with_price("ETH", 3000).with_price("SOL", 100));

    let aggregator = PortfolioAggregator::new(registry(eth, sol), oracle).with_max_concurrent(3);
    let input = vec![
        WalletRef::ethereum(ETH_ADDRESS),
        WalletRef::solana(SOL_ADDRESS),
        WalletRef::solana(SOL_ADDRESS_2),
    ];
    let portfolio = aggregator.build_portfolio(&input).await?;

    let output: Vec<WalletRef> = portfolio.wallets.iter().map(|w| w.wallet.clone()).collect();
    assert_eq!(output, input);

    let chains: Vec<ChainId> = portfolio.chains.iter().map(|c| c.chain).collect();
    assert_eq!(chains, vec![ChainId::Ethereum, ChainId::Solana]);

    Ok(())
}

#[tokio::test]
async fn missing_etherscan_key_fails_only_ethereum() -> Result<()> {
    let eth = Arc::new(FakeAdapter::new(ChainId::Ethereum).with_error(
        ETH_ADDRESS,
        FetchError::MissingCredential {
            chain: ChainId::Ethereum,
            name: "ETHERSCAN_API_KEY".to_string(),
        },
    ));
    let sol = Arc::new(FakeAdapter::new(ChainId::Solana).with_balance(SOL_ADDRESS, ONE_AND_A_HALF_SOL));
    let oracle = Arc::new(FakeOracle::new().with_price("SOL", 100));

    let aggregator = PortfolioAggregator::new(registry(eth, sol), oracle);
    let portfolio = aggregator
        .build_portfolio(&[WalletRef::ethereum(ETH_ADDRESS), WalletRef::solana(SOL_ADDRESS)])
        .await?;

    match &portfolio.wallets[0].status {
        ValuationStatus::Failed { kind, message } => {
            assert_eq!(*kind, FetchErrorKind::MissingCredential);
            assert!(message.contains("ETHERSCAN_API_KEY"), "{message}");
        }
        other => panic!("expected MissingCredential, got {other:?}"),
    }
    assert!(!portfolio.wallets[1].is_failed());
    assert_eq!(portfolio.grand_total_usd, dec("150"));

    Ok(())
}

#[tokio::test]
async fn balances_are_recorded_in_the_ledger() -> Result<()> {
    let storage = Arc::new(MemoryStorage::new());
    let wallet = Wallet::new(WalletRef::solana(SOL_ADDRESS), None);
    storage.save_wallet(&wallet).await?;

    let eth = Arc::new(FakeAdapter::new(ChainId::Ethereum));
    let sol = Arc::new(FakeAdapter::new(ChainId::Solana).with_balance(SOL_ADDRESS, ONE_AND_A_HALF_SOL));
    let aggregator = PortfolioAggregator::new(registry(eth, sol), Arc::new(FakeOracle::new()))
        .with_storage(storage.clone());

    aggregator.build_portfolio(&[wallet.wallet_ref()]).await?;
    aggregator.build_portfolio(&[wallet.wallet_ref()]).await?;

    let records = storage.get_balance_records(&wallet.id).await?;
    assert_eq!(records.len(), 2);
    assert!(records.iter().all(|r| r.symbol == "SOL" && r.amount == dec("1.5")));

    Ok(())
}

#[tokio::test]
async fn ledger_uses_the_stored_wallet_id() -> Result<()> {
    let dir = TempDir::new()?;
    let storage = Arc::new(JsonFileStorage::new(dir.path()));
    let mut wallet = Wallet::new(WalletRef::solana(SOL_ADDRESS), None);
    wallet.id = Id::from("my-sol-wallet");
    storage.save_wallet(&wallet).await?;

    let wallets: Vec<WalletRef> = storage
        .list_wallets()
        .await?
        .iter()
        .map(Wallet::wallet_ref)
        .collect();

    let eth = Arc::new(FakeAdapter::new(ChainId::Ethereum));
    let sol = Arc::new(FakeAdapter::new(ChainId::Solana).with_balance(SOL_ADDRESS, ONE_AND_A_HALF_SOL));
    let oracle = Arc::new(FakeOracle::new().with_price("SOL", 100));
    let aggregator = PortfolioAggregator::new(registry(eth, sol), oracle).with_storage(storage.clone());

    let portfolio = aggregator.build_portfolio(&wallets).await?;
    assert_eq!(portfolio.grand_total_usd, dec("150"));

    let records = storage.get_balance_records(&Id::from("my-sol-wallet")).await?;
    assert_eq!(records.len(), 1);
    assert_eq!(records[0].amount, dec("1.5"));
    assert!(storage.get_balance_records(&wallet.wallet_ref().id()).await?.is_empty());

    Ok(())
}

#[tokio::test]
async fn unlinked_wallet_is_valued_without_ledger_rows() -> Result<()> {
    let storage = Arc::new(MemoryStorage::new());
    let eth = Arc::new(FakeAdapter::new(ChainId::Ethereum));
    let sol = Arc::new(FakeAdapter::new(ChainId::Solana).with_balance(SOL_ADDRESS, ONE_AND_A_HALF_SOL));
    let oracle = Arc::new(FakeOracle::new().with_price("SOL", 100));
    let aggregator = PortfolioAggregator::new(registry(eth, sol), oracle).with_storage(storage.clone());

    let portfolio = aggregator
        .build_portfolio(&[WalletRef::solana(SOL_ADDRESS)])
        .await?;
    assert_eq!(portfolio.grand_total_usd, dec("150"));
    assert!(storage.list_wallets().await?.is_empty());

    Ok(())
}

#[tokio::test]
async fn ledger_failure_does_not_fail_valuation() -> Result<()> {
    let storage = Arc::new(BrokenLedgerStorage::default());
    storage
        .save_wallet(&Wallet::new(WalletRef::ethereum(ETH_ADDRESS), None))
        .await?;
    let eth = Arc::new(FakeAdapter::new(ChainId::Ethereum).with_balance(ETH_ADDRESS, TWO_AND_A_HALF_ETH));
    let sol = Arc::new(FakeAdapter::new(ChainId::Solana));
    let oracle = Arc::new(FakeOracle::new().with_price("ETH", 3000));

    let aggregator = PortfolioAggregator::new(registry(eth, sol), oracle).with_storage(storage.clone());
    let portfolio = aggregator
        .build_portfolio(&[WalletRef::ethereum(ETH_ADDRESS)])
        .await?;

    assert_eq!(storage.append_attempts(), 1);
    assert_eq!(portfolio.grand_total_usd, dec("7500"));

    Ok(())
}

#[tokio::test]
async fn portfolio_serializes_decimals_as_strings() -> Result<()> {
    let eth = Arc::new(FakeAdapter::new(ChainId::Ethereum).with_balance(ETH_ADDRESS, TWO_AND_A_HALF_ETH));
    let sol = Arc::new(FakeAdapter::new(ChainId::Solana));
    let oracle = Arc::new(FakeOracle::new().with_price("ETH", 3000));

    let aggregator = PortfolioAggregator::new(registry(eth, sol), oracle);
    let portfolio = aggregator
        .build_portfolio(&[WalletRef::ethereum(ETH_ADDRESS)])
        .await?;

    let json = serde_json::to_value(&portfolio)?;
    let total = json["grand_total_usd"].as_str().expect("decimal as string");
    assert_eq!(dec(total), dec("7500"));
    assert_eq!(json["chains"][0]["chain"], "ethereum");
    assert_eq!(json["chains"][0]["snapshots"][0]["native"]["symbol"], "ETH");
    assert_eq!(json["chains"][0]["snapshots"][0]["wallet"]["address"], ETH_ADDRESS);
    assert_eq!(json["wallets"][0]["status"]["valued"]["native"]["symbol"], "ETH");

    Ok(())
}
