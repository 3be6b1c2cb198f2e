//! Batch Orchestrator Integration Tests
//!
//! Drive whole batches through the public API:
//! 1. Mixed batches against the recording mocks in `ports::mocks`
//! 2. Same-seller coalescing across partial relay failures
//! 3. Pre-flight rejection with no network traffic
//! 4. One batch through the real HTTP backend client against a local mock server
//!
//! All tests are deterministic and run on paused tokio time where timing matters.

use std::time::Duration;

use batchpilot::adapters::backend::{paths, BackendClient, BackendConfig};
use batchpilot::application::{BatchConfig, BatchOrchestrator, OrchestratorError};
use batchpilot::domain::{
    AmountSpec, AssetKind, BalanceBook, CleanerOperation, Contribution, DeploymentOperation,
    OperationDescriptor, OperationStatus, TokenMetadata, TransferOperation, WalletDirectory,
    WalletRecord,
};
use batchpilot::ports::mocks::{unsigned_transaction, MockBalances, MockRelay, MockTemplates};
use rust_decimal::Decimal;
use rust_decimal_macros::dec;
use tokio::time::Instant;

const MINT: &str = "EPjFWdd5AufqSSqeM2qN1xzybapC8G4wEGGkZwyTDt1v";

// ============================================================================
// Test Fixtures
// ============================================================================

fn wallets(n: usize) -> Vec<WalletRecord> {
    (0..n).map(|_| WalletRecord::generate()).collect()
}

fn funded(wallets: &[WalletRecord]) -> MockBalances {
    let balances = MockBalances::default();
    for w in wallets {
        balances.set_sol(w.address(), dec!(3));
        balances.set_token(w.address(), MINT, dec!(2000));
    }
    balances
}

fn cleaner(seller: &WalletRecord, buyer: &WalletRecord) -> OperationDescriptor {
    OperationDescriptor::Cleaner(CleanerOperation {
        seller: seller.clone(),
        buyer: buyer.clone(),
        token_address: MINT.to_string(),
        sell_amount: AmountSpec::Percentage(dec!(25)),
        buy_amount: AmountSpec::Percentage(dec!(10)),
    })
}

fn sol_transfer(source: &WalletRecord, recipient: &WalletRecord, amount: AmountSpec) -> OperationDescriptor {
    OperationDescriptor::Transfer(TransferOperation {
        source: source.clone(),
        recipient: recipient.address().to_string(),
        amount,
        asset: AssetKind::Sol,
    })
}

fn deployment(wallets: &[WalletRecord]) -> OperationDescriptor {
    OperationDescriptor::Deployment(DeploymentOperation {
        contributions: wallets
            .iter()
            .map(|w| Contribution {
                wallet: w.clone(),
                sol_amount: dec!(1),
            })
            .collect(),
        metadata: TokenMetadata {
            name: "Batch Pilot".into(),
            symbol: "BPLT".into(),
            description: "integration".into(),
            image_uri: None,
            twitter: None,
            telegram: None,
            website: None,
        },
    })
}

fn no_delay() -> BatchConfig {
    BatchConfig {
        inter_operation_delay: Duration::ZERO,
        ..Default::default()
    }
}

// ============================================================================
// Mixed batches
// ============================================================================

#[tokio::test(start_paused = true)]
async fn test_mixed_batch_completes_in_order() {
    let w = wallets(4);
    let templates = MockTemplates::new();
    let relay = MockRelay::new();
    let orchestrator = BatchOrchestrator::new(
        templates.clone(),
        relay.clone(),
        funded(&w),
        WalletDirectory::from_records(w.clone()).unwrap(),
    );

    let batch = vec![
        cleaner(&w[0], &w[1]),
        sol_transfer(&w[2], &w[3], AmountSpec::Absolute(dec!(0.5))),
        deployment(&w[1..3]),
        cleaner(&w[0], &w[3]),
    ];
    let report = orchestrator.execute_batch(&batch, true).await.unwrap();

    assert_eq!(report.results.len(), 4);
    assert!(report.all_succeeded(), "{:?}", report.results);
    assert_eq!(relay.call_count(), 4);

    let ids: Vec<_> = report
        .results
        .iter()
        .map(|r| r.bundle_id.clone().unwrap())
        .collect();
    assert_eq!(ids, vec!["bundle-0", "bundle-1", "bundle-2", "bundle-3"]);

    // 25% of 2000 tokens on the first cleaner, nothing on the repeat seller
    let sells: Vec<Decimal> = templates.cleaner_requests().iter().map(|r| r.sell_amount).collect();
    assert_eq!(sells, vec![dec!(500), Decimal::ZERO]);

    // 10% of the buyer's 3 SOL
    assert_eq!(templates.cleaner_requests()[0].buy_amount, dec!(0.3));
}

#[tokio::test(start_paused = true)]
async fn test_two_sellers_two_buyers_with_failed_first_sell() {
    let w = wallets(4);
    let (a, b, x, y) = (&w[0], &w[1], &w[2], &w[3]);
    let templates = MockTemplates::new();
    let orchestrator = BatchOrchestrator::new(
        templates.clone(),
        MockRelay::new().failing_call(0),
        funded(&w),
        WalletDirectory::from_records(w.clone()).unwrap(),
    )
    .with_config(no_delay());

    let batch = vec![cleaner(a, x), cleaner(b, x), cleaner(a, y), cleaner(b, y)];
    let report = orchestrator.execute_batch(&batch, true).await.unwrap();

    assert_eq!(report.results[0].status, OperationStatus::Failed);
    assert_eq!(report.succeeded, 3);

    let requests = templates.cleaner_requests();
    // A's retry on its second buyer still carries the sell leg
    assert_eq!(requests[2].seller_address, a.address());
    assert!(requests[2].sell_amount > Decimal::ZERO);
    // B sold on its first operation only
    assert!(requests[1].sell_amount > Decimal::ZERO);
    assert_eq!(requests[3].sell_amount, Decimal::ZERO);
}

#[tokio::test(start_paused = true)]
async fn test_template_rejection_is_isolated() {
    let w = wallets(2);
    let orchestrator = BatchOrchestrator::new(
        MockTemplates::new().rejecting_call(1),
        MockRelay::new(),
        funded(&w),
        WalletDirectory::from_records(w.clone()).unwrap(),
    );

    let batch = vec![
        sol_transfer(&w[0], &w[1], AmountSpec::Absolute(dec!(0.1))),
        sol_transfer(&w[0], &w[1], AmountSpec::Absolute(dec!(0.1))),
        sol_transfer(&w[1], &w[0], AmountSpec::Absolute(dec!(0.1))),
    ];
    let report = orchestrator.execute_batch(&batch, true).await.unwrap();

    let statuses: Vec<_> = report.results.iter().map(|r| r.status).collect();
    assert_eq!(
        statuses,
        vec![OperationStatus::Completed, OperationStatus::Failed, OperationStatus::Completed]
    );
    assert_eq!(report.summary(), "2 succeeded, 1 failed");
}

// ============================================================================
// Pre-flight
// ============================================================================

#[tokio::test(start_paused = true)]
async fn test_poor_seller_rejects_batch_without_network_calls() {
    let w = wallets(3);
    let balances = funded(&w);
    balances.set_sol(w[2].address(), dec!(0.005));
    let templates = MockTemplates::new();
    let relay = MockRelay::new();

    let orchestrator = BatchOrchestrator::new(
        templates.clone(),
        relay.clone(),
        balances,
        WalletDirectory::from_records(w.clone()).unwrap(),
    );

    let batch = vec![cleaner(&w[0], &w[1]), cleaner(&w[2], &w[1])];
    let err = orchestrator.execute_batch(&batch, true).await.unwrap_err();

    assert!(matches!(err, OrchestratorError::ValidationFailed(ref issues) if issues[0].index == 1));
    assert_eq!(templates.call_count(), 0);
    assert_eq!(relay.call_count(), 0);
}

#[tokio::test(start_paused = true)]
async fn test_empty_batch_rejected() {
    let orchestrator = BatchOrchestrator::new(
        MockTemplates::new(),
        MockRelay::new(),
        BalanceBook::new(),
        WalletDirectory::new(),
    );

    let err = orchestrator.execute_batch(&[], true).await.unwrap_err();
    assert!(matches!(err, OrchestratorError::ValidationFailed(_)));
}

#[tokio::test(start_paused = true)]
async fn test_underfunded_deployment_rejected() {
    let w = wallets(2);
    let balances = funded(&w);
    // Needs 1 SOL contribution + 0.05 padding
    balances.set_sol(w[1].address(), dec!(1.04));

    let orchestrator = BatchOrchestrator::new(
        MockTemplates::new(),
        MockRelay::new(),
        balances,
        WalletDirectory::from_records(w.clone()).unwrap(),
    );

    let err = orchestrator
        .execute_batch(&[deployment(&w)], true)
        .await
        .unwrap_err();
    assert!(matches!(err, OrchestratorError::ValidationFailed(_)));
}

// ============================================================================
// Amounts and timing
// ============================================================================

#[tokio::test(start_paused = true)]
async fn test_full_balance_transfer_is_exact() {
    let w = wallets(2);
    let balances = BalanceBook::new().with_sol(w[0].address(), dec!(5));
    let templates = MockTemplates::new();

    let orchestrator = BatchOrchestrator::new(
        templates.clone(),
        MockRelay::new(),
        balances,
        WalletDirectory::from_records(w.clone()).unwrap(),
    );

    orchestrator
        .execute_batch(&[sol_transfer(&w[0], &w[1], AmountSpec::Percentage(dec!(100)))], true)
        .await
        .unwrap();

    match &templates.calls()[0] {
        batchpilot::ports::mocks::TemplateCall::Transfer(req) => {
            assert_eq!(req.amount, dec!(5));
        }
        other => panic!("unexpected call {:?}", other),
    }
}

#[tokio::test(start_paused = true)]
async fn test_rolling_window_across_batch() {
    let w = wallets(2);
    let relay = MockRelay::new();
    let orchestrator = BatchOrchestrator::new(
        MockTemplates::new(),
        relay.clone(),
        funded(&w),
        WalletDirectory::from_records(w.clone()).unwrap(),
    )
    .with_config(no_delay());

    let batch: Vec<_> = (0..7)
        .map(|i| sol_transfer(&w[i % 2], &w[(i + 1) % 2], AmountSpec::Absolute(dec!(0.01))))
        .collect();

    let start = Instant::now();
    let report = orchestrator.execute_batch(&batch, true).await.unwrap();
    assert!(report.all_succeeded());

    let times = relay.send_times();
    // ceil(7 / 2) - 1 = 3 full windows before the last start
    assert!(times[6].duration_since(start) >= Duration::from_secs(3));
    for (i, t) in times.iter().enumerate() {
        let in_window = times[i..]
            .iter()
            .filter(|u| u.duration_since(*t) < Duration::from_secs(1))
            .count();
        assert!(in_window <= 2, "window at {} holds {}", i, in_window);
    }
}

// ============================================================================
// HTTP backend
// ============================================================================

#[tokio::test]
async fn test_batch_through_http_backend() {
    let w = wallets(2);
    let mut server = mockito::Server::new_async().await;

    let template = unsigned_transaction(&[w[0].pubkey().unwrap()]);
    let build = server
        .mock("POST", paths::TRANSFER)
        .match_header("x-api-key", "integration-key")
        .with_status(200)
        .with_body(format!(r#"{{"success":true,"transactions":["{}"]}}"#, template))
        .expect(2)
        .create_async()
        .await;
    let send = server
        .mock("POST", paths::SEND)
        .with_status(200)
        .with_body(r#"{"result":{"jsonrpc":"2.0","id":1,"result":"landed-bundle"}}"#)
        .expect(2)
        .create_async()
        .await;

    let backend = BackendClient::new(
        BackendConfig::new(server.url()).with_api_key("integration-key".into()),
    )
    .unwrap();
    let orchestrator = BatchOrchestrator::new(
        backend.clone(),
        backend,
        BalanceBook::new().with_sol(w[0].address(), dec!(1)),
        WalletDirectory::from_records(w.clone()).unwrap(),
    )
    .with_config(BatchConfig {
        inter_operation_delay: Duration::from_millis(10),
        ..Default::default()
    });

    let batch = vec![
        sol_transfer(&w[0], &w[1], AmountSpec::Percentage(dec!(50))),
        sol_transfer(&w[0], &w[1], AmountSpec::Absolute(dec!(0.1))),
    ];
    let report = orchestrator.execute_batch(&batch, true).await.unwrap();

    build.assert_async().await;
    send.assert_async().await;
    assert!(report.all_succeeded());
    assert_eq!(report.results[0].bundle_id.as_deref(), Some("landed-bundle"));
}

#[tokio::test]
async fn test_unconfirmed_batch_never_reaches_backend() {
    let w = wallets(2);
    let mut server = mockito::Server::new_async().await;
    let build = server
        .mock("POST", paths::TRANSFER)
        .expect(0)
        .create_async()
        .await;

    let backend = BackendClient::new(BackendConfig::new(server.url())).unwrap();
    let orchestrator = BatchOrchestrator::new(
        backend.clone(),
        backend,
        BalanceBook::new(),
        WalletDirectory::from_records(w.clone()).unwrap(),
    );

    let err = orchestrator
        .execute_batch(&[sol_transfer(&w[0], &w[1], AmountSpec::Absolute(dec!(1)))], false)
        .await
        .unwrap_err();

    assert_eq!(err, OrchestratorError::NotConfirmed);
    build.assert_async().await;
}
