// The recompute backstop must agree with the incrementally maintained
// counters after any sequence of settlements and reversals.

use std::sync::Arc;

use chrono::{Duration, NaiveDate, Utc};
use rust_decimal::Decimal;
use rust_decimal_macros::dec;

use yenledger::core::{CurrencyCode, LedgerStore};
use yenledger::modules::currencies::models::CurrencyAggregate;
use yenledger::modules::customers::models::Customer;
use yenledger::modules::invoices::services::InvoiceService;
use yenledger::payments::models::PaymentDraft;
use yenledger::payments::services::{RecomputeService, ReversalService, SettlementService};
use yenledger::storage::MemoryStore;

fn usd() -> CurrencyCode {
    CurrencyCode::new("USD").unwrap()
}

fn seeded_store() -> Arc<MemoryStore> {
    let store = Arc::new(MemoryStore::new());
    store.seed_customer(Customer {
        id: "cust-1".to_string(),
        name: "Acme GK".to_string(),
        email: None,
        phone: None,
        address: None,
        currency: usd(),
        amount_in_jpy: Decimal::ZERO,
        created_at: Utc::now() - Duration::days(30),
    });
    store.seed_currency(CurrencyAggregate::new(usd(), "US Dollar".to_string()));
    store
}

async fn create_invoice(store: &Arc<MemoryStore>, no: &str, total: Decimal) {
    InvoiceService::new(store.clone())
        .create_invoice(
            no.to_string(),
            "cust-1".to_string(),
            usd(),
            total,
            NaiveDate::from_ymd_opt(2025, 6, 1).unwrap(),
        )
        .await
        .unwrap();
}

async fn settle(store: &Arc<MemoryStore>, no: &str, amount: Decimal, fbc: Decimal, lbc: Decimal) -> String {
    let service = SettlementService::new(store.clone());
    let draft = PaymentDraft {
        payment_no: no.to_string(),
        date: NaiveDate::from_ymd_opt(2025, 6, 15).unwrap(),
        customer_id: "cust-1".to_string(),
        currency: usd(),
        amount,
        exchange_rate: dec!(150.00),
        foreign_bank_charge: fbc,
        local_bank_charge: lbc,
    };
    let lines = service.plan_allocation(&draft).await.unwrap();
    service.settle(draft, lines).await.unwrap()
}

async fn assert_counters_match_history(store: &Arc<MemoryStore>) {
    let recompute = RecomputeService::new(store.clone());

    let customer = store.customer("cust-1").await.unwrap().unwrap();
    let recomputed_jpy = recompute.recompute_customer_jpy("cust-1").await.unwrap();
    assert_eq!(recomputed_jpy, customer.amount_in_jpy);

    let aggregate = store.currency_aggregate(&usd()).await.unwrap().unwrap();
    let totals = recompute.recompute_currency(&usd()).await.unwrap();
    assert_eq!(totals.amount_due, aggregate.amount_due);
    assert_eq!(totals.amount_paid, aggregate.amount_paid);
    assert_eq!(totals.amount_in_jpy, aggregate.amount_in_jpy);
    assert_eq!(totals.foreign_bank_charge, aggregate.foreign_bank_charge);
    assert_eq!(totals.local_bank_charge, aggregate.local_bank_charge);
}

#[tokio::test]
async fn counters_match_history_after_settlements() {
    let store = seeded_store();
    create_invoice(&store, "INV-0001", dec!(80.00)).await;
    create_invoice(&store, "INV-0002", dec!(120.00)).await;

    settle(&store, "PAY-1", dec!(80.00), dec!(2.50), dec!(200)).await;
    assert_counters_match_history(&store).await;

    settle(&store, "PAY-2", dec!(50.00), dec!(0), dec!(0)).await;
    assert_counters_match_history(&store).await;
}

#[tokio::test]
async fn counters_match_history_after_a_reversal() {
    let store = seeded_store();
    create_invoice(&store, "INV-0001", dec!(100.00)).await;

    settle(&store, "PAY-1", dec!(60.00), dec!(1.00), dec!(100)).await;
    let second = settle(&store, "PAY-2", dec!(40.00), dec!(0), dec!(50)).await;

    ReversalService::new(store.clone())
        .reverse(&second)
        .await
        .unwrap();

    assert_counters_match_history(&store).await;
}

#[tokio::test]
async fn empty_history_recomputes_to_zero() {
    let store = seeded_store();
    let recompute = RecomputeService::new(store.clone());

    assert_eq!(
        recompute.recompute_customer_jpy("cust-1").await.unwrap(),
        Decimal::ZERO
    );

    let totals = recompute.recompute_currency(&usd()).await.unwrap();
    assert_eq!(totals.amount_due, Decimal::ZERO);
    assert_eq!(totals.amount_paid, Decimal::ZERO);
    assert_eq!(totals.amount_in_jpy, Decimal::ZERO);
}

#[tokio::test]
async fn recompute_never_writes() {
    let store = seeded_store();
    create_invoice(&store, "INV-0001", dec!(100.00)).await;
    settle(&store, "PAY-1", dec!(100.00), dec!(0), dec!(0)).await;

    let before = store.currency_aggregate(&usd()).await.unwrap().unwrap();
    let recompute = RecomputeService::new(store.clone());
    recompute.recompute_currency(&usd()).await.unwrap();
    recompute.recompute_customer_jpy("cust-1").await.unwrap();
    let after = store.currency_aggregate(&usd()).await.unwrap().unwrap();

    assert_eq!(before, after);
}
