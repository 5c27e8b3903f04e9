// Reversal must be the exact algebraic inverse of settlement, and only the
// customer's most recent payment may be unwound.

use std::sync::Arc;

use chrono::{Duration, NaiveDate, Utc};
use rust_decimal::Decimal;
use rust_decimal_macros::dec;

use yenledger::core::{AppError, CurrencyCode, LedgerStore};
use yenledger::modules::currencies::models::CurrencyAggregate;
use yenledger::modules::customers::models::Customer;
use yenledger::modules::invoices::models::{Invoice, InvoiceStatus};
use yenledger::payments::models::PaymentDraft;
use yenledger::payments::services::{ReversalService, SettlementService};
use yenledger::storage::MemoryStore;

fn usd() -> CurrencyCode {
    CurrencyCode::new("USD").unwrap()
}

fn seeded_store(due: Decimal) -> Arc<MemoryStore> {
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
    let mut aggregate = CurrencyAggregate::new(usd(), "US Dollar".to_string());
    aggregate.amount_due = due;
    store.seed_currency(aggregate);
    store
}

fn seed_invoice(store: &MemoryStore, id: &str, total: Decimal, age_days: i64) {
    let mut invoice = Invoice::new(
        format!("INV-{}", id),
        "cust-1".to_string(),
        "Acme GK".to_string(),
        usd(),
        total,
        NaiveDate::from_ymd_opt(2025, 6, 1).unwrap(),
    )
    .unwrap();
    invoice.id = id.to_string();
    invoice.created_at = Utc::now() - Duration::days(age_days);
    store.seed_invoice(invoice);
}

fn draft(no: &str, amount: Decimal, fbc: Decimal, lbc: Decimal) -> PaymentDraft {
    PaymentDraft {
        payment_no: no.to_string(),
        date: NaiveDate::from_ymd_opt(2025, 6, 15).unwrap(),
        customer_id: "cust-1".to_string(),
        currency: usd(),
        amount,
        exchange_rate: dec!(150.00),
        foreign_bank_charge: fbc,
        local_bank_charge: lbc,
    }
}

async fn settle(store: &Arc<MemoryStore>, draft: PaymentDraft) -> String {
    let service = SettlementService::new(store.clone());
    let lines = service.plan_allocation(&draft).await.unwrap();
    service.settle(draft, lines).await.unwrap()
}

#[tokio::test]
async fn reversal_restores_every_record_to_its_pre_settlement_state() {
    let store = seeded_store(dec!(100.00));
    seed_invoice(&store, "a", dec!(100.00), 10);

    let invoice_before = store.invoice("a").await.unwrap().unwrap();
    let customer_before = store.customer("cust-1").await.unwrap().unwrap();
    let aggregate_before = store.currency_aggregate(&usd()).await.unwrap().unwrap();

    let payment_id = settle(&store, draft("PAY-1", dec!(100.00), dec!(5.00), dec!(300))).await;

    ReversalService::new(store.clone())
        .reverse(&payment_id)
        .await
        .unwrap();

    let invoice = store.invoice("a").await.unwrap().unwrap();
    assert_eq!(invoice.balance, invoice_before.balance);
    assert_eq!(invoice.amount_paid, invoice_before.amount_paid);
    assert_eq!(invoice.received_jpy, invoice_before.received_jpy);
    assert_eq!(invoice.foreign_bank_charge, invoice_before.foreign_bank_charge);
    assert_eq!(invoice.local_bank_charge, invoice_before.local_bank_charge);
    assert_eq!(invoice.status, InvoiceStatus::Pending);

    let customer = store.customer("cust-1").await.unwrap().unwrap();
    assert_eq!(customer.amount_in_jpy, customer_before.amount_in_jpy);

    let aggregate = store.currency_aggregate(&usd()).await.unwrap().unwrap();
    assert_eq!(aggregate.amount_due, aggregate_before.amount_due);
    assert_eq!(aggregate.amount_paid, aggregate_before.amount_paid);
    assert_eq!(aggregate.amount_in_jpy, aggregate_before.amount_in_jpy);
    assert_eq!(aggregate.foreign_bank_charge, aggregate_before.foreign_bank_charge);
    assert_eq!(aggregate.local_bank_charge, aggregate_before.local_bank_charge);

    assert!(store.payment(&payment_id).await.unwrap().is_none());
    assert!(store
        .allocations_for_payment(&payment_id)
        .await
        .unwrap()
        .is_empty());
}

#[tokio::test]
async fn only_the_latest_payment_may_be_reversed() {
    let store = seeded_store(dec!(200.00));
    seed_invoice(&store, "a", dec!(80.00), 20);
    seed_invoice(&store, "b", dec!(120.00), 5);

    let first = settle(&store, draft("PAY-1", dec!(80.00), dec!(0), dec!(0))).await;
    let second = settle(&store, draft("PAY-2", dec!(50.00), dec!(0), dec!(0))).await;

    let reversal = ReversalService::new(store.clone());

    let err = reversal.reverse(&first).await.unwrap_err();
    assert!(matches!(err, AppError::NotLatestPayment(_)));

    // the failed attempt must not have touched anything
    assert!(store.payment(&first).await.unwrap().is_some());
    let invoice = store.invoice("a").await.unwrap().unwrap();
    assert_eq!(invoice.status, InvoiceStatus::Paid);

    // reversing the newest first unlocks the older one
    reversal.reverse(&second).await.unwrap();
    reversal.reverse(&first).await.unwrap();

    let customer = store.customer("cust-1").await.unwrap().unwrap();
    assert_eq!(customer.amount_in_jpy, Decimal::ZERO);
    let aggregate = store.currency_aggregate(&usd()).await.unwrap().unwrap();
    assert_eq!(aggregate.amount_due, dec!(200.00));
    assert_eq!(aggregate.amount_paid, dec!(0.00));
}

#[tokio::test]
async fn is_latest_payment_tracks_the_newest_record() {
    let store = seeded_store(dec!(100.00));
    seed_invoice(&store, "a", dec!(100.00), 10);

    let first = settle(&store, draft("PAY-1", dec!(40.00), dec!(0), dec!(0))).await;
    let second = settle(&store, draft("PAY-2", dec!(30.00), dec!(0), dec!(0))).await;

    let reversal = ReversalService::new(store.clone());
    let first_payment = store.payment(&first).await.unwrap().unwrap();
    let second_payment = store.payment(&second).await.unwrap().unwrap();

    assert!(!reversal.is_latest_payment(&first_payment).await.unwrap());
    assert!(reversal.is_latest_payment(&second_payment).await.unwrap());
}

#[tokio::test]
async fn reversing_a_partial_payment_reopens_the_invoice() {
    let store = seeded_store(dec!(100.00));
    seed_invoice(&store, "a", dec!(100.00), 10);

    let first = settle(&store, draft("PAY-1", dec!(60.00), dec!(0), dec!(0))).await;
    let second = settle(&store, draft("PAY-2", dec!(40.00), dec!(0), dec!(0))).await;

    let invoice = store.invoice("a").await.unwrap().unwrap();
    assert_eq!(invoice.status, InvoiceStatus::Paid);

    ReversalService::new(store.clone())
        .reverse(&second)
        .await
        .unwrap();

    let invoice = store.invoice("a").await.unwrap().unwrap();
    assert_eq!(invoice.status, InvoiceStatus::PartiallyPaid);
    assert_eq!(invoice.balance, dec!(40.00));
    assert_eq!(invoice.amount_paid, dec!(60.00));
    assert!(store.payment(&first).await.unwrap().is_some());
}

#[tokio::test]
async fn reversing_a_missing_payment_is_not_found() {
    let store = seeded_store(dec!(0));
    let err = ReversalService::new(store.clone())
        .reverse("nope")
        .await
        .unwrap_err();
    assert!(matches!(err, AppError::NotFound(_)));
}
