use std::collections::HashSet;
use std::sync::Arc;

use rust_decimal::Decimal;
use tracing::info;

use crate::core::money::round2;
use crate::core::{AppError, LedgerStore, Result, WriteOp};
use crate::modules::invoices::models::{Invoice, InvoiceStatus};
use crate::modules::payments::models::{AllocationLine, Payment, PaymentAllocation, PaymentDraft};
use crate::modules::payments::services::allocation_engine::{AllocationEngine, AllocationInput};

/// Applies an allocation plan's effects transactionally.
///
/// Validation is pure and runs to completion before the first write; the
/// writes themselves go through one `run_atomic_batch`, so either the
/// payment, its allocations, every invoice mutation, and both aggregate
/// updates land together, or nothing does.
pub struct SettlementService {
    store: Arc<dyn LedgerStore>,
}

impl SettlementService {
    pub fn new(store: Arc<dyn LedgerStore>) -> Self {
        Self { store }
    }

    /// Read the customer's open invoices and compute an allocation plan for
    /// a payment draft. Convenience wrapper over the pure engine.
    pub async fn plan_allocation(&self, draft: &PaymentDraft) -> Result<Vec<AllocationLine>> {
        let open = self
            .store
            .open_invoices(&draft.customer_id, &draft.currency)
            .await?;
        Ok(AllocationEngine::allocate(&Self::input_of(draft), &open))
    }

    /// Settle a payment draft against its allocation plan.
    ///
    /// Preconditions (violation rejects the whole operation, no mutation):
    /// the plan has at least one non-zero line; exactly the first non-zero
    /// line is primary; no invoice appears in more than one line; every
    /// allocation fits the invoice's current balance;
    /// the allocated total equals the payment amount to 2dp; the plan's yen
    /// total does not exceed the payment's yen equivalent.
    ///
    /// Returns the generated payment id.
    pub async fn settle(&self, draft: PaymentDraft, lines: Vec<AllocationLine>) -> Result<String> {
        draft.validate()?;

        let allocated: Vec<&AllocationLine> =
            lines.iter().filter(|l| l.is_allocated()).collect();
        if allocated.is_empty() {
            return Err(AppError::validation(
                "Payment must be allocated to at least one invoice",
            ));
        }
        Self::check_primary_contract(&lines)?;

        // one line per invoice; duplicates would each validate against the
        // same balance and then overwrite each other's invoice update
        let mut seen: HashSet<&str> = HashSet::with_capacity(allocated.len());
        for line in &allocated {
            if !seen.insert(line.invoice_id.as_str()) {
                return Err(AppError::validation(format!(
                    "Invoice '{}' appears in more than one allocation line",
                    line.invoice_id
                )));
            }
        }

        let total_allocated = round2(allocated.iter().map(|l| l.allocated_amount).sum());
        if total_allocated != round2(draft.amount) {
            return Err(AppError::validation(format!(
                "Allocated total ({}) must exactly match the payment amount ({})",
                total_allocated, draft.amount
            )));
        }

        let amount_in_jpy = AllocationEngine::total_expected_jpy(&Self::input_of(&draft));
        let total_jpy: Decimal = allocated.iter().map(|l| l.received_jpy).sum();
        if total_jpy > amount_in_jpy {
            return Err(AppError::validation(format!(
                "Allocated yen total ({}) exceeds the payment's yen equivalent ({})",
                total_jpy, amount_in_jpy
            )));
        }

        let customer = self
            .store
            .customer(&draft.customer_id)
            .await?
            .ok_or_else(|| {
                AppError::not_found(format!("Customer '{}' not found", draft.customer_id))
            })?;
        let aggregate = self
            .store
            .currency_aggregate(&draft.currency)
            .await?
            .ok_or_else(|| {
                AppError::not_found(format!("Currency aggregate '{}' not found", draft.currency))
            })?;

        // re-read every touched invoice; plans validated against stale
        // balances must not slip through
        let mut touched: Vec<(Invoice, &AllocationLine)> = Vec::with_capacity(allocated.len());
        for &line in &allocated {
            let invoice = self.store.invoice(&line.invoice_id).await?.ok_or_else(|| {
                AppError::not_found(format!("Invoice '{}' not found", line.invoice_id))
            })?;
            if invoice.currency != draft.currency {
                return Err(AppError::validation(format!(
                    "Invoice '{}' is in {}, payment is in {}",
                    invoice.invoice_no, invoice.currency, draft.currency
                )));
            }
            if line.allocated_amount > invoice.balance {
                return Err(AppError::validation(format!(
                    "Allocation ({}) exceeds balance ({}) of invoice '{}'",
                    line.allocated_amount, invoice.balance, invoice.invoice_no
                )));
            }
            touched.push((invoice, line));
        }

        let payment = Payment::from_draft(&draft, customer.name.clone(), amount_in_jpy, total_allocated);
        let payment_id = payment.id.clone();

        let mut ops: Vec<WriteOp> = Vec::with_capacity(touched.len() * 2 + 3);
        ops.push(WriteOp::InsertPayment(payment));

        for (mut invoice, line) in touched {
            invoice.amount_paid = round2(invoice.amount_paid + line.allocated_amount);
            invoice.balance = round2(invoice.total_amount - invoice.amount_paid);
            invoice.status = InvoiceStatus::for_balance(invoice.balance, invoice.total_amount);
            invoice.foreign_bank_charge =
                round2(invoice.foreign_bank_charge + line.foreign_bank_charge);
            invoice.local_bank_charge = round2(invoice.local_bank_charge + line.local_bank_charge);
            invoice.received_jpy += line.received_jpy;

            ops.push(WriteOp::InsertAllocation(PaymentAllocation::new(
                payment_id.clone(),
                invoice.id.clone(),
                invoice.invoice_no.clone(),
                line.allocated_amount,
                line.received_jpy,
                line.foreign_bank_charge,
                line.local_bank_charge,
                draft.exchange_rate,
                draft.currency.clone(),
            )));
            ops.push(WriteOp::UpdateInvoice(invoice));
        }

        let mut customer = customer;
        customer.amount_in_jpy = round2(customer.amount_in_jpy + amount_in_jpy);
        ops.push(WriteOp::UpdateCustomer(customer));

        let mut aggregate = aggregate;
        // due is clamped at zero at store time only; arithmetic stays unclamped
        aggregate.amount_due = round2(aggregate.amount_due - total_allocated).max(Decimal::ZERO);
        aggregate.amount_paid = round2(aggregate.amount_paid + total_allocated);
        aggregate.foreign_bank_charge =
            round2(aggregate.foreign_bank_charge + draft.foreign_bank_charge);
        aggregate.local_bank_charge =
            round2(aggregate.local_bank_charge + draft.local_bank_charge);
        aggregate.amount_in_jpy += amount_in_jpy;
        ops.push(WriteOp::UpdateCurrencyAggregate(aggregate));

        self.store.run_atomic_batch(ops).await?;

        info!(
            payment_id = %payment_id,
            customer_id = %draft.customer_id,
            currency = %draft.currency,
            amount = %draft.amount,
            %amount_in_jpy,
            "payment settled"
        );

        Ok(payment_id)
    }

    /// At most one primary line, it must allocate, and it must be the first
    /// line that allocates. The FIFO/charge coupling is a contract, not a
    /// positional accident.
    fn check_primary_contract(lines: &[AllocationLine]) -> Result<()> {
        let primaries: Vec<&AllocationLine> = lines.iter().filter(|l| l.is_primary).collect();
        match primaries.as_slice() {
            [single] => {
                if !single.is_allocated() {
                    return Err(AppError::validation("Primary line has no allocation"));
                }
                let first_allocated = lines.iter().find(|l| l.is_allocated());
                if first_allocated.map(|l| &l.invoice_id) != Some(&single.invoice_id) {
                    return Err(AppError::validation(
                        "Primary line must be the first allocated line",
                    ));
                }
                Ok(())
            }
            [] => Err(AppError::validation(
                "Allocation plan has no primary line to carry the bank charges",
            )),
            _ => Err(AppError::validation(
                "Allocation plan has more than one primary line",
            )),
        }
    }

    fn input_of(draft: &PaymentDraft) -> AllocationInput {
        AllocationInput {
            amount: draft.amount,
            exchange_rate: draft.exchange_rate,
            foreign_bank_charge: draft.foreign_bank_charge,
            local_bank_charge: draft.local_bank_charge,
        }
    }
}

impl std::fmt::Debug for SettlementService {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SettlementService").finish_non_exhaustive()
    }
}
