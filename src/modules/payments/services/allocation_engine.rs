use rust_decimal::Decimal;
use tracing::debug;

use crate::core::money::{jpy_floor, round2};
use crate::modules::invoices::models::Invoice;
use crate::modules::payments::models::AllocationLine;

/// Payment figures the allocation plan is computed from
#[derive(Debug, Clone)]
pub struct AllocationInput {
    /// Payment amount in payment currency
    pub amount: Decimal,
    /// Yen per unit of payment currency
    pub exchange_rate: Decimal,
    /// Deducted from the first allocation before yen conversion
    pub foreign_bank_charge: Decimal,
    /// Deducted from the converted yen total
    pub local_bank_charge: Decimal,
}

/// Distributes a payment across a customer's open invoices, oldest first.
///
/// Pure: reads nothing, writes nothing. The caller supplies the open invoice
/// set already in FIFO order (the `LedgerStore::open_invoices` contract) and
/// is responsible for rejecting plans that do not exhaust the payment amount
/// before settling them.
pub struct AllocationEngine;

impl AllocationEngine {
    /// Compute the allocation plan.
    ///
    /// FIFO walk over the invoices, each step capped by the invoice balance,
    /// every arithmetic step rounded to 2dp. The first non-zero line is the
    /// primary: it alone carries both bank charges, has the foreign charge
    /// subtracted before its yen conversion, and absorbs the yen rounding
    /// residual so that the sum of line yen amounts equals the authoritative
    /// total exactly.
    ///
    /// A non-positive exchange rate or an empty invoice set yields an empty
    /// plan; both are incomplete input, not errors.
    pub fn allocate(input: &AllocationInput, open_invoices: &[Invoice]) -> Vec<AllocationLine> {
        if open_invoices.is_empty() || input.exchange_rate <= Decimal::ZERO {
            return Vec::new();
        }

        let amount = round2(input.amount);
        let foreign_charge = round2(input.foreign_bank_charge);
        let local_charge = round2(input.local_bank_charge);

        let mut remaining = amount;
        let mut primary_assigned = false;
        let mut lines: Vec<AllocationLine> = Vec::with_capacity(open_invoices.len());

        for invoice in open_invoices {
            if remaining <= Decimal::ZERO {
                // zero-allocation rows stay in the plan for display
                lines.push(AllocationLine {
                    invoice_id: invoice.id.clone(),
                    allocated_amount: Decimal::ZERO,
                    balance: invoice.balance,
                    foreign_bank_charge: Decimal::ZERO,
                    local_bank_charge: Decimal::ZERO,
                    received_jpy: Decimal::ZERO,
                    is_primary: false,
                });
                continue;
            }

            let alloc = round2(remaining.min(invoice.balance));
            remaining = round2(remaining - alloc);

            let is_primary = !primary_assigned && alloc > Decimal::ZERO;
            primary_assigned |= is_primary;

            // the foreign charge is taken at the point of receipt, so the
            // primary line converts its net amount only
            let net_for_jpy = if is_primary {
                round2(alloc - foreign_charge)
            } else {
                alloc
            };
            let received_jpy = jpy_floor(net_for_jpy * input.exchange_rate);

            lines.push(AllocationLine {
                invoice_id: invoice.id.clone(),
                allocated_amount: alloc,
                balance: invoice.balance,
                foreign_bank_charge: if is_primary {
                    foreign_charge
                } else {
                    Decimal::ZERO
                },
                local_bank_charge: if is_primary {
                    local_charge
                } else {
                    Decimal::ZERO
                },
                received_jpy,
                is_primary,
            });
        }

        // per-line flooring may lose whole yen against the authoritative
        // total; the primary line absorbs the difference
        let expected_jpy = Self::total_expected_jpy(input);
        let line_jpy: Decimal = lines.iter().map(|l| l.received_jpy).sum();
        let residual = expected_jpy - line_jpy;

        if !residual.is_zero() {
            if let Some(primary) = lines.iter_mut().find(|l| l.is_primary) {
                debug!(%residual, "absorbing yen rounding residual on primary line");
                primary.received_jpy += residual;
            }
        }

        lines
    }

    /// Authoritative yen equivalent of the whole payment:
    /// `floor((amount - foreign_charge) * rate) - local_charge`.
    ///
    /// Computed independently of the per-line conversions; the plan is
    /// reconciled against this value, never the other way around.
    pub fn total_expected_jpy(input: &AllocationInput) -> Decimal {
        jpy_floor((round2(input.amount) - round2(input.foreign_bank_charge)) * input.exchange_rate)
            - round2(input.local_bank_charge)
    }
}
