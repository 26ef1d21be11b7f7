use chrono::{DateTime, Utc};
use tracing::debug;

use crate::decimal::Money;
use crate::errors::{LedgerError, Result};
use crate::schedule::Schedule;
use crate::types::InstallmentStatus;

use super::PaymentLedger;

impl PaymentLedger {
    /// add `amount` to installment `index` and re-derive its status
    ///
    /// The mode of payment falls back to the row's previous mode, then to the
    /// configured default. A payment larger than the pending balance (beyond the
    /// settlement tolerance) is rejected.
    pub fn record_payment(
        &self,
        schedule: &Schedule,
        index: u32,
        amount: Money,
        mode_of_payment: Option<&str>,
        paid_at: DateTime<Utc>,
    ) -> Result<Schedule> {
        if !amount.is_positive() {
            return Err(LedgerError::InvalidAmount { amount });
        }

        let position = schedule.position(index)?;
        let mut row = schedule.installments()[position].clone();

        if amount > row.pending_amount + self.settlement_tolerance {
            return Err(LedgerError::PaymentExceedsPending {
                index,
                amount,
                pending: row.pending_amount,
            });
        }

        row.amount_paid = (row.amount_paid + amount).max(Money::ZERO);
        row.pending_amount = row.amount_due.saturating_sub(row.amount_paid);
        row.paid_date = Some(paid_at);
        row.mode_of_payment = Some(
            mode_of_payment
                .map(str::to_string)
                .or(row.mode_of_payment.take())
                .unwrap_or_else(|| self.default_mode_of_payment.clone()),
        );

        if row.pending_amount <= self.settlement_tolerance {
            row.status = InstallmentStatus::Paid;
            row.pending_amount = Money::ZERO;
        } else if row.amount_paid.is_positive() {
            row.status = InstallmentStatus::Pending;
        } else {
            row.status = InstallmentStatus::Due;
            row.paid_date = None;
            row.mode_of_payment = None;
        }

        debug!(
            installment = index,
            amount = %amount,
            paid = %row.amount_paid,
            pending = %row.pending_amount,
            status = %row.status,
            "payment recorded"
        );

        schedule.replace(row)
    }

    /// revert a `Paid` installment to a fresh `Due` row
    pub fn undo_payment(&self, schedule: &Schedule, index: u32) -> Result<Schedule> {
        let position = schedule.position(index)?;
        let mut row = schedule.installments()[position].clone();

        if row.status != InstallmentStatus::Paid {
            return Err(LedgerError::invalid_state(row.status, InstallmentStatus::Paid));
        }

        let reversed = row.amount_paid;
        row.amount_paid = Money::ZERO;
        row.pending_amount = row.amount_due;
        row.status = InstallmentStatus::Due;
        row.paid_date = None;
        row.mode_of_payment = None;

        debug!(installment = index, reversed = %reversed, "payment undone");

        schedule.replace(row)
    }

    /// pay whatever is still pending on installment `index`
    pub fn pay_full(
        &self,
        schedule: &Schedule,
        index: u32,
        mode_of_payment: Option<&str>,
        paid_at: DateTime<Utc>,
    ) -> Result<Schedule> {
        let row = schedule
            .get(index)
            .ok_or(LedgerError::InstallmentNotFound { index })?;

        if row.is_paid() {
            return Err(LedgerError::invalid_state(row.status, "Due or Pending"));
        }

        self.record_payment(schedule, index, row.pending_amount, mode_of_payment, paid_at)
    }
}
