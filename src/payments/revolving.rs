use chrono::{DateTime, NaiveDate, Utc};
use tracing::{debug, warn};

use crate::calendar::{add_months_preserve_anchor, sub_months_preserve_anchor};
use crate::decimal::Money;
use crate::errors::{LedgerError, Result};
use crate::interest::SimpleInterestEngine;
use crate::loan::LoanTerms;
use crate::schedule::{Installment, Schedule};
use crate::types::{InstallmentStatus, LoanTermType};

use super::PaymentLedger;

/// what happened when rolling the remaining principal into next month
#[derive(Debug)]
pub enum ExtensionOutcome {
    /// a new installment was appended and the loan now ends on its due date
    Appended {
        index: u32,
        due_date: NaiveDate,
        amount_due: Money,
        new_loan_end_date: NaiveDate,
    },
    /// nothing left to roll over, or the next month already exists
    NotRequired,
    /// the interest was recorded but the next installment could not be built
    Failed(LedgerError),
}

impl ExtensionOutcome {
    pub fn is_failed(&self) -> bool {
        matches!(self, ExtensionOutcome::Failed(_))
    }
}

/// result of an interest-only payment
///
/// `schedule` always carries the recorded interest, even when the extension failed.
#[derive(Debug)]
pub struct InterestOnlyOutcome {
    pub schedule: Schedule,
    pub interest_paid: Money,
    pub extension: ExtensionOutcome,
}

impl PaymentLedger {
    fn interest_engine(&self) -> SimpleInterestEngine {
        SimpleInterestEngine::new(self.month_count_convention)
    }

    /// pay one month's interest on the latest installment of a revolving loan
    ///
    /// Runs in two steps. The interest is recorded first; the remaining principal
    /// is then rolled into a new installment due one month later. A failure in the
    /// second step is reported through [`ExtensionOutcome::Failed`] so the recorded
    /// interest is not lost.
    pub fn pay_interest_only(
        &self,
        schedule: &Schedule,
        index: u32,
        terms: &LoanTerms,
        mode_of_payment: Option<&str>,
        paid_at: DateTime<Utc>,
    ) -> Result<InterestOnlyOutcome> {
        if terms.term_type != LoanTermType::Monthly {
            return Err(LedgerError::invalid_state(terms.term_type, LoanTermType::Monthly));
        }

        let row = schedule
            .get(index)
            .ok_or(LedgerError::InstallmentNotFound { index })?;

        if index as usize != schedule.len() {
            return Err(LedgerError::invalid_state(
                format!("installment {index} of {}", schedule.len()),
                "latest installment",
            ));
        }

        if row.status != InstallmentStatus::Due {
            return Err(LedgerError::invalid_state(row.status, InstallmentStatus::Due));
        }

        let due_date = due_date_of(row)?;
        let period_start = sub_months_preserve_anchor(due_date, 1)?;
        let interest = self
            .interest_engine()
            .total_interest(terms.principal, terms.monthly_rate, period_start, due_date)
            .round_currency();

        if !interest.is_positive() {
            return Err(LedgerError::invalid_state("no interest to pay", "interest-bearing loan"));
        }

        let schedule = self.record_payment(schedule, index, interest, mode_of_payment, paid_at)?;

        debug!(installment = index, interest = %interest, "interest-only payment recorded");

        let (schedule, extension) = match self.extend_revolving(&schedule, index, terms) {
            Ok(extended) => extended,
            Err(err) => {
                warn!(installment = index, error = %err, "interest recorded but next installment was not created");
                (schedule, ExtensionOutcome::Failed(err))
            }
        };

        Ok(InterestOnlyOutcome {
            schedule,
            interest_paid: interest,
            extension,
        })
    }

    /// roll the pending principal of installment `index` into a new next-month installment
    ///
    /// Only acts when the row is `Pending` with money outstanding and is still the
    /// latest row, so re-running it on an already extended schedule appends nothing.
    pub fn extend_revolving(
        &self,
        schedule: &Schedule,
        index: u32,
        terms: &LoanTerms,
    ) -> Result<(Schedule, ExtensionOutcome)> {
        let row = schedule
            .get(index)
            .ok_or(LedgerError::InstallmentNotFound { index })?;

        let needs_extension = row.status == InstallmentStatus::Pending
            && row.pending_amount.is_positive()
            && index as usize == schedule.len();

        if !needs_extension {
            return Ok((schedule.clone(), ExtensionOutcome::NotRequired));
        }

        let due_date = due_date_of(row)?;
        let next_due = add_months_preserve_anchor(due_date, 1)?;
        let next_interest = self.interest_engine().total_interest(
            row.pending_amount,
            terms.monthly_rate,
            due_date,
            next_due,
        );
        let amount_due = (row.pending_amount + next_interest).round_currency();

        let extended = schedule.append(amount_due, next_due);
        let new_index = extended.len() as u32;

        debug!(
            installment = new_index,
            amount_due = %amount_due,
            due_date = %next_due,
            "revolving loan extended by one month"
        );

        Ok((
            extended,
            ExtensionOutcome::Appended {
                index: new_index,
                due_date: next_due,
                amount_due,
                new_loan_end_date: next_due,
            },
        ))
    }
}

fn due_date_of(row: &Installment) -> Result<NaiveDate> {
    row.due_date.ok_or_else(|| LedgerError::InvalidDate {
        message: format!("installment {} has no due date", row.index),
    })
}
