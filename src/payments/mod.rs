//! Installment state machine.
//!
//! `Due -> Pending -> Paid`, and `Paid -> Due` through an undo. Every operation
//! reads a [`Schedule`] and returns a new one; callers persist the result and
//! re-read the authoritative schedule before the next mutation.

pub mod ledger;
pub mod revolving;

use chrono::{DateTime, Utc};

use crate::config::{LedgerConfig, DEFAULT_MODE_OF_PAYMENT};
use crate::decimal::Money;
use crate::errors::Result;
use crate::interest::MonthCountConvention;
use crate::loan::LoanTerms;
use crate::schedule::{Schedule, SETTLEMENT_TOLERANCE};

pub use revolving::{ExtensionOutcome, InterestOnlyOutcome};

/// payment mutator configured with the fallback mode of payment and settlement tolerance
#[derive(Debug, Clone, PartialEq)]
pub struct PaymentLedger {
    pub default_mode_of_payment: String,
    pub settlement_tolerance: Money,
    pub month_count_convention: MonthCountConvention,
}

impl Default for PaymentLedger {
    fn default() -> Self {
        Self {
            default_mode_of_payment: DEFAULT_MODE_OF_PAYMENT.to_string(),
            settlement_tolerance: SETTLEMENT_TOLERANCE,
            month_count_convention: MonthCountConvention::default(),
        }
    }
}

impl PaymentLedger {
    pub fn from_config(config: &LedgerConfig) -> Self {
        Self {
            default_mode_of_payment: config.default_mode_of_payment.clone(),
            settlement_tolerance: config.settlement_tolerance,
            month_count_convention: config.month_count_convention,
        }
    }
}

/// record `amount` against installment `index` with the default ledger
pub fn record_payment(
    schedule: &Schedule,
    index: u32,
    amount: Money,
    mode_of_payment: Option<&str>,
    paid_at: DateTime<Utc>,
) -> Result<Schedule> {
    PaymentLedger::default().record_payment(schedule, index, amount, mode_of_payment, paid_at)
}

/// revert a fully paid installment to `Due`
pub fn undo_payment(schedule: &Schedule, index: u32) -> Result<Schedule> {
    PaymentLedger::default().undo_payment(schedule, index)
}

/// pay the whole pending amount of installment `index`
pub fn pay_full(
    schedule: &Schedule,
    index: u32,
    mode_of_payment: Option<&str>,
    paid_at: DateTime<Utc>,
) -> Result<Schedule> {
    PaymentLedger::default().pay_full(schedule, index, mode_of_payment, paid_at)
}

/// interest-only payment on a revolving loan, extending it by one month
pub fn pay_interest_only(
    schedule: &Schedule,
    index: u32,
    terms: &LoanTerms,
    mode_of_payment: Option<&str>,
    paid_at: DateTime<Utc>,
) -> Result<InterestOnlyOutcome> {
    PaymentLedger::default().pay_interest_only(schedule, index, terms, mode_of_payment, paid_at)
}
