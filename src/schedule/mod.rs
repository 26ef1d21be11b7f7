pub mod counter;
pub mod generator;

use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};

use crate::calendar::step_date;
use crate::decimal::Money;
use crate::errors::{LedgerError, Result};
use crate::types::{Frequency, InstallmentStatus};

pub use counter::{calculate_installments, compute_end_date_from_installments};
pub use generator::{generate_schedule_with_installment_amount, generate_simple_interest_schedule};

/// tolerance under which a pending balance counts as settled
pub const SETTLEMENT_TOLERANCE: Money = Money::MILLI;

/// one scheduled repayment
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Installment {
    /// 1-based position within the schedule
    pub index: u32,
    pub amount_due: Money,
    pub amount_paid: Money,
    pub pending_amount: Money,
    pub status: InstallmentStatus,
    pub due_date: Option<NaiveDate>,
    pub paid_date: Option<DateTime<Utc>>,
    pub mode_of_payment: Option<String>,
}

impl Installment {
    /// fresh unpaid installment
    pub fn new(index: u32, amount_due: Money) -> Self {
        Self {
            index,
            amount_due,
            amount_paid: Money::ZERO,
            pending_amount: amount_due,
            status: InstallmentStatus::Due,
            due_date: None,
            paid_date: None,
            mode_of_payment: None,
        }
    }

    pub fn with_due_date(mut self, due_date: NaiveDate) -> Self {
        self.due_date = Some(due_date);
        self
    }

    pub fn is_paid(&self) -> bool {
        self.status == InstallmentStatus::Paid
    }

    /// open and due strictly before `as_of`
    pub fn is_overdue(&self, as_of: NaiveDate) -> bool {
        self.status.is_open() && self.due_date.is_some_and(|due| due < as_of)
    }

    /// check paid/pending conservation and status consistency
    pub fn check_invariants(&self, tolerance: Money) -> Result<()> {
        if !(self.amount_paid + self.pending_amount).approx_eq(self.amount_due, tolerance) {
            return Err(LedgerError::calculation(format!(
                "installment {}: paid {} + pending {} != due {}",
                self.index, self.amount_paid, self.pending_amount, self.amount_due
            )));
        }

        let expected = if self.amount_paid.is_zero() && !self.amount_due.is_positive() {
            // an equal split can leave a zero or negative final row; nothing is collected on it
            InstallmentStatus::Due
        } else if self.pending_amount <= tolerance {
            InstallmentStatus::Paid
        } else if self.amount_paid.is_zero() {
            InstallmentStatus::Due
        } else {
            InstallmentStatus::Pending
        };

        if self.status != expected {
            return Err(LedgerError::invalid_state(self.status, expected));
        }

        Ok(())
    }
}

/// ordered installments of one loan
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Schedule {
    installments: Vec<Installment>,
}

impl Schedule {
    /// build from rows, sorting by index and requiring contiguous indices from 1
    pub fn from_installments(mut installments: Vec<Installment>) -> Result<Self> {
        installments.sort_by_key(|i| i.index);

        for (position, installment) in installments.iter().enumerate() {
            let expected = position as u32 + 1;
            if installment.index != expected {
                return Err(LedgerError::calculation(format!(
                    "installment indices must be contiguous from 1: found {} at position {}",
                    installment.index, expected
                )));
            }
        }

        Ok(Self { installments })
    }

    pub(crate) fn from_vec_unchecked(installments: Vec<Installment>) -> Self {
        Self { installments }
    }

    pub fn installments(&self) -> &[Installment] {
        &self.installments
    }

    pub fn into_installments(self) -> Vec<Installment> {
        self.installments
    }

    pub fn iter(&self) -> std::slice::Iter<'_, Installment> {
        self.installments.iter()
    }

    pub fn len(&self) -> usize {
        self.installments.len()
    }

    pub fn is_empty(&self) -> bool {
        self.installments.is_empty()
    }

    /// get installment by its 1-based index
    pub fn get(&self, index: u32) -> Option<&Installment> {
        if index == 0 {
            return None;
        }
        self.installments.get((index - 1) as usize)
    }

    pub fn last(&self) -> Option<&Installment> {
        self.installments.last()
    }

    /// first installment still expecting money
    pub fn next_due(&self) -> Option<&Installment> {
        self.installments.iter().find(|i| i.status.is_open())
    }

    pub fn total_due(&self) -> Money {
        self.installments.iter().map(|i| i.amount_due).sum()
    }

    pub fn total_paid(&self) -> Money {
        self.installments.iter().map(|i| i.amount_paid).sum()
    }

    pub fn total_pending(&self) -> Money {
        self.installments.iter().map(|i| i.pending_amount).sum()
    }

    pub fn paid_count(&self) -> usize {
        self.installments.iter().filter(|i| i.is_paid()).count()
    }

    /// any money received on any row
    pub fn has_payments(&self) -> bool {
        self.installments.iter().any(|i| i.amount_paid.is_positive())
    }

    /// due date of the final row
    pub fn final_due_date(&self) -> Option<NaiveDate> {
        self.installments.last().and_then(|i| i.due_date)
    }

    /// assign due dates: row `i` falls `i - 1` steps after `first_date`
    pub fn with_due_dates(&self, first_date: NaiveDate, frequency: Frequency) -> Result<Self> {
        let installments = self
            .installments
            .iter()
            .enumerate()
            .map(|(offset, installment)| {
                let due = step_date(first_date, frequency, offset as u32)?;
                Ok(installment.clone().with_due_date(due))
            })
            .collect::<Result<Vec<_>>>()?;

        Ok(Self { installments })
    }

    /// new schedule with row `index` replaced
    pub(crate) fn replace(&self, updated: Installment) -> Result<Self> {
        let position = self.position(updated.index)?;
        let mut installments = self.installments.clone();
        installments[position] = updated;
        Ok(Self { installments })
    }

    /// new schedule with one more `Due` row at the next index
    pub(crate) fn append(&self, amount_due: Money, due_date: NaiveDate) -> Self {
        let mut installments = self.installments.clone();
        let index = installments.len() as u32 + 1;
        installments.push(Installment::new(index, amount_due).with_due_date(due_date));
        Self { installments }
    }

    pub(crate) fn position(&self, index: u32) -> Result<usize> {
        self.installments
            .iter()
            .position(|i| i.index == index)
            .ok_or(LedgerError::InstallmentNotFound { index })
    }

    /// validate every row plus ordering
    pub fn check_invariants(&self, tolerance: Money) -> Result<()> {
        for (position, installment) in self.installments.iter().enumerate() {
            if installment.index != position as u32 + 1 {
                return Err(LedgerError::calculation(format!(
                    "installment {} out of order at position {}",
                    installment.index,
                    position + 1
                )));
            }
            installment.check_invariants(tolerance)?;
        }
        Ok(())
    }
}

impl<'a> IntoIterator for &'a Schedule {
    type Item = &'a Installment;
    type IntoIter = std::slice::Iter<'a, Installment>;

    fn into_iter(self) -> Self::IntoIter {
        self.installments.iter()
    }
}
