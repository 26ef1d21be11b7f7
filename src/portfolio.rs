use std::collections::BTreeMap;

use chrono::{Datelike, NaiveDate};
use serde::{Deserialize, Serialize};

use crate::decimal::Money;
use crate::loan::{interest_share, Loan};
use crate::types::LoanId;

/// book-wide totals
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct PortfolioStats {
    pub active_loans: usize,
    pub closed_loans: usize,
    pub total_principal: Money,
    pub total_interest: Money,
    /// owed on active loans only
    pub total_outstanding: Money,
}

pub fn portfolio_stats(loans: &[Loan]) -> PortfolioStats {
    loans.iter().fold(PortfolioStats::default(), |mut stats, loan| {
        stats.total_principal += loan.terms.principal;
        stats.total_interest += loan.total_interest();

        if loan.status.is_active() {
            stats.active_loans += 1;
            stats.total_outstanding += loan.outstanding();
        } else {
            stats.closed_loans += 1;
        }
        stats
    })
}

/// interest earned from one installment's collections
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ProfitEntry {
    pub loan_id: LoanId,
    pub installment: u32,
    pub date: NaiveDate,
    pub amount_paid: Money,
    pub profit: Money,
}

/// profit per collected installment due on or before `as_of`, oldest first
///
/// Each collection is split pro rata: `paid * total_interest / total_repayable`.
pub fn profit_series(loans: &[Loan], as_of: NaiveDate) -> Vec<ProfitEntry> {
    let mut entries: Vec<ProfitEntry> = loans
        .iter()
        .flat_map(|loan| {
            let total_interest = loan.total_interest();
            let total_repayable = loan.total_repayable();

            loan.schedule.iter().filter_map(move |row| {
                let date = row.due_date.filter(|due| *due <= as_of)?;
                if !row.amount_paid.is_positive() {
                    return None;
                }
                Some(ProfitEntry {
                    loan_id: loan.id,
                    installment: row.index,
                    date,
                    amount_paid: row.amount_paid,
                    profit: interest_share(row.amount_paid, total_interest, total_repayable),
                })
            })
        })
        .collect();

    entries.sort_by_key(|entry| entry.date);
    entries
}

/// bucket size for [`profit_by_period`]
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ProfitPeriod {
    Monthly,
    Yearly,
}

/// sum profit entries into `YYYY-MM` or `YYYY` buckets, in chronological order
pub fn profit_by_period(entries: &[ProfitEntry], period: ProfitPeriod) -> Vec<(String, Money)> {
    let mut buckets: BTreeMap<String, Money> = BTreeMap::new();

    for entry in entries {
        let key = match period {
            ProfitPeriod::Monthly => format!("{:04}-{:02}", entry.date.year(), entry.date.month()),
            ProfitPeriod::Yearly => format!("{:04}", entry.date.year()),
        };
        *buckets.entry(key).or_default() += entry.profit;
    }

    buckets
        .into_iter()
        .map(|(key, profit)| (key, profit.round_currency()))
        .collect()
}

/// one installment awaiting collection
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CollectionItem {
    pub loan_id: LoanId,
    pub customer: String,
    pub finance_number: u32,
    pub installment: u32,
    pub due_date: NaiveDate,
    pub pending_amount: Money,
}

#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct CollectionQueue {
    pub upcoming: Vec<CollectionItem>,
    pub overdue: Vec<CollectionItem>,
}

/// next open installment of every active loan, split at `as_of`
///
/// Rows due before `as_of` are overdue; both lists are sorted by due date.
pub fn collection_queue(loans: &[Loan], as_of: NaiveDate) -> CollectionQueue {
    let mut queue = CollectionQueue::default();

    for loan in loans.iter().filter(|loan| loan.status.is_active()) {
        let Some(row) = loan.next_due() else {
            continue;
        };
        let Some(due_date) = row.due_date else {
            continue;
        };

        let item = CollectionItem {
            loan_id: loan.id,
            customer: loan.customer.clone(),
            finance_number: loan.finance_number,
            installment: row.index,
            due_date,
            pending_amount: row.pending_amount,
        };

        if due_date < as_of {
            queue.overdue.push(item);
        } else {
            queue.upcoming.push(item);
        }
    }

    queue.upcoming.sort_by_key(|item| item.due_date);
    queue.overdue.sort_by_key(|item| item.due_date);
    queue
}

/// one customer's position across all of their finances
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct CustomerTotals {
    pub customer: String,
    pub finances: usize,
    pub active_finances: usize,
    pub total_principal: Money,
    pub total_repayable: Money,
    pub total_paid: Money,
    pub outstanding: Money,
}

pub fn customer_totals(loans: &[Loan], customer: &str) -> CustomerTotals {
    loans
        .iter()
        .filter(|loan| loan.customer == customer)
        .fold(
            CustomerTotals {
                customer: customer.to_string(),
                ..CustomerTotals::default()
            },
            |mut totals, loan| {
                totals.finances += 1;
                totals.total_principal += loan.terms.principal;
                totals.total_repayable += loan.total_repayable();
                totals.total_paid += loan.schedule.total_paid();
                if loan.status.is_active() {
                    totals.active_finances += 1;
                    totals.outstanding += loan.outstanding();
                }
                totals
            },
        )
}
