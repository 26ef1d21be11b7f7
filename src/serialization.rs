//! Plain-data records exchanged with the persistence layer.
//!
//! Amounts are read from JSON numbers or strings; dates arrive in whatever shape
//! the form or the store produced and are normalised by [`parse_date_flexible`].

use chrono::{DateTime, NaiveDate, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::config::LedgerConfig;
use crate::decimal::{Money, Rate};
use crate::errors::{LedgerError, Result};
use crate::loan::{generate_loan_schedule, Loan, LoanTerms};
use crate::schedule::{Installment, Schedule};
use crate::types::{InstallmentStatus, LoanId, LoanStatus};

const RECORD_DATE_FORMAT: &str = "%d-%m-%Y";
const DUE_DATE_FORMAT: &str = "%Y-%m-%d";

/// parse `DD-MM-YYYY`, `YYYY-MM-DD` or the date part of an RFC 3339 timestamp
pub fn parse_date_flexible(input: &str) -> Result<NaiveDate> {
    let trimmed = input.trim();
    let date_part = trimmed
        .split_once('T')
        .map(|(date, _)| date)
        .unwrap_or(trimmed);

    NaiveDate::parse_from_str(date_part, DUE_DATE_FORMAT)
        .or_else(|_| NaiveDate::parse_from_str(date_part, RECORD_DATE_FORMAT))
        .map_err(|_| LedgerError::InvalidDate {
            message: format!("unrecognised date {input:?} (expected DD-MM-YYYY or YYYY-MM-DD)"),
        })
}

/// loan-level date as stored on records
pub fn format_record_date(date: NaiveDate) -> String {
    date.format(RECORD_DATE_FORMAT).to_string()
}

/// stored form of one installment
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct InstallmentRecord {
    pub installment: u32,
    pub amount_due: Decimal,
    #[serde(default)]
    pub amount_paid: Decimal,
    #[serde(default)]
    pub pending_amount: Option<Decimal>,
    pub status: InstallmentStatus,
    /// `YYYY-MM-DD`
    #[serde(default)]
    pub due_date: Option<String>,
    /// RFC 3339
    #[serde(default)]
    pub paid_date: Option<DateTime<Utc>>,
    #[serde(default)]
    pub mode_of_payment: Option<String>,
}

impl InstallmentRecord {
    pub fn to_installment(&self) -> Result<Installment> {
        let amount_due = Money::from_decimal(self.amount_due);
        let amount_paid = Money::from_decimal(self.amount_paid);
        let pending_amount = self
            .pending_amount
            .map(Money::from_decimal)
            .unwrap_or_else(|| amount_due.saturating_sub(amount_paid));

        let due_date = self
            .due_date
            .as_deref()
            .filter(|raw| !raw.trim().is_empty())
            .map(parse_date_flexible)
            .transpose()?;

        Ok(Installment {
            index: self.installment,
            amount_due,
            amount_paid,
            pending_amount,
            status: self.status,
            due_date,
            paid_date: self.paid_date,
            mode_of_payment: self.mode_of_payment.clone(),
        })
    }

    pub fn from_installment(installment: &Installment) -> Self {
        Self {
            installment: installment.index,
            amount_due: installment.amount_due.as_decimal(),
            amount_paid: installment.amount_paid.as_decimal(),
            pending_amount: Some(installment.pending_amount.as_decimal()),
            status: installment.status,
            due_date: installment
                .due_date
                .map(|date| date.format(DUE_DATE_FORMAT).to_string()),
            paid_date: installment.paid_date,
            mode_of_payment: installment.mode_of_payment.clone(),
        }
    }
}

/// stored form of a loan
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LoanRecord {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub id: Option<LoanId>,
    pub customer: String,
    #[serde(default = "first_finance")]
    pub finance_number: u32,
    pub principal: Decimal,
    /// percent per month
    pub interest_rate: Decimal,
    pub loan_given_date: String,
    pub first_collection_date: String,
    pub loan_end_date: String,
    pub frequency: String,
    #[serde(default = "normal_term_type")]
    pub loan_term_type: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub installment_amount: Option<Decimal>,
    #[serde(default)]
    pub status: LoanStatus,
    #[serde(default)]
    pub payment_schedule: Vec<InstallmentRecord>,
}

fn first_finance() -> u32 {
    1
}

fn normal_term_type() -> String {
    "normal".to_string()
}

impl LoanRecord {
    pub fn from_json(json: &str) -> Result<Self> {
        Ok(serde_json::from_str(json)?)
    }

    pub fn to_json_pretty(&self) -> Result<String> {
        Ok(serde_json::to_string_pretty(self)?)
    }

    /// typed terms, validated
    pub fn to_terms(&self) -> Result<LoanTerms> {
        let terms = LoanTerms {
            principal: Money::from_decimal(self.principal),
            monthly_rate: Rate::from_percent(self.interest_rate),
            loan_given_date: parse_date_flexible(&self.loan_given_date)?,
            frequency: self.frequency.parse()?,
            first_collection_date: parse_date_flexible(&self.first_collection_date)?,
            loan_end_date: parse_date_flexible(&self.loan_end_date)?,
            term_type: self.loan_term_type.parse()?,
            installment_amount: self.installment_amount.map(Money::from_decimal),
        };
        terms.validate()?;
        Ok(terms)
    }

    /// stored installments as a schedule, indices checked for contiguity
    pub fn to_schedule(&self) -> Result<Schedule> {
        let rows = self
            .payment_schedule
            .iter()
            .map(InstallmentRecord::to_installment)
            .collect::<Result<Vec<_>>>()?;
        Schedule::from_installments(rows)
    }

    /// typed loan; a record without installments gets a freshly generated schedule
    pub fn to_loan(&self, config: LedgerConfig) -> Result<Loan> {
        let terms = self.to_terms()?;
        let schedule = if self.payment_schedule.is_empty() {
            generate_loan_schedule(&terms, &config.interest_engine())?
        } else {
            self.to_schedule()?
        };

        Loan::from_parts(
            self.id.unwrap_or_else(Uuid::new_v4),
            self.customer.clone(),
            self.finance_number,
            terms,
            schedule,
            self.status,
            config,
        )
    }

    pub fn from_loan(loan: &Loan) -> Self {
        Self {
            id: Some(loan.id),
            customer: loan.customer.clone(),
            finance_number: loan.finance_number,
            principal: loan.terms.principal.as_decimal(),
            interest_rate: loan.terms.monthly_rate.as_percentage(),
            loan_given_date: format_record_date(loan.terms.loan_given_date),
            first_collection_date: format_record_date(loan.terms.first_collection_date),
            loan_end_date: format_record_date(loan.terms.loan_end_date),
            frequency: loan.terms.frequency.to_string(),
            loan_term_type: loan.terms.term_type.to_string(),
            installment_amount: loan.terms.installment_amount.map(|amount| amount.as_decimal()),
            status: loan.status,
            payment_schedule: loan
                .schedule
                .iter()
                .map(InstallmentRecord::from_installment)
                .collect(),
        }
    }
}

/// derived totals handed back to the persistence layer
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ScheduleTotals {
    pub total_interest: Money,
    pub total_repayable: Money,
    pub outstanding: Money,
}

impl ScheduleTotals {
    pub fn for_loan(loan: &Loan) -> Self {
        Self {
            total_interest: loan.total_interest().round_currency(),
            total_repayable: loan.total_repayable(),
            outstanding: loan.outstanding().round_currency(),
        }
    }
}
