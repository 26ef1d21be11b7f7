use chrono::NaiveDate;
use hourglass_rs::{SafeTimeProvider, TimeSource};
use serde::{Deserialize, Serialize};
use tracing::debug;
use uuid::Uuid;

use crate::calendar::add_months_preserve_anchor;
use crate::config::LedgerConfig;
use crate::decimal::{Money, Rate};
use crate::errors::{LedgerError, Result};
use crate::events::{Event, EventStore};
use crate::interest::{InterestCalculator, SimpleInterestEngine};
use crate::payments::{ExtensionOutcome, PaymentLedger};
use crate::schedule::{
    calculate_installments, compute_end_date_from_installments,
    generate_schedule_with_installment_amount, generate_simple_interest_schedule, Installment,
    Schedule,
};
use crate::types::{Frequency, LoanId, LoanStatus, LoanTermType};

/// pricing and collection terms of one loan
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LoanTerms {
    pub principal: Money,
    /// percent charged per elapsed month
    pub monthly_rate: Rate,
    /// anchor for month counting
    pub loan_given_date: NaiveDate,
    pub frequency: Frequency,
    pub first_collection_date: NaiveDate,
    pub loan_end_date: NaiveDate,
    pub term_type: LoanTermType,
    /// custom per-installment amount chosen at issuance
    pub installment_amount: Option<Money>,
}

impl LoanTerms {
    pub fn validate(&self) -> Result<()> {
        if !self.principal.is_positive() {
            return Err(LedgerError::InvalidAmount {
                amount: self.principal,
            });
        }

        if self.monthly_rate.is_negative() {
            return Err(LedgerError::InvalidConfiguration {
                message: format!("monthly rate {} must not be negative", self.monthly_rate),
            });
        }

        if let Some(amount) = self.installment_amount {
            if !amount.is_positive() {
                return Err(LedgerError::InvalidAmount { amount });
            }
        }

        if self.loan_end_date < self.first_collection_date {
            return Err(LedgerError::InvalidRange {
                start: self.first_collection_date,
                end: self.loan_end_date,
            });
        }

        if self.is_revolving() && self.frequency != Frequency::Monthly {
            return Err(LedgerError::InvalidConfiguration {
                message: format!("revolving loans collect monthly, not {}", self.frequency),
            });
        }

        Ok(())
    }

    pub fn is_revolving(&self) -> bool {
        self.term_type == LoanTermType::Monthly
    }

    /// interest between the loan-given date and the loan end date
    pub fn total_interest(&self, engine: &SimpleInterestEngine) -> Money {
        engine.total_interest(
            self.principal,
            self.monthly_rate,
            self.loan_given_date,
            self.loan_end_date,
        )
    }

    /// principal plus interest, rounded to cents
    pub fn total_repayable(&self, engine: &SimpleInterestEngine) -> Money {
        (self.principal + self.total_interest(engine)).round_currency()
    }

    /// number of collections implied by the first collection and end dates
    pub fn installment_count(&self) -> Result<u32> {
        calculate_installments(self.first_collection_date, self.loan_end_date, self.frequency)
    }
}

/// build the initial schedule for `terms`, due dates included
///
/// Normal loans split the total repayable across the collection dates, or into
/// rows of the custom installment amount (never below the equal share). Revolving
/// loans start with a single row due on the end date.
pub fn generate_loan_schedule(terms: &LoanTerms, engine: &SimpleInterestEngine) -> Result<Schedule> {
    terms.validate()?;
    let total = terms.total_repayable(engine);

    if terms.is_revolving() {
        return Schedule::from_installments(vec![
            Installment::new(1, total).with_due_date(terms.loan_end_date),
        ]);
    }

    let count = terms.installment_count()?;
    let schedule = match terms.installment_amount {
        Some(custom) => {
            let minimum = (total / rust_decimal::Decimal::from(count)).round_currency();
            generate_schedule_with_installment_amount(total, custom.max(minimum))?
        }
        None => generate_simple_interest_schedule(total, count)?,
    };

    schedule.with_due_dates(terms.first_collection_date, terms.frequency)
}

/// headline figures for one loan
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LoanSummary {
    pub total_interest: Money,
    pub total_repayable: Money,
    pub total_paid: Money,
    pub outstanding: Money,
    /// interest share of everything collected so far
    pub interest_collected: Money,
    pub paid_installments: usize,
    pub installment_count: usize,
    pub next_due: Option<Installment>,
}

/// a customer's loan with its schedule and lifecycle
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Loan {
    pub id: LoanId,
    pub customer: String,
    /// 1 for the first loan, incremented by each new finance
    pub finance_number: u32,
    pub terms: LoanTerms,
    pub schedule: Schedule,
    pub status: LoanStatus,
    pub config: LedgerConfig,
    #[serde(skip)]
    pub events: EventStore,
}

impl Loan {
    pub fn builder() -> LoanBuilder {
        LoanBuilder::new()
    }

    /// rebuild a loan from stored parts without regenerating its schedule
    pub fn from_parts(
        id: LoanId,
        customer: impl Into<String>,
        finance_number: u32,
        terms: LoanTerms,
        schedule: Schedule,
        status: LoanStatus,
        config: LedgerConfig,
    ) -> Result<Self> {
        terms.validate()?;
        schedule.check_invariants(config.settlement_tolerance)?;

        Ok(Self {
            id,
            customer: customer.into(),
            finance_number,
            terms,
            schedule,
            status,
            config,
            events: EventStore::new(),
        })
    }

    fn ledger(&self) -> PaymentLedger {
        PaymentLedger::from_config(&self.config)
    }

    fn engine(&self) -> SimpleInterestEngine {
        self.config.interest_engine()
    }

    fn ensure_active(&self) -> Result<()> {
        if !self.status.is_active() {
            return Err(LedgerError::invalid_state(self.status, LoanStatus::Active));
        }
        Ok(())
    }

    /// a revolving loan collects only on its latest row; earlier rows were rolled into it
    fn ensure_collectable(&self, index: u32) -> Result<()> {
        let latest = self.schedule.len();
        if self.is_revolving() && index as usize != latest && self.schedule.get(index).is_some() {
            return Err(LedgerError::invalid_state(
                format!("rolled-over installment {index} of {latest}"),
                "latest installment",
            ));
        }
        Ok(())
    }

    pub fn is_revolving(&self) -> bool {
        self.terms.is_revolving()
    }

    pub fn total_interest(&self) -> Money {
        self.terms.total_interest(&self.engine())
    }

    pub fn total_repayable(&self) -> Money {
        self.terms.total_repayable(&self.engine())
    }

    /// balance still owed
    ///
    /// A revolving loan owes only its latest row; earlier rows were rolled into it.
    pub fn outstanding(&self) -> Money {
        if self.is_revolving() {
            self.schedule
                .last()
                .map(|row| row.pending_amount)
                .unwrap_or(Money::ZERO)
        } else {
            self.schedule.total_pending()
        }
    }

    /// installment the customer should pay next
    pub fn next_due(&self) -> Option<&Installment> {
        if self.is_revolving() {
            self.schedule.last().filter(|row| row.status.is_open())
        } else {
            self.schedule.next_due()
        }
    }

    /// interest share of everything collected so far
    pub fn interest_collected(&self) -> Money {
        interest_share(self.schedule.total_paid(), self.total_interest(), self.total_repayable())
    }

    pub fn summary(&self) -> LoanSummary {
        LoanSummary {
            total_interest: self.total_interest(),
            total_repayable: self.total_repayable(),
            total_paid: self.schedule.total_paid(),
            outstanding: self.outstanding(),
            interest_collected: self.interest_collected(),
            paid_installments: self.schedule.paid_count(),
            installment_count: self.schedule.len(),
            next_due: self.next_due().cloned(),
        }
    }

    #[tracing::instrument(skip_all, fields(loan_id = %self.id, installment = index))]
    pub fn record_payment(
        &self,
        index: u32,
        amount: Money,
        mode_of_payment: Option<&str>,
        time_provider: &SafeTimeProvider,
    ) -> Result<Loan> {
        self.ensure_active()?;
        self.ensure_collectable(index)?;
        let now = time_provider.now();
        let schedule = self
            .ledger()
            .record_payment(&self.schedule, index, amount, mode_of_payment, now)?;

        Ok(self.with_payment(schedule, index, amount, now))
    }

    #[tracing::instrument(skip_all, fields(loan_id = %self.id, installment = index))]
    pub fn pay_full(
        &self,
        index: u32,
        mode_of_payment: Option<&str>,
        time_provider: &SafeTimeProvider,
    ) -> Result<Loan> {
        self.ensure_active()?;
        self.ensure_collectable(index)?;
        let amount = self
            .schedule
            .get(index)
            .map(|row| row.pending_amount)
            .ok_or(LedgerError::InstallmentNotFound { index })?;
        let now = time_provider.now();
        let schedule = self
            .ledger()
            .pay_full(&self.schedule, index, mode_of_payment, now)?;

        Ok(self.with_payment(schedule, index, amount, now))
    }

    fn with_payment(
        &self,
        schedule: Schedule,
        index: u32,
        amount: Money,
        now: chrono::DateTime<chrono::Utc>,
    ) -> Loan {
        let mut loan = self.clone();
        loan.schedule = schedule;

        if let Some(row) = loan.schedule.get(index).cloned() {
            loan.events.emit(Event::PaymentRecorded {
                loan_id: loan.id,
                installment: index,
                amount,
                pending_amount: row.pending_amount,
                mode_of_payment: row.mode_of_payment.clone().unwrap_or_default(),
                timestamp: now,
            });

            if row.is_paid() {
                loan.events.emit(Event::InstallmentPaid {
                    loan_id: loan.id,
                    installment: index,
                    amount_due: row.amount_due,
                    timestamp: now,
                });
            }
        }

        loan
    }

    #[tracing::instrument(skip_all, fields(loan_id = %self.id, installment = index))]
    pub fn undo_payment(&self, index: u32, time_provider: &SafeTimeProvider) -> Result<Loan> {
        self.ensure_active()?;
        let reversed = self
            .schedule
            .get(index)
            .map(|row| row.amount_paid)
            .ok_or(LedgerError::InstallmentNotFound { index })?;
        let schedule = self.ledger().undo_payment(&self.schedule, index)?;

        let mut loan = self.clone();
        loan.schedule = schedule;
        loan.events.emit(Event::PaymentUndone {
            loan_id: loan.id,
            installment: index,
            reversed_amount: reversed,
            timestamp: time_provider.now(),
        });

        Ok(loan)
    }

    /// pay one month's interest and roll the principal into next month
    ///
    /// The returned loan always carries the recorded interest. When the new
    /// installment was appended the loan end date moves to its due date; a failed
    /// extension is returned alongside so the caller can retry it.
    #[tracing::instrument(skip_all, fields(loan_id = %self.id, installment = index))]
    pub fn pay_interest_only(
        &self,
        index: u32,
        mode_of_payment: Option<&str>,
        time_provider: &SafeTimeProvider,
    ) -> Result<(Loan, ExtensionOutcome)> {
        self.ensure_active()?;
        let now = time_provider.now();
        let outcome = self.ledger().pay_interest_only(
            &self.schedule,
            index,
            &self.terms,
            mode_of_payment,
            now,
        )?;

        let mut loan = self.clone();
        loan.schedule = outcome.schedule;
        loan.events.emit(Event::InterestOnlyPaid {
            loan_id: loan.id,
            installment: index,
            interest: outcome.interest_paid,
            timestamp: now,
        });

        match &outcome.extension {
            ExtensionOutcome::Appended {
                index: appended,
                due_date,
                amount_due,
                new_loan_end_date,
            } => {
                let old_end_date = loan.terms.loan_end_date;
                loan.terms.loan_end_date = *new_loan_end_date;
                loan.events.emit(Event::InstallmentAppended {
                    loan_id: loan.id,
                    installment: *appended,
                    amount_due: *amount_due,
                    due_date: *due_date,
                    timestamp: now,
                });
                loan.events.emit(Event::LoanEndDateExtended {
                    loan_id: loan.id,
                    old_end_date,
                    new_end_date: *new_loan_end_date,
                    timestamp: now,
                });
            }
            ExtensionOutcome::Failed(err) => {
                loan.events.emit(Event::ExtensionFailed {
                    loan_id: loan.id,
                    installment: index,
                    reason: err.to_string(),
                    timestamp: now,
                });
            }
            ExtensionOutcome::NotRequired => {}
        }

        Ok((loan, outcome.extension))
    }

    /// terms may change only before any money is received, and never on revolving loans
    pub fn can_edit_terms(&self) -> bool {
        self.status.is_active() && !self.is_revolving() && !self.schedule.has_payments()
    }

    /// replace the terms and regenerate the schedule from scratch
    #[tracing::instrument(skip_all, fields(loan_id = %self.id))]
    pub fn reschedule(&self, new_terms: LoanTerms, time_provider: &SafeTimeProvider) -> Result<Loan> {
        self.ensure_active()?;
        if self.is_revolving() || new_terms.is_revolving() {
            return Err(LedgerError::invalid_state(LoanTermType::Monthly, LoanTermType::Normal));
        }
        if self.schedule.has_payments() {
            return Err(LedgerError::invalid_state("payments recorded", "no payments"));
        }

        let schedule = generate_loan_schedule(&new_terms, &self.engine())?;

        let mut loan = self.clone();
        loan.events.emit(Event::LoanRescheduled {
            loan_id: loan.id,
            old_installments: loan.schedule.len() as u32,
            new_installments: schedule.len() as u32,
            timestamp: time_provider.now(),
        });
        loan.terms = new_terms;
        loan.schedule = schedule;

        debug!(installments = loan.schedule.len(), "loan rescheduled");
        Ok(loan)
    }

    /// close the loan
    pub fn settle(&self, time_provider: &SafeTimeProvider) -> Result<Loan> {
        self.ensure_active()?;
        Ok(self.with_status(LoanStatus::Settled, "settled by lender", time_provider))
    }

    /// return a settled loan to active collection
    pub fn reopen(&self, time_provider: &SafeTimeProvider) -> Result<Loan> {
        if self.status != LoanStatus::Settled {
            return Err(LedgerError::invalid_state(self.status, LoanStatus::Settled));
        }
        Ok(self.with_status(LoanStatus::Active, "reopened", time_provider))
    }

    /// close this loan and originate the customer's next finance
    ///
    /// Customer, finance number and configuration of the new loan are taken
    /// from this one; everything else comes from `next`. The new finance is
    /// always a normal installment loan.
    #[tracing::instrument(skip_all, fields(loan_id = %self.id))]
    pub fn refinance(&self, next: LoanBuilder, time_provider: &SafeTimeProvider) -> Result<(Loan, Loan)> {
        self.ensure_active()?;

        let new_loan = next
            .term_type(LoanTermType::Normal)
            .customer(self.customer.clone())
            .finance_number(self.finance_number + 1)
            .config(self.config.clone())
            .build(time_provider)?;

        let mut old_loan = self.with_status(LoanStatus::Refinanced, "new finance issued", time_provider);
        old_loan.events.emit(Event::LoanRefinanced {
            loan_id: old_loan.id,
            new_loan_id: new_loan.id,
            new_finance_number: new_loan.finance_number,
            timestamp: time_provider.now(),
        });

        Ok((old_loan, new_loan))
    }

    fn with_status(&self, status: LoanStatus, reason: &str, time_provider: &SafeTimeProvider) -> Loan {
        let mut loan = self.clone();
        loan.status = status;
        loan.events.emit(Event::StatusChanged {
            loan_id: loan.id,
            old_status: self.status,
            new_status: status,
            reason: reason.to_string(),
            timestamp: time_provider.now(),
        });
        debug!(loan_id = %loan.id, old = %self.status, new = %status, "loan status changed");
        loan
    }

    pub fn take_events(&mut self) -> Vec<Event> {
        self.events.take_events()
    }
}

/// portion of `paid` that is interest, pro rata to the loan's interest share
pub(crate) fn interest_share(paid: Money, total_interest: Money, total_repayable: Money) -> Money {
    if !total_repayable.is_positive() {
        return Money::ZERO;
    }
    paid * (total_interest.as_decimal() / total_repayable.as_decimal())
}

/// builder for loans
#[derive(Debug, Clone, Default)]
pub struct LoanBuilder {
    customer: Option<String>,
    finance_number: Option<u32>,
    principal: Option<Money>,
    monthly_rate: Option<Rate>,
    loan_given_date: Option<NaiveDate>,
    frequency: Option<Frequency>,
    first_collection_date: Option<NaiveDate>,
    loan_end_date: Option<NaiveDate>,
    installment_count: Option<u32>,
    installment_amount: Option<Money>,
    term_type: LoanTermType,
    config: Option<LedgerConfig>,
}

impl LoanBuilder {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn customer(mut self, customer: impl Into<String>) -> Self {
        self.customer = Some(customer.into());
        self
    }

    pub fn finance_number(mut self, finance_number: u32) -> Self {
        self.finance_number = Some(finance_number);
        self
    }

    pub fn principal(mut self, principal: Money) -> Self {
        self.principal = Some(principal);
        self
    }

    pub fn monthly_rate(mut self, rate: Rate) -> Self {
        self.monthly_rate = Some(rate);
        self
    }

    pub fn loan_given_date(mut self, date: NaiveDate) -> Self {
        self.loan_given_date = Some(date);
        self
    }

    pub fn frequency(mut self, frequency: Frequency) -> Self {
        self.frequency = Some(frequency);
        self
    }

    pub fn first_collection_date(mut self, date: NaiveDate) -> Self {
        self.first_collection_date = Some(date);
        self
    }

    pub fn loan_end_date(mut self, date: NaiveDate) -> Self {
        self.loan_end_date = Some(date);
        self
    }

    /// derive the end date from a number of collections instead of supplying it
    pub fn installment_count(mut self, count: u32) -> Self {
        self.installment_count = Some(count);
        self
    }

    pub fn installment_amount(mut self, amount: Money) -> Self {
        self.installment_amount = Some(amount);
        self
    }

    pub fn term_type(mut self, term_type: LoanTermType) -> Self {
        self.term_type = term_type;
        self
    }

    pub fn config(mut self, config: LedgerConfig) -> Self {
        self.config = Some(config);
        self
    }

    /// resolve the terms without originating a loan
    ///
    /// An explicit end date wins over an installment count. The loan-given date
    /// defaults to today according to `time_provider`.
    pub fn terms(&self, time_provider: &SafeTimeProvider) -> Result<LoanTerms> {
        let principal = self.principal.ok_or(LedgerError::InvalidConfiguration {
            message: "Principal required".to_string(),
        })?;

        let monthly_rate = self.monthly_rate.ok_or(LedgerError::InvalidConfiguration {
            message: "Monthly rate required".to_string(),
        })?;

        let loan_given_date = self
            .loan_given_date
            .unwrap_or_else(|| time_provider.now().date_naive());

        let terms = match self.term_type {
            LoanTermType::Monthly => {
                let end = add_months_preserve_anchor(loan_given_date, 1)?;
                LoanTerms {
                    principal,
                    monthly_rate,
                    loan_given_date,
                    frequency: Frequency::Monthly,
                    first_collection_date: end,
                    loan_end_date: end,
                    term_type: LoanTermType::Monthly,
                    installment_amount: None,
                }
            }
            LoanTermType::Normal => {
                let frequency = self.frequency.ok_or(LedgerError::InvalidConfiguration {
                    message: "Collection frequency required".to_string(),
                })?;

                let first_collection_date =
                    self.first_collection_date
                        .ok_or(LedgerError::InvalidConfiguration {
                            message: "First collection date required".to_string(),
                        })?;

                let loan_end_date = match (self.loan_end_date, self.installment_count) {
                    (Some(end), _) => end,
                    (None, Some(count)) => {
                        compute_end_date_from_installments(first_collection_date, count, frequency)?
                    }
                    (None, None) => {
                        return Err(LedgerError::InvalidConfiguration {
                            message: "Loan end date or installment count required".to_string(),
                        })
                    }
                };

                LoanTerms {
                    principal,
                    monthly_rate,
                    loan_given_date,
                    frequency,
                    first_collection_date,
                    loan_end_date,
                    term_type: LoanTermType::Normal,
                    installment_amount: self.installment_amount,
                }
            }
        };

        terms.validate()?;
        Ok(terms)
    }

    /// build with system time
    pub fn build_now(self) -> Result<Loan> {
        let time = SafeTimeProvider::new(TimeSource::System);
        self.build(&time)
    }

    /// originate the loan and generate its schedule
    pub fn build(self, time_provider: &SafeTimeProvider) -> Result<Loan> {
        let config = self.config.clone().unwrap_or_default();
        config.validate()?;

        let customer = self
            .customer
            .clone()
            .filter(|name| !name.trim().is_empty())
            .ok_or(LedgerError::InvalidConfiguration {
                message: "Customer required".to_string(),
            })?;

        let terms = self.terms(time_provider)?;
        let engine = config.interest_engine();
        let schedule = generate_loan_schedule(&terms, &engine)?;

        let now = time_provider.now();
        let interest = engine.calculate_interest(
            terms.principal,
            terms.monthly_rate,
            terms.loan_given_date,
            terms.loan_end_date,
        );

        let mut loan = Loan {
            id: Uuid::new_v4(),
            customer,
            finance_number: self.finance_number.unwrap_or(1),
            terms,
            schedule,
            status: LoanStatus::Active,
            config,
            events: EventStore::new(),
        };

        loan.events.emit(Event::LoanOriginated {
            loan_id: loan.id,
            customer: loan.customer.clone(),
            finance_number: loan.finance_number,
            principal: loan.terms.principal,
            monthly_rate: loan.terms.monthly_rate,
            term_type: loan.terms.term_type,
            timestamp: now,
        });
        loan.events.emit(Event::ScheduleGenerated {
            loan_id: loan.id,
            installments: loan.schedule.len() as u32,
            frequency: loan.terms.frequency,
            total_interest: interest.interest_amount,
            total_repayable: loan.total_repayable(),
            first_due_date: loan.schedule.get(1).and_then(|row| row.due_date),
            loan_end_date: loan.terms.loan_end_date,
            timestamp: now,
        });

        debug!(
            loan_id = %loan.id,
            months = interest.months,
            installments = loan.schedule.len(),
            "loan originated"
        );

        Ok(loan)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::InstallmentStatus;
    use chrono::{Duration, TimeZone, Utc};
    use rust_decimal_macros::dec;

    fn date(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).unwrap()
    }

    fn test_time() -> SafeTimeProvider {
        SafeTimeProvider::new(TimeSource::Test(
            Utc.with_ymd_and_hms(2024, 2, 1, 10, 0, 0).unwrap(),
        ))
    }

    fn six_month_loan(time: &SafeTimeProvider) -> Loan {
        Loan::builder()
            .customer("Asha Traders")
            .principal(Money::from_major(50_000))
            .monthly_rate(Rate::from_percentage(10))
            .loan_given_date(date(2024, 1, 1))
            .frequency(Frequency::Monthly)
            .first_collection_date(date(2024, 2, 1))
            .loan_end_date(date(2024, 7, 1))
            .build(time)
            .unwrap()
    }

    fn revolving_loan(time: &SafeTimeProvider) -> Loan {
        Loan::builder()
            .customer("Ravi Kumar")
            .principal(Money::from_major(10_000))
            .monthly_rate(Rate::from_percentage(5))
            .loan_given_date(date(2024, 1, 31))
            .term_type(LoanTermType::Monthly)
            .build(time)
            .unwrap()
    }

    #[test]
    fn test_normal_origination() {
        let time = test_time();
        let loan = six_month_loan(&time);

        assert_eq!(loan.finance_number, 1);
        assert_eq!(loan.total_interest(), Money::from_major(30_000));
        assert_eq!(loan.total_repayable(), Money::from_major(80_000));
        assert_eq!(loan.schedule.len(), 6);
        assert_eq!(loan.schedule.total_due(), Money::from_major(80_000));
        assert_eq!(loan.schedule.get(1).unwrap().amount_due.as_decimal(), dec!(13333.33));
        assert_eq!(loan.schedule.get(6).unwrap().amount_due.as_decimal(), dec!(13333.35));
        assert_eq!(loan.schedule.get(1).unwrap().due_date, Some(date(2024, 2, 1)));
        assert_eq!(loan.schedule.final_due_date(), Some(date(2024, 7, 1)));

        let events = loan.events.events();
        assert!(matches!(events[0], Event::LoanOriginated { .. }));
        assert!(matches!(events[1], Event::ScheduleGenerated { installments: 6, .. }));
    }

    #[test]
    fn test_installment_count_derives_end_date() {
        let time = test_time();
        let loan = Loan::builder()
            .customer("Asha Traders")
            .principal(Money::from_major(50_000))
            .monthly_rate(Rate::from_percentage(10))
            .loan_given_date(date(2024, 1, 1))
            .frequency(Frequency::Monthly)
            .first_collection_date(date(2024, 2, 1))
            .installment_count(6)
            .build(&time)
            .unwrap();

        assert_eq!(loan.terms.loan_end_date, date(2024, 7, 1));
        assert_eq!(loan.schedule, six_month_loan(&time).schedule);
    }

    #[test]
    fn test_weekly_origination() {
        let time = test_time();
        let loan = Loan::builder()
            .customer("Meena")
            .principal(Money::from_major(12_000))
            .monthly_rate(Rate::from_percentage(4))
            .loan_given_date(date(2024, 1, 1))
            .frequency(Frequency::Weekly)
            .first_collection_date(date(2024, 1, 8))
            .installment_count(12)
            .build(&time)
            .unwrap();

        // 2024-01-08 + 11 weeks = 2024-03-25, two whole months after 2024-01-01
        assert_eq!(loan.terms.loan_end_date, date(2024, 3, 25));
        assert_eq!(loan.total_interest(), Money::from_major(960));
        assert_eq!(loan.schedule.len(), 12);
        assert_eq!(loan.schedule.total_due(), Money::from_major(12_960));
        assert_eq!(loan.schedule.get(2).unwrap().due_date, Some(date(2024, 1, 15)));
    }

    #[test]
    fn test_custom_installment_amount() {
        let time = test_time();
        let base = Loan::builder()
            .customer("Asha Traders")
            .principal(Money::from_major(50_000))
            .monthly_rate(Rate::from_percentage(10))
            .loan_given_date(date(2024, 1, 1))
            .frequency(Frequency::Monthly)
            .first_collection_date(date(2024, 2, 1))
            .loan_end_date(date(2024, 7, 1));

        let loan = base.clone().installment_amount(Money::from_major(15_000)).build(&time).unwrap();
        assert_eq!(loan.schedule.len(), 6);
        assert_eq!(loan.schedule.get(5).unwrap().amount_due, Money::from_major(15_000));
        assert_eq!(loan.schedule.get(6).unwrap().amount_due, Money::from_major(5_000));
        assert_eq!(loan.schedule.total_due(), Money::from_major(80_000));
        assert_eq!(loan.terms.loan_end_date, date(2024, 7, 1));

        // below the equal share, the equal share wins
        let loan = Loan::builder()
            .customer("Asha Traders")
            .principal(Money::from_major(50_000))
            .monthly_rate(Rate::from_percentage(10))
            .loan_given_date(date(2024, 1, 1))
            .frequency(Frequency::Monthly)
            .first_collection_date(date(2024, 2, 1))
            .loan_end_date(date(2024, 5, 1))
            .installment_amount(Money::from_major(10_000))
            .build(&time)
            .unwrap();
        assert_eq!(loan.schedule.len(), 4);
        assert!(loan.schedule.iter().all(|row| row.amount_due == Money::from_major(17_500)));
    }

    #[test]
    fn test_revolving_origination() {
        let time = test_time();
        let loan = revolving_loan(&time);

        assert!(loan.is_revolving());
        assert_eq!(loan.terms.frequency, Frequency::Monthly);
        assert_eq!(loan.terms.first_collection_date, date(2024, 2, 29));
        assert_eq!(loan.terms.loan_end_date, date(2024, 2, 29));
        assert_eq!(loan.schedule.len(), 1);
        assert_eq!(loan.schedule.get(1).unwrap().amount_due, Money::from_major(10_500));
        assert_eq!(loan.schedule.get(1).unwrap().due_date, Some(date(2024, 2, 29)));
    }

    #[test]
    fn test_given_date_defaults_to_today() {
        let time = test_time();
        let loan = Loan::builder()
            .customer("Ravi Kumar")
            .principal(Money::from_major(1_000))
            .monthly_rate(Rate::from_percentage(5))
            .term_type(LoanTermType::Monthly)
            .build(&time)
            .unwrap();
        assert_eq!(loan.terms.loan_given_date, date(2024, 2, 1));
        assert_eq!(loan.terms.loan_end_date, date(2024, 3, 1));
    }

    #[test]
    fn test_builder_validation() {
        let time = test_time();
        let missing_customer = Loan::builder()
            .principal(Money::from_major(1_000))
            .monthly_rate(Rate::from_percentage(5))
            .term_type(LoanTermType::Monthly)
            .build(&time);
        assert!(matches!(missing_customer, Err(LedgerError::InvalidConfiguration { .. })));

        let missing_end = Loan::builder()
            .customer("X")
            .principal(Money::from_major(1_000))
            .monthly_rate(Rate::from_percentage(5))
            .frequency(Frequency::Daily)
            .first_collection_date(date(2024, 1, 2))
            .build(&time);
        assert!(matches!(missing_end, Err(LedgerError::InvalidConfiguration { .. })));

        let reversed = Loan::builder()
            .customer("X")
            .principal(Money::from_major(1_000))
            .monthly_rate(Rate::from_percentage(5))
            .frequency(Frequency::Daily)
            .first_collection_date(date(2024, 3, 2))
            .loan_end_date(date(2024, 3, 1))
            .build(&time);
        assert!(matches!(reversed, Err(LedgerError::InvalidRange { .. })));

        let zero = Loan::builder()
            .customer("X")
            .principal(Money::ZERO)
            .monthly_rate(Rate::from_percentage(5))
            .term_type(LoanTermType::Monthly)
            .build(&time);
        assert!(matches!(zero, Err(LedgerError::InvalidAmount { .. })));
    }

    #[test]
    fn test_payments_emit_events_and_leave_original_untouched() {
        let time = test_time();
        let loan = six_month_loan(&time);

        let paid = loan.pay_full(1, Some("UPI"), &time).unwrap();
        assert!(paid.schedule.get(1).unwrap().is_paid());
        assert_eq!(paid.schedule.get(1).unwrap().paid_date, Some(time.now()));
        assert!(!loan.schedule.has_payments());

        let events = paid.events.events();
        assert!(events.iter().any(|e| matches!(e, Event::PaymentRecorded { installment: 1, .. })));
        assert!(events.iter().any(|e| matches!(e, Event::InstallmentPaid { installment: 1, .. })));

        let partial = paid.record_payment(2, Money::from_major(5_000), None, &time).unwrap();
        assert_eq!(partial.schedule.get(2).unwrap().status, InstallmentStatus::Pending);

        let undone = partial.undo_payment(1, &time).unwrap();
        assert_eq!(undone.schedule.get(1).unwrap().status, InstallmentStatus::Due);
        assert!(undone.events.events().iter().any(|e| matches!(e, Event::PaymentUndone { .. })));
    }

    #[test]
    fn test_summary() {
        let time = test_time();
        let loan = six_month_loan(&time)
            .pay_full(1, None, &time)
            .unwrap()
            .record_payment(2, Money::from_major(3_000), None, &time)
            .unwrap();

        let summary = loan.summary();
        assert_eq!(summary.total_interest, Money::from_major(30_000));
        assert_eq!(summary.total_repayable, Money::from_major(80_000));
        assert_eq!(summary.total_paid.as_decimal(), dec!(16333.33));
        assert_eq!(summary.outstanding.as_decimal(), dec!(63666.67));
        assert_eq!(summary.paid_installments, 1);
        assert_eq!(summary.installment_count, 6);
        assert_eq!(summary.next_due.unwrap().index, 2);
        // 3/8 of every payment is interest
        assert_eq!(summary.interest_collected.round_currency().as_decimal(), dec!(6125.00));
    }

    #[test]
    fn test_revolving_interest_only_extends_loan() {
        let time = test_time();
        let loan = revolving_loan(&time);

        let (loan, extension) = loan.pay_interest_only(1, Some("Cash"), &time).unwrap();
        assert!(matches!(extension, ExtensionOutcome::Appended { index: 2, .. }));
        assert_eq!(loan.terms.loan_end_date, date(2024, 3, 29));
        assert_eq!(loan.schedule.len(), 2);
        assert_eq!(loan.outstanding(), Money::from_major(10_500));
        assert_eq!(loan.next_due().unwrap().index, 2);

        let events = loan.events.events();
        assert!(events.iter().any(|e| matches!(e, Event::InterestOnlyPaid { .. })));
        assert!(events.iter().any(|e| matches!(e, Event::LoanEndDateExtended { .. })));

        // closing the revolving loan by paying the latest row in full
        let closed = loan.pay_full(2, None, &time).unwrap();
        assert_eq!(closed.outstanding(), Money::ZERO);
        assert!(closed.next_due().is_none());
    }

    #[test]
    fn test_rolled_over_row_refuses_payments() {
        let time = test_time();
        let (loan, _) = revolving_loan(&time).pay_interest_only(1, None, &time).unwrap();
        let before = loan.summary();

        assert!(matches!(
            loan.pay_full(1, None, &time),
            Err(LedgerError::InvalidState { .. })
        ));
        assert!(matches!(
            loan.record_payment(1, Money::from_major(100), None, &time),
            Err(LedgerError::InvalidState { .. })
        ));
        assert!(matches!(
            loan.pay_full(3, None, &time),
            Err(LedgerError::InstallmentNotFound { index: 3 })
        ));

        // the latest row still takes money and moves the balance
        let partial = loan.record_payment(2, Money::from_major(500), None, &time).unwrap();
        assert_eq!(before.total_paid, Money::from_major(500));
        assert_eq!(partial.schedule.total_paid(), Money::from_major(1_000));
        assert_eq!(partial.outstanding(), Money::from_major(10_000));
    }

    #[test]
    fn test_tiny_daily_loan_splits_into_every_installment() {
        let time = test_time();
        let loan = Loan::builder()
            .customer("Meena")
            .principal(Money::from_major(6))
            .monthly_rate(Rate::from_percentage(0))
            .loan_given_date(date(2024, 1, 1))
            .frequency(Frequency::Daily)
            .first_collection_date(date(2024, 1, 2))
            .installment_count(365)
            .build(&time)
            .unwrap();

        assert_eq!(loan.schedule.len(), 365);
        assert_eq!(loan.schedule.total_due(), Money::from_major(6));
        assert_eq!(loan.schedule.last().unwrap().amount_due.as_decimal(), dec!(-1.28));
    }

    #[test]
    fn test_interest_only_rejected_for_normal_loan() {
        let time = test_time();
        let err = six_month_loan(&time).pay_interest_only(6, None, &time).unwrap_err();
        assert!(matches!(err, LedgerError::InvalidState { .. }));
    }

    #[test]
    fn test_reschedule_only_before_payments() {
        let time = test_time();
        let loan = six_month_loan(&time);
        assert!(loan.can_edit_terms());

        let new_terms = LoanTerms {
            loan_end_date: date(2024, 4, 1),
            ..loan.terms.clone()
        };
        let rescheduled = loan.reschedule(new_terms.clone(), &time).unwrap();
        assert_eq!(rescheduled.schedule.len(), 3);
        assert_eq!(rescheduled.total_interest(), Money::from_major(15_000));
        assert_eq!(rescheduled.schedule.total_due(), Money::from_major(65_000));

        let paid = loan.record_payment(1, Money::from_major(100), None, &time).unwrap();
        assert!(!paid.can_edit_terms());
        assert!(matches!(
            paid.reschedule(new_terms, &time),
            Err(LedgerError::InvalidState { .. })
        ));

        let revolving = revolving_loan(&time);
        assert!(!revolving.can_edit_terms());
    }

    #[test]
    fn test_settle_and_reopen() {
        let time = test_time();
        let control = time.test_control().unwrap();
        let loan = six_month_loan(&time);

        control.advance(Duration::days(30));
        let settled = loan.settle(&time).unwrap();
        assert_eq!(settled.status, LoanStatus::Settled);
        assert!(matches!(
            settled.record_payment(1, Money::from_major(10), None, &time),
            Err(LedgerError::InvalidState { .. })
        ));
        assert!(settled.settle(&time).is_err());

        let reopened = settled.reopen(&time).unwrap();
        assert_eq!(reopened.status, LoanStatus::Active);
        assert!(loan.reopen(&time).is_err());

        let changes: Vec<_> = reopened
            .events
            .events()
            .iter()
            .filter_map(|e| match e {
                Event::StatusChanged { new_status, timestamp, .. } => Some((*new_status, *timestamp)),
                _ => None,
            })
            .collect();
        assert_eq!(changes.len(), 2);
        assert_eq!(changes[0].0, LoanStatus::Settled);
        assert_eq!(changes[0].1, Utc.with_ymd_and_hms(2024, 3, 2, 10, 0, 0).unwrap());
    }

    #[test]
    fn test_refinance_issues_next_finance() {
        let time = test_time();
        let loan = six_month_loan(&time);

        let next = Loan::builder()
            .principal(Money::from_major(20_000))
            .monthly_rate(Rate::from_percentage(8))
            .loan_given_date(date(2024, 2, 1))
            .frequency(Frequency::Daily)
            .first_collection_date(date(2024, 2, 2))
            .installment_count(30);

        let (old, new) = loan.refinance(next, &time).unwrap();
        assert_eq!(old.status, LoanStatus::Refinanced);
        assert_eq!(new.status, LoanStatus::Active);
        assert_eq!(new.customer, "Asha Traders");
        assert_eq!(new.finance_number, 2);
        assert_eq!(new.schedule.len(), 30);
        assert!(old
            .events
            .events()
            .iter()
            .any(|e| matches!(e, Event::LoanRefinanced { new_finance_number: 2, .. })));

        assert!(old.reopen(&time).is_err());
    }

    #[test]
    fn test_refinance_never_issues_revolving_loan() {
        let time = test_time();
        let next = Loan::builder()
            .principal(Money::from_major(5_000))
            .monthly_rate(Rate::from_percentage(5))
            .loan_given_date(date(2024, 2, 1))
            .frequency(Frequency::Monthly)
            .first_collection_date(date(2024, 3, 1))
            .installment_count(3)
            .term_type(LoanTermType::Monthly);

        let (_, new) = six_month_loan(&time).refinance(next, &time).unwrap();
        assert_eq!(new.terms.term_type, LoanTermType::Normal);
        assert!(!new.is_revolving());
        assert_eq!(new.schedule.len(), 3);
    }

    #[test]
    fn test_from_parts_checks_schedule() {
        let time = test_time();
        let loan = six_month_loan(&time);

        let rebuilt = Loan::from_parts(
            loan.id,
            loan.customer.clone(),
            loan.finance_number,
            loan.terms.clone(),
            loan.schedule.clone(),
            loan.status,
            LedgerConfig::default(),
        )
        .unwrap();
        assert_eq!(rebuilt.schedule, loan.schedule);
        assert!(rebuilt.events.is_empty());

        let mut rows = loan.schedule.clone().into_installments();
        rows[0].amount_paid = Money::from_major(1);
        let broken = Schedule::from_installments(rows).unwrap();
        assert!(Loan::from_parts(
            loan.id,
            "Asha Traders",
            1,
            loan.terms.clone(),
            broken,
            LoanStatus::Active,
            LedgerConfig::default()
        )
        .is_err());
    }
}
