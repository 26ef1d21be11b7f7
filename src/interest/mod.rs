pub mod estimate;
pub mod simple;

use chrono::NaiveDate;

use crate::decimal::{Money, Rate};

pub use estimate::calculate_total_interest_by_term;
pub use simple::{MonthCountConvention, SimpleInterestEngine};

/// interest calculation result
#[derive(Debug, Clone, PartialEq)]
pub struct InterestCalculation {
    pub interest_amount: Money,
    pub months: u32,
    pub principal_base: Money,
    pub monthly_rate: Rate,
    pub convention: MonthCountConvention,
}

/// trait for date-ranged interest calculations
pub trait InterestCalculator {
    fn calculate_interest(
        &self,
        principal: Money,
        monthly_rate: Rate,
        start_date: NaiveDate,
        end_date: NaiveDate,
    ) -> InterestCalculation;

    fn billable_months(&self, start_date: NaiveDate, end_date: NaiveDate) -> u32;
}

/// total flat interest between the loan-given date and the end date
///
/// Zero when the principal is not positive, the rate is zero or negative, or
/// `end <= given`. Otherwise `principal * rate * billable months`, where any
/// positive span bills at least one month.
pub fn calculate_total_interest(
    principal: Money,
    monthly_rate: Rate,
    loan_given_date: NaiveDate,
    loan_end_date: NaiveDate,
) -> Money {
    SimpleInterestEngine::default()
        .calculate_interest(principal, monthly_rate, loan_given_date, loan_end_date)
        .interest_amount
}

/// interest for exactly one month
pub fn one_month_interest(principal: Money, monthly_rate: Rate) -> Money {
    if !principal.is_positive() || monthly_rate.is_zero() || monthly_rate.is_negative() {
        return Money::ZERO;
    }
    principal.apply_monthly_rate(monthly_rate, 1)
}
