use chrono::NaiveDate;

use crate::calendar::{count_anchor_months, count_whole_anchor_months};
use crate::decimal::{Money, Rate};
use crate::interest::{InterestCalculation, InterestCalculator};

/// how elapsed months are counted between two dates
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, serde::Serialize, serde::Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum MonthCountConvention {
    /// any positive span bills at least one month
    #[default]
    MinimumOneMonth,
    /// only complete anchored months are billed, sub-month spans bill zero
    WholeMonths,
}

/// engine for flat per-month interest
#[derive(Debug, Clone, Copy, Default)]
pub struct SimpleInterestEngine {
    pub convention: MonthCountConvention,
}

impl SimpleInterestEngine {
    pub fn new(convention: MonthCountConvention) -> Self {
        Self { convention }
    }

    /// interest amount only
    pub fn total_interest(
        &self,
        principal: Money,
        monthly_rate: Rate,
        start_date: NaiveDate,
        end_date: NaiveDate,
    ) -> Money {
        self.calculate_interest(principal, monthly_rate, start_date, end_date)
            .interest_amount
    }
}

impl InterestCalculator for SimpleInterestEngine {
    fn calculate_interest(
        &self,
        principal: Money,
        monthly_rate: Rate,
        start_date: NaiveDate,
        end_date: NaiveDate,
    ) -> InterestCalculation {
        let chargeable = principal.is_positive()
            && !monthly_rate.is_zero()
            && !monthly_rate.is_negative()
            && end_date > start_date;

        let months = if chargeable {
            self.billable_months(start_date, end_date)
        } else {
            0
        };

        InterestCalculation {
            interest_amount: if chargeable {
                principal.apply_monthly_rate(monthly_rate, months)
            } else {
                Money::ZERO
            },
            months,
            principal_base: principal,
            monthly_rate,
            convention: self.convention,
        }
    }

    fn billable_months(&self, start_date: NaiveDate, end_date: NaiveDate) -> u32 {
        match self.convention {
            MonthCountConvention::MinimumOneMonth => count_anchor_months(start_date, end_date),
            MonthCountConvention::WholeMonths => count_whole_anchor_months(start_date, end_date),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal_macros::dec;

    fn date(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).unwrap()
    }

    #[test]
    fn test_conventions_disagree_on_sub_month_spans() {
        let min_one = SimpleInterestEngine::new(MonthCountConvention::MinimumOneMonth);
        let whole = SimpleInterestEngine::new(MonthCountConvention::WholeMonths);

        let start = date(2024, 1, 10);
        let end = date(2024, 1, 25);

        assert_eq!(min_one.billable_months(start, end), 1);
        assert_eq!(whole.billable_months(start, end), 0);

        let principal = Money::from_major(10_000);
        let rate = Rate::from_percentage(4);
        assert_eq!(min_one.total_interest(principal, rate, start, end), Money::from_major(400));
        assert_eq!(whole.total_interest(principal, rate, start, end), Money::ZERO);
    }

    #[test]
    fn test_conventions_agree_on_whole_spans() {
        let start = date(2024, 3, 31);
        let end = date(2024, 9, 30);

        let min_one = SimpleInterestEngine::new(MonthCountConvention::MinimumOneMonth);
        let whole = SimpleInterestEngine::new(MonthCountConvention::WholeMonths);

        assert_eq!(min_one.billable_months(start, end), 6);
        assert_eq!(whole.billable_months(start, end), 6);
    }

    #[test]
    fn test_calculation_details() {
        let engine = SimpleInterestEngine::default();
        let calc = engine.calculate_interest(
            Money::from_major(12_345),
            Rate::from_percent(dec!(1.5)),
            date(2024, 1, 15),
            date(2024, 4, 20),
        );

        assert_eq!(calc.months, 3);
        assert_eq!(calc.interest_amount.as_decimal(), dec!(555.525));
        assert_eq!(calc.principal_base, Money::from_major(12_345));
        assert_eq!(calc.convention, MonthCountConvention::MinimumOneMonth);
    }

    #[test]
    fn test_negative_rate_charges_nothing() {
        let engine = SimpleInterestEngine::default();
        let calc = engine.calculate_interest(
            Money::from_major(1_000),
            Rate::from_decimal(dec!(-0.01)),
            date(2024, 1, 1),
            date(2024, 3, 1),
        );
        assert_eq!(calc.months, 0);
        assert_eq!(calc.interest_amount, Money::ZERO);
    }
}
