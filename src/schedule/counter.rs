use chrono::NaiveDate;

use crate::calendar::{count_whole_anchor_months, inclusive_day_count, step_date};
use crate::errors::{LedgerError, Result};
use crate::types::Frequency;

/// number of collections between the first collection date and the end date
///
/// - daily: every day in `[first, end]`
/// - weekly: `ceil(days / 7)`
/// - monthly: whole anchored months plus one, the first collection being month 0
pub fn calculate_installments(
    first_date: NaiveDate,
    end_date: NaiveDate,
    frequency: Frequency,
) -> Result<u32> {
    let days = inclusive_day_count(first_date, end_date)?;

    let count = match frequency {
        Frequency::Daily => days,
        Frequency::Weekly => (days + 6) / 7,
        Frequency::Monthly => count_whole_anchor_months(first_date, end_date) as i64 + 1,
    };

    u32::try_from(count).map_err(|_| LedgerError::calculation(format!(
        "installment count {count} between {first_date} and {end_date} is out of range"
    )))
}

/// end date implied by `installments` collections starting on `first_date`
///
/// A single collection ends on the first date itself.
pub fn compute_end_date_from_installments(
    first_date: NaiveDate,
    installments: u32,
    frequency: Frequency,
) -> Result<NaiveDate> {
    match installments {
        0 => Err(LedgerError::InvalidInstallmentCount { count: 0 }),
        1 => Ok(first_date),
        n => step_date(first_date, frequency, n - 1),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Duration;

    fn date(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).unwrap()
    }

    #[test]
    fn test_monthly_scenario() {
        let n = calculate_installments(date(2024, 2, 1), date(2024, 7, 1), Frequency::Monthly).unwrap();
        assert_eq!(n, 6);
    }

    #[test]
    fn test_monthly_partial_month_is_not_counted() {
        let n = calculate_installments(date(2024, 2, 15), date(2024, 5, 14), Frequency::Monthly).unwrap();
        assert_eq!(n, 3);
        let n = calculate_installments(date(2024, 2, 15), date(2024, 5, 15), Frequency::Monthly).unwrap();
        assert_eq!(n, 4);
    }

    #[test]
    fn test_daily_and_weekly() {
        let first = date(2024, 1, 1);
        assert_eq!(calculate_installments(first, first, Frequency::Daily).unwrap(), 1);
        assert_eq!(calculate_installments(first, date(2024, 1, 31), Frequency::Daily).unwrap(), 31);
        assert_eq!(calculate_installments(first, date(2024, 1, 7), Frequency::Weekly).unwrap(), 1);
        assert_eq!(calculate_installments(first, date(2024, 1, 8), Frequency::Weekly).unwrap(), 2);
        assert_eq!(calculate_installments(first, date(2024, 3, 31), Frequency::Weekly).unwrap(), 13);
    }

    #[test]
    fn test_reversed_range_fails() {
        let err = calculate_installments(date(2024, 3, 1), date(2024, 2, 1), Frequency::Daily).unwrap_err();
        assert!(matches!(err, LedgerError::InvalidRange { .. }));
    }

    #[test]
    fn test_end_date_from_count() {
        let first = date(2024, 1, 31);
        assert_eq!(compute_end_date_from_installments(first, 1, Frequency::Monthly).unwrap(), first);
        assert_eq!(compute_end_date_from_installments(first, 2, Frequency::Monthly).unwrap(), date(2024, 2, 29));
        assert_eq!(compute_end_date_from_installments(first, 4, Frequency::Monthly).unwrap(), date(2024, 4, 30));
        assert_eq!(compute_end_date_from_installments(first, 3, Frequency::Weekly).unwrap(), date(2024, 2, 14));
        assert_eq!(compute_end_date_from_installments(first, 10, Frequency::Daily).unwrap(), date(2024, 2, 9));
        assert!(matches!(
            compute_end_date_from_installments(first, 0, Frequency::Daily),
            Err(LedgerError::InvalidInstallmentCount { count: 0 })
        ));
    }

    #[test]
    fn test_monthly_count_and_end_date_are_inverses() {
        let mut first = date(2023, 1, 1);
        let last = date(2025, 1, 1);

        // every first date across two years, including all month-ends
        while first <= last {
            for n in 1..=40 {
                let end = compute_end_date_from_installments(first, n, Frequency::Monthly).unwrap();
                let back = calculate_installments(first, end, Frequency::Monthly).unwrap();
                assert_eq!(back, n, "first {first}, n {n}, end {end}");
            }
            first += Duration::days(1);
        }
    }

    #[test]
    fn test_daily_and_weekly_round_trip() {
        let first = date(2024, 2, 20);
        for n in 1..=60 {
            let end = compute_end_date_from_installments(first, n, Frequency::Daily).unwrap();
            assert_eq!(calculate_installments(first, end, Frequency::Daily).unwrap(), n);

            let end = compute_end_date_from_installments(first, n, Frequency::Weekly).unwrap();
            assert_eq!(calculate_installments(first, end, Frequency::Weekly).unwrap(), n);
        }
    }
}
