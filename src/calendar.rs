//! Month-anchored date arithmetic.
//!
//! Every duration and due-date computation in the crate steps months through
//! [`add_months_preserve_anchor`], which clamps to the last valid day of the
//! target month instead of rolling over into the next one. Repeated stepping
//! always restarts from the original anchor so clamping never drifts.

use chrono::{Datelike, Duration, Months, NaiveDate};

use crate::errors::{LedgerError, Result};
use crate::types::Frequency;

/// add `months` whole months, clamping the day to the target month's length
///
/// 2024-01-31 + 1 month is 2024-02-29, never 2024-03-02.
pub fn add_months_preserve_anchor(date: NaiveDate, months: u32) -> Result<NaiveDate> {
    date.checked_add_months(Months::new(months))
        .ok_or_else(|| LedgerError::InvalidDate {
            message: format!("{date} + {months} months is out of range"),
        })
}

/// subtract `months` whole months with the same clamping rule
pub fn sub_months_preserve_anchor(date: NaiveDate, months: u32) -> Result<NaiveDate> {
    date.checked_sub_months(Months::new(months))
        .ok_or_else(|| LedgerError::InvalidDate {
            message: format!("{date} - {months} months is out of range"),
        })
}

/// largest `k >= 0` such that `add_months_preserve_anchor(start, k) <= end`
///
/// Returns 0 when `end <= start` or when less than one anchored month fits.
pub fn count_whole_anchor_months(start: NaiveDate, end: NaiveDate) -> u32 {
    if end <= start {
        return 0;
    }

    let span = (end.year() - start.year()) * 12 + end.month() as i32 - start.month() as i32;
    let mut months = span.max(0) as u32;

    // calendar month difference overshoots by at most one when the end day
    // falls before the (clamped) anchor day
    while months > 0 {
        match add_months_preserve_anchor(start, months) {
            Ok(stepped) if stepped <= end => break,
            _ => months -= 1,
        }
    }

    months
}

/// billable months between two dates, minimum one for any positive span
///
/// A 40-day loan counts as one month; an exact six-month span counts as six.
pub fn count_anchor_months(start: NaiveDate, end: NaiveDate) -> u32 {
    if end <= start {
        return 0;
    }
    count_whole_anchor_months(start, end).max(1)
}

/// days in `[start, end]`, both ends included
pub fn inclusive_day_count(start: NaiveDate, end: NaiveDate) -> Result<i64> {
    if end < start {
        return Err(LedgerError::InvalidRange { start, end });
    }
    Ok((end - start).num_days() + 1)
}

/// the `steps`-th collection date after `anchor`
///
/// Monthly stepping is measured from the anchor each time, so the 3rd step
/// from Jan 31 lands on Apr 30 even though Feb clamps to the 28th/29th.
pub fn step_date(anchor: NaiveDate, frequency: Frequency, steps: u32) -> Result<NaiveDate> {
    let shifted = match frequency {
        Frequency::Daily => anchor.checked_add_signed(Duration::days(steps as i64)),
        Frequency::Weekly => anchor.checked_add_signed(Duration::weeks(steps as i64)),
        Frequency::Monthly => return add_months_preserve_anchor(anchor, steps),
    };

    shifted.ok_or_else(|| LedgerError::InvalidDate {
        message: format!("{anchor} + {steps} {frequency} steps is out of range"),
    })
}
