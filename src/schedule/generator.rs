use tracing::debug;

use crate::decimal::Money;
use crate::errors::{LedgerError, Result};
use crate::schedule::{Installment, Schedule};

/// split `total_repayable` into `installments` rows
///
/// Every row but the last carries the rounded equal share; the last absorbs
/// the rounding difference so the rows sum to the rounded total exactly, even
/// when that leaves it at zero or below (6.00 over 365 rows ends on -1.28).
/// Due dates are left unset.
pub fn generate_simple_interest_schedule(
    total_repayable: Money,
    installments: u32,
) -> Result<Schedule> {
    if installments == 0 {
        return Err(LedgerError::InvalidInstallmentCount { count: 0 });
    }

    let total_cents = cents(total_repayable)?;
    let n = i128::from(installments);
    let standard = div_round_half_away(total_cents, n);
    let last = total_cents - standard * (n - 1);

    let rows = (1..=installments)
        .map(|index| {
            let amount = if index == installments { last } else { standard };
            Ok(Installment::new(index, from_cents(amount)?))
        })
        .collect::<Result<Vec<_>>>()?;

    debug!(
        total = %total_repayable,
        installments,
        standard = %from_cents(standard)?,
        last = %from_cents(last)?,
        "generated equal-split schedule"
    );

    Ok(Schedule::from_vec_unchecked(rows))
}

/// split `total_repayable` into rows of `per_installment`, the last row taking the remainder
///
/// Both amounts are rounded to cents first, so a sub-cent `per_installment`
/// such as 333.335 produces rows of 333.34. The row count is `ceil(total / per)`
/// (at least one) and the final row always lands in `(0, per]`.
pub fn generate_schedule_with_installment_amount(
    total_repayable: Money,
    per_installment: Money,
) -> Result<Schedule> {
    let per_cents = cents(per_installment)?;
    if per_cents <= 0 {
        return Err(LedgerError::InvalidAmount { amount: per_installment });
    }

    let total_cents = cents(total_repayable)?;
    if total_cents <= 0 {
        return Err(LedgerError::InvalidAmount { amount: total_repayable });
    }

    let count = ((total_cents + per_cents - 1) / per_cents).max(1);
    let count = u32::try_from(count).map_err(|_| {
        LedgerError::calculation(format!(
            "{total_repayable} in installments of {per_installment} needs too many rows"
        ))
    })?;
    let last = total_cents - per_cents * i128::from(count - 1);

    let rows = (1..=count)
        .map(|index| {
            let amount = if index == count { last } else { per_cents };
            Ok(Installment::new(index, from_cents(amount)?))
        })
        .collect::<Result<Vec<_>>>()?;

    debug!(
        total = %total_repayable,
        per_installment = %per_installment,
        installments = count,
        last = %from_cents(last)?,
        "generated fixed-amount schedule"
    );

    Ok(Schedule::from_vec_unchecked(rows))
}

fn cents(amount: Money) -> Result<i128> {
    amount
        .to_cents()
        .map(i128::from)
        .ok_or_else(|| LedgerError::calculation(format!("{amount} does not fit in cents")))
}

fn from_cents(cents: i128) -> Result<Money> {
    i64::try_from(cents)
        .map(Money::from_cents)
        .map_err(|_| LedgerError::calculation(format!("{cents} cents is out of range")))
}

/// integer division rounding half away from zero; `den` must be positive
fn div_round_half_away(num: i128, den: i128) -> i128 {
    let half_up = (num.abs() * 2 + den) / (den * 2);
    if num < 0 {
        -half_up
    } else {
        half_up
    }
}
