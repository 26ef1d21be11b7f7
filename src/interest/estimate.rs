use rust_decimal::Decimal;
use rust_decimal_macros::dec;

use crate::decimal::{Money, Rate};
use crate::types::Frequency;

/// average weeks per month used by the quick calculator
pub const WEEKS_PER_MONTH: Decimal = dec!(4.33);

/// average days per month used by the quick calculator
pub const DAYS_PER_MONTH: Decimal = dec!(30.44);

/// month-equivalent of `installments` collections at `frequency`
pub fn month_equivalent(installments: u32, frequency: Frequency) -> Decimal {
    let n = Decimal::from(installments);
    match frequency {
        Frequency::Monthly => n,
        Frequency::Weekly => n / WEEKS_PER_MONTH,
        Frequency::Daily => n / DAYS_PER_MONTH,
    }
}

/// rough interest estimate from an installment count
///
/// Backs the standalone calculator only. It converts the count into fractional
/// months with fixed averages, so it must never price a real schedule; use
/// [`crate::interest::calculate_total_interest`] for that.
pub fn calculate_total_interest_by_term(
    principal: Money,
    monthly_rate: Rate,
    installments: u32,
    frequency: Frequency,
) -> Money {
    if !principal.is_positive() || monthly_rate.is_zero() || monthly_rate.is_negative() || installments == 0 {
        return Money::ZERO;
    }

    let months = month_equivalent(installments, frequency);
    Money::from_decimal(principal.as_decimal() * monthly_rate.as_decimal() * months)
}
