//! Cent rounding shared by every component.
//!
//! One rule everywhere: round to the nearest cent, ties away from zero
//! (half-up for the non-negative amounts this crate produces).

use common::{Cents, Error, Result};

/// Round a fractional cent amount to whole cents, half-up.
pub fn round_half_up(cents: f64) -> Cents {
    if cents >= 0.0 {
        (cents + 0.5).floor() as Cents
    } else {
        -((-cents + 0.5).floor() as Cents)
    }
}

/// `amount × bps / 10_000`, rounded half-up. Integer-only.
pub fn apply_bps(amount: Cents, bps: i64) -> Result<Cents> {
    let product = amount
        .checked_mul(bps)
        .and_then(|p| p.checked_add(5_000 * p.signum()))
        .ok_or_else(|| {
            Error::validation(format!("{} cents at {} bps overflows", amount, bps))
        })?;
    Ok(product / 10_000)
}

/// Sum of cent amounts; overflow is a validation error.
pub fn checked_sum(amounts: &[Cents]) -> Result<Cents> {
    amounts.iter().try_fold(0 as Cents, |acc, x| {
        acc.checked_add(*x)
            .ok_or_else(|| Error::validation(format!("amount total overflows at {}", x)))
    })
}
