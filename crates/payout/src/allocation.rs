//! Largest-remainder allocation
//!
//! Splits a total pro-rata over weighted recipients at the currency's
//! minor-unit scale. Each claim is floored to minor units first, then the
//! leftover units go to the largest fractional remainders, so the claims
//! always sum to exactly the total being distributed.

use finvoice_core::{Amount, InvestmentId};
use rust_decimal::prelude::ToPrimitive;
use rust_decimal::Decimal;

/// Split `total` over `weights` at `scale` decimal places.
///
/// Weights do not have to sum to 1; they are normalised first, so the
/// same routine serves full payouts (shares summing to 1) and partial
/// recoveries over whatever investments remain active.
///
/// Returns `None` on empty-sum weights or arithmetic overflow; callers
/// map that to their overflow error.
pub fn allocate(
    total: Amount,
    weights: &[(InvestmentId, Decimal)],
    scale: u32,
) -> Option<Vec<(InvestmentId, Amount)>> {
    if weights.is_empty() {
        return Some(Vec::new());
    }

    let weight_sum: Decimal = weights.iter().map(|(_, w)| *w).sum();
    if weight_sum <= Decimal::ZERO {
        return None;
    }

    let total_minor = total.minor_units(scale)?;
    let factor = Decimal::from(10u64.pow(scale));

    let mut minor = Vec::with_capacity(weights.len());
    let mut remainders = Vec::with_capacity(weights.len());
    for (position, (_, weight)) in weights.iter().enumerate() {
        let fraction = weight.checked_div(weight_sum)?;
        let scaled = total.value().checked_mul(fraction)?.checked_mul(factor)?;
        let floor = scaled.trunc();
        minor.push(floor.to_u128()?);
        remainders.push((position, scaled - floor));
    }

    let assigned: u128 = minor.iter().sum();
    let mut leftover = total_minor.checked_sub(assigned)?;

    // Hand leftover units out by descending remainder; ties break on
    // commit order so the result is deterministic.
    remainders.sort_by(|a, b| b.1.cmp(&a.1).then(a.0.cmp(&b.0)));
    while leftover > 0 {
        for (position, _) in &remainders {
            if leftover == 0 {
                break;
            }
            minor[*position] += 1;
            leftover -= 1;
        }
    }

    Some(
        weights
            .iter()
            .zip(minor)
            .map(|((id, _), units)| {
                (
                    *id,
                    Amount::new_unchecked(Decimal::from_i128_with_scale(units as i128, scale)),
                )
            })
            .collect(),
    )
}
