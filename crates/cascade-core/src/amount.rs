//! Conversions between caller-side decimal quantities and base units.
//!
//! Engine arithmetic never touches floats. Decimal quantities are quantized
//! to base units once, at the boundary, and every later product is an
//! integer floor division.

use crate::constants::{BPS_PRECISION, UNIT};
use crate::error::RewardError;

/// Convert a decimal credit quantity to base units, rounding to the nearest unit.
///
/// # Errors
///
/// - [`RewardError::InvalidAmount`] for negative, NaN, or infinite input
/// - [`RewardError::ArithmeticOverflow`] if the result does not fit in `u64`
pub fn from_decimal(credits: f64) -> Result<u64, RewardError> {
    if !credits.is_finite() || credits < 0.0 {
        return Err(RewardError::InvalidAmount(credits.to_string()));
    }
    let units = (credits * UNIT as f64).round();
    if units >= u64::MAX as f64 {
        return Err(RewardError::ArithmeticOverflow);
    }
    Ok(units as u64)
}

/// Validate a signed base-unit amount received from a trigger.
pub fn from_signed(units: i64) -> Result<u64, RewardError> {
    u64::try_from(units).map_err(|_| RewardError::InvalidAmount(units.to_string()))
}

/// Lossy conversion to decimal credits, for reporting only.
pub fn to_decimal(units: u64) -> f64 {
    units as f64 / UNIT as f64
}

/// Render base units as a fixed 8-decimal credit string, e.g. `"12.50000000"`.
pub fn format_units(units: u64) -> String {
    format!("{}.{:08}", units / UNIT, units % UNIT)
}

/// `floor(amount * bps / 10_000)` with a `u128` intermediate.
pub fn apply_bps(amount: u64, bps: u64) -> Result<u64, RewardError> {
    let product = (amount as u128)
        .checked_mul(bps as u128)
        .ok_or(RewardError::ArithmeticOverflow)?;
    u64::try_from(product / BPS_PRECISION as u128).map_err(|_| RewardError::ArithmeticOverflow)
}
