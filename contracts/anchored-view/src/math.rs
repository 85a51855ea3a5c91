//! Fixed-point helpers shared by the anchor check and the anchor-source parser.
//!
//! Everything here is checked: an overflow aborts the call instead of wrapping.

use crate::constants::ANCHOR_BASE;

pub fn mul(a: u128, b: u128) -> u128 {
    a.checked_mul(b)
        .unwrap_or_else(|| panic!("multiplication overflow"))
}

pub fn pow10(exp: u32) -> u128 {
    10u128
        .checked_pow(exp)
        .unwrap_or_else(|| panic!("multiplication overflow"))
}

/// Derives `(upper, lower)` anchor ratios from a tolerance around 100e16.
///
/// The upper bound saturates at `u128::MAX`; a tolerance of 100% or more pins
/// the lower bound at 1 so a zero anchor can never pass.
pub fn anchor_bounds(tolerance_mantissa: u128) -> (u128, u128) {
    let upper = ANCHOR_BASE.saturating_add(tolerance_mantissa);
    let lower = if tolerance_mantissa < ANCHOR_BASE {
        ANCHOR_BASE - tolerance_mantissa
    } else {
        1
    };
    (upper, lower)
}

pub fn anchor_ratio(reporter_price: u128, anchor_price: u128) -> u128 {
    mul(anchor_price, ANCHOR_BASE) / reporter_price
}

pub fn is_within_anchor(reporter_price: u128, anchor_price: u128, upper: u128, lower: u128) -> bool {
    if reporter_price == 0 {
        return false;
    }
    let ratio = anchor_ratio(reporter_price, anchor_price);
    ratio <= upper && ratio >= lower
}

/// Parses a decimal string into a fixed-point integer with `decimals` places.
///
/// Fractional digits beyond `decimals` are truncated and missing ones are
/// zero-padded. Bytes other than digits and `.` are skipped, so `"1,000.5"`
/// reads as `1000.5`.
pub fn parse_decimal(bytes: &[u8], decimals: u32) -> u128 {
    let mut value: u128 = 0;
    let mut remaining = decimals;
    let mut fractional = false;
    for &b in bytes {
        match b {
            b'0'..=b'9' => {
                if fractional {
                    if remaining == 0 {
                        break;
                    }
                    remaining -= 1;
                }
                value = mul(value, 10)
                    .checked_add((b - b'0') as u128)
                    .unwrap_or_else(|| panic!("addition overflow"));
            }
            b'.' => fractional = true,
            _ => {}
        }
    }
    mul(value, pow10(remaining))
}
