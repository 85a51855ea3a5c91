//! Mantissa arithmetic on host `U256` values.
//!
//! `Exp` values are scaled by 1e18 and `Double` values by 1e36. Intermediate
//! products of two u128 mantissas routinely exceed u128, so everything is
//! widened first and narrowed once at the end.

use soroban_sdk::{Env, U256};

use crate::constants::{DOUBLE_SCALE, EXP_SCALE};

pub fn wide(env: &Env, value: u128) -> U256 {
    U256::from_u128(env, value)
}

/// `a * b / 1e18`
pub fn mul_exp(env: &Env, a: &U256, b: &U256) -> U256 {
    a.mul(b).div(&wide(env, EXP_SCALE))
}

/// `a * 1e18 / b`
pub fn div_exp(env: &Env, a: &U256, b: &U256) -> U256 {
    a.mul(&wide(env, EXP_SCALE)).div(b)
}

/// `a * 1e36 / b`, the ratio used to advance reward indices.
pub fn fraction_double(env: &Env, a: &U256, b: &U256) -> U256 {
    a.mul(&wide(env, DOUBLE_SCALE)).div(b)
}

/// `a * b / 1e36`
pub fn mul_double(env: &Env, a: &U256, b: &U256) -> U256 {
    a.mul(b).div(&wide(env, DOUBLE_SCALE))
}

pub fn narrow(value: &U256, reason: &str) -> u128 {
    value.to_u128().unwrap_or_else(|| panic!("{}", reason))
}

/// 2^224 - 1, the ceiling for reward indices.
pub fn max_index(env: &Env) -> U256 {
    U256::from_parts(env, 0xFFFF_FFFF, u64::MAX, u64::MAX, u64::MAX)
}
