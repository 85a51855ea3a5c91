//! CAN reward accrual.
//!
//! Each market side keeps an index of rewards per unit of supply (or of
//! normalized borrows), advanced by `speed * blocks_elapsed / total`. An
//! account earns `balance * (market_index - account_index)` since its last
//! snapshot.

use soroban_sdk::{log, token, Address, Env, U256};

use crate::constants::{CAN_INITIAL_INDEX, EXP_SCALE};
use crate::events::{DistributedBorrowerCan, DistributedSupplierCan};
use crate::exp::{fraction_double, max_index, mul_double, narrow, wide};
use crate::market::MarketReader;
use crate::storage::{self, CanMarketState};

fn advance(env: &Env, state: &CanMarketState, speed: u128, total: u128) -> CanMarketState {
    let block = env.ledger().sequence();
    let delta_blocks = block.saturating_sub(state.block);
    if delta_blocks == 0 {
        return state.clone();
    }
    let mut index = state.index.clone();
    if speed > 0 && total > 0 {
        let accrued = wide(env, speed).mul(&U256::from_u32(env, delta_blocks));
        let ratio = fraction_double(env, &accrued, &wide(env, total));
        index = index.add(&ratio);
        if index > max_index(env) {
            panic!("new index exceeds 224 bits");
        }
    }
    CanMarketState { index, block }
}

/// Borrows divided by the market's borrow index, so interest accrued since
/// the last snapshot does not earn rewards twice.
fn normalize_borrows(env: &Env, amount: u128, borrow_index: u128) -> u128 {
    if borrow_index == 0 {
        return 0;
    }
    let scaled = wide(env, amount)
        .mul(&wide(env, EXP_SCALE))
        .div(&wide(env, borrow_index));
    narrow(&scaled, "borrow amount overflow")
}

pub fn update_can_supply_index(env: &Env, reader: &MarketReader) {
    let state = storage::get_supply_state(env, &reader.market);
    let speed = storage::get_can_speed(env, &reader.market);
    let total = if speed > 0 { reader.total_supply() } else { 0 };
    let next = advance(env, &state, speed, total);
    if next != state {
        storage::set_supply_state(env, &reader.market, &next);
    }
}

pub fn update_can_borrow_index(env: &Env, reader: &MarketReader) {
    let state = storage::get_borrow_state(env, &reader.market);
    let speed = storage::get_can_speed(env, &reader.market);
    let total = if speed > 0 {
        normalize_borrows(env, reader.total_borrows(), reader.borrow_index())
    } else {
        0
    };
    let next = advance(env, &state, speed, total);
    if next != state {
        storage::set_borrow_state(env, &reader.market, &next);
    }
}

// Returns the reward owed for moving an account from `account_index` to
// `market_index` on `balance`. A zero account index counts as the initial one.
fn account_delta(env: &Env, market_index: &U256, account_index: &U256, balance: u128) -> u128 {
    let zero = U256::from_u32(env, 0);
    let from = if *account_index == zero && *market_index > zero {
        wide(env, CAN_INITIAL_INDEX)
    } else {
        account_index.clone()
    };
    if *market_index <= from {
        return 0;
    }
    let delta_index = market_index.sub(&from);
    narrow(&mul_double(env, &wide(env, balance), &delta_index), "reward overflow")
}

fn add_accrued(env: &Env, account: &Address, delta: u128) {
    if delta == 0 {
        return;
    }
    let accrued = storage::get_can_accrued(env, account)
        .checked_add(delta)
        .unwrap_or_else(|| panic!("reward overflow"));
    storage::set_can_accrued(env, account, accrued);
}

pub fn distribute_supplier_can(env: &Env, reader: &MarketReader, supplier: &Address) {
    let state = storage::get_supply_state(env, &reader.market);
    let account_index = storage::get_supplier_index(env, &reader.market, supplier);
    storage::set_supplier_index(env, &reader.market, supplier, &state.index);

    let tokens = reader.tokens(supplier);
    let delta = account_delta(env, &state.index, &account_index, tokens);
    add_accrued(env, supplier, delta);
    DistributedSupplierCan {
        market: reader.market.clone(),
        supplier: supplier.clone(),
        delta,
        supply_index: state.index,
    }
    .publish(env);
}

pub fn distribute_borrower_can(env: &Env, reader: &MarketReader, borrower: &Address) {
    let state = storage::get_borrow_state(env, &reader.market);
    let account_index = storage::get_borrower_index(env, &reader.market, borrower);
    storage::set_borrower_index(env, &reader.market, borrower, &state.index);

    let borrows = normalize_borrows(env, reader.borrows(borrower), reader.borrow_index());
    let delta = account_delta(env, &state.index, &account_index, borrows);
    add_accrued(env, borrower, delta);
    DistributedBorrowerCan {
        market: reader.market.clone(),
        borrower: borrower.clone(),
        delta,
        borrow_index: state.index,
    }
    .publish(env);
}

/// Pays up to `amount` from the troller's own reward balance. Returns what
/// could not be paid: zero on success, `amount` when the balance is short or
/// no reward token is configured.
pub fn grant_can_internal(env: &Env, recipient: &Address, amount: u128) -> u128 {
    if amount == 0 {
        return 0;
    }
    let Some(can) = storage::get_can_token(env) else {
        return amount;
    };
    let Ok(value) = i128::try_from(amount) else {
        return amount;
    };
    let client = token::Client::new(env, &can);
    let this = env.current_contract_address();
    if client.balance(&this) < value {
        log!(env, "insufficient reward balance", recipient, amount);
        return amount;
    }
    client.transfer(&this, recipient, &value);
    0
}
