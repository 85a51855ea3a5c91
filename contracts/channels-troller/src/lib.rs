#![no_std]
use soroban_sdk::{contract, contractimpl, log, Address, Env, Vec, U256};

mod constants;
mod events;
mod exp;
pub mod market;
mod policies;
mod rewards;
mod storage;

pub use storage::{AccountSnapshot, Action, CanMarketState, Market, MarketHint};

use crate::constants::{
    CLOSE_FACTOR_MAX, CLOSE_FACTOR_MIN, COLLATERAL_FACTOR_MAX, LIQUIDATION_INCENTIVE_MAX,
    LIQUIDATION_INCENTIVE_MIN,
};
use crate::events::{
    ActionPaused, AdminUpdated, CanGranted, CanSpeedUpdated, CanTokenSet, MarketActionPaused,
    MarketEntered, MarketExited, MarketListed, NewBorrowCap, NewBorrowCapGuardian,
    NewCloseFactor, NewCollateralFactor, NewLiquidationIncentive, NewMaxAssets, NewPauseGuardian,
    NewPriceOracle,
};
use crate::market::{underlying_price, MarketClient, MarketReader};
use crate::policies::{hypothetical_liquidity, redeem_shortfall, seize_tokens, Hypothetical};
use crate::rewards::{
    distribute_borrower_can, distribute_supplier_can, grant_can_internal,
    update_can_borrow_index, update_can_supply_index,
};

/// Risk registry for a set of lending markets: listing, membership,
/// collateral requirements, guardian pauses and CAN reward accrual.
///
/// Markets consult the policy hooks before every state change; a hook that
/// rejects the action panics with the reason.
#[contract]
pub struct ChannelsTroller;

#[contractimpl]
impl ChannelsTroller {
    pub fn initialize(env: Env, admin: Address) {
        if storage::is_initialized(&env) {
            panic!("already initialized");
        }
        admin.require_auth();
        storage::set_admin(&env, &admin);
        storage::set_close_factor(&env, constants::DEFAULT_CLOSE_FACTOR);
        storage::set_liquidation_incentive(&env, constants::DEFAULT_LIQUIDATION_INCENTIVE);
        storage::set_max_assets(&env, constants::DEFAULT_MAX_ASSETS);
        storage::set_initialized(&env);
        storage::bump_core_ttl(&env);
    }

    // Admin

    pub fn set_admin(env: Env, new_admin: Address) {
        storage::require_admin(&env);
        storage::set_admin(&env, &new_admin);
        AdminUpdated { admin: new_admin }.publish(&env);
    }

    pub fn set_price_oracle(env: Env, oracle: Address) {
        storage::require_admin(&env);
        storage::set_oracle(&env, &oracle);
        NewPriceOracle { oracle }.publish(&env);
    }

    pub fn set_close_factor(env: Env, close_factor_mantissa: u128) {
        storage::require_admin(&env);
        if !(CLOSE_FACTOR_MIN..=CLOSE_FACTOR_MAX).contains(&close_factor_mantissa) {
            panic!("invalid close factor");
        }
        let old_mantissa = storage::get_close_factor(&env);
        storage::set_close_factor(&env, close_factor_mantissa);
        NewCloseFactor {
            old_mantissa,
            new_mantissa: close_factor_mantissa,
        }
        .publish(&env);
    }

    pub fn set_liquidation_incentive(env: Env, incentive_mantissa: u128) {
        storage::require_admin(&env);
        if !(LIQUIDATION_INCENTIVE_MIN..=LIQUIDATION_INCENTIVE_MAX).contains(&incentive_mantissa) {
            panic!("invalid liquidation incentive");
        }
        let old_mantissa = storage::get_liquidation_incentive(&env);
        storage::set_liquidation_incentive(&env, incentive_mantissa);
        NewLiquidationIncentive {
            old_mantissa,
            new_mantissa: incentive_mantissa,
        }
        .publish(&env);
    }

    pub fn set_max_assets(env: Env, max_assets: u32) {
        storage::require_admin(&env);
        if max_assets == 0 {
            panic!("invalid max assets");
        }
        let old_max = storage::get_max_assets(&env);
        storage::set_max_assets(&env, max_assets);
        NewMaxAssets {
            old_max,
            new_max: max_assets,
        }
        .publish(&env);
    }

    pub fn support_market(env: Env, market: Address) {
        storage::require_admin(&env);
        let mut record = storage::get_market(&env, &market);
        if record.is_listed {
            panic!("market already listed");
        }
        if !MarketClient::new(&env, &market).is_ctoken() {
            panic!("not a market");
        }
        record.is_listed = true;
        storage::set_market(&env, &market, &record);

        let initial = CanMarketState {
            index: U256::from_u128(&env, constants::CAN_INITIAL_INDEX),
            block: env.ledger().sequence(),
        };
        storage::set_supply_state(&env, &market, &initial);
        storage::set_borrow_state(&env, &market, &initial);

        let mut all = storage::get_all_markets(&env);
        all.push_back(market.clone());
        storage::set_all_markets(&env, &all);
        MarketListed { market }.publish(&env);
    }

    pub fn set_collateral_factor(env: Env, market: Address, collateral_factor_mantissa: u128) {
        storage::require_admin(&env);
        let mut record = require_listed(&env, &market);
        if collateral_factor_mantissa > COLLATERAL_FACTOR_MAX {
            panic!("invalid collateral factor");
        }
        if collateral_factor_mantissa != 0
            && underlying_price(&env, &storage::get_oracle(&env), &market) == 0
        {
            panic!("price error");
        }
        let old_mantissa = record.collateral_factor_mantissa;
        record.collateral_factor_mantissa = collateral_factor_mantissa;
        storage::set_market(&env, &market, &record);
        NewCollateralFactor {
            market,
            old_mantissa,
            new_mantissa: collateral_factor_mantissa,
        }
        .publish(&env);
    }

    pub fn set_pause_guardian(env: Env, guardian: Address) {
        storage::require_admin(&env);
        storage::set_pause_guardian(&env, &guardian);
        NewPauseGuardian { guardian }.publish(&env);
    }

    pub fn set_borrow_cap_guardian(env: Env, guardian: Address) {
        storage::require_admin(&env);
        storage::set_borrow_cap_guardian(&env, &guardian);
        NewBorrowCapGuardian { guardian }.publish(&env);
    }

    pub fn set_can_token(env: Env, token: Address) {
        storage::require_admin(&env);
        storage::set_can_token(&env, &token);
        CanTokenSet { token }.publish(&env);
    }

    /// Sets the per-block CAN emission for both sides of `market`. Indices are
    /// brought up to date at the old speed first.
    pub fn set_can_speed(env: Env, market: Address, speed: u128) {
        storage::require_admin(&env);
        let mut record = require_listed(&env, &market);
        let reader = MarketReader::new(&env, &market, None);
        update_can_supply_index(&env, &reader);
        update_can_borrow_index(&env, &reader);

        storage::set_can_speed(&env, &market, speed);
        record.is_rewarded = speed > 0;
        storage::set_market(&env, &market, &record);
        CanSpeedUpdated { market, speed }.publish(&env);
    }

    /// Transfers `amount` CAN from the troller to `recipient`.
    pub fn grant_can(env: Env, recipient: Address, amount: u128) {
        storage::require_admin(&env);
        if grant_can_internal(&env, &recipient, amount) != 0 {
            panic!("insufficient can for grant");
        }
        CanGranted { recipient, amount }.publish(&env);
    }

    // Guardians

    /// Pauses or unpauses minting or borrowing in a single market.
    pub fn set_market_paused(env: Env, caller: Address, market: Address, action: Action, paused: bool) {
        require_pause_authority(&env, &caller, paused);
        if !matches!(action, Action::Mint | Action::Borrow) {
            panic!("only mint and borrow can be paused per market");
        }
        require_listed(&env, &market);
        storage::set_market_paused(&env, &market, action, paused);
        MarketActionPaused {
            market,
            action,
            paused,
        }
        .publish(&env);
    }

    pub fn set_global_paused(env: Env, caller: Address, action: Action, paused: bool) {
        require_pause_authority(&env, &caller, paused);
        storage::set_global_paused(&env, action, paused);
        ActionPaused { action, paused }.publish(&env);
    }

    /// Sets borrow caps; a cap of zero removes the limit.
    pub fn set_market_borrow_caps(env: Env, caller: Address, markets: Vec<Address>, caps: Vec<u128>) {
        caller.require_auth();
        if caller != storage::get_admin(&env)
            && storage::get_borrow_cap_guardian(&env).as_ref() != Some(&caller)
        {
            panic!("only admin or borrow cap guardian can set borrow caps");
        }
        if markets.len() != caps.len() {
            panic!("invalid input");
        }
        for (market, cap) in markets.iter().zip(caps.iter()) {
            storage::set_borrow_cap(&env, &market, cap);
            NewBorrowCap { market, cap }.publish(&env);
        }
    }

    // Membership

    pub fn enter_markets(env: Env, account: Address, markets: Vec<Address>) {
        account.require_auth();
        for market in markets.iter() {
            add_to_market(&env, &market, &account);
        }
    }

    /// Removes `market` from the account's collateral set. Fails while the
    /// account borrows from it or needs its tokens as collateral.
    pub fn exit_market(env: Env, account: Address, market: Address) {
        account.require_auth();
        let reader = MarketReader::new(&env, &market, None);
        if reader.borrows(&account) != 0 {
            panic!("nonzero borrow balance");
        }
        if !storage::is_member(&env, &market, &account) {
            return;
        }
        let tokens = reader.tokens(&account);
        if redeem_shortfall(&env, &reader, &account, tokens) > 0 {
            panic!("exit market rejected");
        }

        storage::set_member(&env, &market, &account, false);
        let mut assets = storage::get_account_assets(&env, &account);
        if let Some(i) = assets.first_index_of(&market) {
            assets.remove(i);
        }
        storage::set_account_assets(&env, &account, &assets);
        MarketExited { market, account }.publish(&env);
    }

    // Policy hooks

    pub fn mint_allowed(env: Env, market: Address, minter: Address, hint: Option<MarketHint>) {
        require_not_paused(&env, Some(&market), Action::Mint, "mint is paused");
        require_listed(&env, &market);
        let reader = hinted_reader(&env, &market, hint);
        update_can_supply_index(&env, &reader);
        distribute_supplier_can(&env, &reader, &minter);
    }

    pub fn redeem_allowed(
        env: Env,
        market: Address,
        redeemer: Address,
        redeem_tokens: u128,
        hint: Option<MarketHint>,
    ) {
        require_listed(&env, &market);
        let reader = hinted_reader(&env, &market, hint);
        if redeem_shortfall(&env, &reader, &redeemer, redeem_tokens) > 0 {
            panic!("insufficient liquidity");
        }
        update_can_supply_index(&env, &reader);
        distribute_supplier_can(&env, &reader, &redeemer);
    }

    pub fn redeem_verify(env: Env, market: Address, redeemer: Address, redeem_amount: u128, redeem_tokens: u128) {
        if redeem_tokens == 0 && redeem_amount > 0 {
            log!(&env, "redeem of zero tokens", market, redeemer);
            panic!("redeem tokens zero");
        }
    }

    /// Checks a borrow and enters the market for the borrower if needed. Only
    /// the market itself may enter a borrower on their behalf.
    pub fn borrow_allowed(
        env: Env,
        market: Address,
        borrower: Address,
        borrow_amount: u128,
        hint: Option<MarketHint>,
    ) {
        require_not_paused(&env, Some(&market), Action::Borrow, "borrow is paused");
        require_listed(&env, &market);
        let hinted = hint.is_some();
        let reader = hinted_reader(&env, &market, hint);

        if !storage::is_member(&env, &market, &borrower) {
            if !hinted {
                market.require_auth();
            }
            add_to_market(&env, &market, &borrower);
        }

        let oracle = storage::get_oracle(&env);
        if underlying_price(&env, &oracle, &market) == 0 {
            panic!("price error");
        }

        let cap = storage::get_borrow_cap(&env, &market);
        if cap != 0 {
            let next_total = reader
                .total_borrows()
                .checked_add(borrow_amount)
                .unwrap_or_else(|| panic!("addition overflow"));
            if next_total >= cap {
                panic!("market borrow cap reached");
            }
        }

        let (_, shortfall) = hypothetical_liquidity(
            &env,
            &borrower,
            Some(Hypothetical {
                market: &market,
                redeem_tokens: 0,
                borrow_amount,
            }),
            Some(&reader),
        );
        if shortfall > 0 {
            panic!("insufficient liquidity");
        }

        update_can_borrow_index(&env, &reader);
        distribute_borrower_can(&env, &reader, &borrower);
    }

    pub fn repay_borrow_allowed(env: Env, market: Address, borrower: Address, hint: Option<MarketHint>) {
        require_listed(&env, &market);
        let reader = hinted_reader(&env, &market, hint);
        update_can_borrow_index(&env, &reader);
        distribute_borrower_can(&env, &reader, &borrower);
    }

    /// `hint` describes `market_borrowed`, the market running the liquidation.
    pub fn liquidate_borrow_allowed(
        env: Env,
        market_borrowed: Address,
        market_collateral: Address,
        borrower: Address,
        repay_amount: u128,
        hint: Option<MarketHint>,
    ) {
        require_listed(&env, &market_borrowed);
        require_listed(&env, &market_collateral);
        let reader = hinted_reader(&env, &market_borrowed, hint);

        let (_, shortfall) = hypothetical_liquidity(&env, &borrower, None, Some(&reader));
        if shortfall == 0 {
            panic!("insufficient shortfall");
        }

        let borrow_balance = reader.borrows(&borrower);
        let max_close = exp::narrow(
            &exp::mul_exp(
                &env,
                &exp::wide(&env, storage::get_close_factor(&env)),
                &exp::wide(&env, borrow_balance),
            ),
            "liquidity overflow",
        );
        if repay_amount > max_close {
            panic!("too much repay");
        }
    }

    /// `hint` describes `market_collateral`, the market being seized from.
    pub fn seize_allowed(
        env: Env,
        market_collateral: Address,
        market_borrowed: Address,
        liquidator: Address,
        borrower: Address,
        hint: Option<MarketHint>,
    ) {
        require_not_paused(&env, None, Action::Seize, "seize is paused");
        require_listed(&env, &market_collateral);
        require_listed(&env, &market_borrowed);
        let reader = hinted_reader(&env, &market_collateral, hint);
        update_can_supply_index(&env, &reader);
        distribute_supplier_can(&env, &reader, &borrower);
        distribute_supplier_can(&env, &reader, &liquidator);
    }

    pub fn transfer_allowed(
        env: Env,
        market: Address,
        src: Address,
        dst: Address,
        transfer_tokens: u128,
        hint: Option<MarketHint>,
    ) {
        require_not_paused(&env, None, Action::Transfer, "transfer is paused");
        require_listed(&env, &market);
        let reader = hinted_reader(&env, &market, hint);
        if redeem_shortfall(&env, &reader, &src, transfer_tokens) > 0 {
            panic!("insufficient liquidity");
        }
        update_can_supply_index(&env, &reader);
        distribute_supplier_can(&env, &reader, &src);
        distribute_supplier_can(&env, &reader, &dst);
    }

    pub fn liquidate_calculate_seize_tokens(
        env: Env,
        market_borrowed: Address,
        market_collateral: Address,
        actual_repay_amount: u128,
    ) -> u128 {
        require_listed(&env, &market_borrowed);
        require_listed(&env, &market_collateral);
        let oracle = storage::get_oracle(&env);
        let price_borrowed = underlying_price(&env, &oracle, &market_borrowed);
        let price_collateral = underlying_price(&env, &oracle, &market_collateral);
        let exchange_rate = MarketClient::new(&env, &market_collateral).exchange_rate_stored();
        seize_tokens(
            &env,
            price_borrowed,
            price_collateral,
            exchange_rate,
            actual_repay_amount,
        )
    }

    /// `(liquidity, shortfall)` of `account` across its entered markets.
    pub fn get_account_liquidity(env: Env, account: Address) -> (u128, u128) {
        hypothetical_liquidity(&env, &account, None, None)
    }

    pub fn get_hypothetical_account_liquidity(
        env: Env,
        account: Address,
        market_modify: Address,
        redeem_tokens: u128,
        borrow_amount: u128,
    ) -> (u128, u128) {
        require_listed(&env, &market_modify);
        hypothetical_liquidity(
            &env,
            &account,
            Some(Hypothetical {
                market: &market_modify,
                redeem_tokens,
                borrow_amount,
            }),
            None,
        )
    }

    // Rewards

    pub fn claim_can(env: Env, holder: Address) {
        let holders = Vec::from_array(&env, [holder]);
        let markets = storage::get_all_markets(&env);
        Self::claim_can_in(env, holders, markets, true, true);
    }

    /// Accrues CAN for `holders` in `markets` and pays out what the troller's
    /// balance covers. Unpaid rewards stay accrued.
    pub fn claim_can_in(
        env: Env,
        holders: Vec<Address>,
        markets: Vec<Address>,
        borrowers: bool,
        suppliers: bool,
    ) {
        for market in markets.iter() {
            require_listed(&env, &market);
            let reader = MarketReader::new(&env, &market, None);
            if borrowers {
                update_can_borrow_index(&env, &reader);
                for holder in holders.iter() {
                    distribute_borrower_can(&env, &reader, &holder);
                }
            }
            if suppliers {
                update_can_supply_index(&env, &reader);
                for holder in holders.iter() {
                    distribute_supplier_can(&env, &reader, &holder);
                }
            }
        }
        for holder in holders.iter() {
            let accrued = storage::get_can_accrued(&env, &holder);
            let remaining = grant_can_internal(&env, &holder, accrued);
            storage::set_can_accrued(&env, &holder, remaining);
        }
    }

    // Views

    pub fn markets(env: Env, market: Address) -> Market {
        storage::get_market(&env, &market)
    }

    pub fn check_membership(env: Env, account: Address, market: Address) -> bool {
        storage::is_member(&env, &market, &account)
    }

    pub fn get_assets_in(env: Env, account: Address) -> Vec<Address> {
        storage::get_account_assets(&env, &account)
    }

    pub fn get_all_markets(env: Env) -> Vec<Address> {
        storage::get_all_markets(&env)
    }

    pub fn oracle(env: Env) -> Address {
        storage::get_oracle(&env)
    }

    pub fn close_factor(env: Env) -> u128 {
        storage::get_close_factor(&env)
    }

    pub fn liquidation_incentive(env: Env) -> u128 {
        storage::get_liquidation_incentive(&env)
    }

    pub fn max_assets(env: Env) -> u32 {
        storage::get_max_assets(&env)
    }

    pub fn is_global_paused(env: Env, action: Action) -> bool {
        storage::is_global_paused(&env, action)
    }

    pub fn is_market_paused(env: Env, market: Address, action: Action) -> bool {
        storage::is_market_paused(&env, &market, action)
    }

    pub fn borrow_cap(env: Env, market: Address) -> u128 {
        storage::get_borrow_cap(&env, &market)
    }

    pub fn can_speed(env: Env, market: Address) -> u128 {
        storage::get_can_speed(&env, &market)
    }

    pub fn can_supply_state(env: Env, market: Address) -> CanMarketState {
        storage::get_supply_state(&env, &market)
    }

    pub fn can_borrow_state(env: Env, market: Address) -> CanMarketState {
        storage::get_borrow_state(&env, &market)
    }

    pub fn can_accrued(env: Env, holder: Address) -> u128 {
        storage::get_can_accrued(&env, &holder)
    }

    pub fn can_supplier_index(env: Env, market: Address, holder: Address) -> U256 {
        storage::get_supplier_index(&env, &market, &holder)
    }

    pub fn can_borrower_index(env: Env, market: Address, holder: Address) -> U256 {
        storage::get_borrower_index(&env, &market, &holder)
    }

    pub fn pause_guardian(env: Env) -> Option<Address> {
        storage::get_pause_guardian(&env)
    }

    pub fn borrow_cap_guardian(env: Env) -> Option<Address> {
        storage::get_borrow_cap_guardian(&env)
    }

    pub fn get_admin(env: Env) -> Address {
        storage::get_admin(&env)
    }
}

fn require_listed(env: &Env, market: &Address) -> Market {
    let record = storage::get_market(env, market);
    if !record.is_listed {
        panic!("market not listed");
    }
    record
}

fn require_not_paused(env: &Env, market: Option<&Address>, action: Action, reason: &str) {
    let paused = storage::is_global_paused(env, action)
        || market.is_some_and(|m| storage::is_market_paused(env, m, action));
    if paused {
        panic!("{}", reason);
    }
}

// Admin may pause and unpause; the pause guardian may only pause.
fn require_pause_authority(env: &Env, caller: &Address, paused: bool) {
    caller.require_auth();
    if *caller == storage::get_admin(env) {
        return;
    }
    if storage::get_pause_guardian(env).as_ref() != Some(caller) {
        panic!("only pause guardian and admin can pause");
    }
    if !paused {
        panic!("only admin can unpause");
    }
}

// A hint is trusted only from the market it describes.
fn hinted_reader<'a>(env: &'a Env, market: &Address, hint: Option<MarketHint>) -> MarketReader<'a> {
    if hint.is_some() {
        market.require_auth();
    }
    MarketReader::new(env, market, hint)
}

fn add_to_market(env: &Env, market: &Address, account: &Address) {
    require_listed(env, market);
    if storage::is_member(env, market, account) {
        return;
    }
    let mut assets = storage::get_account_assets(env, account);
    if assets.len() >= storage::get_max_assets(env) {
        panic!("too many assets");
    }
    assets.push_back(market.clone());
    storage::set_account_assets(env, account, &assets);
    storage::set_member(env, market, account, true);
    MarketEntered {
        market: market.clone(),
        account: account.clone(),
    }
    .publish(env);
}
