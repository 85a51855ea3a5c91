use soroban_sdk::{contracttype, Address, Env, Vec, U256};

use crate::constants::{
    CAN_INITIAL_INDEX, DEFAULT_CLOSE_FACTOR, DEFAULT_LIQUIDATION_INCENTIVE, DEFAULT_MAX_ASSETS,
    TTL_EXTEND_TO, TTL_THRESHOLD,
};

#[contracttype]
pub enum DataKey {
    Admin,
    Initialized,
    Oracle,                      // Address
    CloseFactor,                 // u128 mantissa
    LiquidationIncentive,        // u128 mantissa
    MaxAssets,                   // u32
    PauseGuardian,               // Address (optional)
    BorrowCapGuardian,           // Address (optional)
    CanToken,                    // Address (optional)
    AllMarkets,                  // Vec<Address>
    GlobalPaused(Action),        // bool
    Market(Address),             // Market
    MarketPaused(Address, Action),
    BorrowCap(Address),          // u128, 0 = unlimited
    Membership(Address, Address), // (market, account) -> bool
    AccountAssets(Address),      // Vec<Address>
    // Rewards
    CanSpeed(Address),
    SupplyState(Address),
    BorrowState(Address),
    SupplierIndex(Address, Address), // (market, account)
    BorrowerIndex(Address, Address), // (market, account)
    CanAccrued(Address),
}

/// Risk-increasing actions a guardian can pause.
#[contracttype]
#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub enum Action {
    Mint,
    Borrow,
    Transfer,
    Seize,
}

#[contracttype]
#[derive(Clone, Debug, Default, Eq, PartialEq)]
pub struct Market {
    pub is_listed: bool,
    pub collateral_factor_mantissa: u128,
    pub is_rewarded: bool,
}

/// Reward index of one side of a market and the ledger sequence it was
/// last advanced at.
#[contracttype]
#[derive(Clone, Debug, Eq, PartialEq)]
pub struct CanMarketState {
    pub index: U256,
    pub block: u32,
}

/// Balances a market reports about one account.
#[contracttype]
#[derive(Clone, Debug, Eq, PartialEq)]
pub struct AccountSnapshot {
    pub account: Address,
    pub tokens: u128,
    pub borrows: u128,
}

/// Market state handed to a policy hook by the market calling it, so the
/// troller does not have to call back into a contract already on the stack.
#[contracttype]
#[derive(Clone, Debug, Eq, PartialEq)]
pub struct MarketHint {
    pub total_supply: u128,
    pub total_borrows: u128,
    pub borrow_index: u128,
    pub exchange_rate: u128,
    pub accounts: Vec<AccountSnapshot>,
}

pub fn bump_core_ttl(env: &Env) {
    env.storage()
        .instance()
        .extend_ttl(TTL_THRESHOLD, TTL_EXTEND_TO);
}

fn read_persistent<V>(env: &Env, key: &DataKey) -> Option<V>
where
    V: soroban_sdk::TryFromVal<Env, soroban_sdk::Val>,
{
    let persistent = env.storage().persistent();
    let value = persistent.get::<DataKey, V>(key);
    if value.is_some() {
        persistent.extend_ttl(key, TTL_THRESHOLD, TTL_EXTEND_TO);
    }
    value
}

fn write_persistent<V>(env: &Env, key: &DataKey, value: &V)
where
    V: soroban_sdk::IntoVal<Env, soroban_sdk::Val>,
{
    let persistent = env.storage().persistent();
    persistent.set(key, value);
    persistent.extend_ttl(key, TTL_THRESHOLD, TTL_EXTEND_TO);
}

pub fn is_initialized(env: &Env) -> bool {
    env.storage().instance().has(&DataKey::Initialized)
}

pub fn set_initialized(env: &Env) {
    env.storage().instance().set(&DataKey::Initialized, &true);
}

pub fn get_admin(env: &Env) -> Address {
    env.storage()
        .instance()
        .get(&DataKey::Admin)
        .expect("admin not set")
}

pub fn set_admin(env: &Env, admin: &Address) {
    env.storage().instance().set(&DataKey::Admin, admin);
}

pub fn require_admin(env: &Env) -> Address {
    let admin = get_admin(env);
    bump_core_ttl(env);
    admin.require_auth();
    admin
}

pub fn get_oracle(env: &Env) -> Address {
    env.storage()
        .instance()
        .get(&DataKey::Oracle)
        .expect("oracle not set")
}

pub fn set_oracle(env: &Env, oracle: &Address) {
    env.storage().instance().set(&DataKey::Oracle, oracle);
}

pub fn get_close_factor(env: &Env) -> u128 {
    env.storage()
        .instance()
        .get(&DataKey::CloseFactor)
        .unwrap_or(DEFAULT_CLOSE_FACTOR)
}

pub fn set_close_factor(env: &Env, mantissa: u128) {
    env.storage().instance().set(&DataKey::CloseFactor, &mantissa);
}

pub fn get_liquidation_incentive(env: &Env) -> u128 {
    env.storage()
        .instance()
        .get(&DataKey::LiquidationIncentive)
        .unwrap_or(DEFAULT_LIQUIDATION_INCENTIVE)
}

pub fn set_liquidation_incentive(env: &Env, mantissa: u128) {
    env.storage()
        .instance()
        .set(&DataKey::LiquidationIncentive, &mantissa);
}

pub fn get_max_assets(env: &Env) -> u32 {
    env.storage()
        .instance()
        .get(&DataKey::MaxAssets)
        .unwrap_or(DEFAULT_MAX_ASSETS)
}

pub fn set_max_assets(env: &Env, max: u32) {
    env.storage().instance().set(&DataKey::MaxAssets, &max);
}

pub fn get_pause_guardian(env: &Env) -> Option<Address> {
    env.storage().instance().get(&DataKey::PauseGuardian)
}

pub fn set_pause_guardian(env: &Env, guardian: &Address) {
    env.storage()
        .instance()
        .set(&DataKey::PauseGuardian, guardian);
}

pub fn get_borrow_cap_guardian(env: &Env) -> Option<Address> {
    env.storage().instance().get(&DataKey::BorrowCapGuardian)
}

pub fn set_borrow_cap_guardian(env: &Env, guardian: &Address) {
    env.storage()
        .instance()
        .set(&DataKey::BorrowCapGuardian, guardian);
}

pub fn get_can_token(env: &Env) -> Option<Address> {
    env.storage().instance().get(&DataKey::CanToken)
}

pub fn set_can_token(env: &Env, token: &Address) {
    env.storage().instance().set(&DataKey::CanToken, token);
}

pub fn get_all_markets(env: &Env) -> Vec<Address> {
    env.storage()
        .instance()
        .get(&DataKey::AllMarkets)
        .unwrap_or(Vec::new(env))
}

pub fn set_all_markets(env: &Env, markets: &Vec<Address>) {
    env.storage().instance().set(&DataKey::AllMarkets, markets);
}

pub fn is_global_paused(env: &Env, action: Action) -> bool {
    env.storage()
        .instance()
        .get(&DataKey::GlobalPaused(action))
        .unwrap_or(false)
}

pub fn set_global_paused(env: &Env, action: Action, paused: bool) {
    env.storage()
        .instance()
        .set(&DataKey::GlobalPaused(action), &paused);
}

pub fn get_market(env: &Env, market: &Address) -> Market {
    read_persistent(env, &DataKey::Market(market.clone())).unwrap_or_default()
}

pub fn set_market(env: &Env, market: &Address, record: &Market) {
    write_persistent(env, &DataKey::Market(market.clone()), record);
}

pub fn is_market_paused(env: &Env, market: &Address, action: Action) -> bool {
    read_persistent(env, &DataKey::MarketPaused(market.clone(), action)).unwrap_or(false)
}

pub fn set_market_paused(env: &Env, market: &Address, action: Action, paused: bool) {
    write_persistent(env, &DataKey::MarketPaused(market.clone(), action), &paused);
}

pub fn get_borrow_cap(env: &Env, market: &Address) -> u128 {
    read_persistent(env, &DataKey::BorrowCap(market.clone())).unwrap_or(0)
}

pub fn set_borrow_cap(env: &Env, market: &Address, cap: u128) {
    write_persistent(env, &DataKey::BorrowCap(market.clone()), &cap);
}

pub fn is_member(env: &Env, market: &Address, account: &Address) -> bool {
    read_persistent(env, &DataKey::Membership(market.clone(), account.clone())).unwrap_or(false)
}

pub fn set_member(env: &Env, market: &Address, account: &Address, member: bool) {
    let key = DataKey::Membership(market.clone(), account.clone());
    if member {
        write_persistent(env, &key, &true);
    } else {
        env.storage().persistent().remove(&key);
    }
}

pub fn get_account_assets(env: &Env, account: &Address) -> Vec<Address> {
    read_persistent(env, &DataKey::AccountAssets(account.clone())).unwrap_or(Vec::new(env))
}

pub fn set_account_assets(env: &Env, account: &Address, assets: &Vec<Address>) {
    write_persistent(env, &DataKey::AccountAssets(account.clone()), assets);
}

pub fn get_can_speed(env: &Env, market: &Address) -> u128 {
    read_persistent(env, &DataKey::CanSpeed(market.clone())).unwrap_or(0)
}

pub fn set_can_speed(env: &Env, market: &Address, speed: u128) {
    write_persistent(env, &DataKey::CanSpeed(market.clone()), &speed);
}

fn initial_state(env: &Env) -> CanMarketState {
    CanMarketState {
        index: U256::from_u128(env, CAN_INITIAL_INDEX),
        block: env.ledger().sequence(),
    }
}

pub fn get_supply_state(env: &Env, market: &Address) -> CanMarketState {
    read_persistent(env, &DataKey::SupplyState(market.clone()))
        .unwrap_or_else(|| initial_state(env))
}

pub fn set_supply_state(env: &Env, market: &Address, state: &CanMarketState) {
    write_persistent(env, &DataKey::SupplyState(market.clone()), state);
}

pub fn get_borrow_state(env: &Env, market: &Address) -> CanMarketState {
    read_persistent(env, &DataKey::BorrowState(market.clone()))
        .unwrap_or_else(|| initial_state(env))
}

pub fn set_borrow_state(env: &Env, market: &Address, state: &CanMarketState) {
    write_persistent(env, &DataKey::BorrowState(market.clone()), state);
}

/// Zero when the account has never been snapshotted in this market.
pub fn get_supplier_index(env: &Env, market: &Address, account: &Address) -> U256 {
    read_persistent(env, &DataKey::SupplierIndex(market.clone(), account.clone()))
        .unwrap_or(U256::from_u32(env, 0))
}

pub fn set_supplier_index(env: &Env, market: &Address, account: &Address, index: &U256) {
    write_persistent(
        env,
        &DataKey::SupplierIndex(market.clone(), account.clone()),
        index,
    );
}

pub fn get_borrower_index(env: &Env, market: &Address, account: &Address) -> U256 {
    read_persistent(env, &DataKey::BorrowerIndex(market.clone(), account.clone()))
        .unwrap_or(U256::from_u32(env, 0))
}

pub fn set_borrower_index(env: &Env, market: &Address, account: &Address, index: &U256) {
    write_persistent(
        env,
        &DataKey::BorrowerIndex(market.clone(), account.clone()),
        index,
    );
}

pub fn get_can_accrued(env: &Env, account: &Address) -> u128 {
    read_persistent(env, &DataKey::CanAccrued(account.clone())).unwrap_or(0)
}

pub fn set_can_accrued(env: &Env, account: &Address, amount: u128) {
    write_persistent(env, &DataKey::CanAccrued(account.clone()), &amount);
}
