use soroban_sdk::{contracttype, Address, BytesN, Env, Vec};

use crate::config::TokenConfig;
use crate::constants::{TTL_EXTEND_TO, TTL_THRESHOLD};
use crate::GuardPolicy;

#[contracttype]
pub enum DataKey {
    Initialized,
    Admin,
    Settings,
    Bounds,
    ReporterInvalidated,
    Configs,
    Config(BytesN<32>),     // symbol hash
    MarketSymbol(Address),  // market -> symbol hash
    Price(BytesN<32>),      // symbol hash
}

/// Addresses and policy fixed at initialization. Only the guard policy can
/// change afterwards.
#[contracttype]
#[derive(Clone, Debug, Eq, PartialEq)]
pub struct Settings {
    pub reporter: Address,
    pub reporter_key: BytesN<32>,
    pub price_data: Address,
    pub anchor_source: Address,
    pub fee_token: Address,
    pub guard_policy: GuardPolicy,
}

#[contracttype]
#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub struct AnchorBounds {
    pub upper: u128,
    pub lower: u128,
}

pub fn bump_instance(env: &Env) {
    env.storage()
        .instance()
        .extend_ttl(TTL_THRESHOLD, TTL_EXTEND_TO);
}

fn bump_persistent(env: &Env, key: &DataKey) {
    env.storage()
        .persistent()
        .extend_ttl(key, TTL_THRESHOLD, TTL_EXTEND_TO);
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

pub fn get_settings(env: &Env) -> Settings {
    env.storage()
        .instance()
        .get(&DataKey::Settings)
        .expect("settings not set")
}

pub fn set_settings(env: &Env, settings: &Settings) {
    env.storage().instance().set(&DataKey::Settings, settings);
}

pub fn get_bounds(env: &Env) -> AnchorBounds {
    env.storage()
        .instance()
        .get(&DataKey::Bounds)
        .expect("bounds not set")
}

pub fn set_bounds(env: &Env, bounds: &AnchorBounds) {
    env.storage().instance().set(&DataKey::Bounds, bounds);
}

pub fn is_reporter_invalidated(env: &Env) -> bool {
    env.storage()
        .instance()
        .get(&DataKey::ReporterInvalidated)
        .unwrap_or(false)
}

pub fn set_reporter_invalidated(env: &Env) {
    env.storage()
        .instance()
        .set(&DataKey::ReporterInvalidated, &true);
}

pub fn get_configs(env: &Env) -> Vec<TokenConfig> {
    env.storage()
        .instance()
        .get(&DataKey::Configs)
        .unwrap_or(Vec::new(env))
}

pub fn set_configs(env: &Env, configs: &Vec<TokenConfig>) {
    env.storage().instance().set(&DataKey::Configs, configs);
}

pub fn has_config(env: &Env, hash: &BytesN<32>) -> bool {
    env.storage()
        .persistent()
        .has(&DataKey::Config(hash.clone()))
}

pub fn get_config(env: &Env, hash: &BytesN<32>) -> TokenConfig {
    let key = DataKey::Config(hash.clone());
    let config = env
        .storage()
        .persistent()
        .get(&key)
        .unwrap_or_else(|| panic!("token config not found"));
    bump_persistent(env, &key);
    config
}

pub fn set_config(env: &Env, hash: &BytesN<32>, config: &TokenConfig) {
    let key = DataKey::Config(hash.clone());
    env.storage().persistent().set(&key, config);
    bump_persistent(env, &key);
}

pub fn has_market(env: &Env, market: &Address) -> bool {
    env.storage()
        .persistent()
        .has(&DataKey::MarketSymbol(market.clone()))
}

pub fn get_market_symbol(env: &Env, market: &Address) -> BytesN<32> {
    let key = DataKey::MarketSymbol(market.clone());
    let hash = env
        .storage()
        .persistent()
        .get(&key)
        .unwrap_or_else(|| panic!("token config not found"));
    bump_persistent(env, &key);
    hash
}

pub fn set_market_symbol(env: &Env, market: &Address, hash: &BytesN<32>) {
    let key = DataKey::MarketSymbol(market.clone());
    env.storage().persistent().set(&key, hash);
    bump_persistent(env, &key);
}

pub fn get_price(env: &Env, hash: &BytesN<32>) -> u128 {
    let key = DataKey::Price(hash.clone());
    match env.storage().persistent().get(&key) {
        Some(price) => {
            bump_persistent(env, &key);
            price
        }
        None => 0,
    }
}

pub fn set_price(env: &Env, hash: &BytesN<32>, price: u128) {
    let key = DataKey::Price(hash.clone());
    env.storage().persistent().set(&key, &price);
    bump_persistent(env, &key);
}
