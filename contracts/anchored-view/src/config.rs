use soroban_sdk::{contracttype, Address, Bytes, BytesN, Env, String, Vec};

use crate::constants::{MAX_SYMBOL_LEN, MAX_TOKENS};
use crate::storage;

#[contracttype]
#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub enum PriceSource {
    Reporter,
    FixedUsd,
}

/// Per-asset pricing configuration. Fixed for the lifetime of the oracle.
#[contracttype]
#[derive(Clone, Debug, Eq, PartialEq)]
pub struct TokenConfig {
    pub market: Address,
    pub underlying: Address,
    pub symbol: String,
    pub base_unit: u128,
    pub price_source: PriceSource,
    pub fixed_price: u128,
}

/// Copies a host string into `buf` and returns the filled prefix.
pub fn string_bytes<'a>(value: &String, buf: &'a mut [u8], too_long: &str) -> &'a [u8] {
    let len = value.len() as usize;
    if len > buf.len() {
        panic!("{}", too_long);
    }
    value.copy_into_slice(&mut buf[..len]);
    &buf[..len]
}

pub fn symbol_hash(env: &Env, symbol: &String) -> BytesN<32> {
    let mut buf = [0u8; MAX_SYMBOL_LEN];
    let bytes = string_bytes(symbol, &mut buf, "symbol too long");
    env.crypto()
        .keccak256(&Bytes::from_slice(env, bytes))
        .to_bytes()
}

fn validate(config: &TokenConfig) {
    if config.base_unit == 0 {
        panic!("baseUnit must be greater than zero");
    }
    match config.price_source {
        PriceSource::FixedUsd => {
            if config.fixed_price == 0 {
                panic!("fixed prices must be non-zero");
            }
        }
        PriceSource::Reporter => {
            if config.fixed_price != 0 {
                panic!("reporter prices must not carry a fixed price");
            }
        }
    }
}

/// Validates and indexes every config by symbol hash and by market.
pub fn register_configs(env: &Env, configs: &Vec<TokenConfig>) {
    if configs.len() > MAX_TOKENS {
        panic!("too many configs");
    }
    for config in configs.iter() {
        validate(&config);
        let hash = symbol_hash(env, &config.symbol);
        if storage::has_config(env, &hash) {
            panic!("duplicate symbol");
        }
        if storage::has_market(env, &config.market) {
            panic!("duplicate market");
        }
        storage::set_market_symbol(env, &config.market, &hash);
        storage::set_config(env, &hash, &config);
    }
    storage::set_configs(env, configs);
}
