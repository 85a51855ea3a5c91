#![no_std]
use soroban_sdk::{
    contract, contractimpl, contracttype, log, xdr::FromXdr, Address, Bytes, BytesN, Env,
    String, Vec, U256,
};

pub mod anchor;
pub mod config;
mod constants;
mod events;
pub mod math;
pub mod price_data;
mod storage;

pub use config::{PriceSource, TokenConfig};
pub use price_data::Signature;

use crate::constants::{MARKET_PRICE_SCALE, ROTATE_MESSAGE};
use crate::events::{
    AdminUpdated, GuardPolicyUpdated, OracleInitialized, PriceGuarded, PriceUpdated,
    ReporterInvalidated,
};
use crate::price_data::PriceDataClient;
use crate::storage::{AnchorBounds, Settings};

/// What to do with a reporter price that falls outside the anchor bounds.
#[contracttype]
#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub enum GuardPolicy {
    /// Fail the whole post, rolling back every write in it.
    Revert,
    /// Leave the stored price alone and continue with the next symbol.
    Skip,
}

#[contracttype]
#[derive(Clone, Debug, Eq, PartialEq)]
pub enum PriceOutcome {
    Updated(String, u128),
    Guarded(String, u128, u128), // (symbol, reporter_price, anchor_price)
}

// Prices gathered during the interaction phase of a post.
#[contracttype(export = false)]
#[derive(Clone, Debug)]
struct Observation {
    symbol: String,
    hash: BytesN<32>,
    reporter_price: u128,
    anchor_price: u128,
}

/// Price oracle that accepts signed reporter prices only when they agree with
/// an independent anchor source within a tolerance.
#[contract]
pub struct AnchoredView;

#[contractimpl]
impl AnchoredView {
    #[allow(clippy::too_many_arguments)]
    pub fn initialize(
        env: Env,
        admin: Address,
        reporter: Address,
        reporter_key: BytesN<32>,
        price_data: Address,
        anchor_source: Address,
        fee_token: Address,
        anchor_tolerance_mantissa: u128,
        guard_policy: GuardPolicy,
        configs: Vec<TokenConfig>,
    ) {
        if storage::is_initialized(&env) {
            panic!("already initialized");
        }
        admin.require_auth();
        config::register_configs(&env, &configs);

        let (upper, lower) = math::anchor_bounds(anchor_tolerance_mantissa);
        storage::set_bounds(&env, &AnchorBounds { upper, lower });
        storage::set_settings(
            &env,
            &Settings {
                reporter: reporter.clone(),
                reporter_key,
                price_data,
                anchor_source,
                fee_token,
                guard_policy,
            },
        );
        storage::set_admin(&env, &admin);
        storage::set_initialized(&env);
        storage::bump_instance(&env);

        OracleInitialized {
            reporter,
            upper_bound: upper,
            lower_bound: lower,
            token_count: configs.len(),
        }
        .publish(&env);
    }

    /// Records signed reporter messages, then refreshes the stored price of
    /// each symbol against the anchor source.
    ///
    /// All anchor queries happen before any stored price changes. Returns one
    /// outcome per symbol, in order.
    ///
    /// Once the reporter is invalidated the admin authorizes posts instead.
    pub fn post_prices(
        env: Env,
        messages: Vec<Bytes>,
        signatures: Vec<Signature>,
        symbols: Vec<String>,
    ) -> Vec<PriceOutcome> {
        let settings = storage::get_settings(&env);
        let invalidated = storage::is_reporter_invalidated(&env);
        if invalidated {
            require_admin(&env);
        } else {
            settings.reporter.require_auth();
        }
        if messages.len() != signatures.len() {
            panic!("messages and signatures must be 1:1");
        }
        storage::bump_instance(&env);

        let store = PriceDataClient::new(&env, &settings.price_data);
        for (message, signature) in messages.iter().zip(signatures.iter()) {
            store.put(&message, &signature);
        }

        let mut observations: Vec<Observation> = Vec::new(&env);
        for symbol in symbols.iter() {
            let hash = config::symbol_hash(&env, &symbol);
            let config = storage::get_config(&env, &hash);
            if config.price_source != PriceSource::Reporter {
                panic!("only reporter prices get posted");
            }
            let reporter_price = store.get_price(&settings.reporter_key, &symbol) as u128;
            let anchor_price = anchor::fetch_anchor_price(
                &env,
                &settings.anchor_source,
                &settings.fee_token,
                &symbol,
            );
            observations.push_back(Observation {
                symbol,
                hash,
                reporter_price,
                anchor_price,
            });
        }

        let bounds = storage::get_bounds(&env);
        let mut outcomes = Vec::new(&env);
        for obs in observations.iter() {
            let outcome = if invalidated {
                store_price(&env, &obs.symbol, &obs.hash, obs.anchor_price)
            } else if math::is_within_anchor(
                obs.reporter_price,
                obs.anchor_price,
                bounds.upper,
                bounds.lower,
            ) {
                store_price(&env, &obs.symbol, &obs.hash, obs.reporter_price)
            } else {
                log!(
                    &env,
                    "reporter price outside anchor",
                    obs.symbol,
                    obs.reporter_price,
                    obs.anchor_price
                );
                match settings.guard_policy {
                    GuardPolicy::Revert => panic!("anchor deviation"),
                    GuardPolicy::Skip => {
                        PriceGuarded {
                            symbol: obs.symbol.clone(),
                            reporter_price: obs.reporter_price,
                            anchor_price: obs.anchor_price,
                        }
                        .publish(&env);
                        PriceOutcome::Guarded(obs.symbol, obs.reporter_price, obs.anchor_price)
                    }
                }
            };
            outcomes.push_back(outcome);
        }
        outcomes
    }

    /// Stored price of `symbol` at six decimals. Zero until a reporter price
    /// has been accepted.
    pub fn price(env: Env, symbol: String) -> u128 {
        let hash = config::symbol_hash(&env, &symbol);
        let config = storage::get_config(&env, &hash);
        price_of(&env, &hash, &config)
    }

    /// Price of one whole underlying unit scaled to 36 minus the asset's
    /// decimals, the convention markets use for collateral math.
    pub fn get_underlying_price(env: Env, market: Address) -> u128 {
        let hash = storage::get_market_symbol(&env, &market);
        let config = storage::get_config(&env, &hash);
        let price = price_of(&env, &hash, &config);
        U256::from_u128(&env, price)
            .mul(&U256::from_u128(&env, MARKET_PRICE_SCALE))
            .div(&U256::from_u128(&env, config.base_unit))
            .to_u128()
            .unwrap_or_else(|| panic!("price overflow"))
    }

    /// Permanently switches the oracle to anchor prices. The message must be
    /// the string "rotate" signed by the reporter key.
    pub fn invalidate_reporter(env: Env, message: Bytes, signature: Signature) {
        let settings = storage::get_settings(&env);
        if signature.public_key != settings.reporter_key {
            panic!("invalidation message must come from the reporter");
        }
        env.crypto()
            .ed25519_verify(&signature.public_key, &message, &signature.signature);
        let decoded =
            String::from_xdr(&env, &message).unwrap_or_else(|_| panic!("malformed message"));
        if decoded != String::from_str(&env, ROTATE_MESSAGE) {
            panic!("invalid message must be 'rotate'");
        }
        storage::set_reporter_invalidated(&env);
        ReporterInvalidated {
            reporter: settings.reporter_key,
        }
        .publish(&env);
    }

    pub fn set_guard_policy(env: Env, policy: GuardPolicy) {
        require_admin(&env);
        let mut settings = storage::get_settings(&env);
        settings.guard_policy = policy;
        storage::set_settings(&env, &settings);
        GuardPolicyUpdated { policy }.publish(&env);
    }

    pub fn set_admin(env: Env, new_admin: Address) {
        require_admin(&env);
        storage::set_admin(&env, &new_admin);
        AdminUpdated { admin: new_admin }.publish(&env);
    }

    pub fn get_admin(env: Env) -> Address {
        storage::get_admin(&env)
    }

    pub fn reporter(env: Env) -> Address {
        storage::get_settings(&env).reporter
    }

    pub fn reporter_key(env: Env) -> BytesN<32> {
        storage::get_settings(&env).reporter_key
    }

    pub fn reporter_invalidated(env: Env) -> bool {
        storage::is_reporter_invalidated(&env)
    }

    pub fn upper_bound_anchor_ratio(env: Env) -> u128 {
        storage::get_bounds(&env).upper
    }

    pub fn lower_bound_anchor_ratio(env: Env) -> u128 {
        storage::get_bounds(&env).lower
    }

    pub fn guard_policy(env: Env) -> GuardPolicy {
        storage::get_settings(&env).guard_policy
    }

    pub fn get_token_config(env: Env, symbol: String) -> TokenConfig {
        storage::get_config(&env, &config::symbol_hash(&env, &symbol))
    }

    pub fn get_token_config_by_market(env: Env, market: Address) -> TokenConfig {
        let hash = storage::get_market_symbol(&env, &market);
        storage::get_config(&env, &hash)
    }

    pub fn get_configs(env: Env) -> Vec<TokenConfig> {
        storage::get_configs(&env)
    }
}

fn require_admin(env: &Env) {
    storage::get_admin(env).require_auth();
}

fn price_of(env: &Env, hash: &BytesN<32>, config: &TokenConfig) -> u128 {
    match config.price_source {
        PriceSource::Reporter => storage::get_price(env, hash),
        PriceSource::FixedUsd => config.fixed_price,
    }
}

fn store_price(env: &Env, symbol: &String, hash: &BytesN<32>, price: u128) -> PriceOutcome {
    storage::set_price(env, hash, price);
    PriceUpdated {
        symbol: symbol.clone(),
        price,
    }
    .publish(env);
    PriceOutcome::Updated(symbol.clone(), price)
}

mod test;
