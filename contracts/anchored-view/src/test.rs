#![cfg(test)]
extern crate std;

use super::*;
use crate::constants::{ALLOWANCE_TOP_UP, ANCHOR_BASE};
use ed25519_dalek::{Signer, SigningKey};
use ::price_data::{PriceData, PriceMessage};
use soroban_sdk::testutils::{Address as _, Ledger, MockAuth, MockAuthInvoke};
use soroban_sdk::xdr::ToXdr;
use soroban_sdk::{
    contract, contractimpl, contracttype, token, vec, Address, Bytes, BytesN, Env, IntoVal, String,
    Val, Vec,
};

const NOW: u64 = 1_700_000_000;
const FEE: i128 = 10;
const TOLERANCE: u128 = 10_000_000_000_000_000; // 1%
const HT_PRICE: u64 = 2_500_000;
const BTC_PRICE: u64 = 30_000_000_000;
const ONE_ETHER: u128 = 1_000_000_000_000_000_000;

#[contracttype]
enum AnchorKey {
    FeeToken,
    Quote(String),
}

// Stand-in for a paid feed: charges FEE through the caller's allowance and
// answers with a preset decimal string.
#[contract]
pub struct MockAnchor;

#[contractimpl]
impl MockAnchor {
    pub fn set_fee_token(env: Env, token: Address) {
        env.storage().instance().set(&AnchorKey::FeeToken, &token);
    }

    pub fn set_quote(env: Env, symbol: String, quote: String) {
        env.storage()
            .instance()
            .set(&AnchorKey::Quote(symbol), &quote);
    }

    pub fn query_price(env: Env, caller: Address, symbol: String) -> String {
        let fee_token: Address = env.storage().instance().get(&AnchorKey::FeeToken).unwrap();
        let this = env.current_contract_address();
        token::Client::new(&env, &fee_token).transfer_from(&this, &caller, &this, &FEE);
        env.storage()
            .instance()
            .get(&AnchorKey::Quote(symbol))
            .unwrap()
    }
}

struct Setup {
    env: Env,
    oracle: AnchoredViewClient<'static>,
    anchor: MockAnchorClient<'static>,
    price_data: ::price_data::PriceDataClient<'static>,
    fee_token: Address,
    reporter: SigningKey,
    ht_market: Address,
    usdt_market: Address,
}

fn ht_config(env: &Env, market: &Address) -> TokenConfig {
    TokenConfig {
        market: market.clone(),
        underlying: Address::generate(env),
        symbol: String::from_str(env, "HT/USDT"),
        base_unit: ONE_ETHER,
        price_source: PriceSource::Reporter,
        fixed_price: 0,
    }
}

fn btc_config(env: &Env, market: &Address) -> TokenConfig {
    TokenConfig {
        market: market.clone(),
        underlying: Address::generate(env),
        symbol: String::from_str(env, "BTC"),
        base_unit: 100_000_000,
        price_source: PriceSource::Reporter,
        fixed_price: 0,
    }
}

fn usdt_config(env: &Env, market: &Address) -> TokenConfig {
    TokenConfig {
        market: market.clone(),
        underlying: Address::generate(env),
        symbol: String::from_str(env, "USDT"),
        base_unit: 1_000_000,
        price_source: PriceSource::FixedUsd,
        fixed_price: 1_000_000,
    }
}

fn deploy(env: &Env, policy: GuardPolicy, configs: Vec<TokenConfig>) -> (Address, Address, Address, Address, SigningKey) {
    let reporter = SigningKey::from_bytes(&[42u8; 32]);
    let reporter_key = BytesN::from_array(env, &reporter.verifying_key().to_bytes());

    let price_data_id = env.register(PriceData, ());
    let anchor_id = env.register(MockAnchor, ());
    let oracle_id = env.register(AnchoredView, ());

    let token_admin = Address::generate(env);
    let fee_token = env.register_stellar_asset_contract_v2(token_admin).address();
    token::StellarAssetClient::new(env, &fee_token).mint(&oracle_id, &1_000_000);
    MockAnchorClient::new(env, &anchor_id).set_fee_token(&fee_token);

    AnchoredViewClient::new(env, &oracle_id).initialize(
        &Address::generate(env),
        &Address::generate(env),
        &reporter_key,
        &price_data_id,
        &anchor_id,
        &fee_token,
        &TOLERANCE,
        &policy,
        &configs,
    );
    (oracle_id, anchor_id, price_data_id, fee_token, reporter)
}

fn setup_with(policy: GuardPolicy) -> Setup {
    let env = Env::default();
    env.mock_all_auths();
    env.ledger().set_timestamp(NOW);

    let ht_market = Address::generate(&env);
    let usdt_market = Address::generate(&env);
    let configs = vec![
        &env,
        ht_config(&env, &ht_market),
        usdt_config(&env, &usdt_market),
        btc_config(&env, &Address::generate(&env)),
    ];
    let (oracle_id, anchor_id, price_data_id, fee_token, reporter) = deploy(&env, policy, configs);

    Setup {
        oracle: AnchoredViewClient::new(&env, &oracle_id),
        anchor: MockAnchorClient::new(&env, &anchor_id),
        price_data: ::price_data::PriceDataClient::new(&env, &price_data_id),
        fee_token,
        reporter,
        ht_market,
        usdt_market,
        env,
    }
}

fn setup() -> Setup {
    setup_with(GuardPolicy::Revert)
}

fn sign(env: &Env, key: &SigningKey, message: &Bytes) -> Signature {
    let mut buf = std::vec![0u8; message.len() as usize];
    message.copy_into_slice(&mut buf);
    let sig = key.sign(&buf);
    Signature {
        public_key: BytesN::from_array(env, &key.verifying_key().to_bytes()),
        signature: BytesN::from_array(env, &sig.to_bytes()),
    }
}

fn price_message(env: &Env, symbol: &str, value: u64) -> Bytes {
    PriceMessage {
        kind: String::from_str(env, "prices"),
        timestamp: NOW - 1,
        key: String::from_str(env, symbol),
        value,
    }
    .to_xdr(env)
}

impl Setup {
    fn str(&self, s: &str) -> String {
        String::from_str(&self.env, s)
    }

    fn quote(&self, symbol: &str, quote: &str) {
        self.anchor.set_quote(&self.str(symbol), &self.str(quote));
    }

    fn signed(&self, key: &SigningKey, symbol: &str, value: u64) -> (Vec<Bytes>, Vec<Signature>) {
        let msg = price_message(&self.env, symbol, value);
        let sig = sign(&self.env, key, &msg);
        (vec![&self.env, msg], vec![&self.env, sig])
    }

    fn signed_batch(&self, entries: &[(&str, u64)]) -> (Vec<Bytes>, Vec<Signature>) {
        let mut messages = Vec::new(&self.env);
        let mut signatures = Vec::new(&self.env);
        for (symbol, value) in entries {
            let msg = price_message(&self.env, symbol, *value);
            signatures.push_back(sign(&self.env, &self.reporter, &msg));
            messages.push_back(msg);
        }
        (messages, signatures)
    }

    fn symbols(&self, symbols: &[&str]) -> Vec<String> {
        let mut out = Vec::new(&self.env);
        for symbol in symbols {
            out.push_back(self.str(symbol));
        }
        out
    }

    // Only `address` signs for the next call to `fn_name`.
    fn authorize<A>(&self, address: &Address, fn_name: &str, args: A)
    where
        A: IntoVal<Env, Vec<Val>>,
    {
        self.env.mock_auths(&[MockAuth {
            address,
            invoke: &MockAuthInvoke {
                contract: &self.oracle.address,
                fn_name,
                args: args.into_val(&self.env),
                sub_invokes: &[],
            },
        }]);
    }

    fn post(&self, symbol: &str, value: u64) -> Vec<PriceOutcome> {
        let (messages, signatures) = self.signed(&self.reporter, symbol, value);
        self.oracle
            .post_prices(&messages, &signatures, &vec![&self.env, self.str(symbol)])
    }

    fn reporter_key(&self) -> BytesN<32> {
        BytesN::from_array(&self.env, &self.reporter.verifying_key().to_bytes())
    }
}

#[test]
fn test_initialize_derives_bounds() {
    let s = setup();
    assert_eq!(s.oracle.upper_bound_anchor_ratio(), 1_010_000_000_000_000_000);
    assert_eq!(s.oracle.lower_bound_anchor_ratio(), 990_000_000_000_000_000);
    assert_eq!(s.oracle.guard_policy(), GuardPolicy::Revert);
    assert!(!s.oracle.reporter_invalidated());
    assert_eq!(s.oracle.reporter_key(), s.reporter_key());
    assert_eq!(s.oracle.get_configs().len(), 3);
    assert_eq!(
        s.oracle.get_token_config_by_market(&s.ht_market).symbol,
        s.str("HT/USDT")
    );
}

#[test]
#[should_panic(expected = "already initialized")]
fn test_initialize_twice_fails() {
    let s = setup();
    s.oracle.initialize(
        &Address::generate(&s.env),
        &Address::generate(&s.env),
        &s.reporter_key(),
        &Address::generate(&s.env),
        &Address::generate(&s.env),
        &s.fee_token,
        &TOLERANCE,
        &GuardPolicy::Revert,
        &Vec::new(&s.env),
    );
}

#[test]
#[should_panic(expected = "baseUnit must be greater than zero")]
fn test_zero_base_unit_rejected() {
    let env = Env::default();
    env.mock_all_auths();
    let mut config = ht_config(&env, &Address::generate(&env));
    config.base_unit = 0;
    deploy(&env, GuardPolicy::Revert, vec![&env, config]);
}

#[test]
#[should_panic(expected = "duplicate symbol")]
fn test_duplicate_symbol_rejected() {
    let env = Env::default();
    env.mock_all_auths();
    let a = ht_config(&env, &Address::generate(&env));
    let b = ht_config(&env, &Address::generate(&env));
    deploy(&env, GuardPolicy::Revert, vec![&env, a, b]);
}

#[test]
#[should_panic(expected = "fixed prices must be non-zero")]
fn test_fixed_config_needs_price() {
    let env = Env::default();
    env.mock_all_auths();
    let mut config = usdt_config(&env, &Address::generate(&env));
    config.fixed_price = 0;
    deploy(&env, GuardPolicy::Revert, vec![&env, config]);
}

#[test]
fn test_price_within_anchor_is_stored() {
    let s = setup();
    s.quote("HT/USDT", "2.49");

    let outcomes = s.post("HT/USDT", HT_PRICE);
    assert_eq!(
        outcomes,
        vec![&s.env, PriceOutcome::Updated(s.str("HT/USDT"), HT_PRICE as u128)]
    );
    assert_eq!(s.oracle.price(&s.str("HT/USDT")), HT_PRICE as u128);
}

#[test]
fn test_repeated_post_is_idempotent() {
    let s = setup();
    s.quote("HT/USDT", "2.5");
    s.post("HT/USDT", HT_PRICE);
    let outcomes = s.post("HT/USDT", HT_PRICE);
    assert_eq!(
        outcomes,
        vec![&s.env, PriceOutcome::Updated(s.str("HT/USDT"), HT_PRICE as u128)]
    );
    assert_eq!(s.oracle.price(&s.str("HT/USDT")), HT_PRICE as u128);
}

#[test]
fn test_deviation_reverts_whole_post() {
    let s = setup();
    s.quote("HT/USDT", "2.6");

    let (messages, signatures) = s.signed(&s.reporter, "HT/USDT", HT_PRICE);
    let result = s
        .oracle
        .try_post_prices(&messages, &signatures, &vec![&s.env, s.str("HT/USDT")]);
    assert!(result.is_err());

    assert_eq!(s.oracle.price(&s.str("HT/USDT")), 0);
    // The signed message written earlier in the same call is rolled back too.
    assert_eq!(
        s.price_data.get_price(&s.reporter_key(), &s.str("HT/USDT")),
        0
    );
}

#[test]
fn test_deviation_reverts_every_symbol_in_batch() {
    let s = setup();
    s.quote("HT/USDT", "2.5");
    s.quote("BTC", "31000");

    let (messages, signatures) = s.signed_batch(&[("HT/USDT", HT_PRICE), ("BTC", BTC_PRICE)]);
    let result = s.oracle.try_post_prices(
        &messages,
        &signatures,
        &s.symbols(&["HT/USDT", "BTC"]),
    );
    assert!(result.is_err());

    // HT/USDT passed its own check but goes down with BTC.
    assert_eq!(s.oracle.price(&s.str("HT/USDT")), 0);
    assert_eq!(s.oracle.price(&s.str("BTC")), 0);
    let key = s.reporter_key();
    assert_eq!(s.price_data.get_price(&key, &s.str("HT/USDT")), 0);
    assert_eq!(s.price_data.get_price(&key, &s.str("BTC")), 0);
}

#[test]
fn test_unchecked_symbols_keep_stored_price() {
    let s = setup();
    s.quote("HT/USDT", "2.5");
    s.post("HT/USDT", HT_PRICE);

    s.quote("BTC", "30000");
    let (messages, signatures) = s.signed_batch(&[("HT/USDT", 2_600_000), ("BTC", BTC_PRICE)]);
    let outcomes = s
        .oracle
        .post_prices(&messages, &signatures, &s.symbols(&["BTC"]));
    assert_eq!(
        outcomes,
        vec![&s.env, PriceOutcome::Updated(s.str("BTC"), BTC_PRICE as u128)]
    );

    // The new HT/USDT message is recorded but never checked or promoted.
    assert_eq!(
        s.price_data.get_price(&s.reporter_key(), &s.str("HT/USDT")),
        2_600_000
    );
    assert_eq!(s.oracle.price(&s.str("HT/USDT")), HT_PRICE as u128);
    assert_eq!(s.oracle.price(&s.str("BTC")), BTC_PRICE as u128);
}

#[test]
fn test_only_reporter_can_post() {
    let s = setup();
    s.quote("HT/USDT", "2.5");
    let (messages, signatures) = s.signed(&s.reporter, "HT/USDT", HT_PRICE);
    let symbols = s.symbols(&["HT/USDT"]);
    let args = (messages.clone(), signatures.clone(), symbols.clone());

    s.authorize(&Address::generate(&s.env), "post_prices", args.clone());
    assert!(s.oracle.try_post_prices(&messages, &signatures, &symbols).is_err());
    assert_eq!(s.oracle.price(&s.str("HT/USDT")), 0);

    s.authorize(&s.oracle.get_admin(), "post_prices", args.clone());
    assert!(s.oracle.try_post_prices(&messages, &signatures, &symbols).is_err());

    s.authorize(&s.oracle.reporter(), "post_prices", args);
    s.oracle.post_prices(&messages, &signatures, &symbols);
    assert_eq!(s.oracle.price(&s.str("HT/USDT")), HT_PRICE as u128);
}

#[test]
fn test_admin_setters_need_admin_auth() {
    let s = setup();
    let stranger = Address::generate(&s.env);

    s.authorize(&stranger, "set_guard_policy", (GuardPolicy::Skip,));
    assert!(s.oracle.try_set_guard_policy(&GuardPolicy::Skip).is_err());
    assert_eq!(s.oracle.guard_policy(), GuardPolicy::Revert);

    s.authorize(&stranger, "set_admin", (stranger.clone(),));
    assert!(s.oracle.try_set_admin(&stranger).is_err());
    assert_ne!(s.oracle.get_admin(), stranger);
}

#[test]
#[should_panic(expected = "anchor deviation")]
fn test_deviation_panics_with_reason() {
    let s = setup();
    s.quote("HT/USDT", "2.6");
    s.post("HT/USDT", HT_PRICE);
}

#[test]
fn test_skip_policy_guards_symbol() {
    let s = setup_with(GuardPolicy::Skip);
    s.quote("HT/USDT", "2.6");

    let outcomes = s.post("HT/USDT", HT_PRICE);
    assert_eq!(
        outcomes,
        vec![
            &s.env,
            PriceOutcome::Guarded(s.str("HT/USDT"), HT_PRICE as u128, 2_600_000)
        ]
    );
    assert_eq!(s.oracle.price(&s.str("HT/USDT")), 0);
    assert_eq!(
        s.price_data.get_price(&s.reporter_key(), &s.str("HT/USDT")),
        HT_PRICE
    );
}

#[test]
fn test_guard_policy_can_be_switched() {
    let s = setup();
    s.oracle.set_guard_policy(&GuardPolicy::Skip);
    assert_eq!(s.oracle.guard_policy(), GuardPolicy::Skip);
    s.quote("HT/USDT", "3");
    let outcomes = s.post("HT/USDT", HT_PRICE);
    assert_eq!(
        outcomes.get(0).unwrap(),
        PriceOutcome::Guarded(s.str("HT/USDT"), HT_PRICE as u128, 3_000_000)
    );
}

#[test]
fn test_other_signer_is_not_the_reporter() {
    let s = setup_with(GuardPolicy::Skip);
    s.quote("HT/USDT", "2.5");
    let impostor = SigningKey::from_bytes(&[13u8; 32]);

    let (messages, signatures) = s.signed(&impostor, "HT/USDT", HT_PRICE);
    let outcomes = s
        .oracle
        .post_prices(&messages, &signatures, &vec![&s.env, s.str("HT/USDT")]);
    assert_eq!(
        outcomes.get(0).unwrap(),
        PriceOutcome::Guarded(s.str("HT/USDT"), 0, HT_PRICE as u128)
    );
    assert_eq!(s.oracle.price(&s.str("HT/USDT")), 0);
}

#[test]
#[should_panic(expected = "messages and signatures must be 1:1")]
fn test_mismatched_lengths_rejected() {
    let s = setup();
    let (messages, _) = s.signed(&s.reporter, "HT/USDT", HT_PRICE);
    s.oracle
        .post_prices(&messages, &Vec::new(&s.env), &Vec::new(&s.env));
}

#[test]
#[should_panic(expected = "only reporter prices get posted")]
fn test_fixed_symbol_cannot_be_posted() {
    let s = setup();
    s.quote("USDT", "1");
    s.post("USDT", 1_000_000);
}

#[test]
#[should_panic(expected = "token config not found")]
fn test_unconfigured_symbol_panics() {
    let s = setup();
    s.oracle.price(&s.str("DOGE"));
}

#[test]
#[should_panic(expected = "token config not found")]
fn test_unknown_market_panics() {
    let s = setup();
    s.oracle.get_underlying_price(&Address::generate(&s.env));
}

#[test]
fn test_underlying_price_scaling() {
    let s = setup();
    s.quote("HT/USDT", "2.5");
    s.post("HT/USDT", HT_PRICE);

    // 2.5e6 * 1e30 / 1e18
    assert_eq!(
        s.oracle.get_underlying_price(&s.ht_market),
        2_500_000_000_000_000_000
    );
    // 1e6 * 1e30 / 1e6
    assert_eq!(
        s.oracle.get_underlying_price(&s.usdt_market),
        1_000_000_000_000_000_000_000_000_000_000
    );
    assert_eq!(s.oracle.price(&s.str("USDT")), 1_000_000);
}

#[test]
fn test_fee_allowance_is_topped_up_and_charged() {
    let s = setup();
    s.quote("HT/USDT", "2.5");
    s.post("HT/USDT", HT_PRICE);

    let fee = token::Client::new(&s.env, &s.fee_token);
    assert_eq!(fee.balance(&s.anchor.address), FEE);
    assert_eq!(fee.balance(&s.oracle.address), 1_000_000 - FEE);
    assert_eq!(
        fee.allowance(&s.oracle.address, &s.anchor.address),
        ALLOWANCE_TOP_UP - FEE
    );
}

#[test]
#[should_panic(expected = "anchor response too long")]
fn test_oversized_anchor_response_rejected() {
    let s = setup();
    s.quote(
        "HT/USDT",
        "2.500000000000000000000000000000000000000000000000000000000000000000",
    );
    s.post("HT/USDT", HT_PRICE);
}

#[test]
fn test_invalidated_reporter_falls_back_to_anchor() {
    let s = setup();
    let rotate = String::from_str(&s.env, "rotate").to_xdr(&s.env);
    let sig = sign(&s.env, &s.reporter, &rotate);
    s.oracle.invalidate_reporter(&rotate, &sig);
    assert!(s.oracle.reporter_invalidated());

    // Far outside the bounds, but the anchor is now authoritative.
    s.quote("HT/USDT", "3.1");
    let outcomes = s.post("HT/USDT", HT_PRICE);
    assert_eq!(
        outcomes.get(0).unwrap(),
        PriceOutcome::Updated(s.str("HT/USDT"), 3_100_000)
    );
    assert_eq!(s.oracle.price(&s.str("HT/USDT")), 3_100_000);
}

#[test]
fn test_invalidated_reporter_hands_posting_to_admin() {
    let s = setup();
    let rotate = String::from_str(&s.env, "rotate").to_xdr(&s.env);
    let sig = sign(&s.env, &s.reporter, &rotate);
    s.oracle.invalidate_reporter(&rotate, &sig);

    s.quote("HT/USDT", "3.1");
    let messages: Vec<Bytes> = Vec::new(&s.env);
    let signatures: Vec<Signature> = Vec::new(&s.env);
    let symbols = s.symbols(&["HT/USDT"]);
    let args = (messages.clone(), signatures.clone(), symbols.clone());

    // A silent or hostile reporter no longer gates anchor refreshes.
    s.authorize(&s.oracle.reporter(), "post_prices", args.clone());
    assert!(s.oracle.try_post_prices(&messages, &signatures, &symbols).is_err());
    assert_eq!(s.oracle.price(&s.str("HT/USDT")), 0);

    s.authorize(&s.oracle.get_admin(), "post_prices", args);
    let outcomes = s.oracle.post_prices(&messages, &signatures, &symbols);
    assert_eq!(
        outcomes,
        vec![&s.env, PriceOutcome::Updated(s.str("HT/USDT"), 3_100_000)]
    );
    assert_eq!(s.oracle.price(&s.str("HT/USDT")), 3_100_000);
}

#[test]
#[should_panic(expected = "invalidation message must come from the reporter")]
fn test_invalidation_by_other_key_rejected() {
    let s = setup();
    let rotate = String::from_str(&s.env, "rotate").to_xdr(&s.env);
    let sig = sign(&s.env, &SigningKey::from_bytes(&[1u8; 32]), &rotate);
    s.oracle.invalidate_reporter(&rotate, &sig);
}

#[test]
#[should_panic(expected = "invalid message must be 'rotate'")]
fn test_invalidation_needs_rotate_message() {
    let s = setup();
    let other = String::from_str(&s.env, "stop").to_xdr(&s.env);
    let sig = sign(&s.env, &s.reporter, &other);
    s.oracle.invalidate_reporter(&other, &sig);
}

#[test]
fn test_wide_tolerance_keeps_lower_bound_positive() {
    let env = Env::default();
    env.mock_all_auths();
    let reporter = SigningKey::from_bytes(&[42u8; 32]);
    let oracle_id = env.register(AnchoredView, ());
    let oracle = AnchoredViewClient::new(&env, &oracle_id);
    oracle.initialize(
        &Address::generate(&env),
        &Address::generate(&env),
        &BytesN::from_array(&env, &reporter.verifying_key().to_bytes()),
        &Address::generate(&env),
        &Address::generate(&env),
        &Address::generate(&env),
        &(2 * ANCHOR_BASE),
        &GuardPolicy::Revert,
        &Vec::new(&env),
    );
    assert_eq!(oracle.lower_bound_anchor_ratio(), 1);
    assert_eq!(oracle.upper_bound_anchor_ratio(), 3 * ANCHOR_BASE);
}
