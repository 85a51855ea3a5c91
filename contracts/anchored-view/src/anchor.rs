use soroban_sdk::{contractclient, token, Address, Env, String};

use crate::config::string_bytes;
use crate::constants::{
    ALLOWANCE_LEDGERS, ALLOWANCE_THRESHOLD, ALLOWANCE_TOP_UP, MAX_RESPONSE_LEN, PRICE_DECIMALS,
};
use crate::events::AllowanceToppedUp;
use crate::math::parse_decimal;

/// Paid price feed used as the sanity anchor for reporter prices.
///
/// The source charges its fee by pulling `fee_token` from `caller`, so the
/// oracle keeps a standing allowance for it.
#[contractclient(name = "AnchorSourceClient")]
pub trait AnchorSource {
    fn query_price(env: Env, caller: Address, symbol: String) -> String;
}

pub fn ensure_allowance(env: &Env, fee_token: &Address, anchor: &Address) {
    let token = token::Client::new(env, fee_token);
    let this = env.current_contract_address();
    if token.allowance(&this, anchor) >= ALLOWANCE_THRESHOLD {
        return;
    }
    let expiration_ledger = env.ledger().sequence().saturating_add(ALLOWANCE_LEDGERS);
    token.approve(&this, anchor, &ALLOWANCE_TOP_UP, &expiration_ledger);
    AllowanceToppedUp {
        spender: anchor.clone(),
        amount: ALLOWANCE_TOP_UP,
        expiration_ledger,
    }
    .publish(env);
}

/// Queries the anchor source for `symbol` and parses the answer at six
/// decimals.
pub fn fetch_anchor_price(env: &Env, anchor: &Address, fee_token: &Address, symbol: &String) -> u128 {
    ensure_allowance(env, fee_token, anchor);
    let response =
        AnchorSourceClient::new(env, anchor).query_price(&env.current_contract_address(), symbol);
    let mut buf = [0u8; MAX_RESPONSE_LEN];
    let bytes = string_bytes(&response, &mut buf, "anchor response too long");
    parse_decimal(bytes, PRICE_DECIMALS)
}
