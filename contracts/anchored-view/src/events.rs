use soroban_sdk::{contractevent, Address, BytesN, String};

use crate::GuardPolicy;

#[contractevent]
#[derive(Clone, Debug, Eq, PartialEq)]
pub struct OracleInitialized {
    #[topic]
    pub reporter: Address,
    pub upper_bound: u128,
    pub lower_bound: u128,
    pub token_count: u32,
}

/// The stored price for `symbol` was replaced.
#[contractevent]
#[derive(Clone, Debug, Eq, PartialEq)]
pub struct PriceUpdated {
    #[topic]
    pub symbol: String,
    pub price: u128,
}

/// A reporter price fell outside the anchor bounds and was not stored.
#[contractevent]
#[derive(Clone, Debug, Eq, PartialEq)]
pub struct PriceGuarded {
    #[topic]
    pub symbol: String,
    pub reporter_price: u128,
    pub anchor_price: u128,
}

#[contractevent]
#[derive(Clone, Debug, Eq, PartialEq)]
pub struct ReporterInvalidated {
    #[topic]
    pub reporter: BytesN<32>,
}

#[contractevent]
#[derive(Clone, Debug, Eq, PartialEq)]
pub struct AllowanceToppedUp {
    #[topic]
    pub spender: Address,
    pub amount: i128,
    pub expiration_ledger: u32,
}

#[contractevent]
#[derive(Clone, Debug, Eq, PartialEq)]
pub struct GuardPolicyUpdated {
    pub policy: GuardPolicy,
}

#[contractevent]
#[derive(Clone, Debug, Eq, PartialEq)]
pub struct AdminUpdated {
    #[topic]
    pub admin: Address,
}
