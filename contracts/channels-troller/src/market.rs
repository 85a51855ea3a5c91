use soroban_sdk::{contractclient, Address, Env};

use crate::storage::MarketHint;

/// Read side of a lending market as the troller consumes it.
#[contractclient(name = "MarketClient")]
pub trait MarketPort {
    fn is_ctoken(env: Env) -> bool;
    fn total_supply(env: Env) -> u128;
    fn total_borrows(env: Env) -> u128;
    fn borrow_index(env: Env) -> u128;
    fn balance_of(env: Env, account: Address) -> u128;
    fn borrow_balance_stored(env: Env, account: Address) -> u128;
    fn exchange_rate_stored(env: Env) -> u128;
}

#[contractclient(name = "PriceOracleClient")]
pub trait PriceOracle {
    fn get_underlying_price(env: Env, market: Address) -> u128;
}

/// Reads market state from a hint when the market supplied one, and from
/// the market itself otherwise.
///
/// Accounts missing from the hint are read from the market, which fails if
/// the market is the caller.
pub struct MarketReader<'a> {
    env: &'a Env,
    pub market: Address,
    hint: Option<MarketHint>,
}

impl<'a> MarketReader<'a> {
    pub fn new(env: &'a Env, market: &Address, hint: Option<MarketHint>) -> Self {
        Self {
            env,
            market: market.clone(),
            hint,
        }
    }

    fn client(&self) -> MarketClient<'a> {
        MarketClient::new(self.env, &self.market)
    }

    pub fn total_supply(&self) -> u128 {
        match &self.hint {
            Some(h) => h.total_supply,
            None => self.client().total_supply(),
        }
    }

    pub fn total_borrows(&self) -> u128 {
        match &self.hint {
            Some(h) => h.total_borrows,
            None => self.client().total_borrows(),
        }
    }

    pub fn borrow_index(&self) -> u128 {
        match &self.hint {
            Some(h) => h.borrow_index,
            None => self.client().borrow_index(),
        }
    }

    pub fn exchange_rate(&self) -> u128 {
        match &self.hint {
            Some(h) => h.exchange_rate,
            None => self.client().exchange_rate_stored(),
        }
    }

    fn snapshot(&self, account: &Address) -> Option<(u128, u128)> {
        let hint = self.hint.as_ref()?;
        hint.accounts
            .iter()
            .find(|snap| snap.account == *account)
            .map(|snap| (snap.tokens, snap.borrows))
    }

    pub fn tokens(&self, account: &Address) -> u128 {
        match self.snapshot(account) {
            Some((tokens, _)) => tokens,
            None => self.client().balance_of(account),
        }
    }

    pub fn borrows(&self, account: &Address) -> u128 {
        match self.snapshot(account) {
            Some((_, borrows)) => borrows,
            None => self.client().borrow_balance_stored(account),
        }
    }
}

pub fn underlying_price(env: &Env, oracle: &Address, market: &Address) -> u128 {
    PriceOracleClient::new(env, oracle).get_underlying_price(market)
}
