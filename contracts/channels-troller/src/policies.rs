use soroban_sdk::{Address, Env, U256};

use crate::exp::{div_exp, mul_exp, narrow, wide};
use crate::market::{underlying_price, MarketReader};
use crate::storage;

/// A change to apply to one market before measuring liquidity.
pub struct Hypothetical<'a> {
    pub market: &'a Address,
    pub redeem_tokens: u128,
    pub borrow_amount: u128,
}

/// Sums collateral and borrows over every market `account` has entered and
/// returns `(liquidity, shortfall)`; at most one of them is non-zero.
///
/// `hinted` supplies state for the calling market so it is not re-entered.
pub fn hypothetical_liquidity(
    env: &Env,
    account: &Address,
    modify: Option<Hypothetical>,
    hinted: Option<&MarketReader>,
) -> (u128, u128) {
    let oracle = storage::get_oracle(env);
    let mut sum_collateral = U256::from_u32(env, 0);
    let mut sum_borrow_plus_effects = U256::from_u32(env, 0);

    for asset in storage::get_account_assets(env, account).iter() {
        let fresh;
        let reader = match hinted {
            Some(r) if r.market == asset => r,
            _ => {
                fresh = MarketReader::new(env, &asset, None);
                &fresh
            }
        };
        let tokens = reader.tokens(account);
        let borrows = reader.borrows(account);
        let exchange_rate = wide(env, reader.exchange_rate());
        let collateral_factor = wide(env, storage::get_market(env, &asset).collateral_factor_mantissa);

        let price = underlying_price(env, &oracle, &asset);
        if price == 0 {
            panic!("price error");
        }
        let price = wide(env, price);

        // Value of one market token in the oracle's denomination, discounted by
        // the collateral factor.
        let tokens_to_denom = mul_exp(
            env,
            &mul_exp(env, &collateral_factor, &exchange_rate),
            &price,
        );
        sum_collateral = sum_collateral.add(&mul_exp(env, &tokens_to_denom, &wide(env, tokens)));
        sum_borrow_plus_effects =
            sum_borrow_plus_effects.add(&mul_exp(env, &price, &wide(env, borrows)));

        if let Some(change) = &modify {
            if *change.market == asset {
                sum_borrow_plus_effects = sum_borrow_plus_effects
                    .add(&mul_exp(env, &tokens_to_denom, &wide(env, change.redeem_tokens)))
                    .add(&mul_exp(env, &price, &wide(env, change.borrow_amount)));
            }
        }
    }

    if sum_collateral > sum_borrow_plus_effects {
        (
            narrow(&sum_collateral.sub(&sum_borrow_plus_effects), "liquidity overflow"),
            0,
        )
    } else {
        (
            0,
            narrow(&sum_borrow_plus_effects.sub(&sum_collateral), "liquidity overflow"),
        )
    }
}

/// Shortfall `account` would have after redeeming `redeem_tokens` from
/// `market`. Zero for non-members, whose tokens back nothing.
pub fn redeem_shortfall(
    env: &Env,
    reader: &MarketReader,
    account: &Address,
    redeem_tokens: u128,
) -> u128 {
    if !storage::is_member(env, &reader.market, account) {
        return 0;
    }
    let (_, shortfall) = hypothetical_liquidity(
        env,
        account,
        Some(Hypothetical {
            market: &reader.market,
            redeem_tokens,
            borrow_amount: 0,
        }),
        Some(reader),
    );
    shortfall
}

/// Collateral tokens to seize for repaying `repay_amount` of the borrowed
/// asset, including the liquidation incentive.
pub fn seize_tokens(
    env: &Env,
    price_borrowed: u128,
    price_collateral: u128,
    exchange_rate: u128,
    repay_amount: u128,
) -> u128 {
    if price_borrowed == 0 || price_collateral == 0 {
        panic!("price error");
    }
    let incentive = wide(env, storage::get_liquidation_incentive(env));
    let numerator = mul_exp(env, &incentive, &wide(env, price_borrowed));
    let denominator = mul_exp(env, &wide(env, price_collateral), &wide(env, exchange_rate));
    if denominator == U256::from_u32(env, 0) {
        panic!("exchange rate error");
    }
    let ratio = div_exp(env, &numerator, &denominator);
    narrow(&mul_exp(env, &ratio, &wide(env, repay_amount)), "seize overflow")
}
