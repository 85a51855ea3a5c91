use soroban_sdk::{contractevent, Address, U256};

use crate::storage::Action;

#[contractevent]
#[derive(Clone, Debug, Eq, PartialEq)]
pub struct AdminUpdated {
    #[topic]
    pub admin: Address,
}

#[contractevent]
#[derive(Clone, Debug, Eq, PartialEq)]
pub struct NewPriceOracle {
    #[topic]
    pub oracle: Address,
}

#[contractevent]
#[derive(Clone, Debug, Eq, PartialEq)]
pub struct NewCloseFactor {
    pub old_mantissa: u128,
    pub new_mantissa: u128,
}

#[contractevent]
#[derive(Clone, Debug, Eq, PartialEq)]
pub struct NewLiquidationIncentive {
    pub old_mantissa: u128,
    pub new_mantissa: u128,
}

#[contractevent]
#[derive(Clone, Debug, Eq, PartialEq)]
pub struct NewMaxAssets {
    pub old_max: u32,
    pub new_max: u32,
}

#[contractevent]
#[derive(Clone, Debug, Eq, PartialEq)]
pub struct MarketListed {
    #[topic]
    pub market: Address,
}

#[contractevent]
#[derive(Clone, Debug, Eq, PartialEq)]
pub struct MarketEntered {
    #[topic]
    pub market: Address,
    #[topic]
    pub account: Address,
}

#[contractevent]
#[derive(Clone, Debug, Eq, PartialEq)]
pub struct MarketExited {
    #[topic]
    pub market: Address,
    #[topic]
    pub account: Address,
}

#[contractevent]
#[derive(Clone, Debug, Eq, PartialEq)]
pub struct NewCollateralFactor {
    #[topic]
    pub market: Address,
    pub old_mantissa: u128,
    pub new_mantissa: u128,
}

#[contractevent]
#[derive(Clone, Debug, Eq, PartialEq)]
pub struct NewPauseGuardian {
    #[topic]
    pub guardian: Address,
}

#[contractevent]
#[derive(Clone, Debug, Eq, PartialEq)]
pub struct NewBorrowCapGuardian {
    #[topic]
    pub guardian: Address,
}

/// Global pause flag changed.
#[contractevent]
#[derive(Clone, Debug, Eq, PartialEq)]
pub struct ActionPaused {
    pub action: Action,
    pub paused: bool,
}

/// Per-market pause flag changed.
#[contractevent]
#[derive(Clone, Debug, Eq, PartialEq)]
pub struct MarketActionPaused {
    #[topic]
    pub market: Address,
    pub action: Action,
    pub paused: bool,
}

#[contractevent]
#[derive(Clone, Debug, Eq, PartialEq)]
pub struct NewBorrowCap {
    #[topic]
    pub market: Address,
    pub cap: u128,
}

#[contractevent]
#[derive(Clone, Debug, Eq, PartialEq)]
pub struct CanTokenSet {
    #[topic]
    pub token: Address,
}

#[contractevent]
#[derive(Clone, Debug, Eq, PartialEq)]
pub struct CanSpeedUpdated {
    #[topic]
    pub market: Address,
    pub speed: u128,
}

#[contractevent]
#[derive(Clone, Debug, Eq, PartialEq)]
pub struct DistributedSupplierCan {
    #[topic]
    pub market: Address,
    #[topic]
    pub supplier: Address,
    pub delta: u128,
    pub supply_index: U256,
}

#[contractevent]
#[derive(Clone, Debug, Eq, PartialEq)]
pub struct DistributedBorrowerCan {
    #[topic]
    pub market: Address,
    #[topic]
    pub borrower: Address,
    pub delta: u128,
    pub borrow_index: U256,
}

#[contractevent]
#[derive(Clone, Debug, Eq, PartialEq)]
pub struct CanGranted {
    #[topic]
    pub recipient: Address,
    pub amount: u128,
}
