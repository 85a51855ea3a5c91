pub const EXP_SCALE: u128 = 1_000_000_000_000_000_000; // 1e18
pub const DOUBLE_SCALE: u128 = 1_000_000_000_000_000_000_000_000_000_000_000_000; // 1e36

/// Starting value of every reward index and of account indices that were
/// never snapshotted.
pub const CAN_INITIAL_INDEX: u128 = DOUBLE_SCALE;

pub const CLOSE_FACTOR_MIN: u128 = 50_000_000_000_000_000; // 0.05
pub const CLOSE_FACTOR_MAX: u128 = 900_000_000_000_000_000; // 0.9
pub const COLLATERAL_FACTOR_MAX: u128 = 900_000_000_000_000_000; // 0.9
pub const LIQUIDATION_INCENTIVE_MIN: u128 = EXP_SCALE;
pub const LIQUIDATION_INCENTIVE_MAX: u128 = 1_500_000_000_000_000_000; // 1.5

pub const DEFAULT_CLOSE_FACTOR: u128 = 500_000_000_000_000_000;
pub const DEFAULT_LIQUIDATION_INCENTIVE: u128 = 1_080_000_000_000_000_000;
pub const DEFAULT_MAX_ASSETS: u32 = 10;

pub const TTL_THRESHOLD: u32 = 100_000;
pub const TTL_EXTEND_TO: u32 = 200_000;
