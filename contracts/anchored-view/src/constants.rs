/// Stored prices are fixed point with this many decimals.
pub const PRICE_DECIMALS: u32 = 6;
/// 100% expressed as an anchor ratio (100e16).
pub const ANCHOR_BASE: u128 = 1_000_000_000_000_000_000;
/// Rescales a 6-decimal price to the 36-decimal convention markets expect
/// before dividing by the asset's base unit.
pub const MARKET_PRICE_SCALE: u128 = 1_000_000_000_000_000_000_000_000_000_000; // 1e30
pub const MAX_TOKENS: u32 = 30;
pub const MAX_SYMBOL_LEN: usize = 32;
pub const MAX_RESPONSE_LEN: usize = 64;

/// Fee allowance granted to the anchor source is refreshed below this level.
pub const ALLOWANCE_THRESHOLD: i128 = 1_000_000_000_000;
pub const ALLOWANCE_TOP_UP: i128 = 1_000_000_000_000_000_000;
pub const ALLOWANCE_LEDGERS: u32 = 100_000;

pub const ROTATE_MESSAGE: &str = "rotate";

pub const TTL_THRESHOLD: u32 = 100_000;
pub const TTL_EXTEND_TO: u32 = 200_000;
