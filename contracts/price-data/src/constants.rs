/// Only messages of this kind are accepted into the store.
pub const MESSAGE_KIND: &str = "prices";
/// Messages stamped further than this into the future are ignored.
pub const MAX_FUTURE_SECS: u64 = 60 * 60;
pub const TTL_THRESHOLD: u32 = 100_000;
pub const TTL_EXTEND_TO: u32 = 200_000;
