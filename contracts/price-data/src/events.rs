use soroban_sdk::{contractevent, BytesN, String};

/// A signed message replaced the stored datum for `(source, key)`.
#[contractevent]
#[derive(Clone, Debug, Eq, PartialEq)]
pub struct Write {
    #[topic]
    pub source: BytesN<32>,
    #[topic]
    pub key: String,
    pub timestamp: u64,
    pub value: u64,
}

/// A signed message was stale or too far in the future and was dropped.
#[contractevent]
#[derive(Clone, Debug, Eq, PartialEq)]
pub struct NotWritten {
    pub prior_timestamp: u64,
    pub message_timestamp: u64,
    pub block_timestamp: u64,
}
