use soroban_sdk::{contractclient, contracttype, Bytes, BytesN, Env, String};

/// Ed25519 signature over an XDR-encoded reporter message.
#[contracttype]
#[derive(Clone, Debug, Eq, PartialEq)]
pub struct Signature {
    pub public_key: BytesN<32>,
    pub signature: BytesN<64>,
}

/// Subset of the signed price store the oracle writes to and reads from.
#[contractclient(name = "PriceDataClient")]
pub trait PriceDataStore {
    fn put(env: Env, message: Bytes, signature: Signature) -> String;
    fn get_price(env: Env, source: BytesN<32>, key: String) -> u64;
}
