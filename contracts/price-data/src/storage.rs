use soroban_sdk::{contracttype, BytesN, Env, String};

use crate::constants::{TTL_EXTEND_TO, TTL_THRESHOLD};

#[contracttype]
pub enum DataKey {
    Datum(BytesN<32>, String), // (source, key)
}

/// Last value written by a source for a key.
#[contracttype]
#[derive(Clone, Debug, Default, Eq, PartialEq)]
pub struct Datum {
    pub timestamp: u64,
    pub value: u64,
}

pub fn get_datum(env: &Env, source: &BytesN<32>, key: &String) -> Datum {
    let k = DataKey::Datum(source.clone(), key.clone());
    let persistent = env.storage().persistent();
    match persistent.get::<_, Datum>(&k) {
        Some(datum) => {
            persistent.extend_ttl(&k, TTL_THRESHOLD, TTL_EXTEND_TO);
            datum
        }
        None => Datum::default(),
    }
}

pub fn set_datum(env: &Env, source: &BytesN<32>, key: &String, datum: &Datum) {
    let k = DataKey::Datum(source.clone(), key.clone());
    env.storage().persistent().set(&k, datum);
    env.storage()
        .persistent()
        .extend_ttl(&k, TTL_THRESHOLD, TTL_EXTEND_TO);
}
