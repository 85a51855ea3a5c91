#![no_std]
use soroban_sdk::{
    contract, contractimpl, contracttype, log, xdr::FromXdr, Bytes, BytesN, Env, String,
};

mod constants;
mod events;
mod storage;

pub use storage::Datum;

use crate::constants::{MAX_FUTURE_SECS, MESSAGE_KIND};
use crate::events::{NotWritten, Write};

/// Payload a reporter signs. Encoded on the wire as the XDR of this struct.
#[contracttype]
#[derive(Clone, Debug, Eq, PartialEq)]
pub struct PriceMessage {
    pub kind: String,
    pub timestamp: u64,
    pub key: String,
    pub value: u64,
}

#[contracttype]
#[derive(Clone, Debug, Eq, PartialEq)]
pub struct Signature {
    pub public_key: BytesN<32>,
    pub signature: BytesN<64>,
}

/// Append-only store of signed price messages, keyed by signer and symbol.
///
/// Anyone may submit a message; the signer's public key becomes the source it
/// is filed under. Consumers decide which sources they trust.
#[contract]
pub struct PriceData;

#[contractimpl]
impl PriceData {
    /// Verifies `message` against `signature` and records it under the signer.
    ///
    /// Returns the key (symbol) carried by the message. A message that is not
    /// newer than the stored one, or that is stamped more than an hour ahead of
    /// the ledger clock, is ignored without failing the call.
    pub fn put(env: Env, message: Bytes, signature: Signature) -> String {
        let source = Self::source(env.clone(), message.clone(), signature);
        let decoded = decode_message(&env, &message);

        let now = env.ledger().timestamp();
        let prior = storage::get_datum(&env, &source, &decoded.key);
        if decoded.timestamp > prior.timestamp
            && decoded.timestamp < now.saturating_add(MAX_FUTURE_SECS)
        {
            storage::set_datum(
                &env,
                &source,
                &decoded.key,
                &Datum {
                    timestamp: decoded.timestamp,
                    value: decoded.value,
                },
            );
            Write {
                source,
                key: decoded.key.clone(),
                timestamp: decoded.timestamp,
                value: decoded.value,
            }
            .publish(&env);
        } else {
            log!(&env, "price message not written", decoded.key);
            NotWritten {
                prior_timestamp: prior.timestamp,
                message_timestamp: decoded.timestamp,
                block_timestamp: now,
            }
            .publish(&env);
        }
        decoded.key
    }

    /// Returns the public key that signed `message`, failing if the signature
    /// does not verify.
    pub fn source(env: Env, message: Bytes, signature: Signature) -> BytesN<32> {
        env.crypto()
            .ed25519_verify(&signature.public_key, &message, &signature.signature);
        signature.public_key
    }

    pub fn get(env: Env, source: BytesN<32>, key: String) -> Datum {
        storage::get_datum(&env, &source, &key)
    }

    pub fn get_price(env: Env, source: BytesN<32>, key: String) -> u64 {
        storage::get_datum(&env, &source, &key).value
    }
}

fn decode_message(env: &Env, message: &Bytes) -> PriceMessage {
    let decoded =
        PriceMessage::from_xdr(env, message).unwrap_or_else(|_| panic!("malformed message"));
    if decoded.kind != String::from_str(env, MESSAGE_KIND) {
        panic!("invalid message kind");
    }
    decoded
}
