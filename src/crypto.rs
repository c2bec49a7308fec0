//! Hash and ECDSA adapters
//!
//! Thin wrappers so the rest of the crate sees `bytes -> bytes` hash functions and a
//! single `(pubkey, hash, signature) -> bool` verifier.

use std::sync::OnceLock;

use bitcoin_hashes::{hash160, sha1, sha256d, Hash as _};
use ripemd::Ripemd160;
use secp256k1::{ecdsa::Signature, Message, PublicKey, Secp256k1, VerifyOnly};
use sha2::{Digest, Sha256};

use crate::types::Hash;

static SECP256K1: OnceLock<Secp256k1<VerifyOnly>> = OnceLock::new();

fn secp() -> &'static Secp256k1<VerifyOnly> {
    SECP256K1.get_or_init(Secp256k1::verification_only)
}

pub fn sha256(data: &[u8]) -> Hash {
    let mut out = [0u8; 32];
    out.copy_from_slice(&Sha256::digest(data));
    out
}

/// SHA256(SHA256(x))
pub fn sha256d(data: &[u8]) -> Hash {
    sha256d::Hash::hash(data).into_inner()
}

pub fn ripemd160(data: &[u8]) -> [u8; 20] {
    let mut out = [0u8; 20];
    out.copy_from_slice(&Ripemd160::digest(data));
    out
}

/// RIPEMD160(SHA256(x))
pub fn hash160(data: &[u8]) -> [u8; 20] {
    hash160::Hash::hash(data).into_inner()
}

pub fn sha1(data: &[u8]) -> [u8; 20] {
    sha1::Hash::hash(data).into_inner()
}

/// Verify an ECDSA signature over a 32-byte digest.
///
/// The signature is normalized to low-S before verification; callers that must
/// reject high-S signatures check that separately.
pub fn verify_ecdsa(digest: &Hash, signature: &Signature, pubkey: &PublicKey) -> bool {
    let Ok(message) = Message::from_digest_slice(digest) else {
        return false;
    };
    let mut signature = *signature;
    signature.normalize_s();
    secp().verify_ecdsa(&message, &signature, pubkey).is_ok()
}
