//! Transaction identity

use crate::crypto::sha256d;
use crate::types::*;

impl Transaction {
    /// Transaction id: double SHA-256 of the full serialization, memo tail included
    pub fn hash(&self) -> Hash {
        sha256d(&self.serialize())
    }
}
