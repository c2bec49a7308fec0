//! Transaction signatures: DER ECDSA signature plus trailing sighash type byte

use secp256k1::ecdsa::Signature;

use crate::error::{ConsensusError, Result};
use crate::types::SighashType;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TransactionSignature {
    pub signature: Signature,
    pub sighash_type: SighashType,
}

impl TransactionSignature {
    pub fn new(signature: Signature, sighash_type: SighashType) -> Self {
        Self {
            signature,
            sighash_type,
        }
    }

    /// Decode signature bytes as found on the stack.
    ///
    /// With `require_canonical` the DER body must follow the strict BIP66 layout and
    /// the sighash type must be defined; with `require_low_s` the S value must be in
    /// the lower half of the curve order.
    pub fn decode(bytes: &[u8], require_canonical: bool, require_low_s: bool) -> Result<Self> {
        let Some((&hash_type, der)) = bytes.split_last() else {
            return Err(ConsensusError::SignatureDecode("empty signature".to_string()));
        };
        if require_canonical && !is_encoding_canonical(bytes) {
            return Err(ConsensusError::SignatureDecode(
                "signature encoding is not canonical".to_string(),
            ));
        }

        let signature = if require_canonical {
            Signature::from_der(der)
        } else {
            Signature::from_der_lax(der)
        }
        .map_err(|e| ConsensusError::SignatureDecode(e.to_string()))?;

        if require_low_s && !is_low_s(&signature) {
            return Err(ConsensusError::SignatureDecode(
                "S-value is not canonical".to_string(),
            ));
        }

        Ok(Self::new(signature, SighashType(hash_type)))
    }

    /// DER body followed by the sighash type byte
    pub fn encode(&self) -> Vec<u8> {
        let mut out = self.signature.serialize_der().to_vec();
        out.push(self.sighash_type.0);
        out
    }
}

pub fn is_low_s(signature: &Signature) -> bool {
    let mut normalized = *signature;
    normalized.normalize_s();
    normalized == *signature
}

/// Strict DER layout check over signature bytes including the sighash type byte
pub fn is_valid_signature_encoding(sig: &[u8]) -> bool {
    // 0x30 [total-length] 0x02 [R-length] [R] 0x02 [S-length] [S] [sighash]
    if sig.len() < 9 || sig.len() > 73 {
        return false;
    }
    if sig[0] != 0x30 || sig[1] as usize != sig.len() - 3 {
        return false;
    }

    let len_r = sig[3] as usize;
    if 5 + len_r >= sig.len() {
        return false;
    }
    let len_s = sig[5 + len_r] as usize;
    if len_r + len_s + 7 != sig.len() {
        return false;
    }

    if sig[2] != 0x02 || len_r == 0 || sig[4] & 0x80 != 0 {
        return false;
    }
    // no unnecessary leading zero in R
    if len_r > 1 && sig[4] == 0x00 && sig[5] & 0x80 == 0 {
        return false;
    }

    if sig[len_r + 4] != 0x02 || len_s == 0 || sig[len_r + 6] & 0x80 != 0 {
        return false;
    }
    if len_s > 1 && sig[len_r + 6] == 0x00 && sig[len_r + 7] & 0x80 == 0 {
        return false;
    }
    true
}

/// Strict DER with a defined sighash type
pub fn is_encoding_canonical(sig: &[u8]) -> bool {
    is_valid_signature_encoding(sig) && has_defined_hash_type(sig)
}

pub fn has_defined_hash_type(sig: &[u8]) -> bool {
    sig.last().is_some_and(|&b| SighashType(b).is_defined())
}

/// Compressed (33 bytes, 02/03) or uncompressed (65 bytes, 04) SEC encoding
pub fn is_valid_pubkey_encoding(pubkey: &[u8]) -> bool {
    match pubkey.len() {
        33 => matches!(pubkey[0], 0x02 | 0x03),
        65 => pubkey[0] == 0x04,
        _ => false,
    }
}
