//! Output wire format
//!
//! Three VarInt-length-prefixed fields:
//! - Value: signed big-endian integer bytes (zero is `[0x00]`, a `0x00` pad is added
//!   when the top bit of the magnitude is set)
//! - Token id (empty for the native token)
//! - Locking script

use num_bigint::BigUint;
use num_traits::Zero;

use super::primitives::{write_var_bytes, ByteReader};
use crate::error::{ConsensusError, Result};
use crate::types::TransactionOutput;

/// Signed big-endian bytes of a non-negative amount
pub fn encode_value(value: &BigUint) -> Vec<u8> {
    let mut bytes = value.to_bytes_be();
    if bytes[0] & 0x80 != 0 {
        bytes.insert(0, 0x00);
    }
    bytes
}

/// Decode amount bytes. An empty string is zero; a set sign bit is rejected.
pub fn decode_value(bytes: &[u8], offset: usize) -> Result<BigUint> {
    match bytes.first() {
        None => Ok(BigUint::zero()),
        Some(b) if b & 0x80 != 0 => Err(ConsensusError::MalformedEncoding {
            field: "output.value",
            offset,
            reason: "negative output value".to_string(),
        }),
        Some(_) => Ok(BigUint::from_bytes_be(bytes)),
    }
}

/// Append an output with explicit value bytes.
///
/// Signature hashing writes blanked outputs whose value is not a valid amount, so the
/// raw form is kept separate from [`write_output`].
pub fn write_output_raw(out: &mut Vec<u8>, value_bytes: &[u8], token_id: &[u8], script: &[u8]) {
    write_var_bytes(out, value_bytes);
    write_var_bytes(out, token_id);
    write_var_bytes(out, script);
}

pub fn write_output(out: &mut Vec<u8>, output: &TransactionOutput) {
    write_output_raw(
        out,
        &encode_value(&output.value),
        &output.token_id,
        &output.script_pubkey,
    );
}

pub fn serialize_output(output: &TransactionOutput) -> Vec<u8> {
    let mut out = Vec::new();
    write_output(&mut out, output);
    out
}

pub fn read_output(reader: &mut ByteReader<'_>) -> Result<TransactionOutput> {
    let value_offset = reader.position();
    let value_bytes = reader.read_var_bytes("output.value")?;
    let value = decode_value(value_bytes, value_offset)?;
    let token_id = reader.read_var_bytes("output.token_id")?.to_vec();
    let script_pubkey = reader.read_var_bytes("output.script_pubkey")?.to_vec();
    Ok(TransactionOutput {
        value,
        token_id,
        script_pubkey,
    })
}

/// Decode one output at `offset`, returning it with the number of bytes consumed
pub fn deserialize_output(buf: &[u8], offset: usize) -> Result<(TransactionOutput, usize)> {
    let mut reader = ByteReader::new(buf, offset);
    let output = read_output(&mut reader)?;
    Ok((output, reader.position() - offset))
}

impl TransactionOutput {
    pub fn serialize(&self) -> Vec<u8> {
        serialize_output(self)
    }

    pub fn deserialize(buf: &[u8], offset: usize) -> Result<(TransactionOutput, usize)> {
        deserialize_output(buf, offset)
    }
}
