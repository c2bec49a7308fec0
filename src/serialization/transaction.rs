//! Transaction wire format serialization/deserialization
//!
//! Format:
//! - Version (4 bytes, little-endian)
//! - Input count (VarInt)
//! - For each input:
//!   - Previous output hash (32 bytes)
//!   - Previous output index (4 bytes, little-endian)
//!   - Script length (VarInt) + script bytes
//!   - Sequence (4 bytes, little-endian)
//! - Output count (VarInt)
//! - For each output: see [`super::output`]
//! - Lock time (4 bytes, little-endian)
//! - Tail, four NBytes fields: memo, data class name, data, data signature

use super::output::{read_output, write_output};
use super::primitives::{
    write_nbytes, write_nbytes_string, write_u32_le, write_var_bytes, ByteReader,
};
use super::varint::VarInt;
use crate::config::CodecConfig;
use crate::error::{ConsensusError, Result};
use crate::types::*;

pub fn write_input(out: &mut Vec<u8>, input: &TransactionInput) {
    out.extend_from_slice(&input.prevout.hash);
    write_u32_le(out, input.prevout.index);
    write_var_bytes(out, &input.script_sig);
    write_u32_le(out, input.sequence);
}

/// Memo and contract metadata following the lock time
pub fn write_tail(out: &mut Vec<u8>, tx: &Transaction) {
    write_nbytes_string(out, tx.memo.as_deref());
    write_nbytes_string(out, tx.data_class_name.as_deref());
    write_nbytes(out, tx.data.as_deref());
    write_nbytes(out, tx.data_signature.as_deref());
}

pub fn write_transaction(out: &mut Vec<u8>, tx: &Transaction) {
    write_u32_le(out, tx.version);

    VarInt::write(out, tx.inputs.len() as u64);
    for input in &tx.inputs {
        write_input(out, input);
    }

    VarInt::write(out, tx.outputs.len() as u64);
    for output in &tx.outputs {
        write_output(out, output);
    }

    write_u32_le(out, tx.lock_time);
    write_tail(out, tx);
}

pub fn serialize_transaction(tx: &Transaction) -> Vec<u8> {
    let estimated_size = 4
        + 1
        + tx.inputs.iter().map(|i| 41 + i.script_sig.len()).sum::<usize>()
        + 1
        + tx
            .outputs
            .iter()
            .map(|o| 3 + o.token_id.len() + o.script_pubkey.len() + 8)
            .sum::<usize>()
        + 4
        + 4;
    let mut out = Vec::with_capacity(estimated_size);
    write_transaction(&mut out, tx);
    out
}

/// Read a declared element count and check it against the configured ceiling
pub(crate) fn read_count(
    reader: &mut ByteReader<'_>,
    field: &'static str,
    config: &CodecConfig,
) -> Result<usize> {
    let offset = reader.position();
    let count = reader.read_varint(field)?;
    if count > config.max_declared_count {
        return Err(ConsensusError::MalformedEncoding {
            field,
            offset,
            reason: format!(
                "declared count {count} exceeds maximum {}",
                config.max_declared_count
            ),
        });
    }
    Ok(count as usize)
}

fn read_input(reader: &mut ByteReader<'_>) -> Result<TransactionInput> {
    let hash = reader.read_array::<32>("input.prevout.hash")?;
    let index = reader.read_u32_le("input.prevout.index")?;
    let script_sig = reader.read_var_bytes("input.script_sig")?.to_vec();
    let sequence = reader.read_u32_le("input.sequence")?;
    Ok(TransactionInput {
        prevout: OutPoint { hash, index },
        script_sig,
        sequence,
    })
}

pub fn read_transaction(reader: &mut ByteReader<'_>, config: &CodecConfig) -> Result<Transaction> {
    let version = reader.read_u32_le("tx.version")?;

    let input_count = read_count(reader, "tx.input_count", config)?;
    // An input is at least 41 bytes, never reserve beyond what the buffer could hold
    let mut inputs = Vec::with_capacity(input_count.min(reader.remaining() / 41));
    for _ in 0..input_count {
        inputs.push(read_input(reader)?);
    }

    let output_count = read_count(reader, "tx.output_count", config)?;
    let mut outputs = Vec::with_capacity(output_count.min(reader.remaining() / 3));
    for _ in 0..output_count {
        outputs.push(read_output(reader)?);
    }

    let lock_time = reader.read_u32_le("tx.lock_time")?;

    let memo = reader.read_nbytes_string("tx.memo")?;
    let data_class_name = reader.read_nbytes_string("tx.data_class_name")?;
    let data = reader.read_nbytes("tx.data")?;
    let data_signature = reader.read_nbytes("tx.data_signature")?;

    Ok(Transaction {
        version,
        inputs,
        outputs,
        lock_time,
        memo,
        data_class_name,
        data,
        data_signature,
    })
}

/// Decode one transaction at `offset` with the default codec configuration,
/// returning it with the number of bytes consumed
pub fn deserialize_transaction(buf: &[u8], offset: usize) -> Result<(Transaction, usize)> {
    deserialize_transaction_with(buf, offset, &CodecConfig::default())
}

pub fn deserialize_transaction_with(
    buf: &[u8],
    offset: usize,
    config: &CodecConfig,
) -> Result<(Transaction, usize)> {
    let mut reader = ByteReader::with_strictness(buf, offset, config.varint_strictness);
    let tx = read_transaction(&mut reader, config)?;
    Ok((tx, reader.position() - offset))
}

impl Transaction {
    pub fn serialize(&self) -> Vec<u8> {
        serialize_transaction(self)
    }

    /// Decode a buffer holding exactly one transaction
    pub fn deserialize(buf: &[u8]) -> Result<Transaction> {
        Self::deserialize_with(buf, &CodecConfig::default())
    }

    pub fn deserialize_with(buf: &[u8], config: &CodecConfig) -> Result<Transaction> {
        let (tx, consumed) = deserialize_transaction_with(buf, 0, config)?;
        if consumed != buf.len() {
            return Err(ConsensusError::MalformedEncoding {
                field: "transaction",
                offset: consumed,
                reason: format!("{} trailing bytes", buf.len() - consumed),
            });
        }
        Ok(tx)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample_tx() -> Transaction {
        let mut tx = Transaction::new(1);
        tx.add_input(TransactionInput {
            prevout: OutPoint {
                hash: [0x11; 32],
                index: 3,
            },
            script_sig: vec![0x51, 0x52],
            sequence: 0xffff_fffe,
        })
        .add_output(TransactionOutput::new(5000u32, vec![], vec![0x51]))
        .add_output(TransactionOutput::new(1u32, vec![0xcc; 32], vec![]));
        tx.lock_time = 100;
        tx
    }

    #[test]
    fn test_round_trip() {
        let mut tx = sample_tx();
        tx.memo = Some("payment for invoice 42".to_string());
        tx.data = Some(vec![1, 2, 3]);
        let bytes = tx.serialize();
        assert_eq!(Transaction::deserialize(&bytes).unwrap(), tx);
    }

    #[test]
    fn test_empty_tail_layout() {
        let tx = Transaction::new(2);
        assert_eq!(
            tx.serialize(),
            vec![2, 0, 0, 0, 0, 0, 0, 0, 0, 0, 0, 0, 0, 0]
        );
    }

    #[test]
    fn test_trailing_bytes_rejected() {
        let mut bytes = sample_tx().serialize();
        let len = bytes.len();
        bytes.push(0);
        assert_eq!(
            Transaction::deserialize(&bytes),
            Err(ConsensusError::MalformedEncoding {
                field: "transaction",
                offset: len,
                reason: "1 trailing bytes".to_string(),
            })
        );
        // deserialize_transaction stops after one transaction
        let (_, consumed) = deserialize_transaction(&bytes, 0).unwrap();
        assert_eq!(consumed, len);
    }

    #[test]
    fn test_every_prefix_is_truncated() {
        let bytes = sample_tx().serialize();
        for cut in 0..bytes.len() {
            let err = Transaction::deserialize(&bytes[..cut]).unwrap_err();
            assert!(err.is_decode_error(), "prefix {cut}: {err:?}");
        }
    }

    #[test]
    fn test_declared_count_ceiling() {
        let config = CodecConfig {
            max_declared_count: 1,
            ..CodecConfig::default()
        };
        let bytes = sample_tx().serialize();
        assert!(matches!(
            Transaction::deserialize_with(&bytes, &config),
            Err(ConsensusError::MalformedEncoding {
                field: "tx.output_count",
                ..
            })
        ));
    }

    #[test]
    fn test_huge_declared_count_does_not_allocate() {
        // version + input count 0xffffffff with nothing behind it
        let bytes = [1, 0, 0, 0, 0xfe, 0xff, 0xff, 0xff, 0xff];
        let config = CodecConfig {
            max_declared_count: u64::MAX,
            ..CodecConfig::default()
        };
        assert!(matches!(
            Transaction::deserialize_with(&bytes, &config),
            Err(ConsensusError::TruncatedInput { .. })
        ));
    }

    #[test]
    fn test_non_canonical_count_under_strict() {
        let mut bytes = Transaction::new(1).serialize();
        // input count 0 re-encoded as fd 00 00
        bytes.splice(4..5, [0xfd, 0x00, 0x00]);
        assert!(Transaction::deserialize(&bytes).is_ok());
        assert!(matches!(
            Transaction::deserialize_with(&bytes, &CodecConfig::strict()),
            Err(ConsensusError::MalformedEncoding {
                field: "tx.input_count",
                ..
            })
        ));
    }
}
