//! Block wire format
//!
//! A fixed 160-byte header followed by a VarInt transaction count and the
//! transactions back to back. The declared count must account for every byte after
//! the header: a short list or leftover bytes are both `MalformedBlock`.

use tracing::debug;

use super::primitives::{write_i64_le, write_u32_le, ByteReader};
use super::transaction::{read_count, read_transaction, write_transaction};
use super::varint::VarInt;
use crate::config::CodecConfig;
use crate::constants::BLOCK_HEADER_SIZE;
use crate::error::{ConsensusError, Result};
use crate::types::{Block, BlockHeader};

pub fn write_block_header(out: &mut Vec<u8>, header: &BlockHeader) {
    write_u32_le(out, header.version);
    out.extend_from_slice(&header.prev_block_hash);
    out.extend_from_slice(&header.prev_branch_block_hash);
    out.extend_from_slice(&header.merkle_root);
    write_i64_le(out, header.time);
    write_i64_le(out, header.difficulty_target);
    write_i64_le(out, header.last_mining_reward_block);
    write_u32_le(out, header.nonce);
    out.extend_from_slice(&header.miner_address);
    write_u32_le(out, header.block_type);
    write_i64_le(out, header.height);
}

pub fn serialize_block_header(header: &BlockHeader) -> Vec<u8> {
    let mut out = Vec::with_capacity(BLOCK_HEADER_SIZE);
    write_block_header(&mut out, header);
    debug_assert_eq!(out.len(), BLOCK_HEADER_SIZE);
    out
}

pub fn read_block_header(reader: &mut ByteReader<'_>) -> Result<BlockHeader> {
    Ok(BlockHeader {
        version: reader.read_u32_le("block.header.version")?,
        prev_block_hash: reader.read_array("block.header.prev_block_hash")?,
        prev_branch_block_hash: reader.read_array("block.header.prev_branch_block_hash")?,
        merkle_root: reader.read_array("block.header.merkle_root")?,
        time: reader.read_i64_le("block.header.time")?,
        difficulty_target: reader.read_i64_le("block.header.difficulty_target")?,
        last_mining_reward_block: reader.read_i64_le("block.header.last_mining_reward_block")?,
        nonce: reader.read_u32_le("block.header.nonce")?,
        miner_address: reader.read_array("block.header.miner_address")?,
        block_type: reader.read_u32_le("block.header.block_type")?,
        height: reader.read_i64_le("block.header.height")?,
    })
}

pub fn serialize_block(block: &Block) -> Vec<u8> {
    let mut out = Vec::with_capacity(BLOCK_HEADER_SIZE + 9 + block.transactions.len() * 128);
    write_block_header(&mut out, &block.header);
    VarInt::write(&mut out, block.transactions.len() as u64);
    for tx in &block.transactions {
        write_transaction(&mut out, tx);
    }
    out
}

pub fn deserialize_block(buf: &[u8]) -> Result<Block> {
    deserialize_block_with(buf, &CodecConfig::default())
}

pub fn deserialize_block_with(buf: &[u8], config: &CodecConfig) -> Result<Block> {
    let mut reader = ByteReader::with_strictness(buf, 0, config.varint_strictness);
    let header = read_block_header(&mut reader)?;

    let tx_count = read_count(&mut reader, "block.tx_count", config)?;
    let mut transactions = Vec::with_capacity(tx_count.min(reader.remaining() / 14));
    for i in 0..tx_count {
        let tx_offset = reader.position();
        let tx = read_transaction(&mut reader, config).map_err(|err| {
            debug!(index = i, offset = tx_offset, %err, "transaction list ends early");
            ConsensusError::MalformedBlock {
                offset: tx_offset,
                reason: format!("transaction {i} of {tx_count} could not be decoded: {err}"),
            }
        })?;
        transactions.push(tx);
    }

    if !reader.is_empty() {
        return Err(ConsensusError::MalformedBlock {
            offset: reader.position(),
            reason: format!(
                "{} bytes remain after {tx_count} transactions",
                reader.remaining()
            ),
        });
    }

    Ok(Block {
        header,
        transactions,
    })
}

impl BlockHeader {
    pub fn serialize(&self) -> Vec<u8> {
        serialize_block_header(self)
    }
}

impl Block {
    pub fn serialize(&self) -> Vec<u8> {
        serialize_block(self)
    }

    pub fn deserialize(buf: &[u8]) -> Result<Block> {
        deserialize_block(buf)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::{Transaction, TransactionOutput};

    fn header() -> BlockHeader {
        BlockHeader {
            version: 1,
            prev_block_hash: [1; 32],
            prev_branch_block_hash: [2; 32],
            merkle_root: [3; 32],
            time: 1_600_000_000,
            difficulty_target: 0x7fff_ffff,
            last_mining_reward_block: 42,
            nonce: 7,
            miner_address: [9; 20],
            block_type: 1,
            height: 1000,
        }
    }

    fn block_with(n: usize) -> Block {
        let transactions = (0..n)
            .map(|i| {
                let mut tx = Transaction::new(1);
                tx.add_output(TransactionOutput::new(i as u32, vec![], vec![0x51]));
                tx
            })
            .collect();
        Block {
            header: header(),
            transactions,
        }
    }

    #[test]
    fn test_header_is_160_bytes() {
        let bytes = header().serialize();
        assert_eq!(bytes.len(), BLOCK_HEADER_SIZE);
        assert_eq!(&bytes[0..4], &[1, 0, 0, 0]);
        // block_type sits right before the trailing height
        assert_eq!(&bytes[148..152], &[1, 0, 0, 0]);
    }

    #[test]
    fn test_block_round_trip() {
        let block = block_with(3);
        assert_eq!(Block::deserialize(&block.serialize()).unwrap(), block);
    }

    #[test]
    fn test_truncated_header() {
        let bytes = header().serialize();
        match deserialize_block(&bytes[..100]) {
            Err(ConsensusError::TruncatedInput { field, .. }) => {
                assert!(field.starts_with("block.header."), "{field}")
            }
            other => panic!("unexpected {other:?}"),
        }
    }

    #[test]
    fn test_partial_transaction_list() {
        let mut bytes = block_with(2).serialize();
        // claim three transactions
        bytes[BLOCK_HEADER_SIZE] = 3;
        assert!(matches!(
            deserialize_block(&bytes),
            Err(ConsensusError::MalformedBlock { .. })
        ));
    }

    #[test]
    fn test_overflowing_transaction_list() {
        let mut bytes = block_with(2).serialize();
        bytes[BLOCK_HEADER_SIZE] = 1;
        match deserialize_block(&bytes) {
            Err(ConsensusError::MalformedBlock { offset, .. }) => {
                let one_tx = block_with(1).serialize().len();
                assert_eq!(offset, one_tx);
            }
            other => panic!("unexpected {other:?}"),
        }
    }
}
