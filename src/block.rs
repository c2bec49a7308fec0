//! Block identity and merkle commitment

use crate::crypto::sha256d;
use crate::types::*;

impl BlockHeader {
    /// Header hash: double SHA-256 of the 160-byte header encoding
    pub fn hash(&self) -> Hash {
        sha256d(&self.serialize())
    }
}

impl Block {
    pub fn hash(&self) -> Hash {
        self.header.hash()
    }

    /// True if the header commits to exactly this transaction list.
    pub fn check_merkle_root(&self) -> bool {
        calculate_merkle_root(&self.transactions) == self.header.merkle_root
    }
}

/// Merkle root over transaction ids.
///
/// Levels with an odd number of hashes pair the last hash with itself.
/// An empty list commits to the all-zero hash.
pub fn calculate_merkle_root(transactions: &[Transaction]) -> Hash {
    if transactions.is_empty() {
        return [0; 32];
    }

    let mut hashes: Vec<Hash> = transactions.iter().map(Transaction::hash).collect();

    // Build Merkle tree bottom-up
    while hashes.len() > 1 {
        hashes = hashes
            .chunks(2)
            .map(|pair| {
                let right = pair.get(1).unwrap_or(&pair[0]);
                let mut combined = [0u8; 64];
                combined[..32].copy_from_slice(&pair[0]);
                combined[32..].copy_from_slice(right);
                sha256d(&combined)
            })
            .collect();
    }

    hashes[0]
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::constants::MINER_ADDRESS_SIZE;

    fn tx_with_index(index: u32) -> Transaction {
        let mut tx = Transaction::new(1);
        tx.add_input(TransactionInput {
            prevout: OutPoint {
                hash: [7; 32],
                index,
            },
            script_sig: vec![0x51],
            sequence: 0xffffffff,
        })
        .add_output(TransactionOutput::new(50u32, vec![], vec![0x51]));
        tx
    }

    fn block_with(transactions: Vec<Transaction>) -> Block {
        let merkle_root = calculate_merkle_root(&transactions);
        Block {
            header: BlockHeader {
                version: 1,
                prev_block_hash: [1; 32],
                prev_branch_block_hash: [2; 32],
                merkle_root,
                time: 1_600_000_000,
                difficulty_target: 0x207fffff,
                last_mining_reward_block: 0,
                nonce: 0,
                miner_address: [0; MINER_ADDRESS_SIZE],
                block_type: BlockType::Transfer as u32,
                height: 1,
            },
            transactions,
        }
    }

    #[test]
    fn test_merkle_root_single_transaction_is_txid() {
        let tx = tx_with_index(0);
        assert_eq!(calculate_merkle_root(&[tx.clone()]), tx.hash());
    }

    #[test]
    fn test_merkle_root_pair() {
        let a = tx_with_index(0);
        let b = tx_with_index(1);
        let mut combined = a.hash().to_vec();
        combined.extend_from_slice(&b.hash());
        assert_eq!(calculate_merkle_root(&[a, b]), sha256d(&combined));
    }

    #[test]
    fn test_merkle_root_odd_duplicates_last() {
        let txs = vec![tx_with_index(0), tx_with_index(1), tx_with_index(2)];
        let mut padded = txs.clone();
        padded.push(txs[2].clone());
        assert_eq!(calculate_merkle_root(&txs), calculate_merkle_root(&padded));
    }

    #[test]
    fn test_merkle_root_empty() {
        assert_eq!(calculate_merkle_root(&[]), [0; 32]);
    }

    #[test]
    fn test_block_hash_covers_header_only() {
        let block = block_with(vec![tx_with_index(0)]);
        let mut other = block.clone();
        other.transactions.push(tx_with_index(1));
        assert_eq!(block.hash(), other.hash());

        other.header.nonce = 1;
        assert_ne!(block.hash(), other.hash());
    }

    #[test]
    fn test_check_merkle_root() {
        let block = block_with(vec![tx_with_index(0), tx_with_index(1)]);
        assert!(block.check_merkle_root());

        let mut tampered = block.clone();
        tampered.transactions[0].lock_time = 10;
        assert!(!tampered.check_merkle_root());

        let mut reordered = block;
        reordered.transactions.swap(0, 1);
        assert!(!reordered.check_merkle_root());
    }
}
