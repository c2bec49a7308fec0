//! # Tangle Consensus
//!
//! Transaction-layer consensus for a Bitcoin-derived token ledger.
//!
//! This crate provides pure, side-effect-free functions for the wire codec of
//! outputs, transactions and blocks, the stack-based script language, signature
//! hashing and spend authorization. Block acceptance, networking and persistence
//! live elsewhere.
//!
//! ## Design Principles
//!
//! 1. **Pure Functions**: All functions are deterministic and side-effect-free
//! 2. **Byte-exact Codec**: Decoding then re-encoding reproduces the input
//! 3. **Exact Version Pinning**: All consensus-critical dependencies pinned to exact versions
//!
//! ## Usage
//!
//! ```rust
//! use tangle_consensus::TangleConsensus;
//! use tangle_consensus::types::*;
//!
//! let consensus = TangleConsensus::new();
//! let mut tx = Transaction::new(1);
//! tx.add_output(TransactionOutput::new(1000u32, vec![], vec![0x51]));
//!
//! let bytes = consensus.serialize_transaction(&tx);
//! assert_eq!(consensus.deserialize_transaction(&bytes).unwrap(), tx);
//! ```

pub mod types;
pub mod constants;
pub mod error;
pub mod config;
pub mod crypto;
pub mod serialization;
pub mod transaction;
pub mod block;
pub mod sighash;
pub mod opcodes;
pub mod script;

// Re-export commonly used types
pub use types::*;
pub use constants::*;
pub use config::{CodecConfig, ConsensusConfig, ScriptConfig, VarIntStrictness};
pub use error::{ConsensusError, Result, ScriptError};
pub use script::{Script, ScriptBuilder, ScriptType};

use tracing::debug;

/// Entry point bundling the codec and script engine with a configuration
///
/// # Examples
///
/// ```
/// use tangle_consensus::TangleConsensus;
/// use tangle_consensus::types::*;
///
/// let consensus = TangleConsensus::new();
///
/// // A spend whose unlocking script pushes OP_1 onto an OP_1 locking script
/// let mut tx = Transaction::new(1);
/// tx.add_input(TransactionInput {
///     prevout: OutPoint { hash: [0u8; 32], index: 0 },
///     script_sig: vec![0x51], // OP_1
///     sequence: 0xffffffff,
/// })
/// .add_output(TransactionOutput::new(5000u32, vec![], vec![0x51]));
///
/// assert!(consensus.verify_spend(&tx, 0, &[0x51]).is_ok());
/// ```
#[derive(Debug, Clone, Default)]
pub struct TangleConsensus {
    config: ConsensusConfig,
}

impl TangleConsensus {
    /// Create an instance with the default configuration
    ///
    /// # Examples
    ///
    /// ```
    /// use tangle_consensus::TangleConsensus;
    ///
    /// let consensus = TangleConsensus::new();
    /// assert_eq!(consensus.config().codec.max_declared_count, 1_000_000);
    /// ```
    pub fn new() -> Self {
        Self::default()
    }

    /// # Examples
    ///
    /// ```
    /// use tangle_consensus::{ConsensusConfig, TangleConsensus, VarIntStrictness};
    ///
    /// let json = r#"{"codec": {"varint_strictness": "strict"}}"#;
    /// let config = ConsensusConfig::from_json(json).unwrap();
    /// let consensus = TangleConsensus::with_config(config);
    /// assert_eq!(consensus.config().codec.varint_strictness, VarIntStrictness::Strict);
    /// ```
    pub fn with_config(config: ConsensusConfig) -> Self {
        Self { config }
    }

    pub fn config(&self) -> &ConsensusConfig {
        &self.config
    }

    pub fn serialize_transaction(&self, tx: &Transaction) -> Vec<u8> {
        tx.serialize()
    }

    /// Decode a transaction occupying the whole buffer, under the configured codec rules
    pub fn deserialize_transaction(&self, bytes: &[u8]) -> Result<Transaction> {
        Transaction::deserialize_with(bytes, &self.config.codec)
    }

    pub fn serialize_block(&self, block: &Block) -> Vec<u8> {
        block.serialize()
    }

    /// Decode a block occupying the whole buffer, under the configured codec rules
    ///
    /// # Examples
    ///
    /// ```
    /// use tangle_consensus::TangleConsensus;
    /// use tangle_consensus::types::*;
    ///
    /// let consensus = TangleConsensus::new();
    /// let block = Block {
    ///     header: BlockHeader {
    ///         version: 1,
    ///         prev_block_hash: [0; 32],
    ///         prev_branch_block_hash: [0; 32],
    ///         merkle_root: [0; 32],
    ///         time: 1_600_000_000,
    ///         difficulty_target: 0,
    ///         last_mining_reward_block: 0,
    ///         nonce: 0,
    ///         miner_address: [0; 20],
    ///         block_type: BlockType::Transfer as u32,
    ///         height: 1,
    ///     },
    ///     transactions: vec![],
    /// };
    /// let bytes = consensus.serialize_block(&block);
    /// assert_eq!(bytes.len(), 161);
    /// assert_eq!(consensus.deserialize_block(&bytes).unwrap(), block);
    /// ```
    pub fn deserialize_block(&self, bytes: &[u8]) -> Result<Block> {
        serialization::block::deserialize_block_with(bytes, &self.config.codec)
    }

    /// Check that input `input_index` of `tx` may spend an output locked by `script_pubkey`,
    /// using the configured verification flags.
    pub fn verify_spend(
        &self,
        tx: &Transaction,
        input_index: usize,
        script_pubkey: &[u8],
    ) -> Result<()> {
        let flags = self.config.script.verify_flags;
        self.verify_spend_with_flags(tx, input_index, script_pubkey, flags)
    }

    /// # Examples
    ///
    /// ```
    /// use tangle_consensus::{ConsensusError, ScriptError, TangleConsensus};
    /// use tangle_consensus::types::*;
    ///
    /// let consensus = TangleConsensus::new();
    /// let mut tx = Transaction::new(1);
    /// tx.add_input(TransactionInput {
    ///     prevout: OutPoint { hash: [0u8; 32], index: 0 },
    ///     script_sig: vec![0x51, 0x51], // OP_1 OP_1
    ///     sequence: 0xffffffff,
    /// });
    ///
    /// // Two items remain, which CLEANSTACK rejects
    /// let flags = VerifyFlags::P2SH | VerifyFlags::CLEANSTACK;
    /// let result = consensus.verify_spend_with_flags(&tx, 0, &[0x51], flags);
    /// assert_eq!(result, Err(ConsensusError::ScriptEvaluation(ScriptError::CleanStack)));
    /// ```
    pub fn verify_spend_with_flags(
        &self,
        tx: &Transaction,
        input_index: usize,
        script_pubkey: &[u8],
        flags: VerifyFlags,
    ) -> Result<()> {
        let input = tx
            .inputs
            .get(input_index)
            .ok_or(ConsensusError::InvalidInputIndex(input_index))?;
        let unlocking = Script::parse(&input.script_sig)?;
        let locking = Script::parse(script_pubkey)?;
        debug!(input_index, ?flags, "verifying spend");
        script::correctly_spends(&unlocking, tx, input_index, &locking, flags)
    }

    /// Legacy signature hash of `tx` for `input_index` against the connected script.
    ///
    /// # Examples
    ///
    /// ```
    /// use tangle_consensus::TangleConsensus;
    /// use tangle_consensus::types::*;
    ///
    /// let consensus = TangleConsensus::new();
    /// let mut tx = Transaction::new(1);
    /// tx.add_input(TransactionInput {
    ///     prevout: OutPoint { hash: [3u8; 32], index: 1 },
    ///     script_sig: vec![],
    ///     sequence: 0xffffffff,
    /// });
    ///
    /// let all = consensus.hash_for_signature(&tx, 0, &[0x51], SighashType::ALL).unwrap();
    /// let none = consensus
    ///     .hash_for_signature(&tx, 0, &[0x51], SighashType::new(SigHash::None, false))
    ///     .unwrap();
    /// assert_ne!(all, none);
    /// assert!(consensus.hash_for_signature(&tx, 1, &[0x51], SighashType::ALL).is_err());
    /// ```
    pub fn hash_for_signature(
        &self,
        tx: &Transaction,
        input_index: usize,
        connected_script: &[u8],
        sighash_type: SighashType,
    ) -> Result<Hash> {
        sighash::hash_for_signature(tx, input_index, connected_script, sighash_type)
    }

    /// Standard template of an output script
    pub fn classify(&self, script_pubkey: &[u8]) -> Result<ScriptType> {
        Ok(Script::parse(script_pubkey)?.script_type())
    }
}
