//! Core ledger types: outputs, transactions, blocks and verification flags

use bitflags::bitflags;
use num_bigint::BigUint;
use serde::{Deserialize, Serialize};

use crate::constants::{
    MINER_ADDRESS_SIZE, SIGHASH_ALL, SIGHASH_ANYONECANPAY, SIGHASH_NONE, SIGHASH_SINGLE,
};

/// Hash type: 256-bit digest
pub type Hash = [u8; 32];

/// Byte string type
pub type ByteString = Vec<u8>;

/// Reference to an output of an earlier transaction
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct OutPoint {
    pub hash: Hash,
    pub index: u32,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TransactionInput {
    pub prevout: OutPoint,
    pub script_sig: ByteString,
    pub sequence: u32,
}

impl TransactionInput {
    /// A final input has the maximum sequence number, which disables lock time checks.
    pub fn has_sequence(&self) -> bool {
        self.sequence != crate::constants::SEQUENCE_FINAL
    }
}

/// Spendable output carrying an arbitrary-precision amount of a token.
///
/// An empty `token_id` denotes the native token.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TransactionOutput {
    pub value: BigUint,
    pub token_id: ByteString,
    pub script_pubkey: ByteString,
}

impl TransactionOutput {
    pub fn new(value: impl Into<BigUint>, token_id: ByteString, script_pubkey: ByteString) -> Self {
        Self {
            value: value.into(),
            token_id,
            script_pubkey,
        }
    }

    pub fn is_native_token(&self) -> bool {
        self.token_id.is_empty()
    }
}

/// Transaction with its optional memo and contract metadata tail
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct Transaction {
    pub version: u32,
    pub inputs: Vec<TransactionInput>,
    pub outputs: Vec<TransactionOutput>,
    pub lock_time: u32,
    pub memo: Option<String>,
    pub data_class_name: Option<String>,
    pub data: Option<ByteString>,
    pub data_signature: Option<ByteString>,
}

impl Transaction {
    pub fn new(version: u32) -> Self {
        Self {
            version,
            ..Default::default()
        }
    }

    /// Append an input; transactions under construction only ever grow.
    pub fn add_input(&mut self, input: TransactionInput) -> &mut Self {
        self.inputs.push(input);
        self
    }

    pub fn add_output(&mut self, output: TransactionOutput) -> &mut Self {
        self.outputs.push(output);
        self
    }
}

/// Block kinds known to the network, by their wire ordinal
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[repr(u32)]
pub enum BlockType {
    Initial = 0,
    Transfer = 1,
    Reward = 2,
    TokenCreation = 3,
    UserData = 4,
    ContractEvent = 5,
    Governance = 6,
    File = 7,
    ContractExecute = 8,
    OrderOpen = 9,
    OrderCancel = 10,
    OrderExecute = 11,
}

impl BlockType {
    pub fn from_u32(value: u32) -> Option<Self> {
        Some(match value {
            0 => BlockType::Initial,
            1 => BlockType::Transfer,
            2 => BlockType::Reward,
            3 => BlockType::TokenCreation,
            4 => BlockType::UserData,
            5 => BlockType::ContractEvent,
            6 => BlockType::Governance,
            7 => BlockType::File,
            8 => BlockType::ContractExecute,
            9 => BlockType::OrderOpen,
            10 => BlockType::OrderCancel,
            11 => BlockType::OrderExecute,
            _ => return None,
        })
    }
}

/// Fixed-width block header.
///
/// Hash fields are raw 32-byte digests exactly as they appear on the wire.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct BlockHeader {
    pub version: u32,
    pub prev_block_hash: Hash,
    pub prev_branch_block_hash: Hash,
    pub merkle_root: Hash,
    pub time: i64,
    pub difficulty_target: i64,
    pub last_mining_reward_block: i64,
    pub nonce: u32,
    pub miner_address: [u8; MINER_ADDRESS_SIZE],
    pub block_type: u32,
    pub height: i64,
}

impl BlockHeader {
    /// Known kind of this block, `None` for ordinals this crate does not name.
    pub fn kind(&self) -> Option<BlockType> {
        BlockType::from_u32(self.block_type)
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Block {
    pub header: BlockHeader,
    pub transactions: Vec<Transaction>,
}

bitflags! {
    /// Script verification flags.
    #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
    pub struct VerifyFlags: u32 {
        /// Evaluate P2SH redeem scripts (BIP16).
        const P2SH = 1 << 0;
        /// Require strict signature and public key encodings.
        const STRICTENC = 1 << 1;
        /// Require strict DER signatures (BIP66).
        const DERSIG = 1 << 2;
        /// Reject signatures with S above half the curve order.
        const LOW_S = 1 << 3;
        /// The CHECKMULTISIG dummy element must be empty.
        const NULLDUMMY = 1 << 4;
        /// Unlocking scripts may only push data.
        const SIGPUSHONLY = 1 << 5;
        /// Pushes and numbers must use their shortest encoding.
        const MINIMALDATA = 1 << 6;
        /// Fail on upgradable NOPs.
        const DISCOURAGE_UPGRADABLE_NOPS = 1 << 7;
        /// Exactly one element must remain after evaluation. Ignored without `P2SH`.
        const CLEANSTACK = 1 << 8;
        /// Enforce OP_CHECKLOCKTIMEVERIFY (BIP65).
        const CHECKLOCKTIMEVERIFY = 1 << 9;
    }
}

impl VerifyFlags {
    /// Signature encodings must be canonical under either of these flags.
    pub fn requires_canonical(self) -> bool {
        self.intersects(VerifyFlags::STRICTENC | VerifyFlags::DERSIG)
    }

    pub fn requires_minimal(self) -> bool {
        self.contains(VerifyFlags::MINIMALDATA)
    }
}

impl Default for VerifyFlags {
    fn default() -> Self {
        VerifyFlags::P2SH | VerifyFlags::NULLDUMMY | VerifyFlags::CHECKLOCKTIMEVERIFY
    }
}

/// Base signature hash mode
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum SigHash {
    All,
    None,
    Single,
}

/// Raw signature hash type byte as appended to a signature
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct SighashType(pub u8);

impl SighashType {
    pub const ALL: SighashType = SighashType(SIGHASH_ALL);

    pub fn new(mode: SigHash, anyone_can_pay: bool) -> Self {
        let base = match mode {
            SigHash::All => SIGHASH_ALL,
            SigHash::None => SIGHASH_NONE,
            SigHash::Single => SIGHASH_SINGLE,
        };
        if anyone_can_pay {
            SighashType(base | SIGHASH_ANYONECANPAY)
        } else {
            SighashType(base)
        }
    }

    /// Base mode; undefined modes sign like `All`.
    pub fn mode(self) -> SigHash {
        match self.0 & 0x1f {
            SIGHASH_NONE => SigHash::None,
            SIGHASH_SINGLE => SigHash::Single,
            _ => SigHash::All,
        }
    }

    pub fn anyone_can_pay(self) -> bool {
        self.0 & SIGHASH_ANYONECANPAY != 0
    }

    /// True for ALL, NONE or SINGLE, with or without ANYONECANPAY.
    pub fn is_defined(self) -> bool {
        matches!(self.0 & !SIGHASH_ANYONECANPAY, SIGHASH_ALL..=SIGHASH_SINGLE)
    }
}
