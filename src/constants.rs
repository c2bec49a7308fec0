//! Consensus constants for the transaction layer

/// Maximum script length accepted by the spend verifier
pub const MAX_SCRIPT_SIZE: usize = 10_000;

/// Maximum combined stack + altstack depth during script execution
pub const MAX_STACK_SIZE: usize = 1000;

/// Maximum number of non-push operations in a single script
pub const MAX_SCRIPT_OPS: usize = 201;

/// Maximum size of a single pushed element
pub const MAX_SCRIPT_ELEMENT_SIZE: usize = 520;

/// Maximum number of public keys in a CHECKMULTISIG
pub const MAX_PUBKEYS_PER_MULTISIG: usize = 20;

/// Default width of script numbers consumed by numeric opcodes
pub const SCRIPT_NUM_MAX_LEN: usize = 4;

/// CHECKLOCKTIMEVERIFY operands may be 5 bytes to defer the 2038 rollover
pub const LOCKTIME_NUM_MAX_LEN: usize = 5;

/// Lock time threshold: lock times below this are block heights, above are timestamps
pub const LOCKTIME_THRESHOLD: u32 = 500_000_000;

/// Sequence number for a final input
pub const SEQUENCE_FINAL: u32 = 0xffffffff;

/// Fixed serialized size of a block header
pub const BLOCK_HEADER_SIZE: usize = 160;

/// Length of a miner address in the block header
pub const MINER_ADDRESS_SIZE: usize = 20;

/// Default upper bound for any VarInt-declared element count
pub const DEFAULT_MAX_DECLARED_COUNT: u64 = 1_000_000;

/// Signature hash base modes
pub const SIGHASH_ALL: u8 = 0x01;
pub const SIGHASH_NONE: u8 = 0x02;
pub const SIGHASH_SINGLE: u8 = 0x03;
pub const SIGHASH_ANYONECANPAY: u8 = 0x80;
