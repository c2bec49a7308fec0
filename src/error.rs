//! Error types for encoding and script validation

use thiserror::Error;

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ConsensusError {
    #[error("Malformed encoding of {field} at offset {offset}: {reason}")]
    MalformedEncoding {
        field: &'static str,
        offset: usize,
        reason: String,
    },

    #[error(
        "Truncated input reading {field} at offset {offset}: \
         need {needed} bytes, {available} available"
    )]
    TruncatedInput {
        field: &'static str,
        offset: usize,
        needed: usize,
        available: usize,
    },

    #[error("Malformed block at offset {offset}: {reason}")]
    MalformedBlock { offset: usize, reason: String },

    #[error("Script parse error at offset {offset}: {reason}")]
    ScriptParse { offset: usize, reason: String },

    #[error("Script evaluation failed: {0}")]
    ScriptEvaluation(ScriptError),

    #[error("Signature decode error: {0}")]
    SignatureDecode(String),

    #[error("Invalid input index: {0}")]
    InvalidInputIndex(usize),

    #[error("Configuration error: {0}")]
    Configuration(String),
}

impl ConsensusError {
    /// True for failures raised while decoding wire bytes.
    pub fn is_decode_error(&self) -> bool {
        matches!(
            self,
            ConsensusError::MalformedEncoding { .. }
                | ConsensusError::TruncatedInput { .. }
                | ConsensusError::MalformedBlock { .. }
        )
    }

    /// The script failure kind, if this is an evaluation error.
    pub fn script_error(&self) -> Option<ScriptError> {
        match self {
            ConsensusError::ScriptEvaluation(err) => Some(*err),
            _ => None,
        }
    }
}

impl From<ScriptError> for ConsensusError {
    fn from(err: ScriptError) -> Self {
        ConsensusError::ScriptEvaluation(err)
    }
}

/// Reasons a script evaluation aborts.
#[derive(Error, Debug, Copy, Clone, PartialEq, Eq)]
pub enum ScriptError {
    #[error("invalid stack operation")]
    InvalidStackOperation,
    #[error("invalid altstack operation")]
    InvalidAltstackOperation,
    #[error("disabled opcode 0x{0:02x}")]
    DisabledOpcode(u8),
    #[error("reserved or unknown opcode 0x{0:02x}")]
    BadOpcode(u8),
    #[error("upgradable NOP 0x{0:02x} is discouraged")]
    DiscourageUpgradableNops(u8),
    #[error("OP_RETURN encountered")]
    OpReturn,
    #[error("OP_VERIFY failed")]
    Verify,
    #[error("OP_EQUALVERIFY failed")]
    EqualVerify,
    #[error("OP_NUMEQUALVERIFY failed")]
    NumEqualVerify,
    #[error("OP_CHECKSIGVERIFY failed")]
    CheckSigVerify,
    #[error("OP_CHECKMULTISIGVERIFY failed")]
    CheckMultiSigVerify,
    #[error("operation limit exceeded")]
    TooManyOperations,
    #[error("stack size limit exceeded")]
    StackSize,
    #[error("script larger than 10,000 bytes")]
    ScriptSize,
    #[error("push larger than 520 bytes")]
    PushSize,
    #[error("unbalanced conditional")]
    UnbalancedConditional,
    #[error("negative locktime")]
    NegativeLockTime,
    #[error("locktime requirement not satisfied")]
    UnsatisfiedLockTime,
    #[error("public key count out of range")]
    PubkeyCount,
    #[error("signature count out of range")]
    SigCount,
    #[error("CHECKMULTISIG dummy argument not null")]
    SigNullDummy,
    #[error("non-canonical DER signature")]
    SigDer,
    #[error("undefined signature hash type")]
    SigHashType,
    #[error("public key encoding invalid")]
    PubkeyType,
    #[error("script number overflow")]
    NumberOverflow,
    #[error("non-minimal data encoding")]
    MinimalData,
    #[error("only push operations allowed")]
    SigPushOnly,
    #[error("stack not clean after evaluation")]
    CleanStack,
    #[error("script evaluated to false")]
    EvalFalse,
}

pub type Result<T> = std::result::Result<T, ConsensusError>;
