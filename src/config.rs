//! Configuration for tangle-consensus
//!
//! Codec strictness and default script verification policy. Consensus limits
//! (operation count, stack depth, script size) are constants and are not
//! configurable here.

use serde::{Deserialize, Serialize};

use crate::constants::DEFAULT_MAX_DECLARED_COUNT;
use crate::error::{ConsensusError, Result};
use crate::types::VerifyFlags;

/// How VarInt decoding treats non-minimal encodings
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum VarIntStrictness {
    /// Accept any marker width and keep the original encoded length.
    /// This is what the network has historically accepted.
    #[default]
    Lenient,
    /// Reject values encoded with a wider marker than necessary.
    Strict,
}

/// Wire codec configuration
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CodecConfig {
    #[serde(default)]
    pub varint_strictness: VarIntStrictness,

    /// Upper bound for VarInt-declared element counts (inputs, outputs, transactions).
    /// Default: 1,000,000
    #[serde(default = "default_max_declared_count")]
    pub max_declared_count: u64,
}

fn default_max_declared_count() -> u64 {
    DEFAULT_MAX_DECLARED_COUNT
}

impl Default for CodecConfig {
    fn default() -> Self {
        Self {
            varint_strictness: VarIntStrictness::default(),
            max_declared_count: DEFAULT_MAX_DECLARED_COUNT,
        }
    }
}

impl CodecConfig {
    pub fn strict() -> Self {
        Self {
            varint_strictness: VarIntStrictness::Strict,
            ..Self::default()
        }
    }
}

/// Script verification policy
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct ScriptConfig {
    /// Flags applied by the facade when the caller does not pass its own.
    /// Default: P2SH | NULLDUMMY | CHECKLOCKTIMEVERIFY
    #[serde(default)]
    pub verify_flags: VerifyFlags,
}

/// Complete configuration
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct ConsensusConfig {
    #[serde(default)]
    pub codec: CodecConfig,

    #[serde(default)]
    pub script: ScriptConfig,
}

impl ConsensusConfig {
    /// Load configuration from a JSON document; missing fields take their defaults.
    pub fn from_json(json: &str) -> Result<Self> {
        serde_json::from_str(json).map_err(|e| ConsensusError::Configuration(e.to_string()))
    }

    pub fn to_json(&self) -> Result<String> {
        serde_json::to_string_pretty(self).map_err(|e| ConsensusError::Configuration(e.to_string()))
    }
}
