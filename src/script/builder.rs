//! Script construction
//!
//! `ScriptBuilder` appends chunks and always picks the shortest push for data and
//! numbers. The `create_*` helpers produce the standard templates recognised by
//! [`super::classify`].

use num_bigint::BigInt;

use super::{ChunkKind, Script};
use crate::opcodes::*;
use crate::serialization::primitives::{encode_mpi, reverse_bytes};

#[derive(Debug, Clone, Default)]
pub struct ScriptBuilder {
    chunks: Vec<ChunkKind>,
}

impl ScriptBuilder {
    pub fn new() -> Self {
        Self::default()
    }

    /// Append an opcode. `OP_0` is recorded as the empty push it stands for.
    pub fn op(mut self, opcode: u8) -> Self {
        if opcode == OP_0 {
            return self.data(&[]);
        }
        self.chunks.push(ChunkKind::Opcode(opcode));
        self
    }

    /// Push `data` with the shortest encoding.
    ///
    /// Empty data becomes `OP_0` and a single byte 1..=16 becomes `OP_N`.
    pub fn data(mut self, data: &[u8]) -> Self {
        let kind = match data.len() {
            0 => ChunkKind::PushData {
                opcode: OP_0,
                data: Vec::new(),
            },
            1 if (1..=16).contains(&data[0]) => ChunkKind::Opcode(OP_1 + data[0] - 1),
            len if len < OP_PUSHDATA1 as usize => ChunkKind::PushData {
                opcode: len as u8,
                data: data.to_vec(),
            },
            len if len < 256 => ChunkKind::PushData {
                opcode: OP_PUSHDATA1,
                data: data.to_vec(),
            },
            len if len < 65536 => ChunkKind::PushData {
                opcode: OP_PUSHDATA2,
                data: data.to_vec(),
            },
            _ => ChunkKind::PushData {
                opcode: OP_PUSHDATA4,
                data: data.to_vec(),
            },
        };
        self.chunks.push(kind);
        self
    }

    /// Push `-1..=16` as a single opcode; anything else as a script number push
    pub fn number(self, n: i64) -> Self {
        match n {
            0 => self.data(&[]),
            -1 => self.op(OP_1NEGATE),
            1..=16 => self.op(OP_1 + (n - 1) as u8),
            _ => {
                let bytes = reverse_bytes(&encode_mpi(&BigInt::from(n), false));
                self.data(&bytes)
            }
        }
    }

    pub fn build(self) -> Script {
        Script::from_chunks(self.chunks)
    }
}

/// DUP HASH160 <hash> EQUALVERIFY CHECKSIG
pub fn create_p2pkh(pubkey_hash: &[u8; 20]) -> Script {
    ScriptBuilder::new()
        .op(OP_DUP)
        .op(OP_HASH160)
        .data(pubkey_hash)
        .op(OP_EQUALVERIFY)
        .op(OP_CHECKSIG)
        .build()
}

/// <pubkey> CHECKSIG
pub fn create_p2pk(pubkey: &[u8]) -> Script {
    ScriptBuilder::new().data(pubkey).op(OP_CHECKSIG).build()
}

/// HASH160 <hash> EQUAL
pub fn create_p2sh(script_hash: &[u8; 20]) -> Script {
    ScriptBuilder::new()
        .op(OP_HASH160)
        .data(script_hash)
        .op(OP_EQUAL)
        .build()
}

/// P2SH output paying to the hash of `redeem`
pub fn create_p2sh_for(redeem: &Script) -> Script {
    create_p2sh(&crate::crypto::hash160(redeem.program()))
}

/// OP_M <pubkeys..> OP_N CHECKMULTISIG
pub fn create_multisig(threshold: usize, pubkeys: &[Vec<u8>]) -> Script {
    let mut builder = ScriptBuilder::new().number(threshold as i64);
    for key in pubkeys {
        builder = builder.data(key);
    }
    builder
        .number(pubkeys.len() as i64)
        .op(OP_CHECKMULTISIG)
        .build()
}

/// RETURN <data>
pub fn create_op_return(data: &[u8]) -> Script {
    ScriptBuilder::new().op(OP_RETURN).data(data).build()
}

/// Refundable payment channel: the recipient can claim at any time with both
/// signatures, the sender alone once `expiry` has passed.
///
/// IF <recipient> CHECKSIGVERIFY ELSE <expiry> CHECKLOCKTIMEVERIFY DROP ENDIF
/// <sender> CHECKSIG
pub fn create_cltv_payment_channel(sender: &[u8], recipient: &[u8], expiry: i64) -> Script {
    ScriptBuilder::new()
        .op(OP_IF)
        .data(recipient)
        .op(OP_CHECKSIGVERIFY)
        .op(OP_ELSE)
        .data(&reverse_bytes(&encode_mpi(&BigInt::from(expiry), false)))
        .op(OP_CHECKLOCKTIMEVERIFY)
        .op(OP_DROP)
        .op(OP_ENDIF)
        .data(sender)
        .op(OP_CHECKSIG)
        .build()
}

/// <sig> <pubkey>
pub fn create_p2pkh_input(signature: &[u8], pubkey: &[u8]) -> Script {
    ScriptBuilder::new().data(signature).data(pubkey).build()
}

/// OP_0 <sigs..> <redeem script>
pub fn create_p2sh_multisig_input(signatures: &[Vec<u8>], redeem: &Script) -> Script {
    let mut builder = ScriptBuilder::new().data(&[]);
    for sig in signatures {
        builder = builder.data(sig);
    }
    builder.data(redeem.program()).build()
}
