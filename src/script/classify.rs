//! Standard script templates
//!
//! Predicates are exact: a script matches a template only if every chunk is where the
//! template puts it. P2SH is matched on the raw program bytes rather than on chunks.

use num_bigint::BigInt;
use serde::{Deserialize, Serialize};

use super::interpreter::cast_to_big_int;
use super::{Script, ScriptChunk};
use crate::constants::LOCKTIME_NUM_MAX_LEN;
use crate::opcodes::*;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum ScriptType {
    /// DUP HASH160 <20 bytes> EQUALVERIFY CHECKSIG
    P2pkh,
    /// <pubkey> CHECKSIG
    P2pk,
    /// HASH160 <20 bytes> EQUAL
    P2sh,
    /// M <pubkeys> N CHECKMULTISIG
    Multisig,
    CltvPaymentChannel,
    OpReturn,
    NonStandard,
}

fn is_small_num(chunk: &ScriptChunk) -> Option<usize> {
    match chunk.opcode() {
        op @ OP_1..=OP_16 => decode_from_op_n(op).map(|n| n as usize),
        _ => None,
    }
}

impl Script {
    pub fn is_op_return(&self) -> bool {
        self.chunks()
            .first()
            .is_some_and(|c| c.equals_op(OP_RETURN))
    }

    /// Pay-to-pubkey-hash
    pub fn is_sent_to_address(&self) -> bool {
        let c = self.chunks();
        c.len() == 5
            && c[0].equals_op(OP_DUP)
            && c[1].equals_op(OP_HASH160)
            && c[2].data().is_some_and(|d| d.len() == 20)
            && c[3].equals_op(OP_EQUALVERIFY)
            && c[4].equals_op(OP_CHECKSIG)
    }

    pub fn is_sent_to_raw_pubkey(&self) -> bool {
        let c = self.chunks();
        c.len() == 2
            && c[1].equals_op(OP_CHECKSIG)
            && !c[0].is_opcode()
            && c[0].data().is_some_and(|d| d.len() > 1)
    }

    /// Byte-exact BIP16 template
    pub fn is_pay_to_script_hash(&self) -> bool {
        let p = self.program();
        p.len() == 23 && p[0] == OP_HASH160 && p[1] == 0x14 && p[22] == OP_EQUAL
    }

    pub fn is_sent_to_multisig(&self) -> bool {
        let c = self.chunks();
        if c.len() < 4 {
            return false;
        }
        let last = &c[c.len() - 1];
        if !(last.equals_op(OP_CHECKMULTISIG) || last.equals_op(OP_CHECKMULTISIGVERIFY)) {
            return false;
        }
        let Some(keys) = is_small_num(&c[c.len() - 2]) else {
            return false;
        };
        if c.len() != keys + 3 {
            return false;
        }
        if c[1..c.len() - 2].iter().any(ScriptChunk::is_opcode) {
            return false;
        }
        is_small_num(&c[0]).is_some_and(|sigs| sigs <= keys)
    }

    /// IF <recipient> CHECKSIGVERIFY ELSE <expiry> CHECKLOCKTIMEVERIFY DROP ENDIF
    /// <sender> CHECKSIG
    pub fn is_sent_to_cltv_payment_channel(&self) -> bool {
        let c = self.chunks();
        c.len() == 10
            && c[0].equals_op(OP_IF)
            && !c[1].is_opcode()
            && c[2].equals_op(OP_CHECKSIGVERIFY)
            && c[3].equals_op(OP_ELSE)
            && c[4].is_push_data()
            && c[5].equals_op(OP_CHECKLOCKTIMEVERIFY)
            && c[6].equals_op(OP_DROP)
            && c[7].equals_op(OP_ENDIF)
            && !c[8].is_opcode()
            && c[9].equals_op(OP_CHECKSIG)
    }

    pub fn script_type(&self) -> ScriptType {
        if self.is_sent_to_address() {
            ScriptType::P2pkh
        } else if self.is_pay_to_script_hash() {
            ScriptType::P2sh
        } else if self.is_sent_to_raw_pubkey() {
            ScriptType::P2pk
        } else if self.is_sent_to_multisig() {
            ScriptType::Multisig
        } else if self.is_sent_to_cltv_payment_channel() {
            ScriptType::CltvPaymentChannel
        } else if self.is_op_return() {
            ScriptType::OpReturn
        } else {
            ScriptType::NonStandard
        }
    }

    /// Hash a P2PKH or P2SH script pays to
    pub fn pubkey_hash(&self) -> Option<&[u8]> {
        if self.is_sent_to_address() {
            self.chunks()[2].data()
        } else if self.is_pay_to_script_hash() {
            Some(&self.program()[2..22])
        } else {
            None
        }
    }

    /// Public key of a pay-to-pubkey script
    pub fn pubkey(&self) -> Option<&[u8]> {
        if self.is_sent_to_raw_pubkey() {
            self.chunks()[0].data()
        } else {
            None
        }
    }

    /// Keys of a multisig script in script order
    pub fn multisig_pubkeys(&self) -> Option<Vec<&[u8]>> {
        if !self.is_sent_to_multisig() {
            return None;
        }
        let c = self.chunks();
        c[1..c.len() - 2].iter().map(ScriptChunk::data).collect()
    }

    /// Signatures needed to satisfy the script; `None` when the template does not say
    /// (P2SH, non-standard).
    pub fn number_of_signatures_required_to_spend(&self) -> Option<usize> {
        if self.is_sent_to_multisig() {
            is_small_num(&self.chunks()[0])
        } else if self.is_sent_to_address() || self.is_sent_to_raw_pubkey() {
            Some(1)
        } else {
            None
        }
    }

    pub fn cltv_sender_pubkey(&self) -> Option<&[u8]> {
        if !self.is_sent_to_cltv_payment_channel() {
            return None;
        }
        self.chunks()[8].data()
    }

    pub fn cltv_recipient_pubkey(&self) -> Option<&[u8]> {
        if !self.is_sent_to_cltv_payment_channel() {
            return None;
        }
        self.chunks()[1].data()
    }

    /// Lock time after which the sender can reclaim the channel funds
    pub fn cltv_expiry(&self) -> Option<BigInt> {
        if !self.is_sent_to_cltv_payment_channel() {
            return None;
        }
        let chunk = &self.chunks()[4];
        match chunk.data() {
            Some(data) => cast_to_big_int(data, LOCKTIME_NUM_MAX_LEN, false).ok(),
            None => chunk.decode_op_n().map(BigInt::from),
        }
    }
}
