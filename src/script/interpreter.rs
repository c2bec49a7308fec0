//! Script interpreter
//!
//! Executes a parsed script against a stack. Evaluation aborts at the first failing
//! opcode with a `ScriptError`; there is no partial result.
//!
//! Limits enforced while running:
//! - at most 201 non-push operations (CHECKMULTISIG also counts its keys)
//! - stack plus altstack depth at most 1000
//! - pushed elements at most 520 bytes, checked even in skipped branches

use num_bigint::BigInt;
use num_traits::{One, Signed, ToPrimitive, Zero};
use secp256k1::PublicKey;
use tracing::{debug, trace};

use super::signature::{
    has_defined_hash_type, is_valid_pubkey_encoding, is_valid_signature_encoding,
    TransactionSignature,
};
use super::{push_data_bytes, ChunkKind, Script, ScriptChunk};
use crate::constants::*;
use crate::crypto;
use crate::error::{ConsensusError, Result, ScriptError};
use crate::opcodes::*;
use crate::serialization::primitives::{decode_mpi, encode_mpi, reverse_bytes};
use crate::sighash::hash_for_signature_script;
use crate::types::{ByteString, Transaction, VerifyFlags};

/// The transaction input a script is being evaluated for
#[derive(Debug, Clone, Copy)]
pub struct TxContext<'a> {
    pub tx: &'a Transaction,
    pub input_index: usize,
}

impl<'a> TxContext<'a> {
    pub fn new(tx: &'a Transaction, input_index: usize) -> Self {
        Self { tx, input_index }
    }
}

/// Truthiness of a stack element: any non-zero byte, except a lone sign bit in the
/// last position (negative zero).
pub fn cast_to_bool(data: &[u8]) -> bool {
    for (i, &b) in data.iter().enumerate() {
        if b != 0 {
            return !(i == data.len() - 1 && b == 0x80);
        }
    }
    false
}

/// Interpret a stack element as a little-endian sign-magnitude number
pub fn cast_to_big_int(data: &[u8], max_len: usize, require_minimal: bool) -> Result<BigInt> {
    if data.len() > max_len {
        return Err(ScriptError::NumberOverflow.into());
    }
    if require_minimal {
        if let Some(&last) = data.last() {
            // The last byte may only be 0x00/0x80 if the byte before needs its sign bit
            if last & 0x7f == 0 && (data.len() == 1 || data[data.len() - 2] & 0x80 == 0) {
                return Err(ScriptError::MinimalData.into());
            }
        }
    }
    decode_mpi(&reverse_bytes(data), false)
}

/// Minimal stack encoding of a number
pub fn encode_num(n: &BigInt) -> Vec<u8> {
    reverse_bytes(&encode_mpi(n, false))
}

fn encode_bool(b: bool) -> Vec<u8> {
    if b {
        vec![1]
    } else {
        Vec::new()
    }
}

fn pop(stack: &mut Vec<ByteString>) -> Result<ByteString> {
    stack
        .pop()
        .ok_or(ConsensusError::ScriptEvaluation(ScriptError::InvalidStackOperation))
}

fn require(stack: &[ByteString], n: usize) -> Result<()> {
    if stack.len() < n {
        return Err(ScriptError::InvalidStackOperation.into());
    }
    Ok(())
}

/// Element `depth` positions below the top (0 is the top)
fn peek(stack: &[ByteString], depth: usize) -> Result<&ByteString> {
    require(stack, depth + 1)?;
    Ok(&stack[stack.len() - 1 - depth])
}

struct Interpreter<'s, 'c> {
    ctx: Option<&'c TxContext<'c>>,
    script: &'s Script,
    flags: VerifyFlags,
    alt_stack: Vec<ByteString>,
    if_stack: Vec<bool>,
    op_count: usize,
    last_code_sep: usize,
}

/// Execute `script` on `stack`.
///
/// `ctx` identifies the spending input; without it signature checks evaluate to
/// false and CHECKLOCKTIMEVERIFY fails.
pub fn execute_script(
    ctx: Option<&TxContext<'_>>,
    script: &Script,
    stack: &mut Vec<ByteString>,
    flags: VerifyFlags,
) -> Result<()> {
    let mut interp = Interpreter {
        ctx,
        script,
        flags,
        alt_stack: Vec::new(),
        if_stack: Vec::new(),
        op_count: 0,
        last_code_sep: 0,
    };
    interp.run(stack)
}

/// Parse and execute `script` without a transaction, then report whether the top of
/// the stack is true.
pub fn eval_script(script: &[u8], stack: &mut Vec<ByteString>, flags: VerifyFlags) -> Result<bool> {
    let script = Script::parse(script)?;
    execute_script(None, &script, stack, flags)?;
    Ok(stack.last().is_some_and(|top| cast_to_bool(top)))
}

impl<'s, 'c> Interpreter<'s, 'c> {
    fn run(&mut self, stack: &mut Vec<ByteString>) -> Result<()> {
        let script = self.script;
        for chunk in script.chunks() {
            let should_execute = !self.if_stack.contains(&false);

            match &chunk.kind {
                ChunkKind::PushData { data, .. } => {
                    if data.len() > MAX_SCRIPT_ELEMENT_SIZE {
                        return Err(ScriptError::PushSize.into());
                    }
                    if should_execute {
                        if self.flags.requires_minimal() && !chunk.is_shortest_possible_push_data()
                        {
                            return Err(ScriptError::MinimalData.into());
                        }
                        stack.push(data.clone());
                    }
                }
                ChunkKind::Opcode(op) => {
                    let op = *op;
                    if op > OP_16 {
                        self.add_ops(1)?;
                    }
                    if op == OP_VERIF || op == OP_VERNOTIF {
                        return Err(ScriptError::BadOpcode(op).into());
                    }
                    if is_disabled(op) {
                        return Err(ScriptError::DisabledOpcode(op).into());
                    }
                    if should_execute || (OP_IF..=OP_ENDIF).contains(&op) {
                        trace!(
                            opcode = name(op).unwrap_or("NON_OP"),
                            depth = stack.len(),
                            "execute"
                        );
                        self.execute_opcode(chunk, op, should_execute, stack)?;
                    }
                }
            }

            if stack.len() + self.alt_stack.len() > MAX_STACK_SIZE {
                return Err(ScriptError::StackSize.into());
            }
        }

        if !self.if_stack.is_empty() {
            return Err(ScriptError::UnbalancedConditional.into());
        }
        Ok(())
    }

    fn add_ops(&mut self, n: usize) -> Result<()> {
        self.op_count += n;
        if self.op_count > MAX_SCRIPT_OPS {
            return Err(ScriptError::TooManyOperations.into());
        }
        Ok(())
    }

    fn pop_num(&self, stack: &mut Vec<ByteString>) -> Result<BigInt> {
        let top = pop(stack)?;
        cast_to_big_int(&top, SCRIPT_NUM_MAX_LEN, self.flags.requires_minimal())
    }

    fn execute_opcode(
        &mut self,
        chunk: &ScriptChunk,
        op: u8,
        should_execute: bool,
        stack: &mut Vec<ByteString>,
    ) -> Result<()> {
        match op {
            OP_IF | OP_NOTIF => {
                if !should_execute {
                    self.if_stack.push(false);
                    return Ok(());
                }
                let Some(cond) = stack.pop() else {
                    return Err(ScriptError::UnbalancedConditional.into());
                };
                let value = cast_to_bool(&cond);
                self.if_stack.push(if op == OP_IF { value } else { !value });
            }
            OP_ELSE => match self.if_stack.last_mut() {
                Some(top) => *top = !*top,
                None => return Err(ScriptError::UnbalancedConditional.into()),
            },
            OP_ENDIF => {
                if self.if_stack.pop().is_none() {
                    return Err(ScriptError::UnbalancedConditional.into());
                }
            }

            OP_1NEGATE => stack.push(encode_num(&BigInt::from(-1))),
            OP_1..=OP_16 => {
                let n = decode_from_op_n(op).unwrap_or(0);
                stack.push(encode_num(&BigInt::from(n)));
            }
            OP_NOP => {}

            OP_VERIFY => {
                if !cast_to_bool(&pop(stack)?) {
                    return Err(ScriptError::Verify.into());
                }
            }
            OP_RETURN => return Err(ScriptError::OpReturn.into()),

            OP_TOALTSTACK => {
                let item = pop(stack)?;
                self.alt_stack.push(item);
            }
            OP_FROMALTSTACK => {
                let item = self.alt_stack.pop().ok_or(ConsensusError::ScriptEvaluation(
                    ScriptError::InvalidAltstackOperation,
                ))?;
                stack.push(item);
            }
            OP_2DROP => {
                require(stack, 2)?;
                stack.truncate(stack.len() - 2);
            }
            OP_2DUP => {
                require(stack, 2)?;
                let len = stack.len();
                stack.extend_from_within(len - 2..);
            }
            OP_3DUP => {
                require(stack, 3)?;
                let len = stack.len();
                stack.extend_from_within(len - 3..);
            }
            OP_2OVER => {
                require(stack, 4)?;
                let len = stack.len();
                stack.extend_from_within(len - 4..len - 2);
            }
            OP_2ROT => {
                require(stack, 6)?;
                let len = stack.len();
                let moved: Vec<_> = stack.drain(len - 6..len - 4).collect();
                stack.extend(moved);
            }
            OP_2SWAP => {
                require(stack, 4)?;
                let len = stack.len();
                stack.swap(len - 4, len - 2);
                stack.swap(len - 3, len - 1);
            }
            OP_IFDUP => {
                let top = peek(stack, 0)?;
                if cast_to_bool(top) {
                    let top = top.clone();
                    stack.push(top);
                }
            }
            OP_DEPTH => stack.push(encode_num(&BigInt::from(stack.len()))),
            OP_DROP => {
                pop(stack)?;
            }
            OP_DUP => {
                let top = peek(stack, 0)?.clone();
                stack.push(top);
            }
            OP_NIP => {
                require(stack, 2)?;
                let len = stack.len();
                stack.remove(len - 2);
            }
            OP_OVER => {
                let item = peek(stack, 1)?.clone();
                stack.push(item);
            }
            OP_PICK | OP_ROLL => {
                let n = self.pop_num(stack)?;
                let depth = n
                    .to_usize()
                    .filter(|&d| d < stack.len())
                    .ok_or(ConsensusError::ScriptEvaluation(ScriptError::InvalidStackOperation))?;
                let index = stack.len() - 1 - depth;
                let item = if op == OP_ROLL {
                    stack.remove(index)
                } else {
                    stack[index].clone()
                };
                stack.push(item);
            }
            OP_ROT => {
                require(stack, 3)?;
                let len = stack.len();
                let item = stack.remove(len - 3);
                stack.push(item);
            }
            OP_SWAP => {
                require(stack, 2)?;
                let len = stack.len();
                stack.swap(len - 2, len - 1);
            }
            OP_TUCK => {
                require(stack, 2)?;
                let len = stack.len();
                let top = stack[len - 1].clone();
                stack.insert(len - 2, top);
            }
            OP_SIZE => {
                let size = peek(stack, 0)?.len();
                stack.push(encode_num(&BigInt::from(size)));
            }

            OP_EQUAL | OP_EQUALVERIFY => {
                require(stack, 2)?;
                let a = pop(stack)?;
                let b = pop(stack)?;
                let equal = a == b;
                if op == OP_EQUALVERIFY {
                    if !equal {
                        return Err(ScriptError::EqualVerify.into());
                    }
                } else {
                    stack.push(encode_bool(equal));
                }
            }

            OP_1ADD | OP_1SUB | OP_NEGATE | OP_ABS | OP_NOT | OP_0NOTEQUAL => {
                let n = self.pop_num(stack)?;
                let result = match op {
                    OP_1ADD => n + BigInt::one(),
                    OP_1SUB => n - BigInt::one(),
                    OP_NEGATE => -n,
                    OP_ABS => n.abs(),
                    OP_NOT => BigInt::from(n.is_zero() as u8),
                    _ => BigInt::from(!n.is_zero() as u8),
                };
                stack.push(encode_num(&result));
            }

            OP_ADD | OP_SUB | OP_BOOLAND | OP_BOOLOR | OP_NUMEQUAL | OP_NUMEQUALVERIFY
            | OP_NUMNOTEQUAL | OP_LESSTHAN | OP_GREATERTHAN | OP_LESSTHANOREQUAL
            | OP_GREATERTHANOREQUAL | OP_MIN | OP_MAX => {
                require(stack, 2)?;
                let b = self.pop_num(stack)?;
                let a = self.pop_num(stack)?;
                let result = match op {
                    OP_ADD => a + b,
                    OP_SUB => a - b,
                    OP_BOOLAND => BigInt::from((!a.is_zero() && !b.is_zero()) as u8),
                    OP_BOOLOR => BigInt::from((!a.is_zero() || !b.is_zero()) as u8),
                    OP_NUMEQUAL | OP_NUMEQUALVERIFY => BigInt::from((a == b) as u8),
                    OP_NUMNOTEQUAL => BigInt::from((a != b) as u8),
                    OP_LESSTHAN => BigInt::from((a < b) as u8),
                    OP_GREATERTHAN => BigInt::from((a > b) as u8),
                    OP_LESSTHANOREQUAL => BigInt::from((a <= b) as u8),
                    OP_GREATERTHANOREQUAL => BigInt::from((a >= b) as u8),
                    OP_MIN => a.min(b),
                    _ => a.max(b),
                };
                if op == OP_NUMEQUALVERIFY {
                    if result.is_zero() {
                        return Err(ScriptError::NumEqualVerify.into());
                    }
                } else {
                    stack.push(encode_num(&result));
                }
            }
            OP_WITHIN => {
                require(stack, 3)?;
                let max = self.pop_num(stack)?;
                let min = self.pop_num(stack)?;
                let x = self.pop_num(stack)?;
                stack.push(encode_bool(min <= x && x < max));
            }

            OP_RIPEMD160 => {
                let item = pop(stack)?;
                stack.push(crypto::ripemd160(&item).to_vec());
            }
            OP_SHA1 => {
                let item = pop(stack)?;
                stack.push(crypto::sha1(&item).to_vec());
            }
            OP_SHA256 => {
                let item = pop(stack)?;
                stack.push(crypto::sha256(&item).to_vec());
            }
            OP_HASH160 => {
                let item = pop(stack)?;
                stack.push(crypto::hash160(&item).to_vec());
            }
            OP_HASH256 => {
                let item = pop(stack)?;
                stack.push(crypto::sha256d(&item).to_vec());
            }

            OP_CODESEPARATOR => self.last_code_sep = chunk.offset + 1,
            OP_CHECKSIG | OP_CHECKSIGVERIFY => self.op_check_sig(op, stack)?,
            OP_CHECKMULTISIG | OP_CHECKMULTISIGVERIFY => self.op_check_multisig(op, stack)?,

            OP_CHECKLOCKTIMEVERIFY => {
                if self.flags.contains(VerifyFlags::CHECKLOCKTIMEVERIFY) {
                    self.op_check_lock_time_verify(stack)?;
                } else if self.flags.contains(VerifyFlags::DISCOURAGE_UPGRADABLE_NOPS) {
                    return Err(ScriptError::DiscourageUpgradableNops(op).into());
                }
            }
            OP_NOP1 | OP_NOP3..=OP_NOP10 => {
                if self.flags.contains(VerifyFlags::DISCOURAGE_UPGRADABLE_NOPS) {
                    return Err(ScriptError::DiscourageUpgradableNops(op).into());
                }
            }

            _ => return Err(ScriptError::BadOpcode(op).into()),
        }
        Ok(())
    }

    /// The script a signature commits to: everything after the last executed
    /// CODESEPARATOR
    fn connected_script(&self) -> Script {
        self.script.sub_script(self.last_code_sep)
    }

    fn op_check_sig(&mut self, op: u8, stack: &mut Vec<ByteString>) -> Result<()> {
        require(stack, 2)?;
        let pubkey = pop(stack)?;
        let sig = pop(stack)?;

        let connected = self
            .connected_script()
            .remove_all_instances_of(&push_data_bytes(&sig));
        let valid = self.check_signature(&connected, &sig, &pubkey)?;

        if op == OP_CHECKSIGVERIFY {
            if !valid {
                return Err(ScriptError::CheckSigVerify.into());
            }
        } else {
            stack.push(encode_bool(valid));
        }
        Ok(())
    }

    fn op_check_multisig(&mut self, op: u8, stack: &mut Vec<ByteString>) -> Result<()> {
        let key_count = self
            .pop_num(stack)?
            .to_usize()
            .filter(|&n| n <= MAX_PUBKEYS_PER_MULTISIG)
            .ok_or(ConsensusError::ScriptEvaluation(ScriptError::PubkeyCount))?;
        self.add_ops(key_count)?;

        require(stack, key_count + 1)?;
        let pubkeys: Vec<ByteString> =
            (0..key_count).map(|_| pop(stack)).collect::<Result<_>>()?;

        let sig_count = self
            .pop_num(stack)?
            .to_usize()
            .filter(|&n| n <= key_count)
            .ok_or(ConsensusError::ScriptEvaluation(ScriptError::SigCount))?;
        require(stack, sig_count + 1)?;
        let sigs: Vec<ByteString> = (0..sig_count).map(|_| pop(stack)).collect::<Result<_>>()?;

        let mut connected = self.connected_script();
        for sig in &sigs {
            connected = connected.remove_all_instances_of(&push_data_bytes(sig));
        }

        // Keys and signatures are checked in pop order, starting from the last one pushed.
        // A key that fails to match is consumed, so signatures must follow the key order.
        let mut valid = true;
        let (mut isig, mut ikey) = (0, 0);
        while isig < sigs.len() {
            if sigs.len() - isig > pubkeys.len() - ikey {
                valid = false;
                break;
            }
            if self.check_signature(&connected, &sigs[isig], &pubkeys[ikey])? {
                isig += 1;
            }
            ikey += 1;
        }

        let dummy = pop(stack)?;
        if self.flags.contains(VerifyFlags::NULLDUMMY) && !dummy.is_empty() {
            return Err(ScriptError::SigNullDummy.into());
        }

        if op == OP_CHECKMULTISIGVERIFY {
            if !valid {
                return Err(ScriptError::CheckMultiSigVerify.into());
            }
        } else {
            stack.push(encode_bool(valid));
        }
        Ok(())
    }

    /// Verify one signature against one key.
    ///
    /// Encoding violations are hard errors only under the strict-encoding flags;
    /// anything else that fails to decode or verify is simply an invalid signature.
    fn check_signature(&self, connected: &Script, sig: &[u8], pubkey: &[u8]) -> Result<bool> {
        if self.flags.requires_canonical() && !sig.is_empty() {
            if !is_valid_signature_encoding(sig) {
                return Err(ScriptError::SigDer.into());
            }
            if self.flags.contains(VerifyFlags::STRICTENC) && !has_defined_hash_type(sig) {
                return Err(ScriptError::SigHashType.into());
            }
        }
        if self.flags.contains(VerifyFlags::STRICTENC) && !is_valid_pubkey_encoding(pubkey) {
            return Err(ScriptError::PubkeyType.into());
        }

        let Some(ctx) = self.ctx else {
            debug!("signature check without transaction context");
            return Ok(false);
        };

        let tx_sig = match TransactionSignature::decode(
            sig,
            false,
            self.flags.contains(VerifyFlags::LOW_S),
        ) {
            Ok(tx_sig) => tx_sig,
            Err(err) => {
                debug!(%err, "signature rejected");
                return Ok(false);
            }
        };
        let pubkey = match PublicKey::from_slice(pubkey) {
            Ok(pubkey) => pubkey,
            Err(err) => {
                debug!(%err, "public key rejected");
                return Ok(false);
            }
        };

        let hash =
            hash_for_signature_script(ctx.tx, ctx.input_index, connected, tx_sig.sighash_type)?;
        Ok(crypto::verify_ecdsa(&hash, &tx_sig.signature, &pubkey))
    }

    fn op_check_lock_time_verify(&self, stack: &[ByteString]) -> Result<()> {
        let top = peek(stack, 0)?;
        // 5 bytes so the operand can express times past 2038
        let lock_time = cast_to_big_int(top, LOCKTIME_NUM_MAX_LEN, self.flags.requires_minimal())?;
        if lock_time.is_negative() {
            return Err(ScriptError::NegativeLockTime.into());
        }
        let lock_time = lock_time
            .to_i64()
            .ok_or(ConsensusError::ScriptEvaluation(ScriptError::UnsatisfiedLockTime))?;

        let Some(ctx) = self.ctx else {
            return Err(ScriptError::UnsatisfiedLockTime.into());
        };
        let tx_lock_time = ctx.tx.lock_time as i64;
        let threshold = LOCKTIME_THRESHOLD as i64;

        // Heights and timestamps are not comparable
        if (tx_lock_time < threshold) != (lock_time < threshold) {
            return Err(ScriptError::UnsatisfiedLockTime.into());
        }
        if lock_time > tx_lock_time {
            return Err(ScriptError::UnsatisfiedLockTime.into());
        }

        let input = ctx
            .tx
            .inputs
            .get(ctx.input_index)
            .ok_or(ConsensusError::InvalidInputIndex(ctx.input_index))?;
        // A final input disables the transaction's lock time altogether
        if !input.has_sequence() {
            return Err(ScriptError::UnsatisfiedLockTime.into());
        }
        Ok(())
    }
}
