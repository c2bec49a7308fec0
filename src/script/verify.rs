//! Spend verification
//!
//! Decides whether an unlocking script satisfies a locking script for a given input.
//! `Ok(())` means the spend is authorized; any error means it is not.

use tracing::{debug, trace};

use super::interpreter::{cast_to_bool, execute_script, TxContext};
use super::Script;
use crate::constants::MAX_SCRIPT_SIZE;
use crate::error::{ConsensusError, Result, ScriptError};
use crate::opcodes::OP_16;
use crate::types::{ByteString, Transaction, VerifyFlags};

fn top_is_true(stack: &[ByteString]) -> bool {
    stack.last().is_some_and(|top| cast_to_bool(top))
}

/// Verify that `unlocking` spends `locking` for input `input_index` of `tx`.
///
/// 1. Run the unlocking script, then the locking script on the resulting stack
/// 2. Require a true value on top
/// 3. For P2SH outputs (with `VerifyFlags::P2SH`), run the serialized redeem script
///    pushed by the unlocking script against the remaining pushed values
/// 4. With `VerifyFlags::CLEANSTACK` and `VerifyFlags::P2SH`, require exactly one element
///    to remain
pub fn correctly_spends(
    unlocking: &Script,
    tx: &Transaction,
    input_index: usize,
    locking: &Script,
    flags: VerifyFlags,
) -> Result<()> {
    // Scripts run against a private copy of the transaction
    let tx = tx.clone();
    if input_index >= tx.inputs.len() {
        return Err(ConsensusError::InvalidInputIndex(input_index));
    }
    let ctx = TxContext::new(&tx, input_index);

    if unlocking.len() > MAX_SCRIPT_SIZE || locking.len() > MAX_SCRIPT_SIZE {
        return Err(ScriptError::ScriptSize.into());
    }
    if flags.contains(VerifyFlags::SIGPUSHONLY) && !unlocking.is_push_only() {
        return Err(ScriptError::SigPushOnly.into());
    }

    let mut stack: Vec<ByteString> = Vec::new();
    execute_script(Some(&ctx), unlocking, &mut stack, flags)?;
    trace!(depth = stack.len(), "unlocking script executed");

    let p2sh_stack = if flags.contains(VerifyFlags::P2SH) {
        Some(stack.clone())
    } else {
        None
    };

    execute_script(Some(&ctx), locking, &mut stack, flags)?;
    if !top_is_true(&stack) {
        debug!(input_index, "locking script left false on the stack");
        return Err(ScriptError::EvalFalse.into());
    }

    let final_stack = match p2sh_stack {
        Some(mut p2sh_stack) if locking.is_pay_to_script_hash() => {
            // Only pushes may build the redeem script's arguments
            if unlocking.chunks().iter().any(|c| c.opcode() > OP_16) {
                return Err(ScriptError::SigPushOnly.into());
            }
            let redeem_bytes = p2sh_stack
                .pop()
                .ok_or(ConsensusError::ScriptEvaluation(ScriptError::InvalidStackOperation))?;
            let redeem = Script::parse(&redeem_bytes)?;
            trace!(redeem = %redeem, "executing redeem script");

            execute_script(Some(&ctx), &redeem, &mut p2sh_stack, flags)?;
            if !top_is_true(&p2sh_stack) {
                debug!(input_index, "redeem script left false on the stack");
                return Err(ScriptError::EvalFalse.into());
            }
            p2sh_stack
        }
        _ => stack,
    };

    // CLEANSTACK is only meaningful alongside P2SH
    if flags.contains(VerifyFlags::CLEANSTACK | VerifyFlags::P2SH) && final_stack.len() != 1 {
        return Err(ScriptError::CleanStack.into());
    }

    debug!(input_index, "spend verified");
    Ok(())
}
