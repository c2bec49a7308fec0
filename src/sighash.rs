//! Legacy signature hash
//!
//! The digest a CHECKSIG signature commits to: a copy of the spending transaction with
//! input scripts blanked, the connected script in the signed input, and outputs and
//! sequences pruned according to the sighash type.

use tracing::trace;

use crate::crypto::sha256d;
use crate::error::{ConsensusError, Result};
use crate::opcodes::OP_CODESEPARATOR;
use crate::script::Script;
use crate::serialization::output::{write_output, write_output_raw};
use crate::serialization::primitives::write_u32_le;
use crate::serialization::transaction::{write_input, write_tail};
use crate::serialization::varint::VarInt;
use crate::types::{Hash, SigHash, SighashType, Transaction};

/// Value bytes of a blanked output: the signed encoding of -1
const BLANK_OUTPUT_VALUE: [u8; 1] = [0xff];

/// Digest signed for SIGHASH_SINGLE when the input has no matching output
const SINGLE_WITHOUT_OUTPUT: Hash = {
    let mut h = [0u8; 32];
    h[0] = 1;
    h
};

/// Compute the signature hash for `input_index` over raw connected script bytes.
///
/// # Errors
///
/// `InvalidInputIndex` if the transaction has no such input; `ScriptParse` if the
/// connected script is not a valid script.
pub fn hash_for_signature(
    tx: &Transaction,
    input_index: usize,
    connected_script: &[u8],
    sighash_type: SighashType,
) -> Result<Hash> {
    let script = Script::parse(connected_script)?;
    hash_for_signature_script(tx, input_index, &script, sighash_type)
}

pub fn hash_for_signature_script(
    tx: &Transaction,
    input_index: usize,
    connected_script: &Script,
    sighash_type: SighashType,
) -> Result<Hash> {
    if input_index >= tx.inputs.len() {
        return Err(ConsensusError::InvalidInputIndex(input_index));
    }

    let mut tx = tx.clone();
    for input in tx.inputs.iter_mut() {
        input.script_sig.clear();
    }
    tx.inputs[input_index].script_sig = connected_script
        .remove_all_instances_of_op(OP_CODESEPARATOR)
        .program()
        .to_vec();

    // Outputs before the signed one are blanked under SINGLE
    let mut blanked = 0;
    match sighash_type.mode() {
        SigHash::All => {}
        SigHash::None => {
            tx.outputs.clear();
            zero_other_sequences(&mut tx, input_index);
        }
        SigHash::Single => {
            if input_index >= tx.outputs.len() {
                trace!(
                    input_index,
                    outputs = tx.outputs.len(),
                    "SIGHASH_SINGLE without matching output"
                );
                return Ok(SINGLE_WITHOUT_OUTPUT);
            }
            tx.outputs.truncate(input_index + 1);
            blanked = input_index;
            zero_other_sequences(&mut tx, input_index);
        }
    }

    if sighash_type.anyone_can_pay() {
        let signed = tx.inputs.swap_remove(input_index);
        tx.inputs = vec![signed];
    }

    let mut preimage = Vec::with_capacity(256);
    write_u32_le(&mut preimage, tx.version);
    VarInt::write(&mut preimage, tx.inputs.len() as u64);
    for input in &tx.inputs {
        write_input(&mut preimage, input);
    }
    VarInt::write(&mut preimage, tx.outputs.len() as u64);
    for (i, output) in tx.outputs.iter().enumerate() {
        if i < blanked {
            write_output_raw(&mut preimage, &BLANK_OUTPUT_VALUE, &[], &[]);
        } else {
            write_output(&mut preimage, output);
        }
    }
    write_u32_le(&mut preimage, tx.lock_time);
    write_tail(&mut preimage, &tx);
    write_u32_le(&mut preimage, sighash_type.0 as u32);

    Ok(sha256d(&preimage))
}

fn zero_other_sequences(tx: &mut Transaction, input_index: usize) {
    for (i, input) in tx.inputs.iter_mut().enumerate() {
        if i != input_index {
            input.sequence = 0;
        }
    }
}
