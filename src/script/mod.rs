//! Script model and parser
//!
//! A script is a sequence of chunks: data pushes and opcodes. Parsing keeps the exact
//! program bytes alongside the chunks, and each chunk records its byte offset so that
//! code-separator positions and FindAndDelete stay aligned with the original program.

use std::fmt;
use std::sync::OnceLock;

use crate::error::{ConsensusError, Result};
use crate::opcodes::*;

pub mod builder;
pub mod classify;
pub mod interpreter;
pub mod signature;
pub mod verify;

pub use builder::ScriptBuilder;
pub use classify::ScriptType;
pub use interpreter::{eval_script, execute_script, TxContext};
pub use signature::TransactionSignature;
pub use verify::correctly_spends;

/// Payload of a chunk
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum ChunkKind {
    /// Any opcode that is not a data push, `OP_1NEGATE` and `OP_1`..`OP_16` included
    Opcode(u8),
    /// `OP_0`, a direct push of 1..=75 bytes, or `OP_PUSHDATA1/2/4`
    PushData { opcode: u8, data: Vec<u8> },
}

#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct ScriptChunk {
    pub kind: ChunkKind,
    /// Byte offset of the opcode within the program
    pub offset: usize,
}

impl ScriptChunk {
    pub fn new(kind: ChunkKind, offset: usize) -> Self {
        Self { kind, offset }
    }

    pub fn opcode(&self) -> u8 {
        match self.kind {
            ChunkKind::Opcode(op) => op,
            ChunkKind::PushData { opcode, .. } => opcode,
        }
    }

    pub fn data(&self) -> Option<&[u8]> {
        match &self.kind {
            ChunkKind::Opcode(_) => None,
            ChunkKind::PushData { data, .. } => Some(data),
        }
    }

    pub fn equals_op(&self, op: u8) -> bool {
        self.opcode() == op
    }

    /// Opcodes above `OP_PUSHDATA4`; note `OP_1NEGATE` and `OP_N` are both opcodes and
    /// pushes.
    pub fn is_opcode(&self) -> bool {
        self.opcode() > OP_PUSHDATA4
    }

    /// Anything that only places a value on the stack, `OP_1NEGATE` and `OP_N` included
    pub fn is_push_data(&self) -> bool {
        self.opcode() <= OP_16
    }

    /// Small-integer value of `OP_0`, `OP_1NEGATE` or `OP_N`
    pub fn decode_op_n(&self) -> Option<i32> {
        decode_from_op_n(self.opcode())
    }

    /// Whether this push uses the shortest encoding available for its data
    pub fn is_shortest_possible_push_data(&self) -> bool {
        let ChunkKind::PushData { opcode, data } = &self.kind else {
            return true;
        };
        let opcode = *opcode;
        if data.is_empty() {
            return opcode == OP_0;
        }
        if data.len() == 1 {
            let b = data[0];
            if (1..=16).contains(&b) {
                return opcode == OP_1 + b - 1;
            }
            if b == 0x81 {
                return opcode == OP_1NEGATE;
            }
        }
        if data.len() < OP_PUSHDATA1 as usize {
            opcode as usize == data.len()
        } else if data.len() < 256 {
            opcode == OP_PUSHDATA1
        } else if data.len() < 65536 {
            opcode == OP_PUSHDATA2
        } else {
            opcode == OP_PUSHDATA4
        }
    }

    /// Serialized size of the chunk
    pub fn encoded_len(&self) -> usize {
        match &self.kind {
            ChunkKind::Opcode(_) => 1,
            ChunkKind::PushData { opcode, data } => {
                let prefix = match *opcode {
                    OP_PUSHDATA1 => 2,
                    OP_PUSHDATA2 => 3,
                    OP_PUSHDATA4 => 5,
                    _ => 1,
                };
                prefix + data.len()
            }
        }
    }

    pub fn write(&self, out: &mut Vec<u8>) {
        match &self.kind {
            ChunkKind::Opcode(op) => out.push(*op),
            ChunkKind::PushData { opcode, data } => {
                out.push(*opcode);
                match *opcode {
                    OP_PUSHDATA1 => out.push(data.len() as u8),
                    OP_PUSHDATA2 => out.extend_from_slice(&(data.len() as u16).to_le_bytes()),
                    OP_PUSHDATA4 => out.extend_from_slice(&(data.len() as u32).to_le_bytes()),
                    _ => {}
                }
                out.extend_from_slice(data);
            }
        }
    }
}

impl fmt::Display for ScriptChunk {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match &self.kind {
            ChunkKind::Opcode(op) => match name(*op) {
                Some(n) => f.write_str(n),
                None => write!(f, "NON_OP({op})"),
            },
            ChunkKind::PushData { opcode: OP_0, .. } => f.write_str("0"),
            ChunkKind::PushData { opcode, data } => {
                match *opcode {
                    OP_PUSHDATA1 => f.write_str("PUSHDATA1")?,
                    OP_PUSHDATA2 => f.write_str("PUSHDATA2")?,
                    OP_PUSHDATA4 => f.write_str("PUSHDATA4")?,
                    n => write!(f, "PUSHDATA({n})")?,
                }
                write!(f, "[{}]", hex::encode(data))
            }
        }
    }
}

/// Push-data encoding of `data` using the shortest PUSHDATA form.
///
/// Unlike [`ScriptBuilder::data`] this never substitutes `OP_N` for single bytes; it is
/// the form FindAndDelete searches for when stripping a signature.
pub fn push_data_bytes(data: &[u8]) -> Vec<u8> {
    let mut out = Vec::with_capacity(data.len() + 5);
    let len = data.len();
    if len < OP_PUSHDATA1 as usize {
        out.push(len as u8);
    } else if len < 256 {
        out.push(OP_PUSHDATA1);
        out.push(len as u8);
    } else if len < 65536 {
        out.push(OP_PUSHDATA2);
        out.extend_from_slice(&(len as u16).to_le_bytes());
    } else {
        out.push(OP_PUSHDATA4);
        out.extend_from_slice(&(len as u32).to_le_bytes());
    }
    out.extend_from_slice(data);
    out
}

/// Parsed or built script
#[derive(Debug, Clone, Default)]
pub struct Script {
    chunks: Vec<ScriptChunk>,
    program: OnceLock<Vec<u8>>,
}

impl Script {
    /// Parse program bytes into chunks in a single pass
    ///
    /// # Errors
    ///
    /// `ScriptParse` when a PUSHDATA length field is cut short or a push claims more
    /// bytes than remain.
    pub fn parse(bytes: &[u8]) -> Result<Script> {
        let mut chunks = Vec::new();
        let mut pos = 0;

        while pos < bytes.len() {
            let offset = pos;
            let opcode = bytes[pos];
            pos += 1;

            let width = match opcode {
                OP_PUSHDATA1 => 1,
                OP_PUSHDATA2 => 2,
                OP_PUSHDATA4 => 4,
                op if op < OP_PUSHDATA1 => 0,
                op => {
                    chunks.push(ScriptChunk::new(ChunkKind::Opcode(op), offset));
                    continue;
                }
            };

            let data_len = if width == 0 {
                opcode as usize
            } else {
                if bytes.len() - pos < width {
                    return Err(ConsensusError::ScriptParse {
                        offset,
                        reason: "unexpected end of script".to_string(),
                    });
                }
                let mut raw = [0u8; 4];
                raw[..width].copy_from_slice(&bytes[pos..pos + width]);
                pos += width;
                u32::from_le_bytes(raw) as usize
            };

            if data_len > bytes.len() - pos {
                return Err(ConsensusError::ScriptParse {
                    offset,
                    reason: "push exceeds remaining data".to_string(),
                });
            }
            let data = bytes[pos..pos + data_len].to_vec();
            pos += data_len;
            chunks.push(ScriptChunk::new(ChunkKind::PushData { opcode, data }, offset));
        }

        Ok(Self::from_parts(chunks, bytes.to_vec()))
    }

    fn from_parts(chunks: Vec<ScriptChunk>, program: Vec<u8>) -> Script {
        Script {
            chunks,
            program: OnceLock::from(program),
        }
    }

    /// Assemble a script from chunk payloads; offsets are assigned in order and the
    /// program bytes are produced on first use.
    pub fn from_chunks(kinds: impl IntoIterator<Item = ChunkKind>) -> Script {
        let mut offset = 0;
        let chunks = kinds
            .into_iter()
            .map(|kind| {
                let chunk = ScriptChunk::new(kind, offset);
                offset += chunk.encoded_len();
                chunk
            })
            .collect();
        Script {
            chunks,
            program: OnceLock::new(),
        }
    }

    pub fn chunks(&self) -> &[ScriptChunk] {
        &self.chunks
    }

    /// Program bytes
    pub fn program(&self) -> &[u8] {
        self.program.get_or_init(|| {
            let mut out = Vec::with_capacity(self.chunks.iter().map(|c| c.encoded_len()).sum());
            for chunk in &self.chunks {
                chunk.write(&mut out);
            }
            out
        })
    }

    pub fn len(&self) -> usize {
        self.program().len()
    }

    pub fn is_empty(&self) -> bool {
        self.chunks.is_empty()
    }

    /// True when every chunk only pushes data
    pub fn is_push_only(&self) -> bool {
        self.chunks.iter().all(ScriptChunk::is_push_data)
    }

    /// The part of the script starting at chunk-aligned byte `from`
    pub fn sub_script(&self, from: usize) -> Script {
        let program = self.program();
        let from = from.min(program.len());
        let chunks = self
            .chunks
            .iter()
            .filter(|c| c.offset >= from)
            .map(|c| ScriptChunk::new(c.kind.clone(), c.offset - from))
            .collect();
        Self::from_parts(chunks, program[from..].to_vec())
    }

    /// Remove every chunk whose encoding starts with `pattern` (FindAndDelete).
    ///
    /// Matching is chunk-aligned: a pattern that appears inside a push is left alone.
    pub fn remove_all_instances_of(&self, pattern: &[u8]) -> Script {
        let program = self.program();
        let mut kept = Vec::with_capacity(self.chunks.len());
        let mut out = Vec::with_capacity(program.len());
        for (i, chunk) in self.chunks.iter().enumerate() {
            let end = self
                .chunks
                .get(i + 1)
                .map_or(program.len(), |next| next.offset);
            if !pattern.is_empty() && program[chunk.offset..].starts_with(pattern) {
                continue;
            }
            kept.push(ScriptChunk::new(chunk.kind.clone(), out.len()));
            out.extend_from_slice(&program[chunk.offset..end]);
        }
        Self::from_parts(kept, out)
    }

    pub fn remove_all_instances_of_op(&self, op: u8) -> Script {
        self.remove_all_instances_of(&[op])
    }

    /// Count signature operations.
    ///
    /// With `accurate`, a CHECKMULTISIG preceded by `OP_N` counts N; otherwise it
    /// counts the maximum of 20 keys.
    pub fn sig_op_count(&self, accurate: bool) -> usize {
        let mut count = 0;
        let mut last_op = OP_INVALIDOPCODE;
        for chunk in &self.chunks {
            let op = chunk.opcode();
            if chunk.is_opcode() {
                match op {
                    OP_CHECKSIG | OP_CHECKSIGVERIFY => count += 1,
                    OP_CHECKMULTISIG | OP_CHECKMULTISIGVERIFY => {
                        if accurate && (OP_1..=OP_16).contains(&last_op) {
                            count += decode_from_op_n(last_op).unwrap_or(0) as usize;
                        } else {
                            count += crate::constants::MAX_PUBKEYS_PER_MULTISIG;
                        }
                    }
                    _ => {}
                }
            }
            last_op = op;
        }
        count
    }
}

impl PartialEq for Script {
    fn eq(&self, other: &Self) -> bool {
        self.program() == other.program()
    }
}

impl Eq for Script {}

impl fmt::Display for Script {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for (i, chunk) in self.chunks.iter().enumerate() {
            if i > 0 {
                f.write_str(" ")?;
            }
            write!(f, "{chunk}")?;
        }
        Ok(())
    }
}
