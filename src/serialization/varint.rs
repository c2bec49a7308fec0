//! VarInt encoding/decoding
//!
//! Compact integer encoding used for every count and length prefix on the wire.
//!
//! Encoding rules:
//! - If value < 0xfd: single byte
//! - If value <= 0xffff: 0xfd prefix + 2 bytes (little-endian)
//! - If value <= 0xffffffff: 0xfe prefix + 4 bytes (little-endian)
//! - Otherwise: 0xff prefix + 8 bytes (little-endian)
//!
//! Decoding accepts wider-than-necessary markers unless the codec runs in strict mode;
//! the number of bytes actually consumed is kept in `encoded_len` so callers advance
//! their cursor by what was on the wire.

use crate::config::VarIntStrictness;
use crate::error::{ConsensusError, Result};

/// A decoded VarInt together with the width it occupied on the wire
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct VarInt {
    pub value: u64,
    pub encoded_len: usize,
}

impl VarInt {
    /// Wrap a value; `encoded_len` is the canonical width.
    pub fn new(value: u64) -> Self {
        Self {
            value,
            encoded_len: Self::size_of(value),
        }
    }

    /// Number of bytes the canonical encoding of `value` occupies
    pub fn size_of(value: u64) -> usize {
        if value < 0xfd {
            1
        } else if value <= 0xffff {
            3
        } else if value <= 0xffff_ffff {
            5
        } else {
            9
        }
    }

    /// Encode a value in its minimal form
    ///
    /// # Examples
    ///
    /// ```
    /// use tangle_consensus::serialization::varint::VarInt;
    ///
    /// assert_eq!(VarInt::encode(0), vec![0]);
    /// assert_eq!(VarInt::encode(252), vec![252]);
    /// assert_eq!(VarInt::encode(253), vec![0xfd, 253, 0]);
    /// assert_eq!(VarInt::encode(65536), vec![0xfe, 0, 0, 1, 0]);
    /// ```
    pub fn encode(value: u64) -> Vec<u8> {
        let mut out = Vec::with_capacity(Self::size_of(value));
        Self::write(&mut out, value);
        out
    }

    /// Append the minimal encoding of `value` to `out`
    pub fn write(out: &mut Vec<u8>, value: u64) {
        if value < 0xfd {
            out.push(value as u8);
        } else if value <= 0xffff {
            out.push(0xfd);
            out.extend_from_slice(&(value as u16).to_le_bytes());
        } else if value <= 0xffff_ffff {
            out.push(0xfe);
            out.extend_from_slice(&(value as u32).to_le_bytes());
        } else {
            out.push(0xff);
            out.extend_from_slice(&value.to_le_bytes());
        }
    }

    /// Decode a VarInt starting at `offset`
    ///
    /// # Errors
    ///
    /// `TruncatedInput` when fewer bytes remain than the marker announces;
    /// `MalformedEncoding` for a non-minimal form under `VarIntStrictness::Strict`.
    pub fn decode(buf: &[u8], offset: usize, strictness: VarIntStrictness) -> Result<VarInt> {
        let available = buf.len().saturating_sub(offset);
        let marker = *buf.get(offset).ok_or(ConsensusError::TruncatedInput {
            field: "varint",
            offset,
            needed: 1,
            available,
        })?;

        let width = match marker {
            0xfd => 2,
            0xfe => 4,
            0xff => 8,
            b => {
                return Ok(VarInt {
                    value: b as u64,
                    encoded_len: 1,
                })
            }
        };

        if available < 1 + width {
            return Err(ConsensusError::TruncatedInput {
                field: "varint",
                offset,
                needed: 1 + width,
                available,
            });
        }

        let mut raw = [0u8; 8];
        raw[..width].copy_from_slice(&buf[offset + 1..offset + 1 + width]);
        let value = u64::from_le_bytes(raw);
        let encoded_len = 1 + width;

        if strictness == VarIntStrictness::Strict && Self::size_of(value) != encoded_len {
            return Err(ConsensusError::MalformedEncoding {
                field: "varint",
                offset,
                reason: format!(
                    "non-canonical encoding: {value} encoded in {encoded_len} bytes"
                ),
            });
        }

        Ok(VarInt { value, encoded_len })
    }

    pub fn is_canonical(&self) -> bool {
        Self::size_of(self.value) == self.encoded_len
    }
}
