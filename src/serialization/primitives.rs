//! Fixed-width integers, length-prefixed byte strings, NBytes and MPI numbers
//!
//! `ByteReader` is the single cursor every decoder goes through: each read names the
//! field it is reading and checks the remaining length before slicing, so a truncated
//! buffer always surfaces as `TruncatedInput` with the offending field and offset.

use num_bigint::{BigInt, BigUint, Sign};
use num_traits::Zero;

use super::varint::VarInt;
use crate::config::VarIntStrictness;
use crate::error::{ConsensusError, Result};

/// Bounds-checked cursor over a byte buffer
#[derive(Debug, Clone)]
pub struct ByteReader<'a> {
    buf: &'a [u8],
    pos: usize,
    strictness: VarIntStrictness,
}

impl<'a> ByteReader<'a> {
    pub fn new(buf: &'a [u8], offset: usize) -> Self {
        Self::with_strictness(buf, offset, VarIntStrictness::default())
    }

    pub fn with_strictness(buf: &'a [u8], offset: usize, strictness: VarIntStrictness) -> Self {
        Self {
            buf,
            pos: offset,
            strictness,
        }
    }

    /// Current absolute offset into the underlying buffer
    pub fn position(&self) -> usize {
        self.pos
    }

    pub fn remaining(&self) -> usize {
        self.buf.len().saturating_sub(self.pos)
    }

    pub fn is_empty(&self) -> bool {
        self.remaining() == 0
    }

    fn ensure(&self, field: &'static str, needed: usize) -> Result<()> {
        let available = self.remaining();
        if needed > available {
            return Err(ConsensusError::TruncatedInput {
                field,
                offset: self.pos,
                needed,
                available,
            });
        }
        Ok(())
    }

    pub fn read_bytes(&mut self, field: &'static str, n: usize) -> Result<&'a [u8]> {
        self.ensure(field, n)?;
        let slice = &self.buf[self.pos..self.pos + n];
        self.pos += n;
        Ok(slice)
    }

    pub fn read_array<const N: usize>(&mut self, field: &'static str) -> Result<[u8; N]> {
        let mut out = [0u8; N];
        out.copy_from_slice(self.read_bytes(field, N)?);
        Ok(out)
    }

    pub fn read_u8(&mut self, field: &'static str) -> Result<u8> {
        Ok(self.read_array::<1>(field)?[0])
    }

    pub fn read_u16_le(&mut self, field: &'static str) -> Result<u16> {
        Ok(u16::from_le_bytes(self.read_array(field)?))
    }

    pub fn read_u32_le(&mut self, field: &'static str) -> Result<u32> {
        Ok(u32::from_le_bytes(self.read_array(field)?))
    }

    pub fn read_u32_be(&mut self, field: &'static str) -> Result<u32> {
        Ok(u32::from_be_bytes(self.read_array(field)?))
    }

    pub fn read_u64_le(&mut self, field: &'static str) -> Result<u64> {
        Ok(u64::from_le_bytes(self.read_array(field)?))
    }

    pub fn read_i64_le(&mut self, field: &'static str) -> Result<i64> {
        Ok(i64::from_le_bytes(self.read_array(field)?))
    }

    /// Read a VarInt; truncation is reported against `field` rather than the generic
    /// `varint` label.
    pub fn read_varint(&mut self, field: &'static str) -> Result<u64> {
        let v = VarInt::decode(self.buf, self.pos, self.strictness).map_err(|e| match e {
            ConsensusError::TruncatedInput {
                offset,
                needed,
                available,
                ..
            } => ConsensusError::TruncatedInput {
                field,
                offset,
                needed,
                available,
            },
            ConsensusError::MalformedEncoding { offset, reason, .. } => {
                ConsensusError::MalformedEncoding {
                    field,
                    offset,
                    reason,
                }
            }
            other => other,
        })?;
        self.pos += v.encoded_len;
        Ok(v.value)
    }

    /// Read a VarInt-length-prefixed byte string
    pub fn read_var_bytes(&mut self, field: &'static str) -> Result<&'a [u8]> {
        let start = self.pos;
        let len = self.read_varint(field)?;
        let len = usize::try_from(len).map_err(|_| ConsensusError::MalformedEncoding {
            field,
            offset: start,
            reason: format!("length {len} does not fit in memory"),
        })?;
        self.read_bytes(field, len)
    }

    /// Read an NBytes field: presence byte, u32 LE length, raw bytes
    pub fn read_nbytes(&mut self, field: &'static str) -> Result<Option<Vec<u8>>> {
        let flag_offset = self.pos;
        match self.read_u8(field)? {
            0 => Ok(None),
            1 => {
                let len = self.read_u32_le(field)? as usize;
                Ok(Some(self.read_bytes(field, len)?.to_vec()))
            }
            flag => Err(ConsensusError::MalformedEncoding {
                field,
                offset: flag_offset,
                reason: format!("invalid presence flag {flag}"),
            }),
        }
    }

    pub fn read_nbytes_string(&mut self, field: &'static str) -> Result<Option<String>> {
        let offset = self.pos;
        match self.read_nbytes(field)? {
            None => Ok(None),
            Some(bytes) => String::from_utf8(bytes).map(Some).map_err(|e| {
                ConsensusError::MalformedEncoding {
                    field,
                    offset,
                    reason: format!("invalid UTF-8: {e}"),
                }
            }),
        }
    }
}

pub fn write_u32_le(out: &mut Vec<u8>, value: u32) {
    out.extend_from_slice(&value.to_le_bytes());
}

pub fn write_u32_be(out: &mut Vec<u8>, value: u32) {
    out.extend_from_slice(&value.to_be_bytes());
}

pub fn write_u64_le(out: &mut Vec<u8>, value: u64) {
    out.extend_from_slice(&value.to_le_bytes());
}

pub fn write_i64_le(out: &mut Vec<u8>, value: i64) {
    out.extend_from_slice(&value.to_le_bytes());
}

/// VarInt length followed by the bytes
pub fn write_var_bytes(out: &mut Vec<u8>, bytes: &[u8]) {
    VarInt::write(out, bytes.len() as u64);
    out.extend_from_slice(bytes);
}

pub fn write_nbytes(out: &mut Vec<u8>, bytes: Option<&[u8]>) {
    match bytes {
        None => out.push(0),
        Some(bytes) => {
            out.push(1);
            write_u32_le(out, bytes.len() as u32);
            out.extend_from_slice(bytes);
        }
    }
}

pub fn write_nbytes_string(out: &mut Vec<u8>, s: Option<&str>) {
    write_nbytes(out, s.map(str::as_bytes));
}

pub fn reverse_bytes(bytes: &[u8]) -> Vec<u8> {
    bytes.iter().rev().copied().collect()
}

/// Encode a signed integer in MPI form: big-endian magnitude whose first byte carries
/// the sign in its top bit, optionally preceded by a 4-byte big-endian length.
///
/// # Examples
///
/// ```
/// use num_bigint::BigInt;
/// use tangle_consensus::serialization::primitives::encode_mpi;
///
/// assert_eq!(encode_mpi(&BigInt::from(0), false), Vec::<u8>::new());
/// assert_eq!(encode_mpi(&BigInt::from(0), true), vec![0, 0, 0, 0]);
/// assert_eq!(encode_mpi(&BigInt::from(-1), false), vec![0x81]);
/// assert_eq!(encode_mpi(&BigInt::from(128), false), vec![0x00, 0x80]);
/// ```
pub fn encode_mpi(value: &BigInt, include_length: bool) -> Vec<u8> {
    if value.is_zero() {
        return if include_length { vec![0; 4] } else { Vec::new() };
    }

    let mut magnitude = value.magnitude().to_bytes_be();
    if magnitude[0] & 0x80 != 0 {
        magnitude.insert(0, 0x00);
    }
    if value.sign() == Sign::Minus {
        magnitude[0] |= 0x80;
    }

    if include_length {
        let mut out = Vec::with_capacity(4 + magnitude.len());
        write_u32_be(&mut out, magnitude.len() as u32);
        out.extend_from_slice(&magnitude);
        out
    } else {
        magnitude
    }
}

/// Decode an MPI number; the inverse of [`encode_mpi`].
pub fn decode_mpi(mpi: &[u8], has_length: bool) -> Result<BigInt> {
    let body = if has_length {
        let mut reader = ByteReader::new(mpi, 0);
        let len = reader.read_u32_be("mpi.length")? as usize;
        reader.read_bytes("mpi", len)?
    } else {
        mpi
    };

    if body.is_empty() {
        return Ok(BigInt::zero());
    }

    let mut magnitude = body.to_vec();
    let negative = magnitude[0] & 0x80 != 0;
    magnitude[0] &= 0x7f;
    let magnitude = BigUint::from_bytes_be(&magnitude);
    let sign = if negative { Sign::Minus } else { Sign::Plus };
    Ok(BigInt::from_biguint(sign, magnitude))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_reader_reports_field_and_offset() {
        let buf = [1u8, 2, 3];
        let mut r = ByteReader::new(&buf, 0);
        assert_eq!(r.read_u8("a").unwrap(), 1);
        let err = r.read_u32_le("tx.version").unwrap_err();
        assert_eq!(
            err,
            ConsensusError::TruncatedInput {
                field: "tx.version",
                offset: 1,
                needed: 4,
                available: 2,
            }
        );
        // failed read does not move the cursor
        assert_eq!(r.position(), 1);
    }

    #[test]
    fn test_reader_integers() {
        let buf = [0x01, 0x00, 0x00, 0x00, 0x00, 0x00, 0x00, 0x01];
        let mut r = ByteReader::new(&buf, 0);
        assert_eq!(r.read_u32_le("x").unwrap(), 1);
        assert_eq!(r.read_u32_be("y").unwrap(), 1);
        assert!(r.is_empty());
    }

    #[test]
    fn test_var_bytes_overflow() {
        let buf = [0x05, 0xaa, 0xbb];
        let mut r = ByteReader::new(&buf, 0);
        assert!(matches!(
            r.read_var_bytes("output.script_pubkey"),
            Err(ConsensusError::TruncatedInput {
                field: "output.script_pubkey",
                offset: 1,
                needed: 5,
                available: 2
            })
        ));
    }

    #[test]
    fn test_nbytes() {
        let mut out = Vec::new();
        write_nbytes_string(&mut out, Some("hi"));
        write_nbytes(&mut out, None);
        assert_eq!(out, vec![1, 2, 0, 0, 0, b'h', b'i', 0]);

        let mut r = ByteReader::new(&out, 0);
        assert_eq!(r.read_nbytes_string("memo").unwrap(), Some("hi".to_string()));
        assert_eq!(r.read_nbytes("data").unwrap(), None);
        assert!(r.is_empty());
    }

    #[test]
    fn test_nbytes_rejects_bad_flag_and_utf8() {
        let mut r = ByteReader::new(&[2u8], 0);
        assert!(matches!(
            r.read_nbytes("memo"),
            Err(ConsensusError::MalformedEncoding { field: "memo", .. })
        ));

        let buf = [1u8, 1, 0, 0, 0, 0xff];
        let mut r = ByteReader::new(&buf, 0);
        assert!(matches!(
            r.read_nbytes_string("memo"),
            Err(ConsensusError::MalformedEncoding { field: "memo", .. })
        ));
    }

    #[test]
    fn test_mpi() {
        for v in [1i64, -1, 127, 128, -128, 255, 32767, -32768, 1 << 40, -(1 << 40)] {
            let n = BigInt::from(v);
            assert_eq!(decode_mpi(&encode_mpi(&n, false), false).unwrap(), n);
            assert_eq!(decode_mpi(&encode_mpi(&n, true), true).unwrap(), n);
        }
        assert_eq!(encode_mpi(&BigInt::from(-128), true), vec![0, 0, 0, 2, 0x80, 0x80]);
        assert_eq!(decode_mpi(&[], false).unwrap(), BigInt::zero());
        // negative zero decodes to zero
        assert_eq!(decode_mpi(&[0x80], false).unwrap(), BigInt::zero());
    }

    #[test]
    fn test_mpi_truncated_length() {
        assert!(matches!(
            decode_mpi(&[0, 0, 0, 3, 1], true),
            Err(ConsensusError::TruncatedInput { field: "mpi", .. })
        ));
    }

    #[test]
    fn test_reverse_bytes() {
        assert_eq!(reverse_bytes(&[1, 2, 3]), vec![3, 2, 1]);
        assert!(reverse_bytes(&[]).is_empty());
    }
}
