//! Wire format serialization
//!
//! Every decoder goes through [`primitives::ByteReader`], which checks lengths before
//! slicing and reports the field and offset of any shortfall.

pub mod block;
pub mod output;
pub mod primitives;
pub mod transaction;
pub mod varint;

pub use block::{deserialize_block, serialize_block, serialize_block_header};
pub use output::{deserialize_output, serialize_output};
pub use transaction::{deserialize_transaction, serialize_transaction};
pub use varint::VarInt;
