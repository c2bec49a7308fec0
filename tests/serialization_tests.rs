//! Wire codec conformance: golden fixture, round-trips and truncation safety

use num_bigint::BigUint;
use proptest::prelude::*;
use tangle_consensus::serialization::{deserialize_output, VarInt};
use tangle_consensus::*;

/// Reference block: one transfer transaction spending a P2PKH output.
const GOLDEN_BLOCK_HEX: &str = concat!(
    "01000000615d21aacd5c5af2392a948f950e3f93e9f171da623fe6629440bc8d",
    "7e27fa7bf38c764c8aa00b6578f4254a4dc6d9b50f88fa926e270ea7859bd1b7",
    "07cd8662ac9400115c8c84e48e93ff237a6c23136d22926c3087384b338fe815",
    "70b16c3600f1536500000000ffff0f1e000000002a00000000000000cdab3412",
    "8b133a3868993176b613738816247a7f4d357cae010000000700000000000000",
    "01010000000184fd9bac333ad79154348296204fa7f8c537a96e08983e5f73b3",
    "f5aca8e8edf70100000069463044022036b3b7c1f1d4a1a8e4b6ff2e0b2a6a7c",
    "0c3a1f1e5b8c7d6e5f4a3b2c1d0e0f10022046c2e1f0a9b8c7d6e5f40312a1b0",
    "c9d8e7f6a5b4c3d2e1f0011223344556670121020017dea7770f7ecff7ab3c20",
    "506546129e96bdeba2f544bb8e5414eb79786122ffffffff010502540be40000",
    "1976a914a423de7cfa5c1c2dbc65a04006b1b0713bdd698d88ac000000000000",
    "0000",
);

fn golden_bytes() -> Vec<u8> {
    hex::decode(GOLDEN_BLOCK_HEX).unwrap()
}

#[test]
fn test_golden_block_decodes() {
    let block = Block::deserialize(&golden_bytes()).unwrap();

    assert_eq!(block.header.version, 1);
    assert_eq!(&block.header.prev_block_hash[..6], &hex::decode("615d21aacd5c").unwrap()[..]);
    assert_eq!(block.header.time, 1_700_000_000);
    assert_eq!(block.header.last_mining_reward_block, 42);
    assert_eq!(block.header.nonce, 0x1234abcd);
    assert_eq!(block.header.kind(), Some(BlockType::Transfer));
    assert_eq!(block.header.height, 7);

    assert_eq!(block.transactions.len(), 1);
    let tx = &block.transactions[0];
    assert_eq!(tx.inputs.len(), 1);
    assert_eq!(tx.outputs.len(), 1);
    assert_eq!(tx.inputs[0].prevout.index, 1);
    assert_eq!(tx.memo, None);
    assert_eq!(tx.data, None);

    let output = &tx.outputs[0];
    assert_eq!(output.value, BigUint::from(10_000_000_000u64));
    assert!(output.is_native_token());

    let script = Script::parse(&output.script_pubkey).unwrap();
    assert!(script.is_sent_to_address());
    assert_eq!(script.script_type(), ScriptType::P2pkh);
    assert_eq!(
        script.pubkey_hash().unwrap(),
        &hex::decode("a423de7cfa5c1c2dbc65a04006b1b0713bdd698d").unwrap()[..]
    );
}

#[test]
fn test_golden_block_reserializes_exactly() {
    let bytes = golden_bytes();
    let block = Block::deserialize(&bytes).unwrap();
    assert_eq!(hex::encode(block.serialize()), GOLDEN_BLOCK_HEX);
}

#[test]
fn test_golden_block_merkle_commitment() {
    let block = Block::deserialize(&golden_bytes()).unwrap();
    assert!(block.check_merkle_root());
    assert_eq!(block.header.merkle_root, block.transactions[0].hash());
}

#[test]
fn test_golden_block_every_prefix_fails() {
    let bytes = golden_bytes();
    for len in 0..bytes.len() {
        let err = Block::deserialize(&bytes[..len]).unwrap_err();
        assert!(err.is_decode_error(), "prefix {} gave {:?}", len, err);
    }
}

#[test]
fn test_golden_block_trailing_byte() {
    let mut bytes = golden_bytes();
    bytes.push(0);
    assert!(matches!(
        Block::deserialize(&bytes),
        Err(ConsensusError::MalformedBlock { .. })
    ));
}

#[test]
fn test_varint_boundaries() {
    let cases: [(u64, usize); 8] = [
        (0, 1),
        (0xfc, 1),
        (0xfd, 3),
        (0xffff, 3),
        (0x10000, 5),
        (0xffff_ffff, 5),
        (0x1_0000_0000, 9),
        (u64::MAX, 9),
    ];
    for (value, size) in cases {
        let encoded = VarInt::encode(value);
        assert_eq!(encoded.len(), size, "value {:#x}", value);
        assert_eq!(VarInt::size_of(value), size);

        let decoded = VarInt::decode(&encoded, 0, VarIntStrictness::Strict).unwrap();
        assert_eq!(decoded.value, value);
        assert_eq!(decoded.encoded_len, size);
    }
}

#[test]
fn test_varint_wide_marker_keeps_original_length() {
    // 5 encoded behind the 8-byte marker
    let bytes = [0xff, 5, 0, 0, 0, 0, 0, 0, 0];
    let lenient = VarInt::decode(&bytes, 0, VarIntStrictness::Lenient).unwrap();
    assert_eq!(lenient.value, 5);
    assert_eq!(lenient.encoded_len, 9);
    assert!(VarInt::decode(&bytes, 0, VarIntStrictness::Strict).is_err());
}

#[test]
fn test_output_decode_at_offset() {
    let output = TransactionOutput::new(300u32, b"TOKEN".to_vec(), vec![0x51]);
    let mut buf = vec![0xee, 0xee];
    buf.extend_from_slice(&output.serialize());
    let (decoded, consumed) = deserialize_output(&buf, 2).unwrap();
    assert_eq!(decoded, output);
    assert_eq!(consumed, buf.len() - 2);
}

fn arb_input() -> impl Strategy<Value = TransactionInput> {
    (
        any::<[u8; 32]>(),
        any::<u32>(),
        prop::collection::vec(any::<u8>(), 0..80),
        any::<u32>(),
    )
        .prop_map(|(hash, index, script_sig, sequence)| TransactionInput {
            prevout: OutPoint { hash, index },
            script_sig,
            sequence,
        })
}

fn arb_output() -> impl Strategy<Value = TransactionOutput> {
    (
        prop::collection::vec(any::<u8>(), 0..24),
        prop::collection::vec(any::<u8>(), 0..8),
        prop::collection::vec(any::<u8>(), 0..40),
    )
        .prop_map(|(magnitude, token_id, script_pubkey)| TransactionOutput {
            value: BigUint::from_bytes_be(&magnitude),
            token_id,
            script_pubkey,
        })
}

fn arb_transaction() -> impl Strategy<Value = Transaction> {
    (
        any::<u32>(),
        prop::collection::vec(arb_input(), 0..4),
        prop::collection::vec(arb_output(), 0..4),
        any::<u32>(),
        prop::option::of("[a-zA-Z0-9 ]{0,24}"),
        prop::option::of("[a-z.]{1,16}"),
        prop::option::of(prop::collection::vec(any::<u8>(), 0..32)),
        prop::option::of(prop::collection::vec(any::<u8>(), 0..32)),
    )
        .prop_map(
            |(version, inputs, outputs, lock_time, memo, data_class_name, data, data_signature)| {
                Transaction {
                    version,
                    inputs,
                    outputs,
                    lock_time,
                    memo,
                    data_class_name,
                    data,
                    data_signature,
                }
            },
        )
}

proptest! {
    #[test]
    fn prop_output_round_trip(output in arb_output()) {
        let bytes = output.serialize();
        let (decoded, consumed) = TransactionOutput::deserialize(&bytes, 0).unwrap();
        prop_assert_eq!(consumed, bytes.len());
        prop_assert_eq!(decoded, output);
    }

    #[test]
    fn prop_transaction_round_trip(tx in arb_transaction()) {
        let bytes = tx.serialize();
        let decoded = Transaction::deserialize(&bytes).unwrap();
        prop_assert_eq!(decoded.serialize(), bytes);
        prop_assert_eq!(decoded, tx);
    }

    #[test]
    fn prop_transaction_truncation_fails(tx in arb_transaction(), cut in 1usize..64) {
        let bytes = tx.serialize();
        let len = bytes.len().saturating_sub(cut);
        let err = Transaction::deserialize(&bytes[..len]).unwrap_err();
        prop_assert!(err.is_decode_error());
    }

    #[test]
    fn prop_block_round_trip(
        txs in prop::collection::vec(arb_transaction(), 0..3),
        nonce in any::<u32>()
    ) {
        let mut block = Block::deserialize(&golden_bytes()).unwrap();
        block.header.nonce = nonce;
        block.transactions = txs;
        let bytes = block.serialize();
        prop_assert_eq!(Block::deserialize(&bytes).unwrap(), block);
    }

    #[test]
    fn prop_varint_round_trip(value in any::<u64>()) {
        let encoded = VarInt::encode(value);
        let decoded = VarInt::decode(&encoded, 0, VarIntStrictness::Strict).unwrap();
        prop_assert_eq!(decoded.value, value);
        prop_assert_eq!(decoded.encoded_len, encoded.len());
    }
}
