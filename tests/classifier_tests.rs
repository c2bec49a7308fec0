//! Standard template recognition

use num_bigint::BigInt;
use tangle_consensus::opcodes::*;
use tangle_consensus::script::builder::*;
use tangle_consensus::script::ChunkKind;
use tangle_consensus::{Script, ScriptType};

fn pubkey(n: u8) -> Vec<u8> {
    let mut key = vec![0x02];
    key.extend_from_slice(&[n; 32]);
    key
}

fn classifications(script: &Script) -> [bool; 6] {
    [
        script.is_sent_to_address(),
        script.is_sent_to_raw_pubkey(),
        script.is_pay_to_script_hash(),
        script.is_sent_to_multisig(),
        script.is_sent_to_cltv_payment_channel(),
        script.is_op_return(),
    ]
}

fn kinds(script: &Script) -> Vec<ChunkKind> {
    script.chunks().iter().map(|c| c.kind.clone()).collect()
}

#[test]
fn test_p2pkh_is_only_an_address() {
    let script = create_p2pkh(&[0x5a; 20]);
    assert_eq!(classifications(&script), [true, false, false, false, false, false]);

    let reparsed = Script::parse(script.program()).unwrap();
    assert_eq!(reparsed.script_type(), ScriptType::P2pkh);
}

#[test]
fn test_p2pkh_single_chunk_mutations() {
    let original = kinds(&create_p2pkh(&[0x5a; 20]));
    let replacements = [
        ChunkKind::Opcode(OP_NOP),
        ChunkKind::Opcode(OP_CHECKSIGVERIFY),
        ChunkKind::PushData {
            opcode: 19,
            data: vec![0x5a; 19],
        },
        ChunkKind::PushData {
            opcode: 21,
            data: vec![0x5a; 21],
        },
    ];

    for index in 0..original.len() {
        for replacement in &replacements {
            if &original[index] == replacement {
                continue;
            }
            let mut mutated = original.clone();
            mutated[index] = replacement.clone();
            let script = Script::from_chunks(mutated);
            assert!(
                !script.is_sent_to_address(),
                "chunk {} replaced by {:?} still classifies",
                index,
                replacement
            );
        }
    }

    // Appending or dropping a chunk breaks the template too
    let mut longer = original.clone();
    longer.push(ChunkKind::Opcode(OP_NOP));
    assert!(!Script::from_chunks(longer).is_sent_to_address());
    assert!(!Script::from_chunks(original[..4].to_vec()).is_sent_to_address());
}

#[test]
fn test_p2pk() {
    let key = pubkey(7);
    let script = create_p2pk(&key);
    assert_eq!(classifications(&script), [false, true, false, false, false, false]);
    assert_eq!(script.pubkey(), Some(&key[..]));
    assert_eq!(script.number_of_signatures_required_to_spend(), Some(1));

    // A one-byte push is not a public key
    let short = Script::parse(&[0x01, 0x07, OP_CHECKSIG]).unwrap();
    assert!(!short.is_sent_to_raw_pubkey());
}

#[test]
fn test_p2sh_is_byte_exact() {
    let script = create_p2sh(&[0x33; 20]);
    assert_eq!(script.program().len(), 23);
    assert_eq!(classifications(&script), [false, false, true, false, false, false]);
    assert_eq!(script.pubkey_hash(), Some(&[0x33; 20][..]));

    // Same chunks, but the hash pushed through PUSHDATA1
    let mut bytes = vec![OP_HASH160, OP_PUSHDATA1, 20];
    bytes.extend_from_slice(&[0x33; 20]);
    bytes.push(OP_EQUAL);
    let padded = Script::parse(&bytes).unwrap();
    assert!(!padded.is_pay_to_script_hash());
}

#[test]
fn test_multisig_templates() {
    let keys = vec![pubkey(1), pubkey(2), pubkey(3)];
    let script = create_multisig(2, &keys);
    assert_eq!(classifications(&script), [false, false, false, true, false, false]);
    assert_eq!(script.script_type(), ScriptType::Multisig);
    assert_eq!(script.number_of_signatures_required_to_spend(), Some(2));
    let extracted: Vec<Vec<u8>> = script
        .multisig_pubkeys()
        .unwrap()
        .into_iter()
        .map(<[u8]>::to_vec)
        .collect();
    assert_eq!(extracted, keys);

    // M greater than N
    let mut bad = kinds(&script);
    bad[0] = ChunkKind::Opcode(OP_4);
    assert!(!Script::from_chunks(bad).is_sent_to_multisig());

    // Key count disagreeing with the number of pushes
    let mut bad = kinds(&script);
    bad[4] = ChunkKind::Opcode(OP_2);
    assert!(!Script::from_chunks(bad).is_sent_to_multisig());

    // An opcode among the keys
    let mut bad = kinds(&script);
    bad[2] = ChunkKind::Opcode(OP_DUP);
    assert!(!Script::from_chunks(bad).is_sent_to_multisig());

    // CHECKMULTISIGVERIFY is accepted as the trailing opcode
    let mut verify = kinds(&script);
    verify[5] = ChunkKind::Opcode(OP_CHECKMULTISIGVERIFY);
    assert!(Script::from_chunks(verify).is_sent_to_multisig());
}

#[test]
fn test_cltv_payment_channel() {
    let sender = pubkey(8);
    let recipient = pubkey(9);
    let script = create_cltv_payment_channel(&sender, &recipient, 1_700_000_000);
    assert_eq!(classifications(&script), [false, false, false, false, true, false]);
    assert_eq!(script.script_type(), ScriptType::CltvPaymentChannel);
    assert_eq!(script.cltv_sender_pubkey(), Some(&sender[..]));
    assert_eq!(script.cltv_recipient_pubkey(), Some(&recipient[..]));
    assert_eq!(script.cltv_expiry(), Some(BigInt::from(1_700_000_000i64)));

    let mut bad = kinds(&script);
    bad[5] = ChunkKind::Opcode(OP_NOP);
    let bad = Script::from_chunks(bad);
    assert!(!bad.is_sent_to_cltv_payment_channel());
    assert_eq!(bad.cltv_expiry(), None);
}

#[test]
fn test_op_return() {
    let script = create_op_return(b"hello ledger");
    assert_eq!(classifications(&script), [false, false, false, false, false, true]);
    assert_eq!(script.script_type(), ScriptType::OpReturn);
    assert_eq!(script.number_of_signatures_required_to_spend(), None);
}

#[test]
fn test_non_standard() {
    let script = Script::parse(&[OP_1, OP_1, OP_ADD, OP_2, OP_EQUAL]).unwrap();
    assert_eq!(classifications(&script), [false; 6]);
    assert_eq!(script.script_type(), ScriptType::NonStandard);
    assert_eq!(Script::default().script_type(), ScriptType::NonStandard);
}
