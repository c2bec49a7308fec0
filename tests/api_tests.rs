//! Tests for the public TangleConsensus API

use tangle_consensus::*;

fn sample_transaction() -> Transaction {
    let mut tx = Transaction::new(1);
    tx.add_input(TransactionInput {
        prevout: OutPoint {
            hash: [0x11; 32],
            index: 2,
        },
        script_sig: vec![0x51],
        sequence: 0xfffffffe,
    })
    .add_output(TransactionOutput::new(
        123_456_789u64,
        b"GOLD".to_vec(),
        vec![0x51],
    ));
    tx.memo = Some("invoice 42".to_string());
    tx.data_class_name = Some("ledger.Transfer".to_string());
    tx.data = Some(vec![1, 2, 3]);
    tx
}

fn sample_block() -> Block {
    let transactions = vec![sample_transaction()];
    Block {
        header: BlockHeader {
            version: 1,
            prev_block_hash: [0xaa; 32],
            prev_branch_block_hash: [0xbb; 32],
            merkle_root: block::calculate_merkle_root(&transactions),
            time: 1_650_000_000,
            difficulty_target: 0x1d00ffff,
            last_mining_reward_block: 10,
            nonce: 99,
            miner_address: [0xcc; MINER_ADDRESS_SIZE],
            block_type: BlockType::Transfer as u32,
            height: 11,
        },
        transactions,
    }
}

#[test]
fn test_tangle_consensus_default() {
    let consensus = TangleConsensus::default();
    assert_eq!(consensus.config(), &ConsensusConfig::default());
}

#[test]
fn test_transaction_round_trip() {
    let consensus = TangleConsensus::new();
    let tx = sample_transaction();
    let bytes = consensus.serialize_transaction(&tx);
    assert_eq!(consensus.deserialize_transaction(&bytes).unwrap(), tx);
}

#[test]
fn test_transaction_trailing_bytes() {
    let consensus = TangleConsensus::new();
    let mut bytes = consensus.serialize_transaction(&sample_transaction());
    bytes.push(0);
    assert!(matches!(
        consensus.deserialize_transaction(&bytes),
        Err(ConsensusError::MalformedEncoding { .. })
    ));
}

#[test]
fn test_block_round_trip() {
    let consensus = TangleConsensus::new();
    let block = sample_block();
    let bytes = consensus.serialize_block(&block);
    assert_eq!(&bytes[148..152], &(BlockType::Transfer as u32).to_le_bytes());
    assert_eq!(consensus.deserialize_block(&bytes).unwrap(), block);
}

#[test]
fn test_block_commits_to_transactions() {
    let mut block = sample_block();
    assert!(block.check_merkle_root());
    assert_eq!(block.header.merkle_root, block::calculate_merkle_root(&block.transactions));

    block.transactions[0].memo = None;
    assert!(!block.check_merkle_root());
}

#[test]
fn test_verify_spend() {
    let consensus = TangleConsensus::new();
    let tx = sample_transaction();
    assert!(consensus.verify_spend(&tx, 0, &[0x51]).is_ok());
    assert_eq!(
        consensus.verify_spend(&tx, 0, &[0x00]),
        Err(ConsensusError::ScriptEvaluation(ScriptError::EvalFalse))
    );
}

#[test]
fn test_hash_for_signature_matches_module() {
    let consensus = TangleConsensus::new();
    let tx = sample_transaction();
    let hash = consensus
        .hash_for_signature(&tx, 0, &[0x51], SighashType::ALL)
        .unwrap();
    assert_eq!(
        hash,
        sighash::hash_for_signature(&tx, 0, &[0x51], SighashType::ALL).unwrap()
    );
    assert_eq!(
        consensus.hash_for_signature(&tx, 1, &[0x51], SighashType::ALL),
        Err(ConsensusError::InvalidInputIndex(1))
    );
}

#[test]
fn test_classify() {
    let consensus = TangleConsensus::new();
    let p2sh = script::builder::create_p2sh(&[0; 20]);
    assert_eq!(consensus.classify(p2sh.program()).unwrap(), ScriptType::P2sh);
    assert_eq!(consensus.classify(&[0x51]).unwrap(), ScriptType::NonStandard);
}

#[test]
fn test_config_from_json() {
    let config = ConsensusConfig::from_json(
        r#"{"codec": {"max_declared_count": 2}, "script": {"verify_flags": "P2SH | CLEANSTACK"}}"#,
    )
    .unwrap();
    assert_eq!(config.codec.max_declared_count, 2);
    assert_eq!(
        config.script.verify_flags,
        VerifyFlags::P2SH | VerifyFlags::CLEANSTACK
    );

    let consensus = TangleConsensus::with_config(config);
    let mut tx = sample_transaction();
    for i in 0..2 {
        let mut input = tx.inputs[0].clone();
        input.prevout.index = 10 + i;
        tx.add_input(input);
    }
    let bytes = tx.serialize();
    assert!(matches!(
        consensus.deserialize_transaction(&bytes),
        Err(ConsensusError::MalformedEncoding { .. })
    ));
}
