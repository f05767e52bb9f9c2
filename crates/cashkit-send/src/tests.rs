//! Pipeline tests with in-memory collaborators.

use std::cell::{Cell, RefCell};

use cashkit_primitives::chainhash::Hash;
use cashkit_primitives::ec::PrivateKey;
use cashkit_script::builder::{build_address_lock, build_p2pkh_lock};
use cashkit_script::{Address, Network, Script};
use cashkit_transaction::{SelectionStrategy, Transaction, TransactionError, TransactionOutput, UnspentOutput};

use crate::broadcaster::{BroadcastFailure, BroadcastSuccess, Broadcaster};
use crate::config::{FeeSetting, SendConfig};
use crate::pipeline::Pipeline;
use crate::source::{parse_insight_utxos, FetchFailure, UtxoSource};
use crate::SendError;

// -----------------------------------------------------------------------
// Mocks
// -----------------------------------------------------------------------

/// Records every raw transaction and answers with its txid.
#[derive(Default)]
struct RecordingBroadcaster {
    sent: RefCell<Vec<Vec<u8>>>,
    reject: bool,
}

impl Broadcaster for RecordingBroadcaster {
    fn broadcast(&self, raw_tx: &[u8]) -> Result<BroadcastSuccess, BroadcastFailure> {
        self.sent.borrow_mut().push(raw_tx.to_vec());
        if self.reject {
            return Err(BroadcastFailure {
                code: "16".to_string(),
                description: "mandatory-script-verify-flag-failed".to_string(),
            });
        }
        let tx = Transaction::from_bytes(raw_tx).map_err(|e| BroadcastFailure {
            code: "decode".to_string(),
            description: e.to_string(),
        })?;
        Ok(BroadcastSuccess {
            txid: tx.tx_id_hex(),
            message: "accepted".to_string(),
        })
    }
}

struct FailingSource {
    calls: Cell<usize>,
}

impl UtxoSource for FailingSource {
    fn unspent_outputs(&self, _address: &Address) -> Result<Vec<UnspentOutput>, FetchFailure> {
        self.calls.set(self.calls.get() + 1);
        Err(FetchFailure::new("indexer unavailable"))
    }
}

fn key(secret: u8) -> PrivateKey {
    let mut bytes = [0u8; 32];
    bytes[31] = secret;
    PrivateKey::from_bytes(&bytes).unwrap()
}

fn address_of(key: &PrivateKey) -> Address {
    Address::from_public_key(&key.pub_key(), Network::Testnet)
}

fn utxo_for(address: &Address, tag: u8, satoshis: u64) -> UnspentOutput {
    UnspentOutput::new(Hash::new([tag; 32]), 0, build_address_lock(address), satoshis)
}

fn pay_out(satoshis: u64) -> Vec<TransactionOutput> {
    vec![TransactionOutput::new(satoshis, build_p2pkh_lock(&[0x42; 20]))]
}

// -----------------------------------------------------------------------
// Configuration
// -----------------------------------------------------------------------

#[test]
fn test_config_defaults() {
    let config = SendConfig::from_json("{}").unwrap();
    assert_eq!(config, SendConfig::default());
    assert_eq!(config.fee, FeeSetting::Fixed { satoshis: 500 });
    assert_eq!(config.strategy, SelectionStrategy::LargestFirst);
    assert_eq!(config.version, 1);
    assert_eq!(config.sequence, 0xffff_ffff);
}

#[test]
fn test_config_from_json() {
    let config = SendConfig::from_json(
        r#"{
            "fee": { "type": "per_kilobyte", "satoshis_per_kb": 1000 },
            "strategy": "all",
            "lock_time": 600000,
            "sequence": 4294967294
        }"#,
    )
    .unwrap();
    assert_eq!(config.fee, FeeSetting::PerKilobyte { satoshis_per_kb: 1000 });
    assert_eq!(config.strategy, SelectionStrategy::All);
    assert_eq!(config.lock_time, 600_000);
    assert_eq!(config.assembler().sequence, 0xffff_fffe);
}

#[test]
fn test_config_rejects_unknown_fee_type() {
    let err = SendConfig::from_json(r#"{"fee": {"type": "free"}}"#).unwrap_err();
    assert!(matches!(err, SendError::Config(_)));
}

// -----------------------------------------------------------------------
// Sources
// -----------------------------------------------------------------------

#[test]
fn test_static_source_filters_by_address() {
    let alice = address_of(&key(1));
    let bob = address_of(&key(2));
    let utxos = vec![utxo_for(&alice, 1, 1_000), utxo_for(&bob, 2, 2_000)];
    let found = utxos.unspent_outputs(&alice).unwrap();
    assert_eq!(found, vec![utxo_for(&alice, 1, 1_000)]);
}

#[test]
fn test_parse_insight_utxos() {
    let body = r#"[{
        "txid": "51262307251dc909e2eb759b0ce7bfd927e8d399d7abd5e0998406b60854a393",
        "vout": 0,
        "scriptPubKey": "76a914c0a3c167a28cabb9fbb495affa0761e6e74ac60d88ac",
        "amount": 1.0,
        "satoshis": 100000000
    }]"#;
    let utxos = parse_insight_utxos(body).unwrap();
    assert_eq!(utxos.len(), 1);
    assert_eq!(utxos[0].satoshis, 100_000_000);
    assert!(parse_insight_utxos("{").is_err());
}

// -----------------------------------------------------------------------
// Pipeline
// -----------------------------------------------------------------------

#[test]
fn test_send_end_to_end() {
    let user = key(7);
    let from = address_of(&user);
    let source = vec![utxo_for(&from, 1, 20_000), utxo_for(&from, 2, 3_000)];
    let broadcaster = RecordingBroadcaster::default();
    let pipeline = Pipeline::new(&source, &broadcaster, SendConfig::default());

    let payment = pipeline.prepare(&from, pay_out(10_000), &[user.clone()]).unwrap();
    assert!(payment.is_fully_signed());
    assert_eq!(payment.fee, 500);
    assert_eq!(payment.spent, vec![utxo_for(&from, 1, 20_000)]);
    assert_eq!(payment.tx.outputs.len(), 2);
    assert_eq!(payment.tx.outputs[1].satoshis, 9_500);
    assert_eq!(payment.tx.outputs[1].locking_script, build_address_lock(&from));

    let success = pipeline.broadcast(&payment).unwrap();
    assert_eq!(success.txid, payment.tx_id().to_string());
    assert_eq!(broadcaster.sent.borrow()[0], payment.tx.to_bytes());

    // Retrying the hand-off reuses the same signed bytes.
    pipeline.broadcast(&payment).unwrap();
    assert_eq!(broadcaster.sent.borrow().len(), 2);
    assert_eq!(broadcaster.sent.borrow()[0], broadcaster.sent.borrow()[1]);

    let via_send = pipeline.send(&from, pay_out(10_000), &[user]).unwrap();
    assert_eq!(via_send, success);
}

#[test]
fn test_fetch_failure_stops_pipeline() {
    let source = FailingSource { calls: Cell::new(0) };
    let broadcaster = RecordingBroadcaster::default();
    let pipeline = Pipeline::new(&source, &broadcaster, SendConfig::default());
    let from = address_of(&key(1));

    let err = pipeline.send(&from, pay_out(1_000), &[key(1)]).unwrap_err();
    assert!(matches!(err, SendError::Fetch(_)));
    assert_eq!(source.calls.get(), 1);
    assert!(broadcaster.sent.borrow().is_empty());
}

#[test]
fn test_insufficient_funds_stops_pipeline() {
    let user = key(3);
    let from = address_of(&user);
    let source = vec![utxo_for(&from, 1, 1_000)];
    let broadcaster = RecordingBroadcaster::default();
    let pipeline = Pipeline::new(&source, &broadcaster, SendConfig::default());

    let err = pipeline.send(&from, pay_out(1_000), &[user]).unwrap_err();
    assert!(matches!(
        err,
        SendError::Build(TransactionError::InsufficientFunds { available: 1_000, required: 1_500 })
    ));
    assert!(broadcaster.sent.borrow().is_empty());
}

#[test]
fn test_unsigned_inputs_never_broadcast() {
    let from = address_of(&key(4));
    let source = vec![utxo_for(&from, 1, 50_000)];
    let broadcaster = RecordingBroadcaster::default();
    let pipeline = Pipeline::new(&source, &broadcaster, SendConfig::default());

    // A key that does not own the funds signs nothing.
    let payment = pipeline.prepare(&from, pay_out(10_000), &[key(5)]).unwrap();
    assert!(!payment.is_fully_signed());

    let err = pipeline.broadcast(&payment).unwrap_err();
    match err {
        SendError::IncompleteSignatures { unsigned_inputs } => assert_eq!(unsigned_inputs, vec![0]),
        other => panic!("unexpected error: {other}"),
    }
    assert!(broadcaster.sent.borrow().is_empty());
}

#[test]
fn test_broadcast_rejection_is_reported() {
    let user = key(6);
    let from = address_of(&user);
    let source = vec![utxo_for(&from, 1, 50_000)];
    let broadcaster = RecordingBroadcaster {
        reject: true,
        ..Default::default()
    };
    let pipeline = Pipeline::new(&source, &broadcaster, SendConfig::default());

    let err = pipeline.send(&from, pay_out(10_000), &[user]).unwrap_err();
    match err {
        SendError::Broadcast(failure) => assert_eq!(failure.code, "16"),
        other => panic!("unexpected error: {other}"),
    }
    assert_eq!(broadcaster.sent.borrow().len(), 1);
}

#[test]
fn test_config_drives_assembly() {
    let user = key(8);
    let from = address_of(&user);
    let source = vec![utxo_for(&from, 1, 30_000), utxo_for(&from, 2, 30_000)];
    let config = SendConfig {
        fee: FeeSetting::PerKilobyte { satoshis_per_kb: 1_000 },
        strategy: SelectionStrategy::All,
        version: 2,
        lock_time: 700_000,
        sequence: 0xffff_fffe,
    };
    let pipeline = Pipeline::new(&source, RecordingBroadcaster::default(), config);

    let payment = pipeline.prepare(&from, pay_out(10_000), &[user]).unwrap();
    // Two inputs and two outputs estimate to 374 bytes.
    assert_eq!(payment.fee, 374);
    assert_eq!(payment.tx.version, 2);
    assert_eq!(payment.tx.lock_time, 700_000);
    assert!(payment.tx.inputs.iter().all(|i| i.sequence_number == 0xffff_fffe));
    assert_eq!(payment.tx.outputs[1].satoshis, 60_000 - 10_000 - 374);
    assert!(payment.is_fully_signed());
}

#[test]
fn test_explicit_change_script() {
    let user = key(9);
    let from = address_of(&user);
    let source = vec![utxo_for(&from, 1, 30_000)];
    let pipeline = Pipeline::new(&source, RecordingBroadcaster::default(), SendConfig::default());
    let change = Script::from_hex("76a914000000000000000000000000000000000000000088ac").unwrap();

    let payment = pipeline
        .prepare_with_change(&from, pay_out(10_000), &change, &[user])
        .unwrap();
    assert_eq!(payment.tx.outputs[1].locking_script, change);
    assert_eq!(payment.tx.outputs[1].satoshis, 19_500);
}
