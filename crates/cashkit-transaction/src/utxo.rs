//! Unspent outputs as reported by an address indexer.

use cashkit_primitives::chainhash::Hash;
use cashkit_script::Script;
use serde::{Deserialize, Serialize};

use crate::input::TransactionInput;
use crate::output::TransactionOutput;

/// An output that can be spent: where it lives, how it is locked and what
/// it is worth.
///
/// Serde field names follow the insight `/addr/{address}/utxo` response,
/// so indexer JSON deserializes directly; unknown fields (`address`,
/// `amount`, `confirmations`, ...) are ignored.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct UnspentOutput {
    /// Id of the funding transaction. Display-order hex in JSON.
    pub txid: Hash,

    pub vout: u32,

    #[serde(rename = "scriptPubKey", alias = "locking_script")]
    pub locking_script: Script,

    pub satoshis: u64,
}

impl UnspentOutput {
    pub fn new(txid: Hash, vout: u32, locking_script: Script, satoshis: u64) -> Self {
        UnspentOutput {
            txid,
            vout,
            locking_script,
            satoshis,
        }
    }

    /// The output as it appears in the funding transaction.
    pub fn to_output(&self) -> TransactionOutput {
        TransactionOutput::new(self.satoshis, self.locking_script.clone())
    }

    /// An unsigned input spending this output.
    pub fn to_input(&self, sequence_number: u32) -> TransactionInput {
        let mut input = TransactionInput::new(self.txid, self.vout);
        input.sequence_number = sequence_number;
        input
    }

    /// Whether `input` references this output.
    pub fn is_spent_by(&self, input: &TransactionInput) -> bool {
        input.source_txid == self.txid && input.source_tx_out_index == self.vout
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_deserialize_insight_utxo() {
        let json = r#"{
            "address": "bchtest:qrq28st852x2hw0mkj26l7s8v8nwwjkxp5w5alvaem",
            "txid": "51262307251dc909e2eb759b0ce7bfd927e8d399d7abd5e0998406b60854a393",
            "vout": 0,
            "scriptPubKey": "76a914c0a3c167a28cabb9fbb495affa0761e6e74ac60d88ac",
            "amount": 1.0,
            "satoshis": 100000000,
            "height": 1254210,
            "confirmations": 12
        }"#;
        let utxo: UnspentOutput = serde_json::from_str(json).unwrap();
        assert_eq!(utxo.vout, 0);
        assert_eq!(utxo.satoshis, 100_000_000);
        assert!(utxo.locking_script.is_p2pkh());
        // Internal order is the reverse of the displayed id.
        assert_eq!(utxo.txid.as_bytes()[0], 0x93);
        assert_eq!(
            utxo.txid.to_string(),
            "51262307251dc909e2eb759b0ce7bfd927e8d399d7abd5e0998406b60854a393"
        );
    }

    #[test]
    fn test_input_references_utxo() {
        let utxo = UnspentOutput::new(Hash::new([7u8; 32]), 3, Script::new(), 10);
        let input = utxo.to_input(0xffff_fffe);
        assert!(utxo.is_spent_by(&input));
        assert_eq!(input.sequence_number, 0xffff_fffe);
        assert!(input.unlocking_script.is_none());

        let other = UnspentOutput::new(Hash::new([7u8; 32]), 4, Script::new(), 10);
        assert!(!other.is_spent_by(&input));
    }

    #[test]
    fn test_serialize_roundtrip_uses_indexer_names() {
        let utxo = UnspentOutput::new(Hash::new([1u8; 32]), 1, Script::from_bytes(&[0x51]), 42);
        let json = serde_json::to_value(&utxo).unwrap();
        assert_eq!(json["scriptPubKey"], "51");
        let back: UnspentOutput = serde_json::from_value(json).unwrap();
        assert_eq!(back, utxo);
    }
}
