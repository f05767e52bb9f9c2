//! Transaction input referencing a previous output.
//!
//! Holds the outpoint being spent, the sequence number and, once signed,
//! the unlocking script.

use cashkit_primitives::chainhash::Hash;
use cashkit_primitives::util::{VarInt, WireReader, WireWriter};
use cashkit_script::Script;

use crate::TransactionError;

/// Sequence number marking an input as final.
pub const DEFAULT_SEQUENCE_NUMBER: u32 = 0xFFFF_FFFF;

/// A single input in a transaction.
///
/// # Wire format
///
/// | Field              | Size             |
/// |--------------------|------------------|
/// | source_txid        | 32 bytes (LE)    |
/// | source_tx_out_index| 4 bytes (LE)     |
/// | script length      | VarInt           |
/// | unlocking_script   | variable         |
/// | sequence_number    | 4 bytes (LE)     |
///
/// An empty unlocking script and `None` both mean unsigned and compare
/// equal.
#[derive(Clone, Debug)]
pub struct TransactionInput {
    /// Id of the transaction holding the spent output, internal byte order.
    pub source_txid: Hash,

    /// Index of the output within the source transaction.
    pub source_tx_out_index: u32,

    pub sequence_number: u32,

    /// `None` until the input is signed. Serialized as an empty script.
    pub unlocking_script: Option<Script>,
}

impl TransactionInput {
    /// An unsigned, final input spending `source_txid:source_tx_out_index`.
    pub fn new(source_txid: Hash, source_tx_out_index: u32) -> Self {
        TransactionInput {
            source_txid,
            source_tx_out_index,
            sequence_number: DEFAULT_SEQUENCE_NUMBER,
            unlocking_script: None,
        }
    }

    /// Deserialize an input from a `WireReader`.
    ///
    /// An empty unlocking script reads back as `None`.
    pub fn read_from(reader: &mut WireReader) -> Result<Self, TransactionError> {
        let txid_bytes = reader.read_array::<32>().map_err(|e| {
            TransactionError::SerializationError(format!("reading source txid: {}", e))
        })?;

        let source_tx_out_index = reader.read_u32_le().map_err(|e| {
            TransactionError::SerializationError(format!("reading output index: {}", e))
        })?;

        let script_len = reader.read_varint().map_err(|e| {
            TransactionError::SerializationError(format!("reading script length: {}", e))
        })?;

        let script_bytes = reader.read_bytes(script_len.value() as usize).map_err(|e| {
            TransactionError::SerializationError(format!("reading unlocking script: {}", e))
        })?;

        let sequence_number = reader.read_u32_le().map_err(|e| {
            TransactionError::SerializationError(format!("reading sequence number: {}", e))
        })?;

        let unlocking_script = if script_bytes.is_empty() {
            None
        } else {
            Some(Script::from_bytes(script_bytes))
        };

        Ok(TransactionInput {
            source_txid: Hash::new(txid_bytes),
            source_tx_out_index,
            sequence_number,
            unlocking_script,
        })
    }

    /// Serialize this input into a `WireWriter`.
    pub fn write_to(&self, writer: &mut WireWriter) {
        self.write_outpoint(writer);
        match &self.unlocking_script {
            Some(script) => writer.write_var_bytes(script.to_bytes()),
            None => writer.write_varint(VarInt::from(0u64)),
        }
        writer.write_u32_le(self.sequence_number);
    }

    /// Write the 36-byte outpoint (txid followed by output index).
    pub fn write_outpoint(&self, writer: &mut WireWriter) {
        writer.write_bytes(self.source_txid.as_bytes());
        writer.write_u32_le(self.source_tx_out_index);
    }

    /// Unlocking script bytes as serialized; empty when unsigned.
    pub fn unlocking_script_bytes(&self) -> &[u8] {
        self.unlocking_script.as_ref().map_or(&[], |s| s.to_bytes())
    }

    /// Whether an unlocking script has been set.
    pub fn is_signed(&self) -> bool {
        !self.unlocking_script_bytes().is_empty()
    }
}

impl PartialEq for TransactionInput {
    fn eq(&self, other: &Self) -> bool {
        self.source_txid == other.source_txid
            && self.source_tx_out_index == other.source_tx_out_index
            && self.sequence_number == other.sequence_number
            && self.unlocking_script_bytes() == other.unlocking_script_bytes()
    }
}

impl Eq for TransactionInput {}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_empty_script_equals_unsigned() {
        let unsigned = TransactionInput::new(Hash::new([7; 32]), 1);
        let mut empty = unsigned.clone();
        empty.unlocking_script = Some(Script::new());
        assert_eq!(empty, unsigned);
        assert!(!empty.is_signed());

        let mut signed = unsigned.clone();
        signed.unlocking_script = Some(Script::from_bytes(&[0x51]));
        assert_ne!(signed, unsigned);
        assert!(signed.is_signed());
    }

    #[test]
    fn test_empty_script_roundtrip() {
        let mut input = TransactionInput::new(Hash::new([9; 32]), 3);
        input.unlocking_script = Some(Script::new());

        let mut writer = WireWriter::new();
        input.write_to(&mut writer);
        let bytes = writer.into_bytes();
        let mut reader = WireReader::new(&bytes);
        let parsed = TransactionInput::read_from(&mut reader).unwrap();

        assert_eq!(parsed, input);
        assert!(parsed.unlocking_script.is_none());
    }
}
