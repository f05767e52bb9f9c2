//! The `Script` type: raw locking or unlocking script bytes with parsing,
//! classification and incremental construction helpers.

use std::fmt;

use crate::chunk::{decode_script, push_data_prefix, read_chunk, ScriptChunk};
use crate::opcodes::*;
use crate::ScriptError;

/// A script as a byte-vector newtype.
///
/// Scripts are only ever built and serialized here, never executed.
#[derive(Clone, Default, PartialEq, Eq, Hash)]
pub struct Script(Vec<u8>);

impl Script {
    // -----------------------------------------------------------------------
    // Constructors
    // -----------------------------------------------------------------------

    pub fn new() -> Self {
        Script(Vec::new())
    }

    pub fn from_bytes(bytes: &[u8]) -> Self {
        Script(bytes.to_vec())
    }

    pub fn from_hex(hex_str: &str) -> Result<Self, ScriptError> {
        let bytes = hex::decode(hex_str).map_err(|e| ScriptError::InvalidHex(e.to_string()))?;
        Ok(Script(bytes))
    }

    /// Parse space-separated ASM: opcode names, or hex for pushes.
    pub fn from_asm(asm: &str) -> Result<Self, ScriptError> {
        let mut script = Script::new();
        for token in asm.split_whitespace() {
            match string_to_opcode(token) {
                Some(op) if !(OP_DATA_1..=OP_PUSHDATA4).contains(&op) => {
                    script.append_opcodes(&[op])?
                }
                _ => {
                    let data = hex::decode(token).map_err(|_| ScriptError::InvalidOpcodeData)?;
                    script.append_push_data(&data)?;
                }
            }
        }
        Ok(script)
    }

    // -----------------------------------------------------------------------
    // Serialization
    // -----------------------------------------------------------------------

    pub fn to_hex(&self) -> String {
        hex::encode(&self.0)
    }

    /// Human-readable form; empty when the script cannot be parsed.
    pub fn to_asm(&self) -> String {
        match self.chunks() {
            Ok(chunks) => chunks
                .iter()
                .map(ScriptChunk::to_asm_string)
                .collect::<Vec<_>>()
                .join(" "),
            Err(_) => String::new(),
        }
    }

    pub fn to_bytes(&self) -> &[u8] {
        &self.0
    }

    pub fn into_bytes(self) -> Vec<u8> {
        self.0
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    // -----------------------------------------------------------------------
    // Classification
    // -----------------------------------------------------------------------

    /// `OP_DUP OP_HASH160 <20 bytes> OP_EQUALVERIFY OP_CHECKSIG`
    pub fn is_p2pkh(&self) -> bool {
        matches!(
            self.0.as_slice(),
            [OP_DUP, OP_HASH160, OP_DATA_20, .., OP_EQUALVERIFY, OP_CHECKSIG] if self.0.len() == 25
        )
    }

    /// `OP_HASH160 <20 bytes> OP_EQUAL`
    pub fn is_p2sh(&self) -> bool {
        matches!(
            self.0.as_slice(),
            [OP_HASH160, OP_DATA_20, .., OP_EQUAL] if self.0.len() == 23
        )
    }

    /// Provably unspendable data carrier (`OP_RETURN` or `OP_FALSE OP_RETURN`).
    pub fn is_data(&self) -> bool {
        matches!(self.0.as_slice(), [OP_RETURN, ..] | [OP_FALSE, OP_RETURN, ..])
    }

    /// Bare multisig: `OP_m <pubkey>... OP_n OP_CHECKMULTISIG`.
    pub fn is_multisig_out(&self) -> bool {
        let Ok(parts) = self.chunks() else {
            return false;
        };
        let [first, keys @ .., n, last] = parts.as_slice() else {
            return false;
        };
        is_small_int_op(first.op)
            && first.op != OP_0
            && !keys.is_empty()
            && keys.iter().all(|k| k.data.as_ref().is_some_and(|d| !d.is_empty()))
            && is_small_int_op(n.op)
            && last.op == OP_CHECKMULTISIG
    }

    // -----------------------------------------------------------------------
    // Data extraction
    // -----------------------------------------------------------------------

    /// The 20-byte pubkey hash of a P2PKH script.
    pub fn public_key_hash(&self) -> Result<[u8; 20], ScriptError> {
        if self.0.is_empty() {
            return Err(ScriptError::EmptyScript);
        }
        if !self.is_p2pkh() {
            return Err(ScriptError::NotP2PKH);
        }
        let mut hash = [0u8; 20];
        hash.copy_from_slice(&self.0[3..23]);
        Ok(hash)
    }

    /// The 20-byte script hash of a P2SH script, if it is one.
    pub fn script_hash(&self) -> Option<[u8; 20]> {
        if !self.is_p2sh() {
            return None;
        }
        let mut hash = [0u8; 20];
        hash.copy_from_slice(&self.0[2..22]);
        Some(hash)
    }

    pub fn chunks(&self) -> Result<Vec<ScriptChunk>, ScriptError> {
        decode_script(&self.0)
    }

    /// The final chunk, parsing the whole script to find it.
    pub fn last_chunk(&self) -> Result<Option<ScriptChunk>, ScriptError> {
        let mut pos = 0;
        let mut last = None;
        while pos < self.0.len() {
            last = Some(read_chunk(&self.0, &mut pos)?);
        }
        Ok(last)
    }

    // -----------------------------------------------------------------------
    // Building
    // -----------------------------------------------------------------------

    /// Push `data` with the minimal push opcode for its length.
    pub fn append_push_data(&mut self, data: &[u8]) -> Result<(), ScriptError> {
        let prefix = push_data_prefix(data.len())?;
        self.0.extend_from_slice(&prefix);
        self.0.extend_from_slice(data);
        Ok(())
    }

    /// Append non-push opcodes. Push opcodes are rejected since their data
    /// would be missing.
    pub fn append_opcodes(&mut self, opcodes: &[u8]) -> Result<(), ScriptError> {
        if let Some(&op) = opcodes.iter().find(|&&op| (OP_DATA_1..=OP_PUSHDATA4).contains(&op)) {
            return Err(ScriptError::InvalidOpcodeType(opcode_to_string(op).to_string()));
        }
        self.0.extend_from_slice(opcodes);
        Ok(())
    }

    /// Append another script's bytes verbatim.
    pub fn append_script(&mut self, other: &Script) {
        self.0.extend_from_slice(&other.0);
    }
}

impl From<Vec<u8>> for Script {
    fn from(bytes: Vec<u8>) -> Self {
        Script(bytes)
    }
}

impl fmt::Display for Script {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.to_hex())
    }
}

impl fmt::Debug for Script {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Script({})", self.to_hex())
    }
}

impl serde::Serialize for Script {
    fn serialize<S: serde::Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(&self.to_hex())
    }
}

impl<'de> serde::Deserialize<'de> for Script {
    fn deserialize<D: serde::Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let s = String::deserialize(deserializer)?;
        Script::from_hex(&s).map_err(serde::de::Error::custom)
    }
}
