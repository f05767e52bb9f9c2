//! Signature hash computation for transaction signing.
//!
//! Bitcoin Cash signs a BIP-143-style digest that commits to the value of
//! the spent output and carries `SIGHASH_FORKID` for replay protection.
//! Unlocking scripts never enter the digest, so signing one input does not
//! change the hash of any other.
//!
//! See <https://github.com/bitcoincashorg/bitcoincash.org/blob/master/spec/replay-protected-sighash.md>

use cashkit_primitives::hash::sha256d;
use cashkit_primitives::util::WireWriter;

use crate::output::TransactionOutput;
use crate::transaction::Transaction;
use crate::TransactionError;

// -----------------------------------------------------------------------
// Sighash flag constants
// -----------------------------------------------------------------------

/// Sign all inputs and all outputs.
pub const SIGHASH_ALL: u32 = 0x01;

/// Sign all inputs but no outputs.
pub const SIGHASH_NONE: u32 = 0x02;

/// Sign all inputs and only the output at the signed input's index.
pub const SIGHASH_SINGLE: u32 = 0x03;

/// Only commit to the input being signed.
pub const SIGHASH_ANYONECANPAY: u32 = 0x80;

/// Replay protection bit, mandatory on Bitcoin Cash.
pub const SIGHASH_FORKID: u32 = 0x40;

/// The standard flag: ALL | FORKID.
pub const SIGHASH_ALL_FORKID: u32 = SIGHASH_ALL | SIGHASH_FORKID;

/// Extracts the base type (ALL, NONE, SINGLE).
pub const SIGHASH_MASK: u32 = 0x1f;

// -----------------------------------------------------------------------
// FORKID signature hash
// -----------------------------------------------------------------------

/// Compute the digest an input's signature commits to.
///
/// `spent_output` is the output being spent: its locking script is the
/// scriptCode and its value is committed to directly.
///
/// # Errors
/// * `UnsupportedSighash` if `sighash_flag` lacks `SIGHASH_FORKID`.
/// * `IndexOutOfRange` if `input_index` is not an input of `tx`.
pub fn signature_hash(
    tx: &Transaction,
    input_index: usize,
    spent_output: &TransactionOutput,
    sighash_flag: u32,
) -> Result<[u8; 32], TransactionError> {
    let preimage = calc_preimage(tx, input_index, spent_output, sighash_flag)?;
    Ok(sha256d(&preimage))
}

/// The preimage before double hashing.
///
/// 1. nVersion (4 bytes LE)
/// 2. hashPrevouts (32 bytes) - zero with ANYONECANPAY
/// 3. hashSequence (32 bytes) - zero with ANYONECANPAY, SINGLE or NONE
/// 4. outpoint (32+4 bytes)
/// 5. scriptCode (varint + script)
/// 6. value (8 bytes LE)
/// 7. nSequence (4 bytes LE)
/// 8. hashOutputs (32 bytes) - all outputs, the matching one for SINGLE, else zero
/// 9. nLocktime (4 bytes LE)
/// 10. sighash type (4 bytes LE)
pub fn calc_preimage(
    tx: &Transaction,
    input_index: usize,
    spent_output: &TransactionOutput,
    sighash_flag: u32,
) -> Result<Vec<u8>, TransactionError> {
    if sighash_flag & SIGHASH_FORKID == 0 {
        return Err(TransactionError::UnsupportedSighash(sighash_flag));
    }

    let input = tx.inputs.get(input_index).ok_or(TransactionError::IndexOutOfRange {
        index: input_index,
        count: tx.inputs.len(),
    })?;

    let anyone_can_pay = sighash_flag & SIGHASH_ANYONECANPAY != 0;
    let base_type = sighash_flag & SIGHASH_MASK;

    let hash_prevouts = if !anyone_can_pay {
        prevouts_hash(tx)
    } else {
        [0u8; 32]
    };

    let hash_sequence = if !anyone_can_pay && base_type != SIGHASH_SINGLE && base_type != SIGHASH_NONE {
        sequence_hash(tx)
    } else {
        [0u8; 32]
    };

    let hash_outputs = if base_type != SIGHASH_SINGLE && base_type != SIGHASH_NONE {
        outputs_hash(&tx.outputs)
    } else if base_type == SIGHASH_SINGLE && input_index < tx.outputs.len() {
        outputs_hash(&tx.outputs[input_index..=input_index])
    } else {
        [0u8; 32]
    };

    let script_code = spent_output.locking_script.to_bytes();
    let mut writer = WireWriter::with_capacity(156 + script_code.len());

    writer.write_u32_le(tx.version);
    writer.write_bytes(&hash_prevouts);
    writer.write_bytes(&hash_sequence);
    input.write_outpoint(&mut writer);
    writer.write_var_bytes(script_code);
    writer.write_u64_le(spent_output.satoshis);
    writer.write_u32_le(input.sequence_number);
    writer.write_bytes(&hash_outputs);
    writer.write_u32_le(tx.lock_time);
    writer.write_u32_le(sighash_flag);

    Ok(writer.into_bytes())
}

// -----------------------------------------------------------------------
// Internal helper functions
// -----------------------------------------------------------------------

fn prevouts_hash(tx: &Transaction) -> [u8; 32] {
    let mut writer = WireWriter::with_capacity(tx.inputs.len() * 36);
    for input in &tx.inputs {
        input.write_outpoint(&mut writer);
    }
    sha256d(writer.as_bytes())
}

fn sequence_hash(tx: &Transaction) -> [u8; 32] {
    let mut writer = WireWriter::with_capacity(tx.inputs.len() * 4);
    for input in &tx.inputs {
        writer.write_u32_le(input.sequence_number);
    }
    sha256d(writer.as_bytes())
}

fn outputs_hash(outputs: &[TransactionOutput]) -> [u8; 32] {
    let mut writer = WireWriter::new();
    for output in outputs {
        output.write_to(&mut writer);
    }
    sha256d(writer.as_bytes())
}
