//! Signs the P2PKH inputs of an unsigned transaction with matching keys.
//!
//! Each input is matched to a key by the pubkey hash in the locking script
//! of the utxo it spends. Inputs without a matching key, and inputs whose
//! utxo is not P2PKH (multisig, P2SH, time locks), are left unsigned; the
//! caller can check [`Transaction::is_fully_signed`] before broadcasting.

use cashkit_primitives::ec::PrivateKey;
use log::debug;

use crate::sighash::{SIGHASH_ALL_FORKID, SIGHASH_FORKID};
use crate::template::p2pkh;
use crate::template::UnlockingScriptTemplate;
use crate::transaction::Transaction;
use crate::unsigned::UnsignedTransaction;
use crate::TransactionError;

/// Sign with `SIGHASH_ALL | SIGHASH_FORKID`.
pub fn sign(unsigned: &UnsignedTransaction, keys: &[PrivateKey]) -> Result<Transaction, TransactionError> {
    sign_with_flag(unsigned, keys, SIGHASH_ALL_FORKID)
}

/// Sign every input some key in `keys` can unlock, using `sighash_flag`.
///
/// The first key whose compressed public key hashes to the input's pubkey
/// hash signs it. All digests are taken over `unsigned`, never over the
/// partially signed result.
///
/// # Errors
/// `UnsupportedSighash` when the flag lacks `SIGHASH_FORKID` or does not
/// fit in a byte. A missing key is not an error.
pub fn sign_with_flag(
    unsigned: &UnsignedTransaction,
    keys: &[PrivateKey],
    sighash_flag: u32,
) -> Result<Transaction, TransactionError> {
    if sighash_flag > 0xff || sighash_flag & SIGHASH_FORKID == 0 {
        return Err(TransactionError::UnsupportedSighash(sighash_flag));
    }

    let templates: Vec<_> = keys.iter().map(|key| p2pkh::unlock(key, Some(sighash_flag))).collect();

    let mut signed = unsigned.tx().clone();
    for (index, (input, utxo)) in signed.inputs.iter_mut().zip(unsigned.utxos()).enumerate() {
        let Ok(pubkey_hash) = utxo.locking_script.public_key_hash() else {
            debug!("input {} spends a non-P2PKH output, leaving it unsigned", index);
            continue;
        };

        let Some(template) = templates.iter().find(|t| t.can_unlock(&utxo.locking_script)) else {
            debug!("no key for pubkey hash {} on input {}", hex::encode(pubkey_hash), index);
            continue;
        };

        let unlocking_script = template.sign(unsigned, index)?;
        debug!("signed input {} ({}:{})", index, utxo.txid, utxo.vout);
        input.unlocking_script = Some(unlocking_script);
    }

    Ok(signed)
}
