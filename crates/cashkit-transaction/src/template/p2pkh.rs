//! Pay-to-Public-Key-Hash (P2PKH) unlocking template.
//!
//! Spends `OP_DUP OP_HASH160 <hash> OP_EQUALVERIFY OP_CHECKSIG` outputs
//! with `<sig> <pubkey>`.

use cashkit_primitives::ec::PrivateKey;
use cashkit_script::builder::build_unlocking_script;
use cashkit_script::Script;

use crate::sighash::{SIGHASH_ALL_FORKID, SIGHASH_FORKID};
use crate::template::UnlockingScriptTemplate;
use crate::unsigned::UnsignedTransaction;
use crate::TransactionError;

/// A signer for P2PKH inputs, defaulting to `SIGHASH_ALL_FORKID`.
pub fn unlock(private_key: &PrivateKey, sighash_flag: Option<u32>) -> P2PKH<'_> {
    P2PKH {
        private_key,
        sighash_flag: sighash_flag.unwrap_or(SIGHASH_ALL_FORKID),
    }
}

/// P2PKH signing template borrowing the caller's key.
pub struct P2PKH<'a> {
    private_key: &'a PrivateKey,
    sighash_flag: u32,
}

impl P2PKH<'_> {
    /// Whether this key can unlock `locking_script`: it must be P2PKH and
    /// commit to the hash of the key's compressed public key.
    pub fn can_unlock(&self, locking_script: &Script) -> bool {
        locking_script
            .public_key_hash()
            .is_ok_and(|pkh| pkh == self.private_key.pub_key().hash160())
    }
}

impl UnlockingScriptTemplate for P2PKH<'_> {
    /// `<DER_sig || flag_byte> <compressed_pubkey>` over the FORKID digest.
    fn sign(&self, unsigned: &UnsignedTransaction, input_index: usize) -> Result<Script, TransactionError> {
        let flag_byte = u8::try_from(self.sighash_flag)
            .ok()
            .filter(|flag| u32::from(*flag) & SIGHASH_FORKID != 0)
            .ok_or(TransactionError::UnsupportedSighash(self.sighash_flag))?;

        let sig_hash = unsigned.signature_hash(input_index, self.sighash_flag)?;
        let signature = self.private_key.sign(&sig_hash)?;

        Ok(build_unlocking_script(&signature, &self.private_key.pub_key(), flag_byte))
    }
}
