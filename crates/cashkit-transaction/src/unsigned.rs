//! A transaction paired with the outputs its inputs spend.

use crate::sighash;
use crate::transaction::Transaction;
use crate::utxo::UnspentOutput;
use crate::TransactionError;

/// An assembled transaction awaiting signatures.
///
/// `tx.inputs[i]` always spends `utxos[i]`; the constructor rejects any
/// pairing that breaks this, so the signer can look up the spent value and
/// locking script of every input by position.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct UnsignedTransaction {
    tx: Transaction,
    utxos: Vec<UnspentOutput>,
}

impl UnsignedTransaction {
    /// Pair `tx` with the outputs it spends.
    ///
    /// # Errors
    /// `InvalidTransaction` when the counts differ or an input does not
    /// reference the utxo at the same position.
    pub fn new(tx: Transaction, utxos: Vec<UnspentOutput>) -> Result<Self, TransactionError> {
        if tx.inputs.len() != utxos.len() {
            return Err(TransactionError::InvalidTransaction(format!(
                "{} inputs but {} spent outputs",
                tx.inputs.len(),
                utxos.len()
            )));
        }
        for (i, (input, utxo)) in tx.inputs.iter().zip(&utxos).enumerate() {
            if !utxo.is_spent_by(input) {
                return Err(TransactionError::InvalidTransaction(format!(
                    "input {} spends {}:{}, expected {}:{}",
                    i, input.source_txid, input.source_tx_out_index, utxo.txid, utxo.vout
                )));
            }
        }
        Ok(UnsignedTransaction { tx, utxos })
    }

    pub fn tx(&self) -> &Transaction {
        &self.tx
    }

    pub fn utxos(&self) -> &[UnspentOutput] {
        &self.utxos
    }

    pub fn into_parts(self) -> (Transaction, Vec<UnspentOutput>) {
        (self.tx, self.utxos)
    }

    /// Sum of the spent outputs' values, or `None` on overflow.
    pub fn input_satoshis(&self) -> Option<u64> {
        self.utxos
            .iter()
            .try_fold(0u64, |acc, u| acc.checked_add(u.satoshis))
    }

    /// Fee paid by the transaction: inputs minus outputs.
    pub fn fee(&self) -> Option<u64> {
        self.input_satoshis()?.checked_sub(self.tx.total_output_satoshis()?)
    }

    /// The digest input `input_index` must sign under `sighash_flag`.
    pub fn signature_hash(&self, input_index: usize, sighash_flag: u32) -> Result<[u8; 32], TransactionError> {
        let utxo = self.utxos.get(input_index).ok_or(TransactionError::IndexOutOfRange {
            index: input_index,
            count: self.utxos.len(),
        })?;
        sighash::signature_hash(&self.tx, input_index, &utxo.to_output(), sighash_flag)
    }
}
