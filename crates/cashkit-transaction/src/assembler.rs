//! Turns selected outputs and payment outputs into an unsigned transaction.

use cashkit_script::Script;
use log::{debug, warn};

use crate::input::DEFAULT_SEQUENCE_NUMBER;
use crate::output::TransactionOutput;
use crate::selector::{sum_satoshis, Selection};
use crate::transaction::{Transaction, DEFAULT_VERSION};
use crate::unsigned::UnsignedTransaction;
use crate::utxo::UnspentOutput;
use crate::TransactionError;

/// Builds unsigned transactions with a fixed version and input sequence.
///
/// Lock times are only enforced when at least one input is non-final, so
/// time-locked spends need a `sequence` below `0xFFFFFFFF`.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct TransactionAssembler {
    pub version: u32,
    pub sequence: u32,
}

impl Default for TransactionAssembler {
    fn default() -> Self {
        TransactionAssembler {
            version: DEFAULT_VERSION,
            sequence: DEFAULT_SEQUENCE_NUMBER,
        }
    }
}

impl TransactionAssembler {
    pub fn new(version: u32, sequence: u32) -> Self {
        TransactionAssembler { version, sequence }
    }

    /// Assemble a transaction spending `selected` and paying `outputs`.
    ///
    /// Whatever remains after the outputs and `fee` goes to `change_script`
    /// as a final output; a remainder of zero adds no change output. Inputs
    /// follow the order of `selected` and carry no unlocking script.
    ///
    /// # Errors
    /// `NegativeChange` when `outputs` plus `fee` exceed the selected value.
    pub fn assemble(
        &self,
        selected: &[UnspentOutput],
        mut outputs: Vec<TransactionOutput>,
        change_script: &Script,
        fee: u64,
        lock_time: u32,
    ) -> Result<UnsignedTransaction, TransactionError> {
        if selected.is_empty() {
            return Err(TransactionError::InvalidTransaction(
                "no outputs selected to spend".to_string(),
            ));
        }

        let inputs_total = sum_satoshis(selected)
            .ok_or_else(|| TransactionError::InvalidTransaction("input total overflows".to_string()))?;
        let outputs_total = outputs
            .iter()
            .try_fold(0u64, |acc, o| acc.checked_add(o.satoshis))
            .ok_or_else(|| TransactionError::InvalidTransaction("output total overflows".to_string()))?;

        let change = outputs_total
            .checked_add(fee)
            .and_then(|spent| inputs_total.checked_sub(spent))
            .ok_or(TransactionError::NegativeChange {
                inputs: inputs_total,
                outputs: outputs_total,
                fee,
            })?;

        if change > 0 {
            outputs.push(TransactionOutput::new(change, change_script.clone()));
        }

        if lock_time != 0 && self.sequence == DEFAULT_SEQUENCE_NUMBER {
            warn!("lock time {} has no effect: every input sequence is final", lock_time);
        }

        let tx = Transaction {
            version: self.version,
            inputs: selected.iter().map(|u| u.to_input(self.sequence)).collect(),
            outputs,
            lock_time,
        };
        debug!(
            "assembled {} inputs, {} outputs, change {}, fee {}",
            tx.inputs.len(),
            tx.outputs.len(),
            change,
            fee
        );

        UnsignedTransaction::new(tx, selected.to_vec())
    }

    /// [`assemble`](Self::assemble) with the inputs and fee of a selection.
    pub fn assemble_selection(
        &self,
        selection: &Selection,
        outputs: Vec<TransactionOutput>,
        change_script: &Script,
        lock_time: u32,
    ) -> Result<UnsignedTransaction, TransactionError> {
        self.assemble(&selection.chosen, outputs, change_script, selection.fee, lock_time)
    }
}
