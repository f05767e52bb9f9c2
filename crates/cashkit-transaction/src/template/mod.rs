//! Script templates for signing transaction inputs.
//!
//! Provides the `UnlockingScriptTemplate` trait and its P2PKH
//! implementation.

pub mod p2pkh;

use cashkit_script::Script;

use crate::unsigned::UnsignedTransaction;
use crate::TransactionError;

/// Produces the unlocking script for one input of an unsigned transaction.
///
/// Implementations compute the signature hash against the unsigned
/// transaction and the utxo the input spends, so the result does not depend
/// on which other inputs are already signed.
pub trait UnlockingScriptTemplate {
    fn sign(&self, unsigned: &UnsignedTransaction, input_index: usize) -> Result<Script, TransactionError>;
}
