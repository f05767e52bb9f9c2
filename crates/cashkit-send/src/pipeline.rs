//! The send pipeline: fetch, select, assemble, sign, broadcast.
//!
//! Each stage returns a typed result and the first failure stops the run.
//! [`Pipeline::prepare`] covers everything up to a signed transaction;
//! [`Pipeline::broadcast`] only performs the hand-off, so a failed
//! broadcast can be retried with the same signed payment.

use cashkit_primitives::chainhash::Hash;
use cashkit_primitives::ec::PrivateKey;
use cashkit_script::builder::build_address_lock;
use cashkit_script::{Address, Script};
use cashkit_transaction::{signer, CoinSelector, Transaction, TransactionError, TransactionOutput, UnspentOutput};
use log::{debug, info};

use crate::broadcaster::{BroadcastSuccess, Broadcaster};
use crate::config::SendConfig;
use crate::source::UtxoSource;
use crate::SendError;

/// A signed transaction ready for broadcast, with what it spent.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct SignedPayment {
    pub tx: Transaction,
    pub spent: Vec<UnspentOutput>,
    pub fee: u64,
}

impl SignedPayment {
    pub fn tx_id(&self) -> Hash {
        self.tx.tx_id()
    }

    pub fn is_fully_signed(&self) -> bool {
        self.tx.is_fully_signed()
    }
}

/// Runs payments against a UTXO source and a broadcaster.
pub struct Pipeline<S, B> {
    source: S,
    broadcaster: B,
    config: SendConfig,
}

impl<S: UtxoSource, B: Broadcaster> Pipeline<S, B> {
    pub fn new(source: S, broadcaster: B, config: SendConfig) -> Self {
        Pipeline {
            source,
            broadcaster,
            config,
        }
    }

    pub fn config(&self) -> &SendConfig {
        &self.config
    }

    /// Fetch the outputs of `from`, fund `outputs`, return change to `from`
    /// and sign with `keys`.
    ///
    /// The result may be partially signed when `keys` cannot unlock every
    /// selected output; [`broadcast`](Self::broadcast) refuses it.
    pub fn prepare(
        &self,
        from: &Address,
        outputs: Vec<TransactionOutput>,
        keys: &[PrivateKey],
    ) -> Result<SignedPayment, SendError> {
        let change_script = build_address_lock(from);
        self.prepare_with_change(from, outputs, &change_script, keys)
    }

    /// [`prepare`](Self::prepare) with an explicit change script.
    pub fn prepare_with_change(
        &self,
        from: &Address,
        outputs: Vec<TransactionOutput>,
        change_script: &Script,
        keys: &[PrivateKey],
    ) -> Result<SignedPayment, SendError> {
        let target = outputs
            .iter()
            .try_fold(0u64, |acc, o| acc.checked_add(o.satoshis))
            .ok_or_else(|| TransactionError::InvalidTransaction("output total overflows".to_string()))?;

        info!("fetching unspent outputs for {}", from);
        let available = self.source.unspent_outputs(from)?;
        debug!("{} unspent outputs available", available.len());

        let selection = CoinSelector::new(self.config.fee)
            .with_strategy(self.config.strategy)
            .with_output_count(outputs.len() + 1)
            .select(&available, target)?;
        info!(
            "selected {} inputs for {} satoshis, fee {}",
            selection.chosen.len(),
            target,
            selection.fee
        );

        let unsigned = self
            .config
            .assembler()
            .assemble_selection(&selection, outputs, change_script, self.config.lock_time)?;

        let tx = signer::sign(&unsigned, keys)?;
        let unsigned_inputs = tx.unsigned_inputs();
        if unsigned_inputs.is_empty() {
            info!("signed transaction {}", tx.tx_id());
        } else {
            info!("transaction {} left inputs {:?} unsigned", tx.tx_id(), unsigned_inputs);
        }

        let (_, spent) = unsigned.into_parts();
        Ok(SignedPayment {
            tx,
            spent,
            fee: selection.fee,
        })
    }

    /// Hand a fully signed payment to the broadcaster.
    ///
    /// # Errors
    /// `IncompleteSignatures` before any I/O if an input is unsigned.
    pub fn broadcast(&self, payment: &SignedPayment) -> Result<BroadcastSuccess, SendError> {
        let unsigned_inputs = payment.tx.unsigned_inputs();
        if !unsigned_inputs.is_empty() {
            return Err(SendError::IncompleteSignatures { unsigned_inputs });
        }

        info!("broadcasting {} ({} bytes)", payment.tx_id(), payment.tx.size());
        let success = self.broadcaster.broadcast(&payment.tx.to_bytes())?;
        info!("broadcast accepted: {} {}", success.txid, success.message);
        Ok(success)
    }

    /// Prepare and broadcast in one go.
    pub fn send(
        &self,
        from: &Address,
        outputs: Vec<TransactionOutput>,
        keys: &[PrivateKey],
    ) -> Result<BroadcastSuccess, SendError> {
        let payment = self.prepare(from, outputs, keys)?;
        self.broadcast(&payment)
    }
}
