use crate::broadcaster::BroadcastFailure;
use crate::source::FetchFailure;

/// Errors from the send pipeline, one variant per stage.
#[derive(Debug, thiserror::Error)]
pub enum SendError {
    /// The UTXO source could not be queried.
    #[error("fetching unspent outputs: {0}")]
    Fetch(#[from] FetchFailure),

    /// Selection, assembly or signing failed.
    #[error("building transaction: {0}")]
    Build(#[from] cashkit_transaction::TransactionError),

    /// Some inputs have no unlocking script, so the network would reject it.
    #[error("inputs {unsigned_inputs:?} are not signed")]
    IncompleteSignatures { unsigned_inputs: Vec<usize> },

    #[error("broadcast failed: {0}")]
    Broadcast(#[from] BroadcastFailure),

    #[error("invalid configuration: {0}")]
    Config(#[from] serde_json::Error),
}
