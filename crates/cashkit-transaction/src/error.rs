/// Error types for transaction operations.
#[derive(Debug, thiserror::Error)]
pub enum TransactionError {
    /// The available outputs cannot cover the target plus the fee.
    #[error("insufficient funds: {available} satoshis available, {required} required")]
    InsufficientFunds { available: u64, required: u64 },

    /// Outputs plus fee exceed the selected inputs. Indicates a bug in the
    /// caller's selection, never a transient condition.
    #[error("negative change: inputs {inputs}, outputs {outputs}, fee {fee}")]
    NegativeChange { inputs: u64, outputs: u64, fee: u64 },

    #[error("input index {index} out of range (tx has {count} inputs)")]
    IndexOutOfRange { index: usize, count: usize },

    /// Sighash flags without `SIGHASH_FORKID` are not valid on Bitcoin Cash.
    #[error("unsupported sighash flag: {0:#04x}")]
    UnsupportedSighash(u32),

    /// The transaction structure is invalid (e.g. inputs not matching utxos).
    #[error("invalid transaction: {0}")]
    InvalidTransaction(String),

    /// An error occurred during binary/hex serialization or deserialization.
    #[error("serialization error: {0}")]
    SerializationError(String),

    /// A key or signature failure while signing.
    #[error("primitives error: {0}")]
    Primitives(#[from] cashkit_primitives::PrimitivesError),
}
