//! Transaction broadcasting interface.

use std::fmt;

/// Result of a successful broadcast.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BroadcastSuccess {
    /// The transaction id reported by the network.
    pub txid: String,
    pub message: String,
}

/// Result of a failed broadcast.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BroadcastFailure {
    /// Machine-readable error code from the broadcaster.
    pub code: String,
    pub description: String,
}

impl fmt::Display for BroadcastFailure {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} ({})", self.description, self.code)
    }
}

impl std::error::Error for BroadcastFailure {}

/// Submits serialized transactions to the network.
pub trait Broadcaster {
    /// Broadcast the raw wire bytes of a signed transaction.
    fn broadcast(&self, raw_tx: &[u8]) -> Result<BroadcastSuccess, BroadcastFailure>;
}

impl<B: Broadcaster + ?Sized> Broadcaster for &B {
    fn broadcast(&self, raw_tx: &[u8]) -> Result<BroadcastSuccess, BroadcastFailure> {
        (**self).broadcast(raw_tx)
    }
}
