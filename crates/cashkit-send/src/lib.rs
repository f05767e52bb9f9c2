//! cashkit send pipeline.
//!
//! Wires a UTXO source, the coin selector, the assembler, the signer and a
//! broadcaster into explicit stages. `prepare` produces a signed payment
//! without touching the network a second time; `broadcast` hands it off and
//! can be retried on its own.

pub mod broadcaster;
pub mod source;
pub mod config;
pub mod pipeline;

mod error;
pub use error::SendError;
pub use broadcaster::{BroadcastFailure, BroadcastSuccess, Broadcaster};
pub use source::{FetchFailure, UtxoSource};
pub use config::{FeeSetting, SendConfig};
pub use pipeline::{Pipeline, SignedPayment};

#[cfg(test)]
mod tests;
