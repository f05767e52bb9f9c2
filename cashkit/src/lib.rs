#![deny(missing_docs)]

//! cashkit: Bitcoin Cash transaction building and signing.
//!
//! Re-exports every cashkit component for single-crate usage.

pub use cashkit_primitives as primitives;
pub use cashkit_script as script;
pub use cashkit_transaction as transaction;
pub use cashkit_send as send;
