//! cashkit primitives: hashing, chain hashes, secp256k1 keys and signatures,
//! Base58Check and the little-endian wire encoding shared by scripts and
//! transactions.

pub mod hash;
pub mod chainhash;
pub mod util;
pub mod base58;
pub mod ec;

mod error;
pub use error::PrimitivesError;
