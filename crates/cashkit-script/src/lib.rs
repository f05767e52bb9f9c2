//! cashkit script layer: the `Script` type, opcodes, chunk parsing, script
//! numbers, address decoding, and builders for the locking and unlocking
//! scripts a wallet spends and pays to.

pub mod script;
pub mod opcodes;
pub mod chunk;
pub mod scriptnum;
pub mod address;
pub mod builder;

mod error;
pub use error::ScriptError;
pub use script::Script;
pub use address::{Address, AddressKind, Network};
pub use chunk::ScriptChunk;
pub use builder::ConditionMode;

/// Largest script the interpreter accepts, in bytes.
pub const MAX_SCRIPT_SIZE: usize = 10_000;

/// Largest element a single push may place on the stack, which bounds
/// P2SH redeem scripts.
pub const MAX_SCRIPT_ELEMENT_SIZE: usize = 520;
