/// cashkit transaction layer.
///
/// Wire types for transactions, inputs and outputs; the UTXO selector and
/// fee policies; the assembler that turns a selection into an unsigned
/// transaction; the Bitcoin Cash FORKID signature hash; and the signer that
/// fills in P2PKH unlocking scripts.

pub mod transaction;
pub mod input;
pub mod output;
pub mod sighash;
pub mod template;
pub mod utxo;
pub mod unsigned;
pub mod fee;
pub mod selector;
pub mod assembler;
pub mod signer;

mod error;
pub use error::TransactionError;
pub use transaction::Transaction;
pub use input::TransactionInput;
pub use output::TransactionOutput;
pub use utxo::UnspentOutput;
pub use unsigned::UnsignedTransaction;
pub use fee::{FeePolicy, FixedFee, PerKilobyteFee};
pub use selector::{CoinSelector, Selection, SelectionStrategy};
pub use assembler::TransactionAssembler;
pub use signer::{sign, sign_with_flag};
