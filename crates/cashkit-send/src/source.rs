//! Where unspent outputs come from.

use std::fmt;

use cashkit_script::builder::build_address_lock;
use cashkit_script::Address;
use cashkit_transaction::UnspentOutput;

/// A UTXO source could not answer.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FetchFailure {
    pub description: String,
}

impl FetchFailure {
    pub fn new(description: impl Into<String>) -> Self {
        FetchFailure {
            description: description.into(),
        }
    }
}

impl fmt::Display for FetchFailure {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.description)
    }
}

impl std::error::Error for FetchFailure {}

/// Lists the outputs an address can spend, typically backed by an indexer.
pub trait UtxoSource {
    fn unspent_outputs(&self, address: &Address) -> Result<Vec<UnspentOutput>, FetchFailure>;
}

impl<S: UtxoSource + ?Sized> UtxoSource for &S {
    fn unspent_outputs(&self, address: &Address) -> Result<Vec<UnspentOutput>, FetchFailure> {
        (**self).unspent_outputs(address)
    }
}

/// A fixed set of outputs, filtered to those locked to the address.
impl UtxoSource for [UnspentOutput] {
    fn unspent_outputs(&self, address: &Address) -> Result<Vec<UnspentOutput>, FetchFailure> {
        let lock = build_address_lock(address);
        Ok(self
            .iter()
            .filter(|utxo| utxo.locking_script == lock)
            .cloned()
            .collect())
    }
}

impl UtxoSource for Vec<UnspentOutput> {
    fn unspent_outputs(&self, address: &Address) -> Result<Vec<UnspentOutput>, FetchFailure> {
        self.as_slice().unspent_outputs(address)
    }
}

/// Decode an insight `/addr/{address}/utxo` response body.
pub fn parse_insight_utxos(body: &str) -> Result<Vec<UnspentOutput>, FetchFailure> {
    serde_json::from_str(body)
        .map_err(|e| FetchFailure::new(format!("decoding utxo response: {}", e)))
}
