//! Pipeline configuration, loadable from JSON.

use cashkit_transaction::fee::{FeePolicy, FixedFee, PerKilobyteFee, DEFAULT_FIXED_FEE};
use cashkit_transaction::input::DEFAULT_SEQUENCE_NUMBER;
use cashkit_transaction::transaction::DEFAULT_VERSION;
use cashkit_transaction::{SelectionStrategy, TransactionAssembler};
use serde::{Deserialize, Serialize};

use crate::SendError;

/// How the fee is computed.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum FeeSetting {
    Fixed { satoshis: u64 },
    PerKilobyte { satoshis_per_kb: u64 },
}

impl Default for FeeSetting {
    fn default() -> Self {
        FeeSetting::Fixed {
            satoshis: DEFAULT_FIXED_FEE,
        }
    }
}

impl FeePolicy for FeeSetting {
    fn fee_of(&self, input_count: usize, output_count: usize) -> u64 {
        match *self {
            FeeSetting::Fixed { satoshis } => FixedFee(satoshis).fee_of(input_count, output_count),
            FeeSetting::PerKilobyte { satoshis_per_kb } => {
                PerKilobyteFee::new(satoshis_per_kb).fee_of(input_count, output_count)
            }
        }
    }
}

/// Settings for [`Pipeline`](crate::Pipeline). Missing JSON fields take
/// their defaults: a 500 satoshi fixed fee, largest-first selection,
/// version 1, lock time 0 and final sequences.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct SendConfig {
    pub fee: FeeSetting,
    pub strategy: SelectionStrategy,
    pub version: u32,
    pub lock_time: u32,
    pub sequence: u32,
}

impl Default for SendConfig {
    fn default() -> Self {
        SendConfig {
            fee: FeeSetting::default(),
            strategy: SelectionStrategy::default(),
            version: DEFAULT_VERSION,
            lock_time: 0,
            sequence: DEFAULT_SEQUENCE_NUMBER,
        }
    }
}

impl SendConfig {
    pub fn from_json(json: &str) -> Result<Self, SendError> {
        Ok(serde_json::from_str(json)?)
    }

    pub fn assembler(&self) -> TransactionAssembler {
        TransactionAssembler::new(self.version, self.sequence)
    }
}
