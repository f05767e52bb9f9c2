//! UTXO selection.
//!
//! Picks which unspent outputs fund a payment and what fee the resulting
//! transaction pays. The fee is re-evaluated for every candidate input
//! count, so a size-based policy sees the final shape.

use std::cmp::Ordering;

use log::debug;
use serde::{Deserialize, Serialize};

use crate::fee::{FeePolicy, FixedFee};
use crate::utxo::UnspentOutput;
use crate::TransactionError;

/// Outputs a plain payment creates: the payment and the change.
pub const DEFAULT_OUTPUT_COUNT: usize = 2;

/// Order in which candidate outputs are consumed.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SelectionStrategy {
    /// Spend every available output, consolidating the wallet.
    All,
    /// Fewest inputs: biggest values first.
    #[default]
    LargestFirst,
    /// Sweep dust: smallest values first.
    SmallestFirst,
}

/// The outcome of a selection.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Selection {
    pub chosen: Vec<UnspentOutput>,
    pub fee: u64,
}

impl Selection {
    /// Sum of the chosen values, `None` on overflow.
    pub fn total(&self) -> Option<u64> {
        sum_satoshis(&self.chosen)
    }
}

/// Chooses inputs for a target amount under a fee policy.
#[derive(Clone, Debug)]
pub struct CoinSelector<F = FixedFee> {
    fee_policy: F,
    strategy: SelectionStrategy,
    output_count: usize,
}

impl Default for CoinSelector<FixedFee> {
    fn default() -> Self {
        CoinSelector::new(FixedFee::default())
    }
}

impl<F: FeePolicy> CoinSelector<F> {
    pub fn new(fee_policy: F) -> Self {
        CoinSelector {
            fee_policy,
            strategy: SelectionStrategy::default(),
            output_count: DEFAULT_OUTPUT_COUNT,
        }
    }

    pub fn with_strategy(mut self, strategy: SelectionStrategy) -> Self {
        self.strategy = strategy;
        self
    }

    /// Number of outputs the fee is evaluated for.
    pub fn with_output_count(mut self, output_count: usize) -> Self {
        self.output_count = output_count;
        self
    }

    pub fn strategy(&self) -> SelectionStrategy {
        self.strategy
    }

    /// Select outputs from `available` covering `target` plus the fee.
    ///
    /// At least one output is always chosen, and the chosen total is never
    /// below `target + fee`.
    ///
    /// # Errors
    /// `InsufficientFunds` when even every available output falls short.
    /// `InvalidTransaction` when the candidate values overflow a `u64`.
    pub fn select(&self, available: &[UnspentOutput], target: u64) -> Result<Selection, TransactionError> {
        let candidates = self.ordered(available);
        let fee_for = |inputs: usize| self.fee_policy.fee_of(inputs, self.output_count);

        let selection = match self.strategy {
            SelectionStrategy::All => {
                let fee = fee_for(candidates.len());
                let total = sum_satoshis(&candidates).ok_or_else(input_overflow)?;
                let covered = !candidates.is_empty() && covers(total, target, fee);
                covered.then_some(Selection { chosen: candidates, fee })
            }
            SelectionStrategy::LargestFirst | SelectionStrategy::SmallestFirst => {
                let mut total = 0u64;
                let mut found = None;
                for (i, utxo) in candidates.iter().enumerate() {
                    total = total.checked_add(utxo.satoshis).ok_or_else(input_overflow)?;
                    let fee = fee_for(i + 1);
                    if covers(total, target, fee) {
                        found = Some(Selection {
                            chosen: candidates[..=i].to_vec(),
                            fee,
                        });
                        break;
                    }
                }
                found
            }
        };

        match selection {
            Some(selection) => {
                debug!(
                    "selected {} of {} outputs for target {} with fee {}",
                    selection.chosen.len(),
                    available.len(),
                    target,
                    selection.fee
                );
                Ok(selection)
            }
            None => Err(TransactionError::InsufficientFunds {
                available: sum_satoshis(available).ok_or_else(input_overflow)?,
                required: target.saturating_add(fee_for(available.len().max(1))),
            }),
        }
    }

    /// Candidates in consumption order. Value ties are broken by outpoint
    /// so the same set always yields the same selection.
    fn ordered(&self, available: &[UnspentOutput]) -> Vec<UnspentOutput> {
        let mut candidates = available.to_vec();
        let by_outpoint = |a: &UnspentOutput, b: &UnspentOutput| -> Ordering {
            a.txid.cmp(&b.txid).then(a.vout.cmp(&b.vout))
        };
        match self.strategy {
            SelectionStrategy::All => {}
            SelectionStrategy::LargestFirst => {
                candidates.sort_by(|a, b| b.satoshis.cmp(&a.satoshis).then_with(|| by_outpoint(a, b)));
            }
            SelectionStrategy::SmallestFirst => {
                candidates.sort_by(|a, b| a.satoshis.cmp(&b.satoshis).then_with(|| by_outpoint(a, b)));
            }
        }
        candidates
    }
}

pub(crate) fn sum_satoshis(utxos: &[UnspentOutput]) -> Option<u64> {
    utxos.iter().try_fold(0u64, |acc, u| acc.checked_add(u.satoshis))
}

/// `target + fee` beyond `u64::MAX` is never covered.
fn covers(total: u64, target: u64, fee: u64) -> bool {
    target.checked_add(fee).is_some_and(|required| total >= required)
}

fn input_overflow() -> TransactionError {
    TransactionError::InvalidTransaction("input total overflows".to_string())
}
