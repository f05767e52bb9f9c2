//! Fee policies used by the coin selector.
//!
//! A policy maps the shape of a transaction (how many inputs, how many
//! outputs) to the fee in satoshis. Sizes are estimated for P2PKH inputs
//! and outputs, the only kind the signer produces.

/// Fixed bytes per transaction: version, lock time and the two counts.
pub const TX_OVERHEAD_SIZE: usize = 10;

/// Signed P2PKH input: outpoint, script length, ~107 byte scriptSig, sequence.
pub const P2PKH_INPUT_SIZE: usize = 148;

/// P2PKH output: value, script length, 25 byte script.
pub const P2PKH_OUTPUT_SIZE: usize = 34;

/// Fee charged by [`FixedFee::default`].
pub const DEFAULT_FIXED_FEE: u64 = 500;

/// Decides the fee for a transaction of a given shape.
pub trait FeePolicy {
    fn fee_of(&self, input_count: usize, output_count: usize) -> u64;
}

impl<F> FeePolicy for F
where
    F: Fn(usize, usize) -> u64,
{
    fn fee_of(&self, input_count: usize, output_count: usize) -> u64 {
        self(input_count, output_count)
    }
}

/// The same fee regardless of size.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct FixedFee(pub u64);

impl Default for FixedFee {
    fn default() -> Self {
        FixedFee(DEFAULT_FIXED_FEE)
    }
}

impl FeePolicy for FixedFee {
    fn fee_of(&self, _input_count: usize, _output_count: usize) -> u64 {
        self.0
    }
}

/// A rate in satoshis per 1000 bytes of estimated size, rounded up.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct PerKilobyteFee {
    pub satoshis_per_kb: u64,
}

impl PerKilobyteFee {
    pub fn new(satoshis_per_kb: u64) -> Self {
        PerKilobyteFee { satoshis_per_kb }
    }
}

impl FeePolicy for PerKilobyteFee {
    fn fee_of(&self, input_count: usize, output_count: usize) -> u64 {
        let size = estimate_size(input_count, output_count) as u64;
        size.saturating_mul(self.satoshis_per_kb).div_ceil(1000)
    }
}

/// Estimated serialized size of a signed P2PKH-only transaction.
pub fn estimate_size(input_count: usize, output_count: usize) -> usize {
    TX_OVERHEAD_SIZE
        .saturating_add(input_count.saturating_mul(P2PKH_INPUT_SIZE))
        .saturating_add(output_count.saturating_mul(P2PKH_OUTPUT_SIZE))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_fixed_fee_ignores_shape() {
        let fee = FixedFee::default();
        assert_eq!(fee.fee_of(1, 2), 500);
        assert_eq!(fee.fee_of(40, 1), 500);
        assert_eq!(FixedFee(0).fee_of(3, 3), 0);
    }

    #[test]
    fn test_estimate_size() {
        // The classic one-in, two-out P2PKH spend is 226 bytes.
        assert_eq!(estimate_size(1, 2), 226);
        assert_eq!(estimate_size(0, 0), 10);
    }

    #[test]
    fn test_per_kilobyte_rounds_up() {
        assert_eq!(PerKilobyteFee::new(1000).fee_of(1, 2), 226);
        assert_eq!(PerKilobyteFee::new(1).fee_of(1, 2), 1);
        assert_eq!(PerKilobyteFee::new(0).fee_of(1, 2), 0);
        // 374 bytes at 1500 sat/kB is 561 exactly.
        assert_eq!(PerKilobyteFee::new(1500).fee_of(2, 2), 561);
    }

    #[test]
    fn test_closure_policy() {
        let policy = |inputs: usize, outputs: usize| (inputs * 100 + outputs * 10) as u64;
        assert_eq!(policy.fee_of(2, 2), 220);
    }
}
