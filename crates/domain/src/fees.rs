use serde::{Deserialize, Serialize};
use thiserror::Error;

const BASIS_POINTS_SCALE: i64 = 10_000;

/// Platform fee rate held as basis points so fee math stays in integers.
/// `0.15` becomes 1500 bp; amounts are currency minor units throughout.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct FeeRate(i64);

#[derive(Error, Debug, PartialEq)]
#[error("Fee rate {0} is outside [0, 1)")]
pub struct InvalidFeeRate(f64);

impl FeeRate {
    pub fn from_fraction(rate: f64) -> Result<Self, InvalidFeeRate> {
        if !rate.is_finite() || !(0.0..1.0).contains(&rate) {
            return Err(InvalidFeeRate(rate));
        }
        #[allow(clippy::cast_possible_truncation)]
        let basis_points = (rate * BASIS_POINTS_SCALE as f64).round() as i64;
        if !(0..BASIS_POINTS_SCALE).contains(&basis_points) {
            return Err(InvalidFeeRate(rate));
        }
        Ok(Self(basis_points))
    }

    pub fn basis_points(&self) -> i64 {
        self.0
    }
}

/// How a captured amount splits between the platform and the expert.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FeeBreakdown {
    pub gross_amount: i64,
    pub platform_fee: i64,
    pub expert_net: i64,
}

/// `platform_fee = floor(amount * fee_rate)`, `expert_net = amount - fee`.
/// Integer arithmetic only; the currency is carried alongside, unchanged.
pub fn split_amount(amount_minor: i64, rate: FeeRate) -> FeeBreakdown {
    let platform_fee = amount_minor * rate.basis_points() / BASIS_POINTS_SCALE;
    FeeBreakdown {
        gross_amount: amount_minor,
        platform_fee,
        expert_net: amount_minor - platform_fee,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn fifteen_percent_of_10000() {
        let rate = FeeRate::from_fraction(0.15).unwrap();
        let split = split_amount(10000, rate);
        assert_eq!(split.platform_fee, 1500);
        assert_eq!(split.expert_net, 8500);
        assert_eq!(split.gross_amount, 10000);
    }

    #[test]
    fn fee_is_floored() {
        let rate = FeeRate::from_fraction(0.15).unwrap();
        // 0.15 * 999 = 149.85 -> 149
        let split = split_amount(999, rate);
        assert_eq!(split.platform_fee, 149);
        assert_eq!(split.expert_net, 850);
    }

    #[test]
    fn zero_rate_passes_everything_through() {
        let rate = FeeRate::from_fraction(0.0).unwrap();
        let split = split_amount(12345, rate);
        assert_eq!(split.platform_fee, 0);
        assert_eq!(split.expert_net, 12345);
    }

    #[test]
    fn split_always_sums_to_gross() {
        let rate = FeeRate::from_fraction(0.0733).unwrap();
        for amount in [0, 1, 7, 99, 100, 12345, 1_000_000] {
            let split = split_amount(amount, rate);
            assert_eq!(split.platform_fee + split.expert_net, amount);
            assert!(split.platform_fee >= 0);
        }
    }

    #[test]
    fn rejects_rates_outside_the_unit_interval() {
        assert!(FeeRate::from_fraction(-0.01).is_err());
        assert!(FeeRate::from_fraction(1.0).is_err());
        assert!(FeeRate::from_fraction(f64::NAN).is_err());
        assert!(FeeRate::from_fraction(0.9999).is_ok());
    }
}
