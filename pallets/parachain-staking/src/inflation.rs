// Copyright 2019-2022 PureStake Inc.
// Copyright 2023 Papers AG

//! Annual to per-round inflation and the issuance minted for a round.
use frame_support::traits::Currency;
use parity_scale_codec::{Decode, DecodeWithMemTracking, Encode, MaxEncodedLen};
use scale_info::TypeInfo;
use serde::{Deserialize, Serialize};
use sp_runtime::{PerThing, Perbill, RuntimeDebug};
use substrate_fixed::{transcendental::pow as floatpow, types::I64F64};

use crate::pallet::{BalanceOf, Config, Round};

const SECONDS_PER_YEAR: u32 = 31557600;
const SECONDS_PER_BLOCK: u32 = 12;
pub const BLOCKS_PER_YEAR: u32 = SECONDS_PER_YEAR / SECONDS_PER_BLOCK;

/// Number of rounds in a year, at least one.
fn rounds_per_year(blocks_per_round: u32) -> u32 {
    (BLOCKS_PER_YEAR / blocks_per_round.max(1)).max(1)
}

#[derive(
    Eq,
    PartialEq,
    Clone,
    Copy,
    Encode,
    Decode,
    DecodeWithMemTracking,
    Default,
    RuntimeDebug,
    MaxEncodedLen,
    TypeInfo,
    Serialize,
    Deserialize,
)]
pub struct Range<T> {
    pub min: T,
    pub ideal: T,
}

impl<T: Ord> Range<T> {
    pub fn is_valid(&self) -> bool {
        self.ideal >= self.min
    }
}

impl<T: Ord + Copy> From<T> for Range<T> {
    fn from(value: T) -> Range<T> {
        Range {
            min: value,
            ideal: value,
        }
    }
}

/// Compounds an annual rate down to a single period: `(1 + annual)^(1 / periods) - 1`.
/// The result is rounded up to the next part per billion.
fn compound_rate_per_period(annual: Perbill, periods: u32) -> Perbill {
    let one = I64F64::from_num(1);
    let accuracy = I64F64::from_num(Perbill::ACCURACY);
    let exponent = one / I64F64::from_num(periods.max(1));
    let rate = I64F64::from_num(annual.deconstruct()) / accuracy;
    // the base is within [1, 2] and the exponent within (0, 1]
    let per_period = floatpow(one + rate, exponent).unwrap_or(one);
    let parts = ((per_period - one) * accuracy).ceil();
    Perbill::from_parts(parts.saturating_to_num::<u32>())
}

/// Converts an annual inflation range into the range applied to each of `rounds_per_year`
/// rounds.
pub fn perbill_annual_to_perbill_round(
    annual: Range<Perbill>,
    rounds_per_year: u32,
) -> Range<Perbill> {
    Range {
        min: compound_rate_per_period(annual.min, rounds_per_year),
        ideal: compound_rate_per_period(annual.ideal, rounds_per_year),
    }
}

/// Issuance of one round given the staked amount of that round.
///
/// The round rate moves from `round.min` towards `round.ideal` the closer the staked share of
/// the total issuance gets to `ideal_staked`.
pub fn round_issuance<T: Config>(info: InflationInfo, staked: BalanceOf<T>) -> BalanceOf<T> {
    let circulating = T::Currency::total_issuance();
    let staked_share = Perbill::from_rational(staked, circulating);
    let factor = pallet_staking_reward_fn::compute_inflation(
        staked_share,
        info.ideal_staked,
        info.decay_rate,
    );
    let rate = info.round.min + (info.round.ideal - info.round.min) * factor;
    rate * circulating
}

#[derive(
    Eq, PartialEq, Clone, Encode, Decode, Default, RuntimeDebug, TypeInfo, Serialize, Deserialize,
)]
pub struct InflationInfo {
    /// Share of the total issuance that is expected to be staked
    pub ideal_staked: Perbill,
    /// Annual inflation range
    pub annual: Range<Perbill>,
    /// Inflation range of a single round, derived from `annual` and the round length
    pub round: Range<Perbill>,
    /// How fast inflation decays once more than `ideal_staked` is staked
    pub decay_rate: Perbill,
}

/// Inflation settings as submitted by governance; the round range is derived.
#[derive(
    Eq,
    PartialEq,
    Clone,
    Encode,
    Decode,
    DecodeWithMemTracking,
    Default,
    RuntimeDebug,
    TypeInfo,
    Serialize,
    Deserialize,
)]
pub struct InflationInfoWithoutRound {
    pub ideal_staked: Perbill,
    pub annual: Range<Perbill>,
    pub decay_rate: Perbill,
}

impl InflationInfo {
    /// Builds the config for the current round length.
    pub fn new<T: Config>(info: InflationInfoWithoutRound) -> InflationInfo {
        let mut config = InflationInfo {
            ideal_staked: info.ideal_staked,
            annual: info.annual,
            round: info.annual,
            decay_rate: info.decay_rate,
        };
        config.reset_round(<Round<T>>::get().length);
        config
    }

    /// Recomputes the round range for rounds of `new_length` blocks.
    pub fn reset_round(&mut self, new_length: u32) {
        self.round = perbill_annual_to_perbill_round(self.annual, rounds_per_year(new_length));
    }
}

impl From<InflationInfo> for InflationInfoWithoutRound {
    fn from(info: InflationInfo) -> Self {
        InflationInfoWithoutRound {
            ideal_staked: info.ideal_staked,
            annual: info.annual,
            decay_rate: info.decay_rate,
        }
    }
}
