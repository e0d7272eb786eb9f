use frame_support::pallet_prelude::*;
use frame_support::traits::Currency;

use crate::{BalanceOf, Config, RoundIndex};

/// Runtime hooks into candidate bonding and collator payouts.
pub trait StakingHooks<T: Config> {
    /// Upper bound for a collator's self bond.
    ///
    /// The amount may include balance that is already locked for staking, so callers compare it
    /// against the complete bond rather than the increment.
    fn get_collator_stakable_balance(acc: &T::AccountId) -> Result<BalanceOf<T>, DispatchError>;

    /// Pays `reward` earned by `collator` in `for_round`.
    fn payout_collator_reward(
        for_round: RoundIndex,
        collator: &T::AccountId,
        reward: BalanceOf<T>,
    ) -> Weight;
}

impl<T: Config> StakingHooks<T> for () {
    fn get_collator_stakable_balance(acc: &T::AccountId) -> Result<BalanceOf<T>, DispatchError> {
        Ok(T::Currency::free_balance(acc))
    }

    /// Mints the reward straight into the collator's account.
    fn payout_collator_reward(
        for_round: RoundIndex,
        collator: &T::AccountId,
        reward: BalanceOf<T>,
    ) -> Weight {
        crate::Pallet::<T>::mint_collator_reward(for_round, collator, reward)
    }
}
