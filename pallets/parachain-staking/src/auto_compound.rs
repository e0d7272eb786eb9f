// Copyright 2019-2022 PureStake Inc.
// Copyright 2023 Papers AG

//! Auto-compounding functionality for staking rewards

use frame_support::{dispatch::DispatchResultWithPostInfo, ensure, traits::Get};
use parity_scale_codec::{Decode, DecodeWithMemTracking, Encode};
use scale_info::TypeInfo;
use sp_runtime::{
    traits::{Saturating, Zero},
    BoundedVec, Percent, RuntimeDebug,
};
use sp_std::prelude::*;

use crate::pallet::{
    AutoCompoundingDelegations as AutoCompoundingDelegationsStorage, BalanceOf, CandidateInfo,
    Config, DelegatorState, Error, Event, Pallet, Total,
};
use crate::types::{AddGet, Bond, Delegator};

pub type MaxAutoCompoundingDelegations<T> = AddGet<
    <T as Config>::MaxTopDelegationsPerCandidate,
    <T as Config>::MaxBottomDelegationsPerCandidate,
>;

/// Auto-compound percentage of a single delegator towards a candidate.
#[derive(
    Clone,
    Eq,
    PartialEq,
    Encode,
    Decode,
    DecodeWithMemTracking,
    RuntimeDebug,
    TypeInfo,
    PartialOrd,
    Ord,
)]
pub struct AutoCompoundConfig<AccountId> {
    pub delegator: AccountId,
    pub value: Percent,
}

/// In-memory view of the auto-compounding entries of one candidate, sorted by delegator.
#[derive(Clone, Eq, PartialEq, RuntimeDebug)]
pub struct AutoCompoundDelegations<T: Config>(
    BoundedVec<AutoCompoundConfig<T::AccountId>, MaxAutoCompoundingDelegations<T>>,
);

impl<T: Config> AutoCompoundDelegations<T> {
    #[cfg(test)]
    pub fn new(
        sorted_delegations: BoundedVec<
            AutoCompoundConfig<T::AccountId>,
            MaxAutoCompoundingDelegations<T>,
        >,
    ) -> Self {
        Self(sorted_delegations)
    }

    pub fn get_auto_compounding_delegation_count(candidate: &T::AccountId) -> u32 {
        <AutoCompoundingDelegationsStorage<T>>::decode_len(candidate).unwrap_or_default() as u32
    }

    pub fn get_storage(candidate: &T::AccountId) -> Self {
        Self(<AutoCompoundingDelegationsStorage<T>>::get(candidate))
    }

    /// Writes the entries back, removing the storage item once it is empty.
    pub fn set_storage(self, candidate: &T::AccountId) {
        if self.0.is_empty() {
            <AutoCompoundingDelegationsStorage<T>>::remove(candidate)
        } else {
            <AutoCompoundingDelegationsStorage<T>>::insert(candidate, self.0)
        }
    }

    pub fn get_for_delegator(&self, delegator: &T::AccountId) -> Option<Percent> {
        self.0
            .binary_search_by(|d| d.delegator.cmp(delegator))
            .ok()
            .map(|index| self.0[index].value)
    }

    /// Returns `true` if the stored value changed.
    pub fn set_for_delegator(
        &mut self,
        delegator: T::AccountId,
        value: Percent,
    ) -> Result<bool, Error<T>> {
        match self.0.binary_search_by(|d| d.delegator.cmp(&delegator)) {
            Ok(index) if self.0[index].value == value => Ok(false),
            Ok(index) => {
                self.0[index].value = value;
                Ok(true)
            }
            Err(index) => {
                self.0
                    .try_insert(index, AutoCompoundConfig { delegator, value })
                    .map_err(|_| Error::<T>::ExceedMaxDelegationsPerDelegator)?;
                Ok(true)
            }
        }
    }

    /// Returns `true` if an entry was removed.
    pub fn remove_for_delegator(&mut self, delegator: &T::AccountId) -> bool {
        match self.0.binary_search_by(|d| d.delegator.cmp(delegator)) {
            Ok(index) => {
                self.0.remove(index);
                true
            }
            Err(_) => false,
        }
    }

    pub fn len(&self) -> u32 {
        self.0.len() as u32
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    #[cfg(test)]
    pub fn into_inner(self) -> Vec<AutoCompoundConfig<T::AccountId>> {
        self.0.into_inner()
    }

    /// Delegates `amount` towards `candidate` and stores the auto-compound value.
    /// A 0% value skips both the auto-compound hint check and the storage write.
    pub(crate) fn delegate_with_auto_compound(
        candidate: T::AccountId,
        delegator: T::AccountId,
        amount: BalanceOf<T>,
        auto_compound: Percent,
        candidate_delegation_count_hint: u32,
        candidate_auto_compounding_delegation_count_hint: u32,
        delegation_count_hint: u32,
    ) -> DispatchResultWithPostInfo {
        ensure!(
            <Pallet<T>>::get_delegator_stakable_balance(&delegator) >= amount,
            Error::<T>::InsufficientBalance
        );
        ensure!(
            amount >= T::MinDelegation::get(),
            Error::<T>::DelegationBelowMin
        );

        let mut delegator_state = match <DelegatorState<T>>::get(&delegator) {
            Some(mut state) => {
                ensure!(
                    delegation_count_hint >= state.delegations.len() as u32,
                    Error::<T>::TooLowDelegationCountToDelegate
                );
                ensure!(
                    (state.delegations.len() as u32) < T::MaxDelegationsPerDelegator::get(),
                    Error::<T>::ExceedMaxDelegationsPerDelegator
                );
                ensure!(
                    state.add_delegation(Bond {
                        owner: candidate.clone(),
                        amount
                    }),
                    Error::<T>::AlreadyDelegatedCandidate
                );
                state
            }
            None => {
                ensure!(
                    amount >= T::MinDelegatorStk::get(),
                    Error::<T>::DelegatorBondBelowMin
                );
                ensure!(
                    !<Pallet<T>>::is_candidate(&delegator),
                    Error::<T>::CandidateExists
                );
                Delegator::new(delegator.clone(), candidate.clone(), amount)
            }
        };
        let mut candidate_state =
            <CandidateInfo<T>>::get(&candidate).ok_or(Error::<T>::CandidateDNE)?;
        ensure!(
            candidate_delegation_count_hint >= candidate_state.delegation_count,
            Error::<T>::TooLowCandidateDelegationCountToDelegate
        );

        let mut auto_compounding_state = Self::get_storage(&candidate);
        if !auto_compound.is_zero() {
            ensure!(
                auto_compounding_state.len() <= candidate_auto_compounding_delegation_count_hint,
                Error::<T>::TooLowCandidateAutoCompoundingDelegationCountToDelegate,
            );
        }

        let (delegator_position, less_total_staked) = candidate_state.add_delegation::<T>(
            &candidate,
            Bond {
                owner: delegator.clone(),
                amount,
            },
        )?;

        delegator_state.raise_bond_lock::<T>(amount)?;

        // only Some if the lowest bottom delegation was kicked
        let net_total_increase = match less_total_staked {
            Some(less) => amount.saturating_sub(less),
            None => amount,
        };
        <Total<T>>::mutate(|total| *total = total.saturating_add(net_total_increase));

        if !auto_compound.is_zero() {
            // a kick above may have rewritten the entries of this candidate
            auto_compounding_state = Self::get_storage(&candidate);
            auto_compounding_state.set_for_delegator(delegator.clone(), auto_compound)?;
            auto_compounding_state.set_storage(&candidate);
        }

        <CandidateInfo<T>>::insert(&candidate, candidate_state);
        <DelegatorState<T>>::insert(&delegator, delegator_state);
        <Pallet<T>>::deposit_event(Event::Delegation {
            delegator,
            locked_amount: amount,
            candidate,
            delegator_position,
            auto_compound,
        });

        Ok(().into())
    }

    /// Sets the auto-compound value of an existing delegation. 0% removes the entry.
    pub(crate) fn set_auto_compound(
        candidate: T::AccountId,
        delegator: T::AccountId,
        value: Percent,
        candidate_auto_compounding_delegation_count_hint: u32,
        delegation_count_hint: u32,
    ) -> DispatchResultWithPostInfo {
        let delegator_state =
            <DelegatorState<T>>::get(&delegator).ok_or(Error::<T>::DelegatorDNE)?;
        ensure!(
            delegator_state.delegations.len() <= delegation_count_hint as usize,
            Error::<T>::TooLowDelegationCountToAutoCompound,
        );
        ensure!(
            delegator_state
                .delegations
                .0
                .iter()
                .any(|b| b.owner == candidate),
            Error::<T>::DelegationDNE,
        );

        let mut auto_compounding_state = Self::get_storage(&candidate);
        ensure!(
            auto_compounding_state.len() <= candidate_auto_compounding_delegation_count_hint,
            Error::<T>::TooLowCandidateAutoCompoundingDelegationCountToAutoCompound,
        );
        let state_updated = if value.is_zero() {
            auto_compounding_state.remove_for_delegator(&delegator)
        } else {
            auto_compounding_state.set_for_delegator(delegator.clone(), value)?
        };
        if state_updated {
            auto_compounding_state.set_storage(&candidate);
        }

        <Pallet<T>>::deposit_event(Event::AutoCompoundSet {
            candidate,
            delegator,
            value,
        });

        Ok(().into())
    }

    /// Removes the entry of a delegation. Storage is only written if the entry existed.
    pub(crate) fn remove_auto_compound(candidate: &T::AccountId, delegator: &T::AccountId) {
        let mut auto_compounding_state = Self::get_storage(candidate);
        if auto_compounding_state.remove_for_delegator(delegator) {
            auto_compounding_state.set_storage(candidate);
        }
    }

    /// Returns the auto-compound value of a delegation, zero if none is stored.
    pub(crate) fn auto_compound(candidate: &T::AccountId, delegator: &T::AccountId) -> Percent {
        Self::get_storage(candidate)
            .get_for_delegator(delegator)
            .unwrap_or_else(Percent::zero)
    }
}
