// Copyright 2019-2022 PureStake Inc.
// This file is part of Moonbeam.

// Moonbeam is free software: you can redistribute it and/or modify
// it under the terms of the GNU General Public License as published by
// the Free Software Foundation, either version 3 of the License, or
// (at your option) any later version.

// Moonbeam is distributed in the hope that it will be useful,
// but WITHOUT ANY WARRANTY; without even the implied warranty of
// MERCHANTABILITY or FITNESS FOR A PARTICULAR PURPOSE.  See the
// GNU General Public License for more details.

// You should have received a copy of the GNU General Public License
// along with Moonbeam.  If not, see <http://www.gnu.org/licenses/>.

//! Types for parachain-staking

use frame_support::{
    pallet_prelude::*,
    traits::{tokens, tokens::WithdrawReasons, LockableCurrency},
};
use parity_scale_codec::{Decode, DecodeWithMemTracking, Encode};
use sp_runtime::{
    traits::{AtLeast32BitUnsigned, Saturating, Zero},
    Perbill, Percent, RuntimeDebug,
};
use sp_std::{cmp::Ordering, marker::PhantomData, prelude::*, vec};

use crate::{
    auto_compound::AutoCompoundDelegations, set::OrderedSet, BalanceOf, BottomDelegations,
    Config, DelegatorState, Error, Event, Pallet, Round, RoundIndex, TopDelegations, Total,
    COLLATOR_LOCK_ID, DELEGATOR_LOCK_ID,
};

/// `Get<u32>` that yields the sum of two other `Get<u32>` values.
pub struct AddGet<T, R> {
    _phantom: PhantomData<(T, R)>,
}

impl<T, R> Get<u32> for AddGet<T, R>
where
    T: Get<u32>,
    R: Get<u32>,
{
    fn get() -> u32 {
        T::get().saturating_add(R::get())
    }
}

/// Top delegations of a candidate with pending requests already applied.
pub struct CountedDelegations<T: Config> {
    pub uncounted_stake: BalanceOf<T>,
    pub rewardable_delegations: Vec<Bond<T::AccountId, BalanceOf<T>>>,
}

#[derive(Clone, Encode, Decode, RuntimeDebug, TypeInfo)]
pub struct Bond<AccountId, Balance> {
    pub owner: AccountId,
    pub amount: Balance,
}

impl<A, B: Default> Bond<A, B> {
    pub fn from_owner(owner: A) -> Self {
        Bond {
            owner,
            amount: B::default(),
        }
    }
}

impl<AccountId: Ord, Balance> Eq for Bond<AccountId, Balance> {}

impl<AccountId: Ord, Balance> Ord for Bond<AccountId, Balance> {
    fn cmp(&self, other: &Self) -> Ordering {
        self.owner.cmp(&other.owner)
    }
}

impl<AccountId: Ord, Balance> PartialOrd for Bond<AccountId, Balance> {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl<AccountId: Ord, Balance> PartialEq for Bond<AccountId, Balance> {
    fn eq(&self, other: &Self) -> bool {
        self.owner == other.owner
    }
}

/// Whether a candidate takes part in selection.
#[derive(Copy, Clone, PartialEq, Eq, Encode, Decode, RuntimeDebug, TypeInfo, Default)]
pub enum CollatorStatus {
    /// In the candidate pool
    #[default]
    Active,
    /// Out of the pool but still bonded, see `go_offline`
    Idle,
    /// Exit scheduled, executable from the inner round on
    Leaving(RoundIndex),
}

#[derive(Clone, PartialEq, Eq, Encode, Decode, RuntimeDebug, TypeInfo)]
pub struct BondWithAutoCompound<AccountId, Balance> {
    pub owner: AccountId,
    pub amount: Balance,
    pub auto_compound: Percent,
}

/// Stake of a selected collator, frozen when the round starts and used for its payout.
#[derive(Clone, PartialEq, Eq, Encode, Decode, RuntimeDebug, TypeInfo)]
pub struct CollatorSnapshot<AccountId, Balance> {
    /// Self bond
    pub bond: Balance,
    /// Top delegations as rewarded: a pending revoke counts as zero, a pending decrease is
    /// already subtracted.
    pub delegations: Vec<BondWithAutoCompound<AccountId, Balance>>,
    /// `bond` plus the rewarded delegations
    pub total: Balance,
}

/// Issuance of a past round that is waiting to be paid out block by block.
#[derive(Clone, PartialEq, Eq, Default, Encode, Decode, RuntimeDebug, TypeInfo)]
pub struct DelayedPayout<Balance> {
    pub round_issuance: Balance,
    /// `round_issuance` minus the parachain bond reserve
    pub total_staking_reward: Balance,
    /// Commission at the time payouts were prepared
    pub collator_commission: Perbill,
}

#[derive(PartialEq, Eq, Clone, Copy, Encode, Decode, RuntimeDebug, TypeInfo)]
pub struct CandidateBondLessRequest<Balance> {
    pub amount: Balance,
    pub when_executable: RoundIndex,
}

/// Delegations of one candidate, highest first, along with their sum.
#[derive(Clone, PartialEq, Eq, Encode, Decode, RuntimeDebug, TypeInfo)]
pub struct Delegations<AccountId, Balance> {
    pub delegations: Vec<Bond<AccountId, Balance>>,
    pub total: Balance,
}

pub type DelegationsOf<T> = Delegations<<T as frame_system::Config>::AccountId, BalanceOf<T>>;

impl<AccountId, Balance: Default> Default for Delegations<AccountId, Balance> {
    fn default() -> Delegations<AccountId, Balance> {
        Delegations {
            delegations: Vec::new(),
            total: Balance::default(),
        }
    }
}

impl<AccountId, Balance: tokens::Balance> Delegations<AccountId, Balance> {
    pub fn sort_greatest_to_least(&mut self) {
        self.delegations.sort_by(|a, b| b.amount.cmp(&a.amount));
    }
    /// Inserts `delegation` behind every entry with a greater or equal amount and adds it to
    /// `total`.
    pub fn insert_sorted_greatest_to_least(&mut self, delegation: Bond<AccountId, Balance>) {
        self.total = self.total.saturating_add(delegation.amount);
        // equal to the lowest => goes last
        if let Some(last) = self.delegations.last() {
            if last.amount == delegation.amount {
                self.delegations.push(delegation);
                return;
            }
        }
        match self
            .delegations
            .binary_search_by(|x| delegation.amount.cmp(&x.amount))
        {
            // skip over every existing entry with the same amount
            Ok(i) => {
                let mut new_index = i + 1;
                while new_index < self.delegations.len() {
                    if self.delegations[new_index].amount == delegation.amount {
                        new_index = new_index.saturating_add(1);
                    } else {
                        self.delegations.insert(new_index, delegation);
                        return;
                    }
                }
                self.delegations.push(delegation)
            }
            Err(i) => self.delegations.insert(i, delegation),
        }
    }
    pub fn top_capacity<T: Config>(&self) -> CapacityStatus {
        match &self.delegations {
            x if x.len() as u32 >= T::MaxTopDelegationsPerCandidate::get() => CapacityStatus::Full,
            x if x.is_empty() => CapacityStatus::Empty,
            _ => CapacityStatus::Partial,
        }
    }
    pub fn bottom_capacity<T: Config>(&self) -> CapacityStatus {
        match &self.delegations {
            x if x.len() as u32 >= T::MaxBottomDelegationsPerCandidate::get() => {
                CapacityStatus::Full
            }
            x if x.is_empty() => CapacityStatus::Empty,
            _ => CapacityStatus::Partial,
        }
    }
    /// Zero if empty
    pub fn lowest_delegation_amount(&self) -> Balance {
        self.delegations
            .last()
            .map(|x| x.amount)
            .unwrap_or_else(Zero::zero)
    }
    /// Zero if empty
    pub fn highest_delegation_amount(&self) -> Balance {
        self.delegations
            .first()
            .map(|x| x.amount)
            .unwrap_or_else(Zero::zero)
    }
}

#[derive(Clone, Copy, PartialEq, Eq, Encode, Decode, RuntimeDebug, TypeInfo)]
pub enum CapacityStatus {
    Full,
    Empty,
    Partial,
}

/// Candidate state kept in `CandidateInfo`.
///
/// The delegation lists live in `TopDelegations` and `BottomDelegations`; the fields below
/// cache what the add/remove paths need to decide where a delegation goes.
#[derive(Clone, PartialEq, Eq, Encode, Decode, RuntimeDebug, TypeInfo)]
pub struct CandidateMetadata<Balance> {
    pub bond: Balance,
    /// Top and bottom delegations together
    pub delegation_count: u32,
    /// `bond` plus the top delegations total; the value the pool ranks by
    pub total_counted: Balance,
    pub lowest_top_delegation_amount: Balance,
    pub highest_bottom_delegation_amount: Balance,
    pub lowest_bottom_delegation_amount: Balance,
    pub top_capacity: CapacityStatus,
    pub bottom_capacity: CapacityStatus,
    /// At most one pending self bond decrease
    pub request: Option<CandidateBondLessRequest<Balance>>,
    pub status: CollatorStatus,
}

impl<Balance: tokens::Balance> CandidateMetadata<Balance> {
    pub fn new(bond: Balance) -> Self {
        CandidateMetadata {
            bond,
            delegation_count: 0u32,
            total_counted: bond,
            lowest_top_delegation_amount: Zero::zero(),
            highest_bottom_delegation_amount: Zero::zero(),
            lowest_bottom_delegation_amount: Zero::zero(),
            top_capacity: CapacityStatus::Empty,
            bottom_capacity: CapacityStatus::Empty,
            request: None,
            status: CollatorStatus::Active,
        }
    }
    pub fn is_active(&self) -> bool {
        matches!(self.status, CollatorStatus::Active)
    }
    pub fn is_leaving(&self) -> bool {
        matches!(self.status, CollatorStatus::Leaving(_))
    }
    pub fn schedule_leave<T: Config>(&mut self) -> Result<(RoundIndex, RoundIndex), DispatchError> {
        ensure!(!self.is_leaving(), Error::<T>::CandidateAlreadyLeaving);
        let now = <Round<T>>::get().current;
        let when = now.saturating_add(T::LeaveCandidatesDelay::get());
        self.status = CollatorStatus::Leaving(when);
        Ok((now, when))
    }
    pub fn can_leave<T: Config>(&self) -> DispatchResult {
        if let CollatorStatus::Leaving(when) = self.status {
            ensure!(
                <Round<T>>::get().current >= when,
                Error::<T>::CandidateCannotLeaveYet
            );
            Ok(())
        } else {
            Err(Error::<T>::CandidateNotLeaving.into())
        }
    }
    pub fn go_offline(&mut self) {
        self.status = CollatorStatus::Idle;
    }
    pub fn go_online(&mut self) {
        self.status = CollatorStatus::Active;
    }
    pub fn bond_more<T: Config>(&mut self, who: T::AccountId, more: Balance) -> DispatchResult
    where
        BalanceOf<T>: From<Balance>,
    {
        ensure!(
            <Pallet<T>>::get_collator_stakable_free_balance(&who)? >= BalanceOf::<T>::from(more),
            Error::<T>::InsufficientBalance
        );
        <Total<T>>::mutate(|total| *total = total.saturating_add(more.into()));
        self.bond = self.bond.saturating_add(more);
        T::Currency::set_lock(
            COLLATOR_LOCK_ID,
            &who,
            self.bond.into(),
            WithdrawReasons::all(),
        );
        self.total_counted = self.total_counted.saturating_add(more);
        if self.is_active() {
            Pallet::<T>::update_active(who.clone(), self.total_counted.into());
        }
        <Pallet<T>>::deposit_event(Event::CandidateBondedMore {
            candidate: who,
            amount: more.into(),
            new_total_bond: self.bond.into(),
        });
        Ok(())
    }
    /// Returns the round from which the decrease is executable.
    pub fn schedule_bond_less<T: Config>(
        &mut self,
        less: Balance,
    ) -> Result<RoundIndex, DispatchError>
    where
        BalanceOf<T>: Into<Balance>,
    {
        ensure!(
            self.request.is_none(),
            Error::<T>::PendingCandidateRequestAlreadyExists
        );
        ensure!(self.bond > less, Error::<T>::CandidateBondBelowMin);
        ensure!(
            self.bond.saturating_sub(less) >= T::MinCandidateStk::get().into(),
            Error::<T>::CandidateBondBelowMin
        );
        let when_executable =
            <Round<T>>::get().current.saturating_add(T::CandidateBondLessDelay::get());
        self.request = Some(CandidateBondLessRequest {
            amount: less,
            when_executable,
        });
        Ok(when_executable)
    }
    pub fn execute_bond_less<T: Config>(&mut self, who: T::AccountId) -> DispatchResult
    where
        BalanceOf<T>: From<Balance>,
    {
        let request = self
            .request
            .ok_or(Error::<T>::PendingCandidateRequestsDNE)?;
        ensure!(
            request.when_executable <= <Round<T>>::get().current,
            Error::<T>::PendingCandidateRequestNotDueYet
        );
        <Total<T>>::mutate(|total| *total = total.saturating_sub(request.amount.into()));
        // bond > amount and bond - amount >= MinCandidateStk were enforced on schedule
        self.bond = self.bond.saturating_sub(request.amount);
        T::Currency::set_lock(
            COLLATOR_LOCK_ID,
            &who,
            self.bond.into(),
            WithdrawReasons::all(),
        );
        self.total_counted = self.total_counted.saturating_sub(request.amount);
        self.request = None;
        // the pool entry must follow the self bond
        if self.is_active() {
            Pallet::<T>::update_active(who.clone(), self.total_counted.into());
        }
        Pallet::<T>::deposit_event(Event::CandidateBondedLess {
            candidate: who,
            amount: request.amount.into(),
            new_bond: self.bond.into(),
        });
        Ok(())
    }
    pub fn cancel_bond_less<T: Config>(&mut self, who: T::AccountId) -> DispatchResult
    where
        BalanceOf<T>: From<Balance>,
    {
        let request = self
            .request
            .ok_or(Error::<T>::PendingCandidateRequestsDNE)?;
        self.request = None;
        Pallet::<T>::deposit_event(Event::CancelledCandidateBondLess {
            candidate: who,
            amount: request.amount.into(),
            execute_round: request.when_executable,
        });
        Ok(())
    }
    /// Refreshes the cached top figures and the pool entry.
    pub fn reset_top_data<T: Config>(
        &mut self,
        candidate: T::AccountId,
        top_delegations: &DelegationsOf<T>,
    ) where
        BalanceOf<T>: Into<Balance> + From<Balance>,
    {
        self.lowest_top_delegation_amount = top_delegations.lowest_delegation_amount().into();
        self.top_capacity = top_delegations.top_capacity::<T>();
        let old_total_counted = self.total_counted;
        self.total_counted = self.bond.saturating_add(top_delegations.total.into());
        // the pool value of an active candidate always follows the top delegations total
        if old_total_counted != self.total_counted && self.is_active() {
            Pallet::<T>::update_active(candidate, self.total_counted.into());
        }
    }
    pub fn reset_bottom_data<T: Config>(&mut self, bottom_delegations: &DelegationsOf<T>)
    where
        BalanceOf<T>: Into<Balance>,
    {
        self.lowest_bottom_delegation_amount = bottom_delegations.lowest_delegation_amount().into();
        self.highest_bottom_delegation_amount =
            bottom_delegations.highest_delegation_amount().into();
        self.bottom_capacity = bottom_delegations.bottom_capacity::<T>();
    }
    /// Places a new delegation in the top or bottom list.
    ///
    /// The second value is the amount of a bottom delegation that got kicked to make room, so the
    /// caller can lower `Total`. The delegator must not already delegate to this candidate.
    pub fn add_delegation<T: Config>(
        &mut self,
        candidate: &T::AccountId,
        delegation: Bond<T::AccountId, BalanceOf<T>>,
    ) -> Result<(DelegatorAdded<Balance>, Option<Balance>), DispatchError>
    where
        BalanceOf<T>: Into<Balance> + From<Balance>,
    {
        let mut less_total_staked = None;
        let delegator_added = match self.top_capacity {
            CapacityStatus::Full => {
                if self.lowest_top_delegation_amount < delegation.amount.into() {
                    // the lowest top moves down to the bottom list
                    less_total_staked = self.add_top_delegation::<T>(candidate, delegation)?;
                    DelegatorAdded::AddedToTop {
                        new_total: self.total_counted,
                    }
                } else {
                    if matches!(self.bottom_capacity, CapacityStatus::Full) {
                        ensure!(
                            delegation.amount.into() > self.lowest_bottom_delegation_amount,
                            Error::<T>::CannotDelegateLessThanOrEqualToLowestBottomWhenFull
                        );
                        less_total_staked = Some(self.lowest_bottom_delegation_amount);
                    }
                    self.add_bottom_delegation::<T>(false, candidate, delegation)?;
                    DelegatorAdded::AddedToBottom
                }
            }
            _ => {
                self.add_top_delegation::<T>(candidate, delegation)?;
                DelegatorAdded::AddedToTop {
                    new_total: self.total_counted,
                }
            }
        };
        Ok((delegator_added, less_total_staked))
    }
    /// Inserts into the top list, demoting the lowest top if the list is full.
    /// Returns the amount of a bottom delegation kicked by that demotion.
    pub fn add_top_delegation<T: Config>(
        &mut self,
        candidate: &T::AccountId,
        delegation: Bond<T::AccountId, BalanceOf<T>>,
    ) -> Result<Option<Balance>, DispatchError>
    where
        BalanceOf<T>: Into<Balance> + From<Balance>,
    {
        let mut less_total_staked = None;
        let mut top_delegations =
            <TopDelegations<T>>::get(candidate).ok_or(Error::<T>::CandidateDNE)?;
        let max_top_delegations_per_candidate = T::MaxTopDelegationsPerCandidate::get();
        if top_delegations.delegations.len() as u32 == max_top_delegations_per_candidate {
            if let Some(new_bottom_delegation) = top_delegations.delegations.pop() {
                top_delegations.total = top_delegations
                    .total
                    .saturating_sub(new_bottom_delegation.amount);
                if matches!(self.bottom_capacity, CapacityStatus::Full) {
                    less_total_staked = Some(self.lowest_bottom_delegation_amount);
                }
                self.add_bottom_delegation::<T>(true, candidate, new_bottom_delegation)?;
            }
        }
        top_delegations.insert_sorted_greatest_to_least(delegation);
        self.reset_top_data::<T>(candidate.clone(), &top_delegations);
        if less_total_staked.is_none() {
            // a kick keeps the count unchanged
            self.delegation_count = self.delegation_count.saturating_add(1u32);
        }
        <TopDelegations<T>>::insert(candidate, top_delegations);
        Ok(less_total_staked)
    }
    /// Inserts into the bottom list. A full list loses its lowest entry, which the caller must
    /// have checked to be below `delegation`.
    pub fn add_bottom_delegation<T: Config>(
        &mut self,
        bumped_from_top: bool,
        candidate: &T::AccountId,
        delegation: Bond<T::AccountId, BalanceOf<T>>,
    ) -> DispatchResult
    where
        BalanceOf<T>: Into<Balance> + From<Balance>,
    {
        let mut bottom_delegations =
            <BottomDelegations<T>>::get(candidate).ok_or(Error::<T>::CandidateDNE)?;
        let kicked = if bottom_delegations.delegations.len() as u32
            == T::MaxBottomDelegationsPerCandidate::get()
        {
            bottom_delegations.delegations.pop()
        } else {
            None
        };
        let increase_delegation_count = match kicked {
            Some(lowest_bottom_to_be_kicked) => {
                // an equal amount is still kicked to enforce first come first served
                bottom_delegations.total = bottom_delegations
                    .total
                    .saturating_sub(lowest_bottom_to_be_kicked.amount);
                Self::kick_delegation::<T>(candidate, lowest_bottom_to_be_kicked)?;
                false
            }
            None => !bumped_from_top,
        };
        if increase_delegation_count {
            self.delegation_count = self.delegation_count.saturating_add(1u32);
        }
        bottom_delegations.insert_sorted_greatest_to_least(delegation);
        self.reset_bottom_data::<T>(&bottom_delegations);
        <BottomDelegations<T>>::insert(candidate, bottom_delegations);
        Ok(())
    }
    /// Removes a kicked bottom delegation from its delegator, together with the pending request
    /// and auto-compound config it had towards `candidate`, and unlocks its stake.
    /// Total staked is updated by the caller via the propagated lowest bottom amount.
    fn kick_delegation<T: Config>(
        candidate: &T::AccountId,
        kicked: Bond<T::AccountId, BalanceOf<T>>,
    ) -> DispatchResult {
        let mut delegator_state =
            <DelegatorState<T>>::get(&kicked.owner).ok_or(Error::<T>::DelegatorDNE)?;
        let leaving = delegator_state.delegations.len() == 1usize;
        delegator_state.rm_delegation::<T>(candidate);
        <Pallet<T>>::delegation_remove_request_with_state(
            candidate,
            &kicked.owner,
            &mut delegator_state,
        );
        <AutoCompoundDelegations<T>>::remove_auto_compound(candidate, &kicked.owner);

        Pallet::<T>::deposit_event(Event::DelegationKicked {
            delegator: kicked.owner.clone(),
            candidate: candidate.clone(),
            unstaked_amount: kicked.amount,
        });
        if leaving {
            <DelegatorState<T>>::remove(&kicked.owner);
            Pallet::<T>::deposit_event(Event::DelegatorLeft {
                delegator: kicked.owner,
                unstaked_amount: kicked.amount,
            });
        } else {
            <DelegatorState<T>>::insert(&kicked.owner, delegator_state);
        }
        Ok(())
    }
    /// Removes a delegation from whichever list holds it.
    /// Returns whether `total_counted` changed.
    pub fn rm_delegation_if_exists<T: Config>(
        &mut self,
        candidate: &T::AccountId,
        delegator: T::AccountId,
        amount: Balance,
    ) -> Result<bool, DispatchError>
    where
        BalanceOf<T>: Into<Balance> + From<Balance>,
    {
        let amount_geq_lowest_top = amount >= self.lowest_top_delegation_amount;
        let top_is_not_full = !matches!(self.top_capacity, CapacityStatus::Full);
        let lowest_top_eq_highest_bottom =
            self.lowest_top_delegation_amount == self.highest_bottom_delegation_amount;
        let delegation_dne_err: DispatchError = Error::<T>::DelegationDNE.into();
        if top_is_not_full || (amount_geq_lowest_top && !lowest_top_eq_highest_bottom) {
            self.rm_top_delegation::<T>(candidate, delegator)
        } else if amount_geq_lowest_top && lowest_top_eq_highest_bottom {
            let result = self.rm_top_delegation::<T>(candidate, delegator.clone());
            if result == Err(delegation_dne_err) {
                // worst case removal
                self.rm_bottom_delegation::<T>(candidate, delegator)
            } else {
                result
            }
        } else {
            self.rm_bottom_delegation::<T>(candidate, delegator)
        }
    }
    /// The highest bottom delegation, if any, is promoted into the freed slot.
    pub fn rm_top_delegation<T: Config>(
        &mut self,
        candidate: &T::AccountId,
        delegator: T::AccountId,
    ) -> Result<bool, DispatchError>
    where
        BalanceOf<T>: Into<Balance> + From<Balance>,
    {
        let old_total_counted = self.total_counted;
        let mut top_delegations =
            <TopDelegations<T>>::get(candidate).ok_or(Error::<T>::CandidateDNE)?;
        let position = top_delegations
            .delegations
            .iter()
            .position(|d| d.owner == delegator)
            .ok_or(Error::<T>::DelegationDNE)?;
        let removed = top_delegations.delegations.remove(position);
        top_delegations.total = top_delegations.total.saturating_sub(removed.amount);
        if !matches!(self.bottom_capacity, CapacityStatus::Empty) {
            let mut bottom_delegations =
                <BottomDelegations<T>>::get(candidate).ok_or(Error::<T>::CandidateDNE)?;
            // stored greatest to least by bond amount
            if !bottom_delegations.delegations.is_empty() {
                let highest_bottom_delegation = bottom_delegations.delegations.remove(0);
                bottom_delegations.total = bottom_delegations
                    .total
                    .saturating_sub(highest_bottom_delegation.amount);
                top_delegations.insert_sorted_greatest_to_least(highest_bottom_delegation);
            }
            self.reset_bottom_data::<T>(&bottom_delegations);
            <BottomDelegations<T>>::insert(candidate, bottom_delegations);
        }
        self.reset_top_data::<T>(candidate.clone(), &top_delegations);
        self.delegation_count = self.delegation_count.saturating_sub(1u32);
        <TopDelegations<T>>::insert(candidate, top_delegations);
        Ok(old_total_counted != self.total_counted)
    }
    pub fn rm_bottom_delegation<T: Config>(
        &mut self,
        candidate: &T::AccountId,
        delegator: T::AccountId,
    ) -> Result<bool, DispatchError>
    where
        BalanceOf<T>: Into<Balance>,
    {
        let mut bottom_delegations =
            <BottomDelegations<T>>::get(candidate).ok_or(Error::<T>::CandidateDNE)?;
        let position = bottom_delegations
            .delegations
            .iter()
            .position(|d| d.owner == delegator)
            .ok_or(Error::<T>::DelegationDNE)?;
        let removed = bottom_delegations.delegations.remove(position);
        bottom_delegations.total = bottom_delegations.total.saturating_sub(removed.amount);
        self.reset_bottom_data::<T>(&bottom_delegations);
        self.delegation_count = self.delegation_count.saturating_sub(1u32);
        <BottomDelegations<T>>::insert(candidate, bottom_delegations);
        Ok(false)
    }
    /// Returns whether the delegation ends up in the top list.
    pub fn increase_delegation<T: Config>(
        &mut self,
        candidate: &T::AccountId,
        delegator: T::AccountId,
        bond: BalanceOf<T>,
        more: BalanceOf<T>,
    ) -> Result<bool, DispatchError>
    where
        BalanceOf<T>: Into<Balance> + From<Balance>,
    {
        let lowest_top_eq_highest_bottom =
            self.lowest_top_delegation_amount == self.highest_bottom_delegation_amount;
        let bond_geq_lowest_top = bond.into() >= self.lowest_top_delegation_amount;
        let delegation_dne_err: DispatchError = Error::<T>::DelegationDNE.into();
        if bond_geq_lowest_top && !lowest_top_eq_highest_bottom {
            // definitely in top
            self.increase_top_delegation::<T>(candidate, delegator, more)
        } else if bond_geq_lowest_top && lowest_top_eq_highest_bottom {
            // could be in bottom because lowest top == highest bottom
            let result = self.increase_top_delegation::<T>(candidate, delegator.clone(), more);
            if result == Err(delegation_dne_err) {
                self.increase_bottom_delegation::<T>(candidate, delegator, bond, more)
            } else {
                result
            }
        } else {
            self.increase_bottom_delegation::<T>(candidate, delegator, bond, more)
        }
    }
    pub fn increase_top_delegation<T: Config>(
        &mut self,
        candidate: &T::AccountId,
        delegator: T::AccountId,
        more: BalanceOf<T>,
    ) -> Result<bool, DispatchError>
    where
        BalanceOf<T>: Into<Balance> + From<Balance>,
    {
        let mut top_delegations =
            <TopDelegations<T>>::get(candidate).ok_or(Error::<T>::CandidateDNE)?;
        let delegation = top_delegations
            .delegations
            .iter_mut()
            .find(|d| d.owner == delegator)
            .ok_or(Error::<T>::DelegationDNE)?;
        delegation.amount = delegation.amount.saturating_add(more);
        top_delegations.total = top_delegations.total.saturating_add(more);
        top_delegations.sort_greatest_to_least();
        self.reset_top_data::<T>(candidate.clone(), &top_delegations);
        <TopDelegations<T>>::insert(candidate, top_delegations);
        Ok(true)
    }
    pub fn increase_bottom_delegation<T: Config>(
        &mut self,
        candidate: &T::AccountId,
        delegator: T::AccountId,
        bond: BalanceOf<T>,
        more: BalanceOf<T>,
    ) -> Result<bool, DispatchError>
    where
        BalanceOf<T>: Into<Balance> + From<Balance>,
    {
        let mut bottom_delegations =
            <BottomDelegations<T>>::get(candidate).ok_or(Error::<T>::CandidateDNE)?;
        let in_top_after =
            if bond.saturating_add(more).into() > self.lowest_top_delegation_amount {
                // promoted
                let position = bottom_delegations
                    .delegations
                    .iter()
                    .position(|d| d.owner == delegator)
                    .ok_or(Error::<T>::DelegationDNE)?;
                let mut delegation = bottom_delegations.delegations.remove(position);
                delegation.amount = delegation.amount.saturating_add(more);
                bottom_delegations.total = bottom_delegations.total.saturating_sub(bond);
                let mut top_delegations =
                    <TopDelegations<T>>::get(candidate).ok_or(Error::<T>::CandidateDNE)?;
                if matches!(top_delegations.top_capacity::<T>(), CapacityStatus::Full) {
                    if let Some(new_bottom_delegation) = top_delegations.delegations.pop() {
                        top_delegations.total = top_delegations
                            .total
                            .saturating_sub(new_bottom_delegation.amount);
                        bottom_delegations.insert_sorted_greatest_to_least(new_bottom_delegation);
                    }
                }
                top_delegations.insert_sorted_greatest_to_least(delegation);
                self.reset_top_data::<T>(candidate.clone(), &top_delegations);
                <TopDelegations<T>>::insert(candidate, top_delegations);
                true
            } else {
                let delegation = bottom_delegations
                    .delegations
                    .iter_mut()
                    .find(|d| d.owner == delegator)
                    .ok_or(Error::<T>::DelegationDNE)?;
                delegation.amount = delegation.amount.saturating_add(more);
                bottom_delegations.total = bottom_delegations.total.saturating_add(more);
                bottom_delegations.sort_greatest_to_least();
                false
            };
        self.reset_bottom_data::<T>(&bottom_delegations);
        <BottomDelegations<T>>::insert(candidate, bottom_delegations);
        Ok(in_top_after)
    }
    /// Returns whether the delegation stays in the top list.
    pub fn decrease_delegation<T: Config>(
        &mut self,
        candidate: &T::AccountId,
        delegator: T::AccountId,
        bond: Balance,
        less: BalanceOf<T>,
    ) -> Result<bool, DispatchError>
    where
        BalanceOf<T>: Into<Balance> + From<Balance>,
    {
        let lowest_top_eq_highest_bottom =
            self.lowest_top_delegation_amount == self.highest_bottom_delegation_amount;
        let bond_geq_lowest_top = bond >= self.lowest_top_delegation_amount;
        let delegation_dne_err: DispatchError = Error::<T>::DelegationDNE.into();
        if bond_geq_lowest_top && !lowest_top_eq_highest_bottom {
            // definitely in top
            self.decrease_top_delegation::<T>(candidate, delegator, bond.into(), less)
        } else if bond_geq_lowest_top && lowest_top_eq_highest_bottom {
            // could be in bottom because lowest top == highest bottom
            let result =
                self.decrease_top_delegation::<T>(candidate, delegator.clone(), bond.into(), less);
            if result == Err(delegation_dne_err) {
                self.decrease_bottom_delegation::<T>(candidate, delegator, less)
            } else {
                result
            }
        } else {
            self.decrease_bottom_delegation::<T>(candidate, delegator, less)
        }
    }
    pub fn decrease_top_delegation<T: Config>(
        &mut self,
        candidate: &T::AccountId,
        delegator: T::AccountId,
        bond: BalanceOf<T>,
        less: BalanceOf<T>,
    ) -> Result<bool, DispatchError>
    where
        BalanceOf<T>: Into<Balance> + From<Balance>,
    {
        let bond_after_less_than_highest_bottom =
            bond.saturating_sub(less).into() < self.highest_bottom_delegation_amount;
        let full_top_and_nonempty_bottom = matches!(self.top_capacity, CapacityStatus::Full)
            && !matches!(self.bottom_capacity, CapacityStatus::Empty);
        let mut top_delegations =
            <TopDelegations<T>>::get(candidate).ok_or(Error::<T>::CandidateDNE)?;
        let in_top_after = if bond_after_less_than_highest_bottom && full_top_and_nonempty_bottom {
            let position = top_delegations
                .delegations
                .iter()
                .position(|d| d.owner == delegator)
                .ok_or(Error::<T>::DelegationDNE)?;
            let mut delegation = top_delegations.delegations.remove(position);
            top_delegations.total = top_delegations.total.saturating_sub(delegation.amount);
            delegation.amount = delegation.amount.saturating_sub(less);
            let mut bottom_delegations =
                <BottomDelegations<T>>::get(candidate).ok_or(Error::<T>::CandidateDNE)?;
            // swap the highest bottom into top and the decreased delegation into bottom
            if !bottom_delegations.delegations.is_empty() {
                let highest_bottom_delegation = bottom_delegations.delegations.remove(0);
                bottom_delegations.total = bottom_delegations
                    .total
                    .saturating_sub(highest_bottom_delegation.amount);
                top_delegations.insert_sorted_greatest_to_least(highest_bottom_delegation);
            }
            bottom_delegations.insert_sorted_greatest_to_least(delegation);
            self.reset_bottom_data::<T>(&bottom_delegations);
            <BottomDelegations<T>>::insert(candidate, bottom_delegations);
            false
        } else {
            let delegation = top_delegations
                .delegations
                .iter_mut()
                .find(|d| d.owner == delegator)
                .ok_or(Error::<T>::DelegationDNE)?;
            delegation.amount = delegation.amount.saturating_sub(less);
            top_delegations.total = top_delegations.total.saturating_sub(less);
            top_delegations.sort_greatest_to_least();
            true
        };
        self.reset_top_data::<T>(candidate.clone(), &top_delegations);
        <TopDelegations<T>>::insert(candidate, top_delegations);
        Ok(in_top_after)
    }
    pub fn decrease_bottom_delegation<T: Config>(
        &mut self,
        candidate: &T::AccountId,
        delegator: T::AccountId,
        less: BalanceOf<T>,
    ) -> Result<bool, DispatchError>
    where
        BalanceOf<T>: Into<Balance>,
    {
        let mut bottom_delegations =
            <BottomDelegations<T>>::get(candidate).ok_or(Error::<T>::CandidateDNE)?;
        let delegation = bottom_delegations
            .delegations
            .iter_mut()
            .find(|d| d.owner == delegator)
            .ok_or(Error::<T>::DelegationDNE)?;
        delegation.amount = delegation.amount.saturating_sub(less);
        bottom_delegations.total = bottom_delegations.total.saturating_sub(less);
        bottom_delegations.sort_greatest_to_least();
        self.reset_bottom_data::<T>(&bottom_delegations);
        <BottomDelegations<T>>::insert(candidate, bottom_delegations);
        Ok(false)
    }
}

/// Where a new delegation landed. Top placements carry the candidate's new counted total.
#[derive(
    Clone, Copy, PartialEq, Eq, Encode, Decode, DecodeWithMemTracking, RuntimeDebug, TypeInfo,
)]
pub enum DelegatorAdded<Balance> {
    AddedToTop { new_total: Balance },
    AddedToBottom,
}

#[derive(Clone, PartialEq, Eq, Encode, Decode, RuntimeDebug, TypeInfo)]
pub struct Delegator<AccountId, Balance> {
    pub id: AccountId,
    /// Bonds keyed by candidate
    pub delegations: OrderedSet<Bond<AccountId, Balance>>,
    /// Sum of all bonds, equal to the `DELEGATOR_LOCK_ID` lock
    pub total: Balance,
    /// Amount that pending revoke and decrease requests will release
    pub less_total: Balance,
}

pub type DelegatorOf<T> = Delegator<<T as frame_system::Config>::AccountId, BalanceOf<T>>;

impl<AccountId: Ord + Clone, Balance: tokens::Balance> Delegator<AccountId, Balance> {
    pub fn new(id: AccountId, collator: AccountId, amount: Balance) -> Self {
        Delegator {
            id,
            delegations: OrderedSet::from(vec![Bond {
                owner: collator,
                amount,
            }]),
            total: amount,
            less_total: Zero::zero(),
        }
    }

    pub fn total(&self) -> Balance {
        self.total
    }

    /// Total after every pending request of this delegator is executed
    pub fn net_total(&self) -> Balance {
        self.total.saturating_sub(self.less_total)
    }

    pub fn total_sub_if<T, F>(&mut self, amount: Balance, check: F) -> DispatchResult
    where
        T: Config,
        T::AccountId: From<AccountId>,
        BalanceOf<T>: From<Balance>,
        F: Fn(Balance) -> DispatchResult,
    {
        let total = self.total.saturating_sub(amount);
        check(total)?;
        self.total = total;
        self.update_lock::<T>();
        Ok(())
    }

    pub fn total_add<T>(&mut self, amount: Balance) -> DispatchResult
    where
        T: Config,
        T::AccountId: From<AccountId>,
        BalanceOf<T>: From<Balance>,
    {
        self.total = self.total.saturating_add(amount);
        self.raise_bond_lock::<T>(amount)
    }

    pub fn total_sub<T>(&mut self, amount: Balance)
    where
        T: Config,
        T::AccountId: From<AccountId>,
        BalanceOf<T>: From<Balance>,
    {
        self.total = self.total.saturating_sub(amount);
        self.update_lock::<T>();
    }

    pub fn add_delegation(&mut self, bond: Bond<AccountId, Balance>) -> bool {
        let amount = bond.amount;
        if self.delegations.insert(bond) {
            self.total = self.total.saturating_add(amount);
            true
        } else {
            false
        }
    }

    /// Returns Some(remaining total) if the delegation existed, None otherwise.
    /// The lock is lowered accordingly.
    pub fn rm_delegation<T: Config>(&mut self, collator: &AccountId) -> Option<Balance>
    where
        BalanceOf<T>: From<Balance>,
        T::AccountId: From<AccountId>,
    {
        let position = self.delegations.0.iter().position(|x| &x.owner == collator)?;
        let removed = self.delegations.0.remove(position);
        self.total_sub::<T>(removed.amount);
        Some(self.total)
    }

    /// Increases the bond towards `candidate` and raises the lock.
    /// Returns the bond amount before the increase.
    pub fn increase_delegation<T: Config>(
        &mut self,
        candidate: &AccountId,
        more: Balance,
    ) -> Result<Balance, DispatchError>
    where
        BalanceOf<T>: From<Balance>,
        T::AccountId: From<AccountId>,
    {
        let bond = self
            .delegations
            .0
            .iter_mut()
            .find(|x| &x.owner == candidate)
            .ok_or(Error::<T>::DelegationDNE)?;
        let before = bond.amount;
        bond.amount = bond.amount.saturating_add(more);
        self.total_add::<T>(more)?;
        Ok(before)
    }

    /// Decreases the bond towards `candidate` without touching the lock.
    /// Returns the bond amount before the decrease.
    pub fn decrease_delegation(&mut self, candidate: &AccountId, less: Balance) -> Option<Balance> {
        let bond = self
            .delegations
            .0
            .iter_mut()
            .find(|x| &x.owner == candidate)?;
        let before = bond.amount;
        bond.amount = bond.amount.saturating_sub(less);
        Some(before)
    }

    /// Sets the lock to `total` after `increase` was added to it.
    ///
    /// Lock amounts cannot be read back, so the free balance is checked against the increase
    /// alone: whatever is already locked is subtracted by `get_delegator_stakable_balance`.
    pub fn raise_bond_lock<T: Config>(&mut self, increase: Balance) -> DispatchResult
    where
        BalanceOf<T>: From<Balance>,
        T::AccountId: From<AccountId>,
    {
        ensure!(
            <Pallet<T>>::get_delegator_stakable_balance(&self.id.clone().into())
                >= BalanceOf::<T>::from(increase),
            Error::<T>::InsufficientBalance,
        );
        self.update_lock::<T>();
        Ok(())
    }

    fn update_lock<T: Config>(&self)
    where
        BalanceOf<T>: From<Balance>,
        T::AccountId: From<AccountId>,
    {
        let who: T::AccountId = self.id.clone().into();
        if self.total.is_zero() {
            T::Currency::remove_lock(DELEGATOR_LOCK_ID, &who);
        } else {
            T::Currency::set_lock(
                DELEGATOR_LOCK_ID,
                &who,
                self.total.into(),
                WithdrawReasons::all(),
            );
        }
    }

    pub fn get_bond_amount(&self, collator: &AccountId) -> Option<Balance> {
        self.delegations
            .0
            .iter()
            .find(|b| &b.owner == collator)
            .map(|b| b.amount)
    }
}

#[derive(Copy, Clone, PartialEq, Eq, Encode, Decode, RuntimeDebug, TypeInfo)]
pub struct RoundInfo<BlockNumber> {
    pub current: RoundIndex,
    /// Block the current round started at
    pub first: BlockNumber,
    /// Blocks per round
    pub length: u32,
}
impl<B: AtLeast32BitUnsigned + Copy> RoundInfo<B> {
    pub fn new(current: RoundIndex, first: B, length: u32) -> RoundInfo<B> {
        RoundInfo {
            current,
            first,
            length,
        }
    }
    /// True once `length` blocks have passed since `first`.
    pub fn should_update(&self, now: B) -> bool {
        now.saturating_sub(self.first) >= self.length.into()
    }
    pub fn update(&mut self, now: B) {
        self.current = self.current.saturating_add(1);
        self.first = now;
    }
}
impl<B: AtLeast32BitUnsigned + Copy> Default for RoundInfo<B> {
    fn default() -> RoundInfo<B> {
        RoundInfo::new(1, 1u32.into(), 20u32)
    }
}

/// Share of every round's issuance minted to a reserve account before stakers are paid.
#[derive(Clone, PartialEq, Eq, Encode, Decode, RuntimeDebug, TypeInfo)]
pub struct ParachainBondConfig<AccountId> {
    /// Nothing is reserved while unset
    pub account: Option<AccountId>,
    pub percent: Percent,
}

impl<AccountId> Default for ParachainBondConfig<AccountId> {
    fn default() -> Self {
        ParachainBondConfig {
            account: None,
            percent: Percent::from_percent(0),
        }
    }
}

/// Outcome of paying out one collator of a past round
#[derive(Clone, Copy, PartialEq, Eq, RuntimeDebug)]
pub enum RewardPayment {
    /// A collator and its delegators were paid
    Paid,
    /// A collator without points was skipped
    Skipped,
    /// All collators of the round are paid
    Finished,
}
