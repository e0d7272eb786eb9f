// Copyright 2019-2022 PureStake Inc.
// Copyright 2023 Papers AG

//! Delayed revoke and decrease requests of delegators.

use frame_support::{
    dispatch::DispatchResultWithPostInfo,
    ensure,
    pallet_prelude::{DispatchResult, RuntimeDebug},
    traits::Get,
};
use parity_scale_codec::{Decode, DecodeWithMemTracking, Encode};
use scale_info::TypeInfo;
use sp_runtime::{traits::Saturating, DispatchError};
use sp_std::{vec, vec::Vec};

use crate::pallet::{
    BalanceOf, CandidateInfo, Config, DelegationScheduledRequests, DelegatorState, Error, Event,
    Pallet, Round, RoundIndex, Total,
};
use crate::{auto_compound::AutoCompoundDelegations, DelegatorOf, LOG_TARGET};

/// What a scheduled request does to its delegation once executed.
#[derive(
    Clone,
    Copy,
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
pub enum DelegationAction<Balance> {
    Revoke(Balance),
    Decrease(Balance),
}

impl<Balance: Copy> DelegationAction<Balance> {
    /// Amount being revoked or decreased.
    pub fn amount(&self) -> Balance {
        match self {
            DelegationAction::Revoke(amount) => *amount,
            DelegationAction::Decrease(amount) => *amount,
        }
    }
}

/// A pending [DelegationAction] of one delegator, executable from round `when_executable` on.
#[derive(Clone, Eq, PartialEq, Encode, Decode, RuntimeDebug, TypeInfo, PartialOrd, Ord)]
pub struct ScheduledRequest<AccountId, Balance> {
    pub delegator: AccountId,
    pub when_executable: RoundIndex,
    pub action: DelegationAction<Balance>,
}

pub type ScheduledRequestOf<T> =
    ScheduledRequest<<T as frame_system::Config>::AccountId, BalanceOf<T>>;

/// Request data carried by the cancellation event.
#[derive(Clone, Eq, PartialEq, Encode, Decode, DecodeWithMemTracking, RuntimeDebug, TypeInfo)]
pub struct CancelledScheduledRequest<Balance> {
    pub when_executable: RoundIndex,
    pub action: DelegationAction<Balance>,
}

impl<A, B> From<ScheduledRequest<A, B>> for CancelledScheduledRequest<B> {
    fn from(request: ScheduledRequest<A, B>) -> Self {
        CancelledScheduledRequest {
            when_executable: request.when_executable,
            action: request.action,
        }
    }
}

impl<T: Config> Pallet<T> {
    /// Queues the removal of the whole delegation to `collator`.
    pub(crate) fn delegation_schedule_revoke(
        collator: T::AccountId,
        delegator: T::AccountId,
    ) -> DispatchResultWithPostInfo {
        let mut state = <DelegatorState<T>>::get(&delegator).ok_or(<Error<T>>::DelegatorDNE)?;
        let mut scheduled_requests = <DelegationScheduledRequests<T>>::get(&collator);

        ensure!(
            !scheduled_requests
                .iter()
                .any(|req| req.delegator == delegator),
            <Error<T>>::PendingDelegationRequestAlreadyExists,
        );

        let bonded_amount = state
            .get_bond_amount(&collator)
            .ok_or(<Error<T>>::DelegationDNE)?;
        let now = <Round<T>>::get().current;
        let when = now.saturating_add(T::RevokeDelegationDelay::get());
        scheduled_requests.push(ScheduledRequest {
            delegator: delegator.clone(),
            action: DelegationAction::Revoke(bonded_amount),
            when_executable: when,
        });
        state.less_total = state.less_total.saturating_add(bonded_amount);
        <DelegationScheduledRequests<T>>::insert(collator.clone(), scheduled_requests);
        <DelegatorState<T>>::insert(delegator.clone(), state);

        Self::deposit_event(Event::DelegationRevocationScheduled {
            round: now,
            delegator,
            candidate: collator,
            scheduled_exit: when,
        });
        Ok(().into())
    }

    /// Queues a partial unbond of the delegation to `collator`.
    pub(crate) fn delegation_schedule_bond_decrease(
        collator: T::AccountId,
        delegator: T::AccountId,
        decrease_amount: BalanceOf<T>,
    ) -> DispatchResultWithPostInfo {
        let mut state = <DelegatorState<T>>::get(&delegator).ok_or(<Error<T>>::DelegatorDNE)?;
        let mut scheduled_requests = <DelegationScheduledRequests<T>>::get(&collator);

        ensure!(
            !scheduled_requests
                .iter()
                .any(|req| req.delegator == delegator),
            <Error<T>>::PendingDelegationRequestAlreadyExists,
        );

        let bonded_amount = state
            .get_bond_amount(&collator)
            .ok_or(<Error<T>>::DelegationDNE)?;
        ensure!(
            bonded_amount > decrease_amount,
            <Error<T>>::DelegatorBondBelowMin
        );
        let new_amount = bonded_amount.saturating_sub(decrease_amount);
        ensure!(
            new_amount >= T::MinDelegation::get(),
            <Error<T>>::DelegationBelowMin
        );

        // pending requests already count against the minimum
        let max_subtracted_amount = state
            .net_total()
            .saturating_sub(T::MinDelegatorStk::get());
        ensure!(
            decrease_amount <= max_subtracted_amount,
            <Error<T>>::DelegatorBondBelowMin
        );

        let now = <Round<T>>::get().current;
        let when = now.saturating_add(T::RevokeDelegationDelay::get());
        scheduled_requests.push(ScheduledRequest {
            delegator: delegator.clone(),
            action: DelegationAction::Decrease(decrease_amount),
            when_executable: when,
        });
        state.less_total = state.less_total.saturating_add(decrease_amount);
        <DelegationScheduledRequests<T>>::insert(collator.clone(), scheduled_requests);
        <DelegatorState<T>>::insert(delegator.clone(), state);

        Self::deposit_event(Event::DelegationDecreaseScheduled {
            delegator,
            candidate: collator,
            amount_to_decrease: decrease_amount,
            execute_round: when,
        });
        Ok(().into())
    }

    /// Drops the pending request on `collator` and releases its `less_total` share.
    pub(crate) fn delegation_cancel_request(
        collator: T::AccountId,
        delegator: T::AccountId,
    ) -> DispatchResultWithPostInfo {
        let mut state = <DelegatorState<T>>::get(&delegator).ok_or(<Error<T>>::DelegatorDNE)?;
        let mut scheduled_requests = <DelegationScheduledRequests<T>>::get(&collator);

        let request =
            Self::cancel_request_with_state(&delegator, &mut state, &mut scheduled_requests)
                .ok_or(<Error<T>>::PendingDelegationRequestDNE)?;

        Self::put_scheduled_requests(&collator, scheduled_requests);
        <DelegatorState<T>>::insert(delegator.clone(), state);

        Self::deposit_event(Event::CancelledDelegationRequest {
            delegator,
            collator,
            cancelled_request: request.into(),
        });
        Ok(().into())
    }

    fn cancel_request_with_state(
        delegator: &T::AccountId,
        state: &mut DelegatorOf<T>,
        scheduled_requests: &mut Vec<ScheduledRequestOf<T>>,
    ) -> Option<ScheduledRequestOf<T>> {
        let request_idx = scheduled_requests
            .iter()
            .position(|req| &req.delegator == delegator)?;

        let request = scheduled_requests.remove(request_idx);
        let amount = request.action.amount();
        state.less_total = state.less_total.saturating_sub(amount);
        Some(request)
    }

    /// Applies the pending request on `collator` once its round has come.
    pub(crate) fn delegation_execute_scheduled_request(
        collator: T::AccountId,
        delegator: T::AccountId,
    ) -> DispatchResultWithPostInfo {
        let mut scheduled_requests = <DelegationScheduledRequests<T>>::get(&collator);
        let request_idx = scheduled_requests
            .iter()
            .position(|req| req.delegator == delegator)
            .ok_or(<Error<T>>::PendingDelegationRequestDNE)?;
        let request = scheduled_requests.remove(request_idx);

        let now = <Round<T>>::get().current;
        ensure!(
            request.when_executable <= now,
            <Error<T>>::PendingDelegationRequestNotDueYet
        );

        let mut state = <DelegatorState<T>>::get(&delegator).ok_or(<Error<T>>::DelegatorDNE)?;
        // the request is consumed before the delegation changes
        Self::put_scheduled_requests(&collator, scheduled_requests);
        match request.action {
            DelegationAction::Revoke(amount) => {
                Self::revoke_delegator_stake(&mut state, collator, delegator, amount)?;
            }
            DelegationAction::Decrease(amount) => {
                let in_top = Self::decrease_delegator_stake(
                    &mut state,
                    collator.clone(),
                    delegator.clone(),
                    amount,
                )?;
                Self::deposit_event(Event::DelegationDecreased {
                    delegator,
                    candidate: collator,
                    amount,
                    in_top,
                });
            }
        };
        Ok(().into())
    }

    /// Removes a whole delegation. A delegator left without delegations is removed as well.
    pub(crate) fn revoke_delegator_stake(
        state: &mut DelegatorOf<T>,
        collator: T::AccountId,
        delegator: T::AccountId,
        amount: BalanceOf<T>,
    ) -> DispatchResult {
        // last delegation gone, so is the delegator
        let leaving = if state.delegations.len() == 1usize {
            true
        } else {
            ensure!(
                state.total().saturating_sub(T::MinDelegatorStk::get()) >= amount,
                <Error<T>>::DelegatorBondBelowMin
            );
            false
        };

        state.less_total = state.less_total.saturating_sub(amount);
        state
            .rm_delegation::<T>(&collator)
            .ok_or(<Error<T>>::DelegationDNE)?;
        <AutoCompoundDelegations<T>>::remove_auto_compound(&collator, &delegator);
        Self::delegator_leaves_candidate(collator.clone(), delegator.clone(), amount)?;

        Self::deposit_event(Event::DelegationRevoked {
            delegator: delegator.clone(),
            candidate: collator,
            unstaked_amount: amount,
        });
        if leaving {
            <DelegatorState<T>>::remove(&delegator);
            Self::deposit_event(Event::DelegatorLeft {
                delegator,
                unstaked_amount: amount,
            });
        } else {
            <DelegatorState<T>>::insert(&delegator, state);
        }
        Ok(())
    }

    /// Lowers a delegation by `less` and unlocks the difference.
    /// Returns whether the delegation is in the top delegations afterwards.
    pub(crate) fn decrease_delegator_stake(
        state: &mut DelegatorOf<T>,
        collator: T::AccountId,
        delegator: T::AccountId,
        less: BalanceOf<T>,
    ) -> Result<bool, DispatchError> {
        let bond = state
            .get_bond_amount(&collator)
            .ok_or(<Error<T>>::DelegationDNE)?;
        // a full unbond has to go through a revoke
        ensure!(bond > less, <Error<T>>::DelegationBelowMin);
        ensure!(
            bond.saturating_sub(less) >= T::MinDelegation::get(),
            <Error<T>>::DelegationBelowMin
        );

        state.less_total = state.less_total.saturating_sub(less);
        state
            .decrease_delegation(&collator, less)
            .ok_or(<Error<T>>::DelegationDNE)?;
        state.total_sub_if::<T, _>(less, |total| {
            ensure!(
                total >= T::MinDelegatorStk::get(),
                <Error<T>>::DelegatorBondBelowMin
            );
            Ok(())
        })?;

        let mut collator_info =
            <CandidateInfo<T>>::get(&collator).ok_or(<Error<T>>::CandidateDNE)?;
        let in_top =
            collator_info.decrease_delegation::<T>(&collator, delegator.clone(), bond, less)?;
        <CandidateInfo<T>>::insert(&collator, collator_info);
        <Total<T>>::mutate(|total| *total = total.saturating_sub(less));
        <DelegatorState<T>>::insert(delegator, state);
        Ok(in_top)
    }

    /// Queues a revoke on every collator the delegator backs.
    /// Pending revokes keep their earlier `when_executable`, pending decreases are replaced by a
    /// revoke due `LeaveDelegatorsDelay` rounds from now.
    pub(crate) fn delegator_schedule_revoke_all(
        delegator: T::AccountId,
    ) -> DispatchResultWithPostInfo {
        let mut state = <DelegatorState<T>>::get(&delegator).ok_or(<Error<T>>::DelegatorDNE)?;
        let mut updated_scheduled_requests = vec![];
        let now = <Round<T>>::get().current;
        let when = now.saturating_add(T::LeaveDelegatorsDelay::get());

        let mut existing_revoke_count = 0usize;
        for bond in state.delegations.0.clone() {
            let collator = bond.owner;
            let mut scheduled_requests = <DelegationScheduledRequests<T>>::get(&collator);

            let request =
                match Self::cancel_request_with_state(&delegator, &mut state, &mut scheduled_requests)
                {
                    Some(revoke) if matches!(revoke.action, DelegationAction::Revoke(_)) => {
                        existing_revoke_count = existing_revoke_count.saturating_add(1);
                        revoke
                    }
                    _ => ScheduledRequest {
                        delegator: delegator.clone(),
                        action: DelegationAction::Revoke(bond.amount),
                        when_executable: when,
                    },
                };

            scheduled_requests.push(request);
            state.less_total = state.less_total.saturating_add(bond.amount);
            updated_scheduled_requests.push((collator, scheduled_requests));
        }

        ensure!(
            existing_revoke_count < state.delegations.len(),
            <Error<T>>::DelegatorAlreadyLeaving
        );

        for (collator, scheduled_requests) in updated_scheduled_requests {
            Self::put_scheduled_requests(&collator, scheduled_requests);
        }

        <DelegatorState<T>>::insert(delegator.clone(), state);
        Self::deposit_event(Event::DelegatorExitScheduled {
            round: now,
            delegator,
            scheduled_exit: when,
        });
        Ok(().into())
    }

    /// Cancels every [DelegationAction::Revoke] request of a delegator.
    /// Only allowed while the delegator is leaving.
    pub(crate) fn delegator_cancel_scheduled_revoke_all(
        delegator: T::AccountId,
    ) -> DispatchResultWithPostInfo {
        let mut state = <DelegatorState<T>>::get(&delegator).ok_or(<Error<T>>::DelegatorDNE)?;
        ensure!(
            Self::delegator_is_leaving(&delegator, &state),
            <Error<T>>::DelegatorNotLeaving
        );

        for bond in state.delegations.0.clone() {
            let collator = bond.owner;
            let mut scheduled_requests = <DelegationScheduledRequests<T>>::get(&collator);
            Self::cancel_request_with_state(&delegator, &mut state, &mut scheduled_requests);
            Self::put_scheduled_requests(&collator, scheduled_requests);
        }

        <DelegatorState<T>>::insert(delegator.clone(), state);
        Self::deposit_event(Event::DelegatorExitCancelled { delegator });

        Ok(().into())
    }

    /// Executes every [DelegationAction::Revoke] request of a delegator.
    /// Fails unless each delegation has a revoke that is due in the current round.
    pub(crate) fn delegator_execute_scheduled_revoke_all(
        delegator: T::AccountId,
        delegation_count: u32,
    ) -> DispatchResultWithPostInfo {
        let mut state = <DelegatorState<T>>::get(&delegator).ok_or(<Error<T>>::DelegatorDNE)?;
        ensure!(
            delegation_count >= (state.delegations.len() as u32),
            Error::<T>::TooLowDelegationCountToLeaveDelegators
        );
        let now = <Round<T>>::get().current;

        let mut validated_scheduled_requests = vec![];
        // every delegation needs a due revoke before anything is touched
        for bond in &state.delegations.0 {
            let scheduled_requests = <DelegationScheduledRequests<T>>::get(&bond.owner);
            let request_idx = scheduled_requests
                .iter()
                .position(|req| {
                    req.delegator == delegator && matches!(req.action, DelegationAction::Revoke(_))
                })
                .ok_or(<Error<T>>::DelegatorNotLeaving)?;
            ensure!(
                scheduled_requests[request_idx].when_executable <= now,
                <Error<T>>::DelegatorCannotLeaveYet
            );

            validated_scheduled_requests.push((bond.clone(), scheduled_requests, request_idx))
        }

        // the delegator state is not persisted, it is removed as a whole
        for (bond, mut scheduled_requests, request_idx) in validated_scheduled_requests {
            let collator = bond.owner;

            if let Err(error) =
                Self::delegator_leaves_candidate(collator.clone(), delegator.clone(), bond.amount)
            {
                log::error!(
                    target: LOG_TARGET,
                    "delegator {:?} could not leave its collator while exiting: {:?}",
                    delegator,
                    error
                );
            }

            scheduled_requests.remove(request_idx);
            Self::put_scheduled_requests(&collator, scheduled_requests);
            <AutoCompoundDelegations<T>>::remove_auto_compound(&collator, &delegator);
        }

        // dropping the total to zero removes the lock
        let unstaked_amount = state.total();
        state.total_sub::<T>(unstaked_amount);

        <DelegatorState<T>>::remove(&delegator);
        Self::deposit_event(Event::DelegatorLeft {
            delegator,
            unstaked_amount,
        });

        Ok(().into())
    }

    /// Drops a pending request of `delegator` on `collator`, if any.
    /// `state` is only modified here; persisting it is left to the caller.
    pub(crate) fn delegation_remove_request_with_state(
        collator: &T::AccountId,
        delegator: &T::AccountId,
        state: &mut DelegatorOf<T>,
    ) {
        let mut scheduled_requests = <DelegationScheduledRequests<T>>::get(collator);
        if Self::cancel_request_with_state(delegator, state, &mut scheduled_requests).is_some() {
            Self::put_scheduled_requests(collator, scheduled_requests);
        }
    }

    fn put_scheduled_requests(collator: &T::AccountId, scheduled_requests: Vec<ScheduledRequestOf<T>>) {
        if scheduled_requests.is_empty() {
            <DelegationScheduledRequests<T>>::remove(collator);
        } else {
            <DelegationScheduledRequests<T>>::insert(collator, scheduled_requests);
        }
    }

    /// A delegator is leaving when every one of its delegations has a pending revoke.
    pub fn delegator_is_leaving(delegator: &T::AccountId, state: &DelegatorOf<T>) -> bool {
        !state.delegations.is_empty()
            && state
                .delegations
                .0
                .iter()
                .all(|bond| Self::delegation_request_revoke_exists(&bond.owner, delegator))
    }

    /// Whether `delegator` has any pending request on `collator`.
    pub fn delegation_request_exists(collator: &T::AccountId, delegator: &T::AccountId) -> bool {
        <DelegationScheduledRequests<T>>::get(collator)
            .iter()
            .any(|req| &req.delegator == delegator)
    }

    /// Whether `delegator` has a pending revoke on `collator`.
    pub fn delegation_request_revoke_exists(
        collator: &T::AccountId,
        delegator: &T::AccountId,
    ) -> bool {
        <DelegationScheduledRequests<T>>::get(collator)
            .iter()
            .any(|req| {
                &req.delegator == delegator && matches!(req.action, DelegationAction::Revoke(_))
            })
    }
}
