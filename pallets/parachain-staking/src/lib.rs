// Copyright 2019-2022 PureStake Inc.
// Copyright 2023 Papers AG

//! # Parachain Staking
//!
//! Minimal staking pallet that implements collator selection by total backed stake.
//! The main difference between this pallet and `frame/pallet-staking` is that this pallet
//! uses direct delegation. Delegators choose exactly who they delegate and with what stake.
//! This is different from `frame/pallet-staking` where delegators approval vote and run Phragmen.
//!
//! ### Rules
//! There is a new round every `<Round<T>>::get().length` blocks.
//!
//! At the start of every round,
//! * issuance is calculated for collators (and their delegators) for block authoring
//! `T::RewardPaymentDelay` rounds ago
//! * a new set of collators is chosen from the candidates
//!
//! Immediately following a round change, payments are made once-per-block until all payments have
//! been made. In each such block, one collator is chosen for a rewards payment and is paid along
//! with each of its top `T::MaxTopDelegationsPerCandidate` delegators.
//!
//! To join the set of candidates, call `join_candidates` with `bond >= MinCandidateStk`.
//! To leave the set of candidates, call `schedule_leave_candidates`. If the call succeeds,
//! the collator is removed from the pool of candidates so they cannot be selected for future
//! collator sets, but they are not unbonded until their exit request is executed. Any signed
//! account may trigger the exit `T::LeaveCandidatesDelay` rounds after the round in which the
//! original request was made.
//!
//! To join the set of delegators, call `delegate` and pass in an account that is
//! already a collator candidate and `bond >= MinDelegatorStk`. Each delegator can delegate up to
//! `T::MaxDelegationsPerDelegator` collator candidates by calling `delegate`.
//!
//! To revoke a delegation, call `schedule_revoke_delegation` with the collator candidate's account.
//! To leave the set of delegators and revoke all delegations, call `schedule_leave_delegators`.

#![cfg_attr(not(feature = "std"), no_std)]

mod auto_compound;
mod delegation_requests;
pub mod hooks;
pub mod inflation;
pub mod set;
pub mod traits;
pub mod types;
pub mod weights;

#[cfg(test)]
mod mock;

pub use auto_compound::{AutoCompoundConfig, AutoCompoundDelegations};
pub use delegation_requests::{CancelledScheduledRequest, DelegationAction, ScheduledRequest};
pub use hooks::*;
pub use inflation::{InflationInfo, InflationInfoWithoutRound, Range};
pub use pallet::*;
pub use traits::*;
pub use types::*;
pub use weights::WeightInfo;

pub(crate) const LOG_TARGET: &str = "runtime::parachain-staking";

#[frame_support::pallet]
pub mod pallet {
    use frame_support::{
        pallet_prelude::*,
        storage::with_storage_layer,
        traits::{
            tokens::WithdrawReasons, BuildGenesisConfig, Currency, Get, Imbalance,
            LockIdentifier, LockableCurrency,
        },
    };
    use frame_system::pallet_prelude::*;
    use sp_runtime::{
        traits::{Saturating, Zero},
        PerThing, Perbill, Percent,
    };
    use sp_std::{collections::btree_map::BTreeMap, prelude::*, vec};

    use crate::{
        auto_compound::{
            AutoCompoundConfig, AutoCompoundDelegations, MaxAutoCompoundingDelegations,
        },
        delegation_requests::{CancelledScheduledRequest, DelegationAction, ScheduledRequest},
        hooks::StakingHooks,
        inflation::{round_issuance, InflationInfo, InflationInfoWithoutRound},
        set::OrderedSet,
        traits::OnNewRound,
        types::*,
        WeightInfo, LOG_TARGET,
    };

    /// The current storage version.
    pub(crate) const STORAGE_VERSION: StorageVersion = StorageVersion::new(1);

    #[pallet::pallet]
    #[pallet::storage_version(STORAGE_VERSION)]
    #[pallet::without_storage_info]
    pub struct Pallet<T>(PhantomData<T>);

    pub type RoundIndex = u64;
    type RewardPoint = u32;
    pub type BalanceOf<T> =
        <<T as Config>::Currency as Currency<<T as frame_system::Config>::AccountId>>::Balance;

    pub const COLLATOR_LOCK_ID: LockIdentifier = *b"stkngcol";
    pub const DELEGATOR_LOCK_ID: LockIdentifier = *b"stkngdel";

    /// Points awarded to a collator for every authored block.
    const POINTS_PER_BLOCK: RewardPoint = 20;

    /// Configuration trait of this pallet.
    #[pallet::config]
    pub trait Config: frame_system::Config {
        /// Overarching event type
        type RuntimeEvent: From<Event<Self>> + IsType<<Self as frame_system::Config>::RuntimeEvent>;
        /// The currency type
        type Currency: Currency<Self::AccountId> + LockableCurrency<Self::AccountId>;
        /// The origin for monetary governance
        type MonetaryGovernanceOrigin: EnsureOrigin<Self::RuntimeOrigin>;
        /// Minimum number of blocks per round
        #[pallet::constant]
        type MinBlocksPerRound: Get<u32>;
        /// Number of rounds that candidates remain bonded before exit request is executable
        #[pallet::constant]
        type LeaveCandidatesDelay: Get<RoundIndex>;
        /// Number of rounds candidate requests to decrease self-bond must wait to be executable
        #[pallet::constant]
        type CandidateBondLessDelay: Get<RoundIndex>;
        /// Number of rounds that delegators remain bonded before exit request is executable
        #[pallet::constant]
        type LeaveDelegatorsDelay: Get<RoundIndex>;
        /// Number of rounds that delegations remain bonded before revocation request is executable
        #[pallet::constant]
        type RevokeDelegationDelay: Get<RoundIndex>;
        /// Number of rounds after which block authors are rewarded
        #[pallet::constant]
        type RewardPaymentDelay: Get<RoundIndex>;
        /// Minimum number of selected candidates every round
        #[pallet::constant]
        type MinSelectedCandidates: Get<u32>;
        /// Maximum number of candidates in the pool
        #[pallet::constant]
        type MaxCandidates: Get<u32>;
        /// Maximum top delegations counted per candidate
        #[pallet::constant]
        type MaxTopDelegationsPerCandidate: Get<u32>;
        /// Maximum bottom delegations (not counted) per candidate
        #[pallet::constant]
        type MaxBottomDelegationsPerCandidate: Get<u32>;
        /// Maximum delegations per delegator
        #[pallet::constant]
        type MaxDelegationsPerDelegator: Get<u32>;
        /// Minimum stake required for any account to be a collator candidate
        #[pallet::constant]
        type MinCandidateStk: Get<BalanceOf<Self>>;
        /// Minimum stake for any registered on-chain account to delegate
        #[pallet::constant]
        type MinDelegation: Get<BalanceOf<Self>>;
        /// Minimum stake for any registered on-chain account to be a delegator
        #[pallet::constant]
        type MinDelegatorStk: Get<BalanceOf<Self>>;
        /// Hooks into stakable balances and collator payouts
        type StakingHooks: StakingHooks<Self>;
        /// Handler notified at the start of every round
        type OnNewRound: OnNewRound;
        /// Weight information for extrinsics in this pallet.
        type WeightInfo: WeightInfo;
    }

    #[pallet::error]
    pub enum Error<T> {
        DelegatorDNE,
        CandidateDNE,
        DelegationDNE,
        DelegatorExists,
        CandidateExists,
        CandidateBondBelowMin,
        InsufficientBalance,
        DelegatorBondBelowMin,
        DelegationBelowMin,
        AlreadyOffline,
        AlreadyActive,
        DelegatorAlreadyLeaving,
        DelegatorNotLeaving,
        DelegatorCannotLeaveYet,
        CandidateAlreadyLeaving,
        CandidateNotLeaving,
        CandidateCannotLeaveYet,
        CannotGoOnlineIfLeaving,
        ExceedMaxDelegationsPerDelegator,
        AlreadyDelegatedCandidate,
        InvalidSchedule,
        CannotSetBelowMin,
        CannotSetAboveMaxCandidates,
        RoundLengthMustBeGreaterThanTotalSelectedCollators,
        NoWritingSameValue,
        CandidateLimitReached,
        TooLowCandidateCountWeightHintCancelLeaveCandidates,
        TooLowCandidateCountToLeaveCandidates,
        TooLowCandidateDelegationCountToDelegate,
        TooLowCandidateAutoCompoundingDelegationCountToDelegate,
        TooLowCandidateAutoCompoundingDelegationCountToAutoCompound,
        TooLowCandidateDelegationCountToLeaveCandidates,
        TooLowDelegationCountToDelegate,
        TooLowDelegationCountToAutoCompound,
        TooLowDelegationCountToLeaveDelegators,
        PendingCandidateRequestsDNE,
        PendingCandidateRequestAlreadyExists,
        PendingCandidateRequestNotDueYet,
        PendingDelegationRequestDNE,
        PendingDelegationRequestAlreadyExists,
        PendingDelegationRequestNotDueYet,
        PendingDelegationRevoke,
        CannotDelegateLessThanOrEqualToLowestBottomWhenFull,
    }

    #[pallet::event]
    #[pallet::generate_deposit(pub(super) fn deposit_event)]
    pub enum Event<T: Config> {
        /// Started new round.
        NewRound {
            starting_block: BlockNumberFor<T>,
            round: RoundIndex,
            selected_collators_number: u32,
            total_balance: BalanceOf<T>,
        },
        /// Account joined the set of collator candidates.
        JoinedCollatorCandidates {
            account: T::AccountId,
            amount_locked: BalanceOf<T>,
            new_total_amt_locked: BalanceOf<T>,
        },
        /// Candidate selected for collators. Total Exposed Amount includes all delegations.
        CollatorChosen {
            round: RoundIndex,
            collator_account: T::AccountId,
            total_exposed_amount: BalanceOf<T>,
        },
        /// Candidate requested to decrease a self bond.
        CandidateBondLessRequested {
            candidate: T::AccountId,
            amount_to_decrease: BalanceOf<T>,
            execute_round: RoundIndex,
        },
        /// Candidate has increased a self bond.
        CandidateBondedMore {
            candidate: T::AccountId,
            amount: BalanceOf<T>,
            new_total_bond: BalanceOf<T>,
        },
        /// Candidate has decreased a self bond.
        CandidateBondedLess {
            candidate: T::AccountId,
            amount: BalanceOf<T>,
            new_bond: BalanceOf<T>,
        },
        /// Candidate temporarily leave the set of collator candidates without unbonding.
        CandidateWentOffline { candidate: T::AccountId },
        /// Candidate rejoins the set of collator candidates.
        CandidateBackOnline { candidate: T::AccountId },
        /// Candidate has requested to leave the set of candidates.
        CandidateScheduledExit {
            exit_allowed_round: RoundIndex,
            candidate: T::AccountId,
            scheduled_exit: RoundIndex,
        },
        /// Cancelled request to leave the set of candidates.
        CancelledCandidateExit { candidate: T::AccountId },
        /// Cancelled request to decrease candidate's bond.
        CancelledCandidateBondLess {
            candidate: T::AccountId,
            amount: BalanceOf<T>,
            execute_round: RoundIndex,
        },
        /// Candidate has left the set of candidates.
        CandidateLeft {
            ex_candidate: T::AccountId,
            unlocked_amount: BalanceOf<T>,
            new_total_amt_locked: BalanceOf<T>,
        },
        /// Delegator requested to decrease a bond for the collator candidate.
        DelegationDecreaseScheduled {
            delegator: T::AccountId,
            candidate: T::AccountId,
            amount_to_decrease: BalanceOf<T>,
            execute_round: RoundIndex,
        },
        DelegationIncreased {
            delegator: T::AccountId,
            candidate: T::AccountId,
            amount: BalanceOf<T>,
            in_top: bool,
        },
        DelegationDecreased {
            delegator: T::AccountId,
            candidate: T::AccountId,
            amount: BalanceOf<T>,
            in_top: bool,
        },
        /// Delegator requested to leave the set of delegators.
        DelegatorExitScheduled {
            round: RoundIndex,
            delegator: T::AccountId,
            scheduled_exit: RoundIndex,
        },
        /// Delegator requested to revoke delegation.
        DelegationRevocationScheduled {
            round: RoundIndex,
            delegator: T::AccountId,
            candidate: T::AccountId,
            scheduled_exit: RoundIndex,
        },
        /// Delegator has left the set of delegators.
        DelegatorLeft {
            delegator: T::AccountId,
            unstaked_amount: BalanceOf<T>,
        },
        /// Delegation revoked.
        DelegationRevoked {
            delegator: T::AccountId,
            candidate: T::AccountId,
            unstaked_amount: BalanceOf<T>,
        },
        /// Delegation kicked.
        DelegationKicked {
            delegator: T::AccountId,
            candidate: T::AccountId,
            unstaked_amount: BalanceOf<T>,
        },
        /// Cancelled a pending request to exit the set of delegators.
        DelegatorExitCancelled { delegator: T::AccountId },
        /// Cancelled request to change an existing delegation.
        CancelledDelegationRequest {
            delegator: T::AccountId,
            cancelled_request: CancelledScheduledRequest<BalanceOf<T>>,
            collator: T::AccountId,
        },
        /// New delegation (increase of the existing one).
        Delegation {
            delegator: T::AccountId,
            locked_amount: BalanceOf<T>,
            candidate: T::AccountId,
            delegator_position: DelegatorAdded<BalanceOf<T>>,
            auto_compound: Percent,
        },
        /// Delegation from candidate state has been remove.
        DelegatorLeftCandidate {
            delegator: T::AccountId,
            candidate: T::AccountId,
            unstaked_amount: BalanceOf<T>,
            total_candidate_staked: BalanceOf<T>,
        },
        /// Paid the account (delegator or collator) the balance as liquid rewards.
        Rewarded {
            account: T::AccountId,
            rewards: BalanceOf<T>,
        },
        /// Transferred to account which holds funds reserved for parachain bond.
        ReservedForParachainBond {
            account: T::AccountId,
            value: BalanceOf<T>,
        },
        /// Account (re)set for parachain bond treasury.
        ParachainBondAccountSet {
            old: Option<T::AccountId>,
            new: T::AccountId,
        },
        /// Percent of inflation reserved for parachain bond (re)set.
        ParachainBondReservePercentSet { old: Percent, new: Percent },
        /// Annual inflation input (first 3) was used to derive new per-round inflation (last 3)
        InflationSet {
            annual_min: Perbill,
            annual_ideal: Perbill,
            round_min: Perbill,
            round_ideal: Perbill,
            ideal_staked: Perbill,
            decay_rate: Perbill,
        },
        /// Set total selected candidates to this value.
        TotalSelectedSet { old: u32, new: u32 },
        /// Set collator commission to this value.
        CollatorCommissionSet { old: Perbill, new: Perbill },
        /// Set blocks per round
        BlocksPerRoundSet {
            current_round: RoundIndex,
            first_block: BlockNumberFor<T>,
            old: u32,
            new: u32,
            new_per_round_inflation_min: Perbill,
            new_per_round_inflation_ideal: Perbill,
        },
        /// Auto-compounding reward percent was set for a delegation.
        AutoCompoundSet {
            candidate: T::AccountId,
            delegator: T::AccountId,
            value: Percent,
        },
        /// Compounded a portion of rewards towards the delegation.
        Compounded {
            candidate: T::AccountId,
            delegator: T::AccountId,
            amount: BalanceOf<T>,
        },
    }

    #[pallet::hooks]
    impl<T: Config> Hooks<BlockNumberFor<T>> for Pallet<T> {
        fn on_initialize(n: BlockNumberFor<T>) -> Weight {
            let mut weight = <T as Config>::WeightInfo::base_on_initialize();

            let mut round = <Round<T>>::get();
            if round.should_update(n) {
                round.update(n);
                weight = weight.saturating_add(T::OnNewRound::on_new_round(round.current));
                weight = weight.saturating_add(Self::prepare_staking_payouts(round.current));

                let (extra_weight, collator_count, _delegation_count, total_staked) =
                    Self::select_top_candidates(round.current);
                weight = weight.saturating_add(extra_weight);

                <Round<T>>::put(round);
                <Staked<T>>::insert(round.current, <Total<T>>::get());
                weight = weight.saturating_add(T::DbWeight::get().reads_writes(1, 2));

                log::info!(
                    target: LOG_TARGET,
                    "round {} started at block {:?} with {} collators",
                    round.current,
                    n,
                    collator_count,
                );
                Self::deposit_event(Event::NewRound {
                    starting_block: round.first,
                    round: round.current,
                    selected_collators_number: collator_count,
                    total_balance: total_staked,
                });
            } else {
                weight = weight.saturating_add(Self::handle_delayed_payouts(round.current));
            }

            weight
        }
    }

    /// Commission percent taken off of rewards for all collators
    #[pallet::storage]
    pub type CollatorCommission<T: Config> = StorageValue<_, Perbill, ValueQuery>;

    /// The total candidates selected every round
    #[pallet::storage]
    pub type TotalSelected<T: Config> = StorageValue<_, u32, ValueQuery>;

    /// Parachain bond config info { account, percent_of_inflation }
    #[pallet::storage]
    pub type ParachainBondInfo<T: Config> =
        StorageValue<_, ParachainBondConfig<T::AccountId>, ValueQuery>;

    /// Current round index and next round scheduled transition
    #[pallet::storage]
    pub type Round<T: Config> = StorageValue<_, RoundInfo<BlockNumberFor<T>>, ValueQuery>;

    /// Get delegator state associated with an account if account is delegating else None
    #[pallet::storage]
    pub type DelegatorState<T: Config> = StorageMap<
        _,
        Twox64Concat,
        T::AccountId,
        Delegator<T::AccountId, BalanceOf<T>>,
        OptionQuery,
    >;

    /// Get collator candidate info associated with an account if account is candidate else None
    #[pallet::storage]
    pub type CandidateInfo<T: Config> =
        StorageMap<_, Twox64Concat, T::AccountId, CandidateMetadata<BalanceOf<T>>, OptionQuery>;

    /// Stores outstanding delegation requests per collator.
    #[pallet::storage]
    pub type DelegationScheduledRequests<T: Config> = StorageMap<
        _,
        Blake2_128Concat,
        T::AccountId,
        Vec<ScheduledRequest<T::AccountId, BalanceOf<T>>>,
        ValueQuery,
    >;

    /// Stores auto-compounding configuration per collator.
    #[pallet::storage]
    pub type AutoCompoundingDelegations<T: Config> = StorageMap<
        _,
        Blake2_128Concat,
        T::AccountId,
        BoundedVec<AutoCompoundConfig<T::AccountId>, MaxAutoCompoundingDelegations<T>>,
        ValueQuery,
    >;

    /// Top delegations for collator candidate
    #[pallet::storage]
    pub type TopDelegations<T: Config> = StorageMap<
        _,
        Twox64Concat,
        T::AccountId,
        Delegations<T::AccountId, BalanceOf<T>>,
        OptionQuery,
    >;

    /// Bottom delegations for collator candidate
    #[pallet::storage]
    pub type BottomDelegations<T: Config> = StorageMap<
        _,
        Twox64Concat,
        T::AccountId,
        Delegations<T::AccountId, BalanceOf<T>>,
        OptionQuery,
    >;

    /// The collator candidates selected for the current round, sorted by account
    #[pallet::storage]
    pub type SelectedCandidates<T: Config> = StorageValue<_, Vec<T::AccountId>, ValueQuery>;

    /// Total capital locked by this staking pallet
    #[pallet::storage]
    pub type Total<T: Config> = StorageValue<_, BalanceOf<T>, ValueQuery>;

    /// The pool of collator candidates, each with their total backing stake
    #[pallet::storage]
    pub type CandidatePool<T: Config> =
        StorageValue<_, OrderedSet<Bond<T::AccountId, BalanceOf<T>>>, ValueQuery>;

    /// Snapshot of collator delegation stake at the start of the round
    #[pallet::storage]
    pub type AtStake<T: Config> = StorageDoubleMap<
        _,
        Twox64Concat,
        RoundIndex,
        Twox64Concat,
        T::AccountId,
        CollatorSnapshot<T::AccountId, BalanceOf<T>>,
        OptionQuery,
    >;

    /// Delayed payouts
    #[pallet::storage]
    pub type DelayedPayouts<T: Config> =
        StorageMap<_, Twox64Concat, RoundIndex, DelayedPayout<BalanceOf<T>>, OptionQuery>;

    /// Total counted stake for selected candidates in the round
    #[pallet::storage]
    pub type Staked<T: Config> = StorageMap<_, Twox64Concat, RoundIndex, BalanceOf<T>, ValueQuery>;

    /// Inflation configuration
    #[pallet::storage]
    pub type InflationConfig<T: Config> = StorageValue<_, InflationInfo, ValueQuery>;

    /// Total points awarded to collators for block production in the round
    #[pallet::storage]
    pub type Points<T: Config> = StorageMap<_, Twox64Concat, RoundIndex, RewardPoint, ValueQuery>;

    /// Points for each collator per round
    #[pallet::storage]
    pub type AwardedPts<T: Config> = StorageDoubleMap<
        _,
        Twox64Concat,
        RoundIndex,
        Twox64Concat,
        T::AccountId,
        RewardPoint,
        ValueQuery,
    >;

    #[pallet::genesis_config]
    pub struct GenesisConfig<T: Config> {
        /// Initialize balance and register all as collators: `(collator AccountId, balance Amount)`
        pub candidates: Vec<(T::AccountId, BalanceOf<T>)>,
        /// Initialize balance and make delegations:
        /// `(delegator AccountId, collator AccountId, delegation Amount, auto-compounding Percent)`
        pub delegations: Vec<(T::AccountId, T::AccountId, BalanceOf<T>, Percent)>,
        /// Inflation configuration
        pub inflation_config: InflationInfo,
        /// Default fixed percent a collator takes off the top of due rewards
        pub collator_commission: Perbill,
        /// Default percent of inflation set aside for parachain bond every round
        pub parachain_bond_reserve_percent: Percent,
        /// Default number of blocks in a round
        pub blocks_per_round: u32,
        /// Number of selected candidates every round. Cannot be lower than MinSelectedCandidates
        pub num_selected_candidates: u32,
    }

    impl<T: Config> Default for GenesisConfig<T> {
        fn default() -> Self {
            Self {
                candidates: vec![],
                delegations: vec![],
                inflation_config: Default::default(),
                collator_commission: Perbill::from_percent(20),
                parachain_bond_reserve_percent: Percent::from_percent(30),
                blocks_per_round: 600u32,
                num_selected_candidates: T::MinSelectedCandidates::get(),
            }
        }
    }

    #[pallet::genesis_build]
    impl<T: Config> BuildGenesisConfig for GenesisConfig<T> {
        fn build(&self) {
            if self.blocks_per_round < T::MinBlocksPerRound::get() {
                log::error!(
                    target: LOG_TARGET,
                    "genesis blocks per round {} is below the minimum {}",
                    self.blocks_per_round,
                    T::MinBlocksPerRound::get(),
                );
            }
            <InflationConfig<T>>::put(self.inflation_config.clone());

            let mut candidate_count = 0u32;
            for &(ref candidate, balance) in &self.candidates {
                if let Err(error) = <Pallet<T>>::join_candidates(
                    frame_system::RawOrigin::Signed(candidate.clone()).into(),
                    balance,
                    candidate_count,
                ) {
                    log::error!(
                        target: LOG_TARGET,
                        "join candidates failed in genesis for {:?}: {:?}",
                        candidate,
                        error,
                    );
                } else {
                    candidate_count = candidate_count.saturating_add(1u32);
                }
            }

            let mut col_delegator_count: BTreeMap<T::AccountId, u32> = BTreeMap::new();
            let mut col_auto_compound_delegator_count: BTreeMap<T::AccountId, u32> =
                BTreeMap::new();
            let mut del_delegation_count: BTreeMap<T::AccountId, u32> = BTreeMap::new();
            for &(ref delegator, ref target, balance, auto_compound) in &self.delegations {
                let cd_count = col_delegator_count.get(target).copied().unwrap_or_default();
                let dd_count = del_delegation_count.get(delegator).copied().unwrap_or_default();
                let cd_auto_compound_count = col_auto_compound_delegator_count
                    .get(target)
                    .copied()
                    .unwrap_or_default();
                if let Err(error) = <Pallet<T>>::delegate_with_auto_compound(
                    frame_system::RawOrigin::Signed(delegator.clone()).into(),
                    target.clone(),
                    balance,
                    auto_compound,
                    cd_count,
                    cd_auto_compound_count,
                    dd_count,
                ) {
                    log::error!(
                        target: LOG_TARGET,
                        "delegate failed in genesis for {:?} towards {:?}: {:?}",
                        delegator,
                        target,
                        error,
                    );
                } else {
                    *col_delegator_count.entry(target.clone()).or_default() += 1;
                    *del_delegation_count.entry(delegator.clone()).or_default() += 1;
                    if auto_compound != Percent::from_percent(0) {
                        *col_auto_compound_delegator_count
                            .entry(target.clone())
                            .or_default() += 1;
                    }
                }
            }

            <CollatorCommission<T>>::put(self.collator_commission);
            <ParachainBondInfo<T>>::put(ParachainBondConfig {
                account: None,
                percent: self.parachain_bond_reserve_percent,
            });
            if self.num_selected_candidates < T::MinSelectedCandidates::get() {
                log::error!(
                    target: LOG_TARGET,
                    "genesis selected candidates {} is below the minimum {}",
                    self.num_selected_candidates,
                    T::MinSelectedCandidates::get(),
                );
            }
            <TotalSelected<T>>::put(self.num_selected_candidates);

            <Pallet<T>>::start_first_round(Zero::zero(), self.blocks_per_round);
        }
    }

    #[pallet::call]
    impl<T: Config> Pallet<T> {
        /// Set the annual inflation rate to derive per-round inflation
        #[pallet::call_index(0)]
        #[pallet::weight(<T as Config>::WeightInfo::set_inflation())]
        pub fn set_inflation(
            origin: OriginFor<T>,
            schedule: InflationInfoWithoutRound,
        ) -> DispatchResultWithPostInfo {
            T::MonetaryGovernanceOrigin::ensure_origin(origin)?;
            ensure!(schedule.annual.is_valid(), Error::<T>::InvalidSchedule);
            let config = <InflationConfig<T>>::get();
            ensure!(
                InflationInfoWithoutRound::from(config) != schedule,
                Error::<T>::NoWritingSameValue
            );
            let config = InflationInfo::new::<T>(schedule);
            Self::deposit_event(Event::InflationSet {
                annual_min: config.annual.min,
                annual_ideal: config.annual.ideal,
                round_min: config.round.min,
                round_ideal: config.round.ideal,
                ideal_staked: config.ideal_staked,
                decay_rate: config.decay_rate,
            });
            <InflationConfig<T>>::put(config);
            Ok(().into())
        }

        /// Set the account that will hold funds set aside for parachain bond
        #[pallet::call_index(1)]
        #[pallet::weight(<T as Config>::WeightInfo::set_parachain_bond_account())]
        pub fn set_parachain_bond_account(
            origin: OriginFor<T>,
            new: T::AccountId,
        ) -> DispatchResultWithPostInfo {
            T::MonetaryGovernanceOrigin::ensure_origin(origin)?;
            let ParachainBondConfig {
                account: old,
                percent,
            } = <ParachainBondInfo<T>>::get();
            ensure!(old.as_ref() != Some(&new), Error::<T>::NoWritingSameValue);
            <ParachainBondInfo<T>>::put(ParachainBondConfig {
                account: Some(new.clone()),
                percent,
            });
            Self::deposit_event(Event::ParachainBondAccountSet { old, new });
            Ok(().into())
        }

        /// Set the percent of inflation set aside for parachain bond
        #[pallet::call_index(2)]
        #[pallet::weight(<T as Config>::WeightInfo::set_parachain_bond_reserve_percent())]
        pub fn set_parachain_bond_reserve_percent(
            origin: OriginFor<T>,
            new: Percent,
        ) -> DispatchResultWithPostInfo {
            T::MonetaryGovernanceOrigin::ensure_origin(origin)?;
            let ParachainBondConfig {
                account,
                percent: old,
            } = <ParachainBondInfo<T>>::get();
            ensure!(old != new, Error::<T>::NoWritingSameValue);
            <ParachainBondInfo<T>>::put(ParachainBondConfig {
                account,
                percent: new,
            });
            Self::deposit_event(Event::ParachainBondReservePercentSet { old, new });
            Ok(().into())
        }

        /// Set the total number of collator candidates selected per round
        /// - changes are not applied until the start of the next round
        #[pallet::call_index(3)]
        #[pallet::weight(<T as Config>::WeightInfo::set_total_selected())]
        pub fn set_total_selected(origin: OriginFor<T>, new: u32) -> DispatchResultWithPostInfo {
            T::MonetaryGovernanceOrigin::ensure_origin(origin)?;
            ensure!(
                new >= T::MinSelectedCandidates::get(),
                Error::<T>::CannotSetBelowMin
            );
            ensure!(
                new <= T::MaxCandidates::get(),
                Error::<T>::CannotSetAboveMaxCandidates
            );
            let old = <TotalSelected<T>>::get();
            ensure!(old != new, Error::<T>::NoWritingSameValue);
            ensure!(
                new < <Round<T>>::get().length,
                Error::<T>::RoundLengthMustBeGreaterThanTotalSelectedCollators,
            );
            <TotalSelected<T>>::put(new);
            Self::deposit_event(Event::TotalSelectedSet { old, new });
            Ok(().into())
        }

        /// Set the commission for all collators
        #[pallet::call_index(4)]
        #[pallet::weight(<T as Config>::WeightInfo::set_collator_commission())]
        pub fn set_collator_commission(
            origin: OriginFor<T>,
            new: Perbill,
        ) -> DispatchResultWithPostInfo {
            T::MonetaryGovernanceOrigin::ensure_origin(origin)?;
            let old = <CollatorCommission<T>>::get();
            ensure!(old != new, Error::<T>::NoWritingSameValue);
            <CollatorCommission<T>>::put(new);
            Self::deposit_event(Event::CollatorCommissionSet { old, new });
            Ok(().into())
        }

        /// Set blocks per round
        /// - if called with `new` less than length of current round, will transition immediately
        /// in the next block
        /// - also updates per-round inflation config
        #[pallet::call_index(5)]
        #[pallet::weight(<T as Config>::WeightInfo::set_blocks_per_round())]
        pub fn set_blocks_per_round(origin: OriginFor<T>, new: u32) -> DispatchResultWithPostInfo {
            T::MonetaryGovernanceOrigin::ensure_origin(origin)?;
            ensure!(
                new >= T::MinBlocksPerRound::get(),
                Error::<T>::CannotSetBelowMin
            );
            let mut round = <Round<T>>::get();
            let (now, first, old) = (round.current, round.first, round.length);
            ensure!(old != new, Error::<T>::NoWritingSameValue);
            ensure!(
                new > <TotalSelected<T>>::get(),
                Error::<T>::RoundLengthMustBeGreaterThanTotalSelectedCollators,
            );
            round.length = new;
            // update per-round inflation given new rounds per year
            let mut inflation_config = <InflationConfig<T>>::get();
            inflation_config.reset_round(new);
            <Round<T>>::put(round);
            Self::deposit_event(Event::BlocksPerRoundSet {
                current_round: now,
                first_block: first,
                old,
                new,
                new_per_round_inflation_min: inflation_config.round.min,
                new_per_round_inflation_ideal: inflation_config.round.ideal,
            });
            <InflationConfig<T>>::put(inflation_config);
            Ok(().into())
        }

        /// Join the set of collator candidates
        #[pallet::call_index(6)]
        #[pallet::weight(<T as Config>::WeightInfo::join_candidates(*candidate_count))]
        pub fn join_candidates(
            origin: OriginFor<T>,
            bond: BalanceOf<T>,
            candidate_count: u32,
        ) -> DispatchResultWithPostInfo {
            let acc = ensure_signed(origin)?;
            ensure!(!Self::is_candidate(&acc), Error::<T>::CandidateExists);
            ensure!(!Self::is_delegator(&acc), Error::<T>::DelegatorExists);
            ensure!(
                bond >= T::MinCandidateStk::get(),
                Error::<T>::CandidateBondBelowMin
            );
            let mut candidates = <CandidatePool<T>>::get();
            ensure!(
                (candidates.len() as u32) < T::MaxCandidates::get(),
                Error::<T>::CandidateLimitReached
            );
            ensure!(
                candidates.insert(Bond {
                    owner: acc.clone(),
                    amount: bond
                }),
                Error::<T>::CandidateExists
            );
            ensure!(
                Self::get_collator_stakable_free_balance(&acc)? >= bond,
                Error::<T>::InsufficientBalance,
            );
            T::Currency::set_lock(COLLATOR_LOCK_ID, &acc, bond, WithdrawReasons::all());
            let candidate = CandidateMetadata::new(bond);
            <CandidateInfo<T>>::insert(&acc, candidate);
            let empty_delegations: Delegations<T::AccountId, BalanceOf<T>> = Default::default();
            // insert empty top delegations
            <TopDelegations<T>>::insert(&acc, empty_delegations.clone());
            // insert empty bottom delegations
            <BottomDelegations<T>>::insert(&acc, empty_delegations);
            <CandidatePool<T>>::put(candidates);
            let new_total = <Total<T>>::get().saturating_add(bond);
            <Total<T>>::put(new_total);
            Self::deposit_event(Event::JoinedCollatorCandidates {
                account: acc,
                amount_locked: bond,
                new_total_amt_locked: new_total,
            });
            Ok(().into())
        }

        /// Request to leave the set of candidates. If successful, the account is immediately
        /// removed from the candidate pool to prevent selection as a collator.
        #[pallet::call_index(7)]
        #[pallet::weight(<T as Config>::WeightInfo::schedule_leave_candidates(*candidate_count))]
        pub fn schedule_leave_candidates(
            origin: OriginFor<T>,
            candidate_count: u32,
        ) -> DispatchResultWithPostInfo {
            let collator = ensure_signed(origin)?;
            let mut state = <CandidateInfo<T>>::get(&collator).ok_or(Error::<T>::CandidateDNE)?;
            let (now, when) = state.schedule_leave::<T>()?;
            let mut candidates = <CandidatePool<T>>::get();
            ensure!(
                candidate_count >= candidates.len() as u32,
                Error::<T>::TooLowCandidateCountToLeaveCandidates
            );
            if candidates.remove(&Bond::from_owner(collator.clone())) {
                <CandidatePool<T>>::put(candidates);
            }
            <SelectedCandidates<T>>::mutate(|selected| selected.retain(|c| c != &collator));
            <CandidateInfo<T>>::insert(&collator, state);
            Self::deposit_event(Event::CandidateScheduledExit {
                exit_allowed_round: now,
                candidate: collator,
                scheduled_exit: when,
            });
            Ok(().into())
        }

        /// Execute leave candidates request
        #[pallet::call_index(8)]
        #[pallet::weight(
            <T as Config>::WeightInfo::execute_leave_candidates(*candidate_delegation_count)
        )]
        pub fn execute_leave_candidates(
            origin: OriginFor<T>,
            candidate: T::AccountId,
            candidate_delegation_count: u32,
        ) -> DispatchResultWithPostInfo {
            ensure_signed(origin)?;
            let state = <CandidateInfo<T>>::get(&candidate).ok_or(Error::<T>::CandidateDNE)?;
            ensure!(
                state.delegation_count <= candidate_delegation_count,
                Error::<T>::TooLowCandidateDelegationCountToLeaveCandidates
            );
            state.can_leave::<T>()?;

            let return_stake = |bond: Bond<T::AccountId, BalanceOf<T>>| -> DispatchResult {
                let mut delegator =
                    <DelegatorState<T>>::get(&bond.owner).ok_or(Error::<T>::DelegatorDNE)?;
                // remove delegation from delegator state, this also lowers the lock
                delegator
                    .rm_delegation::<T>(&candidate)
                    .ok_or(Error::<T>::DelegationDNE)?;
                // remove any pending request of this delegation
                Self::delegation_remove_request_with_state(&candidate, &bond.owner, &mut delegator);
                <AutoCompoundDelegations<T>>::remove_auto_compound(&candidate, &bond.owner);

                if delegator.delegations.is_empty() {
                    <DelegatorState<T>>::remove(&bond.owner);
                    Self::deposit_event(Event::DelegatorLeft {
                        delegator: bond.owner,
                        unstaked_amount: bond.amount,
                    });
                } else {
                    <DelegatorState<T>>::insert(&bond.owner, delegator);
                }
                Ok(())
            };

            let mut total_backing = state.bond;
            // return all top delegations
            let top_delegations =
                <TopDelegations<T>>::take(&candidate).ok_or(Error::<T>::CandidateDNE)?;
            for bond in top_delegations.delegations {
                return_stake(bond)?;
            }
            total_backing = total_backing.saturating_add(top_delegations.total);
            // return all bottom delegations
            let bottom_delegations =
                <BottomDelegations<T>>::take(&candidate).ok_or(Error::<T>::CandidateDNE)?;
            for bond in bottom_delegations.delegations {
                return_stake(bond)?;
            }
            total_backing = total_backing.saturating_add(bottom_delegations.total);

            // return stake to collator
            T::Currency::remove_lock(COLLATOR_LOCK_ID, &candidate);
            <CandidateInfo<T>>::remove(&candidate);
            <DelegationScheduledRequests<T>>::remove(&candidate);
            <AutoCompoundingDelegations<T>>::remove(&candidate);
            let new_total_staked = <Total<T>>::get().saturating_sub(total_backing);
            <Total<T>>::put(new_total_staked);
            Self::deposit_event(Event::CandidateLeft {
                ex_candidate: candidate,
                unlocked_amount: total_backing,
                new_total_amt_locked: new_total_staked,
            });
            Ok(().into())
        }

        /// Cancel open request to leave candidates
        /// - only callable by collator account
        /// - result upon successful call is the candidate is active in the candidate pool
        #[pallet::call_index(9)]
        #[pallet::weight(<T as Config>::WeightInfo::cancel_leave_candidates(*candidate_count))]
        pub fn cancel_leave_candidates(
            origin: OriginFor<T>,
            candidate_count: u32,
        ) -> DispatchResultWithPostInfo {
            let collator = ensure_signed(origin)?;
            let mut state = <CandidateInfo<T>>::get(&collator).ok_or(Error::<T>::CandidateDNE)?;
            ensure!(state.is_leaving(), Error::<T>::CandidateNotLeaving);
            state.go_online();
            let mut candidates = <CandidatePool<T>>::get();
            ensure!(
                candidates.len() as u32 <= candidate_count,
                Error::<T>::TooLowCandidateCountWeightHintCancelLeaveCandidates
            );
            ensure!(
                candidates.insert(Bond {
                    owner: collator.clone(),
                    amount: state.total_counted
                }),
                Error::<T>::AlreadyActive
            );
            <CandidatePool<T>>::put(candidates);
            <CandidateInfo<T>>::insert(&collator, state);
            Self::deposit_event(Event::CancelledCandidateExit {
                candidate: collator,
            });
            Ok(().into())
        }

        /// Temporarily leave the set of collator candidates without unbonding
        #[pallet::call_index(10)]
        #[pallet::weight(<T as Config>::WeightInfo::go_offline())]
        pub fn go_offline(origin: OriginFor<T>) -> DispatchResultWithPostInfo {
            let collator = ensure_signed(origin)?;
            let mut state = <CandidateInfo<T>>::get(&collator).ok_or(Error::<T>::CandidateDNE)?;
            ensure!(state.is_active(), Error::<T>::AlreadyOffline);
            state.go_offline();
            let mut candidates = <CandidatePool<T>>::get();
            if candidates.remove(&Bond::from_owner(collator.clone())) {
                <CandidatePool<T>>::put(candidates);
            }
            <CandidateInfo<T>>::insert(&collator, state);
            Self::deposit_event(Event::CandidateWentOffline {
                candidate: collator,
            });
            Ok(().into())
        }

        /// Rejoin the set of collator candidates if previously had called `go_offline`
        #[pallet::call_index(11)]
        #[pallet::weight(<T as Config>::WeightInfo::go_online())]
        pub fn go_online(origin: OriginFor<T>) -> DispatchResultWithPostInfo {
            let collator = ensure_signed(origin)?;
            let mut state = <CandidateInfo<T>>::get(&collator).ok_or(Error::<T>::CandidateDNE)?;
            ensure!(!state.is_active(), Error::<T>::AlreadyActive);
            ensure!(!state.is_leaving(), Error::<T>::CannotGoOnlineIfLeaving);
            state.go_online();
            let mut candidates = <CandidatePool<T>>::get();
            ensure!(
                candidates.insert(Bond {
                    owner: collator.clone(),
                    amount: state.total_counted
                }),
                Error::<T>::AlreadyActive
            );
            <CandidatePool<T>>::put(candidates);
            <CandidateInfo<T>>::insert(&collator, state);
            Self::deposit_event(Event::CandidateBackOnline {
                candidate: collator,
            });
            Ok(().into())
        }

        /// Increase collator candidate self bond by `more`
        #[pallet::call_index(12)]
        #[pallet::weight(<T as Config>::WeightInfo::candidate_bond_more())]
        pub fn candidate_bond_more(
            origin: OriginFor<T>,
            more: BalanceOf<T>,
        ) -> DispatchResultWithPostInfo {
            let candidate = ensure_signed(origin)?;
            let mut state = <CandidateInfo<T>>::get(&candidate).ok_or(Error::<T>::CandidateDNE)?;
            state.bond_more::<T>(candidate.clone(), more)?;
            <CandidateInfo<T>>::insert(&candidate, state);
            Ok(().into())
        }

        /// Request by collator candidate to decrease self bond by `less`
        #[pallet::call_index(13)]
        #[pallet::weight(<T as Config>::WeightInfo::schedule_candidate_bond_less())]
        pub fn schedule_candidate_bond_less(
            origin: OriginFor<T>,
            less: BalanceOf<T>,
        ) -> DispatchResultWithPostInfo {
            let collator = ensure_signed(origin)?;
            let mut state = <CandidateInfo<T>>::get(&collator).ok_or(Error::<T>::CandidateDNE)?;
            let when = state.schedule_bond_less::<T>(less)?;
            <CandidateInfo<T>>::insert(&collator, state);
            Self::deposit_event(Event::CandidateBondLessRequested {
                candidate: collator,
                amount_to_decrease: less,
                execute_round: when,
            });
            Ok(().into())
        }

        /// Execute pending request to adjust the collator candidate self bond
        #[pallet::call_index(14)]
        #[pallet::weight(<T as Config>::WeightInfo::execute_candidate_bond_less())]
        pub fn execute_candidate_bond_less(
            origin: OriginFor<T>,
            candidate: T::AccountId,
        ) -> DispatchResultWithPostInfo {
            ensure_signed(origin)?; // we may want to reward this if caller != candidate
            let mut state = <CandidateInfo<T>>::get(&candidate).ok_or(Error::<T>::CandidateDNE)?;
            state.execute_bond_less::<T>(candidate.clone())?;
            <CandidateInfo<T>>::insert(&candidate, state);
            Ok(().into())
        }

        /// Cancel pending request to adjust the collator candidate self bond
        #[pallet::call_index(15)]
        #[pallet::weight(<T as Config>::WeightInfo::cancel_candidate_bond_less())]
        pub fn cancel_candidate_bond_less(origin: OriginFor<T>) -> DispatchResultWithPostInfo {
            let collator = ensure_signed(origin)?;
            let mut state = <CandidateInfo<T>>::get(&collator).ok_or(Error::<T>::CandidateDNE)?;
            state.cancel_bond_less::<T>(collator.clone())?;
            <CandidateInfo<T>>::insert(&collator, state);
            Ok(().into())
        }

        /// If caller is not a delegator and not a collator, then join the set of delegators
        /// If caller is a delegator, then makes delegation to change their delegation state
        #[pallet::call_index(16)]
        #[pallet::weight(
            <T as Config>::WeightInfo::delegate(
                *candidate_delegation_count,
                *delegation_count
            )
        )]
        pub fn delegate(
            origin: OriginFor<T>,
            candidate: T::AccountId,
            amount: BalanceOf<T>,
            candidate_delegation_count: u32,
            delegation_count: u32,
        ) -> DispatchResultWithPostInfo {
            let delegator = ensure_signed(origin)?;
            <AutoCompoundDelegations<T>>::delegate_with_auto_compound(
                candidate,
                delegator,
                amount,
                Percent::from_percent(0),
                candidate_delegation_count,
                0,
                delegation_count,
            )
        }

        /// If caller is not a delegator and not a collator, then join the set of delegators
        /// If caller is a delegator, then makes delegation to change their delegation state
        /// Sets the auto-compound config for the delegation
        #[pallet::call_index(17)]
        #[pallet::weight(
            <T as Config>::WeightInfo::delegate_with_auto_compound(
                *candidate_delegation_count,
                *candidate_auto_compounding_delegation_count,
                *delegation_count,
            )
        )]
        pub fn delegate_with_auto_compound(
            origin: OriginFor<T>,
            candidate: T::AccountId,
            amount: BalanceOf<T>,
            auto_compound: Percent,
            candidate_delegation_count: u32,
            candidate_auto_compounding_delegation_count: u32,
            delegation_count: u32,
        ) -> DispatchResultWithPostInfo {
            let delegator = ensure_signed(origin)?;
            <AutoCompoundDelegations<T>>::delegate_with_auto_compound(
                candidate,
                delegator,
                amount,
                auto_compound,
                candidate_delegation_count,
                candidate_auto_compounding_delegation_count,
                delegation_count,
            )
        }

        /// Request to leave the set of delegators. If successful, the caller is scheduled to be
        /// allowed to exit via a [DelegationAction::Revoke] towards all existing delegations.
        /// Success forbids future delegation requests until the request is invoked or cancelled.
        #[pallet::call_index(18)]
        #[pallet::weight(<T as Config>::WeightInfo::schedule_leave_delegators())]
        pub fn schedule_leave_delegators(origin: OriginFor<T>) -> DispatchResultWithPostInfo {
            let delegator = ensure_signed(origin)?;
            Self::delegator_schedule_revoke_all(delegator)
        }

        /// Execute the right to exit the set of delegators and revoke all ongoing delegations.
        #[pallet::call_index(19)]
        #[pallet::weight(<T as Config>::WeightInfo::execute_leave_delegators(*delegation_count))]
        pub fn execute_leave_delegators(
            origin: OriginFor<T>,
            delegator: T::AccountId,
            delegation_count: u32,
        ) -> DispatchResultWithPostInfo {
            ensure_signed(origin)?;
            Self::delegator_execute_scheduled_revoke_all(delegator, delegation_count)
        }

        /// Cancel a pending request to exit the set of delegators. Success clears the pending
        /// revoke requests of every delegation.
        #[pallet::call_index(20)]
        #[pallet::weight(<T as Config>::WeightInfo::cancel_leave_delegators())]
        pub fn cancel_leave_delegators(origin: OriginFor<T>) -> DispatchResultWithPostInfo {
            let delegator = ensure_signed(origin)?;
            Self::delegator_cancel_scheduled_revoke_all(delegator)
        }

        /// Request to revoke an existing delegation. If successful, the delegation is scheduled
        /// to be allowed to be revoked via the `execute_delegation_request` extrinsic.
        #[pallet::call_index(21)]
        #[pallet::weight(<T as Config>::WeightInfo::schedule_revoke_delegation())]
        pub fn schedule_revoke_delegation(
            origin: OriginFor<T>,
            collator: T::AccountId,
        ) -> DispatchResultWithPostInfo {
            let delegator = ensure_signed(origin)?;
            Self::delegation_schedule_revoke(collator, delegator)
        }

        /// Bond more for delegators wrt a specific collator candidate.
        #[pallet::call_index(22)]
        #[pallet::weight(<T as Config>::WeightInfo::delegator_bond_more())]
        pub fn delegator_bond_more(
            origin: OriginFor<T>,
            candidate: T::AccountId,
            more: BalanceOf<T>,
        ) -> DispatchResultWithPostInfo {
            let delegator = ensure_signed(origin)?;
            let in_top =
                Self::delegation_bond_more_without_event(delegator.clone(), candidate.clone(), more)?;
            Self::deposit_event(Event::DelegationIncreased {
                delegator,
                candidate,
                amount: more,
                in_top,
            });
            Ok(().into())
        }

        /// Request bond less for delegators wrt a specific collator candidate.
        #[pallet::call_index(23)]
        #[pallet::weight(<T as Config>::WeightInfo::schedule_delegator_bond_less())]
        pub fn schedule_delegator_bond_less(
            origin: OriginFor<T>,
            candidate: T::AccountId,
            less: BalanceOf<T>,
        ) -> DispatchResultWithPostInfo {
            let delegator = ensure_signed(origin)?;
            Self::delegation_schedule_bond_decrease(candidate, delegator, less)
        }

        /// Execute pending request to change an existing delegation
        #[pallet::call_index(24)]
        #[pallet::weight(
            <T as Config>::WeightInfo::execute_revoke_delegation()
                .max(<T as Config>::WeightInfo::execute_delegator_bond_less())
        )]
        pub fn execute_delegation_request(
            origin: OriginFor<T>,
            delegator: T::AccountId,
            candidate: T::AccountId,
        ) -> DispatchResultWithPostInfo {
            ensure_signed(origin)?; // we may want to reward caller if caller != delegator
            Self::delegation_execute_scheduled_request(candidate, delegator)
        }

        /// Cancel request to change an existing delegation.
        #[pallet::call_index(25)]
        #[pallet::weight(<T as Config>::WeightInfo::cancel_delegation_request())]
        pub fn cancel_delegation_request(
            origin: OriginFor<T>,
            candidate: T::AccountId,
        ) -> DispatchResultWithPostInfo {
            let delegator = ensure_signed(origin)?;
            Self::delegation_cancel_request(candidate, delegator)
        }

        /// Sets the auto-compounding reward percentage for a delegation.
        #[pallet::call_index(26)]
        #[pallet::weight(
            <T as Config>::WeightInfo::set_auto_compound(
                *candidate_auto_compounding_delegation_count_hint,
                *delegation_count_hint,
            )
        )]
        pub fn set_auto_compound(
            origin: OriginFor<T>,
            candidate: T::AccountId,
            value: Percent,
            candidate_auto_compounding_delegation_count_hint: u32,
            delegation_count_hint: u32,
        ) -> DispatchResultWithPostInfo {
            let delegator = ensure_signed(origin)?;
            <AutoCompoundDelegations<T>>::set_auto_compound(
                candidate,
                delegator,
                value,
                candidate_auto_compounding_delegation_count_hint,
                delegation_count_hint,
            )
        }
    }

    impl<T: Config> Pallet<T> {
        pub fn is_delegator(acc: &T::AccountId) -> bool {
            <DelegatorState<T>>::get(acc).is_some()
        }

        pub fn is_candidate(acc: &T::AccountId) -> bool {
            <CandidateInfo<T>>::get(acc).is_some()
        }

        pub fn is_selected_candidate(acc: &T::AccountId) -> bool {
            <SelectedCandidates<T>>::get().binary_search(acc).is_ok()
        }

        pub fn current_round() -> RoundIndex {
            <Round<T>>::get().current
        }

        /// Returns the auto-compound percent of a delegation, 0% if none is configured.
        pub fn delegation_auto_compound(
            candidate: &T::AccountId,
            delegator: &T::AccountId,
        ) -> Percent {
            <AutoCompoundDelegations<T>>::auto_compound(candidate, delegator)
        }

        /// Bootstraps staking on a live chain: the given accounts join with the minimum bond
        /// and round 1 starts at `now`.
        pub fn initialize_pallet(
            now: BlockNumberFor<T>,
            candidates: Vec<T::AccountId>,
            inflation_config: InflationInfo,
            collator_commission: Perbill,
            blocks_per_round: u32,
        ) -> DispatchResult {
            ensure!(
                blocks_per_round >= T::MinBlocksPerRound::get(),
                Error::<T>::CannotSetBelowMin
            );
            <InflationConfig<T>>::put(inflation_config);
            <CollatorCommission<T>>::put(collator_commission);
            <TotalSelected<T>>::put(T::MinSelectedCandidates::get());

            for (candidate_count, candidate) in candidates.into_iter().enumerate() {
                Self::join_candidates(
                    frame_system::RawOrigin::Signed(candidate).into(),
                    T::MinCandidateStk::get(),
                    candidate_count as u32,
                )
                .map_err(|e| e.error)?;
            }

            Self::start_first_round(now, blocks_per_round);
            Ok(())
        }

        /// Selects the collators of round 1, snapshots the staked total and emits `NewRound`.
        fn start_first_round(first: BlockNumberFor<T>, blocks_per_round: u32) {
            let (_, collator_count, _, total_staked) = Self::select_top_candidates(1u64);
            let round: RoundInfo<BlockNumberFor<T>> = RoundInfo::new(1u64, first, blocks_per_round);
            <Round<T>>::put(round);
            <Staked<T>>::insert(round.current, <Total<T>>::get());
            Self::deposit_event(Event::NewRound {
                starting_block: first,
                round: 1u64,
                selected_collators_number: collator_count,
                total_balance: total_staked,
            });
        }

        /// Re-inserts a candidate into the pool with its new total backing.
        pub(crate) fn update_active(candidate: T::AccountId, total: BalanceOf<T>) {
            let mut candidates = <CandidatePool<T>>::get();
            candidates.remove(&Bond::from_owner(candidate.clone()));
            candidates.insert(Bond {
                owner: candidate,
                amount: total,
            });
            <CandidatePool<T>>::put(candidates);
        }

        /// Free balance not yet locked for delegations.
        pub fn get_delegator_stakable_balance(acc: &T::AccountId) -> BalanceOf<T> {
            let bonded = <DelegatorState<T>>::get(acc)
                .map(|state| state.total())
                .unwrap_or_else(Zero::zero);
            T::Currency::free_balance(acc).saturating_sub(bonded)
        }

        /// Stakable balance as reported by [StakingHooks] minus the current self bond.
        pub fn get_collator_stakable_free_balance(
            acc: &T::AccountId,
        ) -> Result<BalanceOf<T>, DispatchError> {
            let stakable = T::StakingHooks::get_collator_stakable_balance(acc)?;
            let bonded = <CandidateInfo<T>>::get(acc)
                .map(|info| info.bond)
                .unwrap_or_else(Zero::zero);
            Ok(stakable.saturating_sub(bonded))
        }

        /// Removes a delegation from the candidate and lowers [Total].
        pub(crate) fn delegator_leaves_candidate(
            candidate: T::AccountId,
            delegator: T::AccountId,
            amount: BalanceOf<T>,
        ) -> DispatchResult {
            let mut state = <CandidateInfo<T>>::get(&candidate).ok_or(Error::<T>::CandidateDNE)?;
            state.rm_delegation_if_exists::<T>(&candidate, delegator.clone(), amount)?;
            let new_total_locked = <Total<T>>::get().saturating_sub(amount);
            <Total<T>>::put(new_total_locked);
            let new_total = state.total_counted;
            <CandidateInfo<T>>::insert(&candidate, state);
            Self::deposit_event(Event::DelegatorLeftCandidate {
                delegator,
                candidate,
                unstaked_amount: amount,
                total_candidate_staked: new_total,
            });
            Ok(())
        }

        /// Increases a delegation by `more` and raises the delegator lock.
        /// Returns whether the delegation is in the top delegations afterwards.
        pub(crate) fn delegation_bond_more_without_event(
            delegator: T::AccountId,
            candidate: T::AccountId,
            more: BalanceOf<T>,
        ) -> Result<bool, DispatchError> {
            ensure!(
                !Self::delegation_request_revoke_exists(&candidate, &delegator),
                Error::<T>::PendingDelegationRevoke
            );
            let mut state = <DelegatorState<T>>::get(&delegator).ok_or(Error::<T>::DelegatorDNE)?;
            let before = state.increase_delegation::<T>(&candidate, more)?;
            let mut candidate_state =
                <CandidateInfo<T>>::get(&candidate).ok_or(Error::<T>::CandidateDNE)?;
            let in_top = candidate_state.increase_delegation::<T>(
                &candidate,
                delegator.clone(),
                before,
                more,
            )?;
            <CandidateInfo<T>>::insert(&candidate, candidate_state);
            <Total<T>>::mutate(|total| *total = total.saturating_add(more));
            <DelegatorState<T>>::insert(&delegator, state);
            Ok(in_top)
        }

        /// Mints the issuance of round `now - RewardPaymentDelay`, sets the parachain bond
        /// reserve aside and stores the remainder for per-block payouts.
        fn prepare_staking_payouts(now: RoundIndex) -> Weight {
            let delay = T::RewardPaymentDelay::get();
            if now <= delay {
                return Weight::zero();
            }
            let round_to_payout = now.saturating_sub(delay);
            let total_points = <Points<T>>::get(round_to_payout);
            let total_staked = <Staked<T>>::take(round_to_payout);
            if total_points.is_zero() {
                // nothing authored, nothing to pay
                let _ = <AtStake<T>>::clear_prefix(round_to_payout, u32::MAX, None);
                return T::DbWeight::get().reads_writes(2, 2);
            }

            let total_issuance = round_issuance::<T>(<InflationConfig<T>>::get(), total_staked);
            let mut left_issuance = total_issuance;

            let bond_config = <ParachainBondInfo<T>>::get();
            if let Some(account) = bond_config.account {
                let parachain_bond_reserve = bond_config.percent * total_issuance;
                if !parachain_bond_reserve.is_zero() {
                    match T::Currency::deposit_into_existing(&account, parachain_bond_reserve) {
                        Ok(imbalance) => {
                            left_issuance = left_issuance.saturating_sub(imbalance.peek());
                            Self::deposit_event(Event::ReservedForParachainBond {
                                account,
                                value: imbalance.peek(),
                            });
                        }
                        Err(error) => log::warn!(
                            target: LOG_TARGET,
                            "failed to reserve {:?} for parachain bond in round {}: {:?}",
                            parachain_bond_reserve,
                            round_to_payout,
                            error,
                        ),
                    }
                }
            }

            let payout = DelayedPayout {
                round_issuance: total_issuance,
                total_staking_reward: left_issuance,
                collator_commission: <CollatorCommission<T>>::get(),
            };
            <DelayedPayouts<T>>::insert(round_to_payout, payout);

            <T as Config>::WeightInfo::prepare_staking_payouts()
        }

        /// Pays one collator of the round due for payout, cleaning up once all are paid.
        fn handle_delayed_payouts(now: RoundIndex) -> Weight {
            let delay = T::RewardPaymentDelay::get();
            if now <= delay {
                return Weight::zero();
            }
            let paid_for_round = now.saturating_sub(delay);

            let Some(payout_info) = <DelayedPayouts<T>>::get(paid_for_round) else {
                return T::DbWeight::get().reads(1);
            };
            let (result, weight) = Self::pay_one_collator_reward(paid_for_round, payout_info);
            if result == RewardPayment::Finished {
                <DelayedPayouts<T>>::remove(paid_for_round);
                <Points<T>>::remove(paid_for_round);
                let _ = <AwardedPts<T>>::clear_prefix(paid_for_round, u32::MAX, None);
                return weight.saturating_add(T::DbWeight::get().reads_writes(1, 3));
            }
            weight.saturating_add(T::DbWeight::get().reads(1))
        }

        /// Payout a single collator from the given round.
        ///
        /// Returns [RewardPayment::Finished] once no collator of the round is left to be paid.
        pub(crate) fn pay_one_collator_reward(
            paid_for_round: RoundIndex,
            payout_info: DelayedPayout<BalanceOf<T>>,
        ) -> (RewardPayment, Weight) {
            // 'early_weight' tracks weight used for reads/writes done early in this fn before its
            // early-exit codepaths.
            let mut early_weight = Weight::zero();

            // Take the snapshot of block author and delegations
            let total_points = <Points<T>>::get(paid_for_round);
            early_weight = early_weight.saturating_add(T::DbWeight::get().reads(1));
            if total_points.is_zero() {
                log::error!(
                    target: LOG_TARGET,
                    "payout of round {} found zero points, stopping",
                    paid_for_round,
                );
                return (RewardPayment::Finished, early_weight);
            }

            let Some((collator, state)) = <AtStake<T>>::iter_prefix(paid_for_round).drain().next()
            else {
                return (RewardPayment::Finished, early_weight);
            };
            // read and kill AtStake
            early_weight = early_weight.saturating_add(T::DbWeight::get().reads_writes(1, 1));

            // Take the awarded points for the collator
            let pts = <AwardedPts<T>>::take(paid_for_round, &collator);
            early_weight = early_weight.saturating_add(T::DbWeight::get().reads_writes(1, 1));
            if pts.is_zero() {
                return (RewardPayment::Skipped, early_weight);
            }

            let mut extra_weight = Weight::zero();
            let pct_due = Perbill::from_rational(pts, total_points);
            let total_paid = pct_due * payout_info.total_staking_reward;
            let mut amt_due = total_paid;

            let num_delegators = state.delegations.len();
            if state.delegations.is_empty() {
                // solo collator with no delegators
                extra_weight = extra_weight.saturating_add(
                    T::StakingHooks::payout_collator_reward(paid_for_round, &collator, amt_due),
                );
            } else {
                // pay collator first; commission + due_portion
                let collator_pct = Perbill::from_rational(state.bond, state.total);
                let collator_issuance = payout_info.collator_commission * payout_info.round_issuance;
                let commission = pct_due * collator_issuance;
                amt_due = amt_due.saturating_sub(commission);
                let collator_reward = (collator_pct * amt_due).saturating_add(commission);
                extra_weight = extra_weight.saturating_add(
                    T::StakingHooks::payout_collator_reward(
                        paid_for_round,
                        &collator,
                        collator_reward,
                    ),
                );

                // pay delegators due portion
                for BondWithAutoCompound {
                    owner,
                    amount,
                    auto_compound,
                } in state.delegations
                {
                    let percent = Perbill::from_rational(amount, state.total);
                    let due = percent * amt_due;
                    if !due.is_zero() {
                        extra_weight = extra_weight.saturating_add(Self::mint_and_compound(
                            due,
                            auto_compound,
                            collator.clone(),
                            owner,
                        ));
                    }
                }
            }

            (
                RewardPayment::Paid,
                <T as Config>::WeightInfo::pay_one_collator_reward(num_delegators as u32)
                    .saturating_add(extra_weight),
            )
        }

        /// Mints the collator reward and emits `Rewarded`. Failed mints are logged and skipped.
        pub fn mint_collator_reward(
            for_round: RoundIndex,
            collator: &T::AccountId,
            reward: BalanceOf<T>,
        ) -> Weight {
            match T::Currency::deposit_into_existing(collator, reward) {
                Ok(amount_transferred) => Self::deposit_event(Event::Rewarded {
                    account: collator.clone(),
                    rewards: amount_transferred.peek(),
                }),
                Err(error) => log::debug!(
                    target: LOG_TARGET,
                    "failed to mint {:?} reward of round {} for collator {:?}: {:?}",
                    reward,
                    for_round,
                    collator,
                    error,
                ),
            }
            T::DbWeight::get().reads_writes(1, 1)
        }

        /// Mints a delegator reward and bonds `compound_percent` of it back into `candidate`.
        fn mint_and_compound(
            amt: BalanceOf<T>,
            compound_percent: Percent,
            candidate: T::AccountId,
            delegator: T::AccountId,
        ) -> Weight {
            let mut weight = T::DbWeight::get().reads_writes(1, 1);
            let amount_transferred = match T::Currency::deposit_into_existing(&delegator, amt) {
                Ok(imbalance) => imbalance.peek(),
                Err(error) => {
                    log::debug!(
                        target: LOG_TARGET,
                        "failed to mint {:?} reward for delegator {:?}: {:?}",
                        amt,
                        delegator,
                        error,
                    );
                    return weight;
                }
            };
            Self::deposit_event(Event::Rewarded {
                account: delegator.clone(),
                rewards: amount_transferred,
            });

            let compound_amount = compound_percent.mul_ceil(amount_transferred);
            if compound_amount.is_zero() {
                return weight;
            }

            if let Err(error) = with_storage_layer(|| {
                Self::delegation_bond_more_without_event(
                    delegator.clone(),
                    candidate.clone(),
                    compound_amount,
                )
            }) {
                log::debug!(
                    target: LOG_TARGET,
                    "skipped compounding {:?} of delegator {:?} towards {:?}: {:?}",
                    compound_amount,
                    delegator,
                    candidate,
                    error,
                );
                return weight;
            }
            weight = weight.saturating_add(<T as Config>::WeightInfo::delegator_bond_more());

            Self::deposit_event(Event::Compounded {
                delegator,
                candidate,
                amount: compound_amount,
            });
            weight
        }

        /// Compute the top `TotalSelected` candidates in the CandidatePool and return
        /// a vec of their AccountIds (sorted by AccountId).
        ///
        /// If the returned vec is empty, the previous candidates should be used.
        pub fn compute_top_candidates() -> Vec<T::AccountId> {
            let top_n = <TotalSelected<T>>::get() as usize;
            if top_n == 0 {
                return vec![];
            }

            let mut candidates = <CandidatePool<T>>::get().0;

            // If the number of candidates is greater than top_n, select the candidates with higher
            // amount. Otherwise, return all the candidates.
            if candidates.len() > top_n {
                // Partially sort candidates such that element at index `top_n - 1` is sorted, and
                // all the elements in the range 0..top_n are the top n elements.
                candidates.select_nth_unstable_by(top_n - 1, |a, b| {
                    // Order by amount, then owner. The owner is needed to ensure a stable order
                    // when two accounts have the same amount.
                    a.amount
                        .cmp(&b.amount)
                        .then_with(|| a.owner.cmp(&b.owner))
                        .reverse()
                });
            }

            let mut collators = candidates
                .into_iter()
                .take(top_n)
                .map(|x| x.owner)
                .collect::<Vec<T::AccountId>>();

            // Sort collators by AccountId
            collators.sort();

            collators
        }

        /// Best as in most cumulatively supported in terms of stake
        /// Returns [collator_count, delegation_count, total staked]
        pub(crate) fn select_top_candidates(now: RoundIndex) -> (Weight, u32, u32, BalanceOf<T>) {
            let (mut collator_count, mut delegation_count, mut total) =
                (0u32, 0u32, BalanceOf::<T>::zero());
            // choose the top TotalSelected qualified candidates, ordered by stake
            let collators = Self::compute_top_candidates();
            if collators.is_empty() {
                // SELECTION FAILED TO SELECT >=1 COLLATOR => select collators from previous round
                let last_round = now.saturating_sub(1u64);
                let mut total_per_candidate: BTreeMap<T::AccountId, BalanceOf<T>> =
                    BTreeMap::new();
                // set this round AtStake to last round AtStake
                for (account, snapshot) in <AtStake<T>>::iter_prefix(last_round) {
                    collator_count = collator_count.saturating_add(1u32);
                    delegation_count =
                        delegation_count.saturating_add(snapshot.delegations.len() as u32);
                    total = total.saturating_add(snapshot.total);
                    total_per_candidate.insert(account.clone(), snapshot.total);
                    <AtStake<T>>::insert(now, account, snapshot);
                }
                // `SelectedCandidates` remains unchanged from last round
                // emit CollatorChosen event for tools that use this event
                for candidate in <SelectedCandidates<T>>::get() {
                    let snapshot_total = total_per_candidate
                        .get(&candidate)
                        .copied()
                        .unwrap_or_else(Zero::zero);
                    Self::deposit_event(Event::CollatorChosen {
                        round: now,
                        collator_account: candidate,
                        total_exposed_amount: snapshot_total,
                    });
                }
                let weight =
                    <T as Config>::WeightInfo::select_top_candidates(collator_count, delegation_count);
                return (weight, collator_count, delegation_count, total);
            }

            // snapshot exposure for round for weighting reward distribution
            for account in collators.iter() {
                let Some(state) = <CandidateInfo<T>>::get(account) else {
                    log::error!(
                        target: LOG_TARGET,
                        "selected candidate {:?} has no candidate info",
                        account,
                    );
                    continue;
                };

                collator_count = collator_count.saturating_add(1u32);
                let CountedDelegations {
                    uncounted_stake,
                    rewardable_delegations,
                } = Self::get_rewardable_delegators(account);
                let total_counted = state.total_counted.saturating_sub(uncounted_stake);
                total = total.saturating_add(total_counted);

                let auto_compounding_delegations = <AutoCompoundDelegations<T>>::get_storage(account);
                let delegations = rewardable_delegations
                    .into_iter()
                    .map(|d| BondWithAutoCompound {
                        auto_compound: auto_compounding_delegations
                            .get_for_delegator(&d.owner)
                            .unwrap_or_else(|| Percent::from_percent(0)),
                        owner: d.owner,
                        amount: d.amount,
                    })
                    .collect::<Vec<_>>();
                delegation_count = delegation_count.saturating_add(delegations.len() as u32);

                let snapshot = CollatorSnapshot {
                    bond: state.bond,
                    delegations,
                    total: total_counted,
                };
                <AtStake<T>>::insert(now, account, snapshot);
                Self::deposit_event(Event::CollatorChosen {
                    round: now,
                    collator_account: account.clone(),
                    total_exposed_amount: state.total_counted,
                });
            }
            // insert canonical collator set
            <SelectedCandidates<T>>::put(collators);

            let weight =
                <T as Config>::WeightInfo::select_top_candidates(collator_count, delegation_count);
            (weight, collator_count, delegation_count, total)
        }

        /// Apply the delegator intent for revoke and decrease in order to build the
        /// effective list of delegators with their intended bond amount.
        ///
        /// This will:
        /// - if [DelegationAction::Revoke] is outstanding, set the bond amount to 0.
        /// - if [DelegationAction::Decrease] is outstanding, subtract the bond by specified amount.
        /// - else, do nothing
        ///
        /// The intended bond amounts will be used while calculating rewards.
        pub(crate) fn get_rewardable_delegators(collator: &T::AccountId) -> CountedDelegations<T> {
            let requests = <DelegationScheduledRequests<T>>::get(collator)
                .into_iter()
                .map(|x| (x.delegator, x.action))
                .collect::<BTreeMap<_, _>>();
            let mut uncounted_stake = BalanceOf::<T>::zero();
            let top_delegations = match <TopDelegations<T>>::get(collator) {
                Some(top) => top.delegations,
                None => {
                    log::error!(
                        target: LOG_TARGET,
                        "candidate {:?} has no top delegations",
                        collator,
                    );
                    Vec::new()
                }
            };
            let rewardable_delegations = top_delegations
                .into_iter()
                .map(|mut bond| {
                    bond.amount = match requests.get(&bond.owner) {
                        None => bond.amount,
                        Some(DelegationAction::Revoke(_)) => {
                            uncounted_stake = uncounted_stake.saturating_add(bond.amount);
                            BalanceOf::<T>::zero()
                        }
                        Some(DelegationAction::Decrease(amount)) => {
                            uncounted_stake = uncounted_stake.saturating_add(*amount);
                            bond.amount.saturating_sub(*amount)
                        }
                    };

                    bond
                })
                .collect();
            CountedDelegations {
                uncounted_stake,
                rewardable_delegations,
            }
        }
    }

    /// Add reward points to block authors:
    /// * 20 points to the block producer for producing a block in the chain
    impl<T: Config> pallet_authorship::EventHandler<T::AccountId, BlockNumberFor<T>> for Pallet<T> {
        fn note_author(author: T::AccountId) {
            let now = <Round<T>>::get().current;
            let score_plus_20 =
                <AwardedPts<T>>::get(now, &author).saturating_add(POINTS_PER_BLOCK);
            <AwardedPts<T>>::insert(now, author, score_plus_20);
            <Points<T>>::mutate(now, |x| *x = x.saturating_add(POINTS_PER_BLOCK));

            frame_system::Pallet::<T>::register_extra_weight_unchecked(
                <T as Config>::WeightInfo::note_author(),
                DispatchClass::Mandatory,
            );
        }
    }

    impl<T: Config> Get<Vec<T::AccountId>> for Pallet<T> {
        fn get() -> Vec<T::AccountId> {
            <SelectedCandidates<T>>::get()
        }
    }
}
