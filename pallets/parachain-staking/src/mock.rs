// Copyright 2019-2022 PureStake Inc.
// Copyright 2023 Papers AG

//! Test utilities
use crate as pallet_parachain_staking;
use crate::{
    pallet, AwardedPts, Config, InflationInfo, Points, Range, RoundIndex, COLLATOR_LOCK_ID,
    DELEGATOR_LOCK_ID,
};
use frame_support::{
    construct_runtime, derive_impl, parameter_types,
    traits::{ConstU16, ConstU32, ConstU64, LockIdentifier, OnFinalize, OnInitialize},
};
use frame_system::EnsureRoot;
use sp_core::H256;
use sp_runtime::{traits::IdentityLookup, BuildStorage, Perbill, Percent};

pub type AccountId = u64;
pub type Balance = u128;
pub type BlockNumber = u64;
type Block = frame_system::mocking::MockBlock<Test>;

pub(crate) const GENESIS_BLOCKS_PER_ROUND: BlockNumber = 10;
pub(crate) const GENESIS_COLLATOR_COMMISSION: Perbill = Perbill::from_percent(20);
pub(crate) const GENESIS_PARACHAIN_BOND_RESERVE_PERCENT: Percent = Percent::from_percent(30);
pub(crate) const GENESIS_NUM_SELECTED_CANDIDATES: u32 = 5;

construct_runtime!(
    pub enum Test {
        System: frame_system::{Pallet, Call, Config<T>, Storage, Event<T>} = 0,
        Balances: pallet_balances::{Pallet, Call, Storage, Config<T>, Event<T>},
        ParachainStaking: pallet_parachain_staking::{Pallet, Call, Storage, Config<T>, Event<T>},
    }
);

parameter_types! {
    pub const ExistentialDeposit: Balance = 1;
    pub const MaxReserves: u32 = 50;
    pub const MaxLocks: u32 = 50;
}

#[derive_impl(frame_system::config_preludes::ParaChainDefaultConfig as frame_system::DefaultConfig)]
impl frame_system::Config for Test {
    type AccountId = AccountId;
    type Lookup = IdentityLookup<Self::AccountId>;
    type Nonce = u64;
    type Hash = H256;
    type Block = Block;
    type BlockHashCount = ConstU64<250>;
    type Version = ();
    type AccountData = pallet_balances::AccountData<Balance>;
    type DbWeight = ();
    type BlockWeights = ();
    type BlockLength = ();
    type SS58Prefix = ConstU16<42>;
    type OnSetCode = ();
    type MaxConsumers = ConstU32<16>;
}

impl pallet_balances::Config for Test {
    type Balance = Balance;
    type DustRemoval = ();
    type RuntimeEvent = RuntimeEvent;
    type ExistentialDeposit = ExistentialDeposit;
    type AccountStore = System;
    type WeightInfo = ();
    type MaxLocks = MaxLocks;
    type MaxReserves = MaxReserves;
    type ReserveIdentifier = [u8; 8];
    type RuntimeHoldReason = RuntimeHoldReason;
    type RuntimeFreezeReason = RuntimeFreezeReason;
    type FreezeIdentifier = RuntimeFreezeReason;
    type MaxFreezes = ConstU32<50>;
    type DoneSlashHandler = ();
}

parameter_types! {
    pub const MinBlocksPerRound: u32 = 3;
    pub const LeaveCandidatesDelay: RoundIndex = 2;
    pub const CandidateBondLessDelay: RoundIndex = 2;
    pub const LeaveDelegatorsDelay: RoundIndex = 2;
    pub const RevokeDelegationDelay: RoundIndex = 2;
    pub const RewardPaymentDelay: RoundIndex = 2;
    pub const MinSelectedCandidates: u32 = 3;
    pub const MaxCandidates: u32 = 8;
    pub const MaxTopDelegationsPerCandidate: u32 = 4;
    pub const MaxBottomDelegationsPerCandidate: u32 = 4;
    pub const MaxDelegationsPerDelegator: u32 = 4;
    pub const MinCandidateStk: Balance = 10;
    pub const MinDelegatorStk: Balance = 5;
    pub const MinDelegation: Balance = 3;
}

impl Config for Test {
    type RuntimeEvent = RuntimeEvent;
    type Currency = Balances;
    type MonetaryGovernanceOrigin = EnsureRoot<AccountId>;
    type MinBlocksPerRound = MinBlocksPerRound;
    type LeaveCandidatesDelay = LeaveCandidatesDelay;
    type CandidateBondLessDelay = CandidateBondLessDelay;
    type LeaveDelegatorsDelay = LeaveDelegatorsDelay;
    type RevokeDelegationDelay = RevokeDelegationDelay;
    type RewardPaymentDelay = RewardPaymentDelay;
    type MinSelectedCandidates = MinSelectedCandidates;
    type MaxCandidates = MaxCandidates;
    type MaxTopDelegationsPerCandidate = MaxTopDelegationsPerCandidate;
    type MaxBottomDelegationsPerCandidate = MaxBottomDelegationsPerCandidate;
    type MaxDelegationsPerDelegator = MaxDelegationsPerDelegator;
    type MinCandidateStk = MinCandidateStk;
    type MinDelegation = MinDelegation;
    type MinDelegatorStk = MinDelegatorStk;
    type StakingHooks = ();
    type OnNewRound = ();
    type WeightInfo = ();
}

pub(crate) struct ExtBuilder {
    // endowed accounts with balances
    balances: Vec<(AccountId, Balance)>,
    // [collator, amount]
    collators: Vec<(AccountId, Balance)>,
    // [delegator, collator, delegation_amount, auto_compound_percent]
    delegations: Vec<(AccountId, AccountId, Balance, Percent)>,
    // inflation config
    inflation: InflationInfo,
}

impl Default for ExtBuilder {
    fn default() -> ExtBuilder {
        ExtBuilder {
            balances: vec![],
            delegations: vec![],
            collators: vec![],
            // a flat 5% per round keeps issuance independent of the staked ratio
            inflation: InflationInfo {
                ideal_staked: Perbill::from_percent(50),
                annual: Range {
                    min: Perbill::from_percent(50),
                    ideal: Perbill::from_percent(50),
                },
                round: Range {
                    min: Perbill::from_percent(5),
                    ideal: Perbill::from_percent(5),
                },
                decay_rate: Perbill::from_percent(5),
            },
        }
    }
}

impl ExtBuilder {
    pub(crate) fn with_balances(mut self, balances: Vec<(AccountId, Balance)>) -> Self {
        self.balances = balances;
        self
    }

    pub(crate) fn with_candidates(mut self, collators: Vec<(AccountId, Balance)>) -> Self {
        self.collators = collators;
        self
    }

    pub(crate) fn with_delegations(
        mut self,
        delegations: Vec<(AccountId, AccountId, Balance)>,
    ) -> Self {
        self.delegations = delegations
            .into_iter()
            .map(|(delegator, collator, amount)| {
                (delegator, collator, amount, Percent::from_percent(0))
            })
            .collect();
        self
    }

    pub(crate) fn with_auto_compounding_delegations(
        mut self,
        delegations: Vec<(AccountId, AccountId, Balance, Percent)>,
    ) -> Self {
        self.delegations = delegations;
        self
    }

    pub(crate) fn with_inflation(mut self, inflation: InflationInfo) -> Self {
        self.inflation = inflation;
        self
    }

    pub(crate) fn build(self) -> sp_io::TestExternalities {
        let mut t = frame_system::GenesisConfig::<Test>::default()
            .build_storage()
            .expect("Frame system builds valid default genesis config");

        pallet_balances::GenesisConfig::<Test> {
            balances: self.balances,
            ..Default::default()
        }
        .assimilate_storage(&mut t)
        .expect("Pallet balances storage can be assimilated");
        pallet_parachain_staking::GenesisConfig::<Test> {
            candidates: self.collators,
            delegations: self.delegations,
            inflation_config: self.inflation,
            collator_commission: GENESIS_COLLATOR_COMMISSION,
            parachain_bond_reserve_percent: GENESIS_PARACHAIN_BOND_RESERVE_PERCENT,
            blocks_per_round: GENESIS_BLOCKS_PER_ROUND as u32,
            num_selected_candidates: GENESIS_NUM_SELECTED_CANDIDATES,
        }
        .assimilate_storage(&mut t)
        .expect("Parachain Staking's storage can be assimilated");

        let mut ext = sp_io::TestExternalities::new(t);
        ext.execute_with(|| System::set_block_number(1));
        ext
    }
}

/// Rolls forward one block. Returns the new block number.
fn roll_one_block() -> BlockNumber {
    Balances::on_finalize(System::block_number());
    System::on_finalize(System::block_number());
    System::set_block_number(System::block_number() + 1);
    System::reset_events();
    System::on_initialize(System::block_number());
    Balances::on_initialize(System::block_number());
    ParachainStaking::on_initialize(System::block_number());
    System::block_number()
}

/// Rolls to the desired block. Returns the number of blocks played.
pub(crate) fn roll_to(n: BlockNumber) -> BlockNumber {
    let mut num_blocks = 0;
    let mut block = System::block_number();
    while block < n {
        block = roll_one_block();
        num_blocks += 1;
    }
    num_blocks
}

/// Rolls block-by-block to the beginning of the specified round.
/// This will complete the block in which the round change occurs.
/// Returns the number of blocks played.
pub(crate) fn roll_to_round_begin(round: BlockNumber) -> BlockNumber {
    let block = (round - 1) * GENESIS_BLOCKS_PER_ROUND;
    roll_to(block)
}

/// Rolls block-by-block to the end of the specified round.
/// The block following will be the one in which the specified round change occurs.
pub(crate) fn roll_to_round_end(round: BlockNumber) -> BlockNumber {
    let block = round * GENESIS_BLOCKS_PER_ROUND - 1;
    roll_to(block)
}

/// Events of this pallet emitted in the current block.
pub(crate) fn events() -> Vec<pallet::Event<Test>> {
    System::events()
        .into_iter()
        .map(|r| r.event)
        .filter_map(|e| {
            if let RuntimeEvent::ParachainStaking(inner) = e {
                Some(inner)
            } else {
                None
            }
        })
        .collect::<Vec<_>>()
}

/// Asserts that the pallet events of the current block equal the given ones, in order.
macro_rules! assert_events_eq {
    ($event:expr) => {
        similar_asserts::assert_eq!(vec![$event], crate::mock::events());
    };
    ($($events:expr,)+) => {
        similar_asserts::assert_eq!(vec![$($events,)+], crate::mock::events());
    };
}
pub(crate) use assert_events_eq;

/// Asserts that every given event was emitted in the current block.
macro_rules! assert_events_emitted {
    ($event:expr) => {
        [$event].into_iter().for_each(|e| {
            assert!(
                crate::mock::events().into_iter().any(|x| x == e),
                "Event {:?} was not found in events: \n{:#?}",
                e,
                crate::mock::events()
            );
        });
    };
    ($($events:expr,)+) => {
        [$($events,)+].into_iter().for_each(|e| {
            assert!(
                crate::mock::events().into_iter().any(|x| x == e),
                "Event {:?} was not found in events: \n{:#?}",
                e,
                crate::mock::events()
            );
        });
    };
}
pub(crate) use assert_events_emitted;

/// Asserts that none of the given events was emitted in the current block.
macro_rules! assert_events_not_emitted {
    ($($events:expr,)+) => {
        [$($events,)+].into_iter().for_each(|e| {
            assert!(
                !crate::mock::events().into_iter().any(|x| x == e),
                "Event {:?} was unexpectedly found in events: \n{:#?}",
                e,
                crate::mock::events()
            );
        });
    };
}
pub(crate) use assert_events_not_emitted;

/// Asserts that the last pallet events of the current block equal the given ones.
macro_rules! assert_tail_eq {
    ($tail:expr, $arr:expr) => {
        if $tail.len() != 0 {
            // 0-length always passes

            if $tail.len() > $arr.len() {
                similar_asserts::assert_eq!($tail, $arr); // will fail
            }

            let len_diff = $arr.len() - $tail.len();
            similar_asserts::assert_eq!($tail, $arr[len_diff..]);
        }
    };
}
pub(crate) use assert_tail_eq;

/// Awards `pts` points to `acc` in `round` as if it authored blocks.
pub(crate) fn set_author(round: RoundIndex, acc: AccountId, pts: u32) {
    <Points<Test>>::mutate(round, |p| *p += pts);
    <AwardedPts<Test>>::mutate(round, acc, |p| *p += pts);
}

/// Returns the amount locked under `id`, if any.
pub(crate) fn query_lock_amount(account_id: AccountId, id: LockIdentifier) -> Option<Balance> {
    pallet_balances::Locks::<Test>::get(account_id)
        .into_iter()
        .find(|lock| lock.id == id)
        .map(|lock| lock.amount)
}

pub(crate) fn collator_lock(account_id: AccountId) -> Option<Balance> {
    query_lock_amount(account_id, COLLATOR_LOCK_ID)
}

pub(crate) fn delegator_lock(account_id: AccountId) -> Option<Balance> {
    query_lock_amount(account_id, DELEGATOR_LOCK_ID)
}

#[test]
fn geneses() {
    ExtBuilder::default()
        .with_balances(vec![
            (1, 1000),
            (2, 300),
            (3, 100),
            (4, 100),
            (5, 100),
            (6, 100),
            (7, 100),
            (8, 9),
            (9, 4),
        ])
        .with_candidates(vec![(1, 500), (2, 200)])
        .with_delegations(vec![(3, 1, 100), (4, 1, 100), (5, 2, 100), (6, 2, 100)])
        .build()
        .execute_with(|| {
            assert!(System::events().is_empty());
            // collators
            assert_eq!(Balances::free_balance(1), 1000);
            assert_eq!(collator_lock(1), Some(500));
            assert!(ParachainStaking::is_candidate(&1));
            assert_eq!(collator_lock(2), Some(200));
            assert!(ParachainStaking::is_candidate(&2));
            // delegators
            for x in 3..7 {
                assert!(ParachainStaking::is_delegator(&x));
                assert_eq!(delegator_lock(x), Some(100));
            }
            // uninvolved
            for x in 7..10 {
                assert!(!ParachainStaking::is_delegator(&x));
            }
            // no delegator staking locks
            assert_eq!(delegator_lock(7), None);
            assert_eq!(Balances::free_balance(8), 9);
            assert_eq!(Balances::free_balance(9), 4);
            // round 1 is running with both candidates selected
            assert_eq!(ParachainStaking::current_round(), 1);
            assert_eq!(ParachainStaking::compute_top_candidates(), vec![1, 2]);
            assert_eq!(<crate::Total<Test>>::get(), 1100);
        });
}

#[test]
fn roll_to_round_begin_works() {
    ExtBuilder::default().build().execute_with(|| {
        // these tests assume blocks-per-round of 10, as established by GENESIS_BLOCKS_PER_ROUND
        assert_eq!(System::block_number(), 1); // we start on block 1

        let num_blocks = roll_to_round_begin(1);
        assert_eq!(System::block_number(), 1); // no-op, we're already on this round
        assert_eq!(num_blocks, 0);

        let num_blocks = roll_to_round_begin(2);
        assert_eq!(System::block_number(), 10);
        assert_eq!(num_blocks, 9);
        assert_eq!(ParachainStaking::current_round(), 2);

        let num_blocks = roll_to_round_begin(4);
        assert_eq!(System::block_number(), 30);
        assert_eq!(num_blocks, 20);
        assert_eq!(ParachainStaking::current_round(), 4);
    });
}

#[test]
fn roll_to_round_end_works() {
    ExtBuilder::default().build().execute_with(|| {
        assert_eq!(System::block_number(), 1); // we start on block 1

        let num_blocks = roll_to_round_end(1);
        assert_eq!(System::block_number(), 9);
        assert_eq!(num_blocks, 8);
        assert_eq!(ParachainStaking::current_round(), 1);

        let num_blocks = roll_to_round_end(3);
        assert_eq!(System::block_number(), 29);
        assert_eq!(num_blocks, 20);
        assert_eq!(ParachainStaking::current_round(), 3);
    });
}

#[test]
fn assert_tail_eq_works() {
    assert_tail_eq!(vec![1, 2], vec![0, 1, 2]);

    assert_tail_eq!(vec![1], vec![1]);

    assert_tail_eq!(
        vec![0u32; 0], // 0 length array
        vec![0u32; 1]  // 1-length array
    );

    assert_tail_eq!(vec![0u32, 0], vec![0u32, 0]);
}

#[test]
#[should_panic]
fn assert_tail_eq_panics_on_non_equal_tail() {
    assert_tail_eq!(vec![2, 2], vec![0, 1, 2]);
}

#[test]
#[should_panic]
fn assert_tail_eq_panics_on_empty_arr() {
    assert_tail_eq!(vec![2, 2], vec![0u32; 0]);
}

#[test]
#[should_panic]
fn assert_tail_eq_panics_on_longer_tail() {
    assert_tail_eq!(vec![1, 2, 3], vec![1, 2]);
}
