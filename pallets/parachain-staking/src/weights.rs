// Copyright 2019-2022 PureStake Inc.
// Copyright 2023 Papers AG

//! Weights for parachain-staking

use frame_support::{traits::Get, weights::Weight};
use sp_std::marker::PhantomData;

/// Weight functions needed for parachain-staking.
pub trait WeightInfo {
    fn set_inflation() -> Weight;
    fn set_parachain_bond_account() -> Weight;
    fn set_parachain_bond_reserve_percent() -> Weight;
    fn set_total_selected() -> Weight;
    fn set_collator_commission() -> Weight;
    fn set_blocks_per_round() -> Weight;
    fn join_candidates(x: u32) -> Weight;
    fn schedule_leave_candidates(x: u32) -> Weight;
    fn execute_leave_candidates(x: u32) -> Weight;
    fn cancel_leave_candidates(x: u32) -> Weight;
    fn go_offline() -> Weight;
    fn go_online() -> Weight;
    fn candidate_bond_more() -> Weight;
    fn schedule_candidate_bond_less() -> Weight;
    fn execute_candidate_bond_less() -> Weight;
    fn cancel_candidate_bond_less() -> Weight;
    fn delegate(x: u32, y: u32) -> Weight;
    fn delegate_with_auto_compound(x: u32, y: u32, z: u32) -> Weight;
    fn schedule_leave_delegators() -> Weight;
    fn execute_leave_delegators(x: u32) -> Weight;
    fn cancel_leave_delegators() -> Weight;
    fn schedule_revoke_delegation() -> Weight;
    fn delegator_bond_more() -> Weight;
    fn schedule_delegator_bond_less() -> Weight;
    fn execute_revoke_delegation() -> Weight;
    fn execute_delegator_bond_less() -> Weight;
    fn cancel_delegation_request() -> Weight;
    fn set_auto_compound(x: u32, y: u32) -> Weight;
    fn base_on_initialize() -> Weight;
    fn prepare_staking_payouts() -> Weight;
    fn select_top_candidates(x: u32, y: u32) -> Weight;
    fn pay_one_collator_reward(y: u32) -> Weight;
    fn note_author() -> Weight;
}

/// Weights for parachain-staking using the Substrate node and recommended hardware.
pub struct SubstrateWeight<T>(PhantomData<T>);
impl<T: frame_system::Config> WeightInfo for SubstrateWeight<T> {
    fn set_inflation() -> Weight {
        Weight::from_parts(45_000_000, 0)
            .saturating_add(Weight::from_parts(0, 1505))
            .saturating_add(T::DbWeight::get().reads(2))
            .saturating_add(T::DbWeight::get().writes(1))
    }
    fn set_parachain_bond_account() -> Weight {
        Weight::from_parts(14_000_000, 0)
            .saturating_add(Weight::from_parts(0, 1527))
            .saturating_add(T::DbWeight::get().reads(1))
            .saturating_add(T::DbWeight::get().writes(1))
    }
    fn set_parachain_bond_reserve_percent() -> Weight {
        Weight::from_parts(14_000_000, 0)
            .saturating_add(Weight::from_parts(0, 1527))
            .saturating_add(T::DbWeight::get().reads(1))
            .saturating_add(T::DbWeight::get().writes(1))
    }
    fn set_total_selected() -> Weight {
        Weight::from_parts(15_000_000, 0)
            .saturating_add(Weight::from_parts(0, 1500))
            .saturating_add(T::DbWeight::get().reads(2))
            .saturating_add(T::DbWeight::get().writes(1))
    }
    fn set_collator_commission() -> Weight {
        Weight::from_parts(13_000_000, 0)
            .saturating_add(Weight::from_parts(0, 1491))
            .saturating_add(T::DbWeight::get().reads(1))
            .saturating_add(T::DbWeight::get().writes(1))
    }
    fn set_blocks_per_round() -> Weight {
        Weight::from_parts(47_000_000, 0)
            .saturating_add(Weight::from_parts(0, 1505))
            .saturating_add(T::DbWeight::get().reads(3))
            .saturating_add(T::DbWeight::get().writes(2))
    }
    fn join_candidates(x: u32) -> Weight {
        Weight::from_parts(60_000_000, 0)
            .saturating_add(Weight::from_parts(120_000, 0).saturating_mul(x.into()))
            .saturating_add(Weight::from_parts(0, 48 * 11))
            .saturating_add(T::DbWeight::get().reads(6))
            .saturating_add(T::DbWeight::get().writes(7))
    }
    fn schedule_leave_candidates(x: u32) -> Weight {
        Weight::from_parts(33_000_000, 0)
            .saturating_add(Weight::from_parts(110_000, 0).saturating_mul(x.into()))
            .saturating_add(T::DbWeight::get().reads(2))
            .saturating_add(T::DbWeight::get().writes(2))
    }
    fn execute_leave_candidates(x: u32) -> Weight {
        Weight::from_parts(60_000_000, 0)
            .saturating_add(Weight::from_parts(30_000_000, 0).saturating_mul(x.into()))
            .saturating_add(T::DbWeight::get().reads(5))
            .saturating_add(T::DbWeight::get().reads((4_u64).saturating_mul(x.into())))
            .saturating_add(T::DbWeight::get().writes(5))
            .saturating_add(T::DbWeight::get().writes((3_u64).saturating_mul(x.into())))
    }
    fn cancel_leave_candidates(x: u32) -> Weight {
        Weight::from_parts(30_000_000, 0)
            .saturating_add(Weight::from_parts(115_000, 0).saturating_mul(x.into()))
            .saturating_add(T::DbWeight::get().reads(2))
            .saturating_add(T::DbWeight::get().writes(2))
    }
    fn go_offline() -> Weight {
        Weight::from_parts(30_000_000, 0)
            .saturating_add(T::DbWeight::get().reads(2))
            .saturating_add(T::DbWeight::get().writes(2))
    }
    fn go_online() -> Weight {
        Weight::from_parts(30_000_000, 0)
            .saturating_add(T::DbWeight::get().reads(2))
            .saturating_add(T::DbWeight::get().writes(2))
    }
    fn candidate_bond_more() -> Weight {
        Weight::from_parts(55_000_000, 0)
            .saturating_add(T::DbWeight::get().reads(5))
            .saturating_add(T::DbWeight::get().writes(4))
    }
    fn schedule_candidate_bond_less() -> Weight {
        Weight::from_parts(24_000_000, 0)
            .saturating_add(T::DbWeight::get().reads(2))
            .saturating_add(T::DbWeight::get().writes(1))
    }
    fn execute_candidate_bond_less() -> Weight {
        Weight::from_parts(60_000_000, 0)
            .saturating_add(T::DbWeight::get().reads(5))
            .saturating_add(T::DbWeight::get().writes(4))
    }
    fn cancel_candidate_bond_less() -> Weight {
        Weight::from_parts(20_000_000, 0)
            .saturating_add(T::DbWeight::get().reads(1))
            .saturating_add(T::DbWeight::get().writes(1))
    }
    fn delegate(x: u32, y: u32) -> Weight {
        Weight::from_parts(90_000_000, 0)
            .saturating_add(Weight::from_parts(150_000, 0).saturating_mul(x.into()))
            .saturating_add(Weight::from_parts(100_000, 0).saturating_mul(y.into()))
            .saturating_add(T::DbWeight::get().reads(8))
            .saturating_add(T::DbWeight::get().writes(8))
    }
    fn delegate_with_auto_compound(x: u32, y: u32, z: u32) -> Weight {
        Weight::from_parts(95_000_000, 0)
            .saturating_add(Weight::from_parts(150_000, 0).saturating_mul(x.into()))
            .saturating_add(Weight::from_parts(100_000, 0).saturating_mul(y.into()))
            .saturating_add(Weight::from_parts(120_000, 0).saturating_mul(z.into()))
            .saturating_add(T::DbWeight::get().reads(9))
            .saturating_add(T::DbWeight::get().writes(9))
    }
    fn schedule_leave_delegators() -> Weight {
        Weight::from_parts(40_000_000, 0)
            .saturating_add(T::DbWeight::get().reads(2))
            .saturating_add(T::DbWeight::get().writes(2))
    }
    fn execute_leave_delegators(x: u32) -> Weight {
        Weight::from_parts(25_000_000, 0)
            .saturating_add(Weight::from_parts(35_000_000, 0).saturating_mul(x.into()))
            .saturating_add(T::DbWeight::get().reads(2))
            .saturating_add(T::DbWeight::get().reads((4_u64).saturating_mul(x.into())))
            .saturating_add(T::DbWeight::get().writes(2))
            .saturating_add(T::DbWeight::get().writes((4_u64).saturating_mul(x.into())))
    }
    fn cancel_leave_delegators() -> Weight {
        Weight::from_parts(40_000_000, 0)
            .saturating_add(T::DbWeight::get().reads(2))
            .saturating_add(T::DbWeight::get().writes(2))
    }
    fn schedule_revoke_delegation() -> Weight {
        Weight::from_parts(30_000_000, 0)
            .saturating_add(T::DbWeight::get().reads(2))
            .saturating_add(T::DbWeight::get().writes(2))
    }
    fn delegator_bond_more() -> Weight {
        Weight::from_parts(70_000_000, 0)
            .saturating_add(T::DbWeight::get().reads(8))
            .saturating_add(T::DbWeight::get().writes(7))
    }
    fn schedule_delegator_bond_less() -> Weight {
        Weight::from_parts(30_000_000, 0)
            .saturating_add(T::DbWeight::get().reads(2))
            .saturating_add(T::DbWeight::get().writes(2))
    }
    fn execute_revoke_delegation() -> Weight {
        Weight::from_parts(90_000_000, 0)
            .saturating_add(T::DbWeight::get().reads(9))
            .saturating_add(T::DbWeight::get().writes(8))
    }
    fn execute_delegator_bond_less() -> Weight {
        Weight::from_parts(75_000_000, 0)
            .saturating_add(T::DbWeight::get().reads(8))
            .saturating_add(T::DbWeight::get().writes(8))
    }
    fn cancel_delegation_request() -> Weight {
        Weight::from_parts(30_000_000, 0)
            .saturating_add(T::DbWeight::get().reads(2))
            .saturating_add(T::DbWeight::get().writes(2))
    }
    fn set_auto_compound(x: u32, y: u32) -> Weight {
        Weight::from_parts(40_000_000, 0)
            .saturating_add(Weight::from_parts(110_000, 0).saturating_mul(x.into()))
            .saturating_add(Weight::from_parts(60_000, 0).saturating_mul(y.into()))
            .saturating_add(T::DbWeight::get().reads(2))
            .saturating_add(T::DbWeight::get().writes(1))
    }
    fn base_on_initialize() -> Weight {
        Weight::from_parts(3_000_000, 0)
    }
    fn prepare_staking_payouts() -> Weight {
        Weight::from_parts(8_000_000, 0)
            .saturating_add(T::DbWeight::get().reads(4))
            .saturating_add(T::DbWeight::get().writes(1))
    }
    fn select_top_candidates(x: u32, y: u32) -> Weight {
        Weight::from_parts(30_000_000, 0)
            .saturating_add(Weight::from_parts(10_000_000, 0).saturating_mul(x.into()))
            .saturating_add(Weight::from_parts(400_000, 0).saturating_mul(y.into()))
            .saturating_add(T::DbWeight::get().reads(3))
            .saturating_add(T::DbWeight::get().reads((4_u64).saturating_mul(x.into())))
            .saturating_add(T::DbWeight::get().writes(1))
            .saturating_add(T::DbWeight::get().writes((1_u64).saturating_mul(x.into())))
    }
    fn pay_one_collator_reward(y: u32) -> Weight {
        Weight::from_parts(60_000_000, 0)
            .saturating_add(Weight::from_parts(20_000_000, 0).saturating_mul(y.into()))
            .saturating_add(T::DbWeight::get().reads(7))
            .saturating_add(T::DbWeight::get().reads((1_u64).saturating_mul(y.into())))
            .saturating_add(T::DbWeight::get().writes(7))
            .saturating_add(T::DbWeight::get().writes((1_u64).saturating_mul(y.into())))
    }
    fn note_author() -> Weight {
        Weight::from_parts(25_000_000, 0)
            .saturating_add(T::DbWeight::get().reads(3))
            .saturating_add(T::DbWeight::get().writes(2))
    }
}

impl WeightInfo for () {
    fn set_inflation() -> Weight {
        Weight::from_parts(1_000, 0)
    }
    fn set_parachain_bond_account() -> Weight {
        Weight::from_parts(1_000, 0)
    }
    fn set_parachain_bond_reserve_percent() -> Weight {
        Weight::from_parts(1_000, 0)
    }
    fn set_total_selected() -> Weight {
        Weight::from_parts(1_000, 0)
    }
    fn set_collator_commission() -> Weight {
        Weight::from_parts(1_000, 0)
    }
    fn set_blocks_per_round() -> Weight {
        Weight::from_parts(1_000, 0)
    }
    fn join_candidates(_x: u32) -> Weight {
        Weight::from_parts(1_000, 0)
    }
    fn schedule_leave_candidates(_x: u32) -> Weight {
        Weight::from_parts(1_000, 0)
    }
    fn execute_leave_candidates(_x: u32) -> Weight {
        Weight::from_parts(1_000, 0)
    }
    fn cancel_leave_candidates(_x: u32) -> Weight {
        Weight::from_parts(1_000, 0)
    }
    fn go_offline() -> Weight {
        Weight::from_parts(1_000, 0)
    }
    fn go_online() -> Weight {
        Weight::from_parts(1_000, 0)
    }
    fn candidate_bond_more() -> Weight {
        Weight::from_parts(1_000, 0)
    }
    fn schedule_candidate_bond_less() -> Weight {
        Weight::from_parts(1_000, 0)
    }
    fn execute_candidate_bond_less() -> Weight {
        Weight::from_parts(1_000, 0)
    }
    fn cancel_candidate_bond_less() -> Weight {
        Weight::from_parts(1_000, 0)
    }
    fn delegate(_x: u32, _y: u32) -> Weight {
        Weight::from_parts(1_000, 0)
    }
    fn delegate_with_auto_compound(_x: u32, _y: u32, _z: u32) -> Weight {
        Weight::from_parts(1_000, 0)
    }
    fn schedule_leave_delegators() -> Weight {
        Weight::from_parts(1_000, 0)
    }
    fn execute_leave_delegators(_x: u32) -> Weight {
        Weight::from_parts(1_000, 0)
    }
    fn cancel_leave_delegators() -> Weight {
        Weight::from_parts(1_000, 0)
    }
    fn schedule_revoke_delegation() -> Weight {
        Weight::from_parts(1_000, 0)
    }
    fn delegator_bond_more() -> Weight {
        Weight::from_parts(1_000, 0)
    }
    fn schedule_delegator_bond_less() -> Weight {
        Weight::from_parts(1_000, 0)
    }
    fn execute_revoke_delegation() -> Weight {
        Weight::from_parts(1_000, 0)
    }
    fn execute_delegator_bond_less() -> Weight {
        Weight::from_parts(1_000, 0)
    }
    fn cancel_delegation_request() -> Weight {
        Weight::from_parts(1_000, 0)
    }
    fn set_auto_compound(_x: u32, _y: u32) -> Weight {
        Weight::from_parts(1_000, 0)
    }
    fn base_on_initialize() -> Weight {
        Weight::from_parts(1_000, 0)
    }
    fn prepare_staking_payouts() -> Weight {
        Weight::from_parts(1_000, 0)
    }
    fn select_top_candidates(_x: u32, _y: u32) -> Weight {
        Weight::from_parts(1_000, 0)
    }
    fn pay_one_collator_reward(_y: u32) -> Weight {
        Weight::from_parts(1_000, 0)
    }
    fn note_author() -> Weight {
        Weight::from_parts(1_000, 0)
    }
}
