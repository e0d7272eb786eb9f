// Copyright 2019-2022 PureStake Inc.
// Copyright 2023 Papers AG

//! Sorted, deduplicated set backed by a `Vec`

use parity_scale_codec::{Decode, Encode};
use scale_info::TypeInfo;
use sp_runtime::RuntimeDebug;
use sp_std::prelude::*;

/// A set whose elements are kept sorted by their `Ord` implementation.
///
/// Lookups, insertions and removals use binary search, so the invariant that the inner vector is
/// sorted and free of duplicates must hold at all times. Only construct it through
/// [`OrderedSet::from`] or [`OrderedSet::new`].
#[derive(RuntimeDebug, PartialEq, Eq, Encode, Decode, Clone, TypeInfo)]
pub struct OrderedSet<T>(pub Vec<T>);

impl<T: Ord> OrderedSet<T> {
    pub fn new() -> Self {
        Self(Vec::new())
    }

    /// Sorts and deduplicates `v`.
    pub fn from(mut v: Vec<T>) -> Self {
        v.sort();
        v.dedup();
        Self(v)
    }

    /// Returns `false` if an equal element is already present.
    pub fn insert(&mut self, value: T) -> bool {
        match self.0.binary_search(&value) {
            Ok(_) => false,
            Err(index) => {
                self.0.insert(index, value);
                true
            }
        }
    }

    /// Returns `true` if an element was removed.
    pub fn remove(&mut self, value: &T) -> bool {
        match self.0.binary_search(value) {
            Ok(index) => {
                self.0.remove(index);
                true
            }
            Err(_) => false,
        }
    }

    pub fn contains(&self, value: &T) -> bool {
        self.0.binary_search(value).is_ok()
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

impl<T> Default for OrderedSet<T> {
    fn default() -> Self {
        Self(Vec::new())
    }
}

impl<T: Ord> From<Vec<T>> for OrderedSet<T> {
    fn from(v: Vec<T>) -> Self {
        OrderedSet::from(v)
    }
}
