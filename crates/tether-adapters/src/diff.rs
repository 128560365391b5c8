#![forbid(unsafe_code)]

//! Keyed list diff producing positional, animatable operations.
//!
//! # Algorithm
//!
//! 1. **Match**: every old item is paired with the next unused new item of
//!    the same key. Duplicate keys pair up occurrence by occurrence.
//! 2. **Remove**: unmatched old items are removed from the highest position
//!    down, so earlier positions stay valid.
//! 3. **Move**: survivors whose new positions form a longest increasing
//!    subsequence stay put. Walking the survivors from the end of the new
//!    list, every other survivor is moved immediately before the survivor
//!    that follows it.
//! 4. **Insert**: new keys are inserted in ascending order, each directly at
//!    its final position.
//! 5. **Change**: survivors whose content differs emit `Change` at their
//!    final position.
//!
//! Ops are meant to be applied in order; each position refers to the list as
//! it stands after the previous op. [`replay`] does exactly that and
//! [`verify`] checks the result against the target keys.
//!
//! # Complexity
//!
//! Matching and the LIS are `O(n log n)`; moves are `O(n · m)` where `m` is
//! the number of surviving items, because positions are looked up in a plain
//! `Vec`.

use std::collections::{HashMap, VecDeque};
use std::hash::Hash;

use tether_core::{Result, TetherError};

/// One positional list mutation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum DiffOp {
    /// A new item appears at `at`.
    Insert { at: usize },
    /// The item at `at` disappears.
    Remove { at: usize },
    /// The item at `from` is taken out and re-inserted at `to`.
    Move { from: usize, to: usize },
    /// The item at `at` keeps its identity but its content changed.
    Change { at: usize },
}

/// Identity and content comparison for list items.
pub trait DiffItem {
    /// Stable identity of the row.
    type Key: Hash + Eq + Clone;

    fn key(&self) -> Self::Key;

    /// Whether two items with the same key render identically.
    fn same_content(&self, other: &Self) -> bool;
}

macro_rules! impl_value_item {
    ($($ty:ty),* $(,)?) => {
        $(
            impl DiffItem for $ty {
                type Key = $ty;

                fn key(&self) -> Self::Key {
                    self.clone()
                }

                fn same_content(&self, _other: &Self) -> bool {
                    true
                }
            }
        )*
    };
}

impl_value_item!(char, u8, u16, u32, u64, usize, i32, i64, String, &'static str);

/// Pluggable differ used by the list adapter.
pub trait DiffStrategy<T: DiffItem>: Send + Sync {
    fn diff(&self, old: &[T], new: &[T]) -> Vec<DiffOp>;
}

/// The default keyed differ; see the module docs.
#[derive(Debug, Default, Clone, Copy)]
pub struct KeyedDiff;

impl<T: DiffItem> DiffStrategy<T> for KeyedDiff {
    fn diff(&self, old: &[T], new: &[T]) -> Vec<DiffOp> {
        diff(old, new)
    }
}

/// Compute the ops that turn `old` into `new`.
#[must_use]
pub fn diff<T: DiffItem>(old: &[T], new: &[T]) -> Vec<DiffOp> {
    let mut ops = Vec::new();

    // Match old items to new positions.
    let mut pending: HashMap<T::Key, VecDeque<usize>> = HashMap::with_capacity(new.len());
    for (j, item) in new.iter().enumerate() {
        pending.entry(item.key()).or_default().push_back(j);
    }
    let matched: Vec<Option<usize>> = old
        .iter()
        .map(|item| pending.get_mut(&item.key()).and_then(VecDeque::pop_front))
        .collect();

    let mut old_of_new: Vec<Option<usize>> = vec![None; new.len()];
    for (i, j) in matched.iter().enumerate() {
        if let Some(j) = *j {
            old_of_new[j] = Some(i);
        }
    }

    for i in (0..old.len()).rev() {
        if matched[i].is_none() {
            ops.push(DiffOp::Remove { at: i });
        }
    }

    // Survivors in old order, identified by their new position.
    let mut work: Vec<usize> = matched.iter().filter_map(|j| *j).collect();
    let stable = stable_positions(&work, new.len());

    let survivors: Vec<usize> = (0..new.len()).filter(|&j| old_of_new[j].is_some()).collect();
    for k in (0..survivors.len()).rev() {
        let j = survivors[k];
        if stable[j] {
            continue;
        }
        let anchor = match survivors.get(k + 1) {
            Some(&next) => position(&work, next),
            None => work.len(),
        };
        let from = position(&work, j);
        let to = if from < anchor { anchor - 1 } else { anchor };
        if from != to {
            ops.push(DiffOp::Move { from, to });
            work.remove(from);
            work.insert(to, j);
        }
    }
    debug_assert!(work.windows(2).all(|w| w[0] < w[1]));

    for (j, source) in old_of_new.iter().enumerate() {
        if source.is_none() {
            ops.push(DiffOp::Insert { at: j });
        }
    }

    for (j, item) in new.iter().enumerate() {
        if let Some(i) = old_of_new[j]
            && !old[i].same_content(item)
        {
            ops.push(DiffOp::Change { at: j });
        }
    }

    ops
}

#[inline]
fn position(work: &[usize], j: usize) -> usize {
    work.iter().position(|&w| w == j).unwrap_or(work.len())
}

/// Mark the new positions that form a longest increasing subsequence of
/// `seq`; those items never need to move.
fn stable_positions(seq: &[usize], new_len: usize) -> Vec<bool> {
    let mut stable = vec![false; new_len];
    if seq.is_empty() {
        return stable;
    }

    // tails[k] = index into seq of the smallest tail of an increasing run of length k+1.
    let mut tails: Vec<usize> = Vec::with_capacity(seq.len());
    let mut prev: Vec<Option<usize>> = vec![None; seq.len()];
    for (idx, &value) in seq.iter().enumerate() {
        let slot = tails.partition_point(|&t| seq[t] < value);
        if slot > 0 {
            prev[idx] = Some(tails[slot - 1]);
        }
        if slot == tails.len() {
            tails.push(idx);
        } else {
            tails[slot] = idx;
        }
    }

    let mut cursor = tails.last().copied();
    while let Some(idx) = cursor {
        stable[seq[idx]] = true;
        cursor = prev[idx];
    }
    stable
}

/// Apply `ops` to `old`, taking inserted keys from `new`.
///
/// Fails with [`TetherError::InconsistentDiff`] if an op points outside the
/// list it is applied to.
pub fn replay<K: Clone>(old: &[K], ops: &[DiffOp], new: &[K]) -> Result<Vec<K>> {
    let mut list = old.to_vec();
    for op in ops {
        let in_bounds = match *op {
            DiffOp::Insert { at } => {
                if at <= list.len() && at < new.len() {
                    list.insert(at, new[at].clone());
                    true
                } else {
                    false
                }
            }
            DiffOp::Remove { at } => {
                if at < list.len() {
                    list.remove(at);
                    true
                } else {
                    false
                }
            }
            DiffOp::Move { from, to } => {
                if from < list.len() && to < list.len() {
                    let item = list.remove(from);
                    list.insert(to, item);
                    true
                } else {
                    false
                }
            }
            DiffOp::Change { at } => at < list.len(),
        };
        if !in_bounds {
            return Err(TetherError::InconsistentDiff {
                expected: new.len(),
                replayed: list.len(),
                first_mismatch: Some(op_position(op)),
            });
        }
    }
    Ok(list)
}

fn op_position(op: &DiffOp) -> usize {
    match *op {
        DiffOp::Insert { at } | DiffOp::Remove { at } | DiffOp::Change { at } => at,
        DiffOp::Move { from, .. } => from,
    }
}

/// Check that replaying `ops` on `old` yields exactly `new`.
pub fn verify<K: Clone + PartialEq>(old: &[K], ops: &[DiffOp], new: &[K]) -> Result<()> {
    let replayed = replay(old, ops, new)?;
    if replayed == new {
        return Ok(());
    }
    let first_mismatch = replayed
        .iter()
        .zip(new)
        .position(|(a, b)| a != b)
        .or_else(|| Some(replayed.len().min(new.len())));
    Err(TetherError::InconsistentDiff {
        expected: new.len(),
        replayed: replayed.len(),
        first_mismatch,
    })
}
