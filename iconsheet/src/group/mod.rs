//! Size-bounded grouping of entities by affiliation.
//!
//! Every group becomes one sprite sheet, so group size bounds sheet
//! dimensions. Balancing runs in three linear passes:
//!
//! 1. **Bucket**: one bucket per affiliation, in first-seen order.
//! 2. **Split**: cut each bucket into `max_group_size` chunks from the front;
//!    the remainder becomes its own group.
//! 3. **Merge**: groups smaller than `min_group_size` are concatenated in scan
//!    order until the accumulation reaches `min_group_size`. Whatever is left
//!    at the end forms one final, possibly undersized, group.
//!
//! ```text
//! A×1200 B×40 C×40 D×40   (max 1000, min 100)
//!   split → [A×1000] [A×200] [B×40] [C×40] [D×40]
//!   merge → [A×1000] [A×200] [B×40 C×40 D×40]
//! ```

use std::collections::HashMap;

use thiserror::Error;
use tracing::debug;

/// Default maximum number of entities per group.
pub const DEFAULT_MAX_GROUP_SIZE: usize = 1000;

/// Default minimum number of entities per group.
pub const DEFAULT_MIN_GROUP_SIZE: usize = 100;

/// Anything that can be grouped by affiliation.
pub trait Affiliated {
    /// The grouping key.
    fn affiliation(&self) -> &str;
}

/// An ordered group of borrowed items.
pub type Group<'a, T> = Vec<&'a T>;

/// Invalid group size limits.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum GroupError {
    /// A zero maximum would never make progress while splitting.
    #[error("max group size must be at least 1")]
    ZeroMaxGroupSize,

    /// The minimum is larger than the maximum.
    #[error("min group size {min} exceeds max group size {max}")]
    MinExceedsMax { min: usize, max: usize },

    /// Merged groups could grow past the maximum.
    #[error("min group size {min} is too large for max group size {max}: merged groups may reach {merged}")]
    MergeOverflow {
        min: usize,
        max: usize,
        merged: usize,
    },
}

/// Validated group size bounds.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct GroupLimits {
    max_group_size: usize,
    min_group_size: usize,
}

impl Default for GroupLimits {
    fn default() -> Self {
        Self {
            max_group_size: DEFAULT_MAX_GROUP_SIZE,
            min_group_size: DEFAULT_MIN_GROUP_SIZE,
        }
    }
}

impl GroupLimits {
    /// Validate and create group limits.
    ///
    /// A merged group is built from pieces smaller than `min_group_size` and
    /// closes as soon as it reaches `min_group_size`, so it holds at most
    /// `2 * (min_group_size - 1)` entities. That must fit in
    /// `max_group_size`.
    pub fn new(max_group_size: usize, min_group_size: usize) -> Result<Self, GroupError> {
        if max_group_size == 0 {
            return Err(GroupError::ZeroMaxGroupSize);
        }
        if min_group_size > max_group_size {
            return Err(GroupError::MinExceedsMax {
                min: min_group_size,
                max: max_group_size,
            });
        }
        let merged = min_group_size.saturating_sub(1).saturating_mul(2);
        if merged > max_group_size {
            return Err(GroupError::MergeOverflow {
                min: min_group_size,
                max: max_group_size,
                merged,
            });
        }

        Ok(Self {
            max_group_size,
            min_group_size,
        })
    }

    /// Maximum number of entities per group.
    pub fn max_group_size(&self) -> usize {
        self.max_group_size
    }

    /// Minimum number of entities per group, except a trailing leftover.
    pub fn min_group_size(&self) -> usize {
        self.min_group_size
    }
}

/// Partition `items` into size-bounded groups.
///
/// Every item appears in exactly one group. Items of one affiliation keep
/// their relative input order across the output.
pub fn balance<T: Affiliated>(items: &[T], limits: GroupLimits) -> Vec<Group<'_, T>> {
    let buckets = bucket_by_affiliation(items);
    let bucket_count = buckets.len();

    let split = split_oversized(buckets, limits.max_group_size);
    let split_count = split.len();

    let groups = merge_undersized(split, limits.min_group_size);

    debug!(
        items = items.len(),
        affiliations = bucket_count,
        after_split = split_count,
        groups = groups.len(),
        "Balanced groups"
    );
    groups
}

fn bucket_by_affiliation<T: Affiliated>(items: &[T]) -> Vec<Group<'_, T>> {
    let mut positions: HashMap<&str, usize> = HashMap::new();
    let mut buckets: Vec<Group<'_, T>> = Vec::new();

    for item in items {
        let slot = *positions.entry(item.affiliation()).or_insert_with(|| {
            buckets.push(Vec::new());
            buckets.len() - 1
        });
        buckets[slot].push(item);
    }

    buckets
}

fn split_oversized<T>(buckets: Vec<Group<'_, T>>, max_group_size: usize) -> Vec<Group<'_, T>> {
    buckets
        .iter()
        .flat_map(|bucket| bucket.chunks(max_group_size))
        .map(<[&T]>::to_vec)
        .collect()
}

fn merge_undersized<T>(groups: Vec<Group<'_, T>>, min_group_size: usize) -> Vec<Group<'_, T>> {
    let mut merged = Vec::with_capacity(groups.len());
    let mut pending: Group<'_, T> = Vec::new();

    for group in groups {
        if group.len() >= min_group_size {
            merged.push(group);
            continue;
        }

        pending.extend(group);
        if pending.len() >= min_group_size {
            merged.push(std::mem::take(&mut pending));
        }
    }

    if !pending.is_empty() {
        merged.push(pending);
    }

    merged
}
