use cosmwasm_std::Uint128;
use thiserror::Error;

use crate::types::{CatalogSnapshot, RewardEntry, SnapshotEntry};

/// Errors from building a cumulative weight table.
#[derive(Error, Debug, PartialEq, Eq)]
pub enum SnapshotError {
    #[error("catalog has no weighted rewards")]
    Empty,

    #[error("total catalog weight overflows u64")]
    WeightOverflow,
}

/// Build the cumulative weight table for a set of reward entries.
///
/// Entries are laid out in the order given; callers pass them by ascending
/// reward id, which makes insertion order part of the selection contract.
/// Zero-weight entries are skipped.
pub fn build_snapshot<I>(entries: I) -> Result<CatalogSnapshot, SnapshotError>
where
    I: IntoIterator<Item = RewardEntry>,
{
    let mut table = Vec::new();
    let mut total: u64 = 0;

    for reward in entries {
        if reward.weight == 0 {
            continue;
        }
        let start = total;
        total = total
            .checked_add(reward.weight)
            .ok_or(SnapshotError::WeightOverflow)?;
        table.push(SnapshotEntry {
            cumulative_start: start,
            cumulative_end: total,
            reward,
        });
    }

    if total == 0 {
        return Err(SnapshotError::Empty);
    }

    Ok(CatalogSnapshot {
        entries: table,
        total_weight: total,
    })
}

/// The ticket a random word lands on: `random_word mod total_weight`.
///
/// Returns `None` only for an empty snapshot, which `build_snapshot` never produces.
pub fn bucket(snapshot: &CatalogSnapshot, random_word: Uint128) -> Option<u64> {
    if snapshot.total_weight == 0 {
        return None;
    }
    // remainder < total_weight, so it fits in u64
    Some((random_word.u128() % u128::from(snapshot.total_weight)) as u64)
}

/// Resolve a random word against a snapshot.
///
/// Picks the first entry whose `cumulative_end` exceeds the bucket. Binary
/// search over the ascending upper bounds; same result as a linear scan.
pub fn select(snapshot: &CatalogSnapshot, random_word: Uint128) -> Option<&RewardEntry> {
    let ticket = bucket(snapshot, random_word)?;
    let idx = snapshot
        .entries
        .partition_point(|e| e.cumulative_end <= ticket);
    snapshot.entries.get(idx).map(|e| &e.reward)
}
