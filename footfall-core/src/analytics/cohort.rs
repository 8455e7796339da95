//! New-vs-returning cohort classification per time block.
//!
//! For every block the distinct entities seen in it are split by when each
//! entity was first seen anywhere:
//!
//! - **new**: `first_seen` falls inside the block
//! - **returning**: `first_seen` precedes the block
//!
//! Entities with no recorded `first_seen` count toward the block total but
//! toward neither cohort, so `new + returning <= total` always holds.

use chrono::{DateTime, Utc};
use serde::Serialize;
use std::collections::{HashMap, HashSet};

use super::blocks::TimeBlock;
use crate::types::Event;

/// Cohort counts for a single block.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct CohortCount {
    pub block: TimeBlock,
    /// Distinct entities with at least one event in the block
    pub total: u64,
    /// Entities first seen inside the block
    pub new: u64,
    /// Entities first seen before the block
    pub returning: u64,
}

/// Classification result for a whole range.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct CohortSummary {
    /// One entry per input block, in block order
    pub blocks: Vec<CohortCount>,
    /// Sum of per-block totals; an entity active in three blocks counts three times
    pub total_count: u64,
    /// Sum of per-block `new`
    pub total_new: u64,
    /// Sum of per-block `returning`
    pub total_returning: u64,
    /// Distinct entities across all blocks
    pub distinct_entities: u64,
}

/// Index of the block containing `ts`, if any.
///
/// `blocks` must be ascending and contiguous, as produced by
/// [`generate_time_blocks`](super::blocks::generate_time_blocks).
pub(crate) fn block_index(blocks: &[TimeBlock], ts: DateTime<Utc>) -> Option<usize> {
    let idx = blocks.partition_point(|b| b.from <= ts).checked_sub(1)?;
    blocks[idx].contains(ts).then_some(idx)
}

/// True when each block ends where the next one starts, as produced by
/// [`generate_time_blocks`](super::blocks::generate_time_blocks).
fn is_partition(blocks: &[TimeBlock]) -> bool {
    blocks.iter().all(|b| b.from < b.to) && blocks.windows(2).all(|w| w[0].to == w[1].from)
}

/// Classify `events` into `blocks` using each entity's first sighting.
///
/// Every block counts the events with `from <= timestamp < to`. Blocks may
/// be given in any order and may overlap; an event then counts in each block
/// that contains it. Events outside every block are ignored. With no events
/// at all the result has no block entries and zeroed totals.
pub fn classify(
    events: &[Event],
    first_seen: &HashMap<String, DateTime<Utc>>,
    blocks: &[TimeBlock],
) -> CohortSummary {
    if events.is_empty() {
        return CohortSummary::default();
    }

    let mut members: Vec<HashSet<&str>> = vec![HashSet::new(); blocks.len()];
    let mut unbucketed = 0usize;
    if is_partition(blocks) {
        for event in events {
            match block_index(blocks, event.timestamp) {
                Some(idx) => {
                    members[idx].insert(event.entity_id.as_str());
                }
                None => unbucketed += 1,
            }
        }
    } else {
        tracing::debug!(blocks = blocks.len(), "Blocks are not contiguous, scanning each");
        for event in events {
            let mut placed = false;
            for (block, ids) in blocks.iter().zip(members.iter_mut()) {
                if block.contains(event.timestamp) {
                    ids.insert(event.entity_id.as_str());
                    placed = true;
                }
            }
            if !placed {
                unbucketed += 1;
            }
        }
    }

    let mut summary = CohortSummary {
        blocks: Vec::with_capacity(blocks.len()),
        ..Default::default()
    };
    let mut everyone: HashSet<&str> = HashSet::new();
    let mut unknown_first_seen = 0usize;

    for (block, ids) in blocks.iter().zip(&members) {
        let mut count = CohortCount {
            block: *block,
            total: ids.len() as u64,
            new: 0,
            returning: 0,
        };

        for id in ids {
            match first_seen.get(*id) {
                Some(ts) if block.contains(*ts) => count.new += 1,
                Some(ts) if *ts < block.from => count.returning += 1,
                Some(_) => {}
                None => unknown_first_seen += 1,
            }
        }

        tracing::trace!(
            from = %block.from,
            to = %block.to,
            total = count.total,
            new = count.new,
            returning = count.returning,
            "Classified block"
        );

        summary.total_count += count.total;
        summary.total_new += count.new;
        summary.total_returning += count.returning;
        everyone.extend(ids.iter().copied());
        summary.blocks.push(count);
    }
    summary.distinct_entities = everyone.len() as u64;

    if unknown_first_seen > 0 {
        tracing::warn!(
            occurrences = unknown_first_seen,
            "Entities without first_seen counted in totals only"
        );
    }
    tracing::debug!(
        events = events.len(),
        unbucketed,
        blocks = summary.blocks.len(),
        total_count = summary.total_count,
        total_new = summary.total_new,
        distinct = summary.distinct_entities,
        "Cohort classification complete"
    );

    summary
}
