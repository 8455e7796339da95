//! Most-frequent-visitor ranking.
//!
//! Events are grouped per entity and ranked by visit count, then by the
//! number of distinct calendar days visited, then by entity id so equal
//! keys always come out in the same order.

use chrono::{DateTime, NaiveDate, Utc};
use serde::Serialize;
use std::cmp::Ordering;
use std::collections::{HashMap, HashSet};

use crate::error::{Error, Result};
use crate::types::{Entity, Event};

/// Display name used when an identity has none.
pub const DEFAULT_NAME: &str = "Unknown";
/// Age reported when an identity carries no `age` attribute.
pub const DEFAULT_AGE: i64 = 30;
/// Gender code reported when an identity carries no `gender` attribute.
pub const DEFAULT_GENDER: i64 = 0;

/// Display fields attached to a ranked entity.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct DisplayProfile {
    pub name: String,
    pub age: serde_json::Value,
    pub gender: serde_json::Value,
}

impl Default for DisplayProfile {
    fn default() -> Self {
        Self {
            name: DEFAULT_NAME.to_string(),
            age: DEFAULT_AGE.into(),
            gender: DEFAULT_GENDER.into(),
        }
    }
}

impl DisplayProfile {
    /// Build display fields from an identity, falling back to the defaults
    /// for anything it does not carry.
    ///
    /// The name comes from `username`, then `metadata.name`.
    pub fn from_identity(identity: Option<&Entity>) -> Self {
        let Some(identity) = identity else {
            return Self::default();
        };
        let attr = |key: &str| identity.metadata.get(key).filter(|v| !v.is_null()).cloned();

        let name = identity
            .username
            .clone()
            .or_else(|| {
                identity
                    .metadata
                    .get("name")
                    .and_then(|v| v.as_str())
                    .map(str::to_string)
            })
            .unwrap_or_else(|| DEFAULT_NAME.to_string());

        Self {
            name,
            age: attr("age").unwrap_or_else(|| DEFAULT_AGE.into()),
            gender: attr("gender").unwrap_or_else(|| DEFAULT_GENDER.into()),
        }
    }
}

/// Visit statistics for one ranked entity.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct LeaderboardEntry {
    pub entity_id: String,
    /// Number of events in the range
    pub visit_count: u64,
    /// Distinct UTC calendar dates with at least one event
    pub distinct_days: u64,
    /// Most recent event
    pub last_visit: DateTime<Utc>,
    pub profile: DisplayProfile,
}

/// Ranked entries plus whether any entity was cut off by the limit.
#[derive(Debug, Clone, PartialEq)]
pub struct Leaderboard {
    pub entries: Vec<LeaderboardEntry>,
    pub has_more: bool,
    /// Distinct entities before truncation
    pub entity_count: usize,
}

/// Per-entity accumulator
struct VisitAccumulator {
    visit_count: u64,
    days: HashSet<NaiveDate>,
    last_visit: DateTime<Utc>,
}

impl VisitAccumulator {
    fn new(first: DateTime<Utc>) -> Self {
        Self {
            visit_count: 0,
            days: HashSet::new(),
            last_visit: first,
        }
    }

    fn add(&mut self, ts: DateTime<Utc>) {
        self.visit_count += 1;
        self.days.insert(ts.date_naive());
        if ts > self.last_visit {
            self.last_visit = ts;
        }
    }
}

/// Ranking order: visits desc, distinct days desc, entity id asc.
fn ranking_order(a: &LeaderboardEntry, b: &LeaderboardEntry) -> Ordering {
    b.visit_count
        .cmp(&a.visit_count)
        .then_with(|| b.distinct_days.cmp(&a.distinct_days))
        .then_with(|| a.entity_id.cmp(&b.entity_id))
}

/// Rank entities by visit frequency and keep the top `limit`.
pub fn rank(
    events: &[Event],
    identities: &HashMap<String, Entity>,
    limit: i64,
) -> Result<Leaderboard> {
    if limit <= 0 {
        return Err(Error::InvalidLimit(limit));
    }
    let limit = usize::try_from(limit).unwrap_or(usize::MAX);

    let mut stats: HashMap<&str, VisitAccumulator> = HashMap::new();
    for event in events {
        stats
            .entry(event.entity_id.as_str())
            .or_insert_with(|| VisitAccumulator::new(event.timestamp))
            .add(event.timestamp);
    }

    let mut entries: Vec<LeaderboardEntry> = stats
        .into_iter()
        .map(|(id, acc)| LeaderboardEntry {
            entity_id: id.to_string(),
            visit_count: acc.visit_count,
            distinct_days: acc.days.len() as u64,
            last_visit: acc.last_visit,
            profile: DisplayProfile::default(),
        })
        .collect();
    entries.sort_by(ranking_order);

    let entity_count = entries.len();
    entries.truncate(limit);
    for entry in &mut entries {
        entry.profile = DisplayProfile::from_identity(identities.get(&entry.entity_id));
    }

    tracing::debug!(
        events = events.len(),
        entities = entity_count,
        returned = entries.len(),
        limit,
        "Ranked leaderboard"
    );

    Ok(Leaderboard {
        entries,
        has_more: entity_count > limit,
        entity_count,
    })
}
