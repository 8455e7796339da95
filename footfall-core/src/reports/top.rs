//! Top customers of the month.

use chrono::{DateTime, Datelike, Utc};
use serde::Serialize;
use std::collections::HashMap;

use crate::analytics::{rank, LeaderboardEntry};
use crate::error::Result;
use crate::format::utc_timestamp;
use crate::types::{Entity, Event};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct Visits {
    pub count: u64,
    pub days: u64,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct TopCustomerRow {
    pub user_id: String,
    pub name: String,
    pub age: serde_json::Value,
    pub gender: serde_json::Value,
    pub visits: Visits,
    #[serde(with = "utc_timestamp")]
    pub last_visit: DateTime<Utc>,
}

impl From<LeaderboardEntry> for TopCustomerRow {
    fn from(entry: LeaderboardEntry) -> Self {
        Self {
            user_id: entry.entity_id,
            name: entry.profile.name,
            age: entry.profile.age,
            gender: entry.profile.gender,
            visits: Visits {
                count: entry.visit_count,
                days: entry.distinct_days,
            },
            last_visit: entry.last_visit,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct TopCustomersMetadata {
    /// Range start moved to the first of its month
    #[serde(with = "utc_timestamp")]
    pub current_month: DateTime<Utc>,
    #[serde(with = "utc_timestamp")]
    pub last_updated: DateTime<Utc>,
    pub has_more: bool,
    pub limit: i64,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct TopCustomersReport {
    pub results: Vec<TopCustomerRow>,
    pub metadata: TopCustomersMetadata,
}

/// Most frequent visitors since `start`.
///
/// Fails with [`crate::Error::InvalidLimit`] before looking at the events
/// when `limit` is not positive.
pub fn top_customers_report(
    start: DateTime<Utc>,
    events: &[Event],
    identities: &HashMap<String, Entity>,
    limit: i64,
    generated_at: DateTime<Utc>,
) -> Result<TopCustomersReport> {
    let board = rank(events, identities, limit)?;

    tracing::info!(
        limit,
        returned = board.entries.len(),
        has_more = board.has_more,
        "Built top customers report"
    );

    Ok(TopCustomersReport {
        results: board.entries.into_iter().map(TopCustomerRow::from).collect(),
        metadata: TopCustomersMetadata {
            // Day 1 exists in every month
            current_month: start.with_day(1).unwrap_or(start),
            last_updated: generated_at,
            has_more: board.has_more,
            limit,
        },
    })
}
