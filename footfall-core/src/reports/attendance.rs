//! Time-bucketed attendance reports.
//!
//! Two audiences share the same engine:
//!
//! - **customers**: every recognized identity; each bucket reports new and
//!   returning visitors, and `total_count` sums the per-bucket counts
//! - **employees**: only identities carrying the staff label; each bucket
//!   reports newly appearing staff, and `total_count` is the number of
//!   distinct staff seen over the whole range

use chrono::{DateTime, Utc};
use serde::Serialize;
use std::collections::HashMap;

use crate::analytics::{classify, generate_time_blocks, CohortSummary, TimeBlock};
use crate::format::utc_timestamp;
use crate::types::{Entity, Event, Granularity, TimeRange};

/// One customer bucket.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct CustomerBucket {
    pub time_range: TimeBlock,
    pub count: u64,
    pub new_customer: u64,
    pub old_customer: u64,
}

/// One employee bucket.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct EmployeeBucket {
    pub time_range: TimeBlock,
    pub count: u64,
    pub new_appear_employees: u64,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct AttendanceMetadata {
    pub total_count: u64,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub total_new_customer: Option<u64>,
    #[serde(with = "utc_timestamp")]
    pub last_updated: DateTime<Utc>,
    pub base_time: Granularity,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct AttendanceReport<R> {
    pub results: Vec<R>,
    pub metadata: AttendanceMetadata,
}

/// Bucketed new-vs-returning customer counts.
pub fn customer_attendance_report(
    range: TimeRange,
    granularity: Granularity,
    events: &[Event],
    identities: &HashMap<String, Entity>,
    generated_at: DateTime<Utc>,
) -> AttendanceReport<CustomerBucket> {
    let blocks = generate_time_blocks(range.start, range.due, granularity);
    let first_seen = Entity::first_seen_index(identities.values());
    let summary = classify(events, &first_seen, &blocks);

    let results = summary
        .blocks
        .iter()
        .map(|c| CustomerBucket {
            time_range: c.block,
            count: c.total,
            new_customer: c.new,
            old_customer: c.returning,
        })
        .collect();

    tracing::info!(
        granularity = %granularity,
        events = events.len(),
        total_count = summary.total_count,
        total_new = summary.total_new,
        "Built customer attendance report"
    );

    AttendanceReport {
        results,
        metadata: AttendanceMetadata {
            total_count: summary.total_count,
            total_new_customer: Some(summary.total_new),
            last_updated: generated_at,
            base_time: granularity,
        },
    }
}

/// Bucketed counts of staff, and of staff appearing for the first time.
pub fn employee_attendance_report(
    range: TimeRange,
    granularity: Granularity,
    events: &[Event],
    identities: &HashMap<String, Entity>,
    staff_label: &str,
    generated_at: DateTime<Utc>,
) -> AttendanceReport<EmployeeBucket> {
    let staff: HashMap<&str, &Entity> = identities
        .values()
        .filter(|e| e.has_label(staff_label))
        .map(|e| (e.id.as_str(), e))
        .collect();

    let summary = if events.is_empty() || staff.is_empty() {
        CohortSummary::default()
    } else {
        let staff_events: Vec<Event> = events
            .iter()
            .filter(|e| staff.contains_key(e.entity_id.as_str()))
            .cloned()
            .collect();
        let first_seen = Entity::first_seen_index(staff.values().copied());
        let blocks = generate_time_blocks(range.start, range.due, granularity);
        classify(&staff_events, &first_seen, &blocks)
    };

    let results = summary
        .blocks
        .iter()
        .map(|c| EmployeeBucket {
            time_range: c.block,
            count: c.total,
            new_appear_employees: c.new,
        })
        .collect();

    tracing::info!(
        granularity = %granularity,
        staff = staff.len(),
        distinct = summary.distinct_entities,
        "Built employee attendance report"
    );

    AttendanceReport {
        results,
        metadata: AttendanceMetadata {
            total_count: summary.distinct_entities,
            total_new_customer: None,
            last_updated: generated_at,
            base_time: granularity,
        },
    }
}
