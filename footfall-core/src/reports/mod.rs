//! Report assembly on top of the analytics engine.
//!
//! Each report takes collections the caller has already fetched (usually
//! events restricted to the requested zones and time range, plus the
//! identities those events reference) and returns a serializable structure
//! whose JSON shape matches what dashboard consumers read.
//!
//! Reports never read the clock: `generated_at` / `now` are parameters.

pub mod attendance;
pub mod profile;
pub mod top;
pub mod visits;

use std::collections::HashSet;

use crate::types::{Event, Sensor};

pub use attendance::{
    customer_attendance_report, employee_attendance_report, AttendanceMetadata, AttendanceReport,
    CustomerBucket, EmployeeBucket,
};
pub use profile::{identity_profile, lookup_profile};
pub use top::{top_customers_report, TopCustomerRow, TopCustomersMetadata, TopCustomersReport};
pub use visits::{group_visits, visit_history, visit_listing, VisitEvent, VisitHistory, ZoneVisits};

/// Ids of the sensors that belong to any of `group_ids`.
pub fn sources_in_zones<'a>(sensors: &'a [Sensor], group_ids: &[String]) -> HashSet<&'a str> {
    sensors
        .iter()
        .filter(|s| group_ids.contains(&s.group_id))
        .map(|s| s.id.as_str())
        .collect()
}

/// Keep only events recorded by one of `sources`.
pub fn events_from_sources(events: &[Event], sources: &HashSet<&str>) -> Vec<Event> {
    events
        .iter()
        .filter(|e| sources.contains(e.source_id.as_str()))
        .cloned()
        .collect()
}
