//! Per-zone visit listings and per-entity visit history.

use chrono::{DateTime, Utc};
use serde::Serialize;
use std::collections::{BTreeMap, HashMap};

use crate::analytics::{view, EnrichedRecord, EnrichmentTables};
use crate::error::Result;
use crate::format::{days_since, format_visit_time};
use crate::params::{HistoryRequest, ListingRequest};
use crate::types::{Entity, Event, GroupedRecord, Sensor, TimeRange, Zone};

use super::sources_in_zones;

/// Count events per entity per zone.
///
/// Zones are visited in the order given; within a zone, records come out
/// by entity id. An entity seen in two zones yields two records. Only
/// events inside `range` (both ends inclusive) are counted.
pub fn group_visits(
    events: &[Event],
    sensors: &[Sensor],
    zone_ids: &[String],
    range: TimeRange,
) -> Vec<GroupedRecord> {
    let mut records = Vec::new();

    for zone_id in zone_ids {
        let sources = sources_in_zones(sensors, std::slice::from_ref(zone_id));
        if sources.is_empty() {
            tracing::debug!(zone_id = %zone_id, "Zone has no sensors");
            continue;
        }

        let mut counts: BTreeMap<&str, u64> = BTreeMap::new();
        for event in events {
            if sources.contains(event.source_id.as_str()) && range.contains(event.timestamp) {
                *counts.entry(event.entity_id.as_str()).or_default() += 1;
            }
        }

        records.extend(counts.into_iter().map(|(entity_id, visit_count)| GroupedRecord {
            entity_id: entity_id.to_string(),
            visit_count,
            group_id: Some(zone_id.clone()),
            extra: serde_json::Map::new(),
        }));
    }

    tracing::debug!(
        zones = zone_ids.len(),
        events = events.len(),
        records = records.len(),
        "Grouped visits"
    );
    records
}

/// Group raw events for the requested zones and return the sorted,
/// enriched cumulative listing.
pub fn visit_listing(
    request: &ListingRequest,
    events: &[Event],
    sensors: &[Sensor],
    zones: &HashMap<String, Zone>,
    identities: &HashMap<String, Entity>,
    now: DateTime<Utc>,
) -> Result<Vec<EnrichedRecord>> {
    let records = group_visits(events, sensors, &request.group_ids, request.range);
    let tables = EnrichmentTables {
        zones,
        identities,
        events,
        now,
    };
    view(
        &records,
        &request.sort_by,
        request.order,
        request.page,
        request.page_size,
        &tables,
    )
}

/// An event as shown in a visit history.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct VisitEvent {
    #[serde(rename = "face_id")]
    pub entity_id: String,
    #[serde(rename = "camera_id")]
    pub source_id: String,
    /// `%Y-%m-%d %H:%M:%S`
    pub timestamp: String,
    pub confidence: f64,
    #[serde(rename = "track_id", skip_serializing_if = "Option::is_none")]
    pub track_ref: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub event_id: Option<String>,
}

impl From<&Event> for VisitEvent {
    fn from(event: &Event) -> Self {
        Self {
            entity_id: event.entity_id.clone(),
            source_id: event.source_id.clone(),
            timestamp: format_visit_time(event.timestamp),
            confidence: event.confidence,
            track_ref: event.track_ref.clone(),
            event_id: event.event_id.clone(),
        }
    }
}

/// Visits inside one zone.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ZoneVisits {
    pub group_id: String,
    pub group_name: String,
    pub events: Vec<VisitEvent>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct VisitHistory {
    pub visit_count: u64,
    /// Whole days since the entity was last seen, -1 when unknown
    pub last_visit_days: i64,
    pub dates: Vec<ZoneVisits>,
}

/// One entity's visits in range, grouped per requested zone.
///
/// Requested zones missing from `zones` are skipped. Events are listed in
/// timestamp order.
pub fn visit_history(
    request: &HistoryRequest,
    zones: &HashMap<String, Zone>,
    sensors: &[Sensor],
    events: &[Event],
    identity: Option<&Entity>,
    now: DateTime<Utc>,
) -> VisitHistory {
    let mut dates = Vec::new();
    let mut visit_count = 0u64;

    for zone_id in &request.group_ids {
        let Some(zone) = zones.get(zone_id) else {
            tracing::debug!(zone_id = %zone_id, "Unknown zone in history request");
            continue;
        };
        let sources = sources_in_zones(sensors, std::slice::from_ref(zone_id));

        let mut visits: Vec<&Event> = events
            .iter()
            .filter(|e| {
                e.entity_id == request.entity_id
                    && sources.contains(e.source_id.as_str())
                    && request.range.contains(e.timestamp)
            })
            .collect();
        visits.sort_by_key(|e| e.timestamp);

        visit_count += visits.len() as u64;
        dates.push(ZoneVisits {
            group_id: zone.id.clone(),
            group_name: zone.name.clone(),
            events: visits.into_iter().map(VisitEvent::from).collect(),
        });
    }

    let last_visit_days = identity
        .and_then(|e| e.last_seen)
        .map(|seen| days_since(seen, now))
        .unwrap_or(-1);

    tracing::debug!(
        entity_id = %request.entity_id,
        zones = dates.len(),
        visit_count,
        "Built visit history"
    );

    VisitHistory {
        visit_count,
        last_visit_days,
        dates,
    }
}
