//! Sorted, paged visit listings.
//!
//! Takes pre-aggregated per-entity records, sorts them by a caller-chosen
//! field and returns a page. [`view`] returns the *cumulative* prefix up to
//! and including the requested page (`page_size * page` records), which is
//! what existing listing consumers expect. [`page_window`] returns only the
//! requested page.
//!
//! Only the returned records are enriched with zone names, identity details
//! and the tracker reference of the entity's last sighting.

use chrono::{DateTime, Utc};
use serde::Serialize;
use std::cmp::Ordering;
use std::collections::HashMap;

use crate::error::{Error, Result};
use crate::format::{days_since, format_visit_time};
use crate::types::{Entity, Event, GroupedRecord, SortOrder, Zone};

/// Lookup tables joined onto returned records. The caller fetches these;
/// the view never queries anything itself.
#[derive(Debug, Clone, Copy)]
pub struct EnrichmentTables<'a> {
    /// Zones by id
    pub zones: &'a HashMap<String, Zone>,
    /// Identities by id
    pub identities: &'a HashMap<String, Entity>,
    /// Events to search for each entity's last sighting
    pub events: &'a [Event],
    /// Reference instant for `last_visit_day_count`
    pub now: DateTime<Utc>,
}

/// A listing row: the grouped record plus joined display fields.
///
/// Field names match what listing consumers already read.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct EnrichedRecord {
    #[serde(rename = "_id")]
    pub entity_id: String,
    pub visit_count: u64,
    pub group_id: Option<String>,
    #[serde(rename = "groupName", skip_serializing_if = "Option::is_none")]
    pub group_name: Option<String>,
    #[serde(rename = "trackId", skip_serializing_if = "Option::is_none")]
    pub track_ref: Option<String>,
    #[serde(rename = "eventId", skip_serializing_if = "Option::is_none")]
    pub event_id: Option<String>,
    #[serde(rename = "label", skip_serializing_if = "Option::is_none")]
    pub labels: Option<Vec<String>>,
    #[serde(rename = "lastVisitDay", skip_serializing_if = "Option::is_none")]
    pub last_visit_day_count: Option<i64>,
    #[serde(rename = "lastVisitTime", skip_serializing_if = "Option::is_none")]
    pub last_visit: Option<String>,
    #[serde(rename = "fullName", skip_serializing_if = "Option::is_none")]
    pub full_name: Option<String>,
    #[serde(flatten)]
    pub extra: serde_json::Map<String, serde_json::Value>,
}

impl EnrichedRecord {
    /// Drop open fields that share a name with a listing field being
    /// written, so the joined value replaces the upstream one.
    fn drop_shadowed_extra(&mut self) {
        let written = [
            ("_id", true),
            ("visit_count", true),
            ("group_id", true),
            ("groupName", self.group_name.is_some()),
            ("trackId", self.track_ref.is_some()),
            ("eventId", self.event_id.is_some()),
            ("label", self.labels.is_some()),
            ("lastVisitDay", self.last_visit_day_count.is_some()),
            ("lastVisitTime", self.last_visit.is_some()),
            ("fullName", self.full_name.is_some()),
        ];
        for (key, is_written) in written {
            if is_written {
                self.extra.remove(key);
            }
        }
    }
}

/// A comparable sort value extracted from a record.
///
/// Values of different kinds order as bool < number < text < other.
#[derive(Debug, Clone, Copy)]
enum SortKey<'a> {
    Bool(bool),
    Int(i128),
    Float(f64),
    Text(&'a str),
    /// Arrays and objects: present, but all compare equal
    Other,
}

impl SortKey<'_> {
    fn rank(&self) -> u8 {
        match self {
            SortKey::Bool(_) => 0,
            SortKey::Int(_) | SortKey::Float(_) => 1,
            SortKey::Text(_) => 2,
            SortKey::Other => 3,
        }
    }

    fn as_f64(&self) -> f64 {
        match *self {
            SortKey::Int(i) => i as f64,
            SortKey::Float(f) => f,
            _ => 0.0,
        }
    }

    fn compare(&self, other: &Self) -> Ordering {
        match (self, other) {
            (SortKey::Bool(a), SortKey::Bool(b)) => a.cmp(b),
            (SortKey::Int(a), SortKey::Int(b)) => a.cmp(b),
            (SortKey::Text(a), SortKey::Text(b)) => a.cmp(b),
            (a, b) if a.rank() == 1 && b.rank() == 1 => a.as_f64().total_cmp(&b.as_f64()),
            (a, b) => a.rank().cmp(&b.rank()),
        }
    }

    fn from_json(value: &serde_json::Value) -> Option<SortKey<'_>> {
        use serde_json::Value;
        match value {
            Value::Null => None,
            Value::Bool(b) => Some(SortKey::Bool(*b)),
            Value::Number(n) => Some(match (n.as_i64(), n.as_u64()) {
                (Some(i), _) => SortKey::Int(i as i128),
                (None, Some(u)) => SortKey::Int(u as i128),
                _ => SortKey::Float(n.as_f64().unwrap_or(f64::NAN)),
            }),
            Value::String(s) => Some(SortKey::Text(s)),
            Value::Array(_) | Value::Object(_) => Some(SortKey::Other),
        }
    }
}

/// Extract the value of `field` from a record. Explicit JSON nulls count as
/// absent.
fn sort_key<'a>(record: &'a GroupedRecord, field: &str) -> Option<SortKey<'a>> {
    match field {
        "_id" | "entity_id" => Some(SortKey::Text(&record.entity_id)),
        "visit_count" => Some(SortKey::Int(record.visit_count as i128)),
        "group_id" => record.group_id.as_deref().map(SortKey::Text),
        other => record.extra.get(other).and_then(SortKey::from_json),
    }
}

/// Stable sort of `records` by `field`.
///
/// Fails with [`Error::MissingSortField`] if any record lacks the field.
/// Records with equal keys keep their input order in both directions.
pub fn sort_records<'a>(
    records: &'a [GroupedRecord],
    field: &str,
    order: SortOrder,
) -> Result<Vec<&'a GroupedRecord>> {
    let mut keyed = records
        .iter()
        .map(|record| {
            sort_key(record, field)
                .map(|key| (key, record))
                .ok_or_else(|| Error::MissingSortField {
                    field: field.to_string(),
                    entity_id: record.entity_id.clone(),
                })
        })
        .collect::<Result<Vec<_>>>()?;

    keyed.sort_by(|(a, _), (b, _)| match order {
        SortOrder::Asc => a.compare(b),
        SortOrder::Desc => b.compare(a),
    });

    Ok(keyed.into_iter().map(|(_, record)| record).collect())
}

fn check_page(page: usize, page_size: usize) -> Result<()> {
    if page == 0 {
        return Err(Error::InvalidParameter {
            name: "page".to_string(),
            expected: "a positive integer".to_string(),
        });
    }
    if page_size == 0 {
        return Err(Error::InvalidParameter {
            name: "page_size".to_string(),
            expected: "a positive integer".to_string(),
        });
    }
    Ok(())
}

/// Sort, take the cumulative prefix of `page_size * page` records, enrich.
///
/// Page 2 at size 3 returns the first six records, not records 4..6.
pub fn view(
    records: &[GroupedRecord],
    sort_field: &str,
    order: SortOrder,
    page: usize,
    page_size: usize,
    tables: &EnrichmentTables<'_>,
) -> Result<Vec<EnrichedRecord>> {
    check_page(page, page_size)?;
    let sorted = sort_records(records, sort_field, order)?;
    let end = page.saturating_mul(page_size).min(sorted.len());

    tracing::debug!(
        records = records.len(),
        sort_field,
        ?order,
        page,
        page_size,
        returned = end,
        "Built cumulative listing"
    );

    Ok(enrich_all(&sorted[..end], tables))
}

/// Sort, take only records `(page - 1) * page_size .. page * page_size`,
/// enrich.
pub fn page_window(
    records: &[GroupedRecord],
    sort_field: &str,
    order: SortOrder,
    page: usize,
    page_size: usize,
    tables: &EnrichmentTables<'_>,
) -> Result<Vec<EnrichedRecord>> {
    check_page(page, page_size)?;
    let sorted = sort_records(records, sort_field, order)?;
    let start = (page - 1).saturating_mul(page_size).min(sorted.len());
    let end = page.saturating_mul(page_size).min(sorted.len());

    tracing::debug!(
        records = records.len(),
        sort_field,
        ?order,
        page,
        page_size,
        returned = end - start,
        "Built page window"
    );

    Ok(enrich_all(&sorted[start..end], tables))
}

fn enrich_all(records: &[&GroupedRecord], tables: &EnrichmentTables<'_>) -> Vec<EnrichedRecord> {
    if records.is_empty() {
        return Vec::new();
    }

    // First event per (entity, timestamp) stands in for the store lookup by last_seen
    let mut sightings: HashMap<(&str, DateTime<Utc>), &Event> = HashMap::new();
    for event in tables.events {
        sightings
            .entry((event.entity_id.as_str(), event.timestamp))
            .or_insert(event);
    }

    records
        .iter()
        .map(|record| {
            let mut row = enrich(record, tables, &sightings);
            row.drop_shadowed_extra();
            row
        })
        .collect()
}

fn enrich(
    record: &GroupedRecord,
    tables: &EnrichmentTables<'_>,
    sightings: &HashMap<(&str, DateTime<Utc>), &Event>,
) -> EnrichedRecord {
    let mut row = EnrichedRecord {
        entity_id: record.entity_id.clone(),
        visit_count: record.visit_count,
        group_id: record.group_id.clone(),
        group_name: record
            .group_id
            .as_ref()
            .and_then(|id| tables.zones.get(id))
            .map(|zone| zone.name.clone()),
        track_ref: None,
        event_id: None,
        labels: None,
        last_visit_day_count: None,
        last_visit: None,
        full_name: None,
        extra: record.extra.clone(),
    };

    let Some(identity) = tables.identities.get(&record.entity_id) else {
        tracing::debug!(entity_id = %record.entity_id, "No identity for listing row");
        return row;
    };

    row.labels = Some(identity.labels.clone());
    row.full_name = identity.username.clone();

    if let Some(last_seen) = identity.last_seen {
        row.last_visit_day_count = Some(days_since(last_seen, tables.now));
        row.last_visit = Some(format_visit_time(last_seen));

        match sightings.get(&(record.entity_id.as_str(), last_seen)) {
            Some(event) => {
                row.track_ref = event.track_ref.clone();
                row.event_id = event.event_id.clone();
            }
            None => tracing::warn!(
                entity_id = %record.entity_id,
                %last_seen,
                "No event matches the entity's last sighting"
            ),
        }
    }

    row
}
