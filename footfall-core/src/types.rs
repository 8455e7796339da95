//! Core domain types for footfall
//!
//! These types mirror the documents the recognition pipeline writes to the
//! document store. The engine only ever reads them.
//!
//! ## Terminology
//!
//! | Term | Definition |
//! |------|------------|
//! | **Entity** | A recognized identity (customer or employee) |
//! | **Event** | One recognition of an Entity by a Sensor at a point in time |
//! | **Sensor** | A camera; every sensor belongs to exactly one Zone |
//! | **Zone** | A named group of sensors (an entrance, a floor, a shop) |
//! | **Granularity** | The bucket unit of a time-bucketed report |
//!
//! Store documents use the recognition pipeline's field names (`face_id`,
//! `camera_id`, `track_id`, `group_id`); those are accepted as serde aliases.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;

use crate::error::{Error, Result};
use crate::format::utc_timestamp;

// ============================================
// Identities
// ============================================

/// A recognized identity.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Entity {
    /// Unique identifier assigned by identity resolution
    #[serde(alias = "face_id")]
    pub id: String,
    /// Display name, when one has been assigned
    #[serde(default)]
    pub username: Option<String>,
    /// First recognition ever, across all sensors
    #[serde(default, with = "utc_timestamp::option")]
    pub first_seen: Option<DateTime<Utc>>,
    /// Most recent recognition
    #[serde(default, with = "utc_timestamp::option")]
    pub last_seen: Option<DateTime<Utc>>,
    /// Free-form tags ("staff", "vip", ...)
    #[serde(default)]
    pub labels: Vec<String>,
    /// Open attribute bag (age, gender, contact details, ...)
    #[serde(default)]
    pub metadata: serde_json::Map<String, serde_json::Value>,
}

impl Entity {
    /// Create an entity with no timestamps, labels or metadata.
    pub fn new(id: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            username: None,
            first_seen: None,
            last_seen: None,
            labels: Vec::new(),
            metadata: serde_json::Map::new(),
        }
    }

    /// Returns true if the entity carries `label`.
    pub fn has_label(&self, label: &str) -> bool {
        self.labels.iter().any(|l| l == label)
    }

    /// Index entities by id. Later duplicates replace earlier ones.
    pub fn index(entities: impl IntoIterator<Item = Entity>) -> HashMap<String, Entity> {
        entities.into_iter().map(|e| (e.id.clone(), e)).collect()
    }

    /// Build the `first_seen` lookup used by cohort classification.
    ///
    /// Entities without a recorded first sighting are left out.
    pub fn first_seen_index<'a>(
        entities: impl IntoIterator<Item = &'a Entity>,
    ) -> HashMap<String, DateTime<Utc>> {
        entities
            .into_iter()
            .filter_map(|e| e.first_seen.map(|ts| (e.id.clone(), ts)))
            .collect()
    }
}

// ============================================
// Events and sensors
// ============================================

/// One recognition occurrence.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Event {
    /// The recognized entity
    #[serde(alias = "face_id")]
    pub entity_id: String,
    /// Sensor that produced the recognition
    #[serde(alias = "camera_id")]
    pub source_id: String,
    /// When the recognition happened (UTC)
    #[serde(with = "utc_timestamp")]
    pub timestamp: DateTime<Utc>,
    /// Match confidence reported by the recognizer
    #[serde(default)]
    pub confidence: f64,
    /// Opaque tracker reference
    #[serde(default, alias = "track_id")]
    pub track_ref: Option<String>,
    /// Opaque event identifier
    #[serde(default)]
    pub event_id: Option<String>,
}

impl Event {
    /// Create an event with full confidence and no tracker references.
    pub fn new(
        entity_id: impl Into<String>,
        source_id: impl Into<String>,
        timestamp: DateTime<Utc>,
    ) -> Self {
        Self {
            entity_id: entity_id.into(),
            source_id: source_id.into(),
            timestamp,
            confidence: 1.0,
            track_ref: None,
            event_id: None,
        }
    }
}

/// A camera and the zone it belongs to.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Sensor {
    #[serde(alias = "camera_id")]
    pub id: String,
    pub group_id: String,
}

/// A named group of sensors.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Zone {
    #[serde(alias = "group_id")]
    pub id: String,
    pub name: String,
}

impl Zone {
    /// Index zones by id.
    pub fn index(zones: impl IntoIterator<Item = Zone>) -> HashMap<String, Zone> {
        zones.into_iter().map(|z| (z.id.clone(), z)).collect()
    }
}

/// A pre-aggregated per-entity record (one row of a "count visits per
/// entity" grouping over events).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GroupedRecord {
    #[serde(rename = "_id", alias = "entity_id")]
    pub entity_id: String,
    pub visit_count: u64,
    #[serde(default)]
    pub group_id: Option<String>,
    /// Any further fields produced by the grouping
    #[serde(flatten)]
    pub extra: serde_json::Map<String, serde_json::Value>,
}

// ============================================
// Query parameters
// ============================================

/// Bucket unit for time-bucketed reports.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Granularity {
    Hourly,
    Daily,
    Weekly,
    Monthly,
    Yearly,
}

impl Granularity {
    /// Every supported granularity, shortest first.
    pub const ALL: [Granularity; 5] = [
        Granularity::Hourly,
        Granularity::Daily,
        Granularity::Weekly,
        Granularity::Monthly,
        Granularity::Yearly,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            Granularity::Hourly => "hourly",
            Granularity::Daily => "daily",
            Granularity::Weekly => "weekly",
            Granularity::Monthly => "monthly",
            Granularity::Yearly => "yearly",
        }
    }

    /// Comma-separated list of accepted names, for error messages.
    pub fn allowed() -> String {
        Self::ALL
            .iter()
            .map(|g| g.as_str())
            .collect::<Vec<_>>()
            .join(", ")
    }
}

impl std::fmt::Display for Granularity {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

impl std::str::FromStr for Granularity {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        Self::ALL
            .into_iter()
            .find(|g| g.as_str() == s)
            .ok_or_else(|| Error::InvalidGranularity {
                value: s.to_string(),
                allowed: Self::allowed(),
            })
    }
}

/// Sort direction for sorted views.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SortOrder {
    #[default]
    Asc,
    Desc,
}

impl std::str::FromStr for SortOrder {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        match s {
            "asc" => Ok(SortOrder::Asc),
            "desc" => Ok(SortOrder::Desc),
            _ => Err(Error::InvalidParameter {
                name: "order".to_string(),
                expected: "one of asc, desc".to_string(),
            }),
        }
    }
}

/// A validated query range. `start` is inclusive; whether `due` is included
/// depends on the consumer.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TimeRange {
    pub start: DateTime<Utc>,
    pub due: DateTime<Utc>,
}

impl TimeRange {
    pub fn new(start: DateTime<Utc>, due: DateTime<Utc>) -> Self {
        Self { start, due }
    }

    /// Closed-range membership, matching a `$gte`/`$lte` store query.
    pub fn contains(&self, ts: DateTime<Utc>) -> bool {
        self.start <= ts && ts <= self.due
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;
    use serde_json::json;

    #[test]
    fn test_granularity_round_trip_names() {
        for g in Granularity::ALL {
            assert_eq!(g.as_str().parse::<Granularity>().unwrap(), g);
        }
    }

    #[test]
    fn test_granularity_rejects_unknown() {
        let err = "fortnightly".parse::<Granularity>().unwrap_err();
        match err {
            Error::InvalidGranularity { value, allowed } => {
                assert_eq!(value, "fortnightly");
                assert_eq!(allowed, "hourly, daily, weekly, monthly, yearly");
            }
            other => panic!("unexpected error: {other:?}"),
        }
    }

    #[test]
    fn test_entity_from_store_document() {
        let doc = json!({
            "face_id": "F-1",
            "username": "Lan",
            "first_seen": "2025-02-16T08:00:00",
            "last_seen": "2025-02-17T09:30:00Z",
            "labels": ["staff"],
            "metadata": {"age": 41, "gender": 1}
        });
        let entity: Entity = serde_json::from_value(doc).unwrap();
        assert_eq!(entity.id, "F-1");
        assert!(entity.has_label("staff"));
        assert_eq!(
            entity.first_seen,
            Some(Utc.with_ymd_and_hms(2025, 2, 16, 8, 0, 0).unwrap())
        );
        assert_eq!(entity.metadata["age"], json!(41));
    }

    #[test]
    fn test_entity_missing_first_seen() {
        let entity: Entity = serde_json::from_value(json!({"id": "F-9"})).unwrap();
        assert!(entity.first_seen.is_none());
        assert!(Entity::first_seen_index([&entity]).is_empty());
    }

    #[test]
    fn test_event_from_store_document() {
        let doc = json!({
            "face_id": "F-1",
            "camera_id": "CAM-2",
            "timestamp": "2025-02-17T09:30:00+07:00",
            "confidence": 0.93,
            "track_id": "T-7"
        });
        let event: Event = serde_json::from_value(doc).unwrap();
        assert_eq!(event.source_id, "CAM-2");
        assert_eq!(
            event.timestamp,
            Utc.with_ymd_and_hms(2025, 2, 17, 2, 30, 0).unwrap()
        );
        assert_eq!(event.track_ref.as_deref(), Some("T-7"));
    }

    #[test]
    fn test_grouped_record_keeps_extra_fields() {
        let doc = json!({"_id": "F-3", "visit_count": 4, "group_id": "CG-1", "score": 7});
        let record: GroupedRecord = serde_json::from_value(doc).unwrap();
        assert_eq!(record.entity_id, "F-3");
        assert_eq!(record.extra["score"], json!(7));
    }

    #[test]
    fn test_sort_order_parse() {
        assert_eq!("desc".parse::<SortOrder>().unwrap(), SortOrder::Desc);
        assert!("up".parse::<SortOrder>().is_err());
    }
}
