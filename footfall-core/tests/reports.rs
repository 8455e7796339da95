//! Integration tests for report assembly
//!
//! These tests load a small site from `tests/fixtures/site.json` (store
//! documents with their original field names), validate request parameter
//! maps, and check the JSON produced by each report.

use chrono::{DateTime, TimeZone, Utc};
use footfall_core::config::ReportsConfig;
use footfall_core::params::{AttendanceRequest, HistoryRequest, LeaderboardRequest, ListingRequest};
use footfall_core::reports::{
    customer_attendance_report, employee_attendance_report, events_from_sources, lookup_profile,
    sources_in_zones, top_customers_report, visit_history, visit_listing,
};
use footfall_core::{Entity, Error, Event, Sensor, Zone};
use serde::Deserialize;
use serde_json::{json, Map, Value};
use std::collections::HashMap;
use std::path::PathBuf;

#[derive(Deserialize)]
struct Site {
    zones: Vec<Zone>,
    sensors: Vec<Sensor>,
    identities: Vec<Entity>,
    events: Vec<Event>,
}

/// Get the path to a fixture file
fn fixture_path(name: &str) -> PathBuf {
    PathBuf::from(env!("CARGO_MANIFEST_DIR"))
        .join("tests/fixtures")
        .join(name)
}

fn load_site() -> Site {
    footfall_core::logging::init_test();
    let raw = std::fs::read_to_string(fixture_path("site.json")).unwrap();
    serde_json::from_str(&raw).unwrap()
}

fn params(value: Value) -> Map<String, Value> {
    match value {
        Value::Object(map) => map,
        other => panic!("expected an object, got {other}"),
    }
}

fn generated_at() -> DateTime<Utc> {
    Utc.with_ymd_and_hms(2025, 2, 20, 12, 0, 0).unwrap()
}

fn attendance_params() -> Map<String, Value> {
    params(json!({
        "param_startTime": "2025-02-17T00:00:00Z",
        "param_dueTime": "2025-02-19T00:00:00Z",
        "param_groupIds": ["CG-1", "CG-2"],
        "param_baseTime": "daily"
    }))
}

// ============================================
// Fixture loading
// ============================================

#[test]
fn test_fixture_deserializes_store_field_names() {
    let site = load_site();
    assert_eq!(site.identities.len(), 4);
    assert_eq!(site.events.len(), 8);

    // Naive timestamps are read as UTC
    let naive = &site.events[4];
    assert_eq!(naive.entity_id, "S-1");
    assert_eq!(naive.timestamp, Utc.with_ymd_and_hms(2025, 2, 18, 8, 5, 0).unwrap());
    assert_eq!(naive.track_ref.as_deref(), Some("T-5"));
    assert_eq!(site.sensors[2].id, "CAM-3");
    assert_eq!(site.zones[1].id, "CG-2");
}

// ============================================
// Attendance Tests
// ============================================

#[test]
fn test_customer_attendance_daily() {
    let site = load_site();
    let request =
        AttendanceRequest::from_params(&attendance_params(), &ReportsConfig::default()).unwrap();
    let sources = sources_in_zones(&site.sensors, &request.group_ids);
    let events = events_from_sources(&site.events, &sources);
    let identities = Entity::index(site.identities);

    let report = customer_attendance_report(
        request.range,
        request.granularity,
        &events,
        &identities,
        generated_at(),
    );

    assert_eq!(
        serde_json::to_value(&report).unwrap(),
        json!({
            "results": [
                {
                    "time_range": {"from": "2025-02-17T00:00:00+00:00", "to": "2025-02-18T00:00:00+00:00"},
                    "count": 3,
                    "new_customer": 1,
                    "old_customer": 2
                },
                {
                    "time_range": {"from": "2025-02-18T00:00:00+00:00", "to": "2025-02-19T00:00:00+00:00"},
                    "count": 4,
                    "new_customer": 1,
                    "old_customer": 3
                }
            ],
            "metadata": {
                "total_count": 7,
                "total_new_customer": 2,
                "last_updated": "2025-02-20T12:00:00+00:00",
                "base_time": "daily"
            }
        })
    );
}

#[test]
fn test_employee_attendance_daily() {
    let site = load_site();
    let config = ReportsConfig::default();
    let request = AttendanceRequest::from_params(&attendance_params(), &config).unwrap();
    let identities = Entity::index(site.identities);

    let report = employee_attendance_report(
        request.range,
        request.granularity,
        &site.events,
        &identities,
        &config.staff_label,
        generated_at(),
    );

    let value = serde_json::to_value(&report).unwrap();
    assert_eq!(value["results"][0]["count"], json!(1));
    assert_eq!(value["results"][0]["new_appear_employees"], json!(0));
    assert_eq!(value["results"][1]["count"], json!(2));
    assert_eq!(value["results"][1]["new_appear_employees"], json!(1));
    assert_eq!(value["metadata"]["total_count"], json!(2));
    assert!(value["metadata"].get("total_new_customer").is_none());
}

#[test]
fn test_attendance_rejects_unknown_granularity() {
    let mut raw = attendance_params();
    raw.insert("param_baseTime".into(), json!("fortnightly"));

    let err = AttendanceRequest::from_params(&raw, &ReportsConfig::default()).unwrap_err();
    match err {
        Error::InvalidGranularity { value, allowed } => {
            assert_eq!(value, "fortnightly");
            assert!(allowed.contains("hourly"));
        }
        other => panic!("unexpected error: {other}"),
    }
}

#[test]
fn test_missing_parameters_reported_together() {
    let err = AttendanceRequest::from_params(&Map::new(), &ReportsConfig::default()).unwrap_err();
    match err {
        Error::MissingParameter(keys) => {
            assert_eq!(keys, "param_startTime, param_dueTime, param_groupIds");
        }
        other => panic!("unexpected error: {other}"),
    }
}

// ============================================
// Top Customers Tests
// ============================================

#[test]
fn test_top_customers_from_params() {
    let site = load_site();
    let mut raw = attendance_params();
    raw.insert("param_limit".into(), json!("2"));
    let request = LeaderboardRequest::from_params(&raw, &ReportsConfig::default()).unwrap();
    let identities = Entity::index(site.identities);

    let report = top_customers_report(
        request.range.start,
        &site.events,
        &identities,
        request.limit,
        generated_at(),
    )
    .unwrap();

    assert_eq!(
        serde_json::to_value(&report).unwrap(),
        json!({
            "results": [
                {
                    "user_id": "F-1",
                    "name": "Linh",
                    "age": 34,
                    "gender": 1,
                    "visits": {"count": 3, "days": 2},
                    "last_visit": "2025-02-18T17:30:00+00:00"
                },
                {
                    "user_id": "F-2",
                    "name": "Unknown",
                    "age": 30,
                    "gender": 0,
                    "visits": {"count": 2, "days": 2},
                    "last_visit": "2025-02-18T10:00:00+00:00"
                }
            ],
            "metadata": {
                "current_month": "2025-02-01T00:00:00+00:00",
                "last_updated": "2025-02-20T12:00:00+00:00",
                "has_more": true,
                "limit": 2
            }
        })
    );
}

#[test]
fn test_top_customers_default_limit() {
    let site = load_site();
    let request =
        LeaderboardRequest::from_params(&attendance_params(), &ReportsConfig::default()).unwrap();
    assert_eq!(request.limit, 5);

    let identities = Entity::index(site.identities);
    let report = top_customers_report(
        request.range.start,
        &site.events,
        &identities,
        request.limit,
        generated_at(),
    )
    .unwrap();
    assert_eq!(report.results.len(), 4);
    assert!(!report.metadata.has_more);
}

#[test]
fn test_top_customers_negative_limit() {
    let site = load_site();
    let mut raw = attendance_params();
    raw.insert("param_limit".into(), json!(-3));
    let request = LeaderboardRequest::from_params(&raw, &ReportsConfig::default()).unwrap();

    let err = top_customers_report(
        request.range.start,
        &site.events,
        &HashMap::new(),
        request.limit,
        generated_at(),
    )
    .unwrap_err();
    assert!(matches!(err, Error::InvalidLimit(-3)));
}

// ============================================
// Listing Tests
// ============================================

#[test]
fn test_visit_listing_first_page() {
    let site = load_site();
    let raw = params(json!({
        "visitDateFrom": "2025-02-17T00:00:00Z",
        "visitDateTo": "2025-02-19T00:00:00Z",
        "groupIds": "CG-1",
        "sortBy": "visit_count",
        "order": "desc",
        "page": 1,
        "pageSize": "2"
    }));
    let request = ListingRequest::from_params(&raw, &ReportsConfig::default()).unwrap();
    let zones = Zone::index(site.zones);
    let identities = Entity::index(site.identities);

    let rows = visit_listing(
        &request,
        &site.events,
        &site.sensors,
        &zones,
        &identities,
        generated_at(),
    )
    .unwrap();

    assert_eq!(
        serde_json::to_value(&rows).unwrap(),
        json!([
            {
                "_id": "F-1",
                "visit_count": 2,
                "group_id": "CG-1",
                "groupName": "Lobby",
                "trackId": "T-8",
                "eventId": "E-8",
                "label": ["vip"],
                "lastVisitDay": 1,
                "lastVisitTime": "2025-02-18 17:30:00",
                "fullName": "Linh"
            },
            {
                "_id": "S-1",
                "visit_count": 2,
                "group_id": "CG-1",
                "groupName": "Lobby",
                "trackId": "T-5",
                "eventId": "E-5",
                "label": ["staff"],
                "lastVisitDay": 2,
                "lastVisitTime": "2025-02-18 08:05:00",
                "fullName": "Quan"
            }
        ])
    );
}

#[test]
fn test_visit_listing_second_page_is_cumulative() {
    let site = load_site();
    let raw = params(json!({
        "visitDateFrom": "2025-02-17T00:00:00Z",
        "visitDateTo": "2025-02-19T00:00:00Z",
        "groupIds": ["CG-1"],
        "sortBy": "visit_count",
        "order": "desc",
        "page": 2,
        "pageSize": 2
    }));
    let request = ListingRequest::from_params(&raw, &ReportsConfig::default()).unwrap();
    let zones = Zone::index(site.zones);
    let identities = Entity::index(site.identities);

    let rows = visit_listing(
        &request,
        &site.events,
        &site.sensors,
        &zones,
        &identities,
        generated_at(),
    )
    .unwrap();

    let ids: Vec<_> = rows.iter().map(|r| r.entity_id.as_str()).collect();
    assert_eq!(ids, vec!["F-1", "S-1", "F-2", "S-2"]);
    assert!(rows[2].full_name.is_none());
}

#[test]
fn test_visit_listing_unknown_sort_field() {
    let site = load_site();
    let raw = params(json!({
        "visitDateFrom": "2025-02-17T00:00:00Z",
        "visitDateTo": "2025-02-19T00:00:00Z",
        "groupIds": ["CG-2"],
        "sortBy": "dwell_time"
    }));
    let request = ListingRequest::from_params(&raw, &ReportsConfig::default()).unwrap();

    let err = visit_listing(
        &request,
        &site.events,
        &site.sensors,
        &Zone::index(site.zones),
        &HashMap::new(),
        generated_at(),
    )
    .unwrap_err();
    assert!(matches!(err, Error::MissingSortField { ref field, .. } if field == "dwell_time"));
}

// ============================================
// History and Profile Tests
// ============================================

#[test]
fn test_visit_history_for_entity() {
    let site = load_site();
    let raw = params(json!({
        "id": "F-2",
        "groupIds": ["CG-1", "CG-2"],
        "visitDateFrom": "2025-02-17T00:00:00",
        "visitDateTo": "2025-02-19T00:00:00"
    }));
    let request = HistoryRequest::from_params(&raw).unwrap();
    let zones = Zone::index(site.zones);
    let identities = Entity::index(site.identities);

    let history = visit_history(
        &request,
        &zones,
        &site.sensors,
        &site.events,
        identities.get(&request.entity_id),
        generated_at(),
    );

    assert_eq!(
        serde_json::to_value(&history).unwrap(),
        json!({
            "visitCount": 2,
            "lastVisitDays": 2,
            "dates": [
                {
                    "groupId": "CG-1",
                    "groupName": "Lobby",
                    "events": [{
                        "face_id": "F-2",
                        "camera_id": "CAM-1",
                        "timestamp": "2025-02-17 09:15:00",
                        "confidence": 0.91,
                        "track_id": "T-2",
                        "event_id": "E-2"
                    }]
                },
                {
                    "groupId": "CG-2",
                    "groupName": "Cafe",
                    "events": [{
                        "face_id": "F-2",
                        "camera_id": "CAM-3",
                        "timestamp": "2025-02-18 10:00:00",
                        "confidence": 0.9,
                        "track_id": "T-7",
                        "event_id": "E-7"
                    }]
                }
            ]
        })
    );
}

#[test]
fn test_identity_profile() {
    let site = load_site();
    let identities = Entity::index(site.identities);

    assert_eq!(
        Value::Object(lookup_profile("S-1", &identities)),
        json!({
            "face_id": "S-1",
            "username": "Quan",
            "tags": ["staff"],
            "department": "front desk"
        })
    );
    assert!(lookup_profile("F-404", &identities).is_empty());
}
