//! Request parameter validation shared by every report.
//!
//! Report requests arrive as loosely-typed JSON maps. [`RequestParams`]
//! performs presence and type checks once, and the typed request structs
//! ([`AttendanceRequest`], [`LeaderboardRequest`], [`ListingRequest`],
//! [`HistoryRequest`]) apply configured defaults so the engine only ever
//! sees validated values.

use chrono::{DateTime, Utc};
use serde_json::{Map, Value};

use crate::config::ReportsConfig;
use crate::error::{Error, Result};
use crate::format::parse_timestamp;
use crate::types::{Granularity, SortOrder, TimeRange};

/// Read-only view over a request's parameter map.
#[derive(Debug, Clone, Copy)]
pub struct RequestParams<'a> {
    raw: &'a Map<String, Value>,
}

fn invalid(name: &str, expected: &str) -> Error {
    Error::InvalidParameter {
        name: name.to_string(),
        expected: expected.to_string(),
    }
}

impl<'a> RequestParams<'a> {
    pub fn new(raw: &'a Map<String, Value>) -> Self {
        Self { raw }
    }

    /// Fail with every absent key listed, in the order given.
    pub fn require(&self, keys: &[&str]) -> Result<()> {
        let missing: Vec<&str> = keys
            .iter()
            .copied()
            .filter(|key| !self.raw.contains_key(*key))
            .collect();
        if missing.is_empty() {
            Ok(())
        } else {
            Err(Error::MissingParameter(missing.join(", ")))
        }
    }

    /// Value for `key`, treating JSON null as absent.
    pub fn get(&self, key: &str) -> Option<&'a Value> {
        self.raw.get(key).filter(|v| !v.is_null())
    }

    pub fn string(&self, key: &str) -> Result<&'a str> {
        match self.get(key) {
            Some(Value::String(s)) => Ok(s.as_str()),
            Some(_) => Err(invalid(key, "a string")),
            None => Err(Error::MissingParameter(key.to_string())),
        }
    }

    /// Parse an ISO 8601 timestamp parameter into UTC.
    pub fn timestamp(&self, key: &str) -> Result<DateTime<Utc>> {
        let raw = self.string(key).map_err(|e| match e {
            Error::InvalidParameter { .. } => {
                Error::InvalidTimeRange(format!("{} must be an ISO 8601 string", key))
            }
            other => other,
        })?;
        parse_timestamp(raw).map_err(|e| Error::InvalidTimeRange(format!("{}: {}", key, e)))
    }

    pub fn time_range(&self, start_key: &str, due_key: &str) -> Result<TimeRange> {
        Ok(TimeRange::new(self.timestamp(start_key)?, self.timestamp(due_key)?))
    }

    pub fn granularity(&self, key: &str) -> Result<Granularity> {
        self.string(key)?.parse()
    }

    /// Like [`granularity`](Self::granularity), but absent means `default`.
    pub fn granularity_or(&self, key: &str, default: Granularity) -> Result<Granularity> {
        match self.get(key) {
            Some(_) => self.granularity(key),
            None => Ok(default),
        }
    }

    /// Integer parameter given as a JSON number or a numeric string.
    fn integer(&self, key: &str) -> Result<Option<i64>> {
        match self.get(key) {
            None => Ok(None),
            Some(Value::Number(n)) => n
                .as_i64()
                .map(Some)
                .ok_or_else(|| invalid(key, "an integer")),
            Some(Value::String(s)) => s
                .trim()
                .parse::<i64>()
                .map(Some)
                .map_err(|_| invalid(key, "an integer")),
            Some(_) => Err(invalid(key, "an integer")),
        }
    }

    /// Leaderboard size; absent means `default`. Sign is checked by the
    /// ranker, which reports [`Error::InvalidLimit`].
    pub fn limit(&self, key: &str, default: i64) -> Result<i64> {
        Ok(self.integer(key)?.unwrap_or(default))
    }

    /// Strictly positive integer; absent means `default`.
    pub fn positive(&self, key: &str, default: usize) -> Result<usize> {
        match self.integer(key)? {
            None => Ok(default),
            Some(n) if n > 0 => usize::try_from(n).map_err(|_| invalid(key, "a positive integer")),
            Some(_) => Err(invalid(key, "a positive integer")),
        }
    }

    /// List of ids given as a JSON array of strings or a comma-separated
    /// string. Absent means empty.
    pub fn string_list(&self, key: &str) -> Result<Vec<String>> {
        match self.get(key) {
            None => Ok(Vec::new()),
            Some(Value::Array(items)) => items
                .iter()
                .map(|item| {
                    item.as_str()
                        .map(str::to_string)
                        .ok_or_else(|| invalid(key, "a list of strings"))
                })
                .collect(),
            Some(Value::String(s)) => Ok(s
                .split(',')
                .map(str::trim)
                .filter(|part| !part.is_empty())
                .map(str::to_string)
                .collect()),
            Some(_) => Err(invalid(key, "a list of strings")),
        }
    }

    pub fn sort_order(&self, key: &str, default: SortOrder) -> Result<SortOrder> {
        match self.get(key) {
            None => Ok(default),
            Some(_) => self.string(key)?.parse().map_err(|_| invalid(key, "one of asc, desc")),
        }
    }
}

// ============================================
// Typed requests
// ============================================

/// Parameters of the bucketed customer and employee reports.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AttendanceRequest {
    pub range: TimeRange,
    pub granularity: Granularity,
    pub group_ids: Vec<String>,
}

impl AttendanceRequest {
    pub const START: &'static str = "param_startTime";
    pub const DUE: &'static str = "param_dueTime";
    pub const GRANULARITY: &'static str = "param_baseTime";
    pub const GROUPS: &'static str = "param_groupIds";

    pub fn from_params(raw: &Map<String, Value>, defaults: &ReportsConfig) -> Result<Self> {
        let params = RequestParams::new(raw);
        params.require(&[Self::START, Self::DUE, Self::GROUPS])?;
        Ok(Self {
            range: params.time_range(Self::START, Self::DUE)?,
            granularity: params.granularity_or(Self::GRANULARITY, defaults.default_granularity)?,
            group_ids: params.string_list(Self::GROUPS)?,
        })
    }
}

/// Parameters of the top-customers report.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LeaderboardRequest {
    pub range: TimeRange,
    pub group_ids: Vec<String>,
    pub limit: i64,
}

impl LeaderboardRequest {
    pub const LIMIT: &'static str = "param_limit";

    pub fn from_params(raw: &Map<String, Value>, defaults: &ReportsConfig) -> Result<Self> {
        let params = RequestParams::new(raw);
        params.require(&[
            AttendanceRequest::START,
            AttendanceRequest::DUE,
            AttendanceRequest::GROUPS,
        ])?;
        // Granularity is accepted for parity with the bucketed reports but unused
        params.granularity_or(AttendanceRequest::GRANULARITY, defaults.default_granularity)?;
        Ok(Self {
            range: params.time_range(AttendanceRequest::START, AttendanceRequest::DUE)?,
            group_ids: params.string_list(AttendanceRequest::GROUPS)?,
            limit: params.limit(Self::LIMIT, defaults.default_limit)?,
        })
    }
}

/// Parameters of the paged visit listing.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ListingRequest {
    pub range: TimeRange,
    pub group_ids: Vec<String>,
    pub sort_by: String,
    pub order: SortOrder,
    pub page: usize,
    pub page_size: usize,
}

impl ListingRequest {
    pub const FROM: &'static str = "visitDateFrom";
    pub const TO: &'static str = "visitDateTo";
    pub const GROUPS: &'static str = "groupIds";
    pub const SORT_BY: &'static str = "sortBy";
    pub const ORDER: &'static str = "order";
    pub const PAGE: &'static str = "page";
    pub const PAGE_SIZE: &'static str = "pageSize";

    pub fn from_params(raw: &Map<String, Value>, defaults: &ReportsConfig) -> Result<Self> {
        let params = RequestParams::new(raw);
        params.require(&[Self::FROM, Self::TO, Self::SORT_BY])?;
        Ok(Self {
            range: params.time_range(Self::FROM, Self::TO)?,
            group_ids: params.string_list(Self::GROUPS)?,
            sort_by: params.string(Self::SORT_BY)?.to_string(),
            order: params.sort_order(Self::ORDER, SortOrder::Asc)?,
            page: params.positive(Self::PAGE, 1)?,
            page_size: params.positive(Self::PAGE_SIZE, defaults.default_page_size)?,
        })
    }
}

/// Parameters of the per-entity visit history.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct HistoryRequest {
    pub entity_id: String,
    pub range: TimeRange,
    pub group_ids: Vec<String>,
}

impl HistoryRequest {
    pub const ID: &'static str = "id";

    pub fn from_params(raw: &Map<String, Value>) -> Result<Self> {
        let params = RequestParams::new(raw);
        params.require(&[
            Self::ID,
            ListingRequest::GROUPS,
            ListingRequest::FROM,
            ListingRequest::TO,
        ])?;
        Ok(Self {
            entity_id: params.string(Self::ID)?.to_string(),
            range: params.time_range(ListingRequest::FROM, ListingRequest::TO)?,
            group_ids: params.string_list(ListingRequest::GROUPS)?,
        })
    }
}
