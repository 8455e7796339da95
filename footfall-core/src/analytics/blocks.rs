//! Calendar-aware time buckets.
//!
//! A query range `[start, due]` is cut into consecutive blocks of one
//! [`Granularity`]. Hourly, daily and weekly blocks have a fixed length;
//! monthly and yearly blocks step by calendar months, clamping to the last
//! valid day when the source day does not exist in the target month
//! (Jan 31 + 1 month = Feb 29 in a leap year).
//!
//! Every block except the last has the nominal length. The last block is
//! clamped so its `to` equals `due`.

use chrono::{DateTime, Duration, Months, Utc};
use serde::Serialize;

use crate::format::utc_timestamp;
use crate::types::Granularity;

/// One bucket of a query range.
///
/// Membership is half-open, `from <= ts < to`, for every block including
/// the last one. An event stamped exactly at the range's `due` therefore
/// falls in no block.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct TimeBlock {
    #[serde(with = "utc_timestamp")]
    pub from: DateTime<Utc>,
    #[serde(with = "utc_timestamp")]
    pub to: DateTime<Utc>,
    #[serde(skip)]
    pub granularity: Granularity,
}

impl TimeBlock {
    /// Half-open membership test.
    pub fn contains(&self, ts: DateTime<Utc>) -> bool {
        self.from <= ts && ts < self.to
    }

    /// Length of this block.
    pub fn duration(&self) -> Duration {
        self.to - self.from
    }
}

impl Granularity {
    /// Advance `current` by one unit of this granularity.
    ///
    /// Returns `None` if the result is not representable.
    pub fn advance(&self, current: DateTime<Utc>) -> Option<DateTime<Utc>> {
        match self {
            Granularity::Hourly => current.checked_add_signed(Duration::hours(1)),
            Granularity::Daily => current.checked_add_signed(Duration::days(1)),
            Granularity::Weekly => current.checked_add_signed(Duration::weeks(1)),
            Granularity::Monthly => current.checked_add_months(Months::new(1)),
            Granularity::Yearly => current.checked_add_months(Months::new(12)),
        }
    }
}

/// Partition `[start, due]` into blocks of `granularity`.
///
/// Returns an empty vector when `start >= due`.
pub fn generate_time_blocks(
    start: DateTime<Utc>,
    due: DateTime<Utc>,
    granularity: Granularity,
) -> Vec<TimeBlock> {
    let mut blocks = Vec::new();
    let mut current = start;

    while current < due {
        // Unrepresentable steps only happen near chrono's limits; close the range there.
        let next = granularity.advance(current).unwrap_or(due).min(due);
        blocks.push(TimeBlock {
            from: current,
            to: next,
            granularity,
        });
        current = next;
    }

    tracing::trace!(
        %start,
        %due,
        granularity = %granularity,
        blocks = blocks.len(),
        "Generated time blocks"
    );

    blocks
}
