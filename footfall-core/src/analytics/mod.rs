//! Time-window cohort and ranking engine
//!
//! Four independent, pure transforms over in-memory collections:
//!
//! - [`blocks`]: calendar-aware time buckets for a query range
//! - [`cohort`]: per-bucket distinct / new / returning entity counts
//! - [`leaderboard`]: deterministic top-K most frequent visitors
//! - [`paging`]: sorted, paged, enriched visit listings
//!
//! None of them performs I/O or mutates its inputs. Callers fetch
//! collections from the store, validate request parameters with
//! [`crate::params`], and hand the results in.
//!
//! ## Usage
//!
//! ```rust
//! use chrono::{TimeZone, Utc};
//! use footfall_core::analytics::{classify, generate_time_blocks};
//! use footfall_core::{Entity, Event, Granularity};
//!
//! let ten = Utc.with_ymd_and_hms(2025, 2, 17, 10, 0, 0).unwrap();
//! let noon = Utc.with_ymd_and_hms(2025, 2, 17, 12, 0, 0).unwrap();
//!
//! let mut visitor = Entity::new("F-1");
//! visitor.first_seen = Some(ten);
//! let events = vec![Event::new("F-1", "CAM-1", ten)];
//!
//! let blocks = generate_time_blocks(ten, noon, Granularity::Hourly);
//! let summary = classify(&events, &Entity::first_seen_index([&visitor]), &blocks);
//! assert_eq!(summary.blocks[0].new, 1);
//! ```

pub mod blocks;
pub mod cohort;
pub mod leaderboard;
pub mod paging;

pub use blocks::{generate_time_blocks, TimeBlock};
pub use cohort::{classify, CohortCount, CohortSummary};
pub use leaderboard::{rank, DisplayProfile, Leaderboard, LeaderboardEntry};
pub use paging::{page_window, sort_records, view, EnrichedRecord, EnrichmentTables};
