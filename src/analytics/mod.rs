//! Incident aggregation: category statistics and calendar time series
//!
//! Every aggregate is computed from a single grouped pass over the store
//! ([`IncidentStore::group_incidents`](crate::state::IncidentStore::group_incidents)),
//! so all counts in one response agree with the same filter.

pub mod statistics;
pub mod tally;
pub mod timeseries;

pub use statistics::{
    compute_statistics, percentage, rank_sectors, sector_breakdown, IncidentStatistics,
    SectorSummary,
};
pub use tally::{GroupAccumulator, GroupKey, Grouping, IncidentTally};
pub use timeseries::{bucketize, buckets_from_groups, week_of_year, BucketKey, Interval, TimeBucket};
