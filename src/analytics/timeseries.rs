//! Calendar bucketing of incidents (hour/day/week/month), all in UTC

use crate::analytics::tally::{GroupKey, Grouping, IncidentTally};
use crate::error::{AppError, Result};
use crate::metrics::AGGREGATION_DURATION_SECONDS;
use crate::query::IncidentFilter;
use crate::state::IncidentStore;
use chrono::{DateTime, Datelike, Days, NaiveDate, Timelike, Utc};
use serde::Serialize;
use std::str::FromStr;
use strum::{Display, EnumString};

/// Bucket width for time-series aggregation
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, EnumString, Display)]
#[serde(rename_all = "lowercase")]
#[strum(serialize_all = "lowercase")]
pub enum Interval {
    Hour,
    Day,
    Week,
    Month,
}

impl Interval {
    /// Parse the `interval` query value; absent or blank means `day`
    pub fn parse(raw: Option<&str>) -> Result<Self> {
        match raw.map(str::trim).filter(|s| !s.is_empty()) {
            None => Ok(Interval::Day),
            Some(s) => Interval::from_str(s).map_err(|_| {
                AppError::InvalidInterval(format!(
                    "'{}' is not one of hour, day, week, month",
                    s
                ))
            }),
        }
    }
}

/// Calendar bucket identity. Fields not used by the interval stay `None`,
/// so the derived ordering is chronological within one interval.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize)]
pub struct BucketKey {
    pub year: i32,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub month: Option<u32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub day: Option<u32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub hour: Option<u32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub week: Option<u32>,
}

impl BucketKey {
    pub fn for_timestamp(interval: Interval, ts: DateTime<Utc>) -> Self {
        let key = Self {
            year: ts.year(),
            month: None,
            day: None,
            hour: None,
            week: None,
        };

        match interval {
            Interval::Hour => Self {
                month: Some(ts.month()),
                day: Some(ts.day()),
                hour: Some(ts.hour()),
                ..key
            },
            Interval::Day => Self {
                month: Some(ts.month()),
                day: Some(ts.day()),
                ..key
            },
            Interval::Week => Self {
                week: Some(week_of_year(ts.date_naive())),
                ..key
            },
            Interval::Month => Self {
                month: Some(ts.month()),
                ..key
            },
        }
    }

    /// Representative start of the bucket. Weeks use January 1 plus
    /// `week * 7` days, which does not align with the actual first Sunday.
    pub fn start_date(&self) -> Result<DateTime<Utc>> {
        let date = match (self.week, self.month, self.day) {
            (Some(week), _, _) => NaiveDate::from_ymd_opt(self.year, 1, 1)
                .and_then(|jan1| jan1.checked_add_days(Days::new(u64::from(week) * 7))),
            (None, Some(month), Some(day)) => NaiveDate::from_ymd_opt(self.year, month, day),
            (None, Some(month), None) => NaiveDate::from_ymd_opt(self.year, month, 1),
            (None, None, _) => NaiveDate::from_ymd_opt(self.year, 1, 1),
        };

        date.and_then(|d| d.and_hms_opt(self.hour.unwrap_or(0), 0, 0))
            .map(|naive| naive.and_utc())
            .ok_or_else(|| AppError::Internal(format!("bucket {:?} has no valid start date", self)))
    }
}

/// Sunday-based week of year (0..=53). Days before the first Sunday are week 0.
pub fn week_of_year(date: NaiveDate) -> u32 {
    (date.ordinal0() + 7 - date.weekday().num_days_from_sunday()) / 7
}

/// One point of the time series
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct TimeBucket {
    #[serde(rename = "bucketKey")]
    pub bucket_key: BucketKey,
    pub count: u64,
    pub fire: u64,
    pub fall: u64,
    pub ppe: u64,
    pub other: u64,
    pub date: DateTime<Utc>,
}

impl TimeBucket {
    pub fn from_tally(bucket_key: BucketKey, tally: &IncidentTally) -> Result<Self> {
        Ok(Self {
            bucket_key,
            count: tally.count,
            fire: tally.fire,
            fall: tally.fall,
            ppe: tally.ppe,
            other: tally.other,
            date: bucket_key.start_date()?,
        })
    }
}

/// Convert grouped tallies into ordered time buckets
pub fn buckets_from_groups(groups: Vec<(GroupKey, IncidentTally)>) -> Result<Vec<TimeBucket>> {
    let mut buckets = groups
        .into_iter()
        .map(|(key, tally)| match key {
            GroupKey::Bucket(bucket_key) => TimeBucket::from_tally(bucket_key, &tally),
            other => Err(AppError::Internal(format!(
                "expected a time bucket group, store returned {:?}",
                other
            ))),
        })
        .collect::<Result<Vec<_>>>()?;

    buckets.sort_by(|a, b| a.bucket_key.cmp(&b.bucket_key));
    Ok(buckets)
}

/// Bucket every incident matching `filter` in one grouped store pass
pub async fn bucketize(
    store: &dyn IncidentStore,
    filter: &IncidentFilter,
    interval: Interval,
) -> Result<Vec<TimeBucket>> {
    let _timer = AGGREGATION_DURATION_SECONDS
        .with_label_values(&["by_time"])
        .start_timer();

    let groups = store
        .group_incidents(filter, Grouping::Time(interval))
        .await?;
    let buckets = buckets_from_groups(groups)?;

    tracing::debug!(%interval, buckets = buckets.len(), "Time series computed");
    Ok(buckets)
}
