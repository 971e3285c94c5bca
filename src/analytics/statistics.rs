//! Category counts, percentages and per-sector breakdowns

use crate::analytics::tally::{GroupKey, Grouping, IncidentTally};
use crate::error::{AppError, Result};
use crate::metrics::AGGREGATION_DURATION_SECONDS;
use crate::query::IncidentFilter;
use crate::state::IncidentStore;
use serde::Serialize;

/// `count` as a percentage of `total`; 0 when `total` is 0
pub fn percentage(count: u64, total: u64) -> f64 {
    if total == 0 {
        0.0
    } else {
        (count as f64 * 100.0) / total as f64
    }
}

/// Overall statistics for a filtered set of incidents
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct IncidentStatistics {
    pub total_incidents: u64,
    pub by_type: TypeBreakdown,
    pub by_severity: SeverityBreakdown,
    pub by_status: StatusBreakdown,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct TypeBreakdown {
    pub fire: u64,
    pub fall: u64,
    pub ppe: u64,
    pub other: u64,
    pub percentage: TypePercentages,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct TypePercentages {
    pub fire: f64,
    pub fall: f64,
    pub ppe: f64,
    pub other: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SeverityBreakdown {
    pub critical: u64,
    pub high: u64,
    pub medium: u64,
    pub low: u64,
    pub percentage: SeverityPercentages,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SeverityPercentages {
    pub critical: f64,
    pub high: f64,
    pub medium: f64,
    pub low: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct StatusBreakdown {
    pub detected: u64,
    pub acknowledged: u64,
    pub resolved: u64,
    pub false_alarm: u64,
}

impl IncidentStatistics {
    pub fn from_tally(tally: &IncidentTally) -> Self {
        let total = tally.count;

        Self {
            total_incidents: total,
            by_type: TypeBreakdown {
                fire: tally.fire,
                fall: tally.fall,
                ppe: tally.ppe,
                other: tally.other,
                percentage: TypePercentages {
                    fire: percentage(tally.fire, total),
                    fall: percentage(tally.fall, total),
                    ppe: percentage(tally.ppe, total),
                    other: percentage(tally.other, total),
                },
            },
            by_severity: SeverityBreakdown {
                critical: tally.critical,
                high: tally.high,
                medium: tally.medium,
                low: tally.low,
                percentage: SeverityPercentages {
                    critical: percentage(tally.critical, total),
                    high: percentage(tally.high, total),
                    medium: percentage(tally.medium, total),
                    low: percentage(tally.low, total),
                },
            },
            by_status: StatusBreakdown {
                detected: tally.detected,
                acknowledged: tally.acknowledged,
                resolved: tally.resolved,
                false_alarm: tally.false_alarm,
            },
        }
    }
}

/// One row of the per-sector breakdown
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct SectorSummary {
    pub sector: String,
    pub count: u64,
    pub fire: u64,
    pub fall: u64,
    pub ppe: u64,
    pub other: u64,
    pub critical: u64,
    pub high: u64,
    pub medium: u64,
    pub low: u64,
}

impl SectorSummary {
    fn from_tally(sector: String, tally: &IncidentTally) -> Self {
        Self {
            sector,
            count: tally.count,
            fire: tally.fire,
            fall: tally.fall,
            ppe: tally.ppe,
            other: tally.other,
            critical: tally.critical,
            high: tally.high,
            medium: tally.medium,
            low: tally.low,
        }
    }
}

/// Compute overall statistics from one grouped pass over the filtered set
pub async fn compute_statistics(
    store: &dyn IncidentStore,
    filter: &IncidentFilter,
) -> Result<IncidentStatistics> {
    let _timer = AGGREGATION_DURATION_SECONDS
        .with_label_values(&["stats"])
        .start_timer();

    let groups = store.group_incidents(filter, Grouping::Overall).await?;

    // An empty filtered set yields no group at all
    let tally = match groups.as_slice() {
        [] => IncidentTally::default(),
        [(GroupKey::Overall, tally)] => *tally,
        other => {
            return Err(AppError::Internal(format!(
                "expected a single overall group, store returned {} groups",
                other.len()
            )))
        }
    };

    Ok(IncidentStatistics::from_tally(&tally))
}

/// Rank sector groups by count, descending; ties by sector name
pub fn rank_sectors(groups: Vec<(GroupKey, IncidentTally)>) -> Result<Vec<SectorSummary>> {
    let mut rows = groups
        .into_iter()
        .map(|(key, tally)| match key {
            GroupKey::Sector(sector) => Ok(SectorSummary::from_tally(sector, &tally)),
            other => Err(AppError::Internal(format!(
                "expected a sector group, store returned {:?}",
                other
            ))),
        })
        .collect::<Result<Vec<_>>>()?;

    rows.sort_by(|a, b| b.count.cmp(&a.count).then_with(|| a.sector.cmp(&b.sector)));
    Ok(rows)
}

/// Per-sector counts for the filtered set
pub async fn sector_breakdown(
    store: &dyn IncidentStore,
    filter: &IncidentFilter,
) -> Result<Vec<SectorSummary>> {
    let _timer = AGGREGATION_DURATION_SECONDS
        .with_label_values(&["by_sector"])
        .start_timer();

    let groups = store.group_incidents(filter, Grouping::Sector).await?;
    rank_sectors(groups)
}
