//! Single-pass grouped counting shared by every store backend

use crate::analytics::timeseries::{BucketKey, Interval};
use crate::models::{Incident, IncidentStatus, IncidentType, Severity};
use serde::Serialize;
use std::collections::BTreeMap;

/// How incidents are partitioned before counting
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Grouping {
    /// One group holding every matching incident
    Overall,
    /// One group per sector
    Sector,
    /// One group per calendar bucket
    Time(Interval),
}

impl Grouping {
    pub fn key_for(&self, incident: &Incident) -> GroupKey {
        match self {
            Grouping::Overall => GroupKey::Overall,
            Grouping::Sector => GroupKey::Sector(incident.sector.clone()),
            Grouping::Time(interval) => {
                GroupKey::Bucket(BucketKey::for_timestamp(*interval, incident.timestamp))
            }
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum GroupKey {
    Overall,
    Sector(String),
    Bucket(BucketKey),
}

/// Per-category counts for one group
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct IncidentTally {
    pub count: u64,

    pub fire: u64,
    pub fall: u64,
    pub ppe: u64,
    pub other: u64,

    pub critical: u64,
    pub high: u64,
    pub medium: u64,
    pub low: u64,

    pub detected: u64,
    pub acknowledged: u64,
    pub resolved: u64,
    pub false_alarm: u64,
}

impl IncidentTally {
    pub fn record(&mut self, incident: &Incident) {
        self.count += 1;

        match incident.incident_type {
            IncidentType::Fire => self.fire += 1,
            IncidentType::Fall => self.fall += 1,
            IncidentType::Ppe => self.ppe += 1,
            IncidentType::Other => self.other += 1,
        }

        match incident.severity {
            Severity::Critical => self.critical += 1,
            Severity::High => self.high += 1,
            Severity::Medium => self.medium += 1,
            Severity::Low => self.low += 1,
        }

        match incident.status {
            IncidentStatus::Detected => self.detected += 1,
            IncidentStatus::Acknowledged => self.acknowledged += 1,
            IncidentStatus::Resolved => self.resolved += 1,
            IncidentStatus::FalseAlarm => self.false_alarm += 1,
        }
    }

    pub fn by_type(&self, incident_type: IncidentType) -> u64 {
        match incident_type {
            IncidentType::Fire => self.fire,
            IncidentType::Fall => self.fall,
            IncidentType::Ppe => self.ppe,
            IncidentType::Other => self.other,
        }
    }

    pub fn by_severity(&self, severity: Severity) -> u64 {
        match severity {
            Severity::Critical => self.critical,
            Severity::High => self.high,
            Severity::Medium => self.medium,
            Severity::Low => self.low,
        }
    }

    pub fn by_status(&self, status: IncidentStatus) -> u64 {
        match status {
            IncidentStatus::Detected => self.detected,
            IncidentStatus::Acknowledged => self.acknowledged,
            IncidentStatus::Resolved => self.resolved,
            IncidentStatus::FalseAlarm => self.false_alarm,
        }
    }
}

/// Accumulates tallies while a store scans its records once
#[derive(Debug)]
pub struct GroupAccumulator {
    grouping: Grouping,
    groups: BTreeMap<GroupKey, IncidentTally>,
}

impl GroupAccumulator {
    pub fn new(grouping: Grouping) -> Self {
        Self {
            grouping,
            groups: BTreeMap::new(),
        }
    }

    pub fn add(&mut self, incident: &Incident) {
        self.groups
            .entry(self.grouping.key_for(incident))
            .or_default()
            .record(incident);
    }

    /// Groups in ascending key order
    pub fn finish(self) -> Vec<(GroupKey, IncidentTally)> {
        self.groups.into_iter().collect()
    }
}
