//! Translation of raw request parameters into a validated incident predicate

use crate::error::{AppError, Result};
use crate::models::{Incident, IncidentStatus, IncidentType, Severity};
use chrono::{DateTime, NaiveDate, NaiveDateTime, Utc};
use serde::Deserialize;
use std::str::FromStr;

/// Raw, unvalidated filter parameters as they arrive on the query string
#[derive(Debug, Clone, Default, Deserialize)]
pub struct FilterParams {
    #[serde(rename = "type")]
    pub incident_type: Option<String>,
    pub severity: Option<String>,
    pub sector: Option<String>,
    pub status: Option<String>,
    pub from: Option<String>,
    pub to: Option<String>,
}

/// A single field constraint
#[derive(Debug, Clone, PartialEq)]
pub enum Constraint {
    Type(IncidentType),
    Severity(Severity),
    Sector(String),
    Status(IncidentStatus),
    /// Inclusive lower bound on `timestamp`
    From(DateTime<Utc>),
    /// Inclusive upper bound on `timestamp`
    To(DateTime<Utc>),
}

impl Constraint {
    pub fn matches(&self, incident: &Incident) -> bool {
        match self {
            Constraint::Type(t) => incident.incident_type == *t,
            Constraint::Severity(s) => incident.severity == *s,
            Constraint::Sector(s) => incident.sector == *s,
            Constraint::Status(s) => incident.status == *s,
            Constraint::From(from) => incident.timestamp >= *from,
            Constraint::To(to) => incident.timestamp <= *to,
        }
    }
}

/// Conjunction of constraints. Empty means "match all".
#[derive(Debug, Clone, Default, PartialEq)]
pub struct IncidentFilter {
    constraints: Vec<Constraint>,
}

impl IncidentFilter {
    /// The match-all predicate
    pub fn all() -> Self {
        Self::default()
    }

    /// Validate raw parameters and build the predicate
    pub fn from_params(params: &FilterParams) -> Result<Self> {
        let mut filter = Self::all();

        if let Some(raw) = present(&params.incident_type) {
            filter.push(Constraint::Type(parse_enum(raw, "type")?));
        }
        if let Some(raw) = present(&params.severity) {
            filter.push(Constraint::Severity(parse_enum(raw, "severity")?));
        }
        if let Some(raw) = present(&params.sector) {
            filter.push(Constraint::Sector(raw.to_string()));
        }
        if let Some(raw) = present(&params.status) {
            filter.push(Constraint::Status(parse_enum(raw, "status")?));
        }
        if let Some(raw) = present(&params.from) {
            filter.push(Constraint::From(parse_timestamp(raw)?));
        }
        if let Some(raw) = present(&params.to) {
            filter.push(Constraint::To(parse_timestamp(raw)?));
        }

        Ok(filter)
    }

    /// Add a constraint
    pub fn with(mut self, constraint: Constraint) -> Self {
        self.push(constraint);
        self
    }

    fn push(&mut self, constraint: Constraint) {
        self.constraints.push(constraint);
    }

    pub fn constraints(&self) -> &[Constraint] {
        &self.constraints
    }

    pub fn is_match_all(&self) -> bool {
        self.constraints.is_empty()
    }

    pub fn matches(&self, incident: &Incident) -> bool {
        self.constraints.iter().all(|c| c.matches(incident))
    }

    /// Tightest `(from, to)` timestamp bounds implied by the constraints
    pub fn time_bounds(&self) -> (Option<DateTime<Utc>>, Option<DateTime<Utc>>) {
        self.constraints
            .iter()
            .fold((None, None), |(from, to), c| match c {
                Constraint::From(f) => (Some(from.map_or(*f, |cur: DateTime<Utc>| cur.max(*f))), to),
                Constraint::To(t) => (from, Some(to.map_or(*t, |cur: DateTime<Utc>| cur.min(*t)))),
                _ => (from, to),
            })
    }

    /// True when the timestamp bounds exclude every possible record
    pub fn is_empty_range(&self) -> bool {
        matches!(self.time_bounds(), (Some(from), Some(to)) if from > to)
    }
}

/// Treat missing and blank parameters alike
fn present(raw: &Option<String>) -> Option<&str> {
    raw.as_deref().map(str::trim).filter(|s| !s.is_empty())
}

fn parse_enum<T: FromStr>(raw: &str, field: &str) -> Result<T> {
    T::from_str(raw)
        .map_err(|_| AppError::InvalidFilter(format!("unknown {} value '{}'", field, raw)))
}

const NAIVE_DATETIME_FORMATS: &[&str] = &[
    "%Y-%m-%dT%H:%M:%S%.f",
    "%Y-%m-%d %H:%M:%S%.f",
    "%Y-%m-%dT%H:%M",
    "%Y-%m-%d %H:%M",
];

/// Parse a filter date. Accepts RFC 3339, naive date-times (taken as UTC)
/// and plain dates (UTC midnight).
pub fn parse_timestamp(raw: &str) -> Result<DateTime<Utc>> {
    let raw = raw.trim();

    if let Ok(dt) = DateTime::parse_from_rfc3339(raw) {
        return Ok(dt.with_timezone(&Utc));
    }

    for format in NAIVE_DATETIME_FORMATS {
        if let Ok(naive) = NaiveDateTime::parse_from_str(raw, format) {
            return Ok(naive.and_utc());
        }
    }

    if let Ok(date) = NaiveDate::parse_from_str(raw, "%Y-%m-%d") {
        if let Some(midnight) = date.and_hms_opt(0, 0, 0) {
            return Ok(midnight.and_utc());
        }
    }

    Err(AppError::InvalidFilter(format!("invalid date '{}'", raw)))
}
