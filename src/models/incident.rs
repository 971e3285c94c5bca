use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use strum::{Display, EnumString};
use uuid::Uuid;
use validator::{Validate, ValidationError};

/// A safety event recorded by the detection pipeline
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Incident {
    /// Unique identifier
    pub id: Uuid,

    /// When the incident occurred
    pub timestamp: DateTime<Utc>,

    /// What was detected
    pub incident_type: IncidentType,

    /// Severity level
    pub severity: Severity,

    /// Detector confidence in [0, 1]
    pub confidence_score: f64,

    /// Zone the incident was detected in
    pub sector: String,

    /// Evidence still image (path or URL)
    pub image_path: Option<String>,

    /// Evidence video clip (path or URL)
    pub video_clip_path: Option<String>,

    /// Current lifecycle status
    pub status: IncidentStatus,

    /// User that first resolved the incident
    pub resolved_by: Option<String>,

    /// Free-text resolution notes
    pub resolution_notes: Option<String>,

    /// When the incident first entered `resolved`
    pub resolution_time: Option<DateTime<Utc>>,

    /// Where the incident happened
    pub location: GeoPoint,

    /// Creation timestamp
    pub created_at: DateTime<Utc>,

    /// Last update timestamp
    pub updated_at: DateTime<Utc>,
}

impl Incident {
    /// Create a new incident timestamped now
    pub fn new(
        incident_type: IncidentType,
        severity: Severity,
        confidence_score: f64,
        sector: impl Into<String>,
    ) -> Self {
        let now = Utc::now();

        Self {
            id: Uuid::new_v4(),
            timestamp: now,
            incident_type,
            severity,
            confidence_score,
            sector: sector.into(),
            image_path: None,
            video_clip_path: None,
            status: IncidentStatus::Detected,
            resolved_by: None,
            resolution_notes: None,
            resolution_time: None,
            location: GeoPoint::default(),
            created_at: now,
            updated_at: now,
        }
    }

    /// Build an incident from a validated ingest request
    pub fn from_request(request: NewIncident, now: DateTime<Utc>) -> Self {
        let mut incident = Self {
            id: Uuid::new_v4(),
            timestamp: request.timestamp.unwrap_or(now),
            incident_type: request.incident_type,
            severity: request.severity,
            confidence_score: request.confidence_score,
            sector: request.sector.trim().to_string(),
            image_path: request.image_path,
            video_clip_path: request.video_clip_path,
            status: IncidentStatus::Detected,
            resolved_by: None,
            resolution_notes: request.resolution_notes,
            resolution_time: None,
            location: request.location.unwrap_or_default(),
            created_at: now,
            updated_at: now,
        };

        if let Some(status) = request.status {
            incident.transition_status(status, None, now);
        }

        incident
    }

    /// Override the occurrence time
    pub fn with_timestamp(mut self, timestamp: DateTime<Utc>) -> Self {
        self.timestamp = timestamp;
        self
    }

    /// Move to `to`. Any status may follow any other; the only guarded side
    /// effect is the resolution stamp, written on the first entry into
    /// `resolved` and never rewritten afterwards.
    pub fn transition_status(
        &mut self,
        to: IncidentStatus,
        actor: Option<&str>,
        at: DateTime<Utc>,
    ) -> StatusTransition {
        let from = self.status;

        let resolution_stamped = to == IncidentStatus::Resolved
            && from != IncidentStatus::Resolved
            && self.resolution_time.is_none();

        if resolution_stamped {
            self.resolution_time = Some(at);
            self.resolved_by = actor.map(str::to_string);
        }

        self.status = to;
        self.updated_at = at;

        StatusTransition {
            from,
            to,
            resolution_stamped,
        }
    }

    /// Apply an operator update. Returns the status transition, if one was requested.
    pub fn apply_update(
        &mut self,
        update: IncidentUpdate,
        actor: &str,
        at: DateTime<Utc>,
    ) -> Option<StatusTransition> {
        if let Some(notes) = update.resolution_notes {
            self.resolution_notes = Some(notes);
        }
        self.updated_at = at;

        update
            .status
            .map(|status| self.transition_status(status, Some(actor), at))
    }
}

/// Outcome of [`Incident::transition_status`]
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct StatusTransition {
    pub from: IncidentStatus,
    pub to: IncidentStatus,
    pub resolution_stamped: bool,
}

#[derive(
    Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash, EnumString, Display,
)]
#[serde(rename_all = "snake_case")]
#[strum(serialize_all = "snake_case")]
pub enum IncidentType {
    Fire,
    Fall,
    Ppe,
    Other,
}

#[derive(
    Debug,
    Clone,
    Copy,
    Serialize,
    Deserialize,
    PartialEq,
    Eq,
    PartialOrd,
    Ord,
    Hash,
    EnumString,
    Display,
)]
#[serde(rename_all = "snake_case")]
#[strum(serialize_all = "snake_case")]
pub enum Severity {
    Low,
    Medium,
    High,
    Critical,
}

#[derive(
    Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash, EnumString, Display,
)]
#[serde(rename_all = "snake_case")]
#[strum(serialize_all = "snake_case")]
pub enum IncidentStatus {
    Detected,
    Acknowledged,
    Resolved,
    FalseAlarm,
}

/// GeoJSON-style point: `{"type": "Point", "coordinates": [lon, lat]}`
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct GeoPoint {
    #[serde(rename = "type", default)]
    pub kind: GeoKind,
    pub coordinates: [f64; 2],
}

impl GeoPoint {
    pub fn new(longitude: f64, latitude: f64) -> Self {
        Self {
            kind: GeoKind::Point,
            coordinates: [longitude, latitude],
        }
    }

    pub fn longitude(&self) -> f64 {
        self.coordinates[0]
    }

    pub fn latitude(&self) -> f64 {
        self.coordinates[1]
    }
}

impl Default for GeoPoint {
    fn default() -> Self {
        Self::new(0.0, 0.0)
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub enum GeoKind {
    #[default]
    Point,
}

fn validate_sector(sector: &str) -> Result<(), ValidationError> {
    if sector.trim().is_empty() {
        Err(ValidationError::new("blank_sector"))
    } else {
        Ok(())
    }
}

fn validate_location(location: &GeoPoint) -> Result<(), ValidationError> {
    let lon_ok = (-180.0..=180.0).contains(&location.longitude());
    let lat_ok = (-90.0..=90.0).contains(&location.latitude());

    if lon_ok && lat_ok {
        Ok(())
    } else {
        Err(ValidationError::new("coordinates_out_of_range"))
    }
}

/// Ingest payload sent by the detection pipeline
#[derive(Debug, Clone, Deserialize, Validate)]
pub struct NewIncident {
    pub timestamp: Option<DateTime<Utc>>,
    pub incident_type: IncidentType,
    pub severity: Severity,
    #[validate(range(min = 0.0, max = 1.0))]
    pub confidence_score: f64,
    #[validate(length(min = 1, max = 255), custom(function = "validate_sector"))]
    pub sector: String,
    pub image_path: Option<String>,
    pub video_clip_path: Option<String>,
    pub status: Option<IncidentStatus>,
    #[validate(length(max = 4000))]
    pub resolution_notes: Option<String>,
    #[validate(custom(function = "validate_location"))]
    pub location: Option<GeoPoint>,
}

/// Operator-driven mutation of an existing incident
#[derive(Debug, Clone, Default, Deserialize, Validate)]
pub struct IncidentUpdate {
    pub status: Option<IncidentStatus>,
    #[validate(length(max = 4000))]
    pub resolution_notes: Option<String>,
}
