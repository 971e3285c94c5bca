//! Shared fixtures for the integration tests

#![allow(dead_code)]

use chrono::{DateTime, TimeZone, Utc};
use safety_incident_manager::{
    models::{Incident, IncidentType, Severity},
    state::IncidentStore,
};

/// A fixed reference time so bucket boundaries are predictable
pub fn base_time() -> DateTime<Utc> {
    Utc.with_ymd_and_hms(2024, 3, 5, 8, 0, 0).unwrap()
}

/// Helper to create test incident
pub fn create_test_incident(
    incident_type: IncidentType,
    severity: Severity,
    sector: &str,
    timestamp: DateTime<Utc>,
) -> Incident {
    Incident::new(incident_type, severity, 0.85, sector).with_timestamp(timestamp)
}

/// Save every incident and return them in insertion order
pub async fn seed(store: &dyn IncidentStore, incidents: Vec<Incident>) -> Vec<Incident> {
    for incident in &incidents {
        store.save_incident(incident).await.unwrap();
    }
    incidents
}

/// 4 fire, 3 fall, 2 ppe, 1 other spread over two sectors and several hours
pub fn mixed_incidents() -> Vec<Incident> {
    let types = [
        IncidentType::Fire,
        IncidentType::Fire,
        IncidentType::Fire,
        IncidentType::Fire,
        IncidentType::Fall,
        IncidentType::Fall,
        IncidentType::Fall,
        IncidentType::Ppe,
        IncidentType::Ppe,
        IncidentType::Other,
    ];
    let severities = [
        Severity::Critical,
        Severity::High,
        Severity::Medium,
        Severity::Low,
    ];

    types
        .iter()
        .enumerate()
        .map(|(i, t)| {
            let sector = if i % 3 == 0 { "loading-dock" } else { "assembly" };
            create_test_incident(
                *t,
                severities[i % severities.len()],
                sector,
                base_time() + chrono::Duration::hours(i as i64 * 7),
            )
        })
        .collect()
}
