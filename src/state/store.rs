use crate::analytics::{GroupAccumulator, GroupKey, Grouping, IncidentTally};
use crate::error::{AppError, Result};
use crate::models::Incident;
use crate::query::IncidentFilter;
use async_trait::async_trait;
use dashmap::DashMap;
use std::cmp::Ordering;
use std::sync::Arc;
use uuid::Uuid;

/// Trait for incident storage operations
#[async_trait]
pub trait IncidentStore: Send + Sync {
    /// Save an incident (insert or overwrite)
    async fn save_incident(&self, incident: &Incident) -> Result<()>;

    /// Get an incident by ID
    async fn get_incident(&self, id: &Uuid) -> Result<Option<Incident>>;

    /// Update an existing incident
    async fn update_incident(&self, incident: &Incident) -> Result<()>;

    /// Delete an incident
    async fn delete_incident(&self, id: &Uuid) -> Result<()>;

    /// Ordered slice `[offset, offset + limit)` of the incidents matching `filter`
    async fn find_incidents(
        &self,
        filter: &IncidentFilter,
        order: SortOrder,
        offset: u64,
        limit: u64,
    ) -> Result<Vec<Incident>>;

    /// Count incidents matching filter
    async fn count_incidents(&self, filter: &IncidentFilter) -> Result<u64>;

    /// Tally the incidents matching `filter` per group, in one pass,
    /// ascending by group key. Groups with no incidents are absent.
    async fn group_incidents(
        &self,
        filter: &IncidentFilter,
        grouping: Grouping,
    ) -> Result<Vec<(GroupKey, IncidentTally)>>;
}

/// Result ordering by occurrence time; ties are broken by id
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum SortOrder {
    #[default]
    NewestFirst,
    OldestFirst,
}

impl SortOrder {
    pub fn compare(&self, a: &Incident, b: &Incident) -> Ordering {
        let ascending = a.timestamp.cmp(&b.timestamp).then_with(|| a.id.cmp(&b.id));
        match self {
            SortOrder::OldestFirst => ascending,
            SortOrder::NewestFirst => ascending.reverse(),
        }
    }
}

/// In-memory incident store (for development and testing)
#[derive(Clone, Default)]
pub struct InMemoryStore {
    incidents: Arc<DashMap<Uuid, Incident>>,
}

impl InMemoryStore {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl IncidentStore for InMemoryStore {
    async fn save_incident(&self, incident: &Incident) -> Result<()> {
        self.incidents.insert(incident.id, incident.clone());
        tracing::debug!(incident_id = %incident.id, "Incident saved");
        Ok(())
    }

    async fn get_incident(&self, id: &Uuid) -> Result<Option<Incident>> {
        Ok(self.incidents.get(id).map(|entry| entry.clone()))
    }

    async fn update_incident(&self, incident: &Incident) -> Result<()> {
        match self.incidents.get_mut(&incident.id) {
            Some(mut entry) => {
                *entry = incident.clone();
                tracing::debug!(incident_id = %incident.id, "Incident updated");
                Ok(())
            }
            None => Err(AppError::NotFound(format!(
                "Incident {} not found",
                incident.id
            ))),
        }
    }

    async fn delete_incident(&self, id: &Uuid) -> Result<()> {
        if self.incidents.remove(id).is_some() {
            tracing::debug!(incident_id = %id, "Incident deleted");
            Ok(())
        } else {
            Err(AppError::NotFound(format!("Incident {} not found", id)))
        }
    }

    async fn find_incidents(
        &self,
        filter: &IncidentFilter,
        order: SortOrder,
        offset: u64,
        limit: u64,
    ) -> Result<Vec<Incident>> {
        if filter.is_empty_range() {
            return Ok(Vec::new());
        }

        let mut incidents: Vec<Incident> = self
            .incidents
            .iter()
            .filter(|entry| filter.matches(entry.value()))
            .map(|entry| entry.value().clone())
            .collect();

        incidents.sort_by(|a, b| order.compare(a, b));

        Ok(incidents
            .into_iter()
            .skip(usize::try_from(offset).unwrap_or(usize::MAX))
            .take(usize::try_from(limit).unwrap_or(usize::MAX))
            .collect())
    }

    async fn count_incidents(&self, filter: &IncidentFilter) -> Result<u64> {
        if filter.is_empty_range() {
            return Ok(0);
        }

        let count = self
            .incidents
            .iter()
            .filter(|entry| filter.matches(entry.value()))
            .count();

        Ok(count as u64)
    }

    async fn group_incidents(
        &self,
        filter: &IncidentFilter,
        grouping: Grouping,
    ) -> Result<Vec<(GroupKey, IncidentTally)>> {
        let mut acc = GroupAccumulator::new(grouping);

        if !filter.is_empty_range() {
            for entry in self.incidents.iter() {
                if filter.matches(entry.value()) {
                    acc.add(entry.value());
                }
            }
        }

        Ok(acc.finish())
    }
}
