use crate::analytics::{GroupAccumulator, GroupKey, Grouping, IncidentTally};
use crate::error::{AppError, Result};
use crate::models::Incident;
use crate::query::IncidentFilter;
use crate::state::{IncidentStore, SortOrder};
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use sled::Db;
use std::path::Path;
use std::sync::Arc;
use uuid::Uuid;

/// Persistent incident store using Sled embedded database.
///
/// Records live in the `incidents` tree keyed by id. The `timeline` tree is
/// a secondary index keyed by `(seconds, subsec nanos, id)` so range filters
/// and time ordering are served by a single ordered scan.
#[derive(Clone)]
pub struct SledStore {
    db: Arc<Db>,
    incidents_tree: sled::Tree,
    timeline_tree: sled::Tree,
}

const TIME_PREFIX_LEN: usize = 8 + 4;
const TIMELINE_KEY_LEN: usize = TIME_PREFIX_LEN + 16;

impl SledStore {
    /// Create a new Sled store at the specified path
    pub fn new<P: AsRef<Path>>(path: P) -> Result<Self> {
        let path = path.as_ref();
        let db = sled::open(path).map_err(|e| {
            AppError::StoreUnavailable(format!("Failed to open Sled database: {}", e))
        })?;

        let incidents_tree = db.open_tree("incidents")?;
        let timeline_tree = db.open_tree("timeline")?;

        tracing::info!("Initialized Sled store at {:?}", path);

        Ok(Self {
            db: Arc::new(db),
            incidents_tree,
            timeline_tree,
        })
    }

    fn serialize_incident(incident: &Incident) -> Result<Vec<u8>> {
        bincode::serialize(incident).map_err(|e| {
            AppError::Serialization(format!("Failed to serialize incident: {}", e))
        })
    }

    fn deserialize_incident(bytes: &[u8]) -> Result<Incident> {
        bincode::deserialize(bytes).map_err(|e| {
            AppError::Serialization(format!("Failed to deserialize incident: {}", e))
        })
    }

    fn incident_key(id: &Uuid) -> Vec<u8> {
        id.as_bytes().to_vec()
    }

    /// Big-endian seconds with the sign bit flipped, then big-endian
    /// sub-second nanos, so byte order matches full timestamp order
    fn time_prefix(ts: DateTime<Utc>) -> [u8; TIME_PREFIX_LEN] {
        let mut prefix = [0u8; TIME_PREFIX_LEN];
        prefix[..8].copy_from_slice(&((ts.timestamp() as u64) ^ (1 << 63)).to_be_bytes());
        prefix[8..].copy_from_slice(&ts.timestamp_subsec_nanos().to_be_bytes());
        prefix
    }

    fn timeline_key(ts: DateTime<Utc>, id: &Uuid) -> [u8; TIMELINE_KEY_LEN] {
        let mut key = [0u8; TIMELINE_KEY_LEN];
        key[..TIME_PREFIX_LEN].copy_from_slice(&Self::time_prefix(ts));
        key[TIME_PREFIX_LEN..].copy_from_slice(id.as_bytes());
        key
    }

    /// Inclusive key range covering every record the filter's time bounds allow
    fn timeline_bounds(filter: &IncidentFilter) -> ([u8; TIMELINE_KEY_LEN], [u8; TIMELINE_KEY_LEN]) {
        let (from, to) = filter.time_bounds();

        let mut lower = [0x00u8; TIMELINE_KEY_LEN];
        if let Some(from) = from {
            lower[..TIME_PREFIX_LEN].copy_from_slice(&Self::time_prefix(from));
        }

        let mut upper = [0xFFu8; TIMELINE_KEY_LEN];
        if let Some(to) = to {
            upper[..TIME_PREFIX_LEN].copy_from_slice(&Self::time_prefix(to));
        }

        (lower, upper)
    }

    /// Matching incidents in timeline order
    fn scan(
        &self,
        filter: &IncidentFilter,
        order: SortOrder,
    ) -> Box<dyn Iterator<Item = Result<Incident>> + '_> {
        if filter.is_empty_range() {
            return Box::new(std::iter::empty());
        }

        let (lower, upper) = Self::timeline_bounds(filter);
        let range = self.timeline_tree.range(lower..=upper);

        let ids: Box<dyn Iterator<Item = sled::Result<(sled::IVec, sled::IVec)>>> = match order {
            SortOrder::OldestFirst => Box::new(range),
            SortOrder::NewestFirst => Box::new(range.rev()),
        };

        let filter = filter.clone();
        Box::new(
            ids.map(move |entry| -> Result<Option<Incident>> {
                let (key, _) = entry?;
                let id_bytes = key.get(TIME_PREFIX_LEN..).ok_or_else(|| {
                    AppError::Internal("Malformed timeline index key".to_string())
                })?;

                match self.incidents_tree.get(id_bytes)? {
                    Some(bytes) => {
                        let incident = Self::deserialize_incident(&bytes)?;
                        Ok(filter.matches(&incident).then_some(incident))
                    }
                    None => {
                        tracing::warn!("Timeline index entry without incident record");
                        Ok(None)
                    }
                }
            })
            .filter_map(Result::transpose),
        )
    }

    fn write(&self, incident: &Incident, previous: Option<&Incident>) -> Result<()> {
        let key = Self::incident_key(&incident.id);
        let value = Self::serialize_incident(incident)?;

        if let Some(previous) = previous {
            if previous.timestamp != incident.timestamp {
                self.timeline_tree
                    .remove(Self::timeline_key(previous.timestamp, &previous.id))?;
            }
        }

        self.incidents_tree.insert(&key, value)?;
        self.timeline_tree
            .insert(Self::timeline_key(incident.timestamp, &incident.id), Vec::<u8>::new())?;

        self.incidents_tree.flush()?;
        self.timeline_tree.flush()?;
        Ok(())
    }

    fn load(&self, id: &Uuid) -> Result<Option<Incident>> {
        match self.incidents_tree.get(Self::incident_key(id))? {
            Some(bytes) => Ok(Some(Self::deserialize_incident(&bytes)?)),
            None => Ok(None),
        }
    }

    /// Flush pending writes to disk
    pub async fn flush(&self) -> Result<()> {
        self.db.flush_async().await?;
        Ok(())
    }

}

#[async_trait]
impl IncidentStore for SledStore {
    async fn save_incident(&self, incident: &Incident) -> Result<()> {
        let previous = self.load(&incident.id)?;
        self.write(incident, previous.as_ref())?;

        tracing::debug!(incident_id = %incident.id, "Incident saved to Sled");
        Ok(())
    }

    async fn get_incident(&self, id: &Uuid) -> Result<Option<Incident>> {
        self.load(id)
    }

    async fn update_incident(&self, incident: &Incident) -> Result<()> {
        let previous = self.load(&incident.id)?.ok_or_else(|| {
            AppError::NotFound(format!("Incident {} not found", incident.id))
        })?;

        self.write(incident, Some(&previous))?;

        tracing::debug!(incident_id = %incident.id, "Incident updated in Sled");
        Ok(())
    }

    async fn delete_incident(&self, id: &Uuid) -> Result<()> {
        let incident = self
            .load(id)?
            .ok_or_else(|| AppError::NotFound(format!("Incident {} not found", id)))?;

        self.incidents_tree.remove(Self::incident_key(id))?;
        self.timeline_tree
            .remove(Self::timeline_key(incident.timestamp, id))?;
        self.incidents_tree.flush()?;
        self.timeline_tree.flush()?;

        tracing::debug!(incident_id = %id, "Incident deleted from Sled");
        Ok(())
    }

    async fn find_incidents(
        &self,
        filter: &IncidentFilter,
        order: SortOrder,
        offset: u64,
        limit: u64,
    ) -> Result<Vec<Incident>> {
        self.scan(filter, order)
            .skip(usize::try_from(offset).unwrap_or(usize::MAX))
            .take(usize::try_from(limit).unwrap_or(usize::MAX))
            .collect()
    }

    async fn count_incidents(&self, filter: &IncidentFilter) -> Result<u64> {
        let mut count = 0u64;
        for incident in self.scan(filter, SortOrder::OldestFirst) {
            incident?;
            count += 1;
        }
        Ok(count)
    }

    async fn group_incidents(
        &self,
        filter: &IncidentFilter,
        grouping: Grouping,
    ) -> Result<Vec<(GroupKey, IncidentTally)>> {
        let mut acc = GroupAccumulator::new(grouping);
        for incident in self.scan(filter, SortOrder::OldestFirst) {
            acc.add(&incident?);
        }
        Ok(acc.finish())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{IncidentStatus, IncidentType, Severity};
    use crate::query::Constraint;
    use chrono::{Duration, TimeZone};
    use tempfile::TempDir;

    fn incident_at(ts: DateTime<Utc>) -> Incident {
        Incident::new(IncidentType::Fire, Severity::High, 0.9, "boiler").with_timestamp(ts)
    }

    #[tokio::test]
    async fn test_sled_persistence() {
        let temp_dir = TempDir::new().unwrap();
        let path = temp_dir.path().to_path_buf();

        let incident = incident_at(Utc::now());
        let id = incident.id;

        {
            let store = SledStore::new(&path).unwrap();
            store.save_incident(&incident).await.unwrap();
            store.flush().await.unwrap();
        }

        {
            let store = SledStore::new(&path).unwrap();
            let retrieved = store.get_incident(&id).await.unwrap();
            assert_eq!(retrieved, Some(incident));
        }
    }

    #[tokio::test]
    async fn test_timeline_range_scan() {
        let temp_dir = TempDir::new().unwrap();
        let store = SledStore::new(temp_dir.path()).unwrap();
        let base = Utc.with_ymd_and_hms(2024, 3, 5, 0, 0, 0).unwrap();

        for h in 0..10 {
            store
                .save_incident(&incident_at(base + Duration::hours(h)))
                .await
                .unwrap();
        }

        let filter = IncidentFilter::all()
            .with(Constraint::From(base + Duration::hours(2)))
            .with(Constraint::To(base + Duration::hours(5)));

        let found = store
            .find_incidents(&filter, SortOrder::NewestFirst, 0, 100)
            .await
            .unwrap();
        let hours: Vec<_> = found
            .iter()
            .map(|i| (i.timestamp - base).num_hours())
            .collect();
        assert_eq!(hours, vec![5, 4, 3, 2]);
        assert_eq!(store.count_incidents(&filter).await.unwrap(), 4);
    }

    #[tokio::test]
    async fn test_pre_epoch_ordering() {
        let temp_dir = TempDir::new().unwrap();
        let store = SledStore::new(temp_dir.path()).unwrap();

        let old = incident_at(Utc.with_ymd_and_hms(1960, 1, 1, 0, 0, 0).unwrap());
        let new = incident_at(Utc.with_ymd_and_hms(2020, 1, 1, 0, 0, 0).unwrap());
        store.save_incident(&new).await.unwrap();
        store.save_incident(&old).await.unwrap();

        let found = store
            .find_incidents(&IncidentFilter::all(), SortOrder::OldestFirst, 0, 10)
            .await
            .unwrap();
        assert_eq!(found[0].id, old.id);
        assert_eq!(found[1].id, new.id);
    }

    #[tokio::test]
    async fn test_same_millisecond_ordering() {
        let temp_dir = TempDir::new().unwrap();
        let store = SledStore::new(temp_dir.path()).unwrap();
        let base = Utc.with_ymd_and_hms(2024, 3, 5, 12, 0, 0).unwrap();

        // Later incident gets the smaller id half the time; ordering must follow the clock
        for ms in 0..10 {
            let at = base + Duration::milliseconds(ms);
            store
                .save_incident(&incident_at(at + Duration::microseconds(900)))
                .await
                .unwrap();
            store
                .save_incident(&incident_at(at + Duration::microseconds(100)))
                .await
                .unwrap();
        }

        let newest = store
            .find_incidents(&IncidentFilter::all(), SortOrder::NewestFirst, 0, 100)
            .await
            .unwrap();
        assert_eq!(newest.len(), 20);
        assert!(newest.windows(2).all(|w| w[0].timestamp > w[1].timestamp));

        // Bounds inside one millisecond are honored
        let window = IncidentFilter::all()
            .with(Constraint::From(base + Duration::microseconds(500)))
            .with(Constraint::To(base + Duration::microseconds(1_100)));
        let found = store
            .find_incidents(&window, SortOrder::OldestFirst, 0, 10)
            .await
            .unwrap();
        let offsets: Vec<_> = found
            .iter()
            .map(|i| (i.timestamp - base).num_microseconds().unwrap())
            .collect();
        assert_eq!(offsets, vec![900, 1_100]);
    }

    #[tokio::test]
    async fn test_update_keeps_index_consistent() {
        let temp_dir = TempDir::new().unwrap();
        let store = SledStore::new(temp_dir.path()).unwrap();

        let mut incident = incident_at(Utc::now());
        store.save_incident(&incident).await.unwrap();

        incident.transition_status(IncidentStatus::Resolved, Some("op"), Utc::now());
        store.update_incident(&incident).await.unwrap();
        store.save_incident(&incident).await.unwrap();

        assert_eq!(store.count_incidents(&IncidentFilter::all()).await.unwrap(), 1);

        store.delete_incident(&incident.id).await.unwrap();
        assert_eq!(store.count_incidents(&IncidentFilter::all()).await.unwrap(), 0);
    }
}
