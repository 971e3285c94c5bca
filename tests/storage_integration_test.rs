mod common;

use chrono::Duration;
use common::{base_time, create_test_incident, mixed_incidents, seed};
use safety_incident_manager::{
    analytics::{bucketize, compute_statistics, sector_breakdown, Interval},
    models::{IncidentStatus, IncidentType, Severity},
    query::{paginate, Constraint, IncidentFilter, PageRequest},
    state::{IncidentStore, InMemoryStore, SledStore, SortOrder},
};
use tempfile::TempDir;

/// Test suite that runs against any IncidentStore implementation
async fn test_store_operations(store: &dyn IncidentStore) {
    // Test 1: Save and retrieve incident
    let incident = create_test_incident(IncidentType::Fire, Severity::High, "kiln", base_time());
    let id = incident.id;

    store.save_incident(&incident).await.unwrap();

    let retrieved = store.get_incident(&id).await.unwrap();
    assert_eq!(retrieved.as_ref(), Some(&incident));

    // Test 2: Update incident
    let mut incident = retrieved.unwrap();
    incident.transition_status(IncidentStatus::Resolved, Some("op-1"), base_time());
    store.update_incident(&incident).await.unwrap();

    let updated = store.get_incident(&id).await.unwrap().unwrap();
    assert_eq!(updated.status, IncidentStatus::Resolved);
    assert_eq!(updated.resolution_time, Some(base_time()));

    // Test 3: List and count
    let filter = IncidentFilter::all();
    let incidents = store
        .find_incidents(&filter, SortOrder::NewestFirst, 0, 10)
        .await
        .unwrap();
    assert_eq!(incidents.len(), 1);
    assert_eq!(store.count_incidents(&filter).await.unwrap(), 1);

    // Test 4: Delete incident
    store.delete_incident(&id).await.unwrap();
    assert!(store.get_incident(&id).await.unwrap().is_none());
}

async fn test_filtering(store: &dyn IncidentStore) {
    seed(store, mixed_incidents()).await;

    let fires = IncidentFilter::all().with(Constraint::Type(IncidentType::Fire));
    assert_eq!(store.count_incidents(&fires).await.unwrap(), 4);

    let dock_fires = fires
        .clone()
        .with(Constraint::Sector("loading-dock".to_string()));
    let found = store
        .find_incidents(&dock_fires, SortOrder::NewestFirst, 0, 100)
        .await
        .unwrap();
    assert!(found
        .iter()
        .all(|i| i.incident_type == IncidentType::Fire && i.sector == "loading-dock"));

    // Inclusive bounds on both ends
    let window = IncidentFilter::all()
        .with(Constraint::From(base_time() + Duration::hours(7)))
        .with(Constraint::To(base_time() + Duration::hours(21)));
    assert_eq!(store.count_incidents(&window).await.unwrap(), 3);

    // from after to is an empty set, not an error
    let inverted = IncidentFilter::all()
        .with(Constraint::From(base_time() + Duration::days(30)))
        .with(Constraint::To(base_time()));
    assert_eq!(store.count_incidents(&inverted).await.unwrap(), 0);
    assert!(store
        .find_incidents(&inverted, SortOrder::NewestFirst, 0, 10)
        .await
        .unwrap()
        .is_empty());
}

async fn test_pagination(store: &dyn IncidentStore) {
    let incidents = seed(
        store,
        (0..12)
            .map(|i| {
                create_test_incident(
                    IncidentType::Ppe,
                    Severity::Low,
                    "gate",
                    base_time() + Duration::minutes(i),
                )
            })
            .collect(),
    )
    .await;

    let filter = IncidentFilter::all();
    let page = paginate(store, &filter, PageRequest::new(2, 5).unwrap())
        .await
        .unwrap();

    assert_eq!(page.total, 12);
    assert_eq!(page.pages, 3);
    assert_eq!(page.count(), 5);

    // Newest first: records 6..=10 are minutes 6..=2
    let expected: Vec<_> = incidents.iter().rev().skip(5).take(5).map(|i| i.id).collect();
    let actual: Vec<_> = page.items.iter().map(|i| i.id).collect();
    assert_eq!(actual, expected);

    // Past the end
    let empty = paginate(store, &filter, PageRequest::new(4, 5).unwrap())
        .await
        .unwrap();
    assert!(empty.items.is_empty());
    assert_eq!(empty.total, 12);

    // count never undercounts any page
    for p in 1..=3 {
        let page = paginate(store, &filter, PageRequest::new(p, 5).unwrap())
            .await
            .unwrap();
        assert!(page.total >= page.count() as u64);
    }
}

async fn test_aggregates(store: &dyn IncidentStore) {
    seed(store, mixed_incidents()).await;
    let filter = IncidentFilter::all();

    let stats = compute_statistics(store, &filter).await.unwrap();
    assert_eq!(stats.total_incidents, 10);
    assert_eq!(stats.by_type.fire, 4);
    assert_eq!(stats.by_type.percentage.fire, 40.0);
    assert_eq!(stats.by_type.percentage.other, 10.0);

    let sectors = sector_breakdown(store, &filter).await.unwrap();
    assert_eq!(sectors.len(), 2);
    assert_eq!(sectors[0].sector, "assembly");
    assert_eq!(sectors.iter().map(|s| s.count).sum::<u64>(), 10);

    for interval in [Interval::Hour, Interval::Day, Interval::Week, Interval::Month] {
        let buckets = bucketize(store, &filter, interval).await.unwrap();
        let sum: u64 = buckets.iter().map(|b| b.count).sum();
        assert_eq!(sum, stats.total_incidents, "interval {}", interval);
        assert!(buckets.windows(2).all(|w| w[0].bucket_key < w[1].bucket_key));

        // Repeating a query gives the same answer
        assert_eq!(bucketize(store, &filter, interval).await.unwrap(), buckets);
    }
}

async fn test_empty_aggregates(store: &dyn IncidentStore) {
    let filter = IncidentFilter::all();

    let stats = compute_statistics(store, &filter).await.unwrap();
    assert_eq!(stats.total_incidents, 0);
    assert_eq!(stats.by_type.percentage.fire, 0.0);

    assert!(sector_breakdown(store, &filter).await.unwrap().is_empty());
    assert!(bucketize(store, &filter, Interval::Day)
        .await
        .unwrap()
        .is_empty());
}

#[tokio::test]
async fn test_in_memory_store() {
    test_store_operations(&InMemoryStore::new()).await;
    test_filtering(&InMemoryStore::new()).await;
    test_pagination(&InMemoryStore::new()).await;
    test_aggregates(&InMemoryStore::new()).await;
    test_empty_aggregates(&InMemoryStore::new()).await;
}

#[tokio::test]
async fn test_sled_store() {
    let dirs: Vec<TempDir> = (0..5).map(|_| TempDir::new().unwrap()).collect();
    let store = |i: usize| SledStore::new(dirs[i].path()).unwrap();

    test_store_operations(&store(0)).await;
    test_filtering(&store(1)).await;
    test_pagination(&store(2)).await;
    test_aggregates(&store(3)).await;
    test_empty_aggregates(&store(4)).await;
}

#[tokio::test]
async fn test_backends_agree() {
    let temp_dir = TempDir::new().unwrap();
    let sled = SledStore::new(temp_dir.path()).unwrap();
    let memory = InMemoryStore::new();

    for incident in mixed_incidents() {
        sled.save_incident(&incident).await.unwrap();
        memory.save_incident(&incident).await.unwrap();
    }

    let filter = IncidentFilter::all().with(Constraint::Severity(Severity::Critical));
    for order in [SortOrder::NewestFirst, SortOrder::OldestFirst] {
        let a = sled.find_incidents(&filter, order, 0, 100).await.unwrap();
        let b = memory.find_incidents(&filter, order, 0, 100).await.unwrap();
        assert_eq!(a, b);
    }

    assert_eq!(
        compute_statistics(&sled, &IncidentFilter::all()).await.unwrap(),
        compute_statistics(&memory, &IncidentFilter::all()).await.unwrap()
    );
}

#[tokio::test]
async fn test_backends_agree_within_a_millisecond() {
    let temp_dir = TempDir::new().unwrap();
    let sled = SledStore::new(temp_dir.path()).unwrap();
    let memory = InMemoryStore::new();

    for ms in 0..20 {
        let at = base_time() + Duration::milliseconds(ms);
        for micros in [100, 900] {
            let incident = create_test_incident(
                IncidentType::Fall,
                Severity::Medium,
                "stairs",
                at + Duration::microseconds(micros),
            );
            sled.save_incident(&incident).await.unwrap();
            memory.save_incident(&incident).await.unwrap();
        }
    }

    let filter = IncidentFilter::all();
    let from_sled = sled
        .find_incidents(&filter, SortOrder::NewestFirst, 0, 100)
        .await
        .unwrap();
    let from_memory = memory
        .find_incidents(&filter, SortOrder::NewestFirst, 0, 100)
        .await
        .unwrap();

    assert_eq!(from_sled.len(), 40);
    assert!(from_sled
        .windows(2)
        .all(|w| w[0].timestamp > w[1].timestamp));
    assert_eq!(from_sled, from_memory);

    // Page boundaries line up too
    let page_sled = paginate(&sled, &filter, PageRequest::new(3, 7).unwrap())
        .await
        .unwrap();
    let page_memory = paginate(&memory, &filter, PageRequest::new(3, 7).unwrap())
        .await
        .unwrap();
    assert_eq!(page_sled.items, page_memory.items);
}
