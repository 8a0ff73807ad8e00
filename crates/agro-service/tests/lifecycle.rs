//! Producer lifecycle properties, checked against both store backends.

use std::sync::Arc;

use agro_core::document::cpf_from_base;
use agro_core::{Area, CoreError, CreateProducerInput, UpdateProducerInput, SEED_CROPS};
use agro_db::{CropCatalog, Database, DbConfig, MemoryStore, ProducerStore, SqliteStore};
use agro_service::{ProducerService, ServiceError};
use tempfile::TempDir;

const SOYBEAN: usize = 0;
const CORN: usize = 1;
const COTTON: usize = 2;
const UNKNOWN_CROP: &str = "00000000-0000-4000-8000-000000000000";

async fn sqlite_store() -> SqliteStore {
    Database::new(DbConfig::in_memory()).await.unwrap().store()
}

/// A database file with a five-connection pool. Keep the `TempDir` alive.
async fn file_store() -> (TempDir, SqliteStore) {
    let dir = TempDir::new().unwrap();
    let db = Database::new(DbConfig::new(dir.path().join("agro.db")).max_connections(5))
        .await
        .unwrap();
    (dir, db.store())
}

fn service_for<S>(store: &S) -> ProducerService<S, S>
where
    S: ProducerStore + CropCatalog + Clone,
{
    ProducerService::new(store.clone(), store.clone())
}

fn ha(hectares: i64) -> Area {
    Area::from_hundredths(hectares * 100)
}

fn crop_id(index: usize) -> String {
    SEED_CROPS[index].0.to_string()
}

fn input(document: &str, areas: (i64, i64, i64), crops: Vec<String>) -> CreateProducerInput {
    CreateProducerInput {
        document: document.to_string(),
        producer_name: "João da Silva".to_string(),
        farm_name: "Fazenda Boa Vista".to_string(),
        city: "Blumenau".to_string(),
        state: "SC".to_string(),
        total_area: ha(areas.0),
        agricultural_area: ha(areas.1),
        vegetation_area: ha(areas.2),
        crops,
    }
}

/// Runs one check against a fresh MemoryStore and a fresh SQLite database.
macro_rules! on_both_stores {
    ($name:ident, $check:ident) => {
        mod $name {
            use super::*;

            #[tokio::test]
            async fn memory() {
                $check(MemoryStore::new()).await;
            }

            #[tokio::test]
            async fn sqlite() {
                $check(sqlite_store().await).await;
            }
        }
    };
}

// =============================================================================
// Checks
// =============================================================================

async fn end_to_end_create_then_reject<S>(store: S)
where
    S: ProducerStore + CropCatalog + Clone,
{
    let service = service_for(&store);

    let created = service
        .create(input(
            "52998224725",
            (100, 70, 30),
            vec![crop_id(SOYBEAN), crop_id(CORN)],
        ))
        .await
        .unwrap();
    assert_eq!(created.crops.len(), 2);
    assert_eq!(created.producer.total_area, ha(100));

    let err = service
        .create(input("11144477735", (100, 80, 30), vec![crop_id(SOYBEAN)]))
        .await
        .unwrap_err();
    assert!(matches!(err, ServiceError::Domain(CoreError::InvalidArea { .. })));

    let dashboard = service.get_dashboard_data().await.unwrap();
    assert_eq!(dashboard.total_farms, 1);
}

async fn invalid_crop_reference_persists_nothing<S>(store: S)
where
    S: ProducerStore + CropCatalog + Clone,
{
    let service = service_for(&store);

    let err = service
        .create(input(
            "52998224725",
            (100, 70, 30),
            vec![crop_id(SOYBEAN), UNKNOWN_CROP.to_string()],
        ))
        .await
        .unwrap_err();
    assert!(matches!(
        err,
        ServiceError::Domain(CoreError::InvalidCropReference {
            requested: 2,
            found: 1
        })
    ));

    let dashboard = service.get_dashboard_data().await.unwrap();
    assert_eq!(dashboard.total_farms, 0);
    assert!(dashboard.farms_by_crop.is_empty());
}

async fn duplicate_document_rejected<S>(store: S)
where
    S: ProducerStore + CropCatalog + Clone,
{
    let service = service_for(&store);

    service
        .create(input("52998224725", (100, 70, 30), vec![crop_id(SOYBEAN)]))
        .await
        .unwrap();
    let err = service
        .create(input("52998224725", (50, 10, 10), vec![crop_id(CORN)]))
        .await
        .unwrap_err();
    assert!(matches!(
        err,
        ServiceError::Domain(CoreError::DuplicateDocument(_))
    ));

    assert_eq!(store.count().await.unwrap(), 1);
}

async fn concurrent_duplicate_creates<S>(store: S)
where
    S: ProducerStore + CropCatalog + Clone,
{
    let service = service_for(&store);

    let (first, second) = tokio::join!(
        service.create(input("52998224725", (100, 70, 30), vec![crop_id(SOYBEAN)])),
        service.create(input("52998224725", (90, 10, 10), vec![crop_id(CORN)])),
    );

    assert_one_duplicate_loser(first, second);
    assert_eq!(store.count().await.unwrap(), 1);
}

fn assert_one_duplicate_loser<T: std::fmt::Debug>(
    first: Result<T, ServiceError>,
    second: Result<T, ServiceError>,
) {
    let loser = match (first, second) {
        (Ok(_), Err(err)) | (Err(err), Ok(_)) => err,
        other => panic!("expected exactly one success, got {:?}", other),
    };
    assert!(
        matches!(loser, ServiceError::Domain(CoreError::DuplicateDocument(_))),
        "loser failed with {:?}",
        loser
    );
}

async fn punctuated_document_stored_as_digits<S>(store: S)
where
    S: ProducerStore + CropCatalog + Clone,
{
    let service = service_for(&store);

    let created = service
        .create(input("529.982.247-25", (100, 70, 30), vec![crop_id(SOYBEAN)]))
        .await
        .unwrap();
    assert_eq!(created.producer.document, "52998224725");

    let err = service
        .create(input("52998224725", (50, 10, 10), vec![crop_id(CORN)]))
        .await
        .unwrap_err();
    assert!(matches!(
        err,
        ServiceError::Domain(CoreError::DuplicateDocument(_))
    ));

    let other = service
        .create(input("11144477735", (50, 10, 10), vec![crop_id(CORN)]))
        .await
        .unwrap();
    let err = service
        .update(
            &other.producer.id,
            UpdateProducerInput {
                document: Some("529.982.247-25".to_string()),
                ..Default::default()
            },
        )
        .await
        .unwrap_err();
    assert!(matches!(
        err,
        ServiceError::Domain(CoreError::DuplicateDocument(_))
    ));

    let renamed = service
        .update(
            &other.producer.id,
            UpdateProducerInput {
                document: Some("11.222.333/0001-81".to_string()),
                ..Default::default()
            },
        )
        .await
        .unwrap();
    assert_eq!(renamed.producer.document, "11222333000181");
    assert_eq!(store.count().await.unwrap(), 2);
}

async fn reconcile_keeps_surviving_association<S>(store: S)
where
    S: ProducerStore + CropCatalog + Clone,
{
    let service = service_for(&store);

    let created = service
        .create(input(
            "52998224725",
            (100, 70, 30),
            vec![crop_id(SOYBEAN), crop_id(CORN)],
        ))
        .await
        .unwrap();
    let id = created.producer.id.clone();

    let before = store.find_by_id(&id).await.unwrap().unwrap();
    let corn_before = before
        .associations
        .iter()
        .find(|a| a.crop.id == crop_id(CORN))
        .unwrap()
        .id
        .clone();

    let updated = service
        .update(
            &id,
            UpdateProducerInput {
                crops: Some(vec![crop_id(CORN), crop_id(COTTON)]),
                ..Default::default()
            },
        )
        .await
        .unwrap();

    let mut names: Vec<&str> = updated.crops.iter().map(|c| c.name.as_str()).collect();
    names.sort();
    assert_eq!(names, vec!["Corn", "Cotton"]);

    let after = store.find_by_id(&id).await.unwrap().unwrap();
    let corn_after = after
        .associations
        .iter()
        .find(|a| a.crop.id == crop_id(CORN))
        .unwrap();
    assert_eq!(corn_after.id, corn_before);
    assert_eq!(after.associations.len(), 2);
}

async fn update_with_unknown_crop_changes_nothing<S>(store: S)
where
    S: ProducerStore + CropCatalog + Clone,
{
    let service = service_for(&store);
    let created = service
        .create(input("52998224725", (100, 70, 30), vec![crop_id(SOYBEAN)]))
        .await
        .unwrap();

    let err = service
        .update(
            &created.producer.id,
            UpdateProducerInput {
                farm_name: Some("Fazenda Nova".to_string()),
                crops: Some(vec![crop_id(CORN), UNKNOWN_CROP.to_string()]),
                ..Default::default()
            },
        )
        .await
        .unwrap_err();
    assert!(matches!(
        err,
        ServiceError::Domain(CoreError::InvalidCropReference { .. })
    ));

    let unchanged = service.find_one(&created.producer.id).await.unwrap();
    assert_eq!(unchanged, created);
}

async fn partial_area_update_rejected<S>(store: S)
where
    S: ProducerStore + CropCatalog + Clone,
{
    let service = service_for(&store);
    let created = service
        .create(input("52998224725", (100, 70, 30), vec![crop_id(SOYBEAN)]))
        .await
        .unwrap();

    let err = service
        .update(
            &created.producer.id,
            UpdateProducerInput {
                total_area: Some(ha(500)),
                ..Default::default()
            },
        )
        .await
        .unwrap_err();
    assert!(matches!(
        err,
        ServiceError::Domain(CoreError::InconsistentAreaFields)
    ));

    let updated = service
        .update(
            &created.producer.id,
            UpdateProducerInput {
                total_area: Some(ha(500)),
                agricultural_area: Some(ha(300)),
                vegetation_area: Some(ha(200)),
                ..Default::default()
            },
        )
        .await
        .unwrap();
    assert_eq!(updated.producer.total_area, ha(500));
    assert_eq!(updated.crops, created.crops);
}

async fn update_missing_producer<S>(store: S)
where
    S: ProducerStore + CropCatalog + Clone,
{
    let service = service_for(&store);
    let err = service
        .update(
            "3f1c0a0e-0000-4000-8000-000000000000",
            UpdateProducerInput {
                city: Some("Indaial".to_string()),
                ..Default::default()
            },
        )
        .await
        .unwrap_err();
    assert!(matches!(
        err,
        ServiceError::Domain(CoreError::ProducerNotFound(_))
    ));
}

async fn remove_cascades_associations<S>(store: S)
where
    S: ProducerStore + CropCatalog + Clone,
{
    let service = service_for(&store);
    let created = service
        .create(input(
            "52998224725",
            (100, 70, 30),
            vec![crop_id(SOYBEAN), crop_id(CORN)],
        ))
        .await
        .unwrap();

    service.remove(&created.producer.id).await.unwrap();

    assert!(matches!(
        service.find_one(&created.producer.id).await,
        Err(ServiceError::Domain(CoreError::ProducerNotFound(_)))
    ));
    assert!(store.count_grouped_by_crop_name().await.unwrap().is_empty());
    assert_eq!(service.list_crops().await.unwrap().len(), 5);

    assert!(service.remove(&created.producer.id).await.is_err());
}

async fn dashboard_on_empty_store<S>(store: S)
where
    S: ProducerStore + CropCatalog + Clone,
{
    let dashboard = service_for(&store).get_dashboard_data().await.unwrap();

    assert_eq!(dashboard.total_farms, 0);
    assert_eq!(dashboard.total_area, Area::zero());
    assert!(dashboard.farms_by_state.is_empty());
    assert!(dashboard.farms_by_crop.is_empty());
    assert_eq!(dashboard.land_usage.agricultural_area, Area::zero());
    assert_eq!(dashboard.land_usage.vegetation_area, Area::zero());
}

async fn dashboard_counts_associations<S>(store: S)
where
    S: ProducerStore + CropCatalog + Clone,
{
    let service = service_for(&store);

    let mut first = input(
        "52998224725",
        (100, 70, 30),
        vec![crop_id(SOYBEAN), crop_id(CORN)],
    );
    first.state = "PR".to_string();
    service.create(first).await.unwrap();
    service
        .create(input("11144477735", (50, 20, 10), vec![crop_id(SOYBEAN)]))
        .await
        .unwrap();

    let dashboard = service.get_dashboard_data().await.unwrap();
    assert_eq!(dashboard.total_farms, 2);
    assert_eq!(dashboard.total_area, ha(150));
    assert_eq!(dashboard.land_usage.agricultural_area, ha(90));
    assert_eq!(dashboard.land_usage.vegetation_area, ha(40));

    let states: Vec<(&str, i64)> = dashboard
        .farms_by_state
        .iter()
        .map(|s| (s.state.as_str(), s.count))
        .collect();
    assert_eq!(states, vec![("PR", 1), ("SC", 1)]);

    let crops: Vec<(&str, i64)> = dashboard
        .farms_by_crop
        .iter()
        .map(|c| (c.crop.as_str(), c.count))
        .collect();
    assert_eq!(crops, vec![("Corn", 1), ("Soybean", 2)]);
}

async fn paging_follows_insertion_order<S>(store: S)
where
    S: ProducerStore + CropCatalog + Clone,
{
    let service = service_for(&store);
    let documents = ["52998224725", "11144477735", "11222333000181"];
    for document in documents {
        service
            .create(input(document, (10, 5, 5), vec![crop_id(CORN)]))
            .await
            .unwrap();
    }

    let page: Vec<String> = service
        .find_all(1, 2)
        .await
        .unwrap()
        .into_iter()
        .map(|p| p.producer.document)
        .collect();
    assert_eq!(page, vec!["52998224725", "11144477735"]);

    let page = service.find_all(2, 2).await.unwrap();
    assert_eq!(page.len(), 1);
    assert_eq!(page[0].producer.document, "11222333000181");

    assert!(service.find_all(3, 2).await.unwrap().is_empty());
    assert!(matches!(
        service.find_all(0, 10).await,
        Err(ServiceError::Domain(CoreError::Validation(_)))
    ));
}

// =============================================================================
// Multi-connection SQLite
// =============================================================================

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn concurrent_writes_on_pooled_sqlite() {
    let (_dir, store) = file_store().await;
    let service = Arc::new(service_for(&store));

    let creates: Vec<_> = (0..40u32)
        .map(|n| {
            let service = Arc::clone(&service);
            let document = cpf_from_base(&format!("{:09}", 200_000_001 + n)).unwrap();
            tokio::spawn(async move {
                service
                    .create(input(&document, (10, 5, 5), vec![crop_id(CORN)]))
                    .await
            })
        })
        .collect();

    let mut ids = Vec::new();
    for handle in creates {
        ids.push(handle.await.unwrap().unwrap().producer.id);
    }
    assert_eq!(store.count().await.unwrap(), 40);

    let writes: Vec<_> = ids
        .iter()
        .enumerate()
        .map(|(n, id)| {
            let service = Arc::clone(&service);
            let id = id.clone();
            tokio::spawn(async move {
                if n % 2 == 0 {
                    service.remove(&id).await
                } else {
                    service
                        .update(
                            &id,
                            UpdateProducerInput {
                                city: Some("Indaial".to_string()),
                                crops: Some(vec![crop_id(SOYBEAN), crop_id(COTTON)]),
                                ..Default::default()
                            },
                        )
                        .await
                        .map(|_| ())
                }
            })
        })
        .collect();

    for handle in writes {
        handle.await.unwrap().unwrap();
    }

    let dashboard = service.get_dashboard_data().await.unwrap();
    assert_eq!(dashboard.total_farms, 20);
    let crops: Vec<(&str, i64)> = dashboard
        .farms_by_crop
        .iter()
        .map(|c| (c.crop.as_str(), c.count))
        .collect();
    assert_eq!(crops, vec![("Cotton", 20), ("Soybean", 20)]);
}

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn concurrent_duplicates_on_pooled_sqlite() {
    let (_dir, store) = file_store().await;
    let service = Arc::new(service_for(&store));

    let spawn_create = |areas: (i64, i64, i64), crop: usize| {
        let service = Arc::clone(&service);
        tokio::spawn(async move {
            service
                .create(input("52998224725", areas, vec![crop_id(crop)]))
                .await
        })
    };
    let first = spawn_create((100, 70, 30), SOYBEAN);
    let second = spawn_create((90, 10, 10), CORN);

    assert_one_duplicate_loser(first.await.unwrap(), second.await.unwrap());
    assert_eq!(store.count().await.unwrap(), 1);
}

// =============================================================================
// Test Matrix
// =============================================================================

on_both_stores!(end_to_end, end_to_end_create_then_reject);
on_both_stores!(invalid_crop_reference, invalid_crop_reference_persists_nothing);
on_both_stores!(duplicate_document, duplicate_document_rejected);
on_both_stores!(concurrent_duplicates, concurrent_duplicate_creates);
on_both_stores!(punctuated_document, punctuated_document_stored_as_digits);
on_both_stores!(reconcile, reconcile_keeps_surviving_association);
on_both_stores!(update_unknown_crop, update_with_unknown_crop_changes_nothing);
on_both_stores!(partial_area_update, partial_area_update_rejected);
on_both_stores!(update_missing, update_missing_producer);
on_both_stores!(remove_cascade, remove_cascades_associations);
on_both_stores!(empty_dashboard, dashboard_on_empty_store);
on_both_stores!(dashboard_counts, dashboard_counts_associations);
on_both_stores!(paging, paging_follows_insertion_order);
