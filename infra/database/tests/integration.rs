use fhub_database::{Database, DatabaseBuilder, DatabaseError};
use fhub_domain::config::DatabaseConfig;

#[tokio::test]
async fn connect_in_memory_applies_migrations_once() {
    let db = Database::builder()
        .url("mem://")
        .session("test_ns", "test_db")
        .init()
        .await
        .expect("connect to mem://");

    db.health().await.expect("health check");

    let report = db.migrate().await.expect("second migration run");
    assert!(report.applied.is_empty());
    assert_eq!(report.skipped, ["0001-core"]);
}

#[tokio::test]
async fn builder_from_default_config_connects() {
    let db = DatabaseBuilder::from_config(&DatabaseConfig::default()).init().await;
    assert!(db.is_ok());
}

#[tokio::test]
async fn missing_parameters_fail_validation() {
    let err = Database::builder().init().await.unwrap_err();
    assert!(matches!(err, DatabaseError::Validation { .. }));

    let err = Database::builder().url("mem://").session("", "db").init().await.unwrap_err();
    assert_eq!(err.code(), "validation");
}

mod packages {
    use chrono::{TimeZone, Utc};
    use fhub_database::{Database, Repositories};
    use fhub_domain::package::{HistoryEntry, InvoiceRecord, InvoiceStatus, Package, UpdateSource};
    use fhub_domain::status::PackageStatus;

    async fn repositories() -> Repositories {
        let db = Database::builder().url("mem://").session("pkg_ns", "pkg_db").init().await.unwrap();
        Repositories::surreal(&db)
    }

    fn entry(status: PackageStatus, second: u32) -> HistoryEntry {
        HistoryEntry {
            status,
            at: Utc.with_ymd_and_hms(2025, 6, 1, 8, 0, second).unwrap(),
            note: None,
            location: None,
            source: UpdateSource::Warehouse,
        }
    }

    fn invoice(id: &str) -> InvoiceRecord {
        InvoiceRecord {
            id: id.to_owned(),
            document_ids: Vec::new(),
            amount: Some(12.5),
            note: None,
            status: InvoiceStatus::Submitted,
            submitted_at: Utc.with_ymd_and_hms(2025, 6, 1, 9, 0, 0).unwrap(),
            reviewed_at: None,
            review_note: None,
        }
    }

    #[tokio::test]
    async fn stale_writers_never_drop_entries() {
        let packages = repositories().await.packages;
        let created = Utc.with_ymd_and_hms(2025, 6, 1, 8, 0, 0).unwrap();
        let mut package = Package::new("TAS77", PackageStatus::AtWarehouse, created);
        package.user_code = Some("C1".to_owned());
        packages.upsert_fields(&package).await.unwrap();
        assert!(packages.append_history("TAS77", &entry(PackageStatus::AtWarehouse, 0)).await.unwrap());

        let stale = packages.find("TAS77").await.unwrap().unwrap();
        assert!(packages.append_history("TAS77", &entry(PackageStatus::InTransit, 1)).await.unwrap());
        assert!(packages.append_invoice("TAS77", &invoice("inv1"), &[], Utc::now()).await.unwrap());

        let mut later = stale;
        later.weight = Some(3.0);
        later.created_at = Utc::now();
        packages.upsert_fields(&later).await.unwrap();

        let stored = packages.find("TAS77").await.unwrap().unwrap();
        assert_eq!(stored.history.len(), 2);
        assert_eq!(stored.invoice_records.len(), 1);
        assert_eq!(stored.weight, Some(3.0));
        assert_eq!(stored.created_at, created);
    }

    #[tokio::test]
    async fn invoice_review_replaces_one_record() {
        let packages = repositories().await.packages;
        packages.upsert_fields(&Package::new("TAS78", PackageStatus::AtWarehouse, Utc::now())).await.unwrap();
        packages.append_invoice("TAS78", &invoice("a"), &[], Utc::now()).await.unwrap();
        packages.append_invoice("TAS78", &invoice("b"), &[], Utc::now()).await.unwrap();

        let mut rejected = invoice("a");
        rejected.status = InvoiceStatus::Rejected;
        assert!(packages.update_invoice("TAS78", &rejected, Utc::now()).await.unwrap());
        assert!(!packages.update_invoice("TAS78", &invoice("zz"), Utc::now()).await.unwrap());
        assert!(!packages.append_history("MISSING", &entry(PackageStatus::Unknown, 0)).await.unwrap());

        let stored = packages.find("TAS78").await.unwrap().unwrap();
        let statuses: Vec<_> = stored.invoice_records.iter().map(|r| r.status).collect();
        assert_eq!(statuses, [InvoiceStatus::Rejected, InvoiceStatus::Submitted]);
    }
}
