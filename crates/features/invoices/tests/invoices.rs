use chrono::Utc;
use fhub_database::Repositories;
use fhub_domain::config::UploadsConfig;
use fhub_domain::package::{HistoryEntry, InvoiceStatus, Package, UpdateSource};
use fhub_domain::ports::PackageRepository;
use fhub_domain::status::PackageStatus;
use fhub_invoices::{InvoiceError, InvoiceUpload, Invoices, UploadedFile};
use fhub_storage::Storage;
use std::sync::Arc;
use tempfile::TempDir;

const PDF: &[u8] = b"%PDF-1.7\n1 0 obj\n";
const PNG: &[u8] = b"\x89PNG\r\n\x1a\n\0\0\0\rIHDR";

struct Fixture {
    invoices: Invoices,
    packages: Arc<dyn PackageRepository>,
    storage: Storage,
    _dir: TempDir,
}

async fn fixture(limits: UploadsConfig) -> Fixture {
    let dir = tempfile::tempdir().unwrap();
    let storage = Storage::builder(dir.path().join("uploads")).connect().await.unwrap();
    let packages = Repositories::in_memory().packages;

    let mut package = Package::new("TAS1", PackageStatus::AtWarehouse, Utc::now());
    package.user_code = Some("C100".to_owned());
    packages.upsert_fields(&package).await.unwrap();
    packages.append_history("TAS1", &received()).await.unwrap();

    let invoices = fhub_invoices::service(packages.clone(), storage.clone(), limits);
    Fixture { invoices, packages, storage, _dir: dir }
}

fn received() -> HistoryEntry {
    HistoryEntry {
        status: PackageStatus::AtWarehouse,
        at: Utc::now(),
        note: None,
        location: Some("Miami".to_owned()),
        source: UpdateSource::Warehouse,
    }
}

fn file(name: &str, content_type: &str, bytes: &[u8]) -> UploadedFile {
    UploadedFile { file_name: name.to_owned(), content_type: content_type.to_owned(), bytes: bytes.to_vec() }
}

fn upload(files: Vec<UploadedFile>) -> InvoiceUpload {
    InvoiceUpload { tracking_number: "TAS1".to_owned(), amount: Some(49.99), note: None, files }
}

#[tokio::test]
async fn init_creates_slice() {
    let f = fixture(UploadsConfig::default()).await;
    let slice = fhub_invoices::init(f.packages, f.storage, UploadsConfig::default()).unwrap();
    assert_eq!(slice.id, std::any::TypeId::of::<Invoices>());
}

#[tokio::test]
async fn submit_stores_files_and_appends_record() {
    let f = fixture(UploadsConfig::default()).await;

    let receipt = f
        .invoices
        .submit("C100", upload(vec![file("../My Bill.pdf", "application/pdf", PDF), file("r.png", "image/png", PNG)]))
        .await
        .unwrap();

    assert_eq!(receipt.documents.len(), 2);
    let doc = &receipt.documents[0];
    assert_eq!(doc.file_name, "My_Bill.pdf");
    assert!(doc.stored_path.starts_with("C100/TAS1/"));
    assert!(doc.stored_path.ends_with("-My_Bill.pdf"));
    assert_eq!(f.storage.read(&doc.stored_path).await.unwrap(), PDF);

    let stored = f.packages.find("TAS1").await.unwrap().unwrap();
    assert_eq!(stored.invoice_documents.len(), 2);
    assert_eq!(stored.invoice_records.len(), 1);
    assert_eq!(stored.invoice_records[0].status, InvoiceStatus::Submitted);
    assert_eq!(stored.invoice_records[0].document_ids.len(), 2);
    assert_eq!(stored.pending_invoices(), 1);
    assert_eq!(stored.status, PackageStatus::AtWarehouse);
}

#[tokio::test]
async fn one_bad_file_rejects_the_whole_upload() {
    let f = fixture(UploadsConfig::default()).await;

    let err = f
        .invoices
        .submit("C100", upload(vec![file("a.pdf", "application/pdf", PDF), file("b.gif", "image/gif", b"GIF89a")]))
        .await
        .unwrap_err();

    assert!(matches!(err, InvoiceError::UnsupportedType { .. }));
    assert!(!f.storage.root().join("C100").exists());
    assert!(f.packages.find("TAS1").await.unwrap().unwrap().invoice_documents.is_empty());
}

#[tokio::test]
async fn limits_are_enforced() {
    let limits = UploadsConfig { max_file_bytes: 10, max_files: 1, ..UploadsConfig::default() };
    let f = fixture(limits).await;

    let err = f.invoices.submit("C100", upload(vec![file("a.pdf", "application/pdf", PDF)])).await.unwrap_err();
    assert!(matches!(err, InvoiceError::TooLarge { .. }));

    let small = b"%PDF-1";
    let err = f
        .invoices
        .submit("C100", upload(vec![file("a.pdf", "application/pdf", small), file("b.pdf", "application/pdf", small)]))
        .await
        .unwrap_err();
    assert!(matches!(err, InvoiceError::Validation { .. }));
}

#[tokio::test]
async fn foreign_packages_are_not_found() {
    let f = fixture(UploadsConfig::default()).await;

    let err = f.invoices.submit("C200", upload(vec![file("a.pdf", "application/pdf", PDF)])).await.unwrap_err();
    assert!(matches!(err, InvoiceError::NotFound { .. }));
}

#[tokio::test]
async fn review_updates_only_the_record() {
    let f = fixture(UploadsConfig::default()).await;
    let receipt = f.invoices.submit("C100", upload(vec![file("a.pdf", "application/pdf", PDF)])).await.unwrap();

    let reviewed = f
        .invoices
        .review("TAS1", &receipt.record.id, InvoiceStatus::Rejected, Some("Illegible".to_owned()))
        .await
        .unwrap();

    assert_eq!(reviewed.status, InvoiceStatus::Rejected);
    assert_eq!(reviewed.review_note.as_deref(), Some("Illegible"));
    assert!(reviewed.reviewed_at.is_some());

    let stored = f.packages.find("TAS1").await.unwrap().unwrap();
    assert_eq!(stored.invoice_records[0].status, InvoiceStatus::Rejected);
    assert_eq!(stored.status, PackageStatus::AtWarehouse);

    assert!(matches!(
        f.invoices.review("TAS1", "missing", InvoiceStatus::Reviewed, None).await,
        Err(InvoiceError::NotFound { .. })
    ));
    assert!(matches!(
        f.invoices.review("TAS1", &receipt.record.id, InvoiceStatus::Submitted, None).await,
        Err(InvoiceError::Validation { .. })
    ));
}

#[tokio::test]
async fn submissions_accumulate_alongside_history() {
    let f = fixture(UploadsConfig::default()).await;

    f.invoices.submit("C100", upload(vec![file("a.pdf", "application/pdf", PDF)])).await.unwrap();
    f.packages.append_history("TAS1", &received()).await.unwrap();
    f.invoices.submit("C100", upload(vec![file("b.png", "image/png", PNG)])).await.unwrap();

    let stored = f.packages.find("TAS1").await.unwrap().unwrap();
    assert_eq!(stored.invoice_records.len(), 2);
    assert_eq!(stored.invoice_documents.len(), 2);
    assert_eq!(stored.history.len(), 2);
}
