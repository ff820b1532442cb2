//! Shared string constants: `OpenAPI` tags, header names, table names and upload limits.

pub const SYSTEM_TAG: &str = "System";
pub const TRACKING_TAG: &str = "Tracking";
pub const WAREHOUSE_TAG: &str = "Warehouse";
pub const INGEST_TAG: &str = "Ingestion";
pub const INVOICES_TAG: &str = "Invoices";
pub const BROADCASTS_TAG: &str = "Broadcasts";
pub const CUSTOMERS_TAG: &str = "Customers";
pub const ANALYTICS_TAG: &str = "Analytics";

/// Header carrying a warehouse API key.
pub const WAREHOUSE_KEY_HEADER: &str = "x-warehouse-key";
/// Header carrying the external ingestion token.
pub const API_TOKEN_HEADER: &str = "x-api-token";

pub const PACKAGE_TABLE: &str = "package";
pub const CUSTOMER_TABLE: &str = "customer";
pub const BROADCAST_TABLE: &str = "broadcast";

pub const MIME_PDF: &str = "application/pdf";
pub const MIME_JPEG: &str = "image/jpeg";
pub const MIME_PNG: &str = "image/png";
pub const MIME_WEBP: &str = "image/webp";

/// MIME types accepted for invoice uploads.
pub const ALLOWED_UPLOAD_TYPES: [&str; 4] = [MIME_PDF, MIME_JPEG, MIME_PNG, MIME_WEBP];

/// 10 MiB per file.
pub const DEFAULT_MAX_UPLOAD_BYTES: u64 = 10 * 1024 * 1024;
pub const DEFAULT_MAX_UPLOAD_FILES: usize = 5;
