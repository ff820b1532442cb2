//! Sandboxed storage for uploaded files.
//!
//! Every path handed to [`Storage`] is relative to a canonicalized root and is rejected if it
//! would escape it (absolute paths, `..` above the root, symlinked parents pointing outside).
//! Writes go to a unique temporary file that is synced and renamed over the target, so a
//! reader never observes a partial file. Orphaned temporaries from a crash are purged when the
//! storage is opened.
//!
//! ```rust
//! use fhub_storage::{Storage, StorageError};
//!
//! #[tokio::main]
//! async fn main() -> Result<(), StorageError> {
//!     # let tmp = tempfile::tempdir().unwrap();
//!     let storage = Storage::builder(tmp.path().join("uploads")).connect().await?;
//!
//!     storage.write("C100/TAS1/a1-invoice.pdf", b"%PDF-1.7").await?;
//!     assert_eq!(storage.read("C100/TAS1/a1-invoice.pdf").await?, b"%PDF-1.7");
//!     assert!(storage.write("../escape.pdf", b"x").await.is_err());
//!     Ok(())
//! }
//! ```

mod builder;
mod engine;
mod error;
mod maintenance;
mod security;

pub use builder::StorageBuilder;
pub use engine::Storage;
pub use error::{StorageError, StorageErrorExt};
pub use security::sanitize_file_name;
