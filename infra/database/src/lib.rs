//! # Database Infrastructure
//!
//! Connects to [SurrealDB](https://surrealdb.com), applies the embedded schema migrations and
//! provides the repository implementations behind the domain ports.
//!
//! * **Engine agnostic**: `mem://`, `rocksdb://`, `ws://` and `http://` through the `any` engine.
//! * **Resilient start**: health checks are retried with exponential backoff.
//! * **Checksummed migrations**: a recorded migration whose script changed aborts start-up.
//! * **Two backends**: [`Repositories::surreal`] and [`Repositories::in_memory`].
//!
//! ```rust
//! use fhub_database::{Database, DatabaseError, Repositories};
//!
//! #[tokio::main]
//! async fn main() -> Result<(), DatabaseError> {
//!     let db = Database::builder().url("mem://").session("fhub", "core").init().await?;
//!     let _repositories = Repositories::surreal(&db);
//!     Ok(())
//! }
//! ```

mod error;
mod migrations;
mod repo;

pub use error::{DatabaseError, DatabaseErrorExt};
pub use migrations::MigrationReport;
pub use repo::*;

use fhub_domain::config::DatabaseConfig;
use migrations::MigrationRunner;
use std::ops::Deref;
use std::sync::Arc;
use std::time::Duration;
use surrealdb::Surreal;
use surrealdb::engine::any::{Any, connect};
use surrealdb::opt::auth::Root;
use tracing::{info, instrument, warn};

const HEALTH_ATTEMPTS: u32 = 3;

#[derive(Debug)]
pub struct DatabaseInner {
    instance: Surreal<Any>,
    ns: String,
    db: String,
}

impl Drop for DatabaseInner {
    fn drop(&mut self) {
        info!(ns = %self.ns, db = %self.db, "SurrealDB session handle dropped");
    }
}

/// Shared `SurrealDB` client. Derefs to the underlying [`Surreal`] handle.
#[derive(Debug, Clone)]
pub struct Database {
    inner: Arc<DatabaseInner>,
}

impl Database {
    pub fn builder() -> DatabaseBuilder {
        DatabaseBuilder::default()
    }

    /// Re-runs the migration check. Already applied scripts are verified and skipped.
    ///
    /// # Errors
    /// [`DatabaseError::Migration`] on checksum mismatch, [`DatabaseError::Surreal`] on
    /// query failure.
    pub async fn migrate(&self) -> Result<MigrationReport, DatabaseError> {
        MigrationRunner::new(&self.inner.instance).run().await
    }
}

impl Deref for Database {
    type Target = Surreal<Any>;

    fn deref(&self) -> &Self::Target {
        &self.inner.instance
    }
}

#[must_use = "builders do nothing unless you call .init()"]
#[derive(Debug, Default)]
pub struct DatabaseBuilder {
    url: Option<String>,
    ns: Option<String>,
    db: Option<String>,
    auth: Option<(String, String)>,
}

impl DatabaseBuilder {
    /// Seeds the builder from the `database` configuration section.
    pub fn from_config(config: &DatabaseConfig) -> Self {
        let builder =
            Self::default().url(&config.url).session(&config.namespace, &config.database);
        match &config.credentials {
            Some(creds) => builder.auth(&creds.username, &creds.password),
            None => builder,
        }
    }

    pub fn url(mut self, url: impl Into<String>) -> Self {
        self.url = Some(url.into());
        self
    }

    pub fn session(mut self, namespace: impl Into<String>, database: impl Into<String>) -> Self {
        self.ns = Some(namespace.into());
        self.db = Some(database.into());
        self
    }

    /// Root credentials, signed in before the session is selected.
    pub fn auth(mut self, username: impl Into<String>, password: impl Into<String>) -> Self {
        self.auth = Some((username.into(), password.into()));
        self
    }

    /// Connects, waits for the engine to report healthy, signs in, selects the namespace and
    /// database, then applies pending migrations.
    ///
    /// # Errors
    /// * [`DatabaseError::Validation`] if the URL, namespace or database is missing.
    /// * [`DatabaseError::Connection`] if the engine does not start or stays unhealthy.
    /// * [`DatabaseError::Auth`] if the credentials are rejected.
    /// * [`DatabaseError::Migration`] if a recorded migration no longer matches.
    #[instrument(skip(self), fields(url = self.url, ns = self.ns, db = self.db))]
    pub async fn init(self) -> Result<Database, DatabaseError> {
        let url = required(self.url, "URL")?;
        let ns = required(self.ns, "Namespace")?;
        let db = required(self.db, "Database")?;

        let instance = connect(&url).await.map_err(|e| DatabaseError::Connection {
            message: e.to_string().into(),
            context: Some("Initializing engine".into()),
        })?;

        let mut delay = Duration::from_millis(500);
        for attempt in 1..=HEALTH_ATTEMPTS {
            if instance.health().await.is_ok() {
                break;
            }
            if attempt == HEALTH_ATTEMPTS {
                return Err(DatabaseError::Connection {
                    message: "Unhealthy after retries".into(),
                    context: Some(url.into()),
                });
            }
            warn!(attempt, ?delay, "Database not ready, retrying...");
            tokio::time::sleep(delay).await;
            delay *= 2;
        }

        if let Some((username, password)) = self.auth {
            instance.signin(Root { username, password }).await.map_err(|e| {
                DatabaseError::Auth { message: e.to_string().into(), context: Some(url.into()) }
            })?;
        }

        instance.use_ns(&ns).use_db(&db).await.context("Activating session")?;

        let version =
            instance.version().await.map_or_else(|_| "unknown".to_owned(), |v| v.to_string());
        info!(namespace = %ns, database = %db, %version, "SurrealDB connection established");

        let report = MigrationRunner::new(&instance).run().await?;
        for version in &report.applied {
            info!(%version, "Applied migration");
        }
        info!(applied = report.applied.len(), skipped = report.skipped.len(), "Database schema up to date");

        Ok(Database { inner: Arc::new(DatabaseInner { instance, ns, db }) })
    }
}

fn required(value: Option<String>, what: &'static str) -> Result<String, DatabaseError> {
    value.filter(|v| !v.trim().is_empty()).ok_or_else(|| DatabaseError::Validation {
        message: format!("{what} is required").into(),
        context: None,
    })
}
