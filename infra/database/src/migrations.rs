use crate::error::{DatabaseError, DatabaseErrorExt};
use fxhash::FxHashMap;
use sha2::{Digest, Sha256};
use surrealdb::Surreal;
use surrealdb::engine::any::Any;
use surrealdb::types::SurrealValue;

/// Schema scripts in apply order. Versions follow `0000-name`.
const MIGRATIONS: &[(&str, &str)] = &[("0001-core", include_str!("../migrations/0001-core.surql"))];

#[derive(Debug)]
struct Migration {
    version: &'static str,
    script: &'static str,
    checksum: String,
}

impl Migration {
    fn embedded() -> Vec<Self> {
        MIGRATIONS
            .iter()
            .map(|(version, script)| Self { version, script, checksum: checksum(script) })
            .collect()
    }
}

fn checksum(script: &str) -> String {
    let mut hasher = Sha256::new();
    hasher.update(script.as_bytes());
    hex::encode(hasher.finalize())
}

/// Outcome of a migration run, by version.
#[derive(Debug, Default, Clone, PartialEq, Eq)]
pub struct MigrationReport {
    pub applied: Vec<String>,
    pub skipped: Vec<String>,
}

#[derive(Debug, SurrealValue)]
struct AppliedMigration {
    version: String,
    checksum: String,
}

#[derive(Debug)]
pub(crate) struct MigrationRunner<'a> {
    db: &'a Surreal<Any>,
}

impl<'a> MigrationRunner<'a> {
    pub(crate) const fn new(db: &'a Surreal<Any>) -> Self {
        Self { db }
    }

    /// Applies every embedded migration not yet recorded; verifies checksums of recorded ones.
    pub(crate) async fn run(&self) -> Result<MigrationReport, DatabaseError> {
        let mut report = MigrationReport::default();
        let applied = self.applied().await?;

        for migration in Migration::embedded() {
            if let Some(existing) = applied.get(migration.version) {
                ensure_checksum_match(&migration, &existing.checksum)?;
                report.skipped.push(migration.version.to_owned());
                continue;
            }

            self.apply(&migration).await?;
            report.applied.push(migration.version.to_owned());
        }

        Ok(report)
    }

    async fn applied(&self) -> Result<FxHashMap<String, AppliedMigration>, DatabaseError> {
        let entries = self
            .db
            .query(
                "DEFINE TABLE IF NOT EXISTS migration SCHEMALESS;
                SELECT version, checksum FROM migration;",
            )
            .await
            .context("Loading applied migrations")?
            .take::<Vec<AppliedMigration>>(1)
            .context("Parsing applied migrations")?;

        Ok(entries.into_iter().map(|entry| (entry.version.clone(), entry)).collect())
    }

    async fn apply(&self, migration: &Migration) -> Result<(), DatabaseError> {
        let query = format!(
            "BEGIN TRANSACTION;
            {}
            CREATE migration CONTENT {{ version: $version, checksum: $checksum, applied_at: time::now() }};
            COMMIT TRANSACTION;",
            migration.script,
        );

        self.db
            .query(&query)
            .bind(("version", migration.version))
            .bind(("checksum", migration.checksum.clone()))
            .await
            .context(format!("SQL execution failed at {}", migration.version))?
            .check()
            .map_err(surrealdb::Error::from)
            .context(format!("Migration {} rejected", migration.version))?;

        Ok(())
    }
}

fn ensure_checksum_match(migration: &Migration, existing: &str) -> Result<(), DatabaseError> {
    if existing != migration.checksum {
        return Err(DatabaseError::Migration {
            message: format!(
                "Checksum mismatch for {} (recorded {existing}, embedded {})",
                migration.version, migration.checksum
            )
            .into(),
            context: Some("Migration already applied with different content".into()),
        });
    }
    Ok(())
}
