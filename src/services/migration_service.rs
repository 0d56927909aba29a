//! Migration runner - Applies migration sets against their ledgers.
//!
//! Every file not yet in its set's ledger is applied exactly once, in
//! byte-wise name order, and recorded in the same unit of work.

use std::sync::Arc;

use crate::domain::{
    select_pending, Fingerprint, MigrationFile, MigrationRunCompletion, MigrationSet,
    MigrationState, MigrationStatus, SetReport,
};
use crate::errors::{AppError, AppResult};
use crate::infra::{load_migrations, MigrationBackend};

pub struct MigrationRunner {
    backend: Arc<dyn MigrationBackend>,
}

impl MigrationRunner {
    pub fn new(backend: Arc<dyn MigrationBackend>) -> Self {
        Self { backend }
    }

    pub async fn ping(&self) -> AppResult<()> {
        self.backend.ping().await
    }

    /// Apply the pending files of one set.
    ///
    /// A missing folder is skipped with a warning and creates no ledger.
    pub async fn run_set(&self, set: &MigrationSet) -> AppResult<SetReport> {
        let mut report = SetReport {
            set: set.name.clone(),
            ledger: set.ledger.to_string(),
            high_water_mark: None,
            applied: Vec::new(),
        };

        let Some(files) = load_migrations(&set.migrations_folder).await? else {
            tracing::warn!(
                set = %set.name,
                folder = %set.migrations_folder.display(),
                "Migration folder not found, skipping set"
            );
            return Ok(report);
        };

        self.backend.ensure_ledger(&set.ledger).await?;
        let mark = self.backend.high_water_mark(&set.ledger).await?;

        check_mark(set, &files, mark.as_deref())?;

        let total = files.len();
        let pending = select_pending(files, mark.as_deref());
        tracing::debug!(
            set = %set.name,
            skipped = total - pending.len(),
            pending = pending.len(),
            "Resolved pending migrations"
        );
        report.high_water_mark = mark;

        if pending.is_empty() {
            tracing::info!(set = %set.name, "Migration set is up to date");
            return Ok(report);
        }

        if set.transactional {
            self.backend
                .apply_in_transaction(&set.ledger, &pending)
                .await?;
        } else {
            for file in &pending {
                self.backend.apply_autocommit(&set.ledger, file).await?;
            }
        }

        report.applied = pending.into_iter().map(|file| file.name).collect();
        tracing::info!(
            set = %set.name,
            applied = report.applied.len(),
            "Migration set applied"
        );
        Ok(report)
    }

    /// Apply sets in order; the first failure stops the run.
    pub async fn run(
        &self,
        sets: &[MigrationSet],
        fingerprint: Fingerprint,
    ) -> AppResult<MigrationRunCompletion> {
        let mut reports = Vec::with_capacity(sets.len());
        for set in sets {
            reports.push(self.run_set(set).await?);
        }

        tracing::info!(fingerprint = %fingerprint, "Migrations complete");
        Ok(MigrationRunCompletion::applied(fingerprint, reports))
    }

    /// Per-file applied/pending state of a set. Never creates ledger objects.
    pub async fn status(&self, set: &MigrationSet) -> AppResult<Vec<MigrationStatus>> {
        let Some(files) = load_migrations(&set.migrations_folder).await? else {
            return Ok(Vec::new());
        };

        let mark = if self.backend.ledger_exists(&set.ledger).await? {
            self.backend.high_water_mark(&set.ledger).await?
        } else {
            None
        };
        check_mark(set, &files, mark.as_deref())?;

        Ok(select_pending(files, None)
            .into_iter()
            .map(|file| {
                let applied = mark
                    .as_deref()
                    .is_some_and(|mark| file.name.as_bytes() <= mark.as_bytes());
                MigrationStatus {
                    name: file.name,
                    state: if applied {
                        MigrationState::Applied
                    } else {
                        MigrationState::Pending
                    },
                }
            })
            .collect())
    }

    /// Read-only check that every set is fully applied.
    pub async fn verify(
        &self,
        sets: &[MigrationSet],
        fingerprint: Fingerprint,
    ) -> AppResult<MigrationRunCompletion> {
        let mut pending = Vec::new();
        for set in sets {
            for status in self.status(set).await? {
                if status.state == MigrationState::Pending {
                    pending.push(format!("{}/{}", set.name, status.name));
                }
            }
        }

        if !pending.is_empty() {
            return Err(AppError::MigrationsPending(pending.join(", ")));
        }
        Ok(MigrationRunCompletion::unchanged(fingerprint))
    }
}

/// The recorded mark must name a file of the set.
///
/// Any other mark sorts independently of the files on disk, so comparing
/// against it could skip migrations that never ran.
fn check_mark(set: &MigrationSet, files: &[MigrationFile], mark: Option<&str>) -> AppResult<()> {
    match mark {
        Some(mark) if !files.iter().any(|file| file.name == mark) => Err(AppError::Ledger(format!(
            "{} records {:?}, which is not a file in {}",
            set.ledger,
            mark,
            set.migrations_folder.display()
        ))),
        _ => Ok(()),
    }
}

#[cfg(test)]
mod tests {
    use std::fs;

    use super::*;
    use crate::domain::{Identifier, Ledger};
    use crate::infra::MockMigrationBackend;

    fn set_in(dir: &std::path::Path, transactional: bool) -> MigrationSet {
        let ledger = Ledger::new(
            Identifier::parse("drizzle").unwrap(),
            Identifier::parse("migrations").unwrap(),
        );
        let set = MigrationSet::new("migrations", dir, ledger);
        if transactional {
            set
        } else {
            set.non_transactional()
        }
    }

    fn tree(names: &[&str]) -> tempfile::TempDir {
        let dir = tempfile::tempdir().unwrap();
        for name in names {
            fs::write(dir.path().join(name), format!("-- {}", name)).unwrap();
        }
        dir
    }

    #[tokio::test]
    async fn test_run_set_applies_above_mark_in_one_transaction() {
        let dir = tree(&["004_y.sql", "001_a.sql", "003_x.sql", "002_b.sql"]);

        let mut backend = MockMigrationBackend::new();
        backend.expect_ensure_ledger().times(1).returning(|_| Ok(()));
        backend
            .expect_high_water_mark()
            .returning(|_| Ok(Some("003_x.sql".to_string())));
        backend
            .expect_apply_in_transaction()
            .withf(|_, files| files.len() == 1 && files[0].name == "004_y.sql")
            .times(1)
            .returning(|_, _| Ok(()));
        backend.expect_apply_autocommit().never();

        let runner = MigrationRunner::new(Arc::new(backend));
        let report = runner.run_set(&set_in(dir.path(), true)).await.unwrap();

        assert_eq!(report.applied, vec!["004_y.sql"]);
        assert_eq!(report.high_water_mark.as_deref(), Some("003_x.sql"));
    }

    #[tokio::test]
    async fn test_run_set_non_transactional_applies_per_file() {
        let dir = tree(&["001_a.sql", "002_b.sql"]);

        let mut backend = MockMigrationBackend::new();
        backend.expect_ensure_ledger().returning(|_| Ok(()));
        backend.expect_high_water_mark().returning(|_| Ok(None));
        backend.expect_apply_in_transaction().never();
        backend
            .expect_apply_autocommit()
            .times(2)
            .returning(|_, _| Ok(()));

        let runner = MigrationRunner::new(Arc::new(backend));
        let report = runner.run_set(&set_in(dir.path(), false)).await.unwrap();

        assert_eq!(report.applied, vec!["001_a.sql", "002_b.sql"]);
    }

    #[tokio::test]
    async fn test_run_set_missing_folder_touches_nothing() {
        let dir = tempfile::tempdir().unwrap();

        let mut backend = MockMigrationBackend::new();
        backend.expect_ensure_ledger().never();

        let runner = MigrationRunner::new(Arc::new(backend));
        let report = runner
            .run_set(&set_in(&dir.path().join("post-init"), false))
            .await
            .unwrap();

        assert!(report.applied.is_empty());
    }

    #[tokio::test]
    async fn test_status_without_ledger_is_all_pending() {
        let dir = tree(&["001_a.sql", "002_b.sql"]);

        let mut backend = MockMigrationBackend::new();
        backend.expect_ledger_exists().returning(|_| Ok(false));
        backend.expect_high_water_mark().never();
        backend.expect_ensure_ledger().never();

        let runner = MigrationRunner::new(Arc::new(backend));
        let status = runner.status(&set_in(dir.path(), true)).await.unwrap();

        assert!(status.iter().all(|s| s.state == MigrationState::Pending));
    }

    #[tokio::test]
    async fn test_verify_reports_pending_files() {
        let dir = tree(&["001_a.sql", "002_b.sql"]);

        let mut backend = MockMigrationBackend::new();
        backend.expect_ledger_exists().returning(|_| Ok(true));
        backend
            .expect_high_water_mark()
            .returning(|_| Ok(Some("001_a.sql".to_string())));

        let runner = MigrationRunner::new(Arc::new(backend));
        let err = runner
            .verify(&[set_in(dir.path(), true)], Fingerprint::new("f"))
            .await
            .unwrap_err();

        match err {
            AppError::MigrationsPending(files) => assert_eq!(files, "migrations/002_b.sql"),
            other => panic!("unexpected error: {:?}", other),
        }
    }

    #[tokio::test]
    async fn test_mark_outside_the_folder_is_a_ledger_error() {
        let dir = tree(&["0001_a.sql", "0002_new.sql"]);

        let mut backend = MockMigrationBackend::new();
        backend.expect_ensure_ledger().returning(|_| Ok(()));
        backend.expect_ledger_exists().returning(|_| Ok(true));
        backend
            .expect_high_water_mark()
            .returning(|_| Ok(Some("migrations/migrations/0001_a.sql".to_string())));
        backend.expect_apply_in_transaction().never();
        backend.expect_apply_autocommit().never();

        let runner = MigrationRunner::new(Arc::new(backend));
        let set = set_in(dir.path(), true);

        assert!(matches!(runner.run_set(&set).await, Err(AppError::Ledger(_))));
        assert!(matches!(
            runner.verify(&[set], Fingerprint::new("f")).await,
            Err(AppError::Ledger(_))
        ));
    }
}
