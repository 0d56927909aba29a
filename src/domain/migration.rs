//! Migration sets, ledgers and run results.

use std::fmt;
use std::path::{Path, PathBuf};

use serde::Serialize;

use super::Identifier;
use crate::config::{
    INIT_SCRIPTS_FOLDER, INIT_SCRIPTS_TABLE, MIGRATIONS_FOLDER, MIGRATIONS_TABLE,
    POST_INIT_FOLDER, POST_INIT_TABLE,
};
use crate::errors::AppResult;

/// Ledger table recording applied migrations, scoped per `(schema, table)`.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct Ledger {
    pub schema: Identifier,
    pub table: Identifier,
}

impl Ledger {
    pub fn new(schema: Identifier, table: Identifier) -> Self {
        Self { schema, table }
    }

    /// `"schema"."table"`
    pub fn qualified(&self) -> String {
        format!("{}.{}", self.schema.quoted(), self.table.quoted())
    }
}

impl fmt::Display for Ledger {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}.{}", self.schema, self.table)
    }
}

/// A named, ordered group of SQL files sharing one ledger.
#[derive(Debug, Clone)]
pub struct MigrationSet {
    pub name: String,
    pub migrations_folder: PathBuf,
    pub ledger: Ledger,
    /// Apply every pending file in one transaction
    pub transactional: bool,
}

impl MigrationSet {
    pub fn new(
        name: impl Into<String>,
        migrations_folder: impl Into<PathBuf>,
        ledger: Ledger,
    ) -> Self {
        Self {
            name: name.into(),
            migrations_folder: migrations_folder.into(),
            ledger,
            transactional: true,
        }
    }

    /// Apply and record each file on its own, outside any transaction.
    pub fn non_transactional(mut self) -> Self {
        self.transactional = false;
        self
    }

    /// The fixed bootstrap sequence: init scripts, migrations, post-init.
    pub fn standard(root: &Path, schema: &Identifier) -> AppResult<Vec<MigrationSet>> {
        let set = |folder: &str, table: &str| -> AppResult<MigrationSet> {
            Ok(MigrationSet::new(
                folder,
                root.join(folder),
                Ledger::new(schema.clone(), Identifier::parse(table)?),
            ))
        };

        Ok(vec![
            set(INIT_SCRIPTS_FOLDER, INIT_SCRIPTS_TABLE)?,
            set(MIGRATIONS_FOLDER, MIGRATIONS_TABLE)?,
            set(POST_INIT_FOLDER, POST_INIT_TABLE)?.non_transactional(),
        ])
    }
}

/// One migration file: its name and raw SQL.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MigrationFile {
    pub name: String,
    pub sql: String,
}

impl MigrationFile {
    pub fn new(name: impl Into<String>, sql: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            sql: sql.into(),
        }
    }
}

/// Files strictly above the high-water mark, in ascending byte-wise order.
pub fn select_pending(mut files: Vec<MigrationFile>, high_water_mark: Option<&str>) -> Vec<MigrationFile> {
    files.sort_by(|a, b| a.name.as_bytes().cmp(b.name.as_bytes()));
    match high_water_mark {
        Some(mark) => files
            .into_iter()
            .filter(|file| file.name.as_bytes() > mark.as_bytes())
            .collect(),
        None => files,
    }
}

/// Content hash of a migration tree (hex SHA-256).
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize)]
#[serde(transparent)]
pub struct Fingerprint(String);

impl Fingerprint {
    pub fn new(hex: impl Into<String>) -> Self {
        Self(hex.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for Fingerprint {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// What one set run did.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct SetReport {
    pub set: String,
    pub ledger: String,
    pub high_water_mark: Option<String>,
    pub applied: Vec<String>,
}

/// Proof that the migration tree with `fingerprint` is fully applied.
///
/// Only the runner and the sequencer construct it; credential provisioning
/// takes one by reference.
#[derive(Debug, Clone, Serialize)]
pub struct MigrationRunCompletion {
    fingerprint: Fingerprint,
    unchanged: bool,
    sets: Vec<SetReport>,
}

impl MigrationRunCompletion {
    pub(crate) fn applied(fingerprint: Fingerprint, sets: Vec<SetReport>) -> Self {
        Self {
            fingerprint,
            unchanged: false,
            sets,
        }
    }

    pub(crate) fn unchanged(fingerprint: Fingerprint) -> Self {
        Self {
            fingerprint,
            unchanged: true,
            sets: Vec::new(),
        }
    }

    pub fn fingerprint(&self) -> &Fingerprint {
        &self.fingerprint
    }

    /// True when nothing was applied: the fingerprint matched or the tree
    /// was verified as already applied.
    pub fn is_unchanged(&self) -> bool {
        self.unchanged
    }

    pub fn sets(&self) -> &[SetReport] {
        &self.sets
    }

    /// Names of every file applied by this run, in application order.
    pub fn applied_files(&self) -> Vec<&str> {
        self.sets
            .iter()
            .flat_map(|set| set.applied.iter().map(String::as_str))
            .collect()
    }
}

/// Whether a file is recorded in its ledger.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum MigrationState {
    Applied,
    Pending,
}

impl fmt::Display for MigrationState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            MigrationState::Applied => f.write_str("applied"),
            MigrationState::Pending => f.write_str("pending"),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct MigrationStatus {
    pub name: String,
    pub state: MigrationState,
}

/// File states of one set, in application order.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct SetStatus {
    pub set: String,
    pub ledger: String,
    pub files: Vec<MigrationStatus>,
}

#[cfg(test)]
mod tests {
    use super::*;

    fn files(names: &[&str]) -> Vec<MigrationFile> {
        names.iter().map(|n| MigrationFile::new(*n, "select 1;")).collect()
    }

    fn names(files: &[MigrationFile]) -> Vec<&str> {
        files.iter().map(|f| f.name.as_str()).collect()
    }

    #[test]
    fn test_select_pending_above_mark() {
        let pending = select_pending(
            files(&["001_a.sql", "002_b.sql", "003_x.sql", "004_y.sql"]),
            Some("003_x.sql"),
        );
        assert_eq!(names(&pending), vec!["004_y.sql"]);
    }

    #[test]
    fn test_select_pending_empty_ledger_takes_all_sorted() {
        let pending = select_pending(files(&["010_c.sql", "001_a.sql", "002_b.sql"]), None);
        assert_eq!(names(&pending), vec!["001_a.sql", "002_b.sql", "010_c.sql"]);
    }

    #[test]
    fn test_select_pending_is_bytewise_not_numeric() {
        // "10" sorts before "9" byte-wise; zero padding is the author's job
        let pending = select_pending(files(&["9_a.sql", "10_b.sql"]), None);
        assert_eq!(names(&pending), vec!["10_b.sql", "9_a.sql"]);

        let pending = select_pending(files(&["B.sql", "a.sql"]), None);
        assert_eq!(names(&pending), vec!["B.sql", "a.sql"]);
    }

    #[test]
    fn test_select_pending_nothing_when_mark_is_last() {
        let pending = select_pending(files(&["001_a.sql", "002_b.sql"]), Some("002_b.sql"));
        assert!(pending.is_empty());
    }

    #[test]
    fn test_standard_sets_order_and_modes() {
        let schema = Identifier::parse("drizzle").unwrap();
        let sets = MigrationSet::standard(Path::new("/srv/migrations"), &schema).unwrap();

        let names: Vec<_> = sets.iter().map(|s| s.name.as_str()).collect();
        assert_eq!(names, vec!["init-scripts", "migrations", "post-init"]);
        assert!(sets[0].transactional);
        assert!(sets[1].transactional);
        assert!(!sets[2].transactional);
        assert_eq!(sets[0].ledger.qualified(), "\"drizzle\".\"init-scripts-migrations\"");
        assert_eq!(sets[2].migrations_folder, Path::new("/srv/migrations/post-init"));
    }
}
