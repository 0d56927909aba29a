//! Migration source tree: reading migration sets and fingerprinting the tree.

use std::path::Path;

use sha2::{Digest, Sha256};
use walkdir::WalkDir;

use crate::config::MIGRATION_FILE_EXTENSION;
use crate::domain::{Fingerprint, MigrationFile};
use crate::errors::{AppError, AppResult};

fn is_migration_file(path: &Path) -> bool {
    path.extension().and_then(|ext| ext.to_str()) == Some(MIGRATION_FILE_EXTENSION)
}

/// Read every `*.sql` file directly inside `folder`, sorted by name.
///
/// Returns `None` when the folder does not exist.
pub async fn load_migrations(folder: &Path) -> AppResult<Option<Vec<MigrationFile>>> {
    let mut entries = match tokio::fs::read_dir(folder).await {
        Ok(entries) => entries,
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => return Ok(None),
        Err(e) => return Err(e.into()),
    };

    let mut files = Vec::new();
    while let Some(entry) = entries.next_entry().await? {
        let path = entry.path();
        if !is_migration_file(&path) || !tokio::fs::metadata(&path).await?.is_file() {
            continue;
        }

        let name = entry.file_name().into_string().map_err(|raw| {
            AppError::validation(format!("Migration file name {:?} is not UTF-8", raw))
        })?;
        let sql = tokio::fs::read_to_string(&path).await?;
        files.push(MigrationFile { name, sql });
    }

    files.sort_by(|a, b| a.name.cmp(&b.name));
    Ok(Some(files))
}

/// SHA-256 over every `*.sql` file below `root`.
///
/// Each file contributes its `/`-separated relative path and its contents,
/// in path order, so renames and edits both change the result.
pub fn fingerprint(root: &Path) -> AppResult<Fingerprint> {
    if !root.is_dir() {
        return Err(AppError::validation(format!(
            "Migration root {} is not a directory",
            root.display()
        )));
    }

    let mut files = Vec::new();
    for entry in WalkDir::new(root).follow_links(true) {
        let entry = entry.map_err(|e| AppError::internal(format!("Walking migrations failed: {}", e)))?;
        if !entry.file_type().is_file() || !is_migration_file(entry.path()) {
            continue;
        }

        let relative = entry
            .path()
            .strip_prefix(root)
            .map_err(|e| AppError::internal(e.to_string()))?
            .components()
            .map(|c| c.as_os_str().to_string_lossy().into_owned())
            .collect::<Vec<_>>()
            .join("/");
        files.push((relative, entry.into_path()));
    }
    files.sort_by(|a, b| a.0.cmp(&b.0));

    let mut hasher = Sha256::new();
    for (relative, path) in &files {
        hasher.update(relative.as_bytes());
        hasher.update([0u8]);
        hasher.update(std::fs::read(path)?);
        hasher.update([0u8]);
    }

    Ok(Fingerprint::new(hex::encode(hasher.finalize())))
}

/// [`fingerprint`] on the blocking pool, for callers on the async runtime.
pub async fn fingerprint_tree(root: &Path) -> AppResult<Fingerprint> {
    let root = root.to_path_buf();
    tokio::task::spawn_blocking(move || fingerprint(&root))
        .await
        .map_err(|e| AppError::internal(format!("Fingerprint task failed: {}", e)))?
}
