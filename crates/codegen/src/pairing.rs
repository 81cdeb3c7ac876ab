//! Rollback pairing check
//!
//! Every forward migration script `v{from}_to_v{to}_{platform}.sql` must sit
//! next to its `v{from}_to_v{to}_{platform}_rollback.sql`, and every rollback
//! script next to its forward script. Baseline `_create_` scripts have no
//! counterpart and are skipped.

use crate::migrations::ROLLBACK_SUFFIX;
use std::collections::BTreeSet;
use std::path::{Path, PathBuf};
use tabula_core::{TabulaError, TabulaResult};
use walkdir::WalkDir;

/// Result of a pairing check
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct PairingReport {
    /// Forward and rollback scripts that were examined
    pub checked: usize,

    /// Forward scripts without a rollback counterpart
    pub missing_rollbacks: Vec<PathBuf>,

    /// Rollback scripts without a forward counterpart
    pub orphaned_rollbacks: Vec<PathBuf>,
}

impl PairingReport {
    /// True when every script has its counterpart
    pub fn is_ok(&self) -> bool {
        self.missing_rollbacks.is_empty() && self.orphaned_rollbacks.is_empty()
    }

    /// One line per problem
    pub fn problems(&self) -> Vec<String> {
        let missing = self
            .missing_rollbacks
            .iter()
            .map(|p| format!("{}: missing rollback script", p.display()));
        let orphaned = self
            .orphaned_rollbacks
            .iter()
            .map(|p| format!("{}: rollback without forward script", p.display()));
        missing.chain(orphaned).collect()
    }
}

/// Whether a file name looks like a forward or rollback migration script
fn is_migration_script(name: &str) -> bool {
    name.starts_with('v') && name.contains("_to_v") && name.ends_with(".sql")
}

/// The forward script name a rollback script belongs to
fn forward_name_of(rollback: &str) -> Option<String> {
    rollback
        .strip_suffix(ROLLBACK_SUFFIX)
        .map(|stem| format!("{}.sql", stem))
}

/// Walk `dir` (recursively) and report scripts missing their counterpart
pub fn find_unpaired_migrations(dir: impl AsRef<Path>) -> TabulaResult<PairingReport> {
    let dir = dir.as_ref();
    if !dir.is_dir() {
        return Err(TabulaError::DirectoryScan {
            path: dir.to_path_buf(),
            message: "not a directory".to_string(),
        });
    }

    let mut scripts = BTreeSet::new();
    for entry in WalkDir::new(dir).sort_by_file_name() {
        let entry = entry.map_err(|e| TabulaError::DirectoryScan {
            path: dir.to_path_buf(),
            message: e.to_string(),
        })?;
        if !entry.file_type().is_file() {
            continue;
        }
        if entry
            .file_name()
            .to_str()
            .is_some_and(is_migration_script)
        {
            scripts.insert(entry.into_path());
        }
    }

    let mut report = PairingReport {
        checked: scripts.len(),
        ..PairingReport::default()
    };
    for path in &scripts {
        let Some(name) = path.file_name().and_then(|n| n.to_str()) else {
            continue;
        };
        match forward_name_of(name) {
            Some(forward) => {
                if !scripts.contains(&path.with_file_name(forward)) {
                    report.orphaned_rollbacks.push(path.clone());
                }
            }
            None => {
                let stem = name.trim_end_matches(".sql");
                let rollback = format!("{}{}", stem, ROLLBACK_SUFFIX);
                if !scripts.contains(&path.with_file_name(rollback)) {
                    report.missing_rollbacks.push(path.clone());
                }
            }
        }
    }

    Ok(report)
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;
    use std::fs;

    fn touch(dir: &Path, name: &str) {
        let path = dir.join(name);
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent).unwrap();
        }
        fs::write(path, "-- x\n").unwrap();
    }

    #[test]
    fn test_all_paired() {
        let dir = tempfile::tempdir().unwrap();
        touch(dir.path(), "v1.0_create_mssql.sql");
        touch(dir.path(), "v1.0_to_v1.1_mssql.sql");
        touch(dir.path(), "v1.0_to_v1.1_mssql_rollback.sql");
        touch(dir.path(), "README.md");

        let report = find_unpaired_migrations(dir.path()).unwrap();
        assert!(report.is_ok());
        assert_eq!(report.checked, 2);
    }

    #[test]
    fn test_reports_both_directions() {
        let dir = tempfile::tempdir().unwrap();
        touch(dir.path(), "v1_to_v2_mssql.sql");
        touch(dir.path(), "pg/v2_to_v3_postgres_rollback.sql");
        touch(dir.path(), "pg/v1_to_v2_postgres.sql");
        touch(dir.path(), "pg/v1_to_v2_postgres_rollback.sql");

        let report = find_unpaired_migrations(dir.path()).unwrap();
        assert_eq!(report.missing_rollbacks, vec![dir.path().join("v1_to_v2_mssql.sql")]);
        assert_eq!(
            report.orphaned_rollbacks,
            vec![dir.path().join("pg/v2_to_v3_postgres_rollback.sql")]
        );
        assert_eq!(report.problems().len(), 2);
    }

    #[test]
    fn test_missing_directory() {
        let err = find_unpaired_migrations("/nonexistent/migrations").unwrap_err();
        assert!(err.is_load());
    }
}
