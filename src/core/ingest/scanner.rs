//! Input file discovery

use crate::domain::{HealthmarkError, Result};
use std::path::{Path, PathBuf};
use walkdir::WalkDir;

/// Lists regular files directly inside `dir` whose extension is one of
/// `extensions` (case-insensitive), sorted by file name
///
/// # Errors
///
/// Returns `HealthmarkError::Configuration` if `dir` is not a directory.
pub fn scan_directory(dir: &Path, extensions: &[String]) -> Result<Vec<PathBuf>> {
    if !dir.is_dir() {
        return Err(HealthmarkError::Configuration(format!(
            "Data directory {} does not exist",
            dir.display()
        )));
    }

    let mut files = Vec::new();
    for entry in WalkDir::new(dir)
        .min_depth(1)
        .max_depth(1)
        .sort_by_file_name()
    {
        let entry = entry.map_err(|e| {
            HealthmarkError::Io(format!("Failed to scan {}: {e}", dir.display()))
        })?;
        if entry.file_type().is_file() && has_extension(entry.path(), extensions) {
            files.push(entry.into_path());
        }
    }

    tracing::debug!(dir = %dir.display(), files = files.len(), "Scanned data directory");
    Ok(files)
}

fn has_extension(path: &Path, extensions: &[String]) -> bool {
    path.extension()
        .and_then(|e| e.to_str())
        .is_some_and(|ext| extensions.iter().any(|want| want.eq_ignore_ascii_case(ext)))
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;
    use tempfile::TempDir;

    #[test]
    fn test_scan_filters_and_sorts() {
        let dir = TempDir::new().unwrap();
        fs::write(dir.path().join("b_markers.csv"), "a\n1\n").unwrap();
        fs::write(dir.path().join("a_markers.CSV"), "a\n1\n").unwrap();
        fs::write(dir.path().join("notes.txt"), "skip").unwrap();
        fs::create_dir(dir.path().join("nested.csv")).unwrap();
        fs::create_dir(dir.path().join("sub")).unwrap();
        fs::write(dir.path().join("sub").join("deep.csv"), "a\n1\n").unwrap();

        let files = scan_directory(dir.path(), &["csv".to_string()]).unwrap();
        let names: Vec<_> = files
            .iter()
            .map(|p| p.file_name().unwrap().to_string_lossy().into_owned())
            .collect();
        assert_eq!(names, vec!["a_markers.CSV", "b_markers.csv"]);
    }

    #[test]
    fn test_missing_directory_is_fatal() {
        let dir = TempDir::new().unwrap();
        let result = scan_directory(&dir.path().join("absent"), &["csv".to_string()]);
        assert!(matches!(result, Err(HealthmarkError::Configuration(_))));
    }

    #[test]
    fn test_empty_directory() {
        let dir = TempDir::new().unwrap();
        assert!(scan_directory(dir.path(), &["csv".to_string()])
            .unwrap()
            .is_empty());
    }
}
