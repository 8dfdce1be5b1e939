//! Filesystem helpers returning [`CoreError`].

use crate::error::CoreError;
use std::fs;
use std::path::Path;

/// Ensures that a directory exists at `path`, creating it and any missing parents.
///
/// # Errors
///
/// Returns [`CoreError::Filesystem`] if the path exists but is not a directory,
/// or if creation fails.
pub fn ensure_dir_exists(path: &Path) -> Result<(), CoreError> {
    if path.exists() {
        if path.is_dir() {
            Ok(())
        } else {
            Err(CoreError::Filesystem {
                message: "Path exists but is not a directory".to_string(),
                path: path.to_path_buf(),
                source: std::io::Error::new(
                    std::io::ErrorKind::AlreadyExists,
                    "Path exists but is not a directory",
                ),
            })
        }
    } else {
        fs::create_dir_all(path).map_err(|e| CoreError::Filesystem {
            message: "Failed to create directory".to_string(),
            path: path.to_path_buf(),
            source: e,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::{tempdir, NamedTempFile};

    #[test]
    fn test_ensure_dir_exists_creates_nested_directories() {
        let temp_root = tempdir().unwrap();
        let nested = temp_root.path().join("parent_dir/child_dir");

        assert!(!nested.exists());
        ensure_dir_exists(&nested).unwrap();
        assert!(nested.is_dir(), "Nested directory was not created");
    }

    #[test]
    fn test_ensure_dir_exists_succeeds_if_directory_already_exists() {
        let temp_root = tempdir().unwrap();
        assert!(ensure_dir_exists(temp_root.path()).is_ok());
    }

    #[test]
    fn test_ensure_dir_exists_fails_for_regular_file() {
        let file = NamedTempFile::new().unwrap();
        match ensure_dir_exists(file.path()) {
            Err(CoreError::Filesystem { message, .. }) => {
                assert_eq!(message, "Path exists but is not a directory");
            }
            other => panic!("Expected Filesystem error, got {:?}", other),
        }
    }
}
