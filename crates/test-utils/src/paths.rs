//! Path utilities for locating test data files.

use std::path::PathBuf;

/// Returns the workspace root directory.
pub fn workspace_root() -> PathBuf {
    // Start from the test-utils crate manifest dir
    let manifest_dir = env!("CARGO_MANIFEST_DIR");
    PathBuf::from(manifest_dir)
        .parent() // crates/
        .and_then(|p| p.parent()) // workspace root
        .map(|p| p.to_path_buf())
        .unwrap_or_else(|| PathBuf::from(manifest_dir))
}

/// Returns the path to `services/{service_name}/testdata/`.
pub fn service_testdata_dir(service_name: &str) -> PathBuf {
    workspace_root()
        .join("services")
        .join(service_name)
        .join("testdata")
}

/// Searches for a test file of a service.
///
/// Checks `TEST_DATA_DIR` first, then the service's own testdata directory.
pub fn find_service_test_file(service_name: &str, name: &str) -> Option<PathBuf> {
    if let Ok(dir) = std::env::var("TEST_DATA_DIR") {
        let path = PathBuf::from(dir).join(name);
        if path.exists() {
            return Some(path);
        }
    }

    let path = service_testdata_dir(service_name).join(name);
    path.exists().then_some(path)
}

/// Creates a temporary directory for test outputs.
///
/// The directory is automatically cleaned up when the returned value is dropped.
pub fn temp_test_dir() -> tempfile::TempDir {
    tempfile::tempdir().expect("Failed to create temp directory")
}

/// Creates a temporary directory with a specific prefix.
pub fn temp_test_dir_with_prefix(prefix: &str) -> tempfile::TempDir {
    tempfile::Builder::new()
        .prefix(prefix)
        .tempdir()
        .expect("Failed to create temp directory")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_workspace_root_has_manifest() {
        assert!(workspace_root().join("Cargo.toml").exists());
    }

    #[test]
    fn test_missing_file() {
        assert!(find_service_test_file("pyramid-cli", "does-not-exist.yaml").is_none());
    }

    #[test]
    fn test_temp_dir_prefix() {
        let dir = temp_test_dir_with_prefix("pyramid");
        assert!(dir
            .path()
            .file_name()
            .unwrap()
            .to_string_lossy()
            .starts_with("pyramid"));
    }
}
