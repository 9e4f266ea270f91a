/// Test utilities module for automatic cleanup and consistent test infrastructure
///
/// This module provides RAII-based cleanup that guarantees test data is removed
/// even if tests panic or fail.
use anyhow::Result;
use serde::Serialize;
use std::path::PathBuf;
use tempfile::TempDir;

use super::connection::CsvConnection;

/// RAII Test Environment that automatically cleans up on drop
///
/// The cleanup happens automatically when the TestEnvironment goes out of scope.
pub struct TestEnvironment {
    /// The temporary directory - kept alive to prevent auto-cleanup until drop
    _temp_dir: TempDir,
    /// The CSV connection for the test
    pub connection: CsvConnection,
    /// Base directory path for manual inspection if needed
    pub base_path: PathBuf,
}

impl TestEnvironment {
    /// Create a new test environment with automatic cleanup
    pub async fn new() -> Result<Self> {
        let temp_dir = TempDir::new()?;
        let base_path = temp_dir.path().to_path_buf();
        let connection = CsvConnection::new(&base_path)?;

        Ok(TestEnvironment {
            _temp_dir: temp_dir,
            connection,
            base_path,
        })
    }
}

/// Header row serde derives for a record, to compare against `CsvRecord::HEADERS`
pub fn derived_header<R: Serialize>(record: &R) -> String {
    let mut writer = csv::Writer::from_writer(Vec::new());
    writer.serialize(record).unwrap();
    let bytes = writer.into_inner().unwrap();
    String::from_utf8(bytes)
        .unwrap()
        .lines()
        .next()
        .unwrap_or_default()
        .to_string()
}

impl Drop for TestEnvironment {
    fn drop(&mut self) {
        if std::env::var("LOAN_TRACKER_DEBUG_TESTS").is_ok() {
            println!("Cleaning up test environment: {:?}", self.base_path);
        }
    }
}
