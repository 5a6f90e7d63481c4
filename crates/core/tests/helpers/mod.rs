//! Test harness for file-level conversion tests.
//!
//! Copies a fixture document into a temp dir so tests can convert it in
//! place and inspect what was (or wasn't) written.

pub mod fixtures;

use std::path::PathBuf;
use tempfile::TempDir;

pub const DOCUMENT: &str = "ConsolidatedDashboard.gs";

pub struct TestHarness {
    pub path: PathBuf,
    _temp_dir: TempDir,
}

impl TestHarness {
    /// Create a harness from a named fixture directory.
    pub fn from_fixture(name: &str) -> Self {
        let fixture_src =
            std::path::Path::new(env!("CARGO_MANIFEST_DIR")).join("tests/fixtures").join(name);
        assert!(fixture_src.exists(), "Fixture '{name}' not found at {}", fixture_src.display());

        let temp_dir = TempDir::new().expect("Failed to create temp dir");
        fixtures::copy_fixture_files(&fixture_src, temp_dir.path());
        Self { path: temp_dir.path().join(DOCUMENT), _temp_dir: temp_dir }
    }

    /// Create a harness holding a single document with the given contents.
    pub fn from_source(source: &str) -> Self {
        let temp_dir = TempDir::new().expect("Failed to create temp dir");
        let path = temp_dir.path().join(DOCUMENT);
        std::fs::write(&path, source).expect("Failed to write document");
        Self { path, _temp_dir: temp_dir }
    }

    pub fn dir(&self) -> &std::path::Path {
        self._temp_dir.path()
    }

    pub fn read(&self) -> String {
        std::fs::read_to_string(&self.path).expect("Failed to read document")
    }

    pub fn write_config(&self, contents: &str) {
        std::fs::write(self.dir().join(protoshift_core::config::CONFIG_FILE_NAME), contents)
            .expect("Failed to write config");
    }
}
