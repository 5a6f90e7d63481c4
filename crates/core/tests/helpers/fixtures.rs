//! Fixture scaffolding for integration tests.

use std::path::Path;

/// Copy every file of a flat fixture directory into `dst`.
pub fn copy_fixture_files(src: &Path, dst: &Path) {
    for entry in std::fs::read_dir(src).expect("Failed to read fixture dir") {
        let entry = entry.expect("Failed to read entry");
        let src_path = entry.path();
        if src_path.is_file() {
            std::fs::copy(&src_path, dst.join(entry.file_name())).expect("Failed to copy file");
        }
    }
}
