#![allow(dead_code)]

use std::fs::File;
use std::io::Write;
use std::path::{Path, PathBuf};

use frame_store::{Value, schema::Descriptor, source::CsvSource};
use tempfile::{TempDir, tempdir};

/// Returns the absolute path to a fixture under `tests/data`.
pub fn fixture_path(name: &str) -> PathBuf {
    PathBuf::from(env!("CARGO_MANIFEST_DIR"))
        .join("tests")
        .join("data")
        .join(name)
}

/// Loads a descriptor fixture such as `articles.json`.
pub fn load_descriptor(name: &str) -> Descriptor {
    Descriptor::load(&fixture_path(name)).expect("load descriptor fixture")
}

/// Reads a CSV fixture as text rows in the field order of `descriptor`.
pub fn load_rows(name: &str, descriptor: &Descriptor) -> Vec<Vec<Value>> {
    let path = fixture_path(name);
    let mut source = CsvSource::open(&path, None, descriptor).expect("open csv fixture");
    source.read_rows().expect("read csv fixture")
}

/// Scratch directory helper that cleans up files automatically on drop.
pub struct TestWorkspace {
    temp_dir: TempDir,
}

impl TestWorkspace {
    pub fn new() -> Self {
        Self {
            temp_dir: tempdir().expect("temp dir"),
        }
    }

    pub fn path(&self) -> &Path {
        self.temp_dir.path()
    }

    /// Writes `contents` into a file under the workspace and returns the path.
    pub fn write(&self, name: &str, contents: &str) -> PathBuf {
        let path = self.temp_dir.path().join(name);
        let mut file = File::create(&path).expect("create temp file");
        file.write_all(contents.as_bytes())
            .expect("write temp file contents");
        path
    }
}
