#![allow(dead_code)]

use markweave::{MarkweaveError, ParseMode, expand_file};
use std::fs;
use std::path::{Path, PathBuf};
use tempfile::TempDir;

pub type TestResult = Result<(), Box<dyn std::error::Error>>;

pub fn init_logger() {
    let _ = env_logger::builder().is_test(true).try_init();
}

/// A throwaway directory of documents, laid out like a small site.
pub struct Site {
    dir: TempDir,
}

impl Site {
    pub fn new() -> Self {
        init_logger();
        Self {
            dir: TempDir::new().expect("create temp dir"),
        }
    }

    /// Writes `contents` to `relative`, creating parent directories.
    pub fn with(self, relative: &str, contents: &str) -> Self {
        let path = self.path(relative);
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent).expect("create fixture dir");
        }
        fs::write(&path, contents).expect("write fixture");
        self
    }

    pub fn root(&self) -> &Path {
        self.dir.path()
    }

    pub fn path(&self, relative: &str) -> PathBuf {
        self.dir.path().join(relative)
    }

    pub fn expand(&self, host: &str, mode: ParseMode) -> Result<String, MarkweaveError> {
        let out = expand_file(self.path(host), mode)?;
        Ok(String::from_utf8(out).expect("expanded output is UTF-8"))
    }
}
