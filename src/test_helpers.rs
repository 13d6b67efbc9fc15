//! Shared test utilities for the docgen test suite.
//!
//! # Usage
//!
//! ```ignore
//! use crate::test_helpers::*;
//!
//! let site = setup_fixtures();
//! let source = site.path().join("site");
//! set_mtime(&source.join("guide.markdown"), UNIX_EPOCH + Duration::from_secs(60));
//! ```

use std::fs;
use std::path::{Path, PathBuf};
use std::time::SystemTime;
use tempfile::TempDir;

use crate::config::{SiteConfig, SitePaths};

// =========================================================================
// Fixture setup
// =========================================================================

/// Copy `fixtures/site/` to `<tmp>/site` and return the temp dir.
///
/// Tests get an isolated copy they can mutate without affecting other tests
/// or the source fixtures. Output is expected under `<tmp>/out`.
pub fn setup_fixtures() -> TempDir {
    let tmp = TempDir::new().unwrap();
    let fixtures = Path::new(env!("CARGO_MANIFEST_DIR")).join("fixtures/site");
    let dest = tmp.path().join("site");
    fs::create_dir_all(&dest).unwrap();
    copy_dir_recursive(&fixtures, &dest).unwrap();
    tmp
}

/// Site paths for a fixture copy, with `cp` standing in for the stylesheet
/// compiler.
pub fn fixture_config(tmp: &TempDir) -> (SiteConfig, SitePaths) {
    let mut config = SiteConfig::default();
    config.stylesheet.compiler = "cp".to_string();
    let paths = SitePaths::resolve(&config, &tmp.path().join("site"), &tmp.path().join("out"));
    (config, paths)
}

fn copy_dir_recursive(src: &Path, dst: &Path) -> std::io::Result<()> {
    for entry in fs::read_dir(src)? {
        let entry = entry?;
        let src_path = entry.path();
        let dst_path = dst.join(entry.file_name());

        if src_path.is_dir() {
            fs::create_dir_all(&dst_path)?;
            copy_dir_recursive(&src_path, &dst_path)?;
        } else {
            fs::copy(&src_path, &dst_path)?;
        }
    }
    Ok(())
}

// =========================================================================
// Filesystem helpers
// =========================================================================

/// Write `content` to `path`, creating parent directories.
pub fn write_file(path: &Path, content: &str) -> PathBuf {
    if let Some(parent) = path.parent() {
        fs::create_dir_all(parent).unwrap();
    }
    fs::write(path, content).unwrap();
    path.to_path_buf()
}

/// Set a file's modification time. Panics if the file does not exist.
pub fn set_mtime(path: &Path, time: SystemTime) {
    fs::File::options()
        .write(true)
        .open(path)
        .unwrap_or_else(|e| panic!("cannot open {} to set mtime: {e}", path.display()))
        .set_modified(time)
        .unwrap();
}
