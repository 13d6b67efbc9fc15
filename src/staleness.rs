//! Modification-time checks for incremental rebuilds.
//!
//! A page is up to date when its output exists and was written strictly after
//! both the page source and the default template were last modified. Editing
//! the template therefore makes every page stale.

use std::io;
use std::path::Path;
use std::time::{SystemTime, UNIX_EPOCH};

/// Modification time of `path`.
pub fn modified(path: &Path) -> io::Result<SystemTime> {
    path.metadata()?.modified()
}

/// Modification time of `path`, or the Unix epoch if it does not exist.
pub fn modified_or_epoch(path: &Path) -> io::Result<SystemTime> {
    match modified(path) {
        Err(e) if e.kind() == io::ErrorKind::NotFound => Ok(UNIX_EPOCH),
        other => other,
    }
}

/// Whether `output` is newer than both `source` and `template`.
///
/// Returns `Ok(false)` when the output does not exist yet. A missing source
/// or template is an error.
pub fn is_up_to_date(source: &Path, output: &Path, template: &Path) -> io::Result<bool> {
    let effective = modified(source)?.max(modified(template)?);
    match modified(output) {
        Ok(output_mod) => Ok(output_mod > effective),
        Err(e) if e.kind() == io::ErrorKind::NotFound => Ok(false),
        Err(e) => Err(e),
    }
}
