//! Shared types passed between the pipeline components.

use std::path::PathBuf;

/// Page metadata collected from `^title` / `^category` directive lines.
///
/// Both fields default to the empty string when the source has no directive
/// for them. Lives only for the conversion of a single file.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct PageMetadata {
    pub title: String,
    pub category: String,
}

/// Whether a pass reconverts every page or only stale ones.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Mode {
    /// Convert every page unconditionally (initial one-shot pass).
    Full,
    /// Convert only pages whose output is older than their inputs.
    Incremental,
}

impl Mode {
    pub fn skips_up_to_date(self) -> bool {
        matches!(self, Mode::Incremental)
    }
}

/// Progress reported by the pipeline driver while a pass runs.
///
/// The driver never prints; it hands these to a caller-supplied sink and
/// [`crate::output`] turns them into console lines.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum BuildEvent {
    /// A page was written. Path is relative to the source root.
    Converted { path: PathBuf },
    /// The stylesheet compiler ran.
    StylesheetBuilt,
    /// A directive with an unrecognized command was dropped.
    UnknownDirective { command: String, args: String },
    /// A page failed to convert during watch mode and will be retried.
    PageFailed { path: PathBuf, message: String },
}
