//! Stylesheet compilation.
//!
//! The site stylesheet is written in a preprocessor language and compiled by
//! an external tool invoked as `<compiler> <source> <output>`. Compilation is
//! skipped while the compiled file is strictly newer than its source.

use crate::staleness;
use std::fs;
use std::path::{Path, PathBuf};
use std::process::{Command, ExitStatus};
use thiserror::Error;

#[derive(Error, Debug)]
pub enum StyleError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
    #[error("stylesheet source not found: {0}")]
    MissingSource(PathBuf),
    #[error("failed to run stylesheet compiler '{compiler}': {source}")]
    Spawn {
        compiler: String,
        source: std::io::Error,
    },
    #[error("stylesheet compiler '{compiler}' failed: {status}")]
    CompilerFailed { compiler: String, status: ExitStatus },
}

/// Compiles the stylesheet on demand.
#[derive(Debug, Clone)]
pub struct StyleBuilder {
    pub compiler: String,
    pub source: PathBuf,
    pub output: PathBuf,
}

impl StyleBuilder {
    pub fn new(compiler: impl Into<String>, source: &Path, output: &Path) -> Self {
        Self {
            compiler: compiler.into(),
            source: source.to_path_buf(),
            output: output.to_path_buf(),
        }
    }

    /// Whether the compiled output is missing or not newer than the source.
    pub fn needs_build(&self) -> Result<bool, StyleError> {
        let source_mod = match staleness::modified(&self.source) {
            Ok(t) => t,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                return Err(StyleError::MissingSource(self.source.clone()));
            }
            Err(e) => return Err(e.into()),
        };
        let output_mod = staleness::modified_or_epoch(&self.output)?;
        Ok(source_mod >= output_mod)
    }

    /// Run the compiler if needed. Returns whether it ran.
    ///
    /// Blocks until the compiler exits.
    pub fn build_if_stale(&self) -> Result<bool, StyleError> {
        if !self.needs_build()? {
            return Ok(false);
        }
        if let Some(parent) = self.output.parent() {
            fs::create_dir_all(parent)?;
        }
        let status = Command::new(&self.compiler)
            .arg(&self.source)
            .arg(&self.output)
            .status()
            .map_err(|source| StyleError::Spawn {
                compiler: self.compiler.clone(),
                source,
            })?;
        if !status.success() {
            return Err(StyleError::CompilerFailed {
                compiler: self.compiler.clone(),
                status,
            });
        }
        Ok(true)
    }
}
