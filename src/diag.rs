use std::fmt;
use std::path::{Path, PathBuf};

use serde::Serialize;

/// Category of a non-fatal condition encountered during a scan.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum DiagnosticKind {
    /// A symbolic link was skipped because link-following is disabled.
    SkippedSymlink,
    /// A directory entry could not be read during traversal.
    WalkError,
    /// A file could not be opened or read while hashing.
    UnreadableFile,
    /// A group member's parent directory has no recorded digest.
    UnresolvedParent,
    /// A directory could not be listed during likeness computation.
    UnlistableDirectory,
    /// A subdirectory's digest was requested before it was computed.
    MissingChildDigest,
}

/// A structured record of a recoverable problem. Collected alongside the
/// scan result instead of being printed from inside the pipeline, so the
/// caller controls presentation.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Diagnostic {
    pub kind: DiagnosticKind,
    pub path: PathBuf,
    pub message: String,
}

impl Diagnostic {
    pub fn new(kind: DiagnosticKind, path: &Path, message: impl Into<String>) -> Self {
        Self {
            kind,
            path: path.to_path_buf(),
            message: message.into(),
        }
    }
}

impl fmt::Display for Diagnostic {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}: '{}'", self.message, self.path.display())
    }
}
