//! Structured error kinds for the renderer's external interfaces (model
//! parsing, file I/O, and the CLI's interrupt/internal-failure paths).
//!
//! Numeric edge cases inside the render core are *not* represented here —
//! per spec §7 they are absorbed by explicit clamps (zero-length `unit`,
//! near-zero determinant in triangle intersection, the distance floor in
//! emission) rather than surfaced as errors.

use std::path::PathBuf;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum MiniLightError {
    #[error("could not open model file {path}: {source}")]
    FileNotFound {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("invalid model file at line {line}: {detail}")]
    InvalidFormat { line: usize, detail: String },

    #[error("interrupted")]
    Interrupted,

    #[error("internal error: {0}")]
    Internal(String),
}

impl MiniLightError {
    /// The process exit code this error policy maps to (spec §7):
    /// `Interrupted` exits 0 like a clean cancellation, everything else
    /// exits 1.
    pub fn exit_code(&self) -> i32 {
        match self {
            MiniLightError::Interrupted => 0,
            _ => 1,
        }
    }
}
