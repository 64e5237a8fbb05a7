/*
 * SPDX-License-Identifier: Apache-2.0 OR LGPL-2.1-or-later
 */

//! The error taxonomy for the condensed-summary assembler.
//!
//! Every fatal condition the assembler can hit is one of the variants
//! below. Each variant carries enough context (stage, file, record index)
//! to reproduce the diagnostic from a support request without re-running
//! anything. Nothing here is retried or recovered: the assembler is a
//! batch job that either runs to completion or aborts.

use std::path::PathBuf;

/// A record position within a binary input file, used to pinpoint where a
/// stream went wrong.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct RecordIndex(pub u64);

impl std::fmt::Display for RecordIndex {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "record #{}", self.0)
    }
}

#[derive(thiserror::Error, Debug)]
pub enum AssemblerError {
    #[error("[{stage}] required input not found: {path}")]
    InputNotFound { stage: &'static str, path: PathBuf },

    #[error("[{stage}] {path} truncated at {at}: expected {expected} more byte(s)")]
    TruncatedRecord {
        stage: &'static str,
        path: PathBuf,
        at: RecordIndex,
        expected: usize,
    },

    #[error("[{stage}] {path} is malformed JSON: {detail}")]
    MalformedJson {
        stage: &'static str,
        path: PathBuf,
        detail: String,
    },

    #[error("[{stage}] invariant violated at {path} ({at}): {detail}")]
    InvariantViolation {
        stage: &'static str,
        path: PathBuf,
        at: RecordIndex,
        detail: String,
    },

    #[error("[{stage}] value overflows its declared width at {path} ({at}): {detail}")]
    OverflowViolation {
        stage: &'static str,
        path: PathBuf,
        at: RecordIndex,
        detail: String,
    },

    #[error("[{stage}] I/O error on {path}: {source}")]
    IoError {
        stage: &'static str,
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
}

impl AssemblerError {
    pub fn io(stage: &'static str, path: impl Into<PathBuf>, source: std::io::Error) -> Self {
        AssemblerError::IoError {
            stage,
            path: path.into(),
            source,
        }
    }

    pub fn invariant(
        stage: &'static str,
        path: impl Into<PathBuf>,
        at: RecordIndex,
        detail: impl Into<String>,
    ) -> Self {
        AssemblerError::InvariantViolation {
            stage,
            path: path.into(),
            at,
            detail: detail.into(),
        }
    }

    pub fn overflow(
        stage: &'static str,
        path: impl Into<PathBuf>,
        at: RecordIndex,
        detail: impl Into<String>,
    ) -> Self {
        AssemblerError::OverflowViolation {
            stage,
            path: path.into(),
            at,
            detail: detail.into(),
        }
    }
}

pub type Result<T> = std::result::Result<T, AssemblerError>;
