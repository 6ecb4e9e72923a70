//! Error types for solir

use std::path::PathBuf;

use thiserror::Error;

use crate::ast::{AstNodeId, CuHash};

/// IR construction and analysis errors
#[derive(Error, Debug, Clone)]
pub enum Error {
    // Resolution errors
    /// A node id or declaration lookup found nothing in the given compilation unit
    ///
    /// **Triggered by:** Resolving an id that was never registered, or whose file was invalidated
    /// **Recovery:** Surfaced to the caller; usually a stale or cross-unit id
    #[error("Unresolved reference: node {id} in compilation unit {cu}")]
    UnresolvedReference {
        /// Numeric AST node id
        id: AstNodeId,
        /// Compilation unit the lookup was scoped to
        cu: CuHash,
    },

    /// Name-location or identifier-path parsing found no match
    ///
    /// **Triggered by:** Raw AST whose source range does not start with the expected keyword
    /// **Example:** A struct node whose source bytes do not read `struct <name>`
    #[error("Malformed source in {file} at byte {offset}: {message}")]
    MalformedSource {
        /// File containing the node
        file: PathBuf,
        /// Byte offset of the node start
        offset: usize,
        /// What was expected
        message: String,
    },

    /// A CFG or summarizer path met a node shape it does not model
    #[error("Unsupported construct: {kind}")]
    UnsupportedConstruct {
        /// Node kind name
        kind: String,
    },

    /// Resolver-table contract violation
    ///
    /// **Triggered by:** Out-of-range nesting levels, parents missing while walking up
    #[error("Invariant violation: {0}")]
    InvariantViolation(String),

    // Input errors
    /// Raw AST JSON did not match the expected shape
    #[error("Invalid AST for {file}: {message}")]
    InvalidAst {
        /// Source file of the AST
        file: PathBuf,
        /// Deserialization error
        message: String,
    },

    /// File has no source unit in the current compilation
    #[error("Unknown file: {0}")]
    UnknownFile(PathBuf),

    /// External compiler invocation failed
    #[error("Compiler error: {0}")]
    Compiler(String),

    /// File was edited or closed while the compiler was reading it
    ///
    /// **Recovery:** The unit's output is discarded; the next recompilation picks up the new text
    #[error("Superseded during compilation: {0}")]
    Superseded(PathBuf),

    /// Configuration could not be parsed
    #[error("Configuration error: {0}")]
    Config(String),

    // Analysis errors
    /// A detector failed while visiting or reporting
    #[error("Detector {detector} failed: {message}")]
    Detector {
        /// Detector name
        detector: String,
        /// Failure description
        message: String,
    },
}

/// Error severity classification
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorSeverity {
    /// Aborts processing of the affected file
    Fatal,
    /// Reported to the caller, processing continues
    Recoverable,
    /// Only degrades a result
    Warning,
}

impl Error {
    /// Create an invariant violation with a message
    pub fn invariant(msg: impl Into<String>) -> Self {
        Error::InvariantViolation(msg.into())
    }

    /// Create a malformed-source error
    pub fn malformed(file: impl Into<PathBuf>, offset: usize, msg: impl Into<String>) -> Self {
        Error::MalformedSource {
            file: file.into(),
            offset,
            message: msg.into(),
        }
    }

    /// Create a detector error
    pub fn detector(detector: impl Into<String>, msg: impl Into<String>) -> Self {
        Error::Detector {
            detector: detector.into(),
            message: msg.into(),
        }
    }

    /// Classify error severity
    pub fn classify(&self) -> ErrorSeverity {
        match self {
            Error::MalformedSource { .. } => ErrorSeverity::Fatal,
            Error::InvariantViolation(_) => ErrorSeverity::Fatal,
            Error::InvalidAst { .. } => ErrorSeverity::Fatal,

            Error::UnresolvedReference { .. } => ErrorSeverity::Recoverable,
            Error::UnknownFile(_) => ErrorSeverity::Recoverable,
            Error::Compiler(_) => ErrorSeverity::Recoverable,
            Error::Superseded(_) => ErrorSeverity::Recoverable,
            Error::Config(_) => ErrorSeverity::Recoverable,
            Error::Detector { .. } => ErrorSeverity::Recoverable,

            Error::UnsupportedConstruct { .. } => ErrorSeverity::Warning,
        }
    }
}

/// Result type for solir operations
pub type Result<T> = std::result::Result<T, Error>;
