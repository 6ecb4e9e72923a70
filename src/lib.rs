//! # Solir - Solidity IR for Static Analysis
//!
//! A source-position-aware intermediate representation of Solidity programs,
//! built from the compiler's JSON AST, plus the analyses an editor
//! integration or a vulnerability scanner needs on top of it.
//!
//! ## Architecture
//!
//! ```text
//! CompilationUnitInput ──▶ IrBuilder ──▶ IrArena ◀──▶ ReferenceResolver
//!                                          │
//!               ┌──────────────────────────┼─────────────────────┐
//!               ▼                          ▼                     ▼
//!         analysis::cfg         analysis::modifies_state     detectors
//!               │                                                │
//!               └────────▶ incremental (code lens cache) ◀───────┘
//!                                   │
//!                                   ▼
//!                          service::AnalysisSession
//! ```
//!
//! - [`ast`]: serde model of the compiler JSON AST, path-order indexing
//! - [`ir`]: the node arena, the builder and the cross-unit resolver
//! - [`analysis`]: control flow graphs and state-mutation summaries
//! - [`detectors`]: visitor framework and the bundled detectors
//! - [`incremental`]: interval tree and the edit-tolerant artifact cache
//! - [`compilation`]: applies compilation units to the IR
//! - [`service`]: async session driving recompilation and requests
//!
//! ## Usage
//!
//! ```text
//! let mut compilation = Compilation::new(&AnalysisConfig::default());
//! let failures = compilation.add_compilation_unit(&unit);
//! let ctx = compilation.analysis_context();
//! let report = run_detectors(&ctx, &roots, DetectorRegistry::new().instantiate(&config.detectors));
//! ```

#![allow(clippy::too_many_arguments)] // Builder helpers mirror AST node fields
#![allow(clippy::large_enum_variant)] // IR kinds are stored once per node in the arena

/// Version of the solir crate
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

pub mod analysis;
pub mod ast;
pub mod compilation;
pub mod config;
pub mod detectors;
pub mod error;
pub mod incremental;
pub mod ir;
pub mod service;
pub mod span;

// Re-export main types
pub use analysis::{AnalysisContext, Cfg, CfgCache, ModifiesStateFlags, ModifiesStateSummarizer};
pub use ast::{AstNodeId, CompilationUnitInput, CuHash, SourceInput};
pub use compilation::{Compilation, FileFailure};
pub use config::AnalysisConfig;
pub use detectors::{run_detectors, DetectionReport, Detector, DetectorRegistry, Finding, Visitor};
pub use error::{Error, ErrorSeverity, Result};
pub use incremental::{CodeLens, ForwardChanges, IncrementalCache, IntervalTree};
pub use ir::{IrArena, IrNode, NodeKind, NodeRef, ReferenceResolver};
pub use service::{AnalysisSession, AstProducer};
pub use span::{ByteRange, LineIndex, LineSpan, Position};
