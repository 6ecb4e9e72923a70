//! # Compilation
//!
//! Owner of the IR arena, the reference resolver and the analysis caches.
//! Every mutation of the IR goes through here: adding the output of a
//! compilation unit and invalidating files.
//!
//! A file shared by several units is built once, by the first unit that
//! contains it, and aliased into the numbering of later units. A build is
//! reused only while its content is unchanged and every file of the unit that
//! built it is still live; otherwise the file is destroyed and rebuilt.

use std::collections::{BTreeSet, HashMap};
use std::path::{Path, PathBuf};
use std::sync::Arc;

use crate::analysis::{AnalysisContext, CfgCache, ModifiesStateSummarizer};
use crate::ast::{node_path_order, CompilationUnitInput, CuHash, SourceInput};
use crate::config::AnalysisConfig;
use crate::error::Error;
use crate::ir::{IrArena, IrBuilder, NodeRef, ReferenceResolver};
use crate::span::LineIndex;

/// A file that could not be built or resolved
#[derive(Debug)]
pub struct FileFailure {
    pub path: PathBuf,
    pub error: Error,
}

#[derive(Debug, Clone)]
struct FileState {
    /// Unit that built the file
    cu: CuHash,
    source: Arc<[u8]>,
    lines: Arc<LineIndex>,
}

/// IR of every live file plus lazily computed analyses
#[derive(Debug)]
pub struct Compilation {
    arena: IrArena,
    resolver: ReferenceResolver,
    files: HashMap<PathBuf, FileState>,
    /// Files of every added unit
    unit_files: HashMap<CuHash, Vec<PathBuf>>,
    cfgs: CfgCache,
    summarizer: ModifiesStateSummarizer,
}

impl Default for Compilation {
    fn default() -> Self {
        Self::new(&AnalysisConfig::default())
    }
}

impl Compilation {
    pub fn new(config: &AnalysisConfig) -> Self {
        Self {
            arena: IrArena::new(),
            resolver: ReferenceResolver::new(),
            files: HashMap::new(),
            unit_files: HashMap::new(),
            cfgs: CfgCache::new(),
            summarizer: ModifiesStateSummarizer::new(config.summarizer_cache_capacity),
        }
    }

    /// Add the output of one compilation unit.
    ///
    /// Failures are per file; a failed file is destroyed and every other file
    /// of the unit stays live.
    pub fn add_compilation_unit(&mut self, unit: &CompilationUnitInput) -> Vec<FileFailure> {
        let mut failures = Vec::new();
        let cu = unit.hash;

        // destroy stale builds first; destroying one can make another stale
        loop {
            let stale: Vec<PathBuf> = unit
                .sources
                .iter()
                .filter(|input| self.is_stale(input))
                .map(|input| input.path.clone())
                .collect();
            if stale.is_empty() {
                break;
            }
            for path in stale {
                tracing::debug!("rebuilding stale {}", path.display());
                self.destroy_file(&path);
            }
        }

        for input in &unit.sources {
            self.resolver
                .index_node_path_order(cu, &input.path, node_path_order(&input.ast));
        }
        self.unit_files
            .insert(cu, unit.sources.iter().map(|s| s.path.clone()).collect());

        for input in &unit.sources {
            let result = match self.files.get(&input.path) {
                Some(state) if state.cu == cu => continue,
                Some(state) => self
                    .resolver
                    .alias_source_unit(&input.path, state.cu, cu)
                    .map(|count| {
                        tracing::debug!("aliased {} nodes of {} into unit {}", count, input.path.display(), cu);
                    }),
                None => self.build_file(cu, input),
            };
            if let Err(error) = result {
                tracing::warn!("failed to build {}: {}", input.path.display(), error);
                self.destroy_file(&input.path);
                failures.push(FileFailure {
                    path: input.path.clone(),
                    error,
                });
            }
        }

        for (path, error) in self.resolver.run_post_process_callbacks(&mut self.arena) {
            self.destroy_file(&path);
            failures.push(FileFailure { path, error });
        }

        self.clear_analysis_caches();
        tracing::info!(
            "compilation unit {}: {} files, {} failed, {} nodes live",
            cu,
            unit.sources.len(),
            failures.len(),
            self.arena.len()
        );
        failures
    }

    /// Destroy the IR of `path`. Returns false if the file was not built.
    pub fn invalidate_file(&mut self, path: &Path) -> bool {
        if !self.files.contains_key(path) {
            return false;
        }
        let removed = self.destroy_file(path);
        self.clear_analysis_caches();
        tracing::debug!("invalidated {} ({} nodes)", path.display(), removed);
        true
    }

    /// Live files built by unit `cu`, sorted
    pub fn files_built_with(&self, cu: CuHash) -> Vec<PathBuf> {
        let files: BTreeSet<PathBuf> = self
            .files
            .iter()
            .filter(|(_, state)| state.cu == cu)
            .map(|(path, _)| path.clone())
            .collect();
        files.into_iter().collect()
    }

    /// Units whose file list contains `path`
    pub fn units_containing(&self, path: &Path) -> Vec<CuHash> {
        let mut units: Vec<CuHash> = self
            .unit_files
            .iter()
            .filter(|(_, files)| files.iter().any(|f| f == path))
            .map(|(cu, _)| *cu)
            .collect();
        units.sort();
        units
    }

    /// Live files, sorted
    pub fn files(&self) -> Vec<PathBuf> {
        let mut files: Vec<PathBuf> = self.files.keys().cloned().collect();
        files.sort();
        files
    }

    pub fn is_built(&self, path: &Path) -> bool {
        self.files.contains_key(path)
    }

    /// Content the IR of `path` was built from
    pub fn source(&self, path: &Path) -> Option<Arc<[u8]>> {
        self.files.get(path).map(|state| Arc::clone(&state.source))
    }

    /// Line index of the content the IR of `path` was built from
    pub fn line_index(&self, path: &Path) -> Option<Arc<LineIndex>> {
        self.files.get(path).map(|state| Arc::clone(&state.lines))
    }

    pub fn source_unit(&self, path: &Path) -> Option<NodeRef> {
        self.arena.source_unit(path)
    }

    pub fn arena(&self) -> &IrArena {
        &self.arena
    }

    pub fn resolver(&self) -> &ReferenceResolver {
        &self.resolver
    }

    /// Read-only view for analyses and detectors
    pub fn analysis_context(&self) -> AnalysisContext<'_> {
        AnalysisContext::new(&self.arena, &self.resolver, &self.cfgs, &self.summarizer)
    }

    fn is_stale(&self, input: &SourceInput) -> bool {
        let Some(state) = self.files.get(&input.path) else {
            return false;
        };
        if *state.source != *input.source {
            return true;
        }
        // the building unit must still be complete for its ids to resolve
        self.unit_files
            .get(&state.cu)
            .map(|files| files.iter().any(|f| !self.resolver.has_path_order(state.cu, f)))
            .unwrap_or(true)
    }

    fn build_file(&mut self, cu: CuHash, input: &SourceInput) -> crate::error::Result<()> {
        IrBuilder::build(&mut self.arena, &mut self.resolver, cu, input)?;
        let source: Arc<[u8]> = Arc::from(input.source.as_slice());
        self.files.insert(
            input.path.clone(),
            FileState {
                cu,
                lines: Arc::new(LineIndex::new(&source)),
                source,
            },
        );
        Ok(())
    }

    /// Undo everything built for `path`, including a partial build
    fn destroy_file(&mut self, path: &Path) -> usize {
        self.resolver.discard_post_process_callbacks(path);
        let callbacks = self.resolver.run_destroy_callbacks(path, &mut self.arena);
        let removed = self.arena.remove_file(path);
        self.resolver.unregister_file(path);
        self.files.remove(path);
        tracing::debug!(
            "destroyed {}: {} callbacks, {} nodes",
            path.display(),
            callbacks,
            removed
        );
        removed
    }

    fn clear_analysis_caches(&self) {
        self.cfgs.clear();
        self.summarizer.clear();
    }
}
