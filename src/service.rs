//! # Analysis Session
//!
//! Async façade for interactive callers (an editor integration, a CLI watch
//! loop). The session owns the [`Compilation`] and the code lens cache and
//! is the only place they are mutated.
//!
//! Requests that need compiler output wait until no recompilation is in
//! flight. Edits arriving while the compiler runs win over its output: units
//! compiled from superseded text are discarded and reported.

use std::collections::HashMap;
use std::path::{Path, PathBuf};

use async_trait::async_trait;
use tokio::sync::{watch, Mutex};

use crate::ast::CompilationUnitInput;
use crate::compilation::{Compilation, FileFailure};
use crate::config::AnalysisConfig;
use crate::detectors::{run_detectors, DetectionReport, DetectorRegistry};
use crate::error::{Error, Result};
use crate::incremental::{code_lens, CodeLens, ForwardChanges, IncrementalCache};
use crate::span::LineIndex;

/// Boundary to the external compiler
#[async_trait]
pub trait AstProducer: Send + Sync {
    /// Compile the units containing `paths`. Files present in `overlay` are
    /// compiled from the given text instead of their on-disk content.
    async fn compile(
        &self,
        paths: &[PathBuf],
        overlay: &HashMap<PathBuf, String>,
    ) -> Result<Vec<CompilationUnitInput>>;
}

#[derive(Debug)]
struct SessionState {
    compilation: Compilation,
    code_lens_cache: IncrementalCache<CodeLens>,
    /// Edits since the last compilation of each file
    forward_changes: HashMap<PathBuf, ForwardChanges>,
    /// Latest editor text of each changed file
    texts: HashMap<PathBuf, String>,
    /// Edit stamp of each file in `texts`; taken from `next_edit`
    edit_generations: HashMap<PathBuf, u64>,
    next_edit: u64,
}

impl SessionState {
    fn stamp_edit(&mut self, path: &Path) {
        self.next_edit += 1;
        self.edit_generations.insert(path.to_path_buf(), self.next_edit);
    }
}

/// Counts a recompilation as in flight until dropped
struct CompileGuard<'a>(&'a watch::Sender<usize>);

impl<'a> CompileGuard<'a> {
    fn new(in_flight: &'a watch::Sender<usize>) -> Self {
        in_flight.send_modify(|n| *n += 1);
        Self(in_flight)
    }
}

impl Drop for CompileGuard<'_> {
    fn drop(&mut self) {
        self.0.send_modify(|n| *n = n.saturating_sub(1));
    }
}

pub struct AnalysisSession<P: AstProducer> {
    producer: P,
    config: AnalysisConfig,
    registry: DetectorRegistry,
    state: Mutex<SessionState>,
    /// Number of recompilations in flight
    compiling: watch::Sender<usize>,
}

impl<P: AstProducer> AnalysisSession<P> {
    pub fn new(producer: P, config: AnalysisConfig) -> Self {
        Self::with_registry(producer, config, DetectorRegistry::new())
    }

    pub fn with_registry(producer: P, config: AnalysisConfig, registry: DetectorRegistry) -> Self {
        let state = SessionState {
            compilation: Compilation::new(&config),
            code_lens_cache: IncrementalCache::new(),
            forward_changes: HashMap::new(),
            texts: HashMap::new(),
            edit_generations: HashMap::new(),
            next_edit: 0,
        };
        let (compiling, _) = watch::channel(0);
        Self {
            producer,
            config,
            registry,
            state: Mutex::new(state),
            compiling,
        }
    }

    pub fn config(&self) -> &AnalysisConfig {
        &self.config
    }

    /// Recompile the units containing `paths` and replace their IR.
    ///
    /// A unit with a file edited or closed after its text was handed to the
    /// compiler is not installed; each such file is reported as
    /// [`Error::Superseded`] and keeps its pending edits.
    pub async fn recompile(&self, paths: &[PathBuf]) -> Result<Vec<FileFailure>> {
        let _guard = CompileGuard::new(&self.compiling);
        let (overlay, generations) = {
            let state = self.state.lock().await;
            (state.texts.clone(), state.edit_generations.clone())
        };

        let units = match self.producer.compile(paths, &overlay).await {
            Ok(units) => units,
            Err(err) => {
                tracing::warn!("compilation failed: {}", err);
                return Err(err);
            }
        };

        let mut state = self.state.lock().await;
        let mut failures = Vec::new();
        let mut installed = 0;
        for unit in &units {
            let superseded: Vec<&Path> = unit
                .sources
                .iter()
                .map(|source| source.path.as_path())
                .filter(|path| state.edit_generations.get(*path) != generations.get(*path))
                .collect();
            if !superseded.is_empty() {
                tracing::debug!("dropping unit {}: {} files edited during compilation", unit.hash, superseded.len());
                failures.extend(superseded.into_iter().map(|path| FileFailure {
                    path: path.to_path_buf(),
                    error: Error::Superseded(path.to_path_buf()),
                }));
                continue;
            }
            failures.extend(state.compilation.add_compilation_unit(unit));
            for source in &unit.sources {
                state.forward_changes.remove(&source.path);
            }
            installed += 1;
        }
        drop(state);

        tracing::info!(
            "recompiled {} of {} units, {} file failures",
            installed,
            units.len(),
            failures.len()
        );
        Ok(failures)
    }

    /// Record an edit: drop the file's IR and remember how the text moved
    pub async fn file_changed(&self, path: &Path, text: String, changes: ForwardChanges) {
        let mut state = self.state.lock().await;
        state.compilation.invalidate_file(path);
        state.texts.insert(path.to_path_buf(), text);
        state.stamp_edit(path);
        state
            .forward_changes
            .entry(path.to_path_buf())
            .or_default()
            .extend(&changes);
        state.code_lens_cache.bump_generation(path);
    }

    /// Forget the editor text of `path`. Later compilations read it from
    /// disk; IR built from the dropped text is invalidated.
    pub async fn file_closed(&self, path: &Path) {
        let mut state = self.state.lock().await;
        if state.texts.remove(path).is_none() {
            return;
        }
        state.edit_generations.remove(path);
        state.forward_changes.remove(path);
        state.compilation.invalidate_file(path);
        state.code_lens_cache.remove(path);
        tracing::debug!("closed {}", path.display());
    }

    /// Code lenses of `path`: regenerated from fresh IR, otherwise served
    /// from the cache. `None` when disabled or nothing is known about the file.
    pub async fn code_lens(&self, path: &Path) -> Result<Option<Vec<CodeLens>>> {
        if !self.config.code_lens.enable {
            return Ok(None);
        }
        self.wait_output_ready().await?;

        let mut state = self.state.lock().await;
        let state = &mut *state;

        if let Some(source_unit) = state.compilation.source_unit(path) {
            let Some(lines) = state.compilation.line_index(path) else {
                return Err(Error::UnknownFile(path.to_path_buf()));
            };
            let mut transaction = state.code_lens_cache.begin(path);
            let lenses = code_lens::generate(state.compilation.arena(), source_unit, &lines, &mut transaction)?;
            state.code_lens_cache.commit(transaction);
            return Ok(Some(lenses));
        }

        let (Some(changes), Some(text)) = (state.forward_changes.get(path), state.texts.get(path)) else {
            return Ok(None);
        };
        let lines = LineIndex::new(text.as_bytes());
        Ok(state.code_lens_cache.lookup(path, changes, &lines))
    }

    /// Run the configured detectors over every live source unit
    pub async fn detect(&self) -> Result<DetectionReport> {
        self.wait_output_ready().await?;
        let state = self.state.lock().await;
        let ctx = state.compilation.analysis_context();
        let roots: Vec<_> = ctx.arena.source_units().into_iter().map(|(_, unit)| unit).collect();
        let detectors = self.registry.instantiate(&self.config.detectors);
        Ok(run_detectors(&ctx, &roots, detectors))
    }

    /// Files with live IR, sorted
    pub async fn live_files(&self) -> Vec<PathBuf> {
        self.state.lock().await.compilation.files()
    }

    async fn wait_output_ready(&self) -> Result<()> {
        let mut compiling = self.compiling.subscribe();
        compiling
            .wait_for(|n| *n == 0)
            .await
            .map(|_| ())
            .map_err(|_| Error::Compiler("session closed".to_string()))
    }
}
