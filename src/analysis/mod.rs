//! Analyses over a built IR: control flow graphs and state-mutation summaries.
//!
//! Both are computed lazily and memoized. An [`AnalysisContext`] bundles the
//! read-only IR with the memo tables so that detectors and the code lens see
//! one consistent snapshot.

pub mod cfg;
pub mod modifies_state;

pub use cfg::{BasicBlock, Cfg, CfgCache, EdgeCondition, Reachability};
pub use modifies_state::{EffectSet, ModifiesStateFlags, ModifiesStateSummarizer};

use std::sync::Arc;

use crate::error::{Error, Result};
use crate::ir::{IrArena, NodeRef, ReferenceResolver};

/// Read-only view over a compilation and its analysis caches
#[derive(Clone, Copy)]
pub struct AnalysisContext<'a> {
    pub arena: &'a IrArena,
    pub resolver: &'a ReferenceResolver,
    cfgs: &'a CfgCache,
    summarizer: &'a ModifiesStateSummarizer,
}

impl<'a> AnalysisContext<'a> {
    pub fn new(
        arena: &'a IrArena,
        resolver: &'a ReferenceResolver,
        cfgs: &'a CfgCache,
        summarizer: &'a ModifiesStateSummarizer,
    ) -> Self {
        Self {
            arena,
            resolver,
            cfgs,
            summarizer,
        }
    }

    /// Control flow graph of an implemented function or modifier.
    ///
    /// Bodies using a construct the graph does not model yield `None`.
    pub fn cfg(&self, declaration: NodeRef) -> Result<Option<Arc<Cfg>>> {
        match self.cfgs.get_or_build(self.arena, declaration) {
            Err(Error::UnsupportedConstruct { kind }) => {
                tracing::debug!("no control flow graph for {}: unsupported {}", declaration, kind);
                Ok(None)
            }
            other => other,
        }
    }

    /// State effects of the subtree rooted at `node`
    pub fn modifies_state(&self, node: NodeRef) -> Arc<EffectSet> {
        self.summarizer.modifies_state(self.arena, self.resolver, node)
    }

    /// Union of the state effect flags of a subtree
    pub fn modifies_state_flags(&self, node: NodeRef) -> ModifiesStateFlags {
        self.summarizer.flags(self.arena, self.resolver, node)
    }
}
