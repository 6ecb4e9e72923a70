//! # Reference Resolver
//!
//! Maps `(AST id, compilation unit)` pairs to IR nodes and runs the deferred
//! cross-referencing passes.
//!
//! A file shared by several compilation units is built once. Its nodes are
//! registered under every unit's numbering through the node path order table:
//! the n-th node of a file in pre-order is the same node in every unit.
//!
//! ```text
//! build tree ──▶ post-process callbacks (FIFO) ──▶ ... ──▶ destroy callbacks (FIFO, per file)
//! ```

use std::collections::{HashMap, HashSet, VecDeque};
use std::path::{Path, PathBuf};

use super::{IrArena, NodeRef};
use crate::ast::{AstNodeId, CuHash};
use crate::error::{Error, Result};

/// Mutable state handed to a post-process callback
pub struct CallbackParams<'a> {
    pub arena: &'a mut IrArena,
    pub resolver: &'a mut ReferenceResolver,
}

/// Position of a node in its file's pre-order node list
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct NodePathOrder {
    pub file: PathBuf,
    pub index: usize,
}

type PostProcessCallback = Box<dyn FnOnce(&mut CallbackParams<'_>) -> Result<()> + Send>;
type DestroyCallback = Box<dyn FnOnce(&mut IrArena) + Send>;

/// Per-compilation resolution tables and callback queues
#[derive(Default)]
pub struct ReferenceResolver {
    nodes: HashMap<(AstNodeId, CuHash), NodeRef>,
    /// Registrations per file, for cleanup
    file_registrations: HashMap<PathBuf, Vec<(AstNodeId, CuHash)>>,
    /// `(cu, file)` → ids in pre-order
    path_orders: HashMap<(CuHash, PathBuf), Vec<AstNodeId>>,
    /// `(id, cu)` → position in its file's pre-order list
    node_orders: HashMap<(AstNodeId, CuHash), NodePathOrder>,
    post_process: VecDeque<(PathBuf, PostProcessCallback)>,
    destroy: HashMap<PathBuf, Vec<DestroyCallback>>,
}

impl std::fmt::Debug for ReferenceResolver {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ReferenceResolver")
            .field("nodes", &self.nodes.len())
            .field("path_orders", &self.path_orders.len())
            .field("pending_post_process", &self.post_process.len())
            .field("destroy_files", &self.destroy.len())
            .finish()
    }
}

impl ReferenceResolver {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register `node` under `(id, cu)`; the registration belongs to `file`
    pub fn register_node(&mut self, id: AstNodeId, cu: CuHash, node: NodeRef, file: &Path) {
        self.nodes.insert((id, cu), node);
        self.file_registrations
            .entry(file.to_path_buf())
            .or_default()
            .push((id, cu));
    }

    /// Node registered under `(id, cu)`
    pub fn resolve_node(&self, id: AstNodeId, cu: CuHash) -> Result<NodeRef> {
        self.nodes
            .get(&(id, cu))
            .copied()
            .ok_or(Error::UnresolvedReference { id, cu })
    }

    /// Number of live registrations
    pub fn registered_count(&self) -> usize {
        self.nodes.len()
    }

    /// Record the pre-order node list of `file` as compiled in `cu`
    pub fn index_node_path_order(&mut self, cu: CuHash, file: &Path, order: Vec<AstNodeId>) {
        for (index, id) in order.iter().enumerate() {
            self.node_orders.insert(
                (*id, cu),
                NodePathOrder {
                    file: file.to_path_buf(),
                    index,
                },
            );
        }
        self.path_orders.insert((cu, file.to_path_buf()), order);
    }

    /// True if the pre-order node list of `file` in `cu` is indexed
    pub fn has_path_order(&self, cu: CuHash, file: &Path) -> bool {
        self.path_orders.contains_key(&(cu, file.to_path_buf()))
    }

    /// Position of `(id, cu)` in its file's pre-order node list
    pub fn node_path_order(&self, id: AstNodeId, cu: CuHash) -> Result<NodePathOrder> {
        self.node_orders
            .get(&(id, cu))
            .cloned()
            .ok_or(Error::UnresolvedReference { id, cu })
    }

    /// AST id, in `cu`'s numbering, of the node at `order`
    pub fn ast_id_from_path_order(&self, order: &NodePathOrder, cu: CuHash) -> Result<AstNodeId> {
        self.path_orders
            .get(&(cu, order.file.clone()))
            .and_then(|ids| ids.get(order.index))
            .copied()
            .ok_or_else(|| {
                Error::invariant(format!(
                    "no node at path order {} of {} in unit {}",
                    order.index,
                    order.file.display(),
                    cu
                ))
            })
    }

    /// Register the already built nodes of `file` (built by `from`) under `to`'s numbering
    pub fn alias_source_unit(&mut self, file: &Path, from: CuHash, to: CuHash) -> Result<usize> {
        let key_from = (from, file.to_path_buf());
        let key_to = (to, file.to_path_buf());
        let (Some(from_ids), Some(to_ids)) = (self.path_orders.get(&key_from), self.path_orders.get(&key_to)) else {
            return Err(Error::invariant(format!(
                "path order of {} missing for aliasing {} -> {}",
                file.display(),
                from,
                to
            )));
        };
        if from_ids.len() != to_ids.len() {
            return Err(Error::invariant(format!(
                "{} has {} nodes in unit {} but {} in unit {}",
                file.display(),
                from_ids.len(),
                from,
                to_ids.len(),
                to
            )));
        }
        let aliases: Vec<(AstNodeId, NodeRef)> = from_ids
            .iter()
            .zip(to_ids)
            .filter_map(|(old, new)| self.nodes.get(&(*old, from)).map(|node| (*new, *node)))
            .collect();
        let count = aliases.len();
        for (id, node) in aliases {
            self.register_node(id, to, node, file);
        }
        Ok(count)
    }

    /// Queue `callback` to run after the whole current tree is registered
    pub fn register_post_process_callback<F>(&mut self, file: &Path, callback: F)
    where
        F: FnOnce(&mut CallbackParams<'_>) -> Result<()> + Send + 'static,
    {
        self.post_process
            .push_back((file.to_path_buf(), Box::new(callback)));
    }

    /// Queue `callback` to run when `file` is invalidated
    pub fn register_destroy_callback<F>(&mut self, file: &Path, callback: F)
    where
        F: FnOnce(&mut IrArena) + Send + 'static,
    {
        self.destroy
            .entry(file.to_path_buf())
            .or_default()
            .push(Box::new(callback));
    }

    /// Run queued post-process callbacks in order.
    ///
    /// A failing callback marks its file failed; the file's remaining
    /// callbacks are skipped. Returns the first failure of every failed file.
    pub fn run_post_process_callbacks(&mut self, arena: &mut IrArena) -> Vec<(PathBuf, Error)> {
        let mut failures: Vec<(PathBuf, Error)> = Vec::new();
        let mut failed: HashSet<PathBuf> = HashSet::new();

        // callbacks may queue further callbacks
        while !self.post_process.is_empty() {
            let queue = std::mem::take(&mut self.post_process);
            for (file, callback) in queue {
                if failed.contains(&file) {
                    continue;
                }
                let mut params = CallbackParams {
                    arena: &mut *arena,
                    resolver: &mut *self,
                };
                if let Err(err) = callback(&mut params) {
                    tracing::warn!("post-process failed for {}: {}", file.display(), err);
                    failed.insert(file.clone());
                    failures.push((file, err));
                }
            }
        }
        failures
    }

    /// Drop queued post-process callbacks of a file
    pub fn discard_post_process_callbacks(&mut self, file: &Path) {
        self.post_process.retain(|(f, _)| f != file);
    }

    /// Run and remove the destroy callbacks of `file`, in registration order
    pub fn run_destroy_callbacks(&mut self, file: &Path, arena: &mut IrArena) -> usize {
        let callbacks = self.destroy.remove(file).unwrap_or_default();
        let count = callbacks.len();
        for callback in callbacks {
            callback(arena);
        }
        count
    }

    /// Remove every registration and path order entry of `file`
    pub fn unregister_file(&mut self, file: &Path) {
        if let Some(registrations) = self.file_registrations.remove(file) {
            for key in registrations {
                self.nodes.remove(&key);
            }
        }
        self.path_orders.retain(|(_, f), _| f != file);
        self.node_orders.retain(|_, order| order.file != file);
    }
}
