//! # Control Flow Graph
//!
//! Builds the control flow graph of an implemented function or modifier body.
//!
//! Blocks live in a vector and refer to each other by index, so loops cost
//! nothing in ownership terms. Every graph has an empty start block (id 0)
//! and an end block that returns and reverts jump to.
//!
//! ```text
//! start ──▶ body ──▶ ... ──▶ end
//!                 └─ revert ─┘
//! ```

use std::collections::{BTreeSet, HashMap, VecDeque};
use std::fmt::Write as _;
use std::sync::Arc;

use dashmap::DashMap;

use crate::ast::GlobalSymbol;
use crate::error::{Error, Result};
use crate::ir::{DeclarationKind, IrArena, Meta, NodeKind, NodeRef, Statement};

/// Condition under which an edge is taken
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum EdgeCondition {
    Always,
    IsTrue,
    IsFalse,
    TrySucceeded,
    TryFailed,
}

/// A basic block in the control flow graph
#[derive(Debug, Clone)]
pub struct BasicBlock {
    /// Unique block ID
    pub id: usize,
    /// Statements, and branch or loop conditions, in execution order
    pub statements: Vec<NodeRef>,
    /// Successor block IDs with edge conditions
    pub successors: Vec<(usize, EdgeCondition)>,
    /// Predecessor block IDs
    pub predecessors: Vec<usize>,
    /// Contains a revert-equivalent statement
    pub reverts: bool,
}

impl BasicBlock {
    fn new(id: usize) -> Self {
        Self {
            id,
            statements: Vec::new(),
            successors: Vec::new(),
            predecessors: Vec::new(),
            reverts: false,
        }
    }
}

/// Result of the backward walk from the end block
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Reachability {
    /// Some non-reverting chain leads from start to end
    pub reaches_start: bool,
    /// Blocks reached from the end block
    pub visited: BTreeSet<usize>,
}

/// Control flow graph of one function or modifier body
#[derive(Debug, Clone)]
pub struct Cfg {
    /// Function or modifier the graph belongs to
    pub declaration: NodeRef,
    /// Basic blocks indexed by ID
    pub blocks: Vec<BasicBlock>,
    /// Entry block ID
    pub start: usize,
    /// Exit block ID
    pub end: usize,
}

impl Cfg {
    /// Build the graph of an implemented function or modifier.
    ///
    /// Returns `Ok(None)` for declarations without a body.
    pub fn build(arena: &IrArena, declaration: NodeRef) -> Result<Option<Cfg>> {
        let node = arena.node(declaration)?;
        let body = match node.as_declaration().map(|d| &d.kind) {
            Some(DeclarationKind::Function(f)) if f.implemented => f.body,
            Some(DeclarationKind::Modifier(m)) => m.body,
            Some(DeclarationKind::Function(_)) => None,
            _ => {
                return Err(Error::UnsupportedConstruct {
                    kind: format!("{:?}", node.kind()),
                })
            }
        };
        let Some(body) = body else {
            return Ok(None);
        };

        let mut builder = CfgBuilder {
            arena,
            blocks: Vec::new(),
            end: 0,
            loops: Vec::new(),
        };
        let start = builder.new_block();
        builder.end = builder.new_block();
        let first = builder.new_block();
        builder.add_edge(start, first, EdgeCondition::Always);
        let last = builder.visit(body, first)?;
        builder.add_edge(last, builder.end, EdgeCondition::Always);

        let CfgBuilder { blocks, end, .. } = builder;
        let mut cfg = Cfg {
            declaration,
            blocks,
            start,
            end,
        };
        cfg.prune_unreachable();
        Ok(Some(cfg))
    }

    /// Get block by ID
    pub fn block(&self, id: usize) -> Option<&BasicBlock> {
        self.blocks.get(id)
    }

    /// Block containing a statement
    pub fn block_of(&self, statement: NodeRef) -> Option<usize> {
        self.blocks
            .iter()
            .find(|b| b.statements.contains(&statement))
            .map(|b| b.id)
    }

    /// Walk backwards from the end block, not expanding reverting blocks.
    ///
    /// Blocks are visited in FIFO order; duplicates are suppressed on enqueue.
    pub fn backward_reachability(&self) -> Reachability {
        let mut visited = BTreeSet::new();
        let mut queue = VecDeque::new();
        let mut reaches_start = false;

        visited.insert(self.end);
        queue.push_back(self.end);

        while let Some(id) = queue.pop_front() {
            if id == self.start {
                reaches_start = true;
                continue;
            }
            for &pred in &self.blocks[id].predecessors {
                if visited.contains(&pred) || self.blocks[pred].reverts {
                    continue;
                }
                visited.insert(pred);
                queue.push_back(pred);
            }
        }

        Reachability {
            reaches_start,
            visited,
        }
    }

    /// Can the function return normally
    pub fn returns_normally(&self) -> bool {
        self.backward_reachability().reaches_start
    }

    /// Drop blocks without predecessors (other than start and end) and compact IDs
    fn prune_unreachable(&mut self) {
        let mut removed = vec![false; self.blocks.len()];
        loop {
            let dead: Vec<usize> = self
                .blocks
                .iter()
                .filter(|b| {
                    !removed[b.id] && b.id != self.start && b.id != self.end && b.predecessors.is_empty()
                })
                .map(|b| b.id)
                .collect();
            if dead.is_empty() {
                break;
            }
            for id in dead {
                removed[id] = true;
                let successors = std::mem::take(&mut self.blocks[id].successors);
                for (succ, _) in successors {
                    self.blocks[succ].predecessors.retain(|p| *p != id);
                }
            }
        }

        let mut remap = HashMap::new();
        for block in self.blocks.iter().filter(|b| !removed[b.id]) {
            remap.insert(block.id, remap.len());
        }
        let blocks = std::mem::take(&mut self.blocks);
        self.blocks = blocks
            .into_iter()
            .filter(|b| !removed[b.id])
            .map(|mut b| {
                b.id = remap[&b.id];
                b.successors = b.successors.iter().map(|(s, c)| (remap[s], *c)).collect();
                b.predecessors = b.predecessors.iter().map(|p| remap[p]).collect();
                b
            })
            .collect();
        self.start = remap[&self.start];
        self.end = remap[&self.end];
    }

    /// Render as Graphviz DOT; statement labels are taken from `source`
    pub fn to_dot(&self, arena: &IrArena, source: &[u8]) -> String {
        let mut dot = String::new();
        let _ = writeln!(dot, "digraph cfg {{");
        let _ = writeln!(dot, "    node [shape=box, fontname=\"monospace\"];");
        for block in &self.blocks {
            let label = if block.id == self.start {
                "START".to_string()
            } else if block.id == self.end {
                "END".to_string()
            } else {
                block
                    .statements
                    .iter()
                    .filter_map(|s| arena.get(*s))
                    .map(|s| {
                        let range = s.byte_location();
                        let text = source
                            .get(range.start..range.end)
                            .map(String::from_utf8_lossy)
                            .unwrap_or_default();
                        escape_dot(text.trim())
                    })
                    .collect::<Vec<_>>()
                    .join("\\l")
            };
            let _ = writeln!(dot, "    {} [label=\"{}\\l\"];", block.id, label);
        }
        for block in &self.blocks {
            for (succ, condition) in &block.successors {
                match condition {
                    EdgeCondition::Always => {
                        let _ = writeln!(dot, "    {} -> {};", block.id, succ);
                    }
                    other => {
                        let _ = writeln!(dot, "    {} -> {} [label=\"{:?}\"];", block.id, succ, other);
                    }
                }
            }
        }
        dot.push_str("}\n");
        dot
    }
}

/// Escape a string for a DOT label
fn escape_dot(s: &str) -> String {
    s.replace('\\', "\\\\")
        .replace('"', "\\\"")
        .replace('\n', "\\l")
        .replace('\r', "")
        .replace('<', "\\<")
        .replace('>', "\\>")
}

struct CfgBuilder<'a> {
    arena: &'a IrArena,
    blocks: Vec<BasicBlock>,
    end: usize,
    /// (continue target, break target) of the enclosing loops
    loops: Vec<(usize, usize)>,
}

impl CfgBuilder<'_> {
    fn new_block(&mut self) -> usize {
        let id = self.blocks.len();
        self.blocks.push(BasicBlock::new(id));
        id
    }

    fn add_edge(&mut self, from: usize, to: usize, condition: EdgeCondition) {
        if !self.blocks[from].successors.iter().any(|(s, _)| *s == to) {
            self.blocks[from].successors.push((to, condition));
        }
        if !self.blocks[to].predecessors.contains(&from) {
            self.blocks[to].predecessors.push(from);
        }
    }

    fn push(&mut self, block: usize, node: NodeRef) {
        self.blocks[block].statements.push(node);
    }

    /// Jump from `block` to `target`; the returned filler block is unreachable
    fn jump(&mut self, block: usize, target: usize) -> usize {
        self.add_edge(block, target, EdgeCondition::Always);
        self.new_block()
    }

    /// Add `statement` to the graph starting in `current`; returns the block
    /// where control continues
    fn visit(&mut self, statement: NodeRef, current: usize) -> Result<usize> {
        let arena = self.arena;
        let node = arena.node(statement)?;
        let Some(stmt) = node.as_statement() else {
            return Err(Error::UnsupportedConstruct {
                kind: format!("{:?}", node.kind()),
            });
        };

        match stmt {
            Statement::Block { statements } | Statement::UncheckedBlock { statements } => {
                let mut current = current;
                for s in statements {
                    current = self.visit(*s, current)?;
                }
                Ok(current)
            }
            Statement::ExpressionStatement { .. } => {
                self.push(current, statement);
                if is_revert_statement(arena, statement) {
                    self.blocks[current].reverts = true;
                    let end = self.end;
                    return Ok(self.jump(current, end));
                }
                Ok(current)
            }
            Statement::VariableDeclarationStatement { .. }
            | Statement::Emit { .. }
            | Statement::Placeholder
            | Statement::InlineAssembly => {
                self.push(current, statement);
                Ok(current)
            }
            Statement::Return { .. } => {
                self.push(current, statement);
                let end = self.end;
                Ok(self.jump(current, end))
            }
            Statement::Revert { .. } => {
                self.push(current, statement);
                self.blocks[current].reverts = true;
                let end = self.end;
                Ok(self.jump(current, end))
            }
            Statement::Break => {
                self.push(current, statement);
                let (_, target) = self.loops.last().copied().ok_or_else(|| Error::UnsupportedConstruct {
                    kind: "break outside of a loop".to_string(),
                })?;
                Ok(self.jump(current, target))
            }
            Statement::Continue => {
                self.push(current, statement);
                let (target, _) = self.loops.last().copied().ok_or_else(|| Error::UnsupportedConstruct {
                    kind: "continue outside of a loop".to_string(),
                })?;
                Ok(self.jump(current, target))
            }
            Statement::If {
                condition,
                true_body,
                false_body,
            } => {
                self.push(current, *condition);
                let next = self.new_block();

                let true_block = self.new_block();
                self.add_edge(current, true_block, EdgeCondition::IsTrue);
                let after_true = self.visit(*true_body, true_block)?;
                self.add_edge(after_true, next, EdgeCondition::Always);

                match false_body {
                    Some(false_body) => {
                        let false_block = self.new_block();
                        self.add_edge(current, false_block, EdgeCondition::IsFalse);
                        let after_false = self.visit(*false_body, false_block)?;
                        self.add_edge(after_false, next, EdgeCondition::Always);
                    }
                    None => self.add_edge(current, next, EdgeCondition::IsFalse),
                }
                Ok(next)
            }
            Statement::While { condition, body } => {
                let header = self.new_block();
                self.add_edge(current, header, EdgeCondition::Always);
                self.push(header, *condition);

                let body_block = self.new_block();
                let next = self.new_block();
                self.add_edge(header, body_block, EdgeCondition::IsTrue);
                self.add_edge(header, next, EdgeCondition::IsFalse);

                self.loops.push((header, next));
                let after = self.visit(*body, body_block);
                self.loops.pop();
                self.add_edge(after?, header, EdgeCondition::Always);
                Ok(next)
            }
            Statement::DoWhile { condition, body } => {
                let body_block = self.new_block();
                self.add_edge(current, body_block, EdgeCondition::Always);
                let condition_block = self.new_block();
                let next = self.new_block();

                self.loops.push((condition_block, next));
                let after = self.visit(*body, body_block);
                self.loops.pop();
                self.add_edge(after?, condition_block, EdgeCondition::Always);

                self.push(condition_block, *condition);
                self.add_edge(condition_block, body_block, EdgeCondition::IsTrue);
                self.add_edge(condition_block, next, EdgeCondition::IsFalse);
                Ok(next)
            }
            Statement::For {
                initialization,
                condition,
                loop_expression,
                body,
            } => {
                let current = match initialization {
                    Some(init) => self.visit(*init, current)?,
                    None => current,
                };
                let header = self.new_block();
                self.add_edge(current, header, EdgeCondition::Always);

                let body_block = self.new_block();
                let next = self.new_block();
                match condition {
                    Some(condition) => {
                        self.push(header, *condition);
                        self.add_edge(header, body_block, EdgeCondition::IsTrue);
                        self.add_edge(header, next, EdgeCondition::IsFalse);
                    }
                    None => self.add_edge(header, body_block, EdgeCondition::Always),
                }

                let loop_block = self.new_block();
                self.loops.push((loop_block, next));
                let after = self.visit(*body, body_block);
                self.loops.pop();
                self.add_edge(after?, loop_block, EdgeCondition::Always);

                let after_loop_expression = match loop_expression {
                    Some(expression) => self.visit(*expression, loop_block)?,
                    None => loop_block,
                };
                self.add_edge(after_loop_expression, header, EdgeCondition::Always);
                Ok(next)
            }
            Statement::Try {
                external_call,
                clauses,
            } => {
                self.push(current, *external_call);
                let next = self.new_block();
                for (i, clause) in clauses.iter().enumerate() {
                    let block = match arena.node(*clause)?.as_meta() {
                        Some(Meta::TryCatchClause { block, .. }) => *block,
                        _ => {
                            return Err(Error::UnsupportedConstruct {
                                kind: "try clause".to_string(),
                            })
                        }
                    };
                    let condition = if i == 0 {
                        EdgeCondition::TrySucceeded
                    } else {
                        EdgeCondition::TryFailed
                    };
                    let clause_block = self.new_block();
                    self.add_edge(current, clause_block, condition);
                    let after = self.visit(block, clause_block)?;
                    self.add_edge(after, next, EdgeCondition::Always);
                }
                Ok(next)
            }
        }
    }
}

/// Memoized graphs, keyed by function or modifier
#[derive(Debug, Default)]
pub struct CfgCache {
    cfgs: DashMap<NodeRef, Arc<Cfg>>,
}

impl CfgCache {
    pub fn new() -> Self {
        Self::default()
    }

    /// Graph of `declaration`, built on first use
    pub fn get_or_build(&self, arena: &IrArena, declaration: NodeRef) -> Result<Option<Arc<Cfg>>> {
        if let Some(cfg) = self.cfgs.get(&declaration) {
            return Ok(Some(Arc::clone(cfg.value())));
        }
        let Some(cfg) = Cfg::build(arena, declaration)? else {
            return Ok(None);
        };
        let cfg = Arc::new(cfg);
        self.cfgs.insert(declaration, Arc::clone(&cfg));
        Ok(Some(cfg))
    }

    pub fn len(&self) -> usize {
        self.cfgs.len()
    }

    pub fn is_empty(&self) -> bool {
        self.cfgs.is_empty()
    }

    pub fn clear(&self) {
        self.cfgs.clear();
    }
}

/// True for function and modifier definitions
pub fn has_cfg(arena: &IrArena, node: NodeRef) -> bool {
    matches!(
        arena.get(node).map(|n| n.kind()),
        Some(NodeKind::FunctionDefinition) | Some(NodeKind::ModifierDefinition)
    )
}

/// Revert statement, or an expression statement calling the `revert` global
pub fn is_revert_statement(arena: &IrArena, statement: NodeRef) -> bool {
    match arena.get(statement).and_then(|n| n.as_statement()) {
        Some(Statement::Revert { .. }) => true,
        Some(Statement::ExpressionStatement { expression }) => {
            arena.function_called_global(*expression) == Some(GlobalSymbol::Revert)
        }
        _ => false,
    }
}
