//! # IR Node Tree
//!
//! Typed, source-position-aware nodes built from the raw compiler AST.
//!
//! Nodes live in an [`IrArena`] and are addressed by [`NodeRef`]. A node owns
//! its children (destroying a node removes its whole subtree), knows its
//! parent and its source unit, and carries the byte range it spans.
//! Cross-references between nodes (identifier uses, base contracts, overridden
//! functions) are stored as AST ids and resolved through the
//! [`ReferenceResolver`], so they never form ownership cycles.
//!
//! ```text
//! SourceUnit
//! └── ContractDefinition ─ Declaration ─ back-references (non-owning)
//!     ├── FunctionDefinition
//!     │   ├── ParameterList
//!     │   └── Block ─ Statement ─ Expression ...
//!     └── VariableDeclaration
//! ```

pub mod builder;
pub mod declaration;
pub mod expression;
pub mod meta;
pub mod resolver;
pub mod statement;
pub mod type_name;

pub use builder::IrBuilder;
pub use declaration::{
    ContractDefinition, Declaration, DeclarationKind, EnumDefinition, ErrorDefinition,
    EventDefinition, FunctionDefinition, ModifierDefinition, StructDefinition,
    VariableDeclaration,
};
pub use expression::{Expression, ExpressionKind, ReferencedDeclaration};
pub use meta::{IdentifierPath, IdentifierPathPart, Meta, PathPartState, SourceUnit};
pub use resolver::{CallbackParams, NodePathOrder, ReferenceResolver};
pub use statement::Statement;
pub use type_name::{TypeName, TypeNameKind};

use std::collections::HashMap;
use std::fmt;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use serde::Serialize;

use crate::ast::{AstNodeId, CuHash};
use crate::error::{Error, Result};
use crate::span::ByteRange;

/// Handle of a live IR node. Handles are never reused within an arena.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize)]
pub struct NodeRef(u64);

impl fmt::Display for NodeRef {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "#{}", self.0)
    }
}

/// A record, on a declaration, of something that refers to it
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum Reference {
    /// An IR node (identifier, member access, user-defined type name, ...)
    Node(NodeRef),
    /// One dotted segment of an identifier path
    PathPart {
        /// The `IdentifierPath` node holding the part
        path: NodeRef,
        /// Position of the part within the path (left to right)
        index: usize,
    },
}

impl Reference {
    /// The IR node that holds the reference
    pub fn node(&self) -> NodeRef {
        match self {
            Reference::Node(node) => *node,
            Reference::PathPart { path, .. } => *path,
        }
    }
}

/// Node category and kind-specific data
#[derive(Debug)]
pub enum IrKind {
    Declaration(Declaration),
    Statement(Statement),
    Expression(Expression),
    TypeName(TypeName),
    Meta(Meta),
}

/// Flat node kind tag, one per concrete IR node type
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum NodeKind {
    // declarations
    ContractDefinition,
    FunctionDefinition,
    ModifierDefinition,
    StructDefinition,
    EnumDefinition,
    EnumValue,
    EventDefinition,
    ErrorDefinition,
    VariableDeclaration,
    // statements
    Block,
    UncheckedBlock,
    ExpressionStatement,
    VariableDeclarationStatement,
    IfStatement,
    ForStatement,
    WhileStatement,
    DoWhileStatement,
    Break,
    Continue,
    Return,
    RevertStatement,
    EmitStatement,
    PlaceholderStatement,
    TryStatement,
    InlineAssembly,
    // expressions
    Assignment,
    BinaryOperation,
    UnaryOperation,
    Conditional,
    FunctionCall,
    FunctionCallOptions,
    Identifier,
    MemberAccess,
    IndexAccess,
    IndexRangeAccess,
    Literal,
    TupleExpression,
    NewExpression,
    ElementaryTypeNameExpression,
    // type names
    ElementaryTypeName,
    UserDefinedTypeName,
    Mapping,
    ArrayTypeName,
    FunctionTypeName,
    // meta
    SourceUnit,
    ParameterList,
    IdentifierPath,
    InheritanceSpecifier,
    ModifierInvocation,
    OverrideSpecifier,
    TryCatchClause,
}

/// One IR node
#[derive(Debug)]
pub struct IrNode {
    pub(crate) ast_id: AstNodeId,
    pub(crate) cu_hash: CuHash,
    pub(crate) file: Arc<Path>,
    pub(crate) byte_location: ByteRange,
    pub(crate) parent: Option<NodeRef>,
    pub(crate) source_unit: NodeRef,
    pub(crate) kind: IrKind,
}

impl IrNode {
    /// AST id in the numbering of the unit that built this node
    pub fn ast_id(&self) -> AstNodeId {
        self.ast_id
    }

    /// Compilation unit that built this node
    pub fn cu_hash(&self) -> CuHash {
        self.cu_hash
    }

    /// File containing the node
    pub fn file(&self) -> &Path {
        &self.file
    }

    /// Byte range `[start, end)` of the node in its file
    pub fn byte_location(&self) -> ByteRange {
        self.byte_location
    }

    /// Parent node; `None` only for source units
    pub fn parent(&self) -> Option<NodeRef> {
        self.parent
    }

    /// Root of the node's tree
    pub fn source_unit(&self) -> NodeRef {
        self.source_unit
    }

    /// Category and kind-specific data
    pub fn ir_kind(&self) -> &IrKind {
        &self.kind
    }

    /// Flat kind tag
    pub fn kind(&self) -> NodeKind {
        match &self.kind {
            IrKind::Declaration(d) => d.node_kind(),
            IrKind::Statement(s) => s.node_kind(),
            IrKind::Expression(e) => e.node_kind(),
            IrKind::TypeName(t) => t.node_kind(),
            IrKind::Meta(m) => m.node_kind(),
        }
    }

    /// Direct children in source order
    pub fn children(&self) -> Vec<NodeRef> {
        match &self.kind {
            IrKind::Declaration(d) => d.children(),
            IrKind::Statement(s) => s.children(),
            IrKind::Expression(e) => e.children(),
            IrKind::TypeName(t) => t.children(),
            IrKind::Meta(m) => m.children(),
        }
    }

    /// Declaration data, if this node is a declaration
    pub fn as_declaration(&self) -> Option<&Declaration> {
        match &self.kind {
            IrKind::Declaration(d) => Some(d),
            _ => None,
        }
    }

    /// Statement data, if this node is a statement
    pub fn as_statement(&self) -> Option<&Statement> {
        match &self.kind {
            IrKind::Statement(s) => Some(s),
            _ => None,
        }
    }

    /// Expression data, if this node is an expression
    pub fn as_expression(&self) -> Option<&Expression> {
        match &self.kind {
            IrKind::Expression(e) => Some(e),
            _ => None,
        }
    }

    /// Type name data, if this node is a type name
    pub fn as_type_name(&self) -> Option<&TypeName> {
        match &self.kind {
            IrKind::TypeName(t) => Some(t),
            _ => None,
        }
    }

    /// Meta node data, if this node is a meta node
    pub fn as_meta(&self) -> Option<&Meta> {
        match &self.kind {
            IrKind::Meta(m) => Some(m),
            _ => None,
        }
    }

    pub(crate) fn as_declaration_mut(&mut self) -> Option<&mut Declaration> {
        match &mut self.kind {
            IrKind::Declaration(d) => Some(d),
            _ => None,
        }
    }

    pub(crate) fn as_meta_mut(&mut self) -> Option<&mut Meta> {
        match &mut self.kind {
            IrKind::Meta(m) => Some(m),
            _ => None,
        }
    }
}

/// Storage for every live IR node of a compilation
#[derive(Debug, Default)]
pub struct IrArena {
    nodes: HashMap<NodeRef, IrNode>,
    source_units: HashMap<PathBuf, NodeRef>,
    next: u64,
}

impl IrArena {
    /// Creates an empty arena
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of live nodes
    pub fn len(&self) -> usize {
        self.nodes.len()
    }

    /// True if no node is live
    pub fn is_empty(&self) -> bool {
        self.nodes.is_empty()
    }

    /// Node by handle
    pub fn get(&self, node: NodeRef) -> Option<&IrNode> {
        self.nodes.get(&node)
    }

    /// Node by handle, failing if it was destroyed
    pub fn node(&self, node: NodeRef) -> Result<&IrNode> {
        self.nodes
            .get(&node)
            .ok_or_else(|| Error::invariant(format!("IR node {} is not live", node)))
    }

    /// Declaration data of a node
    pub fn declaration(&self, node: NodeRef) -> Option<&Declaration> {
        self.get(node).and_then(IrNode::as_declaration)
    }

    /// Source unit of a file
    pub fn source_unit(&self, file: &Path) -> Option<NodeRef> {
        self.source_units.get(file).copied()
    }

    /// All live source units, sorted by path
    pub fn source_units(&self) -> Vec<(PathBuf, NodeRef)> {
        let mut units: Vec<_> = self
            .source_units
            .iter()
            .map(|(path, node)| (path.clone(), *node))
            .collect();
        units.sort();
        units
    }

    /// Depth-first, pre-order traversal starting with `root` itself
    pub fn iter(&self, root: NodeRef) -> PreorderIter<'_> {
        PreorderIter {
            arena: self,
            stack: vec![root],
        }
    }

    /// Strict ancestors of a node, nearest first
    pub fn ancestors(&self, node: NodeRef) -> impl Iterator<Item = NodeRef> + '_ {
        let mut current = self.get(node).and_then(IrNode::parent);
        std::iter::from_fn(move || {
            let node = current?;
            current = self.get(node).and_then(IrNode::parent);
            Some(node)
        })
    }

    /// Nearest function or modifier definition containing the node (or the node itself)
    pub fn enclosing_function(&self, node: NodeRef) -> Option<NodeRef> {
        std::iter::once(node)
            .chain(self.ancestors(node))
            .find(|n| {
                matches!(
                    self.get(*n).map(IrNode::kind),
                    Some(NodeKind::FunctionDefinition) | Some(NodeKind::ModifierDefinition)
                )
            })
    }

    pub(crate) fn reserve(&mut self) -> NodeRef {
        let node = NodeRef(self.next);
        self.next += 1;
        node
    }

    pub(crate) fn insert(&mut self, handle: NodeRef, node: IrNode) {
        if matches!(node.kind, IrKind::Meta(Meta::SourceUnit(_))) {
            self.source_units.insert(node.file.to_path_buf(), handle);
        }
        self.nodes.insert(handle, node);
    }

    pub(crate) fn get_mut(&mut self, node: NodeRef) -> Option<&mut IrNode> {
        self.nodes.get_mut(&node)
    }

    /// Records `reference` on the declaration `declaration`
    pub(crate) fn register_reference(&mut self, declaration: NodeRef, reference: Reference) {
        if let Some(decl) = self.get_mut(declaration).and_then(IrNode::as_declaration_mut) {
            decl.references.push(reference);
        }
    }

    /// Removes one occurrence of `reference`; false if the declaration is gone
    pub(crate) fn unregister_reference(&mut self, declaration: NodeRef, reference: Reference) -> bool {
        let Some(decl) = self.get_mut(declaration).and_then(IrNode::as_declaration_mut) else {
            return false;
        };
        match decl.references.iter().position(|r| *r == reference) {
            Some(index) => {
                decl.references.swap_remove(index);
                true
            }
            None => false,
        }
    }

    /// Removes every node of a file, including nodes of a partially built tree.
    /// Returns the number of removed nodes.
    pub(crate) fn remove_file(&mut self, file: &Path) -> usize {
        let before = self.nodes.len();
        self.nodes.retain(|_, node| node.file.as_ref() != file);
        self.source_units.remove(file);
        before - self.nodes.len()
    }
}

/// Pre-order iterator over a subtree. Create a new one to restart.
pub struct PreorderIter<'a> {
    arena: &'a IrArena,
    stack: Vec<NodeRef>,
}

impl Iterator for PreorderIter<'_> {
    type Item = NodeRef;

    fn next(&mut self) -> Option<NodeRef> {
        loop {
            let handle = self.stack.pop()?;
            let Some(node) = self.arena.get(handle) else {
                continue;
            };
            self.stack.extend(node.children().into_iter().rev());
            return Some(handle);
        }
    }
}
