//! Meta nodes: structural nodes that are neither declarations, statements,
//! expressions nor type names.

use lazy_static::lazy_static;
use regex::bytes::Regex;

use super::declaration::IDENTIFIER;
use super::{IrArena, NodeKind, NodeRef, ReferenceResolver};
use crate::ast::AstNodeId;
use crate::error::{Error, Result};
use crate::span::ByteRange;

lazy_static! {
    static ref IDENTIFIER_RE: Regex = Regex::new(IDENTIFIER).expect("identifier regex");
}

#[derive(Debug)]
pub enum Meta {
    SourceUnit(SourceUnit),
    ParameterList {
        parameters: Vec<NodeRef>,
    },
    IdentifierPath(IdentifierPath),
    InheritanceSpecifier {
        /// `IdentifierPath` or `UserDefinedTypeName`
        base_name: NodeRef,
        arguments: Vec<NodeRef>,
    },
    ModifierInvocation {
        modifier_name: NodeRef,
        arguments: Vec<NodeRef>,
    },
    OverrideSpecifier {
        overrides: Vec<NodeRef>,
    },
    TryCatchClause {
        /// Empty for the success clause and the catch-all clause
        error_name: String,
        parameters: Option<NodeRef>,
        block: NodeRef,
    },
}

/// Root of one file's tree
#[derive(Debug)]
pub struct SourceUnit {
    /// SPDX license identifier
    pub license: Option<String>,
    /// Top-level declarations in source order
    pub nodes: Vec<NodeRef>,
}

/// Resolution state of one identifier path part
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PathPartState {
    Unresolved,
    /// AST id of the referenced declaration, in the numbering of the path's unit
    Resolved(AstNodeId),
}

/// One dotted segment of an identifier path. Not an IR node.
#[derive(Debug, Clone)]
pub struct IdentifierPathPart {
    pub name: String,
    pub byte_location: ByteRange,
    /// Nesting index counted from the end of the path (the last part is 0)
    pub path_index: usize,
    pub state: PathPartState,
}

/// `A.B.C` style reference
#[derive(Debug)]
pub struct IdentifierPath {
    pub name: String,
    /// Declaration referenced by the whole path (the last part)
    pub referenced_declaration: AstNodeId,
    /// Parts, left to right
    pub parts: Vec<IdentifierPathPart>,
}

impl IdentifierPath {
    /// Part covering the given byte offset
    pub fn part_at(&self, byte_offset: usize) -> Option<&IdentifierPathPart> {
        let index = self
            .parts
            .partition_point(|p| p.byte_location.end <= byte_offset);
        self.parts
            .get(index)
            .filter(|p| p.byte_location.contains(byte_offset))
    }
}

/// Split the source of an identifier path into its parts
pub(crate) fn parse_path_parts(
    source: &[u8],
    node_start: usize,
) -> Vec<(String, ByteRange)> {
    IDENTIFIER_RE
        .find_iter(source)
        .map(|m| {
            (
                String::from_utf8_lossy(m.as_bytes()).into_owned(),
                ByteRange::new(node_start + m.start(), node_start + m.end()),
            )
        })
        .collect()
}

impl Meta {
    pub(crate) fn node_kind(&self) -> NodeKind {
        match self {
            Meta::SourceUnit(_) => NodeKind::SourceUnit,
            Meta::ParameterList { .. } => NodeKind::ParameterList,
            Meta::IdentifierPath(_) => NodeKind::IdentifierPath,
            Meta::InheritanceSpecifier { .. } => NodeKind::InheritanceSpecifier,
            Meta::ModifierInvocation { .. } => NodeKind::ModifierInvocation,
            Meta::OverrideSpecifier { .. } => NodeKind::OverrideSpecifier,
            Meta::TryCatchClause { .. } => NodeKind::TryCatchClause,
        }
    }

    pub(crate) fn children(&self) -> Vec<NodeRef> {
        match self {
            Meta::SourceUnit(unit) => unit.nodes.clone(),
            Meta::ParameterList { parameters } => parameters.clone(),
            Meta::IdentifierPath(_) => Vec::new(),
            Meta::InheritanceSpecifier {
                base_name,
                arguments,
            } => std::iter::once(*base_name)
                .chain(arguments.iter().copied())
                .collect(),
            Meta::ModifierInvocation {
                modifier_name,
                arguments,
            } => std::iter::once(*modifier_name)
                .chain(arguments.iter().copied())
                .collect(),
            Meta::OverrideSpecifier { overrides } => overrides.clone(),
            Meta::TryCatchClause {
                parameters, block, ..
            } => parameters.iter().copied().chain([*block]).collect(),
        }
    }
}

impl IrArena {
    /// Identifier path data of a node
    pub fn identifier_path(&self, node: NodeRef) -> Option<&IdentifierPath> {
        match self.get(node)?.as_meta()? {
            Meta::IdentifierPath(path) => Some(path),
            _ => None,
        }
    }

    /// Declaration referenced by one part of an identifier path.
    ///
    /// `Ok(None)` while the part is unresolved.
    pub fn path_part_declaration(
        &self,
        resolver: &ReferenceResolver,
        path: NodeRef,
        index: usize,
    ) -> Result<Option<NodeRef>> {
        let node = self.node(path)?;
        let part = self
            .identifier_path(path)
            .and_then(|p| p.parts.get(index))
            .ok_or_else(|| Error::invariant(format!("no path part {} on {}", index, path)))?;
        match part.state {
            PathPartState::Unresolved => Ok(None),
            PathPartState::Resolved(id) => resolver.resolve_node(id, node.cu_hash).map(Some),
        }
    }

    pub(crate) fn set_path_part_state(&mut self, path: NodeRef, index: usize, state: PathPartState) {
        if let Some(Meta::IdentifierPath(p)) = self.get_mut(path).and_then(|n| n.as_meta_mut()) {
            if let Some(part) = p.parts.get_mut(index) {
                part.state = state;
            }
        }
    }
}
