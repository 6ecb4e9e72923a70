//! Type names

use super::{NodeKind, NodeRef};
use crate::ast::{AstNodeId, StateMutability, Visibility};

/// Common type name data
#[derive(Debug)]
pub struct TypeName {
    pub type_identifier: Option<String>,
    pub type_string: Option<String>,
    pub kind: TypeNameKind,
}

#[derive(Debug)]
pub enum TypeNameKind {
    /// `uint256`, `address payable`, ...
    Elementary {
        name: String,
        state_mutability: Option<StateMutability>,
    },
    /// Struct, enum, contract or user-defined value type
    UserDefined {
        name: String,
        /// `IdentifierPath` child (compilers >= 0.8)
        path_node: Option<NodeRef>,
        referenced_declaration: AstNodeId,
    },
    Mapping {
        key_type: NodeRef,
        value_type: NodeRef,
    },
    Array {
        base_type: NodeRef,
        length: Option<NodeRef>,
    },
    Function {
        visibility: Visibility,
        state_mutability: StateMutability,
        parameter_types: NodeRef,
        return_parameter_types: NodeRef,
    },
}

impl TypeName {
    pub(crate) fn node_kind(&self) -> NodeKind {
        match &self.kind {
            TypeNameKind::Elementary { .. } => NodeKind::ElementaryTypeName,
            TypeNameKind::UserDefined { .. } => NodeKind::UserDefinedTypeName,
            TypeNameKind::Mapping { .. } => NodeKind::Mapping,
            TypeNameKind::Array { .. } => NodeKind::ArrayTypeName,
            TypeNameKind::Function { .. } => NodeKind::FunctionTypeName,
        }
    }

    pub(crate) fn children(&self) -> Vec<NodeRef> {
        match &self.kind {
            TypeNameKind::Elementary { .. } => Vec::new(),
            TypeNameKind::UserDefined { path_node, .. } => path_node.iter().copied().collect(),
            TypeNameKind::Mapping {
                key_type,
                value_type,
            } => vec![*key_type, *value_type],
            TypeNameKind::Array { base_type, length } => {
                std::iter::once(*base_type).chain(*length).collect()
            }
            TypeNameKind::Function {
                parameter_types,
                return_parameter_types,
                ..
            } => vec![*parameter_types, *return_parameter_types],
        }
    }
}
