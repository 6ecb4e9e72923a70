//! Expressions

use super::{IrArena, NodeKind, NodeRef, ReferenceResolver};
use crate::ast::{AstNodeId, GlobalSymbol};
use crate::error::Result;

/// What an identifier or member access refers to
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ReferencedDeclaration {
    /// Nothing (e.g. a struct field access on a value without declaration id)
    None,
    /// A built-in symbol
    Global(GlobalSymbol),
    /// A declaration, by AST id in the node's unit
    Declaration(AstNodeId),
}

/// Common expression data
#[derive(Debug)]
pub struct Expression {
    /// Machine-readable type from the compiler
    pub type_identifier: Option<String>,
    /// Human-readable type from the compiler
    pub type_string: Option<String>,
    /// Kind-specific data
    pub kind: ExpressionKind,
}

/// Expression kinds
#[derive(Debug)]
pub enum ExpressionKind {
    Assignment {
        operator: String,
        left: NodeRef,
        right: NodeRef,
    },
    BinaryOperation {
        operator: String,
        left: NodeRef,
        right: NodeRef,
    },
    UnaryOperation {
        operator: String,
        prefix: bool,
        sub_expression: NodeRef,
    },
    Conditional {
        condition: NodeRef,
        true_expression: NodeRef,
        false_expression: NodeRef,
    },
    FunctionCall {
        expression: NodeRef,
        arguments: Vec<NodeRef>,
        names: Vec<String>,
        /// `functionCall`, `typeConversion` or `structConstructorCall`
        call_kind: String,
    },
    FunctionCallOptions {
        expression: NodeRef,
        names: Vec<String>,
        options: Vec<NodeRef>,
    },
    Identifier {
        name: String,
        referenced: ReferencedDeclaration,
    },
    MemberAccess {
        expression: NodeRef,
        member_name: String,
        referenced: ReferencedDeclaration,
    },
    IndexAccess {
        base: NodeRef,
        index: Option<NodeRef>,
    },
    IndexRangeAccess {
        base: NodeRef,
        start: Option<NodeRef>,
        end: Option<NodeRef>,
    },
    Literal {
        literal_kind: String,
        value: Option<String>,
    },
    Tuple {
        components: Vec<Option<NodeRef>>,
        is_inline_array: bool,
    },
    New {
        type_name: NodeRef,
    },
    ElementaryTypeName {
        type_name: NodeRef,
    },
}

impl Expression {
    pub(crate) fn node_kind(&self) -> NodeKind {
        match &self.kind {
            ExpressionKind::Assignment { .. } => NodeKind::Assignment,
            ExpressionKind::BinaryOperation { .. } => NodeKind::BinaryOperation,
            ExpressionKind::UnaryOperation { .. } => NodeKind::UnaryOperation,
            ExpressionKind::Conditional { .. } => NodeKind::Conditional,
            ExpressionKind::FunctionCall { .. } => NodeKind::FunctionCall,
            ExpressionKind::FunctionCallOptions { .. } => NodeKind::FunctionCallOptions,
            ExpressionKind::Identifier { .. } => NodeKind::Identifier,
            ExpressionKind::MemberAccess { .. } => NodeKind::MemberAccess,
            ExpressionKind::IndexAccess { .. } => NodeKind::IndexAccess,
            ExpressionKind::IndexRangeAccess { .. } => NodeKind::IndexRangeAccess,
            ExpressionKind::Literal { .. } => NodeKind::Literal,
            ExpressionKind::Tuple { .. } => NodeKind::TupleExpression,
            ExpressionKind::New { .. } => NodeKind::NewExpression,
            ExpressionKind::ElementaryTypeName { .. } => NodeKind::ElementaryTypeNameExpression,
        }
    }

    pub(crate) fn children(&self) -> Vec<NodeRef> {
        match &self.kind {
            ExpressionKind::Assignment { left, right, .. }
            | ExpressionKind::BinaryOperation { left, right, .. } => vec![*left, *right],
            ExpressionKind::UnaryOperation { sub_expression, .. } => vec![*sub_expression],
            ExpressionKind::Conditional {
                condition,
                true_expression,
                false_expression,
            } => vec![*condition, *true_expression, *false_expression],
            ExpressionKind::FunctionCall {
                expression,
                arguments,
                ..
            } => std::iter::once(*expression)
                .chain(arguments.iter().copied())
                .collect(),
            ExpressionKind::FunctionCallOptions {
                expression,
                options,
                ..
            } => std::iter::once(*expression)
                .chain(options.iter().copied())
                .collect(),
            ExpressionKind::Identifier { .. } | ExpressionKind::Literal { .. } => Vec::new(),
            ExpressionKind::MemberAccess { expression, .. } => vec![*expression],
            ExpressionKind::IndexAccess { base, index } => {
                std::iter::once(*base).chain(*index).collect()
            }
            ExpressionKind::IndexRangeAccess { base, start, end } => std::iter::once(*base)
                .chain(*start)
                .chain(*end)
                .collect(),
            ExpressionKind::Tuple { components, .. } => {
                components.iter().flatten().copied().collect()
            }
            ExpressionKind::New { type_name } | ExpressionKind::ElementaryTypeName { type_name } => {
                vec![*type_name]
            }
        }
    }

    /// Referenced declaration of an identifier or member access
    pub fn referenced(&self) -> ReferencedDeclaration {
        match &self.kind {
            ExpressionKind::Identifier { referenced, .. }
            | ExpressionKind::MemberAccess { referenced, .. } => *referenced,
            _ => ReferencedDeclaration::None,
        }
    }
}

impl IrArena {
    /// Declaration referenced by an identifier or member access
    pub fn referenced_declaration(
        &self,
        resolver: &ReferenceResolver,
        expression: NodeRef,
    ) -> Result<Option<NodeRef>> {
        let node = self.node(expression)?;
        match node.as_expression().map(Expression::referenced) {
            Some(ReferencedDeclaration::Declaration(id)) => {
                resolver.resolve_node(id, node.cu_hash).map(Some)
            }
            _ => Ok(None),
        }
    }

    /// Built-in symbol a call expression invokes, looking through call options
    pub fn function_called_global(&self, call: NodeRef) -> Option<GlobalSymbol> {
        let node = self.get(call)?.as_expression()?;
        let ExpressionKind::FunctionCall { expression, .. } = &node.kind else {
            return None;
        };
        let mut callee = *expression;
        loop {
            let expr = self.get(callee)?.as_expression()?;
            match &expr.kind {
                ExpressionKind::FunctionCallOptions { expression, .. } => callee = *expression,
                _ => {
                    return match expr.referenced() {
                        ReferencedDeclaration::Global(symbol) => Some(symbol),
                        _ => None,
                    }
                }
            }
        }
    }

    /// True if the expression designates (part of) a state variable
    pub fn is_ref_to_state_variable(&self, resolver: &ReferenceResolver, expression: NodeRef) -> bool {
        let Some(node) = self.get(expression) else {
            return false;
        };
        let Some(expr) = node.as_expression() else {
            return false;
        };
        match &expr.kind {
            ExpressionKind::Identifier { .. } => self.refers_to_state_variable(resolver, expression),
            ExpressionKind::MemberAccess { expression: base, .. } => {
                self.refers_to_state_variable(resolver, expression)
                    || self.is_ref_to_state_variable(resolver, *base)
            }
            ExpressionKind::IndexAccess { base, .. } | ExpressionKind::IndexRangeAccess { base, .. } => {
                self.is_ref_to_state_variable(resolver, *base)
            }
            ExpressionKind::Tuple { components, .. } => components
                .iter()
                .flatten()
                .any(|c| self.is_ref_to_state_variable(resolver, *c)),
            ExpressionKind::Conditional {
                true_expression,
                false_expression,
                ..
            } => {
                self.is_ref_to_state_variable(resolver, *true_expression)
                    || self.is_ref_to_state_variable(resolver, *false_expression)
            }
            _ => false,
        }
    }

    fn refers_to_state_variable(&self, resolver: &ReferenceResolver, expression: NodeRef) -> bool {
        match self.referenced_declaration(resolver, expression) {
            Ok(Some(decl)) => self
                .declaration(decl)
                .and_then(|d| d.as_variable())
                .map(|v| v.state_variable)
                .unwrap_or(false),
            Ok(None) => false,
            Err(err) => {
                tracing::debug!("state variable check skipped: {}", err);
                false
            }
        }
    }
}
