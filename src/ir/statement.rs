//! Statements

use super::{NodeKind, NodeRef};

/// Statement kinds
#[derive(Debug)]
pub enum Statement {
    Block {
        statements: Vec<NodeRef>,
    },
    UncheckedBlock {
        statements: Vec<NodeRef>,
    },
    ExpressionStatement {
        expression: NodeRef,
    },
    VariableDeclarationStatement {
        /// `None` for skipped tuple components, e.g. `(, uint b) = f()`
        declarations: Vec<Option<NodeRef>>,
        initial_value: Option<NodeRef>,
    },
    If {
        condition: NodeRef,
        true_body: NodeRef,
        false_body: Option<NodeRef>,
    },
    For {
        initialization: Option<NodeRef>,
        condition: Option<NodeRef>,
        loop_expression: Option<NodeRef>,
        body: NodeRef,
    },
    While {
        condition: NodeRef,
        body: NodeRef,
    },
    DoWhile {
        condition: NodeRef,
        body: NodeRef,
    },
    Break,
    Continue,
    Return {
        expression: Option<NodeRef>,
    },
    Revert {
        error_call: NodeRef,
    },
    Emit {
        event_call: NodeRef,
    },
    Placeholder,
    Try {
        external_call: NodeRef,
        /// `TryCatchClause` nodes; the first one is the success clause
        clauses: Vec<NodeRef>,
    },
    /// Yul body is not modelled
    InlineAssembly,
}

impl Statement {
    pub(crate) fn node_kind(&self) -> NodeKind {
        match self {
            Statement::Block { .. } => NodeKind::Block,
            Statement::UncheckedBlock { .. } => NodeKind::UncheckedBlock,
            Statement::ExpressionStatement { .. } => NodeKind::ExpressionStatement,
            Statement::VariableDeclarationStatement { .. } => {
                NodeKind::VariableDeclarationStatement
            }
            Statement::If { .. } => NodeKind::IfStatement,
            Statement::For { .. } => NodeKind::ForStatement,
            Statement::While { .. } => NodeKind::WhileStatement,
            Statement::DoWhile { .. } => NodeKind::DoWhileStatement,
            Statement::Break => NodeKind::Break,
            Statement::Continue => NodeKind::Continue,
            Statement::Return { .. } => NodeKind::Return,
            Statement::Revert { .. } => NodeKind::RevertStatement,
            Statement::Emit { .. } => NodeKind::EmitStatement,
            Statement::Placeholder => NodeKind::PlaceholderStatement,
            Statement::Try { .. } => NodeKind::TryStatement,
            Statement::InlineAssembly => NodeKind::InlineAssembly,
        }
    }

    pub(crate) fn children(&self) -> Vec<NodeRef> {
        match self {
            Statement::Block { statements } | Statement::UncheckedBlock { statements } => {
                statements.clone()
            }
            Statement::ExpressionStatement { expression } => vec![*expression],
            Statement::VariableDeclarationStatement {
                declarations,
                initial_value,
            } => declarations
                .iter()
                .flatten()
                .copied()
                .chain(*initial_value)
                .collect(),
            Statement::If {
                condition,
                true_body,
                false_body,
            } => {
                let mut children = vec![*condition, *true_body];
                children.extend(*false_body);
                children
            }
            Statement::For {
                initialization,
                condition,
                loop_expression,
                body,
            } => initialization
                .iter()
                .chain(condition)
                .chain(loop_expression)
                .copied()
                .chain(std::iter::once(*body))
                .collect(),
            Statement::While { condition, body } => vec![*condition, *body],
            // source order: body first
            Statement::DoWhile { condition, body } => vec![*body, *condition],
            Statement::Return { expression } => expression.iter().copied().collect(),
            Statement::Revert { error_call } => vec![*error_call],
            Statement::Emit { event_call } => vec![*event_call],
            Statement::Try {
                external_call,
                clauses,
            } => std::iter::once(*external_call)
                .chain(clauses.iter().copied())
                .collect(),
            Statement::Break
            | Statement::Continue
            | Statement::Placeholder
            | Statement::InlineAssembly => Vec::new(),
        }
    }
}
