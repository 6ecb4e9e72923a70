//! Code lenses for declarations of one source unit.
//!
//! | Declaration | Lenses | Describes | Invalidated by |
//! |-------------|--------|-----------|----------------|
//! | implemented function / modifier | Control flow graph | name | whole declaration |
//! | contract | Inheritance graph, Linearized inheritance graph | name | name |

use std::path::Path;

use serde::Serialize;
use url::Url;

use super::{CacheTransaction, Relocatable};
use crate::error::{Error, Result};
use crate::ir::{DeclarationKind, IrArena, IrNode, NodeRef};
use crate::span::{ByteRange, LineIndex, LineSpan};

pub const CONTROL_FLOW_GRAPH: &str = "Tools-for-Solidity.generate.control_flow_graph";
pub const INHERITANCE_GRAPH: &str = "Tools-for-Solidity.generate.inheritance_graph";
pub const LINEARIZED_INHERITANCE_GRAPH: &str = "Tools-for-Solidity.generate.linearized_inheritance_graph";

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Command {
    pub title: String,
    pub command: String,
    pub arguments: Vec<String>,
}

/// An editor annotation attached to a line span
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct CodeLens {
    pub range: LineSpan,
    pub command: Command,
}

impl Relocatable for CodeLens {
    fn relocated(&self, _range: ByteRange, span: LineSpan) -> Self {
        Self {
            range: span,
            command: self.command.clone(),
        }
    }
}

/// File URL used as the first command argument
pub fn file_uri(path: &Path) -> Result<Url> {
    Url::from_file_path(path).map_err(|()| Error::UnknownFile(path.to_path_buf()))
}

/// Lenses of every declaration under `source_unit`, sorted by position.
/// Each lens is recorded in `transaction`.
pub fn generate(
    arena: &IrArena,
    source_unit: NodeRef,
    lines: &LineIndex,
    transaction: &mut CacheTransaction<CodeLens>,
) -> Result<Vec<CodeLens>> {
    let uri = file_uri(transaction.file())?.to_string();
    let mut lenses = Vec::new();

    let mut lens = |title: &str, command: &str, canonical_name: &str, describes: ByteRange, invalidates: ByteRange| {
        let code_lens = CodeLens {
            range: lines.span(describes),
            command: Command {
                title: title.to_string(),
                command: command.to_string(),
                arguments: vec![uri.clone(), canonical_name.to_string()],
            },
        };
        transaction.record(code_lens.clone(), describes, invalidates);
        lenses.push(code_lens);
    };

    for node in arena.iter(source_unit) {
        let Some(n) = arena.get(node) else {
            continue;
        };
        let Some(declaration) = n.as_declaration() else {
            continue;
        };
        let name = declaration.name_location;
        match &declaration.kind {
            DeclarationKind::Function(f) if f.implemented => lens(
                "Control flow graph",
                CONTROL_FLOW_GRAPH,
                &declaration.canonical_name,
                name,
                IrNode::byte_location(n),
            ),
            DeclarationKind::Modifier(m) if m.body.is_some() => lens(
                "Control flow graph",
                CONTROL_FLOW_GRAPH,
                &declaration.canonical_name,
                name,
                IrNode::byte_location(n),
            ),
            DeclarationKind::Contract(_) => {
                lens(
                    "Inheritance graph",
                    INHERITANCE_GRAPH,
                    &declaration.canonical_name,
                    name,
                    name,
                );
                lens(
                    "Linearized inheritance graph",
                    LINEARIZED_INHERITANCE_GRAPH,
                    &declaration.canonical_name,
                    name,
                    name,
                );
            }
            _ => {}
        }
    }

    lenses.sort_by_key(|l| l.range);
    Ok(lenses)
}
