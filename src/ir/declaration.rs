//! Declarations: named entities that other nodes refer to

use std::sync::OnceLock;

use lazy_static::lazy_static;
use regex::bytes::Regex;

use super::{IrArena, IrNode, NodeKind, NodeRef, Reference};
use crate::ast::{
    AstNodeId, ContractKind, FunctionKind, Mutability, StateMutability, StorageLocation,
    Visibility,
};
use crate::error::{Error, Result};
use crate::span::ByteRange;

/// Identifier grammar of the language
pub const IDENTIFIER: &str = r"[a-zA-Z$_][a-zA-Z0-9$_]*";

// whitespace and comments allowed between a keyword and the declared name
const SEPARATOR: &str = r"(?:\s|/\*(?s:.*?)\*/|//[^\n]*)";

lazy_static! {
    static ref CONTRACT_RE: Regex = keyword_regex(r"(?:abstract(?:SEP)+)?(?:contract|interface|library)");
    static ref FUNCTION_RE: Regex = keyword_regex("function");
    static ref MODIFIER_RE: Regex = keyword_regex("modifier");
    static ref STRUCT_RE: Regex = keyword_regex("struct");
    static ref ENUM_RE: Regex = keyword_regex("enum");
    static ref EVENT_RE: Regex = keyword_regex("event");
    static ref ERROR_RE: Regex = keyword_regex("error");
    static ref SPECIAL_FUNCTION_RE: Regex =
        Regex::new(&format!(r"^{}*(?P<name>constructor|receive|fallback)\b", SEPARATOR))
            .expect("special function regex");
}

fn keyword_regex(keyword: &str) -> Regex {
    let keyword = keyword.replace("SEP", SEPARATOR);
    let pattern = format!(
        r"^{sep}*{keyword}{sep}+(?P<name>{ident})",
        sep = SEPARATOR,
        keyword = keyword,
        ident = IDENTIFIER
    );
    Regex::new(&pattern).expect("declaration keyword regex")
}

/// Locate the declared name in the node's own source bytes.
///
/// `source` starts at `node_start`; the returned range is absolute.
pub(crate) fn parse_name_location(
    kind: NodeKind,
    function_kind: Option<FunctionKind>,
    source: &[u8],
    node_start: usize,
) -> Option<ByteRange> {
    let re: &Regex = match (kind, function_kind) {
        (NodeKind::ContractDefinition, _) => &CONTRACT_RE,
        (NodeKind::FunctionDefinition, Some(FunctionKind::Function))
        | (NodeKind::FunctionDefinition, Some(FunctionKind::FreeFunction)) => &FUNCTION_RE,
        (NodeKind::FunctionDefinition, _) => &SPECIAL_FUNCTION_RE,
        (NodeKind::ModifierDefinition, _) => &MODIFIER_RE,
        (NodeKind::StructDefinition, _) => &STRUCT_RE,
        (NodeKind::EnumDefinition, _) => &ENUM_RE,
        (NodeKind::EventDefinition, _) => &EVENT_RE,
        (NodeKind::ErrorDefinition, _) => &ERROR_RE,
        _ => return None,
    };
    let name = re.captures(source)?.name("name")?;
    Some(ByteRange::new(node_start + name.start(), node_start + name.end()))
}

/// Locate a variable name that the compiler did not give a location for.
///
/// The first whole-word occurrence after `search_from` (relative to the node start).
pub(crate) fn parse_variable_name_location(
    name: &str,
    source: &[u8],
    node_start: usize,
    search_from: usize,
) -> Option<ByteRange> {
    if name.is_empty() {
        return None;
    }
    let re = Regex::new(&format!(r"(?:^|[^a-zA-Z0-9$_])(?P<name>{})(?:[^a-zA-Z0-9$_]|$)", regex::escape(name))).ok()?;
    let tail = source.get(search_from..)?;
    let m = re.captures(tail)?.name("name")?;
    Some(ByteRange::new(
        node_start + search_from + m.start(),
        node_start + search_from + m.end(),
    ))
}

/// Common declaration data
#[derive(Debug)]
pub struct Declaration {
    /// Name as written in source (empty for unnamed parameters)
    pub name: String,
    /// Fully qualified name
    pub canonical_name: String,
    /// Visibility
    pub visibility: Visibility,
    /// Byte range of the name
    pub name_location: ByteRange,
    /// Nodes referring to this declaration (multiset)
    pub(crate) references: Vec<Reference>,
    pub(crate) declaration_string: OnceLock<String>,
    /// Kind-specific data
    pub kind: DeclarationKind,
}

/// Kind-specific declaration data
#[derive(Debug)]
pub enum DeclarationKind {
    Contract(ContractDefinition),
    Function(FunctionDefinition),
    Modifier(ModifierDefinition),
    Struct(StructDefinition),
    Enum(EnumDefinition),
    EnumValue,
    Event(EventDefinition),
    Error(ErrorDefinition),
    Variable(VariableDeclaration),
}

#[derive(Debug)]
pub struct ContractDefinition {
    pub kind: ContractKind,
    pub is_abstract: bool,
    /// `InheritanceSpecifier` nodes
    pub base_contracts: Vec<NodeRef>,
    /// Members in source order
    pub nodes: Vec<NodeRef>,
    /// C3 linearization as AST ids (most derived first)
    pub linearized_base_contracts: Vec<AstNodeId>,
    /// Contracts that list this contract as a direct base
    pub(crate) child_contracts: Vec<NodeRef>,
}

#[derive(Debug)]
pub struct FunctionDefinition {
    pub kind: FunctionKind,
    pub state_mutability: StateMutability,
    pub implemented: bool,
    pub is_virtual: bool,
    pub parameters: NodeRef,
    pub return_parameters: NodeRef,
    pub modifiers: Vec<NodeRef>,
    pub overrides: Option<NodeRef>,
    pub body: Option<NodeRef>,
    /// Directly overridden functions as AST ids
    pub base_functions: Vec<AstNodeId>,
}

#[derive(Debug)]
pub struct ModifierDefinition {
    pub is_virtual: bool,
    pub parameters: NodeRef,
    pub overrides: Option<NodeRef>,
    pub body: Option<NodeRef>,
    pub base_modifiers: Vec<AstNodeId>,
}

#[derive(Debug)]
pub struct StructDefinition {
    pub members: Vec<NodeRef>,
}

#[derive(Debug)]
pub struct EnumDefinition {
    pub values: Vec<NodeRef>,
}

#[derive(Debug)]
pub struct EventDefinition {
    pub anonymous: bool,
    pub parameters: NodeRef,
}

#[derive(Debug)]
pub struct ErrorDefinition {
    pub parameters: NodeRef,
}

#[derive(Debug)]
pub struct VariableDeclaration {
    pub type_name: Option<NodeRef>,
    /// Human-readable type from the compiler
    pub type_string: Option<String>,
    pub state_variable: bool,
    pub mutability: Mutability,
    pub storage_location: StorageLocation,
    pub indexed: bool,
    /// Initial value
    pub value: Option<NodeRef>,
}

impl Declaration {
    pub(crate) fn new(
        name: String,
        canonical_name: String,
        visibility: Visibility,
        name_location: ByteRange,
        kind: DeclarationKind,
    ) -> Self {
        Self {
            name,
            canonical_name,
            visibility,
            name_location,
            references: Vec::new(),
            declaration_string: OnceLock::new(),
            kind,
        }
    }

    /// Nodes currently referring to this declaration
    pub fn references(&self) -> &[Reference] {
        &self.references
    }

    /// Contract data, if this is a contract
    pub fn as_contract(&self) -> Option<&ContractDefinition> {
        match &self.kind {
            DeclarationKind::Contract(c) => Some(c),
            _ => None,
        }
    }

    /// Function data, if this is a function
    pub fn as_function(&self) -> Option<&FunctionDefinition> {
        match &self.kind {
            DeclarationKind::Function(f) => Some(f),
            _ => None,
        }
    }

    /// Variable data, if this is a variable
    pub fn as_variable(&self) -> Option<&VariableDeclaration> {
        match &self.kind {
            DeclarationKind::Variable(v) => Some(v),
            _ => None,
        }
    }

    pub(crate) fn node_kind(&self) -> NodeKind {
        match &self.kind {
            DeclarationKind::Contract(_) => NodeKind::ContractDefinition,
            DeclarationKind::Function(_) => NodeKind::FunctionDefinition,
            DeclarationKind::Modifier(_) => NodeKind::ModifierDefinition,
            DeclarationKind::Struct(_) => NodeKind::StructDefinition,
            DeclarationKind::Enum(_) => NodeKind::EnumDefinition,
            DeclarationKind::EnumValue => NodeKind::EnumValue,
            DeclarationKind::Event(_) => NodeKind::EventDefinition,
            DeclarationKind::Error(_) => NodeKind::ErrorDefinition,
            DeclarationKind::Variable(_) => NodeKind::VariableDeclaration,
        }
    }

    pub(crate) fn children(&self) -> Vec<NodeRef> {
        match &self.kind {
            DeclarationKind::Contract(c) => {
                c.base_contracts.iter().chain(&c.nodes).copied().collect()
            }
            DeclarationKind::Function(f) => {
                let mut children = vec![f.parameters, f.return_parameters];
                children.extend(&f.modifiers);
                children.extend(f.overrides);
                children.extend(f.body);
                children
            }
            DeclarationKind::Modifier(m) => {
                let mut children = vec![m.parameters];
                children.extend(m.overrides);
                children.extend(m.body);
                children
            }
            DeclarationKind::Struct(s) => s.members.clone(),
            DeclarationKind::Enum(e) => e.values.clone(),
            DeclarationKind::EnumValue => Vec::new(),
            DeclarationKind::Event(e) => vec![e.parameters],
            DeclarationKind::Error(e) => vec![e.parameters],
            DeclarationKind::Variable(v) => v.type_name.into_iter().chain(v.value).collect(),
        }
    }

    /// Human-readable signature, computed once per node
    pub fn declaration_string(&self, arena: &IrArena) -> &str {
        self.declaration_string.get_or_init(|| self.render(arena))
    }

    fn render(&self, arena: &IrArena) -> String {
        match &self.kind {
            DeclarationKind::Contract(c) => {
                let mut out = String::new();
                if c.is_abstract {
                    out.push_str("abstract ");
                }
                out.push_str(&format!("{} {}", c.kind, self.name));
                let bases: Vec<String> = c
                    .base_contracts
                    .iter()
                    .filter_map(|b| arena.get(*b))
                    .filter_map(|b| match b.as_meta() {
                        Some(super::Meta::InheritanceSpecifier { base_name, .. }) => {
                            base_name_text(arena, *base_name)
                        }
                        _ => None,
                    })
                    .collect();
                if !bases.is_empty() {
                    out.push_str(" is ");
                    out.push_str(&bases.join(", "));
                }
                out
            }
            DeclarationKind::Function(f) => {
                let head = match f.kind {
                    FunctionKind::Function | FunctionKind::FreeFunction => {
                        format!("function {}", self.name)
                    }
                    FunctionKind::Constructor => "constructor".to_string(),
                    FunctionKind::Receive => "receive".to_string(),
                    FunctionKind::Fallback => "fallback".to_string(),
                };
                let mut out = format!("{}({})", head, parameter_strings(arena, f.parameters));
                if f.kind != FunctionKind::FreeFunction && f.kind != FunctionKind::Constructor {
                    out.push_str(&format!(" {}", self.visibility));
                }
                if f.state_mutability != StateMutability::Nonpayable {
                    out.push_str(&format!(" {}", f.state_mutability));
                }
                if f.is_virtual {
                    out.push_str(" virtual");
                }
                let returns = parameter_strings(arena, f.return_parameters);
                if !returns.is_empty() {
                    out.push_str(&format!(" returns ({})", returns));
                }
                out
            }
            DeclarationKind::Modifier(m) => {
                let mut out = format!("modifier {}({})", self.name, parameter_strings(arena, m.parameters));
                if m.is_virtual {
                    out.push_str(" virtual");
                }
                out
            }
            DeclarationKind::Struct(s) => {
                let members: Vec<String> = s
                    .members
                    .iter()
                    .filter_map(|m| arena.declaration(*m))
                    .map(|m| format!("    {}", m.declaration_string(arena)))
                    .collect();
                format!("struct {} {{\n{};\n}}", self.name, members.join(";\n"))
            }
            DeclarationKind::Enum(e) => {
                let values: Vec<String> = e
                    .values
                    .iter()
                    .filter_map(|v| arena.declaration(*v))
                    .map(|v| format!("    {}", v.name))
                    .collect();
                format!("enum {} {{\n{}\n}}", self.name, values.join(",\n"))
            }
            DeclarationKind::EnumValue => self.canonical_name.clone(),
            DeclarationKind::Event(e) => {
                let mut out = format!("event {}({})", self.name, parameter_strings(arena, e.parameters));
                if e.anonymous {
                    out.push_str(" anonymous");
                }
                out
            }
            DeclarationKind::Error(e) => {
                format!("error {}({})", self.name, parameter_strings(arena, e.parameters))
            }
            DeclarationKind::Variable(v) => {
                let mut parts = vec![v.type_string.clone().unwrap_or_else(|| "<unknown>".into())];
                if v.indexed {
                    parts.push("indexed".into());
                }
                if v.storage_location != StorageLocation::Default && !v.state_variable {
                    parts.push(v.storage_location.to_string());
                }
                if v.state_variable {
                    parts.push(self.visibility.to_string());
                    match v.mutability {
                        Mutability::Constant => parts.push("constant".into()),
                        Mutability::Immutable => parts.push("immutable".into()),
                        Mutability::Mutable => {}
                    }
                }
                if !self.name.is_empty() {
                    parts.push(self.name.clone());
                }
                parts.join(" ")
            }
        }
    }
}

fn parameter_strings(arena: &IrArena, list: NodeRef) -> String {
    let Some(super::Meta::ParameterList { parameters }) = arena.get(list).and_then(IrNode::as_meta) else {
        return String::new();
    };
    parameters
        .iter()
        .filter_map(|p| arena.declaration(*p))
        .map(|p| p.declaration_string(arena).to_string())
        .collect::<Vec<_>>()
        .join(", ")
}

fn base_name_text(arena: &IrArena, base_name: NodeRef) -> Option<String> {
    let node = arena.get(base_name)?;
    match (node.as_meta(), node.as_type_name()) {
        (Some(super::Meta::IdentifierPath(path)), _) => Some(path.name.clone()),
        (_, Some(type_name)) => match &type_name.kind {
            super::TypeNameKind::UserDefined { name, .. } => Some(name.clone()),
            _ => None,
        },
        _ => None,
    }
}

impl IrArena {
    /// Functions and modifiers overridden by `function`, resolved in its unit
    pub fn base_functions(
        &self,
        resolver: &super::ReferenceResolver,
        function: NodeRef,
    ) -> Result<Vec<NodeRef>> {
        let node = self.node(function)?;
        let ids = match node.as_declaration().map(|d| &d.kind) {
            Some(DeclarationKind::Function(f)) => &f.base_functions,
            Some(DeclarationKind::Modifier(m)) => &m.base_modifiers,
            _ => return Ok(Vec::new()),
        };
        ids.iter()
            .map(|id| resolver.resolve_node(*id, node.cu_hash))
            .collect()
    }

    /// Contracts that list `contract` as a direct base
    pub fn child_contracts(&self, contract: NodeRef) -> &[NodeRef] {
        self.declaration(contract)
            .and_then(Declaration::as_contract)
            .map(|c| c.child_contracts.as_slice())
            .unwrap_or(&[])
    }

    /// Function definitions declared directly in `contract`
    pub fn contract_functions(&self, contract: NodeRef) -> Vec<NodeRef> {
        self.declaration(contract)
            .and_then(Declaration::as_contract)
            .map(|c| {
                c.nodes
                    .iter()
                    .copied()
                    .filter(|n| {
                        self.get(*n).map(IrNode::kind) == Some(NodeKind::FunctionDefinition)
                    })
                    .collect()
            })
            .unwrap_or_default()
    }

    pub(crate) fn add_child_contract(&mut self, base: NodeRef, child: NodeRef) {
        if let Some(DeclarationKind::Contract(c)) =
            self.get_mut(base).and_then(IrNode::as_declaration_mut).map(|d| &mut d.kind)
        {
            c.child_contracts.push(child);
        }
    }

    pub(crate) fn remove_child_contract(&mut self, base: NodeRef, child: NodeRef) {
        if let Some(DeclarationKind::Contract(c)) =
            self.get_mut(base).and_then(IrNode::as_declaration_mut).map(|d| &mut d.kind)
        {
            if let Some(index) = c.child_contracts.iter().position(|x| *x == child) {
                c.child_contracts.remove(index);
            }
        }
    }
}

pub(crate) fn missing_name(file: &std::path::Path, offset: usize, kind: NodeKind) -> Error {
    Error::malformed(file, offset, format!("no declared name found for {:?}", kind))
}
