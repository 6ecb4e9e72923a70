//! # IR Builder
//!
//! Converts one raw source unit into IR nodes.
//!
//! Every node is registered with the [`ReferenceResolver`] as it is inserted.
//! Links that need other nodes to exist (declaration back-references, child
//! contracts, identifier path parts) are queued as post-process callbacks
//! together with the destroy callbacks that undo them.

use std::path::Path;
use std::sync::Arc;

use super::declaration::{
    missing_name, parse_name_location, parse_variable_name_location, ContractDefinition,
    Declaration, DeclarationKind, EnumDefinition, ErrorDefinition, EventDefinition,
    FunctionDefinition, ModifierDefinition, StructDefinition, VariableDeclaration,
};
use super::expression::{Expression, ExpressionKind, ReferencedDeclaration};
use super::meta::{parse_path_parts, IdentifierPath, IdentifierPathPart, Meta, PathPartState, SourceUnit};
use super::statement::Statement;
use super::type_name::{TypeName, TypeNameKind};
use super::{IrArena, IrKind, IrNode, NodeKind, NodeRef, Reference, ReferenceResolver};
use crate::ast::{
    AstNodeId, CuHash, FunctionKind, GlobalSymbol, Mutability, RawBaseName, RawBlock,
    RawContractDefinition, RawContractNode, RawEnumDefinition, RawErrorDefinition,
    RawEventDefinition, RawExpression, RawFunctionDefinition, RawIdentifierPath,
    RawInheritanceSpecifier, RawModifierDefinition, RawModifierInvocation, RawOverrideSpecifier,
    RawParameterList, RawSourceUnit, RawSourceUnitNode, RawStatement, RawStructDefinition,
    RawTryCatchClause, RawTypeDescriptions, RawTypeName, RawVariableDeclaration, SourceInput, Src,
    Visibility,
};
use crate::error::{Error, Result};
use crate::span::ByteRange;

/// Builds the IR of one file
pub struct IrBuilder<'a> {
    arena: &'a mut IrArena,
    resolver: &'a mut ReferenceResolver,
    cu: CuHash,
    file: Arc<Path>,
    source: &'a [u8],
    source_unit: NodeRef,
    /// Names of the enclosing declarations
    scope: Vec<String>,
}

impl<'a> IrBuilder<'a> {
    /// Build the tree of `input` as compiled in `cu`, returning its source unit.
    ///
    /// On error the arena may hold a partial tree for the file; the caller
    /// removes it together with the file's registrations.
    pub fn build(
        arena: &'a mut IrArena,
        resolver: &'a mut ReferenceResolver,
        cu: CuHash,
        input: &'a SourceInput,
    ) -> Result<NodeRef> {
        let raw: RawSourceUnit =
            serde_json::from_value(input.ast.clone()).map_err(|e| Error::InvalidAst {
                file: input.path.clone(),
                message: e.to_string(),
            })?;

        let handle = arena.reserve();
        let mut builder = IrBuilder {
            arena,
            resolver,
            cu,
            file: Arc::from(input.path.as_path()),
            source: &input.source,
            source_unit: handle,
            scope: Vec::new(),
        };

        let mut nodes = Vec::with_capacity(raw.nodes.len());
        for node in &raw.nodes {
            let child = match node {
                RawSourceUnitNode::ContractDefinition(c) => builder.contract(c, handle)?,
                RawSourceUnitNode::FunctionDefinition(f) => builder.function(f, handle)?,
                RawSourceUnitNode::StructDefinition(s) => builder.struct_definition(s, handle)?,
                RawSourceUnitNode::EnumDefinition(e) => builder.enum_definition(e, handle)?,
                RawSourceUnitNode::ErrorDefinition(e) => builder.error_definition(e, handle)?,
                RawSourceUnitNode::EventDefinition(e) => builder.event_definition(e, handle)?,
                RawSourceUnitNode::VariableDeclaration(v) => builder.variable(v, handle)?,
                RawSourceUnitNode::Other => continue,
            };
            nodes.push(child);
        }

        let unit = Meta::SourceUnit(SourceUnit {
            license: raw.license.clone(),
            nodes,
        });
        builder.insert(handle, raw.id, raw.src, None, IrKind::Meta(unit))?;
        tracing::debug!(
            "built IR for {} ({} nodes in arena)",
            input.path.display(),
            builder.arena.len()
        );
        Ok(handle)
    }

    // =========================================================================
    // helpers
    // =========================================================================

    fn insert(
        &mut self,
        handle: NodeRef,
        id: AstNodeId,
        src: Src,
        parent: Option<NodeRef>,
        kind: IrKind,
    ) -> Result<NodeRef> {
        let byte_location = self.byte_location(src)?;
        self.resolver.register_node(id, self.cu, handle, &self.file);
        self.arena.insert(
            handle,
            IrNode {
                ast_id: id,
                cu_hash: self.cu,
                file: Arc::clone(&self.file),
                byte_location,
                parent,
                source_unit: self.source_unit,
                kind,
            },
        );
        Ok(handle)
    }

    fn byte_location(&self, src: Src) -> Result<ByteRange> {
        let Some(end) = src.end() else {
            return Err(Error::malformed(
                self.file.as_ref(),
                src.byte_offset,
                format!("source range length {} overflows", src.byte_length),
            ));
        };
        if end > self.source.len() {
            return Err(Error::malformed(
                self.file.as_ref(),
                src.byte_offset,
                format!("source range ends at {} past end of file ({})", end, self.source.len()),
            ));
        }
        Ok(ByteRange::new(src.byte_offset, end))
    }

    /// Source bytes of a node
    fn node_source(&self, src: Src) -> Result<&'a [u8]> {
        let source: &'a [u8] = self.source;
        src.end()
            .and_then(|end| source.get(src.byte_offset..end))
            .ok_or_else(|| Error::malformed(self.file.as_ref(), src.byte_offset, "source range out of bounds"))
    }

    fn canonical_name(&self, name: &str) -> String {
        if self.scope.is_empty() {
            name.to_string()
        } else {
            format!("{}.{}", self.scope.join("."), name)
        }
    }

    fn scoped<T>(&mut self, name: &str, f: impl FnOnce(&mut Self) -> Result<T>) -> Result<T> {
        self.scope.push(name.to_string());
        let result = f(self);
        self.scope.pop();
        result
    }

    fn name_location(
        &self,
        kind: NodeKind,
        function_kind: Option<FunctionKind>,
        src: Src,
        name_location: Option<Src>,
    ) -> Result<ByteRange> {
        if let Some(location) = name_location {
            return self.byte_location(location);
        }
        let source = self.node_source(src)?;
        parse_name_location(kind, function_kind, source, src.byte_offset)
            .ok_or_else(|| missing_name(&self.file, src.byte_offset, kind))
    }

    fn many<T>(
        &mut self,
        items: &[T],
        parent: NodeRef,
        mut f: impl FnMut(&mut Self, &T, NodeRef) -> Result<NodeRef>,
    ) -> Result<Vec<NodeRef>> {
        items.iter().map(|item| f(self, item, parent)).collect()
    }

    fn optional<T>(
        &mut self,
        item: Option<&T>,
        parent: NodeRef,
        f: impl FnOnce(&mut Self, &T, NodeRef) -> Result<NodeRef>,
    ) -> Result<Option<NodeRef>> {
        item.map(|item| f(self, item, parent)).transpose()
    }

    /// Record `node` on the declaration `id` once the tree is registered
    fn queue_reference(&mut self, node: NodeRef, id: AstNodeId) {
        let cu = self.cu;
        let file = Arc::clone(&self.file);
        self.resolver
            .register_post_process_callback(&self.file, move |params| {
                let declaration = match params.resolver.resolve_node(id, cu) {
                    Ok(declaration) => declaration,
                    Err(err) => {
                        // imports, using-for directives and other unmodelled targets
                        tracing::debug!("reference from {} not recorded: {}", node, err);
                        return Ok(());
                    }
                };
                if params.arena.declaration(declaration).is_none() {
                    return Ok(());
                }
                let reference = Reference::Node(node);
                params.arena.register_reference(declaration, reference);
                params.resolver.register_destroy_callback(&file, move |arena| {
                    arena.unregister_reference(declaration, reference);
                });
                Ok(())
            });
    }

    /// Resolve part `index` of `path`, `path_index` nesting levels above the
    /// path's own declaration
    fn queue_path_part(&mut self, path: NodeRef, index: usize, path_index: usize, referenced: AstNodeId) {
        let cu = self.cu;
        let file = Arc::clone(&self.file);
        self.resolver
            .register_post_process_callback(&self.file, move |params| {
                let mut declaration = match params.resolver.resolve_node(referenced, cu) {
                    Ok(declaration) => declaration,
                    Err(err) => {
                        tracing::debug!("path {} part {} left unresolved: {}", path, index, err);
                        return Ok(());
                    }
                };
                for level in 0..path_index {
                    declaration = params.arena.node(declaration)?.parent().ok_or_else(|| {
                        Error::invariant(format!(
                            "nesting level {} of path {} part {} is out of range (stopped at level {})",
                            path_index, path, index, level
                        ))
                    })?;
                }

                let target = params.arena.node(declaration)?;
                if target.as_declaration().is_none() {
                    // e.g. `Alias.S` where `Alias` names an imported source unit
                    tracing::debug!(
                        "path {} part {} refers to a {:?}, left unresolved",
                        path,
                        index,
                        target.kind()
                    );
                    return Ok(());
                }
                let order = params
                    .resolver
                    .node_path_order(target.ast_id(), target.cu_hash())?;
                let this_cu_id = params.resolver.ast_id_from_path_order(&order, cu)?;

                params
                    .arena
                    .set_path_part_state(path, index, PathPartState::Resolved(this_cu_id));
                let reference = Reference::PathPart { path, index };
                params.arena.register_reference(declaration, reference);
                params.resolver.register_destroy_callback(&file, move |arena| {
                    arena.unregister_reference(declaration, reference);
                });
                Ok(())
            });
    }

    /// Add `contract` to the child contracts of its base once the tree is registered
    fn queue_child_contract(&mut self, contract: NodeRef, base: AstNodeId) {
        let cu = self.cu;
        let file = Arc::clone(&self.file);
        self.resolver
            .register_post_process_callback(&self.file, move |params| {
                let base = params.resolver.resolve_node(base, cu)?;
                params.arena.add_child_contract(base, contract);
                params.resolver.register_destroy_callback(&file, move |arena| {
                    arena.remove_child_contract(base, contract);
                });
                Ok(())
            });
    }

    // =========================================================================
    // declarations
    // =========================================================================

    fn contract(&mut self, raw: &RawContractDefinition, parent: NodeRef) -> Result<NodeRef> {
        let handle = self.arena.reserve();
        let name_location = self.name_location(NodeKind::ContractDefinition, None, raw.src, raw.name_location)?;
        let canonical_name = self.canonical_name(&raw.name);

        let (base_contracts, nodes) = self.scoped(&raw.name, |b| {
            let base_contracts = b.many(&raw.base_contracts, handle, Self::inheritance_specifier)?;
            let mut nodes = Vec::with_capacity(raw.nodes.len());
            for node in &raw.nodes {
                let child = match node {
                    RawContractNode::FunctionDefinition(f) => b.function(f, handle)?,
                    RawContractNode::ModifierDefinition(m) => b.modifier(m, handle)?,
                    RawContractNode::StructDefinition(s) => b.struct_definition(s, handle)?,
                    RawContractNode::EnumDefinition(e) => b.enum_definition(e, handle)?,
                    RawContractNode::EventDefinition(e) => b.event_definition(e, handle)?,
                    RawContractNode::ErrorDefinition(e) => b.error_definition(e, handle)?,
                    RawContractNode::VariableDeclaration(v) => b.variable(v, handle)?,
                    RawContractNode::Other => continue,
                };
                nodes.push(child);
            }
            Ok((base_contracts, nodes))
        })?;

        for base in &raw.base_contracts {
            let base_id = match &base.base_name {
                RawBaseName::IdentifierPath(p) => p.referenced_declaration,
                RawBaseName::UserDefinedTypeName(u) => u.referenced_declaration,
            };
            self.queue_child_contract(handle, base_id);
        }

        let declaration = Declaration::new(
            raw.name.clone(),
            canonical_name,
            Visibility::Public,
            name_location,
            DeclarationKind::Contract(ContractDefinition {
                kind: raw.contract_kind,
                is_abstract: raw.is_abstract,
                base_contracts,
                nodes,
                linearized_base_contracts: raw.linearized_base_contracts.clone(),
                child_contracts: Vec::new(),
            }),
        );
        self.insert(handle, raw.id, raw.src, Some(parent), IrKind::Declaration(declaration))
    }

    fn function(&mut self, raw: &RawFunctionDefinition, parent: NodeRef) -> Result<NodeRef> {
        let handle = self.arena.reserve();
        let name_location = self.name_location(
            NodeKind::FunctionDefinition,
            Some(raw.kind),
            raw.src,
            raw.name_location,
        )?;
        let name = if raw.name.is_empty() {
            // constructor, receive and fallback carry no name in the AST
            match raw.kind {
                FunctionKind::Constructor => "constructor".to_string(),
                FunctionKind::Receive => "receive".to_string(),
                FunctionKind::Fallback => "fallback".to_string(),
                _ => String::new(),
            }
        } else {
            raw.name.clone()
        };
        let canonical_name = self.canonical_name(&name);

        let function = self.scoped(&name, |b| {
            let parameters = b.parameter_list(&raw.parameters, handle)?;
            let return_parameters = b.parameter_list(&raw.return_parameters, handle)?;
            let modifiers = b.many(&raw.modifiers, handle, Self::modifier_invocation)?;
            let overrides = b.optional(raw.overrides.as_ref(), handle, Self::override_specifier)?;
            let body = b.optional(raw.body.as_ref(), handle, Self::block)?;
            Ok(FunctionDefinition {
                kind: raw.kind,
                state_mutability: raw.state_mutability,
                implemented: raw.implemented,
                is_virtual: raw.is_virtual,
                parameters,
                return_parameters,
                modifiers,
                overrides,
                body,
                base_functions: raw.base_functions.clone(),
            })
        })?;

        let declaration = Declaration::new(
            name,
            canonical_name,
            raw.visibility,
            name_location,
            DeclarationKind::Function(function),
        );
        self.insert(handle, raw.id, raw.src, Some(parent), IrKind::Declaration(declaration))
    }

    fn modifier(&mut self, raw: &RawModifierDefinition, parent: NodeRef) -> Result<NodeRef> {
        let handle = self.arena.reserve();
        let name_location = self.name_location(NodeKind::ModifierDefinition, None, raw.src, raw.name_location)?;
        let canonical_name = self.canonical_name(&raw.name);

        let modifier = self.scoped(&raw.name, |b| {
            Ok(ModifierDefinition {
                is_virtual: raw.is_virtual,
                parameters: b.parameter_list(&raw.parameters, handle)?,
                overrides: b.optional(raw.overrides.as_ref(), handle, Self::override_specifier)?,
                body: b.optional(raw.body.as_ref(), handle, Self::block)?,
                base_modifiers: raw.base_modifiers.clone(),
            })
        })?;

        let declaration = Declaration::new(
            raw.name.clone(),
            canonical_name,
            raw.visibility,
            name_location,
            DeclarationKind::Modifier(modifier),
        );
        self.insert(handle, raw.id, raw.src, Some(parent), IrKind::Declaration(declaration))
    }

    fn struct_definition(&mut self, raw: &RawStructDefinition, parent: NodeRef) -> Result<NodeRef> {
        let handle = self.arena.reserve();
        let name_location = self.name_location(NodeKind::StructDefinition, None, raw.src, raw.name_location)?;
        let canonical_name = raw
            .canonical_name
            .clone()
            .unwrap_or_else(|| self.canonical_name(&raw.name));
        let members = self.scoped(&raw.name, |b| b.many(&raw.members, handle, Self::variable))?;

        let declaration = Declaration::new(
            raw.name.clone(),
            canonical_name,
            raw.visibility,
            name_location,
            DeclarationKind::Struct(StructDefinition { members }),
        );
        self.insert(handle, raw.id, raw.src, Some(parent), IrKind::Declaration(declaration))
    }

    fn enum_definition(&mut self, raw: &RawEnumDefinition, parent: NodeRef) -> Result<NodeRef> {
        let handle = self.arena.reserve();
        let name_location = self.name_location(NodeKind::EnumDefinition, None, raw.src, raw.name_location)?;
        let canonical_name = raw
            .canonical_name
            .clone()
            .unwrap_or_else(|| self.canonical_name(&raw.name));

        let mut values = Vec::with_capacity(raw.members.len());
        for value in &raw.members {
            let value_handle = self.arena.reserve();
            // an enum value's source range is its name
            let value_location = match value.name_location {
                Some(location) => self.byte_location(location)?,
                None => self.byte_location(value.src)?,
            };
            let declaration = Declaration::new(
                value.name.clone(),
                format!("{}.{}", canonical_name, value.name),
                Visibility::Public,
                value_location,
                DeclarationKind::EnumValue,
            );
            values.push(self.insert(
                value_handle,
                value.id,
                value.src,
                Some(handle),
                IrKind::Declaration(declaration),
            )?);
        }

        let declaration = Declaration::new(
            raw.name.clone(),
            canonical_name,
            Visibility::Public,
            name_location,
            DeclarationKind::Enum(EnumDefinition { values }),
        );
        self.insert(handle, raw.id, raw.src, Some(parent), IrKind::Declaration(declaration))
    }

    fn event_definition(&mut self, raw: &RawEventDefinition, parent: NodeRef) -> Result<NodeRef> {
        let handle = self.arena.reserve();
        let name_location = self.name_location(NodeKind::EventDefinition, None, raw.src, raw.name_location)?;
        let canonical_name = self.canonical_name(&raw.name);
        let parameters = self.scoped(&raw.name, |b| b.parameter_list(&raw.parameters, handle))?;

        let declaration = Declaration::new(
            raw.name.clone(),
            canonical_name,
            Visibility::Public,
            name_location,
            DeclarationKind::Event(EventDefinition {
                anonymous: raw.anonymous,
                parameters,
            }),
        );
        self.insert(handle, raw.id, raw.src, Some(parent), IrKind::Declaration(declaration))
    }

    fn error_definition(&mut self, raw: &RawErrorDefinition, parent: NodeRef) -> Result<NodeRef> {
        let handle = self.arena.reserve();
        let name_location = self.name_location(NodeKind::ErrorDefinition, None, raw.src, raw.name_location)?;
        let canonical_name = self.canonical_name(&raw.name);
        let parameters = self.scoped(&raw.name, |b| b.parameter_list(&raw.parameters, handle))?;

        let declaration = Declaration::new(
            raw.name.clone(),
            canonical_name,
            Visibility::Public,
            name_location,
            DeclarationKind::Error(ErrorDefinition { parameters }),
        );
        self.insert(handle, raw.id, raw.src, Some(parent), IrKind::Declaration(declaration))
    }

    fn variable(&mut self, raw: &RawVariableDeclaration, parent: NodeRef) -> Result<NodeRef> {
        let handle = self.arena.reserve();
        let type_name = self.optional(raw.type_name.as_ref(), handle, Self::type_name)?;

        let name_location = match raw.name_location {
            Some(location) => self.byte_location(location)?,
            None if raw.name.is_empty() => self.byte_location(raw.src)?,
            None => {
                let source = self.node_source(raw.src)?;
                // the name follows the type name
                let search_from = type_name
                    .and_then(|t| self.arena.get(t))
                    .map(|t| t.byte_location().end.saturating_sub(raw.src.byte_offset))
                    .unwrap_or(0);
                parse_variable_name_location(&raw.name, source, raw.src.byte_offset, search_from)
                    .ok_or_else(|| missing_name(&self.file, raw.src.byte_offset, NodeKind::VariableDeclaration))?
            }
        };
        let canonical_name = self.canonical_name(&raw.name);
        let value = self.optional(raw.value.as_ref(), handle, Self::expression)?;

        let mutability = if raw.constant {
            Mutability::Constant
        } else {
            raw.mutability
        };
        let declaration = Declaration::new(
            raw.name.clone(),
            canonical_name,
            raw.visibility,
            name_location,
            DeclarationKind::Variable(VariableDeclaration {
                type_name,
                type_string: raw.type_descriptions.type_string.clone(),
                state_variable: raw.state_variable,
                mutability,
                storage_location: raw.storage_location,
                indexed: raw.indexed,
                value,
            }),
        );
        self.insert(handle, raw.id, raw.src, Some(parent), IrKind::Declaration(declaration))
    }

    // =========================================================================
    // meta
    // =========================================================================

    fn parameter_list(&mut self, raw: &RawParameterList, parent: NodeRef) -> Result<NodeRef> {
        let handle = self.arena.reserve();
        let parameters = self.many(&raw.parameters, handle, Self::variable)?;
        self.insert(
            handle,
            raw.id,
            raw.src,
            Some(parent),
            IrKind::Meta(Meta::ParameterList { parameters }),
        )
    }

    fn identifier_path(&mut self, raw: &RawIdentifierPath, parent: NodeRef) -> Result<NodeRef> {
        let handle = self.arena.reserve();
        let source = self.node_source(raw.src)?;
        let found = parse_path_parts(source, raw.src.byte_offset);
        if found.is_empty() {
            return Err(Error::malformed(
                self.file.as_ref(),
                raw.src.byte_offset,
                "identifier path contains no identifier",
            ));
        }

        let count = found.len();
        let parts = found
            .into_iter()
            .enumerate()
            .map(|(i, (name, byte_location))| IdentifierPathPart {
                name,
                byte_location,
                path_index: count - i - 1,
                state: PathPartState::Unresolved,
            })
            .collect();
        let path = IdentifierPath {
            name: raw.name.clone(),
            referenced_declaration: raw.referenced_declaration,
            parts,
        };
        self.insert(handle, raw.id, raw.src, Some(parent), IrKind::Meta(Meta::IdentifierPath(path)))?;

        if raw.referenced_declaration.0 >= 0 {
            for i in 0..count {
                self.queue_path_part(handle, i, count - i - 1, raw.referenced_declaration);
            }
        }
        Ok(handle)
    }

    fn inheritance_specifier(&mut self, raw: &RawInheritanceSpecifier, parent: NodeRef) -> Result<NodeRef> {
        let handle = self.arena.reserve();
        let base_name = match &raw.base_name {
            RawBaseName::IdentifierPath(p) => self.identifier_path(p, handle)?,
            RawBaseName::UserDefinedTypeName(u) => {
                self.type_name(&RawTypeName::UserDefinedTypeName(u.clone()), handle)?
            }
        };
        let arguments = match &raw.arguments {
            Some(arguments) => self.many(arguments, handle, Self::expression)?,
            None => Vec::new(),
        };
        self.insert(
            handle,
            raw.id,
            raw.src,
            Some(parent),
            IrKind::Meta(Meta::InheritanceSpecifier { base_name, arguments }),
        )
    }

    fn modifier_invocation(&mut self, raw: &RawModifierInvocation, parent: NodeRef) -> Result<NodeRef> {
        let handle = self.arena.reserve();
        let modifier_name = self.identifier_path(&raw.modifier_name, handle)?;
        let arguments = match &raw.arguments {
            Some(arguments) => self.many(arguments, handle, Self::expression)?,
            None => Vec::new(),
        };
        self.insert(
            handle,
            raw.id,
            raw.src,
            Some(parent),
            IrKind::Meta(Meta::ModifierInvocation {
                modifier_name,
                arguments,
            }),
        )
    }

    fn override_specifier(&mut self, raw: &RawOverrideSpecifier, parent: NodeRef) -> Result<NodeRef> {
        let handle = self.arena.reserve();
        let overrides = self.many(&raw.overrides, handle, Self::identifier_path)?;
        self.insert(
            handle,
            raw.id,
            raw.src,
            Some(parent),
            IrKind::Meta(Meta::OverrideSpecifier { overrides }),
        )
    }

    fn try_catch_clause(&mut self, raw: &RawTryCatchClause, parent: NodeRef) -> Result<NodeRef> {
        let handle = self.arena.reserve();
        let parameters = self.optional(raw.parameters.as_ref(), handle, Self::parameter_list)?;
        let block = self.block(&raw.block, handle)?;
        self.insert(
            handle,
            raw.id,
            raw.src,
            Some(parent),
            IrKind::Meta(Meta::TryCatchClause {
                error_name: raw.error_name.clone(),
                parameters,
                block,
            }),
        )
    }

    // =========================================================================
    // statements
    // =========================================================================

    fn block(&mut self, raw: &RawBlock, parent: NodeRef) -> Result<NodeRef> {
        let handle = self.arena.reserve();
        let statements = self.statements(&raw.statements, handle)?;
        self.insert(
            handle,
            raw.id,
            raw.src,
            Some(parent),
            IrKind::Statement(Statement::Block { statements }),
        )
    }

    fn statements(&mut self, raw: &[RawStatement], parent: NodeRef) -> Result<Vec<NodeRef>> {
        let mut statements = Vec::with_capacity(raw.len());
        for statement in raw {
            if matches!(statement, RawStatement::Other) {
                tracing::debug!("skipping unmodelled statement in {}", self.file.display());
                continue;
            }
            statements.push(self.statement(statement, parent)?);
        }
        Ok(statements)
    }

    fn optional_statement(
        &mut self,
        raw: Option<&RawStatement>,
        parent: NodeRef,
    ) -> Result<Option<NodeRef>> {
        match raw {
            None | Some(RawStatement::Other) => Ok(None),
            Some(statement) => self.statement(statement, parent).map(Some),
        }
    }

    fn statement(&mut self, raw: &RawStatement, parent: NodeRef) -> Result<NodeRef> {
        if let RawStatement::Block(block) = raw {
            return self.block(block, parent);
        }

        let handle = self.arena.reserve();
        let (id, src, statement) = match raw {
            RawStatement::Block(_) => unreachable!("handled above"),
            RawStatement::UncheckedBlock(b) => (
                b.id,
                b.src,
                Statement::UncheckedBlock {
                    statements: self.statements(&b.statements, handle)?,
                },
            ),
            RawStatement::ExpressionStatement(s) => (
                s.id,
                s.src,
                Statement::ExpressionStatement {
                    expression: self.expression(&s.expression, handle)?,
                },
            ),
            RawStatement::VariableDeclarationStatement(s) => {
                let mut declarations = Vec::with_capacity(s.declarations.len());
                for declaration in &s.declarations {
                    declarations.push(self.optional(declaration.as_ref(), handle, Self::variable)?);
                }
                let initial_value = self.optional(s.initial_value.as_ref(), handle, Self::expression)?;
                (
                    s.id,
                    s.src,
                    Statement::VariableDeclarationStatement {
                        declarations,
                        initial_value,
                    },
                )
            }
            RawStatement::IfStatement(s) => {
                let condition = self.expression(&s.condition, handle)?;
                let true_body = self.statement(&s.true_body, handle)?;
                let false_body = self.optional_statement(s.false_body.as_deref(), handle)?;
                (
                    s.id,
                    s.src,
                    Statement::If {
                        condition,
                        true_body,
                        false_body,
                    },
                )
            }
            RawStatement::ForStatement(s) => {
                let initialization = self.optional_statement(s.initialization_expression.as_deref(), handle)?;
                let condition = self.optional(s.condition.as_ref(), handle, Self::expression)?;
                let loop_expression = self.optional_statement(s.loop_expression.as_deref(), handle)?;
                let body = self.statement(&s.body, handle)?;
                (
                    s.id,
                    s.src,
                    Statement::For {
                        initialization,
                        condition,
                        loop_expression,
                        body,
                    },
                )
            }
            RawStatement::WhileStatement(s) => {
                let condition = self.expression(&s.condition, handle)?;
                let body = self.statement(&s.body, handle)?;
                (s.id, s.src, Statement::While { condition, body })
            }
            RawStatement::DoWhileStatement(s) => {
                let body = self.statement(&s.body, handle)?;
                let condition = self.expression(&s.condition, handle)?;
                (s.id, s.src, Statement::DoWhile { condition, body })
            }
            RawStatement::Break(s) => (s.id, s.src, Statement::Break),
            RawStatement::Continue(s) => (s.id, s.src, Statement::Continue),
            RawStatement::PlaceholderStatement(s) => (s.id, s.src, Statement::Placeholder),
            RawStatement::InlineAssembly(s) => (s.id, s.src, Statement::InlineAssembly),
            RawStatement::Return(s) => (
                s.id,
                s.src,
                Statement::Return {
                    expression: self.optional(s.expression.as_ref(), handle, Self::expression)?,
                },
            ),
            RawStatement::RevertStatement(s) => (
                s.id,
                s.src,
                Statement::Revert {
                    error_call: self.expression(&s.error_call, handle)?,
                },
            ),
            RawStatement::EmitStatement(s) => (
                s.id,
                s.src,
                Statement::Emit {
                    event_call: self.expression(&s.event_call, handle)?,
                },
            ),
            RawStatement::TryStatement(s) => {
                let external_call = self.expression(&s.external_call, handle)?;
                let clauses = self.many(&s.clauses, handle, Self::try_catch_clause)?;
                (
                    s.id,
                    s.src,
                    Statement::Try {
                        external_call,
                        clauses,
                    },
                )
            }
            RawStatement::Other => {
                return Err(Error::UnsupportedConstruct {
                    kind: "statement".to_string(),
                })
            }
        };
        self.insert(handle, id, src, Some(parent), IrKind::Statement(statement))
    }

    // =========================================================================
    // expressions
    // =========================================================================

    fn expression(&mut self, raw: &RawExpression, parent: NodeRef) -> Result<NodeRef> {
        let handle = self.arena.reserve();
        let (id, src, types, kind) = match raw {
            RawExpression::Assignment(e) => (
                e.id,
                e.src,
                &e.type_descriptions,
                ExpressionKind::Assignment {
                    operator: e.operator.clone(),
                    left: self.expression(&e.left_hand_side, handle)?,
                    right: self.expression(&e.right_hand_side, handle)?,
                },
            ),
            RawExpression::BinaryOperation(e) => (
                e.id,
                e.src,
                &e.type_descriptions,
                ExpressionKind::BinaryOperation {
                    operator: e.operator.clone(),
                    left: self.expression(&e.left_expression, handle)?,
                    right: self.expression(&e.right_expression, handle)?,
                },
            ),
            RawExpression::UnaryOperation(e) => (
                e.id,
                e.src,
                &e.type_descriptions,
                ExpressionKind::UnaryOperation {
                    operator: e.operator.clone(),
                    prefix: e.prefix,
                    sub_expression: self.expression(&e.sub_expression, handle)?,
                },
            ),
            RawExpression::Conditional(e) => (
                e.id,
                e.src,
                &e.type_descriptions,
                ExpressionKind::Conditional {
                    condition: self.expression(&e.condition, handle)?,
                    true_expression: self.expression(&e.true_expression, handle)?,
                    false_expression: self.expression(&e.false_expression, handle)?,
                },
            ),
            RawExpression::FunctionCall(e) => (
                e.id,
                e.src,
                &e.type_descriptions,
                ExpressionKind::FunctionCall {
                    expression: self.expression(&e.expression, handle)?,
                    arguments: self.many(&e.arguments, handle, Self::expression)?,
                    names: e.names.clone(),
                    call_kind: e.kind.clone(),
                },
            ),
            RawExpression::FunctionCallOptions(e) => (
                e.id,
                e.src,
                &e.type_descriptions,
                ExpressionKind::FunctionCallOptions {
                    expression: self.expression(&e.expression, handle)?,
                    names: e.names.clone(),
                    options: self.many(&e.options, handle, Self::expression)?,
                },
            ),
            RawExpression::Identifier(e) => {
                let referenced = match e.referenced_declaration {
                    Some(id) if id.0 >= 0 => {
                        self.queue_reference(handle, id);
                        ReferencedDeclaration::Declaration(id)
                    }
                    Some(id) => GlobalSymbol::from_id(id)
                        .map(ReferencedDeclaration::Global)
                        .unwrap_or(ReferencedDeclaration::None),
                    None => ReferencedDeclaration::None,
                };
                (
                    e.id,
                    e.src,
                    &e.type_descriptions,
                    ExpressionKind::Identifier {
                        name: e.name.clone(),
                        referenced,
                    },
                )
            }
            RawExpression::MemberAccess(e) => {
                let base_type = raw_type_descriptions(&e.expression).and_then(|t| t.type_identifier.as_deref());
                let referenced = match e.referenced_declaration {
                    Some(id) if id.0 >= 0 => {
                        self.queue_reference(handle, id);
                        ReferencedDeclaration::Declaration(id)
                    }
                    Some(id) => GlobalSymbol::from_id(id)
                        .map(ReferencedDeclaration::Global)
                        .unwrap_or(ReferencedDeclaration::None),
                    None => GlobalSymbol::from_member(&e.member_name, base_type)
                        .map(ReferencedDeclaration::Global)
                        .unwrap_or(ReferencedDeclaration::None),
                };
                (
                    e.id,
                    e.src,
                    &e.type_descriptions,
                    ExpressionKind::MemberAccess {
                        expression: self.expression(&e.expression, handle)?,
                        member_name: e.member_name.clone(),
                        referenced,
                    },
                )
            }
            RawExpression::IndexAccess(e) => (
                e.id,
                e.src,
                &e.type_descriptions,
                ExpressionKind::IndexAccess {
                    base: self.expression(&e.base_expression, handle)?,
                    index: self.optional(e.index_expression.as_deref(), handle, Self::expression)?,
                },
            ),
            RawExpression::IndexRangeAccess(e) => (
                e.id,
                e.src,
                &e.type_descriptions,
                ExpressionKind::IndexRangeAccess {
                    base: self.expression(&e.base_expression, handle)?,
                    start: self.optional(e.start_expression.as_deref(), handle, Self::expression)?,
                    end: self.optional(e.end_expression.as_deref(), handle, Self::expression)?,
                },
            ),
            RawExpression::Literal(e) => (
                e.id,
                e.src,
                &e.type_descriptions,
                ExpressionKind::Literal {
                    literal_kind: e.kind.clone(),
                    value: e.value.clone(),
                },
            ),
            RawExpression::TupleExpression(e) => {
                let mut components = Vec::with_capacity(e.components.len());
                for component in &e.components {
                    components.push(self.optional(component.as_ref(), handle, Self::expression)?);
                }
                (
                    e.id,
                    e.src,
                    &e.type_descriptions,
                    ExpressionKind::Tuple {
                        components,
                        is_inline_array: e.is_inline_array,
                    },
                )
            }
            RawExpression::NewExpression(e) => (
                e.id,
                e.src,
                &e.type_descriptions,
                ExpressionKind::New {
                    type_name: self.type_name(&e.type_name, handle)?,
                },
            ),
            RawExpression::ElementaryTypeNameExpression(e) => (
                e.id,
                e.src,
                &e.type_descriptions,
                ExpressionKind::ElementaryTypeName {
                    type_name: self.type_name(&e.type_name, handle)?,
                },
            ),
            RawExpression::Other => {
                return Err(Error::UnsupportedConstruct {
                    kind: "expression".to_string(),
                })
            }
        };
        let expression = Expression {
            type_identifier: types.type_identifier.clone(),
            type_string: types.type_string.clone(),
            kind,
        };
        self.insert(handle, id, src, Some(parent), IrKind::Expression(expression))
    }

    // =========================================================================
    // type names
    // =========================================================================

    fn type_name(&mut self, raw: &RawTypeName, parent: NodeRef) -> Result<NodeRef> {
        let handle = self.arena.reserve();
        let (id, src, types, kind) = match raw {
            RawTypeName::ElementaryTypeName(t) => (
                t.id,
                t.src,
                &t.type_descriptions,
                TypeNameKind::Elementary {
                    name: t.name.clone(),
                    state_mutability: t.state_mutability,
                },
            ),
            RawTypeName::UserDefinedTypeName(t) => {
                let path_node = self.optional(t.path_node.as_ref(), handle, Self::identifier_path)?;
                let name = match (&t.name, &t.path_node) {
                    (Some(name), _) => name.clone(),
                    (None, Some(path)) => path.name.clone(),
                    (None, None) => String::new(),
                };
                if t.referenced_declaration.0 >= 0 {
                    self.queue_reference(handle, t.referenced_declaration);
                }
                (
                    t.id,
                    t.src,
                    &t.type_descriptions,
                    TypeNameKind::UserDefined {
                        name,
                        path_node,
                        referenced_declaration: t.referenced_declaration,
                    },
                )
            }
            RawTypeName::Mapping(t) => (
                t.id,
                t.src,
                &t.type_descriptions,
                TypeNameKind::Mapping {
                    key_type: self.type_name(&t.key_type, handle)?,
                    value_type: self.type_name(&t.value_type, handle)?,
                },
            ),
            RawTypeName::ArrayTypeName(t) => (
                t.id,
                t.src,
                &t.type_descriptions,
                TypeNameKind::Array {
                    base_type: self.type_name(&t.base_type, handle)?,
                    length: self.optional(t.length.as_deref(), handle, Self::expression)?,
                },
            ),
            RawTypeName::FunctionTypeName(t) => (
                t.id,
                t.src,
                &t.type_descriptions,
                TypeNameKind::Function {
                    visibility: t.visibility,
                    state_mutability: t.state_mutability,
                    parameter_types: self.parameter_list(&t.parameter_types, handle)?,
                    return_parameter_types: self.parameter_list(&t.return_parameter_types, handle)?,
                },
            ),
        };
        let type_name = TypeName {
            type_identifier: types.type_identifier.clone(),
            type_string: types.type_string.clone(),
            kind,
        };
        self.insert(handle, id, src, Some(parent), IrKind::TypeName(type_name))
    }
}

fn raw_type_descriptions(raw: &RawExpression) -> Option<&RawTypeDescriptions> {
    match raw {
        RawExpression::Assignment(e) => Some(&e.type_descriptions),
        RawExpression::BinaryOperation(e) => Some(&e.type_descriptions),
        RawExpression::UnaryOperation(e) => Some(&e.type_descriptions),
        RawExpression::Conditional(e) => Some(&e.type_descriptions),
        RawExpression::FunctionCall(e) => Some(&e.type_descriptions),
        RawExpression::FunctionCallOptions(e) => Some(&e.type_descriptions),
        RawExpression::Identifier(e) => Some(&e.type_descriptions),
        RawExpression::MemberAccess(e) => Some(&e.type_descriptions),
        RawExpression::IndexAccess(e) => Some(&e.type_descriptions),
        RawExpression::IndexRangeAccess(e) => Some(&e.type_descriptions),
        RawExpression::Literal(e) => Some(&e.type_descriptions),
        RawExpression::TupleExpression(e) => Some(&e.type_descriptions),
        RawExpression::NewExpression(e) => Some(&e.type_descriptions),
        RawExpression::ElementaryTypeNameExpression(e) => Some(&e.type_descriptions),
        RawExpression::Other => None,
    }
}
