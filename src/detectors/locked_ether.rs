//! Contracts that can receive ether but never send it, and the reverse.
//!
//! Receivers are payable, implemented functions that can return normally.
//! Senders are functions using `transfer`, `send`, `.value(...)` or a
//! `{value: ...}` call option. Each function is attributed to its defining
//! contract and to every concrete contract derived from it that does not
//! override it.

use std::collections::{BTreeMap, BTreeSet, HashSet, VecDeque};

use super::{Detector, Finding, Visitor};
use crate::analysis::AnalysisContext;
use crate::ast::{ContractKind, GlobalSymbol, StateMutability};
use crate::error::Result;
use crate::ir::{Declaration, ExpressionKind, IrNode, NodeKind, NodeRef, ReferencedDeclaration};

pub const NAME: &str = "locked-ether";

#[derive(Debug, Default)]
pub struct LockedEtherDetector {
    receiving_ether: BTreeSet<NodeRef>,
    sending_ether: BTreeSet<NodeRef>,
}

/// Contract → functions attributed to it
type ContractFunctions = BTreeMap<NodeRef, BTreeSet<NodeRef>>;

impl LockedEtherDetector {
    fn enclosing_function_definition(ctx: &AnalysisContext<'_>, node: NodeRef) -> Option<NodeRef> {
        ctx.arena
            .ancestors(node)
            .find(|n| ctx.arena.get(*n).map(IrNode::kind) == Some(NodeKind::FunctionDefinition))
    }

    fn process_child_contracts(ctx: &AnalysisContext<'_>, function: NodeRef, contracts: &mut ContractFunctions) {
        let arena = ctx.arena;
        let Some(parent) = arena.get(function).and_then(IrNode::parent) else {
            return;
        };
        if arena.declaration(parent).and_then(Declaration::as_contract).is_none() {
            return;
        }

        let mut queue = VecDeque::from([parent]);
        let mut visited = HashSet::from([parent]);
        while let Some(contract) = queue.pop_front() {
            let Some(definition) = arena.declaration(contract).and_then(Declaration::as_contract) else {
                continue;
            };
            if definition.is_abstract
                || matches!(definition.kind, ContractKind::Interface | ContractKind::Library)
            {
                continue;
            }

            let overridden = arena.contract_functions(contract).into_iter().any(|f| {
                match arena.base_functions(ctx.resolver, f) {
                    Ok(bases) => bases.contains(&function),
                    Err(err) => {
                        tracing::debug!("base functions of {} not resolved: {}", f, err);
                        false
                    }
                }
            });
            if overridden {
                continue;
            }

            contracts.entry(contract).or_default().insert(function);

            for child in arena.child_contracts(contract) {
                if visited.insert(*child) {
                    queue.push_back(*child);
                }
            }
        }
    }
}

impl Visitor for LockedEtherDetector {
    fn visit_function_definition(&mut self, ctx: &AnalysisContext<'_>, node: NodeRef) -> Result<()> {
        let Some(function) = ctx.arena.declaration(node).and_then(Declaration::as_function) else {
            return Ok(());
        };
        if function.state_mutability != StateMutability::Payable || !function.implemented {
            return Ok(());
        }
        let Some(cfg) = ctx.cfg(node)? else {
            return Ok(());
        };
        if cfg.backward_reachability().reaches_start {
            self.receiving_ether.insert(node);
        }
        Ok(())
    }

    fn visit_member_access(&mut self, ctx: &AnalysisContext<'_>, node: NodeRef) -> Result<()> {
        let referenced = ctx
            .arena
            .get(node)
            .and_then(IrNode::as_expression)
            .map(|e| e.referenced());
        if !matches!(
            referenced,
            Some(ReferencedDeclaration::Global(
                GlobalSymbol::AddressSend | GlobalSymbol::AddressTransfer | GlobalSymbol::FunctionValue
            ))
        ) {
            return Ok(());
        }
        if let Some(function) = Self::enclosing_function_definition(ctx, node) {
            self.sending_ether.insert(function);
        }
        Ok(())
    }

    fn visit_function_call_options(&mut self, ctx: &AnalysisContext<'_>, node: NodeRef) -> Result<()> {
        let Some(n) = ctx.arena.get(node) else {
            return Ok(());
        };
        let Some(ExpressionKind::FunctionCallOptions { names, .. }) = n.as_expression().map(|e| &e.kind) else {
            return Ok(());
        };
        let parent_is_call = n
            .parent()
            .and_then(|p| ctx.arena.get(p))
            .map(IrNode::kind)
            == Some(NodeKind::FunctionCall);
        if !parent_is_call || !names.iter().any(|name| name == "value") {
            return Ok(());
        }
        if let Some(function) = Self::enclosing_function_definition(ctx, node) {
            self.sending_ether.insert(function);
        }
        Ok(())
    }
}

impl Detector for LockedEtherDetector {
    fn name(&self) -> &'static str {
        NAME
    }

    fn report(&mut self, ctx: &AnalysisContext<'_>) -> Result<Vec<Finding>> {
        let mut receiving = ContractFunctions::new();
        let mut sending = ContractFunctions::new();

        for function in &self.receiving_ether {
            Self::process_child_contracts(ctx, *function, &mut receiving);
        }
        for function in &self.sending_ether {
            Self::process_child_contracts(ctx, *function, &mut sending);
        }

        let mut findings = Vec::new();
        for (contract, functions) in &receiving {
            if sending.contains_key(contract) {
                continue;
            }
            findings.push(functions.iter().fold(
                Finding::new(*contract, "Contract receives ether but does not send ether"),
                |finding, f| finding.with_evidence(*f, "Receives ether here"),
            ));
        }
        for (contract, functions) in &sending {
            if receiving.contains_key(contract) {
                continue;
            }
            findings.push(functions.iter().fold(
                Finding::new(
                    *contract,
                    "Contract sends ether but does not receive ether (except for selfdestruct)",
                ),
                |finding, f| finding.with_evidence(*f, "Sends ether here"),
            ));
        }
        Ok(findings)
    }
}
