//! # State-Mutation Summarizer
//!
//! Computes, for any IR node, the set of `(node, flags)` pairs describing the
//! observable state effects of the subtree: storage writes, value transfers,
//! external calls, deployments, self-destructs and event emission.
//!
//! A node's summary is the union of its children's summaries and the effects
//! it introduces itself. Summaries are pure functions of the (immutable)
//! subtree, so they are memoized in a bounded LRU cache and recomputed on
//! eviction.

use std::collections::BTreeSet;
use std::num::NonZeroUsize;
use std::sync::Arc;

use bitflags::bitflags;
use lru::LruCache;
use parking_lot::Mutex;

use crate::ast::{GlobalSymbol, StateMutability};
use crate::ir::{
    DeclarationKind, ExpressionKind, IrArena, IrKind, NodeRef, ReferenceResolver, Statement,
};

bitflags! {
    /// Kinds of observable state effects
    #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
    pub struct ModifiesStateFlags: u32 {
        /// Writes a state variable
        const MODIFIES_STATE_VAR = 0x0001;
        /// Emits an event
        const EMITS = 0x0002;
        /// Transfers value
        const SENDS_ETHER = 0x0004;
        /// Creates a contract with `new`
        const DEPLOYS_CONTRACT = 0x0008;
        /// Calls `selfdestruct`
        const SELFDESTRUCTS = 0x0010;
        /// Performs a low-level or external call
        const PERFORMS_CALL = 0x0020;
        /// Performs a `delegatecall`
        const PERFORMS_DELEGATECALL = 0x0040;
        /// Calls a non-payable function without implementation
        const CALLS_UNIMPLEMENTED_NONPAYABLE_FUNCTION = 0x0080;
        /// Calls a payable function without implementation
        const CALLS_UNIMPLEMENTED_PAYABLE_FUNCTION = 0x0100;
    }
}

/// Effects of a subtree
pub type EffectSet = BTreeSet<(NodeRef, ModifiesStateFlags)>;

/// Default number of memoized summaries
pub const DEFAULT_CACHE_CAPACITY: usize = 2048;

/// Memoizing state-mutation summarizer
pub struct ModifiesStateSummarizer {
    cache: Mutex<LruCache<NodeRef, Arc<EffectSet>>>,
}

impl std::fmt::Debug for ModifiesStateSummarizer {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let cache = self.cache.lock();
        f.debug_struct("ModifiesStateSummarizer")
            .field("cached", &cache.len())
            .field("capacity", &cache.cap())
            .finish()
    }
}

impl Default for ModifiesStateSummarizer {
    fn default() -> Self {
        Self::new(DEFAULT_CACHE_CAPACITY)
    }
}

impl ModifiesStateSummarizer {
    /// Summarizer keeping at most `capacity` summaries (at least one)
    pub fn new(capacity: usize) -> Self {
        let capacity = NonZeroUsize::new(capacity).unwrap_or(NonZeroUsize::MIN);
        Self {
            cache: Mutex::new(LruCache::new(capacity)),
        }
    }

    /// Effects of the subtree rooted at `node`
    pub fn modifies_state(
        &self,
        arena: &IrArena,
        resolver: &ReferenceResolver,
        node: NodeRef,
    ) -> Arc<EffectSet> {
        let cached = self.cache.lock().get(&node).cloned();
        if let Some(effects) = cached {
            return effects;
        }

        let mut effects = own_effects(arena, resolver, node);
        if let Some(n) = arena.get(node) {
            for child in n.children() {
                effects.extend(self.modifies_state(arena, resolver, child).iter().copied());
            }
        }

        let effects = Arc::new(effects);
        self.cache.lock().put(node, Arc::clone(&effects));
        effects
    }

    /// Union of all flags in the subtree
    pub fn flags(&self, arena: &IrArena, resolver: &ReferenceResolver, node: NodeRef) -> ModifiesStateFlags {
        self.modifies_state(arena, resolver, node)
            .iter()
            .fold(ModifiesStateFlags::empty(), |acc, (_, flags)| acc | *flags)
    }

    /// Number of memoized summaries
    pub fn len(&self) -> usize {
        self.cache.lock().len()
    }

    pub fn is_empty(&self) -> bool {
        self.cache.lock().is_empty()
    }

    /// Forget every summary
    pub fn clear(&self) {
        self.cache.lock().clear();
    }
}

/// Effects introduced by the node itself
fn own_effects(arena: &IrArena, resolver: &ReferenceResolver, node: NodeRef) -> EffectSet {
    let mut effects = EffectSet::new();
    let Some(n) = arena.get(node) else {
        return effects;
    };

    let flags = match &n.kind {
        IrKind::Statement(Statement::Emit { .. }) => ModifiesStateFlags::EMITS,
        IrKind::Statement(Statement::InlineAssembly) => {
            tracing::debug!("inline assembly at {} not summarized", node);
            ModifiesStateFlags::empty()
        }
        IrKind::Expression(expression) => match &expression.kind {
            ExpressionKind::Assignment { left, .. } => {
                if arena.is_ref_to_state_variable(resolver, *left) {
                    ModifiesStateFlags::MODIFIES_STATE_VAR
                } else {
                    ModifiesStateFlags::empty()
                }
            }
            ExpressionKind::UnaryOperation {
                operator,
                sub_expression,
                ..
            } if matches!(operator.as_str(), "++" | "--" | "delete") => {
                if arena.is_ref_to_state_variable(resolver, *sub_expression) {
                    ModifiesStateFlags::MODIFIES_STATE_VAR
                } else {
                    ModifiesStateFlags::empty()
                }
            }
            ExpressionKind::FunctionCallOptions { names, .. } => {
                if names.iter().any(|name| name == "value") {
                    ModifiesStateFlags::SENDS_ETHER
                } else {
                    ModifiesStateFlags::empty()
                }
            }
            ExpressionKind::FunctionCall { expression, .. } => call_effects(arena, resolver, node, *expression),
            _ => ModifiesStateFlags::empty(),
        },
        _ => ModifiesStateFlags::empty(),
    };

    if !flags.is_empty() {
        effects.insert((node, flags));
    }
    effects
}

fn call_effects(
    arena: &IrArena,
    resolver: &ReferenceResolver,
    call: NodeRef,
    callee: NodeRef,
) -> ModifiesStateFlags {
    match arena.function_called_global(call) {
        Some(GlobalSymbol::AddressTransfer) | Some(GlobalSymbol::AddressSend) => {
            return ModifiesStateFlags::SENDS_ETHER
        }
        Some(GlobalSymbol::AddressCall) => return ModifiesStateFlags::PERFORMS_CALL,
        Some(GlobalSymbol::AddressDelegatecall) => return ModifiesStateFlags::PERFORMS_DELEGATECALL,
        Some(GlobalSymbol::Selfdestruct) | Some(GlobalSymbol::Suicide) => {
            return ModifiesStateFlags::SELFDESTRUCTS
        }
        Some(_) => return ModifiesStateFlags::empty(),
        None => {}
    }

    // look through `{value: ...}` options
    let mut callee = callee;
    while let Some(ExpressionKind::FunctionCallOptions { expression, .. }) =
        arena.get(callee).and_then(|n| n.as_expression()).map(|e| &e.kind)
    {
        callee = *expression;
    }
    let Some(callee_expression) = arena.get(callee).and_then(|n| n.as_expression()) else {
        return ModifiesStateFlags::empty();
    };

    let external = match &callee_expression.kind {
        ExpressionKind::New { .. } => return ModifiesStateFlags::DEPLOYS_CONTRACT,
        ExpressionKind::MemberAccess { expression, .. } => arena
            .get(*expression)
            .and_then(|n| n.as_expression())
            .and_then(|e| e.type_identifier.as_deref())
            .map(|t| t.starts_with("t_contract"))
            .unwrap_or(false),
        ExpressionKind::Identifier { .. } => false,
        _ => return ModifiesStateFlags::empty(),
    };

    let function = match arena.referenced_declaration(resolver, callee) {
        Ok(Some(declaration)) => declaration,
        Ok(None) => return ModifiesStateFlags::empty(),
        Err(err) => {
            tracing::debug!("callee of {} not resolved: {}", call, err);
            return ModifiesStateFlags::empty();
        }
    };
    let Some(DeclarationKind::Function(definition)) = arena.declaration(function).map(|d| &d.kind) else {
        return ModifiesStateFlags::empty();
    };

    let mut flags = ModifiesStateFlags::empty();
    let mutating = matches!(
        definition.state_mutability,
        StateMutability::Payable | StateMutability::Nonpayable
    );
    if external && mutating {
        flags |= ModifiesStateFlags::PERFORMS_CALL;
    }
    if !definition.implemented {
        match definition.state_mutability {
            StateMutability::Payable => flags |= ModifiesStateFlags::CALLS_UNIMPLEMENTED_PAYABLE_FUNCTION,
            StateMutability::Nonpayable => {
                flags |= ModifiesStateFlags::CALLS_UNIMPLEMENTED_NONPAYABLE_FUNCTION
            }
            StateMutability::View | StateMutability::Pure => {}
        }
    }
    flags
}
