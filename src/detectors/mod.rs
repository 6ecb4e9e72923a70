//! # Detectors
//!
//! A detector is a [`Visitor`] with per-node-kind callbacks plus a final
//! [`Detector::report`]. [`run_detectors`] walks every tree once, pre-order,
//! and dispatches each node to every detector. A detector that returns an
//! error or panics is dropped from the run and listed in the report's
//! failures; the other detectors are unaffected.
//!
//! ```text
//! preorder(source units) ──▶ dispatch(kind) ──▶ visit_* (per detector)
//!                                                   │
//!                                  report() ◀───────┘ after traversal
//! ```

pub mod locked_ether;

pub use locked_ether::LockedEtherDetector;

use std::collections::BTreeMap;
use std::panic::{catch_unwind, AssertUnwindSafe};

use serde::Serialize;

use crate::analysis::AnalysisContext;
use crate::config::DetectorsConfig;
use crate::error::{Error, Result};
use crate::ir::{NodeKind, NodeRef};

macro_rules! visitor {
    ($($kind:ident => $method:ident),* $(,)?) => {
        /// Per-node-kind callbacks, each a no-op unless overridden
        pub trait Visitor {
            $(
                fn $method(&mut self, _ctx: &AnalysisContext<'_>, _node: NodeRef) -> Result<()> {
                    Ok(())
                }
            )*
        }

        /// Call the callback of `visitor` matching `kind`
        pub fn dispatch<V: Visitor + ?Sized>(
            visitor: &mut V,
            ctx: &AnalysisContext<'_>,
            kind: NodeKind,
            node: NodeRef,
        ) -> Result<()> {
            match kind {
                $(NodeKind::$kind => visitor.$method(ctx, node),)*
            }
        }
    };
}

visitor! {
    ContractDefinition => visit_contract_definition,
    FunctionDefinition => visit_function_definition,
    ModifierDefinition => visit_modifier_definition,
    StructDefinition => visit_struct_definition,
    EnumDefinition => visit_enum_definition,
    EnumValue => visit_enum_value,
    EventDefinition => visit_event_definition,
    ErrorDefinition => visit_error_definition,
    VariableDeclaration => visit_variable_declaration,
    Block => visit_block,
    UncheckedBlock => visit_unchecked_block,
    ExpressionStatement => visit_expression_statement,
    VariableDeclarationStatement => visit_variable_declaration_statement,
    IfStatement => visit_if_statement,
    ForStatement => visit_for_statement,
    WhileStatement => visit_while_statement,
    DoWhileStatement => visit_do_while_statement,
    Break => visit_break,
    Continue => visit_continue,
    Return => visit_return,
    RevertStatement => visit_revert_statement,
    EmitStatement => visit_emit_statement,
    PlaceholderStatement => visit_placeholder_statement,
    TryStatement => visit_try_statement,
    InlineAssembly => visit_inline_assembly,
    Assignment => visit_assignment,
    BinaryOperation => visit_binary_operation,
    UnaryOperation => visit_unary_operation,
    Conditional => visit_conditional,
    FunctionCall => visit_function_call,
    FunctionCallOptions => visit_function_call_options,
    Identifier => visit_identifier,
    MemberAccess => visit_member_access,
    IndexAccess => visit_index_access,
    IndexRangeAccess => visit_index_range_access,
    Literal => visit_literal,
    TupleExpression => visit_tuple_expression,
    NewExpression => visit_new_expression,
    ElementaryTypeNameExpression => visit_elementary_type_name_expression,
    ElementaryTypeName => visit_elementary_type_name,
    UserDefinedTypeName => visit_user_defined_type_name,
    Mapping => visit_mapping,
    ArrayTypeName => visit_array_type_name,
    FunctionTypeName => visit_function_type_name,
    SourceUnit => visit_source_unit,
    ParameterList => visit_parameter_list,
    IdentifierPath => visit_identifier_path,
    InheritanceSpecifier => visit_inheritance_specifier,
    ModifierInvocation => visit_modifier_invocation,
    OverrideSpecifier => visit_override_specifier,
    TryCatchClause => visit_try_catch_clause,
}

/// A visitor that reports findings once the traversal is done
pub trait Detector: Visitor + Send {
    /// Registry name
    fn name(&self) -> &'static str;

    /// Findings accumulated over the traversal
    fn report(&mut self, ctx: &AnalysisContext<'_>) -> Result<Vec<Finding>>;
}

/// Secondary location supporting a finding
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Evidence {
    pub node: NodeRef,
    pub message: String,
}

/// One detector result
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Finding {
    /// Node the finding is about
    pub primary: NodeRef,
    pub message: String,
    /// Supporting locations, in order
    pub evidence: Vec<Evidence>,
}

impl Finding {
    pub fn new(primary: NodeRef, message: impl Into<String>) -> Self {
        Self {
            primary,
            message: message.into(),
            evidence: Vec::new(),
        }
    }

    pub fn with_evidence(mut self, node: NodeRef, message: impl Into<String>) -> Self {
        self.evidence.push(Evidence {
            node,
            message: message.into(),
        });
        self
    }
}

/// A detector dropped from a run
#[derive(Debug)]
pub struct DetectorFailure {
    pub detector: String,
    pub error: Error,
}

/// Findings per detector name, plus the detectors that failed
#[derive(Debug, Default)]
pub struct DetectionReport {
    pub findings: BTreeMap<String, Vec<Finding>>,
    pub failures: Vec<DetectorFailure>,
}

impl DetectionReport {
    /// All findings, ordered by detector name
    pub fn all_findings(&self) -> impl Iterator<Item = (&str, &Finding)> {
        self.findings
            .iter()
            .flat_map(|(name, findings)| findings.iter().map(move |f| (name.as_str(), f)))
    }

    pub fn len(&self) -> usize {
        self.findings.values().map(Vec::len).sum()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

type DetectorConstructor = Box<dyn Fn() -> Box<dyn Detector> + Send + Sync>;

/// Named detector constructors
pub struct DetectorRegistry {
    constructors: BTreeMap<String, DetectorConstructor>,
}

impl std::fmt::Debug for DetectorRegistry {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("DetectorRegistry")
            .field("detectors", &self.names())
            .finish()
    }
}

impl Default for DetectorRegistry {
    fn default() -> Self {
        Self::new()
    }
}

impl DetectorRegistry {
    /// Registry with the built-in detectors
    pub fn new() -> Self {
        let mut registry = Self::empty();
        registry.register(locked_ether::NAME, || Box::new(LockedEtherDetector::default()));
        registry
    }

    /// Create empty registry (for testing)
    pub fn empty() -> Self {
        Self {
            constructors: BTreeMap::new(),
        }
    }

    /// Register a constructor, replacing any previous one of the same name
    pub fn register<F>(&mut self, name: impl Into<String>, constructor: F)
    where
        F: Fn() -> Box<dyn Detector> + Send + Sync + 'static,
    {
        self.constructors.insert(name.into(), Box::new(constructor));
    }

    /// Registered names, sorted
    pub fn names(&self) -> Vec<&str> {
        self.constructors.keys().map(String::as_str).collect()
    }

    /// Fresh instances of the detectors selected by `config`
    pub fn instantiate(&self, config: &DetectorsConfig) -> Vec<Box<dyn Detector>> {
        self.constructors
            .iter()
            .filter(|(name, _)| config.is_enabled(name))
            .map(|(_, constructor)| constructor())
            .collect()
    }
}

/// Run `detectors` over the trees rooted at `roots`
pub fn run_detectors(
    ctx: &AnalysisContext<'_>,
    roots: &[NodeRef],
    detectors: Vec<Box<dyn Detector>>,
) -> DetectionReport {
    let mut report = DetectionReport::default();
    let mut active = detectors;

    for root in roots {
        for node in ctx.arena.iter(*root) {
            let Some(kind) = ctx.arena.get(node).map(|n| n.kind()) else {
                continue;
            };
            let mut index = 0;
            while index < active.len() {
                let detector = &mut active[index];
                match guarded(detector.name(), || dispatch(detector.as_mut(), ctx, kind, node)) {
                    Ok(()) => index += 1,
                    Err(error) => {
                        let name = active.remove(index).name().to_string();
                        report.failures.push(DetectorFailure { detector: name, error });
                    }
                }
            }
        }
    }

    for mut detector in active {
        let name = detector.name();
        match guarded(name, || detector.report(ctx)) {
            Ok(findings) => {
                tracing::debug!("detector {} reported {} findings", name, findings.len());
                report.findings.insert(name.to_string(), findings);
            }
            Err(error) => report.failures.push(DetectorFailure {
                detector: name.to_string(),
                error,
            }),
        }
    }
    report
}

/// Run one detector callback, turning a panic into a detector error
fn guarded<T>(name: &str, f: impl FnOnce() -> Result<T>) -> Result<T> {
    let result = match catch_unwind(AssertUnwindSafe(f)) {
        Ok(result) => result,
        Err(payload) => {
            let message = payload
                .downcast_ref::<&str>()
                .map(|s| s.to_string())
                .or_else(|| payload.downcast_ref::<String>().cloned())
                .unwrap_or_else(|| "panic".to_string());
            Err(Error::detector(name, message))
        }
    };
    if let Err(err) = &result {
        tracing::warn!("detector {} failed: {}", name, err);
    }
    result
}
