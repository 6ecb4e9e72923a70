//! Serde model of the compiler's JSON AST (representative subset)

use serde::Deserialize;

use super::enums::{
    ContractKind, FunctionKind, Mutability, StateMutability, StorageLocation, Visibility,
};
use super::{AstNodeId, Src};

/// Type information attached to expressions and variables
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RawTypeDescriptions {
    /// Machine-readable type, e.g. `t_address_payable`
    #[serde(default)]
    pub type_identifier: Option<String>,
    /// Human-readable type, e.g. `address payable`
    #[serde(default)]
    pub type_string: Option<String>,
}

// =============================================================================
// SOURCE UNIT AND DECLARATIONS
// =============================================================================

/// Root of one file's AST
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RawSourceUnit {
    pub id: AstNodeId,
    pub src: Src,
    #[serde(default)]
    pub absolute_path: String,
    #[serde(default)]
    pub license: Option<String>,
    #[serde(default)]
    pub nodes: Vec<RawSourceUnitNode>,
}

/// Top-level items of a source unit
#[derive(Debug, Clone, Deserialize)]
#[serde(tag = "nodeType")]
pub enum RawSourceUnitNode {
    ContractDefinition(RawContractDefinition),
    FunctionDefinition(RawFunctionDefinition),
    StructDefinition(RawStructDefinition),
    EnumDefinition(RawEnumDefinition),
    ErrorDefinition(RawErrorDefinition),
    EventDefinition(RawEventDefinition),
    VariableDeclaration(RawVariableDeclaration),
    /// Pragmas, imports, using-for directives and other unmodelled items
    #[serde(other)]
    Other,
}

/// Members of a contract
#[derive(Debug, Clone, Deserialize)]
#[serde(tag = "nodeType")]
pub enum RawContractNode {
    FunctionDefinition(RawFunctionDefinition),
    ModifierDefinition(RawModifierDefinition),
    StructDefinition(RawStructDefinition),
    EnumDefinition(RawEnumDefinition),
    EventDefinition(RawEventDefinition),
    ErrorDefinition(RawErrorDefinition),
    VariableDeclaration(RawVariableDeclaration),
    #[serde(other)]
    Other,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RawContractDefinition {
    pub id: AstNodeId,
    pub src: Src,
    pub name: String,
    #[serde(default)]
    pub name_location: Option<Src>,
    #[serde(default)]
    pub contract_kind: ContractKind,
    #[serde(rename = "abstract", default)]
    pub is_abstract: bool,
    #[serde(default)]
    pub base_contracts: Vec<RawInheritanceSpecifier>,
    #[serde(default)]
    pub linearized_base_contracts: Vec<AstNodeId>,
    #[serde(default)]
    pub nodes: Vec<RawContractNode>,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RawFunctionDefinition {
    pub id: AstNodeId,
    pub src: Src,
    pub name: String,
    #[serde(default)]
    pub name_location: Option<Src>,
    #[serde(default)]
    pub kind: FunctionKind,
    #[serde(default)]
    pub visibility: Visibility,
    #[serde(default)]
    pub state_mutability: StateMutability,
    #[serde(default)]
    pub implemented: bool,
    #[serde(rename = "virtual", default)]
    pub is_virtual: bool,
    pub parameters: RawParameterList,
    pub return_parameters: RawParameterList,
    #[serde(default)]
    pub modifiers: Vec<RawModifierInvocation>,
    #[serde(default)]
    pub overrides: Option<RawOverrideSpecifier>,
    #[serde(default)]
    pub body: Option<RawBlock>,
    #[serde(default)]
    pub base_functions: Vec<AstNodeId>,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RawModifierDefinition {
    pub id: AstNodeId,
    pub src: Src,
    pub name: String,
    #[serde(default)]
    pub name_location: Option<Src>,
    #[serde(default)]
    pub visibility: Visibility,
    #[serde(rename = "virtual", default)]
    pub is_virtual: bool,
    pub parameters: RawParameterList,
    #[serde(default)]
    pub overrides: Option<RawOverrideSpecifier>,
    #[serde(default)]
    pub body: Option<RawBlock>,
    #[serde(default)]
    pub base_modifiers: Vec<AstNodeId>,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RawStructDefinition {
    pub id: AstNodeId,
    pub src: Src,
    pub name: String,
    #[serde(default)]
    pub name_location: Option<Src>,
    #[serde(default)]
    pub canonical_name: Option<String>,
    #[serde(default)]
    pub visibility: Visibility,
    #[serde(default)]
    pub members: Vec<RawVariableDeclaration>,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RawEnumDefinition {
    pub id: AstNodeId,
    pub src: Src,
    pub name: String,
    #[serde(default)]
    pub name_location: Option<Src>,
    #[serde(default)]
    pub canonical_name: Option<String>,
    #[serde(default)]
    pub members: Vec<RawEnumValue>,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RawEnumValue {
    pub id: AstNodeId,
    pub src: Src,
    pub name: String,
    #[serde(default)]
    pub name_location: Option<Src>,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RawEventDefinition {
    pub id: AstNodeId,
    pub src: Src,
    pub name: String,
    #[serde(default)]
    pub name_location: Option<Src>,
    #[serde(default)]
    pub anonymous: bool,
    pub parameters: RawParameterList,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RawErrorDefinition {
    pub id: AstNodeId,
    pub src: Src,
    pub name: String,
    #[serde(default)]
    pub name_location: Option<Src>,
    pub parameters: RawParameterList,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RawVariableDeclaration {
    pub id: AstNodeId,
    pub src: Src,
    pub name: String,
    #[serde(default)]
    pub name_location: Option<Src>,
    #[serde(default)]
    pub type_name: Option<RawTypeName>,
    #[serde(default)]
    pub type_descriptions: RawTypeDescriptions,
    #[serde(default)]
    pub state_variable: bool,
    #[serde(default)]
    pub constant: bool,
    #[serde(default)]
    pub mutability: Mutability,
    #[serde(default)]
    pub visibility: Visibility,
    #[serde(default)]
    pub storage_location: StorageLocation,
    #[serde(default)]
    pub indexed: bool,
    #[serde(default)]
    pub value: Option<RawExpression>,
}

// =============================================================================
// META NODES
// =============================================================================

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RawParameterList {
    pub id: AstNodeId,
    pub src: Src,
    #[serde(default)]
    pub parameters: Vec<RawVariableDeclaration>,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RawIdentifierPath {
    pub id: AstNodeId,
    pub src: Src,
    pub name: String,
    pub referenced_declaration: AstNodeId,
}

/// Base of an inheritance specifier: a path (0.8+) or a type name (older)
#[derive(Debug, Clone, Deserialize)]
#[serde(tag = "nodeType")]
pub enum RawBaseName {
    IdentifierPath(RawIdentifierPath),
    UserDefinedTypeName(RawUserDefinedTypeName),
}

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RawInheritanceSpecifier {
    pub id: AstNodeId,
    pub src: Src,
    pub base_name: RawBaseName,
    #[serde(default)]
    pub arguments: Option<Vec<RawExpression>>,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RawModifierInvocation {
    pub id: AstNodeId,
    pub src: Src,
    pub modifier_name: RawIdentifierPath,
    #[serde(default)]
    pub arguments: Option<Vec<RawExpression>>,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RawOverrideSpecifier {
    pub id: AstNodeId,
    pub src: Src,
    #[serde(default)]
    pub overrides: Vec<RawIdentifierPath>,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RawTryCatchClause {
    pub id: AstNodeId,
    pub src: Src,
    #[serde(default)]
    pub error_name: String,
    #[serde(default)]
    pub parameters: Option<RawParameterList>,
    pub block: RawBlock,
}

// =============================================================================
// STATEMENTS
// =============================================================================

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RawBlock {
    pub id: AstNodeId,
    pub src: Src,
    #[serde(default)]
    pub statements: Vec<RawStatement>,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(tag = "nodeType")]
pub enum RawStatement {
    Block(RawBlock),
    UncheckedBlock(RawBlock),
    ExpressionStatement(RawExpressionStatement),
    VariableDeclarationStatement(RawVariableDeclarationStatement),
    IfStatement(RawIfStatement),
    ForStatement(RawForStatement),
    WhileStatement(RawWhileStatement),
    DoWhileStatement(RawWhileStatement),
    Break(RawSimpleStatement),
    Continue(RawSimpleStatement),
    PlaceholderStatement(RawSimpleStatement),
    InlineAssembly(RawSimpleStatement),
    Return(RawReturn),
    RevertStatement(RawRevertStatement),
    EmitStatement(RawEmitStatement),
    TryStatement(RawTryStatement),
    #[serde(other)]
    Other,
}

/// Statement without modelled fields
#[derive(Debug, Clone, Deserialize)]
pub struct RawSimpleStatement {
    pub id: AstNodeId,
    pub src: Src,
}

#[derive(Debug, Clone, Deserialize)]
pub struct RawExpressionStatement {
    pub id: AstNodeId,
    pub src: Src,
    pub expression: RawExpression,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RawVariableDeclarationStatement {
    pub id: AstNodeId,
    pub src: Src,
    #[serde(default)]
    pub declarations: Vec<Option<RawVariableDeclaration>>,
    #[serde(default)]
    pub initial_value: Option<RawExpression>,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RawIfStatement {
    pub id: AstNodeId,
    pub src: Src,
    pub condition: RawExpression,
    pub true_body: Box<RawStatement>,
    #[serde(default)]
    pub false_body: Option<Box<RawStatement>>,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RawForStatement {
    pub id: AstNodeId,
    pub src: Src,
    #[serde(default)]
    pub initialization_expression: Option<Box<RawStatement>>,
    #[serde(default)]
    pub condition: Option<RawExpression>,
    #[serde(default)]
    pub loop_expression: Option<Box<RawStatement>>,
    pub body: Box<RawStatement>,
}

/// Shared shape of `while` and `do ... while`
#[derive(Debug, Clone, Deserialize)]
pub struct RawWhileStatement {
    pub id: AstNodeId,
    pub src: Src,
    pub condition: RawExpression,
    pub body: Box<RawStatement>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct RawReturn {
    pub id: AstNodeId,
    pub src: Src,
    #[serde(default)]
    pub expression: Option<RawExpression>,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RawRevertStatement {
    pub id: AstNodeId,
    pub src: Src,
    pub error_call: RawExpression,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RawEmitStatement {
    pub id: AstNodeId,
    pub src: Src,
    pub event_call: RawExpression,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RawTryStatement {
    pub id: AstNodeId,
    pub src: Src,
    pub external_call: RawExpression,
    #[serde(default)]
    pub clauses: Vec<RawTryCatchClause>,
}

// =============================================================================
// EXPRESSIONS
// =============================================================================

#[derive(Debug, Clone, Deserialize)]
#[serde(tag = "nodeType")]
pub enum RawExpression {
    Assignment(RawAssignment),
    BinaryOperation(RawBinaryOperation),
    UnaryOperation(RawUnaryOperation),
    Conditional(RawConditional),
    FunctionCall(RawFunctionCall),
    FunctionCallOptions(RawFunctionCallOptions),
    Identifier(RawIdentifier),
    MemberAccess(RawMemberAccess),
    IndexAccess(RawIndexAccess),
    IndexRangeAccess(RawIndexRangeAccess),
    Literal(RawLiteral),
    TupleExpression(RawTupleExpression),
    NewExpression(RawNewExpression),
    ElementaryTypeNameExpression(RawElementaryTypeNameExpression),
    #[serde(other)]
    Other,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RawAssignment {
    pub id: AstNodeId,
    pub src: Src,
    pub operator: String,
    pub left_hand_side: Box<RawExpression>,
    pub right_hand_side: Box<RawExpression>,
    #[serde(default)]
    pub type_descriptions: RawTypeDescriptions,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RawBinaryOperation {
    pub id: AstNodeId,
    pub src: Src,
    pub operator: String,
    pub left_expression: Box<RawExpression>,
    pub right_expression: Box<RawExpression>,
    #[serde(default)]
    pub type_descriptions: RawTypeDescriptions,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RawUnaryOperation {
    pub id: AstNodeId,
    pub src: Src,
    pub operator: String,
    #[serde(default)]
    pub prefix: bool,
    pub sub_expression: Box<RawExpression>,
    #[serde(default)]
    pub type_descriptions: RawTypeDescriptions,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RawConditional {
    pub id: AstNodeId,
    pub src: Src,
    pub condition: Box<RawExpression>,
    pub true_expression: Box<RawExpression>,
    pub false_expression: Box<RawExpression>,
    #[serde(default)]
    pub type_descriptions: RawTypeDescriptions,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RawFunctionCall {
    pub id: AstNodeId,
    pub src: Src,
    pub expression: Box<RawExpression>,
    #[serde(default)]
    pub arguments: Vec<RawExpression>,
    #[serde(default)]
    pub names: Vec<String>,
    #[serde(default)]
    pub kind: String,
    #[serde(default)]
    pub type_descriptions: RawTypeDescriptions,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RawFunctionCallOptions {
    pub id: AstNodeId,
    pub src: Src,
    pub expression: Box<RawExpression>,
    #[serde(default)]
    pub names: Vec<String>,
    #[serde(default)]
    pub options: Vec<RawExpression>,
    #[serde(default)]
    pub type_descriptions: RawTypeDescriptions,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RawIdentifier {
    pub id: AstNodeId,
    pub src: Src,
    pub name: String,
    #[serde(default)]
    pub referenced_declaration: Option<AstNodeId>,
    #[serde(default)]
    pub type_descriptions: RawTypeDescriptions,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RawMemberAccess {
    pub id: AstNodeId,
    pub src: Src,
    pub expression: Box<RawExpression>,
    pub member_name: String,
    #[serde(default)]
    pub referenced_declaration: Option<AstNodeId>,
    #[serde(default)]
    pub type_descriptions: RawTypeDescriptions,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RawIndexAccess {
    pub id: AstNodeId,
    pub src: Src,
    pub base_expression: Box<RawExpression>,
    #[serde(default)]
    pub index_expression: Option<Box<RawExpression>>,
    #[serde(default)]
    pub type_descriptions: RawTypeDescriptions,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RawIndexRangeAccess {
    pub id: AstNodeId,
    pub src: Src,
    pub base_expression: Box<RawExpression>,
    #[serde(default)]
    pub start_expression: Option<Box<RawExpression>>,
    #[serde(default)]
    pub end_expression: Option<Box<RawExpression>>,
    #[serde(default)]
    pub type_descriptions: RawTypeDescriptions,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RawLiteral {
    pub id: AstNodeId,
    pub src: Src,
    #[serde(default)]
    pub kind: String,
    #[serde(default)]
    pub value: Option<String>,
    #[serde(default)]
    pub type_descriptions: RawTypeDescriptions,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RawTupleExpression {
    pub id: AstNodeId,
    pub src: Src,
    #[serde(default)]
    pub components: Vec<Option<RawExpression>>,
    #[serde(default)]
    pub is_inline_array: bool,
    #[serde(default)]
    pub type_descriptions: RawTypeDescriptions,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RawNewExpression {
    pub id: AstNodeId,
    pub src: Src,
    pub type_name: RawTypeName,
    #[serde(default)]
    pub type_descriptions: RawTypeDescriptions,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RawElementaryTypeNameExpression {
    pub id: AstNodeId,
    pub src: Src,
    pub type_name: RawTypeName,
    #[serde(default)]
    pub type_descriptions: RawTypeDescriptions,
}

// =============================================================================
// TYPE NAMES
// =============================================================================

#[derive(Debug, Clone, Deserialize)]
#[serde(tag = "nodeType")]
pub enum RawTypeName {
    ElementaryTypeName(RawElementaryTypeName),
    UserDefinedTypeName(RawUserDefinedTypeName),
    Mapping(RawMapping),
    ArrayTypeName(RawArrayTypeName),
    FunctionTypeName(RawFunctionTypeName),
}

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RawElementaryTypeName {
    pub id: AstNodeId,
    pub src: Src,
    pub name: String,
    #[serde(default)]
    pub state_mutability: Option<StateMutability>,
    #[serde(default)]
    pub type_descriptions: RawTypeDescriptions,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RawUserDefinedTypeName {
    pub id: AstNodeId,
    pub src: Src,
    #[serde(default)]
    pub name: Option<String>,
    #[serde(default)]
    pub path_node: Option<RawIdentifierPath>,
    pub referenced_declaration: AstNodeId,
    #[serde(default)]
    pub type_descriptions: RawTypeDescriptions,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RawMapping {
    pub id: AstNodeId,
    pub src: Src,
    pub key_type: Box<RawTypeName>,
    pub value_type: Box<RawTypeName>,
    #[serde(default)]
    pub type_descriptions: RawTypeDescriptions,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RawArrayTypeName {
    pub id: AstNodeId,
    pub src: Src,
    pub base_type: Box<RawTypeName>,
    #[serde(default)]
    pub length: Option<Box<RawExpression>>,
    #[serde(default)]
    pub type_descriptions: RawTypeDescriptions,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RawFunctionTypeName {
    pub id: AstNodeId,
    pub src: Src,
    #[serde(default)]
    pub visibility: Visibility,
    #[serde(default)]
    pub state_mutability: StateMutability,
    pub parameter_types: RawParameterList,
    pub return_parameter_types: RawParameterList,
    #[serde(default)]
    pub type_descriptions: RawTypeDescriptions,
}
