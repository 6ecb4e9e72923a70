//! Shared fixtures: Solidity sources paired with hand-written compiler ASTs.
//!
//! Every `src` string is computed from the source text, so the byte ranges
//! the IR builder validates always match the text.

#![allow(dead_code)]

use std::path::PathBuf;

use serde_json::{json, Value};
use solir::ast::{CompilationUnitInput, CuHash, SourceInput};

// =============================================================================
// SOURCE HELPERS
// =============================================================================

pub struct Source {
    pub path: PathBuf,
    pub text: String,
}

impl Source {
    pub fn new(path: &str, text: &str) -> Self {
        Self {
            path: PathBuf::from(path),
            text: text.to_string(),
        }
    }

    /// Byte offset of the first occurrence of `needle`
    pub fn offset(&self, needle: &str) -> usize {
        self.text
            .find(needle)
            .unwrap_or_else(|| panic!("{:?} not found in {}", needle, self.path.display()))
    }

    /// `src` of the first occurrence of `needle`
    pub fn src(&self, needle: &str) -> String {
        self.src_in(needle, needle)
    }

    /// `src` of `needle` inside the first occurrence of `anchor`
    pub fn src_in(&self, anchor: &str, needle: &str) -> String {
        let start = self.offset(anchor);
        let inner = self.text[start..start + anchor.len()]
            .find(needle)
            .unwrap_or_else(|| panic!("{:?} not found in {:?}", needle, anchor));
        format!("{}:{}:0", start + inner, needle.len())
    }

    /// Empty `src` right after the first occurrence of `anchor`
    pub fn empty_after(&self, anchor: &str) -> String {
        format!("{}:0:0", self.offset(anchor) + anchor.len())
    }

    pub fn whole(&self) -> String {
        format!("0:{}:0", self.text.len())
    }

    /// Narrow lookups to the first occurrence of `anchor`
    pub fn scope(&self, anchor: &str) -> Scope<'_> {
        let start = self.offset(anchor);
        Scope {
            start,
            text: &self.text[start..start + anchor.len()],
        }
    }

    pub fn input(&self, ast: Value) -> SourceInput {
        SourceInput {
            path: self.path.clone(),
            source: self.text.as_bytes().to_vec(),
            ast,
        }
    }
}

/// A slice of a [`Source`], for needles that repeat across the file
pub struct Scope<'a> {
    start: usize,
    text: &'a str,
}

impl<'a> Scope<'a> {
    fn offset(&self, needle: &str) -> usize {
        let inner = self
            .text
            .find(needle)
            .unwrap_or_else(|| panic!("{:?} not found in {:?}", needle, self.text));
        self.start + inner
    }

    pub fn src(&self, needle: &str) -> String {
        format!("{}:{}:0", self.offset(needle), needle.len())
    }

    pub fn scope(&self, needle: &str) -> Scope<'a> {
        let inner = self.offset(needle) - self.start;
        Scope {
            start: self.start + inner,
            text: &self.text[inner..inner + needle.len()],
        }
    }

    pub fn empty_after(&self, needle: &str) -> String {
        format!("{}:0:0", self.offset(needle) + needle.len())
    }

    pub fn whole(&self) -> String {
        format!("{}:{}:0", self.start, self.text.len())
    }
}

pub fn unit(sources: Vec<SourceInput>) -> CompilationUnitInput {
    let hash = CuHash::from_sources(sources.iter().map(|s| (s.path.as_path(), s.source.as_slice())));
    CompilationUnitInput { hash, sources }
}

fn uint256(src: String, id: i64) -> Value {
    json!({
        "nodeType": "ElementaryTypeName",
        "id": id,
        "src": src,
        "name": "uint256",
        "typeDescriptions": {"typeIdentifier": "t_uint256", "typeString": "uint256"}
    })
}

fn empty_parameters(src: String, id: i64) -> Value {
    json!({"nodeType": "ParameterList", "id": id, "src": src, "parameters": []})
}

// =============================================================================
// Lib.sol / Main.sol / Other.sol: two units sharing Lib.sol
// =============================================================================

pub const LIB_PATH: &str = "/project/contracts/Lib.sol";
pub const MAIN_PATH: &str = "/project/contracts/Main.sol";
pub const OTHER_PATH: &str = "/project/contracts/Other.sol";

pub const LIB_TEXT: &str = "pragma solidity ^0.8.0;

contract A {
    enum E { V }
    uint256 public total;
}
";

pub const MAIN_TEXT: &str = "import \"./Lib.sol\";

contract B is A {
    A.E.V marker;

    function set() public {
        total = 1;
    }
}
";

pub const OTHER_TEXT: &str = "import \"./Lib.sol\";

contract C is A {
    function bump() public {
        total += 1;
    }
}
";

/// Ids of Lib.sol nodes, relative to the unit's base id
pub mod lib_ids {
    pub const CONTRACT_A: i64 = 2;
    pub const ENUM_E: i64 = 3;
    pub const VALUE_V: i64 = 4;
    pub const TOTAL: i64 = 5;
    pub const SOURCE_UNIT: i64 = 7;
}

/// Ids of Main.sol nodes, relative to the unit's base id
pub mod main_ids {
    pub const CONTRACT_B: i64 = 11;
    pub const PATH_A_E_V: i64 = 16;
    pub const FUNCTION_SET: i64 = 17;
    pub const IDENTIFIER_TOTAL: i64 = 23;
    pub const SOURCE_UNIT: i64 = 25;
}

pub fn lib_sol(base: i64) -> SourceInput {
    let s = Source::new(LIB_PATH, LIB_TEXT);
    let ast = json!({
        "nodeType": "SourceUnit",
        "id": base + lib_ids::SOURCE_UNIT,
        "src": s.whole(),
        "absolutePath": "contracts/Lib.sol",
        "license": "MIT",
        "nodes": [
            {"nodeType": "PragmaDirective", "id": base + 1, "src": s.src("pragma solidity ^0.8.0;"), "literals": ["solidity", "^", "0.8", ".0"]},
            {
                "nodeType": "ContractDefinition",
                "id": base + lib_ids::CONTRACT_A,
                "src": s.src("contract A {\n    enum E { V }\n    uint256 public total;\n}"),
                "name": "A",
                "nameLocation": s.src_in("contract A", "A"),
                "contractKind": "contract",
                "abstract": false,
                "baseContracts": [],
                "linearizedBaseContracts": [base + lib_ids::CONTRACT_A],
                "nodes": [
                    {
                        "nodeType": "EnumDefinition",
                        "id": base + lib_ids::ENUM_E,
                        "src": s.src("enum E { V }"),
                        "name": "E",
                        "nameLocation": s.src_in("enum E", "E"),
                        "canonicalName": "A.E",
                        "members": [
                            {"nodeType": "EnumValue", "id": base + lib_ids::VALUE_V, "src": s.src_in("{ V }", "V"), "name": "V"}
                        ]
                    },
                    {
                        "nodeType": "VariableDeclaration",
                        "id": base + lib_ids::TOTAL,
                        "src": s.src("uint256 public total"),
                        "name": "total",
                        "nameLocation": s.src_in("public total", "total"),
                        "stateVariable": true,
                        "constant": false,
                        "mutability": "mutable",
                        "visibility": "public",
                        "storageLocation": "default",
                        "typeName": uint256(s.src_in("uint256 public", "uint256"), base + 6),
                        "typeDescriptions": {"typeIdentifier": "t_uint256", "typeString": "uint256"}
                    }
                ]
            }
        ]
    });
    s.input(ast)
}

pub fn main_sol(base: i64) -> SourceInput {
    let s = Source::new(MAIN_PATH, MAIN_TEXT);
    let function = "function set() public {\n        total = 1;\n    }";
    let ast = json!({
        "nodeType": "SourceUnit",
        "id": base + main_ids::SOURCE_UNIT,
        "src": s.whole(),
        "absolutePath": "contracts/Main.sol",
        "nodes": [
            {"nodeType": "ImportDirective", "id": base + 10, "src": s.src("import \"./Lib.sol\";"), "file": "./Lib.sol"},
            {
                "nodeType": "ContractDefinition",
                "id": base + main_ids::CONTRACT_B,
                "src": s.src_in(MAIN_TEXT, "contract B is A {\n    A.E.V marker;\n\n    function set() public {\n        total = 1;\n    }\n}"),
                "name": "B",
                "nameLocation": s.src_in("contract B", "B"),
                "contractKind": "contract",
                "abstract": false,
                "baseContracts": [
                    {
                        "nodeType": "InheritanceSpecifier",
                        "id": base + 12,
                        "src": s.src_in("is A", "A"),
                        "baseName": {
                            "nodeType": "IdentifierPath",
                            "id": base + 13,
                            "src": s.src_in("is A", "A"),
                            "name": "A",
                            "referencedDeclaration": base + lib_ids::CONTRACT_A
                        }
                    }
                ],
                "linearizedBaseContracts": [base + main_ids::CONTRACT_B, base + lib_ids::CONTRACT_A],
                "nodes": [
                    {
                        "nodeType": "VariableDeclaration",
                        "id": base + 14,
                        "src": s.src("A.E.V marker"),
                        "name": "marker",
                        "nameLocation": s.src_in("A.E.V marker", "marker"),
                        "stateVariable": true,
                        "visibility": "internal",
                        "typeName": {
                            "nodeType": "UserDefinedTypeName",
                            "id": base + 15,
                            "src": s.src("A.E.V"),
                            "pathNode": {
                                "nodeType": "IdentifierPath",
                                "id": base + main_ids::PATH_A_E_V,
                                "src": s.src("A.E.V"),
                                "name": "A.E.V",
                                "referencedDeclaration": base + lib_ids::VALUE_V
                            },
                            "referencedDeclaration": base + lib_ids::VALUE_V,
                            "typeDescriptions": {"typeIdentifier": "t_enum$_E_$3", "typeString": "enum A.E"}
                        },
                        "typeDescriptions": {"typeIdentifier": "t_enum$_E_$3", "typeString": "enum A.E"}
                    },
                    {
                        "nodeType": "FunctionDefinition",
                        "id": base + main_ids::FUNCTION_SET,
                        "src": s.src(function),
                        "name": "set",
                        "nameLocation": s.src_in("function set", "set"),
                        "kind": "function",
                        "visibility": "public",
                        "stateMutability": "nonpayable",
                        "implemented": true,
                        "virtual": false,
                        "parameters": empty_parameters(s.src_in("set()", "()"), base + 18),
                        "returnParameters": empty_parameters(s.empty_after("set() public"), base + 19),
                        "modifiers": [],
                        "body": {
                            "nodeType": "Block",
                            "id": base + 20,
                            "src": s.src_in(function, "{\n        total = 1;\n    }"),
                            "statements": [
                                {
                                    "nodeType": "ExpressionStatement",
                                    "id": base + 21,
                                    "src": s.src("total = 1;"),
                                    "expression": {
                                        "nodeType": "Assignment",
                                        "id": base + 22,
                                        "src": s.src("total = 1"),
                                        "operator": "=",
                                        "leftHandSide": {
                                            "nodeType": "Identifier",
                                            "id": base + main_ids::IDENTIFIER_TOTAL,
                                            "src": s.src_in("total = 1", "total"),
                                            "name": "total",
                                            "referencedDeclaration": base + lib_ids::TOTAL,
                                            "typeDescriptions": {"typeIdentifier": "t_uint256", "typeString": "uint256"}
                                        },
                                        "rightHandSide": {
                                            "nodeType": "Literal",
                                            "id": base + 24,
                                            "src": s.src_in("total = 1", "1"),
                                            "kind": "number",
                                            "value": "1",
                                            "typeDescriptions": {"typeIdentifier": "t_rational_1_by_1", "typeString": "int_const 1"}
                                        },
                                        "typeDescriptions": {"typeIdentifier": "t_uint256", "typeString": "uint256"}
                                    }
                                }
                            ]
                        }
                    }
                ]
            }
        ]
    });
    s.input(ast)
}

pub fn other_sol(base: i64) -> SourceInput {
    let s = Source::new(OTHER_PATH, OTHER_TEXT);
    let function = "function bump() public {\n        total += 1;\n    }";
    let ast = json!({
        "nodeType": "SourceUnit",
        "id": base + 21,
        "src": s.whole(),
        "absolutePath": "contracts/Other.sol",
        "nodes": [
            {"nodeType": "ImportDirective", "id": base + 9, "src": s.src("import \"./Lib.sol\";"), "file": "./Lib.sol"},
            {
                "nodeType": "ContractDefinition",
                "id": base + 10,
                "src": s.src_in(OTHER_TEXT, "contract C is A {\n    function bump() public {\n        total += 1;\n    }\n}"),
                "name": "C",
                "nameLocation": s.src_in("contract C", "C"),
                "contractKind": "contract",
                "baseContracts": [
                    {
                        "nodeType": "InheritanceSpecifier",
                        "id": base + 11,
                        "src": s.src_in("is A", "A"),
                        "baseName": {
                            "nodeType": "IdentifierPath",
                            "id": base + 12,
                            "src": s.src_in("is A", "A"),
                            "name": "A",
                            "referencedDeclaration": base + lib_ids::CONTRACT_A
                        }
                    }
                ],
                "linearizedBaseContracts": [base + 10, base + lib_ids::CONTRACT_A],
                "nodes": [
                    {
                        "nodeType": "FunctionDefinition",
                        "id": base + 13,
                        "src": s.src(function),
                        "name": "bump",
                        "nameLocation": s.src_in("function bump", "bump"),
                        "kind": "function",
                        "visibility": "public",
                        "stateMutability": "nonpayable",
                        "implemented": true,
                        "parameters": empty_parameters(s.src_in("bump()", "()"), base + 14),
                        "returnParameters": empty_parameters(s.empty_after("bump() public"), base + 15),
                        "body": {
                            "nodeType": "Block",
                            "id": base + 16,
                            "src": s.src_in(function, "{\n        total += 1;\n    }"),
                            "statements": [
                                {
                                    "nodeType": "ExpressionStatement",
                                    "id": base + 17,
                                    "src": s.src("total += 1;"),
                                    "expression": {
                                        "nodeType": "Assignment",
                                        "id": base + 18,
                                        "src": s.src("total += 1"),
                                        "operator": "+=",
                                        "leftHandSide": {
                                            "nodeType": "Identifier",
                                            "id": base + 19,
                                            "src": s.src_in("total += 1", "total"),
                                            "name": "total",
                                            "referencedDeclaration": base + lib_ids::TOTAL,
                                            "typeDescriptions": {"typeIdentifier": "t_uint256", "typeString": "uint256"}
                                        },
                                        "rightHandSide": {
                                            "nodeType": "Literal",
                                            "id": base + 20,
                                            "src": s.src_in("total += 1", "1"),
                                            "kind": "number",
                                            "value": "1"
                                        }
                                    }
                                }
                            ]
                        }
                    }
                ]
            }
        ]
    });
    s.input(ast)
}

// =============================================================================
// Ether.sol: receivers and senders of ether
// =============================================================================

pub const ETHER_PATH: &str = "/project/contracts/Ether.sol";

pub const ETHER_TEXT: &str = "contract A {
    receive() external payable {}
}

contract B {
    function pay(address x) public {
        payable(x).transfer(1);
    }
}

contract C {
    function noop() public {}
}

contract R {
    receive() external payable {
        revert(\"no\");
    }
}
";

pub mod ether_ids {
    pub const CONTRACT_A: i64 = 1;
    pub const RECEIVE_A: i64 = 2;
    pub const CONTRACT_B: i64 = 10;
    pub const FUNCTION_PAY: i64 = 11;
    pub const CONTRACT_C: i64 = 30;
    pub const CONTRACT_R: i64 = 40;
    pub const RECEIVE_R: i64 = 41;
}

pub fn ether_sol() -> SourceInput {
    let s = Source::new(ETHER_PATH, ETHER_TEXT);
    let contract_a = "contract A {\n    receive() external payable {}\n}";
    let contract_b = "contract B {\n    function pay(address x) public {\n        payable(x).transfer(1);\n    }\n}";
    let pay = "function pay(address x) public {\n        payable(x).transfer(1);\n    }";
    let contract_c = "contract C {\n    function noop() public {}\n}";
    let contract_r = "contract R {\n    receive() external payable {\n        revert(\"no\");\n    }\n}";
    let receive_r = "receive() external payable {\n        revert(\"no\");\n    }";

    let ast = json!({
        "nodeType": "SourceUnit",
        "id": 50,
        "src": s.whole(),
        "absolutePath": "contracts/Ether.sol",
        "nodes": [
            {
                "nodeType": "ContractDefinition",
                "id": ether_ids::CONTRACT_A,
                "src": s.src(contract_a),
                "name": "A",
                "nameLocation": s.src_in("contract A", "A"),
                "contractKind": "contract",
                "linearizedBaseContracts": [ether_ids::CONTRACT_A],
                "nodes": [
                    {
                        "nodeType": "FunctionDefinition",
                        "id": ether_ids::RECEIVE_A,
                        "src": s.src("receive() external payable {}"),
                        "name": "",
                        "nameLocation": s.src_in("receive() external payable {}", "receive"),
                        "kind": "receive",
                        "visibility": "external",
                        "stateMutability": "payable",
                        "implemented": true,
                        "parameters": empty_parameters(s.src_in("receive() external payable {}", "()"), 3),
                        "returnParameters": empty_parameters(s.empty_after("receive() external payable"), 4),
                        "body": {"nodeType": "Block", "id": 5, "src": s.src_in("receive() external payable {}", "{}"), "statements": []}
                    }
                ]
            },
            {
                "nodeType": "ContractDefinition",
                "id": ether_ids::CONTRACT_B,
                "src": s.src(contract_b),
                "name": "B",
                "nameLocation": s.src_in("contract B", "B"),
                "contractKind": "contract",
                "linearizedBaseContracts": [ether_ids::CONTRACT_B],
                "nodes": [
                    {
                        "nodeType": "FunctionDefinition",
                        "id": ether_ids::FUNCTION_PAY,
                        "src": s.src(pay),
                        "name": "pay",
                        "nameLocation": s.src_in("function pay", "pay"),
                        "kind": "function",
                        "visibility": "public",
                        "stateMutability": "nonpayable",
                        "implemented": true,
                        "parameters": {
                            "nodeType": "ParameterList",
                            "id": 12,
                            "src": s.src("(address x)"),
                            "parameters": [
                                {
                                    "nodeType": "VariableDeclaration",
                                    "id": 13,
                                    "src": s.src("address x"),
                                    "name": "x",
                                    "nameLocation": s.src_in("address x", "x"),
                                    "storageLocation": "default",
                                    "typeName": {
                                        "nodeType": "ElementaryTypeName",
                                        "id": 14,
                                        "src": s.src_in("address x", "address"),
                                        "name": "address",
                                        "stateMutability": "nonpayable",
                                        "typeDescriptions": {"typeIdentifier": "t_address", "typeString": "address"}
                                    },
                                    "typeDescriptions": {"typeIdentifier": "t_address", "typeString": "address"}
                                }
                            ]
                        },
                        "returnParameters": empty_parameters(s.empty_after("(address x) public"), 15),
                        "body": {
                            "nodeType": "Block",
                            "id": 16,
                            "src": s.src_in(pay, "{\n        payable(x).transfer(1);\n    }"),
                            "statements": [
                                {
                                    "nodeType": "ExpressionStatement",
                                    "id": 17,
                                    "src": s.src("payable(x).transfer(1);"),
                                    "expression": {
                                        "nodeType": "FunctionCall",
                                        "id": 18,
                                        "src": s.src("payable(x).transfer(1)"),
                                        "kind": "functionCall",
                                        "names": [],
                                        "expression": {
                                            "nodeType": "MemberAccess",
                                            "id": 19,
                                            "src": s.src("payable(x).transfer"),
                                            "memberName": "transfer",
                                            "expression": {
                                                "nodeType": "FunctionCall",
                                                "id": 20,
                                                "src": s.src("payable(x)"),
                                                "kind": "typeConversion",
                                                "expression": {
                                                    "nodeType": "ElementaryTypeNameExpression",
                                                    "id": 21,
                                                    "src": s.src_in("payable(x)", "payable"),
                                                    "typeName": {
                                                        "nodeType": "ElementaryTypeName",
                                                        "id": 22,
                                                        "src": s.src_in("payable(x)", "payable"),
                                                        "name": "address",
                                                        "stateMutability": "payable"
                                                    },
                                                    "typeDescriptions": {"typeIdentifier": "t_type$_t_address_payable_$", "typeString": "type(address payable)"}
                                                },
                                                "arguments": [
                                                    {
                                                        "nodeType": "Identifier",
                                                        "id": 23,
                                                        "src": s.src_in("payable(x)", "x"),
                                                        "name": "x",
                                                        "referencedDeclaration": 13,
                                                        "typeDescriptions": {"typeIdentifier": "t_address", "typeString": "address"}
                                                    }
                                                ],
                                                "typeDescriptions": {"typeIdentifier": "t_address_payable", "typeString": "address payable"}
                                            },
                                            "typeDescriptions": {"typeIdentifier": "t_function_transfer_nonpayable$_t_uint256_$returns$__$", "typeString": "function (uint256)"}
                                        },
                                        "arguments": [
                                            {
                                                "nodeType": "Literal",
                                                "id": 24,
                                                "src": s.src_in("transfer(1)", "1"),
                                                "kind": "number",
                                                "value": "1"
                                            }
                                        ],
                                        "typeDescriptions": {"typeIdentifier": "t_tuple$__$", "typeString": "tuple()"}
                                    }
                                }
                            ]
                        }
                    }
                ]
            },
            {
                "nodeType": "ContractDefinition",
                "id": ether_ids::CONTRACT_C,
                "src": s.src(contract_c),
                "name": "C",
                "nameLocation": s.src_in("contract C", "C"),
                "contractKind": "contract",
                "linearizedBaseContracts": [ether_ids::CONTRACT_C],
                "nodes": [
                    {
                        "nodeType": "FunctionDefinition",
                        "id": 31,
                        "src": s.src("function noop() public {}"),
                        "name": "noop",
                        "nameLocation": s.src_in("function noop", "noop"),
                        "kind": "function",
                        "visibility": "public",
                        "stateMutability": "nonpayable",
                        "implemented": true,
                        "parameters": empty_parameters(s.src_in("noop()", "()"), 32),
                        "returnParameters": empty_parameters(s.empty_after("noop() public"), 33),
                        "body": {"nodeType": "Block", "id": 34, "src": s.src_in("noop() public {}", "{}"), "statements": []}
                    }
                ]
            },
            {
                "nodeType": "ContractDefinition",
                "id": ether_ids::CONTRACT_R,
                "src": s.src(contract_r),
                "name": "R",
                "nameLocation": s.src_in("contract R", "R"),
                "contractKind": "contract",
                "linearizedBaseContracts": [ether_ids::CONTRACT_R],
                "nodes": [
                    {
                        "nodeType": "FunctionDefinition",
                        "id": ether_ids::RECEIVE_R,
                        "src": s.src(receive_r),
                        "name": "",
                        "nameLocation": s.src_in(receive_r, "receive"),
                        "kind": "receive",
                        "visibility": "external",
                        "stateMutability": "payable",
                        "implemented": true,
                        "parameters": empty_parameters(s.src_in(receive_r, "()"), 42),
                        "returnParameters": empty_parameters(s.src_in(receive_r, ""), 43),
                        "body": {
                            "nodeType": "Block",
                            "id": 44,
                            "src": s.src_in(receive_r, "{\n        revert(\"no\");\n    }"),
                            "statements": [
                                {
                                    "nodeType": "ExpressionStatement",
                                    "id": 45,
                                    "src": s.src("revert(\"no\");"),
                                    "expression": {
                                        "nodeType": "FunctionCall",
                                        "id": 46,
                                        "src": s.src("revert(\"no\")"),
                                        "kind": "functionCall",
                                        "expression": {
                                            "nodeType": "Identifier",
                                            "id": 47,
                                            "src": s.src_in("revert(\"no\")", "revert"),
                                            "name": "revert",
                                            "referencedDeclaration": -19,
                                            "typeDescriptions": {"typeIdentifier": "t_function_revert_pure$_t_string_memory_ptr_$returns$__$", "typeString": "function (string memory) pure"}
                                        },
                                        "arguments": [
                                            {
                                                "nodeType": "Literal",
                                                "id": 48,
                                                "src": s.src("\"no\""),
                                                "kind": "string",
                                                "value": "no"
                                            }
                                        ]
                                    }
                                }
                            ]
                        }
                    }
                ]
            }
        ]
    });
    s.input(ast)
}

// =============================================================================
// Effects.sol: one function whose body is a chosen list of effect statements
// =============================================================================

pub const EFFECTS_PATH: &str = "/project/contracts/Effects.sol";

/// Statement shapes with a known state effect
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Effect {
    /// `total = 1;`
    WriteState,
    /// `emit Ping();`
    Emit,
    /// `x.transfer(1);`
    Transfer,
    /// `selfdestruct(x);`
    Selfdestruct,
    /// `uint256 local = 1;`
    Local,
}

impl Effect {
    pub const ALL: [Effect; 5] = [
        Effect::WriteState,
        Effect::Emit,
        Effect::Transfer,
        Effect::Selfdestruct,
        Effect::Local,
    ];

    fn text(self) -> &'static str {
        match self {
            Effect::WriteState => "total = 1;",
            Effect::Emit => "emit Ping();",
            Effect::Transfer => "x.transfer(1);",
            Effect::Selfdestruct => "selfdestruct(x);",
            Effect::Local => "uint256 local = 1;",
        }
    }
}

const EFFECTS_TOTAL: i64 = 2;
const EFFECTS_PING: i64 = 4;
const EFFECTS_X: i64 = 8;

/// Id of the summarized function in [`effects_sol`]
pub const EFFECTS_FUNCTION: i64 = 6;

fn at(start: usize, len: usize) -> String {
    format!("{}:{}:0", start, len)
}

fn effect_statement(effect: Effect, start: usize, next_id: &mut i64) -> Value {
    let mut id = || {
        *next_id += 1;
        *next_id
    };
    match effect {
        Effect::WriteState => json!({
            "nodeType": "ExpressionStatement",
            "id": id(),
            "src": at(start, 10),
            "expression": {
                "nodeType": "Assignment",
                "id": id(),
                "src": at(start, 9),
                "operator": "=",
                "leftHandSide": {
                    "nodeType": "Identifier",
                    "id": id(),
                    "src": at(start, 5),
                    "name": "total",
                    "referencedDeclaration": EFFECTS_TOTAL,
                    "typeDescriptions": {"typeIdentifier": "t_uint256", "typeString": "uint256"}
                },
                "rightHandSide": {"nodeType": "Literal", "id": id(), "src": at(start + 8, 1), "kind": "number", "value": "1"}
            }
        }),
        Effect::Emit => json!({
            "nodeType": "EmitStatement",
            "id": id(),
            "src": at(start, 12),
            "eventCall": {
                "nodeType": "FunctionCall",
                "id": id(),
                "src": at(start + 5, 6),
                "kind": "functionCall",
                "expression": {
                    "nodeType": "Identifier",
                    "id": id(),
                    "src": at(start + 5, 4),
                    "name": "Ping",
                    "referencedDeclaration": EFFECTS_PING
                },
                "arguments": []
            }
        }),
        Effect::Transfer => json!({
            "nodeType": "ExpressionStatement",
            "id": id(),
            "src": at(start, 14),
            "expression": {
                "nodeType": "FunctionCall",
                "id": id(),
                "src": at(start, 13),
                "kind": "functionCall",
                "expression": {
                    "nodeType": "MemberAccess",
                    "id": id(),
                    "src": at(start, 10),
                    "memberName": "transfer",
                    "expression": {
                        "nodeType": "Identifier",
                        "id": id(),
                        "src": at(start, 1),
                        "name": "x",
                        "referencedDeclaration": EFFECTS_X,
                        "typeDescriptions": {"typeIdentifier": "t_address_payable", "typeString": "address payable"}
                    }
                },
                "arguments": [{"nodeType": "Literal", "id": id(), "src": at(start + 11, 1), "kind": "number", "value": "1"}]
            }
        }),
        Effect::Selfdestruct => json!({
            "nodeType": "ExpressionStatement",
            "id": id(),
            "src": at(start, 16),
            "expression": {
                "nodeType": "FunctionCall",
                "id": id(),
                "src": at(start, 15),
                "kind": "functionCall",
                "expression": {
                    "nodeType": "Identifier",
                    "id": id(),
                    "src": at(start, 12),
                    "name": "selfdestruct",
                    "referencedDeclaration": -21
                },
                "arguments": [{
                    "nodeType": "Identifier",
                    "id": id(),
                    "src": at(start + 13, 1),
                    "name": "x",
                    "referencedDeclaration": EFFECTS_X,
                    "typeDescriptions": {"typeIdentifier": "t_address_payable", "typeString": "address payable"}
                }]
            }
        }),
        Effect::Local => {
            let statement_id = id();
            let variable_id = id();
            let type_id = id();
            let literal_id = id();
            json!({
                "nodeType": "VariableDeclarationStatement",
                "id": statement_id,
                "src": at(start, 18),
                "declarations": [{
                    "nodeType": "VariableDeclaration",
                    "id": variable_id,
                    "src": at(start, 13),
                    "name": "local",
                    "nameLocation": at(start + 8, 5),
                    "storageLocation": "default",
                    "typeName": uint256(at(start, 7), type_id)
                }],
                "initialValue": {"nodeType": "Literal", "id": literal_id, "src": at(start + 16, 1), "kind": "number", "value": "1"}
            })
        }
    }
}

/// A contract with one function `f` whose body holds `effects`, in order
pub fn effects_sol(effects: &[Effect]) -> SourceInput {
    let mut text = String::from(
        "contract S {\n    uint256 total;\n    event Ping();\n\n    function f(address payable x) public {\n",
    );
    let mut statements = Vec::new();
    let mut next_id = 100;
    for effect in effects {
        text.push_str("        ");
        let start = text.len();
        text.push_str(effect.text());
        text.push('\n');
        statements.push(effect_statement(*effect, start, &mut next_id));
    }
    text.push_str("    }\n}\n");

    let s = Source::new(EFFECTS_PATH, &text);
    let function_start = s.offset("function f");
    let body_start = s.offset("public {") + "public ".len();
    let body_end = text.len() - "\n}\n".len();

    let ast = json!({
        "nodeType": "SourceUnit",
        "id": 1,
        "src": s.whole(),
        "nodes": [{
            "nodeType": "ContractDefinition",
            "id": 10,
            "src": at(0, text.len() - 1),
            "name": "S",
            "nameLocation": s.src_in("contract S", "S"),
            "contractKind": "contract",
            "linearizedBaseContracts": [10],
            "nodes": [
                {
                    "nodeType": "VariableDeclaration",
                    "id": EFFECTS_TOTAL,
                    "src": s.src("uint256 total"),
                    "name": "total",
                    "nameLocation": s.src_in("uint256 total", "total"),
                    "stateVariable": true,
                    "typeName": uint256(s.src_in("uint256 total", "uint256"), 3)
                },
                {
                    "nodeType": "EventDefinition",
                    "id": EFFECTS_PING,
                    "src": s.src("event Ping();"),
                    "name": "Ping",
                    "nameLocation": s.src_in("event Ping", "Ping"),
                    "parameters": empty_parameters(s.src_in("Ping()", "()"), 5)
                },
                {
                    "nodeType": "FunctionDefinition",
                    "id": EFFECTS_FUNCTION,
                    "src": at(function_start, body_end - function_start),
                    "name": "f",
                    "nameLocation": s.src_in("function f", "f"),
                    "kind": "function",
                    "visibility": "public",
                    "stateMutability": "nonpayable",
                    "implemented": true,
                    "parameters": {
                        "nodeType": "ParameterList",
                        "id": 7,
                        "src": s.src("(address payable x)"),
                        "parameters": [{
                            "nodeType": "VariableDeclaration",
                            "id": EFFECTS_X,
                            "src": s.src("address payable x"),
                            "name": "x",
                            "nameLocation": s.src_in("address payable x", "x"),
                            "typeName": {
                                "nodeType": "ElementaryTypeName",
                                "id": 9,
                                "src": s.src("address payable"),
                                "name": "address",
                                "stateMutability": "payable"
                            }
                        }]
                    },
                    "returnParameters": empty_parameters(s.empty_after("x) public"), 11),
                    "body": {
                        "nodeType": "Block",
                        "id": 12,
                        "src": at(body_start, body_end - body_start),
                        "statements": statements
                    }
                }
            ]
        }]
    });
    s.input(ast)
}

// =============================================================================
// Flow.sol: branches, loops and try/catch for control flow graphs
// =============================================================================

pub const FLOW_PATH: &str = "/project/contracts/Flow.sol";

pub const FLOW_TEXT: &str = "contract F {
    function ping() external {}

    function guarded(bool c) public payable {
        if (c) { revert(); }
    }

    function both(bool c) public payable {
        if (c) revert(); else revert();
    }

    function loops(bool c) public {
        while (c) { if (c) break; continue; }
        for (; c; ) { if (c) continue; break; }
        do { } while (c);
    }

    function attempt() public {
        try this.ping() { } catch { revert(); }
    }
}
";

pub mod flow_ids {
    pub const CONTRACT_F: i64 = 1;
    pub const FUNCTION_PING: i64 = 2;
    pub const FUNCTION_GUARDED: i64 = 10;
    pub const FUNCTION_BOTH: i64 = 30;
    pub const FUNCTION_LOOPS: i64 = 50;
    pub const WHILE_CONDITION: i64 = 57;
    pub const WHILE_BREAK: i64 = 61;
    pub const WHILE_CONTINUE: i64 = 62;
    pub const FOR_CONDITION: i64 = 64;
    pub const FOR_CONTINUE: i64 = 68;
    pub const FOR_BREAK: i64 = 69;
    pub const DO_WHILE_CONDITION: i64 = 72;
    pub const FUNCTION_ATTEMPT: i64 = 80;
    pub const TRY_CALL: i64 = 85;
}

fn bool_condition(scope: &Scope, id: i64, declaration: i64) -> Value {
    json!({
        "nodeType": "Identifier",
        "id": id,
        "src": scope.src("c"),
        "name": "c",
        "referencedDeclaration": declaration,
        "typeDescriptions": {"typeIdentifier": "t_bool", "typeString": "bool"}
    })
}

/// `revert();` as the first such statement in `scope`; uses ids `id..id + 3`
fn revert_statement(scope: &Scope, id: i64) -> Value {
    let statement = scope.scope("revert();");
    json!({
        "nodeType": "ExpressionStatement",
        "id": id,
        "src": statement.whole(),
        "expression": {
            "nodeType": "FunctionCall",
            "id": id + 1,
            "src": statement.src("revert()"),
            "kind": "functionCall",
            "expression": {
                "nodeType": "Identifier",
                "id": id + 2,
                "src": statement.src("revert"),
                "name": "revert",
                "referencedDeclaration": -19,
                "typeDescriptions": {"typeIdentifier": "t_function_revert_pure$__$returns$__$", "typeString": "function () pure"}
            },
            "arguments": []
        }
    })
}

fn bool_parameters(function: &Scope, id: i64) -> Value {
    let parameter = function.scope("bool c");
    json!({
        "nodeType": "ParameterList",
        "id": id,
        "src": function.src("(bool c)"),
        "parameters": [{
            "nodeType": "VariableDeclaration",
            "id": id + 1,
            "src": parameter.whole(),
            "name": "c",
            "nameLocation": parameter.src("c"),
            "storageLocation": "default",
            "typeName": {
                "nodeType": "ElementaryTypeName",
                "id": id + 2,
                "src": parameter.src("bool"),
                "name": "bool",
                "typeDescriptions": {"typeIdentifier": "t_bool", "typeString": "bool"}
            },
            "typeDescriptions": {"typeIdentifier": "t_bool", "typeString": "bool"}
        }]
    })
}

/// Function `name` spanning `function`; its body is everything from the first `{`
fn flow_function(
    function: &Scope,
    id: i64,
    name: &str,
    mutability: &str,
    parameters: Value,
    body_id: i64,
    statements: Vec<Value>,
) -> Value {
    let brace = function.text.find('{').unwrap_or_else(|| panic!("no body in {:?}", function.text));
    let header = &function.text[..brace];
    let visibility = if header.contains("external") { "external" } else { "public" };
    json!({
        "nodeType": "FunctionDefinition",
        "id": id,
        "src": function.whole(),
        "name": name,
        "nameLocation": function.src(name),
        "kind": "function",
        "visibility": visibility,
        "stateMutability": mutability,
        "implemented": true,
        "parameters": parameters,
        "returnParameters": empty_parameters(function.empty_after(header.trim_end()), id + 150),
        "body": {
            "nodeType": "Block",
            "id": body_id,
            "src": function.src(&function.text[brace..]),
            "statements": statements
        }
    })
}

pub fn flow_sol() -> SourceInput {
    let s = Source::new(FLOW_PATH, FLOW_TEXT);

    let ping = s.scope("function ping() external {}");
    let ping = flow_function(
        &ping,
        flow_ids::FUNCTION_PING,
        "ping",
        "nonpayable",
        empty_parameters(ping.src("()"), 3),
        5,
        vec![],
    );

    // if (c) { revert(); }
    let guarded = s.scope("function guarded(bool c) public payable {\n        if (c) { revert(); }\n    }");
    let guarded_if = guarded.scope("if (c) { revert(); }");
    let guarded = flow_function(
        &guarded,
        flow_ids::FUNCTION_GUARDED,
        "guarded",
        "payable",
        bool_parameters(&guarded, 11),
        15,
        vec![json!({
            "nodeType": "IfStatement",
            "id": 16,
            "src": guarded_if.whole(),
            "condition": bool_condition(&guarded_if, 17, 12),
            "trueBody": {
                "nodeType": "Block",
                "id": 18,
                "src": guarded_if.src("{ revert(); }"),
                "statements": [revert_statement(&guarded_if, 19)]
            }
        })],
    );

    // if (c) revert(); else revert();
    let both = s.scope("function both(bool c) public payable {\n        if (c) revert(); else revert();\n    }");
    let both_if = both.scope("if (c) revert(); else revert();");
    let both = flow_function(
        &both,
        flow_ids::FUNCTION_BOTH,
        "both",
        "payable",
        bool_parameters(&both, 31),
        35,
        vec![json!({
            "nodeType": "IfStatement",
            "id": 36,
            "src": both_if.whole(),
            "condition": bool_condition(&both_if, 37, 32),
            "trueBody": revert_statement(&both_if, 38),
            "falseBody": revert_statement(&both_if.scope("else revert();"), 41)
        })],
    );

    let loops = s.scope(
        "function loops(bool c) public {\n        while (c) { if (c) break; continue; }\n        for (; c; ) { if (c) continue; break; }\n        do { } while (c);\n    }",
    );
    let while_loop = loops.scope("while (c) { if (c) break; continue; }");
    let while_body = while_loop.scope("{ if (c) break; continue; }");
    let while_if = while_body.scope("if (c) break;");
    let for_loop = loops.scope("for (; c; ) { if (c) continue; break; }");
    let for_body = for_loop.scope("{ if (c) continue; break; }");
    let for_if = for_body.scope("if (c) continue;");
    let do_while = loops.scope("do { } while (c);");
    let loops = flow_function(
        &loops,
        flow_ids::FUNCTION_LOOPS,
        "loops",
        "nonpayable",
        bool_parameters(&loops, 51),
        55,
        vec![
            json!({
                "nodeType": "WhileStatement",
                "id": 56,
                "src": while_loop.whole(),
                "condition": bool_condition(&while_loop, flow_ids::WHILE_CONDITION, 52),
                "body": {
                    "nodeType": "Block",
                    "id": 58,
                    "src": while_body.whole(),
                    "statements": [
                        {
                            "nodeType": "IfStatement",
                            "id": 59,
                            "src": while_if.whole(),
                            "condition": bool_condition(&while_if, 60, 52),
                            "trueBody": {"nodeType": "Break", "id": flow_ids::WHILE_BREAK, "src": while_if.src("break;")}
                        },
                        {"nodeType": "Continue", "id": flow_ids::WHILE_CONTINUE, "src": while_body.src("continue;")}
                    ]
                }
            }),
            json!({
                "nodeType": "ForStatement",
                "id": 63,
                "src": for_loop.whole(),
                "condition": bool_condition(&for_loop, flow_ids::FOR_CONDITION, 52),
                "body": {
                    "nodeType": "Block",
                    "id": 65,
                    "src": for_body.whole(),
                    "statements": [
                        {
                            "nodeType": "IfStatement",
                            "id": 66,
                            "src": for_if.whole(),
                            "condition": bool_condition(&for_if, 67, 52),
                            "trueBody": {"nodeType": "Continue", "id": flow_ids::FOR_CONTINUE, "src": for_if.src("continue;")}
                        },
                        {"nodeType": "Break", "id": flow_ids::FOR_BREAK, "src": for_body.src("break;")}
                    ]
                }
            }),
            json!({
                "nodeType": "DoWhileStatement",
                "id": 70,
                "src": do_while.whole(),
                "body": {"nodeType": "Block", "id": 71, "src": do_while.src("{ }"), "statements": []},
                "condition": bool_condition(&do_while.scope("while (c)"), flow_ids::DO_WHILE_CONDITION, 52)
            }),
        ],
    );

    // try this.ping() { } catch { revert(); }
    let attempt = s.scope("function attempt() public {\n        try this.ping() { } catch { revert(); }\n    }");
    let try_statement = attempt.scope("try this.ping() { } catch { revert(); }");
    let catch_clause = try_statement.scope("catch { revert(); }");
    let attempt = flow_function(
        &attempt,
        flow_ids::FUNCTION_ATTEMPT,
        "attempt",
        "nonpayable",
        empty_parameters(attempt.src("()"), 81),
        83,
        vec![json!({
            "nodeType": "TryStatement",
            "id": 84,
            "src": try_statement.whole(),
            "externalCall": {
                "nodeType": "FunctionCall",
                "id": flow_ids::TRY_CALL,
                "src": try_statement.src("this.ping()"),
                "kind": "functionCall",
                "expression": {
                    "nodeType": "MemberAccess",
                    "id": 86,
                    "src": try_statement.src("this.ping"),
                    "memberName": "ping",
                    "referencedDeclaration": flow_ids::FUNCTION_PING,
                    "expression": {
                        "nodeType": "Identifier",
                        "id": 87,
                        "src": try_statement.src("this"),
                        "name": "this",
                        "referencedDeclaration": -28,
                        "typeDescriptions": {"typeIdentifier": "t_contract$_F_$1", "typeString": "contract F"}
                    },
                    "typeDescriptions": {"typeIdentifier": "t_function_external_nonpayable$__$returns$__$", "typeString": "function () external"}
                },
                "arguments": [],
                "typeDescriptions": {"typeIdentifier": "t_tuple$__$", "typeString": "tuple()"}
            },
            "clauses": [
                {
                    "nodeType": "TryCatchClause",
                    "id": 88,
                    "src": try_statement.src("{ }"),
                    "errorName": "",
                    "block": {"nodeType": "Block", "id": 89, "src": try_statement.src("{ }"), "statements": []}
                },
                {
                    "nodeType": "TryCatchClause",
                    "id": 90,
                    "src": catch_clause.whole(),
                    "errorName": "",
                    "block": {
                        "nodeType": "Block",
                        "id": 91,
                        "src": catch_clause.src("{ revert(); }"),
                        "statements": [revert_statement(&catch_clause, 92)]
                    }
                }
            ]
        })],
    );

    let contract = s.scope(FLOW_TEXT.trim_end());
    let ast = json!({
        "nodeType": "SourceUnit",
        "id": 300,
        "src": s.whole(),
        "absolutePath": "contracts/Flow.sol",
        "nodes": [{
            "nodeType": "ContractDefinition",
            "id": flow_ids::CONTRACT_F,
            "src": contract.whole(),
            "name": "F",
            "nameLocation": contract.src("F"),
            "contractKind": "contract",
            "linearizedBaseContracts": [flow_ids::CONTRACT_F],
            "nodes": [ping, guarded, both, loops, attempt]
        }]
    });
    s.input(ast)
}
