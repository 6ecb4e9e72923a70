//! Enumerations shared by the raw AST and the IR

use std::fmt;

use serde::{Deserialize, Serialize};

use super::AstNodeId;

/// Declaration visibility
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum Visibility {
    /// Visible everywhere
    #[default]
    Public,
    /// Only callable from outside
    External,
    /// Contract and derived contracts
    Internal,
    /// Defining contract only
    Private,
}

impl fmt::Display for Visibility {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            Visibility::Public => "public",
            Visibility::External => "external",
            Visibility::Internal => "internal",
            Visibility::Private => "private",
        };
        f.write_str(s)
    }
}

/// Function state mutability
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum StateMutability {
    /// Accepts value transfers
    Payable,
    /// Default mutability
    #[default]
    Nonpayable,
    /// Reads but does not write state
    View,
    /// Neither reads nor writes state
    Pure,
}

impl fmt::Display for StateMutability {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            StateMutability::Payable => "payable",
            StateMutability::Nonpayable => "nonpayable",
            StateMutability::View => "view",
            StateMutability::Pure => "pure",
        };
        f.write_str(s)
    }
}

/// Contract kind
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum ContractKind {
    /// Regular contract
    #[default]
    Contract,
    /// Interface
    Interface,
    /// Library
    Library,
}

impl fmt::Display for ContractKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            ContractKind::Contract => "contract",
            ContractKind::Interface => "interface",
            ContractKind::Library => "library",
        };
        f.write_str(s)
    }
}

/// Function kind
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
#[serde(rename_all = "camelCase")]
pub enum FunctionKind {
    /// Named function
    #[default]
    Function,
    /// Constructor
    Constructor,
    /// `receive()` ether handler
    Receive,
    /// `fallback()` handler
    Fallback,
    /// File-level function
    FreeFunction,
}

/// Variable mutability
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum Mutability {
    /// Regular variable
    #[default]
    Mutable,
    /// Set once in the constructor
    Immutable,
    /// Compile-time constant
    Constant,
}

/// Data location of a variable
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum StorageLocation {
    /// Not specified
    #[default]
    Default,
    /// Persistent storage
    Storage,
    /// Memory
    Memory,
    /// Read-only call data
    Calldata,
}

impl fmt::Display for StorageLocation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            StorageLocation::Default => "",
            StorageLocation::Storage => "storage",
            StorageLocation::Memory => "memory",
            StorageLocation::Calldata => "calldata",
        };
        f.write_str(s)
    }
}

/// Built-in symbols of the language.
///
/// Identifiers referencing globals carry negative declaration ids; built-in
/// members (`transfer`, `send`, `call`, ...) have no declaration at all and
/// are recognized from the member name and the base expression type.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum GlobalSymbol {
    /// `abi`
    Abi,
    /// `addmod`
    Addmod,
    /// `assert`
    Assert,
    /// `block`
    Block,
    /// `blockhash`
    Blockhash,
    /// `ecrecover`
    Ecrecover,
    /// `gasleft`
    Gasleft,
    /// `keccak256`
    Keccak256,
    /// `msg`
    Msg,
    /// `mulmod`
    Mulmod,
    /// `now`
    Now,
    /// `require`
    Require,
    /// `revert`
    Revert,
    /// `ripemd160`
    Ripemd160,
    /// `selfdestruct`
    Selfdestruct,
    /// `sha256`
    Sha256,
    /// `sha3`
    Sha3,
    /// `suicide`
    Suicide,
    /// `super`
    Super,
    /// `tx`
    Tx,
    /// `type`
    Type,
    /// `this`
    This,
    /// `<address>.transfer`
    AddressTransfer,
    /// `<address>.send`
    AddressSend,
    /// `<address>.call`
    AddressCall,
    /// `<address>.delegatecall`
    AddressDelegatecall,
    /// `<address>.staticcall`
    AddressStaticcall,
    /// `<function>.value`
    FunctionValue,
}

impl GlobalSymbol {
    /// Map a negative referenced-declaration id to a global symbol
    pub fn from_id(id: AstNodeId) -> Option<Self> {
        let symbol = match id.0 {
            -1 => GlobalSymbol::Abi,
            -2 => GlobalSymbol::Addmod,
            -3 => GlobalSymbol::Assert,
            -4 => GlobalSymbol::Block,
            -5 => GlobalSymbol::Blockhash,
            -6 => GlobalSymbol::Ecrecover,
            -7 => GlobalSymbol::Gasleft,
            -8 => GlobalSymbol::Keccak256,
            -15 => GlobalSymbol::Msg,
            -16 => GlobalSymbol::Mulmod,
            -17 => GlobalSymbol::Now,
            -18 => GlobalSymbol::Require,
            -19 => GlobalSymbol::Revert,
            -20 => GlobalSymbol::Ripemd160,
            -21 => GlobalSymbol::Selfdestruct,
            -22 => GlobalSymbol::Sha256,
            -23 => GlobalSymbol::Sha3,
            -24 => GlobalSymbol::Suicide,
            -25 => GlobalSymbol::Super,
            -26 => GlobalSymbol::Tx,
            -27 => GlobalSymbol::Type,
            -28 => GlobalSymbol::This,
            _ => return None,
        };
        Some(symbol)
    }

    /// Recognize a built-in member from its name and base type identifier
    pub fn from_member(member_name: &str, base_type_identifier: Option<&str>) -> Option<Self> {
        let base = base_type_identifier?;
        if base.starts_with("t_address") {
            return match member_name {
                "transfer" => Some(GlobalSymbol::AddressTransfer),
                "send" => Some(GlobalSymbol::AddressSend),
                "call" => Some(GlobalSymbol::AddressCall),
                "delegatecall" => Some(GlobalSymbol::AddressDelegatecall),
                "staticcall" => Some(GlobalSymbol::AddressStaticcall),
                _ => None,
            };
        }
        if base.starts_with("t_function") && member_name == "value" {
            return Some(GlobalSymbol::FunctionValue);
        }
        None
    }
}
