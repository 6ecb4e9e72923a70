//! # Raw AST boundary
//!
//! Typed view of the compiler's JSON AST output. Only the representative
//! subset of node kinds the IR models is typed; anything else deserializes to
//! a neutral `Other` variant and is skipped by the IR builder.
//!
//! ```text
//! compiler JSON → serde_json::Value → SolcSourceUnit → IR
//!                         └─→ node_path_order (cross-unit id translation)
//! ```

pub mod enums;
pub mod nodes;

pub use enums::{
    ContractKind, FunctionKind, GlobalSymbol, Mutability, StateMutability, StorageLocation,
    Visibility,
};
pub use nodes::*;

use std::fmt;
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};

/// Numeric AST node identifier, unique within one compilation unit
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize,
)]
#[serde(transparent)]
pub struct AstNodeId(pub i64);

impl fmt::Display for AstNodeId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Stable hash identifying a compilation unit
#[derive(Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct CuHash(pub [u8; 32]);

impl CuHash {
    /// Derive a hash from the unit's sources, order-independent
    pub fn from_sources<'a, I>(sources: I) -> Self
    where
        I: IntoIterator<Item = (&'a Path, &'a [u8])>,
    {
        let mut sources: Vec<_> = sources.into_iter().collect();
        sources.sort_by(|a, b| a.0.cmp(b.0));

        let mut hasher = Sha256::new();
        for (path, content) in sources {
            hasher.update(path.to_string_lossy().as_bytes());
            hasher.update([0u8]);
            hasher.update((content.len() as u64).to_le_bytes());
            hasher.update(content);
        }
        CuHash(hasher.finalize().into())
    }
}

impl fmt::Display for CuHash {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", hex::encode(&self.0[..8]))
    }
}

impl fmt::Debug for CuHash {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "CuHash({})", hex::encode(self.0))
    }
}

/// Source location as emitted by the compiler: `start:length:file_index`
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Deserialize)]
#[serde(try_from = "String")]
pub struct Src {
    /// Byte offset of the node start
    pub byte_offset: usize,
    /// Length in bytes
    pub byte_length: usize,
    /// Index of the file in the compiler's source list (-1 if unknown)
    pub file_id: i64,
}

impl Src {
    /// End byte offset (exclusive); `None` if it does not fit in `usize`
    pub fn end(&self) -> Option<usize> {
        self.byte_offset.checked_add(self.byte_length)
    }
}

impl TryFrom<String> for Src {
    type Error = String;

    fn try_from(value: String) -> std::result::Result<Self, Self::Error> {
        let mut parts = value.split(':');
        let mut next = |what: &str| -> std::result::Result<i64, String> {
            parts
                .next()
                .ok_or_else(|| format!("missing {} in src '{}'", what, value))?
                .parse::<i64>()
                .map_err(|e| format!("invalid {} in src '{}': {}", what, value, e))
        };

        let start = next("start")?;
        let length = next("length")?;
        let file_id = next("file index")?;
        let (Ok(byte_offset), Ok(byte_length)) = (usize::try_from(start), usize::try_from(length)) else {
            return Err(format!("offset out of range in src '{}'", value));
        };
        if byte_offset.checked_add(byte_length).is_none() {
            return Err(format!("end offset overflows in src '{}'", value));
        }

        Ok(Src {
            byte_offset,
            byte_length,
            file_id,
        })
    }
}

/// One file of a compilation unit as produced by the external compiler
#[derive(Debug, Clone)]
pub struct SourceInput {
    /// Absolute path of the file
    pub path: PathBuf,
    /// File content the AST offsets refer to
    pub source: Vec<u8>,
    /// Raw JSON AST of the file's source unit
    pub ast: serde_json::Value,
}

/// Everything the compiler produced for one compilation unit
#[derive(Debug, Clone)]
pub struct CompilationUnitInput {
    /// Stable hash of the unit
    pub hash: CuHash,
    /// Files of the unit
    pub sources: Vec<SourceInput>,
}

/// Pre-order list of node ids in a raw source unit.
///
/// Objects carrying both `nodeType` and `id` are nodes. The order is a pure
/// function of the AST shape, so the same file compiled in two units yields
/// two lists whose positions correspond node by node.
pub fn node_path_order(ast: &serde_json::Value) -> Vec<AstNodeId> {
    let mut ids = Vec::new();
    let mut stack = vec![ast];

    while let Some(value) = stack.pop() {
        match value {
            serde_json::Value::Object(map) => {
                if map.contains_key("nodeType") {
                    if let Some(id) = map.get("id").and_then(|v| v.as_i64()) {
                        ids.push(AstNodeId(id));
                    }
                }
                // reversed so that the first field is visited first
                let children: Vec<_> = map.values().collect();
                stack.extend(children.into_iter().rev());
            }
            serde_json::Value::Array(items) => {
                stack.extend(items.iter().rev());
            }
            _ => {}
        }
    }

    ids
}
