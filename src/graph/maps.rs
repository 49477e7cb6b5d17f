//! Registry types used during an import

use indexmap::IndexMap;
use rustc_hash::FxHashMap;

use crate::symbol::Symbol;
use crate::tensor::NDArray;

/// Identifier → single-slot symbol
pub type NodeMap = FxHashMap<String, Symbol>;

/// Parameter name → tensor, in insertion order
pub type Params = IndexMap<String, NDArray>;

/// Foreign identifier → canonical `input_N` / `param_N` id, in declaration order
pub type RenameMap = IndexMap<String, String>;

/// Prefix of canonical ids given to plain graph inputs
pub const INPUT_PREFIX: &str = "input_";

/// Prefix of canonical ids given to inputs backed by an initializer
pub const PARAM_PREFIX: &str = "param_";
