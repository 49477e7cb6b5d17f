//! Import state
//!
//! - [`ImportContext`]: the registries one translation reads and mutates
//! - [`maps`]: registry type aliases and canonical id prefixes
//!
//! # Registries
//!
//! | Registry | Description |
//! |-----|-------------|
//! | `renames` | foreign identifier → `input_N` / `param_N` |
//! | `nodes` | identifier → single-slot `Symbol` |
//! | `params` | identifier → `NDArray` (order preserved) |

pub mod context;
pub mod maps;

pub use context::ImportContext;
pub use maps::{NodeMap, Params, RenameMap};
