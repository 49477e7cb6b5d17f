//! Operator translation table
//!
//! Maps ONNX operator names onto target operators. A table holds two kinds
//! of entries:
//!
//! - an identity set: operators valid unmodified in the target
//! - a conversion map: operator name → [`ConvertFn`] returning the target
//!   operator name and a new attribute map
//!
//! The default table is built once per process and shared by every
//! [`GraphBuilder`](crate::builder::GraphBuilder); custom tables can be
//! passed to [`GraphBuilder::with_table`](crate::builder::GraphBuilder::with_table).

pub mod converters;

use std::sync::OnceLock;

use rustc_hash::{FxHashMap, FxHashSet};

use crate::attr::Attrs;
use crate::error::{ImportError, ImportResult};
use crate::symbol::{registry, OpDef};

/// Converts ONNX attributes into `(target op name, target attributes)`
pub type ConvertFn = fn(Attrs) -> ImportResult<(&'static str, Attrs)>;

/// Identity set plus conversion map
#[derive(Debug, Clone, Default)]
pub struct OpTable {
    identity: FxHashSet<&'static str>,
    convert: FxHashMap<&'static str, ConvertFn>,
}

impl OpTable {
    /// Table without any entries
    pub fn empty() -> Self {
        Self::default()
    }

    /// Process-wide default table
    pub fn global() -> &'static OpTable {
        static TABLE: OnceLock<OpTable> = OnceLock::new();
        TABLE.get_or_init(converters::default_table)
    }

    /// Add an operator that translates to itself
    pub fn with_identity(mut self, op_name: &'static str) -> Self {
        self.identity.insert(op_name);
        self
    }

    /// Add or replace the conversion for `op_name`
    pub fn with_converter(mut self, op_name: &'static str, convert: ConvertFn) -> Self {
        self.convert.insert(op_name, convert);
        self
    }

    /// Whether the table can translate `op_name`
    pub fn supports(&self, op_name: &str) -> bool {
        self.identity.contains(op_name) || self.convert.contains_key(op_name)
    }

    /// Supported ONNX operator names, sorted
    pub fn supported_ops(&self) -> Vec<&'static str> {
        let mut ops: Vec<&'static str> = self
            .identity
            .iter()
            .chain(self.convert.keys())
            .copied()
            .collect();
        ops.sort_unstable();
        ops.dedup();
        ops
    }

    /// Translate an ONNX operator and its attributes
    pub fn translate(&self, op_name: &str, attrs: Attrs) -> ImportResult<(&'static OpDef, Attrs)> {
        let (target, attrs) = if self.identity.contains(op_name) {
            (op_name, attrs)
        } else if let Some(convert) = self.convert.get(op_name) {
            convert(attrs)?
        } else {
            return Err(ImportError::UnsupportedOperator(op_name.to_string()));
        };

        let op = registry::lookup(target)
            .ok_or_else(|| ImportError::UnknownTargetOperator(target.to_string()))?;
        Ok((op, attrs))
    }
}
