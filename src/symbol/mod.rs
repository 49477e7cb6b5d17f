//! Symbolic compute graph
//!
//! This module provides the target representation produced by the importer:
//!
//! - [`Symbol`]: a handle on one or more output slots of an immutable DAG
//! - [`SymNode`]: a variable or an operator node with its attribute dictionary
//! - [`registry`]: the known target operators and their output arity
//! - [`NameManager`]: implicit names for unnamed nodes
//!
//! Nodes are shared through `Arc`, so composing a symbol never copies the
//! graph below it and finished symbols can be sent across threads.
//!
//! # Example
//!
//! ```ignore
//! use onnx_symbol_import::symbol::{registry, Symbol};
//!
//! let x = Symbol::variable("input_0", None);
//! let relu = Symbol::create(registry::lookup("relu").unwrap(), "relu0", &[x], Attrs::new())?;
//! assert_eq!(relu.list_outputs(), vec!["relu0_output"]);
//! ```

pub mod names;
pub mod registry;

use std::sync::Arc;

use rustc_hash::FxHashSet;
use smallvec::SmallVec;

use crate::attr::{AttrValue, Attrs};
use crate::error::{ImportError, ImportResult};

pub use names::NameManager;
pub use registry::{OpDef, OutputArity};

/// A node of the symbolic graph
#[derive(Debug)]
pub struct SymNode {
    /// `None` for variables
    op: Option<&'static OpDef>,
    name: String,
    attrs: Attrs,
    inputs: SmallVec<[NodeEntry; 4]>,
    /// Declared shape, variables only
    shape: Option<Vec<usize>>,
    num_outputs: usize,
}

impl SymNode {
    /// Node name
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Operator name, `"null"` for variables
    pub fn op_name(&self) -> &'static str {
        self.op.map(|op| op.name).unwrap_or("null")
    }

    /// Operator definition, `None` for variables
    pub fn op(&self) -> Option<&'static OpDef> {
        self.op
    }

    /// Attribute dictionary
    pub fn attrs(&self) -> &Attrs {
        &self.attrs
    }

    /// Input slots in call order
    pub fn inputs(&self) -> &[NodeEntry] {
        &self.inputs
    }

    /// Declared shape of a variable
    pub fn shape(&self) -> Option<&[usize]> {
        self.shape.as_deref()
    }

    /// Whether this node is a variable
    pub fn is_variable(&self) -> bool {
        self.op.is_none()
    }

    /// Number of output slots
    pub fn num_outputs(&self) -> usize {
        self.num_outputs
    }

    fn output_name(&self, index: usize) -> String {
        if self.is_variable() {
            self.name.clone()
        } else if self.num_outputs == 1 {
            format!("{}_output", self.name)
        } else {
            format!("{}_output{}", self.name, index)
        }
    }
}

/// One output slot of a node
#[derive(Debug, Clone)]
pub struct NodeEntry {
    node: Arc<SymNode>,
    index: usize,
}

impl From<NodeEntry> for Symbol {
    fn from(entry: NodeEntry) -> Self {
        Symbol {
            outputs: vec![entry],
        }
    }
}

impl NodeEntry {
    /// Node providing the slot
    pub fn node(&self) -> &Arc<SymNode> {
        &self.node
    }

    /// Slot index on that node
    pub fn index(&self) -> usize {
        self.index
    }
}

/// Handle on an ordered list of output slots
#[derive(Debug, Clone)]
pub struct Symbol {
    outputs: Vec<NodeEntry>,
}

impl Symbol {
    /// Create a variable, optionally carrying a shape
    pub fn variable(name: impl Into<String>, shape: Option<Vec<usize>>) -> Self {
        let node = SymNode {
            op: None,
            name: name.into(),
            attrs: Attrs::new(),
            inputs: SmallVec::new(),
            shape,
            num_outputs: 1,
        };
        Self {
            outputs: vec![NodeEntry {
                node: Arc::new(node),
                index: 0,
            }],
        }
    }

    /// Apply `op` to `inputs`
    ///
    /// Every input must be a single-output symbol. The result exposes all
    /// output slots of the new node; use [`Symbol::get`] to pick one.
    pub fn create(
        op: &'static OpDef,
        name: impl Into<String>,
        inputs: &[Symbol],
        attrs: Attrs,
    ) -> ImportResult<Self> {
        let name = name.into();
        let num_outputs = op
            .num_outputs(&attrs)
            .filter(|&count| count > 0)
            .ok_or_else(|| {
                ImportError::SymbolCompose(format!(
                    "{} ({}): invalid output count attribute",
                    name, op.name
                ))
            })?;

        let inputs = inputs
            .iter()
            .map(|input| {
                input.single_entry().cloned().ok_or_else(|| {
                    ImportError::SymbolCompose(format!(
                        "{} ({}): input with {} outputs, expected 1",
                        name,
                        op.name,
                        input.num_outputs()
                    ))
                })
            })
            .collect::<ImportResult<SmallVec<[NodeEntry; 4]>>>()?;

        let node = Arc::new(SymNode {
            op: Some(op),
            name,
            attrs,
            inputs,
            shape: None,
            num_outputs,
        });

        Ok(Self {
            outputs: (0..num_outputs)
                .map(|index| NodeEntry {
                    node: Arc::clone(&node),
                    index,
                })
                .collect(),
        })
    }

    /// Group several symbols into one multi-output symbol, in order
    pub fn group(symbols: impl IntoIterator<Item = Symbol>) -> Self {
        Self {
            outputs: symbols.into_iter().flat_map(|s| s.outputs).collect(),
        }
    }

    /// Output slot `index` as its own symbol
    pub fn get(&self, index: usize) -> Option<Symbol> {
        self.outputs.get(index).cloned().map(Symbol::from)
    }

    /// Number of output slots
    pub fn num_outputs(&self) -> usize {
        self.outputs.len()
    }

    /// Output slots
    pub fn outputs(&self) -> &[NodeEntry] {
        &self.outputs
    }

    /// Output names in slot order
    pub fn list_outputs(&self) -> Vec<String> {
        self.outputs
            .iter()
            .map(|entry| entry.node.output_name(entry.index))
            .collect()
    }

    /// Variable names reachable from the outputs, depth-first post-order
    pub fn list_arguments(&self) -> Vec<String> {
        self.topo_nodes()
            .iter()
            .filter(|node| node.is_variable())
            .map(|node| node.name.clone())
            .collect()
    }

    /// Every node reachable from the outputs, inputs before consumers
    pub fn topo_nodes(&self) -> Vec<Arc<SymNode>> {
        let mut order = Vec::new();
        let mut visited: FxHashSet<*const SymNode> = FxHashSet::default();
        let mut stack: Vec<(Arc<SymNode>, bool)> = self
            .outputs
            .iter()
            .rev()
            .map(|entry| (Arc::clone(&entry.node), false))
            .collect();

        while let Some((node, expanded)) = stack.pop() {
            if expanded {
                order.push(node);
                continue;
            }
            if !visited.insert(Arc::as_ptr(&node)) {
                continue;
            }
            stack.push((Arc::clone(&node), true));
            for input in node.inputs.iter().rev() {
                if !visited.contains(&Arc::as_ptr(&input.node)) {
                    stack.push((Arc::clone(&input.node), false));
                }
            }
        }

        order
    }

    /// The node behind this symbol when all slots come from one node
    pub fn node(&self) -> Option<&Arc<SymNode>> {
        let first = &self.outputs.first()?.node;
        self.outputs
            .iter()
            .all(|entry| Arc::ptr_eq(&entry.node, first))
            .then_some(first)
    }

    /// Name of the underlying node
    pub fn name(&self) -> Option<&str> {
        self.node().map(|node| node.name())
    }

    /// Operator name of the underlying node
    pub fn op_name(&self) -> Option<&'static str> {
        self.node().map(|node| node.op_name())
    }

    /// Attributes of the underlying node
    pub fn attrs(&self) -> Option<&Attrs> {
        self.node().map(|node| node.attrs())
    }

    /// Single attribute of the underlying node
    pub fn attr(&self, key: &str) -> Option<&AttrValue> {
        self.attrs().and_then(|attrs| attrs.get(key))
    }

    /// Declared shape when this is a variable
    pub fn shape(&self) -> Option<&[usize]> {
        self.node().and_then(|node| node.shape())
    }

    /// Whether this is a single variable
    pub fn is_variable(&self) -> bool {
        self.node().is_some_and(|node| node.is_variable())
    }

    /// Inputs of the underlying node, each as a symbol
    pub fn inputs(&self) -> Vec<Symbol> {
        self.node()
            .map(|node| {
                node.inputs
                    .iter()
                    .map(|entry| Symbol {
                        outputs: vec![entry.clone()],
                    })
                    .collect()
            })
            .unwrap_or_default()
    }

    /// `transpose(self, axes)`
    pub fn transpose(&self, name: impl Into<String>, axes: Vec<i64>) -> ImportResult<Symbol> {
        let mut attrs = Attrs::new();
        attrs.insert("axes".to_string(), AttrValue::Ints(axes));
        Symbol::create(target_op("transpose")?, name, std::slice::from_ref(self), attrs)
    }

    /// `self * scalar`
    pub fn mul_scalar(&self, name: impl Into<String>, scalar: f32) -> ImportResult<Symbol> {
        let mut attrs = Attrs::new();
        attrs.insert("scalar".to_string(), AttrValue::Float(scalar));
        Symbol::create(target_op("_mul_scalar")?, name, std::slice::from_ref(self), attrs)
    }

    fn single_entry(&self) -> Option<&NodeEntry> {
        match self.outputs.as_slice() {
            [entry] => Some(entry),
            _ => None,
        }
    }
}

fn target_op(name: &str) -> ImportResult<&'static OpDef> {
    registry::lookup(name).ok_or_else(|| ImportError::UnknownTargetOperator(name.to_string()))
}
