//! Import context
//!
//! `ImportContext` owns every registry a single translation mutates: the
//! canonical rename map, the node registry, the parameter registry and the
//! implicit-name counters. It lives inside one `GraphBuilder` and is consumed
//! when the translation finishes.

use log::warn;

use crate::error::{ImportError, ImportResult};
use crate::symbol::{NameManager, Symbol};
use crate::tensor::NDArray;

use super::maps::{NodeMap, Params, RenameMap, INPUT_PREFIX, PARAM_PREFIX};

/// Registries of one translation
#[derive(Debug, Default)]
pub struct ImportContext {
    /// Identifier → symbol
    nodes: NodeMap,

    /// Identifier → parameter tensor
    params: Params,

    /// Foreign identifier → canonical id
    renames: RenameMap,

    /// Implicit node names
    names: NameManager,

    num_input: usize,
    num_param: usize,
}

impl ImportContext {
    /// Create an empty context
    pub fn new() -> Self {
        Self::default()
    }

    // ========================================================================
    // Parameters
    // ========================================================================

    /// Register an initializer under its foreign name
    pub fn add_param(&mut self, name: &str, array: NDArray) -> ImportResult<()> {
        if name.trim().is_empty() {
            return Err(ImportError::InvalidTensorName);
        }
        if self.params.insert(name.to_string(), array).is_some() {
            warn!("Initializer {} declared twice, keeping the last one", name);
        }
        Ok(())
    }

    /// Get a parameter by identifier
    pub fn param(&self, name: &str) -> Option<&NDArray> {
        self.params.get(name)
    }

    /// Replace an existing parameter in place, keeping its position
    pub fn replace_param(&mut self, name: &str, array: NDArray) -> Option<NDArray> {
        self.params
            .get_mut(name)
            .map(|slot| std::mem::replace(slot, array))
    }

    /// Number of parameters
    pub fn param_count(&self) -> usize {
        self.params.len()
    }

    // ========================================================================
    // Declared inputs
    // ========================================================================

    /// Declare a graph input and return its canonical id
    ///
    /// Inputs naming a parameter become `param_N` variables carrying the
    /// parameter's shape, and the parameter moves to the new id. Every other
    /// input becomes a shapeless `input_N` variable.
    pub fn declare_input(&mut self, name: &str) -> ImportResult<String> {
        if self.renames.contains_key(name) {
            return Err(ImportError::DuplicateInput(name.to_string()));
        }

        let (id, variable) = match self.params.shift_remove(name) {
            Some(array) => {
                let id = format!("{}{}", PARAM_PREFIX, self.num_param);
                self.num_param += 1;
                let variable = Symbol::variable(id.clone(), Some(array.shape().to_vec()));
                self.params.insert(id.clone(), array);
                (id, variable)
            }
            None => {
                let id = format!("{}{}", INPUT_PREFIX, self.num_input);
                self.num_input += 1;
                (id.clone(), Symbol::variable(id, None))
            }
        };

        self.nodes.insert(id.clone(), variable);
        self.renames.insert(name.to_string(), id.clone());
        Ok(id)
    }

    /// Number of `input_N` ids handed out
    pub fn input_count(&self) -> usize {
        self.num_input
    }

    // ========================================================================
    // Node registry
    // ========================================================================

    /// Canonical id of `name`, or `name` itself when it was never renamed
    pub fn resolve_name<'a>(&'a self, name: &'a str) -> &'a str {
        self.renames.get(name).map(String::as_str).unwrap_or(name)
    }

    /// Symbol registered for `name` after renaming
    pub fn lookup(&self, name: &str) -> Option<&Symbol> {
        self.nodes.get(self.resolve_name(name))
    }

    /// Resolve one input of `node`
    pub fn resolve_input(&self, node: &str, input: &str) -> ImportResult<Symbol> {
        self.lookup(input)
            .cloned()
            .ok_or_else(|| ImportError::UnresolvedInput {
                node: node.to_string(),
                input: input.to_string(),
            })
    }

    /// Resolve every input of `node`, in order
    pub fn resolve_inputs(&self, node: &str, inputs: &[String]) -> ImportResult<Vec<Symbol>> {
        inputs
            .iter()
            .map(|input| self.resolve_input(node, input))
            .collect()
    }

    /// Register `symbol` under `id`, replacing any previous entry
    pub fn set_node(&mut self, id: impl Into<String>, symbol: Symbol) {
        self.nodes.insert(id.into(), symbol);
    }

    /// Register each output slot of `symbol` under the matching identifier
    ///
    /// `names` must have one entry per output slot. An identifier that is
    /// already registered, or that names a declared input, is rejected.
    pub fn register_outputs(&mut self, names: &[String], symbol: &Symbol) -> ImportResult<()> {
        for (name, entry) in names.iter().zip(symbol.outputs()) {
            if self.nodes.contains_key(name) || self.renames.contains_key(name) {
                return Err(ImportError::DuplicateNodeOutput(name.clone()));
            }
            self.nodes.insert(name.clone(), Symbol::from(entry.clone()));
        }
        Ok(())
    }

    /// Number of registered identifiers
    pub fn node_count(&self) -> usize {
        self.nodes.len()
    }

    /// Symbol for a declared graph output
    pub fn output(&self, name: &str) -> ImportResult<Symbol> {
        self.lookup(name)
            .cloned()
            .ok_or_else(|| ImportError::UnresolvedOutput(name.to_string()))
    }

    // ========================================================================
    // Naming
    // ========================================================================

    /// `explicit` when given, otherwise the next implicit name for `hint`
    pub fn node_name(&mut self, explicit: Option<&str>, hint: &str) -> String {
        self.names.get(explicit, hint)
    }

    /// Consume the context, returning the parameter registry
    pub fn into_params(self) -> Params {
        self.params
    }
}
