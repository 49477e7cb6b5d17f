//! Pre-import model checks
//!
//! Catch malformed graphs and unsupported opsets before translation starts.

use std::collections::HashSet;

use log::warn;

use crate::error::{ImportError, ImportResult};
use crate::proto::{GraphProto, ModelProto};

/// Oldest default-domain opset the conversion table follows
pub const SUPPORTED_OPSET_MIN: i64 = 1;
/// Newest default-domain opset the conversion table follows
pub const SUPPORTED_OPSET_MAX: i64 = 9;

/// Validation result with detailed issues
#[derive(Debug, Clone)]
pub struct ValidationResult {
    /// Whether the model is valid
    pub is_valid: bool,
    /// Critical issues
    pub errors: Vec<String>,
    /// Non-critical issues
    pub warnings: Vec<String>,
}

impl ValidationResult {
    /// Create a valid result
    pub fn valid() -> Self {
        Self {
            is_valid: true,
            errors: Vec::new(),
            warnings: Vec::new(),
        }
    }

    /// Add an error
    pub fn add_error(&mut self, msg: impl Into<String>) {
        self.errors.push(msg.into());
        self.is_valid = false;
    }

    /// Add a warning
    pub fn add_warning(&mut self, msg: impl Into<String>) {
        self.warnings.push(msg.into());
    }

    /// Merge with another result
    pub fn merge(&mut self, other: ValidationResult) {
        if !other.is_valid {
            self.is_valid = false;
        }
        self.errors.extend(other.errors);
        self.warnings.extend(other.warnings);
    }
}

/// Validate an ONNX model
pub fn validate_model(model: &ModelProto) -> ValidationResult {
    let mut result = ValidationResult::valid();

    if model.get_opset_version().is_none() {
        result.add_warning("No default-domain opset import specified");
    }

    match &model.graph {
        Some(graph) => result.merge(validate_graph(graph)),
        None => result.add_error("Model does not contain a graph"),
    }

    result
}

/// Validate graph connectivity
///
/// Node inputs must name a graph input, an initializer or an earlier node
/// output. Output identifiers must be unique and every graph output must be
/// produced.
pub fn validate_graph(graph: &GraphProto) -> ValidationResult {
    let mut result = ValidationResult::valid();
    let mut known_tensors: HashSet<&str> = HashSet::new();

    for input in &graph.input {
        if input.name.is_empty() {
            result.add_error("Graph input has empty name");
        } else {
            known_tensors.insert(&input.name);
        }
    }

    for init in &graph.initializer {
        if init.name.trim().is_empty() {
            result.add_error("Initializer has empty name");
        } else {
            known_tensors.insert(&init.name);
        }
    }

    let mut node_outputs: HashSet<&str> = HashSet::new();
    for (idx, node) in graph.node.iter().enumerate() {
        if node.op_type.is_empty() {
            result.add_error(format!("Node {} has empty op_type", idx));
        }

        for input in &node.input {
            if !input.is_empty() && !known_tensors.contains(input.as_str()) {
                result.add_error(format!(
                    "Node '{}' ({}): input '{}' not found",
                    node.name, node.op_type, input
                ));
            }
        }

        if node.output.is_empty() {
            result.add_warning(format!(
                "Node '{}' ({}) has no outputs",
                node.name, node.op_type
            ));
        }

        for output in &node.output {
            if output.is_empty() {
                continue;
            }
            if !node_outputs.insert(output) {
                result.add_error(format!(
                    "Duplicate output '{}' in node '{}'",
                    output, node.name
                ));
            }
            known_tensors.insert(output);
        }
    }

    for output in &graph.output {
        if output.name.is_empty() {
            result.add_error("Graph output has empty name");
        } else if !known_tensors.contains(output.name.as_str()) {
            result.add_error(format!(
                "Graph output '{}' not produced by any node",
                output.name
            ));
        }
    }

    if graph.output.is_empty() {
        result.add_warning("Graph declares no outputs");
    }

    result
}

/// Fail with [`ImportError::ValidationFailed`] when the model is invalid
pub fn check_model(model: &ModelProto) -> ImportResult<()> {
    let result = validate_model(model);
    for warning in &result.warnings {
        warn!("{}", warning);
    }
    if result.is_valid {
        Ok(())
    } else {
        Err(ImportError::ValidationFailed(result.errors.join("; ")))
    }
}

/// Check if opset version is supported
pub fn is_opset_supported(version: i64) -> bool {
    (SUPPORTED_OPSET_MIN..=SUPPORTED_OPSET_MAX).contains(&version)
}

/// Fail with [`ImportError::UnsupportedOpset`] when the default-domain
/// opset is out of range. A model without one only logs a warning.
pub fn check_opset(model: &ModelProto) -> ImportResult<()> {
    match model.get_opset_version() {
        None => {
            warn!("Model declares no default-domain opset, assuming a supported one");
            Ok(())
        }
        Some(version) if is_opset_supported(version) => Ok(()),
        Some(version) => Err(ImportError::UnsupportedOpset {
            version,
            min: SUPPORTED_OPSET_MIN,
            max: SUPPORTED_OPSET_MAX,
        }),
    }
}
