//! Error types for onnx-symbol-import
//!
//! Every failure is terminal for the import call that raised it.

use thiserror::Error;

/// Main error type for ONNX import operations
#[derive(Error, Debug)]
pub enum ImportError {
    /// Operator is neither in the identity set nor in the conversion map
    #[error("Operator {0} not implemented")]
    UnsupportedOperator(String),

    /// Conversion produced an operator the target registry does not know
    #[error("Unable to map operator {0} to a target symbol")]
    UnknownTargetOperator(String),

    /// Attribute carries no value the parser can classify
    #[error("Cannot parse attribute: {0}")]
    UnparsableAttribute(String),

    /// Attribute carries more than one populated value field
    #[error("Only one type of attribute value is allowed: {0}")]
    DuplicateAttributeType(String),

    /// Two attributes with the same name on one node
    #[error("Attribute {0} declared more than once")]
    DuplicateAttribute(String),

    /// Tensor, sparse tensor or graph valued attribute
    #[error("Attribute {attribute}: field {kind} is not supported")]
    UnsupportedAttributeKind {
        /// Attribute name
        attribute: String,
        /// Offending field kind
        kind: &'static str,
    },

    /// Attribute value that the conversion cannot express
    #[error("Operator {op}: invalid attribute {attribute}: {reason}")]
    InvalidAttribute {
        /// ONNX operator
        op: String,
        /// Attribute name
        attribute: String,
        /// Why the value was rejected
        reason: String,
    },

    /// Initializer without a name
    #[error("Tensor's name is required")]
    InvalidTensorName,

    /// Graph input declared twice
    #[error("Graph input {0} declared more than once")]
    DuplicateInput(String),

    /// Node output reusing an identifier that is already registered
    #[error("Node output {0} is already defined")]
    DuplicateNodeOutput(String),

    /// Input count outside what the operator accepts
    #[error("Unexpected number of inputs for {op}: {count}")]
    UnexpectedInputArity {
        /// Operator name
        op: String,
        /// Actual input count
        count: usize,
    },

    /// Declared output count outside what the operator accepts
    #[error("Unexpected number of outputs for {op}: {count}")]
    UnexpectedOutputArity {
        /// Operator name
        op: String,
        /// Actual output count
        count: usize,
    },

    /// Declared outputs and produced output slots differ
    #[error("Number of output mismatch {declared} vs {produced} in {op}")]
    OutputArityMismatch {
        /// ONNX operator
        op: String,
        /// Output identifiers kept for the node
        declared: usize,
        /// Output slots of the built symbol
        produced: usize,
    },

    /// Weight input does not name a parameter
    #[error("Unable to get channels/units for {op}: weight {input} is not a parameter")]
    MissingWeightParameter {
        /// Target operator
        op: String,
        /// Weight input identifier
        input: String,
    },

    /// Weight parameter rank below 2
    #[error("Weights shape is invalid for {op}: {shape:?}")]
    InvalidWeightShape {
        /// Target operator
        op: String,
        /// Weight shape
        shape: Vec<usize>,
    },

    /// Bias for a broadcast add has the wrong arity or rank
    #[error("Invalid bias shape: {0}")]
    InvalidBiasShape(String),

    /// Bias input does not name a parameter
    #[error("Bias {input} of {op} is not a parameter")]
    MissingBiasParameter {
        /// Operator name
        op: String,
        /// Bias input identifier
        input: String,
    },

    /// Node input that no earlier node, input or parameter provides
    #[error("Node {node}: input {input} is not defined")]
    UnresolvedInput {
        /// Node name or operator
        node: String,
        /// Input identifier
        input: String,
    },

    /// Graph output that no node produces
    #[error("Graph output {0} is not produced by any node")]
    UnresolvedOutput(String),

    /// Graph declares no outputs
    #[error("Graph declares no outputs")]
    NoOutputs,

    /// Symbol composition failed
    #[error("Cannot compose symbol: {0}")]
    SymbolCompose(String),

    /// Invalid tensor data type
    #[error("Invalid data type: {0}")]
    InvalidDataType(i32),

    /// Tensor payload does not match its declared shape
    #[error("Invalid tensor data: {0}")]
    InvalidTensorData(String),

    /// Unsupported opset version
    #[error("Unsupported opset version: {version}, expected {min}..={max}")]
    UnsupportedOpset {
        /// Actual version
        version: i64,
        /// Minimum supported
        min: i64,
        /// Maximum supported
        max: i64,
    },

    /// Invalid model
    #[error("Invalid model: {0}")]
    InvalidModel(String),

    /// Model validation failed
    #[error("Model validation failed: {0}")]
    ValidationFailed(String),

    /// IO error
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// Protobuf decode error
    #[error("Protobuf decode error: {0}")]
    ProtoDecode(#[from] prost::DecodeError),
}

/// Result type alias for import operations
pub type ImportResult<T> = Result<T, ImportError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_display() {
        let err = ImportError::UnsupportedOperator("Loop".to_string());
        assert_eq!(err.to_string(), "Operator Loop not implemented");
    }

    #[test]
    fn test_output_mismatch_display() {
        let err = ImportError::OutputArityMismatch {
            op: "Split".to_string(),
            declared: 3,
            produced: 2,
        };
        let msg = err.to_string();
        assert!(msg.contains("3 vs 2"));
        assert!(msg.contains("Split"));
    }

    #[test]
    fn test_unsupported_opset() {
        let err = ImportError::UnsupportedOpset {
            version: 13,
            min: 1,
            max: 9,
        };
        assert!(err.to_string().contains("13"));
    }
}
