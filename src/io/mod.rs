//! ONNX I/O module
//!
//! Load ONNX models, check them, and run an import end to end.
//!
//! # Example
//!
//! ```ignore
//! use onnx_symbol_import::io::{import_model, ImportOptions};
//!
//! let (symbol, params) = import_model("model.onnx", &ImportOptions::default())?;
//! println!("{:?}", symbol.list_outputs());
//! ```

pub mod reader;
pub mod validation;

pub use reader::{load_graph, load_model, load_model_from_bytes, ModelInfo};
pub use validation::{
    check_model, check_opset, is_opset_supported, validate_graph, validate_model,
    ValidationResult, SUPPORTED_OPSET_MAX, SUPPORTED_OPSET_MIN,
};

use std::path::Path;

use crate::builder::GraphBuilder;
use crate::error::{ImportError, ImportResult};
use crate::graph::Params;
use crate::proto::ModelProto;
use crate::symbol::Symbol;

/// Import options
#[derive(Debug, Clone)]
pub struct ImportOptions {
    /// Validate graph connectivity before translating
    pub validate_input: bool,
    /// Reject models whose default-domain opset is out of range
    pub check_opset: bool,
}

impl Default for ImportOptions {
    fn default() -> Self {
        Self {
            validate_input: true,
            check_opset: true,
        }
    }
}

/// Import an in-memory ONNX model
pub fn import_onnx_model(
    model: &ModelProto,
    options: &ImportOptions,
) -> ImportResult<(Symbol, Params)> {
    if options.check_opset {
        check_opset(model)?;
    }
    if options.validate_input {
        check_model(model)?;
    }

    let graph = model
        .graph
        .as_ref()
        .ok_or_else(|| ImportError::InvalidModel("No graph".to_string()))?;

    GraphBuilder::new().from_onnx(graph)
}

/// Import an ONNX model from its protobuf encoding
pub fn import_model_from_bytes(
    bytes: &[u8],
    options: &ImportOptions,
) -> ImportResult<(Symbol, Params)> {
    let model = load_model_from_bytes(bytes)?;
    import_onnx_model(&model, options)
}

/// Import an ONNX model file
pub fn import_model<P: AsRef<Path>>(
    path: P,
    options: &ImportOptions,
) -> ImportResult<(Symbol, Params)> {
    let model = load_model(path)?;
    import_onnx_model(&model, options)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::proto::extensions::{make_float_tensor, make_node, make_value_info};
    use crate::proto::{AttributeProto, GraphProto, OperatorSetIdProto};
    use prost::Message;

    fn make_test_model(opset: i64) -> ModelProto {
        let mut conv = make_node("Conv", &["X", "W", "B"], &["c"], "conv_0");
        conv.attribute = vec![AttributeProto::new_ints("kernel_shape", vec![1, 1])];

        ModelProto {
            ir_version: 3,
            opset_import: vec![OperatorSetIdProto {
                domain: String::new(),
                version: opset,
            }],
            graph: Some(GraphProto {
                name: "test".to_string(),
                node: vec![conv, make_node("Relu", &["c"], &["Y"], "relu_0")],
                initializer: vec![
                    make_float_tensor("W", &[4, 3, 1, 1], vec![0.5; 12]),
                    make_float_tensor("B", &[4], vec![0.0; 4]),
                ],
                input: vec![
                    make_value_info("X"),
                    make_value_info("W"),
                    make_value_info("B"),
                ],
                output: vec![make_value_info("Y")],
                ..Default::default()
            }),
            ..Default::default()
        }
    }

    #[test]
    fn test_import_onnx_model() {
        let (symbol, params) =
            import_onnx_model(&make_test_model(7), &ImportOptions::default()).unwrap();

        assert_eq!(symbol.op_name(), Some("relu"));
        assert_eq!(symbol.name(), Some("relu_0"));
        assert_eq!(params.len(), 2);
        assert_eq!(params["param_0"].shape(), &[4, 3, 1, 1]);
    }

    #[test]
    fn test_import_from_bytes_matches_in_memory() {
        let model = make_test_model(7);
        let options = ImportOptions::default();

        let (direct, direct_params) = import_onnx_model(&model, &options).unwrap();
        let (decoded, decoded_params) =
            import_model_from_bytes(&model.encode_to_vec(), &options).unwrap();

        assert_eq!(direct.list_outputs(), decoded.list_outputs());
        assert_eq!(direct.list_arguments(), decoded.list_arguments());
        assert_eq!(direct.attrs(), decoded.attrs());
        assert_eq!(direct_params, decoded_params);
    }

    #[test]
    fn test_opset_check() {
        let model = make_test_model(13);
        assert!(matches!(
            import_onnx_model(&model, &ImportOptions::default()),
            Err(ImportError::UnsupportedOpset { version: 13, .. })
        ));

        let options = ImportOptions {
            check_opset: false,
            ..Default::default()
        };
        assert!(import_onnx_model(&model, &options).is_ok());
    }

    #[test]
    fn test_validation_failure() {
        let mut model = make_test_model(7);
        if let Some(graph) = model.graph.as_mut() {
            graph.node[1].input = vec!["nowhere".to_string()];
        }

        assert!(matches!(
            import_onnx_model(&model, &ImportOptions::default()),
            Err(ImportError::ValidationFailed(_))
        ));

        // without validation the builder reports the dangling input itself
        let options = ImportOptions {
            validate_input: false,
            ..Default::default()
        };
        assert!(matches!(
            import_onnx_model(&model, &options),
            Err(ImportError::UnresolvedInput { .. })
        ));
    }

    #[test]
    fn test_missing_graph() {
        let model = ModelProto::default();
        let options = ImportOptions {
            validate_input: false,
            check_opset: false,
        };
        assert!(matches!(
            import_onnx_model(&model, &options),
            Err(ImportError::InvalidModel(_))
        ));
    }
}
