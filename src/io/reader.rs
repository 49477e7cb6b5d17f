//! ONNX model reader
//!
//! Load ONNX models from files or bytes.

use std::fs::File;
use std::io::{BufReader, Read};
use std::path::Path;

use prost::Message;

use crate::error::{ImportError, ImportResult};
use crate::proto::{GraphProto, ModelProto};

/// Load an ONNX model from a file path
///
/// # Example
///
/// ```ignore
/// use onnx_symbol_import::io::load_model;
///
/// let model = load_model("model.onnx")?;
/// println!("Model IR version: {}", model.ir_version);
/// ```
pub fn load_model<P: AsRef<Path>>(path: P) -> ImportResult<ModelProto> {
    let path = path.as_ref();

    let file = File::open(path).map_err(|e| {
        ImportError::InvalidModel(format!("Failed to open file '{}': {}", path.display(), e))
    })?;

    let mut reader = BufReader::new(file);
    let mut buffer = Vec::new();
    reader.read_to_end(&mut buffer)?;

    load_model_from_bytes(&buffer)
}

/// Decode an ONNX model from its protobuf encoding
pub fn load_model_from_bytes(bytes: &[u8]) -> ImportResult<ModelProto> {
    Ok(ModelProto::decode(bytes)?)
}

/// Load only the graph from an ONNX model file
pub fn load_graph<P: AsRef<Path>>(path: P) -> ImportResult<GraphProto> {
    let model = load_model(path)?;
    model
        .graph
        .ok_or_else(|| ImportError::InvalidModel("Model does not contain a graph".to_string()))
}

/// Model metadata shown before an import
#[derive(Debug, Clone)]
pub struct ModelInfo {
    /// IR version
    pub ir_version: i64,
    /// Producer name
    pub producer_name: String,
    /// Producer version
    pub producer_version: String,
    /// Default-domain opset, if declared
    pub opset_version: Option<i64>,
    /// Graph name
    pub graph_name: String,
    /// Number of nodes
    pub node_count: usize,
    /// Number of initializers
    pub initializer_count: usize,
    /// Input names
    pub inputs: Vec<String>,
    /// Output names
    pub outputs: Vec<String>,
}

impl ModelInfo {
    /// Extract metadata from a model
    pub fn from_model(model: &ModelProto) -> Self {
        let graph = model.graph.as_ref();

        Self {
            ir_version: model.ir_version,
            producer_name: model.producer_name.clone(),
            producer_version: model.producer_version.clone(),
            opset_version: model.get_opset_version(),
            graph_name: graph.map(|g| g.name.clone()).unwrap_or_default(),
            node_count: graph.map(|g| g.node.len()).unwrap_or(0),
            initializer_count: graph.map(|g| g.initializer.len()).unwrap_or(0),
            inputs: graph
                .map(|g| g.input.iter().map(|i| i.name.clone()).collect())
                .unwrap_or_default(),
            outputs: graph
                .map(|g| g.output.iter().map(|o| o.name.clone()).collect())
                .unwrap_or_default(),
        }
    }
}
