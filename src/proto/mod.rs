//! ONNX Protocol Buffer types
//!
//! The message definitions are checked in (`onnx.rs`) rather than generated at
//! build time, so building the crate does not require `protoc`.
//! Additional extension methods are provided in the `extensions` submodule.

/// ONNX protobuf types
#[allow(missing_docs)]
#[allow(clippy::all)]
pub mod onnx;

// Re-export commonly used types at module level
pub use onnx::{
    AttributeProto, GraphProto, ModelProto, NodeProto, OperatorSetIdProto, TensorProto,
    TensorShapeProto, TypeProto, ValueInfoProto,
};

// Re-export submodules for nested types
pub use onnx::attribute_proto;
pub use onnx::tensor_proto;
pub use onnx::tensor_shape_proto;
pub use onnx::type_proto;

/// Extension methods for ONNX protobuf types
pub mod extensions;
