//! Tensor utilities for ONNX initializers
//!
//! This module provides utilities for working with ONNX tensors:
//! - Data type mappings (`dtype`)
//! - Shape utilities (`shape`)
//! - Decoding TensorProto into the target [`NDArray`] (`convert`)
//!
//! # Example
//!
//! ```ignore
//! use onnx_symbol_import::tensor::tensor_to_array_f32;
//!
//! let weight = tensor_to_array_f32(&initializer)?;
//! assert_eq!(weight.shape(), &[64, 3, 7, 7]);
//! ```

pub mod convert;
pub mod dtype;
pub mod shape;

// Re-export commonly used items
pub use convert::{reshape_array, tensor_to_array_f32, NDArray};
pub use dtype::{dtype_from_name, dtype_size, i32_to_dtype, target_dtype_name};
pub use shape::{channel_broadcast_shape, dims_to_shape, numel};
