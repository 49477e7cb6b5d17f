//! # ONNX Symbol Import
//!
//! Translate ONNX models into a symbolic compute graph built from
//! MXNet-style operators, together with the model's parameter tensors.
//!
//! ## Features
//!
//! - **Operator Translation**: table-driven mapping of ONNX operators and
//!   attributes onto target operators
//! - **Structural Fix-Ups**: bias flags, channel counts, bias broadcasting,
//!   Gemm specialization and Dropout outputs
//! - **Parameters**: initializers decoded into `ndarray` tensors under
//!   canonical `param_N` names
//!
//! ## Example
//!
//! ```ignore
//! use onnx_symbol_import::prelude::*;
//!
//! let (symbol, params) = import_model("model.onnx", &ImportOptions::default())?;
//! println!("outputs: {:?}", symbol.list_outputs());
//! println!("arguments: {:?}", symbol.list_arguments());
//! ```

#![warn(missing_docs)]
#![deny(unsafe_code)]

pub mod attr;
pub mod builder;
pub mod error;
pub mod fixup;
pub mod graph;
pub mod io;
pub mod ops;
pub mod proto;
pub mod symbol;
pub mod tensor;

// ============================================================================
// Prelude module for convenient imports
// ============================================================================

/// Prelude module - import commonly used types with `use onnx_symbol_import::prelude::*`
pub mod prelude {
    pub use crate::attr::{AttrValue, Attrs};
    pub use crate::builder::GraphBuilder;
    pub use crate::error::{ImportError, ImportResult};
    pub use crate::graph::Params;
    pub use crate::io::{
        import_model, import_model_from_bytes, import_onnx_model, load_model, ImportOptions,
    };
    pub use crate::ops::OpTable;
    pub use crate::proto::onnx::*;
    pub use crate::symbol::Symbol;
    pub use crate::tensor::NDArray;
}

// ============================================================================
// Crate-level re-exports
// ============================================================================

pub use builder::GraphBuilder;
pub use error::{ImportError, ImportResult};
pub use io::{SUPPORTED_OPSET_MAX, SUPPORTED_OPSET_MIN};

/// Crate version
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
