//! Shape utilities for ONNX tensors
//!
//! Conversion between ONNX `i64` dims and target `usize` shapes.

use crate::error::{ImportError, ImportResult};

/// Calculate total number of elements from a target shape
pub fn numel(shape: &[usize]) -> ImportResult<usize> {
    shape
        .iter()
        .try_fold(1usize, |acc, &d| acc.checked_mul(d))
        .ok_or_else(|| {
            ImportError::InvalidTensorData(format!("element count of {:?} overflows", shape))
        })
}

/// Convert ONNX dims into a target shape
///
/// Negative (dynamic) dims cannot describe stored tensor data.
pub fn dims_to_shape(dims: &[i64]) -> ImportResult<Vec<usize>> {
    dims.iter()
        .map(|&d| {
            usize::try_from(d).map_err(|_| {
                ImportError::InvalidTensorData(format!("negative dimension {} in {:?}", d, dims))
            })
        })
        .collect()
}

/// Shape `(1, C, 1, 1)` used to broadcast a per-channel bias over NCHW data
pub fn channel_broadcast_shape(channels: usize) -> Vec<usize> {
    vec![1, channels, 1, 1]
}
