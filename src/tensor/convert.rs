//! Tensor conversion utilities
//!
//! Decode ONNX TensorProto payloads into the target tensor container.

use ndarray::{Array, ArrayD, IxDyn};

use crate::error::{ImportError, ImportResult};
use crate::proto::tensor_proto::DataType;
use crate::proto::TensorProto;

use super::dtype::{dtype_size, i32_to_dtype};
use super::shape::{dims_to_shape, numel};

/// Target tensor container: dense n-dimensional `f32` array
pub type NDArray = ArrayD<f32>;

/// Convert TensorProto to an f32 ndarray
///
/// This handles both raw_data and typed data formats. Integer and double
/// payloads are cast to f32.
pub fn tensor_to_array_f32(tensor: &TensorProto) -> ImportResult<NDArray> {
    let dtype = i32_to_dtype(tensor.data_type)?;
    let shape = dims_to_shape(&tensor.dims)?;
    let expected_len = numel(&shape)?;

    let data: Vec<f32> = if !tensor.raw_data.is_empty() {
        decode_raw_to_f32(&tensor.raw_data, dtype, expected_len)?
    } else {
        match dtype {
            DataType::Float => tensor.float_data.clone(),
            DataType::Double => tensor.double_data.iter().map(|&v| v as f32).collect(),
            DataType::Int32 | DataType::Int8 | DataType::Uint8 | DataType::Int16 => {
                tensor.int32_data.iter().map(|&v| v as f32).collect()
            }
            DataType::Int64 => tensor.int64_data.iter().map(|&v| v as f32).collect(),
            DataType::Uint64 | DataType::Uint32 => {
                tensor.uint64_data.iter().map(|&v| v as f32).collect()
            }
            _ => {
                return Err(ImportError::InvalidDataType(tensor.data_type));
            }
        }
    };

    if data.len() != expected_len {
        return Err(ImportError::InvalidTensorData(format!(
            "tensor '{}': data length {} does not match shape {:?} (expected {})",
            tensor.name,
            data.len(),
            tensor.dims,
            expected_len
        )));
    }

    Array::from_shape_vec(IxDyn(&shape), data)
        .map_err(|e| ImportError::InvalidTensorData(e.to_string()))
}

/// Copy `array` into a new array of `shape` (row-major element order)
pub fn reshape_array(array: &NDArray, shape: &[usize]) -> ImportResult<NDArray> {
    let data: Vec<f32> = array.iter().copied().collect();
    Array::from_shape_vec(IxDyn(shape), data).map_err(|e| {
        ImportError::InvalidTensorData(format!(
            "cannot reshape {:?} into {:?}: {}",
            array.shape(),
            shape,
            e
        ))
    })
}

// ============================================================================
// Internal helpers
// ============================================================================

fn decode_raw_to_f32(raw: &[u8], dtype: DataType, expected: usize) -> ImportResult<Vec<f32>> {
    let elem_size = dtype_size(dtype)?;
    let byte_len = expected.checked_mul(elem_size).ok_or_else(|| {
        ImportError::InvalidTensorData(format!(
            "raw data size of {} elements * {} bytes overflows",
            expected, elem_size
        ))
    })?;
    if raw.len() != byte_len {
        return Err(ImportError::InvalidTensorData(format!(
            "raw data size {} does not match expected {} * {}",
            raw.len(),
            expected,
            elem_size
        )));
    }

    match dtype {
        DataType::Float => Ok(raw
            .chunks_exact(4)
            .map(|b| f32::from_le_bytes([b[0], b[1], b[2], b[3]]))
            .collect()),
        DataType::Double => Ok(raw
            .chunks_exact(8)
            .map(|b| f64::from_le_bytes([b[0], b[1], b[2], b[3], b[4], b[5], b[6], b[7]]) as f32)
            .collect()),
        DataType::Int32 => Ok(raw
            .chunks_exact(4)
            .map(|b| i32::from_le_bytes([b[0], b[1], b[2], b[3]]) as f32)
            .collect()),
        DataType::Int64 => Ok(raw
            .chunks_exact(8)
            .map(|b| i64::from_le_bytes([b[0], b[1], b[2], b[3], b[4], b[5], b[6], b[7]]) as f32)
            .collect()),
        DataType::Uint8 => Ok(raw.iter().map(|&b| b as f32).collect()),
        DataType::Int8 => Ok(raw.iter().map(|&b| b as i8 as f32).collect()),
        _ => Err(ImportError::InvalidDataType(dtype as i32)),
    }
}
