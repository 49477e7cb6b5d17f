//! ONNX data type mappings
//!
//! Maps ONNX TensorProto data types to element sizes and to the dtype names
//! understood by target operators.

use crate::error::{ImportError, ImportResult};
use crate::proto::tensor_proto::DataType;

/// Size in bytes for each ONNX data type
pub fn dtype_size(dtype: DataType) -> ImportResult<usize> {
    match dtype {
        DataType::Float => Ok(4),
        DataType::Uint8 => Ok(1),
        DataType::Int8 => Ok(1),
        DataType::Uint16 => Ok(2),
        DataType::Int16 => Ok(2),
        DataType::Int32 => Ok(4),
        DataType::Int64 => Ok(8),
        DataType::Bool => Ok(1),
        DataType::Float16 => Ok(2),
        DataType::Double => Ok(8),
        DataType::Uint32 => Ok(4),
        DataType::Uint64 => Ok(8),
        DataType::Bfloat16 => Ok(2),
        DataType::Undefined => Err(ImportError::InvalidDataType(0)),
        _ => Err(ImportError::InvalidDataType(dtype as i32)),
    }
}

/// Convert i32 to DataType enum
pub fn i32_to_dtype(value: i32) -> ImportResult<DataType> {
    DataType::try_from(value).map_err(|_| ImportError::InvalidDataType(value))
}

/// Parse the upper-case type names used by early `Cast` nodes (`"FLOAT"`, `"INT64"`)
pub fn dtype_from_name(name: &str) -> Option<DataType> {
    DataType::from_str_name(name)
}

/// Target dtype name for an ONNX data type
///
/// Returns `None` for types the target tensor container cannot hold.
pub fn target_dtype_name(dtype: DataType) -> Option<&'static str> {
    match dtype {
        DataType::Float => Some("float32"),
        DataType::Double => Some("float64"),
        DataType::Float16 => Some("float16"),
        DataType::Uint8 => Some("uint8"),
        DataType::Int8 => Some("int8"),
        DataType::Int32 => Some("int32"),
        DataType::Int64 => Some("int64"),
        _ => None,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_dtype_size() {
        assert_eq!(dtype_size(DataType::Float).unwrap(), 4);
        assert_eq!(dtype_size(DataType::Int64).unwrap(), 8);
        assert_eq!(dtype_size(DataType::Uint8).unwrap(), 1);
        assert!(dtype_size(DataType::Undefined).is_err());
    }

    #[test]
    fn test_i32_to_dtype() {
        assert_eq!(i32_to_dtype(1).unwrap(), DataType::Float);
        assert_eq!(i32_to_dtype(7).unwrap(), DataType::Int64);
        assert!(i32_to_dtype(999).is_err());
    }

    #[test]
    fn test_dtype_from_name() {
        assert_eq!(dtype_from_name("FLOAT"), Some(DataType::Float));
        assert_eq!(dtype_from_name("INT32"), Some(DataType::Int32));
        assert_eq!(dtype_from_name("float"), None);
    }

    #[test]
    fn test_target_dtype_name() {
        assert_eq!(target_dtype_name(DataType::Float), Some("float32"));
        assert_eq!(target_dtype_name(DataType::Int64), Some("int64"));
        assert_eq!(target_dtype_name(DataType::String), None);
    }
}
