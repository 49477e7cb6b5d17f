//! Extension methods for ONNX protobuf types
//!
//! Helpers for reading models and for assembling small graphs by hand.

use super::onnx::*;

// ============================================================================
// ModelProto extensions
// ============================================================================

impl ModelProto {
    /// Get the opset version for the default domain
    pub fn get_opset_version(&self) -> Option<i64> {
        self.opset_import
            .iter()
            .find(|op| op.domain.is_empty() || op.domain == "ai.onnx")
            .map(|op| op.version)
    }
}

// ============================================================================
// NodeProto extensions
// ============================================================================

impl NodeProto {
    /// Trimmed node name, `None` when the name is blank
    pub fn explicit_name(&self) -> Option<&str> {
        let name = self.name.trim();
        (!name.is_empty()).then_some(name)
    }

    /// Name used in error messages: the node name or its op type
    pub fn display_name(&self) -> &str {
        self.explicit_name().unwrap_or(&self.op_type)
    }
}

// ============================================================================
// ValueInfoProto extensions
// ============================================================================

impl ValueInfoProto {
    /// Get the shape dimensions if available
    pub fn get_shape(&self) -> Option<Vec<i64>> {
        self.r#type.as_ref().and_then(|t| {
            t.value.as_ref().and_then(|v| match v {
                type_proto::Value::TensorType(tensor) => tensor.shape.as_ref().map(|s| {
                    s.dim
                        .iter()
                        .map(|d| match &d.value {
                            Some(tensor_shape_proto::dimension::Value::DimValue(v)) => *v,
                            Some(tensor_shape_proto::dimension::Value::DimParam(_)) => -1,
                            None => -1,
                        })
                        .collect()
                }),
            })
        })
    }
}

// ============================================================================
// AttributeProto extensions
// ============================================================================

impl AttributeProto {
    /// Discriminator as enum, `Undefined` for unknown values
    pub fn attr_type(&self) -> attribute_proto::AttributeType {
        attribute_proto::AttributeType::try_from(self.r#type)
            .unwrap_or(attribute_proto::AttributeType::Undefined)
    }

    /// Create a new integer attribute
    pub fn new_int(name: &str, value: i64) -> Self {
        Self {
            name: name.to_string(),
            i: value,
            r#type: attribute_proto::AttributeType::Int as i32,
            ..Default::default()
        }
    }

    /// Create a new float attribute
    pub fn new_float(name: &str, value: f32) -> Self {
        Self {
            name: name.to_string(),
            f: value,
            r#type: attribute_proto::AttributeType::Float as i32,
            ..Default::default()
        }
    }

    /// Create a new string attribute
    pub fn new_string(name: &str, value: &str) -> Self {
        Self {
            name: name.to_string(),
            s: value.as_bytes().to_vec(),
            r#type: attribute_proto::AttributeType::String as i32,
            ..Default::default()
        }
    }

    /// Create a new ints attribute
    pub fn new_ints(name: &str, values: Vec<i64>) -> Self {
        Self {
            name: name.to_string(),
            ints: values,
            r#type: attribute_proto::AttributeType::Ints as i32,
            ..Default::default()
        }
    }

    /// Create a new floats attribute
    pub fn new_floats(name: &str, values: Vec<f32>) -> Self {
        Self {
            name: name.to_string(),
            floats: values,
            r#type: attribute_proto::AttributeType::Floats as i32,
            ..Default::default()
        }
    }
}

// ============================================================================
// Helper functions
// ============================================================================

/// Create a new ValueInfoProto for a tensor
pub fn make_tensor_value_info(name: &str, elem_type: i32, shape: &[i64]) -> ValueInfoProto {
    ValueInfoProto {
        name: name.to_string(),
        r#type: Some(TypeProto {
            value: Some(type_proto::Value::TensorType(type_proto::Tensor {
                elem_type,
                shape: Some(TensorShapeProto {
                    dim: shape
                        .iter()
                        .map(|&d| tensor_shape_proto::Dimension {
                            value: Some(tensor_shape_proto::dimension::Value::DimValue(d)),
                            denotation: String::new(),
                        })
                        .collect(),
                }),
            })),
            denotation: String::new(),
        }),
        doc_string: String::new(),
    }
}

/// Create a ValueInfoProto carrying only a name
pub fn make_value_info(name: &str) -> ValueInfoProto {
    ValueInfoProto {
        name: name.to_string(),
        ..Default::default()
    }
}

/// Create a new NodeProto
pub fn make_node(op_type: &str, inputs: &[&str], outputs: &[&str], name: &str) -> NodeProto {
    NodeProto {
        op_type: op_type.to_string(),
        input: inputs.iter().map(|s| s.to_string()).collect(),
        output: outputs.iter().map(|s| s.to_string()).collect(),
        name: name.to_string(),
        ..Default::default()
    }
}

/// Create a FLOAT initializer from dims and values
pub fn make_float_tensor(name: &str, dims: &[i64], values: Vec<f32>) -> TensorProto {
    TensorProto {
        name: name.to_string(),
        dims: dims.to_vec(),
        data_type: tensor_proto::DataType::Float as i32,
        float_data: values,
        ..Default::default()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_explicit_name() {
        let mut node = make_node("Relu", &["x"], &["y"], "  ");
        assert_eq!(node.explicit_name(), None);
        assert_eq!(node.display_name(), "Relu");

        node.name = " relu_1 ".to_string();
        assert_eq!(node.explicit_name(), Some("relu_1"));
    }

    #[test]
    fn test_make_tensor_value_info() {
        let vi = make_tensor_value_info("test", 1, &[1, 3, 224, 224]);
        assert_eq!(vi.name, "test");
        assert_eq!(vi.get_shape(), Some(vec![1, 3, 224, 224]));
    }

    #[test]
    fn test_attr_type() {
        let attr = AttributeProto::new_ints("pads", vec![1, 1]);
        assert_eq!(attr.attr_type(), attribute_proto::AttributeType::Ints);

        let legacy = AttributeProto {
            r#type: 999,
            ..Default::default()
        };
        assert_eq!(legacy.attr_type(), attribute_proto::AttributeType::Undefined);
    }

    #[test]
    fn test_opset_version() {
        let model = ModelProto {
            opset_import: vec![
                OperatorSetIdProto {
                    domain: "ai.onnx.ml".to_string(),
                    version: 2,
                },
                OperatorSetIdProto {
                    domain: String::new(),
                    version: 7,
                },
            ],
            ..Default::default()
        };
        assert_eq!(model.get_opset_version(), Some(7));
    }
}
