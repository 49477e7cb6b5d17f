//! Node attribute parsing
//!
//! Converts the typed ONNX attribute list of a node into an ordered
//! name → [`AttrValue`] map. Exactly one value field may be populated per
//! attribute; tensor, sparse-tensor and graph values are rejected.

use std::fmt;

use indexmap::IndexMap;

use crate::error::{ImportError, ImportResult};
use crate::proto::attribute_proto::AttributeType;
use crate::proto::AttributeProto;

/// Attribute value, on either side of the translation
///
/// `Bool` only appears in target attributes (e.g. `no_bias`).
#[derive(Debug, Clone, PartialEq)]
pub enum AttrValue {
    /// Single float
    Float(f32),
    /// Single integer
    Int(i64),
    /// UTF-8 string
    String(String),
    /// Flag
    Bool(bool),
    /// Float list
    Floats(Vec<f32>),
    /// Integer list
    Ints(Vec<i64>),
    /// String list
    Strings(Vec<String>),
}

/// Attribute map, preserving declaration order
pub type Attrs = IndexMap<String, AttrValue>;

impl AttrValue {
    /// Integer view; bools read as 0/1
    pub fn as_int(&self) -> Option<i64> {
        match self {
            AttrValue::Int(v) => Some(*v),
            AttrValue::Bool(v) => Some(*v as i64),
            _ => None,
        }
    }

    /// Float view; integers are widened
    pub fn as_float(&self) -> Option<f32> {
        match self {
            AttrValue::Float(v) => Some(*v),
            AttrValue::Int(v) => Some(*v as f32),
            _ => None,
        }
    }

    /// String view
    pub fn as_str(&self) -> Option<&str> {
        match self {
            AttrValue::String(v) => Some(v),
            _ => None,
        }
    }

    /// Flag view; integers are non-zero tests
    pub fn as_bool(&self) -> Option<bool> {
        match self {
            AttrValue::Bool(v) => Some(*v),
            AttrValue::Int(v) => Some(*v != 0),
            _ => None,
        }
    }

    /// Integer list view
    pub fn as_ints(&self) -> Option<&[i64]> {
        match self {
            AttrValue::Ints(v) => Some(v),
            _ => None,
        }
    }

    /// Float list view
    pub fn as_floats(&self) -> Option<&[f32]> {
        match self {
            AttrValue::Floats(v) => Some(v),
            _ => None,
        }
    }
}

/// Renders values the way target attribute dictionaries print them:
/// tuples for lists, `True`/`False` for flags.
impl fmt::Display for AttrValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        fn tuple<T: fmt::Display>(f: &mut fmt::Formatter<'_>, items: &[T]) -> fmt::Result {
            write!(f, "(")?;
            for (i, item) in items.iter().enumerate() {
                if i > 0 {
                    write!(f, ", ")?;
                }
                write!(f, "{}", item)?;
            }
            if items.len() == 1 {
                write!(f, ",")?;
            }
            write!(f, ")")
        }

        match self {
            AttrValue::Float(v) => write!(f, "{}", v),
            AttrValue::Int(v) => write!(f, "{}", v),
            AttrValue::String(v) => write!(f, "{}", v),
            AttrValue::Bool(true) => write!(f, "True"),
            AttrValue::Bool(false) => write!(f, "False"),
            AttrValue::Floats(v) => tuple(f, v),
            AttrValue::Ints(v) => tuple(f, v),
            AttrValue::Strings(v) => tuple(f, v),
        }
    }
}

/// Parse a node's attribute list
///
/// No defaults are injected; conversion functions supply their own.
pub fn parse_attributes(attributes: &[AttributeProto]) -> ImportResult<Attrs> {
    let mut attrs = Attrs::with_capacity(attributes.len());

    for attr in attributes {
        let value = parse_attribute(attr)?;
        if attrs.insert(attr.name.clone(), value).is_some() {
            return Err(ImportError::DuplicateAttribute(attr.name.clone()));
        }
    }

    Ok(attrs)
}

/// Parse a single attribute into its value
pub fn parse_attribute(attr: &AttributeProto) -> ImportResult<AttrValue> {
    let mut value = scalar_value(attr);

    let lists = [
        (!attr.floats.is_empty()).then(|| AttrValue::Floats(attr.floats.clone())),
        (!attr.ints.is_empty()).then(|| AttrValue::Ints(attr.ints.clone())),
        (!attr.strings.is_empty()).then(|| {
            AttrValue::Strings(
                attr.strings
                    .iter()
                    .map(|s| String::from_utf8_lossy(s).into_owned())
                    .collect(),
            )
        }),
    ];
    for list in lists.into_iter().flatten() {
        if value.is_some() {
            return Err(ImportError::DuplicateAttributeType(attr.name.clone()));
        }
        value = Some(list);
    }

    if let Some(kind) = unsupported_kind(attr) {
        return Err(ImportError::UnsupportedAttributeKind {
            attribute: attr.name.clone(),
            kind,
        });
    }

    value.ok_or_else(|| ImportError::UnparsableAttribute(attr.name.clone()))
}

/// Scalar value selected by the type discriminator
///
/// Attributes written before the discriminator existed (UNDEFINED) fall back
/// to the first non-default scalar among float, int and string.
fn scalar_value(attr: &AttributeProto) -> Option<AttrValue> {
    let string = || AttrValue::String(String::from_utf8_lossy(&attr.s).into_owned());

    match attr.attr_type() {
        AttributeType::Float => Some(AttrValue::Float(attr.f)),
        AttributeType::Int => Some(AttrValue::Int(attr.i)),
        AttributeType::String => Some(string()),
        AttributeType::Undefined => {
            if attr.f != 0.0 {
                Some(AttrValue::Float(attr.f))
            } else if attr.i != 0 {
                Some(AttrValue::Int(attr.i))
            } else if !attr.s.is_empty() {
                Some(string())
            } else {
                None
            }
        }
        _ => None,
    }
}

fn unsupported_kind(attr: &AttributeProto) -> Option<&'static str> {
    if attr.t.is_some() {
        Some("t")
    } else if attr.g.is_some() {
        Some("g")
    } else if attr.sparse_tensor.is_some() {
        Some("sparse_tensor")
    } else if !attr.tensors.is_empty() {
        Some("tensors")
    } else if !attr.graphs.is_empty() {
        Some("graphs")
    } else if !attr.sparse_tensors.is_empty() {
        Some("sparse_tensors")
    } else {
        None
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::proto::{GraphProto, TensorProto};

    #[test]
    fn test_parse_scalars_and_lists() {
        let attrs = parse_attributes(&[
            AttributeProto::new_float("alpha", 0.5),
            AttributeProto::new_int("group", 2),
            AttributeProto::new_string("mode", "reflect"),
            AttributeProto::new_ints("kernel_shape", vec![3, 3]),
            AttributeProto::new_floats("scales", vec![1.0, 2.0]),
        ])
        .unwrap();

        assert_eq!(attrs["alpha"], AttrValue::Float(0.5));
        assert_eq!(attrs["group"], AttrValue::Int(2));
        assert_eq!(attrs["mode"], AttrValue::String("reflect".to_string()));
        assert_eq!(attrs["kernel_shape"], AttrValue::Ints(vec![3, 3]));
        assert_eq!(attrs["scales"], AttrValue::Floats(vec![1.0, 2.0]));
        let keys: Vec<&str> = attrs.keys().map(String::as_str).collect();
        assert_eq!(keys, ["alpha", "group", "mode", "kernel_shape", "scales"]);
    }

    #[test]
    fn test_zero_valued_scalar_with_discriminator() {
        let attrs = parse_attributes(&[AttributeProto::new_int("transB", 0)]).unwrap();
        assert_eq!(attrs["transB"], AttrValue::Int(0));
    }

    #[test]
    fn test_legacy_untyped_attribute() {
        let attr = AttributeProto {
            name: "axis".to_string(),
            i: 1,
            ..Default::default()
        };
        assert_eq!(parse_attribute(&attr).unwrap(), AttrValue::Int(1));
    }

    #[test]
    fn test_scalar_and_list_is_duplicate() {
        let mut attr = AttributeProto::new_int("axes", 1);
        attr.ints = vec![1, 2];

        assert!(matches!(
            parse_attribute(&attr),
            Err(ImportError::DuplicateAttributeType(name)) if name == "axes"
        ));
    }

    #[test]
    fn test_tensor_attribute_rejected() {
        let attr = AttributeProto {
            name: "value".to_string(),
            t: Some(TensorProto::default()),
            r#type: AttributeType::Tensor as i32,
            ..Default::default()
        };

        assert!(matches!(
            parse_attribute(&attr),
            Err(ImportError::UnsupportedAttributeKind { kind: "t", .. })
        ));
    }

    #[test]
    fn test_graph_list_attribute_rejected() {
        let attr = AttributeProto {
            name: "branches".to_string(),
            graphs: vec![GraphProto::default()],
            r#type: AttributeType::Graphs as i32,
            ..Default::default()
        };

        assert!(matches!(
            parse_attribute(&attr),
            Err(ImportError::UnsupportedAttributeKind { kind: "graphs", .. })
        ));
    }

    #[test]
    fn test_empty_attribute_unparsable() {
        let attr = AttributeProto {
            name: "pads".to_string(),
            r#type: AttributeType::Ints as i32,
            ..Default::default()
        };

        assert!(matches!(
            parse_attribute(&attr),
            Err(ImportError::UnparsableAttribute(name)) if name == "pads"
        ));
    }

    #[test]
    fn test_repeated_name_rejected() {
        let result = parse_attributes(&[
            AttributeProto::new_int("axis", 0),
            AttributeProto::new_int("axis", 1),
        ]);
        assert!(matches!(result, Err(ImportError::DuplicateAttribute(_))));
    }

    #[test]
    fn test_display() {
        assert_eq!(AttrValue::Ints(vec![3, 3]).to_string(), "(3, 3)");
        assert_eq!(AttrValue::Ints(vec![2]).to_string(), "(2,)");
        assert_eq!(AttrValue::Bool(false).to_string(), "False");
        assert_eq!(AttrValue::Float(0.5).to_string(), "0.5");
    }
}
