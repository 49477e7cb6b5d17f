//! Target operator registry
//!
//! Lists the operators the symbolic graph can be built from, together with
//! the number of output slots each one exposes.

use std::sync::OnceLock;

use rustc_hash::FxHashMap;

use crate::attr::Attrs;

/// How many outputs an operator node exposes
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OutputArity {
    /// Always the same count
    Fixed(usize),
    /// Read from an integer attribute, with a default when absent
    Attr {
        /// Attribute holding the count
        name: &'static str,
        /// Count used when the attribute is absent
        default: usize,
    },
}

/// Definition of a target operator
#[derive(Debug, PartialEq, Eq)]
pub struct OpDef {
    /// Operator name as used by the target framework
    pub name: &'static str,
    /// Output slot rule
    pub outputs: OutputArity,
}

impl OpDef {
    const fn fixed(name: &'static str, count: usize) -> Self {
        Self {
            name,
            outputs: OutputArity::Fixed(count),
        }
    }

    /// Number of outputs a node built with `attrs` exposes
    ///
    /// Returns `None` when the count attribute is not a non-negative integer.
    pub fn num_outputs(&self, attrs: &Attrs) -> Option<usize> {
        match self.outputs {
            OutputArity::Fixed(count) => Some(count),
            OutputArity::Attr { name, default } => match attrs.get(name) {
                None => Some(default),
                Some(value) => value.as_int().and_then(|v| usize::try_from(v).ok()),
            },
        }
    }
}

static TARGET_OPS: &[OpDef] = &[
    // Layers
    OpDef::fixed("Convolution", 1),
    OpDef::fixed("Deconvolution", 1),
    OpDef::fixed("FullyConnected", 1),
    OpDef::fixed("Pooling", 1),
    OpDef::fixed("BatchNorm", 1),
    OpDef::fixed("Dropout", 1),
    OpDef::fixed("LeakyReLU", 1),
    OpDef::fixed("LRN", 1),
    OpDef::fixed("Flatten", 1),
    OpDef::fixed("Reshape", 1),
    OpDef::fixed("Concat", 1),
    OpDef::fixed("Pad", 1),
    OpDef::fixed("Cast", 1),
    OpDef {
        name: "SliceChannel",
        outputs: OutputArity::Attr {
            name: "num_outputs",
            default: 1,
        },
    },
    // Activations
    OpDef::fixed("relu", 1),
    OpDef::fixed("sigmoid", 1),
    OpDef::fixed("tanh", 1),
    OpDef::fixed("softmax", 1),
    // Elementwise
    OpDef::fixed("broadcast_add", 1),
    OpDef::fixed("broadcast_sub", 1),
    OpDef::fixed("broadcast_mul", 1),
    OpDef::fixed("broadcast_div", 1),
    OpDef::fixed("broadcast_power", 1),
    OpDef::fixed("negative", 1),
    OpDef::fixed("abs", 1),
    OpDef::fixed("reciprocal", 1),
    OpDef::fixed("floor", 1),
    OpDef::fixed("ceil", 1),
    OpDef::fixed("sqrt", 1),
    OpDef::fixed("exp", 1),
    OpDef::fixed("log", 1),
    OpDef::fixed("clip", 1),
    OpDef::fixed("add_n", 1),
    OpDef::fixed("maximum", 1),
    OpDef::fixed("minimum", 1),
    OpDef::fixed("_copy", 1),
    OpDef::fixed("_mul_scalar", 1),
    // Linear algebra
    OpDef::fixed("linalg_gemm", 1),
    OpDef::fixed("dot", 1),
    // Shape
    OpDef::fixed("transpose", 1),
    OpDef::fixed("expand_dims", 1),
    // Reductions
    OpDef::fixed("max", 1),
    OpDef::fixed("min", 1),
    OpDef::fixed("sum", 1),
    OpDef::fixed("mean", 1),
    OpDef::fixed("prod", 1),
    OpDef::fixed("argmax", 1),
    OpDef::fixed("argmin", 1),
    // Random
    OpDef::fixed("random_uniform", 1),
    OpDef::fixed("random_normal", 1),
];

/// Look up a target operator by name
pub fn lookup(name: &str) -> Option<&'static OpDef> {
    static INDEX: OnceLock<FxHashMap<&'static str, &'static OpDef>> = OnceLock::new();

    INDEX
        .get_or_init(|| TARGET_OPS.iter().map(|op| (op.name, op)).collect())
        .get(name)
        .copied()
}

/// All registered target operators
pub fn target_ops() -> &'static [OpDef] {
    TARGET_OPS
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::attr::AttrValue;

    #[test]
    fn test_lookup() {
        let conv = lookup("Convolution").unwrap();
        assert_eq!(conv.name, "Convolution");
        assert!(lookup("Conv").is_none());
    }

    #[test]
    fn test_names_unique() {
        let mut names: Vec<&str> = target_ops().iter().map(|op| op.name).collect();
        names.sort_unstable();
        names.dedup();
        assert_eq!(names.len(), target_ops().len());
    }

    #[test]
    fn test_num_outputs_from_attr() {
        let split = lookup("SliceChannel").unwrap();
        let mut attrs = Attrs::new();
        assert_eq!(split.num_outputs(&attrs), Some(1));

        attrs.insert("num_outputs".to_string(), AttrValue::Int(3));
        assert_eq!(split.num_outputs(&attrs), Some(3));

        attrs.insert("num_outputs".to_string(), AttrValue::Int(-1));
        assert_eq!(split.num_outputs(&attrs), None);
    }
}
