//! Graph translation
//!
//! [`GraphBuilder`] walks an ONNX graph once, in node order, and builds the
//! target symbol incrementally from already-built inputs:
//!
//! 1. initializers become parameters under their foreign names
//! 2. declared inputs become `input_N` / `param_N` variables
//! 3. each node is parsed, translated, fixed up and registered under its
//!    output identifiers
//! 4. declared outputs are collected into the result symbol
//!
//! # Example
//!
//! ```ignore
//! use onnx_symbol_import::builder::GraphBuilder;
//!
//! let (symbol, params) = GraphBuilder::new().from_onnx(&graph)?;
//! println!("outputs: {:?}", symbol.list_outputs());
//! println!("{} parameters", params.len());
//! ```
//!
//! A builder is consumed by [`GraphBuilder::from_onnx`]; create one per graph.

use log::{debug, info};

use crate::attr::parse_attributes;
use crate::error::{ImportError, ImportResult};
use crate::fixup;
use crate::graph::{ImportContext, Params};
use crate::ops::OpTable;
use crate::proto::GraphProto;
use crate::symbol::Symbol;
use crate::tensor::tensor_to_array_f32;

/// Translates one ONNX graph into a target symbol and its parameters
#[derive(Debug)]
pub struct GraphBuilder<'t> {
    table: &'t OpTable,
    ctx: ImportContext,
}

impl GraphBuilder<'static> {
    /// Builder using the default operator table
    pub fn new() -> Self {
        Self::with_table(OpTable::global())
    }
}

impl Default for GraphBuilder<'static> {
    fn default() -> Self {
        Self::new()
    }
}

impl<'t> GraphBuilder<'t> {
    /// Builder using a custom operator table
    pub fn with_table(table: &'t OpTable) -> Self {
        Self {
            table,
            ctx: ImportContext::new(),
        }
    }

    /// Translate `graph`
    ///
    /// Returns the output symbol (grouped when the graph declares several
    /// outputs) and the parameter registry.
    pub fn from_onnx(mut self, graph: &GraphProto) -> ImportResult<(Symbol, Params)> {
        info!(
            "Importing graph '{}': {} nodes, {} initializers, {} inputs",
            graph.name,
            graph.node.len(),
            graph.initializer.len(),
            graph.input.len()
        );

        for tensor in &graph.initializer {
            if tensor.name.trim().is_empty() {
                return Err(ImportError::InvalidTensorName);
            }
            let array = tensor_to_array_f32(tensor)?;
            self.ctx.add_param(&tensor.name, array)?;
        }

        for input in &graph.input {
            let id = self.ctx.declare_input(&input.name)?;
            debug!("Input {} → {} (shape {:?})", input.name, id, input.get_shape());
        }

        for (idx, node) in graph.node.iter().enumerate() {
            let op_type = node.op_type.as_str();
            let label = node.display_name();

            let attrs = parse_attributes(&node.attribute)?;
            let gemm_attrs = (op_type == "Gemm").then(|| attrs.clone());
            let (op, mut new_attrs) = self.table.translate(op_type, attrs)?;

            let inputs = self.ctx.resolve_inputs(label, &node.input)?;
            fixup::fix_bias(op, &mut new_attrs, inputs.len())?;
            fixup::fix_channels(&self.ctx, op, &mut new_attrs, &node.input)?;
            let prev_op_type = idx
                .checked_sub(1)
                .and_then(|prev| graph.node.get(prev))
                .map(|prev| prev.op_type.as_str());
            fixup::fix_bias_shape(&mut self.ctx, op_type, prev_op_type, &node.input)?;

            // the bias fix-up may have replaced a variable
            let inputs = self.ctx.resolve_inputs(label, &node.input)?;
            let (op, inputs, new_attrs) = match gemm_attrs {
                Some(gemm_attrs) => fixup::fix_gemm(&mut self.ctx, inputs, &gemm_attrs)?,
                None => (op, inputs, new_attrs),
            };

            let name = self.ctx.node_name(node.explicit_name(), op.name);
            debug!("{} ({}) → {} '{}'", label, op_type, op.name, name);
            let symbol = Symbol::create(op, name, &inputs, new_attrs)?;

            let outputs = fixup::fix_outputs(op_type, &node.output)?;
            if outputs.len() != symbol.num_outputs() {
                return Err(ImportError::OutputArityMismatch {
                    op: op_type.to_string(),
                    declared: outputs.len(),
                    produced: symbol.num_outputs(),
                });
            }
            self.ctx.register_outputs(outputs, &symbol)?;
        }

        let mut outputs = graph
            .output
            .iter()
            .map(|output| self.ctx.output(&output.name))
            .collect::<ImportResult<Vec<_>>>()?;
        let symbol = match outputs.len() {
            0 => return Err(ImportError::NoOutputs),
            1 => outputs.remove(0),
            _ => Symbol::group(outputs),
        };

        info!(
            "Imported graph '{}': {} outputs, {} inputs, {} parameters, {} registered symbols",
            graph.name,
            symbol.num_outputs(),
            self.ctx.input_count(),
            self.ctx.param_count(),
            self.ctx.node_count()
        );
        Ok((symbol, self.ctx.into_params()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::attr::AttrValue;
    use crate::proto::attribute_proto::AttributeType;
    use crate::proto::extensions::{make_float_tensor, make_node, make_value_info};
    use crate::proto::{AttributeProto, NodeProto, TensorProto};
    use approx::assert_abs_diff_eq;

    fn tensor(name: &str, dims: &[i64]) -> TensorProto {
        let len: i64 = dims.iter().product();
        make_float_tensor(name, dims, (0..len).map(|v| v as f32).collect())
    }

    fn graph(
        nodes: Vec<NodeProto>,
        initializers: Vec<TensorProto>,
        inputs: &[&str],
        outputs: &[&str],
    ) -> GraphProto {
        GraphProto {
            name: "test".to_string(),
            node: nodes,
            initializer: initializers,
            input: inputs.iter().map(|name| make_value_info(name)).collect(),
            output: outputs.iter().map(|name| make_value_info(name)).collect(),
            ..Default::default()
        }
    }

    fn with_attrs(mut node: NodeProto, attrs: Vec<AttributeProto>) -> NodeProto {
        node.attribute = attrs;
        node
    }

    fn import(graph: &GraphProto) -> ImportResult<(Symbol, Params)> {
        GraphBuilder::new().from_onnx(graph)
    }

    fn conv_graph(with_bias: bool) -> GraphProto {
        let (inputs, initializers) = if with_bias {
            (
                vec!["X", "W", "B"],
                vec![tensor("W", &[16, 3, 3, 3]), tensor("B", &[16])],
            )
        } else {
            (vec!["X", "W"], vec![tensor("W", &[16, 3, 3, 3])])
        };
        let conv = with_attrs(
            make_node("Conv", &inputs, &["Y"], "conv1"),
            vec![
                AttributeProto::new_ints("kernel_shape", vec![3, 3]),
                AttributeProto::new_ints("pads", vec![1, 1, 1, 1]),
            ],
        );
        graph(vec![conv], initializers, &inputs, &["Y"])
    }

    #[test]
    fn test_initializer_cardinality() {
        let g = graph(
            vec![make_node("Relu", &["X"], &["Y"], "")],
            vec![tensor("unused_a", &[2]), tensor("unused_b", &[3, 3])],
            &["X"],
            &["Y"],
        );
        let (_, params) = import(&g).unwrap();
        assert_eq!(params.len(), 2);
        assert!(params.contains_key("unused_a"));
    }

    #[test]
    fn test_canonical_ids_dense() {
        let g = graph(
            vec![make_node("Sum", &["X", "W", "Z", "B"], &["Y"], "")],
            vec![tensor("W", &[4]), tensor("B", &[4])],
            &["X", "W", "Z", "B"],
            &["Y"],
        );
        let (symbol, params) = import(&g).unwrap();
        assert_eq!(
            symbol.list_arguments(),
            vec!["input_0", "param_0", "input_1", "param_1"]
        );
        let keys: Vec<&str> = params.keys().map(String::as_str).collect();
        assert_eq!(keys, vec!["param_0", "param_1"]);
    }

    #[test]
    fn test_identity_passthrough() {
        let reshape = with_attrs(
            make_node("Reshape", &["X"], &["Y"], "r"),
            vec![AttributeProto::new_ints("shape", vec![1, -1])],
        );
        let (symbol, _) = import(&graph(vec![reshape], vec![], &["X"], &["Y"])).unwrap();
        assert_eq!(symbol.op_name(), Some("Reshape"));
        assert_eq!(symbol.attr("shape"), Some(&AttrValue::Ints(vec![1, -1])));
        assert_eq!(symbol.attrs().unwrap().len(), 1);
    }

    #[test]
    fn test_conv_no_bias() {
        let (symbol, _) = import(&conv_graph(true)).unwrap();
        assert_eq!(symbol.op_name(), Some("Convolution"));
        assert_eq!(symbol.name(), Some("conv1"));
        assert_eq!(symbol.attr("no_bias"), Some(&AttrValue::Bool(false)));
        assert_eq!(symbol.attr("num_filter"), Some(&AttrValue::Int(16)));
        assert_eq!(symbol.attr("pad"), Some(&AttrValue::Ints(vec![1, 1])));

        let (symbol, _) = import(&conv_graph(false)).unwrap();
        assert_eq!(symbol.attr("no_bias"), Some(&AttrValue::Bool(true)));
    }

    #[test]
    fn test_conv_single_input() {
        let g = graph(
            vec![make_node("Conv", &["X"], &["Y"], "")],
            vec![],
            &["X"],
            &["Y"],
        );
        assert!(matches!(
            import(&g),
            Err(ImportError::UnexpectedInputArity { count: 1, .. })
        ));
    }

    #[test]
    fn test_fc_num_hidden() {
        let g = graph(
            vec![make_node("FC", &["X", "W", "B"], &["Y"], "")],
            vec![tensor("W", &[10, 5]), tensor("B", &[10])],
            &["X", "W", "B"],
            &["Y"],
        );
        let (symbol, _) = import(&g).unwrap();
        assert_eq!(symbol.op_name(), Some("FullyConnected"));
        assert_eq!(symbol.attr("num_hidden"), Some(&AttrValue::Int(10)));
        assert_eq!(symbol.name(), Some("fullyconnected0"));
    }

    #[test]
    fn test_dropout_mask_dropped() {
        let dropout = with_attrs(
            make_node("Dropout", &["X"], &["y", "mask"], ""),
            vec![AttributeProto::new_float("ratio", 0.5)],
        );
        let (symbol, _) = import(&graph(vec![dropout.clone()], vec![], &["X"], &["y"])).unwrap();
        assert_eq!(symbol.op_name(), Some("Dropout"));
        assert_eq!(symbol.attr("p"), Some(&AttrValue::Float(0.5)));

        assert!(matches!(
            import(&graph(vec![dropout], vec![], &["X"], &["mask"])),
            Err(ImportError::UnresolvedOutput(name)) if name == "mask"
        ));
    }

    #[test]
    fn test_gemm_fully_connected() {
        let gemm = with_attrs(
            make_node("Gemm", &["A", "B", "C"], &["Y"], "gemm"),
            vec![
                AttributeProto::new_float("alpha", 2.0),
                AttributeProto::new_int("transB", 1),
            ],
        );
        let g = graph(
            vec![gemm],
            vec![tensor("B", &[8, 4]), tensor("C", &[8])],
            &["A", "B", "C"],
            &["Y"],
        );
        let (symbol, _) = import(&g).unwrap();
        assert_eq!(symbol.op_name(), Some("FullyConnected"));
        assert_eq!(symbol.name(), Some("gemm"));
        assert_eq!(symbol.attr("num_hidden"), Some(&AttrValue::Int(8)));

        let inputs = symbol.inputs();
        assert_eq!(inputs.len(), 3);
        assert_eq!(inputs[0].op_name(), Some("_mul_scalar"));
        assert_abs_diff_eq!(inputs[0].attr("scalar").unwrap().as_float().unwrap(), 2.0);
        assert_eq!(inputs[0].inputs()[0].name(), Some("input_0"));
    }

    #[test]
    fn test_conv_add_bias_reshaped() {
        let g = graph(
            vec![
                make_node("Conv", &["X", "W"], &["c"], ""),
                make_node("Add", &["c", "B"], &["Y"], ""),
            ],
            vec![tensor("W", &[16, 3, 3, 3]), tensor("B", &[16])],
            &["X", "W", "B"],
            &["Y"],
        );
        let (symbol, params) = import(&g).unwrap();
        assert_eq!(symbol.op_name(), Some("broadcast_add"));
        assert_eq!(params["param_1"].shape(), &[1, 16, 1, 1]);
        assert_abs_diff_eq!(params["param_1"][[0, 3, 0, 0]], 3.0);

        let inputs = symbol.inputs();
        let bias = &inputs[1];
        assert_eq!(bias.name(), Some("param_1"));
        assert_eq!(bias.shape(), Some(&[1, 16, 1, 1][..]));
    }

    #[test]
    fn test_conv_add_bias_not_1d() {
        let g = graph(
            vec![
                make_node("Conv", &["X", "W"], &["c"], ""),
                make_node("Add", &["c", "B"], &["Y"], ""),
            ],
            vec![tensor("W", &[16, 3, 3, 3]), tensor("B", &[4, 4])],
            &["X", "W", "B"],
            &["Y"],
        );
        assert!(matches!(import(&g), Err(ImportError::InvalidBiasShape(_))));
    }

    #[test]
    fn test_add_first_node_untouched() {
        let g = graph(
            vec![make_node("Add", &["X", "B"], &["Y"], "")],
            vec![tensor("B", &[4, 4])],
            &["X", "B"],
            &["Y"],
        );
        let (_, params) = import(&g).unwrap();
        assert_eq!(params["param_0"].shape(), &[4, 4]);
    }

    #[test]
    fn test_chain_single_output() {
        let g = graph(
            vec![
                make_node("Conv", &["X", "W", "B"], &["c"], ""),
                make_node("Relu", &["c"], &["Y"], ""),
            ],
            vec![tensor("W", &[8, 3, 1, 1]), tensor("B", &[8])],
            &["X", "W", "B"],
            &["Y"],
        );
        let (symbol, _) = import(&g).unwrap();
        assert_eq!(symbol.num_outputs(), 1);
        assert_eq!(symbol.op_name(), Some("relu"));
        assert_eq!(symbol.list_outputs(), vec!["relu0_output"]);
        assert_eq!(
            symbol.list_arguments(),
            vec!["input_0", "param_0", "param_1"]
        );
        assert_eq!(symbol.inputs()[0].name(), Some("convolution0"));
    }

    #[test]
    fn test_multiple_outputs_grouped() {
        let g = graph(
            vec![
                make_node("Relu", &["X"], &["a"], ""),
                make_node("Sigmoid", &["X"], &["b"], ""),
            ],
            vec![],
            &["X"],
            &["b", "a"],
        );
        let (symbol, _) = import(&g).unwrap();
        assert_eq!(symbol.num_outputs(), 2);
        assert_eq!(symbol.list_outputs(), vec!["sigmoid0_output", "relu0_output"]);
    }

    #[test]
    fn test_split_outputs() {
        let split = with_attrs(
            make_node("Split", &["X"], &["a", "b", "c"], ""),
            vec![
                AttributeProto::new_int("axis", 1),
                AttributeProto::new_ints("split", vec![2, 2, 2]),
            ],
        );
        let g = graph(
            vec![split, make_node("Sum", &["a", "b", "c"], &["Y"], "")],
            vec![],
            &["X"],
            &["Y"],
        );
        let (symbol, _) = import(&g).unwrap();
        let inputs = symbol.inputs();
        assert_eq!(inputs.len(), 3);
        for (index, input) in inputs.iter().enumerate() {
            assert_eq!(input.op_name(), Some("SliceChannel"));
            assert_eq!(input.outputs()[0].index(), index);
        }
    }

    #[test]
    fn test_output_arity_mismatch() {
        let split = with_attrs(
            make_node("Split", &["X"], &["a", "b"], ""),
            vec![AttributeProto::new_ints("split", vec![2, 2, 2])],
        );
        assert!(matches!(
            import(&graph(vec![split], vec![], &["X"], &["a"])),
            Err(ImportError::OutputArityMismatch { declared: 2, produced: 3, .. })
        ));
    }

    #[test]
    fn test_unsupported_operator() {
        let g = graph(
            vec![make_node("Loop", &["X"], &["Y"], "")],
            vec![],
            &["X"],
            &["Y"],
        );
        assert!(matches!(
            import(&g),
            Err(ImportError::UnsupportedOperator(op)) if op == "Loop"
        ));
    }

    #[test]
    fn test_tensor_attribute_rejected() {
        let node = with_attrs(
            make_node("Relu", &["X"], &["Y"], ""),
            vec![AttributeProto {
                name: "value".to_string(),
                t: Some(TensorProto::default()),
                r#type: AttributeType::Tensor as i32,
                ..Default::default()
            }],
        );
        assert!(matches!(
            import(&graph(vec![node], vec![], &["X"], &["Y"])),
            Err(ImportError::UnsupportedAttributeKind { attribute, .. }) if attribute == "value"
        ));
    }

    #[test]
    fn test_unresolved_input() {
        let g = graph(
            vec![make_node("Relu", &["missing"], &["Y"], "r")],
            vec![],
            &["X"],
            &["Y"],
        );
        assert!(matches!(
            import(&g),
            Err(ImportError::UnresolvedInput { node, input }) if node == "r" && input == "missing"
        ));
    }

    #[test]
    fn test_node_output_shadows_input() {
        let g = graph(
            vec![
                make_node("Relu", &["X"], &["a"], "r0"),
                make_node("Sigmoid", &["a"], &["X"], "r1"),
            ],
            vec![],
            &["X"],
            &["X"],
        );
        assert!(matches!(
            import(&g),
            Err(ImportError::DuplicateNodeOutput(name)) if name == "X"
        ));
    }

    #[test]
    fn test_oversized_initializer() {
        let g = graph(
            vec![make_node("Relu", &["X"], &["Y"], "")],
            vec![TensorProto {
                name: "W".to_string(),
                dims: vec![1 << 40, 1 << 40],
                data_type: crate::proto::tensor_proto::DataType::Float as i32,
                ..Default::default()
            }],
            &["X", "W"],
            &["Y"],
        );
        assert!(matches!(import(&g), Err(ImportError::InvalidTensorData(_))));
    }

    #[test]
    fn test_no_outputs() {
        let g = graph(vec![make_node("Relu", &["X"], &["Y"], "")], vec![], &["X"], &[]);
        assert!(matches!(import(&g), Err(ImportError::NoOutputs)));
    }

    #[test]
    fn test_blank_initializer_name() {
        let g = graph(vec![], vec![tensor(" ", &[1])], &[], &[]);
        assert!(matches!(import(&g), Err(ImportError::InvalidTensorName)));
    }

    #[test]
    fn test_custom_table() {
        let table = OpTable::empty().with_identity("Flatten");
        let g = graph(
            vec![make_node("Flatten", &["X"], &["Y"], "")],
            vec![],
            &["X"],
            &["Y"],
        );
        let (symbol, _) = GraphBuilder::with_table(&table).from_onnx(&g).unwrap();
        assert_eq!(symbol.op_name(), Some("Flatten"));

        let relu = graph(
            vec![make_node("Relu", &["X"], &["Y"], "")],
            vec![],
            &["X"],
            &["Y"],
        );
        assert!(matches!(
            GraphBuilder::with_table(&table).from_onnx(&relu),
            Err(ImportError::UnsupportedOperator(_))
        ));
    }
}
