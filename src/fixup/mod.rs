//! Structural fix-ups between ONNX and target conventions
//!
//! ONNX leaves some information implicit that target operators require as
//! attributes, and encodes a few operators differently:
//!
//! | Fix-up | Applies to | Effect |
//! |--------|------------|--------|
//! | [`fix_bias`] | Convolution, Deconvolution, FullyConnected | `no_bias` from the input count |
//! | [`fix_channels`] | same | `num_filter` / `num_hidden` from the weight shape |
//! | [`fix_bias_shape`] | `Add` right after `Conv` | bias `(C,)` → `(1, C, 1, 1)` |
//! | [`fix_gemm`] | `Gemm` | rewritten as scaled FullyConnected |
//! | [`fix_outputs`] | `Dropout` | mask output dropped |

use log::trace;

use crate::attr::{AttrValue, Attrs};
use crate::error::{ImportError, ImportResult};
use crate::graph::ImportContext;
use crate::symbol::{registry, OpDef, Symbol};
use crate::tensor::{channel_broadcast_shape, reshape_array};

/// Target operators that take `(data, weight[, bias])`
const WEIGHTED_OPS: &[&str] = &["Convolution", "Deconvolution", "FullyConnected"];

fn is_weighted(op: &OpDef) -> bool {
    WEIGHTED_OPS.contains(&op.name)
}

/// Set `no_bias` from the number of inputs
pub fn fix_bias(op: &OpDef, attrs: &mut Attrs, num_inputs: usize) -> ImportResult<()> {
    if !is_weighted(op) {
        return Ok(());
    }

    let no_bias = match num_inputs {
        3 => false,
        2 => true,
        count => {
            return Err(ImportError::UnexpectedInputArity {
                op: op.name.to_string(),
                count,
            })
        }
    };
    trace!("{}: no_bias={}", op.name, no_bias);
    attrs.insert("no_bias".to_string(), AttrValue::Bool(no_bias));
    Ok(())
}

/// Set `num_hidden` (FullyConnected) or `num_filter` from the weight's first dimension
pub fn fix_channels(
    ctx: &ImportContext,
    op: &OpDef,
    attrs: &mut Attrs,
    inputs: &[String],
) -> ImportResult<()> {
    if !is_weighted(op) {
        return Ok(());
    }

    let missing = |input: &str| ImportError::MissingWeightParameter {
        op: op.name.to_string(),
        input: input.to_string(),
    };
    let weight_input = inputs.get(1).ok_or_else(|| missing(""))?;
    let weight = ctx
        .param(ctx.resolve_name(weight_input))
        .ok_or_else(|| missing(weight_input))?;

    let shape = weight.shape();
    if shape.len() < 2 {
        return Err(ImportError::InvalidWeightShape {
            op: op.name.to_string(),
            shape: shape.to_vec(),
        });
    }

    let key = if op.name == "FullyConnected" {
        "num_hidden"
    } else {
        "num_filter"
    };
    trace!("{}: {}={}", op.name, key, shape[0]);
    attrs.insert(key.to_string(), AttrValue::Int(shape[0] as i64));
    Ok(())
}

/// Reshape a per-channel bias so the following broadcast add lines up
///
/// Triggers on node adjacency: the ONNX op is `Add` and the node right
/// before it in node order is `Conv`.
pub fn fix_bias_shape(
    ctx: &mut ImportContext,
    op_type: &str,
    prev_op_type: Option<&str>,
    inputs: &[String],
) -> ImportResult<()> {
    if op_type != "Add" || prev_op_type != Some("Conv") {
        return Ok(());
    }

    if inputs.len() != 2 {
        return Err(ImportError::InvalidBiasShape(format!(
            "Add after Conv expects 2 inputs, got {}",
            inputs.len()
        )));
    }
    let bias_name = ctx.resolve_name(&inputs[1]).to_string();
    let bias = ctx
        .param(&bias_name)
        .ok_or_else(|| ImportError::MissingBiasParameter {
            op: op_type.to_string(),
            input: inputs[1].clone(),
        })?;

    if bias.ndim() != 1 {
        return Err(ImportError::InvalidBiasShape(format!(
            "{} has shape {:?}, expected 1-D",
            bias_name,
            bias.shape()
        )));
    }

    let shape = channel_broadcast_shape(bias.len());
    let reshaped = reshape_array(bias, &shape)?;
    trace!("{}: bias reshaped to {:?}", bias_name, shape);

    ctx.replace_param(&bias_name, reshaped);
    ctx.set_node(bias_name.clone(), Symbol::variable(bias_name, Some(shape)));
    Ok(())
}

/// Rewrite `Y = alpha·op(A)·op(B) + beta·C` as a FullyConnected node
///
/// `attrs` are the ONNX attributes of the Gemm node. Returns the target op,
/// the new inputs `[A·alpha, B, C·beta]` and `{num_hidden: C.shape[0]}`.
pub fn fix_gemm(
    ctx: &mut ImportContext,
    mut inputs: Vec<Symbol>,
    attrs: &Attrs,
) -> ImportResult<(&'static OpDef, Vec<Symbol>, Attrs)> {
    let op = registry::lookup("FullyConnected")
        .ok_or_else(|| ImportError::UnknownTargetOperator("FullyConnected".to_string()))?;
    if inputs.len() != 3 {
        return Err(ImportError::UnexpectedInputArity {
            op: "Gemm".to_string(),
            count: inputs.len(),
        });
    }

    let float = |key: &str| attrs.get(key).and_then(AttrValue::as_float).unwrap_or(1.0);
    let flag = |key: &str| attrs.get(key).and_then(AttrValue::as_bool).unwrap_or(false);
    let (alpha, beta) = (float("alpha"), float("beta"));

    let bias = &inputs[2];
    let bias_name = bias.name().unwrap_or_default().to_string();
    let num_hidden = bias
        .is_variable()
        .then(|| ctx.param(&bias_name))
        .flatten()
        .and_then(|param| param.shape().first().copied())
        .ok_or_else(|| ImportError::MissingBiasParameter {
            op: "Gemm".to_string(),
            input: bias_name.clone(),
        })?;

    if flag("transA") {
        let name = ctx.node_name(None, "transpose");
        inputs[0] = inputs[0].transpose(name, vec![1, 0])?;
    }
    if !flag("transB") {
        let name = ctx.node_name(None, "transpose");
        inputs[1] = inputs[1].transpose(name, vec![1, 0])?;
    }

    let a = inputs[0].mul_scalar(ctx.node_name(None, "_mul_scalar"), alpha)?;
    let c = inputs[2].mul_scalar(ctx.node_name(None, "_mul_scalar"), beta)?;
    trace!(
        "Gemm → FullyConnected: alpha={}, beta={}, num_hidden={}",
        alpha,
        beta,
        num_hidden
    );

    let mut new_attrs = Attrs::new();
    new_attrs.insert("num_hidden".to_string(), AttrValue::Int(num_hidden as i64));
    Ok((op, vec![a, inputs[1].clone(), c], new_attrs))
}

/// Output identifiers to register for a node
///
/// ONNX `Dropout` declares `(output, mask)`; the target only produces the output.
pub fn fix_outputs<'a>(op_type: &str, outputs: &'a [String]) -> ImportResult<&'a [String]> {
    if op_type != "Dropout" {
        return Ok(outputs);
    }
    if outputs.len() != 2 {
        return Err(ImportError::UnexpectedOutputArity {
            op: op_type.to_string(),
            count: outputs.len(),
        });
    }
    trace!("Dropout: dropping mask output {}", outputs[1]);
    Ok(&outputs[..1])
}
