//! Per-operator conversion functions
//!
//! Each function takes the parsed ONNX attributes of one node and returns
//! the target operator name with the target attribute map. Attributes not
//! mentioned by a conversion pass through unchanged.

use crate::attr::{AttrValue, Attrs};
use crate::error::{ImportError, ImportResult};
use crate::tensor::{dtype_from_name, i32_to_dtype, target_dtype_name};

use super::OpTable;

/// Result of a conversion function
pub type Converted = ImportResult<(&'static str, Attrs)>;

/// Declarative attribute conversion towards one target operator
#[derive(Debug)]
pub struct AttrCvt {
    op: &'static str,
    renames: Vec<(&'static str, &'static str)>,
    ignores: Vec<&'static str>,
    defaults: Vec<(&'static str, AttrValue)>,
    extras: Vec<(&'static str, AttrValue)>,
}

impl AttrCvt {
    /// Conversion to `op` that keeps every attribute
    pub fn new(op: &'static str) -> Self {
        Self {
            op,
            renames: Vec::new(),
            ignores: Vec::new(),
            defaults: Vec::new(),
            extras: Vec::new(),
        }
    }

    /// Rename attribute `from` to `to`
    pub fn rename(mut self, from: &'static str, to: &'static str) -> Self {
        self.renames.push((from, to));
        self
    }

    /// Drop the listed attributes
    pub fn ignore(mut self, names: &[&'static str]) -> Self {
        self.ignores.extend_from_slice(names);
        self
    }

    /// Set `key` (target name) when the converted map lacks it
    pub fn default(mut self, key: &'static str, value: AttrValue) -> Self {
        self.defaults.push((key, value));
        self
    }

    /// Always set `key` (target name)
    pub fn extra(mut self, key: &'static str, value: AttrValue) -> Self {
        self.extras.push((key, value));
        self
    }

    /// Apply the conversion
    pub fn convert(self, attrs: Attrs) -> Converted {
        let mut out = Attrs::with_capacity(attrs.len() + self.extras.len());

        for (name, value) in attrs {
            if self.ignores.contains(&name.as_str()) {
                continue;
            }
            let key = self
                .renames
                .iter()
                .find(|(from, _)| *from == name)
                .map(|(_, to)| to.to_string())
                .unwrap_or(name);
            out.insert(key, value);
        }
        for (key, value) in self.defaults {
            out.entry(key.to_string()).or_insert(value);
        }
        for (key, value) in self.extras {
            out.insert(key.to_string(), value);
        }

        Ok((self.op, out))
    }
}

/// Build the default translation table
pub fn default_table() -> OpTable {
    OpTable::empty()
        .with_identity("Flatten")
        .with_identity("Reshape")
        // experimental
        .with_converter("FC", fully_connected)
        // generators
        .with_converter("RandomUniform", random_uniform)
        .with_converter("RandomNormal", random_normal)
        // math
        .with_converter("Add", add)
        .with_converter("Sub", sub)
        .with_converter("Mul", mul)
        .with_converter("Div", div)
        .with_converter("Pow", pow)
        .with_converter("Neg", neg)
        .with_converter("Abs", abs)
        .with_converter("Reciprocal", reciprocal)
        .with_converter("Floor", floor)
        .with_converter("Ceil", ceil)
        .with_converter("Sqrt", sqrt)
        .with_converter("Exp", exp)
        .with_converter("Log", log)
        .with_converter("Sum", sum)
        .with_converter("Max", max)
        .with_converter("Min", min)
        .with_converter("Clip", clip)
        .with_converter("Gemm", gemm)
        .with_converter("MatMul", matmul)
        // activations
        .with_converter("Relu", relu)
        .with_converter("Sigmoid", sigmoid)
        .with_converter("Tanh", tanh)
        .with_converter("Softmax", softmax)
        .with_converter("LeakyRelu", leaky_relu)
        .with_converter("Elu", elu)
        .with_converter("PRelu", prelu)
        // nn
        .with_converter("Conv", conv)
        .with_converter("ConvTranspose", conv_transpose)
        .with_converter("MaxPool", max_pool)
        .with_converter("AveragePool", average_pool)
        .with_converter("GlobalMaxPool", global_max_pool)
        .with_converter("GlobalAveragePool", global_average_pool)
        .with_converter("BatchNormalization", batch_norm)
        .with_converter("SpatialBN", batch_norm)
        .with_converter("Dropout", dropout)
        .with_converter("LRN", lrn)
        // reductions
        .with_converter("ReduceMax", reduce_max)
        .with_converter("ReduceMin", reduce_min)
        .with_converter("ReduceSum", reduce_sum)
        .with_converter("ReduceMean", reduce_mean)
        .with_converter("ReduceProd", reduce_prod)
        .with_converter("ArgMax", argmax)
        .with_converter("ArgMin", argmin)
        // tensor
        .with_converter("Concat", concat)
        .with_converter("Transpose", transpose)
        .with_converter("Split", split)
        .with_converter("Pad", pad)
        .with_converter("Cast", cast)
        .with_converter("Identity", identity)
        .with_converter("Unsqueeze", unsqueeze)
}

// ============================================================================
// Shared helpers
// ============================================================================

fn invalid(op: &str, attribute: &str, reason: impl Into<String>) -> ImportError {
    ImportError::InvalidAttribute {
        op: op.to_string(),
        attribute: attribute.to_string(),
        reason: reason.into(),
    }
}

/// Replace an ONNX `[begin..., end...]` pads list stored under `key` with
/// the begin half. The target only pads symmetrically.
fn symmetric_pads(op: &str, key: &str, attrs: &mut Attrs) -> ImportResult<()> {
    let Some(value) = attrs.get(key) else {
        return Ok(());
    };
    let pads = value
        .as_ints()
        .ok_or_else(|| invalid(op, "pads", "expected a list of integers"))?;

    if pads.len() % 2 != 0 {
        return Err(invalid(op, "pads", format!("odd length {}", pads.len())));
    }
    let (begin, end) = pads.split_at(pads.len() / 2);
    if begin != end {
        return Err(invalid(
            op,
            "pads",
            format!("asymmetric padding {:?} is not supported", pads),
        ));
    }

    let begin = begin.to_vec();
    attrs.insert(key.to_string(), AttrValue::Ints(begin));
    Ok(())
}

/// Drop `auto_pad` when it requests explicit or no padding
fn check_auto_pad(op: &str, attrs: &mut Attrs) -> ImportResult<()> {
    match attrs.shift_remove("auto_pad") {
        None => Ok(()),
        Some(value) => match value.as_str() {
            Some("NOTSET") | Some("VALID") => Ok(()),
            other => Err(invalid(
                op,
                "auto_pad",
                format!("{} is not supported", other.unwrap_or("non-string value")),
            )),
        },
    }
}

/// ONNX `keepdims` (default 1) as a target flag
fn keepdims_flag(attrs: &mut Attrs) {
    let keep = attrs
        .get("keepdims")
        .and_then(AttrValue::as_bool)
        .unwrap_or(true);
    attrs.insert("keepdims".to_string(), AttrValue::Bool(keep));
}

fn elemwise(op: &'static str, attrs: Attrs) -> Converted {
    AttrCvt::new(op).ignore(&["broadcast", "axis"]).convert(attrs)
}

fn conv_like(label: &str, cvt: AttrCvt, mut attrs: Attrs) -> Converted {
    check_auto_pad(label, &mut attrs)?;
    let (op, mut attrs) = cvt
        .rename("kernel_shape", "kernel")
        .rename("strides", "stride")
        .rename("pads", "pad")
        .rename("dilations", "dilate")
        .rename("group", "num_group")
        .convert(attrs)?;
    symmetric_pads(label, "pad", &mut attrs)?;
    Ok((op, attrs))
}

fn pool(label: &str, pool_type: &str, mut attrs: Attrs) -> Converted {
    check_auto_pad(label, &mut attrs)?;
    if let Some(value) = attrs.get("count_include_pad").and_then(AttrValue::as_bool) {
        attrs.insert("count_include_pad".to_string(), AttrValue::Bool(value));
    }
    let (op, mut attrs) = AttrCvt::new("Pooling")
        .rename("kernel_shape", "kernel")
        .rename("strides", "stride")
        .rename("pads", "pad")
        .extra("pool_type", AttrValue::String(pool_type.to_string()))
        .convert(attrs)?;
    symmetric_pads(label, "pad", &mut attrs)?;
    Ok((op, attrs))
}

fn global_pool(pool_type: &str, attrs: Attrs) -> Converted {
    AttrCvt::new("Pooling")
        .extra("global_pool", AttrValue::Bool(true))
        .extra("kernel", AttrValue::Ints(vec![1, 1]))
        .extra("pool_type", AttrValue::String(pool_type.to_string()))
        .convert(attrs)
}

fn reduce(op: &'static str, mut attrs: Attrs) -> Converted {
    keepdims_flag(&mut attrs);
    AttrCvt::new(op).rename("axes", "axis").convert(attrs)
}

fn arg_reduce(op: &'static str, mut attrs: Attrs) -> Converted {
    keepdims_flag(&mut attrs);
    AttrCvt::new(op).convert(attrs)
}

// ============================================================================
// Conversions
// ============================================================================

/// FC → FullyConnected
pub fn fully_connected(attrs: Attrs) -> Converted {
    AttrCvt::new("FullyConnected")
        .ignore(&["axis", "axis_w"])
        .convert(attrs)
}

/// RandomUniform → random_uniform
pub fn random_uniform(attrs: Attrs) -> Converted {
    AttrCvt::new("random_uniform").ignore(&["seed"]).convert(attrs)
}

/// RandomNormal → random_normal
pub fn random_normal(attrs: Attrs) -> Converted {
    AttrCvt::new("random_normal")
        .rename("mean", "loc")
        .ignore(&["seed"])
        .convert(attrs)
}

/// Add → broadcast_add
pub fn add(attrs: Attrs) -> Converted {
    elemwise("broadcast_add", attrs)
}

/// Sub → broadcast_sub
pub fn sub(attrs: Attrs) -> Converted {
    elemwise("broadcast_sub", attrs)
}

/// Mul → broadcast_mul
pub fn mul(attrs: Attrs) -> Converted {
    elemwise("broadcast_mul", attrs)
}

/// Div → broadcast_div
pub fn div(attrs: Attrs) -> Converted {
    elemwise("broadcast_div", attrs)
}

/// Pow → broadcast_power
pub fn pow(attrs: Attrs) -> Converted {
    elemwise("broadcast_power", attrs)
}

/// Neg → negative
pub fn neg(attrs: Attrs) -> Converted {
    AttrCvt::new("negative").convert(attrs)
}

/// Abs → abs
pub fn abs(attrs: Attrs) -> Converted {
    AttrCvt::new("abs").convert(attrs)
}

/// Reciprocal → reciprocal
pub fn reciprocal(attrs: Attrs) -> Converted {
    AttrCvt::new("reciprocal").convert(attrs)
}

/// Floor → floor
pub fn floor(attrs: Attrs) -> Converted {
    AttrCvt::new("floor").convert(attrs)
}

/// Ceil → ceil
pub fn ceil(attrs: Attrs) -> Converted {
    AttrCvt::new("ceil").convert(attrs)
}

/// Sqrt → sqrt
pub fn sqrt(attrs: Attrs) -> Converted {
    AttrCvt::new("sqrt").convert(attrs)
}

/// Exp → exp
pub fn exp(attrs: Attrs) -> Converted {
    AttrCvt::new("exp").convert(attrs)
}

/// Log → log
pub fn log(attrs: Attrs) -> Converted {
    AttrCvt::new("log").convert(attrs)
}

/// Sum → add_n
pub fn sum(attrs: Attrs) -> Converted {
    AttrCvt::new("add_n").convert(attrs)
}

/// Max → maximum
pub fn max(attrs: Attrs) -> Converted {
    AttrCvt::new("maximum").convert(attrs)
}

/// Min → minimum
pub fn min(attrs: Attrs) -> Converted {
    AttrCvt::new("minimum").convert(attrs)
}

/// Clip → clip with `a_min`/`a_max`
pub fn clip(attrs: Attrs) -> Converted {
    AttrCvt::new("clip")
        .rename("min", "a_min")
        .rename("max", "a_max")
        .convert(attrs)
}

/// Gemm → linalg_gemm
///
/// The builder replaces the result with FullyConnected.
pub fn gemm(attrs: Attrs) -> Converted {
    AttrCvt::new("linalg_gemm")
        .rename("transA", "transpose_a")
        .rename("transB", "transpose_b")
        .ignore(&["broadcast"])
        .convert(attrs)
}

/// MatMul → dot
pub fn matmul(attrs: Attrs) -> Converted {
    AttrCvt::new("dot").convert(attrs)
}

/// Relu → relu
pub fn relu(attrs: Attrs) -> Converted {
    AttrCvt::new("relu").convert(attrs)
}

/// Sigmoid → sigmoid
pub fn sigmoid(attrs: Attrs) -> Converted {
    AttrCvt::new("sigmoid").convert(attrs)
}

/// Tanh → tanh
pub fn tanh(attrs: Attrs) -> Converted {
    AttrCvt::new("tanh").convert(attrs)
}

/// Softmax → softmax
pub fn softmax(attrs: Attrs) -> Converted {
    AttrCvt::new("softmax").convert(attrs)
}

/// LeakyRelu → LeakyReLU(act_type=leaky)
pub fn leaky_relu(attrs: Attrs) -> Converted {
    AttrCvt::new("LeakyReLU")
        .rename("alpha", "slope")
        .default("slope", AttrValue::Float(0.01))
        .extra("act_type", AttrValue::String("leaky".to_string()))
        .convert(attrs)
}

/// Elu → LeakyReLU(act_type=elu)
pub fn elu(attrs: Attrs) -> Converted {
    AttrCvt::new("LeakyReLU")
        .rename("alpha", "slope")
        .default("slope", AttrValue::Float(1.0))
        .extra("act_type", AttrValue::String("elu".to_string()))
        .convert(attrs)
}

/// PRelu → LeakyReLU(act_type=prelu)
pub fn prelu(attrs: Attrs) -> Converted {
    AttrCvt::new("LeakyReLU")
        .extra("act_type", AttrValue::String("prelu".to_string()))
        .convert(attrs)
}

/// Conv → Convolution
pub fn conv(attrs: Attrs) -> Converted {
    conv_like("Conv", AttrCvt::new("Convolution"), attrs)
}

/// ConvTranspose → Deconvolution
pub fn conv_transpose(attrs: Attrs) -> Converted {
    let cvt = AttrCvt::new("Deconvolution")
        .rename("output_padding", "adj")
        .rename("output_shape", "target_shape");
    conv_like("ConvTranspose", cvt, attrs)
}

/// MaxPool → Pooling(pool_type=max)
pub fn max_pool(attrs: Attrs) -> Converted {
    pool("MaxPool", "max", attrs)
}

/// AveragePool → Pooling(pool_type=avg)
pub fn average_pool(attrs: Attrs) -> Converted {
    pool("AveragePool", "avg", attrs)
}

/// GlobalMaxPool → global Pooling(pool_type=max)
pub fn global_max_pool(attrs: Attrs) -> Converted {
    global_pool("max", attrs)
}

/// GlobalAveragePool → global Pooling(pool_type=avg)
pub fn global_average_pool(attrs: Attrs) -> Converted {
    global_pool("avg", attrs)
}

/// BatchNormalization / SpatialBN → BatchNorm
pub fn batch_norm(attrs: Attrs) -> Converted {
    AttrCvt::new("BatchNorm")
        .rename("epsilon", "eps")
        .ignore(&["is_test", "spatial", "consumed_inputs"])
        .extra("fix_gamma", AttrValue::Bool(false))
        .convert(attrs)
}

/// Dropout: `ratio` → `p`
pub fn dropout(attrs: Attrs) -> Converted {
    AttrCvt::new("Dropout")
        .rename("ratio", "p")
        .ignore(&["is_test"])
        .convert(attrs)
}

/// LRN: `size` → `nsize`, `bias` → `knorm`
pub fn lrn(attrs: Attrs) -> Converted {
    AttrCvt::new("LRN")
        .rename("size", "nsize")
        .rename("bias", "knorm")
        .convert(attrs)
}

/// ReduceMax → max
pub fn reduce_max(attrs: Attrs) -> Converted {
    reduce("max", attrs)
}

/// ReduceMin → min
pub fn reduce_min(attrs: Attrs) -> Converted {
    reduce("min", attrs)
}

/// ReduceSum → sum
pub fn reduce_sum(attrs: Attrs) -> Converted {
    reduce("sum", attrs)
}

/// ReduceMean → mean
pub fn reduce_mean(attrs: Attrs) -> Converted {
    reduce("mean", attrs)
}

/// ReduceProd → prod
pub fn reduce_prod(attrs: Attrs) -> Converted {
    reduce("prod", attrs)
}

/// ArgMax → argmax
pub fn argmax(attrs: Attrs) -> Converted {
    arg_reduce("argmax", attrs)
}

/// ArgMin → argmin
pub fn argmin(attrs: Attrs) -> Converted {
    arg_reduce("argmin", attrs)
}

/// Concat: `axis` → `dim`
pub fn concat(attrs: Attrs) -> Converted {
    AttrCvt::new("Concat")
        .rename("axis", "dim")
        .default("dim", AttrValue::Int(1))
        .convert(attrs)
}

/// Transpose: `perm` → `axes`
pub fn transpose(attrs: Attrs) -> Converted {
    AttrCvt::new("transpose").rename("perm", "axes").convert(attrs)
}

/// Split → SliceChannel with one output per split size
///
/// The target splits evenly, so all sizes must match.
pub fn split(mut attrs: Attrs) -> Converted {
    let sizes = attrs
        .shift_remove("split")
        .ok_or_else(|| invalid("Split", "split", "split sizes are required"))?;
    let sizes = sizes
        .as_ints()
        .ok_or_else(|| invalid("Split", "split", "expected a list of integers"))?
        .to_vec();
    if sizes.windows(2).any(|w| w[0] != w[1]) {
        return Err(invalid(
            "Split",
            "split",
            format!("uneven split {:?} is not supported", sizes),
        ));
    }

    AttrCvt::new("SliceChannel")
        .extra("num_outputs", AttrValue::Int(sizes.len() as i64))
        .convert(attrs)
}

/// Pad: reorder `[b1, b2, ..., e1, e2, ...]` into `pad_width` `(b1, e1, b2, e2, ...)`
pub fn pad(mut attrs: Attrs) -> Converted {
    if let Some(value) = attrs.shift_remove("pads") {
        let pads = value
            .as_ints()
            .ok_or_else(|| invalid("Pad", "pads", "expected a list of integers"))?;
        if pads.len() % 2 != 0 {
            return Err(invalid("Pad", "pads", format!("odd length {}", pads.len())));
        }
        let (begin, end) = pads.split_at(pads.len() / 2);
        let width: Vec<i64> = begin
            .iter()
            .zip(end)
            .flat_map(|(&b, &e)| [b, e])
            .collect();
        attrs.insert("pad_width".to_string(), AttrValue::Ints(width));
    }

    AttrCvt::new("Pad")
        .rename("value", "constant_value")
        .default("mode", AttrValue::String("constant".to_string()))
        .convert(attrs)
}

/// Cast: `to` (data type enum, or type name for early opsets) → `dtype`
pub fn cast(mut attrs: Attrs) -> Converted {
    let to = attrs
        .shift_remove("to")
        .ok_or_else(|| invalid("Cast", "to", "target type is required"))?;
    let dtype = match &to {
        AttrValue::Int(code) => i32::try_from(*code)
            .ok()
            .and_then(|code| i32_to_dtype(code).ok()),
        AttrValue::String(name) => dtype_from_name(name),
        _ => None,
    }
    .ok_or_else(|| invalid("Cast", "to", format!("unknown type {}", to)))?;
    let name = target_dtype_name(dtype).ok_or_else(|| {
        invalid("Cast", "to", format!("{} is not supported", dtype.as_str_name()))
    })?;

    AttrCvt::new("Cast")
        .extra("dtype", AttrValue::String(name.to_string()))
        .convert(attrs)
}

/// Identity → _copy
pub fn identity(attrs: Attrs) -> Converted {
    AttrCvt::new("_copy").convert(attrs)
}

/// Unsqueeze → expand_dims (single axis only)
pub fn unsqueeze(mut attrs: Attrs) -> Converted {
    let axes = attrs
        .shift_remove("axes")
        .ok_or_else(|| invalid("Unsqueeze", "axes", "axes are required"))?;
    let axis = match axes.as_ints() {
        Some([axis]) => *axis,
        _ => {
            return Err(invalid(
                "Unsqueeze",
                "axes",
                format!("expected exactly one axis, got {}", axes),
            ))
        }
    };

    AttrCvt::new("expand_dims")
        .extra("axis", AttrValue::Int(axis))
        .convert(attrs)
}
