//! Benchmark for graph import
//!
//! Run with: cargo bench

use criterion::{black_box, criterion_group, criterion_main, Criterion};
use prost::Message;

use onnx_symbol_import::io::{import_model_from_bytes, ImportOptions};
use onnx_symbol_import::prelude::*;
use onnx_symbol_import::proto::extensions::{make_float_tensor, make_node, make_value_info};

/// Conv → Add → Relu blocks followed by a Gemm classifier
fn conv_net(blocks: usize) -> ModelProto {
    let channels = 16i64;
    let mut nodes = Vec::new();
    let mut initializer = Vec::new();
    let mut input = vec![make_value_info("data")];
    let mut current = "data".to_string();

    for i in 0..blocks {
        let in_channels = if i == 0 { 3 } else { channels };
        let (w, b) = (format!("conv{}_w", i), format!("conv{}_b", i));
        let (conv_out, add_out, relu_out) = (
            format!("conv{}", i),
            format!("add{}", i),
            format!("relu{}", i),
        );

        let mut conv = make_node("Conv", &[current.as_str(), w.as_str()], &[conv_out.as_str()], "");
        conv.attribute = vec![
            AttributeProto::new_ints("kernel_shape", vec![3, 3]),
            AttributeProto::new_ints("pads", vec![1, 1, 1, 1]),
        ];
        nodes.push(conv);
        nodes.push(make_node("Add", &[conv_out.as_str(), b.as_str()], &[add_out.as_str()], ""));
        nodes.push(make_node("Relu", &[add_out.as_str()], &[relu_out.as_str()], ""));

        let weights = (channels * in_channels * 9) as usize;
        initializer.push(make_float_tensor(
            &w,
            &[channels, in_channels, 3, 3],
            vec![0.01; weights],
        ));
        initializer.push(make_float_tensor(
            &b,
            &[channels],
            vec![0.0; channels as usize],
        ));
        input.push(make_value_info(&w));
        input.push(make_value_info(&b));
        current = relu_out;
    }

    nodes.push(make_node("Flatten", &[current.as_str()], &["flat"], ""));
    let mut gemm = make_node("Gemm", &["flat", "fc_w", "fc_b"], &["logits"], "fc");
    gemm.attribute = vec![AttributeProto::new_int("transB", 1)];
    nodes.push(gemm);
    initializer.push(make_float_tensor("fc_w", &[10, 64], vec![0.01; 640]));
    initializer.push(make_float_tensor("fc_b", &[10], vec![0.0; 10]));
    input.push(make_value_info("fc_w"));
    input.push(make_value_info("fc_b"));

    ModelProto {
        ir_version: 3,
        opset_import: vec![OperatorSetIdProto {
            domain: String::new(),
            version: 7,
        }],
        graph: Some(GraphProto {
            name: "bench".to_string(),
            node: nodes,
            initializer,
            input,
            output: vec![make_value_info("logits")],
            ..Default::default()
        }),
        ..Default::default()
    }
}

fn import_benchmark(c: &mut Criterion) {
    let model = conv_net(8);
    let graph = model.graph.clone().unwrap_or_default();
    let bytes = model.encode_to_vec();
    let options = ImportOptions::default();

    c.bench_function("from_onnx_8_blocks", |b| {
        b.iter(|| GraphBuilder::new().from_onnx(black_box(&graph)).unwrap())
    });

    c.bench_function("import_bytes_8_blocks", |b| {
        b.iter(|| import_model_from_bytes(black_box(&bytes), &options).unwrap())
    });

    c.bench_function("list_arguments_8_blocks", |b| {
        let (symbol, _) = GraphBuilder::new().from_onnx(&graph).unwrap();
        b.iter(|| black_box(&symbol).list_arguments())
    });
}

criterion_group!(benches, import_benchmark);
criterion_main!(benches);
