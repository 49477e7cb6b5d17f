//! Example: ONNX model import
//!
//! Loads an ONNX model, translates it and prints the resulting symbol.
//!
//! # Usage
//!
//! ```bash
//! RUST_LOG=debug cargo run --example import_model -- model.onnx
//! ```

use std::env;

use onnx_symbol_import::io::{load_model, ModelInfo};
use onnx_symbol_import::prelude::*;

fn main() -> ImportResult<()> {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();

    let args: Vec<String> = env::args().collect();

    if args.len() < 2 {
        eprintln!("Usage: {} <model.onnx> [options]", args[0]);
        eprintln!();
        eprintln!("Options:");
        eprintln!("  --no-validate     Skip graph connectivity checks");
        eprintln!("  --no-opset-check  Accept any default-domain opset");
        std::process::exit(1);
    }

    let input_path = &args[1];
    let options = ImportOptions {
        validate_input: !args.contains(&"--no-validate".to_string()),
        check_opset: !args.contains(&"--no-opset-check".to_string()),
    };

    let model = load_model(input_path)?;
    let info = ModelInfo::from_model(&model);
    println!("Model Information:");
    println!("  IR Version: {}", info.ir_version);
    println!(
        "  Producer: {} {}",
        info.producer_name, info.producer_version
    );
    println!("  Opset: {:?}", info.opset_version);
    println!("  Graph: {}", info.graph_name);
    println!("  Nodes: {}", info.node_count);
    println!("  Initializers: {}", info.initializer_count);

    let (symbol, params) = import_onnx_model(&model, &options)?;

    println!();
    println!("Symbol:");
    println!("  Outputs: {:?}", symbol.list_outputs());
    println!("  Arguments: {:?}", symbol.list_arguments());
    println!();
    println!("Nodes:");
    for node in symbol.topo_nodes().iter().filter(|node| !node.is_variable()) {
        let attrs: Vec<String> = node
            .attrs()
            .iter()
            .map(|(key, value)| format!("{}={}", key, value))
            .collect();
        println!("  {} = {}({})", node.name(), node.op_name(), attrs.join(", "));
    }
    println!();
    println!("Parameters:");
    for (name, array) in &params {
        println!("  {}: {:?}", name, array.shape());
    }

    Ok(())
}
