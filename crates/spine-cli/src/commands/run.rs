use std::path::PathBuf;

use crate::support::{compile_or_exit, exit_with, print_json};

pub fn run(config: String, output: Option<String>, json_output: bool) {
    let analysis = compile_or_exit(&config);
    let output = output.map_or_else(|| analysis.config().output.clone(), PathBuf::from);
    let manifest = analysis.run(&output).unwrap_or_else(|e| exit_with(&e));

    if json_output {
        match serde_json::to_value(&manifest) {
            Ok(payload) => print_json(&payload),
            Err(e) => {
                eprintln!("error: failed to render manifest: {e}");
                std::process::exit(2);
            }
        }
        return;
    }

    println!("spine run {config}");
    println!("  Output: {}", output.display());
    for table in &manifest.tables {
        println!(
            "  {}: {} rows from {} spills",
            table.path, table.rows, table.spills
        );
    }
    println!("  Total rows: {}", manifest.total_rows());
}
