use serde_json::json;

use crate::support::{compile_or_exit, print_json};

pub const CHECK_REPORT_KIND: &str = "spine.check_report.v1";
pub const CHECK_REPORT_SCHEMA: u32 = 1;

pub fn run(config: String, json_output: bool) {
    let analysis = compile_or_exit(&config);
    let digest = &analysis.config().digest;

    if json_output {
        let samples: Vec<_> = analysis
            .samples()
            .iter()
            .map(|compiled| {
                let trees: Vec<_> = compiled
                    .trees
                    .iter()
                    .map(|tree| {
                        json!({
                            "tree": tree.name,
                            "branches": tree.columns(),
                            "exposure_table": tree.exposure_table(),
                        })
                    })
                    .collect();
                json!({
                    "sample": compiled.sample.name,
                    "simulated": compiled.sample.is_simulated,
                    "trees": trees,
                })
            })
            .collect();
        print_json(&json!({
            "schema": CHECK_REPORT_SCHEMA,
            "kind": CHECK_REPORT_KIND,
            "config": config,
            "config_digest": digest,
            "samples": samples,
        }));
        return;
    }

    println!("spine check {config}");
    println!("  Digest: {digest}");
    for compiled in analysis.samples() {
        let sample = &compiled.sample;
        let flavour = if sample.is_simulated { "simulation" } else { "data" };
        println!("  Sample {} ({flavour})", sample.name);
        for tree in &compiled.trees {
            println!("    Tree {}: {}", tree.name, tree.columns().join(", "));
            if let Some(exposure) = tree.exposure_table() {
                println!("    Tree {exposure}: livetime, pot");
            }
        }
    }
}
