use serde_json::json;
use spine_ana::{RecordError, SpillReader, summarize};

use crate::support::print_json;

pub fn run(records: String, json_output: bool) {
    let summary = SpillReader::open(&records)
        .and_then(summarize)
        .unwrap_or_else(|e| {
            match e {
                RecordError::Open { .. } => eprintln!("error: {e}"),
                _ => eprintln!("error: {records}: {e}"),
            }
            std::process::exit(2);
        });

    if json_output {
        print_json(&json!({
            "records": records,
            "summary": summary,
        }));
        return;
    }

    println!("spine inspect {records}");
    println!("  Spills: {} ({} simulated)", summary.spills, summary.simulated_spills);
    println!("  Subruns: {}", summary.subruns);
    println!(
        "  Interactions: {} reco, {} true",
        summary.reco_interactions, summary.true_interactions
    );
    println!(
        "  Particles: {} reco, {} true",
        summary.reco_particles, summary.true_particles
    );
}
