//! Integration tests: run each fixture configuration end to end.
//!
//! Each fixture in tests/fixtures/ has:
//! - config.toml: the analysis configuration
//! - spills.jsonl: the sample's records
//! - expect.json: rows per `<sample>/<table>`, NaN rendered as null

use std::path::{Path, PathBuf};
use std::time::{SystemTime, UNIX_EPOCH};

use serde_json::{Map, Value};
use spine_ana::{Analysis, AnalysisError, Manifest, SpillReader};

fn fixtures_dir() -> PathBuf {
    PathBuf::from(env!("CARGO_MANIFEST_DIR")).join("tests/fixtures")
}

fn analysis(dir: &Path) -> Analysis {
    let config_path = dir.join("config.toml");
    let config = spine_config::load(&config_path)
        .unwrap_or_else(|e| panic!("failed to load {}: {e}", config_path.display()));
    let catalog = spine_content::bootstrap().expect("content must bootstrap");
    Analysis::new(config, catalog).unwrap_or_else(|e| panic!("failed to compile: {e}"))
}

fn run_fixture(name: &str) {
    let dir = fixtures_dir().join(name);
    let analysis = analysis(&dir);

    let mut got = Map::new();
    for compiled in analysis.samples() {
        let reader = SpillReader::open(&compiled.sample.path)
            .unwrap_or_else(|e| panic!("failed to open {}: {e}", compiled.sample.path.display()));
        let tables = compiled
            .process(reader)
            .unwrap_or_else(|e| panic!("failed to read {}: {e}", compiled.sample.path.display()));
        for table in tables {
            let rows = table.rows.iter().map(|row| table.row_json(row)).collect();
            got.insert(format!("{}/{}", compiled.sample.name, table.name), Value::Array(rows));
        }
    }
    let got = Value::Object(got);

    let expect_path = dir.join("expect.json");
    let expect_str = std::fs::read_to_string(&expect_path)
        .unwrap_or_else(|e| panic!("failed to read {}: {e}", expect_path.display()));
    let expected: Value = serde_json::from_str(&expect_str)
        .unwrap_or_else(|e| panic!("failed to parse {}: {e}", expect_path.display()));

    assert_eq!(
        got,
        expected,
        "\n\nFixture: {name}\n\nGot:\n{}\n\nExpected:\n{}\n",
        serde_json::to_string_pretty(&got).expect("render"),
        serde_json::to_string_pretty(&expected).expect("render"),
    );
}

#[test]
fn data_reco_row_reports_nan_truth() {
    run_fixture("data_reco_nan");
}

#[test]
fn sim_unmatched_truth_cut_rejects_row() {
    run_fixture("sim_unmatched_rejects");
}

#[test]
fn matched_interaction_agrees_from_both_sides() {
    run_fixture("matched_both");
}

#[test]
fn particles_categories_and_exposure() {
    run_fixture("particles_and_exposure");
}

#[test]
fn event_mode_on_data_with_beam_quality() {
    run_fixture("event_mode_data");
}

#[test]
fn photon_pairs_and_cut_flags() {
    run_fixture("pi0_pairs");
}

#[test]
fn run_writes_tables_and_manifest() {
    let dir = fixtures_dir().join("particles_and_exposure");
    let analysis = analysis(&dir);
    let unique = SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .expect("clock")
        .as_nanos();
    let output = std::env::temp_dir().join(format!("spine-ana-run-{}-{unique}", std::process::id()));

    let manifest = analysis.run(&output).expect("run");
    assert_eq!(manifest.kind, spine_ana::MANIFEST_KIND);
    assert_eq!(manifest.config_digest, analysis.config().digest);
    assert_eq!(manifest.tables.len(), 2);
    assert_eq!(manifest.tables[0].path, "mc/particles.jsonl");
    assert_eq!(manifest.tables[0].rows, 2);
    assert_eq!(manifest.tables[0].spills, 2);
    assert_eq!(manifest.tables[1].table, "particles_exposure");
    assert_eq!(manifest.total_rows(), 4);

    let written = std::fs::read_to_string(output.join("mc/particles.jsonl")).expect("table");
    assert_eq!(written.lines().count(), 2);
    let reread = Manifest::read_from_dir(&output).expect("manifest");
    assert_eq!(reread, manifest);

    let _ = std::fs::remove_dir_all(&output);
}

#[test]
fn unknown_variable_fails_before_reading() {
    let text = r#"
[general]
output = "out"

[[sample]]
name = "mc"
path = "does-not-exist.jsonl"
ismc = true

[[tree]]
name = "selected"
mode = "reco"
branch = [{ name = "no_such_variable", type = "reco" }]
"#;
    let config = spine_config::parse(text).expect("parse");
    let catalog = spine_content::bootstrap().expect("bootstrap");
    let err = Analysis::new(config, catalog).err().expect("compile error");
    assert!(matches!(err, AnalysisError::Compile { ref tree, .. } if tree == "selected"));
    assert_eq!(err.exit_code(), 1);
    assert_eq!(
        err.to_string(),
        "sample `mc`, tree `selected`: variable<reco_interaction>: `reco_no_such_variable` is not registered"
    );
}

#[test]
fn event_mode_rejects_interaction_cuts() {
    let text = r#"
[general]
output = "out"

[[sample]]
name = "mc"
path = "mc.jsonl"
ismc = true

[[tree]]
name = "spills"
mode = "event"
cut = [{ name = "valid_flashmatch", type = "reco" }]
branch = [{ name = "nreco", type = "event" }]
"#;
    let config = spine_config::parse(text).expect("parse");
    let catalog = spine_content::bootstrap().expect("bootstrap");
    let err = Analysis::new(config, catalog).err().expect("compile error");
    assert!(matches!(
        err,
        AnalysisError::Compile {
            source: spine_kernel::SelectionError::CutNotApplicable { .. },
            ..
        }
    ));
}
