use serde_json::Value;
use std::ffi::OsStr;
use std::fs;
use std::path::{Path, PathBuf};
use std::process::{Command, Output};
use std::time::{SystemTime, UNIX_EPOCH};

struct TempDirGuard {
    path: PathBuf,
}

impl TempDirGuard {
    fn new(prefix: &str) -> Self {
        let unique = SystemTime::now()
            .duration_since(UNIX_EPOCH)
            .expect("clock should be after unix epoch")
            .as_nanos();
        let path = std::env::temp_dir().join(format!(
            "spine-cli-{prefix}-{}-{unique}",
            std::process::id()
        ));
        fs::create_dir_all(&path).expect("temp dir should be created");
        Self { path }
    }

    fn path(&self) -> &Path {
        &self.path
    }
}

impl Drop for TempDirGuard {
    fn drop(&mut self) {
        let _ = fs::remove_dir_all(&self.path);
    }
}

fn run_spine<I, S>(args: I) -> Output
where
    I: IntoIterator<Item = S>,
    S: AsRef<OsStr>,
{
    let bin = env!("CARGO_BIN_EXE_spine");
    Command::new(bin)
        .args(args)
        .output()
        .expect("spine command should execute")
}

fn assert_success(output: &Output) {
    if !output.status.success() {
        panic!(
            "command failed with status {:?}\nstdout:\n{}\nstderr:\n{}",
            output.status.code(),
            String::from_utf8_lossy(&output.stdout),
            String::from_utf8_lossy(&output.stderr),
        );
    }
}

fn assert_failure(output: &Output) {
    if output.status.success() {
        panic!(
            "command unexpectedly succeeded\nstdout:\n{}\nstderr:\n{}",
            String::from_utf8_lossy(&output.stdout),
            String::from_utf8_lossy(&output.stderr),
        );
    }
}

fn stdout_text(output: &Output) -> String {
    String::from_utf8_lossy(&output.stdout).into_owned()
}

fn parse_json_stdout(output: &Output) -> Value {
    serde_json::from_slice::<Value>(&output.stdout).unwrap_or_else(|e| {
        panic!(
            "expected valid JSON stdout, got error: {e}\nstdout:\n{}",
            String::from_utf8_lossy(&output.stdout)
        )
    })
}

fn write_sample(dir: &Path) -> PathBuf {
    let lines = [
        r#"{"header":{"run":1,"subrun":1,"event":1},"reco":[{"id":0,"vertex":[-210.0,0.0,0.0],"flash_times":[0.5],"is_flash_matched":true}]}"#,
        r#"{"header":{"run":1,"subrun":2,"event":2},"reco":[{"id":0,"vertex":[15.0,0.0,0.0]}]}"#,
    ];
    let path = dir.join("data.jsonl");
    fs::write(&path, format!("{}\n", lines.join("\n"))).expect("sample records should be written");
    path
}

fn write_config(dir: &Path, branch: &str) -> PathBuf {
    let text = format!(
        r#"
[general]
output = "out"

[[sample]]
name = "data"
path = "data.jsonl"

[[tree]]
name = "selected"
mode = "reco"
add_exposure = true
cut = [{{ name = "valid_flashmatch", type = "reco" }}]
branch = [{{ name = "{branch}", type = "both" }}]
"#
    );
    let path = dir.join("analysis.toml");
    fs::write(&path, text).expect("config should be written");
    path
}

#[test]
fn registry_json_lists_content() {
    let output = run_spine(["registry", "--json"]);
    assert_success(&output);
    let payload = parse_json_stdout(&output);
    assert_eq!(payload["kind"], "spine.catalog_listing.v1");
    let registries = payload["registries"].as_array().expect("registries array");
    let reco_cuts = registries
        .iter()
        .find(|entry| entry["registry"] == "cut<reco_interaction>")
        .expect("reco interaction cuts");
    let names = reco_cuts["names"].as_array().expect("names");
    assert!(names.iter().any(|name| name == "reco_flash_cut"));
    assert!(!names.iter().any(|name| name == "reco_iscc"));
}

#[test]
fn inspect_summarizes_records() {
    let tmp = TempDirGuard::new("inspect");
    let records = write_sample(tmp.path());
    let output = run_spine([OsStr::new("inspect"), records.as_os_str(), OsStr::new("--json")]);
    assert_success(&output);
    let payload = parse_json_stdout(&output);
    assert_eq!(payload["summary"]["spills"], 2);
    assert_eq!(payload["summary"]["subruns"], 2);
    assert_eq!(payload["summary"]["recoInteractions"], 2);
}

#[test]
fn check_reports_compiled_branches() {
    let tmp = TempDirGuard::new("check");
    let config = write_config(tmp.path(), "vertex_x");
    let output = run_spine([OsStr::new("check"), config.as_os_str(), OsStr::new("--json")]);
    assert_success(&output);
    let payload = parse_json_stdout(&output);
    let tree = &payload["samples"][0]["trees"][0];
    assert_eq!(tree["tree"], "selected");
    assert_eq!(tree["branches"], serde_json::json!(["true_vertex_x", "reco_vertex_x"]));
    assert_eq!(tree["exposure_table"], "selected_exposure");
}

#[test]
fn check_rejects_unknown_variable() {
    let tmp = TempDirGuard::new("check-unknown");
    let config = write_config(tmp.path(), "vertex_w");
    let output = run_spine([OsStr::new("check"), config.as_os_str()]);
    assert_failure(&output);
    assert_eq!(output.status.code(), Some(1));
    let stderr = String::from_utf8_lossy(&output.stderr);
    assert!(stderr.contains("true_vertex_w"), "stderr:\n{stderr}");
}

#[test]
fn run_writes_tables_and_manifest() {
    let tmp = TempDirGuard::new("run");
    write_sample(tmp.path());
    let config = write_config(tmp.path(), "vertex_x");
    let out = tmp.path().join("out");
    let output = run_spine([
        OsStr::new("run"),
        config.as_os_str(),
        OsStr::new("--output"),
        out.as_os_str(),
    ]);
    assert_success(&output);
    assert!(stdout_text(&output).contains("Total rows: 3"));

    let table = fs::read_to_string(out.join("data/selected.jsonl")).expect("table written");
    let row: Value = serde_json::from_str(table.lines().next().expect("one row")).expect("row json");
    assert_eq!(row["reco_vertex_x"], -210.0);
    assert!(row["true_vertex_x"].is_null());

    let manifest: Value =
        serde_json::from_str(&fs::read_to_string(out.join("manifest.json")).expect("manifest"))
            .expect("manifest json");
    assert_eq!(manifest["kind"], "spine.selection_manifest.v1");
    assert_eq!(manifest["tables"][1]["table"], "selected_exposure");
}

#[test]
fn missing_records_exit_with_io_status() {
    let tmp = TempDirGuard::new("missing");
    let output = run_spine([OsStr::new("inspect"), tmp.path().join("nope.jsonl").as_os_str()]);
    assert_failure(&output);
    assert_eq!(output.status.code(), Some(2));
    let stderr = String::from_utf8_lossy(&output.stderr);
    assert!(stderr.contains("nope.jsonl: cannot open:"), "stderr:\n{stderr}");
    assert!(!stderr.contains("line 0"), "stderr:\n{stderr}");

    let config = write_config(tmp.path(), "vertex_x");
    let output = run_spine([
        OsStr::new("run"),
        config.as_os_str(),
        OsStr::new("--output"),
        tmp.path().join("out").as_os_str(),
    ]);
    assert_failure(&output);
    assert_eq!(output.status.code(), Some(2));
}
