use std::path::PathBuf;
use std::process::{Command, Output};
use std::time::{SystemTime, UNIX_EPOCH};

fn bin_path() -> PathBuf {
    PathBuf::from(env!("CARGO_BIN_EXE_aqc"))
}

fn repo_root() -> PathBuf {
    // crates/aqc-cli -> repo root
    PathBuf::from(env!("CARGO_MANIFEST_DIR")).join("../..").canonicalize().unwrap()
}

fn fixture_path(name: &str) -> PathBuf {
    repo_root().join("tests/fixtures/aqc").join(name)
}

fn tmp_path(filename: &str) -> PathBuf {
    let nanos = SystemTime::now().duration_since(UNIX_EPOCH).unwrap().as_nanos();
    let mut p = std::env::temp_dir();
    p.push(format!("aqc_cli_{}_{}_{}", std::process::id(), nanos, filename));
    p
}

fn run(args: &[&str]) -> Output {
    Command::new(bin_path())
        .args(args)
        .output()
        .unwrap_or_else(|e| panic!("failed to run {:?} {:?}: {}", bin_path(), args, e))
}

fn run_compare(plots: &str, extra: &[&str]) -> Output {
    let runs = fixture_path("runs_current.json");
    let reference = fixture_path("runs_reference.json");
    let plots = fixture_path(plots);
    let inputs = fixture_path("inputs");
    let mut args = vec![
        "compare",
        "--runs",
        runs.to_str().unwrap(),
        "--reference",
        reference.to_str().unwrap(),
        "--plots",
        plots.to_str().unwrap(),
        "--input-dir",
        inputs.to_str().unwrap(),
    ];
    args.extend_from_slice(extra);
    run(&args)
}

fn compare(plots: &str, extra: &[&str]) -> serde_json::Value {
    let out = run_compare(plots, extra);
    assert!(
        out.status.success(),
        "compare should succeed, stderr={}",
        String::from_utf8_lossy(&out.stderr)
    );
    serde_json::from_slice(&out.stdout).expect("stdout should be valid JSON")
}

fn run_ids(v: &serde_json::Value) -> Vec<i64> {
    v.as_array().expect("array").iter().map(|x| x.as_i64().expect("run id")).collect()
}

#[test]
fn compare_flags_deviating_run() {
    let v = compare("plots.json", &[]);

    assert_eq!(v.get("tool").and_then(|x| x.as_str()), Some("aqc"));
    assert_eq!(v.get("id").and_then(|x| x.as_str()), Some("mch-apass2-vs-apass1"));
    assert_eq!(run_ids(&v["bad_runs"]), vec![101]);

    let plots = v["plots"].as_array().expect("plots should be an array");
    assert_eq!(plots.len(), 2);

    let occ = &plots[0];
    assert_eq!(occ["plot"], "Occupancy");
    assert_eq!(occ["label"], "Occupancy per quadrant");
    assert_eq!(run_ids(&occ["bad_runs"]), vec![101]);

    let runs = occ["runs"].as_array().unwrap();
    let evaluated: Vec<i64> = runs.iter().map(|r| r["run"].as_i64().unwrap()).collect();
    assert_eq!(evaluated, vec![100, 101]);
    assert_eq!(runs[0]["bad_bins"], 0);
    assert_eq!(runs[0]["flagged"], false);
    assert_eq!(runs[1]["checked_bins"], 4);
    assert_eq!(runs[1]["bad_bins"], 4);
    assert_eq!(runs[1]["flagged"], true);
    assert!(runs[1].get("ratio").is_none(), "ratio only emitted on request");

    let skipped = occ["skipped"].as_array().unwrap();
    assert_eq!(skipped.len(), 1);
    assert_eq!(skipped[0]["run"], 102);
    assert_eq!(skipped[0]["reason"]["kind"], "missing_reference");
}

#[test]
fn compare_projects_2d_plots() {
    let v = compare("plots.json", &[]);
    let hits = &v["plots"][1];
    assert_eq!(hits["plot"], "ST1/Hits");
    assert_eq!(hits["projection"], "x");
    assert_eq!(run_ids(&hits["bad_runs"]), Vec::<i64>::new());

    let runs = hits["runs"].as_array().unwrap();
    assert_eq!(runs.len(), 2);
    for r in runs {
        // 4 x-bins rebinned by 2
        assert_eq!(r["checked_bins"], 2);
        assert_eq!(r["flagged"], false);
    }
    assert!(hits["skipped"].as_array().unwrap().is_empty());
}

#[test]
fn compare_target_run_filters_others() {
    let v = compare("plots.json", &["--run", "100"]);
    assert_eq!(run_ids(&v["bad_runs"]), Vec::<i64>::new());
    for plot in v["plots"].as_array().unwrap() {
        let runs = plot["runs"].as_array().unwrap();
        assert_eq!(runs.len(), 1);
        assert_eq!(runs[0]["run"], 100);
        assert!(plot["skipped"].as_array().unwrap().is_empty());
    }
}

#[test]
fn compare_include_ratios_emits_histograms() {
    let v = compare("plots.json", &["--include-ratios", "--run", "101"]);
    let run = &v["plots"][0]["runs"][0];
    let ratio = &run["ratio"];
    assert_eq!(ratio["name"], "Occupancy_comp_101_ratio");
    let content: Vec<f64> =
        ratio["bin_content"].as_array().unwrap().iter().map(|x| x.as_f64().unwrap()).collect();
    assert_eq!(content.len(), 4);
    // current is flat, reference has 4x the content in the last bin (after normalization)
    assert!((content[0] - 1.75).abs() < 1e-9, "bin 0 ratio {}", content[0]);
    assert!((content[3] - 0.4375).abs() < 1e-9, "bin 3 ratio {}", content[3]);
    let verdicts = run["verdicts"].as_array().unwrap();
    assert!(verdicts.iter().all(|v| v == "bad"));
}

#[test]
fn compare_parallel_matches_sequential() {
    let seq = compare("plots.json", &["--threads", "1"]);
    let par = compare("plots.json", &["--threads", "0"]);
    assert_eq!(seq, par);
}

#[test]
fn compare_accepts_yaml_plots() {
    let v = compare("plots.yaml", &[]);
    let plots = v["plots"].as_array().unwrap();
    assert_eq!(plots.len(), 2);
    assert_eq!(run_ids(&plots[0]["bad_runs"]), vec![101]);
    // range [2, 4] covers the last two bins
    assert_eq!(plots[0]["runs"][1]["checked_bins"], 2);
    assert_eq!(plots[0]["runs"][1]["bad_bins"], 2);
    assert_eq!(plots[1]["projection"], "y");
}

#[test]
fn compare_writes_output_file() {
    let out_path = tmp_path("report.json");
    let out = out_path.to_str().unwrap().to_string();
    let res = run_compare("plots.json", &["--output", &out]);
    assert!(res.status.success(), "stderr={}", String::from_utf8_lossy(&res.stderr));
    assert!(res.stdout.is_empty(), "stdout should be empty when --output is set");

    let bytes = std::fs::read(&out_path).expect("output file should exist");
    let report: serde_json::Value = serde_json::from_slice(&bytes).unwrap();
    assert_eq!(run_ids(&report["bad_runs"]), vec![101]);
    let _ = std::fs::remove_file(&out_path);
}

#[test]
fn invalid_plot_config_aborts_before_loading() {
    let plots = tmp_path("plots_bad.json");
    std::fs::write(
        &plots,
        r#"{ "id": "bad", "plots": [ { "detector": "MCH", "task": "Digits", "name": "Occupancy", "rebin": 0 } ] }"#,
    )
    .unwrap();

    let out = run(&[
        "compare",
        "--runs",
        fixture_path("runs_current.json").to_str().unwrap(),
        "--reference",
        fixture_path("runs_reference.json").to_str().unwrap(),
        "--plots",
        plots.to_str().unwrap(),
        "--input-dir",
        fixture_path("inputs").to_str().unwrap(),
    ]);
    assert!(!out.status.success(), "rebin 0 should be rejected");
    let stderr = String::from_utf8_lossy(&out.stderr);
    assert!(stderr.contains("rebin"), "unexpected stderr: {}", stderr);
    assert!(out.stdout.is_empty());
    let _ = std::fs::remove_file(&plots);
}

#[test]
fn validate_config_reports_specs() {
    let plots = fixture_path("plots.yaml");
    let out = run(&["validate-config", "--plots", plots.to_str().unwrap()]);
    assert!(
        out.status.success(),
        "validate-config should succeed, stderr={}",
        String::from_utf8_lossy(&out.stderr)
    );
    let v: serde_json::Value = serde_json::from_slice(&out.stdout).unwrap();
    assert_eq!(v["valid"], true);
    let plots = v["plots"].as_array().unwrap();
    assert_eq!(plots[0]["plot"], "MCH/Digits/Occupancy");
    assert_eq!(plots[0]["spec"]["threshold"], 0.2);
    assert_eq!(plots[1]["spec"]["projection"], "y");
}

#[test]
fn missing_plots_key_yields_empty_report() {
    let plots = tmp_path("plots_empty.json");
    std::fs::write(&plots, r#"{ "id": "empty" }"#).unwrap();
    let out = run(&[
        "compare",
        "--runs",
        fixture_path("runs_current.json").to_str().unwrap(),
        "--reference",
        fixture_path("runs_reference.json").to_str().unwrap(),
        "--plots",
        plots.to_str().unwrap(),
        "--input-dir",
        fixture_path("inputs").to_str().unwrap(),
    ]);
    assert!(out.status.success());
    let v: serde_json::Value = serde_json::from_slice(&out.stdout).unwrap();
    assert!(v["plots"].as_array().unwrap().is_empty());
    assert!(v["bad_runs"].as_array().unwrap().is_empty());
    let _ = std::fs::remove_file(&plots);
}
