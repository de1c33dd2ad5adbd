// SPDX-License-Identifier: AGPL-3.0-or-later
// SPDX-FileCopyrightText: 2025 Jonathan D.A. Jewell
//! Integration tests for the topolens CLI commands

use assert_cmd::Command;
use predicates::prelude::*;
use std::fs;
use std::path::PathBuf;
use tempfile::TempDir;

/// Two countries joined through a transit router in a third
const TOPOLOGY: &str = r#"{
    "nodes": [
        {"id": "de1", "country": "DE"},
        {"id": "de2", "country": "DE"},
        {"id": "pl1", "country": "PL"},
        {"id": "fr1", "country": "FR"}
    ],
    "links": [
        {"source": "de1", "target": "de2", "cost": 1},
        {"source": "de2", "target": "pl1", "forward_cost": 4, "reverse_cost": 6},
        {"source": "pl1", "target": "fr1", "cost": 3},
        {"source": "de1", "target": "fr1", "cost": 20}
    ]
}"#;

/// Write the fixture topology (and optionally a scenario) into a temp dir
fn fixture(scenario: Option<&str>) -> (TempDir, PathBuf, Option<PathBuf>) {
    let dir = TempDir::new().unwrap();
    let topology = dir.path().join("topology.json");
    fs::write(&topology, TOPOLOGY).unwrap();
    let scenario = scenario.map(|content| {
        let path = dir.path().join("scenario.toml");
        fs::write(&path, content).unwrap();
        path
    });
    (dir, topology, scenario)
}

/// The CLI with environment isolated from the host
fn topolens() -> Command {
    let mut cmd = Command::cargo_bin("topolens").unwrap();
    cmd.env_remove("RUST_LOG")
        .env_remove("TOPOLENS_CONFIG")
        .env("NO_COLOR", "1");
    cmd
}

#[test]
fn test_summary_reports_counts() {
    let (_dir, topology, _) = fixture(None);

    topolens()
        .arg("summary")
        .arg(&topology)
        .assert()
        .success()
        .stdout(predicate::str::contains("4 (4 active)"))
        .stdout(predicate::str::contains("asymmetric links: 1"))
        .stdout(predicate::str::contains("topo:"));
}

#[test]
fn test_path_is_direction_aware() {
    let (_dir, topology, _) = fixture(None);

    topolens()
        .args(["path"])
        .arg(&topology)
        .args(["de1", "pl1"])
        .assert()
        .success()
        .stdout(predicate::str::contains("de1 -> de2 -> pl1  (cost 5, 2 hops)"));

    topolens()
        .args(["path"])
        .arg(&topology)
        .args(["pl1", "de1"])
        .assert()
        .success()
        .stdout(predicate::str::contains("(cost 7, 2 hops)"));
}

#[test]
fn test_path_unknown_router_fails() {
    let (_dir, topology, _) = fixture(None);

    topolens()
        .arg("path")
        .arg(&topology)
        .args(["de1", "nowhere"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("Unknown router: nowhere"));
}

#[test]
fn test_paths_json_is_sorted() {
    let (_dir, topology, _) = fixture(None);

    let output = topolens()
        .args(["--json", "paths"])
        .arg(&topology)
        .args(["de1", "fr1"])
        .output()
        .unwrap();
    assert!(output.status.success());

    let paths: serde_json::Value = serde_json::from_slice(&output.stdout).unwrap();
    let costs: Vec<i64> = paths
        .as_array()
        .unwrap()
        .iter()
        .map(|p| p["cost"].as_i64().unwrap())
        .collect();
    assert_eq!(costs, vec![8, 20]);
}

#[test]
fn test_transit_finds_the_middle_country() {
    let (_dir, topology, _) = fixture(None);

    topolens()
        .args(["transit"])
        .arg(&topology)
        .assert()
        .success()
        .stdout(predicate::str::contains("pl1 (PL)"));
}

#[test]
fn test_scenario_changes_the_path() {
    let (_dir, topology, scenario) = fixture(Some(
        "[[edit]]\nsource = \"pl1\"\ntarget = \"fr1\"\nstatus = \"down\"\n",
    ));

    topolens()
        .arg("--overrides")
        .arg(scenario.unwrap())
        .arg("path")
        .arg(&topology)
        .args(["de1", "fr1"])
        .assert()
        .success()
        .stdout(predicate::str::contains("de1 -> fr1  (cost 20, 1 hops)"));
}

#[test]
fn test_diff_lists_simulated_links() {
    let (_dir, topology, scenario) = fixture(Some("[[edit]]\nlink = 1\nforward_cost = 40\n"));

    topolens()
        .arg("--overrides")
        .arg(scenario.unwrap())
        .arg("diff")
        .arg(&topology)
        .assert()
        .success()
        .stdout(predicate::str::contains("#1 de2 -- pl1: cost 4/6 -> 40/6"));
}

#[test]
fn test_impact_reports_rerouted_pairs() {
    let (_dir, topology, _) = fixture(None);

    let output = topolens()
        .args(["--json", "impact"])
        .arg(&topology)
        .args(["--fail-link", "2"])
        .output()
        .unwrap();
    assert!(output.status.success());

    let report: serde_json::Value = serde_json::from_slice(&output.stdout).unwrap();
    let impacts = report["impacts"].as_array().unwrap();
    assert!(impacts
        .iter()
        .any(|i| i["from"] == "DE" && i["to"] == "FR" && i["outcome"] == "rerouted"));
}

#[test]
fn test_impact_needs_failures() {
    let (_dir, topology, _) = fixture(None);

    topolens()
        .arg("impact")
        .arg(&topology)
        .assert()
        .failure()
        .stderr(predicate::str::contains("Nothing to fail"));
}

#[test]
fn test_export_json_round_trips() {
    let (dir, topology, scenario) = fixture(Some("[[edit]]\nlink = 3\nforward_cost = 2\nreverse_cost = 2\n"));
    let exported = dir.path().join("exported.json");

    topolens()
        .arg("--overrides")
        .arg(scenario.unwrap())
        .arg("export")
        .arg(&topology)
        .arg("--output")
        .arg(&exported)
        .assert()
        .success();

    topolens()
        .arg("path")
        .arg(&exported)
        .args(["de1", "fr1"])
        .assert()
        .success()
        .stdout(predicate::str::contains("de1 -> fr1  (cost 2, 1 hops)"));
}

#[test]
fn test_export_dot() {
    let (_dir, topology, _) = fixture(None);

    topolens()
        .args(["export", "--format", "dot"])
        .arg(&topology)
        .assert()
        .success()
        .stdout(predicate::str::starts_with("graph topology {"))
        .stdout(predicate::str::contains("4/6"));
}

#[test]
fn test_invalid_topology_is_rejected() {
    let dir = TempDir::new().unwrap();
    let topology = dir.path().join("empty.json");
    fs::write(&topology, r#"{"nodes": [], "links": []}"#).unwrap();

    topolens()
        .arg("summary")
        .arg(&topology)
        .assert()
        .failure()
        .stderr(predicate::str::contains("Failed to load"));
}

#[test]
fn test_completions() {
    topolens()
        .args(["completions", "bash"])
        .assert()
        .success()
        .stdout(predicate::str::contains("topolens"));
}

#[test]
fn test_no_color_accepts_any_non_empty_value() {
    let (_dir, topology, _) = fixture(None);

    for value in ["yes", "1", "true"] {
        topolens()
            .env("NO_COLOR", value)
            .arg("path")
            .arg(&topology)
            .args(["de1", "pl1"])
            .assert()
            .success()
            .stdout(predicate::str::contains("de1 -> de2 -> pl1"));
    }

    topolens()
        .env("NO_COLOR", "yes")
        .args(["completions", "bash"])
        .assert()
        .success();
}

#[test]
fn test_out_of_range_scenario_edit_is_dropped() {
    let (_dir, topology, scenario) = fixture(Some(
        "[[edit]]\nlink = 5\nstatus = \"down\"\n\n[[edit]]\nlink = 3\nforward_cost = 2\nreverse_cost = 2\n",
    ));

    topolens()
        .arg("--overrides")
        .arg(scenario.unwrap())
        .arg("path")
        .arg(&topology)
        .args(["de1", "fr1"])
        .assert()
        .success()
        .stdout(predicate::str::contains("de1 -> fr1  (cost 2, 1 hops)"))
        .stderr(predicate::str::contains("StaleOverride"))
        .stderr(predicate::str::contains("link 5 does not exist"));
}

#[test]
fn test_scenario_pinned_to_another_topology_is_refused() {
    let (_dir, topology, scenario) = fixture(Some(
        "fingerprint = \"topo:0123456789abcdef\"\n\n[[edit]]\nlink = 0\nstatus = \"down\"\n",
    ));

    topolens()
        .arg("--overrides")
        .arg(scenario.unwrap())
        .arg("path")
        .arg(&topology)
        .args(["de1", "pl1"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("refer to topology topo:0123456789abcdef"));
}

#[test]
fn test_scenario_pinned_to_this_topology_applies() {
    let (dir, topology, _) = fixture(None);

    let output = topolens()
        .args(["--json", "summary"])
        .arg(&topology)
        .output()
        .unwrap();
    let stats: serde_json::Value = serde_json::from_slice(&output.stdout).unwrap();
    let fingerprint = stats["fingerprint"].as_str().unwrap();

    let scenario = dir.path().join("pinned.toml");
    fs::write(
        &scenario,
        format!("fingerprint = \"{fingerprint}\"\n\n[[edit]]\nlink = 3\nforward_cost = 2\nreverse_cost = 2\n"),
    )
    .unwrap();

    topolens()
        .arg("--overrides")
        .arg(&scenario)
        .arg("path")
        .arg(&topology)
        .args(["de1", "fr1"])
        .assert()
        .success()
        .stdout(predicate::str::contains("(cost 2, 1 hops)"));
}

#[test]
fn test_quiet_keeps_results_only() {
    let (dir, topology, scenario) = fixture(Some("[[edit]]\nlink = 5\nstatus = \"down\"\n"));
    let exported = dir.path().join("quiet.json");

    topolens()
        .arg("-q")
        .arg("--overrides")
        .arg(scenario.unwrap())
        .arg("export")
        .arg(&topology)
        .arg("--output")
        .arg(&exported)
        .assert()
        .success()
        .stdout(predicate::str::is_empty())
        .stderr(predicate::str::is_empty());
    assert!(exported.exists());

    topolens()
        .args(["-q", "path"])
        .arg(&topology)
        .args(["de1", "pl1"])
        .assert()
        .success()
        .stdout(predicate::str::contains("(cost 5, 2 hops)"));
}
