//! Tests for sweeps driven through shell commands
//!
//! The solve script writes a results file whose drag value tracks the
//! `Back Offset` parameter, so every row can be checked against its inputs.

use std::fs;
use std::path::Path;

use simsweep_core::Harness;
use simsweep_core::log::parse_line;
use tempfile::tempdir;

use crate::config::HarnessConfig;
use crate::engine::CommandEngine;
use crate::inspect::LogReport;

const CONFIG: &str = r#"
output: out/sweep.csv
pause_seconds: 0
engine:
  commands:
    mesh: 'test "$SIMSWEEP_PARAM_BACK_OFFSET" != 8 || { echo "surface mesh failed, 2 holes" >&2; exit 1; }'
    solve: ./solve.sh
  parameters:
    - { name: Back Offset, value: 9.0, unit: m }
    - { name: Mesh Base, value: 20.0 }
  monitors:
    coefficients:
      - { name: Drag Coefficient Monitor, unit: none }
    residuals:
      - { name: Continuity }
sweep:
  max_steps: 2
  comment: offset study
  fixed:
    - { name: Mesh Base, value: 25.0 }
  axes:
    - name: Back Offset
      start: 6.0
      step: 2.0
      max: 10.0
"#;

const SOLVE: &str = r#"#!/bin/sh
cat > results.yaml <<YAML
iterations: $SIMSWEEP_MAX_STEPS
mesh: { cells: 1000, faces: 2500, vertices: 1200 }
series:
  coefficients:
    - { name: Drag Coefficient Monitor, values: [1.0, $SIMSWEEP_PARAM_BACK_OFFSET] }
  residuals:
    - { name: Continuity, values: [0.1, 0.01] }
YAML
"#;

fn write_case(dir: &Path) {
    use std::os::unix::fs::PermissionsExt;

    fs::write(dir.join("sweep.yaml"), CONFIG).unwrap();
    let script = dir.join("solve.sh");
    fs::write(&script, SOLVE).unwrap();
    fs::set_permissions(&script, fs::Permissions::from_mode(0o755)).unwrap();
}

#[test]
fn test_config_to_results_log() {
    let dir = tempdir().unwrap();
    write_case(dir.path());

    let config = HarnessConfig::load(&dir.path().join("sweep.yaml")).unwrap();
    let mut harness = Harness::new(CommandEngine::new(config.engine));
    let summary = harness.run(&config.sweep, &config.output).unwrap();

    assert_eq!(summary.runs, 3);
    assert_eq!(summary.failures, 1);

    let content = fs::read_to_string(dir.path().join("out/sweep.csv")).unwrap();
    let lines: Vec<_> = content.lines().collect();
    assert_eq!(
        lines[0],
        "Back Offset, Mesh Base, Drag Coefficient[none], Total Meshing Time [min], \
         Cell Count, Face Count, Vertex Count, Iteration, Continuity, Error, Comment"
    );

    let first = parse_line(lines[1]);
    assert_eq!(first[..3], ["6", "25", "6"]);
    assert_eq!(first[4..], ["1000", "2500", "1200", "2", "0.01", "N/A", "offset study"]);

    let failed = parse_line(lines[2]);
    assert_eq!(failed[..3], ["8", "25", ""]);
    assert_eq!(failed[9], "surface mesh failed/ 2 holes");

    let report = LogReport::parse(&content);
    assert_eq!(report.rows, 3);
    assert_eq!(report.failed.len(), 1);
    assert_eq!(report.failed[0].parameters, vec!["Back Offset=8", "Mesh Base=25"]);
    assert!(report.malformed.is_empty());
}

#[test]
fn test_unknown_axis_parameter_leaves_no_log() {
    let dir = tempdir().unwrap();
    write_case(dir.path());
    let yaml = CONFIG.replace("    - name: Back Offset\n      start", "    - name: Wheelbase\n      start");
    fs::write(dir.path().join("sweep.yaml"), yaml).unwrap();

    let config = HarnessConfig::load(&dir.path().join("sweep.yaml")).unwrap();
    let result = Harness::new(CommandEngine::new(config.engine)).run(&config.sweep, &config.output);

    assert!(result.is_err());
    assert!(!dir.path().join("out/sweep.csv").exists());
}
