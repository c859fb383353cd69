use std::{fs, path::PathBuf};

use tempfile::tempdir;

use dotlens_cli::{Args, run};

fn fixtures() -> PathBuf {
    PathBuf::from(env!("CARGO_MANIFEST_DIR"))
        .join("tests")
        .join("fixtures")
}

/// Collects all .dot files from a directory
fn collect_dot_files(dir: PathBuf) -> Vec<PathBuf> {
    let mut files = if let Ok(entries) = fs::read_dir(&dir) {
        entries
            .flatten()
            .map(|entry| entry.path())
            .filter(|path| {
                path.is_file() && path.extension().and_then(|s| s.to_str()) == Some("dot")
            })
            .collect()
    } else {
        Vec::new()
    };

    files.sort();
    files
}

fn args(input: &PathBuf, output: PathBuf) -> Args {
    Args {
        input: input.to_string_lossy().to_string(),
        output: output.to_string_lossy().to_string(),
        config: None,
        layout_command: None,
        method: Some("embedded".to_string()),
        log_level: "off".to_string(),
    }
}

#[test]
fn e2e_smoke_test_valid_inputs() {
    let temp_dir = tempdir().expect("Failed to create temp directory");
    let inputs = collect_dot_files(fixtures());
    assert!(!inputs.is_empty(), "No inputs found in tests/fixtures/");

    let mut failed = Vec::new();
    for input in &inputs {
        let stem = input.file_stem().unwrap().to_string_lossy().to_string();
        for extension in ["svg", "dot", "xdot"] {
            let output = temp_dir.path().join(format!("{stem}.{extension}"));
            if let Err(e) = run(&args(input, output.clone())) {
                failed.push((input.clone(), e));
                continue;
            }
            let written = fs::read_to_string(&output).unwrap();
            assert!(!written.is_empty(), "{} is empty", output.display());
        }
    }

    if !failed.is_empty() {
        eprintln!("\nInputs that failed:");
        for (path, err) in &failed {
            eprintln!("  - {}: {}", path.display(), err);
        }
        panic!("{} input(s) failed unexpectedly", failed.len());
    }
}

#[test]
fn e2e_output_formats() {
    let temp_dir = tempdir().unwrap();
    let input = fixtures().join("pipeline.dot");

    let svg = temp_dir.path().join("out.svg");
    run(&args(&input, svg.clone())).unwrap();
    let svg = fs::read_to_string(svg).unwrap();
    assert!(svg.contains("<svg"));
    assert!(svg.contains("data-id=\"render\""));

    let xdot = temp_dir.path().join("out.xdot");
    run(&args(&input, xdot.clone())).unwrap();
    let xdot = fs::read_to_string(xdot).unwrap();
    assert!(xdot.contains("_draw_"));
    let reparsed = dotlens_parser::parse(&xdot).unwrap();
    assert_eq!(reparsed.node_count(), 4);
    assert!(reparsed.width() > 0.0 && reparsed.height() > 0.0);
    assert!(reparsed.nodes().all(|n| n.element().attributes().contains("pos")));

    let dot = temp_dir.path().join("out.dot");
    run(&args(&input, dot.clone())).unwrap();
    let dot = fs::read_to_string(dot).unwrap();
    assert!(!dot.contains("_draw_"));
    assert!(dot.contains("subgraph \"cluster_input\""));
}

#[test]
fn e2e_smoke_test_error_inputs() {
    let temp_dir = tempdir().expect("Failed to create temp directory");
    let inputs = collect_dot_files(fixtures().join("errors"));
    assert!(!inputs.is_empty(), "No error inputs found in tests/fixtures/errors/");

    let mut unexpectedly_succeeded = Vec::new();
    for input in &inputs {
        let output = temp_dir.path().join("error.svg");
        if run(&args(input, output)).is_ok() {
            unexpectedly_succeeded.push(input.clone());
        }
    }

    assert!(
        unexpectedly_succeeded.is_empty(),
        "error inputs succeeded unexpectedly: {unexpectedly_succeeded:?}"
    );
}

#[test]
fn e2e_unknown_method_is_rejected() {
    let temp_dir = tempdir().unwrap();
    let input = fixtures().join("friends.dot");
    let mut bad = args(&input, temp_dir.path().join("out.svg"));
    bad.method = Some("magic".to_string());
    assert!(run(&bad).is_err());
}
